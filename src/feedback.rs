use shakmaty::{Role, Square};

use crate::moves::Move;
use crate::position::Position;
use crate::rules;

/// Type of visual hint for an individual square
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SquareFeedback {
    /// Dropping the held piece here is a legal move
    Destination,
    /// Dropping the held piece here captures an opponent piece
    Capture,
    /// Square the held piece was picked up from
    Origin,
    /// King of the side to move, currently in check
    Check,
}

/// Squares to highlight while a piece is being dragged.
///
/// Computed by [`compute_feedback`] and consumed by renderers. Holds at most
/// one entry per square.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BoardFeedback {
    squares: Vec<(Square, SquareFeedback)>,
}

impl BoardFeedback {
    /// Create empty feedback (no highlights)
    #[inline]
    pub const fn new() -> Self {
        Self {
            squares: Vec::new(),
        }
    }

    #[inline]
    pub fn squares(&self) -> &[(Square, SquareFeedback)] {
        &self.squares
    }

    /// Get feedback for a specific square, if any
    #[inline]
    pub fn get(&self, square: Square) -> Option<SquareFeedback> {
        self.squares
            .iter()
            .find(|(sq, _)| *sq == square)
            .map(|(_, feedback)| *feedback)
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.squares.is_empty()
    }

    fn insert(&mut self, square: Square, feedback: SquareFeedback) {
        if self.get(square).is_none() {
            self.squares.push((square, feedback));
        }
    }
}

impl From<Vec<(Square, SquareFeedback)>> for BoardFeedback {
    fn from(squares: Vec<(Square, SquareFeedback)>) -> Self {
        let mut feedback = Self::new();
        for (square, kind) in squares {
            feedback.insert(square, kind);
        }
        feedback
    }
}

/// Compute hints for the current position and the held piece, if any.
///
/// - Side to move in check: its king square is marked
/// - Piece held: its square, plus every legal destination split into
///   quiet moves and captures
pub fn compute_feedback(position: &Position, held: Option<Square>) -> BoardFeedback {
    let mut feedback = BoardFeedback::new();

    if let Some(from) = held {
        feedback.insert(from, SquareFeedback::Origin);
        for mv in rules::legal_moves_from(position, from) {
            feedback.insert(mv.to, classify_move(position, mv));
        }
    }

    if position.is_check()
        && let Some(king) = position.king_of(position.side_to_move())
    {
        feedback.insert(king, SquareFeedback::Check);
    }

    feedback
}

/// Classify a move as either a capture or regular destination
fn classify_move(position: &Position, mv: Move) -> SquareFeedback {
    let captures_piece = position
        .piece_at(mv.to)
        .is_some_and(|piece| piece.color != position.side_to_move());
    let en_passant = position.en_passant_target() == Some(mv.to)
        && position
            .piece_at(mv.from)
            .is_some_and(|piece| piece.role == Role::Pawn);

    if captures_piece || en_passant {
        SquareFeedback::Capture
    } else {
        SquareFeedback::Destination
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).expect("valid FEN")
    }

    #[test]
    fn test_no_feedback_when_nothing_held() {
        let feedback = compute_feedback(&Position::new(), None);
        assert!(feedback.is_empty());
        assert_eq!(feedback.squares().len(), 0);
    }

    #[test]
    fn test_show_destinations_when_piece_held() {
        let feedback = compute_feedback(&Position::new(), Some(Square::E2));

        assert_eq!(feedback.get(Square::E2), Some(SquareFeedback::Origin));
        assert_eq!(feedback.get(Square::E3), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::E4), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::D2), None);
    }

    #[test]
    fn test_distinguish_captures() {
        let position = position("rnbqkbnr/ppp1pppp/8/3p4/4P3/8/PPPP1PPP/RNBQKBNR w KQkq - 0 1");

        let feedback = compute_feedback(&position, Some(Square::E4));

        assert_eq!(feedback.get(Square::E4), Some(SquareFeedback::Origin));
        assert_eq!(feedback.get(Square::E5), Some(SquareFeedback::Destination));
        assert_eq!(feedback.get(Square::D5), Some(SquareFeedback::Capture));
    }

    #[test]
    fn test_en_passant_is_capture() {
        let position = position("rnbqkbnr/1pp1pppp/p7/3pP3/8/8/PPPP1PPP/RNBQKBNR w KQkq d6 0 1");

        let feedback = compute_feedback(&position, Some(Square::E5));

        assert_eq!(feedback.get(Square::D6), Some(SquareFeedback::Capture));
        assert_eq!(feedback.get(Square::E6), Some(SquareFeedback::Destination));
    }

    #[test]
    fn test_promotion_destination_listed_once() {
        let position = position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");

        let feedback = compute_feedback(&position, Some(Square::E7));

        assert_eq!(feedback.squares().len(), 2);
        assert_eq!(feedback.get(Square::E8), Some(SquareFeedback::Destination));
    }

    #[test]
    fn test_check_marks_king() {
        let position = position("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1");

        let feedback = compute_feedback(&position, None);

        assert_eq!(feedback.get(Square::E1), Some(SquareFeedback::Check));
        assert_eq!(feedback.squares().len(), 1);
    }

    #[test]
    fn test_held_opponent_piece_has_no_destinations() {
        let feedback = compute_feedback(&Position::new(), Some(Square::E7));
        assert_eq!(feedback.squares(), [(Square::E7, SquareFeedback::Origin)]);
    }
}
