//! Legal move generation and validation.
//!
//! Candidate moves come from the pseudo-legal patterns of each piece and are
//! filtered for king safety, castling and the one-ply en passant window by
//! the underlying position library. This module translates between that
//! representation and the coordinate [`Move`] used by the session and the
//! engine protocol.

use shakmaty::{Color, Position as _, Rank, Role, Square};

use crate::moves::Move;
use crate::position::Position;

/// Every legal move in `position`.
///
/// The order is deterministic for a given position. Promotions appear once
/// per promotion piece.
pub fn legal_moves(position: &Position) -> Vec<Move> {
    position
        .inner()
        .legal_moves()
        .iter()
        .filter_map(Move::from_shakmaty)
        .collect()
}

/// Legal moves starting on `from`.
pub fn legal_moves_from(position: &Position, from: Square) -> Vec<Move> {
    legal_moves(position)
        .into_iter()
        .filter(|mv| mv.from == from)
        .collect()
}

/// Membership test against [`legal_moves`].
///
/// A promotion move without a promotion piece is not a member; see
/// [`normalize`] for the default-to-Queen rule.
pub fn is_legal(position: &Position, mv: Move) -> bool {
    position
        .inner()
        .legal_moves()
        .iter()
        .any(|candidate| Move::from_shakmaty(candidate) == Some(mv))
}

/// Whether moving the piece on `from` to `to` reaches the far rank with a pawn.
pub fn is_promotion_move(position: &Position, from: Square, to: Square) -> bool {
    position
        .piece_at(from)
        .is_some_and(|piece| piece.role == Role::Pawn && to.rank() == far_rank(piece.color))
}

/// Fill in or repair the promotion piece of a move request.
///
/// Pawn moves to the far rank promote to Queen unless a valid piece
/// (knight, bishop, rook, queen) was requested. Any other requested piece
/// falls back to Queen. A promotion piece on a move that does not promote is
/// dropped.
pub fn normalize(position: &Position, mv: Move) -> Move {
    let promotes = is_promotion_move(position, mv.from, mv.to);
    match (promotes, mv.promotion) {
        (true, Some(role)) if is_promotion_role(role) => mv,
        (true, Some(role)) => {
            log::warn!("invalid promotion to {role:?} for {mv}, promoting to queen");
            Move::with_promotion(mv.from, mv.to, Role::Queen)
        }
        (true, None) => Move::with_promotion(mv.from, mv.to, Role::Queen),
        (false, Some(role)) => {
            log::warn!("dropping promotion to {role:?} on non-promoting move {mv}");
            Move::new(mv.from, mv.to)
        }
        (false, None) => mv,
    }
}

/// Normalise `mv` and find the matching legal library move.
pub(crate) fn resolve(position: &Position, mv: Move) -> Option<(Move, shakmaty::Move)> {
    let mv = normalize(position, mv);
    position
        .inner()
        .legal_moves()
        .into_iter()
        .find(|candidate| Move::from_shakmaty(candidate) == Some(mv))
        .map(|candidate| (mv, candidate))
}

#[inline]
fn far_rank(color: Color) -> Rank {
    match color {
        Color::White => Rank::Eighth,
        Color::Black => Rank::First,
    }
}

#[inline]
fn is_promotion_role(role: Role) -> bool {
    matches!(role, Role::Knight | Role::Bishop | Role::Rook | Role::Queen)
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).expect("valid FEN")
    }

    fn mv(notation: &str) -> Move {
        notation.parse().expect("valid notation in test")
    }

    #[test]
    fn test_start_position_has_twenty_moves() {
        let moves = legal_moves(&Position::new());
        assert_eq!(moves.len(), 20);
        assert!(moves.contains(&mv("e2e4")));
        assert!(moves.contains(&mv("g1f3")));
    }

    #[test]
    fn test_legal_moves_deterministic() {
        let position = position("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1");
        assert_eq!(legal_moves(&position), legal_moves(&position));
        assert_eq!(legal_moves(&position).len(), 48);
    }

    #[test]
    fn test_pinned_piece_cannot_move() {
        // Knight on e2 is pinned by the rook on e8
        let position = position("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1");
        assert!(legal_moves_from(&position, Square::E2).is_empty());
        assert!(!is_legal(&position, mv("e2c3")));
    }

    #[test_case("4k3/8/8/8/8/8/8/R3K2r w Q - 0 1"; "rook check")]
    #[test_case("4r1k1/8/8/8/8/8/4N3/4K3 w - - 0 1"; "pinned knight")]
    #[test_case("r3k2r/p1ppqpb1/bn2pnp1/3PN3/1p2P3/2N2Q1p/PPPBBPPP/R3K2R w KQkq - 0 1"; "kiwipete")]
    fn test_no_move_leaves_own_king_in_check(fen: &str) {
        let position = position(fen);
        let mover = position.side_to_move();
        for candidate in legal_moves(&position) {
            let after = position.applied(candidate).expect("generated move is legal");
            let king = after.king_of(mover).expect("king present");
            let board = after.inner().board();
            assert!(
                board
                    .attacks_to(king, after.side_to_move(), board.occupied())
                    .is_empty(),
                "{candidate} leaves the king in check"
            );
        }
    }

    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1g1", true; "king side open")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R w KQkq - 0 1", "e1c1", true; "queen side open")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3K2R w Qkq - 0 1", "e1g1", false; "right lost")]
    #[test_case("r3k2r/8/8/8/8/8/8/R3KB1R w KQkq - 0 1", "e1g1", false; "blocked")]
    #[test_case("r3k2r/8/8/8/8/8/5r2/R3K2R w KQkq - 0 1", "e1g1", false; "through check")]
    #[test_case("r3k2r/8/8/8/8/8/6r1/R3K2R w KQkq - 0 1", "e1g1", false; "into check")]
    #[test_case("r3k2r/8/8/8/8/8/4r3/R3K2R w KQkq - 0 1", "e1g1", false; "out of check")]
    fn test_castling_legality(fen: &str, notation: &str, expected: bool) {
        assert_eq!(is_legal(&position(fen), mv(notation)), expected);
    }

    #[test]
    fn test_promotion_requires_piece_for_membership() {
        let position = position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        assert!(!is_legal(&position, mv("e7e8")));
        assert!(is_legal(&position, mv("e7e8q")));
        assert!(is_legal(&position, mv("e7e8n")));
        assert_eq!(legal_moves_from(&position, Square::E7).len(), 4);
    }

    #[test_case("e7e8", "e7e8q"; "default queen")]
    #[test_case("e7e8r", "e7e8r"; "explicit rook")]
    #[test_case("e7e8k", "e7e8q"; "king falls back")]
    #[test_case("e7e8p", "e7e8q"; "pawn falls back")]
    #[test_case("e1d1q", "e1d1"; "non promoting move")]
    fn test_normalize(requested: &str, expected: &str) {
        let position = position("8/4P3/8/8/8/8/k7/4K3 w - - 0 1");
        assert_eq!(normalize(&position, mv(requested)), mv(expected));
    }

    #[test]
    fn test_black_promotes_on_first_rank() {
        let position = position("4k3/8/8/8/8/8/3p4/K7 b - - 0 1");
        assert!(is_promotion_move(&position, Square::D2, Square::D1));
        assert!(!is_promotion_move(&position, Square::E8, Square::E7));
    }

    #[test]
    fn test_wrong_side_move_is_not_legal() {
        assert!(!is_legal(&Position::new(), mv("e7e5")));
    }

    #[test]
    fn test_empty_square_is_not_legal() {
        assert!(!is_legal(&Position::new(), mv("e4e5")));
    }
}
