use std::fmt;

use shakmaty::Position as _;

use crate::position::Position;

/// Why a game ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Termination {
    Checkmate,
    Stalemate,
    InsufficientMaterial,
    /// Fifty moves by each side without a capture or pawn move.
    FiftyMoveRule,
}

impl Termination {
    /// Whether the game ended without a winner.
    #[inline]
    pub const fn is_draw(self) -> bool {
        !matches!(self, Termination::Checkmate)
    }
}

impl fmt::Display for Termination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Termination::Checkmate => "checkmate",
            Termination::Stalemate => "stalemate",
            Termination::InsufficientMaterial => "insufficient material",
            Termination::FiftyMoveRule => "fifty-move rule",
        };
        f.write_str(text)
    }
}

/// Optional draw rules on top of checkmate, stalemate and insufficient material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DrawRules {
    /// End the game once the halfmove clock reaches 100.
    pub fifty_move: bool,
}

/// Evaluate terminal conditions in fixed precedence: checkmate, stalemate,
/// insufficient material, then the optional fifty-move rule.
pub fn evaluate(position: &Position, rules: DrawRules) -> Option<Termination> {
    let chess = position.inner();
    if chess.is_checkmate() {
        Some(Termination::Checkmate)
    } else if chess.is_stalemate() {
        Some(Termination::Stalemate)
    } else if chess.is_insufficient_material() {
        Some(Termination::InsufficientMaterial)
    } else if rules.fifty_move && position.halfmove_clock() >= 100 {
        Some(Termination::FiftyMoveRule)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    fn position(fen: &str) -> Position {
        Position::from_fen(fen).expect("valid FEN")
    }

    #[test]
    fn test_start_position_is_not_terminal() {
        assert_eq!(evaluate(&Position::new(), DrawRules::default()), None);
    }

    #[test_case("7k/8/8/8/8/8/6PP/5q1K w - - 0 1", Termination::Checkmate; "back rank mate")]
    #[test_case("7k/8/8/8/8/8/5q2/7K w - - 0 1", Termination::Stalemate; "queen stalemate")]
    #[test_case("7k/8/8/8/8/8/8/6BK w - - 0 1", Termination::InsufficientMaterial; "lone bishop")]
    #[test_case("7k/8/8/8/8/8/8/7K w - - 0 1", Termination::InsufficientMaterial; "bare kings")]
    fn test_terminal_positions(fen: &str, expected: Termination) {
        assert_eq!(evaluate(&position(fen), DrawRules::default()), Some(expected));
    }

    #[test]
    fn test_checkmate_precedes_everything() {
        // Mate delivered with the clock already past one hundred
        let mated = position("7k/8/8/8/8/8/6PP/5q1K w - - 120 80");
        let rules = DrawRules { fifty_move: true };
        assert_eq!(evaluate(&mated, rules), Some(Termination::Checkmate));
    }

    #[test]
    fn test_fifty_move_rule_is_opt_in() {
        let quiet = position("7k/8/8/8/8/8/R7/7K w - - 100 70");
        assert_eq!(evaluate(&quiet, DrawRules::default()), None);
        assert_eq!(
            evaluate(&quiet, DrawRules { fifty_move: true }),
            Some(Termination::FiftyMoveRule)
        );
    }

    #[test]
    fn test_is_draw() {
        assert!(!Termination::Checkmate.is_draw());
        assert!(Termination::Stalemate.is_draw());
        assert!(Termination::InsufficientMaterial.is_draw());
        assert!(Termination::FiftyMoveRule.is_draw());
    }
}
