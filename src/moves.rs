use std::fmt;
use std::str::FromStr;

use shakmaty::{File, Rank, Role, Square};
use thiserror::Error;

/// Error when parsing a move in coordinate notation.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid move notation: '{0}'")]
pub struct ParseMoveError(String);

/// A move request: origin, destination and an optional promotion piece.
///
/// Equality is structural. A `Move` carries no validity on its own; it is
/// only legal relative to a specific [`Position`](crate::position::Position).
/// Castling is expressed as the king's two-square step (`e1g1`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Square,
    pub to: Square,
    pub promotion: Option<Role>,
}

impl Move {
    #[inline]
    pub const fn new(from: Square, to: Square) -> Self {
        Self {
            from,
            to,
            promotion: None,
        }
    }

    #[inline]
    pub const fn with_promotion(from: Square, to: Square, role: Role) -> Self {
        Self {
            from,
            to,
            promotion: Some(role),
        }
    }

    /// Build a move from raw square indices (a1 = 0, h8 = 63).
    ///
    /// Out-of-range indices yield `None` rather than a panic.
    pub fn from_indices(from: u32, to: u32) -> Option<Self> {
        let square = |index: u32| (index < 64).then(|| Square::new(index));
        Some(Self::new(square(from)?, square(to)?))
    }

    /// Convert a library move into coordinate form.
    ///
    /// Returns `None` for drop moves, which standard chess never generates.
    pub(crate) fn from_shakmaty(mv: &shakmaty::Move) -> Option<Self> {
        match *mv {
            shakmaty::Move::Normal {
                from,
                to,
                promotion,
                ..
            } => Some(Self {
                from,
                to,
                promotion,
            }),
            shakmaty::Move::EnPassant { from, to } => Some(Self::new(from, to)),
            shakmaty::Move::Castle { king, rook } => {
                let file = if rook.file() > king.file() {
                    File::G
                } else {
                    File::C
                };
                Some(Self::new(king, Square::from_coords(file, king.rank())))
            }
            shakmaty::Move::Put { .. } => None,
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.from, self.to)?;
        if let Some(role) = self.promotion {
            write!(f, "{}", role.char())?;
        }
        Ok(())
    }
}

impl FromStr for Move {
    type Err = ParseMoveError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseMoveError(s.to_string());
        let bytes = s.as_bytes();
        if !(4..=5).contains(&bytes.len()) {
            return Err(err());
        }

        let from = parse_square(&bytes[0..2]).ok_or_else(err)?;
        let to = parse_square(&bytes[2..4]).ok_or_else(err)?;
        let promotion = match bytes.get(4) {
            None => None,
            Some(&ch) => Some(Role::from_char(char::from(ch)).ok_or_else(err)?),
        };

        Ok(Self {
            from,
            to,
            promotion,
        })
    }
}

/// Parse a two-byte square like `e4` without going through `&str`.
fn parse_square(bytes: &[u8]) -> Option<Square> {
    let file = bytes.first()?.checked_sub(b'a')?;
    let rank = bytes.get(1)?.checked_sub(b'1')?;
    if file >= 8 || rank >= 8 {
        return None;
    }
    Some(Square::from_coords(
        File::new(u32::from(file)),
        Rank::new(u32::from(rank)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test]
    fn test_parse_simple_move() {
        let mv: Move = "e2e4".parse().expect("valid move");
        assert_eq!(mv, Move::new(Square::E2, Square::E4));
    }

    #[test]
    fn test_parse_promotion() {
        let mv: Move = "e7e8q".parse().expect("valid move");
        assert_eq!(mv, Move::with_promotion(Square::E7, Square::E8, Role::Queen));
        assert_eq!(mv.to_string(), "e7e8q");
    }

    #[test_case("e2"; "too short")]
    #[test_case("e2e4qq"; "too long")]
    #[test_case("i2e4"; "file out of range")]
    #[test_case("e9e4"; "rank out of range")]
    #[test_case("e7e8x"; "unknown promotion")]
    #[test_case("0000"; "null move")]
    fn test_parse_rejects(input: &str) {
        assert_eq!(
            input.parse::<Move>(),
            Err(ParseMoveError(input.to_string()))
        );
    }

    #[test]
    fn test_from_indices() {
        assert_eq!(
            Move::from_indices(12, 28),
            Some(Move::new(Square::E2, Square::E4))
        );
        assert_eq!(Move::from_indices(12, 64), None);
        assert_eq!(Move::from_indices(99, 0), None);
    }

    #[test]
    fn test_castle_converted_to_king_step() {
        let castle = shakmaty::Move::Castle {
            king: Square::E1,
            rook: Square::H1,
        };
        assert_eq!(
            Move::from_shakmaty(&castle),
            Some(Move::new(Square::E1, Square::G1))
        );

        let castle = shakmaty::Move::Castle {
            king: Square::E8,
            rook: Square::A8,
        };
        assert_eq!(
            Move::from_shakmaty(&castle),
            Some(Move::new(Square::E8, Square::C8))
        );
    }
}
