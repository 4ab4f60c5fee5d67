use std::fmt;

use shakmaty::{
    CastlingMode, CastlingSide, Chess, Color, EnPassantMode, Piece, Position as _, Square, fen::Fen,
};
use thiserror::Error;

use crate::moves::Move;
use crate::rules;

/// FEN of the standard starting array.
pub const STARTING_FEN: &str = "rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1";

/// Error when building a [`Position`] from a FEN string.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PositionError {
    #[error("invalid FEN: {0}")]
    InvalidFen(String),

    #[error("illegal setup: {0}")]
    IllegalSetup(String),
}

/// Returned by [`Position::apply`] when the validator rejects a move.
///
/// This is routine input (a dropped piece on a wrong square), not a fault.
#[derive(Debug, Clone, Copy, Error, PartialEq, Eq)]
#[error("illegal move attempt: {0}")]
pub struct IllegalMove(pub Move);

/// Remaining castling rights, one bit per side and rook side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct CastlingRights(u8);

impl CastlingRights {
    pub const NONE: Self = Self(0);
    pub const ALL: Self = Self(0b1111);

    const fn bit(color: Color, side: CastlingSide) -> u8 {
        match (color, side) {
            (Color::White, CastlingSide::KingSide) => 0b0001,
            (Color::White, CastlingSide::QueenSide) => 0b0010,
            (Color::Black, CastlingSide::KingSide) => 0b0100,
            (Color::Black, CastlingSide::QueenSide) => 0b1000,
        }
    }

    #[inline]
    pub const fn has(self, color: Color, side: CastlingSide) -> bool {
        self.0 & Self::bit(color, side) != 0
    }

    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    fn from_position(chess: &Chess) -> Self {
        let castles = chess.castles();
        let mut bits = 0;
        for color in [Color::White, Color::Black] {
            for side in [CastlingSide::KingSide, CastlingSide::QueenSide] {
                if castles.has(color, side) {
                    bits |= Self::bit(color, side);
                }
            }
        }
        Self(bits)
    }
}

/// The canonical board state: occupancy, side to move, castling rights,
/// en passant target and clocks.
///
/// Mutation only happens through [`Position::apply`], which consults the
/// move validator first and leaves the position untouched on rejection.
#[derive(Clone)]
pub struct Position {
    chess: Chess,
}

impl Position {
    /// The standard starting position.
    #[inline]
    pub fn new() -> Self {
        Self {
            chess: Chess::default(),
        }
    }

    /// Parse a position from FEN.
    pub fn from_fen(fen: &str) -> Result<Self, PositionError> {
        let chess = fen
            .trim()
            .parse::<Fen>()
            .map_err(|err| PositionError::InvalidFen(err.to_string()))?
            .into_position(CastlingMode::Standard)
            .map_err(|err| PositionError::IllegalSetup(err.to_string()))?;
        Ok(Self { chess })
    }

    /// Encode as FEN, the board encoding sent to the engine.
    pub fn to_fen(&self) -> String {
        Fen::from_position(&self.chess, EnPassantMode::Legal).to_string()
    }

    /// Get the piece at a given square, if any
    #[inline]
    pub fn piece_at(&self, square: Square) -> Option<Piece> {
        self.chess.board().piece_at(square)
    }

    #[inline]
    pub fn side_to_move(&self) -> Color {
        self.chess.turn()
    }

    #[inline]
    pub fn castling_rights(&self) -> CastlingRights {
        CastlingRights::from_position(&self.chess)
    }

    /// Square a pawn may capture onto en passant, only while such a capture is legal.
    #[inline]
    pub fn en_passant_target(&self) -> Option<Square> {
        self.chess.ep_square(EnPassantMode::Legal)
    }

    #[inline]
    pub fn halfmove_clock(&self) -> u32 {
        self.chess.halfmoves()
    }

    #[inline]
    pub fn fullmove_number(&self) -> u32 {
        self.chess.fullmoves().get()
    }

    /// Number of kings of the given color on the board.
    pub fn king_count(&self, color: Color) -> u32 {
        (self.chess.board().kings() & self.chess.board().by_color(color)).count() as u32
    }

    #[inline]
    pub fn king_of(&self, color: Color) -> Option<Square> {
        self.chess.board().king_of(color)
    }

    /// Whether the side to move is in check.
    #[inline]
    pub fn is_check(&self) -> bool {
        self.chess.is_check()
    }

    /// All occupied squares with their pieces, a1 first.
    pub fn pieces(&self) -> impl Iterator<Item = (Square, Piece)> + '_ {
        Square::ALL
            .into_iter()
            .filter_map(|sq| self.piece_at(sq).map(|piece| (sq, piece)))
    }

    /// Apply a move in place.
    ///
    /// The move is normalised (default Queen promotion) and checked against
    /// the legal move set first. On rejection nothing changes.
    pub fn apply(&mut self, mv: Move) -> Result<Move, IllegalMove> {
        let (played, inner) = rules::resolve(self, mv).ok_or(IllegalMove(mv))?;
        self.chess.play_unchecked(inner);
        Ok(played)
    }

    /// Like [`Position::apply`], but returns the successor and keeps `self`.
    pub fn applied(&self, mv: Move) -> Result<Self, IllegalMove> {
        let mut next = self.clone();
        next.apply(mv)?;
        Ok(next)
    }

    pub(crate) fn inner(&self) -> &Chess {
        &self.chess
    }
}

impl Default for Position {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Position {
    fn eq(&self, other: &Self) -> bool {
        self.to_fen() == other.to_fen()
    }
}

impl Eq for Position {}

impl fmt::Debug for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Position")
            .field("fen", &self.to_fen())
            .finish()
    }
}
