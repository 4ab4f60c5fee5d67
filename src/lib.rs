pub use shakmaty::{Color, Piece, Role, Square};

pub mod config;
pub mod engine;
pub mod feedback;
pub mod geometry;
pub mod mock;
pub mod moves;
pub mod position;
pub mod rules;
pub mod session;
pub mod termination;

pub use config::{EngineConfig, SessionConfig, SpawnPolicy};
pub use engine::{EngineError, MoveSearch, UciEngine};
pub use geometry::{BoardGeometry, PointerPos};
pub use moves::Move;
pub use position::Position;
pub use session::{GameSession, InputEvent, SessionEvent, SessionState};
pub use termination::Termination;

/// Source of discrete UI input for a [`GameSession`].
///
/// Abstracts over an interactive front end and scripted input, so the
/// session loop is the same for both.
pub trait InputSource {
    /// Error type for input failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    /// The next event, or `None` once the source is exhausted.
    fn next_event(&mut self) -> Result<Option<InputEvent>, Self::Error>;
}

/// Draws the session state for the player.
///
/// The output side of the loop, mirroring [`InputSource`]. Renderers only
/// read the session through its query methods.
pub trait BoardRenderer {
    /// Error type for render failures.
    type Error: std::fmt::Debug + std::fmt::Display;

    fn render(&mut self, session: &GameSession) -> Result<(), Self::Error>;
}
