//! Move search through an external engine process.
//!
//! [`MoveSearch`] is the seam between the session and whatever produces the
//! automated side's moves. [`UciEngine`] talks to a real engine over the
//! line-oriented UCI protocol; [`EngineWorker`] runs any `MoveSearch` on a
//! background thread so the session thread never blocks on it.

mod protocol;
mod uci;
mod worker;

use std::time::Duration;

use thiserror::Error;

use crate::moves::Move;
use crate::position::Position;

pub use protocol::{EngineMessage, GuiCommand};
pub use uci::UciEngine;
pub use worker::{EngineCompletion, EngineWorker, Ticket};

/// Default per-move search budget.
pub const DEFAULT_TIME_BUDGET: Duration = Duration::from_millis(2000);

/// Reportable engine failures. None of these is fatal to the session.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum EngineError {
    /// The engine process could not be started.
    #[error("engine unavailable: {0}")]
    Unavailable(String),

    /// The engine process exited or closed its pipes before answering.
    #[error("engine crashed: {0}")]
    Crashed(String),

    /// The engine answered with something that is not a legal move.
    #[error("engine protocol violation: {0}")]
    ProtocolViolation(String),

    /// No answer arrived within the search budget plus grace period.
    #[error("engine did not answer within {0:?}")]
    Timeout(Duration),
}

/// Something that can pick one move for a position under a time budget.
///
/// Implementations receive the position by reference and must not keep it;
/// the worker hands each request its own copy.
pub trait MoveSearch: Send {
    fn request_move(&mut self, position: &Position, budget: Duration)
    -> Result<Move, EngineError>;
}

impl<T: MoveSearch + ?Sized> MoveSearch for Box<T> {
    fn request_move(
        &mut self,
        position: &Position,
        budget: Duration,
    ) -> Result<Move, EngineError> {
        (**self).request_move(position, budget)
    }
}
