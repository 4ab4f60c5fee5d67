//! The game session state machine.
//!
//! A [`GameSession`] owns the [`Position`] exclusively. Input events from the
//! UI and completions from the engine worker are the only things that move
//! it between [`SessionState`]s, one at a time, on the thread that owns it.

use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use shakmaty::{Color, Piece, Role, Square};

use crate::config::SessionConfig;
use crate::engine::{EngineCompletion, EngineError, EngineWorker, MoveSearch, Ticket};
use crate::feedback::{self, BoardFeedback};
use crate::geometry::PointerPos;
use crate::moves::Move;
use crate::position::{IllegalMove, Position};
use crate::termination::{self, Termination};

/// Where the session is in the turn cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    AwaitingSelection,
    /// A piece is being dragged; `pointer` is echoed for rendering only.
    PieceHeld {
        square: Square,
        pointer: PointerPos,
    },
    AwaitingEngineMove,
    /// Sticky until an explicit restart.
    Terminal(Termination),
}

/// Discrete UI input, delivered in temporal order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputEvent {
    Select {
        square: Square,
        pointer: PointerPos,
    },
    PointerMoved(PointerPos),
    /// Drop the held piece. `promotion` is an optional explicit choice;
    /// promotions default to Queen without one.
    Release {
        pointer: PointerPos,
        promotion: Option<Role>,
    },
    Restart,
    Quit,
}

impl InputEvent {
    /// Release without an explicit promotion choice.
    #[inline]
    pub const fn release(pointer: PointerPos) -> Self {
        InputEvent::Release {
            pointer,
            promotion: None,
        }
    }
}

/// What handling one input or completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// Not a valid transition from the current state.
    Ignored,
    PieceLifted(Square),
    PointerTracked,
    /// Released off the board or back on the origin square.
    DropCancelled,
    /// Routine rejection; the position is unchanged.
    IllegalMoveAttempt(Move),
    MoveApplied {
        mv: Move,
        termination: Option<Termination>,
    },
    EngineThinking(Ticket),
    /// Reportable failure; control is back with the human.
    EngineFailed(EngineError),
    /// A completion for a request that was cancelled by restart or quit.
    StaleCompletion(Ticket),
    Restarted,
    Quit,
}

/// The automated side and its single in-flight request slot.
#[derive(Debug)]
struct EngineSeat {
    side: Color,
    worker: Option<EngineWorker>,
    pending: Option<Ticket>,
    last_ticket: u64,
    /// Set after a failure; cleared by [`GameSession::retry_engine`], a restart or a new position.
    suspended: bool,
}

/// One interactive game between a human and either another human or an engine.
#[derive(Debug)]
pub struct GameSession {
    config: SessionConfig,
    position: Position,
    state: SessionState,
    engine: Option<EngineSeat>,
    last_engine_error: Option<EngineError>,
    finished: bool,
}

impl GameSession {
    /// Human against human; both sides are selectable.
    pub fn new(config: SessionConfig) -> Self {
        Self {
            config,
            position: Position::new(),
            state: SessionState::AwaitingSelection,
            engine: None,
            last_engine_error: None,
            finished: false,
        }
    }

    /// Human against an engine playing `engine_side`, searched on a background thread.
    pub fn with_engine(
        config: SessionConfig,
        engine_side: Color,
        search: impl MoveSearch + 'static,
    ) -> Result<Self, EngineError> {
        let worker = EngineWorker::spawn(search)?;
        Ok(Self::with_worker(config, engine_side, worker))
    }

    /// Human against an already running engine worker.
    pub fn with_worker(config: SessionConfig, engine_side: Color, worker: EngineWorker) -> Self {
        let mut session = Self::new(config);
        session.engine = Some(EngineSeat {
            side: engine_side,
            worker: Some(worker),
            pending: None,
            last_ticket: 0,
            suspended: false,
        });
        session.schedule_engine();
        session
    }

    /// Start from a custom position instead of the starting array.
    ///
    /// Only meaningful before play begins; a restart returns to the
    /// standard starting position.
    pub fn load_position(&mut self, position: Position) {
        self.cancel_pending();
        self.position = position;
        self.last_engine_error = None;
        if let Some(seat) = self.engine.as_mut() {
            seat.suspended = false;
        }
        self.state = match termination::evaluate(&self.position, self.config.draw_rules) {
            Some(reason) => SessionState::Terminal(reason),
            None => SessionState::AwaitingSelection,
        };
        self.schedule_engine();
    }

    // -----------------------------------------------------------------
    // Queries for rendering
    // -----------------------------------------------------------------

    #[inline]
    pub fn current_position(&self) -> &Position {
        &self.position
    }

    #[inline]
    pub fn session_state(&self) -> SessionState {
        self.state
    }

    #[inline]
    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// The automated side, if this session plays against an engine.
    #[inline]
    pub fn engine_side(&self) -> Option<Color> {
        self.engine.as_ref().map(|seat| seat.side)
    }

    /// Whether a human may pick up pieces of `color`.
    pub fn is_selectable(&self, color: Color) -> bool {
        self.engine_side() != Some(color)
    }

    /// The dragged piece and where to draw it.
    pub fn held_piece_preview(&self) -> Option<(Piece, PointerPos)> {
        match self.state {
            SessionState::PieceHeld { square, pointer } => {
                self.position.piece_at(square).map(|piece| (piece, pointer))
            }
            _ => None,
        }
    }

    /// Highlights for the held piece and a checked king.
    pub fn move_hints(&self) -> BoardFeedback {
        let held = match self.state {
            SessionState::PieceHeld { square, .. } => Some(square),
            _ => None,
        };
        feedback::compute_feedback(&self.position, held)
    }

    /// Banner text once the game is over.
    pub fn terminal_message(&self) -> Option<&'static str> {
        match self.state {
            SessionState::Terminal(Termination::Checkmate) => {
                Some("Checkmate! Press R to restart.")
            }
            SessionState::Terminal(Termination::Stalemate | Termination::InsufficientMaterial) => {
                Some("Draw! Press R to restart.")
            }
            SessionState::Terminal(_) => Some("Game Over! Press R to restart."),
            _ => None,
        }
    }

    /// The most recent engine failure, cleared by the next engine move or a restart.
    #[inline]
    pub fn last_engine_error(&self) -> Option<&EngineError> {
        self.last_engine_error.as_ref()
    }

    /// Whether quit was requested. A finished session ignores all input.
    #[inline]
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// A handle on the engine completion queue, for waiting on input and
    /// engine answers together. Pass what arrives to [`GameSession::handle_completion`].
    pub fn completion_receiver(&self) -> Option<Receiver<EngineCompletion>> {
        self.engine
            .as_ref()
            .and_then(|seat| seat.worker.as_ref())
            .map(|worker| worker.completions().clone())
    }

    // -----------------------------------------------------------------
    // Transitions
    // -----------------------------------------------------------------

    /// Feed one UI event through the state machine.
    pub fn handle(&mut self, event: InputEvent) -> SessionEvent {
        if self.finished {
            return SessionEvent::Ignored;
        }

        match (self.state, event) {
            (_, InputEvent::Quit) => self.quit(),
            (_, InputEvent::Restart) => self.restart(),
            (SessionState::Terminal(_), _) => SessionEvent::Ignored,
            (SessionState::AwaitingSelection, InputEvent::Select { square, pointer }) => {
                self.select(square, pointer)
            }
            (SessionState::PieceHeld { square, .. }, InputEvent::PointerMoved(pointer)) => {
                self.state = SessionState::PieceHeld { square, pointer };
                SessionEvent::PointerTracked
            }
            (SessionState::PieceHeld { square, .. }, InputEvent::Release { pointer, promotion }) => {
                self.release(square, pointer, promotion)
            }
            _ => SessionEvent::Ignored,
        }
    }

    /// Apply an engine completion if it answers the outstanding request.
    pub fn handle_completion(&mut self, completion: EngineCompletion) -> SessionEvent {
        let Some(seat) = self.engine.as_mut() else {
            return SessionEvent::Ignored;
        };
        if self.finished || seat.pending != Some(completion.ticket) {
            log::debug!("discarding stale engine completion {}", completion.ticket.id());
            return SessionEvent::StaleCompletion(completion.ticket);
        }
        seat.pending = None;

        match completion.result {
            Ok(mv) => match self.position.apply(mv) {
                Ok(played) => {
                    log::info!("engine plays {played}");
                    self.last_engine_error = None;
                    self.after_move(played)
                }
                Err(IllegalMove(mv)) => self.engine_failed(EngineError::ProtocolViolation(
                    format!("engine move {mv} is illegal"),
                )),
            },
            Err(err) => self.engine_failed(err),
        }
    }

    /// Handle a completion if one has already arrived.
    pub fn poll(&mut self) -> Option<SessionEvent> {
        let completion = self
            .engine
            .as_ref()?
            .worker
            .as_ref()?
            .try_completion()?;
        Some(self.handle_completion(completion))
    }

    /// Block up to `timeout` for the answer to the outstanding request.
    ///
    /// Stale completions are drained along the way. Returns `None` when
    /// nothing is outstanding or time runs out.
    pub fn wait_for_engine(&mut self, timeout: Duration) -> Option<SessionEvent> {
        let deadline = Instant::now() + timeout;
        loop {
            if self.engine.as_ref()?.pending.is_none() {
                return None;
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            let completion = self
                .engine
                .as_ref()?
                .worker
                .as_ref()?
                .wait_completion(remaining)?;
            match self.handle_completion(completion) {
                SessionEvent::StaleCompletion(_) => continue,
                event => return Some(event),
            }
        }
    }

    /// Re-issue the automated side's request after a failure.
    ///
    /// The session never retries on its own.
    pub fn retry_engine(&mut self) -> SessionEvent {
        if self.finished {
            return SessionEvent::Ignored;
        }
        match self.engine.as_mut() {
            Some(seat) if seat.suspended => seat.suspended = false,
            _ => return SessionEvent::Ignored,
        }
        self.schedule_engine().unwrap_or(SessionEvent::Ignored)
    }

    fn select(&mut self, square: Square, pointer: PointerPos) -> SessionEvent {
        match self.position.piece_at(square) {
            Some(piece) if self.is_selectable(piece.color) => {
                self.state = SessionState::PieceHeld { square, pointer };
                SessionEvent::PieceLifted(square)
            }
            _ => SessionEvent::Ignored,
        }
    }

    fn release(&mut self, from: Square, pointer: PointerPos, promotion: Option<Role>) -> SessionEvent {
        self.state = SessionState::AwaitingSelection;

        let Some(to) = self.config.geometry.square_at(pointer) else {
            return SessionEvent::DropCancelled;
        };
        if to == from {
            return SessionEvent::DropCancelled;
        }

        let request = Move {
            from,
            to,
            promotion,
        };
        match self.position.apply(request) {
            Ok(played) => {
                log::info!("human plays {played}");
                self.after_move(played)
            }
            Err(IllegalMove(mv)) => {
                log::debug!("discarding illegal move {mv}");
                SessionEvent::IllegalMoveAttempt(mv)
            }
        }
    }

    /// Check for the end of the game, then hand the turn to the engine if it is due.
    fn after_move(&mut self, played: Move) -> SessionEvent {
        let termination = termination::evaluate(&self.position, self.config.draw_rules);
        match termination {
            Some(reason) => {
                log::info!("game over: {reason}");
                self.state = SessionState::Terminal(reason);
            }
            None => {
                self.state = SessionState::AwaitingSelection;
                self.schedule_engine();
            }
        }
        SessionEvent::MoveApplied {
            mv: played,
            termination,
        }
    }

    fn engine_failed(&mut self, err: EngineError) -> SessionEvent {
        log::warn!("{err}; returning control to the player");
        self.state = SessionState::AwaitingSelection;
        if let Some(seat) = self.engine.as_mut() {
            seat.suspended = true;
        }
        self.last_engine_error = Some(err.clone());
        SessionEvent::EngineFailed(err)
    }

    /// Dispatch a request when it is the automated side's turn and nothing is in flight.
    fn schedule_engine(&mut self) -> Option<SessionEvent> {
        if self.finished || self.state != SessionState::AwaitingSelection {
            return None;
        }
        let seat = self.engine.as_mut()?;
        if seat.suspended || seat.pending.is_some() || self.position.side_to_move() != seat.side {
            return None;
        }
        let worker = seat.worker.as_ref()?;

        seat.last_ticket += 1;
        let ticket = Ticket::new(seat.last_ticket);
        match worker.submit(ticket, self.position.clone(), self.config.time_budget) {
            Ok(()) => {
                log::info!("engine to move, request {}", ticket.id());
                seat.pending = Some(ticket);
                self.state = SessionState::AwaitingEngineMove;
                Some(SessionEvent::EngineThinking(ticket))
            }
            Err(err) => Some(self.engine_failed(err)),
        }
    }

    fn cancel_pending(&mut self) {
        if let Some(ticket) = self.engine.as_mut().and_then(|seat| seat.pending.take()) {
            log::debug!("cancelling engine request {}", ticket.id());
        }
    }

    fn restart(&mut self) -> SessionEvent {
        log::info!("restarting game");
        self.cancel_pending();
        self.position = Position::new();
        self.state = SessionState::AwaitingSelection;
        self.last_engine_error = None;
        if let Some(seat) = self.engine.as_mut() {
            seat.suspended = false;
        }
        self.schedule_engine();
        SessionEvent::Restarted
    }

    fn quit(&mut self) -> SessionEvent {
        log::info!("quitting");
        self.cancel_pending();
        self.finished = true;
        if !matches!(self.state, SessionState::Terminal(_)) {
            self.state = SessionState::AwaitingSelection;
        }
        if let Some(seat) = self.engine.as_mut() {
            // Detaches the worker; a search in progress finishes unobserved.
            seat.worker = None;
        }
        SessionEvent::Quit
    }
}
