use std::io::{self, Write};

use shakmaty::{Color, File, Piece, Rank, Square};

use crate::BoardRenderer;
use crate::feedback::SquareFeedback;
use crate::session::{GameSession, SessionState};

/// Terminal-based board renderer for development and testing.
///
/// Draws the position as an 8×8 grid with ANSI color-coded squares for
/// the move hints, followed by a status line.
#[derive(Debug, Default)]
pub struct TerminalRenderer;

impl TerminalRenderer {
    pub fn new() -> Self {
        Self
    }
}

/// Error type for terminal rendering.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("failed to write to terminal: {0}")]
    Io(#[from] io::Error),
}

impl BoardRenderer for TerminalRenderer {
    type Error = RenderError;

    fn render(&mut self, session: &GameSession) -> Result<(), Self::Error> {
        render_session(&mut io::stdout(), session)
    }
}

/// Render the board and status to any writer. Extracted for testability.
pub(crate) fn render_session(w: &mut impl Write, session: &GameSession) -> Result<(), RenderError> {
    let position = session.current_position();
    let hints = session.move_hints();

    for rank in Rank::ALL.iter().rev() {
        write!(w, " {} ", rank.char())?;
        for file in File::ALL {
            let square = Square::from_coords(file, *rank);
            let symbol = piece_symbol(position.piece_at(square));
            match hints.get(square).map(background) {
                Some(color) => write!(w, "{color} {symbol} \x1b[0m")?,
                None => write!(w, " {symbol} ")?,
            }
        }
        writeln!(w)?;
    }
    writeln!(w, "    a  b  c  d  e  f  g  h")?;
    writeln!(w)?;
    writeln!(w, "{}", status_line(session))?;
    if let Some(err) = session.last_engine_error() {
        writeln!(w, "Engine error: {err} (type 'retry')")?;
    }
    w.flush()?;
    Ok(())
}

fn status_line(session: &GameSession) -> String {
    if let Some(message) = session.terminal_message() {
        return message.to_string();
    }
    let to_move = match session.current_position().side_to_move() {
        Color::White => "White",
        Color::Black => "Black",
    };
    match session.session_state() {
        SessionState::AwaitingEngineMove => format!("{to_move} to move, engine thinking..."),
        SessionState::PieceHeld { square, .. } => format!("{to_move} to move, holding {square}"),
        _ => format!("{to_move} to move"),
    }
}

/// Map a feedback variant to an ANSI background.
fn background(feedback: SquareFeedback) -> &'static str {
    match feedback {
        SquareFeedback::Destination => "\x1b[44m",
        SquareFeedback::Capture => "\x1b[41m",
        SquareFeedback::Origin => "\x1b[42m",
        SquareFeedback::Check => "\x1b[45m",
    }
}

fn piece_symbol(piece: Option<Piece>) -> char {
    piece.map_or('·', Piece::char)
}
