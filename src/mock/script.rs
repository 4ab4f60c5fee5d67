use std::collections::VecDeque;
use std::convert::Infallible;

use shakmaty::{Role, Square};
use thiserror::Error;

use crate::InputSource;
use crate::geometry::{BoardGeometry, PointerPos};
use crate::session::InputEvent;

/// Error when parsing an input script.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("invalid script token: '{0}'")]
pub struct ParseError(String);

/// Pointer position used for drops that miss the board.
const OFF_BOARD: PointerPos = PointerPos::new(-1, -1);

/// Scripted UI input for tests and demos.
///
/// Tokens are separated by whitespace and translated to pointer events at
/// square centres:
/// - `e2e4` - pick up e2 and drop it on e4
/// - `e7e8n` - same, choosing a knight for the promotion
/// - `e2` - pick up e2 and keep holding it
/// - `>e4` - drag the held piece over e4
/// - `^e4` / `^e4q` - drop the held piece on e4
/// - `^-` - drop the held piece off the board
/// - `r` - restart, `q` - quit
///
/// More script can be appended at any time.
#[derive(Debug, Clone, Default)]
pub struct ScriptedInput {
    geometry: BoardGeometry,
    pending: VecDeque<InputEvent>,
}

impl ScriptedInput {
    pub fn new(geometry: BoardGeometry) -> Self {
        Self {
            geometry,
            pending: VecDeque::new(),
        }
    }

    /// Create with a script already queued.
    pub fn from_script(geometry: BoardGeometry, script: &str) -> Result<Self, ParseError> {
        let mut input = Self::new(geometry);
        input.push_script(script)?;
        Ok(input)
    }

    /// Parse and queue additional script. Nothing is queued on error.
    pub fn push_script(&mut self, script: &str) -> Result<(), ParseError> {
        let mut events = Vec::new();
        for token in script.split_whitespace() {
            self.parse_token(token, &mut events)?;
        }
        self.pending.extend(events);
        Ok(())
    }

    #[inline]
    pub fn remaining(&self) -> usize {
        self.pending.len()
    }

    fn parse_token(&self, token: &str, events: &mut Vec<InputEvent>) -> Result<(), ParseError> {
        let invalid = || ParseError(token.to_string());

        match token {
            "r" | "R" => events.push(InputEvent::Restart),
            "q" | "Q" => events.push(InputEvent::Quit),
            "^-" => events.push(InputEvent::release(OFF_BOARD)),
            _ => {
                if let Some(rest) = token.strip_prefix('>') {
                    let square = parse_square(rest).ok_or_else(invalid)?;
                    events.push(InputEvent::PointerMoved(self.geometry.center_of(square)));
                } else if let Some(rest) = token.strip_prefix('^') {
                    let (square, promotion) = split_target(rest).ok_or_else(invalid)?;
                    events.push(self.drop_on(square, promotion));
                } else if token.len() == 2 {
                    let square = parse_square(token).ok_or_else(invalid)?;
                    events.push(self.pick_up(square));
                } else {
                    let from = token.get(..2).and_then(parse_square).ok_or_else(invalid)?;
                    let (to, promotion) = token
                        .get(2..)
                        .and_then(split_target)
                        .ok_or_else(invalid)?;
                    events.push(self.pick_up(from));
                    events.push(self.drop_on(to, promotion));
                }
            }
        }
        Ok(())
    }

    fn pick_up(&self, square: Square) -> InputEvent {
        InputEvent::Select {
            square,
            pointer: self.geometry.center_of(square),
        }
    }

    fn drop_on(&self, square: Square, promotion: Option<Role>) -> InputEvent {
        InputEvent::Release {
            pointer: self.geometry.center_of(square),
            promotion,
        }
    }
}

impl InputSource for ScriptedInput {
    type Error = Infallible;

    fn next_event(&mut self) -> Result<Option<InputEvent>, Self::Error> {
        Ok(self.pending.pop_front())
    }
}

fn parse_square(text: &str) -> Option<Square> {
    text.parse().ok()
}

/// `e8` or `e8q`.
fn split_target(text: &str) -> Option<(Square, Option<Role>)> {
    let square = parse_square(text.get(..2)?)?;
    let promotion = match text.get(2..)? {
        "" => None,
        suffix => {
            let mut chars = suffix.chars();
            let role = Role::from_char(chars.next()?.to_ascii_lowercase())?;
            if chars.next().is_some() {
                return None;
            }
            Some(role)
        }
    };
    Some((square, promotion))
}
