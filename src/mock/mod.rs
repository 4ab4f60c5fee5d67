mod display;
mod script;
mod terminal;

pub use display::{RenderError, TerminalRenderer};
pub use script::{ParseError, ScriptedInput};
pub use terminal::run_interactive_terminal;
