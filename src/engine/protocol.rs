use std::fmt;
use std::time::Duration;

/// Commands sent to the engine, one per line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuiCommand {
    Uci,
    IsReady,
    UciNewGame,
    Position { fen: String },
    Go { movetime: Duration },
    Stop,
    Quit,
}

impl fmt::Display for GuiCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GuiCommand::Uci => f.write_str("uci"),
            GuiCommand::IsReady => f.write_str("isready"),
            GuiCommand::UciNewGame => f.write_str("ucinewgame"),
            GuiCommand::Position { fen } => write!(f, "position fen {fen}"),
            GuiCommand::Go { movetime } => write!(f, "go movetime {}", movetime.as_millis()),
            GuiCommand::Stop => f.write_str("stop"),
            GuiCommand::Quit => f.write_str("quit"),
        }
    }
}

/// Lines received from the engine that the client cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineMessage {
    Id { key: String, value: String },
    UciOk,
    ReadyOk,
    /// `bestmove <move> [ponder <move>]`, tokens kept verbatim.
    BestMove {
        best: String,
        ponder: Option<String>,
    },
    Info(String),
    Other(String),
}

impl EngineMessage {
    /// Classify a single line of engine output.
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        let mut tokens = line.split_whitespace();

        match tokens.next() {
            Some("uciok") => EngineMessage::UciOk,
            Some("readyok") => EngineMessage::ReadyOk,
            Some("bestmove") => {
                let best = tokens.next().unwrap_or_default().to_string();
                let ponder = match (tokens.next(), tokens.next()) {
                    (Some("ponder"), Some(mv)) => Some(mv.to_string()),
                    _ => None,
                };
                EngineMessage::BestMove { best, ponder }
            }
            Some("id") => {
                let key = tokens.next().unwrap_or_default().to_string();
                let value = tokens.collect::<Vec<_>>().join(" ");
                EngineMessage::Id { key, value }
            }
            Some("info") => EngineMessage::Info(line.to_string()),
            _ => EngineMessage::Other(line.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case(GuiCommand::Uci, "uci")]
    #[test_case(GuiCommand::IsReady, "isready")]
    #[test_case(GuiCommand::UciNewGame, "ucinewgame")]
    #[test_case(GuiCommand::Stop, "stop")]
    #[test_case(GuiCommand::Quit, "quit")]
    #[test_case(GuiCommand::Go { movetime: Duration::from_secs(2) }, "go movetime 2000")]
    fn test_command_lines(command: GuiCommand, expected: &str) {
        assert_eq!(command.to_string(), expected);
    }

    #[test]
    fn test_position_command_carries_fen() {
        let command = GuiCommand::Position {
            fen: crate::position::STARTING_FEN.to_string(),
        };
        assert_eq!(
            command.to_string(),
            "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1"
        );
    }

    #[test]
    fn test_parse_bestmove_with_ponder() {
        assert_eq!(
            EngineMessage::parse("bestmove e2e4 ponder e7e5\n"),
            EngineMessage::BestMove {
                best: "e2e4".to_string(),
                ponder: Some("e7e5".to_string()),
            }
        );
    }

    #[test]
    fn test_parse_bestmove_promotion() {
        assert_eq!(
            EngineMessage::parse("bestmove a7a8q"),
            EngineMessage::BestMove {
                best: "a7a8q".to_string(),
                ponder: None,
            }
        );
    }

    #[test]
    fn test_parse_bare_bestmove() {
        assert_eq!(
            EngineMessage::parse("bestmove"),
            EngineMessage::BestMove {
                best: String::new(),
                ponder: None,
            }
        );
    }

    #[test]
    fn test_parse_handshake_lines() {
        assert_eq!(EngineMessage::parse("uciok"), EngineMessage::UciOk);
        assert_eq!(EngineMessage::parse("  readyok  "), EngineMessage::ReadyOk);
        assert_eq!(
            EngineMessage::parse("id name Stockfish 17"),
            EngineMessage::Id {
                key: "name".to_string(),
                value: "Stockfish 17".to_string(),
            }
        );
    }

    #[test]
    fn test_parse_info_and_noise() {
        assert!(matches!(
            EngineMessage::parse("info depth 12 score cp 31"),
            EngineMessage::Info(_)
        ));
        assert_eq!(
            EngineMessage::parse("option name Hash type spin"),
            EngineMessage::Other("option name Hash type spin".to_string())
        );
    }
}
