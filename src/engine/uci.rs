use std::io::{BufRead, BufReader, Write};
use std::process::{Child, ChildStdin, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};

use super::protocol::{EngineMessage, GuiCommand};
use super::{EngineError, MoveSearch};
use crate::config::{EngineConfig, SpawnPolicy};
use crate::moves::Move;
use crate::position::Position;
use crate::rules;

/// How long a process gets to exit after `quit` before it is killed.
const EXIT_GRACE: Duration = Duration::from_millis(500);

/// Client for an external engine speaking UCI over stdin/stdout.
///
/// Depending on [`SpawnPolicy`] the process is started per request or kept
/// alive between requests. Every answer is checked against the legal moves
/// of the position it was requested for.
#[derive(Debug)]
pub struct UciEngine {
    config: EngineConfig,
    process: Option<EngineProcess>,
}

impl UciEngine {
    pub fn new(config: EngineConfig) -> Self {
        Self {
            config,
            process: None,
        }
    }

    #[inline]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }
}

impl MoveSearch for UciEngine {
    fn request_move(&mut self, position: &Position, budget: Duration) -> Result<Move, EngineError> {
        let mut process = match self.process.take() {
            Some(process) => process,
            None => EngineProcess::spawn(&self.config)?,
        };

        let result = process
            .conversation
            .search(
                position,
                budget,
                self.config.grace,
                self.config.handshake_timeout,
            )
            .and_then(|notation| parse_best_move(position, &notation));

        if self.config.policy == SpawnPolicy::Persistent && result.is_ok() {
            self.process = Some(process);
        } else {
            process.shutdown();
        }

        result
    }
}

/// Turn the `bestmove` token into a move that is legal in `position`.
fn parse_best_move(position: &Position, notation: &str) -> Result<Move, EngineError> {
    let mv: Move = notation
        .parse()
        .map_err(|_| EngineError::ProtocolViolation(format!("unparseable best move '{notation}'")))?;

    if rules::is_legal(position, mv) {
        Ok(mv)
    } else {
        Err(EngineError::ProtocolViolation(format!(
            "best move {mv} is illegal in {}",
            position.to_fen()
        )))
    }
}

/// A running engine process and the line stream of its stdout.
#[derive(Debug)]
struct EngineProcess {
    child: Child,
    conversation: Conversation<ChildStdin>,
    exited: bool,
}

impl EngineProcess {
    fn spawn(config: &EngineConfig) -> Result<Self, EngineError> {
        let program = config.program.display().to_string();
        log::info!("starting engine {program}");

        let mut child = Command::new(&config.program)
            .args(&config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|err| EngineError::Unavailable(format!("{program}: {err}")))?;

        let (stdin, stdout) = match (child.stdin.take(), child.stdout.take()) {
            (Some(stdin), Some(stdout)) => (stdin, stdout),
            _ => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(EngineError::Unavailable(format!(
                    "{program}: pipes not captured"
                )));
            }
        };

        let (tx, rx) = crossbeam_channel::unbounded();
        let spawned = thread::Builder::new()
            .name("uci-reader".into())
            .spawn(move || {
                for line in BufReader::new(stdout).lines() {
                    let Ok(line) = line else { break };
                    if tx.send(line).is_err() {
                        break;
                    }
                }
            });

        let mut process = Self {
            child,
            conversation: Conversation::new(stdin, rx),
            exited: false,
        };

        if let Err(err) = spawned {
            process.shutdown();
            return Err(EngineError::Unavailable(format!(
                "{program}: failed to start reader: {err}"
            )));
        }

        if let Err(err) = process.conversation.handshake(config.handshake_timeout) {
            process.shutdown();
            return Err(err);
        }

        Ok(process)
    }

    /// Ask the engine to quit, then kill it if it lingers.
    fn shutdown(&mut self) {
        if self.exited {
            return;
        }
        self.exited = true;

        let _ = self.conversation.send(GuiCommand::Quit);
        let deadline = Instant::now() + EXIT_GRACE;
        loop {
            match self.child.try_wait() {
                Ok(Some(status)) => {
                    log::debug!("engine exited with {status}");
                    return;
                }
                Ok(None) if Instant::now() < deadline => thread::sleep(Duration::from_millis(10)),
                _ => break,
            }
        }

        log::debug!("killing unresponsive engine");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for EngineProcess {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// The request/response half of the protocol, independent of the process.
#[derive(Debug)]
struct Conversation<W: Write> {
    writer: W,
    lines: Receiver<String>,
}

impl<W: Write> Conversation<W> {
    fn new(writer: W, lines: Receiver<String>) -> Self {
        Self { writer, lines }
    }

    fn send(&mut self, command: GuiCommand) -> Result<(), EngineError> {
        log::debug!("engine << {command}");
        writeln!(self.writer, "{command}")
            .and_then(|()| self.writer.flush())
            .map_err(|err| EngineError::Crashed(format!("failed to write to engine: {err}")))
    }

    /// Read lines until `accept` picks one, the engine goes away, or time runs out.
    fn wait_for<T>(
        &mut self,
        timeout: Duration,
        mut accept: impl FnMut(EngineMessage) -> Option<T>,
    ) -> Result<T, EngineError> {
        let deadline = Instant::now() + timeout;
        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.lines.recv_timeout(remaining) {
                Ok(line) => {
                    log::debug!("engine >> {line}");
                    if let Some(value) = accept(EngineMessage::parse(&line)) {
                        return Ok(value);
                    }
                }
                Err(RecvTimeoutError::Timeout) => return Err(EngineError::Timeout(timeout)),
                Err(RecvTimeoutError::Disconnected) => {
                    return Err(EngineError::Crashed(
                        "engine exited before answering".to_string(),
                    ));
                }
            }
        }
    }

    fn handshake(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send(GuiCommand::Uci)?;
        self.wait_for(timeout, |msg| match msg {
            EngineMessage::Id { key, value } => {
                log::info!("engine {key}: {value}");
                None
            }
            EngineMessage::UciOk => Some(()),
            _ => None,
        })?;
        self.sync(timeout)
    }

    fn sync(&mut self, timeout: Duration) -> Result<(), EngineError> {
        self.send(GuiCommand::IsReady)?;
        self.wait_for(timeout, |msg| (msg == EngineMessage::ReadyOk).then_some(()))
    }

    /// Run one search and return the raw `bestmove` token.
    fn search(
        &mut self,
        position: &Position,
        budget: Duration,
        grace: Duration,
        sync_timeout: Duration,
    ) -> Result<String, EngineError> {
        self.send(GuiCommand::UciNewGame)?;
        self.sync(sync_timeout)?;
        self.send(GuiCommand::Position {
            fen: position.to_fen(),
        })?;
        self.send(GuiCommand::Go { movetime: budget })?;
        self.wait_for(budget + grace, |msg| match msg {
            EngineMessage::BestMove { best, .. } => Some(best),
            _ => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::Sender;

    const SHORT: Duration = Duration::from_millis(50);

    /// Conversation whose engine side has already printed `lines`.
    fn scripted(lines: &[&str]) -> (Conversation<Vec<u8>>, Sender<String>) {
        let (tx, rx) = crossbeam_channel::unbounded();
        for line in lines {
            tx.send(line.to_string()).expect("receiver alive");
        }
        (Conversation::new(Vec::new(), rx), tx)
    }

    fn written(conversation: &Conversation<Vec<u8>>) -> Vec<String> {
        String::from_utf8(conversation.writer.clone())
            .expect("commands are UTF-8")
            .lines()
            .map(str::to_string)
            .collect()
    }

    #[test]
    fn test_handshake() {
        let (mut conversation, _tx) = scripted(&["id name Fake", "option name Hash", "uciok", "readyok"]);

        conversation.handshake(SHORT).expect("handshake should succeed");

        assert_eq!(written(&conversation), ["uci", "isready"]);
    }

    #[test]
    fn test_search_sends_position_and_movetime() {
        let (mut conversation, _tx) = scripted(&[
            "readyok",
            "info depth 1 score cp 20 pv e2e4",
            "bestmove e2e4 ponder e7e5",
        ]);

        let best = conversation
            .search(&Position::new(), Duration::from_millis(2000), SHORT, SHORT)
            .expect("search should answer");

        assert_eq!(best, "e2e4");
        assert_eq!(
            written(&conversation),
            [
                "ucinewgame",
                "isready",
                "position fen rnbqkbnr/pppppppp/8/8/8/8/PPPPPPPP/RNBQKBNR w KQkq - 0 1",
                "go movetime 2000",
            ]
        );
    }

    #[test]
    fn test_exit_before_answer_is_crash() {
        let (mut conversation, tx) = scripted(&["readyok", "info depth 1"]);
        drop(tx);

        let result = conversation.search(&Position::new(), SHORT, SHORT, SHORT);

        assert!(matches!(result, Err(EngineError::Crashed(_))));
    }

    #[test]
    fn test_silent_engine_times_out() {
        let (mut conversation, _tx) = scripted(&[]);

        let result = conversation.handshake(SHORT);

        assert_eq!(result, Err(EngineError::Timeout(SHORT)));
    }

    #[test]
    fn test_parse_best_move_legal() {
        assert_eq!(
            parse_best_move(&Position::new(), "e2e4"),
            Ok(Move::new(shakmaty::Square::E2, shakmaty::Square::E4))
        );
    }

    #[test]
    fn test_parse_best_move_rejects_illegal_and_garbage() {
        for notation in ["e2e5", "e7e5", "(none)", "0000", ""] {
            assert!(
                matches!(
                    parse_best_move(&Position::new(), notation),
                    Err(EngineError::ProtocolViolation(_))
                ),
                "{notation:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_missing_program_is_unavailable() {
        let mut engine = UciEngine::new(EngineConfig::new("/nonexistent/uci-engine-binary"));

        let result = engine.request_move(&Position::new(), SHORT);

        assert!(matches!(result, Err(EngineError::Unavailable(_))));
    }
}
