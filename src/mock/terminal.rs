use std::io::{self, BufRead, Write};
use std::thread;

use crossbeam_channel::{Receiver, select};

use super::{ScriptedInput, TerminalRenderer};
use crate::position::Position;
use crate::session::{GameSession, SessionEvent};
use crate::{BoardRenderer, InputSource};

/// Clears the screen and moves cursor to top-left.
#[inline]
fn clear_screen() {
    print!("\x1B[2J\x1B[H");
}

/// Runs an interactive terminal front end for a session.
///
/// Input lines are read on a separate thread so engine answers are shown
/// as soon as they arrive, without waiting for the next keystroke.
pub fn run_interactive_terminal(mut session: GameSession) {
    let mut renderer = TerminalRenderer::new();
    let lines = spawn_stdin_reader();
    let completions = session
        .completion_receiver()
        .unwrap_or_else(crossbeam_channel::never);

    redraw(&mut renderer, &session, None);

    while !session.is_finished() {
        prompt();

        let note = select! {
            recv(lines) -> line => match line {
                Ok(line) => run_command(&mut session, line.trim()),
                Err(_) => break,
            },
            recv(completions) -> completion => {
                match completion {
                    Ok(completion) => describe(&session.handle_completion(completion)),
                    Err(_) => break,
                }
            },
        };

        if !session.is_finished() {
            redraw(&mut renderer, &session, note.as_deref());
        }
    }
}

/// Forward stdin lines over a channel until EOF.
fn spawn_stdin_reader() -> Receiver<String> {
    let (tx, rx) = crossbeam_channel::unbounded();
    let spawned = thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else { break };
                if tx.send(line).is_err() {
                    break;
                }
            }
        });
    if let Err(err) = spawned {
        log::error!("failed to start input reader: {err}");
    }
    rx
}

/// Run one command line, returning a note to show under the board.
fn run_command(session: &mut GameSession, command: &str) -> Option<String> {
    let mut parts = command.splitn(2, ' ');
    match (parts.next().unwrap_or_default(), parts.next()) {
        ("", _) => None,
        ("retry", _) => describe(&session.retry_engine()),
        ("fen", _) => Some(session.current_position().to_fen()),
        ("load", Some(fen)) => match Position::from_fen(fen.trim()) {
            Ok(position) => {
                session.load_position(position);
                Some("Position loaded from FEN".to_string())
            }
            Err(err) => Some(err.to_string()),
        },
        ("help" | "?", _) => Some(HELP.to_string()),
        _ => {
            let mut input = ScriptedInput::new(session.config().geometry);
            if let Err(err) = input.push_script(command) {
                return Some(format!("{err} (type 'help')"));
            }
            let mut note = None;
            while let Ok(Some(event)) = input.next_event() {
                note = describe(&session.handle(event)).or(note);
            }
            note
        }
    }
}

fn describe(event: &SessionEvent) -> Option<String> {
    match event {
        SessionEvent::IllegalMoveAttempt(mv) => Some(format!("Illegal move: {mv}")),
        SessionEvent::EngineFailed(err) => Some(format!("Engine failed: {err}")),
        SessionEvent::MoveApplied { mv, .. } => Some(format!("Played {mv}")),
        SessionEvent::Restarted => Some("New game".to_string()),
        _ => None,
    }
}

fn redraw(renderer: &mut TerminalRenderer, session: &GameSession, note: Option<&str>) {
    clear_screen();
    println!("♟️  UCI Chess Session");
    println!();
    if let Err(err) = renderer.render(session) {
        log::error!("{err}");
    }
    println!();
    println!("{HELP}");
    if let Some(note) = note {
        println!();
        println!("{note}");
    }
}

fn prompt() {
    print!("> ");
    if let Err(err) = io::stdout().flush() {
        log::warn!("failed to flush stdout: {err}");
    }
}

const HELP: &str = "Commands: e2e4 | e7e8n | e2 (hold) | >e4 (drag) | ^e4 (drop) | \
                    retry | fen | load <fen> | r (restart) | q (quit)";
