use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::{Parser, ValueEnum};
use uci_chess_session::termination::DrawRules;
use uci_chess_session::{
    Color, EngineConfig, GameSession, SessionConfig, SpawnPolicy, UciEngine, mock,
};

/// Play chess in the terminal against a friend or a UCI engine.
#[derive(Debug, Parser)]
#[command(version, about)]
struct Args {
    /// Path to a UCI engine; without it both sides are played by hand
    #[arg(long)]
    engine: Option<PathBuf>,

    /// Extra argument passed to the engine (repeatable)
    #[arg(long = "engine-arg", allow_hyphen_values = true)]
    engine_args: Vec<String>,

    /// Side played by the engine
    #[arg(long, value_enum, default_value_t = Side::White)]
    engine_side: Side,

    /// Engine thinking time per move, in milliseconds
    #[arg(long, default_value_t = 2000)]
    movetime: u64,

    /// Keep one engine process for the whole session
    #[arg(long)]
    persistent: bool,

    /// End the game as a draw once the fifty-move rule applies
    #[arg(long)]
    fifty_move_rule: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum Side {
    White,
    Black,
}

impl From<Side> for Color {
    fn from(side: Side) -> Self {
        match side {
            Side::White => Color::White,
            Side::Black => Color::Black,
        }
    }
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    let config = SessionConfig {
        time_budget: Duration::from_millis(args.movetime),
        draw_rules: DrawRules {
            fifty_move: args.fifty_move_rule,
        },
        ..SessionConfig::default()
    };

    let session = match args.engine {
        None => GameSession::new(config),
        Some(program) => {
            let policy = if args.persistent {
                SpawnPolicy::Persistent
            } else {
                SpawnPolicy::PerRequest
            };
            let engine_config = args
                .engine_args
                .into_iter()
                .fold(EngineConfig::new(program).policy(policy), |config, arg| {
                    config.arg(arg)
                });

            let engine = UciEngine::new(engine_config);
            match GameSession::with_engine(config, args.engine_side.into(), engine) {
                Ok(session) => session,
                Err(err) => {
                    log::error!("{err}");
                    eprintln!("error: {err}");
                    return ExitCode::FAILURE;
                }
            }
        }
    };

    log::info!("starting session");
    mock::run_interactive_terminal(session);
    ExitCode::SUCCESS
}
