use std::ffi::OsString;
use std::path::PathBuf;
use std::time::Duration;

use crate::engine::DEFAULT_TIME_BUDGET;
use crate::geometry::BoardGeometry;
use crate::termination::DrawRules;

/// Session settings, fixed for the lifetime of a [`GameSession`](crate::session::GameSession).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Search time granted to the engine per move.
    pub time_budget: Duration,
    /// Maps pointer coordinates to squares.
    pub geometry: BoardGeometry,
    pub draw_rules: DrawRules,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            time_budget: DEFAULT_TIME_BUDGET,
            geometry: BoardGeometry::default(),
            draw_rules: DrawRules::default(),
        }
    }
}

/// Whether the engine process outlives a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SpawnPolicy {
    /// Start a fresh process for every move and tear it down afterwards.
    #[default]
    PerRequest,
    /// Keep one process alive between requests. A failed request still
    /// discards it so the next one starts clean.
    Persistent,
}

/// How to launch and talk to an external UCI engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EngineConfig {
    pub program: PathBuf,
    pub args: Vec<OsString>,
    pub policy: SpawnPolicy,
    /// Upper bound for `uci`/`isready` round trips.
    pub handshake_timeout: Duration,
    /// Extra time allowed past the search budget before giving up.
    pub grace: Duration,
}

impl EngineConfig {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
            policy: SpawnPolicy::default(),
            handshake_timeout: Duration::from_secs(5),
            grace: Duration::from_secs(1),
        }
    }

    pub fn arg(mut self, arg: impl Into<OsString>) -> Self {
        self.args.push(arg.into());
        self
    }

    pub fn policy(mut self, policy: SpawnPolicy) -> Self {
        self.policy = policy;
        self
    }
}
