//! Run configuration
//!
//! Every knob has a default matching the reference benchmark: 100 clients,
//! 100 changes per phase, a 5s settle delay, a fast phase at 100ms, a 60s
//! pause, a slow phase at 1s and a 60s linger before closing.

use crate::error::ConfigError;
use clap::{Parser, ValueEnum};
use std::ffi::OsString;
use std::fmt;
use std::time::Duration;

/// Session shared by every simulated client of a run
pub const DEFAULT_SESSION_ID: &str = "__bench_test";

/// WebSocket URL scheme
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scheme {
    Ws,
    Wss,
}

impl fmt::Display for Scheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scheme::Ws => f.write_str("ws"),
            Scheme::Wss => f.write_str("wss"),
        }
    }
}

/// Command-line arguments
#[derive(Parser, Debug)]
#[command(name = "collab-bench")]
#[command(about = "Replay scripted editing sessions against a collaborative editor")]
#[command(version)]
pub struct Args {
    /// Target service address
    #[arg(long, default_value = "localhost:1337")]
    pub addr: String,

    /// URL scheme used to reach the service
    #[arg(long, value_enum, default_value_t = Scheme::Wss)]
    pub scheme: Scheme,

    /// Number of simulated clients
    #[arg(long, default_value = "100")]
    pub clients: usize,

    /// Change events sent in each phase
    #[arg(long, default_value = "100")]
    pub messages: usize,

    /// Session identifier shared by all clients
    #[arg(long, default_value = DEFAULT_SESSION_ID)]
    pub session: String,

    /// Delay between login and the first change, in milliseconds
    #[arg(long, default_value = "5000")]
    pub settle_ms: u64,

    /// Interval between changes in the fast phase, in milliseconds
    #[arg(long, default_value = "100")]
    pub fast_interval_ms: u64,

    /// Delay between the two phases, in milliseconds
    #[arg(long, default_value = "60000")]
    pub pause_ms: u64,

    /// Interval between changes in the slow phase, in milliseconds
    #[arg(long, default_value = "1000")]
    pub slow_interval_ms: u64,

    /// Delay between the last change and the close frame, in milliseconds
    #[arg(long, default_value = "60000")]
    pub linger_ms: u64,

    /// Upper bound on clients running at once (unbounded when omitted)
    #[arg(long, value_parser = parse_concurrency)]
    pub max_concurrency: Option<usize>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

impl Args {
    /// Parse the process arguments, accepting the single-dash `-addr` form
    pub fn from_cli() -> Self {
        Self::parse_from(normalize_args(std::env::args_os()))
    }
}

/// Rewrite `-addr <v>` and `-addr=<v>` into their `--addr` spelling
pub fn normalize_args<I, T>(args: I) -> Vec<OsString>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString>,
{
    args.into_iter()
        .map(Into::into)
        .map(|arg| match arg.to_str() {
            Some("-addr") => OsString::from("--addr"),
            Some(s) if s.starts_with("-addr=") => OsString::from(format!("-{}", s)),
            _ => arg,
        })
        .collect()
}

fn parse_concurrency(s: &str) -> Result<usize, String> {
    match s.parse::<usize>() {
        Ok(0) => Err("must be at least 1".to_string()),
        Ok(n) => Ok(n),
        Err(e) => Err(e.to_string()),
    }
}

/// Timing and volume of the per-client script
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptConfig {
    /// Change events per phase
    pub messages: usize,
    /// Delay after login
    pub settle: Duration,
    /// Interval between changes in the fast phase
    pub fast_interval: Duration,
    /// Delay between phases
    pub pause: Duration,
    /// Interval between changes in the slow phase
    pub slow_interval: Duration,
    /// Delay before the close frame
    pub linger: Duration,
}

impl Default for ScriptConfig {
    fn default() -> Self {
        Self {
            messages: 100,
            settle: Duration::from_secs(5),
            fast_interval: Duration::from_millis(100),
            pause: Duration::from_secs(60),
            slow_interval: Duration::from_secs(1),
            linger: Duration::from_secs(60),
        }
    }
}

impl ScriptConfig {
    /// Lower bound on how long one successful client takes, ignoring I/O
    pub fn min_duration(&self) -> Duration {
        let messages = u32::try_from(self.messages).unwrap_or(u32::MAX);
        self.settle
            + self.fast_interval.saturating_mul(messages)
            + self.pause
            + self.slow_interval.saturating_mul(messages)
            + self.linger
    }
}

/// Main load driver configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BenchConfig {
    /// Target `host:port`
    pub addr: String,
    pub scheme: Scheme,
    /// Number of simulated clients
    pub clients: usize,
    /// Concurrency ceiling, `None` launches every client at once
    pub max_concurrency: Option<usize>,
    /// Session identifier shared by all clients
    pub session_id: String,
    pub script: ScriptConfig,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            addr: "localhost:1337".to_string(),
            scheme: Scheme::Wss,
            clients: 100,
            max_concurrency: None,
            session_id: DEFAULT_SESSION_ID.to_string(),
            script: ScriptConfig::default(),
        }
    }
}

impl BenchConfig {
    /// Target URL, `<scheme>://<addr>` with no path
    pub fn url(&self) -> String {
        format!("{}://{}", self.scheme, self.addr)
    }

    /// Reject settings that would stall the run.
    ///
    /// The target address is not checked here: an unusable address fails
    /// every client at connect time and still yields a `0 / N` tally.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == Some(0) {
            return Err(ConfigError::ZeroConcurrency);
        }
        Ok(())
    }
}

impl From<Args> for BenchConfig {
    fn from(args: Args) -> Self {
        Self {
            addr: args.addr,
            scheme: args.scheme,
            clients: args.clients,
            max_concurrency: args.max_concurrency,
            session_id: args.session,
            script: ScriptConfig {
                messages: args.messages,
                settle: Duration::from_millis(args.settle_ms),
                fast_interval: Duration::from_millis(args.fast_interval_ms),
                pause: Duration::from_millis(args.pause_ms),
                slow_interval: Duration::from_millis(args.slow_interval_ms),
                linger: Duration::from_millis(args.linger_ms),
            },
        }
    }
}
