//! collab-bench library
//!
//! Load generator for the collaborative editor WebSocket service. Exported
//! as a library so integration tests can drive runs against stub servers.

pub mod client;
pub mod config;
pub mod driver;
pub mod error;
pub mod protocol;
pub mod script;
pub mod stats;

// Re-export commonly used types
pub use config::{BenchConfig, Scheme, ScriptConfig};
pub use driver::LoadDriver;
pub use error::{ClientError, ConfigError, FailureStep};
pub use protocol::{ChangeMsg, Event, EventKind, LoginMsg, Range};
pub use stats::{ClientFailure, RunSummary, Tally};
