//! Error types for the load driver

use thiserror::Error;
use tokio_tungstenite::tungstenite;

/// Why a simulated client abandoned its script.
///
/// The display text is what ends up in the per-client log line, prefixed by
/// the client index.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("connect error = {0}")]
    Connect(#[source] tungstenite::Error),
    #[error("write login error = {0}")]
    Login(#[source] tungstenite::Error),
    #[error("write change error = {0}")]
    Change(#[source] tungstenite::Error),
    #[error("close error = {0}")]
    Close(#[source] tungstenite::Error),
    #[error("encode error = {0}")]
    Encode(#[from] serde_json::Error),
}

/// Script step at which a client failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStep {
    Connect,
    Login,
    Change,
    Close,
    Encode,
}

impl ClientError {
    pub fn step(&self) -> FailureStep {
        match self {
            ClientError::Connect(_) => FailureStep::Connect,
            ClientError::Login(_) => FailureStep::Login,
            ClientError::Change(_) => FailureStep::Change,
            ClientError::Close(_) => FailureStep::Close,
            ClientError::Encode(_) => FailureStep::Encode,
        }
    }
}

impl FailureStep {
    pub fn as_str(&self) -> &'static str {
        match self {
            FailureStep::Connect => "connect",
            FailureStep::Login => "login",
            FailureStep::Change => "change",
            FailureStep::Close => "close",
            FailureStep::Encode => "encode",
        }
    }
}

/// Invalid run configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("max concurrency must be at least 1")]
    ZeroConcurrency,
}
