//! Router and engine error types.

use std::path::PathBuf;

use adforge_models::RouteState;
use thiserror::Error;

pub type RouterResult<T> = Result<T, RouterError>;

/// Errors raised while building the router. Routing itself never fails.
#[derive(Debug, Error)]
pub enum RouterError {
    #[error("Failed to read engine registry {path}: {source}")]
    RegistryIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid engine registry: {0}")]
    RegistryParse(#[from] serde_json::Error),

    #[error("Unsupported registry version {found} (expected {expected})")]
    UnsupportedVersion { found: u32, expected: u32 },

    #[error("Invalid engine registry: {0}")]
    InvalidRegistry(String),

    #[error("Cannot bind engine '{engine_id}': {message}")]
    Binding { engine_id: String, message: String },

    #[error("Illegal state transition {from} -> {to}")]
    InvalidTransition { from: RouteState, to: RouteState },
}

impl RouterError {
    pub fn invalid_registry(msg: impl Into<String>) -> Self {
        Self::InvalidRegistry(msg.into())
    }

    pub fn binding(engine_id: impl Into<String>, msg: impl Into<String>) -> Self {
        Self::Binding {
            engine_id: engine_id.into(),
            message: msg.into(),
        }
    }
}

/// Failure reported by a single engine call.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum EngineError {
    #[error("Transient engine failure: {0}")]
    Transient(String),

    #[error("Engine rejected the job: {0}")]
    Rejected(String),

    /// Deadline in milliseconds
    #[error("Engine call timed out after {0}ms")]
    Timeout(u64),

    #[error("Engine still busy after {0} polls")]
    PollExhausted(u32),

    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    #[error("Invalid engine output: {0}")]
    InvalidOutput(String),

    #[error("Engine panicked: {0}")]
    Panicked(String),
}

impl EngineError {
    pub fn transient(msg: impl Into<String>) -> Self {
        Self::Transient(msg.into())
    }

    pub fn rejected(msg: impl Into<String>) -> Self {
        Self::Rejected(msg.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        Self::Unavailable(msg.into())
    }

    pub fn invalid_output(msg: impl Into<String>) -> Self {
        Self::InvalidOutput(msg.into())
    }

    /// Whether retrying the same engine may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, EngineError::Transient(_) | EngineError::Timeout(_))
    }

    /// Stable code recorded in the job history.
    pub fn code(&self) -> &'static str {
        match self {
            EngineError::Transient(_) => "transient",
            EngineError::Rejected(_) => "rejected",
            EngineError::Timeout(_) => "timeout",
            EngineError::PollExhausted(_) => "poll_exhausted",
            EngineError::Unavailable(_) => "unavailable",
            EngineError::InvalidOutput(_) => "invalid_output",
            EngineError::Panicked(_) => "panicked",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(EngineError::transient("503").is_transient());
        assert!(EngineError::Timeout(300_000).is_transient());
        assert!(!EngineError::Panicked("boom".to_string()).is_transient());
        assert!(!EngineError::PollExhausted(30).is_transient());
        assert!(!EngineError::rejected("bad plan").is_transient());
        assert_eq!(EngineError::invalid_output("empty").code(), "invalid_output");
    }

    #[test]
    fn test_sub_second_timeout_message() {
        assert_eq!(
            EngineError::Timeout(20).to_string(),
            "Engine call timed out after 20ms"
        );
    }
}
