//! Worker error types.

use std::path::PathBuf;

use thiserror::Error;

pub type WorkerResult<T> = Result<T, WorkerError>;

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Failed to read {path}: {source}")]
    ReadFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Model error: {0}")]
    Model(#[from] adforge_models::ModelError),

    #[error("Router error: {0}")]
    Router(#[from] adforge_router::RouterError),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl WorkerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }

    /// Whether the caller's documents were rejected at the boundary.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            WorkerError::InvalidInput(_) | WorkerError::Model(_) | WorkerError::Json(_)
        )
    }

    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(self, WorkerError::Io(_) | WorkerError::ReadFailed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::ModelError;

    #[test]
    fn test_classification() {
        let err: WorkerError = ModelError::validation("analyzed video", "no segments").into();
        assert!(err.is_input_error());
        assert!(!err.is_retryable());

        let err = WorkerError::ReadFailed {
            path: PathBuf::from("/missing.json"),
            source: std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        };
        assert!(err.is_retryable());
        assert!(err.to_string().contains("/missing.json"));
    }
}
