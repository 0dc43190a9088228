//! Error types for media operations.

use thiserror::Error;

/// Result type for media operations.
pub type MediaResult<T> = Result<T, MediaError>;

/// Errors that can occur while rendering a plan locally.
#[derive(Debug, Error)]
pub enum MediaError {
    #[error("FFmpeg not found in PATH")]
    FfmpegNotFound,

    #[error("FFmpeg command failed: {message}")]
    FfmpegFailed {
        message: String,
        stderr: Option<String>,
        exit_code: Option<i32>,
    },

    #[error("Plan cannot be rendered: {0}")]
    PlanNotReady(String),

    #[error("Operation cancelled")]
    Cancelled,

    #[error("Operation timed out after {0} seconds")]
    Timeout(u64),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl MediaError {
    /// Create an FFmpeg failure error.
    pub fn ffmpeg_failed(
        message: impl Into<String>,
        stderr: Option<String>,
        exit_code: Option<i32>,
    ) -> Self {
        Self::FfmpegFailed {
            message: message.into(),
            stderr,
            exit_code,
        }
    }

    /// Create a plan-not-ready error.
    pub fn plan_not_ready(reason: impl Into<String>) -> Self {
        Self::PlanNotReady(reason.into())
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    /// Whether running the same command again may succeed.
    ///
    /// A process killed by a signal has no exit code and is treated as
    /// transient; a clean non-zero exit is not.
    pub fn is_transient(&self) -> bool {
        match self {
            MediaError::Timeout(_) | MediaError::Io(_) => true,
            MediaError::FfmpegFailed { exit_code, .. } => exit_code.is_none(),
            MediaError::FfmpegNotFound
            | MediaError::PlanNotReady(_)
            | MediaError::Cancelled
            | MediaError::Internal(_) => false,
        }
    }
}
