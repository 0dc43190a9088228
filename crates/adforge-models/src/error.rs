//! Error types for model parsing and validation.

use thiserror::Error;

/// Result type for model operations.
pub type ModelResult<T> = Result<T, ModelError>;

/// Errors raised when an input document is rejected at the boundary.
#[derive(Debug, Error)]
pub enum ModelError {
    #[error("{document} is not valid JSON: {source}")]
    InvalidJson {
        document: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("{document} failed validation: {message}")]
    Validation {
        document: &'static str,
        message: String,
    },

    #[error("Unknown {kind}: {value}")]
    UnknownVariant { kind: &'static str, value: String },
}

impl ModelError {
    /// Create a validation error for the named document.
    pub fn validation(document: &'static str, message: impl Into<String>) -> Self {
        Self::Validation {
            document,
            message: message.into(),
        }
    }

    /// Create an unknown-variant error (used by `FromStr` impls).
    pub fn unknown_variant(kind: &'static str, value: impl Into<String>) -> Self {
        Self::UnknownVariant {
            kind,
            value: value.into(),
        }
    }

    /// Name of the rejected document, if the error is about one.
    pub fn document(&self) -> Option<&'static str> {
        match self {
            ModelError::InvalidJson { document, .. } | ModelError::Validation { document, .. } => {
                Some(document)
            }
            ModelError::UnknownVariant { .. } => None,
        }
    }
}
