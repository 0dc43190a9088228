//! The engine invocation contract.

use adforge_media::{ProgressCallback, RenderProgress};
use adforge_models::{JobId, RenderPlan};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::EngineError;

/// Everything an engine receives for one attempt.
#[derive(Clone)]
pub struct EngineJob {
    pub job_id: JobId,
    pub plan: RenderPlan,
    pub progress: ProgressCallback,
}

impl EngineJob {
    pub fn report(&self, percent: f64, message: impl Into<String>) {
        (self.progress)(RenderProgress::new(percent, message));
    }
}

/// Where a finished render can be fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OutputReference {
    pub uri: String,
    /// Duration reported by the engine, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_ms: Option<u64>,
}

/// Answer to a submit or poll call.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineStatus {
    Done(OutputReference),
    /// Accepted but not finished; poll with the ticket
    Queued { ticket: String },
}

/// A rendering backend.
///
/// Local processes and remote services implement the same contract. Errors
/// are returned, never raised past the router.
#[async_trait]
pub trait RenderEngine: Send + Sync {
    fn id(&self) -> &str;

    async fn submit(&self, job: &EngineJob) -> Result<EngineStatus, EngineError>;

    async fn poll(&self, ticket: &str) -> Result<EngineStatus, EngineError> {
        Err(EngineError::rejected(format!(
            "engine '{}' does not support polling (ticket {})",
            self.id(),
            ticket
        )))
    }
}
