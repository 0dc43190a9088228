//! Planning-mode engine.

use async_trait::async_trait;
use tracing::debug;

use crate::engine::{EngineJob, EngineStatus, OutputReference, RenderEngine};
use crate::error::EngineError;

/// Accepts every plan and renders nothing.
///
/// Returns a `dryrun://` reference carrying the plan duration, so the rest
/// of the route (validation, history, metrics) runs as it would for real.
pub struct DryRunEngine {
    id: String,
}

impl DryRunEngine {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

#[async_trait]
impl RenderEngine for DryRunEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&self, job: &EngineJob) -> Result<EngineStatus, EngineError> {
        debug!(job_id = %job.job_id, engine_id = %self.id, "Dry run accepted plan {}", job.plan.plan_id);
        job.report(100.0, "Dry run complete");
        Ok(EngineStatus::Done(OutputReference {
            uri: format!("dryrun://{}/{}", self.id, job.plan.plan_id),
            duration_ms: Some(job.plan.total_duration_ms()),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plan;
    use adforge_media::RenderProgress;
    use adforge_models::{JobId, Resolution};
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_dry_run_reports_plan() {
        let seen: Arc<Mutex<Vec<RenderProgress>>> = Arc::new(Mutex::new(Vec::new()));
        let sink = seen.clone();
        let job = EngineJob {
            job_id: JobId::from_string("job-1"),
            plan: plan(Resolution::FULL_HD),
            progress: Arc::new(move |event| sink.lock().unwrap().push(event)),
        };

        let status = DryRunEngine::new("planner").submit(&job).await.unwrap();
        assert_eq!(
            status,
            EngineStatus::Done(OutputReference {
                uri: "dryrun://planner/plan-test".to_string(),
                duration_ms: Some(10_000),
            })
        );
        assert_eq!(seen.lock().unwrap()[0].percent, 100.0);
    }

    #[tokio::test]
    async fn test_poll_unsupported() {
        let err = DryRunEngine::new("planner").poll("t-1").await.unwrap_err();
        assert!(!err.is_transient());
    }
}
