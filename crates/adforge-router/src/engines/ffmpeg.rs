//! Local FFmpeg engine.

use std::path::PathBuf;
use std::time::Duration;

use adforge_media::{plan_command, FfmpegRunner, MediaError};
use async_trait::async_trait;
use tracing::{info, warn};

use crate::engine::{EngineJob, EngineStatus, OutputReference, RenderEngine};
use crate::error::EngineError;

/// Renders plans with a local FFmpeg process.
pub struct FfmpegEngine {
    id: String,
    binary: Option<String>,
    output_dir: PathBuf,
    timeout: Duration,
}

impl FfmpegEngine {
    pub fn new(id: impl Into<String>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            id: id.into(),
            binary: None,
            output_dir: output_dir.into(),
            timeout: Duration::from_secs(300),
        }
    }

    pub fn with_binary(mut self, binary: Option<String>) -> Self {
        self.binary = binary;
        self
    }

    /// Kill the process after `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn runner(&self) -> FfmpegRunner {
        let runner = FfmpegRunner::new().with_timeout(self.timeout.as_secs().max(1));
        match &self.binary {
            Some(binary) => runner.with_binary(binary.clone()),
            None => runner,
        }
    }
}

fn engine_error(err: MediaError) -> EngineError {
    match err {
        MediaError::FfmpegNotFound => EngineError::unavailable(err.to_string()),
        MediaError::Timeout(secs) => EngineError::Timeout(secs.saturating_mul(1000)),
        MediaError::PlanNotReady(reason) => EngineError::rejected(reason),
        other if other.is_transient() => EngineError::transient(other.to_string()),
        MediaError::FfmpegFailed {
            message, stderr, ..
        } => EngineError::rejected(match stderr {
            Some(stderr) => format!("{}: {}", message, stderr),
            None => message,
        }),
        other => EngineError::rejected(other.to_string()),
    }
}

#[async_trait]
impl RenderEngine for FfmpegEngine {
    fn id(&self) -> &str {
        &self.id
    }

    async fn submit(&self, job: &EngineJob) -> Result<EngineStatus, EngineError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| EngineError::transient(format!("cannot create output dir: {}", e)))?;

        let output = self.output_dir.join(format!(
            "{}.{}",
            job.job_id,
            job.plan.output.container.extension()
        ));
        let cmd = plan_command(&job.plan, &output).map_err(engine_error)?;

        info!(job_id = %job.job_id, engine_id = %self.id, "Rendering {} to {}", job.plan.plan_id, output.display());

        let total_ms = job.plan.total_duration_ms() as i64;
        let progress = job.progress.clone();
        self.runner()
            .run_with_progress(&cmd, move |p| progress(p.to_render_progress(total_ms)))
            .await
            .map_err(engine_error)?;

        let size = tokio::fs::metadata(&output)
            .await
            .map(|m| m.len())
            .unwrap_or(0);
        if size == 0 {
            warn!(job_id = %job.job_id, "FFmpeg produced an empty file");
            return Err(EngineError::invalid_output(format!(
                "{} is empty",
                output.display()
            )));
        }

        Ok(EngineStatus::Done(OutputReference {
            uri: format!("file://{}", output.display()),
            duration_ms: None,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::plan;
    use adforge_media::noop_progress;
    use adforge_models::{JobId, PlanStatus, Resolution};

    #[test]
    fn test_error_mapping() {
        assert!(matches!(
            engine_error(MediaError::FfmpegNotFound),
            EngineError::Unavailable(_)
        ));
        assert_eq!(engine_error(MediaError::Timeout(5)), EngineError::Timeout(5_000));
        assert!(engine_error(MediaError::ffmpeg_failed("crashed", None, None)).is_transient());
        let rejected = engine_error(MediaError::ffmpeg_failed(
            "exit 1",
            Some("Invalid argument".to_string()),
            Some(1),
        ));
        assert_eq!(rejected, EngineError::rejected("exit 1: Invalid argument"));
    }

    #[tokio::test]
    async fn test_missing_binary_is_unavailable() {
        let dir = tempfile::tempdir().unwrap();
        let engine = FfmpegEngine::new("local", dir.path())
            .with_binary(Some("adforge-no-such-ffmpeg".to_string()));
        let job = EngineJob {
            job_id: JobId::from_string("job-1"),
            plan: plan(Resolution::HD),
            progress: noop_progress(),
        };
        let err = engine.submit(&job).await.unwrap_err();
        assert!(matches!(err, EngineError::Unavailable(_)));
    }

    #[tokio::test]
    async fn test_unready_plan_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut plan = plan(Resolution::HD);
        plan.status = PlanStatus::Uncompilable {
            reason: "no cta".to_string(),
        };
        let job = EngineJob {
            job_id: JobId::from_string("job-2"),
            plan,
            progress: noop_progress(),
        };
        let err = FfmpegEngine::new("local", dir.path())
            .submit(&job)
            .await
            .unwrap_err();
        assert_eq!(err, EngineError::rejected("no cta"));
    }
}
