//! Router configuration.

use std::path::PathBuf;
use std::time::Duration;

/// Router configuration.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Deadline for one engine attempt, polling included
    pub engine_timeout: Duration,
    /// Delay between polls of a queued engine job
    pub poll_interval: Duration,
    /// Polls before a queued job counts as failed
    pub max_polls: u32,
    /// Engine switches allowed at the switch-engine level
    pub max_engine_switches: u32,
    /// Concurrent routes in a batch
    pub batch_concurrency: usize,
    /// Where local engines write rendered files
    pub output_dir: PathBuf,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            engine_timeout: Duration::from_secs(300),
            poll_interval: Duration::from_secs(2),
            max_polls: 30,
            max_engine_switches: 3,
            batch_concurrency: 4,
            output_dir: PathBuf::from("/tmp/adforge"),
        }
    }
}

impl RouterConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            engine_timeout: Duration::from_secs(
                std::env::var("ADFORGE_ENGINE_TIMEOUT_SECS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(300),
            ),
            poll_interval: Duration::from_millis(
                std::env::var("ADFORGE_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(2_000),
            ),
            max_polls: std::env::var("ADFORGE_MAX_POLLS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_polls),
            max_engine_switches: std::env::var("ADFORGE_MAX_ENGINE_SWITCHES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_engine_switches),
            batch_concurrency: std::env::var("ADFORGE_BATCH_CONCURRENCY")
                .ok()
                .and_then(|s| s.parse().ok())
                .filter(|n: &usize| *n > 0)
                .unwrap_or(defaults.batch_concurrency),
            output_dir: std::env::var("ADFORGE_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_dir),
        }
    }
}
