//! Worker configuration.

use std::net::SocketAddr;
use std::path::PathBuf;

use adforge_router::RouterConfig;

/// Worker configuration.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Engine registry document
    pub registry_path: PathBuf,
    /// Prometheus listener; metrics are not exported when unset
    pub metrics_addr: Option<SocketAddr>,
    /// Asset used by proof-stack emphasis (testimonial card image)
    pub testimonial_asset: Option<String>,
    /// Router settings
    pub router: RouterConfig,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            registry_path: PathBuf::from("config/engines.json"),
            metrics_addr: None,
            testimonial_asset: None,
            router: RouterConfig::default(),
        }
    }
}

impl WorkerConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        Self {
            registry_path: std::env::var("ADFORGE_REGISTRY_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("config/engines.json")),
            metrics_addr: std::env::var("METRICS_ADDR")
                .ok()
                .and_then(|s| s.parse().ok()),
            testimonial_asset: std::env::var("ADFORGE_TESTIMONIAL_ASSET")
                .ok()
                .filter(|s| !s.is_empty()),
            router: RouterConfig::from_env(),
        }
    }
}
