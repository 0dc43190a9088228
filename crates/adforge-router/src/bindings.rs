//! Engine instances keyed by registry id.

use std::collections::HashMap;
use std::sync::Arc;

use adforge_models::EngineBackend;
use tracing::{debug, warn};

use crate::config::RouterConfig;
use crate::engine::RenderEngine;
use crate::engines::{DryRunEngine, FfmpegEngine, HttpEngine};
use crate::error::{RouterError, RouterResult};
use crate::registry::EngineRegistry;

/// Read-only map from engine id to implementation.
#[derive(Default, Clone)]
pub struct EngineBindings {
    engines: HashMap<String, Arc<dyn RenderEngine>>,
}

impl EngineBindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build one engine per registry entry from its backend description.
    pub fn from_registry(registry: &EngineRegistry, config: &RouterConfig) -> RouterResult<Self> {
        let mut bindings = Self::new();
        for descriptor in &registry.engines {
            let engine: Arc<dyn RenderEngine> = match &descriptor.backend {
                EngineBackend::Ffmpeg { binary } => Arc::new(
                    FfmpegEngine::new(&descriptor.id, config.output_dir.join(&descriptor.id))
                        .with_binary(binary.clone())
                        .with_timeout(config.engine_timeout),
                ),
                EngineBackend::Http {
                    base_url,
                    api_key_env,
                } => {
                    if base_url.trim().is_empty() {
                        return Err(RouterError::binding(&descriptor.id, "base_url is empty"));
                    }
                    let api_key = api_key_env.as_ref().and_then(|var| {
                        let key = std::env::var(var).ok();
                        if key.is_none() {
                            warn!(engine_id = %descriptor.id, "{} not set, calling without credentials", var);
                        }
                        key
                    });
                    Arc::new(HttpEngine::new(&descriptor.id, base_url).with_api_key(api_key))
                }
                EngineBackend::DryRun => Arc::new(DryRunEngine::new(&descriptor.id)),
            };
            debug!(engine_id = %descriptor.id, "Bound engine");
            bindings.engines.insert(descriptor.id.clone(), engine);
        }
        Ok(bindings)
    }

    /// Bind `engine` under its own id, replacing any existing binding.
    pub fn with_engine(mut self, engine: Arc<dyn RenderEngine>) -> Self {
        self.engines.insert(engine.id().to_string(), engine);
        self
    }

    pub fn get(&self, id: &str) -> Option<Arc<dyn RenderEngine>> {
        self.engines.get(id).cloned()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }
}
