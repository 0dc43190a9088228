//! Versioned, read-only engine capability registry.

use std::path::Path;

use adforge_models::EngineDescriptor;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{RouterError, RouterResult};

/// Registry format version this build understands.
pub const REGISTRY_VERSION: u32 = 1;

/// Engine descriptors in declaration order.
///
/// Declaration order is the tie-break when two engines score the same.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineRegistry {
    pub version: u32,
    #[serde(default)]
    pub engines: Vec<EngineDescriptor>,
}

impl EngineRegistry {
    pub fn new(engines: Vec<EngineDescriptor>) -> RouterResult<Self> {
        let registry = Self {
            version: REGISTRY_VERSION,
            engines,
        };
        registry.check()?;
        Ok(registry)
    }

    /// Parse and check a registry document.
    pub fn from_json_str(json: &str) -> RouterResult<Self> {
        let registry: Self = serde_json::from_str(json)?;
        registry.check()?;
        Ok(registry)
    }

    /// Load a registry file.
    pub fn from_file(path: impl AsRef<Path>) -> RouterResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| RouterError::RegistryIo {
            path: path.to_path_buf(),
            source,
        })?;
        let registry = Self::from_json_str(&json)?;
        info!(
            "Loaded engine registry v{} from {} ({} engines)",
            registry.version,
            path.display(),
            registry.engines.len()
        );
        Ok(registry)
    }

    pub fn get(&self, id: &str) -> Option<&EngineDescriptor> {
        self.engines.iter().find(|e| e.id == id)
    }

    pub fn is_empty(&self) -> bool {
        self.engines.is_empty()
    }

    pub fn len(&self) -> usize {
        self.engines.len()
    }

    fn check(&self) -> RouterResult<()> {
        if self.version != REGISTRY_VERSION {
            return Err(RouterError::UnsupportedVersion {
                found: self.version,
                expected: REGISTRY_VERSION,
            });
        }
        for (index, engine) in self.engines.iter().enumerate() {
            if engine.id.trim().is_empty() {
                return Err(RouterError::invalid_registry(format!(
                    "engine #{} has an empty id",
                    index + 1
                )));
            }
            if !(0.0..=1.0).contains(&engine.reliability) {
                return Err(RouterError::invalid_registry(format!(
                    "engine '{}' reliability {} is outside 0-1",
                    engine.id, engine.reliability
                )));
            }
            if self.engines[..index].iter().any(|e| e.id == engine.id) {
                return Err(RouterError::invalid_registry(format!(
                    "duplicate engine id '{}'",
                    engine.id
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const REGISTRY: &str = r#"{
        "version": 1,
        "engines": [
            {
                "id": "local-ffmpeg",
                "capabilities": {
                    "max_resolution": {"width": 1920, "height": 1080},
                    "max_duration_ms": 600000,
                    "filters": true
                },
                "cost_tier": "low",
                "reliability": 0.9,
                "backend": {"kind": "ffmpeg"}
            },
            {
                "id": "planner",
                "capabilities": {
                    "max_resolution": {"width": 3840, "height": 2160},
                    "max_duration_ms": 3600000
                },
                "cost_tier": "low",
                "reliability": 1.0,
                "available": false,
                "backend": {"kind": "dry_run"}
            }
        ]
    }"#;

    #[test]
    fn test_parse_registry() {
        let registry = EngineRegistry::from_json_str(REGISTRY).unwrap();
        assert_eq!(registry.len(), 2);
        assert!(registry.get("local-ffmpeg").unwrap().available);
        assert!(!registry.get("planner").unwrap().available);
        assert!(registry.get("cloud").is_none());
    }

    #[test]
    fn test_rejects_unknown_version() {
        let json = REGISTRY.replacen("\"version\": 1", "\"version\": 2", 1);
        assert!(matches!(
            EngineRegistry::from_json_str(&json),
            Err(RouterError::UnsupportedVersion { found: 2, .. })
        ));
    }

    #[test]
    fn test_rejects_duplicate_ids() {
        let json = REGISTRY.replace("\"planner\"", "\"local-ffmpeg\"");
        assert!(matches!(
            EngineRegistry::from_json_str(&json),
            Err(RouterError::InvalidRegistry(msg)) if msg.contains("duplicate")
        ));
    }

    #[test]
    fn test_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(REGISTRY.as_bytes()).unwrap();
        let registry = EngineRegistry::from_file(file.path()).unwrap();
        assert_eq!(registry.engines[0].id, "local-ffmpeg");

        assert!(matches!(
            EngineRegistry::from_file("/nonexistent/engines.json"),
            Err(RouterError::RegistryIo { .. })
        ));
    }
}
