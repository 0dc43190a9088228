//! Rendering engine descriptors for the capability registry.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::render_plan::Resolution;

/// Coarse cost bucket of an engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "lowercase")]
pub enum CostTier {
    Low,
    Medium,
    High,
    Premium,
}

impl CostTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            CostTier::Low => "low",
            CostTier::Medium => "medium",
            CostTier::High => "high",
            CostTier::Premium => "premium",
        }
    }

    /// 1-based rank (low = 1).
    pub fn rank(&self) -> u8 {
        match self {
            CostTier::Low => 1,
            CostTier::Medium => 2,
            CostTier::High => 3,
            CostTier::Premium => 4,
        }
    }

    /// Score inversely proportional to the tier rank.
    pub fn cost_score(&self) -> f64 {
        1.0 / self.rank() as f64
    }
}

impl fmt::Display for CostTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Feature a render plan may require from an engine.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Filters,
    Overlays,
    Transitions,
    SpeedChange,
    MultiAudio,
    AudioFades,
}

impl Feature {
    pub const ALL: &'static [Feature] = &[
        Feature::Filters,
        Feature::Overlays,
        Feature::Transitions,
        Feature::SpeedChange,
        Feature::MultiAudio,
        Feature::AudioFades,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Feature::Filters => "filters",
            Feature::Overlays => "overlays",
            Feature::Transitions => "transitions",
            Feature::SpeedChange => "speed_change",
            Feature::MultiAudio => "multi_audio",
            Feature::AudioFades => "audio_fades",
        }
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// What an engine can render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CapabilityProfile {
    pub max_resolution: Resolution,
    pub max_duration_ms: u64,
    #[serde(default)]
    pub filters: bool,
    #[serde(default)]
    pub overlays: bool,
    #[serde(default)]
    pub transitions: bool,
    #[serde(default)]
    pub speed_change: bool,
    #[serde(default)]
    pub multi_audio: bool,
    #[serde(default)]
    pub audio_fades: bool,
}

impl CapabilityProfile {
    pub fn supports(&self, feature: Feature) -> bool {
        match feature {
            Feature::Filters => self.filters,
            Feature::Overlays => self.overlays,
            Feature::Transitions => self.transitions,
            Feature::SpeedChange => self.speed_change,
            Feature::MultiAudio => self.multi_audio,
            Feature::AudioFades => self.audio_fades,
        }
    }

    /// Number of feature flags set.
    pub fn supported_count(&self) -> usize {
        Feature::ALL.iter().filter(|f| self.supports(**f)).count()
    }
}

/// How the router reaches an engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EngineBackend {
    /// Local FFmpeg process
    Ffmpeg {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        binary: Option<String>,
    },
    /// Remote render service speaking the JSON render API
    Http {
        base_url: String,
        /// Environment variable holding the bearer token
        #[serde(default, skip_serializing_if = "Option::is_none")]
        api_key_env: Option<String>,
    },
    /// Planning mode: accepts plans without rendering
    DryRun,
}

/// A registry entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct EngineDescriptor {
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub capabilities: CapabilityProfile,
    pub cost_tier: CostTier,
    /// Observed success rate (0-1)
    pub reliability: f64,
    #[serde(default = "default_available")]
    pub available: bool,
    pub backend: EngineBackend,
}

fn default_available() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cost_score_inverse_to_rank() {
        assert_eq!(CostTier::Low.cost_score(), 1.0);
        assert_eq!(CostTier::Medium.cost_score(), 0.5);
        assert_eq!(CostTier::Premium.cost_score(), 0.25);
        assert!(CostTier::Low < CostTier::High);
    }

    #[test]
    fn test_descriptor_from_json() {
        let json = r#"{
            "id": "local-ffmpeg",
            "capabilities": {
                "max_resolution": {"width": 1920, "height": 1080},
                "max_duration_ms": 600000,
                "filters": true,
                "speed_change": true
            },
            "cost_tier": "low",
            "reliability": 0.9,
            "backend": {"kind": "ffmpeg"}
        }"#;
        let engine: EngineDescriptor = serde_json::from_str(json).unwrap();
        assert!(engine.available);
        assert!(engine.capabilities.supports(Feature::SpeedChange));
        assert!(!engine.capabilities.supports(Feature::Overlays));
        assert_eq!(engine.capabilities.supported_count(), 2);
        assert_eq!(engine.backend, EngineBackend::Ffmpeg { binary: None });
    }
}
