//! Capability requirements derived from a render plan.

use std::collections::BTreeSet;

use adforge_models::{CapabilityProfile, Feature, RenderPlan, Resolution};
use serde::{Deserialize, Serialize};

/// What an engine must support to render a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequiredCapabilities {
    pub resolution: Resolution,
    pub duration_ms: u64,
    pub features: BTreeSet<Feature>,
}

impl RequiredCapabilities {
    pub fn from_plan(plan: &RenderPlan) -> Self {
        let mut features = BTreeSet::new();
        if plan.has_filters() {
            features.insert(Feature::Filters);
        }
        if !plan.overlays.is_empty() {
            features.insert(Feature::Overlays);
        }
        if !plan.transitions.is_empty() {
            features.insert(Feature::Transitions);
        }
        if plan.has_speed_changes() {
            features.insert(Feature::SpeedChange);
        }
        if plan.audio_tracks.len() > 1 {
            features.insert(Feature::MultiAudio);
        }
        if plan.has_audio_fades() {
            features.insert(Feature::AudioFades);
        }
        Self {
            resolution: plan.output.resolution,
            duration_ms: plan.total_duration_ms(),
            features,
        }
    }

    /// Reasons `profile` cannot render this plan. Empty when compatible.
    pub fn mismatches(&self, profile: &CapabilityProfile) -> Vec<String> {
        let mut reasons = Vec::new();
        if !self.resolution.fits_within(profile.max_resolution) {
            reasons.push(format!(
                "resolution {} exceeds {}",
                self.resolution, profile.max_resolution
            ));
        }
        if self.duration_ms > profile.max_duration_ms {
            reasons.push(format!(
                "duration {}ms exceeds {}ms",
                self.duration_ms, profile.max_duration_ms
            ));
        }
        let missing: Vec<&str> = self
            .features
            .iter()
            .filter(|f| !profile.supports(**f))
            .map(Feature::as_str)
            .collect();
        if !missing.is_empty() {
            reasons.push(format!("missing {}", missing.join(", ")));
        }
        reasons
    }
}
