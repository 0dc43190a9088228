//! Builders shared by unit tests.

use adforge_media::{place_contiguously, status_for, validate_timeline};
use adforge_models::{
    CapabilityProfile, CostTier, EngineBackend, EngineDescriptor, OutputFormat, RenderPlan,
    Resolution, SegmentType, TimelineEntry,
};

/// Two 5s entries at normal speed, no extras.
pub fn plan(resolution: Resolution) -> RenderPlan {
    let mut timeline: Vec<TimelineEntry> = [("a", 0, 5_000), ("b", 5_000, 10_000)]
        .into_iter()
        .map(|(id, start, end)| TimelineEntry {
            segment_id: id.to_string(),
            segment_type: SegmentType::Benefit,
            source_start_ms: start,
            source_end_ms: end,
            trim_start_ms: start,
            trim_end_ms: end,
            placement_start_ms: 0,
            speed: 1.0,
            filters: Vec::new(),
            split_at_ms: None,
        })
        .collect();
    place_contiguously(&mut timeline);
    let validation = validate_timeline(&timeline);
    let status = status_for(&validation);
    RenderPlan {
        plan_id: "plan-test".to_string(),
        source_uri: "file:///ads/source.mp4".to_string(),
        strategy_id: None,
        timeline,
        overlays: Vec::new(),
        transitions: Vec::new(),
        audio_tracks: Vec::new(),
        output: OutputFormat {
            resolution,
            ..OutputFormat::default()
        },
        validation,
        status,
        simplified: false,
    }
}

pub fn profile(max_resolution: Resolution, overlays: bool) -> CapabilityProfile {
    CapabilityProfile {
        max_resolution,
        max_duration_ms: 600_000,
        filters: false,
        overlays,
        transitions: false,
        speed_change: false,
        multi_audio: false,
        audio_fades: false,
    }
}

pub fn descriptor(
    id: &str,
    capabilities: CapabilityProfile,
    cost_tier: CostTier,
    reliability: f64,
) -> EngineDescriptor {
    EngineDescriptor {
        id: id.to_string(),
        name: id.to_string(),
        capabilities,
        cost_tier,
        reliability,
        available: true,
        backend: EngineBackend::DryRun,
    }
}
