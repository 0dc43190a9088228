//! Plan simplification for the simplify degradation level.

use adforge_media::{place_contiguously, status_for, validate_timeline};
use adforge_models::{RenderPlan, Resolution};

/// Output cap of a simplified plan.
pub const SIMPLIFIED_RESOLUTION: Resolution = Resolution::HD;

/// Derive a plan most engines can render.
///
/// Overlays are dropped, every entry plays at normal speed, the output is
/// capped at 720p and audio fades are removed. The input plan is untouched.
pub fn simplify(plan: &RenderPlan) -> RenderPlan {
    let mut simplified = plan.clone();
    simplified.plan_id = format!("{}-simplified", plan.plan_id);
    simplified.overlays.clear();

    for entry in &mut simplified.timeline {
        entry.speed = 1.0;
    }
    place_contiguously(&mut simplified.timeline);

    simplified.output.resolution = plan.output.resolution.capped_to(SIMPLIFIED_RESOLUTION);

    for track in &mut simplified.audio_tracks {
        track.fade_in_ms = 0;
        track.fade_out_ms = 0;
    }

    simplified.validation = validate_timeline(&simplified.timeline);
    simplified.status = status_for(&simplified.validation);
    simplified.simplified = true;
    simplified
}
