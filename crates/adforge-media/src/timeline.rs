//! Timeline placement and numeric validation.

use adforge_models::{PlanStatus, TimelineEntry, Validation};

/// Lay entries end to end from zero, in their current order.
pub fn place_contiguously(timeline: &mut [TimelineEntry]) {
    let mut cursor = 0u64;
    for entry in timeline.iter_mut() {
        entry.placement_start_ms = cursor;
        cursor += entry.output_duration_ms();
    }
}

/// Compute totals and flag gaps and overlaps.
///
/// Inverted trim ranges count as overlaps. Gaps only produce warnings.
pub fn validate_timeline(timeline: &[TimelineEntry]) -> Validation {
    let mut validation = Validation {
        total_duration_ms: timeline
            .iter()
            .map(TimelineEntry::placement_end_ms)
            .max()
            .unwrap_or(0),
        segment_count: timeline.len(),
        ..Validation::default()
    };

    if timeline.is_empty() {
        validation.warnings.push("timeline is empty".to_string());
        return validation;
    }

    for entry in timeline {
        if entry.is_inverted() {
            validation.has_overlaps = true;
            validation.warnings.push(format!(
                "entry '{}' has an inverted trim ({}ms > {}ms)",
                entry.segment_id, entry.trim_start_ms, entry.trim_end_ms
            ));
        } else if entry.trim_start_ms < entry.source_start_ms || entry.trim_end_ms > entry.source_end_ms {
            validation.warnings.push(format!(
                "entry '{}' trims outside its source range",
                entry.segment_id
            ));
        }
        if let Some(split) = entry.split_at_ms {
            if split <= entry.trim_start_ms || split >= entry.trim_end_ms {
                validation.warnings.push(format!(
                    "entry '{}' split point {}ms is outside the kept range",
                    entry.segment_id, split
                ));
            }
        }
    }

    let mut ordered: Vec<&TimelineEntry> = timeline.iter().collect();
    ordered.sort_by_key(|e| e.placement_start_ms);

    if ordered[0].placement_start_ms > 0 {
        validation.has_gaps = true;
        validation.warnings.push(format!(
            "timeline starts at {}ms",
            ordered[0].placement_start_ms
        ));
    }

    for pair in ordered.windows(2) {
        let (prev, next) = (pair[0], pair[1]);
        let prev_end = prev.placement_end_ms();
        if next.placement_start_ms > prev_end {
            validation.has_gaps = true;
            validation.warnings.push(format!(
                "{}ms gap between '{}' and '{}'",
                next.placement_start_ms - prev_end,
                prev.segment_id,
                next.segment_id
            ));
        } else if next.placement_start_ms < prev_end {
            validation.has_overlaps = true;
            validation.warnings.push(format!(
                "'{}' overlaps '{}' by {}ms",
                next.segment_id,
                prev.segment_id,
                prev_end - next.placement_start_ms
            ));
        }
    }

    validation
}

/// Status implied by a validation result.
pub fn status_for(validation: &Validation) -> PlanStatus {
    if validation.segment_count == 0 {
        return PlanStatus::Uncompilable {
            reason: "timeline has no segments".to_string(),
        };
    }
    if validation.has_overlaps {
        let detail = validation
            .warnings
            .iter()
            .find(|w| w.contains("inverted") || w.contains("overlaps"))
            .cloned()
            .unwrap_or_else(|| "overlapping entries".to_string());
        return PlanStatus::Uncompilable {
            reason: format!("timeline overlap: {}", detail),
        };
    }
    PlanStatus::Ready
}
