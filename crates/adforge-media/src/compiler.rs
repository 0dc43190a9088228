//! Strategy compiler.
//!
//! Turns a [`StrategyCandidate`] into a fully numeric [`RenderPlan`]. The
//! compiler is a pure function: no I/O, no clock, no randomness. Any action
//! that cannot be resolved makes the whole plan uncompilable instead of
//! being skipped.

use std::collections::{BTreeMap, HashMap};

use adforge_models::{
    ActionKind, AnalyzedVideo, AudioTrack, AudioTrackKind, OutputFormat, Overlay, PlanStatus,
    RenderPlan, Segment, SegmentTarget, StrategyAction, StrategyCandidate, TimelineEntry,
    Transition, TransitionKind, Validation, VideoFilter,
};
use tracing::{debug, warn};

use crate::timeline::{place_contiguously, status_for, validate_timeline};

pub const DEFAULT_COMPRESS_SPEED: f64 = 1.25;
pub const MAX_COMPRESS_SPEED: f64 = 2.0;
pub const DEFAULT_EMPHASIZE_SPEED: f64 = 0.9;
pub const MIN_EMPHASIZE_SPEED: f64 = 0.5;
/// Share of a compressed segment trimmed from each end.
pub const COMPRESS_TRIM_FRACTION: f64 = 0.1;
pub const DEFAULT_SPLIT_FRACTION: f64 = 0.5;
pub const CROSSFADE_MS: u64 = 400;
pub const MUSIC_FADE_MS: u64 = 500;

/// Caller-supplied compilation inputs.
#[derive(Debug, Clone, Default)]
pub struct CompileOptions {
    /// Output format; defaults to the source resolution at 30 fps
    pub output: Option<OutputFormat>,
    /// External assets by name (e.g. `testimonial_card`) to URI
    pub assets: BTreeMap<String, String>,
}

impl CompileOptions {
    pub fn with_asset(mut self, name: impl Into<String>, uri: impl Into<String>) -> Self {
        self.assets.insert(name.into(), uri.into());
        self
    }

    pub fn with_output(mut self, output: OutputFormat) -> Self {
        self.output = Some(output);
        self
    }
}

/// Accumulated edits for one source segment.
#[derive(Debug, Clone)]
struct SegmentEdit {
    speed: f64,
    trim_fraction: f64,
    filters: Vec<VideoFilter>,
    removed: bool,
    split_fraction: Option<f64>,
    merge_next: bool,
    overlay: Option<String>,
}

impl Default for SegmentEdit {
    fn default() -> Self {
        Self {
            speed: 1.0,
            trim_fraction: 0.0,
            filters: Vec::new(),
            removed: false,
            split_fraction: None,
            merge_next: false,
            overlay: None,
        }
    }
}

/// Compile a strategy against the analyzed video it was generated for.
pub fn compile(
    video: &AnalyzedVideo,
    candidate: &StrategyCandidate,
    options: &CompileOptions,
) -> RenderPlan {
    let output = options.output.clone().unwrap_or_else(|| OutputFormat {
        resolution: video.resolution,
        ..OutputFormat::default()
    });
    let plan_id = format!("plan-{}-{}", video.video_id, candidate.id);

    let mut edits: HashMap<&str, SegmentEdit> = HashMap::new();
    // (segment id, output position) in action order
    let mut reorders: Vec<(String, usize)> = Vec::new();

    for (index, action) in candidate.actions.iter().enumerate() {
        let targets = resolve_targets(video, &action.target);
        if targets.is_empty() {
            let reason = format!(
                "action #{} ({} {}) matches no segment",
                index + 1,
                action.kind,
                action.target
            );
            return uncompilable(video, candidate, output, plan_id, reason);
        }

        let overlay = match &action.asset {
            Some(name) => match options.assets.get(name) {
                Some(uri) => Some(uri.clone()),
                None => {
                    let reason = format!(
                        "action #{} ({} {}) needs asset '{}', which was not supplied",
                        index + 1,
                        action.kind,
                        action.target,
                        name
                    );
                    return uncompilable(video, candidate, output, plan_id, reason);
                }
            },
            None => None,
        };

        for segment in targets {
            let edit = edits.entry(segment.id.as_str()).or_default();
            apply_action(edit, action, segment, overlay.clone());
            if action.kind == ActionKind::Reorder {
                let position = action.factor.unwrap_or(0.0).max(0.0).round() as usize;
                reorders.retain(|(id, _)| id != &segment.id);
                reorders.push((segment.id.clone(), position));
            }
        }
    }

    // Source order first, then re-sequence
    let mut timeline: Vec<TimelineEntry> = Vec::new();
    let mut merges: Vec<String> = Vec::new();
    let mut overlays: Vec<(String, String)> = Vec::new();

    for segment in &video.segments {
        let edit = edits.get(segment.id.as_str()).cloned().unwrap_or_default();
        if edit.removed {
            if let Some(asset) = &edit.overlay {
                let reason = format!(
                    "asset '{}' targets segment '{}', which is removed",
                    asset, segment.id
                );
                return uncompilable(video, candidate, output, plan_id, reason);
            }
            continue;
        }
        if edit.merge_next {
            merges.push(segment.id.clone());
        }
        if let Some(asset) = &edit.overlay {
            overlays.push((segment.id.clone(), asset.clone()));
        }
        timeline.push(build_entry(segment, &edit));
    }

    if timeline.is_empty() {
        return uncompilable(
            video,
            candidate,
            output,
            plan_id,
            "every segment was removed".to_string(),
        );
    }

    apply_reorders(&mut timeline, &reorders);
    place_contiguously(&mut timeline);

    let mut transitions = Vec::new();
    for from in &merges {
        let Some(position) = timeline.iter().position(|e| &e.segment_id == from) else {
            continue;
        };
        let Some(next) = timeline.get(position + 1) else {
            let reason = format!("merge on '{}' has no following segment to blend into", from);
            return uncompilable(video, candidate, output, plan_id, reason);
        };
        let shortest = timeline[position]
            .output_duration_ms()
            .min(next.output_duration_ms());
        transitions.push(Transition {
            kind: TransitionKind::Crossfade,
            from_segment: from.clone(),
            to_segment: next.segment_id.clone(),
            duration_ms: CROSSFADE_MS.min(shortest / 2),
        });
    }

    let overlays: Vec<Overlay> = overlays
        .into_iter()
        .filter_map(|(segment_id, asset)| {
            let entry = timeline.iter().find(|e| e.segment_id == segment_id)?;
            Some(Overlay {
                asset,
                segment_id,
                start_ms: entry.placement_start_ms,
                end_ms: entry.placement_end_ms(),
            })
        })
        .collect();

    let validation = validate_timeline(&timeline);
    let status = status_for(&validation);
    if let PlanStatus::Uncompilable { reason } = &status {
        warn!(plan_id = %plan_id, reason = %reason, "Compiled timeline failed validation");
    }

    let audio_tracks = audio_tracks(video, validation.total_duration_ms);

    debug!(
        plan_id = %plan_id,
        entries = timeline.len(),
        total_ms = validation.total_duration_ms,
        "Compiled render plan"
    );

    RenderPlan {
        plan_id,
        source_uri: video.source_uri.clone(),
        strategy_id: Some(candidate.id.clone()),
        timeline,
        overlays,
        transitions,
        audio_tracks,
        output,
        validation,
        status,
        simplified: false,
    }
}

fn resolve_targets<'a>(video: &'a AnalyzedVideo, target: &SegmentTarget) -> Vec<&'a Segment> {
    match target {
        SegmentTarget::Id(id) => video.segment(id).into_iter().collect(),
        SegmentTarget::Type(segment_type) => video.segments_of(*segment_type).collect(),
    }
}

fn apply_action(
    edit: &mut SegmentEdit,
    action: &StrategyAction,
    segment: &Segment,
    overlay: Option<String>,
) {
    match action.kind {
        ActionKind::Compress => {
            edit.speed = action
                .factor
                .unwrap_or(DEFAULT_COMPRESS_SPEED)
                .clamp(1.0, MAX_COMPRESS_SPEED);
            edit.trim_fraction = COMPRESS_TRIM_FRACTION;
        }
        ActionKind::Emphasize => {
            edit.speed = action
                .factor
                .unwrap_or(DEFAULT_EMPHASIZE_SPEED)
                .clamp(MIN_EMPHASIZE_SPEED, 1.0);
            push_unique(&mut edit.filters, VideoFilter::PunchIn);
            if segment.transcript.as_deref().is_some_and(|t| !t.trim().is_empty()) {
                push_unique(&mut edit.filters, VideoFilter::Captions);
            }
        }
        ActionKind::Remove => edit.removed = true,
        // Position is recorded by the caller and applied after placement
        ActionKind::Reorder => {}
        ActionKind::Split => {
            edit.split_fraction = Some(
                action
                    .factor
                    .unwrap_or(DEFAULT_SPLIT_FRACTION)
                    .clamp(0.05, 0.95),
            );
        }
        ActionKind::Merge => edit.merge_next = true,
    }
    // Any kind may carry an asset; it overlays the segment wherever it lands
    if overlay.is_some() {
        edit.overlay = overlay;
    }
}

fn push_unique(filters: &mut Vec<VideoFilter>, filter: VideoFilter) {
    if !filters.contains(&filter) {
        filters.push(filter);
    }
}

fn build_entry(segment: &Segment, edit: &SegmentEdit) -> TimelineEntry {
    let trim = (segment.duration_ms() as f64 * edit.trim_fraction).round() as u64;
    let trim_start_ms = segment.start_ms + trim;
    let trim_end_ms = segment.end_ms.saturating_sub(trim);
    let split_at_ms = edit.split_fraction.map(|fraction| {
        let kept = trim_end_ms.saturating_sub(trim_start_ms);
        trim_start_ms + (kept as f64 * fraction).round() as u64
    });

    TimelineEntry {
        segment_id: segment.id.clone(),
        segment_type: segment.segment_type,
        source_start_ms: segment.start_ms,
        source_end_ms: segment.end_ms,
        trim_start_ms,
        trim_end_ms,
        placement_start_ms: 0,
        speed: edit.speed,
        filters: edit.filters.clone(),
        split_at_ms,
    }
}

/// Move reordered entries to their requested output positions. Requests are
/// applied in ascending position; positions past the end append.
fn apply_reorders(timeline: &mut Vec<TimelineEntry>, reorders: &[(String, usize)]) {
    let mut requests: Vec<&(String, usize)> = reorders.iter().collect();
    requests.sort_by_key(|(_, position)| *position);

    let mut moved = Vec::new();
    for (id, position) in requests {
        if let Some(index) = timeline.iter().position(|e| &e.segment_id == id) {
            moved.push((timeline.remove(index), *position));
        }
    }
    for (entry, position) in moved {
        let at = position.min(timeline.len());
        timeline.insert(at, entry);
    }
}

fn audio_tracks(video: &AnalyzedVideo, total_duration_ms: u64) -> Vec<AudioTrack> {
    let mut tracks = vec![AudioTrack {
        id: "source".to_string(),
        kind: AudioTrackKind::Source,
        source_uri: video.source_uri.clone(),
        gain_db: 0.0,
        fade_in_ms: 0,
        fade_out_ms: 0,
    }];

    if let Some(music_uri) = &video.audio.music_uri {
        let fade = MUSIC_FADE_MS.min(total_duration_ms / 4);
        tracks.push(AudioTrack {
            id: "music".to_string(),
            kind: AudioTrackKind::Music,
            source_uri: music_uri.clone(),
            gain_db: if video.audio.has_voiceover { -12.0 } else { -6.0 },
            fade_in_ms: fade,
            fade_out_ms: fade,
        });
    }

    tracks
}

fn uncompilable(
    video: &AnalyzedVideo,
    candidate: &StrategyCandidate,
    output: OutputFormat,
    plan_id: String,
    reason: String,
) -> RenderPlan {
    warn!(plan_id = %plan_id, reason = %reason, "Strategy is uncompilable");
    RenderPlan {
        plan_id,
        source_uri: video.source_uri.clone(),
        strategy_id: Some(candidate.id.clone()),
        timeline: Vec::new(),
        overlays: Vec::new(),
        transitions: Vec::new(),
        audio_tracks: Vec::new(),
        output,
        validation: Validation::default(),
        status: PlanStatus::Uncompilable { reason },
        simplified: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use adforge_models::{
        AggregateScores, AudioMetadata, Framework, Resolution, SegmentType,
    };

    fn segment(id: &str, segment_type: SegmentType, start_ms: u64, end_ms: u64) -> Segment {
        Segment {
            id: id.to_string(),
            segment_type,
            start_ms,
            end_ms,
            pacing: 0.5,
            clarity: 0.6,
            attention: 0.6,
            transcript: None,
            visual_tags: Vec::new(),
        }
    }

    fn video() -> AnalyzedVideo {
        AnalyzedVideo {
            video_id: "ad-1".to_string(),
            source_uri: "file:///ads/ad-1.mp4".to_string(),
            duration_ms: 20_000,
            resolution: Resolution::FULL_HD_PORTRAIT,
            segments: vec![
                segment("hook", SegmentType::Hook, 0, 3_000),
                segment("filler", SegmentType::Filler, 3_000, 8_000),
                segment("benefit", SegmentType::Benefit, 8_000, 14_000),
                segment("cta", SegmentType::Cta, 14_000, 20_000),
            ],
            scores: AggregateScores {
                hook_score: 50.0,
                cta_strength: 0.4,
                pacing_consistency: 0.7,
                proof_present: None,
                attention_curve: Vec::new(),
            },
            audio: AudioMetadata::default(),
        }
    }

    fn candidate(actions: Vec<StrategyAction>) -> StrategyCandidate {
        StrategyCandidate {
            id: "test-1".to_string(),
            framework: Framework::RapidCut,
            solves: Vec::new(),
            risk: 0.2,
            cost: 0.2,
            actions,
        }
    }

    fn by_type(segment_type: SegmentType) -> SegmentTarget {
        SegmentTarget::Type(segment_type)
    }

    fn by_id(id: &str) -> SegmentTarget {
        SegmentTarget::Id(id.to_string())
    }

    #[test]
    fn test_compress_trims_and_speeds_up() {
        let plan = compile(
            &video(),
            &candidate(vec![StrategyAction::new(
                ActionKind::Compress,
                by_type(SegmentType::Filler),
                "tighten",
            )]),
            &CompileOptions::default(),
        );
        assert!(plan.is_ready());
        let filler = &plan.timeline[1];
        assert_eq!(filler.trim_start_ms, 3_500);
        assert_eq!(filler.trim_end_ms, 7_500);
        assert_eq!(filler.speed, DEFAULT_COMPRESS_SPEED);
        // 4000ms at 1.25x
        assert_eq!(filler.output_duration_ms(), 3_200);
        assert_eq!(plan.total_duration_ms(), 3_000 + 3_200 + 6_000 + 6_000);
    }

    #[test]
    fn test_factors_are_clamped() {
        let plan = compile(
            &video(),
            &candidate(vec![
                StrategyAction::new(ActionKind::Compress, by_id("filler"), "x").with_factor(5.0),
                StrategyAction::new(ActionKind::Emphasize, by_id("cta"), "y").with_factor(0.1),
            ]),
            &CompileOptions::default(),
        );
        assert_eq!(plan.timeline[1].speed, MAX_COMPRESS_SPEED);
        assert_eq!(plan.timeline[3].speed, MIN_EMPHASIZE_SPEED);
        assert_eq!(plan.timeline[3].filters, vec![VideoFilter::PunchIn]);
    }

    #[test]
    fn test_remove_keeps_contiguous_timeline() {
        let plan = compile(
            &video(),
            &candidate(vec![StrategyAction::new(
                ActionKind::Remove,
                by_type(SegmentType::Filler),
                "drop",
            )]),
            &CompileOptions::default(),
        );
        assert_eq!(plan.validation.segment_count, 3);
        assert!(!plan.validation.has_gaps);
        assert_eq!(plan.timeline[1].segment_id, "benefit");
        assert_eq!(plan.timeline[1].placement_start_ms, 3_000);
    }

    #[test]
    fn test_reorder_moves_to_front() {
        let plan = compile(
            &video(),
            &candidate(vec![StrategyAction::new(
                ActionKind::Reorder,
                by_id("benefit"),
                "lead with payoff",
            )]),
            &CompileOptions::default(),
        );
        let order: Vec<&str> = plan.timeline.iter().map(|e| e.segment_id.as_str()).collect();
        assert_eq!(order, vec!["benefit", "hook", "filler", "cta"]);
        assert_eq!(plan.timeline[1].placement_start_ms, 6_000);
    }

    #[test]
    fn test_split_and_merge() {
        let plan = compile(
            &video(),
            &candidate(vec![
                StrategyAction::new(ActionKind::Split, by_id("benefit"), "cut"),
                StrategyAction::new(ActionKind::Merge, by_id("benefit"), "blend"),
            ]),
            &CompileOptions::default(),
        );
        assert_eq!(plan.timeline[2].split_at_ms, Some(11_000));
        assert_eq!(plan.transitions.len(), 1);
        assert_eq!(plan.transitions[0].to_segment, "cta");
        assert!(plan.has_filters());
    }

    #[test]
    fn test_missing_segment_is_uncompilable() {
        let plan = compile(
            &video(),
            &candidate(vec![StrategyAction::new(
                ActionKind::Emphasize,
                by_type(SegmentType::Proof),
                "hold proof",
            )]),
            &CompileOptions::default(),
        );
        let reason = plan.uncompilable_reason().unwrap();
        assert!(reason.contains("action #1"));
        assert!(reason.contains("emphasize"));
    }

    #[test]
    fn test_missing_asset_is_uncompilable() {
        let action = StrategyAction::new(ActionKind::Emphasize, by_id("cta"), "testimonial")
            .with_asset("testimonial_card");
        let plan = compile(&video(), &candidate(vec![action.clone()]), &CompileOptions::default());
        assert!(plan.uncompilable_reason().unwrap().contains("testimonial_card"));

        let options = CompileOptions::default().with_asset("testimonial_card", "file:///assets/t.png");
        let plan = compile(&video(), &candidate(vec![action]), &options);
        assert!(plan.is_ready());
        assert_eq!(plan.overlays.len(), 1);
        assert_eq!(plan.overlays[0].start_ms, 14_000);
    }

    #[test]
    fn test_asset_overlays_segment_for_every_kept_kind() {
        let options = CompileOptions::default().with_asset("card", "file:///assets/card.png");
        for kind in [
            ActionKind::Compress,
            ActionKind::Emphasize,
            ActionKind::Reorder,
            ActionKind::Split,
            ActionKind::Merge,
        ] {
            let action = StrategyAction::new(kind, by_id("benefit"), "badge").with_asset("card");
            let plan = compile(&video(), &candidate(vec![action]), &options);
            assert!(plan.is_ready(), "{} should compile", kind);
            assert_eq!(plan.overlays.len(), 1, "{} lost its asset", kind);

            let overlay = &plan.overlays[0];
            let entry = plan
                .timeline
                .iter()
                .find(|e| e.segment_id == "benefit")
                .unwrap();
            assert_eq!(overlay.asset, "file:///assets/card.png");
            assert_eq!(overlay.start_ms, entry.placement_start_ms);
            assert_eq!(overlay.end_ms, entry.placement_end_ms());
        }
    }

    #[test]
    fn test_asset_on_removed_segment_is_uncompilable() {
        let options = CompileOptions::default().with_asset("card", "file:///assets/card.png");
        let plan = compile(
            &video(),
            &candidate(vec![
                StrategyAction::new(ActionKind::Remove, by_id("filler"), "drop").with_asset("card")
            ]),
            &options,
        );
        let reason = plan.uncompilable_reason().unwrap();
        assert!(reason.contains("filler"));
        assert!(reason.contains("removed"));

        // An earlier overlay is not silently lost to a later removal
        let plan = compile(
            &video(),
            &candidate(vec![
                StrategyAction::new(ActionKind::Compress, by_id("filler"), "x").with_asset("card"),
                StrategyAction::new(ActionKind::Remove, by_id("filler"), "drop"),
            ]),
            &options,
        );
        assert!(!plan.is_ready());
    }

    #[test]
    fn test_merge_on_last_entry_is_uncompilable() {
        let plan = compile(
            &video(),
            &candidate(vec![StrategyAction::new(ActionKind::Merge, by_id("cta"), "blend")]),
            &CompileOptions::default(),
        );
        assert!(!plan.is_ready());
    }

    #[test]
    fn test_segment_count_matches_non_removed() {
        let actions = vec![
            StrategyAction::new(ActionKind::Remove, by_id("hook"), "a"),
            StrategyAction::new(ActionKind::Compress, by_id("cta"), "b"),
        ];
        let plan = compile(&video(), &candidate(actions), &CompileOptions::default());
        assert!(plan.is_ready());
        assert_eq!(plan.validation.segment_count, video().segments.len() - 1);
    }

    #[test]
    fn test_music_track_gets_fades() {
        let mut source = video();
        source.audio.music_uri = Some("file:///ads/music.mp3".to_string());
        let plan = compile(&source, &candidate(Vec::new()), &CompileOptions::default());
        assert_eq!(plan.audio_tracks.len(), 2);
        assert!(plan.has_audio_fades());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let c = candidate(vec![StrategyAction::new(
            ActionKind::Compress,
            by_type(SegmentType::Filler),
            "tighten",
        )]);
        assert_eq!(
            compile(&video(), &c, &CompileOptions::default()),
            compile(&video(), &c, &CompileOptions::default())
        );
    }
}
