//! Engine-agnostic render plan produced by the compiler.
//!
//! A [`RenderPlan`] is immutable once produced. Degradation builds a new plan
//! rather than mutating the original, so the original stays available for
//! audit and export.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::analysis::SegmentType;

/// Frame size in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub struct Resolution {
    pub width: u32,
    pub height: u32,
}

impl Resolution {
    pub const HD: Resolution = Resolution::new(1280, 720);
    pub const FULL_HD: Resolution = Resolution::new(1920, 1080);
    pub const FULL_HD_PORTRAIT: Resolution = Resolution::new(1080, 1920);
    pub const UHD_4K: Resolution = Resolution::new(3840, 2160);

    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub fn long_side(&self) -> u32 {
        self.width.max(self.height)
    }

    pub fn short_side(&self) -> u32 {
        self.width.min(self.height)
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    /// Whether this frame fits inside `limit` in either orientation.
    pub fn fits_within(&self, limit: Resolution) -> bool {
        self.long_side() <= limit.long_side() && self.short_side() <= limit.short_side()
    }

    /// Scale down (never up) so the frame fits inside `limit`, keeping the
    /// aspect ratio and even dimensions.
    pub fn capped_to(&self, limit: Resolution) -> Resolution {
        if self.fits_within(limit) {
            return *self;
        }
        let long_ratio = limit.long_side() as f64 / self.long_side().max(1) as f64;
        let short_ratio = limit.short_side() as f64 / self.short_side().max(1) as f64;
        let ratio = long_ratio.min(short_ratio);
        let even = |v: f64| ((v.round() as u32) / 2 * 2).max(2);
        Resolution::new(
            even(self.width as f64 * ratio),
            even(self.height as f64 * ratio),
        )
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Output container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema, Default)]
#[serde(rename_all = "lowercase")]
pub enum Container {
    #[default]
    Mp4,
    Mov,
    Webm,
}

impl Container {
    pub fn extension(&self) -> &'static str {
        match self {
            Container::Mp4 => "mp4",
            Container::Mov => "mov",
            Container::Webm => "webm",
        }
    }
}

/// Output format descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct OutputFormat {
    pub resolution: Resolution,
    pub fps: u32,
    pub bitrate_kbps: u32,
    #[serde(default)]
    pub container: Container,
}

impl Default for OutputFormat {
    fn default() -> Self {
        Self {
            resolution: Resolution::FULL_HD_PORTRAIT,
            fps: 30,
            bitrate_kbps: 8_000,
            container: Container::Mp4,
        }
    }
}

/// Per-entry video filter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum VideoFilter {
    /// Slow push-in zoom
    PunchIn,
    /// Burned-in captions from the transcript
    Captions,
}

/// One segment placed on the output timeline.
///
/// `trim_start_ms`/`trim_end_ms` are absolute source timestamps of the kept
/// range. Placement is in output time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TimelineEntry {
    pub segment_id: String,
    pub segment_type: SegmentType,
    pub source_start_ms: u64,
    pub source_end_ms: u64,
    pub trim_start_ms: u64,
    pub trim_end_ms: u64,
    pub placement_start_ms: u64,
    /// Playback speed multiplier (1.0 = unchanged)
    pub speed: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub filters: Vec<VideoFilter>,
    /// Hard cut inside the entry (source time)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub split_at_ms: Option<u64>,
}

impl TimelineEntry {
    /// Whether the trim range is inverted or empty.
    pub fn is_inverted(&self) -> bool {
        self.trim_end_ms <= self.trim_start_ms
    }

    /// Duration on the output timeline after trim and speed change.
    pub fn output_duration_ms(&self) -> u64 {
        if self.is_inverted() || self.speed <= 0.0 {
            return 0;
        }
        ((self.trim_end_ms - self.trim_start_ms) as f64 / self.speed).round() as u64
    }

    pub fn placement_end_ms(&self) -> u64 {
        self.placement_start_ms + self.output_duration_ms()
    }

    pub fn has_speed_change(&self) -> bool {
        (self.speed - 1.0).abs() > f64::EPSILON
    }
}

/// Asset overlaid on top of a timeline entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Overlay {
    /// Asset reference supplied by the caller
    pub asset: String,
    pub segment_id: String,
    /// Output time range
    pub start_ms: u64,
    pub end_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum TransitionKind {
    Crossfade,
}

/// Transition between two consecutive entries.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Transition {
    pub kind: TransitionKind,
    pub from_segment: String,
    pub to_segment: String,
    pub duration_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum AudioTrackKind {
    /// Audio embedded in the source video
    Source,
    /// Separate music stem
    Music,
}

/// Audio track mixed into the output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct AudioTrack {
    pub id: String,
    pub kind: AudioTrackKind,
    pub source_uri: String,
    #[serde(default)]
    pub gain_db: f64,
    #[serde(default)]
    pub fade_in_ms: u64,
    #[serde(default)]
    pub fade_out_ms: u64,
}

impl AudioTrack {
    pub fn has_fades(&self) -> bool {
        self.fade_in_ms > 0 || self.fade_out_ms > 0
    }
}

/// Numeric validation computed after compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Validation {
    pub total_duration_ms: u64,
    pub segment_count: usize,
    pub has_gaps: bool,
    pub has_overlaps: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Whether a plan can be rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlanStatus {
    Ready,
    Uncompilable { reason: String },
}

/// Fully numeric, engine-agnostic render plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct RenderPlan {
    pub plan_id: String,
    pub source_uri: String,
    /// Strategy the plan was compiled from
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy_id: Option<String>,
    pub timeline: Vec<TimelineEntry>,
    #[serde(default)]
    pub overlays: Vec<Overlay>,
    #[serde(default)]
    pub transitions: Vec<Transition>,
    #[serde(default)]
    pub audio_tracks: Vec<AudioTrack>,
    pub output: OutputFormat,
    pub validation: Validation,
    pub status: PlanStatus,
    /// True for reduced-fidelity plans produced by degradation
    #[serde(default)]
    pub simplified: bool,
}

impl RenderPlan {
    pub fn is_ready(&self) -> bool {
        matches!(self.status, PlanStatus::Ready)
    }

    pub fn uncompilable_reason(&self) -> Option<&str> {
        match &self.status {
            PlanStatus::Ready => None,
            PlanStatus::Uncompilable { reason } => Some(reason),
        }
    }

    pub fn total_duration_ms(&self) -> u64 {
        self.validation.total_duration_ms
    }

    pub fn has_speed_changes(&self) -> bool {
        self.timeline.iter().any(TimelineEntry::has_speed_change)
    }

    pub fn has_filters(&self) -> bool {
        self.timeline
            .iter()
            .any(|e| !e.filters.is_empty() || e.split_at_ms.is_some())
    }

    pub fn has_audio_fades(&self) -> bool {
        self.audio_tracks.iter().any(AudioTrack::has_fades)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolution_fits_either_orientation() {
        assert!(Resolution::FULL_HD_PORTRAIT.fits_within(Resolution::FULL_HD));
        assert!(!Resolution::UHD_4K.fits_within(Resolution::FULL_HD));
    }

    #[test]
    fn test_resolution_cap_keeps_aspect() {
        let capped = Resolution::FULL_HD_PORTRAIT.capped_to(Resolution::HD);
        assert_eq!(capped, Resolution::new(720, 1280));

        let capped = Resolution::UHD_4K.capped_to(Resolution::HD);
        assert_eq!(capped, Resolution::new(1280, 720));

        // Never scales up
        let small = Resolution::new(640, 360);
        assert_eq!(small.capped_to(Resolution::HD), small);
    }

    #[test]
    fn test_output_duration_applies_speed() {
        let entry = TimelineEntry {
            segment_id: "s1".into(),
            segment_type: SegmentType::Filler,
            source_start_ms: 0,
            source_end_ms: 10_000,
            trim_start_ms: 1_000,
            trim_end_ms: 9_000,
            placement_start_ms: 500,
            speed: 2.0,
            filters: Vec::new(),
            split_at_ms: None,
        };
        assert_eq!(entry.output_duration_ms(), 4_000);
        assert_eq!(entry.placement_end_ms(), 4_500);
        assert!(entry.has_speed_change());
    }

    #[test]
    fn test_plan_status_wire_format() {
        let status = PlanStatus::Uncompilable {
            reason: "no cta".into(),
        };
        let json = serde_json::to_value(&status).unwrap();
        assert_eq!(json["status"], "uncompilable");
        assert_eq!(json["reason"], "no cta");
    }
}
