//! Analyzed video models.
//!
//! An [`AnalyzedVideo`] is produced by the upstream analysis collaborator and is
//! read-only from this crate's point of view.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use validator::Validate;

use crate::render_plan::Resolution;

/// Narrative role of a segment within the ad.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, JsonSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum SegmentType {
    Hook,
    Problem,
    Solution,
    Benefit,
    Proof,
    Cta,
    Filler,
}

impl SegmentType {
    pub const ALL: &'static [SegmentType] = &[
        SegmentType::Hook,
        SegmentType::Problem,
        SegmentType::Solution,
        SegmentType::Benefit,
        SegmentType::Proof,
        SegmentType::Cta,
        SegmentType::Filler,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SegmentType::Hook => "hook",
            SegmentType::Problem => "problem",
            SegmentType::Solution => "solution",
            SegmentType::Benefit => "benefit",
            SegmentType::Proof => "proof",
            SegmentType::Cta => "cta",
            SegmentType::Filler => "filler",
        }
    }
}

impl fmt::Display for SegmentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A typed, time-bounded slice of the source video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct Segment {
    /// Unique ID within the video
    #[validate(length(min = 1))]
    pub id: String,

    /// Narrative role
    #[serde(rename = "type")]
    pub segment_type: SegmentType,

    /// Start in source time (milliseconds)
    pub start_ms: u64,

    /// End in source time (milliseconds, exclusive)
    pub end_ms: u64,

    /// Pacing score (0-1, higher is faster)
    #[validate(range(min = 0.0, max = 1.0))]
    pub pacing: f64,

    /// Message clarity score (0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub clarity: f64,

    /// Predicted viewer attention (0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub attention: f64,

    /// Spoken transcript, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,

    /// Free-form visual tags from the analysis model
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub visual_tags: Vec<String>,
}

impl Segment {
    /// Duration in source time.
    pub fn duration_ms(&self) -> u64 {
        self.end_ms.saturating_sub(self.start_ms)
    }
}

/// Whole-video scores computed by the analysis collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AggregateScores {
    /// Hook strength on a 0-100 scale
    #[validate(range(min = 0.0, max = 100.0))]
    pub hook_score: f64,

    /// CTA effectiveness (0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub cta_strength: f64,

    /// Pacing consistency across the video (0-1)
    #[validate(range(min = 0.0, max = 1.0))]
    pub pacing_consistency: f64,

    /// Explicit proof flag. When absent, proof presence is derived from segments.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proof_present: Option<bool>,

    /// Sampled attention curve (0-1 per point). When empty, segment attention is used.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attention_curve: Vec<f64>,
}

/// Audio metadata for the source video.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AudioMetadata {
    #[serde(default)]
    pub has_voiceover: bool,

    #[serde(default)]
    pub has_music: bool,

    /// Integrated loudness (LUFS)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub loudness_lufs: Option<f64>,

    /// Separate music stem, if the analysis extracted one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music_uri: Option<String>,
}

/// An analyzed video advertisement.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema, Validate)]
pub struct AnalyzedVideo {
    #[validate(length(min = 1))]
    pub video_id: String,

    /// Location of the source media
    #[validate(length(min = 1))]
    pub source_uri: String,

    /// Total duration (milliseconds)
    #[validate(range(min = 1))]
    pub duration_ms: u64,

    /// Source frame size
    #[serde(default = "default_source_resolution")]
    pub resolution: Resolution,

    /// Time-ordered, non-overlapping segments
    #[validate(nested)]
    pub segments: Vec<Segment>,

    #[validate(nested)]
    pub scores: AggregateScores,

    #[serde(default)]
    #[validate(nested)]
    pub audio: AudioMetadata,
}

fn default_source_resolution() -> Resolution {
    Resolution::FULL_HD_PORTRAIT
}

impl AnalyzedVideo {
    /// Find a segment by ID.
    pub fn segment(&self, id: &str) -> Option<&Segment> {
        self.segments.iter().find(|s| s.id == id)
    }

    /// All segments of a given type, in source order.
    pub fn segments_of(&self, segment_type: SegmentType) -> impl Iterator<Item = &Segment> {
        self.segments
            .iter()
            .filter(move |s| s.segment_type == segment_type)
    }

    /// Whether at least one segment of this type exists.
    pub fn has_segment_type(&self, segment_type: SegmentType) -> bool {
        self.segments_of(segment_type).next().is_some()
    }

    /// Whether the ad contains proof (testimonial, stats, demo).
    pub fn has_proof(&self) -> bool {
        self.scores
            .proof_present
            .unwrap_or_else(|| self.has_segment_type(SegmentType::Proof))
    }

    /// Attention curve, falling back to per-segment attention.
    pub fn attention_curve(&self) -> Vec<f64> {
        if self.scores.attention_curve.is_empty() {
            self.segments.iter().map(|s| s.attention).collect()
        } else {
            self.scores.attention_curve.clone()
        }
    }

    /// Mean segment pacing, or `None` for a video without segments.
    pub fn mean_pacing(&self) -> Option<f64> {
        if self.segments.is_empty() {
            return None;
        }
        let total: f64 = self.segments.iter().map(|s| s.pacing).sum();
        Some(total / self.segments.len() as f64)
    }

    /// Check the timeline invariant: segments are non-empty, time-ordered,
    /// non-overlapping and inside the video duration.
    pub fn check_timeline(&self) -> Result<(), String> {
        if self.segments.is_empty() {
            return Err("segments must not be empty".to_string());
        }

        let mut seen = std::collections::HashSet::new();
        let mut previous_end = 0u64;
        for (index, segment) in self.segments.iter().enumerate() {
            if !seen.insert(segment.id.as_str()) {
                return Err(format!("duplicate segment id '{}'", segment.id));
            }
            if segment.end_ms <= segment.start_ms {
                return Err(format!(
                    "segment '{}' ends ({}ms) before it starts ({}ms)",
                    segment.id, segment.end_ms, segment.start_ms
                ));
            }
            if segment.end_ms > self.duration_ms {
                return Err(format!(
                    "segment '{}' ends at {}ms, past the video duration {}ms",
                    segment.id, segment.end_ms, self.duration_ms
                ));
            }
            if index > 0 && segment.start_ms < previous_end {
                return Err(format!(
                    "segment '{}' starts at {}ms, overlapping the previous segment ending at {}ms",
                    segment.id, segment.start_ms, previous_end
                ));
            }
            previous_end = segment.end_ms;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn segment(id: &str, segment_type: SegmentType, start_ms: u64, end_ms: u64) -> Segment {
        Segment {
            id: id.to_string(),
            segment_type,
            start_ms,
            end_ms,
            pacing: 0.5,
            clarity: 0.5,
            attention: 0.5,
            transcript: None,
            visual_tags: Vec::new(),
        }
    }

    fn video(segments: Vec<Segment>) -> AnalyzedVideo {
        AnalyzedVideo {
            video_id: "v1".into(),
            source_uri: "file:///ads/v1.mp4".into(),
            duration_ms: 30_000,
            resolution: Resolution::FULL_HD_PORTRAIT,
            segments,
            scores: AggregateScores {
                hook_score: 80.0,
                cta_strength: 0.8,
                pacing_consistency: 0.8,
                proof_present: None,
                attention_curve: Vec::new(),
            },
            audio: AudioMetadata::default(),
        }
    }

    #[test]
    fn test_timeline_accepts_ordered_segments() {
        let v = video(vec![
            segment("s1", SegmentType::Hook, 0, 3_000),
            segment("s2", SegmentType::Cta, 3_000, 6_000),
        ]);
        assert!(v.check_timeline().is_ok());
    }

    #[test]
    fn test_timeline_rejects_overlap() {
        let v = video(vec![
            segment("s1", SegmentType::Hook, 0, 3_000),
            segment("s2", SegmentType::Cta, 2_500, 6_000),
        ]);
        let err = v.check_timeline().unwrap_err();
        assert!(err.contains("overlapping"));
    }

    #[test]
    fn test_timeline_rejects_segment_past_duration() {
        let v = video(vec![segment("s1", SegmentType::Hook, 0, 31_000)]);
        assert!(v.check_timeline().is_err());
    }

    #[test]
    fn test_proof_derived_from_segments() {
        let mut v = video(vec![segment("s1", SegmentType::Proof, 0, 3_000)]);
        assert!(v.has_proof());

        v.scores.proof_present = Some(false);
        assert!(!v.has_proof());
    }

    #[test]
    fn test_attention_curve_fallback() {
        let v = video(vec![
            segment("s1", SegmentType::Hook, 0, 3_000),
            segment("s2", SegmentType::Cta, 3_000, 6_000),
        ]);
        assert_eq!(v.attention_curve(), vec![0.5, 0.5]);
    }

    #[test]
    fn test_segment_type_serde() {
        let json = serde_json::to_string(&SegmentType::Cta).unwrap();
        assert_eq!(json, "\"cta\"");
    }
}
