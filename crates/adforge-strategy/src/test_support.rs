//! Shared fixtures for unit tests.

use adforge_models::{AggregateScores, AnalyzedVideo, AudioMetadata, Resolution, Segment, SegmentType};

fn segment(id: &str, segment_type: SegmentType, start_ms: u64, end_ms: u64, attention: f64) -> Segment {
    Segment {
        id: id.to_string(),
        segment_type,
        start_ms,
        end_ms,
        pacing: 0.55,
        clarity: 0.65,
        attention,
        transcript: None,
        visual_tags: Vec::new(),
    }
}

/// Hook 40, CTA 0.3, no proof. Every other signal is healthy.
pub fn weak_video() -> AnalyzedVideo {
    AnalyzedVideo {
        video_id: "ad-weak".to_string(),
        source_uri: "file:///ads/ad-weak.mp4".to_string(),
        duration_ms: 30_000,
        resolution: Resolution::FULL_HD_PORTRAIT,
        segments: vec![
            segment("s1", SegmentType::Hook, 0, 3_000, 0.8),
            segment("s2", SegmentType::Problem, 3_000, 8_000, 0.7),
            segment("s3", SegmentType::Solution, 8_000, 16_000, 0.65),
            segment("s4", SegmentType::Benefit, 16_000, 24_000, 0.6),
            segment("s5", SegmentType::Cta, 24_000, 30_000, 0.55),
        ],
        scores: AggregateScores {
            hook_score: 40.0,
            cta_strength: 0.3,
            pacing_consistency: 0.8,
            proof_present: Some(false),
            attention_curve: Vec::new(),
        },
        audio: AudioMetadata::default(),
    }
}

/// Same cut with strong scores and proof present.
pub fn healthy_video() -> AnalyzedVideo {
    let mut video = weak_video();
    video.video_id = "ad-healthy".to_string();
    video.scores.hook_score = 85.0;
    video.scores.cta_strength = 0.8;
    video.scores.pacing_consistency = 0.85;
    video.scores.proof_present = Some(true);
    video
}
