//! Boundary validation of input documents.
//!
//! Documents are rejected as a whole; nothing downstream ever sees a
//! partially valid analysis or blueprint.

use validator::Validate;

use crate::analysis::AnalyzedVideo;
use crate::blueprint::CreativeBlueprint;
use crate::error::{ModelError, ModelResult};

const ANALYSIS_DOC: &str = "analyzed video";
const BLUEPRINT_DOC: &str = "creative blueprint";

/// Parse and validate an analyzed video JSON document.
pub fn parse_analyzed_video(json: &str) -> ModelResult<AnalyzedVideo> {
    let video: AnalyzedVideo =
        serde_json::from_str(json).map_err(|source| ModelError::InvalidJson {
            document: ANALYSIS_DOC,
            source,
        })?;
    validate_analyzed_video(&video)?;
    Ok(video)
}

/// Parse and validate a creative blueprint JSON document.
pub fn parse_blueprint(json: &str) -> ModelResult<CreativeBlueprint> {
    let blueprint: CreativeBlueprint =
        serde_json::from_str(json).map_err(|source| ModelError::InvalidJson {
            document: BLUEPRINT_DOC,
            source,
        })?;
    validate_blueprint(&blueprint)?;
    Ok(blueprint)
}

/// Validate field ranges and the segment timeline invariant.
pub fn validate_analyzed_video(video: &AnalyzedVideo) -> ModelResult<()> {
    video
        .validate()
        .map_err(|e| ModelError::validation(ANALYSIS_DOC, e.to_string()))?;

    video
        .check_timeline()
        .map_err(|msg| ModelError::validation(ANALYSIS_DOC, msg))?;

    if let Some(point) = video
        .scores
        .attention_curve
        .iter()
        .find(|v| !(0.0..=1.0).contains(*v))
    {
        return Err(ModelError::validation(
            ANALYSIS_DOC,
            format!("attention_curve value {} is outside 0-1", point),
        ));
    }

    if let Some(lufs) = video.audio.loudness_lufs {
        if !(-70.0..=0.0).contains(&lufs) {
            return Err(ModelError::validation(
                ANALYSIS_DOC,
                format!("loudness_lufs {} is outside -70..0", lufs),
            ));
        }
    }

    if video.resolution.width == 0 || video.resolution.height == 0 {
        return Err(ModelError::validation(ANALYSIS_DOC, "resolution must be non-zero"));
    }

    Ok(())
}

/// Validate a creative blueprint.
pub fn validate_blueprint(blueprint: &CreativeBlueprint) -> ModelResult<()> {
    blueprint
        .validate()
        .map_err(|e| ModelError::validation(BLUEPRINT_DOC, e.to_string()))?;

    if blueprint.variation_ideas.iter().any(|idea| idea.trim().is_empty()) {
        return Err(ModelError::validation(
            BLUEPRINT_DOC,
            "variation_ideas must not contain empty entries",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const VALID_ANALYSIS: &str = r#"{
        "video_id": "ad-1",
        "source_uri": "file:///ads/ad-1.mp4",
        "duration_ms": 20000,
        "segments": [
            {"id": "s1", "type": "hook", "start_ms": 0, "end_ms": 4000,
             "pacing": 0.6, "clarity": 0.7, "attention": 0.8},
            {"id": "s2", "type": "cta", "start_ms": 4000, "end_ms": 20000,
             "pacing": 0.5, "clarity": 0.6, "attention": 0.5}
        ],
        "scores": {"hook_score": 55, "cta_strength": 0.4, "pacing_consistency": 0.7}
    }"#;

    #[test]
    fn test_valid_analysis_parses() {
        let video = parse_analyzed_video(VALID_ANALYSIS).unwrap();
        assert_eq!(video.segments.len(), 2);
        assert_eq!(video.resolution.height, 1920);
    }

    #[test]
    fn test_out_of_range_score_rejected() {
        let json = VALID_ANALYSIS.replace("\"cta_strength\": 0.4", "\"cta_strength\": 1.4");
        let err = parse_analyzed_video(&json).unwrap_err();
        assert!(matches!(err, ModelError::Validation { .. }));
        assert_eq!(err.document(), Some("analyzed video"));
    }

    #[test]
    fn test_unknown_segment_type_rejected() {
        let json = VALID_ANALYSIS.replace("\"type\": \"cta\"", "\"type\": \"outro\"");
        let err = parse_analyzed_video(&json).unwrap_err();
        assert!(matches!(err, ModelError::InvalidJson { .. }));
    }

    #[test]
    fn test_missing_required_field_rejected() {
        let json = VALID_ANALYSIS.replace("\"video_id\": \"ad-1\",", "");
        assert!(parse_analyzed_video(&json).is_err());
    }

    #[test]
    fn test_overlapping_segments_rejected() {
        let json = VALID_ANALYSIS.replace("\"start_ms\": 4000", "\"start_ms\": 3000");
        let err = parse_analyzed_video(&json).unwrap_err();
        assert!(err.to_string().contains("overlapping"));
    }

    #[test]
    fn test_blueprint_validation() {
        let ok = parse_blueprint(r#"{"objective": "traffic", "variation_ideas": ["faster hook"]}"#)
            .unwrap();
        assert_eq!(ok.objective.default_goal().as_str(), "ctr");

        assert!(parse_blueprint(r#"{"objective": "traffic", "variation_ideas": []}"#).is_err());
        assert!(parse_blueprint(r#"{"objective": "traffic", "variation_ideas": ["  "]}"#).is_err());
        assert!(parse_blueprint(r#"{"objective": "fame", "variation_ideas": ["x"]}"#).is_err());
    }
}
