//! End-to-end pipeline runs against a dry-run registry.

use std::io::Write;
use std::sync::Arc;

use adforge_models::{DegradationLevel, JobId, OptimizationGoal};
use adforge_router::{EngineRegistry, RouteResult, Router, RouterConfig};
use adforge_strategy::DecisionRequest;
use adforge_worker::{load_analysis, Pipeline, PipelineInput, PipelineOutcome, WorkerError};

const REGISTRY: &str = r#"{
    "version": 1,
    "engines": [{
        "id": "planner",
        "capabilities": {
            "max_resolution": {"width": 3840, "height": 2160},
            "max_duration_ms": 600000,
            "filters": true,
            "overlays": true,
            "transitions": true,
            "speed_change": true,
            "multi_audio": true,
            "audio_fades": true
        },
        "cost_tier": "low",
        "reliability": 0.9,
        "backend": {"kind": "dry_run"}
    }]
}"#;

fn analysis_json(video_id: &str, hook_score: f64, cta_strength: f64, proof: bool) -> String {
    serde_json::json!({
        "video_id": video_id,
        "source_uri": format!("file:///ads/{}.mp4", video_id),
        "duration_ms": 30000,
        "segments": [
            {"id": "s1", "type": "hook", "start_ms": 0, "end_ms": 3000,
             "pacing": 0.55, "clarity": 0.65, "attention": 0.8},
            {"id": "s2", "type": "problem", "start_ms": 3000, "end_ms": 8000,
             "pacing": 0.55, "clarity": 0.65, "attention": 0.7},
            {"id": "s3", "type": "solution", "start_ms": 8000, "end_ms": 16000,
             "pacing": 0.55, "clarity": 0.65, "attention": 0.65},
            {"id": "s4", "type": "benefit", "start_ms": 16000, "end_ms": 24000,
             "pacing": 0.55, "clarity": 0.65, "attention": 0.6},
            {"id": "s5", "type": "cta", "start_ms": 24000, "end_ms": 30000,
             "pacing": 0.55, "clarity": 0.65, "attention": 0.55}
        ],
        "scores": {
            "hook_score": hook_score,
            "cta_strength": cta_strength,
            "pacing_consistency": 0.85,
            "proof_present": proof
        }
    })
    .to_string()
}

fn write_analysis(dir: &tempfile::TempDir, name: &str, json: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(json.as_bytes()).unwrap();
    path
}

fn pipeline() -> Pipeline {
    let registry = EngineRegistry::from_json_str(REGISTRY).unwrap();
    let router = Router::from_registry(registry, RouterConfig::default()).unwrap();
    Pipeline::new(Arc::new(router))
}

fn input(json: &str, goal: OptimizationGoal) -> PipelineInput {
    let dir = tempfile::tempdir().unwrap();
    let path = write_analysis(&dir, "analysis.json", json);
    let video = load_analysis(&path).unwrap();
    PipelineInput::new(video, DecisionRequest::new(goal))
}

#[tokio::test]
async fn test_weak_ad_is_routed_to_completion() {
    let input = input(&analysis_json("ad-weak", 40.0, 0.3, false), OptimizationGoal::Ctr);
    let outcome = pipeline().run(JobId::new(), input).await.unwrap();

    assert_eq!(outcome.kind(), "routed");
    assert_eq!(outcome.decision().kind(), "STRATEGIES");
    match outcome.route() {
        Some(RouteResult::Completed(done)) => {
            assert_eq!(done.engine_id, "planner");
            assert_eq!(done.degradation_level, DegradationLevel::Normal);
            assert!(done.output.uri.starts_with("dryrun://planner/"));
        }
        other => panic!("expected a completed render, got {:?}", other),
    }
}

#[tokio::test]
async fn test_healthy_ad_needs_no_action() {
    let input = input(
        &analysis_json("ad-healthy", 85.0, 0.8, true),
        OptimizationGoal::Retention,
    );
    let outcome = pipeline().run(JobId::new(), input).await.unwrap();
    assert!(matches!(outcome, PipelineOutcome::NoAction { .. }));
    assert!(outcome.route().is_none());
}

#[tokio::test]
async fn test_uncompilable_strategy_is_handed_back_as_bundle() {
    // Only proof is missing; the proof stack needs a testimonial card nobody supplied
    let input = input(
        &analysis_json("ad-no-proof", 85.0, 0.8, false),
        OptimizationGoal::Conversions,
    );
    let outcome = pipeline().run(JobId::new(), input).await.unwrap();

    let PipelineOutcome::Uncompilable {
        failures, route, ..
    } = &outcome
    else {
        panic!("expected an uncompilable outcome, got {}", outcome.kind());
    };
    assert!(!failures.is_empty());
    assert!(failures[0].reason.contains("testimonial_card"));

    let RouteResult::PartialSuccess(bundle) = route else {
        panic!("expected a partial-success bundle");
    };
    assert_eq!(bundle.degradation_level, DegradationLevel::PartialSuccess);
    assert!(bundle
        .original_plan
        .uncompilable_reason()
        .is_some_and(|r| r.contains("testimonial_card")));
    assert_eq!(bundle.analysis.as_ref().unwrap().video_id, "ad-no-proof");
    assert_eq!(
        bundle.strategy.as_ref().unwrap().id(),
        failures[0].strategy_id
    );
}

#[tokio::test]
async fn test_invalid_document_is_input_error() {
    let mut video = input(&analysis_json("ad-bad", 40.0, 0.3, false), OptimizationGoal::Ctr);
    video.video.video_id = String::new();

    let err = pipeline().run(JobId::new(), video).await.unwrap_err();
    assert!(err.is_input_error());
    assert!(matches!(err, WorkerError::Model(_)));
}

#[tokio::test]
async fn test_batch_keeps_input_order() {
    let jobs = vec![
        (
            JobId::from_string("weak"),
            input(&analysis_json("ad-weak", 40.0, 0.3, false), OptimizationGoal::Ctr),
        ),
        (
            JobId::from_string("healthy"),
            input(
                &analysis_json("ad-healthy", 85.0, 0.8, true),
                OptimizationGoal::Retention,
            ),
        ),
        (
            JobId::from_string("weak-2"),
            input(&analysis_json("ad-weak-2", 45.0, 0.35, false), OptimizationGoal::Ctr),
        ),
    ];

    let results = pipeline().run_batch(jobs).await;
    let kinds: Vec<&str> = results
        .iter()
        .map(|r| r.as_ref().unwrap().kind())
        .collect();
    assert_eq!(kinds, vec!["routed", "no_action", "routed"]);

    let job_ids: Vec<&str> = results
        .iter()
        .filter_map(|r| r.as_ref().unwrap().route())
        .map(|route| route.job().job_id.as_str())
        .collect();
    assert_eq!(job_ids, vec!["weak", "weak-2"]);
}

#[test]
fn test_sample_registry_parses() {
    let path = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config/engines.json");
    let registry = EngineRegistry::from_file(path).unwrap();
    assert_eq!(registry.len(), 3);
    assert!(registry.get("local-ffmpeg").unwrap().available);
}
