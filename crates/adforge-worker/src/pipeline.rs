//! Validate, decide, compile and route analyzed videos.

use std::sync::Arc;

use adforge_media::{compile, CompileOptions};
use adforge_models::{
    validate_analyzed_video, validate_blueprint, AnalyzedVideo, CreativeBlueprint, JobId,
    OptimizationGoal,
};
use adforge_router::{route_batch, RouteConstraints, RouteRequest, RouteResult, Router, UpstreamArtifacts};
use adforge_strategy::{decide, DecisionOutcome, DecisionRequest};
use serde::Serialize;
use tracing::Instrument;

use crate::error::{WorkerError, WorkerResult};
use crate::logging::JobLogger;

/// One video to process.
#[derive(Debug, Clone)]
pub struct PipelineInput {
    pub video: AnalyzedVideo,
    pub blueprint: Option<CreativeBlueprint>,
    pub request: DecisionRequest,
    pub compile: CompileOptions,
    pub constraints: RouteConstraints,
}

impl PipelineInput {
    pub fn new(video: AnalyzedVideo, request: DecisionRequest) -> Self {
        Self {
            video,
            blueprint: None,
            request,
            compile: CompileOptions::default(),
            constraints: RouteConstraints::default(),
        }
    }

    pub fn with_blueprint(mut self, blueprint: CreativeBlueprint) -> Self {
        self.blueprint = Some(blueprint);
        self
    }

    pub fn with_compile_options(mut self, options: CompileOptions) -> Self {
        self.compile = options;
        self
    }

    pub fn with_constraints(mut self, constraints: RouteConstraints) -> Self {
        self.constraints = constraints;
        self
    }
}

/// A strategy whose plan did not compile.
#[derive(Debug, Clone, Serialize)]
pub struct CompileFailure {
    pub strategy_id: String,
    pub reason: String,
}

/// Result of one pipeline run.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "pipeline", rename_all = "snake_case")]
pub enum PipelineOutcome {
    /// The ad is good enough as is
    NoAction { decision: DecisionOutcome },
    /// Problems exist but no structural strategy is acceptable
    SafeOptimizationOnly { decision: DecisionOutcome },
    /// Every selected strategy produced an uncompilable plan; the best-ranked
    /// one is handed back as a partial-success bundle
    Uncompilable {
        decision: DecisionOutcome,
        failures: Vec<CompileFailure>,
        route: RouteResult,
    },
    Routed {
        decision: DecisionOutcome,
        strategy_id: String,
        #[serde(skip_serializing_if = "Vec::is_empty")]
        skipped: Vec<CompileFailure>,
        route: RouteResult,
    },
}

impl PipelineOutcome {
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineOutcome::NoAction { .. } => "no_action",
            PipelineOutcome::SafeOptimizationOnly { .. } => "safe_optimization_only",
            PipelineOutcome::Uncompilable { .. } => "uncompilable",
            PipelineOutcome::Routed { .. } => "routed",
        }
    }

    pub fn decision(&self) -> &DecisionOutcome {
        match self {
            PipelineOutcome::NoAction { decision }
            | PipelineOutcome::SafeOptimizationOnly { decision }
            | PipelineOutcome::Uncompilable { decision, .. }
            | PipelineOutcome::Routed { decision, .. } => decision,
        }
    }

    pub fn route(&self) -> Option<&RouteResult> {
        match self {
            PipelineOutcome::Routed { route, .. } | PipelineOutcome::Uncompilable { route, .. } => {
                Some(route)
            }
            _ => None,
        }
    }
}

/// Explicit goal, else the blueprint objective's goal, else retention.
pub fn resolve_goal(
    explicit: Option<OptimizationGoal>,
    blueprint: Option<&CreativeBlueprint>,
) -> OptimizationGoal {
    explicit
        .or_else(|| blueprint.map(|b| b.objective.default_goal()))
        .unwrap_or(OptimizationGoal::Retention)
}

/// Routing half of a prepared job.
struct PendingRoute {
    logger: JobLogger,
    decision: DecisionOutcome,
    strategy_id: String,
    skipped: Vec<CompileFailure>,
    /// No strategy compiled; `skipped` holds every failure
    uncompilable: bool,
}

impl PendingRoute {
    fn finish(self, route: RouteResult) -> PipelineOutcome {
        let summary = format!("{} at {}", route.outcome(), route.degradation_level());
        if route.is_completed() {
            self.logger.log_completion(&summary);
        } else {
            self.logger.log_warning(&summary);
        }
        if self.uncompilable {
            return PipelineOutcome::Uncompilable {
                decision: self.decision,
                failures: self.skipped,
                route,
            };
        }
        PipelineOutcome::Routed {
            decision: self.decision,
            strategy_id: self.strategy_id,
            skipped: self.skipped,
            route,
        }
    }
}

enum Prepared {
    Done(PipelineOutcome),
    Route(PendingRoute, RouteRequest),
}

/// Runs analyzed videos through decision, compilation and routing.
pub struct Pipeline {
    router: Arc<Router>,
}

impl Pipeline {
    pub fn new(router: Arc<Router>) -> Self {
        Self { router }
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    /// Process one video.
    ///
    /// Only invalid input documents produce an error; everything else is an
    /// outcome.
    pub async fn run(&self, job_id: JobId, input: PipelineInput) -> WorkerResult<PipelineOutcome> {
        let span = JobLogger::new(&job_id, "pipeline").create_span();
        async move {
            match self.prepare(&job_id, input)? {
                Prepared::Done(outcome) => Ok(outcome),
                Prepared::Route(pending, request) => {
                    let route = self.router.route(request).await;
                    Ok(pending.finish(route))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Process many videos, routing them concurrently.
    ///
    /// Results are in input order.
    pub async fn run_batch(
        &self,
        jobs: Vec<(JobId, PipelineInput)>,
    ) -> Vec<WorkerResult<PipelineOutcome>> {
        let mut results: Vec<Option<WorkerResult<PipelineOutcome>>> = Vec::with_capacity(jobs.len());
        let mut pending = Vec::new();
        let mut requests = Vec::new();

        for (index, (job_id, input)) in jobs.into_iter().enumerate() {
            match self.prepare(&job_id, input) {
                Ok(Prepared::Done(outcome)) => results.push(Some(Ok(outcome))),
                Ok(Prepared::Route(route, request)) => {
                    pending.push((index, route));
                    requests.push(request);
                    results.push(None);
                }
                Err(e) => {
                    JobLogger::new(&job_id, "validate").log_error(&e.to_string());
                    results.push(Some(Err(e)));
                }
            }
        }

        let concurrency = self.router.config().batch_concurrency;
        let routed = route_batch(Arc::clone(&self.router), requests, concurrency).await;
        for ((index, route), result) in pending.into_iter().zip(routed) {
            results[index] = Some(Ok(route.finish(result)));
        }

        results
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| Err(WorkerError::invalid_input("job produced no result")))
            })
            .collect()
    }

    fn prepare(&self, job_id: &JobId, input: PipelineInput) -> WorkerResult<Prepared> {
        let PipelineInput {
            video,
            blueprint,
            request,
            compile: options,
            constraints,
        } = input;

        validate_analyzed_video(&video)?;
        if let Some(blueprint) = &blueprint {
            validate_blueprint(blueprint)?;
        }

        let logger = JobLogger::new(job_id, "decide");
        logger.log_start(&format!(
            "video {} ({} segments), goal {}, risk {}",
            video.video_id,
            video.segments.len(),
            request.goal,
            request.risk_tolerance
        ));
        if let Some(framework) = blueprint.as_ref().and_then(|b| b.framework.as_deref()) {
            logger.log_progress(&format!("blueprint suggests {}", framework));
        }

        let decision = decide(&video, &request);
        match &decision {
            DecisionOutcome::NoAction { reason, .. } => {
                logger.log_completion(reason);
                return Ok(Prepared::Done(PipelineOutcome::NoAction { decision }));
            }
            DecisionOutcome::SafeOptimizationOnly { reason, .. } => {
                logger.log_completion(reason);
                return Ok(Prepared::Done(PipelineOutcome::SafeOptimizationOnly {
                    decision,
                }));
            }
            DecisionOutcome::Strategies { ranked, .. } => {
                logger.log_progress(&format!("{} strategies selected", ranked.len()));
            }
        }

        let logger = logger.for_operation("compile");
        let mut failures = Vec::new();
        let mut chosen = None;
        let mut best_rejected = None;
        for strategy in decision.strategies() {
            let plan = compile(&video, &strategy.candidate, &options);
            match plan.uncompilable_reason() {
                Some(reason) => {
                    logger.log_warning(&format!("{} is uncompilable: {}", strategy.id(), reason));
                    failures.push(CompileFailure {
                        strategy_id: strategy.id().to_string(),
                        reason: reason.to_string(),
                    });
                    if best_rejected.is_none() {
                        best_rejected = Some((strategy.clone(), plan));
                    }
                }
                None => {
                    chosen = Some((strategy.clone(), plan));
                    break;
                }
            }
        }

        let uncompilable = chosen.is_none();
        let Some((strategy, plan)) = chosen.or(best_rejected) else {
            return Err(WorkerError::invalid_input("decision selected no strategies"));
        };
        if uncompilable {
            logger.log_error(&format!(
                "no selected strategy compiled, handing back {}",
                plan.plan_id
            ));
        } else {
            logger.log_progress(&format!(
                "{} compiled to {} ({} entries, {}ms)",
                strategy.id(),
                plan.plan_id,
                plan.timeline.len(),
                plan.total_duration_ms()
            ));
        }

        let route_logger = logger.for_operation("route");
        let request = RouteRequest::new(plan)
            .with_job_id(job_id.clone())
            .with_constraints(constraints)
            .with_progress(route_logger.progress_callback())
            .with_artifacts(UpstreamArtifacts {
                analysis: Some(video),
                strategy: Some(strategy.clone()),
            });
        let pending = PendingRoute {
            logger: route_logger,
            decision,
            strategy_id: strategy.id().to_string(),
            skipped: failures,
            uncompilable,
        };
        Ok(Prepared::Route(pending, request))
    }
}
