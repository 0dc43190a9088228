//! Capability-based routing with a bounded degradation ladder.
//!
//! A route always ends in [`RouteResult::Completed`] or
//! [`RouteResult::PartialSuccess`]. Levels only escalate:
//!
//! - L0 normal: the compiled plan on the top-scored engine
//! - L1 retry-same: one retry after a transient failure
//! - L2 simplify: a reduced plan, re-scored against the whole registry
//! - L3 switch-engine: attempted engines excluded, bounded switches
//! - L4 partial-success: plans and artifacts handed back for manual work
//!
//! A plan no engine can render goes straight to L4.

use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};

use adforge_media::{manual_command, noop_progress, ProgressCallback};
use adforge_models::{
    AnalyzedVideo, CostTier, DegradationLevel, JobId, RenderPlan, RouteState, ScoredStrategy,
};
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use tracing::{error, info, info_span, warn, Instrument};

use crate::bindings::EngineBindings;
use crate::capability::RequiredCapabilities;
use crate::config::RouterConfig;
use crate::engine::{EngineJob, EngineStatus, OutputReference, RenderEngine};
use crate::error::{EngineError, RouterResult};
use crate::metrics;
use crate::registry::EngineRegistry;
use crate::scoring::{rank_engines, Disqualified, EngineRanking};
use crate::simplify::simplify;
use crate::state::JobStateContext;

/// Allowed relative difference between reported and planned duration.
const DURATION_TOLERANCE: f64 = 0.1;
/// Floor of the duration tolerance.
const MIN_DURATION_TOLERANCE_MS: u64 = 500;

/// Caller limits for one route.
#[derive(Debug, Clone, Default)]
pub struct RouteConstraints {
    /// Most expensive tier allowed
    pub cost_ceiling: Option<CostTier>,
    /// Per-attempt deadline overriding the configured one
    pub timeout: Option<Duration>,
}

/// Upstream documents carried into a partial-success bundle.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpstreamArtifacts {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalyzedVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ScoredStrategy>,
}

/// One routing request.
#[derive(Clone)]
pub struct RouteRequest {
    pub job_id: JobId,
    pub plan: RenderPlan,
    pub constraints: RouteConstraints,
    pub artifacts: UpstreamArtifacts,
    pub progress: ProgressCallback,
}

impl RouteRequest {
    pub fn new(plan: RenderPlan) -> Self {
        Self {
            job_id: JobId::new(),
            plan,
            constraints: RouteConstraints::default(),
            artifacts: UpstreamArtifacts::default(),
            progress: noop_progress(),
        }
    }

    pub fn with_job_id(mut self, job_id: JobId) -> Self {
        self.job_id = job_id;
        self
    }

    pub fn with_constraints(mut self, constraints: RouteConstraints) -> Self {
        self.constraints = constraints;
        self
    }

    pub fn with_artifacts(mut self, artifacts: UpstreamArtifacts) -> Self {
        self.artifacts = artifacts;
        self
    }

    pub fn with_progress(mut self, progress: ProgressCallback) -> Self {
        self.progress = progress;
        self
    }
}

/// A playable render.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CompletedRender {
    pub job: JobStateContext,
    pub engine_id: String,
    pub output: OutputReference,
    pub degradation_level: DegradationLevel,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
    /// The plan actually rendered (simplified after L2)
    pub plan_used: RenderPlan,
}

/// Everything needed to finish the job by hand.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PartialSuccessBundle {
    pub job: JobStateContext,
    pub degradation_level: DegradationLevel,
    pub explanation: String,
    pub original_plan: RenderPlan,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub simplified_plan: Option<RenderPlan>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<AnalyzedVideo>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub strategy: Option<ScoredStrategy>,
    /// Literal FFmpeg command for the most faithful renderable plan
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub manual_command: Option<String>,
}

/// Terminal result of a route.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum RouteResult {
    Completed(CompletedRender),
    PartialSuccess(PartialSuccessBundle),
}

impl RouteResult {
    pub fn job(&self) -> &JobStateContext {
        match self {
            RouteResult::Completed(done) => &done.job,
            RouteResult::PartialSuccess(bundle) => &bundle.job,
        }
    }

    pub fn degradation_level(&self) -> DegradationLevel {
        match self {
            RouteResult::Completed(done) => done.degradation_level,
            RouteResult::PartialSuccess(bundle) => bundle.degradation_level,
        }
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, RouteResult::Completed(_))
    }

    pub fn outcome(&self) -> &'static str {
        match self {
            RouteResult::Completed(_) => "completed",
            RouteResult::PartialSuccess(_) => "partial_success",
        }
    }
}

/// Routes render plans to engines.
///
/// Holds only read-only shared state, so one router serves any number of
/// concurrent routes.
pub struct Router {
    registry: Arc<EngineRegistry>,
    bindings: Arc<EngineBindings>,
    config: RouterConfig,
}

impl Router {
    pub fn new(
        registry: Arc<EngineRegistry>,
        bindings: Arc<EngineBindings>,
        config: RouterConfig,
    ) -> Self {
        Self {
            registry,
            bindings,
            config,
        }
    }

    /// Router whose engines are built from the registry backends.
    pub fn from_registry(registry: EngineRegistry, config: RouterConfig) -> RouterResult<Self> {
        let bindings = EngineBindings::from_registry(&registry, &config)?;
        Ok(Self::new(Arc::new(registry), Arc::new(bindings), config))
    }

    pub fn registry(&self) -> &EngineRegistry {
        &self.registry
    }

    pub fn config(&self) -> &RouterConfig {
        &self.config
    }

    /// Route one plan to completion or partial success.
    pub async fn route(&self, request: RouteRequest) -> RouteResult {
        let started = Instant::now();
        let span = info_span!("route", job_id = %request.job_id, plan_id = %request.plan.plan_id);
        let result = self.run(request).instrument(span).await;

        let level = result.degradation_level();
        metrics::record_route(result.outcome(), level, started.elapsed().as_secs_f64());
        info!(
            job_id = %result.job().job_id,
            level = %level,
            attempts = result.job().attempts,
            "Route finished: {}",
            result.outcome()
        );
        result
    }

    async fn run(&self, request: RouteRequest) -> RouteResult {
        let RouteRequest {
            job_id,
            plan,
            constraints,
            artifacts,
            progress,
        } = request;

        let mut ctx = JobStateContext::new(job_id.clone());
        advance(&mut ctx, RouteState::Routing, None, None, "routing started");

        if let Some(reason) = plan.uncompilable_reason() {
            let explanation = format!("plan {} is not renderable: {}", plan.plan_id, reason);
            return self.partial(ctx, explanation, plan, None, artifacts);
        }

        let timeout = constraints.timeout.unwrap_or(self.config.engine_timeout);
        let no_exclusions = BTreeSet::new();
        let ranking = self.rank(&plan, &no_exclusions, constraints.cost_ceiling);
        let Some(best) = ranking.best() else {
            let explanation = format!("no engine can render this plan: {}", ranking.summary());
            return self.partial(ctx, explanation, plan, None, artifacts);
        };

        let mut engine_id = best.engine_id.clone();
        let mut current = plan.clone();
        let mut simplified: Option<RenderPlan> = None;
        let mut attempted: BTreeSet<String> = BTreeSet::new();
        let mut warnings: Vec<String> = plan.validation.warnings.clone();
        let mut failures: Vec<String> = Vec::new();
        let mut switches = 0u32;

        // L0 + L1 + L2 + every permitted switch
        let max_attempts = 3 + self.config.max_engine_switches;
        for _ in 0..max_attempts {
            let Some(engine) = self.bindings.get(&engine_id) else {
                break;
            };
            attempted.insert(engine_id.clone());
            ctx.record_attempt();
            metrics::record_attempt(&engine_id);
            let note = format!("attempt {} on {}", ctx.attempts, current.plan_id);
            advance(&mut ctx, RouteState::Executing, Some(&engine_id), None, note);

            let job = EngineJob {
                job_id: job_id.clone(),
                plan: current.clone(),
                progress: progress.clone(),
            };
            let failure = match self.execute(engine.as_ref(), &job, timeout).await {
                Ok(output) => {
                    advance(&mut ctx, RouteState::Validating, Some(&engine_id), None, "");
                    match validate_output(&output, &current) {
                        Ok(()) => {
                            advance(
                                &mut ctx,
                                RouteState::Completed,
                                Some(&engine_id),
                                None,
                                output.uri.clone(),
                            );
                            let degradation_level = ctx.level;
                            return RouteResult::Completed(CompletedRender {
                                job: ctx,
                                engine_id,
                                output,
                                degradation_level,
                                warnings,
                                plan_used: current,
                            });
                        }
                        Err(e) => e,
                    }
                }
                Err(e) => e,
            };

            warn!(
                engine_id = %engine_id,
                level = %ctx.level,
                code = failure.code(),
                "Engine attempt failed: {}",
                failure
            );
            metrics::record_failure(&engine_id, failure.code());
            failures.push(format!("{} ({}): {}", engine_id, ctx.level, failure));
            advance(
                &mut ctx,
                RouteState::Degraded,
                Some(&engine_id),
                Some(&failure),
                failure.to_string(),
            );

            if failure.is_transient() && self.escalate(&mut ctx, DegradationLevel::RetrySame) {
                warnings.push(format!("retried {} after: {}", engine_id, failure));
                continue;
            }

            let exclusions = if self.escalate(&mut ctx, DegradationLevel::Simplify) {
                let reduced = simplify(&plan);
                if reduced.is_ready() {
                    warnings.push(
                        "plan simplified: overlays dropped, normal speed, 720p cap, no audio fades"
                            .to_string(),
                    );
                    current = reduced.clone();
                    simplified = Some(reduced);
                }
                &no_exclusions
            } else if switches < self.config.max_engine_switches {
                self.escalate(&mut ctx, DegradationLevel::SwitchEngine);
                switches += 1;
                &attempted
            } else {
                break;
            };

            let note = format!("re-routing at {}", ctx.level);
            advance(&mut ctx, RouteState::Routing, None, None, note);
            let ranking = self.rank(&current, exclusions, constraints.cost_ceiling);
            match ranking.best() {
                Some(next) => {
                    if next.engine_id != engine_id {
                        warnings.push(format!("switched from {} to {}", engine_id, next.engine_id));
                    }
                    engine_id = next.engine_id.clone();
                }
                None => {
                    let explanation = format!(
                        "no further engine at {}: {}; failures: {}",
                        ctx.level,
                        ranking.summary(),
                        failures.join("; ")
                    );
                    return self.partial(ctx, explanation, plan, simplified, artifacts);
                }
            }
        }

        let explanation = format!("engine attempts exhausted: {}", failures.join("; "));
        self.partial(ctx, explanation, plan, simplified, artifacts)
    }

    /// Score the registry for `plan`, dropping engines without a binding.
    fn rank(
        &self,
        plan: &RenderPlan,
        excluded: &BTreeSet<String>,
        cost_ceiling: Option<CostTier>,
    ) -> EngineRanking {
        let required = RequiredCapabilities::from_plan(plan);
        let mut ranking = rank_engines(&self.registry, &required, excluded, cost_ceiling);
        let (bound, unbound): (Vec<_>, Vec<_>) = ranking
            .ranked
            .into_iter()
            .partition(|s| self.bindings.get(&s.engine_id).is_some());
        ranking.ranked = bound;
        ranking
            .disqualified
            .extend(unbound.into_iter().map(|s| Disqualified {
                engine_id: s.engine_id,
                reasons: vec!["no engine binding".to_string()],
            }));
        ranking
    }

    fn escalate(&self, ctx: &mut JobStateContext, level: DegradationLevel) -> bool {
        let raised = ctx.escalate(level);
        if raised {
            metrics::record_degradation(level);
            info!(job_id = %ctx.job_id, level = %level, "Degradation escalated");
        }
        raised
    }

    /// One engine attempt under the deadline, polling queued work.
    async fn execute(
        &self,
        engine: &dyn RenderEngine,
        job: &EngineJob,
        timeout: Duration,
    ) -> Result<OutputReference, EngineError> {
        let work = async {
            match engine.submit(job).await? {
                EngineStatus::Done(output) => Ok(output),
                EngineStatus::Queued { ticket } => self.poll_until_done(engine, ticket).await,
            }
        };
        let guarded = AssertUnwindSafe(work).catch_unwind();
        match tokio::time::timeout(timeout, guarded).await {
            Ok(Ok(result)) => result,
            Ok(Err(panic)) => Err(EngineError::Panicked(panic_message(panic.as_ref()))),
            Err(_) => Err(EngineError::Timeout(timeout.as_millis() as u64)),
        }
    }

    async fn poll_until_done(
        &self,
        engine: &dyn RenderEngine,
        mut ticket: String,
    ) -> Result<OutputReference, EngineError> {
        for _ in 0..self.config.max_polls {
            tokio::time::sleep(self.config.poll_interval).await;
            match engine.poll(&ticket).await? {
                EngineStatus::Done(output) => return Ok(output),
                EngineStatus::Queued { ticket: next } => ticket = next,
            }
        }
        Err(EngineError::PollExhausted(self.config.max_polls))
    }

    fn partial(
        &self,
        mut ctx: JobStateContext,
        explanation: String,
        original_plan: RenderPlan,
        simplified_plan: Option<RenderPlan>,
        artifacts: UpstreamArtifacts,
    ) -> RouteResult {
        self.escalate(&mut ctx, DegradationLevel::PartialSuccess);
        advance(
            &mut ctx,
            RouteState::PartialSuccess,
            None,
            None,
            explanation.clone(),
        );
        warn!(job_id = %ctx.job_id, "Partial success: {}", explanation);

        let manual_command = manual_command(&original_plan)
            .or_else(|| simplified_plan.as_ref().and_then(manual_command));
        RouteResult::PartialSuccess(PartialSuccessBundle {
            job: ctx,
            degradation_level: DegradationLevel::PartialSuccess,
            explanation,
            original_plan,
            simplified_plan,
            analysis: artifacts.analysis,
            strategy: artifacts.strategy,
            manual_command,
        })
    }

    /// Partial success for a request whose routing task was lost.
    pub(crate) fn abandoned(
        &self,
        job_id: JobId,
        plan: RenderPlan,
        artifacts: UpstreamArtifacts,
        reason: String,
    ) -> RouteResult {
        let mut ctx = JobStateContext::new(job_id);
        advance(&mut ctx, RouteState::Routing, None, None, "");
        self.partial(ctx, reason, plan, None, artifacts)
    }
}

fn advance(
    ctx: &mut JobStateContext,
    to: RouteState,
    engine_id: Option<&str>,
    failure: Option<&EngineError>,
    note: impl Into<String>,
) {
    if let Err(e) = ctx.transition(to, engine_id, failure.map(EngineError::code), note) {
        error!(job_id = %ctx.job_id, "{}", e);
    }
}

/// Check an engine's output reference against the plan.
pub fn validate_output(output: &OutputReference, plan: &RenderPlan) -> Result<(), EngineError> {
    if output.uri.trim().is_empty() {
        return Err(EngineError::invalid_output("empty output reference"));
    }
    if let Some(actual) = output.duration_ms {
        let expected = plan.total_duration_ms();
        let tolerance = ((expected as f64 * DURATION_TOLERANCE) as u64).max(MIN_DURATION_TOLERANCE_MS);
        if actual.abs_diff(expected) > tolerance {
            return Err(EngineError::invalid_output(format!(
                "output is {}ms, plan is {}ms",
                actual, expected
            )));
        }
    }
    Ok(())
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|m| m.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}
