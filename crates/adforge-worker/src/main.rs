//! `adforge` command line.

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{bail, Context};
use clap::{Args, Parser, Subcommand, ValueEnum};
use metrics_exporter_prometheus::PrometheusBuilder;
use serde::Serialize;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use adforge_media::{compile, CompileOptions};
use adforge_models::{
    ActionKind, AnalyzedVideo, CostTier, CreativeBlueprint, EngineDescriptor, Framework, JobId,
    OptimizationGoal, OutputFormat, RenderPlan, Resolution, RiskTolerance,
};
use adforge_router::{EngineRegistry, RouteConstraints, Router};
use adforge_strategy::frameworks::TESTIMONIAL_ASSET;
use adforge_strategy::{decide, DecisionOutcome, DecisionRequest, DEFAULT_MAX_STRATEGIES};
use adforge_worker::{
    load_analysis, load_blueprint, load_history, resolve_goal, Pipeline, PipelineInput,
    WorkerConfig,
};

#[derive(Parser)]
#[command(name = "adforge", version, about = "Ad strategy decisions and capability-routed rendering")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Detect problems and rank remediation strategies
    Decide {
        /// Analyzed video JSON
        #[arg(long)]
        analysis: PathBuf,
        #[command(flatten)]
        decision: DecisionArgs,
    },
    /// Compile one selected strategy into a render plan
    Compile {
        #[arg(long)]
        analysis: PathBuf,
        #[command(flatten)]
        decision: DecisionArgs,
        /// 1-based rank of the strategy to compile
        #[arg(long, default_value_t = 1)]
        rank: usize,
        #[command(flatten)]
        output: OutputArgs,
    },
    /// Decide, compile and route one video
    Run {
        #[arg(long)]
        analysis: PathBuf,
        #[command(flatten)]
        decision: DecisionArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        route: RouteArgs,
    },
    /// Decide, compile and route many videos
    Batch {
        /// Analyzed video JSON files
        #[arg(required = true)]
        analyses: Vec<PathBuf>,
        #[command(flatten)]
        decision: DecisionArgs,
        #[command(flatten)]
        output: OutputArgs,
        #[command(flatten)]
        route: RouteArgs,
    },
    /// Print the JSON schema of a document
    Schema {
        #[arg(value_enum)]
        document: SchemaDocument,
    },
}

#[derive(Args)]
struct DecisionArgs {
    /// Creative blueprint JSON
    #[arg(long)]
    blueprint: Option<PathBuf>,
    /// retention, ctr or conversions (defaults to the blueprint objective)
    #[arg(long)]
    goal: Option<OptimizationGoal>,
    #[arg(long, default_value = "medium")]
    risk: RiskTolerance,
    /// Action kinds that must not be used (repeatable)
    #[arg(long = "forbid")]
    forbidden: Vec<ActionKind>,
    /// JSON array of past framework outcomes
    #[arg(long)]
    history: Option<PathBuf>,
    /// Framework used in the previous session
    #[arg(long)]
    previous_framework: Option<Framework>,
    #[arg(long, default_value_t = DEFAULT_MAX_STRATEGIES)]
    max_strategies: usize,
}

#[derive(Args)]
struct OutputArgs {
    /// Output frame size, e.g. 1080x1920 (defaults to the source size)
    #[arg(long, value_parser = parse_resolution)]
    resolution: Option<Resolution>,
    /// External asset as name=uri (repeatable)
    #[arg(long = "asset", value_parser = parse_asset)]
    assets: Vec<(String, String)>,
}

#[derive(Args)]
struct RouteArgs {
    /// Engine registry JSON (defaults to ADFORGE_REGISTRY_PATH)
    #[arg(long)]
    registry: Option<PathBuf>,
    /// Most expensive engine tier allowed
    #[arg(long, value_parser = parse_cost_tier)]
    cost_ceiling: Option<CostTier>,
    /// Per-attempt engine deadline
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Job id (generated when omitted)
    #[arg(long)]
    job_id: Option<String>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SchemaDocument {
    Analysis,
    Blueprint,
    Plan,
    Engine,
}

fn parse_resolution(s: &str) -> Result<Resolution, String> {
    let (w, h) = s
        .split_once('x')
        .ok_or_else(|| format!("expected WIDTHxHEIGHT, got '{}'", s))?;
    let width = w.trim().parse::<u32>().map_err(|e| e.to_string())?;
    let height = h.trim().parse::<u32>().map_err(|e| e.to_string())?;
    if width == 0 || height == 0 {
        return Err("resolution must be non-zero".to_string());
    }
    Ok(Resolution::new(width, height))
}

fn parse_asset(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((name, uri)) if !name.is_empty() && !uri.is_empty() => {
            Ok((name.to_string(), uri.to_string()))
        }
        _ => Err(format!("expected name=uri, got '{}'", s)),
    }
}

fn parse_cost_tier(s: &str) -> Result<CostTier, String> {
    match s.to_lowercase().as_str() {
        "low" => Ok(CostTier::Low),
        "medium" => Ok(CostTier::Medium),
        "high" => Ok(CostTier::High),
        "premium" => Ok(CostTier::Premium),
        _ => Err(format!("unknown cost tier '{}'", s)),
    }
}

impl DecisionArgs {
    fn blueprint(&self) -> anyhow::Result<Option<CreativeBlueprint>> {
        self.blueprint
            .as_ref()
            .map(load_blueprint)
            .transpose()
            .context("loading blueprint")
    }

    fn request(&self, blueprint: Option<&CreativeBlueprint>) -> anyhow::Result<DecisionRequest> {
        let mut request = DecisionRequest::new(resolve_goal(self.goal, blueprint))
            .with_risk_tolerance(self.risk)
            .with_max_strategies(self.max_strategies);
        for kind in &self.forbidden {
            request = request.forbid(*kind);
        }
        if let Some(path) = &self.history {
            request = request.with_history(load_history(path).context("loading history")?);
        }
        if let Some(framework) = self.previous_framework {
            request = request.with_previous_framework(framework);
        }
        Ok(request)
    }
}

impl OutputArgs {
    fn compile_options(&self, config: &WorkerConfig) -> CompileOptions {
        let mut options = CompileOptions::default();
        if let Some(resolution) = self.resolution {
            options = options.with_output(OutputFormat {
                resolution,
                ..OutputFormat::default()
            });
        }
        if let Some(uri) = &config.testimonial_asset {
            options = options.with_asset(TESTIMONIAL_ASSET, uri.clone());
        }
        for (name, uri) in &self.assets {
            options = options.with_asset(name.clone(), uri.clone());
        }
        options
    }
}

impl RouteArgs {
    fn constraints(&self) -> RouteConstraints {
        RouteConstraints {
            cost_ceiling: self.cost_ceiling,
            timeout: self.timeout_secs.map(Duration::from_secs),
        }
    }

    fn pipeline(&self, config: &WorkerConfig) -> anyhow::Result<Pipeline> {
        let path = self.registry.as_ref().unwrap_or(&config.registry_path);
        let registry = EngineRegistry::from_file(path)
            .with_context(|| format!("loading engine registry {}", path.display()))?;
        let router = Router::from_registry(registry, config.router.clone())?;
        Ok(Pipeline::new(Arc::new(router)))
    }
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn init_tracing() {
    // Colored output for dev, JSON for production; stdout carries results
    let use_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    let mut env_filter = EnvFilter::from_default_env();
    if std::env::var("RUST_LOG").is_err() {
        if let Ok(directive) = "adforge=info".parse() {
            env_filter = env_filter.add_directive(directive);
        }
    }

    if use_json {
        tracing_subscriber::registry()
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(env_filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_ansi(true)
                    .with_target(true)
                    .with_thread_ids(false)
                    .with_file(false)
                    .with_line_number(false),
            )
            .with(env_filter)
            .init();
    }
}

fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => info!("Prometheus metrics on http://{}/metrics", addr),
        Err(e) => warn!("Metrics exporter not started: {}", e),
    }
}

fn load_inputs(
    analysis: &Path,
    decision: &DecisionArgs,
) -> anyhow::Result<(AnalyzedVideo, Option<CreativeBlueprint>, DecisionRequest)> {
    let video = load_analysis(analysis)
        .with_context(|| format!("loading analysis {}", analysis.display()))?;
    let blueprint = decision.blueprint()?;
    let request = decision.request(blueprint.as_ref())?;
    Ok((video, blueprint, request))
}

fn compile_ranked(
    video: &AnalyzedVideo,
    decision: &DecisionOutcome,
    rank: usize,
    options: &CompileOptions,
) -> anyhow::Result<RenderPlan> {
    let strategies = decision.strategies();
    if strategies.is_empty() {
        bail!(
            "decision was {}: {}",
            decision.kind(),
            decision.fallback_suggestion().unwrap_or_default()
        );
    }
    let Some(strategy) = rank.checked_sub(1).and_then(|i| strategies.get(i)) else {
        bail!("rank {} out of range (1-{})", rank, strategies.len());
    };
    Ok(compile(video, &strategy.candidate, options))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables
    dotenvy::dotenv().ok();
    init_tracing();

    let cli = Cli::parse();
    let config = WorkerConfig::from_env();
    if let Some(addr) = config.metrics_addr {
        init_metrics(addr);
    }

    match cli.command {
        Command::Decide { analysis, decision } => {
            let (video, _, request) = load_inputs(&analysis, &decision)?;
            print_json(&decide(&video, &request))
        }
        Command::Compile {
            analysis,
            decision,
            rank,
            output,
        } => {
            let (video, _, request) = load_inputs(&analysis, &decision)?;
            let outcome = decide(&video, &request);
            let plan = compile_ranked(&video, &outcome, rank, &output.compile_options(&config))?;
            if let Some(reason) = plan.uncompilable_reason() {
                warn!("Plan {} is uncompilable: {}", plan.plan_id, reason);
            }
            print_json(&plan)
        }
        Command::Run {
            analysis,
            decision,
            output,
            route,
        } => {
            let (video, blueprint, request) = load_inputs(&analysis, &decision)?;
            let pipeline = route.pipeline(&config)?;
            let mut input = PipelineInput::new(video, request)
                .with_compile_options(output.compile_options(&config))
                .with_constraints(route.constraints());
            if let Some(blueprint) = blueprint {
                input = input.with_blueprint(blueprint);
            }
            let job_id = route
                .job_id
                .clone()
                .map(JobId::from_string)
                .unwrap_or_default();
            let outcome = pipeline.run(job_id, input).await?;
            print_json(&outcome)
        }
        Command::Batch {
            analyses,
            decision,
            output,
            route,
        } => {
            let blueprint = decision.blueprint()?;
            let request = decision.request(blueprint.as_ref())?;
            let options = output.compile_options(&config);
            let pipeline = route.pipeline(&config)?;

            let mut jobs = Vec::with_capacity(analyses.len());
            for path in &analyses {
                let video = load_analysis(path)
                    .with_context(|| format!("loading analysis {}", path.display()))?;
                let mut input = PipelineInput::new(video, request.clone())
                    .with_compile_options(options.clone())
                    .with_constraints(route.constraints());
                if let Some(blueprint) = &blueprint {
                    input = input.with_blueprint(blueprint.clone());
                }
                jobs.push((JobId::new(), input));
            }
            let job_ids: Vec<JobId> = jobs.iter().map(|(id, _)| id.clone()).collect();

            let results = pipeline.run_batch(jobs).await;
            let mut report = Vec::with_capacity(results.len());
            for ((path, job_id), result) in analyses.iter().zip(job_ids).zip(results) {
                let entry = match result {
                    Ok(outcome) => serde_json::json!({
                        "analysis": path,
                        "job_id": job_id,
                        "outcome": outcome,
                    }),
                    Err(e) => {
                        error!(job_id = %job_id, "{}", e);
                        serde_json::json!({
                            "analysis": path,
                            "job_id": job_id,
                            "error": e.to_string(),
                        })
                    }
                };
                report.push(entry);
            }
            print_json(&report)
        }
        Command::Schema { document } => match document {
            SchemaDocument::Analysis => print_json(&schemars::schema_for!(AnalyzedVideo)),
            SchemaDocument::Blueprint => print_json(&schemars::schema_for!(CreativeBlueprint)),
            SchemaDocument::Plan => print_json(&schemars::schema_for!(RenderPlan)),
            SchemaDocument::Engine => print_json(&schemars::schema_for!(EngineDescriptor)),
        },
    }
}
