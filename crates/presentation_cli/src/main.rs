//! HazardLens CLI
//!
//! Device profiling, local analysis runs, rollout inspection and
//! performance regression checks.

#![allow(clippy::print_stdout)]

mod report;
mod wiring;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use ai_core::{BackendSelector, DeviceProfiler, NativeRuntime};
use anyhow::{Context, bail};
use application::{FallbackOutcome, ON_DEVICE_FEATURE_KEY, RegressionDetector, rollout};
use clap::{Args, Parser, Subcommand};
use domain::{AnalysisRequest, BackendPreference, ConcreteBackend, PerformanceSnapshot, WorkType};
use infrastructure::{
    AppConfig, JsonFileBaselineStore, SimulatedRuntime, SimulatedRuntimeConfig, init_telemetry,
};

use crate::wiring::{DeviceArgs, Sessions};

/// Exit code when a regression check finds a degraded metric
const EXIT_REGRESSED: i32 = 2;

/// HazardLens CLI
#[derive(Parser)]
#[command(name = "hazardlens-cli")]
#[command(author, version, about = "HazardLens on-device hazard analysis CLI", long_about = None)]
struct Cli {
    /// Verbosity level
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (default: ./hazardlens.toml when present)
    #[arg(short, long, env = "HAZARDLENS_CONFIG", global = true)]
    config: Option<PathBuf>,

    /// Write logs as JSON lines
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the device profile and the backends it supports
    Profile {
        #[command(flatten)]
        device: DeviceArgs,
    },

    /// Analyze a site photo through the analyzer chain
    ///
    /// Example: hazardlens-cli analyze site.jpg --work-type roadwork --runs 5
    Analyze(AnalyzeArgs),

    /// Show the rollout bucket and analyzer chain for a device
    Rollout {
        /// Stable device identifier
        device_id: String,

        /// Override the configured rollout percentage
        #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
        percentage: Option<u8>,

        /// Feature key to bucket under
        #[arg(short, long, default_value = ON_DEVICE_FEATURE_KEY)]
        feature: String,
    },

    /// Compare a saved performance snapshot with the stored baseline
    ///
    /// Exits with status 2 when any metric regressed.
    Regression {
        /// Snapshot JSON written by `analyze --save-snapshot`
        snapshot: PathBuf,

        /// Baseline file (default: from configuration)
        #[arg(short, long)]
        baselines: Option<PathBuf>,

        /// Store the snapshot as the new baseline after comparing
        #[arg(long)]
        record: bool,
    },
}

#[derive(Args)]
struct AnalyzeArgs {
    /// Image file to analyze
    image: PathBuf,

    /// Number of times to analyze the image
    #[arg(short = 'n', long, default_value_t = 1, value_parser = clap::value_parser!(u32).range(1..))]
    runs: u32,

    /// Kind of work on site, selects required PPE
    #[arg(short, long, default_value = "general_construction")]
    work_type: WorkType,

    /// Minimum detection confidence (default: from configuration)
    #[arg(short, long)]
    threshold: Option<f32>,

    /// Backend preference, `auto` or a backend id (default: from configuration)
    #[arg(short, long)]
    backend: Option<BackendPreference>,

    /// Model file (default: from configuration)
    #[arg(short, long)]
    model: Option<PathBuf>,

    /// Stable identifier used for rollout bucketing
    #[arg(long, default_value = "local-device")]
    device_id: String,

    /// Skip regulatory code mapping
    #[arg(long)]
    no_regulatory: bool,

    /// Simulated CPU inference latency in milliseconds
    #[arg(long, default_value_t = 120)]
    latency_ms: u64,

    /// Print results as JSON lines
    #[arg(long)]
    json: bool,

    /// Write the final performance snapshot to this file
    #[arg(long)]
    save_snapshot: Option<PathBuf>,

    #[command(flatten)]
    device: DeviceArgs,
}

/// Determine log filter level from verbosity count
const fn log_filter_from_verbosity(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config =
        AppConfig::load_from(cli.config.as_deref()).context("failed to load configuration")?;

    // Without -v the CLI only reports problems
    config.logging.filter = log_filter_from_verbosity(cli.verbose).to_string();
    config.logging.json |= cli.json_logs;
    let _telemetry = init_telemetry(&config.logging)?;

    match cli.command {
        Commands::Profile { device } => run_profile(&config, &device)?,
        Commands::Analyze(args) => run_analyze(&config, &args).await?,
        Commands::Rollout {
            device_id,
            percentage,
            feature,
        } => run_rollout(&config, &device_id, percentage, &feature),
        Commands::Regression {
            snapshot,
            baselines,
            record,
        } => {
            if run_regression(&config, &snapshot, baselines, record).await? {
                std::process::exit(EXIT_REGRESSED);
            }
        },
    }

    Ok(())
}

fn run_profile(config: &AppConfig, device: &DeviceArgs) -> anyhow::Result<()> {
    let capabilities = device.capabilities()?;
    let profiler = DeviceProfiler::new(config.engine.profiler.clone());
    let profile = profiler.profile(capabilities.as_ref());
    let supported = profiler.supported_backends(&profile);
    let auto = BackendSelector::new(config.engine.selection)
        .auto_select(&supported, profile.total_memory_mb);

    print!(
        "{}",
        report::profile_summary(&profile, &supported, auto, capabilities.available_memory_mb())
    );
    Ok(())
}

async fn run_analyze(config: &AppConfig, args: &AnalyzeArgs) -> anyhow::Result<()> {
    let image = tokio::fs::read(&args.image)
        .await
        .with_context(|| format!("failed to read image {}", args.image.display()))?;
    let model_path = args.model.clone().unwrap_or_else(|| config.model.path.clone());
    let preference = args.backend.unwrap_or(config.model.backend);

    let runtime: Arc<dyn NativeRuntime> = Arc::new(SimulatedRuntime::new(SimulatedRuntimeConfig {
        cpu_latency_ms: args.latency_ms,
        ..SimulatedRuntimeConfig::default()
    }));
    let sessions = Sessions::start(
        config,
        &model_path,
        preference,
        args.device.capabilities()?,
        runtime,
    )
    .await;
    let orchestrator = sessions.orchestrator(config.rollout.clone());

    if !args.json {
        let bound = |backend: Option<ConcreteBackend>| {
            backend.map_or_else(|| "unavailable".to_string(), |b| b.to_string())
        };
        println!("🧠 On-device: {}", bound(sessions.on_device.bound_backend()));
        println!("🐢 Legacy:    {}", bound(sessions.legacy.bound_backend()));
        println!();
    }

    let request = AnalysisRequest::new(image, args.work_type)
        .with_confidence_threshold(
            args.threshold
                .unwrap_or(config.engine.default_confidence_threshold),
        )
        .with_regulatory_codes(!args.no_regulatory);

    let mut failures = 0;
    for run in 1..=args.runs {
        match orchestrator.analyze(&args.device_id, &request).await {
            Ok(outcome) if args.json => {
                println!("{}", serde_json::to_string(&outcome_json(run, &outcome))?);
            },
            Ok(outcome) => print!("{}", report::outcome_summary(run, &outcome)),
            Err(e) => {
                failures += 1;
                println!("❌ Run {run} failed: {e}");
            },
        }
    }

    let snapshot = sessions.on_device.performance_snapshot();
    if args.json {
        println!("{}", serde_json::to_string(&snapshot)?);
    } else {
        println!();
        print!("{}", report::snapshot_summary(&snapshot));
    }

    if let Some(path) = &args.save_snapshot {
        std::fs::write(path, serde_json::to_vec_pretty(&snapshot)?)
            .with_context(|| format!("failed to write snapshot {}", path.display()))?;
        if !args.json {
            println!("💾 Snapshot written to {}", path.display());
        }
    }

    sessions.shutdown().await;

    if failures == args.runs {
        bail!("all {failures} analyses failed");
    }
    Ok(())
}

fn outcome_json(run: u32, outcome: &FallbackOutcome) -> serde_json::Value {
    let failed: Vec<_> = outcome
        .failed
        .iter()
        .map(|f| serde_json::json!({ "analyzer": f.analyzer, "error": f.error }))
        .collect();
    serde_json::json!({
        "run": run,
        "analyzer": outcome.analyzer,
        "fell_back": outcome.fell_back(),
        "failed": failed,
        "result": outcome.result,
    })
}

fn run_rollout(config: &AppConfig, device_id: &str, percentage: Option<u8>, feature: &str) {
    let mut flags = config.rollout.clone();
    if let Some(percentage) = percentage {
        flags.rollout_percentage = percentage;
    }

    let bucket = rollout::bucket(feature, device_id);
    let enabled = rollout::is_enabled(feature, device_id, flags.rollout_percentage);

    println!("🎲 Rollout for {device_id}:");
    println!("   Feature:    {feature}");
    println!("   Bucket:     {bucket}");
    println!("   Percentage: {}%", flags.rollout_percentage);
    println!("   Enabled:    {}", if enabled { "✅ yes" } else { "❌ no" });

    if feature == ON_DEVICE_FEATURE_KEY {
        let chain: Vec<String> = flags
            .chain_for(device_id)
            .iter()
            .map(ToString::to_string)
            .collect();
        println!("   Chain:      {}", chain.join(" → "));
    }
}

/// Returns whether any metric regressed
async fn run_regression(
    config: &AppConfig,
    snapshot_path: &Path,
    baselines: Option<PathBuf>,
    record: bool,
) -> anyhow::Result<bool> {
    let text = tokio::fs::read_to_string(snapshot_path)
        .await
        .with_context(|| format!("failed to read snapshot {}", snapshot_path.display()))?;
    let snapshot: PerformanceSnapshot =
        serde_json::from_str(&text).context("snapshot is not a valid performance snapshot")?;
    let Some(backend) = snapshot.backend else {
        bail!("snapshot has no bound backend");
    };

    let store = JsonFileBaselineStore::new(
        baselines.unwrap_or_else(|| config.regression.baseline_path.clone()),
    );
    let detector = RegressionDetector::new(Arc::new(store), config.regression.thresholds);

    let regressed = match detector.check(backend, &snapshot).await? {
        Some(report) => {
            print!("{}", report::regression_table(&report));
            report.regressed()
        },
        None => {
            println!("ℹ️  No baseline recorded for {backend}");
            false
        },
    };

    if record {
        match detector.record_baseline(&snapshot).await? {
            Some(baseline) => println!(
                "💾 Baseline recorded for {} ({} samples)",
                baseline.backend, baseline.sample_count
            ),
            None => println!("⚠️  Snapshot has no successful analyses, nothing recorded"),
        }
    }

    Ok(regressed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use application::{AnalyzerKind, FailedAttempt};
    use clap::CommandFactory;
    use domain::{PpeMap, RiskAssessment, Severity};

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn log_filter_verbosity_zero() {
        assert_eq!(log_filter_from_verbosity(0), "warn");
    }

    #[test]
    fn log_filter_verbosity_one() {
        assert_eq!(log_filter_from_verbosity(1), "info");
    }

    #[test]
    fn log_filter_verbosity_two() {
        assert_eq!(log_filter_from_verbosity(2), "debug");
    }

    #[test]
    fn log_filter_verbosity_three_or_more() {
        assert_eq!(log_filter_from_verbosity(3), "trace");
        assert_eq!(log_filter_from_verbosity(10), "trace");
    }

    #[test]
    fn outcome_json_reports_fallback() {
        let outcome = FallbackOutcome {
            result: domain::AnalysisResult {
                hazards: Vec::new(),
                ppe: PpeMap::new(),
                violations: Vec::new(),
                risk: RiskAssessment {
                    overall: Severity::Low,
                    score: 0,
                    recommendations: Vec::new(),
                },
                confidence: 0.0,
                processing_time_ms: 12,
                backend: ConcreteBackend::Cpu,
            },
            analyzer: AnalyzerKind::Legacy,
            failed: vec![FailedAttempt {
                analyzer: AnalyzerKind::OnDevice,
                error: "Not available".to_string(),
            }],
        };

        let value = outcome_json(2, &outcome);
        assert_eq!(value["run"], 2);
        assert_eq!(value["fell_back"], true);
        assert_eq!(value["failed"][0]["error"], "Not available");
        assert_eq!(value["result"]["processing_time_ms"], 12);
    }

    #[tokio::test]
    async fn regression_without_baseline_is_not_a_regression() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("snapshot.json");
        let snapshot = PerformanceSnapshot {
            backend: Some(ConcreteBackend::GpuOpenCl),
            analysis_count: 5,
            success_count: 5,
            average_processing_ms: 40.0,
            average_memory_mb: 300.0,
            success_rate: 1.0,
            ..PerformanceSnapshot::default()
        };
        std::fs::write(&snapshot_path, serde_json::to_vec(&snapshot).unwrap()).unwrap();
        let baselines = dir.path().join("baselines.json");

        let regressed = run_regression(
            &AppConfig::default(),
            &snapshot_path,
            Some(baselines.clone()),
            true,
        )
        .await
        .unwrap();
        assert!(!regressed);
        assert!(baselines.exists());

        // Same numbers against the recorded baseline
        let regressed =
            run_regression(&AppConfig::default(), &snapshot_path, Some(baselines), false)
                .await
                .unwrap();
        assert!(!regressed);
    }

    #[tokio::test]
    async fn regression_requires_bound_backend() {
        let dir = tempfile::tempdir().unwrap();
        let snapshot_path = dir.path().join("snapshot.json");
        std::fs::write(
            &snapshot_path,
            serde_json::to_vec(&PerformanceSnapshot::default()).unwrap(),
        )
        .unwrap();

        let err = run_regression(&AppConfig::default(), &snapshot_path, None, false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("no bound backend"));
    }
}
