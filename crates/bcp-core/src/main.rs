//! BizCRM Predictor - prediction engine CLI
//!
//! The `bcp` binary drives the prediction engine:
//! - Long-running sessions with auto-refresh (`run`)
//! - One-shot prediction with display data (`predict`)
//! - Model training diagnostics (`train`)
//! - Raw source fetches, exports, and config checks
//!
//! stdout carries command payloads; logs and progress stay on stderr.

use std::path::PathBuf;
use std::sync::{mpsc, Arc};
use std::time::{Duration, Instant};

use clap::{Args, Parser, Subcommand, ValueEnum};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, info, warn};

use bcp_common::config::ConfigSource;
use bcp_common::error::{format_error_human, ErrorCategory, StructuredError};
use bcp_common::{
    Category, ConfigPaths, ConfigResolver, ConfigSnapshot, EngineConfig, Error, OutputFormat,
    Prediction, RefreshInterval, Result, Timeframe,
};
use bcp_core::engine::{Engine, EngineOptions};
use bcp_core::events::{event_names, EngineEvent, EventBus};
use bcp_core::exit_codes::ExitCode;
use bcp_core::export::{write_export, ExportFormat};
use bcp_core::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use bcp_core::output::{
    render_fetch, render_snapshot, render_train, FetchPayload, FetchReport, RowOutcome,
    TrainOutcome,
};
use bcp_core::state::{EngineSnapshot, EngineState, ModelState};
use bcp_core::{derive, predict};
use bcp_model::{builtin_training_set, train, TrainOptions};
use bcp_sources::{http, DataSource, PerformerScope, RemoteSource};

/// BizCRM Predictor - AI-backed business predictions from CRM data
#[derive(Parser)]
#[command(name = "bcp")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    #[command(flatten)]
    global: GlobalOpts,
}

/// Global options available to all commands
#[derive(Args, Debug)]
struct GlobalOpts {
    /// Path to engine.json (overrides BCP_CONFIG and the XDG lookup)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "summary")]
    format: OutputFormat,

    /// Override source.base_url from the config
    #[arg(long, global = true, value_name = "URL")]
    base_url: Option<String>,

    /// Increase stderr log verbosity (-v, -vv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors to stderr
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Disable colored error output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the prediction engine, streaming events until stopped
    Run(RunArgs),

    /// Train, predict once, fetch display data, and print the snapshot
    Predict(PredictArgs),

    /// Train the model and print the report with per-row outputs
    Train,

    /// Fetch one source feed and print the records
    Fetch(FetchArgs),

    /// Fetch the baseline history series for a category
    History(HistoryArgs),

    /// Write an export artifact and print its path
    Export(ExportArgs),

    /// Validate configuration and print the active snapshot
    Check(CheckArgs),
}

#[derive(Args, Debug, Default)]
struct RunArgs {
    /// Starting category (default from config)
    #[arg(long)]
    category: Option<Category>,

    /// Starting timeframe (default from config)
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Auto-refresh interval (default from config)
    #[arg(long)]
    interval: Option<RefreshInterval>,

    /// Start with the refresh timer disabled
    #[arg(long)]
    no_auto_refresh: bool,

    /// Stop after this many seconds (0 = start, then shut down immediately)
    #[arg(long, value_name = "SECS")]
    duration_secs: Option<u64>,

    /// Stop after this many generated predictions
    #[arg(long, value_name = "N")]
    ticks: Option<u64>,

    /// Seed the prediction RNG for reproducible runs
    #[arg(long)]
    seed: Option<u64>,
}

#[derive(Args, Debug)]
struct PredictArgs {
    /// Category to predict for (default from config)
    #[arg(long)]
    category: Option<Category>,

    /// Timeframe for display data (default from config)
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Seed the prediction RNG for reproducible output
    #[arg(long)]
    seed: Option<u64>,
}

/// Which source feed to fetch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum FetchKind {
    Chart,
    History,
    Notifications,
    Performers,
}

#[derive(Args, Debug)]
struct FetchArgs {
    /// Feed to fetch
    kind: FetchKind,

    /// Category to fetch for (default from config)
    #[arg(long)]
    category: Option<Category>,

    /// Timeframe scaling for chart data (default from config)
    #[arg(long)]
    timeframe: Option<Timeframe>,

    /// Fetch the overall leaderboard instead of the category one
    #[arg(long)]
    overall: bool,
}

#[derive(Args, Debug)]
struct HistoryArgs {
    /// Category to fetch history for (default from config)
    #[arg(long)]
    category: Option<Category>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    /// Artifact format
    // distinct clap id so the positional doesn't alias the global --format
    #[arg(id = "export_format", value_name = "FORMAT")]
    format: ExportFormat,

    /// Category the artifact is labeled with (default from config)
    #[arg(long)]
    category: Option<Category>,

    /// Destination directory (default from config export.dir)
    #[arg(long, value_name = "DIR")]
    out: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct CheckArgs {
    /// Probe the configured base URL (warn-only)
    #[arg(long)]
    remote: bool,
}

// ============================================================================
// Main entry point
// ============================================================================

fn main() {
    let cli = Cli::parse();

    // quiet wins over -v; an unset level lets BCP_LOG decide
    let cli_level = if cli.global.quiet {
        Some(LogLevel::Error)
    } else {
        match cli.global.verbose {
            0 => None,
            1 => Some(LogLevel::Debug),
            _ => Some(LogLevel::Trace),
        }
    };
    let cli_format = cli.global.format.is_machine().then_some(LogFormat::Jsonl);
    init_logging(&LogConfig::from_env(cli_level, cli_format));

    let exit_code = match cli.command {
        None => run_engine(&cli.global, &RunArgs::default()),
        Some(Commands::Run(args)) => run_engine(&cli.global, &args),
        Some(Commands::Predict(args)) => run_predict(&cli.global, &args),
        Some(Commands::Train) => run_train(&cli.global),
        Some(Commands::Fetch(args)) => run_fetch(&cli.global, &args),
        Some(Commands::History(args)) => run_history(&cli.global, &args),
        Some(Commands::Export(args)) => run_export(&cli.global, &args),
        Some(Commands::Check(args)) => run_check(&cli.global, &args),
    };

    std::process::exit(exit_code.as_i32());
}

// ============================================================================
// Command implementations
// ============================================================================

fn run_engine(global: &GlobalOpts, args: &RunArgs) -> ExitCode {
    let (config, snapshot) = match load_config(global) {
        Ok(loaded) => loaded,
        Err(err) => return report_error(global, &err),
    };
    debug!(
        resolution = %snapshot.source.resolution,
        hash = %snapshot.effective_hash,
        "configuration resolved"
    );

    let mut options = EngineOptions::from_config(&config);
    if let Some(category) = args.category {
        options.category = category;
    }
    if let Some(timeframe) = args.timeframe {
        options.timeframe = timeframe;
    }
    if let Some(interval) = args.interval {
        options.refresh.interval = interval;
    }
    if args.no_auto_refresh {
        options.refresh.enabled = false;
    }
    options.seed = args.seed;

    let source: Arc<dyn DataSource> = Arc::new(RemoteSource::from_config(&config.source));
    let bus = Arc::new(EventBus::new());
    let events = bus.subscribe();

    let engine = match Engine::spawn(options, source, bus.clone()) {
        Ok(engine) => engine,
        Err(err) => return report_error(global, &err),
    };
    info!(run_id = %engine.run_id(), "engine started");

    let machine = global.format.is_machine();
    let deadline = args
        .duration_secs
        .map(|secs| Instant::now() + Duration::from_secs(secs));
    let mut predictions_seen: u64 = 0;
    let mut training_failed = false;

    loop {
        if deadline.is_some_and(|d| Instant::now() >= d) {
            break;
        }
        if args.ticks.is_some_and(|n| predictions_seen >= n) {
            break;
        }
        // a failed training session will never reach a tick target
        if training_failed && args.ticks.is_some() {
            break;
        }

        match events.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => {
                match event.event.as_str() {
                    event_names::PREDICTION_GENERATED => predictions_seen += 1,
                    event_names::MODEL_TRAINING_FAILED => training_failed = true,
                    _ => {}
                }
                print_event(&event, machine);
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {}
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        }
    }

    let shutdown = engine.shutdown();
    while let Ok(event) = events.try_recv() {
        print_event(&event, machine);
    }

    if shutdown.is_err() {
        warn!("engine stopped before shutdown completed");
        return ExitCode::Interrupted;
    }
    if training_failed {
        return ExitCode::PredictionUnavailable;
    }
    ExitCode::Clean
}

fn print_event(event: &EngineEvent, machine: bool) {
    if machine {
        println!("{}", event.to_jsonl());
    } else {
        println!("{}", event.to_human_line());
    }
}

fn run_predict(global: &GlobalOpts, args: &PredictArgs) -> ExitCode {
    match predict_once(global, args) {
        Ok(snapshot) => {
            println!("{}", render_snapshot(&snapshot, global.format));
            ExitCode::Clean
        }
        Err(err) => report_error(global, &err),
    }
}

/// One synchronous prediction cycle: train, fetch, predict, derive.
fn predict_once(global: &GlobalOpts, args: &PredictArgs) -> Result<EngineSnapshot> {
    let (config, _) = load_config(global)?;
    let category = args.category.unwrap_or(config.defaults.category);
    let timeframe = args.timeframe.unwrap_or(config.defaults.timeframe);
    let source = RemoteSource::from_config(&config.source);

    let (net, report) = train(&builtin_training_set(), &TrainOptions::default())?;
    info!(
        epochs = report.epochs_run,
        final_loss = report.final_loss,
        duration_ms = report.duration_ms,
        "model trained"
    );

    let mut rng = match args.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_os_rng(),
    };

    // baseline data lands first so the live entry appends on top of it
    let mut state = EngineState::new(category, timeframe, config.refresh);
    state.chart = source.chart_data(category, timeframe);
    state.history.replace_all(source.history_series(category));

    let generated = predict::generate(&net, category, &mut rng);
    let summary = derive::apply_prediction(&mut state, &generated, &mut rng);
    info!(
        value = generated.prediction.value,
        confidence = generated.prediction.confidence,
        band = ?summary.band,
        fallback = summary.fallback,
        "prediction generated"
    );

    state.notifications = source.notifications(category, &generated.prediction);
    state.model = ModelState::Ready(net);

    Ok(EngineSnapshot::capture(&state))
}

fn run_train(global: &GlobalOpts) -> ExitCode {
    match train_once() {
        Ok(outcome) => {
            println!("{}", render_train(&outcome, global.format));
            ExitCode::Clean
        }
        Err(err) => report_error(global, &err),
    }
}

fn train_once() -> Result<TrainOutcome> {
    let set = builtin_training_set();
    let (net, report) = train(&set, &TrainOptions::default())?;

    let mut rows = Vec::with_capacity(set.xs.len());
    for (features, target) in set.xs.iter().zip(&set.ys) {
        let output = net.predict(features)?;
        rows.push(RowOutcome {
            features: *features,
            target: *target,
            output,
        });
    }
    Ok(TrainOutcome { report, rows })
}

fn run_fetch(global: &GlobalOpts, args: &FetchArgs) -> ExitCode {
    let (config, _) = match load_config(global) {
        Ok(loaded) => loaded,
        Err(err) => return report_error(global, &err),
    };
    let category = args.category.unwrap_or(config.defaults.category);
    let timeframe = args.timeframe.unwrap_or(config.defaults.timeframe);
    let source = RemoteSource::from_config(&config.source);

    let payload = match args.kind {
        FetchKind::Chart => FetchPayload::Chart(source.chart_data(category, timeframe)),
        FetchKind::History => FetchPayload::History(source.history_series(category)),
        FetchKind::Notifications => {
            // the feed is keyed to a prediction; outside a session, draw one
            let mut rng = StdRng::from_os_rng();
            let prediction = Prediction::from_value(rng.random::<f64>());
            FetchPayload::Notifications(source.notifications(category, &prediction))
        }
        FetchKind::Performers => {
            let scope = if args.overall {
                PerformerScope::Overall
            } else {
                PerformerScope::Category(category)
            };
            FetchPayload::Performers(source.top_performers(scope))
        }
    };

    if payload.is_empty() {
        warn!(kind = payload.kind(), "fetch returned no records");
    }
    let report = FetchReport {
        category,
        timeframe,
        payload,
    };
    println!("{}", render_fetch(&report, global.format));
    ExitCode::Clean
}

fn run_history(global: &GlobalOpts, args: &HistoryArgs) -> ExitCode {
    let (config, _) = match load_config(global) {
        Ok(loaded) => loaded,
        Err(err) => return report_error(global, &err),
    };
    let category = args.category.unwrap_or(config.defaults.category);
    let timeframe = config.defaults.timeframe;
    let source = RemoteSource::from_config(&config.source);

    let report = FetchReport {
        category,
        timeframe,
        payload: FetchPayload::History(source.history_series(category)),
    };
    println!("{}", render_fetch(&report, global.format));
    ExitCode::Clean
}

fn run_export(global: &GlobalOpts, args: &ExportArgs) -> ExitCode {
    let (config, _) = match load_config(global) {
        Ok(loaded) => loaded,
        Err(err) => return report_error(global, &err),
    };
    let category = args.category.unwrap_or(config.defaults.category);
    let dir = args
        .out
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.export.dir));

    let mut rng = StdRng::from_os_rng();
    match write_export(&dir, category, args.format, &mut rng) {
        Ok(path) => {
            match global.format {
                OutputFormat::Json => {
                    let payload = serde_json::json!({
                        "path": path.display().to_string(),
                        "format": args.format.to_string(),
                        "category": category,
                    });
                    println!(
                        "{}",
                        serde_json::to_string_pretty(&payload)
                            .unwrap_or_else(|_| "{}".to_string())
                    );
                }
                OutputFormat::Jsonl => {
                    let payload = serde_json::json!({
                        "path": path.display().to_string(),
                        "format": args.format.to_string(),
                        "category": category,
                    });
                    println!(
                        "{}",
                        serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
                    );
                }
                _ => println!("{}", path.display()),
            }
            ExitCode::Clean
        }
        Err(err) => report_error(global, &err),
    }
}

fn run_check(global: &GlobalOpts, args: &CheckArgs) -> ExitCode {
    let (config, snapshot) = match load_config(global) {
        Ok(loaded) => loaded,
        Err(err) => return report_error(global, &err),
    };

    if args.remote {
        let url = format!(
            "{}/users?limit=1",
            config.source.base_url.trim_end_matches('/')
        );
        match http::get_json(&url, config.source.max_response_bytes) {
            Ok(_) => info!(%url, "remote source reachable"),
            Err(err) => warn!(%url, error = %err, "remote source probe failed"),
        }
    }

    match global.format {
        OutputFormat::Json => {
            let payload = serde_json::json!({
                "snapshot": snapshot.to_json(),
                "effective": config,
            });
            println!(
                "{}",
                serde_json::to_string_pretty(&payload).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Jsonl => {
            let payload = serde_json::json!({
                "snapshot": snapshot.to_json(),
                "effective": config,
            });
            println!(
                "{}",
                serde_json::to_string(&payload).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Summary => {
            println!(
                "config OK ({}): schema {}, hash {}",
                snapshot.source.resolution,
                snapshot.schema_version,
                &snapshot.effective_hash[..12.min(snapshot.effective_hash.len())]
            );
        }
        OutputFormat::Md => {
            println!("# bcp check");
            println!();
            if let Some(path) = &snapshot.source.path {
                println!("Source: {path}");
                if let Some(hash) = &snapshot.source.hash {
                    println!("File hash: {hash}");
                }
            } else {
                println!("Source: **built-in defaults** (no engine.json found)");
            }
            println!("Resolution: {}", snapshot.source.resolution);
            println!("Schema version: {}", snapshot.schema_version);
            println!("Effective hash: {}", snapshot.effective_hash);
            println!();
            println!("Defaults: {} / {}", config.defaults.category, config.defaults.timeframe);
            println!(
                "Refresh: {} ({})",
                if config.refresh.enabled { "on" } else { "off" },
                config.refresh.interval.label()
            );
            println!("Base URL: {}", config.source.base_url);
            println!("Export dir: {}", config.export.dir);
        }
    }
    ExitCode::Clean
}

// ============================================================================
// Helpers
// ============================================================================

/// Load the engine config, splicing in the --base-url override before
/// validation so the snapshot hash reflects the effective values.
fn load_config(global: &GlobalOpts) -> Result<(EngineConfig, ConfigSnapshot)> {
    let resolver = ConfigResolver::new(ConfigPaths {
        config_path: global.config.clone(),
    });
    let (mut config, source): (EngineConfig, ConfigSource) = resolver.load_engine()?;
    if let Some(base_url) = &global.base_url {
        config.source.base_url = base_url.clone();
    }
    config.validate()?;
    let snapshot = ConfigSnapshot::new(&config, source)?;
    Ok((config, snapshot))
}

/// Print an error in the requested format and map it to an exit code.
fn report_error(global: &GlobalOpts, error: &Error) -> ExitCode {
    let exit_code = match error.category() {
        ErrorCategory::Config => ExitCode::ConfigError,
        ErrorCategory::Io => ExitCode::IoError,
        ErrorCategory::Model | ErrorCategory::Source => ExitCode::PredictionUnavailable,
        ErrorCategory::Engine => ExitCode::InternalError,
    };

    if global.format.is_machine() {
        eprintln!("{}", StructuredError::from(error).to_json_pretty());
    } else {
        eprintln!("{}", format_error_human(error, !global.no_color));
    }
    exit_code
}
