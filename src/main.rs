//! gova - cross-protocol governance analytics CLI
//!
//! Loads an input bundle, runs the selected aggregation operations and
//! writes a Markdown or JSON report.
//!
//! Exit codes:
//!   0 - Success
//!   1 - Runtime error (arguments, input or config files)
//!   2 - At least one report was replaced by an error result

use anyhow::{Context, Result};
use chrono::Utc;
use gova::analysis::analyzer::CrossProtocolAnalyzer;
use gova::cli::{Args, OutputFormat};
use gova::config::{Config, CONFIG_FILE_NAME};
use gova::input::InputBundle;
use gova::instrument::MetricsCollector;
use gova::report::{self, AnalysisRun};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use tracing_subscriber::FmtSubscriber;

fn main() -> Result<()> {
    let args = Args::parse_args();

    if let Err(e) = args.validate() {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }

    // Handle --init-config early (no logging needed)
    if args.init_config {
        return handle_init_config();
    }

    init_logging(&args);

    info!("gova v{}", env!("CARGO_PKG_VERSION"));
    debug!("Arguments: {:?}", args);

    match run(args) {
        Ok(exit_code) => std::process::exit(exit_code),
        Err(e) => {
            error!("Run failed: {:#}", e);
            eprintln!("\n❌ Error: {:#}", e);
            std::process::exit(1);
        }
    }
}

/// Handle --init-config: generate a default .gova.toml.
fn handle_init_config() -> Result<()> {
    let path = Path::new(CONFIG_FILE_NAME);

    if path.exists() {
        eprintln!("⚠️  {} already exists. Remove it first or edit it manually.", CONFIG_FILE_NAME);
        std::process::exit(1);
    }

    let content = Config::default_toml();
    std::fs::write(path, &content)
        .with_context(|| format!("Failed to write {}", CONFIG_FILE_NAME))?;

    println!("✅ Created {} with default settings.", CONFIG_FILE_NAME);
    Ok(())
}

/// Initialize logging based on verbosity settings.
fn init_logging(args: &Args) {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(args.log_level())
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .compact()
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
    }
}

/// Run the selected operations and write the report. Returns the exit code.
fn run(args: Args) -> Result<i32> {
    let mut config = load_config(&args)?;
    config.merge_with_args(&args);

    let input = args
        .input
        .as_deref()
        .context("No input file given")?;
    let bundle = InputBundle::load(input)?;

    let collector = Arc::new(MetricsCollector::new());
    let analyzer = CrossProtocolAnalyzer::from_config(&config).with_recorder(collector.clone());

    let mut run = AnalysisRun::new(Utc::now());

    if args.report.includes_comparison() {
        run.comparison = Some(
            analyzer.create_comprehensive_comparison(&bundle.concentration, &bundle.participation),
        );
    }

    if args.report.includes_patterns() || args.report.includes_rankings() {
        let snapshots = bundle.effective_snapshots();

        if args.report.includes_patterns() {
            run.patterns = Some(analyzer.identify_governance_patterns(&snapshots));
        }
        if args.report.includes_rankings() {
            let metrics = args.ranking_metrics();
            run.rankings = Some(analyzer.generate_comparative_rankings(&snapshots, metrics.as_deref()));
        }
    }

    let output = match args.format {
        OutputFormat::Json => report::generate_json_report(&run)?,
        OutputFormat::Markdown => report::generate_markdown_report(&run),
    };

    let output_path = PathBuf::from(&config.general.output);
    report::write_report(&output, &output_path)
        .with_context(|| format!("Failed to write report to {}", output_path.display()))?;

    print_summary(&run);

    if config.general.verbose {
        for (site, stats) in collector.snapshot() {
            info!(
                "{}::{} calls={} ok={} failed={} avg={:?} max={:?}",
                site.protocol,
                site.method,
                stats.calls,
                stats.successes,
                stats.failures,
                stats.average_duration(),
                stats.max_duration
            );
        }
    }

    println!("\n✅ Report saved to: {}", output_path.display());

    if run.has_errors() {
        eprintln!("\n⛔ One or more reports failed. Exiting with code 2.");
        return Ok(2);
    }

    Ok(0)
}

/// Print a short console summary of each produced report.
fn print_summary(run: &AnalysisRun) {
    println!("\n📊 Summary:");

    if let Some(ref comparison) = run.comparison {
        match comparison.report() {
            Some(r) => println!("   Protocols compared: {}", r.summary.total_protocols),
            None => println!("   Comparison failed: {}", comparison.error_message().unwrap_or("")),
        }
    }

    if let Some(ref patterns) = run.patterns {
        match patterns.report() {
            Some(r) => println!(
                "   Common patterns: {} | Trends: {}",
                r.common_patterns.len(),
                r.trends.len()
            ),
            None => println!("   {}", patterns.error_message().unwrap_or("")),
        }
    }

    if let Some(ref rankings) = run.rankings {
        match rankings.report() {
            Some(r) => {
                if let Some(top) = r.overall_rankings.first() {
                    println!("   🏆 Top protocol: {}", top);
                }
                println!("   Metrics ranked: {}", r.metric_rankings.len());
            }
            None => println!("   Ranking failed: {}", rankings.error_message().unwrap_or("")),
        }
    }
}

/// Load configuration from file or use defaults.
fn load_config(args: &Args) -> Result<Config> {
    if let Some(ref config_path) = args.config {
        info!("Loading config from: {}", config_path.display());
        return Config::load(config_path);
    }

    match Config::load_default() {
        Ok(Some(config)) => {
            info!("Loaded default config from {}", CONFIG_FILE_NAME);
            Ok(config)
        }
        Ok(None) => {
            debug!("No config file found, using defaults");
            Ok(Config::default())
        }
        Err(e) => {
            warn!("Failed to load config: {}", e);
            Ok(Config::default())
        }
    }
}
