//! Command-line interface argument parsing.
//!
//! This module handles all CLI argument parsing using clap,
//! including validation and default values.

use crate::config::Representative;
use clap::Parser;
use std::path::PathBuf;

/// gova - cross-protocol governance analytics
///
/// Combines per-protocol concentration and participation metrics into
/// comparison, pattern and ranking reports.
///
/// Examples:
///   gova --input bundle.json
///   gova --input bundle.json --report rankings --metrics turnout,gini_coefficient
///   gova --input bundle.json --format json --output report.json
///   gova --init-config
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Args {
    /// Input bundle (JSON) with results and snapshots
    #[arg(short, long, value_name = "FILE", required_unless_present = "init_config")]
    pub input: Option<PathBuf>,

    /// Which report(s) to produce
    #[arg(short, long, default_value = "all", value_name = "KIND")]
    pub report: ReportKind,

    /// Metrics to rank by (comma-separated)
    ///
    /// Defaults to the configured metrics, or every numeric column shared
    /// by all snapshots.
    #[arg(long, value_name = "METRICS", value_delimiter = ',')]
    pub metrics: Option<Vec<String>>,

    /// How a metric column is reduced to one value for ranking
    #[arg(long, value_name = "MODE")]
    pub representative: Option<Representative>,

    /// Output format (markdown, json)
    #[arg(long, default_value = "markdown", value_name = "FORMAT")]
    pub format: OutputFormat,

    /// Output file path for the report
    ///
    /// Defaults to the configured output file.
    #[arg(short, long, value_name = "FILE")]
    pub output: Option<PathBuf>,

    /// Path to configuration file
    ///
    /// If not specified, looks for .gova.toml in the current directory
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging output
    #[arg(short, long)]
    pub verbose: bool,

    /// Run in quiet mode (minimal output)
    #[arg(short, long)]
    pub quiet: bool,

    /// Generate a default .gova.toml configuration file
    #[arg(long)]
    pub init_config: bool,
}

/// Output format for the report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum OutputFormat {
    /// Markdown format (default)
    #[default]
    Markdown,
    /// JSON format
    Json,
}

/// Which reports a run produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum ReportKind {
    /// Comparison, patterns and rankings
    #[default]
    All,
    Comparison,
    Patterns,
    Rankings,
}

impl ReportKind {
    pub fn includes_comparison(self) -> bool {
        matches!(self, ReportKind::All | ReportKind::Comparison)
    }

    pub fn includes_patterns(self) -> bool {
        matches!(self, ReportKind::All | ReportKind::Patterns)
    }

    pub fn includes_rankings(self) -> bool {
        matches!(self, ReportKind::All | ReportKind::Rankings)
    }
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate the parsed arguments.
    pub fn validate(&self) -> Result<(), String> {
        if self.init_config {
            return Ok(());
        }

        if self.verbose && self.quiet {
            return Err("Cannot use both --verbose and --quiet".to_string());
        }

        if let Some(ref metrics) = self.metrics {
            if metrics.iter().any(|m| m.trim().is_empty()) {
                return Err("Metric names must not be empty".to_string());
            }
        }

        if let Some(ref input) = self.input {
            if !input.is_file() {
                return Err(format!("Input file does not exist: {}", input.display()));
            }
        }

        Ok(())
    }

    /// Returns the log level based on verbosity settings.
    pub fn log_level(&self) -> tracing::Level {
        if self.quiet {
            tracing::Level::ERROR
        } else if self.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        }
    }

    /// Requested ranking metrics with surrounding whitespace removed.
    pub fn ranking_metrics(&self) -> Option<Vec<String>> {
        self.metrics
            .as_ref()
            .map(|metrics| metrics.iter().map(|m| m.trim().to_string()).collect())
    }
}
