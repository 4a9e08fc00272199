//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.gova.toml` files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Name of the configuration file looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = ".gova.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Ranking settings.
    #[serde(default)]
    pub ranking: RankingConfig,

    /// Pattern identification settings.
    #[serde(default)]
    pub patterns: PatternConfig,
}

/// General application settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Default output file path.
    #[serde(default = "default_output")]
    pub output: String,

    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            output: default_output(),
            verbose: false,
        }
    }
}

fn default_output() -> String {
    "gova_report.md".to_string()
}

/// Which single value stands for a metric column when ranking.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Representative {
    /// Mean of all numeric observations.
    #[default]
    Mean,
    /// Last numeric observation.
    Latest,
}

/// Ranking settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RankingConfig {
    /// How a column is reduced to one value.
    #[serde(default)]
    pub representative: Representative,

    /// Metrics where a smaller value ranks higher.
    ///
    /// Matched against the full column name or its last `.` segment.
    #[serde(default = "default_lower_is_better")]
    pub lower_is_better: Vec<String>,

    /// Metrics ranked when the caller selects none.
    ///
    /// Empty means every numeric column shared by all snapshots.
    #[serde(default)]
    pub default_metrics: Vec<String>,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            representative: Representative::Mean,
            lower_is_better: default_lower_is_better(),
            default_metrics: Vec::new(),
        }
    }
}

fn default_lower_is_better() -> Vec<String> {
    vec![
        "gini_coefficient",
        "herfindahl_index",
        "concentration_ratio_top10",
        "top_10_concentration",
        "top_50_concentration",
        "palma_ratio",
        "theil_index",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

impl RankingConfig {
    /// Whether a smaller value of `metric` is better.
    pub fn is_lower_better(&self, metric: &str) -> bool {
        let leaf = metric.rsplit('.').next().unwrap_or(metric);
        self.lower_is_better
            .iter()
            .any(|m| m == metric || m == leaf)
    }
}

/// Pattern identification settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PatternConfig {
    /// Largest change still treated as no movement.
    #[serde(default = "default_trend_tolerance")]
    pub trend_tolerance: f64,

    /// Share of cells a category must exceed to count as a majority.
    #[serde(default = "default_majority_threshold")]
    pub majority_threshold: f64,
}

impl Default for PatternConfig {
    fn default() -> Self {
        Self {
            trend_tolerance: default_trend_tolerance(),
            majority_threshold: default_majority_threshold(),
        }
    }
}

fn default_trend_tolerance() -> f64 {
    1e-9
}

fn default_majority_threshold() -> f64 {
    0.5
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        Self::load_from_dir(Path::new("."))
    }

    /// Try to load configuration from a directory.
    pub fn load_from_dir(dir: &Path) -> Result<Option<Self>> {
        let config_path = dir.join(CONFIG_FILE_NAME);

        if config_path.exists() {
            Ok(Some(Self::load(&config_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only
    /// when they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(representative) = args.representative {
            self.ranking.representative = representative;
        }

        if let Some(ref output) = args.output {
            self.general.output = output.display().to_string();
        }

        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
