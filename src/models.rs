//! Data models for cross-protocol governance analytics.
//!
//! This module contains the input contracts (metric results and snapshots)
//! and the report types produced by the aggregation operations.

use crate::error::AggregationError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// Result payload of an external analyzer for one protocol.
pub type MetricMap = Map<String, Value>;

/// Analyzer results keyed by protocol identifier.
pub type ProtocolMetrics = BTreeMap<String, MetricMap>;

/// Snapshots keyed by protocol identifier.
pub type Snapshots = BTreeMap<String, ProtocolSnapshot>;

/// Tabular observations for a single protocol.
///
/// Rows are time-ordered, oldest first. Each row holds one cell per column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtocolSnapshot {
    /// Metric names, one per column.
    #[serde(default)]
    pub columns: Vec<String>,
    /// Observations.
    #[serde(default)]
    pub rows: Vec<Vec<Value>>,
}

impl ProtocolSnapshot {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Self { columns, rows }
    }

    /// Builds a single-row snapshot from a protocol's analyzer results.
    ///
    /// Every numeric leaf becomes a column, nested keys joined with `.`.
    /// Concentration columns take precedence when both results carry the
    /// same path.
    pub fn from_results(concentration: Option<&MetricMap>, participation: Option<&MetricMap>) -> Self {
        let mut leaves: Vec<(String, f64)> = Vec::new();
        let mut seen = HashSet::new();

        for result in [concentration, participation].into_iter().flatten() {
            collect_numeric_leaves(result, "", &mut leaves, &mut seen);
        }

        let (columns, row): (Vec<String>, Vec<Value>) = leaves
            .into_iter()
            .map(|(name, value)| (name, Value::from(value)))
            .unzip();

        let rows = if columns.is_empty() { Vec::new() } else { vec![row] };
        Self { columns, rows }
    }

    /// Checks that column names are non-blank and unique and every row is
    /// as wide as the header.
    pub fn validate(&self, protocol: &str) -> Result<(), AggregationError> {
        let mut names = HashSet::new();
        for (i, column) in self.columns.iter().enumerate() {
            if column.trim().is_empty() {
                return Err(AggregationError::malformed(
                    protocol,
                    format!("column {} has a blank name", i + 1),
                ));
            }
            if !names.insert(column.as_str()) {
                return Err(AggregationError::malformed(
                    protocol,
                    format!("duplicate column '{}'", column),
                ));
            }
        }

        for (i, row) in self.rows.iter().enumerate() {
            if row.len() != self.columns.len() {
                return Err(AggregationError::malformed(
                    protocol,
                    format!(
                        "row {} has {} cells, expected {}",
                        i + 1,
                        row.len(),
                        self.columns.len()
                    ),
                ));
            }
        }

        Ok(())
    }

    /// Position of a column by name.
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    fn cells<'a>(&'a self, index: usize) -> impl Iterator<Item = &'a Value> + 'a {
        self.rows
            .iter()
            .filter_map(move |row| row.get(index))
            .filter(|v| !v.is_null())
    }

    /// Numeric observations of a column in row order.
    ///
    /// Returns `None` when the column is missing, has no numeric cell, or
    /// holds any non-numeric, non-null cell.
    pub fn numeric_series(&self, name: &str) -> Option<Vec<f64>> {
        let index = self.column_index(name)?;
        let series: Option<Vec<f64>> = self.cells(index).map(Value::as_f64).collect();
        series.filter(|s| !s.is_empty())
    }

    /// Text rendering of a categorical column's non-null cells.
    ///
    /// Returns `None` when the column is missing, empty, or numeric.
    pub fn categorical_values(&self, name: &str) -> Option<Vec<String>> {
        let index = self.column_index(name)?;
        let cells: Vec<&Value> = self.cells(index).collect();
        if cells.is_empty() || cells.iter().all(|v| v.is_number()) {
            return None;
        }

        Some(
            cells
                .into_iter()
                .map(|v| match v {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                })
                .collect(),
        )
    }
}

fn collect_numeric_leaves(
    map: &MetricMap,
    prefix: &str,
    out: &mut Vec<(String, f64)>,
    seen: &mut HashSet<String>,
) {
    for (key, value) in map {
        let path = if prefix.is_empty() {
            key.clone()
        } else {
            format!("{}.{}", prefix, key)
        };

        match value {
            Value::Number(n) => {
                if let Some(v) = n.as_f64() {
                    if seen.insert(path.clone()) {
                        out.push((path, v));
                    }
                }
            }
            Value::Object(nested) => collect_numeric_leaves(nested, &path, out, seen),
            _ => {}
        }
    }
}

/// Summary block of a [`ComparisonReport`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Number of protocols in the concentration results.
    pub total_protocols: usize,
    /// Number of protocols in the participation results.
    pub participation_protocols: usize,
    /// Protocols with concentration results but no participation results.
    pub missing_participation: Vec<String>,
    /// When the comparison was generated.
    pub comparison_timestamp: DateTime<Utc>,
}

/// Concentration and participation results merged into one report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ComparisonReport {
    pub concentration: ProtocolMetrics,
    pub participation: ProtocolMetrics,
    pub summary: ComparisonSummary,
}

/// The kind of attribute a pattern describes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PatternKind {
    /// The protocol reports this metric at all.
    MetricPresence,
    /// The metric moves in a direction across observations.
    Trend,
    /// One category dominates a categorical column.
    Majority,
}

impl fmt::Display for PatternKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatternKind::MetricPresence => write!(f, "metric_presence"),
            PatternKind::Trend => write!(f, "trend"),
            PatternKind::Majority => write!(f, "majority"),
        }
    }
}

/// A governance pattern discovered in a protocol's snapshot.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PatternDescriptor {
    pub kind: PatternKind,
    pub metric: String,
    pub value: String,
}

impl PatternDescriptor {
    pub fn new(kind: PatternKind, metric: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            kind,
            metric: metric.into(),
            value: value.into(),
        }
    }
}

impl fmt::Display for PatternDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}:{}", self.kind, self.metric, self.value)
    }
}

/// A pattern shared by two or more protocols.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommonPattern {
    pub pattern: PatternDescriptor,
    /// Protocols exhibiting the pattern, sorted.
    pub protocols: Vec<String>,
}

/// Direction of a metric across time-ordered observations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
    Volatile,
}

impl fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendDirection::Increasing => write!(f, "increasing"),
            TrendDirection::Decreasing => write!(f, "decreasing"),
            TrendDirection::Stable => write!(f, "stable"),
            TrendDirection::Volatile => write!(f, "volatile"),
        }
    }
}

/// How one metric trends across protocols.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TrendSummary {
    /// Direction held by a strict majority of reporting protocols, if any.
    pub consensus: Option<TrendDirection>,
    pub increasing: Vec<String>,
    pub decreasing: Vec<String>,
    pub stable: Vec<String>,
    pub volatile: Vec<String>,
    pub description: String,
}

impl TrendSummary {
    /// Number of protocols with a direction for this metric.
    pub fn protocol_count(&self) -> usize {
        self.increasing.len() + self.decreasing.len() + self.stable.len() + self.volatile.len()
    }

    pub fn protocols_for(&self, direction: TrendDirection) -> &[String] {
        match direction {
            TrendDirection::Increasing => &self.increasing,
            TrendDirection::Decreasing => &self.decreasing,
            TrendDirection::Stable => &self.stable,
            TrendDirection::Volatile => &self.volatile,
        }
    }
}

/// Common patterns, protocol-unique patterns and cross-protocol trends.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PatternReport {
    pub common_patterns: Vec<CommonPattern>,
    pub unique_patterns: BTreeMap<String, Vec<PatternDescriptor>>,
    pub trends: BTreeMap<String, TrendSummary>,
}

/// Overall and per-metric protocol rankings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingReport {
    /// Protocol identifiers, best first.
    pub overall_rankings: Vec<String>,
    /// Protocol identifiers per metric, best first.
    pub metric_rankings: BTreeMap<String, Vec<String>>,
    /// Mean rank per protocol over the metrics it was ranked in.
    pub composite_scores: BTreeMap<String, f64>,
    pub ranking_timestamp: DateTime<Utc>,
}

/// Returned in place of a report when an operation fails.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResult {
    pub error: String,
}

impl ErrorResult {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

/// Either a report or the [`ErrorResult`] that replaced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum ReportOutcome<T> {
    Report(T),
    Error(ErrorResult),
}

impl<T> ReportOutcome<T> {
    pub fn is_error(&self) -> bool {
        matches!(self, ReportOutcome::Error(_))
    }

    pub fn report(&self) -> Option<&T> {
        match self {
            ReportOutcome::Report(report) => Some(report),
            ReportOutcome::Error(_) => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            ReportOutcome::Report(_) => None,
            ReportOutcome::Error(e) => Some(e.error.as_str()),
        }
    }

    pub fn into_result(self) -> Result<T, ErrorResult> {
        match self {
            ReportOutcome::Report(report) => Ok(report),
            ReportOutcome::Error(e) => Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn snapshot(columns: &[&str], rows: Vec<Vec<Value>>) -> ProtocolSnapshot {
        ProtocolSnapshot::new(columns.iter().map(|c| c.to_string()).collect(), rows)
    }

    #[test]
    fn test_validate_rejects_ragged_rows() {
        let snap = snapshot(
            &["turnout", "proposals"],
            vec![vec![json!(0.1), json!(3)], vec![json!(0.2)]],
        );
        let err = snap.validate("compound").unwrap_err();
        assert!(err.to_string().contains("row 2 has 1 cells, expected 2"));
    }

    #[test]
    fn test_validate_rejects_duplicate_and_blank_columns() {
        let dup = snapshot(&["turnout", "turnout"], vec![]);
        assert!(dup.validate("aave").is_err());

        let blank = snapshot(&["turnout", " "], vec![]);
        assert!(blank.validate("aave").is_err());
    }

    #[test]
    fn test_numeric_series_skips_nulls() {
        let snap = snapshot(
            &["turnout"],
            vec![vec![json!(0.1)], vec![Value::Null], vec![json!(0.3)]],
        );
        assert_eq!(snap.numeric_series("turnout"), Some(vec![0.1, 0.3]));
        assert_eq!(snap.numeric_series("missing"), None);
    }

    #[test]
    fn test_mixed_column_is_categorical() {
        let snap = snapshot(
            &["outcome"],
            vec![vec![json!("passed")], vec![json!(1)], vec![json!("passed")]],
        );
        assert_eq!(snap.numeric_series("outcome"), None);
        assert_eq!(
            snap.categorical_values("outcome"),
            Some(vec!["passed".to_string(), "1".to_string(), "passed".to_string()])
        );
    }

    #[test]
    fn test_from_results_flattens_numeric_leaves() {
        let concentration = json!({
            "gini_coefficient": 0.82,
            "metrics": { "nakamoto_coefficient": 7, "label": "high" }
        });
        let participation = json!({ "participation_rate": 12.5, "gini_coefficient": 0.1 });

        let snap = ProtocolSnapshot::from_results(
            concentration.as_object(),
            participation.as_object(),
        );

        assert_eq!(
            snap.columns,
            vec![
                "gini_coefficient".to_string(),
                "metrics.nakamoto_coefficient".to_string(),
                "participation_rate".to_string(),
            ]
        );
        assert_eq!(snap.rows.len(), 1);
        assert_eq!(snap.numeric_series("gini_coefficient"), Some(vec![0.82]));
    }

    #[test]
    fn test_from_results_without_numbers_is_empty() {
        let snap = ProtocolSnapshot::from_results(None, None);
        assert!(snap.columns.is_empty());
        assert!(snap.rows.is_empty());
    }

    #[test]
    fn test_pattern_descriptor_ordering_and_display() {
        let a = PatternDescriptor::new(PatternKind::MetricPresence, "turnout", "present");
        let b = PatternDescriptor::new(PatternKind::Trend, "turnout", "increasing");
        assert!(a < b);
        assert_eq!(b.to_string(), "trend:turnout:increasing");
    }

    #[test]
    fn test_error_outcome_serializes_only_error() {
        let outcome: ReportOutcome<PatternReport> =
            ReportOutcome::Error(ErrorResult::new("boom"));
        let json = serde_json::to_value(&outcome).unwrap();
        assert_eq!(json, json!({ "error": "boom" }));
    }
}
