//! Governance pattern identification across protocols.
//!
//! Every protocol's snapshot yields a set of [`PatternDescriptor`]s:
//! one `metric_presence` per column, one `trend` per numeric column with
//! at least two observations, and one `majority` per categorical column
//! dominated by a single value. Descriptors found in two or more protocols
//! are common; the rest are unique to their protocol.

use super::aggregator::{majority_value, numeric_columns, trend_direction, validate_snapshots};
use super::{settle, LOG_TARGET};
use crate::config::PatternConfig;
use crate::error::AggregationError;
use crate::models::{
    CommonPattern, PatternDescriptor, PatternKind, PatternReport, ProtocolSnapshot,
    ReportOutcome, Snapshots, TrendDirection, TrendSummary,
};
use std::collections::{BTreeMap, BTreeSet};
use tracing::{debug, info};

const ALL_DIRECTIONS: [TrendDirection; 4] = [
    TrendDirection::Increasing,
    TrendDirection::Decreasing,
    TrendDirection::Stable,
    TrendDirection::Volatile,
];

/// Direction of every numeric column with enough observations.
fn metric_directions(snapshot: &ProtocolSnapshot, tolerance: f64) -> Vec<(String, TrendDirection)> {
    numeric_columns(snapshot)
        .into_iter()
        .filter_map(|column| {
            let series = snapshot.numeric_series(&column)?;
            trend_direction(&series, tolerance).map(|d| (column, d))
        })
        .collect()
}

/// Every pattern a single snapshot exhibits.
fn discover_patterns(
    snapshot: &ProtocolSnapshot,
    directions: &[(String, TrendDirection)],
    config: &PatternConfig,
) -> BTreeSet<PatternDescriptor> {
    let mut found = BTreeSet::new();

    for column in &snapshot.columns {
        found.insert(PatternDescriptor::new(
            PatternKind::MetricPresence,
            column.as_str(),
            "present",
        ));

        if let Some(values) = snapshot.categorical_values(column) {
            if let Some(winner) = majority_value(&values, config.majority_threshold) {
                found.insert(PatternDescriptor::new(PatternKind::Majority, column.as_str(), winner));
            }
        }
    }

    for (metric, direction) in directions {
        found.insert(PatternDescriptor::new(
            PatternKind::Trend,
            metric.as_str(),
            direction.to_string(),
        ));
    }

    found
}

fn push_direction(summary: &mut TrendSummary, direction: TrendDirection, protocol: &str) {
    let bucket = match direction {
        TrendDirection::Increasing => &mut summary.increasing,
        TrendDirection::Decreasing => &mut summary.decreasing,
        TrendDirection::Stable => &mut summary.stable,
        TrendDirection::Volatile => &mut summary.volatile,
    };
    bucket.push(protocol.to_string());
}

/// Fill in the consensus direction and description of a trend.
fn finalize_trend(metric: &str, summary: &mut TrendSummary) {
    let total = summary.protocol_count();

    summary.consensus = ALL_DIRECTIONS
        .into_iter()
        .find(|d| summary.protocols_for(*d).len() * 2 > total);

    summary.description = match summary.consensus {
        Some(direction) => format!(
            "{} is {} in {} of {} protocols",
            metric,
            direction,
            summary.protocols_for(direction).len(),
            total
        ),
        None => {
            let parts: Vec<String> = ALL_DIRECTIONS
                .into_iter()
                .filter(|d| !summary.protocols_for(*d).is_empty())
                .map(|d| format!("{} {}", summary.protocols_for(d).len(), d))
                .collect();
            format!(
                "{} shows mixed movement across {} protocols ({})",
                metric,
                total,
                parts.join(", ")
            )
        }
    };
}

/// Partition discovered patterns into common and unique, and summarise
/// trends per metric.
pub fn build_pattern_report(
    snapshots: &Snapshots,
    config: &PatternConfig,
) -> Result<PatternReport, AggregationError> {
    validate_snapshots(snapshots)?;

    let mut owners: BTreeMap<PatternDescriptor, Vec<String>> = BTreeMap::new();
    let mut trends: BTreeMap<String, TrendSummary> = BTreeMap::new();

    for (protocol, snapshot) in snapshots {
        let directions = metric_directions(snapshot, config.trend_tolerance);

        for (metric, direction) in &directions {
            push_direction(trends.entry(metric.clone()).or_default(), *direction, protocol);
        }

        let found = discover_patterns(snapshot, &directions, config);
        debug!(target: LOG_TARGET, protocol = %protocol, patterns = found.len(), "Discovered patterns");

        for descriptor in found {
            owners.entry(descriptor).or_default().push(protocol.clone());
        }
    }

    let mut unique_patterns: BTreeMap<String, Vec<PatternDescriptor>> = snapshots
        .keys()
        .map(|protocol| (protocol.clone(), Vec::new()))
        .collect();
    let mut common_patterns = Vec::new();

    for (pattern, protocols) in owners {
        if protocols.len() == 1 {
            if let Some(list) = unique_patterns.get_mut(&protocols[0]) {
                list.push(pattern);
            }
        } else {
            common_patterns.push(CommonPattern { pattern, protocols });
        }
    }

    // Most widely shared first; BTreeMap order already sorts by descriptor.
    common_patterns.sort_by(|a, b| b.protocols.len().cmp(&a.protocols.len()));

    for (metric, summary) in trends.iter_mut() {
        finalize_trend(metric, summary);
    }

    Ok(PatternReport {
        common_patterns,
        unique_patterns,
        trends,
    })
}

/// Identify governance patterns across protocols.
pub fn identify_governance_patterns(
    snapshots: &Snapshots,
    config: &PatternConfig,
) -> ReportOutcome<PatternReport> {
    info!(
        target: LOG_TARGET,
        protocols = snapshots.len(),
        "Identifying governance patterns"
    );

    settle(
        build_pattern_report(snapshots, config),
        "Pattern identification error",
        Some("Pattern identification error"),
    )
}
