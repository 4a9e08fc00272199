//! Comparative rankings across protocols.
//!
//! Each selected metric is reduced to one representative value per
//! protocol and ranked (descending unless the metric is configured as
//! lower-is-better, ties by protocol id). The overall ranking orders
//! protocols by their mean competition rank; protocols without any ranked
//! metric come last.

use super::aggregator::{
    competition_ranks, numeric_columns, representative_value, validate_snapshots,
};
use super::{settle, LOG_TARGET};
use crate::clock::Clock;
use crate::config::RankingConfig;
use crate::error::AggregationError;
use crate::models::{RankingReport, ReportOutcome, Snapshots};
use std::collections::{BTreeMap, BTreeSet, HashSet};
use tracing::{debug, info};

fn dedup_preserving_order(metrics: &[String]) -> Vec<String> {
    let mut seen = HashSet::new();
    metrics
        .iter()
        .filter(|m| seen.insert(m.as_str()))
        .cloned()
        .collect()
}

/// The metrics a ranking covers.
///
/// Explicit selection first, then the configured defaults, then every
/// numeric column shared by all snapshots (sorted).
pub fn select_metrics(
    snapshots: &Snapshots,
    requested: Option<&[String]>,
    config: &RankingConfig,
) -> Vec<String> {
    if let Some(requested) = requested.filter(|r| !r.is_empty()) {
        return dedup_preserving_order(requested);
    }

    if !config.default_metrics.is_empty() {
        return dedup_preserving_order(&config.default_metrics);
    }

    let mut columns = snapshots.values().map(|s| {
        numeric_columns(s).into_iter().collect::<BTreeSet<String>>()
    });

    let Some(first) = columns.next() else {
        return Vec::new();
    };

    columns
        .fold(first, |shared, next| shared.intersection(&next).cloned().collect())
        .into_iter()
        .collect()
}

/// Rank protocols per metric and overall.
pub fn build_rankings(
    snapshots: &Snapshots,
    metrics: Option<&[String]>,
    config: &RankingConfig,
    clock: &dyn Clock,
) -> Result<RankingReport, AggregationError> {
    validate_snapshots(snapshots)?;

    let selected = select_metrics(snapshots, metrics, config);
    debug!(target: LOG_TARGET, metrics = ?selected, "Selected ranking metrics");

    let mut metric_rankings = BTreeMap::new();
    let mut rank_totals: BTreeMap<&str, (usize, usize)> = BTreeMap::new();

    for metric in &selected {
        let mut values: Vec<(&str, f64)> = snapshots
            .iter()
            .filter_map(|(protocol, snapshot)| {
                let series = snapshot.numeric_series(metric)?;
                representative_value(&series, config.representative)
                    .map(|value| (protocol.as_str(), value))
            })
            .collect();

        let lower_is_better = config.is_lower_better(metric);
        values.sort_by(|a, b| {
            let by_value = if lower_is_better {
                a.1.total_cmp(&b.1)
            } else {
                b.1.total_cmp(&a.1)
            };
            by_value.then_with(|| a.0.cmp(b.0))
        });

        let ordered: Vec<f64> = values.iter().map(|(_, v)| *v).collect();
        for ((protocol, _), rank) in values.iter().zip(competition_ranks(&ordered)) {
            let total = rank_totals.entry(*protocol).or_default();
            total.0 += rank;
            total.1 += 1;
        }

        metric_rankings.insert(
            metric.clone(),
            values.iter().map(|(p, _)| p.to_string()).collect(),
        );
    }

    let composite_scores: BTreeMap<String, f64> = rank_totals
        .into_iter()
        .map(|(protocol, (sum, count))| (protocol.to_string(), sum as f64 / count as f64))
        .collect();

    let mut scored: Vec<(&String, f64)> = composite_scores.iter().map(|(p, s)| (p, *s)).collect();
    scored.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(b.0)));

    let mut overall_rankings: Vec<String> = scored.into_iter().map(|(p, _)| p.clone()).collect();
    overall_rankings.extend(
        snapshots
            .keys()
            .filter(|p| !composite_scores.contains_key(*p))
            .cloned(),
    );

    Ok(RankingReport {
        overall_rankings,
        metric_rankings,
        composite_scores,
        ranking_timestamp: clock.now(),
    })
}

/// Generate comparative rankings across protocols.
pub fn generate_comparative_rankings(
    snapshots: &Snapshots,
    metrics: Option<&[String]>,
    config: &RankingConfig,
    clock: &dyn Clock,
) -> ReportOutcome<RankingReport> {
    info!(
        target: LOG_TARGET,
        protocols = snapshots.len(),
        "Generating comparative rankings"
    );

    settle(
        build_rankings(snapshots, metrics, config, clock),
        "Error generating rankings",
        None,
    )
}
