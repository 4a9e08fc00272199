//! Column statistics shared by the pattern and ranking operations.
//!
//! These helpers reduce snapshot columns to the values the reports are
//! built from: representative values, trend directions, majorities and
//! competition ranks.

use crate::config::Representative;
use crate::error::AggregationError;
use crate::models::{ProtocolSnapshot, Snapshots, TrendDirection};
use std::collections::BTreeMap;

/// Reject blank protocol identifiers.
pub fn validate_protocol_ids<'a, I>(ids: I, source: &'static str) -> Result<(), AggregationError>
where
    I: IntoIterator<Item = &'a String>,
{
    if ids.into_iter().any(|id| id.trim().is_empty()) {
        return Err(AggregationError::BlankProtocol(source));
    }
    Ok(())
}

/// Validate every protocol identifier and snapshot shape.
pub fn validate_snapshots(snapshots: &Snapshots) -> Result<(), AggregationError> {
    validate_protocol_ids(snapshots.keys(), "snapshots")?;
    for (protocol, snapshot) in snapshots {
        snapshot.validate(protocol)?;
    }
    Ok(())
}

/// Names of the numeric columns of a snapshot, in column order.
pub fn numeric_columns(snapshot: &ProtocolSnapshot) -> Vec<String> {
    snapshot
        .columns
        .iter()
        .filter(|c| snapshot.numeric_series(c).is_some())
        .cloned()
        .collect()
}

/// Arithmetic mean, `None` for an empty series.
pub fn mean(series: &[f64]) -> Option<f64> {
    if series.is_empty() {
        return None;
    }
    Some(series.iter().sum::<f64>() / series.len() as f64)
}

/// Reduce a series to the single value used for ranking.
pub fn representative_value(series: &[f64], representative: Representative) -> Option<f64> {
    match representative {
        Representative::Mean => mean(series),
        Representative::Latest => series.last().copied(),
    }
}

/// Classify the movement of a time-ordered series.
///
/// Needs at least two observations. Changes no larger than `tolerance`
/// count as flat.
pub fn trend_direction(series: &[f64], tolerance: f64) -> Option<TrendDirection> {
    let (first, last) = match series {
        [first, .., last] => (*first, *last),
        _ => return None,
    };

    let steps: Vec<f64> = series.windows(2).map(|w| w[1] - w[0]).collect();
    let net = last - first;

    let direction = if steps.iter().all(|d| d.abs() <= tolerance) && net.abs() <= tolerance {
        TrendDirection::Stable
    } else if steps.iter().all(|d| *d >= -tolerance) && net > tolerance {
        TrendDirection::Increasing
    } else if steps.iter().all(|d| *d <= tolerance) && net < -tolerance {
        TrendDirection::Decreasing
    } else {
        TrendDirection::Volatile
    };

    Some(direction)
}

/// The most frequent value when its share strictly exceeds `threshold`.
///
/// Ties on count go to the lexicographically smallest value.
pub fn majority_value(values: &[String], threshold: f64) -> Option<String> {
    if values.is_empty() {
        return None;
    }

    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for value in values {
        *counts.entry(value.as_str()).or_default() += 1;
    }

    let mut best: Option<(&str, usize)> = None;
    for (value, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((value, count));
        }
    }

    best.filter(|(_, count)| *count as f64 / values.len() as f64 > threshold)
        .map(|(value, _)| value.to_string())
}

/// 1-based competition ranks ("1224") for values already in ranking order.
pub fn competition_ranks(sorted_values: &[f64]) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted_values.len());
    for (i, value) in sorted_values.iter().enumerate() {
        let rank = match (i.checked_sub(1), ranks.last()) {
            (Some(prev), Some(&prev_rank)) if sorted_values[prev] == *value => prev_rank,
            _ => i + 1,
        };
        ranks.push(rank);
    }
    ranks
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_validate_protocol_ids() {
        let ids = vec!["compound".to_string(), "  ".to_string()];
        assert!(validate_protocol_ids(&ids, "concentration results").is_err());
        assert!(validate_protocol_ids(&ids[..1], "concentration results").is_ok());
    }

    #[test]
    fn test_numeric_columns_in_column_order() {
        let snapshot = ProtocolSnapshot::new(
            vec!["turnout".into(), "outcome".into(), "quorum".into()],
            vec![vec![json!(0.2), json!("passed"), json!(4)]],
        );
        assert_eq!(numeric_columns(&snapshot), vec!["turnout", "quorum"]);
    }

    #[test]
    fn test_representative_value() {
        let series = [1.0, 2.0, 6.0];
        assert_eq!(representative_value(&series, Representative::Mean), Some(3.0));
        assert_eq!(representative_value(&series, Representative::Latest), Some(6.0));
        assert_eq!(representative_value(&[], Representative::Mean), None);
    }

    #[test]
    fn test_trend_direction() {
        let tol = 1e-9;
        assert_eq!(trend_direction(&[1.0, 2.0, 2.0, 3.0], tol), Some(TrendDirection::Increasing));
        assert_eq!(trend_direction(&[3.0, 2.0, 1.0], tol), Some(TrendDirection::Decreasing));
        assert_eq!(trend_direction(&[2.0, 2.0], tol), Some(TrendDirection::Stable));
        assert_eq!(trend_direction(&[1.0, 3.0, 2.0], tol), Some(TrendDirection::Volatile));
        assert_eq!(trend_direction(&[1.0, 3.0, 1.0], tol), Some(TrendDirection::Volatile));
        assert_eq!(trend_direction(&[1.0], tol), None);
    }

    #[test]
    fn test_trend_direction_respects_tolerance() {
        assert_eq!(trend_direction(&[1.0, 1.05, 1.0], 0.1), Some(TrendDirection::Stable));
        assert_eq!(trend_direction(&[1.0, 0.98, 1.5], 0.1), Some(TrendDirection::Increasing));
    }

    #[test]
    fn test_majority_value() {
        let values: Vec<String> = ["for", "for", "against"].iter().map(|s| s.to_string()).collect();
        assert_eq!(majority_value(&values, 0.5), Some("for".to_string()));

        let split: Vec<String> = ["for", "against"].iter().map(|s| s.to_string()).collect();
        assert_eq!(majority_value(&split, 0.5), None);
        assert_eq!(majority_value(&split, 0.4), Some("against".to_string()));
        assert_eq!(majority_value(&[], 0.5), None);
    }

    #[test]
    fn test_competition_ranks() {
        assert_eq!(competition_ranks(&[9.0, 7.0, 7.0, 1.0]), vec![1, 2, 2, 4]);
        assert_eq!(competition_ranks(&[]), Vec::<usize>::new());
    }
}
