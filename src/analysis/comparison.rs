//! Comprehensive comparison of concentration and participation results.

use super::aggregator::validate_protocol_ids;
use super::{settle, LOG_TARGET};
use crate::clock::Clock;
use crate::error::AggregationError;
use crate::models::{ComparisonReport, ComparisonSummary, ProtocolMetrics, ReportOutcome};
use tracing::info;

/// Merge both result sets into one report stamped with the clock's time.
///
/// Inputs are echoed unchanged.
pub fn build_comparison(
    concentration: &ProtocolMetrics,
    participation: &ProtocolMetrics,
    clock: &dyn Clock,
) -> Result<ComparisonReport, AggregationError> {
    validate_protocol_ids(concentration.keys(), "concentration results")?;
    validate_protocol_ids(participation.keys(), "participation results")?;

    let missing_participation: Vec<String> = concentration
        .keys()
        .filter(|protocol| !participation.contains_key(*protocol))
        .cloned()
        .collect();

    Ok(ComparisonReport {
        concentration: concentration.clone(),
        participation: participation.clone(),
        summary: ComparisonSummary {
            total_protocols: concentration.len(),
            participation_protocols: participation.len(),
            missing_participation,
            comparison_timestamp: clock.now(),
        },
    })
}

/// Create a comprehensive comparison across protocols.
pub fn create_comprehensive_comparison(
    concentration: &ProtocolMetrics,
    participation: &ProtocolMetrics,
    clock: &dyn Clock,
) -> ReportOutcome<ComparisonReport> {
    info!(
        target: LOG_TARGET,
        protocols = concentration.len(),
        "Creating comprehensive cross-protocol comparison"
    );

    settle(
        build_comparison(concentration, participation, clock),
        "Error creating comprehensive comparison",
        None,
    )
}
