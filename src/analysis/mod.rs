//! Cross-protocol aggregation operations.
//!
//! Each operation builds its report as a `Result` and converts failures
//! into an [`ErrorResult`] at the boundary, so callers always receive a
//! [`ReportOutcome`].

pub mod aggregator;
pub mod analyzer;
pub mod comparison;
pub mod patterns;
pub mod rankings;

pub use analyzer::CrossProtocolAnalyzer;
pub use comparison::create_comprehensive_comparison;
pub use patterns::identify_governance_patterns;
pub use rankings::generate_comparative_rankings;

use crate::error::AggregationError;
use crate::models::{ErrorResult, ReportOutcome};
use tracing::error;

/// Tracing target for the aggregation operations.
pub const LOG_TARGET: &str = "gova::cross_protocol";

/// Convert an operation's result into its boundary outcome.
///
/// Failures are logged once. `message_prefix` tags the error text so
/// callers can tell which operation failed.
fn settle<T>(
    result: Result<T, AggregationError>,
    log_context: &str,
    message_prefix: Option<&str>,
) -> ReportOutcome<T> {
    match result {
        Ok(report) => ReportOutcome::Report(report),
        Err(e) => {
            error!(target: LOG_TARGET, "{}: {}", log_context, e);
            let message = match message_prefix {
                Some(prefix) => format!("{}: {}", prefix, e),
                None => e.to_string(),
            };
            ReportOutcome::Error(ErrorResult::new(message))
        }
    }
}
