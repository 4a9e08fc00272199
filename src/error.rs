//! Aggregation error types.
//!
//! Every fault raised while building a report is an [`AggregationError`].
//! Operations never let it escape: it is converted into an
//! [`ErrorResult`](crate::models::ErrorResult) at the boundary.

use thiserror::Error;

/// A failure while building a cross-protocol report.
#[derive(Error, Debug)]
pub enum AggregationError {
    #[error("protocol identifier must not be blank (found in {0})")]
    BlankProtocol(&'static str),

    #[error("malformed snapshot for protocol '{protocol}': {reason}")]
    MalformedSnapshot { protocol: String, reason: String },
}

impl AggregationError {
    pub fn malformed(protocol: &str, reason: impl Into<String>) -> Self {
        Self::MalformedSnapshot {
            protocol: protocol.to_string(),
            reason: reason.into(),
        }
    }
}
