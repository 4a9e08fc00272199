//! gova - cross-protocol governance analytics.
//!
//! Combines per-protocol concentration and participation metrics, computed
//! by external analyzers, into three reports:
//!
//! - a comprehensive comparison ([`CrossProtocolAnalyzer::create_comprehensive_comparison`]),
//! - common and unique governance patterns with trends
//!   ([`CrossProtocolAnalyzer::identify_governance_patterns`]),
//! - per-metric and overall rankings
//!   ([`CrossProtocolAnalyzer::generate_comparative_rankings`]).
//!
//! Operations never fail past their boundary: a fault yields a
//! [`ReportOutcome::Error`] holding only an error message.

pub mod analysis;
pub mod cli;
pub mod clock;
pub mod config;
pub mod error;
pub mod input;
pub mod instrument;
pub mod models;
pub mod report;

pub use analysis::CrossProtocolAnalyzer;
pub use clock::{Clock, FixedClock, SystemClock};
pub use config::Config;
pub use error::AggregationError;
pub use input::InputBundle;
pub use instrument::{instrument, measure, CallRecorder, CallSite, MetricsCollector};
pub use models::{
    ComparisonReport, ErrorResult, PatternReport, ProtocolMetrics, ProtocolSnapshot,
    RankingReport, ReportOutcome, Snapshots,
};
