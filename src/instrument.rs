//! Call measurement for the aggregation operations.
//!
//! Operations are wrapped, never modified: [`measure`] runs one call and
//! records its latency and outcome against a [`CallSite`], and
//! [`instrument`] turns an operation into an equivalent measured one.

use crate::models::ReportOutcome;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tracing::debug;

/// Identifies a measured operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct CallSite {
    /// Protocol tag the call is attributed to.
    pub protocol: &'static str,
    /// Operation name.
    pub method: &'static str,
}

impl CallSite {
    pub const fn new(protocol: &'static str, method: &'static str) -> Self {
        Self { protocol, method }
    }
}

/// Whether a measured call produced a report or an error result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallOutcome {
    Success,
    Failure,
}

/// Receives one record per measured call.
pub trait CallRecorder: Send + Sync {
    fn record(&self, site: CallSite, outcome: CallOutcome, elapsed: Duration);
}

/// Discards every record.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopRecorder;

impl CallRecorder for NoopRecorder {
    fn record(&self, _site: CallSite, _outcome: CallOutcome, _elapsed: Duration) {}
}

/// Accumulated statistics for one call site.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CallStats {
    pub calls: u64,
    pub successes: u64,
    pub failures: u64,
    pub total_duration: Duration,
    pub max_duration: Duration,
}

impl CallStats {
    /// Mean latency, zero when nothing was recorded.
    pub fn average_duration(&self) -> Duration {
        if self.calls == 0 {
            return Duration::ZERO;
        }
        self.total_duration.div_f64(self.calls as f64)
    }
}

/// In-memory recorder keeping per-site statistics.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    stats: Mutex<BTreeMap<CallSite, CallStats>>,
}

impl MetricsCollector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of the statistics gathered so far.
    pub fn snapshot(&self) -> BTreeMap<CallSite, CallStats> {
        match self.stats.lock() {
            Ok(stats) => stats.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    pub fn reset(&self) {
        match self.stats.lock() {
            Ok(mut stats) => stats.clear(),
            Err(poisoned) => poisoned.into_inner().clear(),
        }
    }
}

impl CallRecorder for MetricsCollector {
    fn record(&self, site: CallSite, outcome: CallOutcome, elapsed: Duration) {
        let mut stats = match self.stats.lock() {
            Ok(stats) => stats,
            Err(poisoned) => poisoned.into_inner(),
        };

        let entry = stats.entry(site).or_default();
        entry.calls += 1;
        match outcome {
            CallOutcome::Success => entry.successes += 1,
            CallOutcome::Failure => entry.failures += 1,
        }
        entry.total_duration += elapsed;
        entry.max_duration = entry.max_duration.max(elapsed);
    }
}

/// Run `op` once, recording its latency and outcome.
///
/// The returned outcome is exactly what `op` returned.
pub fn measure<T, F>(recorder: &dyn CallRecorder, site: CallSite, op: F) -> ReportOutcome<T>
where
    F: FnOnce() -> ReportOutcome<T>,
{
    let start = Instant::now();
    let outcome = op();
    let elapsed = start.elapsed();

    let call_outcome = if outcome.is_error() {
        CallOutcome::Failure
    } else {
        CallOutcome::Success
    };

    debug!(
        protocol = site.protocol,
        method = site.method,
        outcome = ?call_outcome,
        elapsed_ms = elapsed.as_secs_f64() * 1000.0,
        "Measured call"
    );

    recorder.record(site, call_outcome, elapsed);
    outcome
}

/// Wrap an operation so every invocation goes through [`measure`].
///
/// Suited to operations that own their arguments. Methods that borrow
/// their inputs, like those of
/// [`CrossProtocolAnalyzer`](crate::analysis::CrossProtocolAnalyzer), call
/// [`measure`] per invocation instead.
pub fn instrument<A, T, F>(
    recorder: Arc<dyn CallRecorder>,
    site: CallSite,
    op: F,
) -> impl Fn(A) -> ReportOutcome<T>
where
    F: Fn(A) -> ReportOutcome<T>,
{
    move |args| measure(recorder.as_ref(), site, || op(args))
}
