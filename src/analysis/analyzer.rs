//! The cross-protocol analyzer.
//!
//! A stateless calculator bundling the ranking and pattern settings, a
//! clock, and a call recorder. Every public operation runs through
//! [`measure`] so the recorder sees its latency and outcome.

use super::{comparison, patterns, rankings};
use crate::clock::{Clock, SystemClock};
use crate::config::{Config, PatternConfig, RankingConfig};
use crate::instrument::{measure, CallRecorder, CallSite, NoopRecorder};
use crate::models::{
    ComparisonReport, PatternReport, ProtocolMetrics, RankingReport, ReportOutcome, Snapshots,
};
use std::sync::Arc;

/// Protocol tag the aggregation operations are recorded under.
pub const CROSS_PROTOCOL: &str = "cross_protocol";

pub const COMPARISON_SITE: CallSite =
    CallSite::new(CROSS_PROTOCOL, "create_comprehensive_comparison");
pub const PATTERNS_SITE: CallSite = CallSite::new(CROSS_PROTOCOL, "identify_governance_patterns");
pub const RANKINGS_SITE: CallSite = CallSite::new(CROSS_PROTOCOL, "generate_comparative_rankings");

pub struct CrossProtocolAnalyzer {
    ranking: RankingConfig,
    patterns: PatternConfig,
    clock: Arc<dyn Clock>,
    recorder: Arc<dyn CallRecorder>,
}

impl Default for CrossProtocolAnalyzer {
    fn default() -> Self {
        Self {
            ranking: RankingConfig::default(),
            patterns: PatternConfig::default(),
            clock: Arc::new(SystemClock),
            recorder: Arc::new(NoopRecorder),
        }
    }
}

impl CrossProtocolAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Analyzer using the ranking and pattern sections of `config`.
    pub fn from_config(config: &Config) -> Self {
        Self {
            ranking: config.ranking.clone(),
            patterns: config.patterns.clone(),
            ..Self::default()
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_recorder(mut self, recorder: Arc<dyn CallRecorder>) -> Self {
        self.recorder = recorder;
        self
    }

    pub fn ranking_config(&self) -> &RankingConfig {
        &self.ranking
    }

    pub fn pattern_config(&self) -> &PatternConfig {
        &self.patterns
    }

    pub fn create_comprehensive_comparison(
        &self,
        concentration: &ProtocolMetrics,
        participation: &ProtocolMetrics,
    ) -> ReportOutcome<ComparisonReport> {
        measure(self.recorder.as_ref(), COMPARISON_SITE, || {
            comparison::create_comprehensive_comparison(
                concentration,
                participation,
                self.clock.as_ref(),
            )
        })
    }

    pub fn identify_governance_patterns(&self, snapshots: &Snapshots) -> ReportOutcome<PatternReport> {
        measure(self.recorder.as_ref(), PATTERNS_SITE, || {
            patterns::identify_governance_patterns(snapshots, &self.patterns)
        })
    }

    /// Rank protocols. `None` or an empty selection ranks the default
    /// metric set.
    pub fn generate_comparative_rankings(
        &self,
        snapshots: &Snapshots,
        metrics: Option<&[String]>,
    ) -> ReportOutcome<RankingReport> {
        measure(self.recorder.as_ref(), RANKINGS_SITE, || {
            rankings::generate_comparative_rankings(
                snapshots,
                metrics,
                &self.ranking,
                self.clock.as_ref(),
            )
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use crate::instrument::MetricsCollector;
    use crate::models::ProtocolSnapshot;
    use chrono::{TimeZone, Utc};
    use serde_json::json;

    fn analyzer(collector: Arc<MetricsCollector>) -> CrossProtocolAnalyzer {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap());
        CrossProtocolAnalyzer::new()
            .with_clock(Arc::new(clock))
            .with_recorder(collector)
    }

    #[test]
    fn test_operations_are_recorded_per_site() {
        let collector = Arc::new(MetricsCollector::new());
        let analyzer = analyzer(collector.clone());

        let mut snapshots = Snapshots::new();
        snapshots.insert(
            "compound".into(),
            ProtocolSnapshot::new(vec!["turnout".into()], vec![vec![json!(0.1)]]),
        );
        snapshots.insert(
            "broken".into(),
            ProtocolSnapshot::new(vec!["turnout".into()], vec![vec![]]),
        );

        let comparison =
            analyzer.create_comprehensive_comparison(&ProtocolMetrics::new(), &ProtocolMetrics::new());
        let patterns = analyzer.identify_governance_patterns(&snapshots);
        let rankings = analyzer.generate_comparative_rankings(&Snapshots::new(), None);

        assert!(!comparison.is_error());
        assert!(patterns.is_error());
        assert!(!rankings.is_error());

        let stats = collector.snapshot();
        assert_eq!(stats[&COMPARISON_SITE].successes, 1);
        assert_eq!(stats[&PATTERNS_SITE].failures, 1);
        assert_eq!(stats[&RANKINGS_SITE].calls, 1);
    }

    #[test]
    fn test_analyzer_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<CrossProtocolAnalyzer>();
    }

    #[test]
    fn test_concurrent_calls_share_one_collector() {
        const THREADS: u64 = 8;

        let collector = Arc::new(MetricsCollector::new());
        let analyzer = Arc::new(analyzer(collector.clone()));

        let mut snapshots = Snapshots::new();
        snapshots.insert(
            "compound".into(),
            ProtocolSnapshot::new(vec!["turnout".into()], vec![vec![json!(0.1)], vec![json!(0.2)]]),
        );
        let snapshots = Arc::new(snapshots);

        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                let analyzer = Arc::clone(&analyzer);
                let snapshots = Arc::clone(&snapshots);
                std::thread::spawn(move || analyzer.generate_comparative_rankings(&snapshots, None))
            })
            .collect();

        let reports: Vec<_> = handles
            .into_iter()
            .map(|handle| handle.join().unwrap().into_result().unwrap())
            .collect();

        assert!(reports.iter().all(|report| report == &reports[0]));

        let stats = collector.snapshot();
        assert_eq!(stats[&RANKINGS_SITE].calls, THREADS);
        assert_eq!(stats[&RANKINGS_SITE].successes, THREADS);
    }

    #[test]
    fn test_from_config_carries_settings() {
        let mut config = Config::default();
        config.ranking.lower_is_better = vec!["voting_delay".to_string()];
        config.patterns.majority_threshold = 0.75;

        let analyzer = CrossProtocolAnalyzer::from_config(&config);
        assert!(analyzer.ranking_config().is_lower_better("voting_delay"));
        assert_eq!(analyzer.pattern_config().majority_threshold, 0.75);
    }

    #[test]
    fn test_frozen_clock_stamps_reports() {
        let analyzer = analyzer(Arc::new(MetricsCollector::new()));
        let report = analyzer
            .generate_comparative_rankings(&Snapshots::new(), None)
            .into_result()
            .unwrap();
        assert_eq!(
            report.ranking_timestamp,
            Utc.with_ymd_and_hms(2024, 1, 15, 8, 0, 0).unwrap()
        );
    }
}
