//! Markdown and JSON report generation.
//!
//! This module renders the outcome of an analysis run (comparison,
//! patterns and rankings) as a Markdown document or pretty JSON.

use crate::models::{
    ComparisonReport, PatternReport, RankingReport, ReportOutcome, TrendDirection,
};
use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

/// The reports produced by one invocation.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisRun {
    pub generated_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<ReportOutcome<ComparisonReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patterns: Option<ReportOutcome<PatternReport>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rankings: Option<ReportOutcome<RankingReport>>,
}

impl AnalysisRun {
    pub fn new(generated_at: DateTime<Utc>) -> Self {
        Self {
            generated_at,
            comparison: None,
            patterns: None,
            rankings: None,
        }
    }

    /// Whether any produced report was replaced by an error result.
    pub fn has_errors(&self) -> bool {
        self.comparison.as_ref().is_some_and(ReportOutcome::is_error)
            || self.patterns.as_ref().is_some_and(ReportOutcome::is_error)
            || self.rankings.as_ref().is_some_and(ReportOutcome::is_error)
    }
}

/// Generate a complete Markdown report.
pub fn generate_markdown_report(run: &AnalysisRun) -> String {
    let mut output = String::new();

    output.push_str("# Cross-Protocol Governance Report\n\n");
    output.push_str(&format!(
        "*Generated: {}*\n\n",
        run.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));

    if let Some(ref comparison) = run.comparison {
        output.push_str(&render_outcome(comparison, generate_comparison_section));
    }
    if let Some(ref patterns) = run.patterns {
        output.push_str(&render_outcome(patterns, generate_patterns_section));
    }
    if let Some(ref rankings) = run.rankings {
        output.push_str(&render_outcome(rankings, generate_rankings_section));
    }

    output.push_str(&generate_footer());

    output
}

fn render_outcome<T>(outcome: &ReportOutcome<T>, render: fn(&T) -> String) -> String {
    match outcome {
        ReportOutcome::Report(report) => render(report),
        ReportOutcome::Error(e) => format!("> ❌ **Error:** {}\n\n", e.error),
    }
}

/// Generate the comparison section.
fn generate_comparison_section(report: &ComparisonReport) -> String {
    let mut section = String::new();
    let summary = &report.summary;

    section.push_str("## Protocol Comparison\n\n");
    section.push_str(&format!("- **Protocols:** {}\n", summary.total_protocols));
    section.push_str(&format!(
        "- **With participation data:** {}\n",
        summary.participation_protocols
    ));
    if !summary.missing_participation.is_empty() {
        section.push_str(&format!(
            "- **Missing participation data:** {}\n",
            summary.missing_participation.join(", ")
        ));
    }
    section.push_str(&format!(
        "- **Compared at:** {}\n\n",
        summary.comparison_timestamp.to_rfc3339()
    ));

    if report.concentration.is_empty() {
        return section;
    }

    section.push_str("| Protocol | Concentration metrics | Participation metrics |\n");
    section.push_str("|:---|:---:|:---:|\n");
    for (protocol, metrics) in &report.concentration {
        let participation = report
            .participation
            .get(protocol)
            .map(|m| m.len().to_string())
            .unwrap_or_else(|| "-".to_string());
        section.push_str(&format!(
            "| {} | {} | {} |\n",
            protocol,
            metrics.len(),
            participation
        ));
    }
    section.push('\n');

    section
}

/// Generate the governance patterns section.
fn generate_patterns_section(report: &PatternReport) -> String {
    let mut section = String::new();

    section.push_str("## Governance Patterns\n\n");

    section.push_str("### Common Patterns\n\n");
    if report.common_patterns.is_empty() {
        section.push_str("No pattern is shared by two or more protocols.\n\n");
    } else {
        section.push_str("| Pattern | Protocols |\n");
        section.push_str("|:---|:---|\n");
        for common in &report.common_patterns {
            section.push_str(&format!(
                "| `{}` | {} |\n",
                common.pattern,
                common.protocols.join(", ")
            ));
        }
        section.push('\n');
    }

    let with_unique: Vec<_> = report
        .unique_patterns
        .iter()
        .filter(|(_, patterns)| !patterns.is_empty())
        .collect();
    if !with_unique.is_empty() {
        section.push_str("### Unique Patterns\n\n");
        for (protocol, patterns) in with_unique {
            section.push_str(&format!("**{}**\n\n", protocol));
            for pattern in patterns {
                section.push_str(&format!("- `{}`\n", pattern));
            }
            section.push('\n');
        }
    }

    if !report.trends.is_empty() {
        section.push_str("### Trends\n\n");
        section.push_str("| Metric | Consensus | ↑ | ↓ | → | ~ |\n");
        section.push_str("|:---|:---|:---:|:---:|:---:|:---:|\n");
        for (metric, trend) in &report.trends {
            let consensus = trend
                .consensus
                .map(|d| d.to_string())
                .unwrap_or_else(|| "mixed".to_string());
            section.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                metric,
                consensus,
                trend.protocols_for(TrendDirection::Increasing).len(),
                trend.protocols_for(TrendDirection::Decreasing).len(),
                trend.protocols_for(TrendDirection::Stable).len(),
                trend.protocols_for(TrendDirection::Volatile).len(),
            ));
        }
        section.push('\n');
    }

    section
}

/// Generate the rankings section.
fn generate_rankings_section(report: &RankingReport) -> String {
    let mut section = String::new();

    section.push_str("## Rankings\n\n");

    if report.overall_rankings.is_empty() {
        section.push_str("No protocols to rank.\n\n");
    } else {
        section.push_str("### Overall\n\n");
        section.push_str("| Rank | Protocol | Mean rank |\n");
        section.push_str("|:---:|:---|:---:|\n");
        for (i, protocol) in report.overall_rankings.iter().enumerate() {
            let score = report
                .composite_scores
                .get(protocol)
                .map(|s| format!("{:.2}", s))
                .unwrap_or_else(|| "-".to_string());
            section.push_str(&format!("| {} | {} | {} |\n", i + 1, protocol, score));
        }
        section.push('\n');
    }

    for (metric, protocols) in &report.metric_rankings {
        section.push_str(&format!("### By `{}`\n\n", metric));
        if protocols.is_empty() {
            section.push_str("No protocol reports this metric.\n\n");
            continue;
        }
        for (i, protocol) in protocols.iter().enumerate() {
            section.push_str(&format!("{}. {}\n", i + 1, protocol));
        }
        section.push('\n');
    }

    section
}

/// Generate the report footer.
fn generate_footer() -> String {
    "---\n\n*Report generated by gova*\n".to_string()
}

/// Generate a JSON report.
pub fn generate_json_report(run: &AnalysisRun) -> Result<String> {
    serde_json::to_string_pretty(run).map_err(Into::into)
}

/// Write rendered report content to a file.
pub fn write_report(content: &str, path: &Path) -> Result<()> {
    std::fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        CommonPattern, ComparisonSummary, ErrorResult, PatternDescriptor, PatternKind,
        ProtocolMetrics, TrendSummary,
    };
    use chrono::TimeZone;
    use std::collections::BTreeMap;

    fn timestamp() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 2, 2, 10, 0, 0).unwrap()
    }

    fn create_test_run() -> AnalysisRun {
        let concentration: ProtocolMetrics =
            serde_json::from_str(r#"{ "compound": { "gini": 0.9 }, "aave": { "gini": 0.8 } }"#)
                .unwrap();

        let mut trends = BTreeMap::new();
        trends.insert(
            "turnout".to_string(),
            TrendSummary {
                consensus: Some(TrendDirection::Increasing),
                increasing: vec!["aave".into(), "compound".into()],
                description: "turnout is increasing in 2 of 2 protocols".into(),
                ..TrendSummary::default()
            },
        );

        let mut run = AnalysisRun::new(timestamp());
        run.comparison = Some(ReportOutcome::Report(ComparisonReport {
            concentration,
            participation: ProtocolMetrics::new(),
            summary: ComparisonSummary {
                total_protocols: 2,
                participation_protocols: 0,
                missing_participation: vec!["aave".into(), "compound".into()],
                comparison_timestamp: timestamp(),
            },
        }));
        run.patterns = Some(ReportOutcome::Report(PatternReport {
            common_patterns: vec![CommonPattern {
                pattern: PatternDescriptor::new(PatternKind::Trend, "turnout", "increasing"),
                protocols: vec!["aave".into(), "compound".into()],
            }],
            unique_patterns: BTreeMap::new(),
            trends,
        }));
        run.rankings = Some(ReportOutcome::Error(ErrorResult::new("duplicate column 'x'")));
        run
    }

    #[test]
    fn test_generate_markdown_report() {
        let markdown = generate_markdown_report(&create_test_run());

        assert!(markdown.contains("# Cross-Protocol Governance Report"));
        assert!(markdown.contains("## Protocol Comparison"));
        assert!(markdown.contains("Missing participation data:** aave, compound"));
        assert!(markdown.contains("`trend:turnout:increasing`"));
        assert!(markdown.contains("| turnout | increasing | 2 | 0 | 0 | 0 |"));
        assert!(markdown.contains("**Error:** duplicate column 'x'"));
    }

    #[test]
    fn test_rankings_section() {
        let mut metric_rankings = BTreeMap::new();
        metric_rankings.insert("turnout".to_string(), vec!["aave".to_string()]);
        metric_rankings.insert("quorum".to_string(), Vec::new());

        let mut composite_scores = BTreeMap::new();
        composite_scores.insert("aave".to_string(), 1.0);

        let section = generate_rankings_section(&RankingReport {
            overall_rankings: vec!["aave".into(), "lido".into()],
            metric_rankings,
            composite_scores,
            ranking_timestamp: timestamp(),
        });

        assert!(section.contains("| 1 | aave | 1.00 |"));
        assert!(section.contains("| 2 | lido | - |"));
        assert!(section.contains("### By `quorum`\n\nNo protocol reports this metric."));
    }

    #[test]
    fn test_has_errors() {
        let run = create_test_run();
        assert!(run.has_errors());

        let clean = AnalysisRun::new(timestamp());
        assert!(!clean.has_errors());
    }

    #[test]
    fn test_generate_json_report() {
        let json = generate_json_report(&create_test_run()).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();

        assert_eq!(value["comparison"]["summary"]["total_protocols"], 2);
        assert_eq!(value["rankings"], serde_json::json!({ "error": "duplicate column 'x'" }));
        assert!(value["patterns"]["common_patterns"].is_array());
    }

    #[test]
    fn test_write_report() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("report.md");
        write_report("# hi\n", &path).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "# hi\n");
    }
}
