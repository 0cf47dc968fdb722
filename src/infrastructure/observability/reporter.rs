//! Structured stdout sink for compliance reports.
//!
//! Each cycle is printed as one `COMPLIANCE_JSON:{...}` line so log shippers
//! (Loki, Fluentd, CloudWatch) can filter it without parsing free text.

use crate::domain::compliance::{ComplianceIssue, ComplianceReport};
use serde::Serialize;
use tracing::{info, warn};

pub const REPORT_PREFIX: &str = "COMPLIANCE_JSON:";

#[derive(Serialize)]
pub struct ReportLine<'a> {
    pub cycle_id: String,
    pub timestamp: String,
    pub duration_ms: i64,
    pub overall_score: f64,
    pub failed_checks: usize,
    pub version: &'static str,
    pub checks: Vec<CheckLine<'a>>,
}

#[derive(Serialize)]
pub struct CheckLine<'a> {
    pub article_number: &'a str,
    pub requirement_type: &'a str,
    pub score: f64,
    pub issues: &'a [ComplianceIssue],
}

impl<'a> ReportLine<'a> {
    pub fn from_report(report: &'a ComplianceReport) -> Self {
        Self {
            cycle_id: report.cycle_id.to_string(),
            timestamp: report.finished_at.to_rfc3339(),
            duration_ms: (report.finished_at - report.started_at).num_milliseconds(),
            overall_score: report.overall_score(),
            failed_checks: report.failed_checks(),
            version: env!("CARGO_PKG_VERSION"),
            checks: report
                .results
                .iter()
                .map(|r| CheckLine {
                    article_number: &r.article_number,
                    requirement_type: &r.requirement_type,
                    score: r.score,
                    issues: &r.issues,
                })
                .collect(),
        }
    }
}

/// Serialize the report as the single machine-readable line.
pub fn render_report(report: &ComplianceReport) -> serde_json::Result<String> {
    let json = serde_json::to_string(&ReportLine::from_report(report))?;
    Ok(format!("{}{}", REPORT_PREFIX, json))
}

/// Print the report line, then one warning per issue.
pub fn emit_report(report: &ComplianceReport) {
    match render_report(report) {
        Ok(line) => println!("{}", line),
        Err(e) => warn!("Failed to serialize compliance report: {}", e),
    }

    for (requirement_type, issue) in report.issues() {
        warn!(
            requirement_type,
            issue_type = %issue.issue_type,
            severity = %issue.severity,
            "Compliance issue: {}",
            issue.description
        );
    }
    info!(
        cycle_id = %report.cycle_id,
        checks = report.results.len(),
        failed = report.failed_checks(),
        "Compliance cycle complete (overall score {:.2})",
        report.overall_score()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::compliance::{ComplianceCheckResult, Severity, ISSUE_CHECK_FAILURE};
    use chrono::{Duration, Utc};

    #[test]
    fn test_report_line_format() {
        let started = Utc::now();
        let report = ComplianceReport {
            cycle_id: uuid::Uuid::new_v4(),
            started_at: started,
            finished_at: started + Duration::milliseconds(42),
            results: vec![ComplianceCheckResult {
                article_number: "91".to_string(),
                requirement_type: "deteccao_anomalias".to_string(),
                score: 0.0,
                timestamp: started,
                issues: vec![ComplianceIssue::new(
                    ISSUE_CHECK_FAILURE,
                    Severity::High,
                    "check timed out",
                )],
            }],
        };

        let line = render_report(&report).expect("report should serialize");
        assert!(line.starts_with(REPORT_PREFIX));

        let json: serde_json::Value =
            serde_json::from_str(&line[REPORT_PREFIX.len()..]).expect("valid json");
        assert_eq!(json["duration_ms"], 42);
        assert_eq!(json["failed_checks"], 1);
        assert_eq!(json["checks"][0]["requirement_type"], "deteccao_anomalias");
        assert_eq!(json["checks"][0]["issues"][0]["severity"], "high");
        assert_eq!(json["checks"][0]["issues"][0]["issue_type"], "check_failure");
    }
}
