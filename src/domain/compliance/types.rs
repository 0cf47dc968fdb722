//! Compliance results for BCB Resolution 403 checks.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fmt;

pub const ISSUE_CHECK_FAILURE: &str = "check_failure";
pub const ISSUE_COMPONENT_NOT_CONFORMANT: &str = "component_not_conformant";
pub const ISSUE_MISSING_SIGNAL: &str = "missing_signal";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Low,
    Medium,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Medium => "medium",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceIssue {
    pub issue_type: String,
    pub severity: Severity,
    pub description: String,
}

impl ComplianceIssue {
    pub fn new(issue_type: &str, severity: Severity, description: impl Into<String>) -> Self {
        Self {
            issue_type: issue_type.to_string(),
            severity,
            description: description.into(),
        }
    }
}

/// What a rule check returns before it is stamped into a result.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckOutcome {
    pub score: f64,
    pub issues: Vec<ComplianceIssue>,
}

impl CheckOutcome {
    /// Builds an outcome with the score clamped to `[0, 1]`. NaN scores become 0.
    pub fn new(score: f64, issues: Vec<ComplianceIssue>) -> Self {
        Self {
            score: clamp_score(score),
            issues,
        }
    }
}

pub fn clamp_score(score: f64) -> f64 {
    if score.is_nan() {
        0.0
    } else {
        score.clamp(0.0, 1.0)
    }
}

/// Regulatory clause a check scores.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct Requirement {
    pub article_number: String,
    pub requirement_type: String,
}

impl Requirement {
    pub fn new(article_number: &str, requirement_type: &str) -> Self {
        Self {
            article_number: article_number.to_string(),
            requirement_type: requirement_type.to_string(),
        }
    }
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Art. {} {}", self.article_number, self.requirement_type)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComplianceCheckResult {
    pub article_number: String,
    pub requirement_type: String,
    pub score: f64,
    pub timestamp: DateTime<Utc>,
    pub issues: Vec<ComplianceIssue>,
}

impl ComplianceCheckResult {
    pub fn from_outcome(requirement: &Requirement, outcome: CheckOutcome) -> Self {
        Self {
            article_number: requirement.article_number.clone(),
            requirement_type: requirement.requirement_type.clone(),
            score: clamp_score(outcome.score),
            timestamp: Utc::now(),
            issues: outcome.issues,
        }
    }

    pub fn is_failure(&self) -> bool {
        self.issues.iter().any(|i| i.issue_type == ISSUE_CHECK_FAILURE)
    }
}

/// Everything one compliance cycle produced.
#[derive(Debug, Clone, Serialize)]
pub struct ComplianceReport {
    pub cycle_id: uuid::Uuid,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub results: Vec<ComplianceCheckResult>,
}

impl ComplianceReport {
    pub fn result(&self, requirement_type: &str) -> Option<&ComplianceCheckResult> {
        self.results
            .iter()
            .find(|r| r.requirement_type == requirement_type)
    }

    /// Issues of every check, paired with the requirement they belong to.
    pub fn issues(&self) -> Vec<(&str, &ComplianceIssue)> {
        self.results
            .iter()
            .flat_map(|r| r.issues.iter().map(move |i| (r.requirement_type.as_str(), i)))
            .collect()
    }

    pub fn failed_checks(&self) -> usize {
        self.results.iter().filter(|r| r.is_failure()).count()
    }

    /// Mean score across checks, 0 for an empty cycle.
    pub fn overall_score(&self) -> f64 {
        if self.results.is_empty() {
            return 0.0;
        }
        self.results.iter().map(|r| r.score).sum::<f64>() / self.results.len() as f64
    }
}
