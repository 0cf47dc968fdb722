//! BCB Resolution 403 rule checks, each scoring a weighted set of boolean signals.

use crate::domain::compliance::signals::*;
use crate::domain::compliance::{
    CheckOutcome, ComplianceIssue, ISSUE_COMPONENT_NOT_CONFORMANT, ISSUE_MISSING_SIGNAL,
    OperationalSignals, Requirement, Severity,
};
use crate::domain::ports::ComplianceCheck;
use anyhow::Result;
use async_trait::async_trait;
use std::sync::Arc;

pub const ART_89: &str = "89";
pub const ART_91: &str = "91";

pub const REAL_TIME_MONITORING: &str = "monitoramento_tempo_real";
pub const SUSPICIOUS_ACCOUNT_BLOCKING: &str = "bloqueio_contas_suspeitas";
pub const ANOMALY_DETECTION: &str = "deteccao_anomalias";

/// One boolean component and its share of the check score.
#[derive(Debug, Clone, Copy)]
pub struct Component {
    pub signal: &'static str,
    pub weight: f64,
    pub description: &'static str,
}

/// Sum of the weights of healthy components, clamped to `[0, 1]`.
///
/// Missing signals count as unhealthy and are reported separately from
/// components that reported `false`.
pub struct WeightedRuleCheck {
    requirement: Requirement,
    components: Vec<Component>,
}

impl WeightedRuleCheck {
    pub fn new(requirement: Requirement, components: Vec<Component>) -> Self {
        Self {
            requirement,
            components,
        }
    }

    pub fn components(&self) -> &[Component] {
        &self.components
    }

    fn score(&self, signals: &OperationalSignals) -> CheckOutcome {
        let mut score = 0.0;
        let mut issues = Vec::new();

        for component in &self.components {
            match signals.get(component.signal) {
                Some(true) => score += component.weight,
                Some(false) => issues.push(ComplianceIssue::new(
                    ISSUE_COMPONENT_NOT_CONFORMANT,
                    Severity::Medium,
                    format!("{} not conformant", component.description),
                )),
                None => issues.push(ComplianceIssue::new(
                    ISSUE_MISSING_SIGNAL,
                    Severity::Low,
                    format!("signal {} was not reported", component.signal),
                )),
            }
        }

        CheckOutcome::new(score, issues)
    }
}

#[async_trait]
impl ComplianceCheck for WeightedRuleCheck {
    fn requirement(&self) -> &Requirement {
        &self.requirement
    }

    async fn evaluate(&self, signals: &OperationalSignals) -> Result<CheckOutcome> {
        Ok(self.score(signals))
    }
}

/// Art. 89: real-time monitoring of Pix transactions.
pub fn real_time_monitoring() -> WeightedRuleCheck {
    WeightedRuleCheck::new(
        Requirement::new(ART_89, REAL_TIME_MONITORING),
        vec![
            Component {
                signal: MONITORING_ACTIVE,
                weight: 0.4,
                description: "transaction monitoring",
            },
            Component {
                signal: ALERTING_CONFIGURED,
                weight: 0.3,
                description: "alerting",
            },
            Component {
                signal: RESPONSE_TIME_WITHIN_SLA,
                weight: 0.3,
                description: "monitoring response time",
            },
        ],
    )
}

/// Art. 89 sole paragraph: blocking of suspicious accounts.
pub fn suspicious_account_blocking() -> WeightedRuleCheck {
    WeightedRuleCheck::new(
        Requirement::new(ART_89, SUSPICIOUS_ACCOUNT_BLOCKING),
        vec![
            Component {
                signal: BLOCKING_SYSTEM_ACTIVE,
                weight: 0.4,
                description: "account blocking system",
            },
            Component {
                signal: DICT_INTEGRATION_HEALTHY,
                weight: 0.4,
                description: "DICT integration",
            },
            Component {
                signal: BLOCKING_RESPONSE_TIME_WITHIN_SLA,
                weight: 0.2,
                description: "blocking response time",
            },
        ],
    )
}

/// Art. 91: anomaly detection models.
pub fn anomaly_detection() -> WeightedRuleCheck {
    WeightedRuleCheck::new(
        Requirement::new(ART_91, ANOMALY_DETECTION),
        vec![
            Component {
                signal: MODELS_ACTIVE,
                weight: 0.3,
                description: "anomaly detection models",
            },
            Component {
                signal: DRIFT_DETECTION_ACTIVE,
                weight: 0.3,
                description: "drift detection",
            },
            Component {
                signal: MODEL_PERFORMANCE_ADEQUATE,
                weight: 0.4,
                description: "model performance",
            },
        ],
    )
}

pub fn default_checks() -> Vec<Arc<dyn ComplianceCheck>> {
    vec![
        Arc::new(real_time_monitoring()),
        Arc::new(suspicious_account_blocking()),
        Arc::new(anomaly_detection()),
    ]
}
