use std::collections::BTreeMap;

// Art. 89, real-time monitoring
pub const MONITORING_ACTIVE: &str = "monitoring_active";
pub const ALERTING_CONFIGURED: &str = "alerting_configured";
pub const RESPONSE_TIME_WITHIN_SLA: &str = "response_time_within_sla";

// Art. 89 sole paragraph, suspicious account blocking
pub const BLOCKING_SYSTEM_ACTIVE: &str = "blocking_system_active";
pub const DICT_INTEGRATION_HEALTHY: &str = "dict_integration_healthy";
pub const BLOCKING_RESPONSE_TIME_WITHIN_SLA: &str = "blocking_response_time_within_sla";

// Art. 91, anomaly detection
pub const MODELS_ACTIVE: &str = "models_active";
pub const DRIFT_DETECTION_ACTIVE: &str = "drift_detection_active";
pub const MODEL_PERFORMANCE_ADEQUATE: &str = "model_performance_adequate";

pub const ALL_SIGNALS: &[&str] = &[
    MONITORING_ACTIVE,
    ALERTING_CONFIGURED,
    RESPONSE_TIME_WITHIN_SLA,
    BLOCKING_SYSTEM_ACTIVE,
    DICT_INTEGRATION_HEALTHY,
    BLOCKING_RESPONSE_TIME_WITHIN_SLA,
    MODELS_ACTIVE,
    DRIFT_DETECTION_ACTIVE,
    MODEL_PERFORMANCE_ADEQUATE,
];

/// Boolean health/SLA signals collected from health checks at the start of a cycle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OperationalSignals {
    values: BTreeMap<String, bool>,
}

impl OperationalSignals {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every known signal reporting healthy.
    pub fn all_healthy() -> Self {
        ALL_SIGNALS.iter().map(|s| (*s, true)).collect()
    }

    pub fn set(&mut self, name: &str, value: bool) {
        self.values.insert(name.to_string(), value);
    }

    /// `None` when the signal was not reported.
    pub fn get(&self, name: &str) -> Option<bool> {
        self.values.get(name).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.values.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<'a> FromIterator<(&'a str, bool)> for OperationalSignals {
    fn from_iter<I: IntoIterator<Item = (&'a str, bool)>>(iter: I) -> Self {
        Self {
            values: iter
                .into_iter()
                .map(|(k, v)| (k.to_string(), v))
                .collect(),
        }
    }
}
