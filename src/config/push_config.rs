//! Push gateway delivery configuration.

use super::{parse_bool, parse_or, parse_positive, string_or};
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct PushEnvConfig {
    pub enabled: bool,
    /// Collector address, scheme optional (`host:port` means plain HTTP).
    pub gateway_url: String,
    pub job_name: String,
    pub timeout_ms: u64,
    pub max_retries: u32,
}

impl Default for PushEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            gateway_url: "prometheus-pushgateway:9091".to_string(),
            job_name: "compliance_evaluator".to_string(),
            timeout_ms: 5000,
            max_retries: 2,
        }
    }
}

impl PushEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            enabled: parse_bool(lookup, "PUSH_ENABLED", defaults.enabled),
            gateway_url: string_or(lookup, "PUSH_GATEWAY_URL", &defaults.gateway_url),
            job_name: string_or(lookup, "PUSH_JOB_NAME", &defaults.job_name),
            timeout_ms: parse_positive(lookup, "PUSH_TIMEOUT_MS", defaults.timeout_ms)?,
            max_retries: parse_or(lookup, "PUSH_MAX_RETRIES", defaults.max_retries)?,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;

    #[test]
    fn test_push_config_overrides() {
        let config = PushEnvConfig::from_lookup(&lookup_from(&[
            ("PUSH_GATEWAY_URL", "http://gw:9091"),
            ("PUSH_JOB_NAME", "evaluator-eu"),
            ("PUSH_ENABLED", "false"),
            ("PUSH_TIMEOUT_MS", "250"),
        ]))
        .unwrap();

        assert!(!config.enabled);
        assert_eq!(config.gateway_url, "http://gw:9091");
        assert_eq!(config.job_name, "evaluator-eu");
        assert_eq!(config.timeout(), Duration::from_millis(250));
        assert_eq!(config.max_retries, 2);
    }
}
