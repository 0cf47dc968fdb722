//! Compliance cycle scheduling configuration.

use super::parse_positive;
use anyhow::Result;
use std::time::Duration;

#[derive(Debug, Clone)]
pub struct ComplianceEnvConfig {
    pub eval_interval_seconds: u64,
    pub check_timeout_ms: u64,
    pub shutdown_grace_ms: u64,
}

impl Default for ComplianceEnvConfig {
    fn default() -> Self {
        Self {
            eval_interval_seconds: 86400, // daily
            check_timeout_ms: 5000,
            shutdown_grace_ms: 10000,
        }
    }
}

impl ComplianceEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            eval_interval_seconds: parse_positive(
                lookup,
                "EVAL_INTERVAL_SECONDS",
                defaults.eval_interval_seconds,
            )?,
            check_timeout_ms: parse_positive(
                lookup,
                "CHECK_TIMEOUT_MS",
                defaults.check_timeout_ms,
            )?,
            shutdown_grace_ms: parse_positive(
                lookup,
                "SHUTDOWN_GRACE_MS",
                defaults.shutdown_grace_ms,
            )?,
        })
    }

    pub fn eval_interval(&self) -> Duration {
        Duration::from_secs(self.eval_interval_seconds)
    }

    pub fn check_timeout(&self) -> Duration {
        Duration::from_millis(self.check_timeout_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_millis(self.shutdown_grace_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::lookup_from;

    #[test]
    fn test_compliance_config_overrides() {
        let config = ComplianceEnvConfig::from_lookup(&lookup_from(&[
            ("EVAL_INTERVAL_SECONDS", "3600"),
            ("CHECK_TIMEOUT_MS", "750"),
        ]))
        .unwrap();

        assert_eq!(config.eval_interval(), Duration::from_secs(3600));
        assert_eq!(config.check_timeout(), Duration::from_millis(750));
        assert_eq!(config.shutdown_grace(), Duration::from_secs(10));
    }

    #[test]
    fn test_zero_check_timeout_rejected() {
        assert!(
            ComplianceEnvConfig::from_lookup(&lookup_from(&[("CHECK_TIMEOUT_MS", "0")])).is_err()
        );
    }
}
