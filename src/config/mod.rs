//! Configuration module for the fraud-signal service.
//!
//! Structured configuration loading from environment variables, organized by
//! concern: push delivery, compliance scheduling, simulation and the HTTP surface.
//! Every loader has a `from_lookup` form so tests never touch the process env.

mod compliance_config;
mod observability_config;
mod push_config;
mod simulation_config;

pub use compliance_config::ComplianceEnvConfig;
pub use observability_config::ObservabilityEnvConfig;
pub use push_config::PushEnvConfig;
pub use simulation_config::SimulationEnvConfig;

use anyhow::{Context, Result};
use std::env;
use std::str::FromStr;

/// Main application configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub push: PushEnvConfig,
    pub compliance: ComplianceEnvConfig,
    pub simulation: SimulationEnvConfig,
    pub observability: ObservabilityEnvConfig,
}

impl Config {
    /// Load configuration from environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        Ok(Self {
            push: PushEnvConfig::from_lookup(&lookup).context("Failed to load push config")?,
            compliance: ComplianceEnvConfig::from_lookup(&lookup)
                .context("Failed to load compliance config")?,
            simulation: SimulationEnvConfig::from_lookup(&lookup)
                .context("Failed to load simulation config")?,
            observability: ObservabilityEnvConfig::from_lookup(&lookup)
                .context("Failed to load observability config")?,
        })
    }
}

/// Value of `key`, or `None` when unset or blank.
fn lookup_trimmed(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
    lookup(key)
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_or<T>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    match lookup_trimmed(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .with_context(|| format!("Failed to parse {}={:?}", key, raw)),
        None => Ok(default),
    }
}

/// Positive integer; zero is a configuration error.
fn parse_positive(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: u64,
) -> Result<u64> {
    let value = parse_or(lookup, key, default)?;
    if value == 0 {
        anyhow::bail!("{} must be greater than zero", key);
    }
    Ok(value)
}

fn parse_bool(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: bool) -> bool {
    match lookup_trimmed(lookup, key).map(|v| v.to_ascii_lowercase()).as_deref() {
        Some("true") | Some("1") | Some("yes") | Some("on") => true,
        Some("false") | Some("0") | Some("no") | Some("off") => false,
        _ => default,
    }
}

fn string_or(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: &str) -> String {
    lookup_trimmed(lookup, key).unwrap_or_else(|| default.to_string())
}

#[cfg(test)]
pub(crate) fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: std::collections::HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key| map.get(key).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_defaults() {
        let config = Config::from_lookup(lookup_from(&[])).expect("Should parse with defaults");
        assert_eq!(config.push.gateway_url, "prometheus-pushgateway:9091");
        assert_eq!(config.push.job_name, "compliance_evaluator");
        assert_eq!(config.observability.port, 8080);
        assert_eq!(config.compliance.eval_interval_seconds, 86400);
        assert!(config.simulation.enabled);
    }

    #[test]
    fn test_malformed_number_fails_with_key_in_message() {
        let err = Config::from_lookup(lookup_from(&[("PORT", "eighty")])).unwrap_err();
        assert!(format!("{:#}", err).contains("PORT"));
    }

    #[test]
    fn test_zero_interval_is_rejected() {
        let err = Config::from_lookup(lookup_from(&[("EVAL_INTERVAL_SECONDS", "0")])).unwrap_err();
        assert!(format!("{:#}", err).contains("EVAL_INTERVAL_SECONDS"));
    }

    #[test]
    fn test_bool_parsing_is_lenient() {
        let lookup = lookup_from(&[("A", "1"), ("B", "OFF"), ("C", "maybe")]);
        assert!(parse_bool(&lookup, "A", false));
        assert!(!parse_bool(&lookup, "B", true));
        assert!(parse_bool(&lookup, "C", true));
        assert!(!parse_bool(&lookup, "MISSING", false));
    }

    #[test]
    fn test_blank_values_use_default() {
        let lookup = lookup_from(&[("PUSH_JOB_NAME", "   ")]);
        assert_eq!(string_or(&lookup, "PUSH_JOB_NAME", "fallback"), "fallback");
    }
}
