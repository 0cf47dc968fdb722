//! HTTP surface and registry limits.
//!
//! The scrape, health and prediction endpoints share one listener.

use super::{parse_or, parse_positive, string_or};
use crate::domain::metrics::registry::{DEFAULT_MAX_SERIES_PER_METRIC, MAX_LABEL_VALUE_LEN};
use crate::domain::metrics::RegistryLimits;
use anyhow::Result;

#[derive(Debug, Clone)]
pub struct ObservabilityEnvConfig {
    pub port: u16,
    pub bind_address: String,
    pub max_series_per_metric: usize,
}

impl Default for ObservabilityEnvConfig {
    fn default() -> Self {
        Self {
            port: 8080,
            bind_address: "0.0.0.0".to_string(),
            max_series_per_metric: DEFAULT_MAX_SERIES_PER_METRIC,
        }
    }
}

impl ObservabilityEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();
        Ok(Self {
            port: parse_or(lookup, "PORT", defaults.port)?,
            bind_address: string_or(lookup, "BIND_ADDRESS", &defaults.bind_address),
            max_series_per_metric: parse_positive(
                lookup,
                "MAX_SERIES_PER_METRIC",
                defaults.max_series_per_metric as u64,
            )? as usize,
        })
    }

    pub fn socket_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }

    pub fn registry_limits(&self) -> RegistryLimits {
        RegistryLimits {
            max_series_per_metric: self.max_series_per_metric,
            max_label_value_len: MAX_LABEL_VALUE_LEN,
        }
    }
}
