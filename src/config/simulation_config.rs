use super::{parse_bool, parse_or, parse_positive};
use anyhow::Result;
use std::time::Duration;

/// Metric-freshness simulator and simulated fraud model settings.
#[derive(Debug, Clone)]
pub struct SimulationEnvConfig {
    pub enabled: bool,
    pub interval_seconds: u64,
    pub fraud_threshold: f64,
    /// Fixed RNG seed for reproducible runs; entropy-seeded when unset.
    pub seed: Option<u64>,
}

impl Default for SimulationEnvConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            interval_seconds: 5,
            fraud_threshold: 0.7,
            seed: None,
        }
    }
}

impl SimulationEnvConfig {
    pub fn from_lookup(lookup: &impl Fn(&str) -> Option<String>) -> Result<Self> {
        let defaults = Self::default();

        let fraud_threshold = parse_or(lookup, "FRAUD_THRESHOLD", defaults.fraud_threshold)?;
        if !(0.0..=1.0).contains(&fraud_threshold) {
            anyhow::bail!("FRAUD_THRESHOLD must be within [0, 1], got {}", fraud_threshold);
        }

        let seed = match lookup("SIMULATION_SEED") {
            Some(_) => Some(parse_or(lookup, "SIMULATION_SEED", 0u64)?),
            None => None,
        };

        Ok(Self {
            enabled: parse_bool(lookup, "SIMULATION_ENABLED", defaults.enabled),
            interval_seconds: parse_positive(
                lookup,
                "SIMULATION_INTERVAL_SECONDS",
                defaults.interval_seconds,
            )?,
            fraud_threshold,
            seed,
        })
    }

    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_seconds)
    }
}
