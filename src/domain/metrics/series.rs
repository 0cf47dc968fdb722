//! Mutable per-series state for each instrument kind.

use crate::domain::errors::ObservationError;
use crate::domain::metrics::definition::{MetricDefinition, MetricKind};
use rand::Rng;

/// Maximum number of samples a summary keeps for quantile estimation.
pub const SUMMARY_RESERVOIR_CAPACITY: usize = 1024;

/// A single mutation applied to a series.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Observation {
    /// Counter increment, delta must be >= 0.
    Increment(f64),
    /// Gauge absolute set.
    Set(f64),
    /// Gauge relative change.
    Add(f64),
    /// Histogram or summary sample.
    Observe(f64),
}

impl Observation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Observation::Increment(_) => "increment",
            Observation::Set(_) => "set",
            Observation::Add(_) => "add",
            Observation::Observe(_) => "observe",
        }
    }

    /// Checks the operation against the definition before any series is touched.
    pub fn validate(&self, definition: &MetricDefinition) -> Result<(), ObservationError> {
        let name = definition.name();
        let unsupported = || ObservationError::UnsupportedOperation {
            name: name.to_string(),
            kind: definition.kind().as_str(),
            operation: self.as_str(),
        };

        match (definition.kind(), *self) {
            (MetricKind::Counter, Observation::Increment(delta)) => {
                if delta.is_finite() && delta >= 0.0 {
                    Ok(())
                } else {
                    Err(ObservationError::InvalidDelta {
                        name: name.to_string(),
                        delta,
                    })
                }
            }
            (MetricKind::Gauge, Observation::Set(value) | Observation::Add(value)) => {
                if value.is_nan() {
                    Err(ObservationError::NonFiniteValue {
                        name: name.to_string(),
                        value,
                    })
                } else {
                    Ok(())
                }
            }
            (
                MetricKind::Histogram { .. } | MetricKind::Summary { .. },
                Observation::Observe(value),
            ) => {
                if value.is_finite() {
                    Ok(())
                } else {
                    Err(ObservationError::NonFiniteValue {
                        name: name.to_string(),
                        value,
                    })
                }
            }
            _ => Err(unsupported()),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HistogramState {
    bounds: Vec<f64>,
    /// Cumulative counts aligned with `bounds`.
    cumulative: Vec<u64>,
    count: u64,
    sum: f64,
}

impl HistogramState {
    pub fn new(bounds: &[f64]) -> Self {
        Self {
            bounds: bounds.to_vec(),
            cumulative: vec![0; bounds.len()],
            count: 0,
            sum: 0.0,
        }
    }

    /// Record one sample. A sample that would push the sum past `f64` range is
    /// refused with the would-be sum and leaves the state untouched.
    pub fn observe(&mut self, value: f64) -> Result<(), f64> {
        let sum = finite_sum(self.sum, value)?;
        // First bound >= value; ties land in the inclusive bound.
        let first = self.bounds.partition_point(|bound| *bound < value);
        for count in &mut self.cumulative[first..] {
            *count += 1;
        }
        self.count += 1;
        self.sum = sum;
        Ok(())
    }

    pub fn value(&self) -> HistogramValue {
        HistogramValue {
            buckets: self
                .bounds
                .iter()
                .copied()
                .zip(self.cumulative.iter().copied())
                .collect(),
            count: self.count,
            sum: self.sum,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SummaryState {
    quantiles: Vec<f64>,
    reservoir: Vec<f64>,
    count: u64,
    sum: f64,
}

impl SummaryState {
    pub fn new(quantiles: &[f64]) -> Self {
        Self {
            quantiles: quantiles.to_vec(),
            reservoir: Vec::new(),
            count: 0,
            sum: 0.0,
        }
    }

    /// Same overflow contract as [`HistogramState::observe`].
    pub fn observe(&mut self, value: f64) -> Result<(), f64> {
        self.sum = finite_sum(self.sum, value)?;
        self.count += 1;

        // Algorithm R: every sample seen so far has equal probability of being kept.
        if self.reservoir.len() < SUMMARY_RESERVOIR_CAPACITY {
            self.reservoir.push(value);
        } else {
            let slot = rand::rng().random_range(0..self.count);
            if let Ok(slot) = usize::try_from(slot) {
                if slot < SUMMARY_RESERVOIR_CAPACITY {
                    self.reservoir[slot] = value;
                }
            }
        }
        Ok(())
    }

    pub fn value(&self) -> SummaryValue {
        let mut sorted = self.reservoir.clone();
        sorted.sort_by(f64::total_cmp);

        let quantiles = self
            .quantiles
            .iter()
            .map(|q| (*q, nearest_rank(&sorted, *q)))
            .collect();

        SummaryValue {
            quantiles,
            count: self.count,
            sum: self.sum,
        }
    }

    pub fn reservoir_len(&self) -> usize {
        self.reservoir.len()
    }
}

fn finite_sum(current: f64, delta: f64) -> Result<f64, f64> {
    let next = current + delta;
    if next.is_finite() {
        Ok(next)
    } else {
        Err(next)
    }
}

fn nearest_rank(sorted: &[f64], q: f64) -> f64 {
    if sorted.is_empty() {
        return f64::NAN;
    }
    let rank = (q * sorted.len() as f64).ceil() as usize;
    sorted[rank.saturating_sub(1).min(sorted.len() - 1)]
}

/// Why [`SeriesState::apply`] refused an observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ApplyError {
    KindMismatch,
    /// The accumulated value (counter, gauge or sum) would leave `f64` range.
    NonFiniteResult(f64),
}

/// Live state of one series, guarded by its own lock inside the registry.
#[derive(Debug, Clone)]
pub enum SeriesState {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramState),
    Summary(SummaryState),
}

impl SeriesState {
    pub fn new(kind: &MetricKind) -> Self {
        match kind {
            MetricKind::Counter => SeriesState::Counter(0.0),
            MetricKind::Gauge => SeriesState::Gauge(0.0),
            MetricKind::Histogram { buckets } => {
                SeriesState::Histogram(HistogramState::new(buckets))
            }
            MetricKind::Summary { quantiles } => {
                SeriesState::Summary(SummaryState::new(quantiles))
            }
        }
    }

    /// Apply an observation already checked by [`Observation::validate`].
    /// The state is untouched on any error.
    pub fn apply(&mut self, observation: Observation) -> Result<(), ApplyError> {
        match (self, observation) {
            (SeriesState::Counter(value), Observation::Increment(delta)) if delta >= 0.0 => {
                *value = finite_sum(*value, delta).map_err(ApplyError::NonFiniteResult)?;
            }
            (SeriesState::Gauge(value), Observation::Set(new_value)) => *value = new_value,
            (SeriesState::Gauge(value), Observation::Add(delta)) => {
                *value = finite_sum(*value, delta).map_err(ApplyError::NonFiniteResult)?;
            }
            (SeriesState::Histogram(state), Observation::Observe(sample)) => {
                state.observe(sample).map_err(ApplyError::NonFiniteResult)?;
            }
            (SeriesState::Summary(state), Observation::Observe(sample)) => {
                state.observe(sample).map_err(ApplyError::NonFiniteResult)?;
            }
            _ => return Err(ApplyError::KindMismatch),
        }
        Ok(())
    }

    pub fn value(&self) -> SeriesValue {
        match self {
            SeriesState::Counter(v) => SeriesValue::Counter(*v),
            SeriesState::Gauge(v) => SeriesValue::Gauge(*v),
            SeriesState::Histogram(state) => SeriesValue::Histogram(state.value()),
            SeriesState::Summary(state) => SeriesValue::Summary(state.value()),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct HistogramValue {
    /// `(upper bound, cumulative count)` pairs, ascending. `+Inf` equals `count`.
    pub buckets: Vec<(f64, u64)>,
    pub count: u64,
    pub sum: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SummaryValue {
    /// `(quantile, estimate)`; the estimate is NaN until the first observation.
    pub quantiles: Vec<(f64, f64)>,
    pub count: u64,
    pub sum: f64,
}

/// Point-in-time copy of one series.
#[derive(Debug, Clone, PartialEq)]
pub enum SeriesValue {
    Counter(f64),
    Gauge(f64),
    Histogram(HistogramValue),
    Summary(SummaryValue),
}

impl SeriesValue {
    /// Scalar value for counters and gauges.
    pub fn as_scalar(&self) -> Option<f64> {
        match self {
            SeriesValue::Counter(v) | SeriesValue::Gauge(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_histogram(&self) -> Option<&HistogramValue> {
        match self {
            SeriesValue::Histogram(h) => Some(h),
            _ => None,
        }
    }

    pub fn as_summary(&self) -> Option<&SummaryValue> {
        match self {
            SeriesValue::Summary(s) => Some(s),
            _ => None,
        }
    }
}
