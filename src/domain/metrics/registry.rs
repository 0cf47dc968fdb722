//! Thread-safe metric registry.
//!
//! Locking layout: one `RwLock` over the family map (held only to resolve a name),
//! one `RwLock` per family over its series map (held only to resolve or insert a
//! series), and one `Mutex` per series (held for the duration of a single mutation or
//! copy). No lock is ever held across I/O or serialization.

use crate::domain::errors::{DefinitionError, ObservationError};
use crate::domain::metrics::definition::{MetricDefinition, MetricKind};
use crate::domain::metrics::label_set::LabelSet;
use crate::domain::metrics::series::{ApplyError, Observation, SeriesState, SeriesValue};
use crate::domain::metrics::snapshot::{FamilySnapshot, RegistrySnapshot};
use chrono::Utc;
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};

pub const DEFAULT_MAX_SERIES_PER_METRIC: usize = 1000;
pub const MAX_LABEL_VALUE_LEN: usize = 64;

/// Cardinality guards applied on every observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryLimits {
    pub max_series_per_metric: usize,
    pub max_label_value_len: usize,
}

impl Default for RegistryLimits {
    fn default() -> Self {
        Self {
            max_series_per_metric: DEFAULT_MAX_SERIES_PER_METRIC,
            max_label_value_len: MAX_LABEL_VALUE_LEN,
        }
    }
}

type SeriesHandle = Arc<Mutex<SeriesState>>;

struct Family {
    definition: MetricDefinition,
    series: RwLock<HashMap<LabelSet, SeriesHandle>>,
}

/// Owns every metric definition and series of the process.
pub struct MetricRegistry {
    families: RwLock<BTreeMap<String, Arc<Family>>>,
    limits: RegistryLimits,
}

impl MetricRegistry {
    pub fn new() -> Self {
        Self::with_limits(RegistryLimits::default())
    }

    pub fn with_limits(limits: RegistryLimits) -> Self {
        Self {
            families: RwLock::new(BTreeMap::new()),
            limits,
        }
    }

    pub fn limits(&self) -> RegistryLimits {
        self.limits
    }

    /// Register a metric. Defining the same name again with an identical kind and label
    /// schema returns the existing definition.
    pub fn define(
        &self,
        name: &str,
        kind: MetricKind,
        help: &str,
        label_names: &[&str],
    ) -> Result<MetricDefinition, DefinitionError> {
        let definition = MetricDefinition::new(name, kind, help, label_names)?;

        let mut families = self.families.write();
        if let Some(existing) = families.get(name) {
            if existing.definition.is_compatible_with(&definition) {
                return Ok(existing.definition.clone());
            }
            return Err(DefinitionError::Duplicate {
                name: name.to_string(),
            });
        }

        debug!("MetricRegistry: defined {} ({})", name, definition.kind().as_str());
        families.insert(
            name.to_string(),
            Arc::new(Family {
                definition: definition.clone(),
                series: RwLock::new(HashMap::new()),
            }),
        );
        Ok(definition)
    }

    pub fn definition(&self, name: &str) -> Option<MetricDefinition> {
        self.families
            .read()
            .get(name)
            .map(|family| family.definition.clone())
    }

    pub fn definitions(&self) -> Vec<MetricDefinition> {
        self.families
            .read()
            .values()
            .map(|family| family.definition.clone())
            .collect()
    }

    /// Apply `observation` to the series `name{labels}`, creating the series on first use.
    ///
    /// Every check runs before the series is resolved, so a rejected observation never
    /// creates or modifies a series.
    pub fn observe<K, V>(
        &self,
        name: &str,
        labels: &[(K, V)],
        observation: Observation,
    ) -> Result<(), ObservationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let family = self.family(name)?;
        let label_set = self.validate_labels(&family.definition, labels)?;
        observation.validate(&family.definition)?;

        let series = self.resolve_series(&family, label_set)?;
        let applied = series.lock().apply(observation);
        applied.map_err(|e| match e {
            ApplyError::KindMismatch => ObservationError::UnsupportedOperation {
                name: name.to_string(),
                kind: family.definition.kind().as_str(),
                operation: observation.as_str(),
            },
            ApplyError::NonFiniteResult(value) => ObservationError::NonFiniteValue {
                name: name.to_string(),
                value,
            },
        })
    }

    /// Current value of one series, read under that series' lock.
    pub fn get<K, V>(&self, name: &str, labels: &[(K, V)]) -> Option<SeriesValue>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let family = self.families.read().get(name).cloned()?;
        let wanted = LabelSet::from_pairs(labels);
        let handle = family.series.read().get(&wanted).cloned()?;
        let value = handle.lock().value();
        Some(value)
    }

    /// Consistent copy of every series.
    ///
    /// Each series is copied atomically; series are not mutually consistent with each
    /// other (no cross-series ordering is promised).
    pub fn snapshot(&self) -> RegistrySnapshot {
        let families: Vec<Arc<Family>> = self.families.read().values().cloned().collect();

        let families = families
            .into_iter()
            .map(|family| {
                let handles: Vec<(LabelSet, SeriesHandle)> = family
                    .series
                    .read()
                    .iter()
                    .map(|(labels, handle)| (labels.clone(), handle.clone()))
                    .collect();

                let mut series: Vec<(LabelSet, SeriesValue)> = handles
                    .into_iter()
                    .map(|(labels, handle)| {
                        let value = handle.lock().value();
                        (labels, value)
                    })
                    .collect();
                series.sort_by_cached_key(|(labels, _)| labels.series_key());

                FamilySnapshot {
                    definition: family.definition.clone(),
                    series,
                }
            })
            .collect();

        RegistrySnapshot {
            taken_at: Utc::now(),
            families,
        }
    }

    pub fn series_count(&self) -> usize {
        self.families
            .read()
            .values()
            .map(|family| family.series.read().len())
            .sum()
    }

    fn family(&self, name: &str) -> Result<Arc<Family>, ObservationError> {
        self.families
            .read()
            .get(name)
            .cloned()
            .ok_or_else(|| ObservationError::UnknownMetric {
                name: name.to_string(),
            })
    }

    fn validate_labels<K, V>(
        &self,
        definition: &MetricDefinition,
        labels: &[(K, V)],
    ) -> Result<LabelSet, ObservationError>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let label_set = LabelSet::from_pairs(labels);

        let mut expected: Vec<String> = definition.label_names().to_vec();
        expected.sort();
        let got: Vec<String> = labels.iter().map(|(k, _)| k.as_ref().to_string()).collect();
        let mut got_sorted = got.clone();
        got_sorted.sort();

        if expected != got_sorted {
            return Err(ObservationError::LabelMismatch {
                name: definition.name().to_string(),
                expected,
                got,
            });
        }

        if let Some((label, _)) = label_set
            .iter()
            .find(|(_, value)| value.len() > self.limits.max_label_value_len)
        {
            return Err(ObservationError::LabelValueTooLong {
                name: definition.name().to_string(),
                label: label.to_string(),
                max_len: self.limits.max_label_value_len,
            });
        }

        Ok(label_set)
    }

    fn resolve_series(
        &self,
        family: &Family,
        labels: LabelSet,
    ) -> Result<SeriesHandle, ObservationError> {
        if let Some(handle) = family.series.read().get(&labels) {
            return Ok(handle.clone());
        }

        let mut series = family.series.write();
        // Another observer may have inserted it between the two locks.
        if let Some(handle) = series.get(&labels) {
            return Ok(handle.clone());
        }
        if series.len() >= self.limits.max_series_per_metric {
            warn!(
                "MetricRegistry: cardinality limit reached for {} ({} series), rejecting {}",
                family.definition.name(),
                series.len(),
                labels
            );
            return Err(ObservationError::CardinalityExceeded {
                name: family.definition.name().to_string(),
                limit: self.limits.max_series_per_metric,
            });
        }

        let handle = Arc::new(Mutex::new(SeriesState::new(family.definition.kind())));
        series.insert(labels, handle.clone());
        Ok(handle)
    }
}

impl Default for MetricRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const NO_LABELS: &[(&str, &str)] = &[];

    fn registry_with_predictions() -> MetricRegistry {
        let registry = MetricRegistry::new();
        registry
            .define(
                "ml_predictions_total",
                MetricKind::Counter,
                "Total predictions",
                &["result", "channel"],
            )
            .expect("definition should succeed");
        registry
    }

    #[test]
    fn test_define_is_idempotent_for_identical_schema() {
        let registry = registry_with_predictions();
        let again = registry.define(
            "ml_predictions_total",
            MetricKind::Counter,
            "Total predictions",
            &["channel", "result"],
        );
        assert!(again.is_ok());
        assert_eq!(registry.definitions().len(), 1);
    }

    #[test]
    fn test_define_conflict_is_rejected() {
        let registry = registry_with_predictions();

        let other_kind = registry.define(
            "ml_predictions_total",
            MetricKind::Gauge,
            "",
            &["result", "channel"],
        );
        assert_eq!(
            other_kind,
            Err(DefinitionError::Duplicate {
                name: "ml_predictions_total".to_string()
            })
        );

        let other_labels =
            registry.define("ml_predictions_total", MetricKind::Counter, "", &["result"]);
        assert!(matches!(other_labels, Err(DefinitionError::Duplicate { .. })));
    }

    #[test]
    fn test_label_permutations_resolve_to_same_series() {
        let registry = registry_with_predictions();
        registry
            .observe(
                "ml_predictions_total",
                &[("result", "fraud"), ("channel", "PIX")],
                Observation::Increment(1.0),
            )
            .unwrap();
        registry
            .observe(
                "ml_predictions_total",
                &[("channel", "PIX"), ("result", "fraud")],
                Observation::Increment(2.0),
            )
            .unwrap();

        assert_eq!(registry.series_count(), 1);
        let snapshot = registry.snapshot();
        assert_eq!(
            snapshot.scalar("ml_predictions_total", &[("result", "fraud"), ("channel", "PIX")]),
            Some(3.0)
        );
    }

    #[test]
    fn test_unknown_metric_and_label_mismatch() {
        let registry = registry_with_predictions();

        assert_eq!(
            registry.observe("nope", NO_LABELS, Observation::Increment(1.0)),
            Err(ObservationError::UnknownMetric {
                name: "nope".to_string()
            })
        );
        assert!(matches!(
            registry.observe(
                "ml_predictions_total",
                &[("result", "fraud")],
                Observation::Increment(1.0)
            ),
            Err(ObservationError::LabelMismatch { .. })
        ));
        assert!(matches!(
            registry.observe(
                "ml_predictions_total",
                &[("result", "fraud"), ("channel", "PIX"), ("user_id", "42")],
                Observation::Increment(1.0)
            ),
            Err(ObservationError::LabelMismatch { .. })
        ));
        assert!(matches!(
            registry.observe(
                "ml_predictions_total",
                &[("result", "fraud"), ("result", "legitimate")],
                Observation::Increment(1.0)
            ),
            Err(ObservationError::LabelMismatch { .. })
        ));
        assert_eq!(registry.series_count(), 0);
    }

    #[test]
    fn test_negative_delta_leaves_series_unchanged() {
        let registry = registry_with_predictions();
        let labels = [("result", "fraud"), ("channel", "PIX")];

        registry
            .observe("ml_predictions_total", &labels, Observation::Increment(4.0))
            .unwrap();
        let err = registry
            .observe("ml_predictions_total", &labels, Observation::Increment(-1.0))
            .unwrap_err();

        assert!(matches!(err, ObservationError::InvalidDelta { .. }));
        assert_eq!(
            registry.get("ml_predictions_total", &labels),
            Some(SeriesValue::Counter(4.0))
        );
    }

    #[test]
    fn test_rejected_observation_does_not_create_series() {
        let registry = registry_with_predictions();
        let _ = registry.observe(
            "ml_predictions_total",
            &[("result", "fraud"), ("channel", "PIX")],
            Observation::Increment(-5.0),
        );
        assert_eq!(registry.series_count(), 0);
    }

    #[test]
    fn test_gauge_set_and_add() {
        let registry = MetricRegistry::new();
        registry
            .define("model_precision", MetricKind::Gauge, "Precision", &[])
            .unwrap();

        registry
            .observe("model_precision", NO_LABELS, Observation::Set(0.94))
            .unwrap();
        registry
            .observe("model_precision", NO_LABELS, Observation::Add(-0.04))
            .unwrap();

        let value = registry
            .get("model_precision", NO_LABELS)
            .and_then(|v| v.as_scalar())
            .unwrap();
        assert!((value - 0.90).abs() < 1e-9);
    }

    #[test]
    fn test_cardinality_limit() {
        let registry = MetricRegistry::with_limits(RegistryLimits {
            max_series_per_metric: 2,
            max_label_value_len: 8,
        });
        registry
            .define("dict_lookups_total", MetricKind::Counter, "", &["result"])
            .unwrap();

        for result in ["hit", "miss"] {
            registry
                .observe(
                    "dict_lookups_total",
                    &[("result", result)],
                    Observation::Increment(1.0),
                )
                .unwrap();
        }
        assert!(matches!(
            registry.observe(
                "dict_lookups_total",
                &[("result", "error")],
                Observation::Increment(1.0)
            ),
            Err(ObservationError::CardinalityExceeded { limit: 2, .. })
        ));
        // Existing series keep accepting observations.
        assert!(
            registry
                .observe(
                    "dict_lookups_total",
                    &[("result", "hit")],
                    Observation::Increment(1.0)
                )
                .is_ok()
        );
        assert!(matches!(
            registry.observe(
                "dict_lookups_total",
                &[("result", "much-too-long")],
                Observation::Increment(1.0)
            ),
            Err(ObservationError::LabelValueTooLong { .. })
        ));
    }

    #[test]
    fn test_snapshot_is_sorted() {
        let registry = MetricRegistry::new();
        registry.define("zeta", MetricKind::Gauge, "", &["k"]).unwrap();
        registry.define("alpha", MetricKind::Gauge, "", &["k"]).unwrap();
        for k in ["b", "a", "c"] {
            registry.observe("zeta", &[("k", k)], Observation::Set(1.0)).unwrap();
        }

        let snapshot = registry.snapshot();
        let names: Vec<&str> = snapshot.families.iter().map(|f| f.name()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);

        let keys: Vec<String> = snapshot.families[1]
            .series
            .iter()
            .map(|(labels, _)| labels.series_key())
            .collect();
        assert_eq!(keys, vec!["k=a", "k=b", "k=c"]);
    }

    #[test]
    fn test_snapshot_is_detached_from_later_mutation() {
        let registry = MetricRegistry::new();
        registry.define("uptime_seconds", MetricKind::Gauge, "", &[]).unwrap();
        registry
            .observe("uptime_seconds", NO_LABELS, Observation::Set(10.0))
            .unwrap();

        let snapshot = registry.snapshot();
        registry
            .observe("uptime_seconds", NO_LABELS, Observation::Set(20.0))
            .unwrap();

        assert_eq!(snapshot.scalar("uptime_seconds", NO_LABELS), Some(10.0));
    }

    #[test]
    fn test_summary_sum_overflow_is_rejected() {
        let registry = MetricRegistry::new();
        registry
            .define("payload_bytes", MetricKind::summary(&[0.5]), "Payload size", &[])
            .unwrap();

        registry
            .observe("payload_bytes", NO_LABELS, Observation::Observe(f64::MAX))
            .unwrap();
        let err = registry
            .observe("payload_bytes", NO_LABELS, Observation::Observe(f64::MAX))
            .unwrap_err();
        assert!(matches!(err, ObservationError::NonFiniteValue { .. }));

        let value = registry.get("payload_bytes", NO_LABELS).unwrap();
        let summary = value.as_summary().unwrap();
        assert_eq!(summary.count, 1);
        assert!(summary.sum.is_finite());
    }

    #[test]
    fn test_histogram_sum_overflow_keeps_export_parseable() {
        let registry = MetricRegistry::new();
        registry
            .define("amount_brl", MetricKind::histogram(&[100.0]), "Amounts", &[])
            .unwrap();
        for _ in 0..3 {
            let _ = registry.observe("amount_brl", NO_LABELS, Observation::Observe(f64::MAX));
        }

        let value = registry.get("amount_brl", NO_LABELS).unwrap();
        let histogram = value.as_histogram().unwrap();
        assert_eq!(histogram.count, 1);
        assert!(histogram.sum.is_finite());
    }
}
