use crate::domain::metrics::definition::MetricDefinition;
use crate::domain::metrics::label_set::LabelSet;
use crate::domain::metrics::series::SeriesValue;
use chrono::{DateTime, Utc};

/// One flattened exposition sample, e.g. `inference_latency_seconds_bucket{le="0.1"} 4`.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub name: String,
    pub labels: LabelSet,
    pub value: f64,
}

/// All series of one metric at snapshot time, sorted by series key.
#[derive(Debug, Clone)]
pub struct FamilySnapshot {
    pub definition: MetricDefinition,
    pub series: Vec<(LabelSet, SeriesValue)>,
}

impl FamilySnapshot {
    pub fn name(&self) -> &str {
        self.definition.name()
    }

    /// Flatten into exposition samples, in export order.
    pub fn samples(&self) -> Vec<Sample> {
        let name = self.definition.name();
        let mut samples = Vec::new();

        for (labels, value) in &self.series {
            match value {
                SeriesValue::Counter(v) | SeriesValue::Gauge(v) => samples.push(Sample {
                    name: name.to_string(),
                    labels: labels.clone(),
                    value: *v,
                }),
                SeriesValue::Histogram(h) => {
                    for (bound, count) in &h.buckets {
                        samples.push(Sample {
                            name: format!("{}_bucket", name),
                            labels: labels.with("le", format_value(*bound)),
                            value: *count as f64,
                        });
                    }
                    samples.push(Sample {
                        name: format!("{}_bucket", name),
                        labels: labels.with("le", "+Inf"),
                        value: h.count as f64,
                    });
                    samples.push(Sample {
                        name: format!("{}_sum", name),
                        labels: labels.clone(),
                        value: h.sum,
                    });
                    samples.push(Sample {
                        name: format!("{}_count", name),
                        labels: labels.clone(),
                        value: h.count as f64,
                    });
                }
                SeriesValue::Summary(s) => {
                    for (quantile, estimate) in &s.quantiles {
                        samples.push(Sample {
                            name: name.to_string(),
                            labels: labels.with("quantile", format_value(*quantile)),
                            value: *estimate,
                        });
                    }
                    samples.push(Sample {
                        name: format!("{}_sum", name),
                        labels: labels.clone(),
                        value: s.sum,
                    });
                    samples.push(Sample {
                        name: format!("{}_count", name),
                        labels: labels.clone(),
                        value: s.count as f64,
                    });
                }
            }
        }

        samples
    }
}

/// Immutable point-in-time copy of the registry, sorted by metric name.
#[derive(Debug, Clone)]
pub struct RegistrySnapshot {
    pub taken_at: DateTime<Utc>,
    pub families: Vec<FamilySnapshot>,
}

impl RegistrySnapshot {
    pub fn family(&self, name: &str) -> Option<&FamilySnapshot> {
        self.families.iter().find(|f| f.name() == name)
    }

    /// Value of the series `name{labels}`, labels given in any order.
    pub fn value<K, V>(&self, name: &str, labels: &[(K, V)]) -> Option<&SeriesValue>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let wanted = LabelSet::from_pairs(labels);
        self.family(name)?
            .series
            .iter()
            .find(|(labels, _)| *labels == wanted)
            .map(|(_, value)| value)
    }

    /// Scalar value of a counter or gauge series.
    pub fn scalar<K, V>(&self, name: &str, labels: &[(K, V)]) -> Option<f64>
    where
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.value(name, labels).and_then(SeriesValue::as_scalar)
    }

    pub fn series_count(&self) -> usize {
        self.families.iter().map(|f| f.series.len()).sum()
    }

    pub fn samples(&self) -> Vec<Sample> {
        self.families.iter().flat_map(FamilySnapshot::samples).collect()
    }
}

/// Exposition rendering of a sample value: `+Inf`, `-Inf`, `NaN`, otherwise the shortest
/// round-tripping decimal.
pub fn format_value(value: f64) -> String {
    if value.is_nan() {
        "NaN".to_string()
    } else if value == f64::INFINITY {
        "+Inf".to_string()
    } else if value == f64::NEG_INFINITY {
        "-Inf".to_string()
    } else {
        value.to_string()
    }
}
