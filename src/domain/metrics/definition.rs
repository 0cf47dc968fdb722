use crate::domain::errors::DefinitionError;

/// Instrument kind, carrying the shape fixed at definition time.
#[derive(Debug, Clone, PartialEq)]
pub enum MetricKind {
    Counter,
    Gauge,
    /// Ascending, finite bucket upper bounds. `+Inf` is implicit.
    Histogram { buckets: Vec<f64> },
    /// Quantiles (0, 1) estimated from a bounded reservoir.
    Summary { quantiles: Vec<f64> },
}

impl MetricKind {
    pub fn histogram(buckets: &[f64]) -> Self {
        MetricKind::Histogram {
            buckets: buckets.to_vec(),
        }
    }

    pub fn summary(quantiles: &[f64]) -> Self {
        MetricKind::Summary {
            quantiles: quantiles.to_vec(),
        }
    }

    /// Lowercase name as used in `# TYPE` lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            MetricKind::Counter => "counter",
            MetricKind::Gauge => "gauge",
            MetricKind::Histogram { .. } => "histogram",
            MetricKind::Summary { .. } => "summary",
        }
    }
}

pub const DEFAULT_QUANTILES: &[f64] = &[0.5, 0.9, 0.99];

/// Immutable identity of a metric. Owned by the registry once defined.
#[derive(Debug, Clone, PartialEq)]
pub struct MetricDefinition {
    name: String,
    kind: MetricKind,
    help: String,
    label_names: Vec<String>,
}

impl MetricDefinition {
    /// Validate and build a definition.
    ///
    /// Label names keep their declared order for display; series identity is
    /// order-independent regardless.
    pub fn new(
        name: &str,
        kind: MetricKind,
        help: &str,
        label_names: &[&str],
    ) -> Result<Self, DefinitionError> {
        if !is_valid_metric_name(name) {
            return Err(DefinitionError::InvalidName {
                name: name.to_string(),
            });
        }

        let mut seen: Vec<&str> = Vec::with_capacity(label_names.len());
        for label in label_names {
            if !is_valid_label_name(label) {
                return Err(DefinitionError::InvalidLabelName {
                    metric: name.to_string(),
                    label: label.to_string(),
                });
            }
            if seen.contains(label) {
                return Err(DefinitionError::DuplicateLabelName {
                    metric: name.to_string(),
                    label: label.to_string(),
                });
            }
            seen.push(label);
        }

        match &kind {
            MetricKind::Histogram { buckets } => {
                reject_reserved(name, label_names, "le")?;
                validate_buckets(name, buckets)?;
            }
            MetricKind::Summary { quantiles } => {
                reject_reserved(name, label_names, "quantile")?;
                validate_quantiles(name, quantiles)?;
            }
            MetricKind::Counter | MetricKind::Gauge => {}
        }

        Ok(Self {
            name: name.to_string(),
            kind,
            help: help.to_string(),
            label_names: label_names.iter().map(|l| l.to_string()).collect(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &MetricKind {
        &self.kind
    }

    pub fn help(&self) -> &str {
        &self.help
    }

    pub fn label_names(&self) -> &[String] {
        &self.label_names
    }

    /// Same kind and same label schema (label order does not matter).
    pub fn is_compatible_with(&self, other: &MetricDefinition) -> bool {
        if self.kind != other.kind || self.label_names.len() != other.label_names.len() {
            return false;
        }
        let mut mine = self.label_names.clone();
        let mut theirs = other.label_names.clone();
        mine.sort();
        theirs.sort();
        mine == theirs
    }
}

fn reject_reserved(
    metric: &str,
    label_names: &[&str],
    reserved: &str,
) -> Result<(), DefinitionError> {
    if label_names.contains(&reserved) {
        return Err(DefinitionError::ReservedLabelName {
            metric: metric.to_string(),
            label: reserved.to_string(),
        });
    }
    Ok(())
}

fn validate_buckets(metric: &str, buckets: &[f64]) -> Result<(), DefinitionError> {
    let invalid = |reason: &str| DefinitionError::InvalidBuckets {
        metric: metric.to_string(),
        reason: reason.to_string(),
    };

    if buckets.is_empty() {
        return Err(invalid("at least one bucket is required"));
    }
    if buckets.iter().any(|b| !b.is_finite()) {
        return Err(invalid("bucket bounds must be finite"));
    }
    if buckets.windows(2).any(|w| w[0] >= w[1]) {
        return Err(invalid("bucket bounds must be strictly ascending"));
    }
    Ok(())
}

fn validate_quantiles(metric: &str, quantiles: &[f64]) -> Result<(), DefinitionError> {
    if let Some(q) = quantiles.iter().find(|q| !(**q > 0.0 && **q < 1.0)) {
        return Err(DefinitionError::InvalidQuantiles {
            metric: metric.to_string(),
            reason: format!("{} is outside (0, 1)", q),
        });
    }
    if quantiles.windows(2).any(|w| w[0] >= w[1]) {
        return Err(DefinitionError::InvalidQuantiles {
            metric: metric.to_string(),
            reason: "quantiles must be strictly ascending".to_string(),
        });
    }
    Ok(())
}

/// `[a-zA-Z_:][a-zA-Z0-9_:]*`
pub fn is_valid_metric_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' || c == ':' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == ':')
}

/// `[a-zA-Z_][a-zA-Z0-9_]*`, names starting with `__` are reserved.
pub fn is_valid_label_name(name: &str) -> bool {
    if name.starts_with("__") {
        return false;
    }
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_definition() {
        let def = MetricDefinition::new(
            "ml_predictions_total",
            MetricKind::Counter,
            "Total predictions",
            &["result", "channel"],
        )
        .expect("definition should be valid");

        assert_eq!(def.name(), "ml_predictions_total");
        assert_eq!(def.label_names(), &["result", "channel"]);
        assert_eq!(def.kind().as_str(), "counter");
    }

    #[test]
    fn test_rejects_invalid_names() {
        assert!(matches!(
            MetricDefinition::new("9lives", MetricKind::Gauge, "", &[]),
            Err(DefinitionError::InvalidName { .. })
        ));
        assert!(matches!(
            MetricDefinition::new("ok", MetricKind::Gauge, "", &["bad-label"]),
            Err(DefinitionError::InvalidLabelName { .. })
        ));
        assert!(matches!(
            MetricDefinition::new("ok", MetricKind::Gauge, "", &["a", "a"]),
            Err(DefinitionError::DuplicateLabelName { .. })
        ));
    }

    #[test]
    fn test_histogram_buckets_must_ascend() {
        let err = MetricDefinition::new("lat", MetricKind::histogram(&[0.5, 0.1]), "", &[])
            .unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidBuckets { .. }));

        let buckets = MetricKind::histogram(&[0.1, f64::INFINITY]);
        let err = MetricDefinition::new("lat", buckets, "", &[]).unwrap_err();
        assert!(matches!(err, DefinitionError::InvalidBuckets { .. }));
    }

    #[test]
    fn test_reserved_labels() {
        let err =
            MetricDefinition::new("lat", MetricKind::histogram(&[0.1]), "", &["le"]).unwrap_err();
        assert!(matches!(err, DefinitionError::ReservedLabelName { .. }));

        let err = MetricDefinition::new("lat", MetricKind::summary(&[0.5]), "", &["quantile"])
            .unwrap_err();
        assert!(matches!(err, DefinitionError::ReservedLabelName { .. }));
    }

    #[test]
    fn test_compatibility_ignores_label_order() {
        let a = MetricDefinition::new("m", MetricKind::Gauge, "a", &["x", "y"]).unwrap();
        let b = MetricDefinition::new("m", MetricKind::Gauge, "b", &["y", "x"]).unwrap();
        let c = MetricDefinition::new("m", MetricKind::Counter, "c", &["x", "y"]).unwrap();

        assert!(a.is_compatible_with(&b));
        assert!(!a.is_compatible_with(&c));
    }
}
