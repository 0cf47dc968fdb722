//! Time-series metric model: definitions, label identity, series state and the registry.

pub mod definition;
pub mod label_set;
pub mod registry;
pub mod series;
pub mod snapshot;

pub use definition::{MetricDefinition, MetricKind};
pub use label_set::LabelSet;
pub use registry::{MetricRegistry, RegistryLimits};
pub use series::{Observation, SeriesValue};
pub use snapshot::{RegistrySnapshot, Sample};
