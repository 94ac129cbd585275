//! # markgen-metrics: Resource State Metrics
//!
//! Turns `metrics:*` markers on resource roots into a
//! `CustomResourceStateMetrics` document: one entry per resource with its
//! group/version/kind, optional name prefix, and gauge, info, or state-set
//! metrics.
//!
//! Field markers infer their path from serialization keys; declaration
//! markers give it with `JSONPath`. A metric name repeated within one
//! resource is a Semantic diagnostic and the later metric is dropped.

pub mod collect;
pub mod config;
pub mod markers;

pub use collect::{collect, MetricsError, DEFAULT_STATE_LABEL};
pub use config::{
    GaugeSpec, GroupVersionKind, InfoSpec, Metric, MetricEach, MetricsConfig, ResourceMetrics,
    StateSetSpec, METRICS_KIND,
};
pub use markers::MetricsMarkers;
