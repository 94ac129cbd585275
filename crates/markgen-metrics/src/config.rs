//! The `CustomResourceStateMetrics` document.

use serde::{Deserialize, Serialize};

pub const METRICS_KIND: &str = "CustomResourceStateMetrics";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupVersionKind {
    pub group: String,
    pub version: String,
    pub kind: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GaugeSpec {
    pub path: Vec<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub nil_is_zero: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoSpec {
    pub path: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StateSetSpec {
    pub path: Vec<String>,
    pub list: Vec<String>,
    pub label_name: String,
}

/// What one metric reports, tagged by `type`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MetricEach {
    Gauge { gauge: GaugeSpec },
    Info { info: InfoSpec },
    StateSet {
        #[serde(rename = "stateSet")]
        state_set: StateSetSpec,
    },
}

impl MetricEach {
    pub fn path(&self) -> &[String] {
        match self {
            Self::Gauge { gauge } => &gauge.path,
            Self::Info { info } => &info.path,
            Self::StateSet { state_set } => &state_set.path,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metric {
    pub name: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub help: String,
    pub each: MetricEach,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceMetrics {
    pub group_version_kind: GroupVersionKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_name_prefix: Option<String>,
    pub metrics: Vec<Metric>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsSpec {
    pub resources: Vec<ResourceMetrics>,
}

/// Top-level metrics configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetricsConfig {
    pub kind: String,
    pub spec: MetricsSpec,
}

impl MetricsConfig {
    pub fn new(resources: Vec<ResourceMetrics>) -> Self {
        Self {
            kind: METRICS_KIND.to_string(),
            spec: MetricsSpec { resources },
        }
    }

    pub fn is_empty(&self) -> bool {
        self.spec.resources.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_each_is_tagged_by_type() {
        let metric = Metric {
            name: "phase".into(),
            help: String::new(),
            each: MetricEach::StateSet {
                state_set: StateSetSpec {
                    path: vec!["status".into(), "phase".into()],
                    list: vec!["Ready".into(), "Failed".into()],
                    label_name: "phase".into(),
                },
            },
        };
        let json = serde_json::to_value(&metric).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "name": "phase",
                "each": {
                    "type": "StateSet",
                    "stateSet": {"path": ["status", "phase"], "list": ["Ready", "Failed"], "labelName": "phase"}
                }
            })
        );
    }

    #[test]
    fn test_gauge_omits_false_nil_is_zero() {
        let each = MetricEach::Gauge {
            gauge: GaugeSpec {
                path: vec!["spec".into(), "replicas".into()],
                nil_is_zero: false,
            },
        };
        let json = serde_json::to_value(&each).unwrap();
        assert_eq!(json, serde_json::json!({"type": "Gauge", "gauge": {"path": ["spec", "replicas"]}}));
    }
}
