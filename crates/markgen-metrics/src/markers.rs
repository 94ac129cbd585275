//! Metrics marker definitions.
//!
//! Metric markers on a declaration carry an explicit `JSONPath`. On a
//! field the path is inferred from the serialization keys leading to it.

use markgen_core::Applicability::{Declaration, Field};
use markgen_markers::{ArgKind, Contributor, MarkerDefinition, MarkerProvider};

pub const RESOURCE: &str = "metrics:resource";
pub const GAUGE: &str = "metrics:gauge";
pub const INFO: &str = "metrics:info";
pub const STATESET: &str = "metrics:stateset";

/// Provider for the metrics markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsMarkers;

fn metric(name: &str, summary: &str, extra: impl Fn(MarkerDefinition) -> MarkerDefinition) -> [MarkerDefinition; 2] {
    let base = MarkerDefinition::new(name, Field, Contributor::Metric)
        .arg("name", ArgKind::String)
        .optional("help", ArgKind::String);
    let field = extra(base.clone()).help("metrics", summary);
    let declaration = extra(base.arg("JSONPath", ArgKind::Path))
        .at(Declaration)
        .help("metrics", summary);
    [declaration, field]
}

impl MarkerProvider for MetricsMarkers {
    fn name(&self) -> &'static str {
        "metrics"
    }

    fn definitions(&self) -> Vec<MarkerDefinition> {
        let mut defs = vec![MarkerDefinition::new(RESOURCE, Declaration, Contributor::Metric)
            .optional("namePrefix", ArgKind::String)
            .optional("featureGate", ArgKind::GateExpression)
            .single()
            .help("metrics", "export state metrics for this resource")];
        defs.extend(metric(GAUGE, "numeric value at a path", |d| {
            d.optional("nilIsZero", ArgKind::Bool)
        }));
        defs.extend(metric(INFO, "labels-only metric for the value at a path", |d| d));
        defs.extend(metric(STATESET, "one series per listed state, set for the current one", |d| {
            d.arg("list", ArgKind::StringList).optional("labelName", ArgKind::String)
        }));
        defs
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markgen_markers::Registry;

    #[test]
    fn test_path_only_required_on_declarations() {
        let registry = Registry::compose(&[&MetricsMarkers]).unwrap();
        let decl = registry.lookup(GAUGE, Declaration).unwrap();
        let field = registry.lookup(GAUGE, Field).unwrap();
        assert!(!decl.arg_spec("JSONPath").unwrap().optional);
        assert!(field.arg_spec("JSONPath").is_none());
        assert!(registry.lookup(RESOURCE, Field).is_none());
        assert!(registry.lookup(STATESET, Field).unwrap().arg_spec("list").is_some());
    }
}
