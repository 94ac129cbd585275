//! # Metrics Collection
//!
//! For every declaration carrying `metrics:resource` that is also a
//! resource root, gathers its metric markers into one [`ResourceMetrics`]
//! entry.
//!
//! Declaration markers come first, with their explicit `JSONPath`. Field
//! markers follow in field order; their path is the chain of serialization
//! keys from the root, descending through named record types (inline fields
//! add no segment, lists and maps are not descended).

use std::collections::HashSet;

use markgen_core::{Diagnostic, Diagnostics, TypeGraph, TypeIdent, TypeKind, TypeRef};
use markgen_gates::GateState;
use markgen_markers::{description, MarkerIndex, MarkerValue, ANONYMOUS};
use markgen_schema::markers as schema;
use thiserror::Error;

use crate::config::{
    GaugeSpec, GroupVersionKind, InfoSpec, Metric, MetricEach, MetricsConfig, ResourceMetrics,
    StateSetSpec,
};
use crate::markers::{GAUGE, INFO, RESOURCE, STATESET};

/// Label used by state-set metrics that name none.
pub const DEFAULT_STATE_LABEL: &str = "state";

/// Why a metric marker contributed nothing.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MetricsError {
    /// `metrics:resource` on a type that is not a resource root.
    #[error("metrics:resource on {kind} requires +resource on the same declaration")]
    NotAResource { kind: String },

    /// A metric name already used within the same resource.
    #[error("metric {name:?} is already defined for {kind}")]
    DuplicateMetric { kind: String, name: String },

    /// A state-set metric without states.
    #[error("metric {name:?} lists no states")]
    EmptyStateList { name: String },
}

/// Build the metrics configuration for every eligible resource root.
pub fn collect(graph: &TypeGraph, index: &MarkerIndex, gates: &GateState) -> (MetricsConfig, Diagnostics) {
    let mut resources = Vec::new();
    let mut diagnostics = Diagnostics::new();

    for pkg in graph.packages() {
        let pkg_markers = index.package(&pkg.name);
        for decl in &pkg.types {
            let ident = decl.ident();
            let markers = index.declaration(&ident);
            let Some(resource) = markers.get(RESOURCE) else {
                continue;
            };
            let gated_off = |value: Option<&MarkerValue>| {
                value
                    .and_then(|v| v.gate(schema::FEATURE_GATE).or_else(|| v.gate(ANONYMOUS)))
                    .is_some_and(|g| !g.evaluate(gates))
            };
            if gated_off(Some(resource)) || gated_off(markers.get(schema::FEATURE_GATE)) {
                tracing::trace!(kind = %decl.name, "metrics resource gated off");
                continue;
            }
            if !markers.contains(schema::RESOURCE) {
                let err = MetricsError::NotAResource {
                    kind: decl.name.clone(),
                };
                diagnostics.push(Diagnostic::semantic(resource.location.clone(), err.to_string()));
                continue;
            }
            let group = pkg_markers.get(schema::GROUP_NAME).and_then(|v| v.string(ANONYMOUS));
            let version = pkg_markers.get(schema::VERSION_NAME).and_then(|v| v.string(ANONYMOUS));
            let (Some(group), Some(version)) = (group, version) else {
                // Resource assembly reports the missing group or version.
                continue;
            };

            let mut builder = ResourceBuilder {
                kind: &decl.name,
                metrics: Vec::new(),
                names: HashSet::new(),
                diagnostics: &mut diagnostics,
            };
            for value in markers.iter().filter(|v| is_metric(&v.name)) {
                let path = value
                    .path("JSONPath")
                    .map(|p| p.segments().to_vec())
                    .unwrap_or_default();
                builder.add(value, path, None);
            }
            let mut visiting = HashSet::from([ident.clone()]);
            walk_fields(graph, index, gates, &ident, &[], &mut visiting, &mut builder);

            let metrics = builder.metrics;
            tracing::debug!(kind = %decl.name, metrics = metrics.len(), "collected resource metrics");
            resources.push(ResourceMetrics {
                group_version_kind: GroupVersionKind {
                    group: group.to_string(),
                    version: version.to_string(),
                    kind: decl.name.clone(),
                },
                metric_name_prefix: resource.string("namePrefix").map(str::to_string),
                metrics,
            });
        }
    }

    (MetricsConfig::new(resources), diagnostics)
}

fn is_metric(name: &str) -> bool {
    matches!(name, GAUGE | INFO | STATESET)
}

struct ResourceBuilder<'a> {
    kind: &'a str,
    metrics: Vec<Metric>,
    names: HashSet<String>,
    diagnostics: &'a mut Diagnostics,
}

impl ResourceBuilder<'_> {
    fn add(&mut self, value: &MarkerValue, path: Vec<String>, fallback_help: Option<String>) {
        match self.build(value, path, fallback_help) {
            Ok(metric) => self.metrics.push(metric),
            Err(err) => self
                .diagnostics
                .push(Diagnostic::semantic(value.location.clone(), err.to_string())),
        }
    }

    fn build(
        &mut self,
        value: &MarkerValue,
        path: Vec<String>,
        fallback_help: Option<String>,
    ) -> Result<Metric, MetricsError> {
        let name = value.string("name").unwrap_or_default().to_string();
        let each = match value.name.as_str() {
            GAUGE => MetricEach::Gauge {
                gauge: GaugeSpec {
                    path,
                    nil_is_zero: value.flag("nilIsZero"),
                },
            },
            STATESET => {
                let list = value.list("list").to_vec();
                if list.is_empty() {
                    return Err(MetricsError::EmptyStateList { name });
                }
                MetricEach::StateSet {
                    state_set: StateSetSpec {
                        path,
                        list,
                        label_name: value
                            .string("labelName")
                            .unwrap_or(DEFAULT_STATE_LABEL)
                            .to_string(),
                    },
                }
            }
            _ => MetricEach::Info {
                info: InfoSpec { path },
            },
        };
        if !self.names.insert(name.clone()) {
            return Err(MetricsError::DuplicateMetric {
                kind: self.kind.to_string(),
                name,
            });
        }
        let help = value
            .string("help")
            .map(str::to_string)
            .or(fallback_help)
            .unwrap_or_default();
        Ok(Metric { name, help, each })
    }
}

/// The record a type reference leads to, following pointers and aliases.
fn record_target(graph: &TypeGraph, ty: &TypeRef) -> Option<TypeIdent> {
    let TypeRef::Named(ident) = ty.strip_pointers() else {
        return None;
    };
    let node = graph.resolve(ident)?;
    match &node.kind {
        TypeKind::Record { .. } => Some(ident.clone()),
        TypeKind::Alias { target } => record_target(graph, target),
        _ => None,
    }
}

fn walk_fields(
    graph: &TypeGraph,
    index: &MarkerIndex,
    gates: &GateState,
    ident: &TypeIdent,
    prefix: &[String],
    visiting: &mut HashSet<TypeIdent>,
    builder: &mut ResourceBuilder<'_>,
) {
    let Some(node) = graph.resolve(ident) else {
        return;
    };
    for field in node.fields() {
        if field.is_omitted() {
            continue;
        }
        let markers = index.field(ident, &field.name);
        if markers
            .get(schema::FEATURE_GATE)
            .and_then(|v| v.gate(ANONYMOUS))
            .is_some_and(|g| !g.evaluate(gates))
        {
            continue;
        }
        let mut path = prefix.to_vec();
        if !field.inline {
            path.push(field.key.clone());
        }
        for value in markers.iter().filter(|v| is_metric(&v.name)) {
            builder.add(value, path.clone(), description(&field.doc));
        }
        if let Some(target) = record_target(graph, &field.ty) {
            if visiting.insert(target.clone()) {
                walk_fields(graph, index, gates, &target, &path, visiting, builder);
                visiting.remove(&target);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::MetricsMarkers;
    use markgen_core::{DiagnosticKind, FieldNode, Location, PackageNode, ScalarKind, TypeNode};
    use markgen_markers::{MarkerParser, Registry};
    use markgen_schema::SchemaMarkers;

    const PKG: &str = "example.com/v1";

    fn scalar(kind: ScalarKind) -> TypeRef {
        TypeRef::Scalar(kind)
    }

    fn run(types: Vec<TypeNode>, gates: &str) -> (MetricsConfig, Diagnostics) {
        let mut pkg = PackageNode::new(PKG)
            .doc("+groupName=example.com")
            .doc("+versionName=v1");
        pkg.types = types;
        let graph = TypeGraph::new(vec![pkg]).unwrap();
        let registry = Registry::compose(&[&SchemaMarkers, &MetricsMarkers]).unwrap();
        let parser = MarkerParser::new(&registry);
        let (index, parse) = MarkerIndex::collect(&graph, &parser);
        assert!(parse.is_empty(), "{parse}");
        collect(&graph, &index, &GateState::parse(gates))
    }

    fn widget(extra_doc: &[&str]) -> Vec<TypeNode> {
        let mut root = TypeNode::record(
            PKG,
            "Widget",
            vec![
                FieldNode::new("Spec", TypeRef::named(PKG, "WidgetSpec")).with_key("spec"),
                FieldNode::new("Status", TypeRef::pointer(TypeRef::named(PKG, "WidgetStatus")))
                    .with_key("status"),
            ],
        )
        .doc("+resource")
        .doc("+metrics:resource:namePrefix=widget");
        for line in extra_doc {
            root = root.doc(*line);
        }
        let spec = TypeNode::record(
            PKG,
            "WidgetSpec",
            vec![FieldNode::new("Replicas", scalar(ScalarKind::Int32))
                .with_key("replicas")
                .doc("Desired replica count.")
                .doc("+metrics:gauge:name=replicas,nilIsZero=true")],
        );
        let status = TypeNode::record(
            PKG,
            "WidgetStatus",
            vec![
                FieldNode::new("Phase", scalar(ScalarKind::String))
                    .with_key("phase")
                    .doc("+metrics:stateset:name=phase,list=Pending;Ready;Failed,help=\"current phase\""),
                FieldNode::new("Beta", scalar(ScalarKind::Int32))
                    .with_key("beta")
                    .doc("+featureGate=beta")
                    .doc("+metrics:gauge:name=beta"),
            ],
        );
        vec![root, spec, status]
    }

    #[test]
    fn test_paths_inferred_from_keys() {
        let (config, diags) = run(widget(&[]), "");
        assert!(diags.is_empty(), "{diags}");
        let resource = &config.spec.resources[0];
        assert_eq!(resource.group_version_kind.group, "example.com");
        assert_eq!(resource.group_version_kind.version, "v1");
        assert_eq!(resource.group_version_kind.kind, "Widget");
        assert_eq!(resource.metric_name_prefix.as_deref(), Some("widget"));

        let names: Vec<&str> = resource.metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["replicas", "phase"]);
        assert_eq!(resource.metrics[0].each.path(), ["spec", "replicas"]);
        assert_eq!(resource.metrics[0].help, "Desired replica count.");
        assert_eq!(resource.metrics[1].each.path(), ["status", "phase"]);
        assert_eq!(resource.metrics[1].help, "current phase");
        let MetricEach::StateSet { state_set } = &resource.metrics[1].each else {
            panic!("expected state set");
        };
        assert_eq!(state_set.label_name, DEFAULT_STATE_LABEL);
        assert_eq!(state_set.list, ["Pending", "Ready", "Failed"]);
    }

    #[test]
    fn test_gated_field_metric() {
        let (config, _) = run(widget(&[]), "beta=true");
        let names: Vec<&str> = config.spec.resources[0].metrics.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, ["replicas", "phase", "beta"]);
    }

    #[test]
    fn test_declaration_metric_with_explicit_path() {
        let (config, diags) = run(
            widget(&["+metrics:info:name=owner,JSONPath=.metadata.labels.owner"]),
            "",
        );
        assert!(diags.is_empty(), "{diags}");
        let first = &config.spec.resources[0].metrics[0];
        assert_eq!(first.name, "owner");
        assert_eq!(first.each.path(), ["metadata", "labels", "owner"]);
    }

    #[test]
    fn test_duplicate_metric_name_is_semantic() {
        let (config, diags) = run(
            widget(&["+metrics:gauge:name=replicas,JSONPath=.spec.replicas"]),
            "",
        );
        assert_eq!(config.spec.resources[0].metrics.len(), 2);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Semantic);
        assert_eq!(diag.location, Location::field(TypeIdent::new(PKG, "WidgetSpec"), "Replicas"));
        assert!(diag.message.contains("already defined"));
    }

    #[test]
    fn test_requires_resource_root() {
        let node = TypeNode::record(PKG, "Loose", vec![]).doc("+metrics:resource");
        let (config, diags) = run(vec![node], "");
        assert!(config.is_empty());
        assert_eq!(diags.of_kind(DiagnosticKind::Semantic).count(), 1);
    }

    #[test]
    fn test_resource_gate() {
        let mut types = widget(&[]);
        types[0] = TypeNode::record(PKG, "Widget", vec![])
            .doc("+resource")
            .doc("+metrics:resource:featureGate=widgetMetrics");
        let (off, _) = run(types.clone(), "");
        assert!(off.is_empty());
        let (on, _) = run(types, "widgetMetrics=true");
        assert_eq!(on.spec.resources.len(), 1);
        assert_eq!(on.spec.resources[0].metric_name_prefix, None);
    }

    #[test]
    fn test_recursive_types_terminate() {
        let node = TypeNode::record(
            PKG,
            "Tree",
            vec![
                FieldNode::new("Child", TypeRef::pointer(TypeRef::named(PKG, "Tree"))).with_key("child"),
                FieldNode::new("Size", scalar(ScalarKind::Int64))
                    .with_key("size")
                    .doc("+metrics:gauge:name=size"),
            ],
        )
        .doc("+resource")
        .doc("+metrics:resource");
        let (config, diags) = run(vec![node], "");
        assert!(diags.is_empty(), "{diags}");
        assert_eq!(config.spec.resources[0].metrics.len(), 1);
    }

    #[test]
    fn test_yaml_document() {
        let (config, _) = run(widget(&[]), "");
        let yaml = serde_yaml::to_string(&config).unwrap();
        assert!(yaml.starts_with("kind: CustomResourceStateMetrics\n"));
        assert!(yaml.contains("metricNamePrefix: widget"));
        assert!(yaml.contains("type: Gauge"));
        assert!(yaml.contains("nilIsZero: true"));
    }
}
