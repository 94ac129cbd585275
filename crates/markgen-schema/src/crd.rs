//! # CustomResourceDefinition Assembly
//!
//! Declarations carrying `+resource` are resource roots. Roots with the same
//! API group and kind, declared in packages for different versions, become
//! the versions of one definition.
//!
//! ## Rules
//!
//! - The package must carry `+groupName` and `+versionName`.
//! - Exactly one version is the storage version: the one marked
//!   `+storageversion`, or the only version when there is just one.
//! - Root schemas must expose `apiVersion`, `kind`, and `metadata`.
//! - A root gated off by `+featureGate` is skipped; a root whose schema
//!   failed synthesis omits the whole definition.
//!
//! Violations are reported as semantic diagnostics and the definition is
//! left out of the output.

use indexmap::IndexMap;
use serde::Serialize;

use markgen_core::{Diagnostic, Diagnostics, Location, TypeIdent};
use markgen_markers::{MarkerSet, ANONYMOUS};

use crate::markers::{
    FEATURE_GATE, GROUP_NAME, PRINT_COLUMN, RESOURCE, STORAGE_VERSION, SUBRESOURCE_STATUS,
    VERSION_NAME,
};
use crate::node::{SchemaKind, SchemaNode};
use crate::synth::Synthesizer;

/// `apiVersion` of the generated documents.
pub const CRD_API_VERSION: &str = "apiextensions.k8s.io/v1";

const ROOT_FIELDS: [&str; 3] = ["apiVersion", "kind", "metadata"];

/// A generated CustomResourceDefinition document.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomResourceDefinition {
    pub api_version: String,
    pub kind: String,
    pub metadata: ObjectMeta,
    pub spec: CrdSpec,
}

/// Document metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectMeta {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CrdSpec {
    pub group: String,
    pub names: CrdNames,
    pub scope: Scope,
    pub versions: Vec<CrdVersion>,
}

/// Resource scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Scope {
    Namespaced,
    Cluster,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdNames {
    pub kind: String,
    pub list_kind: String,
    pub plural: String,
    pub singular: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub short_names: Vec<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub categories: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CrdVersion {
    pub name: String,
    pub served: bool,
    pub storage: bool,
    pub schema: VersionSchema,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subresources: Option<Subresources>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub additional_printer_columns: Vec<PrinterColumn>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VersionSchema {
    #[serde(rename = "openAPIV3Schema")]
    pub open_api_v3_schema: SchemaNode,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Subresources {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<serde_json::Map<String, serde_json::Value>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrinterColumn {
    pub name: String,
    #[serde(rename = "type")]
    pub column_type: String,
    pub json_path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<i64>,
}

struct RootVersion<'a> {
    version: String,
    ident: TypeIdent,
    markers: &'a MarkerSet,
    schema: SchemaNode,
    failed: bool,
}

struct RootGroup<'a> {
    group: String,
    kind: String,
    versions: Vec<RootVersion<'a>>,
}

/// Lowercase English plural of a kind name.
pub fn pluralize(kind: &str) -> String {
    let lower = kind.to_lowercase();
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with('z')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{lower}es");
    }
    if let Some(stem) = lower.strip_suffix('y') {
        if !stem.ends_with(['a', 'e', 'i', 'o', 'u']) {
            return format!("{stem}ies");
        }
    }
    format!("{lower}s")
}

/// Assemble every resource definition in the synthesizer's graph.
pub fn assemble(synth: &mut Synthesizer<'_>) -> (Vec<CustomResourceDefinition>, Diagnostics) {
    let graph = synth.graph();
    let index = synth.markers();
    let gates = synth.gates();
    let mut diagnostics = Diagnostics::new();
    let mut groups: IndexMap<(String, String), RootGroup<'_>> = IndexMap::new();

    for pkg in graph.packages() {
        let pkg_markers = index.package(&pkg.name);
        for decl in &pkg.types {
            let ident = decl.ident();
            let markers = index.declaration(&ident);
            if !markers.contains(RESOURCE) {
                continue;
            }
            if let Some(gate) = markers.get(FEATURE_GATE).and_then(|v| v.gate(ANONYMOUS)) {
                if !gate.evaluate(gates) {
                    tracing::debug!(ty = %ident, gate = %gate, "resource gated off");
                    continue;
                }
            }
            let group = pkg_markers.get(GROUP_NAME).and_then(|v| v.string(ANONYMOUS));
            let version = pkg_markers.get(VERSION_NAME).and_then(|v| v.string(ANONYMOUS));
            let (Some(group), Some(version)) = (group, version) else {
                diagnostics.push(Diagnostic::semantic(
                    Location::declaration(ident.clone()),
                    format!(
                        "resource {} requires +{GROUP_NAME} and +{VERSION_NAME} on package {}",
                        decl.name, pkg.name
                    ),
                ));
                continue;
            };

            let schema = (*synth.synthesize(&ident, version)).clone();
            let failed = synth.failed(&ident, version);
            groups
                .entry((group.to_string(), decl.name.clone()))
                .or_insert_with(|| RootGroup {
                    group: group.to_string(),
                    kind: decl.name.clone(),
                    versions: Vec::new(),
                })
                .versions
                .push(RootVersion {
                    version: version.to_string(),
                    ident,
                    markers,
                    schema,
                    failed,
                });
        }
    }

    let mut crds = Vec::new();
    for group in groups.into_values() {
        match build(&group) {
            Ok(crd) => {
                tracing::debug!(
                    name = %crd.metadata.name,
                    versions = crd.spec.versions.len(),
                    "assembled resource definition"
                );
                crds.push(crd);
            }
            Err(diagnostic) => diagnostics.push(diagnostic),
        }
    }
    (crds, diagnostics)
}

fn build(group: &RootGroup<'_>) -> Result<CustomResourceDefinition, Diagnostic> {
    let first = &group.versions[0];
    let omit = |at: &RootVersion<'_>, reason: String| {
        Diagnostic::semantic(
            Location::declaration(at.ident.clone()),
            format!("resource {}.{} omitted: {reason}", group.kind, group.group),
        )
    };

    if let Some(bad) = group.versions.iter().find(|v| v.failed) {
        return Err(omit(bad, format!("schema for {} failed", bad.ident)));
    }
    for (i, v) in group.versions.iter().enumerate() {
        if group.versions[..i].iter().any(|o| o.version == v.version) {
            return Err(omit(v, format!("version {} is declared more than once", v.version)));
        }
        if let Some(missing) = ROOT_FIELDS.iter().find(|f| !v.schema.properties.contains_key(**f)) {
            return Err(omit(v, format!("{} has no '{missing}' field", v.ident)));
        }
    }

    let marked: Vec<&RootVersion<'_>> = group
        .versions
        .iter()
        .filter(|v| v.markers.contains(STORAGE_VERSION))
        .collect();
    let storage = match (marked.as_slice(), group.versions.as_slice()) {
        ([only], _) => only.version.clone(),
        ([], [only]) => only.version.clone(),
        ([], _) => {
            return Err(omit(first, "no version is marked +storageversion".to_string()));
        }
        (_, _) => {
            return Err(omit(first, "more than one version is marked +storageversion".to_string()));
        }
    };

    let storage_root = group
        .versions
        .iter()
        .find(|v| v.version == storage)
        .unwrap_or(first);
    let resource = storage_root.markers.get(RESOURCE);
    let arg = |key: &str| resource.and_then(|r| r.string(key));
    let list = |key: &str| resource.map(|r| r.list(key).to_vec()).unwrap_or_default();

    let scope = match arg("scope") {
        None | Some("Namespaced") => Scope::Namespaced,
        Some("Cluster") => Scope::Cluster,
        Some(other) => {
            return Err(omit(storage_root, format!("unknown scope '{other}'")));
        }
    };
    let plural = arg("path").map_or_else(|| pluralize(&group.kind), str::to_string);
    let names = CrdNames {
        kind: group.kind.clone(),
        list_kind: format!("{}List", group.kind),
        plural: plural.clone(),
        singular: arg("singular").map_or_else(|| group.kind.to_lowercase(), str::to_string),
        short_names: list("shortName"),
        categories: list("categories"),
    };

    let versions = group
        .versions
        .iter()
        .map(|v| CrdVersion {
            name: v.version.clone(),
            served: true,
            storage: v.version == storage,
            schema: VersionSchema {
                open_api_v3_schema: root_schema(&v.schema),
            },
            subresources: v.markers.contains(SUBRESOURCE_STATUS).then(|| Subresources {
                status: Some(serde_json::Map::new()),
            }),
            additional_printer_columns: v
                .markers
                .all(PRINT_COLUMN)
                .map(|c| PrinterColumn {
                    name: c.string("name").unwrap_or_default().to_string(),
                    column_type: c.string("type").unwrap_or_default().to_string(),
                    json_path: c.path("JSONPath").map(ToString::to_string).unwrap_or_default(),
                    description: c.string("description").map(str::to_string),
                    format: c.string("format").map(str::to_string),
                    priority: c.int("priority"),
                })
                .collect(),
        })
        .collect();

    Ok(CustomResourceDefinition {
        api_version: CRD_API_VERSION.to_string(),
        kind: "CustomResourceDefinition".to_string(),
        metadata: ObjectMeta {
            name: format!("{plural}.{}", group.group),
        },
        spec: CrdSpec {
            group: group.group.clone(),
            names,
            scope,
            versions,
        },
    })
}

/// Root schemas describe `metadata` as a plain object; its real schema is
/// owned by the API server.
fn root_schema(schema: &SchemaNode) -> SchemaNode {
    let mut root = schema.clone();
    if let Some(meta) = root.properties.get_mut("metadata") {
        *meta = SchemaNode::of(SchemaKind::Object);
    }
    root
}
