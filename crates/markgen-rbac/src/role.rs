//! Role manifests rendered from an aggregated rule set.
//!
//! Cluster-scoped rules land in one `ClusterRole`; namespaced rules land in
//! one `Role` per namespace, in the order namespaces were first seen.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::rule::{AccessRule, AccessRuleSet};

pub const RBAC_API_VERSION: &str = "rbac.authorization.k8s.io/v1";

/// Object metadata of a role manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoleMeta {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace: Option<String>,
}

/// One entry of a role's `rules` list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PolicyRule {
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_groups: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resources: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub resource_names: Vec<String>,
    #[serde(default, rename = "nonResourceURLs", skip_serializing_if = "Vec::is_empty")]
    pub non_resource_urls: Vec<String>,
    pub verbs: Vec<String>,
}

impl From<&AccessRule> for PolicyRule {
    fn from(rule: &AccessRule) -> Self {
        if rule.is_url() {
            return Self {
                api_groups: Vec::new(),
                resources: Vec::new(),
                resource_names: Vec::new(),
                non_resource_urls: vec![rule.url.clone()],
                verbs: rule.verbs.iter().cloned().collect(),
            };
        }
        Self {
            api_groups: vec![rule.group.clone()],
            resources: vec![rule.resource.clone()],
            resource_names: rule.resource_names.iter().cloned().collect(),
            non_resource_urls: Vec::new(),
            verbs: rule.verbs.iter().cloned().collect(),
        }
    }
}

/// A `ClusterRole` or `Role` document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleManifest {
    pub api_version: String,
    pub kind: String,
    pub metadata: RoleMeta,
    pub rules: Vec<PolicyRule>,
}

impl RoleManifest {
    fn new(kind: &str, name: &str, namespace: Option<&str>) -> Self {
        Self {
            api_version: RBAC_API_VERSION.to_string(),
            kind: kind.to_string(),
            metadata: RoleMeta {
                name: name.to_string(),
                namespace: namespace.map(str::to_string),
            },
            rules: Vec::new(),
        }
    }
}

/// Render the rule set as role manifests named `role_name`.
///
/// The `ClusterRole` comes first and is omitted when no rule is
/// cluster-scoped. An empty set renders nothing.
pub fn render_roles(rules: &AccessRuleSet, role_name: &str) -> Vec<RoleManifest> {
    let mut cluster = RoleManifest::new("ClusterRole", role_name, None);
    let mut namespaced: IndexMap<&str, RoleManifest> = IndexMap::new();

    for rule in rules.iter() {
        if rule.is_cluster_scoped() {
            cluster.rules.push(PolicyRule::from(rule));
        } else {
            namespaced
                .entry(rule.namespace.as_str())
                .or_insert_with(|| RoleManifest::new("Role", role_name, Some(rule.namespace.as_str())))
                .rules
                .push(PolicyRule::from(rule));
        }
    }

    let mut out = Vec::with_capacity(namespaced.len() + 1);
    if !cluster.rules.is_empty() {
        out.push(cluster);
    }
    out.extend(namespaced.into_values());
    out
}
