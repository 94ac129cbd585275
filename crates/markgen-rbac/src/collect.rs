//! # Access-Rule Aggregation
//!
//! [`collect`] walks every rule-contributing marker in index order, expands
//! each occurrence into candidate rules, drops candidates whose feature gate
//! is off, and folds the rest into one [`AccessRuleSet`].
//!
//! List-valued `group`, `resource` and `namespace` arguments denote the
//! Cartesian product of equivalent rules. `verbs` and `resourceNames` stay
//! sets on each rule. Every URL in `urls` is its own cluster-scoped rule.

use markgen_core::{Diagnostic, Diagnostics};
use markgen_gates::GateState;
use markgen_markers::{Contributor, MarkerIndex, MarkerValue};
use thiserror::Error;

use crate::markers::RBAC;
use crate::rule::{AccessRule, AccessRuleSet};

/// Why an `rbac` marker produced no rules.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RuleError {
    /// URLs were combined with group, resource, or resourceNames.
    #[error("rbac marker mixes urls ({urls}) with resource arguments")]
    MixedTarget {
        /// The offending URLs, `;`-joined.
        urls: String,
    },

    /// Neither a resource nor a URL was named.
    #[error("rbac marker names neither a resource nor a url")]
    MissingTarget,

    /// Non-resource URLs cannot be namespaced.
    #[error("rbac marker scopes urls to namespace {namespace:?}")]
    NamespacedUrl {
        /// The first namespace given.
        namespace: String,
    },

    /// `verbs` was present but empty.
    #[error("rbac marker grants no verbs")]
    NoVerbs,
}

/// Expand one marker occurrence into its candidate rules.
pub fn expand(value: &MarkerValue) -> Result<Vec<AccessRule>, RuleError> {
    let verbs: Vec<&str> = value.list("verbs").iter().map(String::as_str).filter(|v| !v.is_empty()).collect();
    if verbs.is_empty() {
        return Err(RuleError::NoVerbs);
    }

    let groups = value.list("group");
    let resources = value.list("resource");
    let names = value.list("resourceNames");
    let urls = value.list("urls");
    let namespaces = value.list("namespace");

    if !urls.is_empty() {
        if !groups.is_empty() || !resources.is_empty() || !names.is_empty() {
            return Err(RuleError::MixedTarget { urls: urls.join(";") });
        }
        if let Some(ns) = namespaces.iter().find(|ns| !ns.is_empty()) {
            return Err(RuleError::NamespacedUrl { namespace: ns.clone() });
        }
        return Ok(urls.iter().map(|url| AccessRule::url(url.as_str(), verbs.iter().copied())).collect());
    }

    if resources.is_empty() {
        return Err(RuleError::MissingTarget);
    }

    let core = [String::new()];
    let groups = if groups.is_empty() { &core[..] } else { groups };
    let namespaces = if namespaces.is_empty() { &core[..] } else { namespaces };

    let mut rules = Vec::with_capacity(groups.len() * resources.len() * namespaces.len());
    for group in groups {
        for resource in resources {
            for namespace in namespaces {
                rules.push(
                    AccessRule::resource(group, resource.as_str(), verbs.iter().copied())
                        .named(names.iter().map(String::as_str))
                        .in_namespace(namespace.as_str()),
                );
            }
        }
    }
    Ok(rules)
}

/// Aggregate every `rbac` marker in the index into one rule set.
///
/// Markers whose `featureGate` evaluates false contribute nothing. A marker
/// that fails [`expand`] is reported as a Semantic diagnostic at its
/// location and contributes nothing.
pub fn collect(index: &MarkerIndex, gates: &GateState) -> (AccessRuleSet, Diagnostics) {
    let mut set = AccessRuleSet::new();
    let mut diagnostics = Diagnostics::new();
    let mut candidates = 0usize;

    for value in index.contributions(Contributor::Rule).filter(|v| v.name == RBAC) {
        if let Some(gate) = value.gate("featureGate") {
            if !gate.evaluate(gates) {
                tracing::trace!(location = %value.location, gate = %gate, "rbac marker gated off");
                continue;
            }
        }
        match expand(value) {
            Ok(rules) => {
                candidates += rules.len();
                for rule in rules {
                    if set.insert(rule) {
                        tracing::debug!(location = %value.location, "merged access rule");
                    }
                }
            }
            Err(err) => diagnostics.push(Diagnostic::semantic(value.location.clone(), err.to_string())),
        }
    }

    tracing::debug!(
        candidates,
        rules = set.len(),
        diagnostics = diagnostics.len(),
        "aggregated access rules"
    );
    (set, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::RbacMarkers;
    use markgen_core::{DiagnosticKind, PackageNode, TypeGraph, TypeNode};
    use markgen_markers::{MarkerParser, Registry};
    use std::collections::BTreeSet;

    const PKG: &str = "example.com/v1";

    fn index_for(package_doc: &[&str], type_doc: &[&str]) -> MarkerIndex {
        let mut pkg = PackageNode::new(PKG);
        for line in package_doc {
            pkg = pkg.doc(*line);
        }
        let mut node = TypeNode::record(PKG, "Widget", vec![]);
        for line in type_doc {
            node = node.doc(*line);
        }
        let graph = TypeGraph::new(vec![pkg.with_type(node)]).unwrap();
        let registry = Registry::compose(&[&RbacMarkers]).unwrap();
        let parser = MarkerParser::new(&registry);
        let (index, diagnostics) = MarkerIndex::collect(&graph, &parser);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        index
    }

    fn verbs(rule: &AccessRule) -> Vec<&str> {
        rule.verbs.iter().map(String::as_str).collect()
    }

    // ── Scenarios ────────────────────────────────────────────────────

    #[test]
    fn test_batch_jobs_verbs_merge() {
        let index = index_for(
            &[
                "+rbac:group=batch,resource=jobs,verbs=get",
                "+rbac:group=batch,resource=jobs,verbs=watch",
            ],
            &[],
        );
        let (set, diags) = collect(&index, &GateState::new());
        assert!(diags.is_empty());
        assert_eq!(set.len(), 1);
        let rule = set.iter().next().unwrap();
        assert_eq!(rule.group, "batch");
        assert_eq!(rule.resource, "jobs");
        assert_eq!(verbs(rule), ["get", "watch"]);
    }

    #[test]
    fn test_cartesian_expansion() {
        let index = index_for(
            &["+rbac:group=apps;batch,resource=deployments;jobs,namespace=a;b,verbs=get;list"],
            &[],
        );
        let (set, _) = collect(&index, &GateState::new());
        assert_eq!(set.len(), 8);
        assert!(set.iter().all(|r| verbs(r) == ["get", "list"]));
        let first = set.iter().next().unwrap();
        assert_eq!((first.group.as_str(), first.resource.as_str(), first.namespace.as_str()), ("apps", "deployments", "a"));
    }

    #[test]
    fn test_resource_names_stay_a_set() {
        let index = index_for(&["+rbac:resource=configmaps,resourceNames=a;b,verbs=get"], &[]);
        let (set, _) = collect(&index, &GateState::new());
        assert_eq!(set.len(), 1);
        let rule = set.iter().next().unwrap();
        assert_eq!(rule.resource_names, BTreeSet::from(["a".to_string(), "b".to_string()]));
        assert_eq!(rule.group, "");
    }

    #[test]
    fn test_core_group_collapses_with_empty() {
        let index = index_for(
            &["+rbac:group=core,resource=pods,verbs=get", "+rbac:resource=pods,verbs=list"],
            &[],
        );
        let (set, _) = collect(&index, &GateState::new());
        assert_eq!(set.len(), 1);
        assert_eq!(verbs(set.iter().next().unwrap()), ["get", "list"]);
    }

    #[test]
    fn test_one_rule_per_url() {
        let index = index_for(&["+rbac:urls=/metrics;/healthz,verbs=get"], &[]);
        let (set, _) = collect(&index, &GateState::new());
        let urls: Vec<&str> = set.iter().map(|r| r.url.as_str()).collect();
        assert_eq!(urls, ["/metrics", "/healthz"]);
    }

    #[test]
    fn test_declaration_markers_follow_package_markers() {
        let index = index_for(
            &["+rbac:resource=pods,verbs=get"],
            &["+rbac:group=apps,resource=deployments,verbs=get", "+rbac:resource=pods,verbs=watch"],
        );
        let (set, _) = collect(&index, &GateState::new());
        let order: Vec<&str> = set.iter().map(|r| r.resource.as_str()).collect();
        assert_eq!(order, ["pods", "deployments"]);
        assert_eq!(verbs(set.iter().next().unwrap()), ["get", "watch"]);
    }

    // ── Gates ────────────────────────────────────────────────────────

    #[test]
    fn test_gated_marker_dropped_before_merge() {
        let index = index_for(
            &[
                "+rbac:resource=pods,verbs=get",
                "+rbac:resource=pods,verbs=delete,featureGate=cleanup",
            ],
            &[],
        );
        let (off, _) = collect(&index, &GateState::new());
        assert_eq!(verbs(off.iter().next().unwrap()), ["get"]);

        let (on, _) = collect(&index, &GateState::parse("cleanup=true"));
        assert_eq!(verbs(on.iter().next().unwrap()), ["delete", "get"]);
    }

    // ── Errors ───────────────────────────────────────────────────────

    #[test]
    fn test_url_mixed_with_resource_is_semantic() {
        let index = index_for(
            &["+rbac:resource=pods,urls=/metrics,verbs=get", "+rbac:resource=nodes,verbs=list"],
            &[],
        );
        let (set, diags) = collect(&index, &GateState::new());
        assert_eq!(set.len(), 1);
        assert_eq!(diags.len(), 1);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Semantic);
        assert!(diag.message.contains("mixes urls"));
    }

    #[test]
    fn test_missing_target_is_semantic() {
        let index = index_for(&["+rbac:verbs=get"], &[]);
        let (set, diags) = collect(&index, &GateState::new());
        assert!(set.is_empty());
        assert_eq!(diags.of_kind(DiagnosticKind::Semantic).count(), 1);
    }

    #[test]
    fn test_namespaced_url_rejected() {
        let index = index_for(&["+rbac:urls=/metrics,namespace=system,verbs=get"], &[]);
        let (set, diags) = collect(&index, &GateState::new());
        assert!(set.is_empty());
        assert!(diags.iter().next().unwrap().message.contains("system"));
    }

    // ── Determinism ──────────────────────────────────────────────────

    #[test]
    fn test_rerun_yields_identical_order() {
        let index = index_for(
            &[
                "+rbac:group=apps,resource=deployments,verbs=get",
                "+rbac:resource=pods,verbs=list",
                "+rbac:group=apps,resource=deployments,verbs=watch",
                "+rbac:urls=/metrics,verbs=get",
            ],
            &["+rbac:group=batch,resource=jobs;cronjobs,verbs=*"],
        );
        let gates = GateState::new();
        let (a, _) = collect(&index, &gates);
        let (b, _) = collect(&index, &gates);
        assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
    }
}
