//! # Access Rules
//!
//! One [`AccessRule`] is a single permission: verbs over a group/resource
//! (optionally narrowed to named objects and a namespace), or verbs over a
//! non-resource URL. An [`AccessRuleSet`] folds rules together under the
//! merge relation.
//!
//! ## Merge relation
//!
//! Two rules merge iff their [`RuleKey`]s are equal: group, resource,
//! resource-name set, namespace and URL pairwise. Merging unions the verb
//! sets. The merged rule keeps the position of the first-seen member, so
//! folding the same candidates twice yields the same order.

use std::collections::BTreeSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Group sentinel that denotes the core (empty) API group.
pub const CORE_GROUP: &str = "core";

/// Normalize a group name: `core` denotes the empty core group.
pub fn normalize_group(group: &str) -> &str {
    if group == CORE_GROUP {
        ""
    } else {
        group
    }
}

/// A single permission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessRule {
    /// API group; empty is the core group.
    pub group: String,
    /// Resource name, possibly with a subresource (`pods/log`).
    pub resource: String,
    /// Named objects; empty means all objects.
    pub resource_names: BTreeSet<String>,
    /// Permitted verbs.
    pub verbs: BTreeSet<String>,
    /// Namespace; empty means cluster-scoped.
    pub namespace: String,
    /// Non-resource URL; exclusive with group and resource.
    pub url: String,
}

impl AccessRule {
    /// A resource rule. The group is normalized.
    pub fn resource<V, S>(group: &str, resource: impl Into<String>, verbs: V) -> Self
    where
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: normalize_group(group).to_string(),
            resource: resource.into(),
            resource_names: BTreeSet::new(),
            verbs: verbs.into_iter().map(Into::into).collect(),
            namespace: String::new(),
            url: String::new(),
        }
    }

    /// A non-resource URL rule.
    pub fn url<V, S>(url: impl Into<String>, verbs: V) -> Self
    where
        V: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            group: String::new(),
            resource: String::new(),
            resource_names: BTreeSet::new(),
            verbs: verbs.into_iter().map(Into::into).collect(),
            namespace: String::new(),
            url: url.into(),
        }
    }

    /// Builder: restrict to a namespace.
    pub fn in_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    /// Builder: restrict to named objects.
    pub fn named<I, S>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.resource_names = names.into_iter().map(Into::into).collect();
        self
    }

    /// The identity under which rules merge.
    pub fn key(&self) -> RuleKey {
        RuleKey {
            group: self.group.clone(),
            resource: self.resource.clone(),
            resource_names: self.resource_names.clone(),
            namespace: self.namespace.clone(),
            url: self.url.clone(),
        }
    }

    /// Whether this rule names a non-resource URL.
    pub fn is_url(&self) -> bool {
        !self.url.is_empty()
    }

    /// Whether this rule applies cluster-wide.
    pub fn is_cluster_scoped(&self) -> bool {
        self.namespace.is_empty()
    }
}

impl std::fmt::Display for AccessRule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let verbs: Vec<&str> = self.verbs.iter().map(String::as_str).collect();
        if self.is_url() {
            return write!(f, "{} [{}]", self.url, verbs.join(","));
        }
        let group = if self.group.is_empty() { CORE_GROUP } else { &self.group };
        write!(f, "{group}/{}", self.resource)?;
        if !self.resource_names.is_empty() {
            let names: Vec<&str> = self.resource_names.iter().map(String::as_str).collect();
            write!(f, "({})", names.join(","))?;
        }
        if !self.namespace.is_empty() {
            write!(f, " in {}", self.namespace)?;
        }
        write!(f, " [{}]", verbs.join(","))
    }
}

/// Everything about a rule except its verbs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleKey {
    /// API group; empty for the core group.
    pub group: String,
    /// Resource, possibly with a `/subresource` suffix.
    pub resource: String,
    /// Named instances the rule is limited to.
    pub resource_names: BTreeSet<String>,
    /// Target namespace; empty for cluster scope.
    pub namespace: String,
    /// Non-resource URL; empty for resource rules.
    pub url: String,
}

/// Ordered, deduplicated rules.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessRuleSet {
    rules: IndexMap<RuleKey, AccessRule>,
}

impl AccessRuleSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold one rule in. Returns `true` when it merged into an existing rule.
    pub fn insert(&mut self, rule: AccessRule) -> bool {
        match self.rules.entry(rule.key()) {
            indexmap::map::Entry::Occupied(mut slot) => {
                slot.get_mut().verbs.extend(rule.verbs);
                true
            }
            indexmap::map::Entry::Vacant(slot) => {
                slot.insert(rule);
                false
            }
        }
    }

    /// Fold every rule of `other` in, keeping this set's positions.
    pub fn merge(&mut self, other: &AccessRuleSet) {
        for rule in other.iter() {
            self.insert(rule.clone());
        }
    }

    /// The merged rule stored under `key`.
    pub fn get(&self, key: &RuleKey) -> Option<&AccessRule> {
        self.rules.get(key)
    }

    /// Rules in first-seen order.
    pub fn iter(&self) -> impl Iterator<Item = &AccessRule> {
        self.rules.values()
    }

    /// Number of distinct rule keys.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// Whether no rule was inserted.
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Rules in first-seen order.
    pub fn into_vec(self) -> Vec<AccessRule> {
        self.rules.into_values().collect()
    }
}

impl Extend<AccessRule> for AccessRuleSet {
    fn extend<T: IntoIterator<Item = AccessRule>>(&mut self, iter: T) {
        for rule in iter {
            self.insert(rule);
        }
    }
}

impl FromIterator<AccessRule> for AccessRuleSet {
    fn from_iter<T: IntoIterator<Item = AccessRule>>(iter: T) -> Self {
        let mut set = Self::new();
        set.extend(iter);
        set
    }
}

impl Serialize for AccessRuleSet {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.rules.values())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ── Normalization ────────────────────────────────────────────────

    #[test]
    fn test_core_group_normalized() {
        let rule = AccessRule::resource("core", "pods", ["get"]);
        assert_eq!(rule.group, "");
        assert_eq!(rule.to_string(), "core/pods [get]");
    }

    #[test]
    fn test_other_groups_untouched() {
        assert_eq!(normalize_group("apps"), "apps");
        assert_eq!(normalize_group(""), "");
    }

    // ── Merge ────────────────────────────────────────────────────────

    #[test]
    fn test_same_key_unions_verbs() {
        let mut set = AccessRuleSet::new();
        assert!(!set.insert(AccessRule::resource("batch", "jobs", ["get"])));
        assert!(set.insert(AccessRule::resource("batch", "jobs", ["watch", "get"])));
        assert_eq!(set.len(), 1);
        let rule = set.iter().next().unwrap();
        assert_eq!(rule.verbs, BTreeSet::from(["get".to_string(), "watch".to_string()]));
    }

    #[test]
    fn test_resource_names_are_part_of_key() {
        let set: AccessRuleSet = [
            AccessRule::resource("", "configmaps", ["get"]),
            AccessRule::resource("", "configmaps", ["update"]).named(["leader"]),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
    }

    #[test]
    fn test_namespace_is_part_of_key() {
        let set: AccessRuleSet = [
            AccessRule::resource("", "secrets", ["get"]),
            AccessRule::resource("", "secrets", ["get"]).in_namespace("system"),
        ]
        .into_iter()
        .collect();
        assert_eq!(set.len(), 2);
        assert!(set.iter().next().unwrap().is_cluster_scoped());
    }

    #[test]
    fn test_merged_rule_keeps_first_position() {
        let set: AccessRuleSet = [
            AccessRule::resource("apps", "deployments", ["get"]),
            AccessRule::resource("", "pods", ["list"]),
            AccessRule::resource("apps", "deployments", ["patch"]),
        ]
        .into_iter()
        .collect();
        let order: Vec<&str> = set.iter().map(|r| r.resource.as_str()).collect();
        assert_eq!(order, ["deployments", "pods"]);
    }

    #[test]
    fn test_url_rule_display() {
        let rule = AccessRule::url("/metrics", ["get"]);
        assert!(rule.is_url());
        assert_eq!(rule.to_string(), "/metrics [get]");
    }

    #[test]
    fn test_serializes_as_ordered_list() {
        let set: AccessRuleSet = [AccessRule::resource("batch", "jobs", ["get"])].into_iter().collect();
        let json = serde_json::to_value(&set).unwrap();
        assert_eq!(json[0]["group"], "batch");
        assert_eq!(json[0]["verbs"], serde_json::json!(["get"]));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    fn rule() -> impl Strategy<Value = AccessRule> {
        (
            prop_oneof![Just(""), Just("apps"), Just("batch")],
            prop_oneof![Just("pods"), Just("jobs"), Just("deployments")],
            prop::collection::btree_set(prop_oneof![Just("get"), Just("list"), Just("watch")], 1..3),
            prop_oneof![Just(""), Just("system")],
        )
            .prop_map(|(group, resource, verbs, namespace)| {
                AccessRule::resource(group, resource, verbs).in_namespace(namespace)
            })
    }

    proptest! {
        /// Merging a set with itself changes nothing.
        #[test]
        fn merge_is_idempotent(rules in prop::collection::vec(rule(), 0..16)) {
            let set: AccessRuleSet = rules.into_iter().collect();
            let mut merged = set.clone();
            merged.merge(&set);
            prop_assert_eq!(merged, set);
        }

        /// Input order changes positions only, never the merged content.
        #[test]
        fn merge_content_is_order_independent(rules in prop::collection::vec(rule(), 0..16)) {
            let forward: AccessRuleSet = rules.iter().cloned().collect();
            let backward: AccessRuleSet = rules.iter().rev().cloned().collect();
            let mut a = forward.into_vec();
            let mut b = backward.into_vec();
            a.sort_by_key(AccessRule::key);
            b.sort_by_key(AccessRule::key);
            prop_assert_eq!(a, b);
        }

        /// Each merged group sits where its first member was seen.
        #[test]
        fn order_follows_first_seen(rules in prop::collection::vec(rule(), 0..16)) {
            let set: AccessRuleSet = rules.iter().cloned().collect();
            let mut seen = Vec::new();
            for rule in &rules {
                let key = rule.key();
                if !seen.contains(&key) {
                    seen.push(key);
                }
            }
            let order: Vec<RuleKey> = set.iter().map(AccessRule::key).collect();
            prop_assert_eq!(order, seen);
        }
    }
}
