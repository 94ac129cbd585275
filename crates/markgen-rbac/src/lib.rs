//! # markgen-rbac: Access-Rule Aggregation
//!
//! Decodes `+rbac` markers into [`AccessRule`]s, folds them into a
//! deduplicated [`AccessRuleSet`], and renders role manifests.
//!
//! ## Design
//!
//! - A marker with list-valued `group`, `resource`, or `namespace` denotes
//!   the Cartesian set of equivalent rules. `verbs` and `resourceNames`
//!   stay sets on one rule.
//! - Candidates gated off by `featureGate` are dropped before merging.
//! - Merged rules keep the position of their first-seen member, so the
//!   output order is stable across runs.
//! - A marker mixing URLs with resources is a Semantic diagnostic and
//!   contributes nothing.

pub mod collect;
pub mod markers;
pub mod role;
pub mod rule;

pub use collect::{collect, expand, RuleError};
pub use markers::RbacMarkers;
pub use role::{render_roles, PolicyRule, RoleManifest, RoleMeta, RBAC_API_VERSION};
pub use rule::{normalize_group, AccessRule, AccessRuleSet, RuleKey, CORE_GROUP};
