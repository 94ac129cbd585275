//! The `rbac` marker definition.

use markgen_core::Applicability::{Declaration, Package};
use markgen_markers::{ArgKind, Contributor, MarkerDefinition, MarkerProvider};

pub const RBAC: &str = "rbac";

/// Provider for the access-rule markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct RbacMarkers;

impl MarkerProvider for RbacMarkers {
    fn name(&self) -> &'static str {
        "rbac"
    }

    fn definitions(&self) -> Vec<MarkerDefinition> {
        let def = MarkerDefinition::new(RBAC, Package, Contributor::Rule)
            .optional("group", ArgKind::StringList)
            .optional("resource", ArgKind::StringList)
            .optional("resourceNames", ArgKind::StringList)
            .arg("verbs", ArgKind::StringList)
            .optional("urls", ArgKind::StringList)
            .optional("namespace", ArgKind::StringList)
            .optional("featureGate", ArgKind::GateExpression)
            .help("rbac", "grant the generated role a permission")
            .details(
                "Each combination of group, resource and namespace becomes one rule. \
                 Rules naming urls are cluster-scoped and may not name resources.",
            );
        vec![def.at(Package), def.at(Declaration)]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use markgen_markers::Registry;

    #[test]
    fn test_registered_at_package_and_declaration() {
        let registry = Registry::compose(&[&RbacMarkers]).unwrap();
        assert!(registry.lookup(RBAC, Package).is_some());
        assert!(registry.lookup(RBAC, Declaration).is_some());
        let def = registry.lookup(RBAC, Package).unwrap();
        assert!(def.repeatable);
        assert!(!def.arg_spec("verbs").unwrap().optional);
    }
}
