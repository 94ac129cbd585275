//! Webhook assembly: markers in, two ordered entry lists out.

use std::collections::HashSet;

use markgen_core::{Diagnostic, Diagnostics};
use markgen_gates::GateState;
use markgen_markers::{Contributor, MarkerIndex};

use crate::entry::{WebhookEntry, WebhookError, WebhookKind};
use crate::markers::WEBHOOK;

/// Accepted entries in encounter order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WebhookLists {
    /// Entries for the mutating configuration.
    pub mutating: Vec<WebhookEntry>,
    /// Entries for the validating configuration.
    pub validating: Vec<WebhookEntry>,
}

impl WebhookLists {
    /// Whether both lists are empty.
    pub fn is_empty(&self) -> bool {
        self.mutating.is_empty() && self.validating.is_empty()
    }

    /// Entries across both lists.
    pub fn len(&self) -> usize {
        self.mutating.len() + self.validating.len()
    }

    /// Names of both lists, mutating first, for order comparisons.
    pub fn names(&self) -> Vec<&str> {
        self.mutating
            .iter()
            .chain(&self.validating)
            .map(|e| e.name.as_str())
            .collect()
    }
}

/// Build the mutating and validating lists from every `webhook` marker.
///
/// Each occurrence is parsed, rejected straight away when an accepted entry
/// in its list already has the name, and otherwise validated and accepted.
/// Rejected entries become diagnostics at their location. Gated-off markers
/// produce nothing.
pub fn assemble(index: &MarkerIndex, gates: &GateState) -> (WebhookLists, Diagnostics) {
    let mut lists = WebhookLists::default();
    let mut diagnostics = Diagnostics::new();
    let mut taken: HashSet<(WebhookKind, String)> = HashSet::new();
    let (mut accepted, mut rejected, mut gated) = (0usize, 0usize, 0usize);

    for value in index.contributions(Contributor::Webhook).filter(|v| v.name == WEBHOOK) {
        if let Some(gate) = value.gate("featureGate") {
            if !gate.evaluate(gates) {
                gated += 1;
                continue;
            }
        }

        let outcome = WebhookEntry::from_marker(value).and_then(|mut entry| {
            if taken.contains(&(entry.kind, entry.name.clone())) {
                let err = WebhookError::DuplicateName {
                    kind: entry.kind,
                    name: entry.name.clone(),
                };
                entry.reject(err.clone())?;
                return Err(err);
            }
            entry.validate()?;
            taken.insert((entry.kind, entry.name.clone()));
            entry.accept()?;
            Ok(entry)
        });

        match outcome {
            Ok(entry) => {
                accepted += 1;
                tracing::debug!(name = %entry.name, kind = %entry.kind, "accepted webhook");
                match entry.kind {
                    WebhookKind::Mutating => lists.mutating.push(entry),
                    WebhookKind::Validating => lists.validating.push(entry),
                }
            }
            Err(err) => {
                rejected += 1;
                diagnostics.push(Diagnostic::new(err.kind(), value.location.clone(), err.to_string()));
            }
        }
    }

    tracing::debug!(accepted, rejected, gated, "assembled webhooks");
    (lists, diagnostics)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::markers::WebhookMarkers;
    use markgen_core::{DiagnosticKind, PackageNode, TypeGraph, TypeNode};
    use markgen_markers::{MarkerParser, Registry};

    const PKG: &str = "example.com/v1";

    fn hook(name: &str, extra: &str) -> String {
        format!(
            "+webhook:name={name},path=/{name},groups=example.com,versions=v1,resources=widgets,\
             verbs=create,sideEffects=None,admissionReviewVersions=v1{extra}"
        )
    }

    fn index(package_doc: &[String], type_doc: &[String]) -> MarkerIndex {
        let mut pkg = PackageNode::new(PKG);
        for line in package_doc {
            pkg = pkg.doc(line.as_str());
        }
        let mut node = TypeNode::record(PKG, "Widget", vec![]);
        for line in type_doc {
            node = node.doc(line.as_str());
        }
        let graph = TypeGraph::new(vec![pkg.with_type(node)]).unwrap();
        let registry = Registry::compose(&[&WebhookMarkers]).unwrap();
        let parser = MarkerParser::new(&registry);
        let (index, diagnostics) = MarkerIndex::collect(&graph, &parser);
        assert!(diagnostics.is_empty(), "{diagnostics}");
        index
    }

    #[test]
    fn test_split_by_kind_in_encounter_order() {
        let idx = index(
            &[hook("m1", ",mutating=true"), hook("v1", "")],
            &[hook("v2", ""), hook("m2", ",mutating=true")],
        );
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert!(diags.is_empty(), "{diags}");
        assert_eq!(lists.names(), ["m1", "m2", "v1", "v2"]);
        assert!(lists.mutating.iter().chain(&lists.validating).all(WebhookEntry::is_accepted));
    }

    #[test]
    fn test_timeout_scenario() {
        let idx = index(&[hook("slow", ",timeoutSeconds=45"), hook("fine", ",timeoutSeconds=10")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert_eq!(lists.names(), ["fine"]);
        let diag = diags.iter().next().unwrap();
        assert_eq!(diag.kind, DiagnosticKind::Semantic);
        assert!(diag.message.contains("timeoutSeconds 45"));
    }

    #[test]
    fn test_duplicate_name_rejects_later_entry() {
        let idx = index(&[hook("dup", ""), hook("dup", ",timeoutSeconds=5")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert_eq!(lists.validating.len(), 1);
        assert_eq!(lists.validating[0].timeout_seconds, 10);
        assert!(diags.iter().next().unwrap().message.contains("already taken"));
    }

    #[test]
    fn test_duplicate_rejected_before_field_checks() {
        let idx = index(&[hook("dup", ""), hook("dup", ",timeoutSeconds=45")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert_eq!(lists.names(), ["dup"]);
        assert_eq!(diags.len(), 1);
        let message = &diags.iter().next().unwrap().message;
        assert!(message.contains("already taken"), "{message}");
        assert!(!message.contains("timeoutSeconds"));
    }

    #[test]
    fn test_rejected_entry_does_not_take_name() {
        let idx = index(&[hook("late", ",timeoutSeconds=45"), hook("late", "")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert_eq!(lists.names(), ["late"]);
        assert!(diags.iter().next().unwrap().message.contains("timeoutSeconds 45"));
    }

    #[test]
    fn test_same_name_allowed_across_lists() {
        let idx = index(&[hook("shared", ""), hook("shared", ",mutating=true")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert!(diags.is_empty());
        assert_eq!(lists.len(), 2);
    }

    #[test]
    fn test_gated_off_marker_skipped() {
        let idx = index(&[hook("beta", ",featureGate=betaHooks")], &[]);
        let (off, diags) = assemble(&idx, &GateState::new());
        assert!(off.is_empty());
        assert!(diags.is_empty());
        let (on, _) = assemble(&idx, &GateState::parse("betaHooks=true"));
        assert_eq!(on.names(), ["beta"]);
    }

    #[test]
    fn test_selector_error_reported_as_syntax() {
        let idx = index(&[hook("sel", ",namespaceSelector=matchExpressions~operator=In.values=a")], &[]);
        let (lists, diags) = assemble(&idx, &GateState::new());
        assert!(lists.is_empty());
        assert_eq!(diags.of_kind(DiagnosticKind::Syntax).count(), 1);
    }

    #[test]
    fn test_rerun_is_stable() {
        let idx = index(
            &[hook("a", ""), hook("b", ",mutating=true"), hook("c", ",timeoutSeconds=99")],
            &[hook("d", ""), hook("a", "")],
        );
        let gates = GateState::new();
        let first = assemble(&idx, &gates);
        let second = assemble(&idx, &gates);
        assert_eq!(first.0, second.0);
        assert_eq!(first.1.len(), second.1.len());
        assert_eq!(first.0.names(), ["b", "a", "d"]);
    }
}
