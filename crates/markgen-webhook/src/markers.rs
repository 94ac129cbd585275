//! The `webhook` marker definition.

use markgen_core::Applicability::{Declaration, Package};
use markgen_markers::{ArgKind, Contributor, MarkerDefinition, MarkerProvider};

pub const WEBHOOK: &str = "webhook";

/// Provider for the admission webhook markers.
#[derive(Debug, Clone, Copy, Default)]
pub struct WebhookMarkers;

impl MarkerProvider for WebhookMarkers {
    fn name(&self) -> &'static str {
        "webhook"
    }

    fn definitions(&self) -> Vec<MarkerDefinition> {
        let def = MarkerDefinition::new(WEBHOOK, Package, Contributor::Webhook)
            .arg("name", ArgKind::String)
            .optional("mutating", ArgKind::Bool)
            .optional("path", ArgKind::String)
            .optional("url", ArgKind::String)
            .arg("groups", ArgKind::StringList)
            .arg("versions", ArgKind::StringList)
            .arg("resources", ArgKind::StringList)
            .arg("verbs", ArgKind::StringList)
            .optional("failurePolicy", ArgKind::String)
            .arg("sideEffects", ArgKind::String)
            .optional("timeoutSeconds", ArgKind::Int)
            .optional("admissionReviewVersions", ArgKind::StringList)
            .optional("reinvocationPolicy", ArgKind::String)
            .optional("matchPolicy", ArgKind::String)
            .optional("namespaceSelector", ArgKind::SubRecord)
            .optional("objectSelector", ArgKind::SubRecord)
            .optional("webhookVersions", ArgKind::StringList)
            .optional("featureGate", ArgKind::GateExpression)
            .help("webhook", "register an admission webhook")
            .details(
                "Exactly one of path (served by the configured service) or url must be set. \
                 verbs are admission operations such as create or update.",
            );
        vec![def.at(Package), def.at(Declaration)]
    }
}
