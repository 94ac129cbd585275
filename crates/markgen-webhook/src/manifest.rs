//! Admission webhook configuration documents.
//!
//! Accepted entries render into one `MutatingWebhookConfiguration` and one
//! `ValidatingWebhookConfiguration` per admission API version they target.
//! Path-based entries point at the configured service.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::assemble::WebhookLists;
use crate::entry::{
    FailurePolicy, MatchPolicy, ReinvocationPolicy, SideEffectClass, WebhookEntry, WebhookKind,
    WEBHOOK_V1,
};
use crate::selector::LabelSelector;

const ADMISSION_GROUP: &str = "admissionregistration.k8s.io";

/// Names used when rendering configurations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestOptions {
    /// `metadata.name` of each configuration.
    pub config_name: String,
    /// Service that serves path-based webhooks.
    pub service_name: String,
    pub service_namespace: String,
}

impl Default for ManifestOptions {
    fn default() -> Self {
        Self {
            config_name: "webhook-configuration".to_string(),
            service_name: "webhook-service".to_string(),
            service_namespace: "system".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceReference {
    pub name: String,
    pub namespace: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service: Option<ServiceReference>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RuleWithOperations {
    pub api_groups: Vec<String>,
    pub api_versions: Vec<String>,
    pub operations: Vec<String>,
    pub resources: Vec<String>,
}

/// One entry of a configuration's `webhooks` list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Webhook {
    pub name: String,
    pub admission_review_versions: Vec<String>,
    pub client_config: ClientConfig,
    pub failure_policy: FailurePolicy,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub match_policy: Option<MatchPolicy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub namespace_selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub object_selector: Option<LabelSelector>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reinvocation_policy: Option<ReinvocationPolicy>,
    pub rules: Vec<RuleWithOperations>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side_effects: Option<SideEffectClass>,
    pub timeout_seconds: i64,
}

impl Webhook {
    fn from_entry(entry: &WebhookEntry, options: &ManifestOptions) -> Self {
        let client_config = match &entry.url {
            Some(url) => ClientConfig {
                service: None,
                url: Some(url.clone()),
            },
            None => ClientConfig {
                service: Some(ServiceReference {
                    name: options.service_name.clone(),
                    namespace: options.service_namespace.clone(),
                    path: entry.path.clone(),
                }),
                url: None,
            },
        };
        Self {
            name: entry.name.clone(),
            admission_review_versions: entry.admission_review_versions.clone(),
            client_config,
            failure_policy: entry.failure_policy,
            match_policy: entry.match_policy,
            namespace_selector: entry.namespace_selector.clone(),
            object_selector: entry.object_selector.clone(),
            reinvocation_policy: entry.reinvocation_policy,
            rules: vec![RuleWithOperations {
                api_groups: entry.groups.clone(),
                api_versions: entry.versions.clone(),
                operations: entry.operations.clone(),
                resources: entry.resources.clone(),
            }],
            side_effects: entry.side_effects,
            timeout_seconds: entry.timeout_seconds,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigMeta {
    pub name: String,
}

/// A `MutatingWebhookConfiguration` or `ValidatingWebhookConfiguration`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WebhookConfiguration {
    pub api_version: String,
    pub kind: String,
    pub metadata: ConfigMeta,
    pub webhooks: Vec<Webhook>,
}

/// Render accepted entries: mutating configurations first, then
/// validating, each grouped by admission API version with `v1` first.
pub fn render_configurations(
    lists: &WebhookLists,
    options: &ManifestOptions,
) -> Vec<WebhookConfiguration> {
    let mut out = Vec::new();
    for (kind, entries) in [
        (WebhookKind::Mutating, &lists.mutating),
        (WebhookKind::Validating, &lists.validating),
    ] {
        let mut by_version: IndexMap<&str, Vec<Webhook>> = IndexMap::new();
        by_version.insert(WEBHOOK_V1, Vec::new());
        for entry in entries.iter().filter(|e| e.is_accepted()) {
            for version in &entry.webhook_versions {
                by_version
                    .entry(version.as_str())
                    .or_default()
                    .push(Webhook::from_entry(entry, options));
            }
        }
        let kind_name = match kind {
            WebhookKind::Mutating => "MutatingWebhookConfiguration",
            WebhookKind::Validating => "ValidatingWebhookConfiguration",
        };
        for (version, webhooks) in by_version {
            if webhooks.is_empty() {
                continue;
            }
            out.push(WebhookConfiguration {
                api_version: format!("{ADMISSION_GROUP}/{version}"),
                kind: kind_name.to_string(),
                metadata: ConfigMeta {
                    name: options.config_name.clone(),
                },
                webhooks,
            });
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entry::tests::marker;

    fn accepted(text: &str) -> WebhookEntry {
        let mut entry = WebhookEntry::from_marker(&marker(text)).unwrap();
        entry.validate().unwrap();
        entry.accept().unwrap();
        entry
    }

    fn lists() -> WebhookLists {
        WebhookLists {
            mutating: vec![accepted(
                "+webhook:mutating=true,name=mwidget.example.com,path=/mutate,groups=example.com,\
                 versions=v1,resources=widgets,verbs=create,sideEffects=None,\
                 admissionReviewVersions=v1,reinvocationPolicy=IfNeeded",
            )],
            validating: vec![
                accepted(
                    "+webhook:name=vwidget.example.com,url=https://hooks.example.com/validate,\
                     groups=example.com,versions=v1,resources=widgets,verbs=create;update,\
                     sideEffects=NoneOnDryRun,admissionReviewVersions=v1;v1beta1,failurePolicy=Ignore",
                ),
                accepted(
                    "+webhook:name=legacy.example.com,path=/legacy,groups=example.com,versions=v1,\
                     resources=gadgets,verbs=delete,sideEffects=Unknown,admissionReviewVersions=v1beta1,\
                     webhookVersions=v1beta1",
                ),
            ],
        }
    }

    #[test]
    fn test_documents_by_kind_and_version() {
        let docs = render_configurations(&lists(), &ManifestOptions::default());
        let heads: Vec<(&str, &str)> = docs
            .iter()
            .map(|d| (d.kind.as_str(), d.api_version.as_str()))
            .collect();
        assert_eq!(
            heads,
            [
                ("MutatingWebhookConfiguration", "admissionregistration.k8s.io/v1"),
                ("ValidatingWebhookConfiguration", "admissionregistration.k8s.io/v1"),
                ("ValidatingWebhookConfiguration", "admissionregistration.k8s.io/v1beta1"),
            ]
        );
    }

    #[test]
    fn test_client_config_uses_service_for_paths() {
        let options = ManifestOptions {
            config_name: "hooks".into(),
            service_name: "svc".into(),
            service_namespace: "ops".into(),
        };
        let docs = render_configurations(&lists(), &options);
        let service = docs[0].webhooks[0].client_config.service.as_ref().unwrap();
        assert_eq!((service.name.as_str(), service.namespace.as_str()), ("svc", "ops"));
        assert_eq!(service.path.as_deref(), Some("/mutate"));
        assert_eq!(docs[1].webhooks[0].client_config.url.as_deref(), Some("https://hooks.example.com/validate"));
        assert!(docs.iter().all(|d| d.metadata.name == "hooks"));
    }

    #[test]
    fn test_yaml_shape() {
        let docs = render_configurations(&lists(), &ManifestOptions::default());
        let yaml = serde_yaml::to_string(&docs[0]).unwrap();
        assert!(yaml.contains("reinvocationPolicy: IfNeeded"));
        assert!(yaml.contains("failurePolicy: Fail"));
        assert!(yaml.contains("- CREATE"));
        assert!(yaml.contains("timeoutSeconds: 10"));

        let validating = serde_yaml::to_string(&docs[1]).unwrap();
        assert!(validating.contains("failurePolicy: Ignore"));
        assert!(!validating.contains("reinvocationPolicy"));

        let json = serde_json::to_value(&docs[1].webhooks[0]).unwrap();
        assert_eq!(json["sideEffects"], "NoneOnDryRun");
        assert_eq!(json["admissionReviewVersions"], serde_json::json!(["v1", "v1beta1"]));
    }

    #[test]
    fn test_empty_lists_render_nothing() {
        assert!(render_configurations(&WebhookLists::default(), &ManifestOptions::default()).is_empty());
    }
}
