//! # Webhook Entry Lifecycle
//!
//! One [`WebhookEntry`] is built per `webhook` marker occurrence and moves
//! through a small state machine before it reaches an output list.
//!
//! ## States
//!
//! ```text
//! Parsed ──▶ Validated ──▶ Accepted
//!   │
//!   └──▶ Rejected (terminal)
//! ```
//!
//! Every rejection leaves from `Parsed`: a failed field check, or a name
//! already taken in the entry's output list. `Validated` only moves on to
//! `Accepted`.

use markgen_core::{DiagnosticKind, Location};
use markgen_markers::MarkerValue;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::selector::{LabelSelector, SelectorError};

/// Inclusive bounds of `timeoutSeconds`.
pub const TIMEOUT_RANGE: std::ops::RangeInclusive<i64> = 1..=30;

/// Timeout applied when the marker gives none.
pub const DEFAULT_TIMEOUT_SECONDS: i64 = 10;

/// The v1 admission API surface, and the default.
pub const WEBHOOK_V1: &str = "v1";
/// The legacy v1beta1 admission API surface.
pub const WEBHOOK_V1BETA1: &str = "v1beta1";

// ─── Entry State ─────────────────────────────────────────────────────

/// The lifecycle state of a webhook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntryState {
    /// Decoded from a marker, not yet checked.
    Parsed,
    /// Passed every field check.
    Validated,
    /// Placed in an output list (terminal).
    Accepted,
    /// Omitted from output (terminal).
    Rejected,
}

impl EntryState {
    /// Whether no further transition is allowed.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Accepted | Self::Rejected)
    }
}

impl std::fmt::Display for EntryState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Parsed => "PARSED",
            Self::Validated => "VALIDATED",
            Self::Accepted => "ACCEPTED",
            Self::Rejected => "REJECTED",
        };
        f.write_str(s)
    }
}

// ─── Enumerations ────────────────────────────────────────────────────

/// Which configuration list an entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WebhookKind {
    /// May change the admitted object.
    Mutating,
    /// May only admit or deny.
    Validating,
}

impl std::fmt::Display for WebhookKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Mutating => "mutating",
            Self::Validating => "validating",
        })
    }
}

/// Declared side effects of calling the webhook.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SideEffectClass {
    /// The call has no side effects.
    None,
    /// Side effects are skipped for dry-run requests.
    NoneOnDryRun,
    /// The call has side effects (legacy).
    Some,
    /// Side effects are not declared (legacy).
    Unknown,
}

impl SideEffectClass {
    /// `Some` and `Unknown` are not accepted on the v1 surface.
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Some | Self::Unknown)
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "None" => Some(Self::None),
            "NoneOnDryRun" => Some(Self::NoneOnDryRun),
            "Some" => Some(Self::Some),
            "Unknown" => Some(Self::Unknown),
            _ => None,
        }
    }
}

/// What the API server does when the webhook call fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FailurePolicy {
    /// Deny the request.
    Fail,
    /// Admit the request as if the webhook were absent.
    Ignore,
}

/// How request versions are matched against the rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatchPolicy {
    /// Only the versions listed in the rules.
    Exact,
    /// Any version the server can convert to a listed one.
    Equivalent,
}

/// Whether a mutating webhook may be called again after later mutations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReinvocationPolicy {
    /// Call once per admission.
    Never,
    /// Call again when a later mutating webhook changed the object.
    IfNeeded,
}

// ─── Errors ──────────────────────────────────────────────────────────

/// Why a webhook entry was rejected.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum WebhookError {
    /// A selector argument did not parse.
    #[error("{argument}: {source}")]
    Selector {
        /// `namespaceSelector` or `objectSelector`.
        argument: &'static str,
        /// The selector parse error.
        #[source]
        source: SelectorError,
    },

    /// sideEffects outside the enumerated set.
    #[error("sideEffects {value:?} is not one of None, NoneOnDryRun, Some, Unknown")]
    InvalidSideEffects {
        /// The value as written.
        value: String,
    },

    /// A legacy sideEffects value on the v1 surface.
    #[error("sideEffects {value} is not allowed for v1 webhooks; use None or NoneOnDryRun")]
    LegacySideEffects {
        /// `Some` or `Unknown`.
        value: String,
    },

    /// timeoutSeconds outside [`TIMEOUT_RANGE`].
    #[error("timeoutSeconds {value} is outside the range 1..=30")]
    TimeoutOutOfRange {
        /// The timeout as written.
        value: i64,
    },

    /// admissionReviewVersions missing or empty.
    #[error("admissionReviewVersions must list at least one version")]
    NoAdmissionReviewVersions,

    /// Both path and url were set.
    #[error("webhook sets both path {path:?} and url {url:?}")]
    ConflictingClientConfig {
        /// The service path.
        path: String,
        /// The external URL.
        url: String,
    },

    /// Neither path nor url was set.
    #[error("webhook sets neither path nor url")]
    MissingClientConfig,

    /// failurePolicy other than Fail or Ignore.
    #[error("failurePolicy {value:?} is not one of Fail, Ignore")]
    InvalidFailurePolicy {
        /// The value as written.
        value: String,
    },

    /// matchPolicy other than Exact or Equivalent.
    #[error("matchPolicy {value:?} is not one of Exact, Equivalent")]
    InvalidMatchPolicy {
        /// The value as written.
        value: String,
    },

    /// reinvocationPolicy other than Never or IfNeeded.
    #[error("reinvocationPolicy {value:?} is not one of Never, IfNeeded")]
    InvalidReinvocationPolicy {
        /// The value as written.
        value: String,
    },

    /// reinvocationPolicy on a validating webhook.
    #[error("reinvocationPolicy is only allowed on mutating webhooks")]
    ReinvocationOnValidating,

    /// A verb that is not an admission operation.
    #[error("verb {value:?} is not an admission operation")]
    InvalidOperation {
        /// The verb as written.
        value: String,
    },

    /// webhookVersions other than v1 or v1beta1.
    #[error("webhookVersions entry {value:?} is not one of v1, v1beta1")]
    UnknownWebhookVersion {
        /// The version as written.
        value: String,
    },

    /// A name already used by an earlier entry in the same list.
    #[error("{kind} webhook name {name:?} is already taken")]
    DuplicateName {
        /// The list the name is taken in.
        kind: WebhookKind,
        /// The repeated name.
        name: String,
    },

    /// Attempted transition is not valid from the current state.
    #[error("invalid webhook transition: {from} -> {to}")]
    InvalidTransition {
        /// Current state.
        from: String,
        /// Attempted target state.
        to: String,
    },

    /// The entry is in a terminal state.
    #[error("webhook entry is in terminal state {state}")]
    TerminalState {
        /// The terminal state.
        state: String,
    },
}

impl WebhookError {
    /// Diagnostic classification: selector errors are syntax, the rest semantic.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Selector { .. } => DiagnosticKind::Syntax,
            _ => DiagnosticKind::Semantic,
        }
    }
}

/// Record of an entry state transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryTransition {
    /// State before the transition.
    pub from_state: EntryState,
    /// State after the transition.
    pub to_state: EntryState,
    /// Why the entry moved, e.g. the rejection message.
    pub reason: String,
}

// ─── Webhook Entry ───────────────────────────────────────────────────

/// One decoded admission webhook.
///
/// Raw policy strings are kept as written until [`validate`](Self::validate)
/// resolves them into the typed fields.
#[derive(Debug, Clone, PartialEq)]
pub struct WebhookEntry {
    /// Current lifecycle state.
    pub state: EntryState,
    /// Where the marker was written.
    pub location: Location,
    /// Output list the entry belongs to.
    pub kind: WebhookKind,
    /// Fully qualified webhook name, unique per list.
    pub name: String,
    /// Service path, exclusive with `url`.
    pub path: Option<String>,
    /// External URL, exclusive with `path`.
    pub url: Option<String>,
    /// API groups the rules match.
    pub groups: Vec<String>,
    /// API versions the rules match.
    pub versions: Vec<String>,
    /// Resources the rules match.
    pub resources: Vec<String>,
    /// Operations as written in `verbs`.
    pub verbs: Vec<String>,
    /// Call timeout, within [`TIMEOUT_RANGE`] once validated.
    pub timeout_seconds: i64,
    /// AdmissionReview versions the webhook understands.
    pub admission_review_versions: Vec<String>,
    /// Admission API surfaces the entry is declared against.
    pub webhook_versions: Vec<String>,
    /// Limits calls to matching namespaces.
    pub namespace_selector: Option<LabelSelector>,
    /// Limits calls to matching objects.
    pub object_selector: Option<LabelSelector>,
    raw_side_effects: String,
    raw_failure_policy: Option<String>,
    raw_match_policy: Option<String>,
    raw_reinvocation_policy: Option<String>,
    /// Resolved by validation.
    pub side_effects: Option<SideEffectClass>,
    /// `Fail` unless the marker says otherwise.
    pub failure_policy: FailurePolicy,
    /// Left to the server default when unset.
    pub match_policy: Option<MatchPolicy>,
    /// Mutating entries only.
    pub reinvocation_policy: Option<ReinvocationPolicy>,
    /// Admission operations derived from `verbs` during validation.
    pub operations: Vec<String>,
    /// Why the entry was rejected, once it is.
    pub rejection: Option<WebhookError>,
    /// Ordered log of all state transitions.
    pub transitions: Vec<EntryTransition>,
}

impl WebhookEntry {
    /// Decode a `webhook` marker into a `Parsed` entry.
    ///
    /// Selector syntax is checked here since the structured selector is
    /// part of the parsed record.
    pub fn from_marker(value: &MarkerValue) -> Result<Self, WebhookError> {
        let selector = |argument: &'static str| -> Result<Option<LabelSelector>, WebhookError> {
            value
                .record(argument)
                .map(LabelSelector::from_record)
                .transpose()
                .map_err(|source| WebhookError::Selector { argument, source })
        };
        let webhook_versions = match value.list("webhookVersions") {
            [] => vec![WEBHOOK_V1.to_string()],
            listed => listed.to_vec(),
        };

        Ok(Self {
            state: EntryState::Parsed,
            location: value.location.clone(),
            kind: if value.flag("mutating") {
                WebhookKind::Mutating
            } else {
                WebhookKind::Validating
            },
            name: value.string("name").unwrap_or_default().to_string(),
            path: value.string("path").map(str::to_string),
            url: value.string("url").map(str::to_string),
            groups: value.list("groups").to_vec(),
            versions: value.list("versions").to_vec(),
            resources: value.list("resources").to_vec(),
            verbs: value.list("verbs").to_vec(),
            timeout_seconds: value.int("timeoutSeconds").unwrap_or(DEFAULT_TIMEOUT_SECONDS),
            admission_review_versions: value.list("admissionReviewVersions").to_vec(),
            webhook_versions,
            namespace_selector: selector("namespaceSelector")?,
            object_selector: selector("objectSelector")?,
            raw_side_effects: value.string("sideEffects").unwrap_or_default().to_string(),
            raw_failure_policy: value.string("failurePolicy").map(str::to_string),
            raw_match_policy: value.string("matchPolicy").map(str::to_string),
            raw_reinvocation_policy: value.string("reinvocationPolicy").map(str::to_string),
            side_effects: None,
            failure_policy: FailurePolicy::Fail,
            match_policy: None,
            reinvocation_policy: None,
            operations: Vec::new(),
            rejection: None,
            transitions: Vec::new(),
        })
    }

    /// Run every field check. Success moves to `Validated`; the first
    /// failure moves to `Rejected` and is returned.
    pub fn validate(&mut self) -> Result<(), WebhookError> {
        self.require_state(EntryState::Parsed, "VALIDATED")?;
        match self.check() {
            Ok(()) => {
                self.do_transition(EntryState::Validated, "all checks passed");
                Ok(())
            }
            Err(err) => {
                self.do_transition(EntryState::Rejected, &err.to_string());
                self.rejection = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Place a validated entry into its output list.
    pub fn accept(&mut self) -> Result<(), WebhookError> {
        self.require_state(EntryState::Validated, "ACCEPTED")?;
        self.do_transition(EntryState::Accepted, "placed in output list");
        Ok(())
    }

    /// Omit a parsed entry from output without running the field checks.
    pub fn reject(&mut self, reason: WebhookError) -> Result<(), WebhookError> {
        self.require_state(EntryState::Parsed, "REJECTED")?;
        self.do_transition(EntryState::Rejected, &reason.to_string());
        self.rejection = Some(reason);
        Ok(())
    }

    /// Whether the entry reached an output list.
    pub fn is_accepted(&self) -> bool {
        self.state == EntryState::Accepted
    }

    /// Whether the entry is declared against the v1 surface.
    pub fn targets_v1(&self) -> bool {
        self.webhook_versions.iter().any(|v| v == WEBHOOK_V1)
    }

    fn check(&mut self) -> Result<(), WebhookError> {
        for version in &self.webhook_versions {
            if version != WEBHOOK_V1 && version != WEBHOOK_V1BETA1 {
                return Err(WebhookError::UnknownWebhookVersion {
                    value: version.clone(),
                });
            }
        }

        let side_effects = SideEffectClass::parse(&self.raw_side_effects).ok_or_else(|| {
            WebhookError::InvalidSideEffects {
                value: self.raw_side_effects.clone(),
            }
        })?;
        if self.targets_v1() && side_effects.is_legacy() {
            return Err(WebhookError::LegacySideEffects {
                value: self.raw_side_effects.clone(),
            });
        }

        if !TIMEOUT_RANGE.contains(&self.timeout_seconds) {
            return Err(WebhookError::TimeoutOutOfRange {
                value: self.timeout_seconds,
            });
        }

        if self.admission_review_versions.iter().all(|v| v.is_empty()) {
            return Err(WebhookError::NoAdmissionReviewVersions);
        }

        match (&self.path, &self.url) {
            (Some(path), Some(url)) => {
                return Err(WebhookError::ConflictingClientConfig {
                    path: path.clone(),
                    url: url.clone(),
                })
            }
            (None, None) => return Err(WebhookError::MissingClientConfig),
            _ => {}
        }

        let failure_policy = match self.raw_failure_policy.as_deref() {
            None => FailurePolicy::Fail,
            Some(raw) => match raw.to_ascii_lowercase().as_str() {
                "fail" => FailurePolicy::Fail,
                "ignore" => FailurePolicy::Ignore,
                _ => return Err(WebhookError::InvalidFailurePolicy { value: raw.to_string() }),
            },
        };

        let match_policy = match self.raw_match_policy.as_deref() {
            None => None,
            Some("Exact") => Some(MatchPolicy::Exact),
            Some("Equivalent") => Some(MatchPolicy::Equivalent),
            Some(raw) => return Err(WebhookError::InvalidMatchPolicy { value: raw.to_string() }),
        };

        let reinvocation_policy = match self.raw_reinvocation_policy.as_deref() {
            None => None,
            Some(_) if self.kind == WebhookKind::Validating => {
                return Err(WebhookError::ReinvocationOnValidating)
            }
            Some("Never") => Some(ReinvocationPolicy::Never),
            Some("IfNeeded") => Some(ReinvocationPolicy::IfNeeded),
            Some(raw) => {
                return Err(WebhookError::InvalidReinvocationPolicy { value: raw.to_string() })
            }
        };

        let mut operations = Vec::with_capacity(self.verbs.len());
        for verb in &self.verbs {
            operations.push(operation(verb)?);
        }

        self.side_effects = Some(side_effects);
        self.failure_policy = failure_policy;
        self.match_policy = match_policy;
        self.reinvocation_policy = reinvocation_policy;
        self.operations = operations;
        Ok(())
    }

    fn require_state(&self, expected: EntryState, target: &str) -> Result<(), WebhookError> {
        if self.state.is_terminal() {
            return Err(WebhookError::TerminalState {
                state: self.state.to_string(),
            });
        }
        if self.state != expected {
            return Err(WebhookError::InvalidTransition {
                from: self.state.to_string(),
                to: target.to_string(),
            });
        }
        Ok(())
    }

    fn do_transition(&mut self, to: EntryState, reason: &str) {
        self.transitions.push(EntryTransition {
            from_state: self.state,
            to_state: to,
            reason: reason.to_string(),
        });
        self.state = to;
    }
}

/// Map a marker verb to its admission operation name.
fn operation(verb: &str) -> Result<String, WebhookError> {
    match verb.to_ascii_lowercase().as_str() {
        "create" => Ok("CREATE".to_string()),
        "update" => Ok("UPDATE".to_string()),
        "delete" => Ok("DELETE".to_string()),
        "connect" => Ok("CONNECT".to_string()),
        "*" => Ok("*".to_string()),
        _ => Err(WebhookError::InvalidOperation {
            value: verb.to_string(),
        }),
    }
}

// ─── Tests ───────────────────────────────────────────────────────────

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::markers::WebhookMarkers;
    use markgen_markers::{MarkerParser, Registry};

    const BASE: &str = "+webhook:name=vwidget.example.com,path=/validate,groups=example.com,\
                        versions=v1,resources=widgets,verbs=create;update,sideEffects=None,\
                        admissionReviewVersions=v1";

    pub(crate) fn marker(text: &str) -> MarkerValue {
        let registry = Registry::compose(&[&WebhookMarkers]).unwrap();
        let parser = MarkerParser::new(&registry);
        parser
            .parse_line(text, &Location::package("example.com/v1"))
            .unwrap()
            .unwrap()
    }

    fn entry(extra: &str) -> WebhookEntry {
        WebhookEntry::from_marker(&marker(&format!("{BASE}{extra}"))).unwrap()
    }

    fn validation_error(extra: &str) -> WebhookError {
        let mut e = entry(extra);
        let err = e.validate().unwrap_err();
        assert_eq!(e.state, EntryState::Rejected);
        err
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    #[test]
    fn test_parsed_validated_accepted() {
        let mut e = entry("");
        assert_eq!(e.state, EntryState::Parsed);
        e.validate().unwrap();
        assert_eq!(e.state, EntryState::Validated);
        e.accept().unwrap();
        assert!(e.is_accepted());
        assert_eq!(e.transitions.len(), 2);
        assert_eq!(e.operations, ["CREATE", "UPDATE"]);
        assert_eq!(e.side_effects, Some(SideEffectClass::None));
        assert_eq!(e.failure_policy, FailurePolicy::Fail);
        assert_eq!(e.kind, WebhookKind::Validating);
    }

    #[test]
    fn test_accept_requires_validation() {
        let mut e = entry("");
        assert!(matches!(e.accept(), Err(WebhookError::InvalidTransition { .. })));
    }

    #[test]
    fn test_rejected_is_terminal() {
        let mut e = entry(",timeoutSeconds=45");
        assert!(e.validate().is_err());
        assert!(matches!(e.validate(), Err(WebhookError::TerminalState { .. })));
        assert!(matches!(e.accept(), Err(WebhookError::TerminalState { .. })));
        assert!(e.rejection.is_some());
    }

    #[test]
    fn test_reject_from_parsed() {
        let mut e = entry("");
        let reason = WebhookError::DuplicateName {
            kind: e.kind,
            name: e.name.clone(),
        };
        e.reject(reason.clone()).unwrap();
        assert_eq!(e.state, EntryState::Rejected);
        assert_eq!(e.rejection, Some(reason));
        assert_eq!(e.transitions.len(), 1);
        assert_eq!(e.transitions[0].from_state, EntryState::Parsed);
    }

    #[test]
    fn test_validated_entry_cannot_be_rejected() {
        let mut e = entry("");
        e.validate().unwrap();
        let err = e
            .reject(WebhookError::DuplicateName {
                kind: e.kind,
                name: e.name.clone(),
            })
            .unwrap_err();
        assert!(matches!(err, WebhookError::InvalidTransition { .. }));
        assert_eq!(e.state, EntryState::Validated);
        e.accept().unwrap();
        assert!(matches!(
            e.reject(WebhookError::MissingClientConfig),
            Err(WebhookError::TerminalState { .. })
        ));
    }

    // ── Checks ───────────────────────────────────────────────────────

    #[test]
    fn test_timeout_range() {
        assert_eq!(validation_error(",timeoutSeconds=45"), WebhookError::TimeoutOutOfRange { value: 45 });
        assert_eq!(validation_error(",timeoutSeconds=0"), WebhookError::TimeoutOutOfRange { value: 0 });
        let mut ok = entry(",timeoutSeconds=10");
        ok.validate().unwrap();
        assert_eq!(ok.timeout_seconds, 10);
        let mut edge = entry(",timeoutSeconds=30");
        edge.validate().unwrap();
    }

    #[test]
    fn test_timeout_default() {
        let e = entry("");
        assert_eq!(e.timeout_seconds, DEFAULT_TIMEOUT_SECONDS);
    }

    #[test]
    fn test_side_effects_enumeration() {
        let mut e = WebhookEntry::from_marker(&marker(&BASE.replace("sideEffects=None", "sideEffects=Maybe"))).unwrap();
        assert_eq!(
            e.validate().unwrap_err(),
            WebhookError::InvalidSideEffects { value: "Maybe".into() }
        );
    }

    #[test]
    fn test_legacy_side_effects_rejected_on_v1_only() {
        let some = BASE.replace("sideEffects=None", "sideEffects=Some");
        let mut v1 = WebhookEntry::from_marker(&marker(&some)).unwrap();
        assert_eq!(
            v1.validate().unwrap_err(),
            WebhookError::LegacySideEffects { value: "Some".into() }
        );

        let mut beta = WebhookEntry::from_marker(&marker(&format!("{some},webhookVersions=v1beta1"))).unwrap();
        beta.validate().unwrap();
        assert_eq!(beta.side_effects, Some(SideEffectClass::Some));
    }

    #[test]
    fn test_admission_review_versions_required() {
        let text = BASE.replace(",admissionReviewVersions=v1", "");
        let mut e = WebhookEntry::from_marker(&marker(&text)).unwrap();
        assert_eq!(e.validate().unwrap_err(), WebhookError::NoAdmissionReviewVersions);
    }

    #[test]
    fn test_exactly_one_of_path_or_url() {
        assert!(matches!(
            validation_error(",url=https://hooks.example.com/validate"),
            WebhookError::ConflictingClientConfig { .. }
        ));
        let text = BASE.replace("path=/validate,", "");
        let mut e = WebhookEntry::from_marker(&marker(&text)).unwrap();
        assert_eq!(e.validate().unwrap_err(), WebhookError::MissingClientConfig);
    }

    #[test]
    fn test_reinvocation_only_on_mutating() {
        assert_eq!(
            validation_error(",reinvocationPolicy=IfNeeded"),
            WebhookError::ReinvocationOnValidating
        );
        let mut m = entry(",mutating=true,reinvocationPolicy=IfNeeded");
        m.validate().unwrap();
        assert_eq!(m.kind, WebhookKind::Mutating);
        assert_eq!(m.reinvocation_policy, Some(ReinvocationPolicy::IfNeeded));
    }

    #[test]
    fn test_failure_policy_case_insensitive() {
        let mut e = entry(",failurePolicy=ignore");
        e.validate().unwrap();
        assert_eq!(e.failure_policy, FailurePolicy::Ignore);
        assert!(matches!(
            validation_error(",failurePolicy=retry"),
            WebhookError::InvalidFailurePolicy { .. }
        ));
    }

    #[test]
    fn test_match_policy() {
        let mut e = entry(",matchPolicy=Equivalent");
        e.validate().unwrap();
        assert_eq!(e.match_policy, Some(MatchPolicy::Equivalent));
        assert!(matches!(validation_error(",matchPolicy=Fuzzy"), WebhookError::InvalidMatchPolicy { .. }));
    }

    #[test]
    fn test_unknown_verb() {
        let text = BASE.replace("verbs=create;update", "verbs=create;patch");
        let mut e = WebhookEntry::from_marker(&marker(&text)).unwrap();
        assert_eq!(e.validate().unwrap_err(), WebhookError::InvalidOperation { value: "patch".into() });
    }

    #[test]
    fn test_unknown_webhook_version() {
        assert!(matches!(
            validation_error(",webhookVersions=v2"),
            WebhookError::UnknownWebhookVersion { .. }
        ));
    }

    // ── Selectors ────────────────────────────────────────────────────

    #[test]
    fn test_selector_parsed_into_entry() {
        let e = entry(",namespaceSelector=matchExpressions~key=env.operator=In.values=prod|staging");
        let selector = e.namespace_selector.unwrap();
        assert_eq!(selector.match_expressions[0].values, ["prod", "staging"]);
    }

    #[test]
    fn test_bad_selector_is_syntax() {
        let err = WebhookEntry::from_marker(&marker(&format!(
            "{BASE},objectSelector=matchExpressions~key=env.operator=Near"
        )))
        .unwrap_err();
        assert_eq!(err.kind(), DiagnosticKind::Syntax);
        assert!(err.to_string().starts_with("objectSelector: "));
    }
}

#[cfg(test)]
mod proptests {
    use super::tests::marker;
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Validation accepts a timeout exactly when it lies in range.
        #[test]
        fn timeout_accepted_iff_in_range(timeout in 0i64..=60) {
            let text = format!(
                "+webhook:name=w.example.com,path=/v,groups=example.com,versions=v1,\
                 resources=widgets,verbs=create,sideEffects=None,admissionReviewVersions=v1,\
                 timeoutSeconds={timeout}"
            );
            let mut entry = WebhookEntry::from_marker(&marker(&text)).unwrap();
            let result = entry.validate();
            prop_assert_eq!(result.is_ok(), TIMEOUT_RANGE.contains(&timeout));
            let expected = if result.is_ok() { EntryState::Validated } else { EntryState::Rejected };
            prop_assert_eq!(entry.state, expected);
        }
    }
}
