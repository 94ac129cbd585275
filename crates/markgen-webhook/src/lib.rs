//! # markgen-webhook: Webhook Assembly
//!
//! Decodes `+webhook` markers into [`WebhookEntry`] records, runs each
//! through the `Parsed -> Validated -> Accepted | Rejected` lifecycle, and
//! renders the accepted entries as admission webhook configurations.
//!
//! ## Design
//!
//! - Selector arguments (`matchLabels~k=v&matchExpressions~key=K.operator=OP.values=A|B`)
//!   are parsed while decoding; a bad selector is a Syntax diagnostic.
//! - Field checks (side effects, timeout range, review versions, client
//!   config, policies) are Semantic diagnostics and omit the entry.
//! - Output lists keep encounter order and are identical across runs.

pub mod assemble;
pub mod entry;
pub mod manifest;
pub mod markers;
pub mod selector;

pub use assemble::{assemble, WebhookLists};
pub use entry::{
    EntryState, EntryTransition, FailurePolicy, MatchPolicy, ReinvocationPolicy, SideEffectClass,
    WebhookEntry, WebhookError, WebhookKind, DEFAULT_TIMEOUT_SECONDS, TIMEOUT_RANGE,
};
pub use manifest::{render_configurations, ManifestOptions, WebhookConfiguration};
pub use markers::WebhookMarkers;
pub use selector::{LabelSelector, SelectorError, SelectorOperator, SelectorRequirement};
