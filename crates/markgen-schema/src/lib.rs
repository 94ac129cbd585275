//! # markgen-schema: Schema Synthesis & Resource Definitions
//!
//! Turns a resolved type graph plus its decoded markers into validation
//! schemas, and groups resource roots into CustomResourceDefinition
//! documents.
//!
//! ## Synthesis (`synth`)
//!
//! [`Synthesizer::synthesize`] builds the [`SchemaNode`] for one
//! `(declaration, version)` pair. Results are memoized per pair, recursive
//! references become `$ref` placeholders, and a declaration that cannot be
//! synthesized becomes an opaque placeholder with a diagnostic while its
//! siblings continue.
//!
//! ## Markers (`markers`)
//!
//! [`SchemaMarkers`] contributes the `validation:*`, topology, union, gate,
//! and resource markers to a registry.
//!
//! ## Resource definitions (`crd`)
//!
//! [`assemble`] collects `+resource` roots across packages into one
//! definition per group and kind, choosing the storage version.
//!
//! ## Crate Policy
//!
//! - Output is deterministic: properties, versions, and definitions follow
//!   source order.
//! - Per-declaration failures are diagnostics, never `Err` to the caller.

pub mod crd;
pub mod markers;
pub mod node;
pub mod synth;

pub use crd::{assemble, pluralize, CustomResourceDefinition, Scope, CRD_API_VERSION};
pub use markers::SchemaMarkers;
pub use node::{
    reference_path, ListType, MapType, SchemaKind, SchemaNode, UnionGroup, UnionPolicy,
    ValidationRule,
};
pub use synth::{scalar_schema, SynthesisError, SynthesisOptions, Synthesizer};
