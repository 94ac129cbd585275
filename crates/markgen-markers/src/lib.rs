//! # markgen-markers: Marker Annotation Language
//!
//! Markers are one-line directives embedded in doc comments:
//!
//! ```text
//! // +validation:MaxLength=15
//! // +rbac:group=batch,resource=jobs,verbs=get;list
//! // +webhook:path=/mutate,mutating=true,namespaceSelector=matchLabels~env=prod
//! ```
//!
//! This crate owns everything between raw comment text and typed values:
//!
//! - [`Registry`]: the catalog of definitions, composed from
//!   [`MarkerProvider`]s supplied by each engine crate.
//! - [`lexer`]: marker line extraction and prose descriptions.
//! - [`decode`]: the typed argument decoder.
//! - [`MarkerParser`]: name resolution, applicability checks, diagnostics.
//! - [`MarkerIndex`]: every comment in a type graph, parsed once.
//!
//! ## Crate Policy
//!
//! - No global registry. Callers build one and pass it by reference.
//! - Unknown markers are ignored; every other failure is a
//!   [`Diagnostic`](markgen_core::Diagnostic) at the comment's location.
//! - Each decoded value carries its [`Contributor`] tag so engines never
//!   inspect value shapes to decide ownership.

pub mod decode;
pub mod index;
pub mod lexer;
pub mod parser;
pub mod registry;
pub mod value;

pub use decode::{decode_args, decode_value, ArgForm, DecodeError};
pub use index::MarkerIndex;
pub use lexer::{description, RawMarker};
pub use parser::MarkerParser;
pub use registry::{
    ArgKind, ArgSpec, Contributor, HelpEntry, MarkerDefinition, MarkerHelp, MarkerProvider,
    Registry, RegistryError, ANONYMOUS,
};
pub use value::{ArgValue, JsonPath, MarkerSet, MarkerValue, Section, SubRecord};
