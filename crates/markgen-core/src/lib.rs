//! # markgen-core: Foundational Types for markgen
//!
//! This crate is the leaf of the markgen workspace. It defines the shared
//! vocabulary every engine speaks: where a marker came from, which kind of
//! location a marker may decorate, how recoverable failures are reported, and
//! the shape of the resolved type graph handed over by a type loader.
//!
//! ## Key Design Principles
//!
//! 1. **Diagnostics, not panics.** Per-location failures become
//!    [`Diagnostic`] values collected into [`Diagnostics`]. Nothing in an
//!    engine aborts a run; the caller decides what is fatal.
//!
//! 2. **The type graph is read-only input.** [`TypeGraph`] is produced once
//!    by a [`TypeLoader`] and borrowed by every engine for the run.
//!
//! 3. **Locations are values.** A [`Location`] names a package, a
//!    declaration, or a field, and carries its own [`Applicability`].
//!
//! ## Crate Policy
//!
//! - No dependencies on other `markgen-*` crates.
//! - No `unsafe` code.
//! - No `panic!()` or `.unwrap()` outside tests.

pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod loader;
pub mod location;

// Re-export primary types for ergonomic imports.
pub use diagnostic::{Diagnostic, DiagnosticKind, Diagnostics};
pub use error::MarkgenError;
pub use graph::{
    EnumValue, FieldNode, PackageNode, ScalarKind, TypeGraph, TypeIdent, TypeKind, TypeNode,
    TypeRef, OMIT_KEY,
};
pub use loader::TypeLoader;
pub use location::{Applicability, Location};
