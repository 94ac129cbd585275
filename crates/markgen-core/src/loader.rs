//! # Type Loader Boundary
//!
//! Parsing the host language and resolving imports is not markgen's job.
//! A [`TypeLoader`] turns a set of root paths into a [`TypeGraph`]; the
//! engines only ever see the graph.

use std::path::PathBuf;

use crate::error::MarkgenError;
use crate::graph::TypeGraph;

/// Produces the resolved type graph for a set of root paths.
pub trait TypeLoader {
    /// Load and resolve every declaration reachable from `roots`.
    fn load(&self, roots: &[PathBuf]) -> Result<TypeGraph, MarkgenError>;
}
