//! # Error Types
//!
//! Top-level error type for markgen. Errors here are the few that can stop
//! a run before any engine executes: the type graph could not be loaded, a
//! configuration document was malformed, or output could not be written.
//! Everything that happens per marker, per declaration, or per rule is a
//! [`Diagnostic`](crate::Diagnostic) instead.

use thiserror::Error;

/// Top-level error type for markgen.
#[derive(Error, Debug)]
pub enum MarkgenError {
    /// The type graph could not be produced by the loader.
    #[error("type graph load error: {0}")]
    Load(String),

    /// Two declarations in the graph share the same package and name.
    #[error("duplicate declaration {0} in type graph")]
    DuplicateDeclaration(String),

    /// Configuration could not be read or was invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<serde_json::Error> for MarkgenError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
