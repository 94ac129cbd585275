//! # Marker Locations
//!
//! Every marker occurrence originates from exactly one comment block: the
//! package doc comment, a declaration's doc comment, or a field's doc
//! comment. [`Location`] names that block; [`Applicability`] is the kind of
//! block, which the registry uses to decide whether a marker is allowed there.

use serde::{Deserialize, Serialize};

use crate::graph::TypeIdent;

/// The kind of location a marker definition may decorate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Applicability {
    /// A package-level comment.
    Package,
    /// A type declaration comment.
    Declaration,
    /// A field comment inside a record declaration.
    Field,
}

impl Applicability {
    /// All applicability kinds, in a fixed order.
    pub const ALL: [Applicability; 3] = [Self::Package, Self::Declaration, Self::Field];
}

impl std::fmt::Display for Applicability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Package => "package",
            Self::Declaration => "declaration",
            Self::Field => "field",
        };
        f.write_str(s)
    }
}

/// The comment block a marker occurrence came from.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Location {
    /// A package comment.
    Package {
        /// Package path.
        package: String,
    },
    /// A declaration comment.
    Declaration {
        /// The declared type.
        ident: TypeIdent,
    },
    /// A field comment.
    Field {
        /// The declaring record type.
        ident: TypeIdent,
        /// Field name (the source name, not the serialization key).
        field: String,
    },
}

impl Location {
    /// Location of a package comment.
    pub fn package(package: impl Into<String>) -> Self {
        Self::Package {
            package: package.into(),
        }
    }

    /// Location of a declaration comment.
    pub fn declaration(ident: TypeIdent) -> Self {
        Self::Declaration { ident }
    }

    /// Location of a field comment.
    pub fn field(ident: TypeIdent, field: impl Into<String>) -> Self {
        Self::Field {
            ident,
            field: field.into(),
        }
    }

    /// The applicability kind of this location.
    pub fn applicability(&self) -> Applicability {
        match self {
            Self::Package { .. } => Applicability::Package,
            Self::Declaration { .. } => Applicability::Declaration,
            Self::Field { .. } => Applicability::Field,
        }
    }

    /// The package this location belongs to.
    pub fn package_name(&self) -> &str {
        match self {
            Self::Package { package } => package,
            Self::Declaration { ident } | Self::Field { ident, .. } => &ident.package,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Package { package } => write!(f, "package {package}"),
            Self::Declaration { ident } => write!(f, "{ident}"),
            Self::Field { ident, field } => write!(f, "{ident}.{field}"),
        }
    }
}
