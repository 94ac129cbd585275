//! # Type Graph
//!
//! The resolved set of declarations produced by a type loader. Engines read
//! it; nothing in markgen mutates it after [`TypeGraph::new`] returns.
//!
//! ## Shape
//!
//! ```text
//! TypeGraph
//!  └── PackageNode (name, doc comment)
//!       └── TypeNode (name, doc comment, kind)
//!            ├── Record      └── FieldNode (name, type ref, key, optional, inline, doc)
//!            ├── Alias       ── target TypeRef
//!            ├── Enumeration ── base scalar + value set
//!            └── Scalar      ── named scalar
//! ```
//!
//! Type references may cycle (a record that contains a list of itself).
//! The graph stores references by [`TypeIdent`], never by pointer, so cycles
//! are representable and the synthesis engine decides how to break them.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::MarkgenError;

/// Serialization key marking a field that is never serialized.
pub const OMIT_KEY: &str = "-";

/// Identity of a declaration: package path plus type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeIdent {
    /// Package path. Empty in loader input means "the enclosing package".
    #[serde(default)]
    pub package: String,
    /// Declared type name.
    pub name: String,
}

impl TypeIdent {
    /// Create a type identity.
    pub fn new(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            package: package.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for TypeIdent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}.{}", self.package, self.name)
    }
}

/// Built-in scalar kinds understood by every engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScalarKind {
    /// UTF-8 string.
    String,
    /// 32-bit signed integer.
    Int32,
    /// 64-bit signed integer.
    Int64,
    /// Floating point number.
    Float,
    /// Boolean.
    Boolean,
    /// Opaque bytes, serialized as base64 text.
    Bytes,
    /// RFC 3339 timestamp.
    Time,
    /// A value that may be serialized as either an integer or a string.
    IntOrString,
    /// Arbitrary structured data.
    Any,
}

/// A reference from a field, alias, or collection to another type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeRef {
    /// A built-in scalar.
    Scalar(ScalarKind),
    /// A declaration elsewhere in the graph.
    Named(TypeIdent),
    /// An ordered list of the element type.
    List(Box<TypeRef>),
    /// A string-keyed map to the value type.
    Map(Box<TypeRef>),
    /// A nullable indirection to the target type.
    Pointer(Box<TypeRef>),
}

impl TypeRef {
    /// Shorthand for a named reference.
    pub fn named(package: impl Into<String>, name: impl Into<String>) -> Self {
        Self::Named(TypeIdent::new(package, name))
    }

    /// Shorthand for a list reference.
    pub fn list(element: TypeRef) -> Self {
        Self::List(Box::new(element))
    }

    /// Shorthand for a map reference.
    pub fn map(value: TypeRef) -> Self {
        Self::Map(Box::new(value))
    }

    /// Shorthand for a pointer reference.
    pub fn pointer(target: TypeRef) -> Self {
        Self::Pointer(Box::new(target))
    }

    /// The reference with every pointer layer removed.
    pub fn strip_pointers(&self) -> &TypeRef {
        match self {
            Self::Pointer(inner) => inner.strip_pointers(),
            other => other,
        }
    }

    /// Fill empty package paths in named references with `package`.
    fn qualify(&mut self, package: &str) {
        match self {
            Self::Named(ident) if ident.package.is_empty() => {
                ident.package = package.to_string();
            }
            Self::List(inner) | Self::Map(inner) | Self::Pointer(inner) => inner.qualify(package),
            _ => {}
        }
    }
}

/// One field of a record declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldNode {
    /// Source field name.
    pub name: String,
    /// Field type.
    #[serde(rename = "type")]
    pub ty: TypeRef,
    /// Serialization key. [`OMIT_KEY`] means never serialized; empty means
    /// "same as the field name".
    #[serde(default)]
    pub key: String,
    /// Whether the field may be absent from serialized documents.
    #[serde(default)]
    pub optional: bool,
    /// Whether the field's record type is embedded into the parent.
    #[serde(default)]
    pub inline: bool,
    /// Raw doc comment lines.
    #[serde(default)]
    pub doc: Vec<String>,
}

impl FieldNode {
    /// Create a field whose key equals its name.
    pub fn new(name: impl Into<String>, ty: TypeRef) -> Self {
        let name = name.into();
        Self {
            key: name.clone(),
            name,
            ty,
            optional: false,
            inline: false,
            doc: Vec::new(),
        }
    }

    /// Builder: set the serialization key.
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = key.into();
        self
    }

    /// Builder: mark the field optional.
    pub fn optional(mut self) -> Self {
        self.optional = true;
        self
    }

    /// Builder: mark the field as embedded.
    pub fn inlined(mut self) -> Self {
        self.inline = true;
        self
    }

    /// Builder: append a doc comment line.
    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Whether the field is excluded from serialization entirely.
    pub fn is_omitted(&self) -> bool {
        self.key == OMIT_KEY
    }
}

/// One member of an enumeration declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnumValue {
    /// Source constant name.
    pub name: String,
    /// Serialized value.
    pub value: serde_json::Value,
    /// Raw doc comment lines.
    #[serde(default)]
    pub doc: Vec<String>,
}

/// The kind-specific body of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TypeKind {
    /// A record with ordered fields.
    Record {
        /// Declared fields in source order.
        #[serde(default)]
        fields: Vec<FieldNode>,
    },
    /// A named alias of another type.
    Alias {
        /// The aliased type.
        target: TypeRef,
    },
    /// A scalar with a closed value set.
    Enumeration {
        /// Underlying scalar kind.
        base: ScalarKind,
        /// Permitted values in declaration order.
        #[serde(default)]
        values: Vec<EnumValue>,
    },
    /// A named scalar.
    Scalar {
        /// Underlying scalar kind.
        scalar: ScalarKind,
    },
}

/// A declaration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TypeNode {
    /// Declared type name.
    pub name: String,
    /// Owning package. Filled in by [`TypeGraph::new`] when empty.
    #[serde(default)]
    pub package: String,
    /// Raw doc comment lines.
    #[serde(default)]
    pub doc: Vec<String>,
    /// Kind-specific body.
    #[serde(flatten)]
    pub kind: TypeKind,
}

impl TypeNode {
    /// Create a declaration.
    pub fn new(package: impl Into<String>, name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            package: package.into(),
            doc: Vec::new(),
            kind,
        }
    }

    /// Create a record declaration.
    pub fn record(package: impl Into<String>, name: impl Into<String>, fields: Vec<FieldNode>) -> Self {
        Self::new(package, name, TypeKind::Record { fields })
    }

    /// Builder: append a doc comment line.
    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// The declaration's identity.
    pub fn ident(&self) -> TypeIdent {
        TypeIdent::new(self.package.clone(), self.name.clone())
    }

    /// Fields of a record declaration; empty for other kinds.
    pub fn fields(&self) -> &[FieldNode] {
        match &self.kind {
            TypeKind::Record { fields } => fields,
            _ => &[],
        }
    }
}

/// A package and its declarations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PackageNode {
    /// Package path.
    pub name: String,
    /// Raw package doc comment lines.
    #[serde(default)]
    pub doc: Vec<String>,
    /// Declarations in source order.
    #[serde(default)]
    pub types: Vec<TypeNode>,
}

impl PackageNode {
    /// Create an empty package.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            doc: Vec::new(),
            types: Vec::new(),
        }
    }

    /// Builder: append a doc comment line.
    pub fn doc(mut self, line: impl Into<String>) -> Self {
        self.doc.push(line.into());
        self
    }

    /// Builder: append a declaration.
    pub fn with_type(mut self, node: TypeNode) -> Self {
        self.types.push(node);
        self
    }
}

/// The resolved, indexed type graph for one run.
#[derive(Debug, Clone, Default)]
pub struct TypeGraph {
    packages: Vec<PackageNode>,
    index: HashMap<TypeIdent, (usize, usize)>,
}

impl TypeGraph {
    /// Index a set of packages.
    ///
    /// Packages with the same path are merged in input order. Declarations
    /// and unqualified references are assigned their enclosing package.
    /// Two declarations with the same identity are rejected.
    pub fn new(packages: Vec<PackageNode>) -> Result<Self, MarkgenError> {
        let mut merged: Vec<PackageNode> = Vec::new();
        for mut pkg in packages {
            for node in &mut pkg.types {
                node.package = pkg.name.clone();
                match &mut node.kind {
                    TypeKind::Record { fields } => {
                        for field in fields.iter_mut() {
                            field.ty.qualify(&pkg.name);
                            if field.key.is_empty() {
                                field.key = field.name.clone();
                            }
                        }
                    }
                    TypeKind::Alias { target } => target.qualify(&pkg.name),
                    TypeKind::Enumeration { .. } | TypeKind::Scalar { .. } => {}
                }
            }
            match merged.iter_mut().find(|p| p.name == pkg.name) {
                Some(existing) => {
                    existing.doc.extend(pkg.doc);
                    existing.types.extend(pkg.types);
                }
                None => merged.push(pkg),
            }
        }

        let mut index = HashMap::new();
        for (pi, pkg) in merged.iter().enumerate() {
            for (ti, node) in pkg.types.iter().enumerate() {
                if index.insert(node.ident(), (pi, ti)).is_some() {
                    return Err(MarkgenError::DuplicateDeclaration(node.ident().to_string()));
                }
            }
        }

        Ok(Self {
            packages: merged,
            index,
        })
    }

    /// Packages in input order.
    pub fn packages(&self) -> &[PackageNode] {
        &self.packages
    }

    /// Look up a package by path.
    pub fn package(&self, name: &str) -> Option<&PackageNode> {
        self.packages.iter().find(|p| p.name == name)
    }

    /// Resolve a type identity to its declaration.
    pub fn resolve(&self, ident: &TypeIdent) -> Option<&TypeNode> {
        self.index
            .get(ident)
            .map(|&(pi, ti)| &self.packages[pi].types[ti])
    }

    /// Every declaration, in package then source order.
    pub fn types(&self) -> impl Iterator<Item = &TypeNode> {
        self.packages.iter().flat_map(|p| p.types.iter())
    }

    /// Number of declarations.
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Whether the graph has no declarations.
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }
}
