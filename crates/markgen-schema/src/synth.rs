//! # Schema Synthesis
//!
//! Walks the resolved type graph and builds one [`SchemaNode`] per
//! `(declaration, version)` pair.
//!
//! ## Memoization and cycles
//!
//! Every pair moves through a memo table: absent, in progress, done. A
//! lookup that finds a pair in progress is a recursive reference and yields
//! a `$ref` placeholder instead of recursing. A finished pair is shared as
//! an `Arc`, so a type referenced from two parents is synthesized once and
//! both parents embed identical nodes.
//!
//! ## Failure policy
//!
//! A declaration that cannot be synthesized (unresolvable reference, union
//! conflict, malformed associative list) becomes the opaque placeholder and
//! is recorded as failed, with one diagnostic at the declaration. Marker
//! misuse that only affects one constraint drops that constraint and
//! reports a diagnostic; the declaration still succeeds.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use indexmap::IndexMap;
use serde_json::Value;
use thiserror::Error;

use markgen_core::{
    Diagnostic, DiagnosticKind, Diagnostics, FieldNode, Location, ScalarKind, TypeGraph,
    TypeIdent, TypeKind, TypeNode, TypeRef,
};
use markgen_gates::GateState;
use markgen_markers::{description, ArgValue, Contributor, MarkerIndex, MarkerSet, MarkerValue};

use crate::markers::*;
use crate::node::{
    ListType, MapType, SchemaKind, SchemaNode, UnionGroup, UnionPolicy, ValidationRule,
};

/// Errors that fail synthesis of a whole declaration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SynthesisError {
    /// A referenced type is not in the graph.
    #[error("unresolved type reference '{0}'")]
    Unresolved(TypeIdent),

    /// Two union groups share members but disagree on policy.
    #[error("union members {members:?} are declared both {first} and {second}")]
    UnionConflict {
        /// Shared member keys.
        members: Vec<String>,
        /// Policy of the earlier group.
        first: UnionPolicy,
        /// Policy of the later group.
        second: UnionPolicy,
    },

    /// A union names a key that is not a property of the record.
    #[error("union member '{0}' is not a field of this type")]
    UnknownUnionMember(String),

    /// `listType=map` without any `listMapKey`.
    #[error("{0}: listType=map requires at least one listMapKey")]
    ListMapWithoutKeys(String),

    /// A `listMapKey` that is not a property of the list items.
    #[error("{location}: listMapKey '{key}' is not a property of the list items")]
    UnknownListMapKey {
        /// Where the list was declared.
        location: String,
        /// Offending key.
        key: String,
    },

    /// An inline field whose type is not a record.
    #[error("inline field '{0}' does not refer to a record type")]
    InlineNotRecord(String),

    /// An inline field whose record type embeds itself.
    #[error("inline field '{0}' embeds a type that is still being synthesized")]
    RecursiveInline(String),

    /// Two fields serialize under the same key.
    #[error("property '{0}' is declared more than once")]
    DuplicateProperty(String),
}

impl SynthesisError {
    /// Diagnostic category for this error.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            Self::Unresolved(_) => DiagnosticKind::Resolution,
            _ => DiagnosticKind::Semantic,
        }
    }
}

/// Tunables for synthesis.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SynthesisOptions {
    /// Truncate descriptions to this many characters.
    pub max_description_length: Option<usize>,
}

#[derive(Debug)]
enum Slot {
    InProgress,
    Done(Arc<SchemaNode>),
}

type Key = (TypeIdent, String);

/// The schema synthesis engine for one run.
#[derive(Debug)]
pub struct Synthesizer<'a> {
    graph: &'a TypeGraph,
    markers: &'a MarkerIndex,
    gates: &'a GateState,
    options: SynthesisOptions,
    memo: HashMap<Key, Slot>,
    visits: HashMap<Key, usize>,
    failed: HashSet<Key>,
    diagnostics: Diagnostics,
}

impl<'a> Synthesizer<'a> {
    /// Create a synthesizer over a graph, its markers, and a gate state.
    pub fn new(graph: &'a TypeGraph, markers: &'a MarkerIndex, gates: &'a GateState) -> Self {
        Self {
            graph,
            markers,
            gates,
            options: SynthesisOptions::default(),
            memo: HashMap::new(),
            visits: HashMap::new(),
            failed: HashSet::new(),
            diagnostics: Diagnostics::new(),
        }
    }

    /// Builder: set options.
    pub fn with_options(mut self, options: SynthesisOptions) -> Self {
        self.options = options;
        self
    }

    /// The schema for a declaration at a version, synthesizing it on first use.
    pub fn synthesize(&mut self, ident: &TypeIdent, version: &str) -> Arc<SchemaNode> {
        let key = (ident.clone(), version.to_string());
        match self.memo.get(&key) {
            Some(Slot::Done(node)) => return Arc::clone(node),
            Some(Slot::InProgress) => return Arc::new(SchemaNode::reference_to(ident)),
            None => {}
        }
        self.memo.insert(key.clone(), Slot::InProgress);
        *self.visits.entry(key.clone()).or_insert(0) += 1;

        let graph = self.graph;
        let result = match graph.resolve(ident) {
            Some(decl) => self.declaration(decl, version),
            None => Err(SynthesisError::Unresolved(ident.clone())),
        };
        let node = match result {
            Ok(node) => {
                tracing::debug!(ty = %ident, version, "synthesized schema");
                node
            }
            Err(err) => {
                tracing::debug!(ty = %ident, version, error = %err, "schema synthesis failed");
                self.diagnostics.push(Diagnostic::new(
                    err.kind(),
                    Location::declaration(ident.clone()),
                    err.to_string(),
                ));
                self.failed.insert(key.clone());
                SchemaNode::opaque()
            }
        };
        let node = Arc::new(node);
        self.memo.insert(key, Slot::Done(Arc::clone(&node)));
        node
    }

    /// Schemas for every declaration in the graph, in source order.
    pub fn synthesize_all(&mut self, version: &str) -> IndexMap<TypeIdent, Arc<SchemaNode>> {
        let graph = self.graph;
        graph
            .types()
            .map(|decl| {
                let ident = decl.ident();
                let node = self.synthesize(&ident, version);
                (ident, node)
            })
            .collect()
    }

    /// The graph being synthesized.
    pub fn graph(&self) -> &'a TypeGraph {
        self.graph
    }

    /// The marker index in use.
    pub fn markers(&self) -> &'a MarkerIndex {
        self.markers
    }

    /// The gate state in use.
    pub fn gates(&self) -> &'a GateState {
        self.gates
    }

    /// How many times a pair was actually synthesized; at most one.
    pub fn visits(&self, ident: &TypeIdent, version: &str) -> usize {
        self.visits
            .get(&(ident.clone(), version.to_string()))
            .copied()
            .unwrap_or(0)
    }

    /// Whether a pair failed and was replaced by the placeholder.
    pub fn failed(&self, ident: &TypeIdent, version: &str) -> bool {
        self.failed.contains(&(ident.clone(), version.to_string()))
    }

    /// Diagnostics collected so far.
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diagnostics
    }

    /// Consume the synthesizer, returning its diagnostics.
    pub fn into_diagnostics(self) -> Diagnostics {
        self.diagnostics
    }

    // ─── Declarations ───────────────────────────────────────────────

    fn declaration(&mut self, decl: &'a TypeNode, version: &str) -> Result<SchemaNode, SynthesisError> {
        let ident = decl.ident();
        let index = self.markers;
        let markers = index.declaration(&ident);
        let location = Location::declaration(ident.clone());

        let mut node = match &decl.kind {
            TypeKind::Record { fields } => self.record(&ident, fields, version)?,
            TypeKind::Alias { target } => self.type_ref(target, version)?,
            TypeKind::Enumeration { base, values } => {
                let mut node = scalar_schema(*base);
                node.enum_values = values.iter().map(|v| v.value.clone()).collect();
                node
            }
            TypeKind::Scalar { scalar } => scalar_schema(*scalar),
        };
        if let Some(text) = self.describe(&decl.doc) {
            node.description = Some(text);
        }
        self.apply_markers(&mut node, markers, &location)?;
        Ok(node)
    }

    fn record(
        &mut self,
        ident: &TypeIdent,
        fields: &'a [FieldNode],
        version: &str,
    ) -> Result<SchemaNode, SynthesisError> {
        let index = self.markers;
        let mut node = SchemaNode::of(SchemaKind::Object);
        let mut skipped: HashSet<&str> = HashSet::new();

        for field in fields {
            if field.is_omitted() {
                skipped.insert(union_member_name(field));
                continue;
            }
            let markers = index.field(ident, &field.name);
            if let Some(gate) = markers.get(FEATURE_GATE).and_then(|v| v.gate(markgen_markers::ANONYMOUS)) {
                if !gate.evaluate(self.gates) {
                    tracing::debug!(ty = %ident, field = %field.name, gate = %gate, "field gated off");
                    skipped.insert(union_member_name(field));
                    continue;
                }
            }

            if field.inline {
                let embedded = self.inline_schema(field, version)?;
                for (key, schema) in embedded.properties {
                    if node.properties.contains_key(&key) {
                        return Err(SynthesisError::DuplicateProperty(key));
                    }
                    node.properties.insert(key, schema);
                }
                for key in embedded.required {
                    if !node.required.contains(&key) {
                        node.required.push(key);
                    }
                }
                continue;
            }

            let location = Location::field(ident.clone(), field.name.clone());
            let mut schema = self.type_ref(&field.ty, version)?;
            if let Some(text) = self.describe(&field.doc) {
                schema.description = Some(text);
            }
            self.apply_markers(&mut schema, markers, &location)?;

            let required = markers.contains(REQUIRED)
                || !(field.optional || markers.contains(OPTIONAL) || schema.default.is_some());
            if node.properties.contains_key(&field.key) {
                return Err(SynthesisError::DuplicateProperty(field.key.clone()));
            }
            if required {
                node.required.push(field.key.clone());
            }
            node.properties.insert(field.key.clone(), schema);
        }

        apply_unions(&mut node, index.declaration(ident), &skipped)?;
        Ok(node)
    }

    fn inline_schema(&mut self, field: &FieldNode, version: &str) -> Result<SchemaNode, SynthesisError> {
        let TypeRef::Named(target) = field.ty.strip_pointers() else {
            return Err(SynthesisError::InlineNotRecord(field.name.clone()));
        };
        let graph = self.graph;
        match graph.resolve(target) {
            None => Err(SynthesisError::Unresolved(target.clone())),
            Some(decl) if !matches!(decl.kind, TypeKind::Record { .. }) => {
                Err(SynthesisError::InlineNotRecord(field.name.clone()))
            }
            Some(_) => {
                let embedded = self.synthesize(target, version);
                if embedded.is_reference() {
                    return Err(SynthesisError::RecursiveInline(field.name.clone()));
                }
                Ok((*embedded).clone())
            }
        }
    }

    fn type_ref(&mut self, ty: &TypeRef, version: &str) -> Result<SchemaNode, SynthesisError> {
        match ty {
            TypeRef::Scalar(kind) => Ok(scalar_schema(*kind)),
            TypeRef::Named(target) => {
                if self.graph.resolve(target).is_none() {
                    return Err(SynthesisError::Unresolved(target.clone()));
                }
                Ok((*self.synthesize(target, version)).clone())
            }
            TypeRef::List(element) => Ok(SchemaNode::array(self.type_ref(element, version)?)),
            TypeRef::Map(value) => Ok(SchemaNode::map(self.type_ref(value, version)?)),
            TypeRef::Pointer(target) => self.type_ref(target, version),
        }
    }

    fn describe(&self, doc: &[String]) -> Option<String> {
        let text = description(doc)?;
        match self.options.max_description_length {
            Some(max) if text.chars().count() > max => Some(text.chars().take(max).collect()),
            _ => Some(text),
        }
    }

    // ─── Markers ────────────────────────────────────────────────────

    fn apply_markers(
        &mut self,
        node: &mut SchemaNode,
        markers: &MarkerSet,
        location: &Location,
    ) -> Result<(), SynthesisError> {
        let values: Vec<&MarkerValue> = markers.by_contributor(Contributor::Schema).collect();

        // Type-shaping markers first so constraints see the final type.
        for value in &values {
            match value.name.as_str() {
                TYPE => match value.string(markgen_markers::ANONYMOUS).map(str::parse::<SchemaKind>) {
                    Some(Ok(kind)) => node.kind = Some(kind),
                    Some(Err(reason)) => self.semantic(location, format!("{TYPE}: {reason}")),
                    None => {}
                },
                FORMAT => {
                    node.format = value.string(markgen_markers::ANONYMOUS).map(str::to_string);
                }
                X_INT_OR_STRING => {
                    node.kind = None;
                    node.format = None;
                    node.int_or_string = true;
                    node.any_of = vec![
                        SchemaNode::of(SchemaKind::Integer),
                        SchemaNode::of(SchemaKind::String),
                    ];
                }
                _ => {}
            }
        }

        for value in values {
            let arg = value.value();
            match value.name.as_str() {
                CONSTRAINTS => {
                    for (key, arg) in &value.args {
                        if let Some(constraint) = Constraint::from_key(key) {
                            self.constrain(node, location, constraint, arg);
                        }
                    }
                }
                NULLABLE => node.nullable = true,
                DEFAULT => {
                    if let Some(ArgValue::Any(default)) = arg {
                        node.default = Some(default.clone());
                    }
                }
                ENUM => {
                    let items = arg.and_then(ArgValue::as_list).unwrap_or(&[]);
                    node.enum_values = items.iter().map(|item| enum_value(node.kind, item)).collect();
                }
                X_VALIDATION => {
                    let rule = value.string("rule").unwrap_or_default();
                    match check_rule_syntax(rule) {
                        Ok(()) => node.validations.push(ValidationRule {
                            rule: rule.to_string(),
                            message: value.string("message").map(str::to_string),
                            field_path: value.string("fieldPath").map(str::to_string),
                        }),
                        Err(reason) => self.diagnostics.push(Diagnostic::syntax(
                            location.clone(),
                            format!("{X_VALIDATION}: {reason}; rule dropped"),
                        )),
                    }
                }
                X_PRESERVE_UNKNOWN_FIELDS => node.preserve_unknown_fields = Some(true),
                X_EMBEDDED_RESOURCE => {
                    if node.kind == Some(SchemaKind::Object) {
                        node.embedded_resource = true;
                    } else {
                        self.mismatch(location, X_EMBEDDED_RESOURCE, node.kind);
                    }
                }
                LIST_TYPE => {
                    if node.kind != Some(SchemaKind::Array) {
                        self.mismatch(location, LIST_TYPE, node.kind);
                        continue;
                    }
                    match arg.and_then(ArgValue::as_str) {
                        Some("atomic") => node.list_type = Some(ListType::Atomic),
                        Some("set") => node.list_type = Some(ListType::Set),
                        Some("map") => node.list_type = Some(ListType::Map),
                        other => self.semantic(
                            location,
                            format!("{LIST_TYPE}: unknown list type '{}'", other.unwrap_or_default()),
                        ),
                    }
                }
                LIST_MAP_KEY => {
                    if let Some(key) = arg.and_then(ArgValue::as_str) {
                        if !node.list_map_keys.iter().any(|k| k == key) {
                            node.list_map_keys.push(key.to_string());
                        }
                    }
                }
                MAP_TYPE => {
                    if node.kind != Some(SchemaKind::Object) {
                        self.mismatch(location, MAP_TYPE, node.kind);
                        continue;
                    }
                    match arg.and_then(ArgValue::as_str) {
                        Some("granular") => node.map_type = Some(MapType::Granular),
                        Some("atomic") => node.map_type = Some(MapType::Atomic),
                        other => self.semantic(
                            location,
                            format!("{MAP_TYPE}: unknown map type '{}'", other.unwrap_or_default()),
                        ),
                    }
                }
                name => {
                    if let (Some(constraint), Some(arg)) = (Constraint::from_marker(name), arg) {
                        self.constrain(node, location, constraint, arg);
                    }
                }
            }
        }

        if node.list_type == Some(ListType::Map) {
            if node.list_map_keys.is_empty() {
                return Err(SynthesisError::ListMapWithoutKeys(location.to_string()));
            }
            if let Some(items) = node.items.as_deref() {
                if !items.is_reference() && !items.is_opaque() {
                    if let Some(key) = node
                        .list_map_keys
                        .iter()
                        .find(|k| !items.properties.contains_key(k.as_str()))
                    {
                        return Err(SynthesisError::UnknownListMapKey {
                            location: location.to_string(),
                            key: key.clone(),
                        });
                    }
                }
            }
        } else if !node.list_map_keys.is_empty() {
            self.semantic(location, format!("{LIST_MAP_KEY} requires {LIST_TYPE}=map; keys dropped"));
            node.list_map_keys.clear();
        }
        Ok(())
    }

    fn constrain(&mut self, node: &mut SchemaNode, location: &Location, constraint: Constraint, arg: &ArgValue) {
        if !constraint.applies_to(node.kind) {
            self.mismatch(location, constraint.key(), node.kind);
            return;
        }
        let count = || arg.as_int().and_then(|i| u64::try_from(i).ok());
        let applied = match constraint {
            Constraint::MaxLength => count().map(|n| node.max_length = Some(n)),
            Constraint::MinLength => count().map(|n| node.min_length = Some(n)),
            Constraint::MaxItems => count().map(|n| node.max_items = Some(n)),
            Constraint::MinItems => count().map(|n| node.min_items = Some(n)),
            Constraint::MaxProperties => count().map(|n| node.max_properties = Some(n)),
            Constraint::MinProperties => count().map(|n| node.min_properties = Some(n)),
            Constraint::Minimum => arg.as_number().map(|n| node.minimum = Some(n)),
            Constraint::Maximum => arg.as_number().map(|n| node.maximum = Some(n)),
            Constraint::MultipleOf => arg.as_number().map(|n| node.multiple_of = Some(n)),
            Constraint::ExclusiveMinimum => arg.as_bool().map(|b| node.exclusive_minimum = b),
            Constraint::ExclusiveMaximum => arg.as_bool().map(|b| node.exclusive_maximum = b),
            Constraint::Pattern => arg.as_str().map(|p| node.pattern = Some(p.to_string())),
        };
        if applied.is_none() {
            self.semantic(
                location,
                format!("{}: invalid value '{}'; constraint dropped", constraint.key(), arg.render()),
            );
        }
    }

    fn mismatch(&mut self, location: &Location, what: &str, kind: Option<SchemaKind>) {
        let kind = kind.map_or_else(|| "untyped".to_string(), |k| k.to_string());
        self.semantic(location, format!("{what} does not apply to a {kind} schema; dropped"));
    }

    fn semantic(&mut self, location: &Location, message: String) {
        self.diagnostics.push(Diagnostic::semantic(location.clone(), message));
    }
}

// ─── Helpers ────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Constraint {
    MaxLength,
    MinLength,
    MaxItems,
    MinItems,
    MaxProperties,
    MinProperties,
    Minimum,
    Maximum,
    MultipleOf,
    ExclusiveMinimum,
    ExclusiveMaximum,
    Pattern,
}

impl Constraint {
    const ALL: [Constraint; 12] = [
        Self::MaxLength,
        Self::MinLength,
        Self::MaxItems,
        Self::MinItems,
        Self::MaxProperties,
        Self::MinProperties,
        Self::Minimum,
        Self::Maximum,
        Self::MultipleOf,
        Self::ExclusiveMinimum,
        Self::ExclusiveMaximum,
        Self::Pattern,
    ];

    fn key(self) -> &'static str {
        match self {
            Self::MaxLength => "maxLength",
            Self::MinLength => "minLength",
            Self::MaxItems => "maxItems",
            Self::MinItems => "minItems",
            Self::MaxProperties => "maxProperties",
            Self::MinProperties => "minProperties",
            Self::Minimum => "minimum",
            Self::Maximum => "maximum",
            Self::MultipleOf => "multipleOf",
            Self::ExclusiveMinimum => "exclusiveMinimum",
            Self::ExclusiveMaximum => "exclusiveMaximum",
            Self::Pattern => "pattern",
        }
    }

    fn marker(self) -> &'static str {
        match self {
            Self::MaxLength => MAX_LENGTH,
            Self::MinLength => MIN_LENGTH,
            Self::MaxItems => MAX_ITEMS,
            Self::MinItems => MIN_ITEMS,
            Self::MaxProperties => MAX_PROPERTIES,
            Self::MinProperties => MIN_PROPERTIES,
            Self::Minimum => MINIMUM,
            Self::Maximum => MAXIMUM,
            Self::MultipleOf => MULTIPLE_OF,
            Self::ExclusiveMinimum => EXCLUSIVE_MINIMUM,
            Self::ExclusiveMaximum => EXCLUSIVE_MAXIMUM,
            Self::Pattern => PATTERN,
        }
    }

    fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.key() == key)
    }

    fn from_marker(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.marker() == name)
    }

    fn applies_to(self, kind: Option<SchemaKind>) -> bool {
        let Some(kind) = kind else {
            return false;
        };
        match self {
            Self::MaxLength | Self::MinLength | Self::Pattern => kind == SchemaKind::String,
            Self::MaxItems | Self::MinItems => kind == SchemaKind::Array,
            Self::MaxProperties | Self::MinProperties => kind == SchemaKind::Object,
            Self::Minimum
            | Self::Maximum
            | Self::MultipleOf
            | Self::ExclusiveMinimum
            | Self::ExclusiveMaximum => kind.is_numeric(),
        }
    }
}

/// Primitive schema for a scalar kind.
pub fn scalar_schema(kind: ScalarKind) -> SchemaNode {
    match kind {
        ScalarKind::String => SchemaNode::of(SchemaKind::String),
        ScalarKind::Int32 => SchemaNode::formatted(SchemaKind::Integer, "int32"),
        ScalarKind::Int64 => SchemaNode::formatted(SchemaKind::Integer, "int64"),
        ScalarKind::Float => SchemaNode::formatted(SchemaKind::Number, "double"),
        ScalarKind::Boolean => SchemaNode::of(SchemaKind::Boolean),
        ScalarKind::Bytes => SchemaNode::formatted(SchemaKind::String, "byte"),
        ScalarKind::Time => SchemaNode::formatted(SchemaKind::String, "date-time"),
        ScalarKind::IntOrString => SchemaNode {
            int_or_string: true,
            any_of: vec![
                SchemaNode::of(SchemaKind::Integer),
                SchemaNode::of(SchemaKind::String),
            ],
            ..SchemaNode::default()
        },
        ScalarKind::Any => SchemaNode {
            preserve_unknown_fields: Some(true),
            ..SchemaNode::default()
        },
    }
}

fn enum_value(kind: Option<SchemaKind>, item: &str) -> Value {
    match kind {
        Some(SchemaKind::String) | None => Value::String(item.to_string()),
        Some(_) => serde_json::from_str(item).unwrap_or_else(|_| Value::String(item.to_string())),
    }
}

/// Surface check of a rule expression: non-empty, balanced brackets,
/// terminated string literals.
fn check_rule_syntax(rule: &str) -> Result<(), String> {
    if rule.trim().is_empty() {
        return Err("rule is empty".to_string());
    }
    let mut stack = Vec::new();
    let mut quote: Option<char> = None;
    let mut escaped = false;
    for c in rule.chars() {
        if let Some(q) = quote {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == q {
                quote = None;
            }
            continue;
        }
        match c {
            '\'' | '"' => quote = Some(c),
            '(' | '[' | '{' => stack.push(c),
            ')' | ']' | '}' => {
                let open = match c {
                    ')' => '(',
                    ']' => '[',
                    _ => '{',
                };
                if stack.pop() != Some(open) {
                    return Err(format!("unbalanced '{c}' in rule"));
                }
            }
            _ => {}
        }
    }
    if quote.is_some() {
        return Err("unterminated string literal in rule".to_string());
    }
    if let Some(open) = stack.pop() {
        return Err(format!("unclosed '{open}' in rule"));
    }
    Ok(())
}

/// The name a union marker uses for `field`: its serialization key, or the
/// field name when the key is the omit sentinel.
fn union_member_name(field: &FieldNode) -> &str {
    if field.is_omitted() {
        field.name.as_str()
    } else {
        field.key.as_str()
    }
}

/// `skipped` holds [`union_member_name`]s of fields left out of `node`.
fn apply_unions(node: &mut SchemaNode, markers: &MarkerSet, skipped: &HashSet<&str>) -> Result<(), SynthesisError> {
    for value in markers {
        let policy = match value.name.as_str() {
            EXACTLY_ONE_OF => UnionPolicy::ExactlyOne,
            AT_MOST_ONE_OF => UnionPolicy::AtMostOne,
            AT_LEAST_ONE_OF => UnionPolicy::AtLeastOne,
            _ => continue,
        };
        let mut members: Vec<String> = Vec::new();
        for member in value.value().and_then(ArgValue::as_list).unwrap_or(&[]) {
            if skipped.contains(member.as_str()) {
                continue;
            }
            if !node.properties.contains_key(member) {
                return Err(SynthesisError::UnknownUnionMember(member.clone()));
            }
            if !members.contains(member) {
                members.push(member.clone());
            }
        }
        if members.is_empty() {
            continue;
        }
        for existing in &node.unions {
            let shared: Vec<String> = members
                .iter()
                .filter(|m| existing.members.contains(*m))
                .cloned()
                .collect();
            if !shared.is_empty() && existing.policy != policy {
                return Err(SynthesisError::UnionConflict {
                    members: shared,
                    first: existing.policy,
                    second: policy,
                });
            }
        }
        if node
            .unions
            .iter()
            .any(|g| g.policy == policy && g.members == members)
        {
            continue;
        }

        let clauses = || -> Vec<SchemaNode> {
            members
                .iter()
                .map(|m| SchemaNode {
                    required: vec![m.clone()],
                    ..SchemaNode::default()
                })
                .collect()
        };
        match policy {
            UnionPolicy::ExactlyOne if node.one_of.is_empty() => node.one_of = clauses(),
            UnionPolicy::ExactlyOne => node.all_of.push(SchemaNode {
                one_of: clauses(),
                ..SchemaNode::default()
            }),
            UnionPolicy::AtLeastOne if node.any_of.is_empty() => node.any_of = clauses(),
            UnionPolicy::AtLeastOne => node.all_of.push(SchemaNode {
                any_of: clauses(),
                ..SchemaNode::default()
            }),
            UnionPolicy::AtMostOne => {}
        }
        node.unions.push(UnionGroup { policy, members });
    }
    Ok(())
}
