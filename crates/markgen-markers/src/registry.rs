//! # Marker Registry
//!
//! The catalog of recognized markers. A [`Registry`] is an ordinary value:
//! it is composed at startup from independent [`MarkerProvider`]s (one per
//! engine crate) and passed by reference to the parser. There is no global
//! registry and no registration by side effect.
//!
//! A definition is identified by its `(name, applicability)` pair, so the
//! same marker name may be defined separately for package, declaration, and
//! field comments. Registering the same pair twice is an error.

use std::collections::BTreeMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use markgen_core::Applicability;

/// Argument key used for the single unnamed argument of `+name=value` markers.
pub const ANONYMOUS: &str = "";

/// The primitive shape of one marker argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArgKind {
    /// Plain or quoted string.
    String,
    /// Signed 64-bit integer.
    Int,
    /// Integer or floating point number, kept as written.
    Number,
    /// `true`, `false`, or a bare flag.
    Bool,
    /// `;`-separated list of strings.
    StringList,
    /// Field path expression such as `.status.replicas`.
    Path,
    /// `section~k=v.k2=v2` records joined by `&`.
    SubRecord,
    /// Feature-gate expression, syntax-checked while decoding.
    GateExpression,
    /// JSON literal, or a plain string when the text is not JSON.
    Any,
}

impl std::fmt::Display for ArgKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::String => "string",
            Self::Int => "int",
            Self::Number => "number",
            Self::Bool => "bool",
            Self::StringList => "string list",
            Self::Path => "path",
            Self::SubRecord => "sub-record",
            Self::GateExpression => "gate expression",
            Self::Any => "any",
        };
        f.write_str(s)
    }
}

/// One named argument of a marker definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArgSpec {
    /// Argument key; [`ANONYMOUS`] for the single unnamed argument.
    pub name: String,
    /// Value shape.
    pub kind: ArgKind,
    /// Whether the argument may be omitted.
    pub optional: bool,
}

/// Which engine consumes a marker's decoded value.
///
/// Resolved once, when the definition is registered, so engines select
/// their inputs by tag instead of inspecting value types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Contributor {
    /// Access rules.
    Rule,
    /// Validation schemas and resource definitions.
    Schema,
    /// Admission webhook manifests.
    Webhook,
    /// Metrics configuration.
    Metric,
}

impl std::fmt::Display for Contributor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Rule => "rule",
            Self::Schema => "schema",
            Self::Webhook => "webhook",
            Self::Metric => "metric",
        };
        f.write_str(s)
    }
}

/// Human-facing documentation for one definition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerHelp {
    /// Grouping key for help output, e.g. `validation`.
    pub category: String,
    /// One-line summary.
    pub summary: String,
    /// Longer description, possibly empty.
    pub details: String,
}

/// A registered marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarkerDefinition {
    /// `:`-separated marker name, without the leading `+`.
    pub name: String,
    /// Kind of comment the marker may appear in.
    pub applicability: Applicability,
    /// Arguments in declaration order.
    pub args: Vec<ArgSpec>,
    /// Consuming engine.
    pub contributor: Contributor,
    /// Whether more than one occurrence per location is allowed.
    pub repeatable: bool,
    /// Documentation.
    pub help: MarkerHelp,
}

impl MarkerDefinition {
    /// A flag marker with no arguments.
    pub fn new(
        name: impl Into<String>,
        applicability: Applicability,
        contributor: Contributor,
    ) -> Self {
        Self {
            name: name.into(),
            applicability,
            args: Vec::new(),
            contributor,
            repeatable: true,
            help: MarkerHelp::default(),
        }
    }

    /// Builder: add a required named argument.
    pub fn arg(mut self, name: &str, kind: ArgKind) -> Self {
        self.args.push(ArgSpec {
            name: name.to_string(),
            kind,
            optional: false,
        });
        self
    }

    /// Builder: add an optional named argument.
    pub fn optional(mut self, name: &str, kind: ArgKind) -> Self {
        self.args.push(ArgSpec {
            name: name.to_string(),
            kind,
            optional: true,
        });
        self
    }

    /// Builder: make this a `+name=value` marker with one required value.
    pub fn anonymous(mut self, kind: ArgKind) -> Self {
        self.args = vec![ArgSpec {
            name: ANONYMOUS.to_string(),
            kind,
            optional: false,
        }];
        self
    }

    /// Builder: allow at most one occurrence per location.
    pub fn single(mut self) -> Self {
        self.repeatable = false;
        self
    }

    /// Builder: attach documentation.
    pub fn help(mut self, category: &str, summary: &str) -> Self {
        self.help.category = category.to_string();
        self.help.summary = summary.to_string();
        self
    }

    /// Builder: attach longer documentation.
    pub fn details(mut self, details: &str) -> Self {
        self.help.details = details.to_string();
        self
    }

    /// The same definition at a different applicability.
    pub fn at(&self, applicability: Applicability) -> Self {
        Self {
            applicability,
            ..self.clone()
        }
    }

    /// Whether this marker takes exactly one unnamed value.
    pub fn is_anonymous(&self) -> bool {
        matches!(self.args.as_slice(), [only] if only.name == ANONYMOUS)
    }

    /// Look up an argument by key.
    pub fn arg_spec(&self, name: &str) -> Option<&ArgSpec> {
        self.args.iter().find(|a| a.name == name)
    }
}

/// Errors raised while building a registry.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RegistryError {
    /// A definition with the same name and applicability already exists.
    #[error("duplicate marker definition '{name}' for {applicability} comments")]
    DuplicateDefinition {
        /// Marker name.
        name: String,
        /// Applicability of both definitions.
        applicability: Applicability,
    },
}

/// A source of marker definitions, typically one per engine crate.
pub trait MarkerProvider {
    /// Short provider name, used in logs.
    fn name(&self) -> &'static str;

    /// Every definition this provider contributes.
    fn definitions(&self) -> Vec<MarkerDefinition>;
}

/// One line of help output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HelpEntry {
    /// Marker name.
    pub name: String,
    /// Where it may appear.
    pub applicability: Applicability,
    /// One-line summary.
    pub summary: String,
    /// Longer description.
    pub details: String,
    /// Rendered argument list, e.g. `verbs: string list`.
    pub args: Vec<String>,
}

/// The marker catalog.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    definitions: IndexMap<(String, Applicability), MarkerDefinition>,
}

impl Registry {
    /// An empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from providers, in order.
    pub fn compose(providers: &[&dyn MarkerProvider]) -> Result<Self, RegistryError> {
        let mut registry = Self::new();
        for provider in providers {
            let defs = provider.definitions();
            tracing::debug!(provider = provider.name(), count = defs.len(), "registering markers");
            registry.register_all(defs)?;
        }
        Ok(registry)
    }

    /// Register one definition.
    pub fn register(&mut self, definition: MarkerDefinition) -> Result<(), RegistryError> {
        let key = (definition.name.clone(), definition.applicability);
        if self.definitions.contains_key(&key) {
            return Err(RegistryError::DuplicateDefinition {
                name: definition.name,
                applicability: definition.applicability,
            });
        }
        self.definitions.insert(key, definition);
        Ok(())
    }

    /// Register several definitions, stopping at the first duplicate.
    pub fn register_all(
        &mut self,
        definitions: impl IntoIterator<Item = MarkerDefinition>,
    ) -> Result<(), RegistryError> {
        for def in definitions {
            self.register(def)?;
        }
        Ok(())
    }

    /// Find the definition for a name at one applicability.
    pub fn lookup(&self, name: &str, applicability: Applicability) -> Option<&MarkerDefinition> {
        self.definitions.get(&(name.to_string(), applicability))
    }

    /// Applicabilities at which a name is defined, in fixed order.
    pub fn applicabilities_of(&self, name: &str) -> Vec<Applicability> {
        Applicability::ALL
            .into_iter()
            .filter(|&app| self.lookup(name, app).is_some())
            .collect()
    }

    /// Number of definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// Definitions in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &MarkerDefinition> {
        self.definitions.values()
    }

    /// Help entries for one category, sorted by name then applicability.
    pub fn help_for(&self, category: &str) -> Vec<HelpEntry> {
        let mut entries: Vec<HelpEntry> = self
            .iter()
            .filter(|d| d.help.category == category)
            .map(help_entry)
            .collect();
        entries.sort_by(|a, b| (&a.name, a.applicability).cmp(&(&b.name, b.applicability)));
        entries
    }

    /// Help entries for every category.
    pub fn help(&self) -> BTreeMap<String, Vec<HelpEntry>> {
        let categories: Vec<String> = self.iter().map(|d| d.help.category.clone()).collect();
        categories
            .into_iter()
            .map(|c| {
                let entries = self.help_for(&c);
                (c, entries)
            })
            .collect()
    }
}

fn help_entry(def: &MarkerDefinition) -> HelpEntry {
    HelpEntry {
        name: def.name.clone(),
        applicability: def.applicability,
        summary: def.help.summary.clone(),
        details: def.help.details.clone(),
        args: def
            .args
            .iter()
            .map(|a| {
                let name = if a.name.is_empty() { "value" } else { a.name.as_str() };
                if a.optional {
                    format!("{name}: {} (optional)", a.kind)
                } else {
                    format!("{name}: {}", a.kind)
                }
            })
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Validation;

    impl MarkerProvider for Validation {
        fn name(&self) -> &'static str {
            "validation"
        }

        fn definitions(&self) -> Vec<MarkerDefinition> {
            let max = MarkerDefinition::new("validation:MaxLength", Applicability::Field, Contributor::Schema)
                .anonymous(ArgKind::Int)
                .single()
                .help("validation", "maximum string length");
            vec![max.at(Applicability::Declaration), max]
        }
    }

    struct Rbac;

    impl MarkerProvider for Rbac {
        fn name(&self) -> &'static str {
            "rbac"
        }

        fn definitions(&self) -> Vec<MarkerDefinition> {
            vec![MarkerDefinition::new("rbac", Applicability::Package, Contributor::Rule)
                .arg("verbs", ArgKind::StringList)
                .optional("group", ArgKind::StringList)
                .help("rbac", "access rule")]
        }
    }

    #[test]
    fn test_compose_and_lookup() {
        let registry = Registry::compose(&[&Validation, &Rbac]).unwrap();
        assert_eq!(registry.len(), 3);
        let def = registry
            .lookup("validation:MaxLength", Applicability::Field)
            .unwrap();
        assert!(def.is_anonymous());
        assert!(!def.repeatable);
        assert!(registry.lookup("validation:MaxLength", Applicability::Package).is_none());
        assert!(registry.lookup("unknown", Applicability::Field).is_none());
    }

    #[test]
    fn test_duplicate_definition_rejected() {
        let result = Registry::compose(&[&Validation, &Validation]);
        assert_eq!(
            result.unwrap_err(),
            RegistryError::DuplicateDefinition {
                name: "validation:MaxLength".to_string(),
                applicability: Applicability::Declaration,
            }
        );
    }

    #[test]
    fn test_applicabilities_of() {
        let registry = Registry::compose(&[&Validation]).unwrap();
        assert_eq!(
            registry.applicabilities_of("validation:MaxLength"),
            vec![Applicability::Declaration, Applicability::Field]
        );
    }

    #[test]
    fn test_help_grouping() {
        let registry = Registry::compose(&[&Rbac, &Validation]).unwrap();
        let help = registry.help();
        assert_eq!(help.keys().collect::<Vec<_>>(), vec!["rbac", "validation"]);
        let rbac = &help["rbac"];
        assert_eq!(rbac.len(), 1);
        assert_eq!(
            rbac[0].args,
            vec!["verbs: string list".to_string(), "group: string list (optional)".to_string()]
        );
        let validation = registry.help_for("validation");
        assert_eq!(validation.len(), 2);
        assert_eq!(validation[0].applicability, Applicability::Declaration);
        assert_eq!(validation[0].args, vec!["value: int".to_string()]);
    }
}
