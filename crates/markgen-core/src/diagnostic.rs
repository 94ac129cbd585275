//! # Diagnostics
//!
//! Recoverable failures attached to a single [`Location`]. Engines collect
//! these alongside their output instead of returning early, so a malformed
//! marker on one declaration never blocks output for the others.
//!
//! ## Taxonomy
//!
//! | Kind | Raised for |
//! |------|------------|
//! | `Syntax` | malformed marker line or argument, malformed gate expression |
//! | `Applicability` | a marker used on a kind of location it does not support |
//! | `Resolution` | a type reference the loader could not resolve |
//! | `Semantic` | union conflicts, mixed rule targets, invalid webhook combinations |
//!
//! Unknown markers are not diagnostics at all; they are ignored.

use serde::{Deserialize, Serialize};

use crate::location::Location;

/// The category of a recoverable failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DiagnosticKind {
    /// Malformed marker text or gate expression.
    Syntax,
    /// Marker used at a location kind it does not support.
    Applicability,
    /// Unresolvable type reference.
    Resolution,
    /// Well-formed input whose meaning is contradictory or invalid.
    Semantic,
}

impl std::fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Syntax => "syntax",
            Self::Applicability => "applicability",
            Self::Resolution => "resolution",
            Self::Semantic => "semantic",
        };
        f.write_str(s)
    }
}

/// A single recoverable failure at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Failure category.
    pub kind: DiagnosticKind,
    /// Where the failure was detected.
    pub location: Location,
    /// Human-readable description.
    pub message: String,
}

impl Diagnostic {
    /// Create a diagnostic of the given kind.
    pub fn new(kind: DiagnosticKind, location: Location, message: impl Into<String>) -> Self {
        Self {
            kind,
            location,
            message: message.into(),
        }
    }

    /// Shorthand for a [`DiagnosticKind::Syntax`] diagnostic.
    pub fn syntax(location: Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Syntax, location, message)
    }

    /// Shorthand for a [`DiagnosticKind::Applicability`] diagnostic.
    pub fn applicability(location: Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Applicability, location, message)
    }

    /// Shorthand for a [`DiagnosticKind::Resolution`] diagnostic.
    pub fn resolution(location: Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Resolution, location, message)
    }

    /// Shorthand for a [`DiagnosticKind::Semantic`] diagnostic.
    pub fn semantic(location: Location, message: impl Into<String>) -> Self {
        Self::new(DiagnosticKind::Semantic, location, message)
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} error at {}: {}", self.kind, self.location, self.message)
    }
}

/// An ordered collection of diagnostics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    /// Create an empty collection.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append one diagnostic.
    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.entries.push(diagnostic);
    }

    /// Returns the number of diagnostics.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if nothing was reported.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate diagnostics in report order.
    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.entries.iter()
    }

    /// Diagnostics of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    /// Diagnostics reported at one location.
    pub fn at<'a>(&'a self, location: &'a Location) -> impl Iterator<Item = &'a Diagnostic> {
        self.entries.iter().filter(move |d| &d.location == location)
    }

    /// Whether any diagnostic was reported at the given location.
    pub fn has_errors_at(&self, location: &Location) -> bool {
        self.at(location).next().is_some()
    }

    /// Consumes self and returns the inner Vec.
    pub fn into_inner(self) -> Vec<Diagnostic> {
        self.entries
    }
}

impl Extend<Diagnostic> for Diagnostics {
    fn extend<I: IntoIterator<Item = Diagnostic>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

impl FromIterator<Diagnostic> for Diagnostics {
    fn from_iter<I: IntoIterator<Item = Diagnostic>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

impl std::fmt::Display for Diagnostics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, d) in self.entries.iter().enumerate() {
            if i > 0 {
                writeln!(f)?;
            }
            write!(f, "{d}")?;
        }
        Ok(())
    }
}
