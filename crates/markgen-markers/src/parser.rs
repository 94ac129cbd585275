//! # Marker Parser
//!
//! Binds raw marker lines to registry definitions and decodes their
//! arguments.
//!
//! ## Name resolution
//!
//! Given the body `validation:Constraints:maxLength=15,minLength=1`:
//!
//! 1. The text before the first `=` (`validation:Constraints:maxLength`) is
//!    looked up at the current applicability. A hit means the anonymous form
//!    `+name=value`, or a bare marker when there is no `=`.
//! 2. Otherwise trailing `:` segments are stripped one at a time; the first
//!    registered prefix is the marker and the rest is its argument list.
//! 3. A prefix registered only at other applicabilities is an
//!    applicability error. A body with no registered prefix anywhere is a
//!    third-party annotation and is ignored.
//!
//! Failures are returned as [`Diagnostic`]s attached to the comment's
//! location; parsing continues with the next line.

use markgen_core::{Applicability, Diagnostic, Diagnostics, Location};

use crate::decode::{decode_args, ArgForm};
use crate::lexer::{marker_body, raw_markers};
use crate::registry::{MarkerDefinition, Registry};
use crate::value::{MarkerSet, MarkerValue};

/// Outcome of resolving a marker body against the registry.
enum Resolution<'r, 't> {
    Found {
        def: &'r MarkerDefinition,
        form: ArgForm,
        args: &'t str,
    },
    Elsewhere {
        name: &'t str,
        allowed: Vec<Applicability>,
    },
    Unknown,
}

/// Parser for comment blocks, borrowing a composed registry.
#[derive(Debug, Clone, Copy)]
pub struct MarkerParser<'r> {
    registry: &'r Registry,
}

impl<'r> MarkerParser<'r> {
    /// Create a parser over a registry.
    pub fn new(registry: &'r Registry) -> Self {
        Self { registry }
    }

    /// The registry this parser resolves against.
    pub fn registry(&self) -> &'r Registry {
        self.registry
    }

    fn resolve<'t>(&self, body: &'t str, applicability: Applicability) -> Resolution<'r, 't> {
        let head = body.split_once('=').map_or(body, |(h, _)| h);

        if let Some(def) = self.registry.lookup(head, applicability) {
            return match body.split_once('=') {
                Some((_, value)) => Resolution::Found {
                    def,
                    form: ArgForm::Anonymous,
                    args: value,
                },
                None => Resolution::Found {
                    def,
                    form: ArgForm::Bare,
                    args: "",
                },
            };
        }

        let mut candidate = head;
        while let Some(idx) = candidate.rfind(':') {
            candidate = &candidate[..idx];
            if let Some(def) = self.registry.lookup(candidate, applicability) {
                return Resolution::Found {
                    def,
                    form: ArgForm::Named,
                    args: &body[idx + 1..],
                };
            }
        }

        let mut candidate = head;
        loop {
            let allowed = self.registry.applicabilities_of(candidate);
            if !allowed.is_empty() {
                return Resolution::Elsewhere {
                    name: candidate,
                    allowed,
                };
            }
            match candidate.rfind(':') {
                Some(idx) => candidate = &candidate[..idx],
                None => return Resolution::Unknown,
            }
        }
    }

    /// Parse one comment line. Returns `Ok(None)` for prose and for
    /// unregistered markers.
    pub fn parse_line(
        &self,
        line: &str,
        location: &Location,
    ) -> Result<Option<MarkerValue>, Diagnostic> {
        let Some(body) = marker_body(line) else {
            return Ok(None);
        };
        self.parse_body(body, location)
    }

    fn parse_body(&self, body: &str, location: &Location) -> Result<Option<MarkerValue>, Diagnostic> {
        match self.resolve(body, location.applicability()) {
            Resolution::Unknown => {
                tracing::trace!(marker = body, location = %location, "ignoring unregistered marker");
                Ok(None)
            }
            Resolution::Elsewhere { name, allowed } => {
                let allowed: Vec<String> = allowed.iter().map(ToString::to_string).collect();
                Err(Diagnostic::applicability(
                    location.clone(),
                    format!(
                        "marker '{name}' is not allowed on {} comments (allowed: {})",
                        location.applicability(),
                        allowed.join(", ")
                    ),
                ))
            }
            Resolution::Found { def, form, args } => {
                let args = decode_args(def, form, args)
                    .map_err(|e| Diagnostic::syntax(location.clone(), format!("+{body}: {e}")))?;
                Ok(Some(MarkerValue {
                    name: def.name.clone(),
                    location: location.clone(),
                    contributor: def.contributor,
                    args,
                }))
            }
        }
    }

    /// Parse a whole comment block.
    ///
    /// A second occurrence of a single-valued marker is reported and
    /// dropped; the first occurrence wins.
    pub fn parse_comment(&self, lines: &[String], location: &Location) -> (MarkerSet, Diagnostics) {
        let mut set = MarkerSet::new();
        let mut diagnostics = Diagnostics::new();
        for raw in raw_markers(lines, location) {
            match self.parse_body(&raw.text, &raw.location) {
                Ok(Some(value)) => {
                    let single = self
                        .registry
                        .lookup(&value.name, location.applicability())
                        .is_some_and(|def| !def.repeatable);
                    if single && set.contains(&value.name) {
                        diagnostics.push(Diagnostic::semantic(
                            location.clone(),
                            format!(
                                "marker '{}' may appear only once; ignoring line {}",
                                value.name,
                                raw.line + 1
                            ),
                        ));
                        continue;
                    }
                    set.push(value);
                }
                Ok(None) => {}
                Err(diagnostic) => diagnostics.push(diagnostic),
            }
        }
        (set, diagnostics)
    }
}
