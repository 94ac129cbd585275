//! # Gate State
//!
//! The set of enabled and disabled feature gates for one run, parsed from
//! configuration text of the form `alpha=true, beta=false`.
//!
//! Unlike the expression language, this parser is permissive: surrounding
//! whitespace is trimmed and malformed entries are skipped with a warning
//! instead of failing the run. Skipped entries are also returned by
//! [`GateState::parse_with_report`] so callers can surface them.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Enabled/disabled flags keyed by gate name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GateState {
    gates: BTreeMap<String, bool>,
}

/// An entry of gate configuration text that could not be understood.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedEntry {
    /// The entry as written, trimmed.
    pub entry: String,
    /// Why it was skipped.
    pub reason: &'static str,
}

impl GateState {
    /// An empty state: every gate disabled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse configuration text, skipping malformed entries.
    pub fn parse(config: &str) -> Self {
        Self::parse_with_report(config).0
    }

    /// Parse configuration text and report every skipped entry.
    ///
    /// Blank entries (for example a trailing comma) are ignored without
    /// being reported. When a gate appears more than once the last value wins.
    pub fn parse_with_report(config: &str) -> (Self, Vec<SkippedEntry>) {
        let mut state = Self::new();
        let mut skipped = Vec::new();

        for raw in config.split(',') {
            let entry = raw.trim();
            if entry.is_empty() {
                continue;
            }
            let Some((name, value)) = entry.split_once('=') else {
                skipped.push(SkippedEntry {
                    entry: entry.to_string(),
                    reason: "missing '='",
                });
                continue;
            };
            let name = name.trim();
            if name.is_empty()
                || !name
                    .chars()
                    .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
            {
                skipped.push(SkippedEntry {
                    entry: entry.to_string(),
                    reason: "invalid gate name",
                });
                continue;
            }
            match value.trim() {
                "true" => state.set(name, true),
                "false" => state.set(name, false),
                _ => skipped.push(SkippedEntry {
                    entry: entry.to_string(),
                    reason: "value is not true or false",
                }),
            }
        }

        for s in &skipped {
            tracing::warn!(entry = %s.entry, reason = s.reason, "skipping malformed feature gate entry");
        }

        (state, skipped)
    }

    /// Set a gate.
    pub fn set(&mut self, name: impl Into<String>, enabled: bool) {
        self.gates.insert(name.into(), enabled);
    }

    /// Whether a gate is enabled. Absent gates are disabled.
    pub fn is_enabled(&self, name: &str) -> bool {
        self.gates.get(name).copied().unwrap_or(false)
    }

    /// Number of gates with an explicit value.
    pub fn len(&self) -> usize {
        self.gates.len()
    }

    /// Whether no gate has an explicit value.
    pub fn is_empty(&self) -> bool {
        self.gates.is_empty()
    }

    /// Iterate explicit values in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, bool)> {
        self.gates.iter().map(|(k, v)| (k.as_str(), *v))
    }
}

impl<K: Into<String>> FromIterator<(K, bool)> for GateState {
    fn from_iter<I: IntoIterator<Item = (K, bool)>>(iter: I) -> Self {
        let mut state = Self::new();
        for (name, enabled) in iter {
            state.set(name, enabled);
        }
        state
    }
}

impl std::fmt::Display for GateState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, (name, enabled)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{name}={enabled}")?;
        }
        Ok(())
    }
}
