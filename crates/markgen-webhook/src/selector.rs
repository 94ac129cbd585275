//! # Label Selectors
//!
//! Parses the sub-record form of a selector argument:
//!
//! ```text
//! matchLabels~app=web.tier=front&matchExpressions~key=env.operator=In.values=prod|staging
//! ```
//!
//! `matchLabels` sections contribute label equalities. Each
//! `matchExpressions` section is one requirement; `values` are `|`-separated.

use std::str::FromStr;

use indexmap::IndexMap;
use markgen_markers::{Section, SubRecord};
use serde::{Deserialize, Serialize};
use thiserror::Error;

const MATCH_LABELS: &str = "matchLabels";
const MATCH_EXPRESSIONS: &str = "matchExpressions";

/// Errors raised while building a selector from marker text.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectorError {
    /// The text is not valid sub-record syntax.
    #[error("malformed selector: {0}")]
    Malformed(String),

    /// A section other than matchLabels or matchExpressions.
    #[error("unknown selector section {0:?}")]
    UnknownSection(String),

    /// A matchExpressions clause without `key`.
    #[error("matchExpressions clause is missing key")]
    MissingKey,

    /// A matchExpressions clause without `operator`.
    #[error("matchExpressions clause for {key:?} is missing operator")]
    MissingOperator {
        /// The clause key.
        key: String,
    },

    /// An operator outside In, NotIn, Exists, DoesNotExist.
    #[error("unknown selector operator {0:?}")]
    UnknownOperator(String),

    /// In/NotIn without values, or Exists/DoesNotExist with values.
    #[error("operator {operator} on {key:?} {expectation}")]
    ValuesMismatch {
        /// The clause key.
        key: String,
        /// The clause operator.
        operator: SelectorOperator,
        /// What the operator requires.
        expectation: &'static str,
    },

    /// A matchExpressions entry other than key, operator, values.
    #[error("unknown matchExpressions entry {0:?}")]
    UnknownEntry(String),
}

/// Operators permitted in a `matchExpressions` clause.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SelectorOperator {
    In,
    NotIn,
    Exists,
    DoesNotExist,
}

impl SelectorOperator {
    /// Whether the operator takes a value list.
    pub fn takes_values(&self) -> bool {
        matches!(self, Self::In | Self::NotIn)
    }
}

impl std::fmt::Display for SelectorOperator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::In => "In",
            Self::NotIn => "NotIn",
            Self::Exists => "Exists",
            Self::DoesNotExist => "DoesNotExist",
        };
        f.write_str(s)
    }
}

impl FromStr for SelectorOperator {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "In" => Ok(Self::In),
            "NotIn" => Ok(Self::NotIn),
            "Exists" => Ok(Self::Exists),
            "DoesNotExist" => Ok(Self::DoesNotExist),
            other => Err(SelectorError::UnknownOperator(other.to_string())),
        }
    }
}

/// One `matchExpressions` clause.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectorRequirement {
    /// Label key the clause tests.
    pub key: String,
    /// How the label value is compared.
    pub operator: SelectorOperator,
    /// Values for `In` and `NotIn`.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub values: Vec<String>,
}

/// A structured label selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    /// Exact label matches, in written order.
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub match_labels: IndexMap<String, String>,
    /// Set-based clauses, all of which must hold.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub match_expressions: Vec<SelectorRequirement>,
}

impl LabelSelector {
    /// Parse selector text.
    pub fn parse(text: &str) -> Result<Self, SelectorError> {
        let record = SubRecord::parse(text).map_err(SelectorError::Malformed)?;
        Self::from_record(&record)
    }

    /// Build a selector from an already-decoded sub-record.
    pub fn from_record(record: &SubRecord) -> Result<Self, SelectorError> {
        let mut selector = Self::default();
        for section in &record.sections {
            match section.name.as_str() {
                MATCH_LABELS => {
                    for (k, v) in &section.entries {
                        selector.match_labels.insert(k.clone(), v.clone());
                    }
                }
                MATCH_EXPRESSIONS => selector.match_expressions.push(requirement(section)?),
                other => return Err(SelectorError::UnknownSection(other.to_string())),
            }
        }
        Ok(selector)
    }

    /// Whether the selector matches everything.
    pub fn is_empty(&self) -> bool {
        self.match_labels.is_empty() && self.match_expressions.is_empty()
    }
}

fn requirement(section: &Section) -> Result<SelectorRequirement, SelectorError> {
    if let Some((unknown, _)) = section
        .entries
        .iter()
        .find(|(k, _)| !matches!(k.as_str(), "key" | "operator" | "values"))
    {
        return Err(SelectorError::UnknownEntry(unknown.clone()));
    }

    let key = section.get("key").ok_or(SelectorError::MissingKey)?.to_string();
    let operator: SelectorOperator = section
        .get("operator")
        .ok_or_else(|| SelectorError::MissingOperator { key: key.clone() })?
        .parse()?;
    let values: Vec<String> = section
        .get("values")
        .map(|v| v.split('|').filter(|s| !s.is_empty()).map(str::to_string).collect())
        .unwrap_or_default();

    match (operator.takes_values(), values.is_empty()) {
        (true, true) => Err(SelectorError::ValuesMismatch {
            key,
            operator,
            expectation: "requires values",
        }),
        (false, false) => Err(SelectorError::ValuesMismatch {
            key,
            operator,
            expectation: "takes no values",
        }),
        _ => Ok(SelectorRequirement { key, operator, values }),
    }
}
