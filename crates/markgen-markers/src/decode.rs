//! # Argument Decoder
//!
//! Recursive-descent decoding of marker argument text into typed values,
//! driven by the argument shape of a [`MarkerDefinition`].
//!
//! ```text
//! args    := ε | arg (',' arg)*
//! arg     := key '=' value | key            (bare key = boolean true)
//! value   := quoted | raw | list | record
//! list    := item (';' item)* | '{' item (',' item)* '}'
//! record  := section ('&' section)*
//! section := name '~' key '=' raw ('.' key '=' raw)*
//! ```
//!
//! Commas inside quotes, backticks, `{}` and `[]` do not split arguments.

use indexmap::IndexMap;
use thiserror::Error;

use markgen_gates::GateExpr;

use crate::registry::{ArgKind, MarkerDefinition, ANONYMOUS};
use crate::value::{split_key_value, split_unquoted, unquote, ArgValue, JsonPath, SubRecord};

/// How the argument text was attached to the marker name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgForm {
    /// `+name` with nothing after it.
    Bare,
    /// `+name=value`.
    Anonymous,
    /// `+name:key=value,...`.
    Named,
}

/// Errors produced while decoding one marker's arguments.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum DecodeError {
    /// A flag marker was given arguments.
    #[error("marker '{marker}' takes no arguments")]
    UnexpectedArguments {
        /// Marker name.
        marker: String,
    },

    /// A single-value marker was written without `=value` or with named arguments.
    #[error("marker '{marker}' expects a single value written as '+{marker}=value'")]
    ExpectedValue {
        /// Marker name.
        marker: String,
    },

    /// A named-argument marker was written as `+name=value`.
    #[error("marker '{marker}' takes named arguments, written as '+{marker}:key=value'")]
    ExpectedNamedArguments {
        /// Marker name.
        marker: String,
    },

    /// An argument key the definition does not declare.
    #[error("unknown argument '{argument}' for marker '{marker}'")]
    UnknownArgument {
        /// Marker name.
        marker: String,
        /// Offending key.
        argument: String,
    },

    /// A required argument was not given.
    #[error("missing required argument '{argument}' for marker '{marker}'")]
    MissingArgument {
        /// Marker name.
        marker: String,
        /// Missing key.
        argument: String,
    },

    /// The same argument appeared twice.
    #[error("argument '{argument}' given more than once for marker '{marker}'")]
    DuplicateArgument {
        /// Marker name.
        marker: String,
        /// Repeated key.
        argument: String,
    },

    /// A value did not match its argument kind.
    #[error("invalid {kind} value '{value}' for argument '{argument}' of marker '{marker}': {reason}")]
    InvalidValue {
        /// Marker name.
        marker: String,
        /// Argument key; empty for the unnamed argument.
        argument: String,
        /// Expected kind.
        kind: ArgKind,
        /// Text as written.
        value: String,
        /// What was wrong.
        reason: String,
    },

    /// The argument list itself could not be split.
    #[error("malformed arguments for marker '{marker}': {reason}")]
    Malformed {
        /// Marker name.
        marker: String,
        /// What was wrong.
        reason: String,
    },
}

/// Decode one value of the given kind.
pub fn decode_value(kind: ArgKind, text: &str) -> Result<ArgValue, String> {
    match kind {
        ArgKind::String => unquote(text).map(ArgValue::String),
        ArgKind::Int => {
            let raw = unquote(text)?;
            raw.parse::<i64>()
                .map(ArgValue::Int)
                .map_err(|e| e.to_string())
        }
        ArgKind::Number => {
            let raw = unquote(text)?;
            raw.parse::<serde_json::Number>()
                .map(ArgValue::Number)
                .map_err(|e| e.to_string())
        }
        ArgKind::Bool => match text {
            "true" => Ok(ArgValue::Bool(true)),
            "false" => Ok(ArgValue::Bool(false)),
            _ => Err("expected true or false".to_string()),
        },
        ArgKind::StringList => decode_list(text).map(ArgValue::StringList),
        ArgKind::Path => JsonPath::parse(&unquote(text)?).map(ArgValue::Path),
        ArgKind::SubRecord => SubRecord::parse(text).map(ArgValue::Record),
        ArgKind::GateExpression => GateExpr::parse(&unquote(text)?)
            .map(ArgValue::Gate)
            .map_err(|e| e.to_string()),
        ArgKind::Any => match serde_json::from_str::<serde_json::Value>(text) {
            Ok(value) => Ok(ArgValue::Any(value)),
            Err(_) => unquote(text).map(|s| ArgValue::Any(serde_json::Value::String(s))),
        },
    }
}

fn decode_list(text: &str) -> Result<Vec<String>, String> {
    if text.is_empty() {
        return Ok(Vec::new());
    }
    let items = match text.strip_prefix('{').and_then(|t| t.strip_suffix('}')) {
        Some(inner) if inner.is_empty() => return Ok(Vec::new()),
        Some(inner) => split_unquoted(inner, ',')?,
        None => split_unquoted(text, ';')?,
    };
    items.iter().map(|item| unquote(item)).collect()
}

/// Decode a marker's argument text according to its definition.
pub fn decode_args(
    def: &MarkerDefinition,
    form: ArgForm,
    text: &str,
) -> Result<IndexMap<String, ArgValue>, DecodeError> {
    let marker = || def.name.clone();
    let mut args = IndexMap::new();

    if def.args.is_empty() {
        return match form {
            ArgForm::Bare => Ok(args),
            _ => Err(DecodeError::UnexpectedArguments { marker: marker() }),
        };
    }

    if def.is_anonymous() {
        let spec = &def.args[0];
        return match form {
            ArgForm::Anonymous => {
                let value = decode_value(spec.kind, text).map_err(|reason| DecodeError::InvalidValue {
                    marker: marker(),
                    argument: ANONYMOUS.to_string(),
                    kind: spec.kind,
                    value: text.to_string(),
                    reason,
                })?;
                args.insert(ANONYMOUS.to_string(), value);
                Ok(args)
            }
            ArgForm::Bare if spec.optional => Ok(args),
            _ => Err(DecodeError::ExpectedValue { marker: marker() }),
        };
    }

    if form == ArgForm::Anonymous {
        return Err(DecodeError::ExpectedNamedArguments { marker: marker() });
    }

    if !text.is_empty() {
        let pieces = split_unquoted(text, ',').map_err(|reason| DecodeError::Malformed {
            marker: marker(),
            reason,
        })?;
        for piece in pieces {
            if piece.is_empty() {
                continue;
            }
            let (key, raw) = match split_key_value(&piece) {
                Some((k, v)) => (k, Some(v)),
                None => (piece.as_str(), None),
            };
            let Some(spec) = def.arg_spec(key) else {
                return Err(DecodeError::UnknownArgument {
                    marker: marker(),
                    argument: key.to_string(),
                });
            };
            if args.contains_key(key) {
                return Err(DecodeError::DuplicateArgument {
                    marker: marker(),
                    argument: key.to_string(),
                });
            }
            let value = match raw {
                Some(raw) => decode_value(spec.kind, raw),
                None if spec.kind == ArgKind::Bool => Ok(ArgValue::Bool(true)),
                None => Err("missing '=value'".to_string()),
            }
            .map_err(|reason| DecodeError::InvalidValue {
                marker: marker(),
                argument: key.to_string(),
                kind: spec.kind,
                value: raw.unwrap_or_default().to_string(),
                reason,
            })?;
            args.insert(key.to_string(), value);
        }
    }

    if let Some(missing) = def
        .args
        .iter()
        .find(|a| !a.optional && !args.contains_key(&a.name))
    {
        return Err(DecodeError::MissingArgument {
            marker: marker(),
            argument: missing.name.clone(),
        });
    }

    Ok(args)
}
