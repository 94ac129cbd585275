//! # markgen-gates: Feature-Gate Expressions
//!
//! Two small languages live here:
//!
//! - **Gate expressions** ([`GateExpr`]): `name`, `a&b&c`, `a|b`, and
//!   parenthesized groups. Strict: whitespace and ungrouped operator mixing
//!   are syntax errors. [`validate`] checks syntax without a gate state so
//!   marker decoding can reject bad expressions up front.
//!
//! - **Gate state** ([`GateState`]): `name=true,name=false` configuration.
//!   Permissive: whitespace is trimmed and malformed entries are skipped.
//!
//! ## Crate Policy
//!
//! - No dependencies on other `markgen-*` crates.
//! - Evaluation is total: a gate absent from the state is disabled.

pub mod expr;
pub mod state;

pub use expr::{evaluate, validate, GateError, GateExpr};
pub use state::{GateState, SkippedEntry};
