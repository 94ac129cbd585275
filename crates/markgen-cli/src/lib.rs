//! # markgen-cli: The `markgen` Command-Line Interface
//!
//! Wires the engines together behind a clap-based CLI.
//!
//! ## Subcommands
//!
//! - `generate`: load inputs, run every enabled generator, write artifacts
//! - `check`: run the same pipeline and print diagnostics only
//! - `markers`: print the marker catalog grouped by category
//!
//! ## Modules
//!
//! - [`config`]: `markgen.yaml` and command-line overrides
//! - [`loader`]: the document [`TypeLoader`](markgen_core::TypeLoader)
//! - [`generate`]: the pipeline itself
//! - [`output`]: artifact rendering and sinks
//! - [`commands`], [`help`]: subcommand handlers
//!
//! ## Crate Policy
//!
//! - Argument parsing stays in `main.rs`; handlers live here and return
//!   `anyhow::Result<u8>` exit codes.
//! - No generation logic here beyond composing the engine crates.

pub mod commands;
pub mod config;
pub mod generate;
pub mod help;
pub mod loader;
pub mod output;

pub use config::{GeneratorConfig, OutputFormat};
pub use generate::{registry, run_pipeline, Generated};
pub use loader::{DocumentLoader, LoadError};
