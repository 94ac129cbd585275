//! # `generate` and `check`
//!
//! Both subcommands load the configuration, apply command-line overrides,
//! load the type graph, and run the pipeline. `generate` writes artifacts;
//! `check` prints diagnostics only.
//!
//! ## Exit codes
//!
//! - `0` on success, including runs that reported diagnostics.
//! - `1` when configuration, input, or output fails (returned as `Err`).
//! - `2` when `--strict` is set and any diagnostic was reported.

use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use markgen_core::{Diagnostics, TypeLoader};

use crate::config::{GeneratorConfig, OutputFormat, Overrides};
use crate::generate::{report, run_pipeline, Generated};
use crate::loader::DocumentLoader;
use crate::output::{write_artifacts, DirectorySink, StreamSink};

/// Exit code for a strict run with diagnostics.
pub const EXIT_DIAGNOSTICS: u8 = 2;

/// Flags shared by every subcommand.
#[derive(Debug, Clone, Default)]
pub struct GlobalOptions {
    pub config: Option<PathBuf>,
    pub strict: bool,
}

/// Input and output overrides for `generate` and `check`.
#[derive(Args, Debug, Clone, Default)]
pub struct PipelineArgs {
    /// Type-graph document to load (YAML or JSON). Repeatable; replaces
    /// the configuration file's `inputs`.
    #[arg(short, long = "input", value_name = "PATH")]
    pub inputs: Vec<PathBuf>,

    /// Feature gates, e.g. `alpha=true,beta=false`.
    #[arg(long)]
    pub feature_gates: Option<String>,

    /// Directory for generated files. Output goes to stdout when unset.
    #[arg(long)]
    pub output_dir: Option<PathBuf>,

    /// Output format.
    #[arg(long, value_enum)]
    pub format: Option<OutputFormat>,
}

impl PipelineArgs {
    fn overrides(&self) -> Overrides {
        Overrides {
            inputs: self.inputs.clone(),
            feature_gates: self.feature_gates.clone(),
            output_dir: self.output_dir.clone(),
            format: self.format,
        }
    }
}

/// Read the configuration file when given and apply overrides.
pub fn resolve_config(global: &GlobalOptions, args: &PipelineArgs) -> Result<GeneratorConfig> {
    let mut config = match &global.config {
        Some(path) if path.is_file() => GeneratorConfig::load(path)?,
        Some(path) => {
            tracing::info!(path = %path.display(), "configuration file not found; using defaults");
            GeneratorConfig::default()
        }
        None => GeneratorConfig::default(),
    };
    config.apply(&args.overrides());
    Ok(config)
}

fn load_and_run(config: &GeneratorConfig) -> Result<Generated> {
    let graph = DocumentLoader
        .load(&config.inputs)
        .context("loading type graph")?;
    let generated = run_pipeline(&graph, config)?;
    report(&generated.diagnostics);
    Ok(generated)
}

fn exit_code(global: &GlobalOptions, diagnostics: &Diagnostics) -> u8 {
    if global.strict && !diagnostics.is_empty() {
        EXIT_DIAGNOSTICS
    } else {
        0
    }
}

/// Run the pipeline and write every non-empty artifact.
pub fn run_generate(args: &PipelineArgs, global: &GlobalOptions) -> Result<u8> {
    let config = resolve_config(global, args)?;
    let generated = load_and_run(&config)?;
    let artifacts = generated.artifacts()?;
    let format = config.output.format;

    let written = match &config.output.dir {
        Some(dir) => {
            let mut sink = DirectorySink::new(dir)
                .with_context(|| format!("creating output directory {}", dir.display()))?;
            write_artifacts(&mut sink, &artifacts, format)?
        }
        None => {
            let mut sink = StreamSink::new(std::io::stdout().lock());
            write_artifacts(&mut sink, &artifacts, format)?
        }
    };
    tracing::info!(artifacts = written, diagnostics = generated.diagnostics.len(), "generate finished");
    Ok(exit_code(global, &generated.diagnostics))
}

/// Run the pipeline and print diagnostics, one per line.
pub fn run_check(args: &PipelineArgs, global: &GlobalOptions) -> Result<u8> {
    let config = resolve_config(global, args)?;
    let generated = load_and_run(&config)?;
    let mut stdout = std::io::stdout().lock();
    print_diagnostics(&mut stdout, &generated.diagnostics)?;
    Ok(exit_code(global, &generated.diagnostics))
}

/// Write diagnostics followed by a summary line.
pub fn print_diagnostics(out: &mut dyn Write, diagnostics: &Diagnostics) -> Result<()> {
    for diag in diagnostics {
        writeln!(out, "{diag}")?;
    }
    match diagnostics.len() {
        0 => writeln!(out, "no diagnostics")?,
        1 => writeln!(out, "1 diagnostic")?,
        n => writeln!(out, "{n} diagnostics")?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use markgen_core::{Diagnostic, Location};

    // ── Configuration ────────────────────────────────────────────────

    #[test]
    fn test_missing_config_means_defaults() {
        let global = GlobalOptions {
            config: Some(PathBuf::from("/nonexistent/markgen.yaml")),
            strict: false,
        };
        let config = resolve_config(&global, &PipelineArgs::default()).unwrap();
        assert_eq!(config, GeneratorConfig::default());
    }

    #[test]
    fn test_flags_override_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("markgen.yaml");
        std::fs::write(&path, "inputs: [a.yaml]\noutput: { format: yaml }\n").unwrap();
        let global = GlobalOptions {
            config: Some(path),
            strict: false,
        };
        let args = PipelineArgs {
            inputs: vec![PathBuf::from("b.json")],
            format: Some(OutputFormat::Json),
            ..PipelineArgs::default()
        };
        let config = resolve_config(&global, &args).unwrap();
        assert_eq!(config.inputs, [PathBuf::from("b.json")]);
        assert_eq!(config.output.format, OutputFormat::Json);
    }

    // ── Exit codes ───────────────────────────────────────────────────

    #[test]
    fn test_strict_exit_code() {
        let mut diags = Diagnostics::new();
        let lenient = GlobalOptions::default();
        let strict = GlobalOptions {
            strict: true,
            ..GlobalOptions::default()
        };
        assert_eq!(exit_code(&strict, &diags), 0);
        diags.push(Diagnostic::semantic(Location::package("p"), "bad"));
        assert_eq!(exit_code(&lenient, &diags), 0);
        assert_eq!(exit_code(&strict, &diags), EXIT_DIAGNOSTICS);
    }

    #[test]
    fn test_print_diagnostics() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::semantic(Location::package("p"), "bad"));
        let mut out = Vec::new();
        print_diagnostics(&mut out, &diags).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("semantic error at"));
        assert!(text.ends_with("1 diagnostic\n"));
    }
}
