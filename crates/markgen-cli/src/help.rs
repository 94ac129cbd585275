//! `markgen markers`: print the marker catalog grouped by category.

use std::io::Write;

use anyhow::{bail, Context, Result};
use clap::Args;
use markgen_markers::{HelpEntry, Registry};

use crate::generate::registry;

#[derive(Args, Debug, Clone, Default)]
pub struct MarkersArgs {
    /// Only show this category (e.g. `validation`, `rbac`).
    pub category: Option<String>,

    /// Include long descriptions.
    #[arg(long)]
    pub details: bool,
}

pub fn run_markers(args: &MarkersArgs) -> Result<u8> {
    let registry = registry().context("composing marker registry")?;
    let mut stdout = std::io::stdout().lock();
    print_help(&mut stdout, &registry, args)?;
    Ok(0)
}

/// Write help for every category, or only the requested one.
pub fn print_help(out: &mut dyn Write, registry: &Registry, args: &MarkersArgs) -> Result<()> {
    let mut help = registry.help();
    if let Some(category) = &args.category {
        let Some(entries) = help.remove(category) else {
            let known: Vec<&String> = help.keys().collect();
            bail!("unknown marker category '{category}' (known: {known:?})");
        };
        help.clear();
        help.insert(category.clone(), entries);
    }

    for (i, (category, entries)) in help.iter().enumerate() {
        if i > 0 {
            writeln!(out)?;
        }
        writeln!(out, "{category}")?;
        for entry in entries {
            write_entry(out, entry, args.details)?;
        }
    }
    Ok(())
}

fn write_entry(out: &mut dyn Write, entry: &HelpEntry, details: bool) -> Result<()> {
    writeln!(out, "  +{} ({}): {}", entry.name, entry.applicability, entry.summary)?;
    for arg in &entry.args {
        writeln!(out, "      {arg}")?;
    }
    if details && !entry.details.is_empty() {
        writeln!(out, "      {}", entry.details)?;
    }
    Ok(())
}
