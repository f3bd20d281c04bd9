//! Implementation of the `stitch resolve` command.
//!
//! Prints each module's classpaths in resolution order, followed by the
//! aggregate build's classpaths.

use std::path::Path;

use anyhow::{Context, Result, bail};

use stitch_lib::cancel::CancelToken;
use stitch_lib::resolve::{AGGREGATE, ClasspathEntry, ClasspathKind, ModuleClasspaths};

use crate::output::{OutputFormat, print_entry, print_heading, print_json};

const KINDS: [ClasspathKind; 5] = [
  ClasspathKind::Compile,
  ClasspathKind::Runtime,
  ClasspathKind::Exported,
  ClasspathKind::TestCompile,
  ClasspathKind::TestRuntime,
];

pub fn cmd_resolve(config: &Path, module: Option<&str>, verbose: bool, format: OutputFormat) -> Result<()> {
  let project = super::load_project(config)?;
  let resolution = project
    .resolver(CancelToken::new())
    .resolve(&project.modules)
    .context("Resolution failed")?;

  if let Some(name) = module {
    let Some(classpaths) = resolution.get(name) else {
      bail!("Unknown module '{}'", name);
    };
    if format.is_json() {
      return print_json(classpaths);
    }
    print_module(name, classpaths, verbose);
    return Ok(());
  }

  if format.is_json() {
    return print_json(&resolution);
  }

  for (name, classpaths) in resolution.iter() {
    print_module(name, classpaths, verbose);
    println!();
  }
  print_module(AGGREGATE, &resolution.aggregate, verbose);

  Ok(())
}

fn print_module(name: &str, classpaths: &ModuleClasspaths, verbose: bool) {
  print_heading(name);
  for kind in KINDS {
    let entries = classpaths.get(kind);
    if entries.is_empty() {
      continue;
    }
    println!("  {}:", kind);
    for entry in entries {
      print_entry(&describe(entry, verbose));
    }
  }
}

fn describe(entry: &ClasspathEntry, verbose: bool) -> String {
  if verbose {
    format!("{} via {}", entry.edge, entry.declared_by)
  } else {
    entry.edge.target.to_string()
  }
}
