//! Implementation of the `stitch assemble` command.
//!
//! Resolves the module graph, merges the aggregated outputs and writes the
//! jar. Ctrl-C trips the cancel token; the library then stops at the next
//! module boundary and removes any partially written jar.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::warn;

use stitch_lib::assemble::{Artifact, write_jar};
use stitch_lib::cancel::CancelToken;
use stitch_lib::config::Project;

use crate::output::{
  OutputFormat, format_elapsed, format_size, print_collision, print_json, print_stat, print_success, short_hash,
};

pub fn cmd_assemble(config: &Path, out: Option<&Path>, format: OutputFormat) -> Result<()> {
  let started = Instant::now();
  let project = super::load_project(config)?;
  let dest = out.map(Path::to_path_buf).unwrap_or_else(|| project.destination.clone());

  let cancel = CancelToken::new();
  let rt = tokio::runtime::Runtime::new().context("Failed to create async runtime")?;
  let watcher = cancel.clone();
  let (artifact, path) = rt
    .block_on(async move {
      tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
          warn!("interrupted, cancelling");
          watcher.cancel();
        }
      });
      tokio::task::spawn_blocking(move || build(&project, &dest, cancel)).await
    })
    .context("Assembly task failed")??;

  let size = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);

  if format.is_json() {
    let json = serde_json::json!({
      "path": path,
      "id": artifact.id,
      "content_hash": artifact.content_hash,
      "entries": artifact.entries.len(),
      "excluded": artifact.excluded,
      "size_bytes": size,
      "modules": artifact.manifest.modules,
      "collisions": artifact.collisions,
    });
    return print_json(&json);
  }

  artifact.collisions.iter().for_each(print_collision);

  print_success(&format!("Wrote {}", path.display()));
  print_stat("Id", short_hash(&artifact.id.0));
  print_stat("Modules", &artifact.manifest.modules.len().to_string());
  print_stat("Entries", &artifact.entries.len().to_string());
  print_stat("Excluded", &artifact.excluded.to_string());
  print_stat("Size", &format_size(size));
  print_stat("Time", &format_elapsed(started.elapsed()));

  Ok(())
}

fn build(project: &Project, dest: &Path, cancel: CancelToken) -> Result<(Artifact, PathBuf)> {
  project
    .resolver(cancel.clone())
    .resolve(&project.modules)
    .context("Resolution failed")?;

  let artifact = project
    .assembler(cancel.clone())
    .assemble_set(&project.modules)
    .context("Assembly failed")?;
  let path = write_jar(&artifact, dest, &cancel).context("Failed to write jar")?;

  Ok((artifact, path))
}
