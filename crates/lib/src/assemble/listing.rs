//! Listing a module's compiled output.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::module::Module;

use super::types::AssembleError;

/// List every file under the module's output directories.
///
/// Keys are `/`-separated paths relative to their output directory. When two
/// output directories of the same module hold the same path, the later
/// directory wins. Missing output directories contribute nothing.
pub fn list_outputs(module: &Module) -> Result<BTreeMap<String, PathBuf>, AssembleError> {
  let mut files = BTreeMap::new();

  for root in &module.outputs {
    if !root.is_dir() {
      debug!(module = %module.name, path = %root.display(), "output directory missing, skipping");
      continue;
    }

    for entry in WalkDir::new(root).follow_links(true).sort_by_file_name() {
      let entry = entry.map_err(|e| AssembleError::Listing {
        module: module.name.clone(),
        path: root.clone(),
        source: e,
      })?;
      if !entry.file_type().is_file() {
        continue;
      }

      let Some(relative) = relative_path(root, entry.path()) else {
        continue;
      };
      trace!(module = %module.name, path = %relative, "listed output");
      files.insert(relative, entry.into_path());
    }
  }

  Ok(files)
}

fn relative_path(root: &Path, path: &Path) -> Option<String> {
  let rel = path.strip_prefix(root).ok()?;
  let parts: Vec<String> = rel
    .components()
    .filter_map(|c| match c {
      Component::Normal(part) => Some(part.to_string_lossy().into_owned()),
      _ => None,
    })
    .collect();

  if parts.is_empty() { None } else { Some(parts.join("/")) }
}
