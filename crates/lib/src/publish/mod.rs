//! Publication descriptors.
//!
//! A descriptor pairs the build identity with repository metadata and the
//! aggregate's external dependencies. Exported libraries are published with
//! `compile` scope and the rest of the aggregate runtime classpath with
//! `runtime` scope. Compile-only, test and module edges are never published.
//! Uploading is left to the caller.

mod pom;
mod types;

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use tracing::{info, warn};

use crate::assemble::BuildIdentity;
use crate::module::DependencyTarget;
use crate::resolve::{ClasspathEntry, Resolution};

pub use pom::render_pom;
pub use types::{
  Developer, License, PublicationDescriptor, PublicationMetadata, PublishError, PublishedDependency, PublishedFiles,
  PublishedScope, Scm,
};

impl PublicationDescriptor {
  /// Build a descriptor from a resolved module graph.
  pub fn from_resolution(identity: &BuildIdentity, metadata: PublicationMetadata, resolution: &Resolution) -> Self {
    let artifact_id = metadata.artifact_id.clone().unwrap_or_else(|| identity.artifact.clone());

    let mut seen = HashSet::new();
    let mut dependencies = Vec::new();
    let scoped = resolution
      .aggregate
      .exported
      .iter()
      .map(|e| (e, PublishedScope::Compile))
      .chain(resolution.aggregate.runtime.iter().map(|e| (e, PublishedScope::Runtime)));

    for (entry, scope) in scoped {
      if let Some(dep) = published(entry, scope)
        && seen.insert((dep.group_id.clone(), dep.artifact_id.clone()))
      {
        dependencies.push(dep);
      }
    }

    Self {
      group_id: identity.group.clone(),
      artifact_id,
      version: identity.version.clone(),
      metadata,
      dependencies,
    }
  }
}

fn published(entry: &ClasspathEntry, scope: PublishedScope) -> Option<PublishedDependency> {
  match &entry.edge.target {
    DependencyTarget::External(coordinate) => {
      let Some(version) = &coordinate.version else {
        warn!(coordinate = %coordinate, "dependency has no version, not published");
        return None;
      };
      Some(PublishedDependency {
        group_id: coordinate.group.clone(),
        artifact_id: coordinate.artifact.clone(),
        version: version.to_string(),
        scope,
      })
    }
    DependencyTarget::Module(name) => {
      warn!(module = %name, "module outside the artifact is not published as a dependency");
      None
    }
  }
}

/// Write `<artifact>-<version>.pom` and `<artifact>-<version>.json` into `dest_dir`.
pub fn write_publication(descriptor: &PublicationDescriptor, dest_dir: &Path) -> Result<PublishedFiles, PublishError> {
  fs::create_dir_all(dest_dir).map_err(|e| PublishError::Write {
    path: dest_dir.to_path_buf(),
    source: e,
  })?;

  let base = descriptor.base_name();
  let pom = dest_dir.join(format!("{}.pom", base));
  let json = dest_dir.join(format!("{}.json", base));

  write_atomic(&pom, render_pom(descriptor)?.as_bytes())?;
  write_atomic(&json, serde_json::to_string_pretty(descriptor)?.as_bytes())?;

  info!(pom = %pom.display(), dependencies = descriptor.dependencies.len(), "wrote publication");
  Ok(PublishedFiles { pom, descriptor: json })
}

fn write_atomic(path: &Path, content: &[u8]) -> Result<(), PublishError> {
  let write_err = |e| PublishError::Write {
    path: path.to_path_buf(),
    source: e,
  };
  let mut temp = path.as_os_str().to_owned();
  temp.push(".tmp");

  fs::write(&temp, content).map_err(write_err)?;
  fs::rename(&temp, path).map_err(write_err)
}
