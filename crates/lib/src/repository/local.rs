//! Local Maven-layout repository.
//!
//! # Layout
//!
//! ```text
//! {root}/
//! └── com/google/guava/       # group, dots become directories
//!     └── guava/              # artifact
//!         ├── 33.1.0-jre/     # one directory per version
//!         └── 33.2.0-jre/
//! ```

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::trace;

use crate::coord::Version;

use super::{Catalog, CatalogError};

/// A catalog backed by a local repository directory such as `~/.m2/repository`.
#[derive(Debug, Clone)]
pub struct LocalRepository {
  root: PathBuf,
}

impl LocalRepository {
  pub fn new(root: impl Into<PathBuf>) -> Self {
    Self { root: root.into() }
  }

  pub fn root(&self) -> &Path {
    &self.root
  }

  /// Directory holding the versions of `group:artifact`.
  fn artifact_dir(&self, group: &str, artifact: &str) -> PathBuf {
    let mut dir = self.root.clone();
    for part in group.split('.') {
      dir.push(part);
    }
    dir.push(artifact);
    dir
  }
}

impl Catalog for LocalRepository {
  fn versions(&self, group: &str, artifact: &str) -> Result<Vec<Version>, CatalogError> {
    let dir = self.artifact_dir(group, artifact);
    let read_err = |source: io::Error| CatalogError::Read {
      path: dir.display().to_string(),
      source,
    };

    let entries = match fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
      Err(e) => return Err(read_err(e)),
    };

    let mut versions = Vec::new();
    for entry in entries {
      let entry = entry.map_err(read_err)?;
      if !entry.file_type().map_err(read_err)?.is_dir() {
        continue;
      }
      let name = entry.file_name().to_string_lossy().to_string();
      if let Ok(version) = Version::parse(&name) {
        versions.push(version);
      }
    }
    versions.sort();

    trace!(group, artifact, count = versions.len(), "listed local versions");
    Ok(versions)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::tempdir;

  #[test]
  fn lists_version_directories() {
    let temp = tempdir().unwrap();
    let base = temp.path().join("com/google/guava/guava");
    fs::create_dir_all(base.join("33.2.0-jre")).unwrap();
    fs::create_dir_all(base.join("33.1.0-jre")).unwrap();
    fs::write(base.join("maven-metadata-local.xml"), "<metadata/>").unwrap();

    let repo = LocalRepository::new(temp.path());
    let versions = repo.versions("com.google.guava", "guava").unwrap();
    let names: Vec<_> = versions.iter().map(Version::as_str).collect();

    assert_eq!(names, vec!["33.1.0-jre", "33.2.0-jre"]);
  }

  #[test]
  fn missing_artifact_is_empty() {
    let temp = tempdir().unwrap();
    let repo = LocalRepository::new(temp.path());
    assert!(repo.versions("org.example", "nothing").unwrap().is_empty());
  }

  #[test]
  fn contains_uses_version_equality() {
    let temp = tempdir().unwrap();
    fs::create_dir_all(temp.path().join("io/netty/netty-all/4.1.110.Final")).unwrap();

    let repo = LocalRepository::new(temp.path());
    let wanted = Version::parse("4.1.110.Final").unwrap();
    assert!(repo.contains("io.netty", "netty-all", &wanted).unwrap());
  }
}
