//! Types for artifact assembly.

use std::collections::BTreeMap;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::util::hash::{ContentHash, FileHashError, Hashable, ObjectHash};

/// Identity of the build that produced an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuildIdentity {
  pub group: String,
  pub artifact: String,
  pub version: String,
}

impl BuildIdentity {
  pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      group: group.into(),
      artifact: artifact.into(),
      version: version.into(),
    }
  }

  /// File name of the jar, e.g. `basics-0.1.1.jar`.
  pub fn jar_name(&self) -> String {
    format!("{}-{}.jar", self.artifact, self.version)
  }
}

/// Content hash of one module's contribution to the artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleDigest {
  pub name: String,
  /// Hash over the module's kept files (after exclusions).
  pub hash: ContentHash,
  pub files: usize,
}

/// The manifest embedded in every artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactManifest {
  pub manifest_version: u32,
  pub identity: BuildIdentity,
  /// Merged modules in merge order.
  pub modules: Vec<ModuleDigest>,
  pub exclusions: Vec<String>,
  pub created_by: String,
}

impl Hashable for ArtifactManifest {}

/// One file of the assembled artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ArtifactEntry {
  /// Module whose output provided the file.
  pub module: String,
  /// Location of the file on disk.
  pub source: PathBuf,
  pub hash: ContentHash,
}

/// Two modules produced the same path; the later one won.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCollision {
  pub path: String,
  pub previous: String,
  pub winner: String,
}

/// An assembled artifact, ready to be written.
///
/// Immutable once returned by the assembler.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Artifact {
  pub manifest: ArtifactManifest,
  /// Files keyed by their path inside the artifact, sorted.
  pub entries: BTreeMap<String, ArtifactEntry>,
  pub collisions: Vec<OutputCollision>,
  /// Number of files dropped by exclusion filters.
  pub excluded: usize,
  /// Hash of the serialized manifest.
  pub id: ObjectHash,
  /// Hash over every entry's path and content.
  pub content_hash: ContentHash,
}

impl Artifact {
  pub fn paths(&self) -> impl Iterator<Item = &str> {
    self.entries.keys().map(String::as_str)
  }

  pub fn get(&self, path: &str) -> Option<&ArtifactEntry> {
    self.entries.get(path)
  }

  pub fn file_name(&self) -> String {
    self.manifest.identity.jar_name()
  }
}

/// Errors that can occur during assembly.
#[derive(Debug, Error)]
pub enum AssembleError {
  /// An exclusion glob could not be compiled.
  #[error("invalid exclusion pattern '{pattern}': {reason}")]
  ExclusionPatternInvalid { pattern: String, reason: String },

  /// Walking a module's output directory failed.
  #[error("module '{module}': failed to list outputs in {path}: {source}")]
  Listing {
    module: String,
    path: PathBuf,
    #[source]
    source: walkdir::Error,
  },

  /// Hashing an output file failed.
  #[error(transparent)]
  Hash(#[from] FileHashError),

  /// Reading an output or writing the artifact failed.
  #[error("I/O error at {path}: {source}")]
  Io {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  /// The zip writer rejected an entry.
  #[error("failed to write jar: {0}")]
  Zip(#[from] zip::result::ZipError),

  /// Serializing the manifest failed.
  #[error("failed to serialize manifest: {0}")]
  Manifest(#[from] serde_json::Error),

  /// The caller cancelled assembly.
  #[error("assembly cancelled")]
  Cancelled,
}
