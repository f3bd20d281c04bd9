//! Publication descriptor types.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct License {
  pub name: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Developer {
  pub id: String,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub email: Option<String>,
}

/// Source control location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scm {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub connection: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub developer_connection: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
}

/// Descriptive metadata that does not come from the module graph.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationMetadata {
  /// Overrides the project name as artifact id.
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub artifact_id: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub name: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub description: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub url: Option<String>,
  #[serde(default)]
  pub licenses: Vec<License>,
  #[serde(default)]
  pub developers: Vec<Developer>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub scm: Option<Scm>,
  /// Rendered as the POM's `<properties>`, sorted by name.
  #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
  pub properties: BTreeMap<String, String>,
}

/// Scope a dependency is published with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PublishedScope {
  /// Part of the artifact's API.
  Compile,
  /// Needed at run time only.
  Runtime,
}

impl fmt::Display for PublishedScope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      PublishedScope::Compile => f.write_str("compile"),
      PublishedScope::Runtime => f.write_str("runtime"),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedDependency {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  pub scope: PublishedScope,
}

/// Everything needed to describe the artifact to a repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicationDescriptor {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  #[serde(flatten)]
  pub metadata: PublicationMetadata,
  pub dependencies: Vec<PublishedDependency>,
}

impl PublicationDescriptor {
  /// Base name of the published files, e.g. `basics-0.1.1`.
  pub fn base_name(&self) -> String {
    format!("{}-{}", self.artifact_id, self.version)
  }
}

/// Paths of the files written for a publication.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublishedFiles {
  pub pom: PathBuf,
  pub descriptor: PathBuf,
}

/// Errors that can occur while producing a publication.
#[derive(Debug, Error)]
pub enum PublishError {
  /// Rendering the POM failed.
  #[error("failed to render POM: {0}")]
  Xml(String),

  /// Serializing the JSON descriptor failed.
  #[error("failed to serialize descriptor: {0}")]
  Serialize(#[from] serde_json::Error),

  /// Writing an output file failed.
  #[error("failed to write {path}: {source}")]
  Write {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },
}
