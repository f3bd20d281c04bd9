//! On-disk shape of `stitch.toml`.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::module::Scope;
use crate::publish::PublicationMetadata;
use crate::resolve::ConflictPolicy;

/// The whole configuration file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
  pub project: ProjectSection,

  #[serde(default)]
  pub modules: Vec<ModuleSection>,

  #[serde(default)]
  pub assembly: AssemblySection,

  #[serde(default)]
  pub resolution: ResolutionSection,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub repository: Option<RepositorySection>,

  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub publish: Option<PublicationMetadata>,
}

/// `[project]`: build identity and dependencies of the aggregate build.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProjectSection {
  pub group: String,
  pub name: String,
  pub version: String,
  #[serde(default)]
  pub dependencies: Vec<DependencySpec>,
}

/// One `[[modules]]` entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleSection {
  pub name: String,
  #[serde(default)]
  pub aggregated: bool,
  /// Output directories, relative to the configuration file.
  #[serde(default)]
  pub outputs: Vec<PathBuf>,
  #[serde(default)]
  pub dependencies: Vec<DependencySpec>,
}

/// A dependency declaration. Exactly one of `coordinate` and `module` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DependencySpec {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub coordinate: Option<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub module: Option<String>,
  pub scope: Scope,
  #[serde(default)]
  pub exported: bool,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constraint: Option<String>,
}

/// `[assembly]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AssemblySection {
  /// Merge order of aggregated modules (default: declaration order).
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub order: Option<Vec<String>>,
  #[serde(default)]
  pub exclusions: Vec<String>,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub destination: Option<PathBuf>,
}

/// `[resolution]`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResolutionSection {
  #[serde(default)]
  pub conflict: ConflictPolicy,
}

/// `[repository]`: either a local Maven repository or an inline catalog.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RepositorySection {
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub path: Option<PathBuf>,
  #[serde(default)]
  pub catalog: Vec<String>,
}
