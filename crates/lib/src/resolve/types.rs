//! Types for module graph resolution.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::module::{DependencyEdge, ModuleError};
use crate::repository::CatalogError;

/// Owner name used for classpaths of the aggregate build.
pub const AGGREGATE: &str = "<aggregate>";

/// Which classpath of a module an entry or conflict belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ClasspathKind {
  Compile,
  Runtime,
  Exported,
  TestCompile,
  TestRuntime,
}

impl fmt::Display for ClasspathKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ClasspathKind::Compile => "compile",
      ClasspathKind::Runtime => "runtime",
      ClasspathKind::Exported => "exported",
      ClasspathKind::TestCompile => "test-compile",
      ClasspathKind::TestRuntime => "test-runtime",
    };
    f.write_str(s)
  }
}

/// How to settle a `group:artifact` reachable with several versions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPolicy {
  /// Any disagreement is a fatal `VersionConflict`.
  #[default]
  Fail,
  /// The highest version satisfying every constraint wins.
  Highest,
  /// The version declared last in classpath order wins.
  LastDeclared,
}

impl fmt::Display for ConflictPolicy {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let s = match self {
      ConflictPolicy::Fail => "fail",
      ConflictPolicy::Highest => "highest",
      ConflictPolicy::LastDeclared => "last-declared",
    };
    f.write_str(s)
  }
}

/// One entry on a computed classpath.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClasspathEntry {
  /// The edge, with its version replaced by the selected one after conflict resolution.
  pub edge: DependencyEdge,
  /// Module that declared the edge (or [`AGGREGATE`]).
  pub declared_by: String,
}

impl fmt::Display for ClasspathEntry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} via {}", self.edge, self.declared_by)
  }
}

/// The computed classpaths of one module.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModuleClasspaths {
  pub compile: Vec<ClasspathEntry>,
  pub runtime: Vec<ClasspathEntry>,
  pub exported: Vec<ClasspathEntry>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub test_compile: Vec<ClasspathEntry>,
  #[serde(default, skip_serializing_if = "Vec::is_empty")]
  pub test_runtime: Vec<ClasspathEntry>,
}

impl ModuleClasspaths {
  pub fn get(&self, kind: ClasspathKind) -> &[ClasspathEntry] {
    match kind {
      ClasspathKind::Compile => &self.compile,
      ClasspathKind::Runtime => &self.runtime,
      ClasspathKind::Exported => &self.exported,
      ClasspathKind::TestCompile => &self.test_compile,
      ClasspathKind::TestRuntime => &self.test_runtime,
    }
  }
}

/// A version conflict settled by the configured policy.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConflictResolution {
  /// `group:artifact` of the contested library.
  pub coordinate: String,
  /// Module whose classpath contained the conflict.
  pub module: String,
  pub classpath: ClasspathKind,
  /// Distinct requested versions, in classpath order.
  pub requested: Vec<String>,
  pub selected: String,
}

/// Result of resolving a module set.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Resolution {
  /// Module names in declaration order.
  pub order: Vec<String>,
  pub modules: BTreeMap<String, ModuleClasspaths>,
  /// Classpaths of the aggregate build (no test classpaths).
  pub aggregate: ModuleClasspaths,
  /// Conflicts settled by policy, sorted by coordinate then module.
  pub audit: Vec<ConflictResolution>,
}

impl Resolution {
  pub fn get(&self, module: &str) -> Option<&ModuleClasspaths> {
    self.modules.get(module)
  }

  /// Modules and their classpaths in declaration order.
  pub fn iter(&self) -> impl Iterator<Item = (&str, &ModuleClasspaths)> {
    self
      .order
      .iter()
      .filter_map(|name| self.modules.get(name).map(|cp| (name.as_str(), cp)))
  }
}

/// Errors that can occur while resolving a module set.
#[derive(Debug, Error)]
pub enum ResolveError {
  /// Inter-module dependencies form a cycle.
  #[error("cyclic module dependency: {}", .cycle.join(" -> "))]
  CyclicModuleDependency { cycle: Vec<String> },

  /// A coordinate or module reference could not be resolved.
  #[error("module '{module}': unresolved dependency {coordinate} (edge {edge})")]
  UnresolvedDependency {
    module: String,
    edge: String,
    coordinate: String,
  },

  /// Several versions of one library meet on a classpath and no policy settles them.
  #[error(
    "module '{module}' ({classpath} classpath): version conflict for {coordinate}: {} (edge {edge})",
    .versions.join(", ")
  )]
  VersionConflict {
    module: String,
    classpath: ClasspathKind,
    coordinate: String,
    versions: Vec<String>,
    edge: String,
  },

  /// Querying the catalog failed while pinning an edge.
  #[error("module '{module}': catalog lookup failed (edge {edge}): {source}")]
  Catalog {
    module: String,
    edge: String,
    #[source]
    source: CatalogError,
  },

  /// The pinned module set failed validation.
  #[error(transparent)]
  Module(#[from] ModuleError),

  /// The caller cancelled resolution.
  #[error("resolution cancelled")]
  Cancelled,
}
