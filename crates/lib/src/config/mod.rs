//! Loading `stitch.toml` into a validated [`Project`].
//!
//! Relative paths in the file resolve against the file's directory. A
//! leading `~` in the repository path expands to the home directory.

mod types;

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, info};

use crate::assemble::{AssembleError, Assembler, BuildIdentity, ExclusionSet};
use crate::cancel::CancelToken;
use crate::consts::DEFAULT_DESTINATION;
use crate::coord::{Coordinate, CoordinateError, VersionConstraint, VersionError};
use crate::module::{DependencyEdge, DependencyTarget, Module, ModuleError, ModuleSet};
use crate::publish::PublicationMetadata;
use crate::repository::{Catalog, LocalRepository, StaticCatalog};
use crate::resolve::{AGGREGATE, ConflictPolicy, Resolver};

pub use types::{
  AssemblySection, ConfigFile, DependencySpec, ModuleSection, ProjectSection, RepositorySection, ResolutionSection,
};

/// Errors that can occur while loading a configuration file.
#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read {path}: {source}")]
  Read {
    path: PathBuf,
    #[source]
    source: std::io::Error,
  },

  #[error("failed to parse {path}: {source}")]
  Parse {
    path: PathBuf,
    #[source]
    source: toml::de::Error,
  },

  #[error("module '{module}': {source}")]
  Coordinate {
    module: String,
    #[source]
    source: CoordinateError,
  },

  #[error("module '{module}': invalid constraint: {source}")]
  Constraint {
    module: String,
    #[source]
    source: VersionError,
  },

  /// A dependency sets both or neither of `coordinate` and `module`.
  #[error("module '{module}': dependency must set exactly one of `coordinate` or `module`")]
  AmbiguousDependency { module: String },

  #[error("[repository] sets both `path` and `catalog`; choose one")]
  AmbiguousRepository,

  #[error(transparent)]
  Module(#[from] ModuleError),

  #[error(transparent)]
  Exclusion(#[from] AssembleError),
}

/// A loaded project: everything one invocation needs.
#[derive(Clone)]
pub struct Project {
  /// Directory containing the configuration file.
  pub root: PathBuf,
  pub identity: BuildIdentity,
  pub modules: ModuleSet,
  pub exclusions: ExclusionSet,
  pub policy: ConflictPolicy,
  pub catalog: Option<Arc<dyn Catalog>>,
  /// Where assembled jars go.
  pub destination: PathBuf,
  pub publication: PublicationMetadata,
}

impl Project {
  /// A resolver configured with the project's policy and catalog.
  pub fn resolver(&self, cancel: CancelToken) -> Resolver {
    let resolver = Resolver::new().with_policy(self.policy).with_cancel(cancel);
    match &self.catalog {
      Some(catalog) => resolver.with_catalog(Arc::clone(catalog)),
      None => resolver,
    }
  }

  /// An assembler configured with the project's identity and exclusions.
  pub fn assembler(&self, cancel: CancelToken) -> Assembler {
    Assembler::new(self.identity.clone())
      .with_exclusions(self.exclusions.clone())
      .with_cancel(cancel)
  }
}

/// Load and validate a configuration file.
pub fn load(path: &Path) -> Result<Project, ConfigError> {
  let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
    path: path.to_path_buf(),
    source: e,
  })?;
  let file: ConfigFile = toml::from_str(&content).map_err(|e| ConfigError::Parse {
    path: path.to_path_buf(),
    source: e,
  })?;

  let parent = match path.parent() {
    Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
    _ => PathBuf::from("."),
  };
  let root = dunce::canonicalize(&parent).map_err(|e| ConfigError::Read { path: parent, source: e })?;
  debug!(path = %path.display(), root = %root.display(), "loaded configuration");

  from_config(file, &root)
}

/// Build a project from a parsed configuration, resolving paths against `root`.
pub fn from_config(file: ConfigFile, root: &Path) -> Result<Project, ConfigError> {
  let mut modules = Vec::with_capacity(file.modules.len());
  for section in file.modules {
    let edges = section
      .dependencies
      .iter()
      .map(|spec| to_edge(&section.name, spec))
      .collect::<Result<Vec<_>, _>>()?;
    modules.push(Module {
      name: section.name,
      edges,
      aggregated: section.aggregated,
      outputs: section.outputs.iter().map(|p| root.join(p)).collect(),
    });
  }

  let project_edges = file
    .project
    .dependencies
    .iter()
    .map(|spec| to_edge(AGGREGATE, spec))
    .collect::<Result<Vec<_>, _>>()?;

  let mut set = ModuleSet::new(modules)?.with_project_edges(project_edges)?;
  if let Some(order) = file.assembly.order {
    set = set.with_aggregate_order(order)?;
  }

  let exclusions = ExclusionSet::new(&file.assembly.exclusions)?;
  let catalog = match file.repository {
    Some(repo) => catalog_from(repo, root)?,
    None => None,
  };
  let destination = root.join(file.assembly.destination.unwrap_or_else(|| PathBuf::from(DEFAULT_DESTINATION)));

  info!(
    project = %file.project.name,
    modules = set.len(),
    aggregated = set.aggregate_order().len(),
    "project configured"
  );

  Ok(Project {
    root: root.to_path_buf(),
    identity: BuildIdentity::new(file.project.group, file.project.name, file.project.version),
    modules: set,
    exclusions,
    policy: file.resolution.conflict,
    catalog,
    destination,
    publication: file.publish.unwrap_or_default(),
  })
}

fn to_edge(owner: &str, spec: &DependencySpec) -> Result<DependencyEdge, ConfigError> {
  let target = match (&spec.coordinate, &spec.module) {
    (Some(coordinate), None) => {
      DependencyTarget::External(Coordinate::parse(coordinate).map_err(|source| ConfigError::Coordinate {
        module: owner.to_string(),
        source,
      })?)
    }
    (None, Some(module)) => DependencyTarget::Module(module.clone()),
    _ => {
      return Err(ConfigError::AmbiguousDependency {
        module: owner.to_string(),
      });
    }
  };

  let constraint = spec
    .constraint
    .as_deref()
    .map(VersionConstraint::parse)
    .transpose()
    .map_err(|source| ConfigError::Constraint {
      module: owner.to_string(),
      source,
    })?;

  Ok(DependencyEdge {
    target,
    scope: spec.scope,
    constraint,
    exported: spec.exported,
  })
}

fn catalog_from(repo: RepositorySection, root: &Path) -> Result<Option<Arc<dyn Catalog>>, ConfigError> {
  match (repo.path, repo.catalog.is_empty()) {
    (Some(_), false) => Err(ConfigError::AmbiguousRepository),
    (Some(path), true) => {
      let path = root.join(expand_home(&path));
      debug!(path = %path.display(), "using local repository");
      let catalog: Arc<dyn Catalog> = Arc::new(LocalRepository::new(path));
      Ok(Some(catalog))
    }
    (None, false) => {
      let coordinates = repo
        .catalog
        .iter()
        .map(|c| Coordinate::parse(c))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|source| ConfigError::Coordinate {
          module: "[repository]".to_string(),
          source,
        })?;
      let catalog: StaticCatalog = coordinates.into_iter().collect();
      debug!(entries = catalog.len(), "using inline catalog");
      let catalog: Arc<dyn Catalog> = Arc::new(catalog);
      Ok(Some(catalog))
    }
    (None, true) => Ok(None),
  }
}

fn expand_home(path: &Path) -> PathBuf {
  if let Ok(rest) = path.strip_prefix("~")
    && let Some(home) = std::env::var_os("HOME")
  {
    return PathBuf::from(home).join(rest);
  }
  path.to_path_buf()
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::module::Scope;
  use tempfile::tempdir;

  const BASICS: &str = r#"
[project]
group = "io.spbx"
name = "basics"
version = "0.1.1"
dependencies = [{ coordinate = "org.slf4j:slf4j-api:2.0.13", scope = "runtime-only" }]

[[modules]]
name = "shared"
aggregated = true
outputs = ["build/classes/shared"]
dependencies = [
  { coordinate = "org.jetbrains:annotations:24.1.0", scope = "compile-only" },
  { coordinate = "com.google.guava:guava:33.2.0-jre", scope = "implementation", exported = true },
]

[[modules]]
name = "main"
aggregated = true
outputs = ["build/classes/main"]
dependencies = [
  { module = "shared", scope = "implementation" },
  { coordinate = "com.google.guava:guava", scope = "test-only", constraint = "[33.0,34.0)" },
]

[assembly]
order = ["main", "shared"]
exclusions = ["**/templates**"]

[resolution]
conflict = "highest"

[repository]
catalog = [
  "com.google.guava:guava:33.1.0-jre",
  "com.google.guava:guava:33.2.0-jre",
  "org.jetbrains:annotations:24.1.0",
  "org.slf4j:slf4j-api:2.0.13",
]

[publish]
name = "Basics"
licenses = [{ name = "Apache-2.0" }]
"#;

  fn parse(content: &str, root: &Path) -> Result<Project, ConfigError> {
    from_config(toml::from_str(content).unwrap(), root)
  }

  #[test]
  fn loads_full_configuration() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("stitch.toml");
    fs::write(&path, BASICS).unwrap();

    let project = load(&path).unwrap();
    let root = dunce::canonicalize(temp.path()).unwrap();

    assert_eq!(project.identity, BuildIdentity::new("io.spbx", "basics", "0.1.1"));
    assert_eq!(project.modules.len(), 2);
    assert_eq!(project.modules.aggregate_order(), ["main".to_string(), "shared".to_string()]);
    assert_eq!(project.modules.project_edges().len(), 1);
    assert_eq!(project.policy, ConflictPolicy::Highest);
    assert_eq!(project.destination, root.join("build/libs"));
    assert_eq!(project.publication.name.as_deref(), Some("Basics"));
    assert!(project.catalog.is_some());
    assert!(project.exclusions.is_excluded("a/templates/x"));

    let shared = project.modules.get("shared").unwrap();
    assert_eq!(shared.outputs, vec![root.join("build/classes/shared")]);
    assert!(shared.edges[1].exported);

    let main = project.modules.get("main").unwrap();
    assert_eq!(main.edges[1].scope, Scope::TestOnly);
    assert!(main.edges[1].constraint.is_some());
  }

  #[test]
  fn loaded_project_resolves() {
    let temp = tempdir().unwrap();
    let project = parse(BASICS, temp.path()).unwrap();

    let resolution = project.resolver(CancelToken::new()).resolve(&project.modules).unwrap();
    let main = resolution.get("main").unwrap();
    let test_compile: Vec<_> = main.test_compile.iter().map(|e| e.edge.target.to_string()).collect();
    assert!(test_compile.contains(&"com.google.guava:guava:33.2.0-jre".to_string()));
  }

  #[test]
  fn local_repository_pins_unversioned_edges() {
    let temp = tempdir().unwrap();
    let guava = temp.path().join("m2/com/google/guava/guava");
    for version in ["33.1.0-jre", "33.2.0-jre", "35.0.0-jre"] {
      fs::create_dir_all(guava.join(version)).unwrap();
    }
    let path = temp.path().join("stitch.toml");
    fs::write(
      &path,
      r#"
[project]
group = "g"
name = "n"
version = "1"

[[modules]]
name = "main"
dependencies = [{ coordinate = "com.google.guava:guava", scope = "implementation", constraint = "[33.0,34.0)" }]

[repository]
path = "m2"
"#,
    )
    .unwrap();

    let project = load(&path).unwrap();
    assert!(project.catalog.is_some());

    let resolution = project.resolver(CancelToken::new()).resolve(&project.modules).unwrap();
    let runtime: Vec<_> = resolution
      .get("main")
      .unwrap()
      .runtime
      .iter()
      .map(|e| e.edge.target.to_string())
      .collect();
    assert_eq!(runtime, vec!["com.google.guava:guava:33.2.0-jre"]);
  }

  #[test]
  fn repository_path_and_catalog_conflict() {
    let temp = tempdir().unwrap();
    let err = parse(
      r#"
[project]
group = "g"
name = "n"
version = "1"

[repository]
path = "~/.m2/repository"
catalog = ["a:b:1"]
"#,
      temp.path(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, ConfigError::AmbiguousRepository));
  }

  #[test]
  fn home_prefix_expands() {
    assert_eq!(expand_home(Path::new("m2/repository")), PathBuf::from("m2/repository"));
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(
        expand_home(Path::new("~/.m2/repository")),
        PathBuf::from(home).join(".m2/repository")
      );
    }
  }

  #[test]
  fn missing_file_is_a_read_error() {
    let temp = tempdir().unwrap();
    let err = load(&temp.path().join("stitch.toml")).err().unwrap();
    assert!(matches!(err, ConfigError::Read { .. }));
  }

  #[test]
  fn unknown_scope_is_a_parse_error() {
    let temp = tempdir().unwrap();
    let path = temp.path().join("stitch.toml");
    fs::write(
      &path,
      r#"
[project]
group = "g"
name = "n"
version = "1"

[[modules]]
name = "main"
dependencies = [{ coordinate = "a:b:1", scope = "api" }]
"#,
    )
    .unwrap();

    assert!(matches!(load(&path).err().unwrap(), ConfigError::Parse { .. }));
  }

  #[test]
  fn dependency_needs_exactly_one_target() {
    let temp = tempdir().unwrap();
    let err = parse(
      r#"
[project]
group = "g"
name = "n"
version = "1"

[[modules]]
name = "main"
dependencies = [{ coordinate = "a:b:1", module = "other", scope = "implementation" }]
"#,
      temp.path(),
    )
    .err()
    .unwrap();

    assert!(matches!(err, ConfigError::AmbiguousDependency { module } if module == "main"));
  }

  #[test]
  fn invalid_exclusion_is_reported() {
    let temp = tempdir().unwrap();
    let err = parse(
      r#"
[project]
group = "g"
name = "n"
version = "1"

[assembly]
exclusions = ["[oops"]
"#,
      temp.path(),
    )
    .err()
    .unwrap();

    assert!(matches!(
      err,
      ConfigError::Exclusion(AssembleError::ExclusionPatternInvalid { .. })
    ));
  }

  #[test]
  fn home_is_expanded() {
    let expanded = expand_home(Path::new("~/.m2/repository"));
    if let Some(home) = std::env::var_os("HOME") {
      assert_eq!(expanded, PathBuf::from(home).join(".m2/repository"));
    }
  }
}
