//! Module set types.
//!
//! # Structure
//!
//! A [`ModuleSet`] holds:
//! - `modules`: every [`Module`] in declaration order
//! - `project_edges`: dependencies declared on the aggregate build itself
//! - `aggregate_order`: the order aggregated modules are merged in
//!
//! The set is built once per invocation and never mutated afterwards.
//! Duplicate edge declarations are collapsed on construction.

use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::coord::{Coordinate, VersionConstraint};

/// Visibility class of a dependency edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Scope {
  /// Visible at compile time only; absent at run time and from consumers.
  CompileOnly,
  /// Visible at compile and run time within the owning module.
  Implementation,
  /// Absent at compile time, present at run time.
  RuntimeOnly,
  /// Visible to the owning module's tests only.
  TestOnly,
  /// Part of the module's shared test helpers; visible to tests that consume them.
  TestFixture,
}

impl Scope {
  pub const ALL: [Scope; 5] = [
    Scope::CompileOnly,
    Scope::Implementation,
    Scope::RuntimeOnly,
    Scope::TestOnly,
    Scope::TestFixture,
  ];

  /// Whether edges of this scope feed the module's main (non-test) classpaths.
  pub fn is_main(self) -> bool {
    matches!(self, Scope::CompileOnly | Scope::Implementation | Scope::RuntimeOnly)
  }

  pub fn as_str(self) -> &'static str {
    match self {
      Scope::CompileOnly => "compile-only",
      Scope::Implementation => "implementation",
      Scope::RuntimeOnly => "runtime-only",
      Scope::TestOnly => "test-only",
      Scope::TestFixture => "test-fixture",
    }
  }
}

impl fmt::Display for Scope {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.as_str())
  }
}

/// What a dependency edge points at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DependencyTarget {
  /// A library from the artifact repository.
  External(Coordinate),
  /// The compiled output of another module in the same set.
  Module(String),
}

impl DependencyTarget {
  /// Identity of the target regardless of version.
  ///
  /// Classpaths hold at most one entry per key.
  pub fn key(&self) -> String {
    match self {
      DependencyTarget::External(c) => c.key(),
      DependencyTarget::Module(name) => format!(":{}", name),
    }
  }

  pub fn module_name(&self) -> Option<&str> {
    match self {
      DependencyTarget::Module(name) => Some(name),
      DependencyTarget::External(_) => None,
    }
  }

  pub fn coordinate(&self) -> Option<&Coordinate> {
    match self {
      DependencyTarget::External(c) => Some(c),
      DependencyTarget::Module(_) => None,
    }
  }
}

impl fmt::Display for DependencyTarget {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DependencyTarget::External(c) => write!(f, "{}", c),
      DependencyTarget::Module(name) => write!(f, ":{}", name),
    }
  }
}

/// A directed edge from a module (or the aggregate build) to a dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencyEdge {
  pub target: DependencyTarget,
  pub scope: Scope,
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub constraint: Option<VersionConstraint>,
  /// Visible to consumers of the owning module (API dependency).
  #[serde(default, skip_serializing_if = "std::ops::Not::not")]
  pub exported: bool,
}

impl DependencyEdge {
  pub fn new(target: DependencyTarget, scope: Scope) -> Self {
    Self {
      target,
      scope,
      constraint: None,
      exported: false,
    }
  }

  pub fn external(coordinate: Coordinate, scope: Scope) -> Self {
    Self::new(DependencyTarget::External(coordinate), scope)
  }

  pub fn module(name: impl Into<String>, scope: Scope) -> Self {
    Self::new(DependencyTarget::Module(name.into()), scope)
  }

  pub fn with_constraint(mut self, constraint: VersionConstraint) -> Self {
    self.constraint = Some(constraint);
    self
  }

  pub fn exported(mut self) -> Self {
    self.exported = true;
    self
  }

  /// Declaration identity: target (including version) plus scope.
  fn declaration_key(&self) -> (String, Scope) {
    (self.target.to_string(), self.scope)
  }
}

impl fmt::Display for DependencyEdge {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{} ({}", self.target, self.scope)?;
    if self.exported {
      write!(f, ", exported")?;
    }
    if let Some(c) = &self.constraint {
      write!(f, ", constraint {}", c)?;
    }
    write!(f, ")")
  }
}

/// A named source partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Module {
  pub name: String,
  pub edges: Vec<DependencyEdge>,
  /// Whether the module's output is merged into the final artifact.
  pub aggregated: bool,
  /// Directories holding the module's compiled output.
  #[serde(default)]
  pub outputs: Vec<PathBuf>,
}

impl Module {
  pub fn new(name: impl Into<String>) -> Self {
    Self {
      name: name.into(),
      edges: Vec::new(),
      aggregated: false,
      outputs: Vec::new(),
    }
  }

  pub fn aggregated(mut self) -> Self {
    self.aggregated = true;
    self
  }

  pub fn with_edge(mut self, edge: DependencyEdge) -> Self {
    self.edges.push(edge);
    self
  }

  pub fn with_output(mut self, output: impl Into<PathBuf>) -> Self {
    self.outputs.push(output.into());
    self
  }

  /// Edges of the given scope, in declaration order.
  pub fn edges_in(&self, scope: Scope) -> impl Iterator<Item = &DependencyEdge> {
    self.edges.iter().filter(move |e| e.scope == scope)
  }

  /// Names of modules this module depends on through main-scope edges.
  pub fn main_module_dependencies(&self) -> impl Iterator<Item = &str> {
    self
      .edges
      .iter()
      .filter(|e| e.scope.is_main())
      .filter_map(|e| e.target.module_name())
  }
}

/// Errors raised while building a module set.
#[derive(Debug, Error)]
pub enum ModuleError {
  /// Two modules share a name.
  #[error("duplicate module '{0}'")]
  DuplicateModule(String),

  /// `exported` is only meaningful for implementation edges.
  #[error("module '{module}': edge {edge} cannot be exported; only implementation edges are exported")]
  ExportedNonImplementation { module: String, edge: String },

  /// The aggregate build has no tests, so test scopes cannot be declared on it.
  #[error("project dependency {0} uses a test scope; declare test dependencies on a module")]
  TestScopeOnAggregate(String),

  /// The aggregate order names a module that does not exist or is not aggregated.
  #[error("aggregate order names '{0}', which is not an aggregated module")]
  NotAggregated(String),

  /// The aggregate order lists a module more than once.
  #[error("aggregate order lists '{0}' more than once")]
  RepeatedInOrder(String),

  /// The aggregate order omits an aggregated module.
  #[error("aggregate order omits aggregated module '{0}'")]
  MissingFromOrder(String),
}

/// The immutable set of modules for one build invocation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ModuleSet {
  modules: Vec<Module>,
  #[serde(skip)]
  index: BTreeMap<String, usize>,
  project_edges: Vec<DependencyEdge>,
  aggregate_order: Vec<String>,
}

impl ModuleSet {
  /// Build a module set, collapsing duplicate edge declarations.
  ///
  /// The aggregate order defaults to the declaration order of aggregated modules.
  pub fn new(modules: Vec<Module>) -> Result<Self, ModuleError> {
    let mut index = BTreeMap::new();
    let mut normalized = Vec::with_capacity(modules.len());

    for (i, mut module) in modules.into_iter().enumerate() {
      if index.insert(module.name.clone(), i).is_some() {
        return Err(ModuleError::DuplicateModule(module.name));
      }
      module.edges = dedup_edges(&module.name, module.edges)?;
      normalized.push(module);
    }

    let aggregate_order = normalized
      .iter()
      .filter(|m| m.aggregated)
      .map(|m| m.name.clone())
      .collect();

    Ok(Self {
      modules: normalized,
      index,
      project_edges: Vec::new(),
      aggregate_order,
    })
  }

  /// Attach dependencies declared on the aggregate build itself.
  pub fn with_project_edges(mut self, edges: Vec<DependencyEdge>) -> Result<Self, ModuleError> {
    if let Some(edge) = edges.iter().find(|e| !e.scope.is_main()) {
      return Err(ModuleError::TestScopeOnAggregate(edge.to_string()));
    }
    self.project_edges = dedup_edges("<aggregate>", edges)?;
    Ok(self)
  }

  /// Override the order in which aggregated modules are merged.
  ///
  /// The order must list every aggregated module exactly once.
  pub fn with_aggregate_order(mut self, order: Vec<String>) -> Result<Self, ModuleError> {
    let mut seen = BTreeMap::new();
    for name in &order {
      match self.get(name) {
        Some(m) if m.aggregated => {}
        _ => return Err(ModuleError::NotAggregated(name.clone())),
      }
      if seen.insert(name.as_str(), ()).is_some() {
        return Err(ModuleError::RepeatedInOrder(name.clone()));
      }
    }
    if let Some(missing) = self.modules.iter().find(|m| m.aggregated && !seen.contains_key(m.name.as_str())) {
      return Err(ModuleError::MissingFromOrder(missing.name.clone()));
    }

    self.aggregate_order = order;
    Ok(self)
  }

  pub fn get(&self, name: &str) -> Option<&Module> {
    self.index.get(name).map(|&i| &self.modules[i])
  }

  pub fn contains(&self, name: &str) -> bool {
    self.index.contains_key(name)
  }

  /// All modules in declaration order.
  pub fn modules(&self) -> &[Module] {
    &self.modules
  }

  pub fn project_edges(&self) -> &[DependencyEdge] {
    &self.project_edges
  }

  /// Aggregated modules in merge order.
  pub fn aggregated(&self) -> impl Iterator<Item = &Module> {
    self.aggregate_order.iter().filter_map(|name| self.get(name))
  }

  pub fn aggregate_order(&self) -> &[String] {
    &self.aggregate_order
  }

  pub fn len(&self) -> usize {
    self.modules.len()
  }

  pub fn is_empty(&self) -> bool {
    self.modules.is_empty()
  }
}

/// Collapse duplicate declarations, keeping the first occurrence's position.
///
/// A repeated declaration adds its `exported` flag and fills in a missing
/// constraint but never creates a second edge.
fn dedup_edges(owner: &str, edges: Vec<DependencyEdge>) -> Result<Vec<DependencyEdge>, ModuleError> {
  let mut out: Vec<DependencyEdge> = Vec::with_capacity(edges.len());
  let mut positions: BTreeMap<(String, Scope), usize> = BTreeMap::new();

  for edge in edges {
    if edge.exported && edge.scope != Scope::Implementation {
      return Err(ModuleError::ExportedNonImplementation {
        module: owner.to_string(),
        edge: edge.to_string(),
      });
    }

    let key = edge.declaration_key();
    match positions.get(&key) {
      Some(&pos) => {
        debug!(module = owner, edge = %edge, "collapsing duplicate declaration");
        let existing = &mut out[pos];
        existing.exported |= edge.exported;
        if existing.constraint.is_none() {
          existing.constraint = edge.constraint;
        }
      }
      None => {
        positions.insert(key, out.len());
        out.push(edge);
      }
    }
  }

  Ok(out)
}
