//! Per-module classpath computation.
//!
//! Every function here is pure over the pinned module set and the
//! classpaths already computed for dependency modules, so independent
//! modules can be computed concurrently.

use std::collections::{BTreeMap, HashMap};

use tracing::{debug, warn};

use crate::coord::{Version, VersionConstraint};
use crate::module::{DependencyEdge, DependencyTarget, Module, ModuleSet, Scope};

use super::audit::ResolutionAudit;
use super::types::{AGGREGATE, ClasspathEntry, ClasspathKind, ConflictPolicy, ConflictResolution, ModuleClasspaths, ResolveError};

/// Computed classpaths of dependency modules, keyed by module name.
pub(super) type Resolved = BTreeMap<String, ModuleClasspaths>;

/// Test compile and test runtime classpaths of one module.
pub(super) type TestClasspaths = (Vec<ClasspathEntry>, Vec<ClasspathEntry>);

/// One request for a library seen while building a classpath.
struct Candidate {
  version: Version,
  constraint: Option<VersionConstraint>,
  entry: ClasspathEntry,
}

/// Accumulates classpath entries in first-declared-wins order.
///
/// Entries are keyed by [`DependencyTarget::key`]; later requests for an
/// existing key keep the original position and only feed conflict resolution.
pub(super) struct ClasspathBuilder<'a> {
  owner: &'a str,
  kind: ClasspathKind,
  entries: Vec<ClasspathEntry>,
  positions: HashMap<String, usize>,
  candidates: HashMap<String, Vec<Candidate>>,
}

impl<'a> ClasspathBuilder<'a> {
  pub fn new(owner: &'a str, kind: ClasspathKind) -> Self {
    Self {
      owner,
      kind,
      entries: Vec::new(),
      positions: HashMap::new(),
      candidates: HashMap::new(),
    }
  }

  pub fn push(&mut self, entry: ClasspathEntry) {
    let key = entry.edge.target.key();

    if let DependencyTarget::External(coordinate) = &entry.edge.target
      && let Some(version) = &coordinate.version
    {
      self.candidates.entry(key.clone()).or_default().push(Candidate {
        version: version.clone(),
        constraint: entry.edge.constraint.clone(),
        entry: entry.clone(),
      });
    }

    if !self.positions.contains_key(&key) {
      self.positions.insert(key, self.entries.len());
      self.entries.push(entry);
    }
  }

  pub fn push_edge(&mut self, edge: &DependencyEdge, declared_by: &str) {
    self.push(ClasspathEntry {
      edge: edge.clone(),
      declared_by: declared_by.to_string(),
    });
  }

  pub fn extend<'e>(&mut self, entries: impl IntoIterator<Item = &'e ClasspathEntry>) {
    for entry in entries {
      self.push(entry.clone());
    }
  }

  /// Settle version conflicts and return the final classpath.
  pub fn finish(mut self, policy: ConflictPolicy, audit: &ResolutionAudit) -> Result<Vec<ClasspathEntry>, ResolveError> {
    // Walk keys in classpath order so the first reported conflict is stable
    let keys: Vec<String> = self
      .entries
      .iter()
      .map(|e| e.edge.target.key())
      .filter(|k| self.candidates.contains_key(k))
      .collect();

    for key in keys {
      let Some(candidates) = self.candidates.remove(&key) else {
        continue;
      };
      let selected = self.select(&key, &candidates, policy, audit)?;

      let pos = self.positions[&key];
      if let DependencyTarget::External(coordinate) = &self.entries[pos].edge.target {
        let pinned = coordinate.with_version(selected);
        self.entries[pos].edge.target = DependencyTarget::External(pinned);
      }
    }

    Ok(self.entries)
  }

  fn select(
    &self,
    key: &str,
    candidates: &[Candidate],
    policy: ConflictPolicy,
    audit: &ResolutionAudit,
  ) -> Result<Version, ResolveError> {
    let mut distinct: Vec<&Version> = Vec::new();
    for c in candidates {
      if !distinct.contains(&&c.version) {
        distinct.push(&c.version);
      }
    }
    let constraints: Vec<&Candidate> = candidates.iter().filter(|c| c.constraint.is_some()).collect();
    let satisfies_all =
      |v: &Version| constraints.iter().all(|c| c.constraint.as_ref().is_none_or(|cons| cons.matches(v)));

    let conflict = |versions: Vec<String>, culprit: &Candidate| ResolveError::VersionConflict {
      module: self.owner.to_string(),
      classpath: self.kind,
      coordinate: key.to_string(),
      versions,
      edge: culprit.entry.to_string(),
    };
    let requested: Vec<String> = distinct.iter().map(|v| v.to_string()).collect();

    let selected: Version = if distinct.len() <= 1 {
      candidates[0].version.clone()
    } else {
      match policy {
        ConflictPolicy::Fail => {
          let culprit = candidates
            .iter()
            .find(|c| c.version != candidates[0].version)
            .unwrap_or(&candidates[0]);
          return Err(conflict(requested, culprit));
        }
        ConflictPolicy::Highest => {
          let best = distinct.iter().copied().filter(|v| satisfies_all(v)).max();
          match best {
            Some(v) => v.clone(),
            None => return Err(conflict(requested, &candidates[0])),
          }
        }
        ConflictPolicy::LastDeclared => candidates[candidates.len() - 1].version.clone(),
      }
    };

    if let Some(violated) = constraints
      .iter()
      .find(|c| c.constraint.as_ref().is_some_and(|cons| !cons.matches(&selected)))
    {
      let mut versions = requested.clone();
      if !versions.contains(&selected.to_string()) {
        versions.push(selected.to_string());
      }
      return Err(conflict(versions, violated));
    }

    if distinct.len() > 1 {
      debug!(
        module = self.owner,
        classpath = %self.kind,
        coordinate = key,
        selected = %selected,
        %policy,
        "settled version conflict"
      );
      audit.record(ConflictResolution {
        coordinate: key.to_string(),
        module: self.owner.to_string(),
        classpath: self.kind,
        requested,
        selected: selected.to_string(),
      });
    }

    Ok(selected)
  }
}

/// Compute the compile, runtime and exported classpaths of a module.
///
/// Every module it depends on through a main-scope edge must already be in `resolved`.
pub(super) fn resolve_main(
  module: &Module,
  resolved: &Resolved,
  policy: ConflictPolicy,
  audit: &ResolutionAudit,
) -> Result<ModuleClasspaths, ResolveError> {
  let owner = module.name.as_str();
  let mut compile = ClasspathBuilder::new(owner, ClasspathKind::Compile);
  let mut runtime = ClasspathBuilder::new(owner, ClasspathKind::Runtime);
  let mut exported = ClasspathBuilder::new(owner, ClasspathKind::Exported);

  for edge in &module.edges {
    let dep = edge.target.module_name().and_then(|name| resolved.get(name));

    if matches!(edge.scope, Scope::Implementation | Scope::CompileOnly) {
      compile.push_edge(edge, owner);
      if let Some(dep) = dep {
        compile.extend(&dep.exported);
      }
    }
    if matches!(edge.scope, Scope::Implementation | Scope::RuntimeOnly) {
      runtime.push_edge(edge, owner);
      if let Some(dep) = dep {
        runtime.extend(&dep.runtime);
      }
    }
    if edge.exported {
      exported.push_edge(edge, owner);
      if let Some(dep) = dep {
        exported.extend(&dep.exported);
      }
    }
  }

  Ok(ModuleClasspaths {
    compile: compile.finish(policy, audit)?,
    runtime: runtime.finish(policy, audit)?,
    exported: exported.finish(policy, audit)?,
    test_compile: Vec::new(),
    test_runtime: Vec::new(),
  })
}

/// Compute the test classpaths of a module once every main classpath is known.
pub(super) fn resolve_tests(
  module: &Module,
  modules: &ModuleSet,
  resolved: &Resolved,
  policy: ConflictPolicy,
  audit: &ResolutionAudit,
) -> Result<TestClasspaths, ResolveError> {
  let owner = module.name.as_str();
  let mut test_compile = ClasspathBuilder::new(owner, ClasspathKind::TestCompile);
  let mut test_runtime = ClasspathBuilder::new(owner, ClasspathKind::TestRuntime);

  if let Some(own) = resolved.get(owner) {
    test_compile.extend(&own.compile);
    test_runtime.extend(&own.runtime);
  }

  for edge in module.edges.iter().filter(|e| !e.scope.is_main()) {
    test_compile.push_edge(edge, owner);
    test_runtime.push_edge(edge, owner);

    let Some(name) = edge.target.module_name() else {
      continue;
    };
    if let Some(dep) = resolved.get(name) {
      test_compile.extend(&dep.exported);
      test_runtime.extend(&dep.runtime);
    }
    // Consuming a module from tests also brings in its test fixtures
    if edge.scope == Scope::TestOnly
      && let Some(target) = modules.get(name)
    {
      push_fixtures(&mut test_compile, target, resolved, ClasspathKind::Exported);
      push_fixtures(&mut test_runtime, target, resolved, ClasspathKind::Runtime);
    }
  }

  Ok((test_compile.finish(policy, audit)?, test_runtime.finish(policy, audit)?))
}

/// Push a module's test fixture edges, expanding fixture edges onto modules
/// with the given classpath of the fixture's target.
fn push_fixtures(builder: &mut ClasspathBuilder<'_>, fixture_owner: &Module, resolved: &Resolved, expand: ClasspathKind) {
  for edge in fixture_owner.edges_in(Scope::TestFixture) {
    builder.push_edge(edge, &fixture_owner.name);
    if let Some(dep) = edge.target.module_name().and_then(|name| resolved.get(name)) {
      builder.extend(dep.get(expand));
    }
  }
}

/// Compute the classpaths of the aggregate build.
///
/// The aggregate is the union of the aggregated modules' classpaths (in
/// merge order) plus project-level edges. Aggregated modules themselves are
/// inside the artifact, so entries pointing at them are dropped.
pub(super) fn resolve_aggregate(
  modules: &ModuleSet,
  resolved: &Resolved,
  policy: ConflictPolicy,
  audit: &ResolutionAudit,
) -> Result<ModuleClasspaths, ResolveError> {
  let is_merged = |entry: &&ClasspathEntry| {
    entry
      .edge
      .target
      .module_name()
      .and_then(|name| modules.get(name))
      .is_some_and(|m| m.aggregated)
  };

  let mut compile = ClasspathBuilder::new(AGGREGATE, ClasspathKind::Compile);
  let mut runtime = ClasspathBuilder::new(AGGREGATE, ClasspathKind::Runtime);
  let mut exported = ClasspathBuilder::new(AGGREGATE, ClasspathKind::Exported);

  for module in modules.aggregated() {
    let Some(cp) = resolved.get(&module.name) else {
      warn!(module = %module.name, "aggregated module has no computed classpaths");
      continue;
    };
    compile.extend(cp.compile.iter().filter(|e| !is_merged(e)));
    runtime.extend(cp.runtime.iter().filter(|e| !is_merged(e)));
    exported.extend(cp.exported.iter().filter(|e| !is_merged(e)));
  }

  for edge in modules.project_edges() {
    let dep = edge.target.module_name().and_then(|name| resolved.get(name));
    let merged = edge
      .target
      .module_name()
      .and_then(|name| modules.get(name))
      .is_some_and(|m| m.aggregated);

    if matches!(edge.scope, Scope::Implementation | Scope::CompileOnly) {
      if !merged {
        compile.push_edge(edge, AGGREGATE);
      }
      if let Some(dep) = dep {
        compile.extend(dep.exported.iter().filter(|e| !is_merged(e)));
      }
    }
    if matches!(edge.scope, Scope::Implementation | Scope::RuntimeOnly) {
      if !merged {
        runtime.push_edge(edge, AGGREGATE);
      }
      if let Some(dep) = dep {
        runtime.extend(dep.runtime.iter().filter(|e| !is_merged(e)));
      }
    }
    if edge.exported {
      if !merged {
        exported.push_edge(edge, AGGREGATE);
      }
      if let Some(dep) = dep {
        exported.extend(dep.exported.iter().filter(|e| !is_merged(e)));
      }
    }
  }

  Ok(ModuleClasspaths {
    compile: compile.finish(policy, audit)?,
    runtime: runtime.finish(policy, audit)?,
    exported: exported.finish(policy, audit)?,
    test_compile: Vec::new(),
    test_runtime: Vec::new(),
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coord::Coordinate;

  fn entry(coordinate: &str, declared_by: &str) -> ClasspathEntry {
    ClasspathEntry {
      edge: DependencyEdge::external(Coordinate::parse(coordinate).unwrap(), Scope::Implementation),
      declared_by: declared_by.to_string(),
    }
  }

  fn constrained(coordinate: &str, constraint: &str) -> ClasspathEntry {
    let mut e = entry(coordinate, "main");
    e.edge.constraint = Some(VersionConstraint::parse(constraint).unwrap());
    e
  }

  fn names(entries: &[ClasspathEntry]) -> Vec<String> {
    entries.iter().map(|e| e.edge.target.to_string()).collect()
  }

  #[test]
  fn first_declared_position_wins() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Runtime);
    builder.push(entry("b:b:1", "main"));
    builder.push(entry("a:a:1", "main"));
    builder.push(entry("b:b:1", "shared"));

    let cp = builder.finish(ConflictPolicy::Fail, &audit).unwrap();
    assert_eq!(names(&cp), vec!["b:b:1", "a:a:1"]);
    assert_eq!(cp[0].declared_by, "main");
    assert!(audit.is_empty());
  }

  #[test]
  fn fail_policy_reports_conflicting_edge() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Runtime);
    builder.push(entry("io.netty:netty-all:4.1.110.Final", "main"));
    builder.push(entry("io.netty:netty-all:4.1.100.Final", "buffers"));

    let err = builder.finish(ConflictPolicy::Fail, &audit).unwrap_err();
    match err {
      ResolveError::VersionConflict {
        module,
        classpath,
        coordinate,
        versions,
        edge,
      } => {
        assert_eq!(module, "main");
        assert_eq!(classpath, ClasspathKind::Runtime);
        assert_eq!(coordinate, "io.netty:netty-all");
        assert_eq!(versions, vec!["4.1.110.Final", "4.1.100.Final"]);
        assert!(edge.contains("via buffers"), "edge should name its origin: {}", edge);
      }
      other => panic!("unexpected error: {other}"),
    }
  }

  #[test]
  fn highest_policy_selects_and_audits() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Compile);
    builder.push(entry("com.google.guava:guava:32.0.0-jre", "main"));
    builder.push(entry("com.google.guava:guava:33.2.0-jre", "shared"));

    let cp = builder.finish(ConflictPolicy::Highest, &audit).unwrap();
    assert_eq!(names(&cp), vec!["com.google.guava:guava:33.2.0-jre"]);
    assert_eq!(cp[0].declared_by, "main");

    let records = audit.into_sorted();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0].selected, "33.2.0-jre");
    assert_eq!(records[0].requested, vec!["32.0.0-jre", "33.2.0-jre"]);
  }

  #[test]
  fn highest_policy_respects_constraints() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Compile);
    builder.push(constrained("a:a:1.0", "[1.0,2.0)"));
    builder.push(entry("a:a:1.5", "shared"));
    builder.push(entry("a:a:2.1", "buffers"));

    let cp = builder.finish(ConflictPolicy::Highest, &audit).unwrap();
    assert_eq!(names(&cp), vec!["a:a:1.5"]);
  }

  #[test]
  fn last_declared_policy_selects_latest_request() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Runtime);
    builder.push(entry("a:a:2.0", "main"));
    builder.push(entry("a:a:1.0", "shared"));

    let cp = builder.finish(ConflictPolicy::LastDeclared, &audit).unwrap();
    assert_eq!(names(&cp), vec!["a:a:1.0"]);
    assert_eq!(audit.len(), 1);
  }

  #[test]
  fn constraint_violation_fails_under_any_policy() {
    for policy in [ConflictPolicy::Fail, ConflictPolicy::Highest, ConflictPolicy::LastDeclared] {
      let audit = ResolutionAudit::new();
      let mut builder = ClasspathBuilder::new("main", ClasspathKind::Runtime);
      builder.push(constrained("a:a:3.0", "[1.0,2.0)"));

      let err = builder.finish(policy, &audit).unwrap_err();
      assert!(matches!(err, ResolveError::VersionConflict { .. }), "policy {policy}");
    }
  }

  #[test]
  fn equal_versions_with_different_spelling_do_not_conflict() {
    let audit = ResolutionAudit::new();
    let mut builder = ClasspathBuilder::new("main", ClasspathKind::Runtime);
    builder.push(entry("a:a:1.0", "main"));
    builder.push(entry("a:a:1.0.0", "shared"));

    let cp = builder.finish(ConflictPolicy::Fail, &audit).unwrap();
    assert_eq!(names(&cp), vec!["a:a:1.0"]);
    assert!(audit.is_empty());
  }
}
