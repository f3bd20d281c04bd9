//! Pin every edge to a concrete, resolvable target before any classpath is computed.

use tracing::{debug, trace};

use crate::module::{DependencyEdge, DependencyTarget, Module, ModuleSet};
use crate::repository::{Catalog, CatalogError};

use super::types::{AGGREGATE, ResolveError};

/// Check every edge of the set and return a copy with all external versions chosen.
///
/// Module targets must name a module of the set. External targets must carry
/// a version unless a catalog is available to pick one; with a catalog,
/// versioned targets must exist in it.
pub(super) fn pin_module_set(modules: &ModuleSet, catalog: Option<&dyn Catalog>) -> Result<ModuleSet, ResolveError> {
  let mut pinned = Vec::with_capacity(modules.len());
  for module in modules.modules() {
    let edges = module
      .edges
      .iter()
      .map(|edge| pin_edge(&module.name, edge, modules, catalog))
      .collect::<Result<Vec<_>, _>>()?;
    pinned.push(Module {
      edges,
      ..module.clone()
    });
  }

  let project_edges = modules
    .project_edges()
    .iter()
    .map(|edge| pin_edge(AGGREGATE, edge, modules, catalog))
    .collect::<Result<Vec<_>, _>>()?;

  Ok(
    ModuleSet::new(pinned)?
      .with_project_edges(project_edges)?
      .with_aggregate_order(modules.aggregate_order().to_vec())?,
  )
}

fn pin_edge(
  owner: &str,
  edge: &DependencyEdge,
  modules: &ModuleSet,
  catalog: Option<&dyn Catalog>,
) -> Result<DependencyEdge, ResolveError> {
  let unresolved = |coordinate: String| ResolveError::UnresolvedDependency {
    module: owner.to_string(),
    edge: edge.to_string(),
    coordinate,
  };
  let lookup_failed = |source: CatalogError| ResolveError::Catalog {
    module: owner.to_string(),
    edge: edge.to_string(),
    source,
  };

  let coordinate = match &edge.target {
    DependencyTarget::Module(name) => {
      if !modules.contains(name) {
        return Err(unresolved(format!(":{}", name)));
      }
      return Ok(edge.clone());
    }
    DependencyTarget::External(coordinate) => coordinate,
  };

  match (&coordinate.version, catalog) {
    (Some(_), None) => Ok(edge.clone()),
    (None, None) => Err(unresolved(coordinate.to_string())),
    (Some(version), Some(catalog)) => {
      let found = catalog
        .contains(&coordinate.group, &coordinate.artifact, version)
        .map_err(lookup_failed)?;
      if found {
        trace!(module = owner, coordinate = %coordinate, "found in catalog");
        Ok(edge.clone())
      } else {
        Err(unresolved(coordinate.to_string()))
      }
    }
    (None, Some(catalog)) => {
      let selected = catalog
        .versions(&coordinate.group, &coordinate.artifact)
        .map_err(lookup_failed)?
        .into_iter()
        .filter(|v| edge.constraint.as_ref().is_none_or(|c| c.matches(v)))
        .max();
      let Some(version) = selected else {
        return Err(unresolved(coordinate.to_string()));
      };

      debug!(module = owner, coordinate = %coordinate, version = %version, "selected catalog version");
      Ok(DependencyEdge {
        target: DependencyTarget::External(coordinate.with_version(version)),
        ..edge.clone()
      })
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coord::{Coordinate, VersionConstraint};
  use crate::module::Scope;
  use crate::coord::Version;
  use crate::repository::StaticCatalog;

  fn ext(s: &str) -> DependencyEdge {
    DependencyEdge::external(Coordinate::parse(s).unwrap(), Scope::Implementation)
  }

  fn catalog(coords: &[&str]) -> StaticCatalog {
    coords.iter().map(|c| Coordinate::parse(c).unwrap()).collect()
  }

  fn single(edge: DependencyEdge) -> ModuleSet {
    ModuleSet::new(vec![Module::new("main").with_edge(edge)]).unwrap()
  }

  fn pinned_target(set: &ModuleSet) -> String {
    set.get("main").unwrap().edges[0].target.to_string()
  }

  #[test]
  fn versioned_edge_passes_without_catalog() {
    let set = single(ext("com.google.guava:guava:33.2.0-jre"));
    let pinned = pin_module_set(&set, None).unwrap();
    assert_eq!(pinned_target(&pinned), "com.google.guava:guava:33.2.0-jre");
  }

  #[test]
  fn unversioned_edge_without_catalog_is_unresolved() {
    let set = single(ext("com.google.guava:guava"));
    let err = pin_module_set(&set, None).unwrap_err();
    assert!(matches!(
      err,
      ResolveError::UnresolvedDependency { module, coordinate, .. }
        if module == "main" && coordinate == "com.google.guava:guava"
    ));
  }

  #[test]
  fn catalog_picks_highest_matching_version() {
    let cat = catalog(&["a:b:1.0", "a:b:1.5", "a:b:2.0"]);
    let set = single(ext("a:b").with_constraint(VersionConstraint::parse("[1.0,2.0)").unwrap()));

    let pinned = pin_module_set(&set, Some(&cat as &dyn Catalog)).unwrap();
    assert_eq!(pinned_target(&pinned), "a:b:1.5");
  }

  #[test]
  fn versioned_edge_missing_from_catalog_is_unresolved() {
    let cat = catalog(&["a:b:1.0"]);
    let set = single(ext("a:b:1.1"));

    let err = pin_module_set(&set, Some(&cat as &dyn Catalog)).unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvedDependency { coordinate, .. } if coordinate == "a:b:1.1"));
  }

  #[test]
  fn unknown_module_is_unresolved() {
    let set = single(DependencyEdge::module("missing", Scope::CompileOnly));
    let err = pin_module_set(&set, None).unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvedDependency { coordinate, .. } if coordinate == ":missing"));
  }

  #[test]
  fn project_edges_are_checked_too() {
    let set = ModuleSet::new(vec![Module::new("main")])
      .unwrap()
      .with_project_edges(vec![ext("a:b")])
      .unwrap();

    let err = pin_module_set(&set, None).unwrap_err();
    assert!(matches!(err, ResolveError::UnresolvedDependency { module, .. } if module == AGGREGATE));
  }

  struct Unreadable;

  impl Catalog for Unreadable {
    fn versions(&self, _group: &str, _artifact: &str) -> Result<Vec<Version>, CatalogError> {
      Err(CatalogError::Read {
        path: "/repo/a/b".to_string(),
        source: std::io::Error::other("permission denied"),
      })
    }
  }

  #[test]
  fn catalog_failure_names_module_and_edge() {
    for edge in [ext("a:b"), ext("a:b:1.0")] {
      let set = single(edge);
      let err = pin_module_set(&set, Some(&Unreadable as &dyn Catalog)).unwrap_err();

      assert!(err.to_string().contains("module 'main'"));
      assert!(matches!(
        err,
        ResolveError::Catalog { module, edge, .. } if module == "main" && edge.contains("a:b")
      ));
    }
  }
}
