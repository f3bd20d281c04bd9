//! Module dependency DAG.
//!
//! This module provides a directed acyclic graph over inter-module
//! main-scope edges and computes parallel resolution waves.
//!
//! Test-scope module edges are left out: test classpaths only read the main
//! classpaths of their targets, so they cannot make resolution recurse.

use std::collections::{BTreeMap, HashMap, HashSet};

use petgraph::Direction;
use petgraph::algo::{tarjan_scc, toposort};
use petgraph::graph::{DiGraph, NodeIndex};

use crate::module::ModuleSet;

use super::types::ResolveError;

/// A DAG of module dependencies.
///
/// Edges run from dependency to dependent. Node indices follow module
/// declaration order, which keeps waves and cycle reports deterministic.
pub struct ModuleDag {
  graph: DiGraph<String, ()>,
  nodes: BTreeMap<String, NodeIndex>,
}

impl ModuleDag {
  /// Build the DAG from a module set.
  ///
  /// # Errors
  ///
  /// Returns `CyclicModuleDependency` naming the cycle if the main-scope
  /// module edges are not acyclic. Unknown module targets must already have
  /// been rejected; they are ignored here.
  pub fn from_modules(modules: &ModuleSet) -> Result<Self, ResolveError> {
    let mut graph = DiGraph::new();
    let mut nodes = BTreeMap::new();

    for module in modules.modules() {
      let idx = graph.add_node(module.name.clone());
      nodes.insert(module.name.clone(), idx);
    }

    for module in modules.modules() {
      let dependent_idx = nodes[&module.name];
      for dep in module.main_module_dependencies() {
        if let Some(&dep_idx) = nodes.get(dep) {
          // Edge from dependency to dependent; repeated edges collapse
          graph.update_edge(dep_idx, dependent_idx, ());
        }
      }
    }

    let dag = Self { graph, nodes };
    dag.verify_acyclic()?;

    Ok(dag)
  }

  fn verify_acyclic(&self) -> Result<(), ResolveError> {
    if toposort(&self.graph, None).is_ok() {
      return Ok(());
    }
    Err(ResolveError::CyclicModuleDependency {
      cycle: self.find_cycle().unwrap_or_default(),
    })
  }

  /// Find one cycle, written in "depends on" direction and closed on its start.
  ///
  /// Picks the strongly connected component containing the earliest declared
  /// module and walks dependencies from it until it returns.
  fn find_cycle(&self) -> Option<Vec<String>> {
    let cyclic: Vec<Vec<NodeIndex>> = tarjan_scc(&self.graph)
      .into_iter()
      .filter(|scc| scc.len() > 1 || self.graph.contains_edge(scc[0], scc[0]))
      .collect();

    let mut component = cyclic.into_iter().min_by_key(|scc| scc.iter().min().copied())?;
    component.sort();
    let members: HashSet<NodeIndex> = component.iter().copied().collect();
    let start = component[0];

    let mut path = vec![start];
    let mut visited = HashSet::new();
    if self.walk_back_to(start, start, &members, &mut visited, &mut path) {
      return Some(path.into_iter().map(|idx| self.graph[idx].clone()).collect());
    }
    None
  }

  fn walk_back_to(
    &self,
    current: NodeIndex,
    start: NodeIndex,
    members: &HashSet<NodeIndex>,
    visited: &mut HashSet<NodeIndex>,
    path: &mut Vec<NodeIndex>,
  ) -> bool {
    visited.insert(current);

    let mut deps: Vec<NodeIndex> = self
      .graph
      .neighbors_directed(current, Direction::Incoming)
      .filter(|idx| members.contains(idx))
      .collect();
    deps.sort();

    for dep in deps {
      if dep == start {
        path.push(dep);
        return true;
      }
      if visited.contains(&dep) {
        continue;
      }
      path.push(dep);
      if self.walk_back_to(dep, start, members, visited, path) {
        return true;
      }
      path.pop();
    }

    false
  }

  /// Get modules organized into resolution waves.
  ///
  /// Each wave contains modules whose module dependencies all sit in
  /// previous waves, so a wave can be resolved in parallel. Within a wave,
  /// modules keep declaration order.
  pub fn waves(&self) -> Result<Vec<Vec<String>>, ResolveError> {
    // Kahn's algorithm, level by level
    let mut in_degree: HashMap<NodeIndex, usize> = HashMap::new();
    for idx in self.graph.node_indices() {
      in_degree.insert(idx, self.graph.neighbors_directed(idx, Direction::Incoming).count());
    }

    let mut remaining: HashSet<NodeIndex> = self.graph.node_indices().collect();
    let mut waves = Vec::new();

    while !remaining.is_empty() {
      let ready: Vec<NodeIndex> = self
        .graph
        .node_indices()
        .filter(|idx| remaining.contains(idx) && in_degree[idx] == 0)
        .collect();

      if ready.is_empty() {
        return Err(ResolveError::CyclicModuleDependency {
          cycle: self.find_cycle().unwrap_or_default(),
        });
      }

      for &idx in &ready {
        remaining.remove(&idx);
        for neighbor in self.graph.neighbors_directed(idx, Direction::Outgoing) {
          if let Some(deg) = in_degree.get_mut(&neighbor) {
            *deg = deg.saturating_sub(1);
          }
        }
      }

      waves.push(ready.into_iter().map(|idx| self.graph[idx].clone()).collect());
    }

    Ok(waves)
  }

  /// Direct module dependencies of a module, in declaration order.
  pub fn dependencies(&self, name: &str) -> Vec<String> {
    let Some(&idx) = self.nodes.get(name) else {
      return Vec::new();
    };

    let mut deps: Vec<NodeIndex> = self.graph.neighbors_directed(idx, Direction::Incoming).collect();
    deps.sort();
    deps.into_iter().map(|dep| self.graph[dep].clone()).collect()
  }

  pub fn module_count(&self) -> usize {
    self.nodes.len()
  }
}
