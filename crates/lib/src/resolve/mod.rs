//! Module graph resolution.
//!
//! This module turns an immutable [`ModuleSet`] into per-module classpaths.
//! It handles:
//! - Pinning external coordinates against an optional catalog
//! - Cycle detection over inter-module edges
//! - Parallel classpath computation in dependency waves
//! - Version conflict settlement and its audit log
//! - The classpaths of the aggregate build

mod audit;
mod classpath;
pub mod dag;
mod pin;
mod types;

use std::collections::BTreeMap;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info};

use crate::cancel::CancelToken;
use crate::module::ModuleSet;
use crate::repository::Catalog;

use classpath::{TestClasspaths, resolve_aggregate, resolve_main, resolve_tests};

pub use audit::ResolutionAudit;
pub use dag::ModuleDag;
pub use types::{
  AGGREGATE, ClasspathEntry, ClasspathKind, ConflictPolicy, ConflictResolution, ModuleClasspaths, Resolution,
  ResolveError,
};

/// Resolves module sets into classpaths.
///
/// A resolver holds no per-invocation state and can be reused.
#[derive(Clone, Default)]
pub struct Resolver {
  catalog: Option<Arc<dyn Catalog>>,
  policy: ConflictPolicy,
  cancel: CancelToken,
}

impl Resolver {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn with_catalog(mut self, catalog: Arc<dyn Catalog>) -> Self {
    self.catalog = Some(catalog);
    self
  }

  pub fn with_policy(mut self, policy: ConflictPolicy) -> Self {
    self.policy = policy;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  pub fn policy(&self) -> ConflictPolicy {
    self.policy
  }

  fn checkpoint(&self) -> Result<(), ResolveError> {
    if self.cancel.is_cancelled() {
      return Err(ResolveError::Cancelled);
    }
    Ok(())
  }

  /// Resolve a module set.
  ///
  /// Unresolved targets and cycles are reported before any classpath is
  /// computed. Modules of one wave are computed in parallel; results are
  /// joined in declaration order so the first reported error is stable.
  pub fn resolve(&self, modules: &ModuleSet) -> Result<Resolution, ResolveError> {
    info!(modules = modules.len(), policy = %self.policy, "resolving module graph");
    self.checkpoint()?;

    let pinned = pin::pin_module_set(modules, self.catalog.as_deref())?;
    let dag = ModuleDag::from_modules(&pinned)?;
    let waves = dag.waves()?;
    debug!(wave_count = waves.len(), "computed resolution waves");

    let audit = ResolutionAudit::new();
    let mut resolved: BTreeMap<String, ModuleClasspaths> = BTreeMap::new();

    for (wave_idx, wave) in waves.iter().enumerate() {
      debug!(wave = wave_idx, modules = wave.len(), "resolving wave");

      let results: Vec<Result<(String, ModuleClasspaths), ResolveError>> = wave
        .par_iter()
        .filter_map(|name| pinned.get(name))
        .map(|module| -> Result<(String, ModuleClasspaths), ResolveError> {
          self.checkpoint()?;
          let classpaths = resolve_main(module, &resolved, self.policy, &audit)?;
          Ok((module.name.clone(), classpaths))
        })
        .collect();

      for result in results {
        let (name, classpaths) = result?;
        resolved.insert(name, classpaths);
      }
    }

    // Test classpaths read main classpaths of arbitrary modules, so they wait
    // until every main classpath is known.
    let tests: Vec<Result<(String, TestClasspaths), ResolveError>> = pinned
      .modules()
      .par_iter()
      .map(|module| -> Result<(String, TestClasspaths), ResolveError> {
        self.checkpoint()?;
        let classpaths = resolve_tests(module, &pinned, &resolved, self.policy, &audit)?;
        Ok((module.name.clone(), classpaths))
      })
      .collect();

    for result in tests {
      let (name, (test_compile, test_runtime)) = result?;
      if let Some(cp) = resolved.get_mut(&name) {
        cp.test_compile = test_compile;
        cp.test_runtime = test_runtime;
      }
    }

    self.checkpoint()?;
    let aggregate = resolve_aggregate(&pinned, &resolved, self.policy, &audit)?;
    let audit = audit.into_sorted();

    info!(
      modules = resolved.len(),
      aggregate_runtime = aggregate.runtime.len(),
      conflicts = audit.len(),
      "module graph resolved"
    );

    Ok(Resolution {
      order: pinned.modules().iter().map(|m| m.name.clone()).collect(),
      modules: resolved,
      aggregate,
      audit,
    })
  }
}

/// Resolve a module set with the default policy and no catalog.
pub fn resolve(modules: &ModuleSet) -> Result<Resolution, ResolveError> {
  Resolver::new().resolve(modules)
}
