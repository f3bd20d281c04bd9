//! Artifact assembly.
//!
//! Merges the compiled outputs of aggregated modules into one [`Artifact`]:
//! outputs are concatenated in merge order, exclusion globs drop paths
//! regardless of module, and a later module silently replaces an earlier
//! module's file (recorded as an [`OutputCollision`]). Module files at the
//! generated manifest paths are dropped.
//!
//! Assembly is sequential and reads the module set without changing it.

mod exclude;
mod listing;
mod types;
mod write;

use std::collections::BTreeMap;

use tracing::{debug, info, trace, warn};

use crate::cancel::CancelToken;
use crate::consts::{BUNDLE_MANIFEST_PATH, BUNDLE_MANIFEST_VERSION, CREATED_BY, JAR_MANIFEST_PATH};
use crate::module::{Module, ModuleSet};
use crate::util::hash::{ContentHash, Hashable, hash_file, hash_listing};

pub use exclude::ExclusionSet;
pub use listing::list_outputs;
pub use types::{
  Artifact, ArtifactEntry, ArtifactManifest, AssembleError, BuildIdentity, ModuleDigest, OutputCollision,
};
pub use write::write_jar;

/// Assembles module outputs into an artifact.
#[derive(Debug, Clone)]
pub struct Assembler {
  identity: BuildIdentity,
  exclusions: ExclusionSet,
  cancel: CancelToken,
}

impl Assembler {
  pub fn new(identity: BuildIdentity) -> Self {
    Self {
      identity,
      exclusions: ExclusionSet::default(),
      cancel: CancelToken::default(),
    }
  }

  pub fn with_exclusions(mut self, exclusions: ExclusionSet) -> Self {
    self.exclusions = exclusions;
    self
  }

  pub fn with_cancel(mut self, cancel: CancelToken) -> Self {
    self.cancel = cancel;
    self
  }

  /// Assemble the aggregated modules of a set, in merge order.
  pub fn assemble_set(&self, modules: &ModuleSet) -> Result<Artifact, AssembleError> {
    self.assemble(modules.aggregated())
  }

  /// Assemble the given modules, in the given order.
  pub fn assemble<'a>(&self, modules: impl IntoIterator<Item = &'a Module>) -> Result<Artifact, AssembleError> {
    let mut entries: BTreeMap<String, ArtifactEntry> = BTreeMap::new();
    let mut digests = Vec::new();
    let mut collisions = Vec::new();
    let mut excluded = 0;

    for module in modules {
      if self.cancel.is_cancelled() {
        return Err(AssembleError::Cancelled);
      }
      debug!(module = %module.name, "merging module outputs");

      let mut kept: Vec<(String, ArtifactEntry)> = Vec::new();
      for (path, source) in list_outputs(module)? {
        if path == JAR_MANIFEST_PATH || path == BUNDLE_MANIFEST_PATH {
          warn!(module = %module.name, path = %path, "module output replaced by generated manifest");
          continue;
        }
        if let Some(glob) = self.exclusions.matching(&path) {
          trace!(module = %module.name, path = %path, glob, "excluded");
          excluded += 1;
          continue;
        }
        let hash = hash_file(&source)?;
        kept.push((
          path,
          ArtifactEntry {
            module: module.name.clone(),
            source,
            hash,
          },
        ));
      }

      digests.push(ModuleDigest {
        name: module.name.clone(),
        hash: hash_listing(kept.iter().map(|(path, entry)| (path.as_str(), &entry.hash))),
        files: kept.len(),
      });

      for (path, entry) in kept {
        let winner = entry.module.clone();
        if let Some(previous) = entries.insert(path.clone(), entry)
          && previous.module != winner
        {
          warn!(path = %path, previous = %previous.module, winner = %winner, "output collision");
          collisions.push(OutputCollision {
            path,
            previous: previous.module,
            winner,
          });
        }
      }
    }

    let manifest = ArtifactManifest {
      manifest_version: BUNDLE_MANIFEST_VERSION,
      identity: self.identity.clone(),
      modules: digests,
      exclusions: self.exclusions.globs(),
      created_by: CREATED_BY.to_string(),
    };
    let id = manifest.compute_hash()?;
    let content_hash: ContentHash = hash_listing(entries.iter().map(|(path, entry)| (path.as_str(), &entry.hash)));

    info!(
      artifact = %self.identity.jar_name(),
      modules = manifest.modules.len(),
      entries = entries.len(),
      excluded,
      collisions = collisions.len(),
      "assembled artifact"
    );

    Ok(Artifact {
      manifest,
      entries,
      collisions,
      excluded,
      id,
      content_hash,
    })
  }
}

/// Assemble modules with the given exclusion globs.
pub fn assemble<'a, S: AsRef<str>>(
  modules: impl IntoIterator<Item = &'a Module>,
  exclusions: &[S],
  identity: BuildIdentity,
) -> Result<Artifact, AssembleError> {
  Assembler::new(identity)
    .with_exclusions(ExclusionSet::new(exclusions)?)
    .assemble(modules)
}
