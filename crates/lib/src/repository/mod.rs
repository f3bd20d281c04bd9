//! Dependency catalogs.
//!
//! A [`Catalog`] answers which versions of a `group:artifact` are available.
//! The resolver consults it to reject unresolvable coordinates and to pick a
//! version for edges declared without one. Fetching artifacts is left to the
//! external repository client.

mod local;
mod static_catalog;

use thiserror::Error;

use crate::coord::Version;

pub use local::LocalRepository;
pub use static_catalog::StaticCatalog;

/// Errors that can occur while querying a catalog.
#[derive(Debug, Error)]
pub enum CatalogError {
  /// Failed to read the repository directory.
  #[error("failed to read repository at {path}: {source}")]
  Read {
    path: String,
    #[source]
    source: std::io::Error,
  },
}

/// Source of available dependency versions.
pub trait Catalog: Send + Sync {
  /// Available versions of `group:artifact`, in ascending order.
  ///
  /// An unknown library yields an empty list, not an error.
  fn versions(&self, group: &str, artifact: &str) -> Result<Vec<Version>, CatalogError>;

  /// Whether the exact version is available.
  fn contains(&self, group: &str, artifact: &str, version: &Version) -> Result<bool, CatalogError> {
    Ok(self.versions(group, artifact)?.iter().any(|v| v == version))
  }
}
