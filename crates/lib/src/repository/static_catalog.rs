use std::collections::BTreeMap;

use crate::coord::{Coordinate, Version};

use super::{Catalog, CatalogError};

/// A catalog listed inline, typically from the `[repository] catalog` config key.
#[derive(Debug, Clone, Default)]
pub struct StaticCatalog {
  entries: BTreeMap<String, Vec<Version>>,
}

impl StaticCatalog {
  pub fn new() -> Self {
    Self::default()
  }

  /// Register a versioned coordinate. Unversioned coordinates are ignored.
  pub fn insert(&mut self, coordinate: &Coordinate) {
    let Some(version) = &coordinate.version else {
      return;
    };
    let versions = self.entries.entry(coordinate.key()).or_default();
    if !versions.contains(version) {
      versions.push(version.clone());
      versions.sort();
    }
  }

  pub fn len(&self) -> usize {
    self.entries.values().map(Vec::len).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl FromIterator<Coordinate> for StaticCatalog {
  fn from_iter<T: IntoIterator<Item = Coordinate>>(iter: T) -> Self {
    let mut catalog = Self::new();
    for coordinate in iter {
      catalog.insert(&coordinate);
    }
    catalog
  }
}

impl Catalog for StaticCatalog {
  fn versions(&self, group: &str, artifact: &str) -> Result<Vec<Version>, CatalogError> {
    Ok(
      self
        .entries
        .get(&format!("{}:{}", group, artifact))
        .cloned()
        .unwrap_or_default(),
    )
  }
}
