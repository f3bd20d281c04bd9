//! Conflict resolution audit log.
//!
//! Modules resolve in parallel, so records arrive in arbitrary order. They
//! are kept in a concurrent multiset keyed by coordinate and only sorted on
//! extraction, which makes the final log independent of thread interleaving.

use dashmap::DashMap;

use super::types::ConflictResolution;

#[derive(Debug, Default)]
pub struct ResolutionAudit {
  records: DashMap<String, Vec<ConflictResolution>>,
}

impl ResolutionAudit {
  pub fn new() -> Self {
    Self::default()
  }

  /// Append a record. Safe to call from several threads at once.
  pub fn record(&self, resolution: ConflictResolution) {
    self
      .records
      .entry(resolution.coordinate.clone())
      .or_default()
      .push(resolution);
  }

  pub fn len(&self) -> usize {
    self.records.iter().map(|entry| entry.value().len()).sum()
  }

  pub fn is_empty(&self) -> bool {
    self.len() == 0
  }

  /// All records, sorted by coordinate, module, classpath, then versions.
  pub fn into_sorted(self) -> Vec<ConflictResolution> {
    let mut all: Vec<ConflictResolution> = self.records.into_iter().flat_map(|(_, records)| records).collect();
    all.sort();
    all
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::resolve::types::ClasspathKind;

  fn record(coordinate: &str, module: &str) -> ConflictResolution {
    ConflictResolution {
      coordinate: coordinate.to_string(),
      module: module.to_string(),
      classpath: ClasspathKind::Runtime,
      requested: vec!["1.0".to_string(), "2.0".to_string()],
      selected: "2.0".to_string(),
    }
  }

  #[test]
  fn extraction_order_is_independent_of_insertion_order() {
    let forward = ResolutionAudit::new();
    forward.record(record("a:x", "main"));
    forward.record(record("b:y", "shared"));
    forward.record(record("a:x", "buffers"));

    let backward = ResolutionAudit::new();
    backward.record(record("a:x", "buffers"));
    backward.record(record("b:y", "shared"));
    backward.record(record("a:x", "main"));

    assert_eq!(forward.len(), 3);
    assert_eq!(forward.into_sorted(), backward.into_sorted());
  }

  #[test]
  fn concurrent_records_are_all_kept() {
    let audit = ResolutionAudit::new();
    std::thread::scope(|s| {
      for i in 0..8 {
        let audit = &audit;
        s.spawn(move || audit.record(record("a:x", &format!("m{}", i))));
      }
    });

    assert_eq!(audit.len(), 8);
    let sorted = audit.into_sorted();
    assert_eq!(sorted[0].module, "m0");
    assert_eq!(sorted[7].module, "m7");
  }
}
