//! Dependency coordinates (`group:artifact[:version]`) and versions.

pub mod version;

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

pub use version::{Bound, Version, VersionConstraint, VersionError};

/// Errors that can occur when parsing a coordinate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoordinateError {
  #[error("invalid coordinate '{0}': expected group:artifact[:version]")]
  Malformed(String),

  #[error("invalid coordinate '{coordinate}': {source}")]
  Version {
    coordinate: String,
    #[source]
    source: VersionError,
  },
}

/// An external dependency coordinate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coordinate {
  pub group: String,
  pub artifact: String,
  pub version: Option<Version>,
}

impl Coordinate {
  pub fn new(group: impl Into<String>, artifact: impl Into<String>, version: Option<Version>) -> Self {
    Self {
      group: group.into(),
      artifact: artifact.into(),
      version,
    }
  }

  /// Parse `group:artifact` or `group:artifact:version`.
  pub fn parse(s: &str) -> Result<Self, CoordinateError> {
    let s = s.trim();
    let parts: Vec<&str> = s.split(':').collect();
    if !(2..=3).contains(&parts.len()) || parts.iter().any(|p| p.trim().is_empty()) {
      return Err(CoordinateError::Malformed(s.to_string()));
    }

    let version = match parts.get(2) {
      Some(v) => Some(Version::parse(v).map_err(|source| CoordinateError::Version {
        coordinate: s.to_string(),
        source,
      })?),
      None => None,
    };

    Ok(Self::new(parts[0].trim(), parts[1].trim(), version))
  }

  /// The `group:artifact` key, identifying the library regardless of version.
  pub fn key(&self) -> String {
    format!("{}:{}", self.group, self.artifact)
  }

  /// Return a copy pinned to the given version.
  pub fn with_version(&self, version: Version) -> Self {
    Self {
      group: self.group.clone(),
      artifact: self.artifact.clone(),
      version: Some(version),
    }
  }
}

impl fmt::Display for Coordinate {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match &self.version {
      Some(v) => write!(f, "{}:{}:{}", self.group, self.artifact, v),
      None => write!(f, "{}:{}", self.group, self.artifact),
    }
  }
}

impl Serialize for Coordinate {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.to_string())
  }
}

impl<'de> Deserialize<'de> for Coordinate {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Coordinate::parse(&s).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn parses_full_coordinate() {
    let c = Coordinate::parse("com.google.guava:guava:33.2.0-jre").unwrap();
    assert_eq!(c.group, "com.google.guava");
    assert_eq!(c.artifact, "guava");
    assert_eq!(c.version.unwrap().as_str(), "33.2.0-jre");
  }

  #[test]
  fn parses_unversioned_coordinate() {
    let c = Coordinate::parse("io.netty:netty-all").unwrap();
    assert!(c.version.is_none());
    assert_eq!(c.key(), "io.netty:netty-all");
    assert_eq!(c.to_string(), "io.netty:netty-all");
  }

  #[test]
  fn rejects_malformed() {
    for bad in ["guava", "a:b:c:d", ":guava:1.0", "com.google::1.0", "a:b: "] {
      assert!(Coordinate::parse(bad).is_err(), "expected '{}' to be rejected", bad);
    }
  }

  #[test]
  fn display_round_trips_original_version_spelling() {
    let c = Coordinate::parse("io.netty:netty-all:4.1.110.Final").unwrap();
    assert_eq!(c.to_string(), "io.netty:netty-all:4.1.110.Final");
  }
}
