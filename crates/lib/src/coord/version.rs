//! Maven-style version parsing, ordering and range constraints.
//!
//! Java ecosystem versions are not semver: `33.2.0-jre`, `4.1.110.Final` and
//! `3.0.3-p9` are all ordinary release numbers. Versions are split into
//! numeric and qualifier items on `.`, `-` and digit/letter transitions, and
//! compared item by item with missing items treated as `0` / release.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use thiserror::Error;

/// Errors that can occur during version or constraint parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VersionError {
  /// The version string was empty.
  #[error("empty version")]
  Empty,

  /// The constraint is not a valid version range.
  #[error("invalid version constraint '{0}'")]
  InvalidConstraint(String),
}

/// A single version item.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Item {
  Number(u64),
  Qualifier(String),
}

/// Rank of well-known qualifiers. Unknown qualifiers sort after all of these.
fn qualifier_rank(q: &str) -> Option<u8> {
  match q {
    "alpha" | "a" => Some(0),
    "beta" | "b" => Some(1),
    "milestone" | "m" => Some(2),
    "rc" | "cr" => Some(3),
    "snapshot" => Some(4),
    "" | "ga" | "final" | "release" => Some(5),
    "sp" => Some(6),
    _ => None,
  }
}

fn compare_qualifiers(a: &str, b: &str) -> Ordering {
  match (qualifier_rank(a), qualifier_rank(b)) {
    (Some(x), Some(y)) => x.cmp(&y),
    (Some(_), None) => Ordering::Less,
    (None, Some(_)) => Ordering::Greater,
    (None, None) => a.cmp(b),
  }
}

/// Compare two items; `None` stands for a missing trailing item.
fn compare_items(a: Option<&Item>, b: Option<&Item>) -> Ordering {
  match (a, b) {
    (None, None) => Ordering::Equal,
    (Some(Item::Number(x)), Some(Item::Number(y))) => x.cmp(y),
    (Some(Item::Qualifier(x)), Some(Item::Qualifier(y))) => compare_qualifiers(x, y),
    (Some(Item::Number(_)), Some(Item::Qualifier(_))) => Ordering::Greater,
    (Some(Item::Qualifier(_)), Some(Item::Number(_))) => Ordering::Less,
    (Some(Item::Number(x)), None) => x.cmp(&0),
    (None, Some(Item::Number(y))) => 0.cmp(y),
    (Some(Item::Qualifier(x)), None) => compare_qualifiers(x, ""),
    (None, Some(Item::Qualifier(y))) => compare_qualifiers("", y),
  }
}

/// A parsed version.
///
/// Keeps the original spelling for display; equality and ordering use the
/// parsed items, so `1.0` and `1.0.0` compare equal.
#[derive(Debug, Clone)]
pub struct Version {
  raw: String,
  items: Vec<Item>,
}

impl Version {
  /// Parse a version string. Any non-empty string is a valid version.
  pub fn parse(s: &str) -> Result<Self, VersionError> {
    let raw = s.trim();
    if raw.is_empty() {
      return Err(VersionError::Empty);
    }

    let mut items = Vec::new();
    let mut current = String::new();
    let mut numeric = false;

    let flush = |current: &mut String, numeric: bool, items: &mut Vec<Item>| {
      if current.is_empty() {
        return;
      }
      let item = if numeric {
        // Overlong numbers fall back to lexical comparison.
        current
          .parse()
          .map(Item::Number)
          .unwrap_or_else(|_| Item::Qualifier(current.clone()))
      } else {
        Item::Qualifier(current.to_lowercase())
      };
      items.push(item);
      current.clear();
    };

    for c in raw.chars() {
      if c == '.' || c == '-' || c == '_' {
        flush(&mut current, numeric, &mut items);
        continue;
      }
      let is_digit = c.is_ascii_digit();
      if !current.is_empty() && is_digit != numeric {
        flush(&mut current, numeric, &mut items);
      }
      numeric = is_digit;
      current.push(c);
    }
    flush(&mut current, numeric, &mut items);

    Ok(Self {
      raw: raw.to_string(),
      items,
    })
  }

  /// The version as originally written.
  pub fn as_str(&self) -> &str {
    &self.raw
  }
}

impl PartialEq for Version {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Version {}

impl PartialOrd for Version {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl Ord for Version {
  fn cmp(&self, other: &Self) -> Ordering {
    let len = self.items.len().max(other.items.len());
    for i in 0..len {
      let ord = compare_items(self.items.get(i), other.items.get(i));
      if ord != Ordering::Equal {
        return ord;
      }
    }
    Ordering::Equal
  }
}

impl fmt::Display for Version {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl Serialize for Version {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.raw)
  }
}

impl<'de> Deserialize<'de> for Version {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    Version::parse(&s).map_err(serde::de::Error::custom)
  }
}

/// One end of a version range.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bound {
  pub version: Version,
  pub inclusive: bool,
}

/// A version constraint in Maven range syntax.
///
/// - `[1.5]`: exactly 1.5
/// - `[1.0,2.0)`: 1.0 <= v < 2.0
/// - `[1.0,)`: v >= 1.0
/// - `(,2.0]`: v <= 2.0
/// - `1.5`: v >= 1.5
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionConstraint {
  raw: String,
  pub lower: Option<Bound>,
  pub upper: Option<Bound>,
}

impl VersionConstraint {
  pub fn parse(s: &str) -> Result<Self, VersionError> {
    let raw = s.trim();
    let invalid = || VersionError::InvalidConstraint(raw.to_string());

    if raw.is_empty() {
      return Err(invalid());
    }

    let open = raw.chars().next().ok_or_else(invalid)?;
    if open != '[' && open != '(' {
      let version = Version::parse(raw)?;
      return Ok(Self {
        raw: raw.to_string(),
        lower: Some(Bound {
          version,
          inclusive: true,
        }),
        upper: None,
      });
    }

    let close = raw.chars().last().ok_or_else(invalid)?;
    if raw.len() < 2 || (close != ']' && close != ')') {
      return Err(invalid());
    }
    let lower_inclusive = open == '[';
    let upper_inclusive = close == ']';
    let body = &raw[1..raw.len() - 1];

    let Some((low, high)) = body.split_once(',') else {
      // `[1.5]` pins a single version; `(1.5)` makes no sense.
      if !lower_inclusive || !upper_inclusive {
        return Err(invalid());
      }
      let version = Version::parse(body).map_err(|_| invalid())?;
      return Ok(Self {
        raw: raw.to_string(),
        lower: Some(Bound {
          version: version.clone(),
          inclusive: true,
        }),
        upper: Some(Bound {
          version,
          inclusive: true,
        }),
      });
    };

    let parse_bound = |text: &str, inclusive: bool| -> Result<Option<Bound>, VersionError> {
      let text = text.trim();
      if text.is_empty() {
        return Ok(None);
      }
      let version = Version::parse(text).map_err(|_| invalid())?;
      Ok(Some(Bound { version, inclusive }))
    };

    let lower = parse_bound(low, lower_inclusive)?;
    let upper = parse_bound(high, upper_inclusive)?;

    if lower.is_none() && upper.is_none() {
      return Err(invalid());
    }
    if let (Some(l), Some(u)) = (&lower, &upper)
      && l.version > u.version
    {
      return Err(invalid());
    }

    Ok(Self {
      raw: raw.to_string(),
      lower,
      upper,
    })
  }

  /// Check whether a version satisfies this constraint.
  pub fn matches(&self, version: &Version) -> bool {
    let above = match &self.lower {
      Some(b) if b.inclusive => version >= &b.version,
      Some(b) => version > &b.version,
      None => true,
    };
    let below = match &self.upper {
      Some(b) if b.inclusive => version <= &b.version,
      Some(b) => version < &b.version,
      None => true,
    };
    above && below
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }
}

impl fmt::Display for VersionConstraint {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl Serialize for VersionConstraint {
  fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&self.raw)
  }
}

impl<'de> Deserialize<'de> for VersionConstraint {
  fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
    let s = String::deserialize(deserializer)?;
    VersionConstraint::parse(&s).map_err(serde::de::Error::custom)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn v(s: &str) -> Version {
    Version::parse(s).unwrap()
  }

  mod ordering {
    use super::*;

    #[test]
    fn numeric_segments_compare_numerically() {
      assert!(v("1.10") > v("1.9"));
      assert!(v("4.1.110") > v("4.1.99"));
    }

    #[test]
    fn trailing_zeros_are_equal() {
      assert_eq!(v("1"), v("1.0"));
      assert_eq!(v("1.0"), v("1.0.0"));
      assert_eq!(v("1.0-final"), v("1"));
    }

    #[test]
    fn prerelease_qualifiers_sort_before_release() {
      assert!(v("1.0-alpha") < v("1.0-beta"));
      assert!(v("1.0-beta") < v("1.0-rc1"));
      assert!(v("1.0-rc1") < v("1.0-SNAPSHOT"));
      assert!(v("1.0-SNAPSHOT") < v("1.0"));
      assert!(v("1.0") < v("1.0-sp1"));
    }

    #[test]
    fn ecosystem_versions_parse() {
      assert!(v("33.2.0-jre") > v("33.1.0-jre"));
      assert!(v("4.1.110.Final") > v("4.1.109.Final"));
      assert!(v("3.0.3-p9") > v("3.0.3"));
      assert_eq!(v("4.1.110.Final"), v("4.1.110"));
    }

    #[test]
    fn qualifiers_are_case_insensitive() {
      assert_eq!(v("1.0-RC1"), v("1.0-rc1"));
    }

    #[test]
    fn display_keeps_original_spelling() {
      assert_eq!(v("4.1.110.Final").to_string(), "4.1.110.Final");
    }

    #[test]
    fn empty_is_rejected() {
      assert_eq!(Version::parse("  "), Err(VersionError::Empty));
    }
  }

  mod constraints {
    use super::*;

    fn c(s: &str) -> VersionConstraint {
      VersionConstraint::parse(s).unwrap()
    }

    #[test]
    fn half_open_range() {
      let range = c("[33.0,34.0)");
      assert!(range.matches(&v("33.0")));
      assert!(range.matches(&v("33.2.0-jre")));
      assert!(!range.matches(&v("34.0")));
      assert!(!range.matches(&v("32.9")));
    }

    #[test]
    fn exact_pin() {
      let pin = c("[1.5]");
      assert!(pin.matches(&v("1.5.0")));
      assert!(!pin.matches(&v("1.5.1")));
    }

    #[test]
    fn open_upper_and_lower() {
      assert!(c("[1.0,)").matches(&v("99")));
      assert!(!c("(1.0,)").matches(&v("1.0")));
      assert!(c("(,2.0]").matches(&v("2.0")));
      assert!(!c("(,2.0)").matches(&v("2.0")));
    }

    #[test]
    fn bare_version_is_minimum() {
      let min = c("5.10");
      assert!(min.matches(&v("5.10.2")));
      assert!(!min.matches(&v("5.9")));
    }

    #[test]
    fn malformed_ranges_are_rejected() {
      for bad in ["", "[", "[1.0", "(1.0)", "[,]", "[2.0,1.0]", "[1.0,2.0"] {
        assert!(VersionConstraint::parse(bad).is_err(), "expected '{}' to be rejected", bad);
      }
    }
  }
}
