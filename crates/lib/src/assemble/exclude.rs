//! Path exclusion filters.
//!
//! Patterns follow Ant/Gradle conventions: `**` spans directories, `*` and
//! `?` stay within one segment, and a pattern that matches a directory
//! excludes everything beneath it. A `**` glued to other characters inside a
//! segment (`templates**`) acts like `*`, and a trailing `/` implies `**`.

use glob::{MatchOptions, Pattern};

use super::types::AssembleError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// A compiled set of exclusion globs.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
  patterns: Vec<(String, Pattern)>,
}

impl ExclusionSet {
  /// Compile a list of globs.
  ///
  /// # Errors
  ///
  /// Returns `ExclusionPatternInvalid` naming the first glob that fails to compile.
  pub fn new<S: AsRef<str>>(globs: &[S]) -> Result<Self, AssembleError> {
    let patterns = globs
      .iter()
      .map(|raw| {
        let raw = raw.as_ref();
        Pattern::new(&normalize(raw))
          .map(|pattern| (raw.to_string(), pattern))
          .map_err(|e| AssembleError::ExclusionPatternInvalid {
            pattern: raw.to_string(),
            reason: e.to_string(),
          })
      })
      .collect::<Result<Vec<_>, _>>()?;

    Ok(Self { patterns })
  }

  /// The first glob excluding `path` (a `/`-separated relative path), if any.
  pub fn matching(&self, path: &str) -> Option<&str> {
    let prefixes: Vec<&str> = path
      .match_indices('/')
      .map(|(i, _)| &path[..i])
      .chain(std::iter::once(path))
      .collect();

    self
      .patterns
      .iter()
      .find(|(_, pattern)| prefixes.iter().any(|p| pattern.matches_with(p, MATCH_OPTIONS)))
      .map(|(raw, _)| raw.as_str())
  }

  pub fn is_excluded(&self, path: &str) -> bool {
    self.matching(path).is_some()
  }

  /// The globs as written.
  pub fn globs(&self) -> Vec<String> {
    self.patterns.iter().map(|(raw, _)| raw.clone()).collect()
  }

  pub fn is_empty(&self) -> bool {
    self.patterns.is_empty()
  }
}

fn normalize(glob: &str) -> String {
  let mut glob = glob.trim_start_matches('/').to_string();
  // a trailing slash means everything beneath the directory
  if glob.ends_with('/') {
    glob.push_str("**");
  }

  glob
    .split('/')
    .map(|segment| {
      if segment != "**" && segment.contains("**") {
        // collapse runs of stars inside a segment
        let mut out = String::with_capacity(segment.len());
        for c in segment.chars() {
          if c == '*' && out.ends_with('*') {
            continue;
          }
          out.push(c);
        }
        out
      } else {
        segment.to_string()
      }
    })
    .collect::<Vec<_>>()
    .join("/")
}

#[cfg(test)]
mod tests {
  use super::*;

  fn set(globs: &[&str]) -> ExclusionSet {
    ExclusionSet::new(globs).unwrap()
  }

  #[test]
  fn glued_double_star_acts_like_single_star() {
    assert_eq!(normalize("**/templates**"), "**/templates*");
    assert_eq!(normalize("a/**/b"), "a/**/b");
  }

  #[test]
  fn templates_anywhere_are_excluded() {
    let exclusions = set(&["**/templates**"]);

    assert!(exclusions.is_excluded("templates/index.html"));
    assert!(exclusions.is_excluded("io/spbx/templates/page.ftl"));
    assert!(exclusions.is_excluded("io/spbx/templates_v2/page.ftl"));
    assert!(!exclusions.is_excluded("io/spbx/Templates.class"));
    assert!(!exclusions.is_excluded("io/spbx/util/Strings.class"));
  }

  #[test]
  fn trailing_slash_excludes_directory_contents() {
    assert_eq!(normalize("templates/"), "templates/**");

    let exclusions = set(&["templates/", "**/cache/"]);
    assert!(exclusions.is_excluded("templates/index.html"));
    assert!(exclusions.is_excluded("io/cache/a.bin"));
    assert!(exclusions.is_excluded("cache/deep/b.bin"));
    assert!(!exclusions.is_excluded("io/templates/page.ftl"));
    assert!(!exclusions.is_excluded("io/cached.bin"));
  }

  #[test]
  fn single_star_stays_within_a_segment() {
    let exclusions = set(&["*.properties"]);

    assert!(exclusions.is_excluded("log4j.properties"));
    assert!(!exclusions.is_excluded("conf/log4j.properties"));
  }

  #[test]
  fn directory_match_excludes_contents() {
    let exclusions = set(&["META-INF/maven"]);
    assert!(exclusions.is_excluded("META-INF/maven/io.spbx/basics/pom.xml"));
    assert!(!exclusions.is_excluded("META-INF/services/x"));
  }

  #[test]
  fn matching_names_the_glob() {
    let exclusions = set(&["*.txt", "**/templates**"]);
    assert_eq!(exclusions.matching("a/templates/b"), Some("**/templates**"));
    assert_eq!(exclusions.matching("a/b"), None);
  }

  #[test]
  fn invalid_pattern_is_rejected() {
    let err = ExclusionSet::new(&["[unclosed"]).unwrap_err();
    assert!(matches!(
      err,
      AssembleError::ExclusionPatternInvalid { pattern, .. } if pattern == "[unclosed"
    ));
  }
}
