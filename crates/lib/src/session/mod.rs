//! Session state shared by every modder during a run.
//!
//! A [`Session`] bundles the run options with the two registries:
//! - [`ManagedInfo`]: what BOMs and the toolchain declare (read-mostly)
//! - [`ChangeInfo`]: what the run changed and what it could not resolve
//!
//! plus the list of per-POM errors. It is passed by `&mut` into each modder;
//! there is no global state.

mod changes;
mod managed;
mod mappings;
mod relocations;

use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

pub use changes::{ChangeInfo, DependencyChange, DependencySnapshot};
pub use managed::{MAPPING_PROPERTY, ManagedInfo, RELOCATIONS_PROPERTY};
pub use mappings::PropertyMappings;
pub use relocations::{RelocationError, Relocations, parse_directive, parse_relocation, split_directives};

use crate::coord::{FullKey, VersionlessKey, WildcardKey};
use crate::modders::ModderKind;
use crate::pom::PomError;
use crate::project::{GraphError, ProjectError};

/// Where a relocation or mapping came from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Source {
  Configuration,
  Bom(PathBuf),
}

impl fmt::Display for Source {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Source::Configuration => f.write_str("configuration"),
      Source::Bom(path) => write!(f, "{}", path.display()),
    }
  }
}

/// Recoverable problems collected while processing a batch.
#[derive(Debug, Error)]
pub enum SessionError {
  #[error("failed to load {}: {source}", pom.display())]
  Load { pom: PathBuf, source: ProjectError },

  #[error("failed to recompute coordinate of {}: {source}", pom.display())]
  Refresh { pom: PathBuf, source: ProjectError },

  #[error("failed to write {}: {source}", pom.display())]
  Write { pom: PathBuf, source: PomError },

  #[error("failed to back up {}: {source}", pom.display())]
  Backup { pom: PathBuf, source: std::io::Error },

  #[error(transparent)]
  Graph(#[from] GraphError),
}

impl SessionError {
  /// The POM this error concerns.
  pub fn pom(&self) -> &Path {
    match self {
      SessionError::Load { pom, .. }
      | SessionError::Refresh { pom, .. }
      | SessionError::Write { pom, .. }
      | SessionError::Backup { pom, .. } => pom,
      SessionError::Graph(GraphError::Cycle { pom }) => pom,
    }
  }
}

/// A compiled `pattern:replacement` version rule.
#[derive(Debug, Clone)]
pub struct VersionPattern {
  pattern: Regex,
  replacement: String,
}

#[derive(Debug, Error)]
pub enum VersionPatternError {
  #[error("version modifier '{0}' is not of the form pattern:replacement")]
  Malformed(String),

  #[error("invalid version modifier pattern '{pattern}': {source}")]
  Regex { pattern: String, source: regex::Error },
}

impl VersionPattern {
  pub fn parse(text: &str) -> Result<Self, VersionPatternError> {
    let (pattern, replacement) = text
      .split_once(':')
      .filter(|(p, _)| !p.is_empty())
      .ok_or_else(|| VersionPatternError::Malformed(text.to_string()))?;
    let regex = Regex::new(pattern).map_err(|source| VersionPatternError::Regex {
      pattern: pattern.to_string(),
      source,
    })?;
    Ok(Self {
      pattern: regex,
      replacement: replacement.to_string(),
    })
  }

  pub fn matches(&self, version: &str) -> bool {
    self.pattern.is_match(version)
  }

  /// True when `version` matches and does not already carry the replacement text.
  pub fn needs_rewrite(&self, version: &str) -> bool {
    self.matches(version) && (self.replacement.is_empty() || !version.contains(&self.replacement))
  }

  /// Replace every match. `$` in the replacement is taken literally.
  pub fn apply(&self, version: &str) -> String {
    self
      .pattern
      .replace_all(version, regex::NoExpand(&self.replacement))
      .into_owned()
  }
}

impl fmt::Display for VersionPattern {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.pattern.as_str(), self.replacement)
  }
}

/// Finished, validated options for one run.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
  /// Root for backups, reports and the default capture path.
  pub workspace: PathBuf,
  pub reports_dir: PathBuf,
  /// Where to write the capture descriptor; `None` disables capture.
  pub capture_pom: Option<PathBuf>,
  pub version_suffix: Option<String>,
  pub version_modifier: Option<VersionPattern>,
  /// Pin mapped versions in place instead of deferring to imported BOMs.
  pub strict: bool,
  pub removed_plugins: Vec<VersionlessKey>,
  /// Modules whose test dependencies are moved out of the build.
  pub removed_tests: Vec<WildcardKey>,
  pub extensions_whitelist: Vec<VersionlessKey>,
  /// Configured relocations. These are seeded before any BOM's.
  pub relocations: Vec<(VersionlessKey, FullKey)>,
  pub property_mappings: BTreeMap<String, String>,
  /// Resolved selection, implied modders included.
  pub modders: Vec<ModderKind>,
  /// Copy originals under `<workspace>/backups` before overwriting them.
  pub preserve_files: bool,
  /// Write changed POMs into a repository layout under this directory.
  pub relocate_output: Option<PathBuf>,
}

/// Mutable state threaded through every modder.
#[derive(Debug, Default)]
pub struct Session {
  pub options: SessionOptions,
  pub managed: ManagedInfo,
  pub changes: ChangeInfo,
  errors: Vec<SessionError>,
}

impl Session {
  /// Create a session and seed it with the configured relocations and mappings.
  pub fn new(options: SessionOptions) -> Self {
    let mut managed = ManagedInfo::default();
    for (old, new) in &options.relocations {
      managed.relocations.insert(&Source::Configuration, old.clone(), new.clone());
    }
    managed.mappings.add_mappings(
      &Source::Configuration,
      options.property_mappings.iter().map(|(k, v)| (k.as_str(), v.as_str())),
    );
    debug!(
      relocations = options.relocations.len(),
      mappings = options.property_mappings.len(),
      "session created"
    );
    Self {
      options,
      managed,
      changes: ChangeInfo::default(),
      errors: Vec::new(),
    }
  }

  /// Non-strict runs defer versions to imported BOMs.
  pub fn is_normalize(&self) -> bool {
    !self.options.strict
  }

  pub fn add_error(&mut self, error: SessionError) {
    warn!(error = %error, "recording error");
    self.errors.push(error);
  }

  pub fn errors(&self) -> &[SessionError] {
    &self.errors
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod version_pattern {
    use super::*;

    #[test]
    fn replaces_every_match() {
      let pattern = VersionPattern::parse("1:Alpha1").unwrap();
      assert_eq!(pattern.apply("0.2.1"), "0.2.Alpha1");
      assert_eq!(pattern.apply("1.1"), "Alpha1.Alpha1");
    }

    #[test]
    fn rewritten_version_is_left_alone() {
      let pattern = VersionPattern::parse("1:Alpha1").unwrap();
      assert!(pattern.needs_rewrite("0.2.1"));
      assert!(!pattern.needs_rewrite("0.2.Alpha1"));
    }

    #[test]
    fn empty_replacement_strips() {
      let pattern = VersionPattern::parse("-SNAPSHOT:").unwrap();
      assert_eq!(pattern.apply("1.0-SNAPSHOT"), "1.0");
      assert!(!pattern.matches("1.0"));
    }

    #[test]
    fn rejects_missing_separator_and_bad_regex() {
      assert!(matches!(VersionPattern::parse("nocolon"), Err(VersionPatternError::Malformed(_))));
      assert!(matches!(VersionPattern::parse(":x"), Err(VersionPatternError::Malformed(_))));
      assert!(matches!(VersionPattern::parse("(:x"), Err(VersionPatternError::Regex { .. })));
    }
  }

  #[test]
  fn new_session_seeds_configured_tables() {
    let options = SessionOptions {
      relocations: vec![(VersionlessKey::new("old", "a"), FullKey::new("new", "a", "1"))],
      property_mappings: BTreeMap::from([("k".to_string(), "v".to_string())]),
      ..Default::default()
    };
    let session = Session::new(options);
    assert!(session.managed.relocations.get(&VersionlessKey::new("old", "a")).is_some());
    assert_eq!(session.managed.mappings.get("k").as_deref(), Some("v"));
    assert!(session.is_normalize());
  }
}
