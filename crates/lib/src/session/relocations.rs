//! Coordinate relocation table.
//!
//! Directives have the form `old.group:old-artifact=new.group:new-artifact:version`.
//! They come from configuration or from a BOM's `relocations` property. The
//! merged table is first-writer-wins; each source also keeps the subset it
//! contributed, for reporting.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

use crate::coord::{FullKey, VersionlessKey};

use super::Source;

static AROUND_EQUALS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s*=\s*").expect("valid regex"));
static SEPARATORS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[\s,]+").expect("valid regex"));

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RelocationError {
  /// The directive has no `=`.
  #[error("relocation '{0}' is not of the form old=new")]
  MissingSeparator(String),

  /// The left side is not `groupId:artifactId`.
  #[error("invalid relocation source '{0}': expected groupId:artifactId")]
  InvalidSource(String),

  /// The right side is not `groupId:artifactId:version`.
  #[error("invalid relocation target '{0}': expected groupId:artifactId:version")]
  InvalidTarget(String),
}

/// Parse one side of a directive into at least `min` trimmed, non-empty parts.
///
/// Extra parts are dropped with a warning.
fn parts(text: &str, min: usize) -> Option<Vec<String>> {
  let parts: Vec<String> = text.split(':').map(|p| p.trim().to_string()).collect();
  if parts.len() < min || parts[..min].iter().any(String::is_empty) {
    return None;
  }
  if parts.len() > min {
    warn!(coordinate = %text, ignored = %parts[min..].join(":"), "ignoring extra relocation coordinate parts");
  }
  Some(parts.into_iter().take(min).collect())
}

/// Parse `old` and `new` into a relocation pair.
pub fn parse_relocation(old: &str, new: &str) -> Result<(VersionlessKey, FullKey), RelocationError> {
  let source = parts(old, 2).ok_or_else(|| RelocationError::InvalidSource(old.trim().to_string()))?;
  let target = parts(new, 3).ok_or_else(|| RelocationError::InvalidTarget(new.trim().to_string()))?;
  Ok((
    VersionlessKey::new(&source[0], &source[1]),
    FullKey::new(&target[0], &target[1], &target[2]),
  ))
}

/// Parse a single `old=new` directive.
pub fn parse_directive(directive: &str) -> Result<(VersionlessKey, FullKey), RelocationError> {
  let (old, new) = directive
    .split_once('=')
    .ok_or_else(|| RelocationError::MissingSeparator(directive.to_string()))?;
  parse_relocation(old, new)
}

/// Split directive text into `old=new` tokens.
///
/// `#` starts a comment that runs to the end of the line. Entries are
/// separated by whitespace or commas.
pub fn split_directives(text: &str) -> Vec<String> {
  text
    .lines()
    .map(|line| line.split_once('#').map_or(line, |(before, _)| before))
    .flat_map(|line| {
      let line = AROUND_EQUALS.replace_all(line, "=").into_owned();
      SEPARATORS
        .split(&line)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect::<Vec<_>>()
    })
    .collect()
}

/// Coordinate relocations from configuration and BOMs.
#[derive(Debug, Clone, Default)]
pub struct Relocations {
  /// Effective table; the first source to relocate a key wins.
  merged: BTreeMap<VersionlessKey, FullKey>,
  /// What each source contributed, for reporting.
  by_source: BTreeMap<Source, BTreeMap<VersionlessKey, FullKey>>,
}

impl Relocations {
  /// Add one relocation. Returns false when an earlier source already relocated `old`.
  pub fn insert(&mut self, source: &Source, old: VersionlessKey, new: FullKey) -> bool {
    if self.merged.contains_key(&old) {
      debug!(%old, %source, "relocation already defined; keeping first");
      return false;
    }
    debug!(%old, %new, %source, "adding relocation");
    self
      .by_source
      .entry(source.clone())
      .or_default()
      .insert(old.clone(), new.clone());
    self.merged.insert(old, new);
    true
  }

  /// Add every directive in `text`, skipping malformed entries with a warning.
  ///
  /// Returns the number of relocations added.
  pub fn add_text(&mut self, source: &Source, text: &str) -> usize {
    let mut added = 0;
    for directive in split_directives(text) {
      match parse_directive(&directive) {
        Ok((old, new)) => {
          if self.insert(source, old, new) {
            added += 1;
          }
        }
        Err(e) => warn!(%source, error = %e, "skipping relocation"),
      }
    }
    added
  }

  pub fn get(&self, key: &VersionlessKey) -> Option<&FullKey> {
    self.merged.get(key)
  }

  /// True when some relocation moves a coordinate onto `key`.
  pub fn is_target(&self, key: &VersionlessKey) -> bool {
    self.merged.values().any(|target| target.versionless() == *key)
  }

  pub fn by_source(&self) -> &BTreeMap<Source, BTreeMap<VersionlessKey, FullKey>> {
    &self.by_source
  }

  pub fn len(&self) -> usize {
    self.merged.len()
  }

  pub fn is_empty(&self) -> bool {
    self.merged.is_empty()
  }
}
