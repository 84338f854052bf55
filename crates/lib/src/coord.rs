//! Artifact coordinates.
//!
//! Coordinates are the keys of every table in the engine:
//! - [`VersionlessKey`]: `groupId:artifactId`, the identity used for lookups
//! - [`FullKey`]: `groupId:artifactId:version`, a concrete artifact
//! - [`ManagementKey`]: the dependencyManagement identity (adds type and classifier)
//! - [`WildcardKey`]: a `groupId:artifactId` pair of regex patterns
//!
//! All of them are immutable values. A "changed" coordinate is always a new instance.

use std::fmt;
use std::str::FromStr;

use regex::Regex;
use serde::Serialize;
use thiserror::Error;

/// Group assumed for plugins that omit `<groupId>`.
pub const DEFAULT_PLUGIN_GROUP: &str = "org.apache.maven.plugins";

/// Dependency type assumed when `<type>` is omitted.
pub const DEFAULT_DEPENDENCY_TYPE: &str = "jar";

/// Errors raised while parsing coordinates.
#[derive(Debug, Error)]
pub enum CoordError {
  /// The text did not split into the expected number of non-empty segments.
  #[error("invalid coordinate '{input}': expected {expected}")]
  Malformed { input: String, expected: &'static str },

  /// A wildcard segment is not a valid regular expression.
  #[error("invalid wildcard pattern '{pattern}': {source}")]
  Pattern {
    pattern: String,
    #[source]
    source: regex::Error,
  },
}

/// Split `input` on `:` into exactly `N` trimmed, non-empty segments.
fn split_exact<const N: usize>(input: &str, expected: &'static str) -> Result<[String; N], CoordError> {
  let parts: Vec<String> = input.split(':').map(|p| p.trim().to_string()).collect();
  if parts.len() != N || parts.iter().any(String::is_empty) {
    return Err(CoordError::Malformed {
      input: input.to_string(),
      expected,
    });
  }
  parts.try_into().map_err(|_| CoordError::Malformed {
    input: input.to_string(),
    expected,
  })
}

/// A `groupId:artifactId` pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct VersionlessKey {
  pub group_id: String,
  pub artifact_id: String,
}

impl VersionlessKey {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
    }
  }

  /// Key for a plugin, applying the default plugin group when none is declared.
  pub fn plugin(group_id: Option<&str>, artifact_id: &str) -> Self {
    Self::new(group_id.unwrap_or(DEFAULT_PLUGIN_GROUP), artifact_id)
  }

  /// Attach a version, producing a full key.
  pub fn with_version(&self, version: impl Into<String>) -> FullKey {
    FullKey {
      group_id: self.group_id.clone(),
      artifact_id: self.artifact_id.clone(),
      version: version.into(),
    }
  }
}

impl fmt::Display for VersionlessKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}", self.group_id, self.artifact_id)
  }
}

impl FromStr for VersionlessKey {
  type Err = CoordError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let [group_id, artifact_id] = split_exact::<2>(s, "groupId:artifactId")?;
    Ok(Self { group_id, artifact_id })
  }
}

/// A `groupId:artifactId:version` triple.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct FullKey {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
}

impl FullKey {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: impl Into<String>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version: version.into(),
    }
  }

  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::new(&self.group_id, &self.artifact_id)
  }
}

impl fmt::Display for FullKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.version)
  }
}

impl FromStr for FullKey {
  type Err = CoordError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let [group_id, artifact_id, version] = split_exact::<3>(s, "groupId:artifactId:version")?;
    Ok(Self {
      group_id,
      artifact_id,
      version,
    })
  }
}

/// Identity of a dependencyManagement entry.
///
/// Two managed dependencies collide only when group, artifact, type and classifier all match.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct ManagementKey {
  pub group_id: String,
  pub artifact_id: String,
  pub type_: String,
  pub classifier: Option<String>,
}

impl ManagementKey {
  pub fn new(
    group_id: impl Into<String>,
    artifact_id: impl Into<String>,
    type_: Option<&str>,
    classifier: Option<&str>,
  ) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      type_: type_.unwrap_or(DEFAULT_DEPENDENCY_TYPE).to_string(),
      classifier: classifier.filter(|c| !c.is_empty()).map(str::to_string),
    }
  }

  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::new(&self.group_id, &self.artifact_id)
  }
}

impl fmt::Display for ManagementKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "{}:{}:{}", self.group_id, self.artifact_id, self.type_)?;
    if let Some(classifier) = &self.classifier {
      write!(f, ":{}", classifier)?;
    }
    Ok(())
  }
}

/// A `groupId:artifactId` pair where each segment is a regular expression.
///
/// Segments must match the whole group or artifact, so `org.foo:.*` does not match `org.foobar:x`.
#[derive(Debug, Clone)]
pub struct WildcardKey {
  raw: String,
  group: Regex,
  artifact: Regex,
}

impl WildcardKey {
  pub fn matches(&self, key: &VersionlessKey) -> bool {
    self.group.is_match(&key.group_id) && self.artifact.is_match(&key.artifact_id)
  }

  pub fn as_str(&self) -> &str {
    &self.raw
  }

  fn anchored(pattern: &str) -> Result<Regex, CoordError> {
    Regex::new(&format!("^(?:{})$", pattern)).map_err(|source| CoordError::Pattern {
      pattern: pattern.to_string(),
      source,
    })
  }
}

impl fmt::Display for WildcardKey {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.raw)
  }
}

impl FromStr for WildcardKey {
  type Err = CoordError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let [group, artifact] = split_exact::<2>(s, "groupPattern:artifactPattern")?;
    Ok(Self {
      raw: format!("{}:{}", group, artifact),
      group: Self::anchored(&group)?,
      artifact: Self::anchored(&artifact)?,
    })
  }
}
