//! Run configuration.
//!
//! A [`Config`] is read from a TOML file and then overridden field by field
//! by command-line flags. It is deliberately loose (strings and paths);
//! [`Config::to_options`] and [`Config::to_inputs`] compile it into the
//! validated [`SessionOptions`] and [`RunInputs`] a run needs.
//!
//! ```toml
//! target = "."
//! boms = ["boms/platform-bom.pom"]
//! toolchain = "toolchain/pom.xml"
//! version-suffix = "-rebuild-1"
//! modifications = ["+property"]
//! relocations = ["old.group:old-art=new.group:new-art:2.0"]
//!
//! [property-mappings]
//! "junit.version" = "4.11"
//! ```

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use crate::coord::{CoordError, VersionlessKey, WildcardKey};
use crate::manager::RunInputs;
use crate::modders::{ModderError, resolve_selection};
use crate::session::{
  RelocationError, SessionOptions, VersionPattern, VersionPatternError, parse_directive, split_directives,
};

/// Workspace directory used when none is configured.
pub const DEFAULT_WORKSPACE: &str = "pomalign-workspace";

/// Reports subdirectory of the workspace used when none is configured.
pub const DEFAULT_REPORTS_DIR: &str = "reports";

/// File name of the capture descriptor inside the workspace.
pub const DEFAULT_CAPTURE_POM: &str = "capture.pom";

/// Include globs used when none are configured.
pub const DEFAULT_POM_PATTERNS: &[&str] = &["**/pom.xml", "**/*.pom"];

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to parse config {}: {source}", path.display())]
  Parse { path: PathBuf, source: toml::de::Error },

  #[error("no target POM or directory configured")]
  NoTarget,

  #[error("no BOMs configured")]
  NoBoms,

  #[error("version-suffix and version-modifier cannot both be set")]
  ConflictingVersionRules,

  #[error(transparent)]
  Modder(#[from] ModderError),

  #[error(transparent)]
  Relocation(#[from] RelocationError),

  #[error(transparent)]
  VersionModifier(#[from] VersionPatternError),

  #[error("invalid {field} entry: {source}")]
  Coordinate {
    field: &'static str,
    source: CoordError,
  },

  #[error("property mapping '{0}' is not of the form key=value")]
  Mapping(String),

  #[error("invalid POM glob '{pattern}': {source}")]
  Glob {
    pattern: String,
    source: glob::PatternError,
  },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct Config {
  /// A POM file or a directory to search for POMs.
  pub target: Option<PathBuf>,
  pub boms: Vec<PathBuf>,
  pub toolchain: Option<PathBuf>,
  pub version_suffix: Option<String>,
  /// `pattern:replacement`, where the pattern is a regex.
  pub version_modifier: Option<String>,
  pub strict: bool,
  /// Modder selection; see [`resolve_selection`].
  pub modifications: Vec<String>,
  pub removed_plugins: Vec<String>,
  pub removed_tests: Vec<String>,
  pub extensions_whitelist: Vec<String>,
  /// `old=new` relocation directives.
  pub relocations: Vec<String>,
  pub property_mappings: BTreeMap<String, String>,
  pub workspace: Option<PathBuf>,
  pub reports: Option<PathBuf>,
  /// Write a capture descriptor to the default location.
  pub capture: bool,
  /// Write a capture descriptor to this path.
  pub capture_pom: Option<PathBuf>,
  pub pom_patterns: Vec<String>,
  pub pom_exclude: Option<String>,
  pub preserve_files: bool,
  pub relocate_output: Option<PathBuf>,
}

impl Config {
  /// Read a TOML config file. Relative paths in it are resolved against the
  /// file's directory.
  pub fn load(path: &Path) -> Result<Self, ConfigError> {
    let content = fs::read_to_string(path).map_err(|source| ConfigError::Read {
      path: path.to_path_buf(),
      source,
    })?;
    let mut config: Config = toml::from_str(&content).map_err(|source| ConfigError::Parse {
      path: path.to_path_buf(),
      source,
    })?;
    if let Some(dir) = path.parent() {
      config.resolve_paths(dir);
    }
    debug!(path = %path.display(), boms = config.boms.len(), "loaded config");
    Ok(config)
  }

  fn resolve_paths(&mut self, base: &Path) {
    let resolve = |p: &mut PathBuf| {
      if p.is_relative() {
        *p = base.join(&*p);
      }
    };
    self.target.iter_mut().for_each(resolve);
    self.boms.iter_mut().for_each(resolve);
    self.toolchain.iter_mut().for_each(resolve);
    self.workspace.iter_mut().for_each(resolve);
    self.reports.iter_mut().for_each(resolve);
    self.capture_pom.iter_mut().for_each(resolve);
    self.relocate_output.iter_mut().for_each(resolve);
  }

  /// Reject anything that would make the run fail before it starts.
  pub fn validate(&self) -> Result<(), ConfigError> {
    self.to_inputs()?;
    self.to_options()?;
    Ok(())
  }

  pub fn workspace(&self) -> PathBuf {
    self
      .workspace
      .clone()
      .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKSPACE))
  }

  /// Compile the session options.
  pub fn to_options(&self) -> Result<SessionOptions, ConfigError> {
    if self.version_suffix.is_some() && self.version_modifier.is_some() {
      return Err(ConfigError::ConflictingVersionRules);
    }
    let workspace = self.workspace();
    let reports_dir = self
      .reports
      .clone()
      .unwrap_or_else(|| workspace.join(DEFAULT_REPORTS_DIR));
    let capture_pom = match (&self.capture_pom, self.capture) {
      (Some(path), _) => Some(path.clone()),
      (None, true) => Some(workspace.join(DEFAULT_CAPTURE_POM)),
      (None, false) => None,
    };

    let mut relocations = Vec::new();
    for entry in &self.relocations {
      for directive in split_directives(entry) {
        relocations.push(parse_directive(&directive)?);
      }
    }

    Ok(SessionOptions {
      workspace,
      reports_dir,
      capture_pom,
      version_suffix: self.version_suffix.clone().filter(|s| !s.is_empty()),
      version_modifier: self.version_modifier.as_deref().map(VersionPattern::parse).transpose()?,
      strict: self.strict,
      removed_plugins: parse_keys("removed-plugins", &self.removed_plugins)?,
      removed_tests: parse_list(&self.removed_tests)
        .map(|s| s.parse::<WildcardKey>())
        .collect::<Result<_, _>>()
        .map_err(|source| ConfigError::Coordinate {
          field: "removed-tests",
          source,
        })?,
      extensions_whitelist: parse_keys("extensions-whitelist", &self.extensions_whitelist)?,
      relocations,
      property_mappings: self.property_mappings.clone(),
      modders: resolve_selection(&self.modifications)?,
      preserve_files: self.preserve_files,
      relocate_output: self.relocate_output.clone(),
    })
  }

  /// Compile the run inputs: target, BOMs, toolchain and POM globs.
  pub fn to_inputs(&self) -> Result<RunInputs, ConfigError> {
    let target = self.target.clone().ok_or(ConfigError::NoTarget)?;
    if self.boms.is_empty() {
      return Err(ConfigError::NoBoms);
    }
    let patterns: Vec<&str> = if self.pom_patterns.is_empty() {
      DEFAULT_POM_PATTERNS.to_vec()
    } else {
      self.pom_patterns.iter().map(String::as_str).collect()
    };
    Ok(RunInputs {
      target,
      boms: self.boms.clone(),
      toolchain: self.toolchain.clone(),
      include: patterns.into_iter().map(compile_glob).collect::<Result<_, _>>()?,
      exclude: self.pom_exclude.as_deref().map(compile_glob).transpose()?,
    })
  }
}

/// Parse a `key=value` property mapping.
pub fn parse_mapping(text: &str) -> Result<(String, String), ConfigError> {
  let (key, value) = text
    .split_once('=')
    .map(|(k, v)| (k.trim(), v.trim()))
    .filter(|(k, _)| !k.is_empty())
    .ok_or_else(|| ConfigError::Mapping(text.to_string()))?;
  Ok((key.to_string(), value.to_string()))
}

/// Entries may themselves be comma or whitespace separated.
fn parse_list(entries: &[String]) -> impl Iterator<Item = &str> {
  entries
    .iter()
    .flat_map(|e| e.split([',', ' ', '\n', '\t']))
    .map(str::trim)
    .filter(|s| !s.is_empty())
}

fn parse_keys(field: &'static str, entries: &[String]) -> Result<Vec<VersionlessKey>, ConfigError> {
  parse_list(entries)
    .map(|s| s.parse::<VersionlessKey>())
    .collect::<Result<_, _>>()
    .map_err(|source| ConfigError::Coordinate { field, source })
}

fn compile_glob(pattern: &str) -> Result<glob::Pattern, ConfigError> {
  glob::Pattern::new(pattern).map_err(|source| ConfigError::Glob {
    pattern: pattern.to_string(),
    source,
  })
}
