//! Descriptor mutation rules ("modders").
//!
//! Every modder has the same contract: `apply(project, session) -> changed`.
//! A modder may read the managed-info registry and must record unresolved
//! findings in the change registry instead of failing. Applying a modder a
//! second time to its own output returns `false`.
//!
//! The catalog is closed. [`ModderKind`] is declared in precedence order, so
//! sorting a selection yields the order the pipeline runs in.

mod bom;
mod property;
mod removal;
mod test_removal;
mod toolchain;
mod version;

use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::project::Project;
use crate::session::{Session, SessionError};

pub use test_removal::{SKIP_TESTS_PROPERTY, TEST_DEPENDENCIES_PROFILE};

/// Token that re-includes the standard set in a modder selection.
pub const STANDARD_ALIAS: &str = "[standard]";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ModderError {
  /// A selection names a modder that does not exist.
  #[error("unknown modification '{0}'")]
  Unknown(String),
}

/// The modder catalog, in precedence order.
///
/// Version rewriting and BOM realignment see the parent as declared, before
/// toolchain realignment relocates or replaces it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModderKind {
  ForceParentRealignment,
  VersionSuffix,
  Version,
  BomRealignment,
  ToolchainRealignment,
  PluginRemoval,
  RepoRemoval,
  ReportingRemoval,
  ExtensionsRemoval,
  Minimize,
  TestRemoval,
  Property,
}

impl ModderKind {
  /// Every modder, in precedence order.
  pub const ALL: [ModderKind; 12] = [
    ModderKind::ForceParentRealignment,
    ModderKind::VersionSuffix,
    ModderKind::Version,
    ModderKind::BomRealignment,
    ModderKind::ToolchainRealignment,
    ModderKind::PluginRemoval,
    ModderKind::RepoRemoval,
    ModderKind::ReportingRemoval,
    ModderKind::ExtensionsRemoval,
    ModderKind::Minimize,
    ModderKind::TestRemoval,
    ModderKind::Property,
  ];

  /// The default selection.
  pub const STANDARD: [ModderKind; 4] = [
    ModderKind::VersionSuffix,
    ModderKind::ToolchainRealignment,
    ModderKind::BomRealignment,
    ModderKind::RepoRemoval,
  ];

  pub fn name(self) -> &'static str {
    match self {
      ModderKind::ForceParentRealignment => "force-parent-realignment",
      ModderKind::ToolchainRealignment => "toolchain-realignment",
      ModderKind::PluginRemoval => "plugin-removal",
      ModderKind::VersionSuffix => "version-suffix",
      ModderKind::Version => "version",
      ModderKind::BomRealignment => "bom-realignment",
      ModderKind::RepoRemoval => "repo-removal",
      ModderKind::ReportingRemoval => "reporting-removal",
      ModderKind::ExtensionsRemoval => "extensions-removal",
      ModderKind::Minimize => "minimize",
      ModderKind::TestRemoval => "testremoval",
      ModderKind::Property => "property",
    }
  }

  pub fn description(self) -> &'static str {
    match self {
      ModderKind::ForceParentRealignment => "Force the parent to the toolchain when it belongs to another group.",
      ModderKind::ToolchainRealignment => "Align the parent and plugin versions with the toolchain.",
      ModderKind::PluginRemoval => "Remove configured plugins from build, pluginManagement and reporting.",
      ModderKind::VersionSuffix => "Append the configured suffix to the project version.",
      ModderKind::Version => "Rewrite the project version with the configured pattern:replacement.",
      ModderKind::BomRealignment => "Align dependency versions with the configured BOMs.",
      ModderKind::RepoRemoval => "Remove <repositories> and <pluginRepositories>.",
      ModderKind::ReportingRemoval => "Remove the <reporting> section.",
      ModderKind::ExtensionsRemoval => "Remove build extensions not on the whitelist.",
      ModderKind::Minimize => "Strip reporting, repositories, extensions and project metadata.",
      ModderKind::TestRemoval => "Move test dependencies of configured modules into an inactive profile.",
      ModderKind::Property => "Replace property values that have a configured mapping.",
    }
  }

  /// Modders that are switched on whenever this one is.
  pub fn implied(self) -> &'static [ModderKind] {
    match self {
      ModderKind::ToolchainRealignment => &[ModderKind::PluginRemoval],
      _ => &[],
    }
  }

  /// Run this modder against one project.
  pub fn apply(self, project: &mut Project, session: &mut Session) -> bool {
    match self {
      ModderKind::ForceParentRealignment => toolchain::force_parent(project, session),
      ModderKind::ToolchainRealignment => toolchain::apply(project, session),
      ModderKind::PluginRemoval => removal::remove_plugins(project, session),
      ModderKind::VersionSuffix => version::apply_suffix(project, session),
      ModderKind::Version => version::apply_pattern(project, session),
      ModderKind::BomRealignment => bom::apply(project, session),
      ModderKind::RepoRemoval => removal::remove_repositories(project, session),
      ModderKind::ReportingRemoval => removal::remove_reporting(project, session),
      ModderKind::ExtensionsRemoval => removal::remove_extensions(project, session),
      ModderKind::Minimize => removal::minimize(project, session),
      ModderKind::TestRemoval => test_removal::apply(project, session),
      ModderKind::Property => property::apply(project, session),
    }
  }
}

impl fmt::Display for ModderKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

impl FromStr for ModderKind {
  type Err = ModderError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let s = s.trim();
    ModderKind::ALL
      .into_iter()
      .find(|kind| kind.name() == s)
      .ok_or_else(|| ModderError::Unknown(s.to_string()))
  }
}

/// Resolve a modder selection into the list the pipeline will run.
///
/// Entries may themselves be comma-separated. `+name` adds to the standard
/// set, a bare list replaces it, and [`STANDARD_ALIAS`] anywhere re-includes
/// it. An empty selection means the standard set. Implied modders are added
/// and the result is in precedence order.
pub fn resolve_selection(selection: &[String]) -> Result<Vec<ModderKind>, ModderError> {
  let tokens: Vec<&str> = selection
    .iter()
    .flat_map(|entry| entry.split(','))
    .map(str::trim)
    .filter(|t| !t.is_empty())
    .collect();

  let mut selected = BTreeSet::new();
  let include_standard = tokens.is_empty() || tokens.iter().any(|t| *t == STANDARD_ALIAS || t.starts_with('+'));
  if include_standard {
    selected.extend(ModderKind::STANDARD);
  }

  for token in tokens.into_iter().filter(|t| *t != STANDARD_ALIAS) {
    selected.insert(token.trim_start_matches('+').parse::<ModderKind>()?);
  }

  let implied: Vec<ModderKind> = selected.iter().flat_map(|k| k.implied().iter().copied()).collect();
  selected.extend(implied);

  Ok(selected.into_iter().collect())
}

/// Run `modders` against `project` in precedence order.
///
/// Returns true when any modder changed the project.
pub fn apply_modders(project: &mut Project, session: &mut Session, modders: &[ModderKind]) -> bool {
  let mut ordered = modders.to_vec();
  ordered.sort();
  ordered.dedup();

  let mut changed = false;
  for kind in ordered {
    let modified = kind.apply(project, session);
    debug!(pom = %project.pom().display(), modder = %kind, modified, "applied modder");
    if modified {
      session.changes.log(project.pom(), format!("{}: modified", kind));
    }
    changed |= modified;
  }
  if changed {
    info!(pom = %project.pom().display(), project = %project.key(), "project modified");
  }
  changed
}

/// Recompute the project key, recording a session error on failure.
fn refresh(project: &mut Project, session: &mut Session) {
  if let Err(source) = project.refresh_key() {
    session.add_error(SessionError::Refresh {
      pom: project.pom().to_path_buf(),
      source,
    });
  }
}

#[cfg(test)]
pub(crate) mod testutil {
  //! Shared fixtures for modder tests.

  use std::path::Path;

  use crate::pom;
  use crate::project::Project;
  use crate::session::{Session, SessionOptions};

  pub fn project(path: &str, xml: &str) -> Project {
    Project::new(path, pom::parse_str(xml).unwrap()).unwrap()
  }

  /// A session with one BOM and a toolchain loaded.
  pub fn session_with(options: SessionOptions, bom_xml: Option<&str>, toolchain_xml: Option<&str>) -> Session {
    let mut session = Session::new(options);
    if let Some(xml) = bom_xml {
      session.managed.add_bom(Path::new("bom.pom"), &project("bom.pom", xml));
    }
    if let Some(xml) = toolchain_xml {
      session
        .managed
        .set_toolchain(Path::new("toolchain.pom"), &project("toolchain.pom", xml));
    }
    session
  }

  pub const BOM: &str = "<project><groupId>org.bom</groupId><artifactId>bom</artifactId><version>1.0</version>\
    <packaging>pom</packaging><dependencyManagement><dependencies>\
    <dependency><groupId>org.test</groupId><artifactId>foo</artifactId><version>1.1</version></dependency>\
    <dependency><groupId>org.test</groupId><artifactId>bar</artifactId><version>2.0</version></dependency>\
    <dependency><groupId>org.parent</groupId><artifactId>ext-parent</artifactId><version>5</version></dependency>\
    </dependencies></dependencyManagement></project>";

  pub const TOOLCHAIN: &str = "<project><groupId>org.tc</groupId><artifactId>tc-parent</artifactId>\
    <version>1.0</version><packaging>pom</packaging><build><pluginManagement><plugins>\
    <plugin><artifactId>maven-compiler-plugin</artifactId><version>3.1</version></plugin>\
    <plugin><artifactId>maven-jar-plugin</artifactId><version>2.4</version></plugin>\
    <plugin><artifactId>maven-javadoc-plugin</artifactId><version>2.9</version></plugin>\
    </plugins></pluginManagement><plugins>\
    <plugin><groupId>org.tc</groupId><artifactId>checker</artifactId><version>2</version></plugin>\
    </plugins></build></project>";
}

#[cfg(test)]
mod tests {
  use super::*;

  mod selection {
    use super::*;

    fn names(kinds: &[ModderKind]) -> Vec<&'static str> {
      kinds.iter().map(|k| k.name()).collect()
    }

    #[test]
    fn empty_selection_is_standard_in_precedence_order() {
      let resolved = resolve_selection(&[]).unwrap();
      assert_eq!(
        names(&resolved),
        vec![
          "version-suffix",
          "bom-realignment",
          "toolchain-realignment",
          "plugin-removal",
          "repo-removal"
        ]
      );
    }

    #[test]
    fn plus_appends_to_standard() {
      let resolved = resolve_selection(&["+property".to_string()]).unwrap();
      assert!(resolved.contains(&ModderKind::Property));
      assert!(resolved.contains(&ModderKind::BomRealignment));
    }

    #[test]
    fn bare_list_replaces_standard() {
      let resolved = resolve_selection(&["minimize,version".to_string()]).unwrap();
      assert_eq!(names(&resolved), vec!["version", "minimize"]);
    }

    #[test]
    fn standard_alias_reincludes_defaults() {
      let resolved = resolve_selection(&["testremoval".to_string(), STANDARD_ALIAS.to_string()]).unwrap();
      assert!(resolved.contains(&ModderKind::TestRemoval));
      assert!(resolved.contains(&ModderKind::RepoRemoval));
    }

    #[test]
    fn unknown_name_is_an_error() {
      assert_eq!(
        resolve_selection(&["bogus".to_string()]),
        Err(ModderError::Unknown("bogus".to_string()))
      );
    }
  }

  #[test]
  fn catalog_names_round_trip() {
    for kind in ModderKind::ALL {
      assert_eq!(kind.name().parse::<ModderKind>().unwrap(), kind);
      assert!(!kind.description().is_empty());
    }
  }

  #[test]
  fn declaration_order_is_precedence() {
    let mut sorted = ModderKind::ALL.to_vec();
    sorted.sort();
    assert_eq!(sorted, ModderKind::ALL.to_vec());
  }
}
