//! Change and missing-info registry.
//!
//! Records every mutation performed and every resolution gap found during a
//! run. Entries are only ever added: a gap recorded early stays recorded even
//! if a later source could have filled it.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Serialize;

use crate::coord::{FullKey, ManagementKey, VersionlessKey};
use crate::pom::{Dependency, Plugin};

/// Immutable copy of a dependency taken for the modification log.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub struct DependencySnapshot {
  group_id: String,
  artifact_id: String,
  version: Option<String>,
  type_: Option<String>,
  classifier: Option<String>,
  scope: Option<String>,
}

impl DependencySnapshot {
  pub fn group_id(&self) -> &str {
    &self.group_id
  }

  pub fn artifact_id(&self) -> &str {
    &self.artifact_id
  }

  pub fn version(&self) -> Option<&str> {
    self.version.as_deref()
  }

  pub fn scope(&self) -> Option<&str> {
    self.scope.as_deref()
  }

  pub fn management_key(&self) -> ManagementKey {
    ManagementKey::new(
      &self.group_id,
      &self.artifact_id,
      self.type_.as_deref(),
      self.classifier.as_deref(),
    )
  }
}

impl From<&Dependency> for DependencySnapshot {
  fn from(dep: &Dependency) -> Self {
    Self {
      group_id: dep.group_id.clone(),
      artifact_id: dep.artifact_id.clone(),
      version: dep.version.clone(),
      type_: dep.type_.clone(),
      classifier: dep.classifier.clone(),
      scope: dep.scope.clone(),
    }
  }
}

impl fmt::Display for DependencySnapshot {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(
      f,
      "{}:{}",
      self.management_key(),
      self.version.as_deref().unwrap_or("(managed)")
    )?;
    if let Some(scope) = &self.scope {
      write!(f, " [{}]", scope)?;
    }
    Ok(())
  }
}

/// One before/after pair in the modification log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DependencyChange {
  pub pom: PathBuf,
  pub before: DependencySnapshot,
  /// `None` when the dependency was removed outright.
  pub after: Option<DependencySnapshot>,
}

#[derive(Debug, Clone, Default)]
pub struct ChangeInfo {
  /// POMs referencing each coordinate that has no managed version.
  missing_by_coord: BTreeMap<VersionlessKey, BTreeSet<PathBuf>>,
  missing_by_pom: BTreeMap<PathBuf, BTreeSet<VersionlessKey>>,
  /// Distinct dependency declarations behind each missing coordinate. The
  /// capture descriptor is built from these.
  missing_dependencies: BTreeMap<VersionlessKey, Vec<Dependency>>,
  /// First unresolved parent per POM.
  missing_parents: BTreeMap<PathBuf, FullKey>,
  unmanaged_by_pom: BTreeMap<PathBuf, BTreeSet<VersionlessKey>>,
  unmanaged_plugins: BTreeMap<VersionlessKey, Vec<Plugin>>,
  /// Relocations actually applied, per POM.
  relocations_by_pom: BTreeMap<PathBuf, BTreeMap<VersionlessKey, FullKey>>,
  /// Before/after pairs, keyed by the original coordinate.
  modifications: BTreeMap<VersionlessKey, Vec<DependencyChange>>,
  /// Free-text audit lines per POM, in the order they happened.
  activity: BTreeMap<PathBuf, Vec<String>>,
  /// Managed plugins whose versions were stripped below each in-batch parent.
  child_plugin_refs: BTreeMap<VersionlessKey, BTreeSet<VersionlessKey>>,
}

impl ChangeInfo {
  /// Record a dependency whose version no BOM supplies.
  pub fn add_missing_dependency(&mut self, pom: &Path, dep: &Dependency) {
    let key = dep.versionless();
    self.missing_by_coord.entry(key.clone()).or_default().insert(pom.to_path_buf());
    self.missing_by_pom.entry(pom.to_path_buf()).or_default().insert(key.clone());
    let records = self.missing_dependencies.entry(key).or_default();
    if !records.contains(dep) {
      records.push(dep.clone());
    }
  }

  /// Record a project whose parent version could not be resolved.
  pub fn add_missing_parent(&mut self, pom: &Path, parent: FullKey) {
    self.missing_parents.entry(pom.to_path_buf()).or_insert(parent);
  }

  /// Record a plugin the toolchain does not manage.
  pub fn add_unmanaged_plugin(&mut self, pom: &Path, plugin: &Plugin) {
    let key = plugin.versionless();
    self.unmanaged_by_pom.entry(pom.to_path_buf()).or_default().insert(key.clone());
    let records = self.unmanaged_plugins.entry(key).or_default();
    if !records.contains(plugin) {
      records.push(plugin.clone());
    }
  }

  pub fn add_relocation(&mut self, pom: &Path, old: VersionlessKey, new: FullKey) {
    self
      .relocations_by_pom
      .entry(pom.to_path_buf())
      .or_default()
      .entry(old)
      .or_insert(new);
  }

  pub fn add_modification(&mut self, pom: &Path, before: &Dependency, after: Option<&Dependency>) {
    let before = DependencySnapshot::from(before);
    let change = DependencyChange {
      pom: pom.to_path_buf(),
      after: after.map(DependencySnapshot::from),
      before,
    };
    let key = VersionlessKey::new(change.before.group_id(), change.before.artifact_id());
    self.modifications.entry(key).or_default().push(change);
  }

  /// Append a line to the per-POM activity log.
  pub fn log(&mut self, pom: &Path, line: impl Into<String>) {
    self.activity.entry(pom.to_path_buf()).or_default().push(line.into());
  }

  /// Note that a descendant of `ancestor` references `plugin` without a version.
  pub fn add_child_plugin_ref(&mut self, ancestor: VersionlessKey, plugin: VersionlessKey) {
    self.child_plugin_refs.entry(ancestor).or_default().insert(plugin);
  }

  pub fn child_plugin_refs(&self, ancestor: &VersionlessKey) -> BTreeSet<VersionlessKey> {
    self.child_plugin_refs.get(ancestor).cloned().unwrap_or_default()
  }

  pub fn missing_by_coord(&self) -> &BTreeMap<VersionlessKey, BTreeSet<PathBuf>> {
    &self.missing_by_coord
  }

  pub fn missing_by_pom(&self) -> &BTreeMap<PathBuf, BTreeSet<VersionlessKey>> {
    &self.missing_by_pom
  }

  pub fn missing_dependencies(&self) -> &BTreeMap<VersionlessKey, Vec<Dependency>> {
    &self.missing_dependencies
  }

  pub fn missing_parents(&self) -> &BTreeMap<PathBuf, FullKey> {
    &self.missing_parents
  }

  pub fn unmanaged_by_pom(&self) -> &BTreeMap<PathBuf, BTreeSet<VersionlessKey>> {
    &self.unmanaged_by_pom
  }

  pub fn unmanaged_plugins(&self) -> &BTreeMap<VersionlessKey, Vec<Plugin>> {
    &self.unmanaged_plugins
  }

  pub fn relocations_by_pom(&self) -> &BTreeMap<PathBuf, BTreeMap<VersionlessKey, FullKey>> {
    &self.relocations_by_pom
  }

  pub fn modifications(&self) -> &BTreeMap<VersionlessKey, Vec<DependencyChange>> {
    &self.modifications
  }

  pub fn activity(&self) -> &BTreeMap<PathBuf, Vec<String>> {
    &self.activity
  }

  pub fn activity_for(&self, pom: &Path) -> &[String] {
    self.activity.get(pom).map(Vec::as_slice).unwrap_or_default()
  }

  /// True when nothing unresolved was recorded.
  pub fn is_complete(&self) -> bool {
    self.missing_dependencies.is_empty() && self.missing_parents.is_empty() && self.unmanaged_plugins.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn missing_dependency_is_indexed_both_ways() {
    let mut changes = ChangeInfo::default();
    let dep = Dependency::new("grp", "art", Some("1"));
    changes.add_missing_dependency(Path::new("a/pom.xml"), &dep);
    changes.add_missing_dependency(Path::new("a/pom.xml"), &dep);
    changes.add_missing_dependency(Path::new("b/pom.xml"), &dep);

    let key = VersionlessKey::new("grp", "art");
    assert_eq!(changes.missing_dependencies().len(), 1);
    assert_eq!(changes.missing_dependencies()[&key].len(), 1);
    assert_eq!(changes.missing_by_coord()[&key].len(), 2);
    assert!(changes.missing_by_pom()[Path::new("b/pom.xml")].contains(&key));
    assert!(!changes.is_complete());
  }

  #[test]
  fn modification_keeps_snapshot_independent_of_edits() {
    let mut changes = ChangeInfo::default();
    let mut dep = Dependency::new("g", "a", Some("1"));
    let before = dep.clone();
    dep.version = Some("2".into());
    changes.add_modification(Path::new("pom.xml"), &before, Some(&dep));
    dep.version = Some("3".into());

    let change = &changes.modifications()[&VersionlessKey::new("g", "a")][0];
    assert_eq!(change.before.version(), Some("1"));
    assert_eq!(change.after.as_ref().unwrap().version(), Some("2"));
    assert_eq!(change.before.to_string(), "g:a:jar:1");
  }

  #[test]
  fn activity_log_is_ordered() {
    let mut changes = ChangeInfo::default();
    changes.log(Path::new("p"), "first");
    changes.log(Path::new("p"), "second");
    assert_eq!(changes.activity_for(Path::new("p")), ["first", "second"]);
    assert!(changes.activity_for(Path::new("other")).is_empty());
  }
}
