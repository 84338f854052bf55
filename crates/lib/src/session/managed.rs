//! Managed-info registry: everything loaded from BOMs and the toolchain.
//!
//! All tables are append-only for the length of a run. Version entries are
//! first-writer-wins, so the BOM listed first decides a contested version.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::coord::{FullKey, VersionlessKey};
use crate::pom::{Plugin, Properties};
use crate::project::Project;

use super::Source;
use super::mappings::PropertyMappings;
use super::relocations::Relocations;

/// BOM property holding relocation directives.
pub const RELOCATIONS_PROPERTY: &str = "relocations";

/// BOM property holding property-mapping directives.
pub const MAPPING_PROPERTY: &str = "mapping";

/// Governance data loaded before any project is touched.
#[derive(Debug, Clone, Default)]
pub struct ManagedInfo {
  /// Coordinates of the loaded BOMs, in the order they were supplied.
  bom_coordinates: Vec<FullKey>,
  /// Each BOM's properties, kept for `@expr@` mapping resolution.
  bom_properties: Vec<(PathBuf, Properties)>,
  /// Merged version map across all BOMs.
  versions: BTreeMap<VersionlessKey, String>,
  /// What each BOM declared, including entries another BOM shadowed.
  versions_by_bom: BTreeMap<PathBuf, BTreeMap<VersionlessKey, String>>,
  /// The toolchain's pluginManagement entries.
  managed_plugins: BTreeMap<VersionlessKey, Plugin>,
  /// The toolchain's build plugins, added at the top of each lineage.
  injected_plugins: BTreeMap<VersionlessKey, Plugin>,
  toolchain: Option<FullKey>,
  toolchain_properties: Properties,
  /// Versionless keys of every project in the batch.
  current_projects: BTreeSet<VersionlessKey>,
  pub relocations: Relocations,
  pub mappings: PropertyMappings,
}

impl ManagedInfo {
  /// Register a BOM.
  ///
  /// Flattens its dependencyManagement into the version map (interpolated
  /// against the BOM's own properties), records its coordinate, and merges
  /// its `relocations` and `mapping` properties.
  pub fn add_bom(&mut self, bom_file: &Path, bom: &Project) {
    let key = bom.key().clone();
    info!(bom = %key, path = %bom_file.display(), "loading BOM");

    let interp = bom.interpolator();
    let mut contributed = BTreeMap::new();
    for dep in bom.managed_dependencies() {
      let mut dep = dep.clone();
      interp.interpolate_dependency(&mut dep);
      let Some(version) = dep.version.clone() else {
        continue;
      };
      let versionless = dep.versionless();
      contributed.entry(versionless.clone()).or_insert_with(|| version.clone());
      if !self.versions.contains_key(&versionless) {
        self.versions.insert(versionless, version);
      }
    }

    let own = key.versionless();
    contributed.entry(own.clone()).or_insert_with(|| key.version.clone());
    self.versions.entry(own).or_insert_with(|| key.version.clone());

    debug!(bom = %key, entries = contributed.len(), "flattened BOM dependencyManagement");
    self.versions_by_bom.insert(bom_file.to_path_buf(), contributed);

    if !self.bom_coordinates.contains(&key) {
      self.bom_coordinates.push(key);
    }

    let source = Source::Bom(bom_file.to_path_buf());
    let props = bom.model().base.properties.clone();
    if let Some(text) = props.get(RELOCATIONS_PROPERTY) {
      let added = self.relocations.add_text(&source, text);
      debug!(bom = %bom_file.display(), added, "merged BOM relocations");
    }
    if let Some(text) = props.get(MAPPING_PROPERTY) {
      self.mappings.add_text(&source, text);
    }
    self.mappings.resolve_pending(&props);
    self.bom_properties.push((bom_file.to_path_buf(), props));
  }

  /// Register the toolchain descriptor.
  ///
  /// pluginManagement entries become managed plugins. Versioned build plugins
  /// that are not already managed become injected plugins.
  pub fn set_toolchain(&mut self, toolchain_file: &Path, toolchain: &Project) {
    let key = toolchain.key().clone();
    info!(toolchain = %key, path = %toolchain_file.display(), "loading toolchain");

    for plugin in toolchain.managed_plugins() {
      self.managed_plugins.entry(plugin.versionless()).or_insert_with(|| plugin.clone());
    }
    for plugin in toolchain.build_plugins() {
      let vk = plugin.versionless();
      if plugin.version.is_some() && !self.managed_plugins.contains_key(&vk) {
        self.injected_plugins.entry(vk).or_insert_with(|| plugin.clone());
      }
    }
    self.toolchain_properties = toolchain.model().base.properties.clone();
    self.toolchain = Some(key);
  }

  /// Re-run expression resolution against every BOM, in load order.
  ///
  /// Called after configuration mappings are added so they resolve the same
  /// way BOM-embedded ones do.
  pub fn resolve_mappings(&mut self) {
    for (_, props) in &self.bom_properties {
      self.mappings.resolve_pending(props);
    }
  }

  /// Register the keys of every project in the batch.
  pub fn set_current_projects(&mut self, keys: impl IntoIterator<Item = VersionlessKey>) {
    self.current_projects.extend(keys);
  }

  pub fn lookup_version(&self, key: &VersionlessKey) -> Option<&str> {
    self.versions.get(key).map(String::as_str)
  }

  pub fn lookup_managed_plugin(&self, key: &VersionlessKey) -> Option<&Plugin> {
    self.managed_plugins.get(key)
  }

  pub fn is_current_project(&self, key: &VersionlessKey) -> bool {
    self.current_projects.contains(key)
  }

  pub fn is_bom(&self, key: &VersionlessKey) -> bool {
    self.bom_coordinates.iter().any(|b| b.versionless() == *key)
  }

  pub fn bom_coordinates(&self) -> &[FullKey] {
    &self.bom_coordinates
  }

  pub fn versions(&self) -> &BTreeMap<VersionlessKey, String> {
    &self.versions
  }

  pub fn versions_by_bom(&self) -> &BTreeMap<PathBuf, BTreeMap<VersionlessKey, String>> {
    &self.versions_by_bom
  }

  pub fn managed_plugins(&self) -> &BTreeMap<VersionlessKey, Plugin> {
    &self.managed_plugins
  }

  pub fn injected_plugins(&self) -> &BTreeMap<VersionlessKey, Plugin> {
    &self.injected_plugins
  }

  pub fn toolchain(&self) -> Option<&FullKey> {
    self.toolchain.as_ref()
  }

  pub fn is_toolchain(&self, key: &VersionlessKey) -> bool {
    self.toolchain.as_ref().is_some_and(|tc| tc.versionless() == *key)
  }

  pub fn toolchain_properties(&self) -> &Properties {
    &self.toolchain_properties
  }
}
