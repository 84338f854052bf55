//! Typed view of a project descriptor.
//!
//! Only the sections the modders rewrite are typed. Everything else rides along
//! as opaque [`XmlNode`]s in the `extra` vectors and is written back untouched.

use crate::coord::{DEFAULT_DEPENDENCY_TYPE, FullKey, ManagementKey, VersionlessKey};

use super::xml::XmlNode;

/// Ordered `<properties>` block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties {
  /// Key/value pairs in document order. Keys are unique.
  entries: Vec<(String, String)>,
}

impl Properties {
  pub fn get(&self, key: &str) -> Option<&str> {
    self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
  }

  pub fn contains(&self, key: &str) -> bool {
    self.get(key).is_some()
  }

  /// Set a property, keeping its position when it already exists.
  ///
  /// Returns the previous value.
  pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> Option<String> {
    let key = key.into();
    let value = value.into();
    match self.entries.iter_mut().find(|(k, _)| *k == key) {
      Some((_, v)) => Some(std::mem::replace(v, value)),
      None => {
        self.entries.push((key, value));
        None
      }
    }
  }

  pub fn remove(&mut self, key: &str) -> Option<String> {
    let idx = self.entries.iter().position(|(k, _)| k == key)?;
    Some(self.entries.remove(idx).1)
  }

  pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
    self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
  }

  pub fn len(&self) -> usize {
    self.entries.len()
  }

  pub fn is_empty(&self) -> bool {
    self.entries.is_empty()
  }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Properties {
  fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
    let mut props = Properties::default();
    for (k, v) in iter {
      props.set(k, v);
    }
    props
  }
}

/// `<parent>` reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Parent {
  pub group_id: String,
  pub artifact_id: String,
  pub version: String,
  /// Dropped when the parent is replaced by the toolchain or a relocation.
  pub relative_path: Option<String>,
}

impl Parent {
  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::new(&self.group_id, &self.artifact_id)
  }

  pub fn key(&self) -> FullKey {
    FullKey::new(&self.group_id, &self.artifact_id, &self.version)
  }
}

impl From<&FullKey> for Parent {
  fn from(key: &FullKey) -> Self {
    Self {
      group_id: key.group_id.clone(),
      artifact_id: key.artifact_id.clone(),
      version: key.version.clone(),
      relative_path: None,
    }
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Exclusion {
  pub group_id: String,
  pub artifact_id: String,
}

/// A `<dependency>` entry, direct or managed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Dependency {
  pub group_id: String,
  pub artifact_id: String,
  /// `None` when the version is inherited from dependencyManagement.
  pub version: Option<String>,
  /// `<type>`; `None` means `jar`.
  pub type_: Option<String>,
  pub classifier: Option<String>,
  pub scope: Option<String>,
  /// Kept as text so expressions like `${optional}` survive.
  pub optional: Option<String>,
  pub exclusions: Vec<Exclusion>,
  /// Unrecognized child elements, written back as read.
  pub extra: Vec<XmlNode>,
}

impl Dependency {
  pub fn new(group_id: impl Into<String>, artifact_id: impl Into<String>, version: Option<&str>) -> Self {
    Self {
      group_id: group_id.into(),
      artifact_id: artifact_id.into(),
      version: version.map(str::to_string),
      ..Default::default()
    }
  }

  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::new(&self.group_id, &self.artifact_id)
  }

  pub fn management_key(&self) -> ManagementKey {
    ManagementKey::new(
      &self.group_id,
      &self.artifact_id,
      self.type_.as_deref(),
      self.classifier.as_deref(),
    )
  }

  pub fn type_or_default(&self) -> &str {
    self.type_.as_deref().unwrap_or(DEFAULT_DEPENDENCY_TYPE)
  }

  /// `<type>pom</type><scope>import</scope>`.
  pub fn is_import(&self) -> bool {
    self.scope.as_deref() == Some("import") && self.type_or_default() == "pom"
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DependencyManagement {
  pub dependencies: Vec<Dependency>,
}

/// A build or pluginManagement `<plugin>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plugin {
  /// `None` means `org.apache.maven.plugins`.
  pub group_id: Option<String>,
  pub artifact_id: String,
  pub version: Option<String>,
  pub dependencies: Vec<Dependency>,
  /// Opaque; only checked for emptiness.
  pub executions: Option<XmlNode>,
  pub configuration: Option<XmlNode>,
  pub extra: Vec<XmlNode>,
}

impl Plugin {
  pub fn new(group_id: Option<&str>, artifact_id: impl Into<String>, version: Option<&str>) -> Self {
    Self {
      group_id: group_id.map(str::to_string),
      artifact_id: artifact_id.into(),
      version: version.map(str::to_string),
      ..Default::default()
    }
  }

  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::plugin(self.group_id.as_deref(), &self.artifact_id)
  }

  /// True when the entry holds something besides its coordinate.
  pub fn has_customization(&self) -> bool {
    !self.dependencies.is_empty()
      || self.executions.as_ref().is_some_and(|e| !e.is_empty())
      || self.configuration.is_some()
      || !self.extra.is_empty()
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PluginManagement {
  pub plugins: Vec<Plugin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Extension {
  pub group_id: String,
  pub artifact_id: String,
  pub version: Option<String>,
}

impl Extension {
  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::new(&self.group_id, &self.artifact_id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Build {
  /// Only honored at the project level; profile builds carry them untouched.
  pub extensions: Vec<Extension>,
  pub plugin_management: Option<PluginManagement>,
  pub plugins: Vec<Plugin>,
  pub extra: Vec<XmlNode>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReportPlugin {
  pub group_id: Option<String>,
  pub artifact_id: String,
  pub version: Option<String>,
  pub extra: Vec<XmlNode>,
}

impl ReportPlugin {
  pub fn versionless(&self) -> VersionlessKey {
    VersionlessKey::plugin(self.group_id.as_deref(), &self.artifact_id)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Reporting {
  pub plugins: Vec<ReportPlugin>,
  pub extra: Vec<XmlNode>,
}

/// Sections shared by the project root and each `<profile>`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ModelBase {
  pub properties: Properties,
  pub dependency_management: Option<DependencyManagement>,
  pub dependencies: Vec<Dependency>,
  /// `<repositories>` is only ever kept or dropped whole, so it stays untyped.
  pub repositories: Option<XmlNode>,
  pub plugin_repositories: Option<XmlNode>,
  pub build: Option<Build>,
  pub reporting: Option<Reporting>,
}

impl ModelBase {
  pub fn managed_dependencies(&self) -> &[Dependency] {
    self
      .dependency_management
      .as_ref()
      .map(|dm| dm.dependencies.as_slice())
      .unwrap_or_default()
  }

  pub fn build_mut(&mut self) -> &mut Build {
    self.build.get_or_insert_with(Build::default)
  }

  pub fn dependency_management_mut(&mut self) -> &mut DependencyManagement {
    self.dependency_management.get_or_insert_with(DependencyManagement::default)
  }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Profile {
  pub id: Option<String>,
  pub activation: Option<XmlNode>,
  pub base: ModelBase,
  pub extra: Vec<XmlNode>,
}

/// The whole descriptor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Model {
  /// Attributes of the `<project>` element (namespaces, schema location).
  pub attributes: Vec<(String, String)>,
  pub model_version: Option<String>,
  pub parent: Option<Parent>,
  pub group_id: Option<String>,
  pub artifact_id: String,
  pub version: Option<String>,
  pub packaging: Option<String>,
  pub base: ModelBase,
  pub profiles: Vec<Profile>,
  pub extra: Vec<XmlNode>,
}

impl Model {
  /// The project section followed by every profile section.
  pub fn sections(&self) -> impl Iterator<Item = &ModelBase> {
    std::iter::once(&self.base).chain(self.profiles.iter().map(|p| &p.base))
  }

  pub fn sections_mut(&mut self) -> impl Iterator<Item = &mut ModelBase> {
    std::iter::once(&mut self.base).chain(self.profiles.iter_mut().map(|p| &mut p.base))
  }

  pub fn profile_mut(&mut self, id: &str) -> Option<&mut Profile> {
    self.profiles.iter_mut().find(|p| p.id.as_deref() == Some(id))
  }

  /// Remove top-level elements by name. Returns true when anything was removed.
  pub fn remove_extra(&mut self, names: &[&str]) -> bool {
    let before = self.extra.len();
    self.extra.retain(|node| !names.contains(&node.name.as_str()));
    before != self.extra.len()
  }

  pub fn extra_mut(&mut self, name: &str) -> Option<&mut XmlNode> {
    self.extra.iter_mut().find(|node| node.name == name)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  mod properties {
    use super::*;

    #[test]
    fn set_keeps_position() {
      let mut props: Properties = [("a", "1"), ("b", "2")].into_iter().collect();
      assert_eq!(props.set("a", "3"), Some("1".to_string()));
      let keys: Vec<_> = props.iter().map(|(k, _)| k).collect();
      assert_eq!(keys, vec!["a", "b"]);
      assert_eq!(props.get("a"), Some("3"));
    }

    #[test]
    fn remove_returns_value() {
      let mut props: Properties = [("a", "1")].into_iter().collect();
      assert_eq!(props.remove("a"), Some("1".to_string()));
      assert!(props.is_empty());
    }
  }

  mod plugin {
    use super::*;

    #[test]
    fn bare_plugin_has_no_customization() {
      let plugin = Plugin::new(None, "maven-jar-plugin", Some("2.0"));
      assert!(!plugin.has_customization());
    }

    #[test]
    fn configuration_counts_as_customization() {
      let mut plugin = Plugin::new(None, "maven-jar-plugin", None);
      plugin.configuration = Some(XmlNode::new("configuration"));
      assert!(plugin.has_customization());
    }
  }

  #[test]
  fn dependency_import_detection() {
    let mut dep = Dependency::new("g", "bom", Some("1"));
    dep.scope = Some("import".into());
    assert!(!dep.is_import());
    dep.type_ = Some("pom".into());
    assert!(dep.is_import());
  }
}
