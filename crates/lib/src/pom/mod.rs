//! Project descriptor (POM) reading and writing.
//!
//! A POM is read into an [`XmlNode`] tree with quick-xml, then lifted into a
//! typed [`Model`]. Writing reverses the process, putting elements back into
//! schema order and normalizing the `<project>` namespace.
//!
//! # Relocated output
//!
//! When output is relocated, a descriptor is written to a repository layout
//! under a base directory instead of its source location:
//!
//! ```text
//! {base}/org/example/app/1.0/app-1.0.pom
//! ```

mod convert;
mod model;
mod xml;

use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, trace};

pub use model::{
  Build, Dependency, DependencyManagement, Exclusion, Extension, Model, ModelBase, Parent, Plugin, PluginManagement,
  Profile, Properties, ReportPlugin, Reporting,
};
pub use xml::XmlNode;

use crate::coord::FullKey;

/// Default POM namespace.
pub const POM_NAMESPACE: &str = "http://maven.apache.org/POM/4.0.0";

/// Schema location written alongside the namespace.
pub const POM_SCHEMA_LOCATION: &str = "http://maven.apache.org/POM/4.0.0 http://maven.apache.org/xsd/maven-4.0.0.xsd";

const XSI_NAMESPACE: &str = "http://www.w3.org/2001/XMLSchema-instance";

/// Value written for properties that would otherwise be empty.
pub const EMPTY_PROPERTY_PLACEHOLDER: &str = "NOT_SET";

/// Prefix of the marker comment added to every written descriptor.
pub const MODIFIED_MARKER: &str = "Modified by pomalign";

/// Errors raised while reading or writing descriptors.
#[derive(Debug, Error)]
pub enum PomError {
  /// The document is not well-formed XML.
  #[error("malformed XML at byte {position}: {message}")]
  Xml { position: u64, message: String },

  /// The document has no root element.
  #[error("document has no root element")]
  EmptyDocument,

  /// The root element is not `<project>`.
  #[error("expected <project> root element, found <{0}>")]
  NotAProject(String),

  /// A required element is absent.
  #[error("missing required element <{0}>")]
  MissingElement(&'static str),

  #[error("failed to serialize descriptor: {0}")]
  Serialize(String),

  #[error("failed to read {}: {source}", path.display())]
  Read { path: PathBuf, source: std::io::Error },

  #[error("failed to write {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },
}

/// Parse descriptor text into a model.
pub fn parse_str(xml: &str) -> Result<Model, PomError> {
  convert::model_from_node(XmlNode::parse(xml)?)
}

/// Read and parse a descriptor file.
pub fn read_pom(path: &Path) -> Result<Model, PomError> {
  let content = fs::read_to_string(path).map_err(|source| PomError::Read {
    path: path.to_path_buf(),
    source,
  })?;
  let model = parse_str(&content)?;
  trace!(path = %path.display(), artifact = %model.artifact_id, "read descriptor");
  Ok(model)
}

/// Render a model as descriptor text.
///
/// The namespace and schema location are ensured on `<project>` and empty
/// property values are replaced with [`EMPTY_PROPERTY_PLACEHOLDER`].
pub fn to_string(model: &Model) -> Result<String, PomError> {
  let mut normalized = model.clone();
  for section in normalized.sections_mut() {
    let empty: Vec<String> = section
      .properties
      .iter()
      .filter(|(_, v)| v.trim().is_empty())
      .map(|(k, _)| k.to_string())
      .collect();
    for key in empty {
      section.properties.set(key, EMPTY_PROPERTY_PLACEHOLDER);
    }
  }

  let mut root = convert::model_to_node(&normalized);
  root.set_attribute("xmlns", POM_NAMESPACE);
  if root.attribute("xsi:schemaLocation").is_none() {
    root.set_attribute("xmlns:xsi", XSI_NAMESPACE);
    root.set_attribute("xsi:schemaLocation", POM_SCHEMA_LOCATION);
  }
  root.to_document(Some(MODIFIED_MARKER))
}

/// Write a model to `path`, creating parent directories as needed.
pub fn write_pom(model: &Model, path: &Path) -> Result<(), PomError> {
  let content = to_string(model)?;
  let write_err = |source| PomError::Write {
    path: path.to_path_buf(),
    source,
  };
  if let Some(dir) = path.parent() {
    fs::create_dir_all(dir).map_err(write_err)?;
  }
  fs::write(path, content).map_err(write_err)?;
  debug!(path = %path.display(), "wrote descriptor");
  Ok(())
}

/// Repository-layout location for `key` under `base`.
pub fn relocated_path(base: &Path, key: &FullKey) -> PathBuf {
  let mut path = base.to_path_buf();
  for segment in key.group_id.split('.') {
    path.push(segment);
  }
  path
    .join(&key.artifact_id)
    .join(&key.version)
    .join(format!("{}-{}.pom", key.artifact_id, key.version))
}

/// Write `model` to its repository-layout location, delete `original`, and
/// prune directories left empty between `original` and `stop_at`.
///
/// Returns the new location.
pub fn write_relocated(
  model: &Model,
  key: &FullKey,
  original: &Path,
  base: &Path,
  stop_at: &Path,
) -> Result<PathBuf, PomError> {
  let target = relocated_path(base, key);
  write_pom(model, &target)?;

  if target != original && original.exists() {
    fs::remove_file(original).map_err(|source| PomError::Write {
      path: original.to_path_buf(),
      source,
    })?;
    prune_empty_dirs(original, stop_at);
  }
  Ok(target)
}

/// Remove now-empty ancestors of `file`, never touching `stop_at` or anything above it.
fn prune_empty_dirs(file: &Path, stop_at: &Path) {
  let mut dir = file.parent();
  while let Some(current) = dir {
    if current == stop_at || !current.starts_with(stop_at) {
      break;
    }
    let is_empty = fs::read_dir(current).map(|mut it| it.next().is_none()).unwrap_or(false);
    if !is_empty || fs::remove_dir(current).is_err() {
      break;
    }
    trace!(dir = %current.display(), "pruned empty directory");
    dir = current.parent();
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  const SIMPLE: &str = r#"<?xml version="1.0"?>
<project>
  <modelVersion>4.0.0</modelVersion>
  <groupId>org.test</groupId>
  <artifactId>app</artifactId>
  <version>1.0</version>
  <properties>
    <empty></empty>
    <kept>value</kept>
  </properties>
</project>"#;

  mod writing {
    use super::*;

    #[test]
    fn adds_namespace_and_marker() {
      let out = to_string(&parse_str(SIMPLE).unwrap()).unwrap();
      assert!(out.contains(&format!("xmlns=\"{}\"", POM_NAMESPACE)));
      assert!(out.contains("xsi:schemaLocation"));
      assert!(out.contains(MODIFIED_MARKER));
    }

    #[test]
    fn fills_empty_properties() {
      let out = to_string(&parse_str(SIMPLE).unwrap()).unwrap();
      assert!(out.contains(&format!("<empty>{}</empty>", EMPTY_PROPERTY_PLACEHOLDER)));
      assert!(out.contains("<kept>value</kept>"));
    }

    #[test]
    fn output_reads_back_equal() {
      let model = parse_str(SIMPLE).unwrap();
      let reread = parse_str(&to_string(&model).unwrap()).unwrap();
      assert_eq!(reread.artifact_id, model.artifact_id);
      assert_eq!(reread.base.properties.get("kept"), Some("value"));
    }
  }

  mod relocation {
    use super::*;

    #[test]
    fn repository_layout_path() {
      let path = relocated_path(Path::new("/repo"), &FullKey::new("org.test", "app", "1.0"));
      assert_eq!(path, PathBuf::from("/repo/org/test/app/1.0/app-1.0.pom"));
    }

    #[test]
    fn moves_file_and_prunes_empty_dirs() {
      let temp = TempDir::new().unwrap();
      let src_root = temp.path().join("src");
      let original = src_root.join("nested/deeper/pom.xml");
      fs::create_dir_all(original.parent().unwrap()).unwrap();
      fs::write(&original, SIMPLE).unwrap();
      fs::write(src_root.join("keep.txt"), "x").unwrap();

      let model = parse_str(SIMPLE).unwrap();
      let key = FullKey::new("org.test", "app", "1.0");
      let out_base = temp.path().join("out");
      let target = write_relocated(&model, &key, &original, &out_base, &src_root).unwrap();

      assert!(target.exists());
      assert!(!original.exists());
      assert!(!src_root.join("nested").exists());
      assert!(src_root.exists());
    }
  }

  #[test]
  fn read_missing_file_fails() {
    let temp = TempDir::new().unwrap();
    let result = read_pom(&temp.path().join("absent.xml"));
    assert!(matches!(result, Err(PomError::Read { .. })));
  }
}
