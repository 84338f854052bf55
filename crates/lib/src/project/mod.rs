//! The project wrapper handed to every modder.
//!
//! A [`Project`] owns one descriptor exclusively and caches its resolved
//! coordinate. Modders that touch groupId, artifactId, version or parent must
//! call [`Project::refresh_key`] before returning.

mod graph;
mod interpolate;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use graph::{AncestryGraph, GraphError};
pub use interpolate::{Interpolator, is_expression};

use crate::coord::{FullKey, VersionlessKey};
use crate::pom::{self, Dependency, Model, Parent, Plugin, PomError, ReportPlugin};

#[derive(Debug, Error)]
pub enum ProjectError {
  #[error(transparent)]
  Pom(#[from] PomError),

  /// Neither the project nor its parent declares a groupId.
  #[error("{} declares no groupId and has no parent", pom.display())]
  MissingGroupId { pom: PathBuf },

  /// Neither the project nor its parent declares a version.
  #[error("{} declares no version and has no parent", pom.display())]
  MissingVersion { pom: PathBuf },
}

#[derive(Debug, Clone)]
pub struct Project {
  pom: PathBuf,
  model: Model,
  key: FullKey,
}

impl Project {
  pub fn new(pom: impl Into<PathBuf>, model: Model) -> Result<Self, ProjectError> {
    let pom = pom.into();
    let key = resolve_key(&pom, &model)?;
    Ok(Self { pom, model, key })
  }

  /// Load a descriptor from disk.
  pub fn load(path: &Path) -> Result<Self, ProjectError> {
    let model = pom::read_pom(path)?;
    Self::new(path, model)
  }

  /// Location the descriptor was loaded from.
  pub fn pom(&self) -> &Path {
    &self.pom
  }

  pub fn key(&self) -> &FullKey {
    &self.key
  }

  pub fn versionless_key(&self) -> VersionlessKey {
    self.key.versionless()
  }

  pub fn model(&self) -> &Model {
    &self.model
  }

  pub fn model_mut(&mut self) -> &mut Model {
    &mut self.model
  }

  pub fn parent(&self) -> Option<&Parent> {
    self.model.parent.as_ref()
  }

  pub fn dependencies(&self) -> &[Dependency] {
    &self.model.base.dependencies
  }

  pub fn managed_dependencies(&self) -> &[Dependency] {
    self.model.base.managed_dependencies()
  }

  pub fn build_plugins(&self) -> &[Plugin] {
    self
      .model
      .base
      .build
      .as_ref()
      .map(|b| b.plugins.as_slice())
      .unwrap_or_default()
  }

  pub fn managed_plugins(&self) -> &[Plugin] {
    self
      .model
      .base
      .build
      .as_ref()
      .and_then(|b| b.plugin_management.as_ref())
      .map(|pm| pm.plugins.as_slice())
      .unwrap_or_default()
  }

  pub fn report_plugins(&self) -> &[ReportPlugin] {
    self
      .model
      .base
      .reporting
      .as_ref()
      .map(|r| r.plugins.as_slice())
      .unwrap_or_default()
  }

  /// Property lookup on the project section.
  pub fn property(&self, key: &str) -> Option<&str> {
    self.model.base.properties.get(key)
  }

  pub fn interpolator(&self) -> Interpolator {
    Interpolator::for_project(self)
  }

  /// Recompute the cached coordinate after an edit.
  ///
  /// Returns true when the coordinate changed.
  pub fn refresh_key(&mut self) -> Result<bool, ProjectError> {
    let key = resolve_key(&self.pom, &self.model)?;
    let changed = key != self.key;
    self.key = key;
    Ok(changed)
  }
}

fn resolve_key(pom: &Path, model: &Model) -> Result<FullKey, ProjectError> {
  let parent = model.parent.as_ref();
  let group_id = model
    .group_id
    .as_deref()
    .or(parent.map(|p| p.group_id.as_str()))
    .ok_or_else(|| ProjectError::MissingGroupId { pom: pom.to_path_buf() })?;
  let version = model
    .version
    .as_deref()
    .or(parent.map(|p| p.version.as_str()))
    .ok_or_else(|| ProjectError::MissingVersion { pom: pom.to_path_buf() })?;
  Ok(FullKey::new(group_id, &model.artifact_id, version))
}
