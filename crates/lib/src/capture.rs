//! Missing-info capture.
//!
//! Turns what the change registry recorded as unresolved into a standalone
//! descriptor: a dependencyManagement stub for missing dependency versions
//! and a pluginManagement stub for unmanaged plugins. Operators fold it into
//! their BOM or toolchain and re-run.

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::path::Path;
use std::time::SystemTime;

use tracing::info;

use crate::coord::{ManagementKey, VersionlessKey};
use crate::pom::{self, Build, Dependency, DependencyManagement, Model, Plugin, PluginManagement, PomError};
use crate::session::ChangeInfo;

pub const CAPTURE_GROUP_ID: &str = "pomalign";
pub const CAPTURE_ARTIFACT_ID: &str = "pomalign-missing-capture";

/// Capture version for `time`, formatted `yyyyMMdd.HHmm` in UTC.
pub fn capture_version(time: SystemTime) -> String {
  // "2026-10-17T09:05:33Z"
  let stamp = humantime::format_rfc3339_seconds(time).to_string();
  let digits: String = stamp.chars().filter(char::is_ascii_digit).collect();
  format!("{}.{}", &digits[..8], &digits[8..12])
}

/// Build the capture descriptor, or `None` when nothing is missing.
pub fn build_capture(changes: &ChangeInfo, version: &str) -> Option<Model> {
  let dependencies = capture_dependencies(changes.missing_dependencies());
  let plugins = capture_plugins(changes.unmanaged_plugins());
  if dependencies.is_empty() && plugins.is_empty() {
    return None;
  }

  let mut model = Model {
    model_version: Some("4.0.0".to_string()),
    group_id: Some(CAPTURE_GROUP_ID.to_string()),
    artifact_id: CAPTURE_ARTIFACT_ID.to_string(),
    version: Some(version.to_string()),
    packaging: Some("pom".to_string()),
    ..Default::default()
  };
  if !dependencies.is_empty() {
    model.base.dependency_management = Some(DependencyManagement { dependencies });
  }
  if !plugins.is_empty() {
    model.base.build = Some(Build {
      plugin_management: Some(PluginManagement { plugins }),
      ..Default::default()
    });
  }
  Some(model)
}

/// Build and write the capture descriptor. Returns false when there was nothing to write.
pub fn write_capture(changes: &ChangeInfo, path: &Path, version: &str) -> Result<bool, PomError> {
  let Some(model) = build_capture(changes, version) else {
    return Ok(false);
  };
  pom::write_pom(&model, path)?;
  info!(
    path = %path.display(),
    dependencies = model.base.managed_dependencies().len(),
    "wrote capture descriptor"
  );
  Ok(true)
}

fn capture_dependencies(missing: &BTreeMap<VersionlessKey, Vec<Dependency>>) -> Vec<Dependency> {
  let mut groups: BTreeMap<ManagementKey, Vec<&Dependency>> = BTreeMap::new();
  for dep in missing.values().flatten() {
    groups.entry(dep.management_key()).or_default().push(dep);
  }

  let mut selected: Vec<Dependency> = groups
    .into_values()
    .filter_map(|group| {
      group
        .into_iter()
        .min_by(|a, b| compare_versions(a.version.as_deref(), b.version.as_deref()))
        .cloned()
    })
    .map(|mut dep| {
      // Scope belongs to the consumer, not the managed entry.
      dep.scope = None;
      dep
    })
    .collect();
  selected.sort_by(|a, b| a.artifact_id.cmp(&b.artifact_id));
  selected
}

fn capture_plugins(unmanaged: &BTreeMap<VersionlessKey, Vec<Plugin>>) -> Vec<Plugin> {
  let mut selected: Vec<Plugin> = unmanaged
    .values()
    .filter_map(|group| {
      group
        .iter()
        .min_by(|a, b| compare_versions(a.version.as_deref(), b.version.as_deref()))
        .cloned()
    })
    .collect();
  selected.sort_by(|a, b| a.artifact_id.cmp(&b.artifact_id));
  selected
}

/// Order versions segment by segment. Missing or empty versions sort first,
/// numeric segments compare numerically and rank above textual ones.
pub fn compare_versions(a: Option<&str>, b: Option<&str>) -> Ordering {
  let a = a.map(str::trim).filter(|v| !v.is_empty());
  let b = b.map(str::trim).filter(|v| !v.is_empty());
  match (a, b) {
    (None, None) => Ordering::Equal,
    (None, Some(_)) => Ordering::Less,
    (Some(_), None) => Ordering::Greater,
    (Some(a), Some(b)) => {
      let mut left = a.split(['.', '-']);
      let mut right = b.split(['.', '-']);
      loop {
        match (left.next(), right.next()) {
          (None, None) => return Ordering::Equal,
          (None, Some(_)) => return Ordering::Less,
          (Some(_), None) => return Ordering::Greater,
          (Some(x), Some(y)) => {
            let ord = compare_segment(x, y);
            if ord != Ordering::Equal {
              return ord;
            }
          }
        }
      }
    }
  }
}

fn compare_segment(x: &str, y: &str) -> Ordering {
  match (x.parse::<u64>(), y.parse::<u64>()) {
    (Ok(x), Ok(y)) => x.cmp(&y),
    (Ok(_), Err(_)) => Ordering::Greater,
    (Err(_), Ok(_)) => Ordering::Less,
    (Err(_), Err(_)) => x.to_ascii_lowercase().cmp(&y.to_ascii_lowercase()),
  }
}
