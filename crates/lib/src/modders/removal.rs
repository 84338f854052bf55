//! Section-stripping modders: plugins, repositories, reporting, extensions,
//! and the `minimize` composite.

use std::path::Path;

use tracing::{debug, info};

use crate::coord::VersionlessKey;
use crate::pom::{Dependency, Extension, Model, ModelBase};
use crate::project::Project;
use crate::session::Session;

/// Project metadata `minimize` drops outright.
const METADATA_ELEMENTS: &[&str] = &[
  "developers",
  "contributors",
  "issueManagement",
  "ciManagement",
  "mailingLists",
  "organization",
  "scm",
  "url",
];

/// distributionManagement children dropped when the element itself is kept.
const DISTRIBUTION_CHILDREN: &[&str] = &["downloadUrl", "repository", "snapshotRepository", "site"];

/// Remove the configured plugins wherever they appear.
pub fn remove_plugins(project: &mut Project, session: &mut Session) -> bool {
  if session.options.removed_plugins.is_empty() {
    return false;
  }
  let removed = session.options.removed_plugins.clone();
  let pom = project.pom().to_path_buf();
  let mut changed = false;

  for section in project.model_mut().sections_mut() {
    let mut dropped: Vec<VersionlessKey> = Vec::new();
    if let Some(build) = section.build.as_mut() {
      build.plugins.retain(|p| keep(p.versionless(), &removed, &mut dropped));
      if let Some(pm) = build.plugin_management.as_mut() {
        pm.plugins.retain(|p| keep(p.versionless(), &removed, &mut dropped));
      }
    }
    if let Some(reporting) = section.reporting.as_mut() {
      reporting.plugins.retain(|p| keep(p.versionless(), &removed, &mut dropped));
    }
    for key in dropped {
      info!(pom = %pom.display(), plugin = %key, "removing plugin");
      session.changes.log(&pom, format!("plugin {} removed", key));
      changed = true;
    }
  }
  changed
}

fn keep(key: VersionlessKey, removed: &[VersionlessKey], dropped: &mut Vec<VersionlessKey>) -> bool {
  if removed.contains(&key) {
    dropped.push(key);
    false
  } else {
    true
  }
}

pub fn remove_repositories(project: &mut Project, session: &mut Session) -> bool {
  let pom = project.pom().to_path_buf();
  let mut changed = false;
  for section in project.model_mut().sections_mut() {
    changed |= strip_repositories(section);
  }
  if changed {
    session.changes.log(&pom, "repositories removed");
  }
  changed
}

fn strip_repositories(section: &mut ModelBase) -> bool {
  let repos = section.repositories.take().is_some();
  let plugin_repos = section.plugin_repositories.take().is_some();
  repos || plugin_repos
}

pub fn remove_reporting(project: &mut Project, session: &mut Session) -> bool {
  let pom = project.pom().to_path_buf();
  let mut changed = false;
  for section in project.model_mut().sections_mut() {
    changed |= section.reporting.take().is_some();
  }
  if changed {
    session.changes.log(&pom, "reporting removed");
  }
  changed
}

/// Drop build extensions that are not whitelisted, and resolve the versions of
/// those that are.
pub fn remove_extensions(project: &mut Project, session: &mut Session) -> bool {
  let pom = project.pom().to_path_buf();
  let Some(build) = project.model().base.build.as_ref() else {
    return false;
  };
  if build.extensions.is_empty() {
    return false;
  }

  let whitelist = session.options.extensions_whitelist.clone();
  let mut kept = Vec::new();
  let mut changed = false;
  for mut extension in build.extensions.clone() {
    let key = extension.versionless();
    if !whitelist.contains(&key) {
      debug!(pom = %pom.display(), extension = %key, "removing extension");
      session.changes.log(&pom, format!("extension {} removed", key));
      changed = true;
      continue;
    }
    match resolve_extension_version(project, session, &key) {
      Some(version) if extension.version.as_deref() != Some(version.as_str()) => {
        session.changes.log(
          &pom,
          format!(
            "extension {}: {} -> {}",
            key,
            extension.version.as_deref().unwrap_or("(none)"),
            version
          ),
        );
        extension.version = Some(version);
        changed = true;
      }
      Some(_) => {}
      None => record_missing_extension(&pom, &extension, session),
    }
    kept.push(extension);
  }

  if changed {
    project.model_mut().base.build_mut().extensions = kept;
  }
  changed
}

/// Resolve a whitelisted extension's version: the version map first, then a
/// `versionmapper.<g>-<a>` property, then a `version.<g>-<a>` property, each
/// looked up on the project and then the toolchain.
fn resolve_extension_version(project: &Project, session: &Session, key: &VersionlessKey) -> Option<String> {
  if let Some(version) = session.managed.lookup_version(key) {
    return Some(version.to_string());
  }

  let mapper = format!("versionmapper.{}-{}", key.group_id, key.artifact_id);
  let direct = format!("version.{}-{}", key.group_id, key.artifact_id);
  let property = |name: &str| {
    project
      .property(name)
      .or_else(|| session.managed.toolchain_properties().get(name))
      .map(str::to_string)
  };

  if let Some(value) = property(&mapper) {
    return Some(if value.starts_with(|c: char| c.is_ascii_digit()) {
      value
    } else {
      format!("${{{}}}", value)
    });
  }
  property(&direct).map(|_| format!("${{{}}}", direct))
}

fn record_missing_extension(pom: &Path, extension: &Extension, session: &mut Session) {
  let dep = Dependency::new(&extension.group_id, &extension.artifact_id, extension.version.as_deref());
  session.changes.add_missing_dependency(pom, &dep);
}

/// Strip everything a third-party rebuild does not need.
pub fn minimize(project: &mut Project, session: &mut Session) -> bool {
  let mut changed = remove_reporting(project, session);
  changed |= remove_repositories(project, session);
  changed |= remove_extensions(project, session);

  let pom = project.pom().to_path_buf();
  let model = project.model_mut();
  if model.remove_extra(METADATA_ELEMENTS) {
    session.changes.log(&pom, "project metadata removed");
    changed = true;
  }
  if trim_distribution_management(model) {
    session.changes.log(&pom, "distributionManagement trimmed");
    changed = true;
  }
  changed
}

fn trim_distribution_management(model: &mut Model) -> bool {
  let Some(dm) = model.extra_mut("distributionManagement") else {
    return false;
  };
  if dm.child("relocation").is_none() && dm.child("status").is_none() {
    return model.remove_extra(&["distributionManagement"]);
  }
  let before = dm.children.len();
  dm.children.retain(|c| !DISTRIBUTION_CHILDREN.contains(&c.name.as_str()));
  before != dm.children.len()
}
