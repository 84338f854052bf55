//! BOM realignment.
//!
//! Every dependency and managed dependency in the model and its profiles is
//! looked up in the version map after interpolation and relocation. In
//! normalize mode explicit versions are dropped in favor of the imported BOMs
//! and bare managed entries are removed; in strict mode the mapped version is
//! written in place. Dependencies with no mapped version are recorded as
//! missing and left alone.
//!
//! Afterwards the configured BOMs are imported into the project's
//! dependencyManagement, unless the parent is in the batch, in which case the
//! import happens there.

use std::path::Path;

use tracing::{debug, info};

use crate::coord::VersionlessKey;
use crate::pom::Dependency;
use crate::project::{Interpolator, Project};
use crate::session::Session;

use super::refresh;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Outcome {
  Unchanged,
  Modified,
  Deleted,
}

pub fn apply(project: &mut Project, session: &mut Session) -> bool {
  let pom = project.pom().to_path_buf();
  let interpolator = project.interpolator();
  let has_parent = project.parent().is_some();
  let parent_in_batch = project
    .parent()
    .is_some_and(|p| session.managed.is_current_project(&p.versionless()));

  let mut changed = false;
  for section in project.model_mut().sections_mut() {
    changed |= realign_list(&mut section.dependencies, false, has_parent, &interpolator, &pom, session);
    if let Some(dm) = section.dependency_management.as_mut() {
      changed |= realign_list(&mut dm.dependencies, true, has_parent, &interpolator, &pom, session);
    }
  }

  if parent_in_batch {
    if session.is_normalize() && project.model_mut().base.dependency_management.take().is_some() {
      debug!(pom = %pom.display(), "parent is in the batch; dropping local dependencyManagement");
      session
        .changes
        .log(&pom, "dependencyManagement removed; BOMs are imported by the parent");
      changed = true;
    }
  } else {
    changed |= ensure_bom_imports(project, &pom, session);
  }

  refresh(project, session);
  changed
}

fn realign_list(
  deps: &mut Vec<Dependency>,
  managed: bool,
  has_parent: bool,
  interpolator: &Interpolator,
  pom: &Path,
  session: &mut Session,
) -> bool {
  let mut changed = false;
  let mut kept = Vec::with_capacity(deps.len());
  for mut dep in std::mem::take(deps) {
    match realign_dependency(&mut dep, managed, has_parent, interpolator, pom, session) {
      Outcome::Deleted => {
        info!(pom = %pom.display(), dependency = %dep.versionless(), "removing managed dependency");
        changed = true;
      }
      Outcome::Modified => {
        changed = true;
        kept.push(dep);
      }
      Outcome::Unchanged => kept.push(dep),
    }
  }
  *deps = kept;
  changed
}

fn realign_dependency(
  dep: &mut Dependency,
  managed: bool,
  has_parent: bool,
  interpolator: &Interpolator,
  pom: &Path,
  session: &mut Session,
) -> Outcome {
  let marker = if managed { " [managed]" } else { "" };
  let mut resolved = dep.clone();
  interpolator.interpolate_dependency(&mut resolved);
  let mut key = resolved.versionless();

  if session.managed.is_bom(&key) {
    if !has_parent {
      return Outcome::Unchanged;
    }
    if dep.is_import() {
      return realign_bom_import(dep, &key, marker, pom, session);
    }
  }
  if session.managed.is_current_project(&key) {
    debug!(pom = %pom.display(), dependency = %key, "interdependency in the batch; not changing");
    session.changes.log(
      pom,
      format!("{}{}: not changed, it is built in this batch", key, marker),
    );
    return Outcome::Unchanged;
  }

  let before = resolved.clone();
  let mut outcome = Outcome::Unchanged;

  if let Some(target) = session.managed.relocations.get(&key).cloned() {
    info!(pom = %pom.display(), from = %key, to = %target, "relocating dependency");
    session.changes.add_relocation(pom, key.clone(), target.clone());
    dep.group_id = target.group_id.clone();
    dep.artifact_id = target.artifact_id.clone();
    dep.version = Some(target.version.clone());
    resolved.group_id = target.group_id;
    resolved.artifact_id = target.artifact_id;
    resolved.version = Some(target.version);
    key = resolved.versionless();
    outcome = Outcome::Modified;
  }

  if dep.version.is_none() {
    session
      .changes
      .log(pom, format!("{}{}: not changed, version is inherited", key, marker));
    return outcome;
  }

  let Some(mapped) = session.managed.lookup_version(&key).map(str::to_string) else {
    debug!(pom = %pom.display(), dependency = %key, "no managed version");
    session.changes.add_missing_dependency(pom, &resolved);
    return outcome;
  };

  if dep.is_import() {
    // An import needs its version to mean anything.
    if resolved.version.as_deref() != Some(mapped.as_str()) {
      dep.version = Some(mapped);
      outcome = Outcome::Modified;
    }
  } else if session.is_normalize() {
    dep.version = None;
    outcome = Outcome::Modified;
    if managed && dep.scope.is_none() && dep.exclusions.is_empty() {
      session.changes.add_modification(pom, &before, None);
      session
        .changes
        .log(pom, format!("{}{}: removed, version comes from the BOM", key, marker));
      return Outcome::Deleted;
    }
  } else if resolved.version.as_deref() != Some(mapped.as_str()) {
    dep.version = Some(mapped);
    outcome = Outcome::Modified;
  }

  if outcome == Outcome::Modified {
    session.changes.add_modification(pom, &before, Some(dep));
    session.changes.log(
      pom,
      format!(
        "{}{}: {} -> {}",
        key,
        marker,
        before.version.as_deref().unwrap_or("(none)"),
        dep.version.as_deref().unwrap_or("(managed)")
      ),
    );
  }
  outcome
}

/// Point an import of a configured BOM at the configured version.
///
/// BOM coordinates are not in the version map, so the version comes from the
/// BOM list itself.
fn realign_bom_import(
  dep: &mut Dependency,
  key: &VersionlessKey,
  marker: &str,
  pom: &Path,
  session: &mut Session,
) -> Outcome {
  let Some(bom) = session.managed.bom_coordinates().iter().find(|b| b.versionless() == *key) else {
    return Outcome::Unchanged;
  };
  if dep.version.as_deref() == Some(bom.version.as_str()) {
    return Outcome::Unchanged;
  }
  let before = dep.clone();
  info!(pom = %pom.display(), bom = %bom, "realigning BOM import");
  session.changes.log(
    pom,
    format!(
      "{}{}: {} -> {}",
      key,
      marker,
      before.version.as_deref().unwrap_or("(none)"),
      bom.version
    ),
  );
  dep.version = Some(bom.version.clone());
  session.changes.add_modification(pom, &before, Some(dep));
  Outcome::Modified
}

/// Import every configured BOM into the model's dependencyManagement, in BOM order.
fn ensure_bom_imports(project: &mut Project, pom: &Path, session: &mut Session) -> bool {
  let boms = session.managed.bom_coordinates().to_vec();
  if boms.is_empty() {
    return false;
  }

  let dm = project.model_mut().base.dependency_management_mut();
  let mut changed = false;
  for bom in boms {
    let key: VersionlessKey = bom.versionless();
    match dm
      .dependencies
      .iter_mut()
      .find(|d| d.is_import() && d.versionless() == key)
    {
      Some(existing) if existing.version.as_deref() == Some(bom.version.as_str()) => {}
      Some(existing) => {
        session.changes.log(
          pom,
          format!(
            "BOM import {}: {} -> {}",
            key,
            existing.version.as_deref().unwrap_or("(none)"),
            bom.version
          ),
        );
        existing.version = Some(bom.version.clone());
        changed = true;
      }
      None => {
        info!(pom = %pom.display(), bom = %bom, "importing BOM");
        let mut import = Dependency::new(&bom.group_id, &bom.artifact_id, Some(&bom.version));
        import.type_ = Some("pom".to_string());
        import.scope = Some("import".to_string());
        dm.dependencies.push(import);
        session.changes.log(pom, format!("BOM {} imported", bom));
        changed = true;
      }
    }
  }
  changed
}
