//! Toolchain realignment and forced parent realignment.
//!
//! Toolchain realignment does three things to a project:
//! - points its parent at the toolchain (or fixes the toolchain version)
//! - strips versions from plugins the toolchain manages, noting each
//!   reference so pluginManagement can be supplied at the right ancestor
//! - forces report-plugin versions to the toolchain's, since report plugins
//!   do not inherit versions through pluginManagement
//!
//! A project is the top of an independent lineage when its parent is neither
//! in the batch nor the toolchain. Only there are the toolchain's injected
//! plugins added and pluginManagement entries written; everywhere else they
//! arrive by inheritance.

use std::collections::BTreeSet;
use std::path::Path;

use tracing::{debug, info};

use crate::coord::{FullKey, VersionlessKey};
use crate::pom::{ModelBase, Parent, Plugin, PluginManagement};
use crate::project::Project;
use crate::session::Session;

use super::refresh;

pub fn apply(project: &mut Project, session: &mut Session) -> bool {
  let Some(toolchain) = session.managed.toolchain().cloned() else {
    return false;
  };
  if project.versionless_key() == toolchain.versionless() {
    debug!(pom = %project.pom().display(), "project is the toolchain; skipping");
    return false;
  }

  let pom = project.pom().to_path_buf();
  let mut changed = realign_parent(project, session, &toolchain);

  let parent_key = project.parent().map(Parent::versionless);
  let parent_in_batch = parent_key.as_ref().is_some_and(|k| session.managed.is_current_project(k));
  let parent_is_toolchain = parent_key.as_ref().is_some_and(|k| session.managed.is_toolchain(k));
  let top_of_lineage = !parent_in_batch && !parent_is_toolchain;

  let mut refs = BTreeSet::new();
  {
    let model = project.model_mut();
    changed |= realign_build(&mut model.base, top_of_lineage, &pom, session, &mut refs);
    for profile in &mut model.profiles {
      changed |= realign_build(&mut profile.base, false, &pom, session, &mut refs);
    }
    for section in model.sections_mut() {
      changed |= realign_report_plugins(section, &pom, session);
    }
  }

  refs.extend(session.changes.child_plugin_refs(&project.versionless_key()));
  if parent_in_batch {
    if let Some(parent_key) = parent_key {
      for plugin in refs {
        session.changes.add_child_plugin_ref(parent_key.clone(), plugin);
      }
    }
  } else if top_of_lineage {
    changed |= inject_plugin_management(&mut project.model_mut().base, &refs, &pom, session);
    changed |= inject_plugins(&mut project.model_mut().base, &pom, session);
  }

  refresh(project, session);
  changed
}

/// Replace the parent with the toolchain when it is absent or belongs to
/// another group.
pub fn force_parent(project: &mut Project, session: &mut Session) -> bool {
  let Some(toolchain) = session.managed.toolchain().cloned() else {
    return false;
  };
  if project.versionless_key() == toolchain.versionless() {
    return false;
  }

  let key = project.key().clone();
  let replace = match project.parent() {
    None => true,
    Some(parent) => parent.key() != toolchain && parent.group_id != key.group_id,
  };
  if !replace {
    return false;
  }

  let pom = project.pom().to_path_buf();
  let model = project.model_mut();
  // Pin inherited values before the parent changes underneath them.
  model.group_id.get_or_insert_with(|| key.group_id.clone());
  model.version.get_or_insert_with(|| key.version.clone());
  let old = model.parent.replace(Parent::from(&toolchain));

  info!(pom = %pom.display(), parent = %toolchain, "forcing toolchain parent");
  session.changes.log(
    &pom,
    match old {
      Some(old) => format!("parent {} replaced by toolchain {}", old.key(), toolchain),
      None => format!("parent set to toolchain {}", toolchain),
    },
  );
  refresh(project, session);
  true
}

fn realign_parent(project: &mut Project, session: &mut Session, toolchain: &FullKey) -> bool {
  let pom = project.pom().to_path_buf();
  let Some(parent) = project.parent().cloned() else {
    info!(pom = %pom.display(), parent = %toolchain, "injecting toolchain parent");
    project.model_mut().parent = Some(Parent::from(toolchain));
    session.changes.log(&pom, format!("parent set to toolchain {}", toolchain));
    return true;
  };

  let parent_key = parent.versionless();
  if parent_key == toolchain.versionless() {
    if parent.version == toolchain.version {
      return false;
    }
    session.changes.log(
      &pom,
      format!("toolchain parent version {} -> {}", parent.version, toolchain.version),
    );
    if let Some(p) = project.model_mut().parent.as_mut() {
      p.version = toolchain.version.clone();
    }
    return true;
  }

  let Some(target) = session.managed.relocations.get(&parent_key).cloned() else {
    return false;
  };
  let version = if target.versionless() == toolchain.versionless() {
    toolchain.version.clone()
  } else {
    target.version.clone()
  };
  info!(pom = %pom.display(), from = %parent.key(), to = %target, "relocating parent");
  session.changes.add_relocation(&pom, parent_key, target.clone());
  session
    .changes
    .log(&pom, format!("parent {} relocated to {}", parent.key(), target));
  project.model_mut().parent = Some(Parent {
    group_id: target.group_id,
    artifact_id: target.artifact_id,
    version,
    relative_path: None,
  });
  true
}

/// Apply a relocation to a plugin coordinate. The version moves only in strict mode.
fn relocate_plugin(
  group_id: &mut Option<String>,
  artifact_id: &mut String,
  version: &mut Option<String>,
  pom: &Path,
  session: &mut Session,
) -> bool {
  let old = VersionlessKey::plugin(group_id.as_deref(), artifact_id);
  let Some(target) = session.managed.relocations.get(&old).cloned() else {
    return false;
  };
  *group_id = Some(target.group_id.clone());
  *artifact_id = target.artifact_id.clone();
  if session.options.strict {
    *version = Some(target.version.clone());
  }
  session.changes.log(pom, format!("plugin {} relocated to {}", old, target));
  session.changes.add_relocation(pom, old, target);
  true
}

fn is_injected(session: &Session, key: &VersionlessKey) -> bool {
  session.managed.injected_plugins().contains_key(key)
}

/// Realign build plugins and pluginManagement in one section.
///
/// With `manage_locally`, pluginManagement entries keep their place and take
/// the toolchain version. Otherwise their versions are stripped and entries
/// left with nothing but a coordinate are removed.
fn realign_build(
  base: &mut ModelBase,
  manage_locally: bool,
  pom: &Path,
  session: &mut Session,
  refs: &mut BTreeSet<VersionlessKey>,
) -> bool {
  let Some(build) = base.build.as_mut() else {
    return false;
  };
  let mut changed = false;

  for plugin in &mut build.plugins {
    changed |= relocate_plugin(
      &mut plugin.group_id,
      &mut plugin.artifact_id,
      &mut plugin.version,
      pom,
      session,
    );
    let key = plugin.versionless();
    if session.managed.lookup_managed_plugin(&key).is_some() {
      if let Some(version) = plugin.version.take() {
        debug!(pom = %pom.display(), plugin = %key, version = %version, "stripping managed plugin version");
        session.changes.log(pom, format!("plugin {}: version {} removed", key, version));
        changed = true;
      }
      refs.insert(key);
    } else if !is_injected(session, &key) {
      session.changes.add_unmanaged_plugin(pom, plugin);
    }
  }

  if let Some(pm) = build.plugin_management.as_mut() {
    let mut kept = Vec::with_capacity(pm.plugins.len());
    for mut plugin in std::mem::take(&mut pm.plugins) {
      changed |= relocate_plugin(
        &mut plugin.group_id,
        &mut plugin.artifact_id,
        &mut plugin.version,
        pom,
        session,
      );
      let key = plugin.versionless();
      let managed_version = session.managed.lookup_managed_plugin(&key).map(|p| p.version.clone());
      match managed_version {
        Some(version) if manage_locally => {
          if plugin.version != version {
            session.changes.log(
              pom,
              format!(
                "managed plugin {}: version {} -> {}",
                key,
                plugin.version.as_deref().unwrap_or("(none)"),
                version.as_deref().unwrap_or("(none)")
              ),
            );
            plugin.version = version;
            changed = true;
          }
          refs.insert(key);
        }
        Some(_) => {
          if plugin.version.take().is_some() {
            changed = true;
          }
          refs.insert(key.clone());
          if !plugin.has_customization() {
            debug!(pom = %pom.display(), plugin = %key, "removing redundant pluginManagement entry");
            session.changes.log(pom, format!("managed plugin {} removed", key));
            changed = true;
            continue;
          }
        }
        None => {
          if !is_injected(session, &key) {
            session.changes.add_unmanaged_plugin(pom, &plugin);
          }
        }
      }
      kept.push(plugin);
    }
    pm.plugins = kept;
    if pm.plugins.is_empty() {
      build.plugin_management = None;
    }
  }

  changed
}

fn realign_report_plugins(base: &mut ModelBase, pom: &Path, session: &mut Session) -> bool {
  let Some(reporting) = base.reporting.as_mut() else {
    return false;
  };
  let mut changed = false;
  for plugin in &mut reporting.plugins {
    changed |= relocate_plugin(
      &mut plugin.group_id,
      &mut plugin.artifact_id,
      &mut plugin.version,
      pom,
      session,
    );
    let key = plugin.versionless();
    match session.managed.lookup_managed_plugin(&key).map(|p| p.version.clone()) {
      Some(version) => {
        if version.is_some() && plugin.version != version {
          session.changes.log(
            pom,
            format!(
              "report plugin {}: version {} -> {}",
              key,
              plugin.version.as_deref().unwrap_or("(none)"),
              version.as_deref().unwrap_or("(none)")
            ),
          );
          plugin.version = version;
          changed = true;
        }
      }
      None => {
        let record = Plugin::new(plugin.group_id.as_deref(), &plugin.artifact_id, plugin.version.as_deref());
        session.changes.add_unmanaged_plugin(pom, &record);
      }
    }
  }
  changed
}

/// Add toolchain pluginManagement entries for referenced plugins not yet managed here.
fn inject_plugin_management(
  base: &mut ModelBase,
  refs: &BTreeSet<VersionlessKey>,
  pom: &Path,
  session: &mut Session,
) -> bool {
  let existing: BTreeSet<VersionlessKey> = base
    .build
    .as_ref()
    .and_then(|b| b.plugin_management.as_ref())
    .map(|pm| pm.plugins.iter().map(Plugin::versionless).collect())
    .unwrap_or_default();

  let missing: Vec<Plugin> = refs
    .iter()
    .filter(|key| !existing.contains(*key))
    .filter_map(|key| session.managed.lookup_managed_plugin(key).cloned())
    .collect();
  if missing.is_empty() {
    return false;
  }

  let pm = base
    .build_mut()
    .plugin_management
    .get_or_insert_with(PluginManagement::default);
  for plugin in missing {
    info!(pom = %pom.display(), plugin = %plugin.versionless(), "injecting pluginManagement entry");
    session
      .changes
      .log(pom, format!("pluginManagement entry {} injected", plugin.versionless()));
    pm.plugins.push(plugin);
  }
  true
}

/// Add the toolchain's injected build plugins that the project does not declare.
fn inject_plugins(base: &mut ModelBase, pom: &Path, session: &mut Session) -> bool {
  let declared: BTreeSet<VersionlessKey> = base
    .build
    .as_ref()
    .map(|b| b.plugins.iter().map(Plugin::versionless).collect())
    .unwrap_or_default();

  let missing: Vec<Plugin> = session
    .managed
    .injected_plugins()
    .iter()
    .filter(|(key, _)| !declared.contains(*key))
    .map(|(_, plugin)| plugin.clone())
    .collect();
  if missing.is_empty() {
    return false;
  }

  let build = base.build_mut();
  for plugin in missing {
    info!(pom = %pom.display(), plugin = %plugin.versionless(), "injecting toolchain plugin");
    session
      .changes
      .log(pom, format!("build plugin {} injected", plugin.versionless()));
    build.plugins.push(plugin);
  }
  true
}
