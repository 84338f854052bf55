//! Version rewriting: `version-suffix` and `version` (pattern replace).
//!
//! Both rules rewrite the project's own version, then settle the parent
//! version. Parent cases, first match wins:
//! 1. parent is in the batch: rewrite it with the same rule
//! 2. no toolchain, or the parent is the toolchain: leave it
//! 3. the parent has a relocation, or is one's target: leave it (toolchain
//!    realignment owns it)
//! 4. the version map has no entry: record a missing parent, and outside
//!    strict mode rewrite it anyway on the guess that it is rebuilt the same way
//! 5. the version map disagrees: take the mapped version

use tracing::{debug, info};

use crate::project::{Project, is_expression};
use crate::session::{Session, VersionPattern};

use super::refresh;

enum Rule<'a> {
  Suffix(&'a str),
  Pattern(&'a VersionPattern),
}

impl Rule<'_> {
  fn should_modify(&self, version: &str) -> bool {
    if is_expression(version) {
      return false;
    }
    match self {
      Rule::Suffix(suffix) => !version.ends_with(suffix),
      Rule::Pattern(pattern) => pattern.needs_rewrite(version),
    }
  }

  fn rewrite(&self, version: &str) -> String {
    match self {
      Rule::Suffix(suffix) => format!("{}{}", version, suffix),
      Rule::Pattern(pattern) => pattern.apply(version),
    }
  }
}

pub fn apply_suffix(project: &mut Project, session: &mut Session) -> bool {
  let Some(suffix) = session.options.version_suffix.clone() else {
    return false;
  };
  apply_rule(project, session, &Rule::Suffix(&suffix))
}

pub fn apply_pattern(project: &mut Project, session: &mut Session) -> bool {
  let Some(pattern) = session.options.version_modifier.clone() else {
    return false;
  };
  apply_rule(project, session, &Rule::Pattern(&pattern))
}

fn apply_rule(project: &mut Project, session: &mut Session, rule: &Rule<'_>) -> bool {
  let pom = project.pom().to_path_buf();
  let mut changed = false;

  if let Some(version) = project.model().version.clone()
    && rule.should_modify(&version)
  {
    let rewritten = rule.rewrite(&version);
    info!(pom = %pom.display(), from = %version, to = %rewritten, "rewriting project version");
    session
      .changes
      .log(&pom, format!("version: {} -> {}", version, rewritten));
    project.model_mut().version = Some(rewritten);
    changed = true;
  }

  if let Some(parent) = project.parent().cloned() {
    let parent_key = parent.versionless();
    let new_version = if session.managed.is_current_project(&parent_key) {
      rule.should_modify(&parent.version).then(|| rule.rewrite(&parent.version))
    } else if session.managed.toolchain().is_none() || session.managed.is_toolchain(&parent_key) {
      debug!(pom = %pom.display(), parent = %parent_key, "no toolchain or parent is the toolchain; leaving parent");
      None
    } else if session.managed.relocations.get(&parent_key).is_some()
      || session.managed.relocations.is_target(&parent_key)
    {
      debug!(pom = %pom.display(), parent = %parent_key, "parent is relocated; leaving parent");
      None
    } else {
      match session.managed.lookup_version(&parent_key) {
        None => {
          session.changes.add_missing_parent(&pom, parent.key());
          if !session.options.strict && rule.should_modify(&parent.version) {
            session.changes.log(
              &pom,
              format!("parent {} not managed; assuming it is rebuilt the same way", parent_key),
            );
            Some(rule.rewrite(&parent.version))
          } else {
            debug!(pom = %pom.display(), parent = %parent_key, "parent not managed; leaving version");
            None
          }
        }
        Some(mapped) if mapped != parent.version => Some(mapped.to_string()),
        Some(_) => None,
      }
    };

    if let Some(version) = new_version
      && let Some(parent_ref) = project.model_mut().parent.as_mut()
    {
      info!(pom = %pom.display(), parent = %parent_key, from = %parent_ref.version, to = %version, "rewriting parent version");
      session
        .changes
        .log(&pom, format!("parent {}: {} -> {}", parent_key, parent_ref.version, version));
      parent_ref.version = version;
      changed = true;
    }
  }

  refresh(project, session);
  changed
}
