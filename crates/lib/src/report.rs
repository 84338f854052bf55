//! Report writers.
//!
//! Each [`ReportKind`] renders one read-only view of the session into a text
//! file under the reports directory. `summary.json` carries the counts for
//! tooling. A report that fails to write is logged and skipped.

use std::fmt::{self, Write as _};
use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

use crate::modders::ModderKind;
use crate::session::Session;

pub const SUMMARY_FILE: &str = "summary.json";

#[derive(Debug, Error)]
pub enum ReportError {
  #[error("failed to create report directory {}: {source}", path.display())]
  CreateDir { path: PathBuf, source: std::io::Error },

  #[error("failed to write report {}: {source}", path.display())]
  Write { path: PathBuf, source: std::io::Error },

  #[error("failed to serialize summary: {0}")]
  Json(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum ReportKind {
  MissingVersions,
  MissingParents,
  UnmanagedPlugins,
  Relocations,
  ModifiedDependencies,
  MappedDependencies,
  ActivityLog,
  Errors,
}

impl ReportKind {
  pub const ALL: [ReportKind; 8] = [
    ReportKind::MissingVersions,
    ReportKind::MissingParents,
    ReportKind::UnmanagedPlugins,
    ReportKind::Relocations,
    ReportKind::ModifiedDependencies,
    ReportKind::MappedDependencies,
    ReportKind::ActivityLog,
    ReportKind::Errors,
  ];

  pub fn name(self) -> &'static str {
    match self {
      ReportKind::MissingVersions => "missing-versions",
      ReportKind::MissingParents => "missing-parents",
      ReportKind::UnmanagedPlugins => "unmanaged-plugins",
      ReportKind::Relocations => "relocations",
      ReportKind::ModifiedDependencies => "modified-dependencies",
      ReportKind::MappedDependencies => "mapped-dependencies",
      ReportKind::ActivityLog => "activity-log",
      ReportKind::Errors => "errors",
    }
  }

  pub fn file_name(self) -> String {
    format!("{}.txt", self.name())
  }

  /// Render the report text.
  pub fn render(self, session: &Session) -> String {
    let mut out = String::new();
    // Writing to a String cannot fail.
    let _ = self.render_into(session, &mut out);
    out
  }

  fn render_into(self, session: &Session, out: &mut String) -> fmt::Result {
    let changes = &session.changes;
    match self {
      ReportKind::MissingVersions => {
        writeln!(out, "# Missing dependency versions, by coordinate")?;
        for (key, poms) in changes.missing_by_coord() {
          writeln!(out, "{}", key)?;
          for pom in poms {
            writeln!(out, "  {}", pom.display())?;
          }
        }
        writeln!(out, "\n# Missing dependency versions, by POM")?;
        for (pom, keys) in changes.missing_by_pom() {
          writeln!(out, "{}", pom.display())?;
          for key in keys {
            writeln!(out, "  {}", key)?;
          }
        }
      }
      ReportKind::MissingParents => {
        for (pom, parent) in changes.missing_parents() {
          writeln!(out, "{}: {}", pom.display(), parent)?;
        }
      }
      ReportKind::UnmanagedPlugins => {
        for (pom, plugins) in changes.unmanaged_by_pom() {
          writeln!(out, "{}", pom.display())?;
          for plugin in plugins {
            writeln!(out, "  {}", plugin)?;
          }
        }
      }
      ReportKind::Relocations => {
        for (pom, relocations) in changes.relocations_by_pom() {
          writeln!(out, "{}", pom.display())?;
          for (old, new) in relocations {
            writeln!(out, "  {} -> {}", old, new)?;
          }
        }
      }
      ReportKind::ModifiedDependencies => {
        for (key, list) in changes.modifications() {
          writeln!(out, "{}", key)?;
          for change in list {
            match &change.after {
              Some(after) => writeln!(out, "  {}: {} -> {}", change.pom.display(), change.before, after)?,
              None => writeln!(out, "  {}: {} -> (removed)", change.pom.display(), change.before)?,
            }
          }
        }
      }
      ReportKind::MappedDependencies => {
        for (bom, versions) in session.managed.versions_by_bom() {
          writeln!(out, "{}", bom.display())?;
          for (key, version) in versions {
            writeln!(out, "  {} = {}", key, version)?;
          }
        }
      }
      ReportKind::ActivityLog => {
        for (pom, lines) in changes.activity() {
          writeln!(out, "{}", pom.display())?;
          for line in lines {
            writeln!(out, "  {}", line)?;
          }
        }
      }
      ReportKind::Errors => {
        for error in session.errors() {
          writeln!(out, "{}", error)?;
        }
      }
    }
    Ok(())
  }
}

/// Machine-readable run summary.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
  pub status: String,
  pub projects: usize,
  pub changed: Vec<PathBuf>,
  pub written: Vec<PathBuf>,
  pub capture_pom: Option<PathBuf>,
  pub modders: Vec<ModderKind>,
  pub missing_dependencies: usize,
  pub missing_parents: usize,
  pub unmanaged_plugins: usize,
  pub relocations: usize,
  pub modifications: usize,
  pub errors: Vec<String>,
}

pub fn write_report(dir: &Path, kind: ReportKind, session: &Session) -> Result<PathBuf, ReportError> {
  let path = dir.join(kind.file_name());
  write_file(&path, kind.render(session))?;
  debug!(report = kind.name(), path = %path.display(), "wrote report");
  Ok(path)
}

pub fn write_summary(dir: &Path, summary: &Summary) -> Result<PathBuf, ReportError> {
  let path = dir.join(SUMMARY_FILE);
  write_file(&path, serde_json::to_string_pretty(summary)?)?;
  Ok(path)
}

/// Write every report and the summary. Failures are logged, not returned.
///
/// Returns the paths that were written.
pub fn write_all(dir: &Path, session: &Session, summary: &Summary) -> Vec<PathBuf> {
  if let Err(source) = fs::create_dir_all(dir) {
    let error = ReportError::CreateDir {
      path: dir.to_path_buf(),
      source,
    };
    warn!(error = %error, "skipping reports");
    return Vec::new();
  }

  let mut written = Vec::new();
  for kind in ReportKind::ALL {
    match write_report(dir, kind, session) {
      Ok(path) => written.push(path),
      Err(e) => warn!(report = kind.name(), error = %e, "failed to write report"),
    }
  }
  match write_summary(dir, summary) {
    Ok(path) => written.push(path),
    Err(e) => warn!(error = %e, "failed to write summary"),
  }
  written
}

fn write_file(path: &Path, content: String) -> Result<(), ReportError> {
  fs::write(path, content).map_err(|source| ReportError::Write {
    path: path.to_path_buf(),
    source,
  })
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::coord::{FullKey, VersionlessKey};
  use crate::pom::Dependency;
  use tempfile::TempDir;

  fn session() -> Session {
    let mut session = Session::default();
    let pom = Path::new("app/pom.xml");
    session
      .changes
      .add_missing_dependency(pom, &Dependency::new("grp", "art", Some("1")));
    session
      .changes
      .add_relocation(pom, VersionlessKey::new("old", "a"), FullKey::new("new", "a", "2"));
    let before = Dependency::new("org.test", "foo", Some("1.0"));
    session.changes.add_modification(pom, &before, None);
    session.changes.log(pom, "version: 1 -> 1-rebuild-1");
    session
  }

  #[test]
  fn missing_versions_lists_both_indexes() {
    let text = ReportKind::MissingVersions.render(&session());
    assert!(text.contains("grp:art\n  app/pom.xml\n"));
    assert!(text.contains("app/pom.xml\n  grp:art\n"));
  }

  #[test]
  fn removed_modification_is_marked() {
    let text = ReportKind::ModifiedDependencies.render(&session());
    assert!(text.contains("org.test:foo:jar:1.0 -> (removed)"));
  }

  #[test]
  fn relocations_and_activity() {
    let session = session();
    assert!(ReportKind::Relocations.render(&session).contains("old:a -> new:a:2"));
    assert!(ReportKind::ActivityLog.render(&session).contains("  version: 1 -> 1-rebuild-1"));
    assert!(ReportKind::Errors.render(&session).is_empty());
  }

  #[test]
  fn write_all_creates_every_file() {
    let dir = TempDir::new().unwrap();
    let reports = dir.path().join("reports");
    let summary = Summary {
      status: "success".into(),
      projects: 1,
      ..Default::default()
    };
    let written = write_all(&reports, &session(), &summary);
    assert_eq!(written.len(), ReportKind::ALL.len() + 1);

    let json: serde_json::Value =
      serde_json::from_str(&fs::read_to_string(reports.join(SUMMARY_FILE)).unwrap()).unwrap();
    assert_eq!(json["status"], "success");
    assert_eq!(json["projects"], 1);
  }
}
