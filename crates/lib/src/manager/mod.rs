//! Run orchestration.
//!
//! [`run`] drives one complete pass:
//! 1. load the BOMs, then the toolchain
//! 2. discover and load the target POMs, registering them as current projects
//! 3. order them descendants-first through the ancestry graph
//! 4. apply the selected modders and write the projects that changed
//! 5. write the capture descriptor and the reports
//!
//! Loading a BOM or the toolchain is fatal. Anything that goes wrong with a
//! single target POM is recorded in the session and the run carries on.

mod discover;

use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info, warn};

pub use discover::discover_poms;

use crate::capture;
use crate::modders::apply_modders;
use crate::pom;
use crate::project::{AncestryGraph, Project, ProjectError};
use crate::report::{self, Summary};
use crate::session::{Session, SessionError, SessionOptions};

/// Subdirectory of the workspace holding copies of rewritten originals.
pub const BACKUP_DIR: &str = "backups";

#[derive(Debug, Error)]
pub enum ManagerError {
  #[error("failed to load BOM {}: {source}", path.display())]
  Bom { path: PathBuf, source: ProjectError },

  #[error("failed to load toolchain {}: {source}", path.display())]
  Toolchain { path: PathBuf, source: ProjectError },

  #[error("target {} does not exist: {source}", path.display())]
  Target { path: PathBuf, source: std::io::Error },

  #[error("failed to walk {}: {message}", path.display())]
  Walk { path: PathBuf, message: String },
}

/// What a run reads: the target and the governance descriptors.
#[derive(Debug, Clone)]
pub struct RunInputs {
  /// A POM file or a directory to search.
  pub target: PathBuf,
  pub boms: Vec<PathBuf>,
  pub toolchain: Option<PathBuf>,
  pub include: Vec<glob::Pattern>,
  pub exclude: Option<glob::Pattern>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum RunStatus {
  Success,
  /// No hard errors, but governance data was incomplete.
  CaptureWritten,
  Failed,
}

impl RunStatus {
  pub fn exit_code(self) -> u8 {
    match self {
      RunStatus::Success => 0,
      RunStatus::Failed => 1,
      RunStatus::CaptureWritten => 2,
    }
  }

  pub fn as_str(self) -> &'static str {
    match self {
      RunStatus::Success => "success",
      RunStatus::CaptureWritten => "capture-written",
      RunStatus::Failed => "failed",
    }
  }
}

#[derive(Debug)]
pub struct RunOutcome {
  /// Number of POMs loaded.
  pub projects: usize,
  /// Source paths of the projects a modder changed.
  pub changed: Vec<PathBuf>,
  /// Where changed projects were written.
  pub written: Vec<PathBuf>,
  pub capture_pom: Option<PathBuf>,
  /// Final session state, for reporting.
  pub session: Session,
}

impl RunOutcome {
  pub fn errors(&self) -> &[SessionError] {
    self.session.errors()
  }

  pub fn status(&self) -> RunStatus {
    if !self.errors().is_empty() {
      RunStatus::Failed
    } else if self.capture_pom.is_some() {
      RunStatus::CaptureWritten
    } else {
      RunStatus::Success
    }
  }

  pub fn summary(&self) -> Summary {
    let changes = &self.session.changes;
    Summary {
      status: self.status().as_str().to_string(),
      projects: self.projects,
      changed: self.changed.clone(),
      written: self.written.clone(),
      capture_pom: self.capture_pom.clone(),
      modders: self.session.options.modders.clone(),
      missing_dependencies: changes.missing_dependencies().len(),
      missing_parents: changes.missing_parents().len(),
      unmanaged_plugins: changes.unmanaged_plugins().len(),
      relocations: changes.relocations_by_pom().values().map(|r| r.len()).sum(),
      modifications: changes.modifications().values().map(Vec::len).sum(),
      errors: self.errors().iter().map(ToString::to_string).collect(),
    }
  }
}

/// Run the whole pipeline.
pub fn run(options: &SessionOptions, inputs: &RunInputs) -> Result<RunOutcome, ManagerError> {
  let mut session = Session::new(options.clone());
  load_governance(&mut session, inputs)?;

  let root = dunce::canonicalize(&inputs.target).map_err(|source| ManagerError::Target {
    path: inputs.target.clone(),
    source,
  })?;
  let base_dir = if root.is_file() {
    root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone())
  } else {
    root.clone()
  };

  let skip = reserved_paths(options, inputs);
  let poms = discover_poms(&root, &inputs.include, inputs.exclude.as_ref(), &skip)?;
  let mut projects = load_projects(&poms, &mut session);
  info!(target = %root.display(), projects = projects.len(), "loaded target projects");

  let changed_idx = process_projects(&mut projects, &mut session);

  let mut changed = Vec::new();
  let mut written = Vec::new();
  for idx in changed_idx {
    let project = &projects[idx];
    changed.push(project.pom().to_path_buf());
    if let Some(path) = write_project(project, &base_dir, &mut session) {
      written.push(path);
    }
  }

  let capture_pom = options
    .capture_pom
    .as_deref()
    .and_then(|path| write_capture(path, &mut session));

  let outcome = RunOutcome {
    projects: projects.len(),
    changed,
    written,
    capture_pom,
    session,
  };
  let reports = report::write_all(&options.reports_dir, &outcome.session, &outcome.summary());
  debug!(count = reports.len(), dir = %options.reports_dir.display(), "wrote reports");
  info!(
    changed = outcome.changed.len(),
    errors = outcome.errors().len(),
    status = outcome.status().as_str(),
    "run finished"
  );
  Ok(outcome)
}

/// Register the BOMs, in order, and the toolchain.
pub fn load_governance(session: &mut Session, inputs: &RunInputs) -> Result<(), ManagerError> {
  for path in &inputs.boms {
    let bom = Project::load(path).map_err(|source| ManagerError::Bom {
      path: path.clone(),
      source,
    })?;
    session.managed.add_bom(path, &bom);
  }
  if let Some(path) = &inputs.toolchain {
    let toolchain = Project::load(path).map_err(|source| ManagerError::Toolchain {
      path: path.clone(),
      source,
    })?;
    session.managed.set_toolchain(path, &toolchain);
  }
  session.managed.resolve_mappings();
  Ok(())
}

/// Load each POM, recording failures, and register the batch as current projects.
pub fn load_projects(poms: &[PathBuf], session: &mut Session) -> Vec<Project> {
  let mut projects = Vec::with_capacity(poms.len());
  for pom in poms {
    match Project::load(pom) {
      Ok(project) => projects.push(project),
      Err(source) => session.add_error(SessionError::Load {
        pom: pom.clone(),
        source,
      }),
    }
  }
  session
    .managed
    .set_current_projects(projects.iter().map(Project::versionless_key));
  projects
}

/// Apply the session's modders to every project, descendants first.
///
/// Returns the indices of the projects that changed, in processing order.
pub fn process_projects(projects: &mut [Project], session: &mut Session) -> Vec<usize> {
  let graph = AncestryGraph::from_projects(projects);
  let order = match graph.processing_order() {
    Ok(order) => order,
    Err(e) => {
      session.add_error(e.into());
      (0..projects.len()).collect()
    }
  };

  let modders = session.options.modders.clone();
  let mut changed = Vec::new();
  for idx in order {
    if apply_modders(&mut projects[idx], session, &modders) {
      changed.push(idx);
    }
  }
  changed
}

/// Write one changed project, backing up or relocating as configured.
fn write_project(project: &Project, base_dir: &Path, session: &mut Session) -> Option<PathBuf> {
  let pom = project.pom();
  if session.options.preserve_files
    && let Err(source) = backup(pom, base_dir, &session.options.workspace)
  {
    session.add_error(SessionError::Backup {
      pom: pom.to_path_buf(),
      source,
    });
    return None;
  }

  let result = match session.options.relocate_output.clone() {
    Some(out) => pom::write_relocated(project.model(), project.key(), pom, &out, base_dir),
    None => pom::write_pom(project.model(), pom).map(|()| pom.to_path_buf()),
  };
  match result {
    Ok(path) => {
      info!(pom = %pom.display(), to = %path.display(), "wrote project");
      Some(path)
    }
    Err(source) => {
      session.add_error(SessionError::Write {
        pom: pom.to_path_buf(),
        source,
      });
      None
    }
  }
}

fn backup(pom: &Path, base_dir: &Path, workspace: &Path) -> std::io::Result<()> {
  let relative = pom
    .strip_prefix(base_dir)
    .map(Path::to_path_buf)
    .unwrap_or_else(|_| pom.file_name().map(PathBuf::from).unwrap_or_default());
  let target = workspace.join(BACKUP_DIR).join(relative);
  if let Some(dir) = target.parent() {
    fs::create_dir_all(dir)?;
  }
  fs::copy(pom, &target)?;
  debug!(pom = %pom.display(), backup = %target.display(), "backed up original");
  Ok(())
}

fn write_capture(path: &Path, session: &mut Session) -> Option<PathBuf> {
  let version = capture::capture_version(SystemTime::now());
  match capture::write_capture(&session.changes, path, &version) {
    Ok(true) => {
      warn!(path = %path.display(), "governance data incomplete; capture descriptor written");
      Some(path.to_path_buf())
    }
    Ok(false) => None,
    Err(source) => {
      session.add_error(SessionError::Write {
        pom: path.to_path_buf(),
        source,
      });
      None
    }
  }
}

/// Paths discovery must not descend into: the workspace and the governance descriptors.
fn reserved_paths(options: &SessionOptions, inputs: &RunInputs) -> Vec<PathBuf> {
  std::iter::once(&options.workspace)
    .chain(options.relocate_output.iter())
    .chain(inputs.boms.iter())
    .chain(inputs.toolchain.iter())
    .filter_map(|p| dunce::canonicalize(p).ok())
    .collect()
}
