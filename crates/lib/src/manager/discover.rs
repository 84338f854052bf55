//! Target POM discovery.

use std::path::{Path, PathBuf};

use glob::{MatchOptions, Pattern};
use tracing::{debug, trace};
use walkdir::WalkDir;

use super::ManagerError;

const MATCH_OPTIONS: MatchOptions = MatchOptions {
  case_sensitive: true,
  require_literal_separator: true,
  require_literal_leading_dot: false,
};

/// Find the POMs under `root`.
///
/// A file target is returned as is. A directory is walked in file-name
/// order; a file is kept when its path relative to `root` matches one of
/// `include` and not `exclude`, and is not under one of `skip`.
pub fn discover_poms(
  root: &Path,
  include: &[Pattern],
  exclude: Option<&Pattern>,
  skip: &[PathBuf],
) -> Result<Vec<PathBuf>, ManagerError> {
  if root.is_file() {
    return Ok(vec![root.to_path_buf()]);
  }

  let mut poms = Vec::new();
  for entry in WalkDir::new(root).sort_by_file_name() {
    let entry = entry.map_err(|e| ManagerError::Walk {
      path: root.to_path_buf(),
      message: e.to_string(),
    })?;
    if !entry.file_type().is_file() {
      continue;
    }
    let path = entry.path();
    if skip.iter().any(|s| path.starts_with(s)) {
      trace!(path = %path.display(), "skipping reserved path");
      continue;
    }
    let Ok(relative) = path.strip_prefix(root) else {
      continue;
    };
    let included = include.iter().any(|p| p.matches_path_with(relative, MATCH_OPTIONS));
    let excluded = exclude.is_some_and(|p| p.matches_path_with(relative, MATCH_OPTIONS));
    if included && !excluded {
      poms.push(path.to_path_buf());
    }
  }
  debug!(root = %root.display(), count = poms.len(), "discovered POMs");
  Ok(poms)
}
