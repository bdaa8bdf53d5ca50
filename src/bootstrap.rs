//! Bootstrap Manager (C7)
//!
//! Owns `bootstrap/`: one-off scripts numbered independently of any patch,
//! tracked per-database in `half_orm_meta.bootstrap` so a script never runs
//! twice against the same instance.

use crate::error::{HopError, HopResult, ResultExt};
use crate::exec::{Database, FileExecutor};
use std::path::{Path, PathBuf};

/// One parsed `bootstrap/<N>-<patch_id>-<version>.<ext>` file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BootstrapFile {
  pub path: PathBuf,
  pub filename: String,
  pub number: u64,
  pub patch_id: String,
  pub version: String,
  pub is_python: bool,
}

/// Owns `bootstrap/` beneath a project root.
pub struct BootstrapManager {
  root: PathBuf,
}

impl BootstrapManager {
  pub fn new(project_root: impl AsRef<Path>) -> Self {
    Self { root: project_root.as_ref().join("bootstrap") }
  }

  /// All bootstrap files, sorted numerically on their prefix.
  pub fn list(&self) -> HopResult<Vec<BootstrapFile>> {
    if !self.root.is_dir() {
      return Ok(vec![]);
    }
    let mut files: Vec<BootstrapFile> = std::fs::read_dir(&self.root)
      .context(format!("failed to read {}", self.root.display()))?
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
      .filter_map(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        parse_filename(&name).map(|(number, patch_id, version, is_python)| BootstrapFile {
          path: self.root.join(&name),
          filename: name,
          number,
          patch_id,
          version,
          is_python,
        })
      })
      .collect();
    files.sort_by_key(|f| f.number);
    Ok(files)
  }

  /// Files not yet recorded as executed against `db`.
  pub fn pending(&self, db: &mut dyn Database) -> HopResult<Vec<BootstrapFile>> {
    let executed = executed_filenames(db)?;
    Ok(self.list()?.into_iter().filter(|f| !executed.contains(&f.filename)).collect())
  }

  /// The next free numeric prefix: one past the highest existing, or 1.
  pub fn next_number(&self) -> HopResult<u64> {
    Ok(self.list()?.into_iter().map(|f| f.number).max().map(|n| n + 1).unwrap_or(1))
  }

  /// Execute pending (or all, when `force`) bootstrap files in order,
  /// recording each success. Stops on the first failure. Files whose parsed
  /// `patch_id` equals `exclude_patch_id` are skipped, so integrating a
  /// patch does not re-run the bootstrap script it itself introduced.
  pub fn run(
    &self,
    db: &mut dyn Database,
    project_root: &Path,
    dry_run: bool,
    force: bool,
    exclude_patch_id: Option<&str>,
  ) -> HopResult<Vec<String>> {
    let candidates = if force { self.list()? } else { self.pending(db)? };
    let executor = FileExecutor;
    let mut ran = Vec::new();

    for file in candidates {
      if exclude_patch_id.is_some_and(|id| id == file.patch_id) {
        continue;
      }
      if dry_run {
        ran.push(file.filename.clone());
        continue;
      }

      if file.is_python {
        executor.execute_python(&file.path, None, project_root)?;
      } else {
        executor.execute_sql(&file.path, db)?;
      }

      db.insert(
        "half_orm_meta.bootstrap",
        &[("filename", file.filename.as_str()), ("version", file.version.as_str())],
      )?;
      ran.push(file.filename);
    }

    Ok(ran)
  }
}

fn executed_filenames(db: &mut dyn Database) -> HopResult<Vec<String>> {
  let rows = db.query("select filename from half_orm_meta.bootstrap")?;
  Ok(rows.into_iter().filter_map(|row| row.into_iter().next().flatten()).collect())
}

/// Parse `^(\d+)-(.+)-(\d+\.\d+\.\d+)\.(sql|py)$`.
fn parse_filename(name: &str) -> Option<(u64, String, String, bool)> {
  let (stem, ext) = name.rsplit_once('.')?;
  let is_python = match ext {
    "sql" => false,
    "py" => true,
    _ => return None,
  };

  let (number_part, rest) = stem.split_once('-')?;
  let number: u64 = number_part.parse().ok()?;

  let (patch_id, version) = rest.rsplit_once('-')?;
  if !is_semver_triple(version) {
    return None;
  }

  Some((number, patch_id.to_string(), version.to_string(), is_python))
}

fn is_semver_triple(s: &str) -> bool {
  let parts: Vec<&str> = s.split('.').collect();
  parts.len() == 3 && parts.iter().all(|p| !p.is_empty() && p.chars().all(|c| c.is_ascii_digit()))
}
