//! Patch Applier (C9)
//!
//! Drives ordered file execution for a single patch, and the from-scratch
//! replay sequence used by `deploy-to-prod` and clean developer rebuilds.
//! Composes C3 (execution), C6 (patch file enumeration), and C7 (bootstrap)
//! rather than owning any of their state itself — the teacher's commands
//! layer composes `core::vcs`/`core::config` the same way instead of
//! re-implementing them.

use crate::bootstrap::BootstrapManager;
use crate::error::{HopError, HopResult};
use crate::exec::{Database, FileExecutor};
use crate::manifest::{ManifestStore, PatchStatus};
use crate::patches::PatchManager;
use crate::repo::{ModelGenerator, Repository};
use std::path::Path;

const IDEMPOTENCE_MARKERS: &[&str] = &["ON CONFLICT", "WHERE NOT EXISTS"];

/// Apply a single patch's files, in execution order, against `db`. Bootstrap
/// and data files are not skipped — they run as part of their patch.
pub fn apply_patch(repo: &Repository, patch_id: &str, db: &mut dyn Database) -> HopResult<()> {
  let patches = PatchManager::new(&repo.root);
  let executor = FileExecutor;

  for file in patches.files(patch_id, None)? {
    if file.name.ends_with(".py") {
      executor.execute_python(&file.path, None, &repo.root)?;
    } else {
      executor.execute_sql(&file.path, db)?;
    }
  }
  Ok(())
}

/// Step 3 of `apply_patch`'s production counterpart: ask the external code
/// generator to refresh the developer package + schema snapshot to match
/// the live database. Distinct from `apply_patch` itself so a from-scratch
/// replay (which applies many patches before regenerating once) doesn't pay
/// for regeneration per patch.
pub fn regenerate(repo: &Repository, generator: &dyn ModelGenerator) -> HopResult<()> {
  generator.generate(repo)
}

/// Scan a data file for a recognized idempotence pattern
/// (`ON CONFLICT`, a `DELETE ... WHERE ...; INSERT` pair, or
/// `WHERE NOT EXISTS`). Returns `true` when one is found; the applier warns
/// but does not refuse to run when none are present.
pub fn looks_idempotent(path: &Path) -> HopResult<bool> {
  let content = std::fs::read_to_string(path).map_err(|e| HopError::FileExecution {
    file: path.display().to_string(),
    source: e.to_string(),
  })?;
  let upper = content.to_ascii_uppercase();

  if IDEMPOTENCE_MARKERS.iter().any(|marker| upper.contains(marker)) {
    return Ok(true);
  }
  Ok(upper.contains("DELETE") && upper.contains("WHERE") && upper.contains("INSERT"))
}

/// Warn (via `tracing`) about data files in `patch_id` that carry no
/// recognized idempotence pattern. Never fails the apply.
pub fn warn_non_idempotent_data_files(repo: &Repository, patch_id: &str) -> HopResult<()> {
  let patches = PatchManager::new(&repo.root);
  for file in patches.data_files(patch_id)? {
    match looks_idempotent(&file.path) {
      Ok(true) => {}
      Ok(false) => tracing::warn!(file = %file.path.display(), "data file has no recognized idempotence pattern"),
      Err(e) => tracing::warn!(file = %file.path.display(), error = %e, "failed to scan data file for idempotence"),
    }
  }
  Ok(())
}

/// A from-scratch install: replay the full release lineage from a schema
/// snapshot, rehydrating reference data and running bootstrap, rather than
/// re-running every patch's DDL from the beginning of time.
pub struct FromScratchInstall<'a> {
  pub repo: &'a Repository,
  /// Ordered `(version, manifest_path)` pairs, oldest first, starting at
  /// the schema snapshot's own version (exclusive — its DDL is already
  /// loaded) through the target version.
  pub releases: Vec<(String, std::path::PathBuf)>,
}

impl<'a> FromScratchInstall<'a> {
  /// Load `schema-<base_version>.sql` itself via the caller's own DB
  /// restore step (outside this module's scope — it's a `psql < schema.sql`
  /// invocation the orchestrator performs), then replay every subsequent
  /// release's staged patches' data files, then bootstrap, then register.
  pub fn run(&self, db: &mut dyn Database, target_version: &crate::version::VersionInfo) -> HopResult<()> {
    let executor = FileExecutor;
    let patches = PatchManager::new(&self.repo.root);

    for (_version, manifest_path) in &self.releases {
      let store = ManifestStore::new(manifest_path);
      for (patch_id, status) in store.get_all()? {
        if !matches!(status, PatchStatus::Staged { .. }) {
          continue;
        }
        for file in patches.data_files(&patch_id)? {
          executor.execute_sql(&file.path, db)?;
        }
      }
    }

    let bootstrap = BootstrapManager::new(&self.repo.root);
    bootstrap.run(db, &self.repo.root, false, false, None)?;

    let (major, minor, patch) =
      (target_version.major.to_string(), target_version.minor.to_string(), target_version.patch.to_string());
    db.insert(
      "half_orm_meta.hop_release",
      &[("major", major.as_str()), ("minor", minor.as_str()), ("patch", patch.as_str())],
    )?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::exec::Row;
  use tempfile::TempDir;

  struct FakeDb {
    executed: Vec<String>,
    inserted: Vec<(String, Vec<(String, String)>)>,
  }

  impl Database for FakeDb {
    fn execute(&mut self, sql: &str) -> HopResult<()> {
      self.executed.push(sql.to_string());
      Ok(())
    }
    fn insert(&mut self, table: &str, row: &[(&str, &str)]) -> HopResult<()> {
      self.inserted.push((table.to_string(), row.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()));
      Ok(())
    }
    fn query(&mut self, _sql: &str) -> HopResult<Vec<Row>> {
      Ok(vec![])
    }
    fn name(&self) -> &str {
      "fake"
    }
  }

  #[test]
  fn looks_idempotent_detects_on_conflict() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("01_roles.sql");
    std::fs::write(&path, "insert into roles values (1) on conflict do nothing;").unwrap();
    assert!(looks_idempotent(&path).unwrap());
  }

  #[test]
  fn looks_idempotent_detects_delete_then_insert() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("01_roles.sql");
    std::fs::write(&path, "delete from roles where id = 1; insert into roles values (1);").unwrap();
    assert!(looks_idempotent(&path).unwrap());
  }

  #[test]
  fn looks_idempotent_false_for_plain_insert() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("01_roles.sql");
    std::fs::write(&path, "insert into roles values (1);").unwrap();
    assert!(!looks_idempotent(&path).unwrap());
  }

  #[test]
  fn apply_patch_runs_files_in_order() {
    let dir = TempDir::new().unwrap();
    std::fs::create_dir_all(dir.path().join(".hop")).unwrap();
    crate::config::ProjectConfig {
      hop_version: "1.0.0".to_string(),
      git_origin: None,
      devel: false,
      package_name: None,
    }
    .save(&dir.path().join(".hop"))
    .unwrap();
    std::process::Command::new("git").args(["init", "-q"]).current_dir(dir.path()).status().unwrap();
    std::process::Command::new("git")
      .args(["config", "user.email", "t@example.com"])
      .current_dir(dir.path())
      .status()
      .unwrap();
    std::process::Command::new("git").args(["config", "user.name", "T"]).current_dir(dir.path()).status().unwrap();
    std::fs::write(dir.path().join("README.md"), "x").unwrap();
    std::process::Command::new("git").args(["add", "."]).current_dir(dir.path()).status().unwrap();
    std::process::Command::new("git").args(["commit", "-q", "-m", "init"]).current_dir(dir.path()).status().unwrap();

    let patches = PatchManager::new(dir.path());
    patches.create("1-auth", None).unwrap();
    std::fs::write(dir.path().join("Patches/1-auth/02_b.sql"), "second;").unwrap();
    std::fs::write(dir.path().join("Patches/1-auth/01_a.sql"), "first;").unwrap();

    let repo = Repository::discover(dir.path()).unwrap();
    let mut db = FakeDb { executed: vec![], inserted: vec![] };
    apply_patch(&repo, "1-auth", &mut db).unwrap();
    assert_eq!(db.executed, vec!["first;".to_string(), "second;".to_string()]);
  }
}
