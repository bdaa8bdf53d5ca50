//! Release Orchestrator (C8)
//!
//! The release lifecycle state machine: reserve a patch number, stage it,
//! promote stage → rc → production, deploy. Every operation here composes
//! C1/C2 (validation), C4 (Git), C5 (manifest), C6 (patch directories), C9
//! (apply), and C10 (repository layout) — it owns no storage of its own.
//!
//! Failure semantics follow spec.md §4.8: every step that mutates Git state
//! captures the pre-command commit first, so a failure can `git reset
//! --hard` back to a recoverable point before reporting the error.

use crate::error::{ConflictKind, HopError, HopResult};
use crate::exec::{Database, FileExecutor};
use crate::manifest::ManifestStore;
use crate::patch_id::{self, PatchInfo};
use crate::patches::PatchManager;
use crate::repo::Repository;
use crate::version::{BranchKind, ReleaseKind, VersionInfo};
use crate::{applier, bootstrap};
use std::collections::BTreeMap;
use std::path::PathBuf;

const PROD_BRANCH: &str = "ho-prod";
const ORIGIN: &str = "origin";

/// Fail unless the working tree is clean and checked out on `ho-prod`.
fn require_clean_on_prod(repo: &Repository) -> HopResult<()> {
  let branch = repo.git.current_branch()?;
  if branch != PROD_BRANCH {
    return Err(HopError::WrongBranch {
      required: PROD_BRANCH.to_string(),
      actual: branch,
    });
  }
  let dirty = repo.git.dirty_paths()?;
  if !dirty.is_empty() {
    return Err(HopError::DirtyRepository { paths: dirty });
  }
  Ok(())
}

/// Reset `ho-prod` to `checkpoint` after a failed local-phase mutation, per
/// the orchestrator's checkpoint/rollback failure semantics.
fn rollback(repo: &Repository, checkpoint: &str) {
  if let Err(e) = repo.git.hard_reset(checkpoint) {
    tracing::error!(error = %e, checkpoint, "failed to roll back after orchestrator error");
  }
}

/// `create-patch <id_or_number>`: reserve a patch number/slug, branch, and
/// scaffold its directory.
pub fn create_patch(repo: &Repository, id_or_number: &str) -> HopResult<PatchInfo> {
  require_clean_on_prod(repo)?;
  if !repo.git.has_remote(ORIGIN)? {
    return Err(HopError::message("no 'origin' remote configured"));
  }
  if !repo.git.is_branch_synced(PROD_BRANCH, ORIGIN)?.is_synced() {
    return Err(HopError::BranchNotSynced {
      branch: PROD_BRANCH.to_string(),
      reason: crate::error::SyncReason::Diverged,
    });
  }

  let info = reserve_patch_number(repo, id_or_number)?;
  let checkpoint = repo.git.head_commit()?;

  let result = (|| -> HopResult<()> {
    let branch_name = format!("ho-patch/{}", info.canonical);
    repo.git.create_branch(&branch_name, PROD_BRANCH)?;
    repo.git.checkout(&branch_name)?;

    let patches = PatchManager::new(&repo.root);
    patches.create(&info.canonical, None)?;

    repo.git.add(&[])?;
    repo.git.commit(&format!("Create patch {}", info.canonical))?;
    repo.git.push_branch(&branch_name, ORIGIN)?;
    Ok(())
  })();

  if let Err(e) = &result {
    let _ = repo.git.checkout(PROD_BRANCH);
    rollback(repo, &checkpoint);
    let _ = repo.git.delete_local_tag(&format!("ho-patch/{}", info.number));
    return Err(HopError::message(format!("create-patch failed: {}", e)));
  }

  Ok(info)
}

/// Reserve a patch number via the C4 reservation protocol: either exactly
/// `N` from `N-slug`, or probe upward from 1 for a bare number request.
fn reserve_patch_number(repo: &Repository, id_or_number: &str) -> HopResult<PatchInfo> {
  repo.git.fetch_tags(ORIGIN)?;

  if id_or_number.contains('-') {
    let info = patch_id::validate(id_or_number)?;
    try_reserve(repo, &info)?;
    return Ok(info);
  }

  // Bare request: either a specific number, or probe for the next free one
  // starting at the number given (or 1, if the caller passed no hint).
  let start: u64 = id_or_number.parse().unwrap_or(1);
  let mut candidate = start.max(1);
  loop {
    let info = PatchInfo {
      number: candidate,
      slug: None,
      canonical: candidate.to_string(),
    };
    match try_reserve(repo, &info) {
      Ok(()) => return Ok(info),
      Err(HopError::NameConflict { .. }) => {
        candidate += 1;
        continue;
      }
      Err(e) => return Err(e),
    }
  }
}

fn try_reserve(repo: &Repository, info: &PatchInfo) -> HopResult<()> {
  let tag = format!("ho-patch/{}", info.number);
  if repo.git.tag_exists(&tag, None)? || repo.git.tag_exists(&tag, Some(ORIGIN))? {
    return Err(HopError::NameConflict {
      kind: ConflictKind::ReservationTag,
      name: info.canonical.clone(),
      suggestion: Some((info.number + 1).to_string()),
    });
  }

  repo.git.create_tag(&tag, None)?;
  if let Err(e) = repo.git.push_tag(&tag, ORIGIN) {
    tracing::debug!(error = %e, "push_tag failed after local reservation, someone else won the race");
    let _ = repo.git.delete_local_tag(&tag);
    return Err(HopError::NameConflict {
      kind: ConflictKind::ReservationTag,
      name: info.canonical.clone(),
      suggestion: Some((info.number + 1).to_string()),
    });
  }
  Ok(())
}

/// The highest `vX.Y.Z` (non-`-rc`) tag on `ho-prod`, or `0.0.0` initially.
pub fn current_production_version(repo: &Repository) -> HopResult<VersionInfo> {
  let tags = repo.git.list_tags("v*")?;
  let mut versions: Vec<VersionInfo> = tags
    .iter()
    .filter(|t| !t.contains("-rc"))
    .filter_map(|t| t.strip_prefix('v'))
    .filter_map(|s| VersionInfo::parse(s).ok())
    .collect();
  versions.sort();
  Ok(versions.into_iter().next_back().unwrap_or(VersionInfo::ZERO))
}

/// File names directly under `releases/`, or an empty list if it doesn't exist yet.
fn release_manifest_filenames(repo: &Repository) -> Vec<String> {
  std::fs::read_dir(repo.releases_dir())
    .into_iter()
    .flatten()
    .filter_map(|e| e.ok())
    .map(|e| e.file_name().to_string_lossy().to_string())
    .collect()
}

fn stage_manifest_path(repo: &Repository, version: &VersionInfo) -> PathBuf {
  repo.releases_dir().join(format!("{}-stage.toml", version.render()))
}

fn rc_manifest_path(repo: &Repository, version: &VersionInfo, k: u32) -> PathBuf {
  repo.releases_dir().join(format!("{}-rc{}.toml", version.render(), k))
}

/// `prepare-release <kind>`: compute the next version and open an empty stage.
pub fn prepare_release(repo: &Repository, kind: ReleaseKind) -> HopResult<VersionInfo> {
  require_clean_on_prod(repo)?;

  let current = current_production_version(repo)?;
  let target = VersionInfo::next_version(&current, kind);
  let manifest_path = stage_manifest_path(repo, &target);

  if manifest_path.exists() {
    return Err(HopError::NameConflict {
      kind: ConflictKind::StageManifest,
      name: target.render(),
      suggestion: None,
    });
  }

  ManifestStore::new(&manifest_path).create_empty()?;
  repo.git.add(&[])?;
  repo.git.commit(&format!("Prepare release {} (stage)", target.render()))?;
  Ok(target)
}

/// `add-to-release <patch_id>`: merge a patch branch into `ho-prod`, apply
/// it against the developer database, and record it as staged.
pub fn add_to_release(repo: &Repository, patch_id: &str, version: &VersionInfo, db: &mut dyn Database) -> HopResult<String> {
  require_clean_on_prod(repo)?;

  let manifest_path = stage_manifest_path(repo, version);
  let store = ManifestStore::new(&manifest_path);
  if !store.exists() {
    return Err(HopError::message(format!("no open stage manifest for {}", version.render())));
  }

  for name in release_manifest_filenames(repo) {
    if !name.ends_with(".toml") {
      continue;
    }
    let other = ManifestStore::new(repo.releases_dir().join(&name));
    if other.get_patches(None)?.iter().any(|id| id == patch_id) {
      return Err(HopError::PatchAlreadyInRelease {
        patch_id: patch_id.to_string(),
        manifest: name,
      });
    }
  }

  let branch_name = format!("ho-patch/{}", patch_id);
  let checkpoint = repo.git.head_commit()?;

  let result = (|| -> HopResult<String> {
    let merge_message = format!("Integrate {} into {}", patch_id, version.render());
    let merge_sha = repo.git.merge(&branch_name, &merge_message, crate::vcs::MergeMode::NoFastForward)?;

    applier::apply_patch(repo, patch_id, db)?;
    applier::warn_non_idempotent_data_files(repo, patch_id)?;

    store.add_patch(patch_id)?;
    store.move_to_staged(patch_id, &merge_sha)?;

    let archived_name = format!("ho-release/{}/{}", version.render(), patch_id);
    repo.git.rename_branch(&branch_name, &archived_name)?;
    let _ = repo.git.delete_remote_branch(&branch_name, ORIGIN);

    repo.git.add(&[])?;
    repo.git.commit(&format!("Stage {} in {}", patch_id, version.render()))?;
    repo.git.push_branch(PROD_BRANCH, ORIGIN)?;
    Ok(merge_sha)
  })();

  if result.is_err() {
    rollback(repo, &checkpoint);
  }
  result
}

/// `promote-to-rc`: freeze a fully-staged stage manifest into the next RC.
pub fn promote_to_rc(repo: &Repository, version: &VersionInfo, db: &crate::config::DatabaseConfig) -> HopResult<u32> {
  require_clean_on_prod(repo)?;

  let stage_path = stage_manifest_path(repo, version);
  let store = ManifestStore::new(&stage_path);
  if !store.exists() {
    return Err(HopError::message(format!("no open stage manifest for {}", version.render())));
  }

  let candidates = store.get_patches(Some("candidate"))?;
  if !candidates.is_empty() {
    return Err(HopError::StageHasCandidates {
      manifest: stage_path.file_name().unwrap().to_string_lossy().to_string(),
      candidates,
    });
  }

  if store.get_patches(None)?.is_empty() {
    return Err(HopError::message(format!("stage {} has no staged patches to promote", version.render())));
  }

  let next_k = next_rc_number(repo, version)?;
  let checkpoint = repo.git.head_commit()?;

  let result = (|| -> HopResult<()> {
    let rc_path = rc_manifest_path(repo, version, next_k);
    std::fs::rename(&stage_path, &rc_path).map_err(HopError::from)?;
    ManifestStore::new(&stage_path).create_empty()?;

    repo.dump_schema(db, &version.render())?;

    let rc_store = ManifestStore::new(&rc_path);
    for patch_id in rc_store.get_patches(None)? {
      let branch_name = format!("ho-patch/{}", patch_id);
      let _ = repo.git.delete_local_branch(&branch_name);
      let _ = repo.git.delete_remote_branch(&branch_name, ORIGIN);
    }

    repo.git.add(&[])?;
    repo.git.commit(&format!("Promote {} stage → rc{}", version.render(), next_k))?;
    repo.git.create_tag(&format!("v{}-rc{}", version.render(), next_k), None)?;
    repo.git.push_branch(PROD_BRANCH, ORIGIN)?;
    repo.git.push_tag(&format!("v{}-rc{}", version.render(), next_k), ORIGIN)?;
    Ok(())
  })();

  if result.is_err() {
    rollback(repo, &checkpoint);
    return Err(result.unwrap_err());
  }
  Ok(next_k)
}

fn next_rc_number(repo: &Repository, version: &VersionInfo) -> HopResult<u32> {
  let prefix = format!("{}-rc", version.render());
  let mut max_k = 0u32;
  for name in release_manifest_filenames(repo) {
    if let Some(rest) = name.strip_prefix(&prefix) {
      if let Some(num) = rest.strip_suffix(".toml").and_then(|s| s.parse::<u32>().ok()) {
        max_k = max_k.max(num);
      }
    }
  }
  Ok(max_k + 1)
}

/// `promote-to-prod`: tag the highest RC's commit as the production release.
pub fn promote_to_prod(repo: &Repository, version: &VersionInfo) -> HopResult<()> {
  require_clean_on_prod(repo)?;

  highest_existing_rc(repo, version)?.ok_or_else(|| HopError::message(format!("no rc exists yet for {}", version.render())))?;

  let checkpoint = repo.git.head_commit()?;
  let result = (|| -> HopResult<()> {
    repo.git.create_tag(&version.release_tag(), None)?;
    repo.write_metadata_sql(version)?;
    repo.git.add(&[])?;
    repo.git.commit(&format!("Promote {} to production", version.render()))?;
    repo.git.push_branch(PROD_BRANCH, ORIGIN)?;
    repo.git.push_tag(&version.release_tag(), ORIGIN)?;
    Ok(())
  })();

  if result.is_err() {
    rollback(repo, &checkpoint);
  }
  result
}

fn highest_existing_rc(repo: &Repository, version: &VersionInfo) -> HopResult<Option<u32>> {
  let n = next_rc_number(repo, version)?;
  Ok(if n == 1 { None } else { Some(n - 1) })
}

/// `deploy-to-prod <V>`: apply the release's staged patches against a
/// target production database, run bootstrap, register the release row.
pub fn deploy_to_prod(repo: &Repository, version: &VersionInfo, db: &mut dyn Database) -> HopResult<()> {
  repo.git.checkout(&version.release_tag())?;

  let highest_rc = highest_existing_rc(repo, version)?
    .ok_or_else(|| HopError::message(format!("no rc was ever promoted for {}", version.render())))?;
  let manifest_path = rc_manifest_path(repo, version, highest_rc);
  let store = ManifestStore::new(&manifest_path);

  for (patch_id, status) in store.get_all()? {
    if matches!(status, crate::manifest::PatchStatus::Staged { .. }) {
      applier::apply_patch(repo, &patch_id, db)?;
    }
  }

  let bootstrap_mgr = bootstrap::BootstrapManager::new(&repo.root);
  bootstrap_mgr.run(db, &repo.root, false, false, None)?;

  let (major, minor, patch) = (version.major.to_string(), version.minor.to_string(), version.patch.to_string());
  db.insert(
    "half_orm_meta.hop_release",
    &[("major", major.as_str()), ("minor", minor.as_str()), ("patch", patch.as_str())],
  )?;
  Ok(())
}

/// Every distinct version with at least one rc manifest at or below
/// `target`, paired with its highest-numbered rc manifest path, oldest
/// first. Used to replay release data in version order during a restore.
fn releases_up_to(repo: &Repository, target: &VersionInfo) -> Vec<(VersionInfo, PathBuf)> {
  let mut by_version: BTreeMap<VersionInfo, (u32, PathBuf)> = BTreeMap::new();
  for name in release_manifest_filenames(repo) {
    let Some(rest) = name.strip_suffix(".toml") else { continue };
    let Some((ver_str, rc_str)) = rest.rsplit_once("-rc") else { continue };
    let (Ok(version), Ok(k)) = (VersionInfo::parse(ver_str), rc_str.parse::<u32>()) else { continue };
    if &version > target {
      continue;
    }
    let path = repo.releases_dir().join(&name);
    by_version
      .entry(version)
      .and_modify(|(existing_k, existing_path)| {
        if k > *existing_k {
          *existing_k = k;
          *existing_path = path.clone();
        }
      })
      .or_insert((k, path));
  }
  by_version.into_iter().map(|(version, (_, path))| (version, path)).collect()
}

/// `restore <version>`: rebuild a database from `schema-<version>.sql` plus
/// every subsequent release's staged data and bootstrap, up to and
/// including `version`. Per spec.md's explicit non-goal, this is a
/// whole-database replacement, never a mid-patch transactional rollback.
pub fn restore(repo: &Repository, target: &VersionInfo, db: &mut dyn Database) -> HopResult<()> {
  let snapshot = repo.schema_snapshot(&target.render())?;
  FileExecutor.execute_sql_via_psql(&snapshot, db.name())?;

  let releases = releases_up_to(repo, target).into_iter().map(|(version, path)| (version.render(), path)).collect();
  let install = applier::FromScratchInstall { repo, releases };
  install.run(db, target)
}

/// The highest production tag strictly before `before`, if any.
pub fn previous_production_version(repo: &Repository, before: &VersionInfo) -> HopResult<Option<VersionInfo>> {
  let tags = repo.git.list_tags("v*")?;
  let mut versions: Vec<VersionInfo> = tags
    .iter()
    .filter(|t| !t.contains("-rc"))
    .filter_map(|t| t.strip_prefix('v'))
    .filter_map(|s| VersionInfo::parse(s).ok())
    .filter(|v| v < before)
    .collect();
  versions.sort();
  Ok(versions.into_iter().next_back())
}

/// `rollback`: restore the database to the production version immediately
/// before the current one. Not a mid-patch undo — a full restore to an
/// earlier whole-database snapshot, same as `restore` with an implicit
/// target.
pub fn rollback_to_previous(repo: &Repository, db: &mut dyn Database) -> HopResult<VersionInfo> {
  let current = current_production_version(repo)?;
  let target = previous_production_version(repo, &current)?
    .ok_or_else(|| HopError::message("no previous production version to roll back to"))?;
  restore(repo, &target, db)?;
  Ok(target)
}

/// `upgrade`: bring a production database up to the latest tagged release.
pub fn upgrade(repo: &Repository, db: &mut dyn Database) -> HopResult<VersionInfo> {
  let target = current_production_version(repo)?;
  deploy_to_prod(repo, &target, db)?;
  Ok(target)
}

/// `create-hotfix <version>`: same reservation/branch/scaffold sequence as
/// `create-patch`, but rooted at a maintenance branch instead of `ho-prod`,
/// for a fix against an already-released line.
pub fn create_hotfix(repo: &Repository, base_version: &VersionInfo, id_or_number: &str) -> HopResult<PatchInfo> {
  let maintenance_branch = base_version.branch_name(BranchKind::Production);
  if !repo.git.branch_exists(&maintenance_branch, None)? {
    repo.git.create_branch(&maintenance_branch, &base_version.release_tag())?;
  }
  repo.git.checkout(&maintenance_branch)?;
  create_patch(repo, id_or_number)
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn current_production_version_defaults_to_zero_without_tags() {
    let dir = tempfile::TempDir::new().unwrap();
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

    std::fs::create_dir_all(dir.path().join(".hop")).unwrap();
    crate::config::ProjectConfig {
      hop_version: "1.0.0".to_string(),
      git_origin: None,
      devel: false,
      package_name: None,
    }
    .save(&dir.path().join(".hop"))
    .unwrap();

    let repo = Repository::discover(dir.path()).unwrap();
    assert_eq!(current_production_version(&repo).unwrap(), VersionInfo::ZERO);
  }

  #[test]
  fn previous_production_version_skips_rc_tags_and_later_releases() {
    let dir = tempfile::TempDir::new().unwrap();
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
    for tag in ["v1.0.0", "v1.1.0-rc1", "v1.1.0", "v2.0.0"] {
      std::process::Command::new("git").args(["tag", tag]).current_dir(dir.path()).status().unwrap();
    }

    std::fs::create_dir_all(dir.path().join(".hop")).unwrap();
    crate::config::ProjectConfig {
      hop_version: "1.0.0".to_string(),
      git_origin: None,
      devel: false,
      package_name: None,
    }
    .save(&dir.path().join(".hop"))
    .unwrap();

    let repo = Repository::discover(dir.path()).unwrap();
    let before = VersionInfo::parse("2.0.0").unwrap();
    let previous = previous_production_version(&repo, &before).unwrap().unwrap();
    assert_eq!(previous.render(), "1.1.0");
  }
}
