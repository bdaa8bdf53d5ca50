//! Release-Manifest Store (C5)
//!
//! Persists the ordered (patch_id, status, merge_commit?) list for one
//! release level as a TOML document under `releases/`. Grounded on the
//! teacher's `toml_edit`-backed config load/save in `core/config.rs`, which
//! this mirrors: read the whole document, mutate the typed view, write the
//! whole document back — `toml_edit` preserves key insertion order, which is
//! load-bearing here (iteration order is the manifest's own invariant).

use crate::error::{HopError, HopResult, ResultExt};
use std::path::{Path, PathBuf};
use toml_edit::{DocumentMut, Item, Table, value};

/// A patch's position in a release manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PatchStatus {
  Candidate,
  Staged { merge_commit: String },
}

/// A TOML-backed manifest for one `releases/<version>-<stage>.toml` file.
pub struct ManifestStore {
  path: PathBuf,
}

impl ManifestStore {
  pub fn new(path: impl AsRef<Path>) -> Self {
    Self { path: path.as_ref().to_path_buf() }
  }

  pub fn exists(&self) -> bool {
    self.path.exists()
  }

  /// Write an empty `[patches]` table. Idempotent: a pre-existing manifest
  /// is left untouched.
  pub fn create_empty(&self) -> HopResult<()> {
    if self.exists() {
      return Ok(());
    }
    if let Some(parent) = self.path.parent() {
      std::fs::create_dir_all(parent).context(format!("failed to create {}", parent.display()))?;
    }
    let mut doc = DocumentMut::new();
    doc["patches"] = Item::Table(Table::new());
    self.write(&doc)
  }

  /// Add `id` as a `candidate`. Fails if `id` is already present.
  pub fn add_patch(&self, id: &str) -> HopResult<()> {
    let mut doc = self.read_or_empty()?;
    let patches = Self::patches_table_mut(&mut doc)?;
    if patches.contains_key(id) {
      return Err(HopError::PatchAlreadyInRelease {
        patch_id: id.to_string(),
        manifest: self.display_name(),
      });
    }
    let mut entry = Table::new();
    entry["status"] = value("candidate");
    patches.insert(id, Item::Table(entry));
    self.write(&doc)
  }

  /// Transition `id` from `candidate` to `staged`, recording `merge_commit`.
  pub fn move_to_staged(&self, id: &str, merge_commit: &str) -> HopResult<()> {
    let mut doc = self.read_or_empty()?;
    let patches = Self::patches_table_mut(&mut doc)?;
    let entry = patches
      .get_mut(id)
      .and_then(Item::as_table_mut)
      .ok_or_else(|| HopError::message(format!("patch '{}' is not present in {}", id, self.display_name())))?;

    let status = entry.get("status").and_then(Item::as_str).unwrap_or("");
    if status == "staged" {
      return Err(HopError::message(format!(
        "patch '{}' is already staged in {}",
        id,
        self.display_name()
      )));
    }
    if status != "candidate" {
      return Err(HopError::message(format!(
        "patch '{}' has unexpected status '{}' in {}",
        id,
        status,
        self.display_name()
      )));
    }

    entry["status"] = value("staged");
    entry["merge_commit"] = value(merge_commit);
    self.write(&doc)
  }

  /// Remove `id`, regardless of status.
  pub fn remove_patch(&self, id: &str) -> HopResult<()> {
    let mut doc = self.read_or_empty()?;
    let patches = Self::patches_table_mut(&mut doc)?;
    patches.remove(id);
    self.write(&doc)
  }

  /// Patch ids in insertion order, optionally filtered by status.
  pub fn get_patches(&self, status: Option<&str>) -> HopResult<Vec<String>> {
    let doc = self.read_or_empty()?;
    let Some(patches) = doc.get("patches").and_then(Item::as_table) else {
      return Ok(vec![]);
    };
    Ok(
      patches
        .iter()
        .filter(|(_, item)| match status {
          None => true,
          Some(want) => item.as_table().and_then(|t| t.get("status")).and_then(Item::as_str) == Some(want),
        })
        .map(|(id, _)| id.to_string())
        .collect(),
    )
  }

  /// All patches with their parsed status, in insertion order.
  pub fn get_all(&self) -> HopResult<Vec<(String, PatchStatus)>> {
    let doc = self.read_or_empty()?;
    let Some(patches) = doc.get("patches").and_then(Item::as_table) else {
      return Ok(vec![]);
    };
    patches
      .iter()
      .map(|(id, item)| {
        let table = item
          .as_table()
          .ok_or_else(|| HopError::message(format!("malformed manifest entry for '{}'", id)))?;
        let status = table.get("status").and_then(Item::as_str).unwrap_or("candidate");
        let parsed = if status == "staged" {
          let sha = table
            .get("merge_commit")
            .and_then(Item::as_str)
            .ok_or_else(|| HopError::message(format!("staged patch '{}' is missing merge_commit", id)))?;
          PatchStatus::Staged { merge_commit: sha.to_string() }
        } else {
          PatchStatus::Candidate
        };
        Ok((id.to_string(), parsed))
      })
      .collect()
  }

  /// The merge commit recorded for a staged patch, if any.
  pub fn get_merge_commit(&self, id: &str) -> HopResult<Option<String>> {
    let doc = self.read_or_empty()?;
    Ok(
      doc
        .get("patches")
        .and_then(Item::as_table)
        .and_then(|t| t.get(id))
        .and_then(Item::as_table)
        .and_then(|t| t.get("merge_commit"))
        .and_then(Item::as_str)
        .map(str::to_string),
    )
  }

  fn patches_table_mut(doc: &mut DocumentMut) -> HopResult<&mut Table> {
    if doc.get("patches").is_none() {
      doc["patches"] = Item::Table(Table::new());
    }
    doc["patches"]
      .as_table_mut()
      .ok_or_else(|| HopError::message("manifest 'patches' key is not a table"))
  }

  fn read_or_empty(&self) -> HopResult<DocumentMut> {
    if !self.exists() {
      let mut doc = DocumentMut::new();
      doc["patches"] = Item::Table(Table::new());
      return Ok(doc);
    }
    let content = std::fs::read_to_string(&self.path).context(format!("failed to read {}", self.path.display()))?;
    content.parse::<DocumentMut>().context(format!("failed to parse {}", self.path.display()))
  }

  fn write(&self, doc: &DocumentMut) -> HopResult<()> {
    std::fs::write(&self.path, doc.to_string()).context(format!("failed to write {}", self.path.display()))
  }

  fn display_name(&self) -> String {
    self.path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_else(|| self.path.display().to_string())
  }

  /// Read a legacy `<version>-<stage>.txt` file: one patch id per line,
  /// every entry implicitly `candidate` (legacy files predate staged
  /// tracking; callers that need merge commits must consult Git history).
  pub fn read_legacy(path: &Path) -> HopResult<Vec<String>> {
    let content = std::fs::read_to_string(path).context(format!("failed to read {}", path.display()))?;
    Ok(content.lines().map(str::trim).filter(|l| !l.is_empty()).map(str::to_string).collect())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  fn store(dir: &TempDir) -> ManifestStore {
    ManifestStore::new(dir.path().join("0.1.0-stage.toml"))
  }

  #[test]
  fn create_empty_is_idempotent() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    let first = std::fs::read_to_string(dir.path().join("0.1.0-stage.toml")).unwrap();
    store.create_empty().unwrap();
    let second = std::fs::read_to_string(dir.path().join("0.1.0-stage.toml")).unwrap();
    assert_eq!(first, second);
  }

  #[test]
  fn add_then_move_to_staged_round_trips() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    store.add_patch("42-auth").unwrap();
    assert_eq!(store.get_patches(Some("candidate")).unwrap(), vec!["42-auth".to_string()]);

    store.move_to_staged("42-auth", "deadbeef").unwrap();
    assert_eq!(store.get_patches(Some("candidate")).unwrap(), Vec::<String>::new());
    assert_eq!(store.get_patches(Some("staged")).unwrap(), vec!["42-auth".to_string()]);
    assert_eq!(store.get_merge_commit("42-auth").unwrap().as_deref(), Some("deadbeef"));
  }

  #[test]
  fn add_patch_rejects_duplicate() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    store.add_patch("1").unwrap();
    let err = store.add_patch("1").unwrap_err();
    assert!(matches!(err, HopError::PatchAlreadyInRelease { .. }));
  }

  #[test]
  fn move_to_staged_rejects_unknown_patch() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    assert!(store.move_to_staged("99", "sha").is_err());
  }

  #[test]
  fn move_to_staged_rejects_already_staged() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    store.add_patch("1").unwrap();
    store.move_to_staged("1", "sha1").unwrap();
    assert!(store.move_to_staged("1", "sha2").is_err());
  }

  #[test]
  fn insertion_order_is_preserved() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    store.add_patch("10").unwrap();
    store.add_patch("2").unwrap();
    store.add_patch("30").unwrap();
    assert_eq!(
      store.get_patches(None).unwrap(),
      vec!["10".to_string(), "2".to_string(), "30".to_string()]
    );
  }

  #[test]
  fn remove_patch_drops_any_status() {
    let dir = TempDir::new().unwrap();
    let store = store(&dir);
    store.create_empty().unwrap();
    store.add_patch("1").unwrap();
    store.remove_patch("1").unwrap();
    assert!(store.get_patches(None).unwrap().is_empty());
  }

  #[test]
  fn read_legacy_parses_plain_text() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("0.1.0-stage.txt");
    std::fs::write(&path, "1\n2-auth\n\n3\n").unwrap();
    let ids = ManifestStore::read_legacy(&path).unwrap();
    assert_eq!(ids, vec!["1".to_string(), "2-auth".to_string(), "3".to_string()]);
  }
}
