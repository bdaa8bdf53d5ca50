//! Patch Directory Manager (C6)
//!
//! Owns `Patches/<id>/` on disk. Never inspects file *contents* for meaning
//! beyond the `@HOP:data` marker (delegated to [`crate::exec::FileExecutor`])
//! — naming and existence only, the same narrow ownership the teacher's
//! `core::vcs` takes over the working tree (structure, not semantics).

use crate::error::{HopError, HopResult, ResultExt};
use crate::exec::FileExecutor;
use std::path::{Path, PathBuf};

/// One ordered script file within a patch directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
  pub path: PathBuf,
  pub name: String,
  pub is_data: bool,
}

/// Which subset of a patch's files to return.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileKind {
  Sql,
  Python,
}

/// Owns `Patches/` beneath a project root.
pub struct PatchManager {
  root: PathBuf,
}

impl PatchManager {
  pub fn new(project_root: impl AsRef<Path>) -> Self {
    Self { root: project_root.as_ref().join("Patches") }
  }

  fn dir(&self, id: &str) -> PathBuf {
    self.root.join(id)
  }

  /// Create `Patches/<id>/` with a minimal `README.md`. Refuses if the
  /// directory already exists; removes any partial state on write failure.
  pub fn create(&self, id: &str, readme_hint: Option<&str>) -> HopResult<()> {
    let dir = self.dir(id);
    if dir.exists() {
      return Err(HopError::NameConflict {
        kind: crate::error::ConflictKind::ReservationTag,
        name: id.to_string(),
        suggestion: None,
      });
    }

    let result = (|| -> HopResult<()> {
      std::fs::create_dir_all(&dir).context(format!("failed to create {}", dir.display()))?;
      let mut readme = format!("# {}\n", id);
      if let Some(hint) = readme_hint {
        readme.push('\n');
        readme.push_str(hint);
        readme.push('\n');
      }
      std::fs::write(dir.join("README.md"), readme).context("failed to write README.md")?;
      Ok(())
    })();

    if result.is_err() {
      let _ = std::fs::remove_dir_all(&dir);
    }
    result
  }

  /// Validate that a patch directory exists, is readable, and contains at
  /// least one properly-named script file.
  pub fn structure(&self, id: &str) -> HopResult<(bool, Vec<String>)> {
    let dir = self.dir(id);
    let mut errors = Vec::new();

    if !dir.is_dir() {
      errors.push(format!("{} does not exist or is not a directory", dir.display()));
      return Ok((false, errors));
    }

    let entries = match std::fs::read_dir(&dir) {
      Ok(entries) => entries,
      Err(e) => {
        errors.push(format!("cannot read {}: {}", dir.display(), e));
        return Ok((false, errors));
      }
    };

    let has_script = entries
      .filter_map(|e| e.ok())
      .any(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false) && is_ordered_script_name(&e.file_name().to_string_lossy()));

    if !has_script {
      errors.push(format!(
        "{} contains no file matching 'NN_description.{{sql,py}}'",
        dir.display()
      ));
    }

    Ok((errors.is_empty(), errors))
  }

  /// Files in a patch directory, in lexicographic (= execution) order.
  /// Subdirectories and non-matching files are ignored.
  pub fn files(&self, id: &str, kind: Option<FileKind>) -> HopResult<Vec<PatchFile>> {
    let dir = self.dir(id);
    if !dir.is_dir() {
      return Err(HopError::message(format!("patch directory {} does not exist", dir.display())));
    }

    let mut names: Vec<String> = std::fs::read_dir(&dir)
      .context(format!("failed to read {}", dir.display()))?
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().map(|t| t.is_file()).unwrap_or(false))
      .map(|e| e.file_name().to_string_lossy().to_string())
      .filter(|name| is_ordered_script_name(name))
      .filter(|name| match kind {
        None => true,
        Some(FileKind::Sql) => name.ends_with(".sql"),
        Some(FileKind::Python) => name.ends_with(".py"),
      })
      .collect();
    names.sort();

    Ok(
      names
        .into_iter()
        .map(|name| {
          let path = dir.join(&name);
          let is_data = FileExecutor::is_data_file(&path);
          PatchFile { path, name, is_data }
        })
        .collect(),
    )
  }

  /// The subset of `files(id, None)` carrying the `@HOP:data`/`@HOP:bootstrap`
  /// marker, preserving order.
  pub fn data_files(&self, id: &str) -> HopResult<Vec<PatchFile>> {
    Ok(self.files(id, None)?.into_iter().filter(|f| f.is_data).collect())
  }

  /// Every valid patch directory under `Patches/`, sorted by numeric prefix.
  pub fn all_patches(&self) -> HopResult<Vec<String>> {
    if !self.root.is_dir() {
      return Ok(vec![]);
    }
    let mut ids: Vec<(u64, String)> = std::fs::read_dir(&self.root)
      .context(format!("failed to read {}", self.root.display()))?
      .filter_map(|e| e.ok())
      .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
      .filter_map(|e| {
        let name = e.file_name().to_string_lossy().to_string();
        let number: String = name.chars().take_while(|c| c.is_ascii_digit()).collect();
        number.parse::<u64>().ok().map(|n| (n, name))
      })
      .collect();
    ids.sort_by_key(|(n, _)| *n);
    Ok(ids.into_iter().map(|(_, name)| name).collect())
  }
}

/// `NN_description.{sql,py}`: a leading run of digits, an underscore, then
/// any non-empty description, ending in a recognized extension.
fn is_ordered_script_name(name: &str) -> bool {
  let Some((prefix, _rest)) = name.split_once('_') else {
    return false;
  };
  if prefix.is_empty() || !prefix.chars().all(|c| c.is_ascii_digit()) {
    return false;
  }
  name.ends_with(".sql") || name.ends_with(".py")
}

#[cfg(test)]
mod tests {
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn create_refuses_existing_directory() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("1-auth", None).unwrap();
    assert!(mgr.create("1-auth", None).is_err());
  }

  #[test]
  fn create_writes_readme_with_id_heading() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("42-auth", None).unwrap();
    let readme = std::fs::read_to_string(dir.path().join("Patches/42-auth/README.md")).unwrap();
    assert!(readme.starts_with("# 42-auth"));
  }

  #[test]
  fn structure_fails_without_any_script_file() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("1-auth", None).unwrap();
    let (ok, errors) = mgr.structure("1-auth").unwrap();
    assert!(!ok);
    assert_eq!(errors.len(), 1);
  }

  #[test]
  fn structure_passes_with_one_valid_script() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("1-auth", None).unwrap();
    std::fs::write(dir.path().join("Patches/1-auth/01_up.sql"), "select 1;").unwrap();
    let (ok, errors) = mgr.structure("1-auth").unwrap();
    assert!(ok, "{:?}", errors);
  }

  #[test]
  fn files_are_lexicographically_ordered_and_filtered() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("1-auth", None).unwrap();
    let patch_dir = dir.path().join("Patches/1-auth");
    std::fs::write(patch_dir.join("02_b.sql"), "select 1;").unwrap();
    std::fs::write(patch_dir.join("01_a.py"), "print(1)").unwrap();
    std::fs::write(patch_dir.join("notes.txt"), "ignored").unwrap();
    std::fs::create_dir(patch_dir.join("subdir")).unwrap();

    let all = mgr.files("1-auth", None).unwrap();
    assert_eq!(
      all.iter().map(|f| f.name.clone()).collect::<Vec<_>>(),
      vec!["01_a.py".to_string(), "02_b.sql".to_string()]
    );

    let sql_only = mgr.files("1-auth", Some(FileKind::Sql)).unwrap();
    assert_eq!(sql_only.len(), 1);
    assert_eq!(sql_only[0].name, "02_b.sql");
  }

  #[test]
  fn data_files_filters_on_marker() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("1-auth", None).unwrap();
    let patch_dir = dir.path().join("Patches/1-auth");
    std::fs::write(patch_dir.join("01_roles.sql"), "-- @HOP:data\ninsert into roles values (1);").unwrap();
    std::fs::write(patch_dir.join("02_up.sql"), "create table t (id int);").unwrap();

    let data = mgr.data_files("1-auth").unwrap();
    assert_eq!(data.len(), 1);
    assert_eq!(data[0].name, "01_roles.sql");
  }

  #[test]
  fn all_patches_sorts_numerically_not_lexicographically() {
    let dir = TempDir::new().unwrap();
    let mgr = PatchManager::new(dir.path());
    mgr.create("2", None).unwrap();
    mgr.create("10-feature", None).unwrap();
    mgr.create("1", None).unwrap();
    assert_eq!(
      mgr.all_patches().unwrap(),
      vec!["1".to_string(), "2".to_string(), "10-feature".to_string()]
    );
  }
}
