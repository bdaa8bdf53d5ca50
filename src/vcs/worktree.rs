//! Working-tree operations: stage, commit, inspect a tree, hard reset.
//!
//! Grounded on the teacher's `core/vcs/system_git_ops.rs`, which wraps the
//! same handful of plumbing/porcelain commands for its own commit/add flows.

use super::system_git::SystemGit;
use crate::error::{HopError, HopResult, ResultExt};
use std::path::Path;

impl SystemGit {
  /// Stage the given paths (relative to the repo root). An empty slice
  /// stages everything (`git add -A`).
  pub fn add(&self, paths: &[&Path]) -> HopResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("add");
    if paths.is_empty() {
      cmd.arg("-A");
    } else {
      cmd.args(paths);
    }
    let output = cmd.output().context("failed to run git add")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "git add failed: {}",
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Commit currently-staged changes, returning the new commit SHA.
  pub fn commit(&self, message: &str) -> HopResult<String> {
    let output = self
      .git_cmd()
      .args(["commit", "-m", message])
      .output()
      .context("failed to run git commit")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "git commit failed: {}",
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    self.head_commit()
  }

  /// List file paths recorded in a tree-ish, optionally recursing into subtrees.
  pub fn ls_tree(&self, refspec: &str, recursive: bool) -> HopResult<Vec<String>> {
    let mut cmd = self.git_cmd();
    cmd.args(["ls-tree", "--name-only"]);
    if recursive {
      cmd.arg("-r");
    }
    cmd.arg(refspec);
    let output = cmd.output().context("failed to run git ls-tree")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "git ls-tree {} failed: {}",
        refspec,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  /// Commit subjects from `since..until`, oldest first. Used to populate
  /// changelog entries from a patch branch's history.
  pub fn commit_subjects(&self, since: &str, until: &str) -> HopResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["log", "--reverse", "--pretty=format:%s", &format!("{}..{}", since, until)])
      .output()
      .context("failed to run git log")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "git log {}..{} failed: {}",
        since,
        until,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }
}

#[cfg(test)]
mod tests {
  use super::super::system_git::test_support::init_repo;
  use super::*;
  use tempfile::TempDir;

  #[test]
  fn add_and_commit_round_trip() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let git = SystemGit::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("patch.sql"), "select 1;").unwrap();
    git.add(&[]).unwrap();
    let sha = git.commit("add patch").unwrap();
    assert_eq!(sha.len(), 40);
    assert!(git.is_clean().unwrap());
  }

  #[test]
  fn ls_tree_lists_committed_files() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let git = SystemGit::open(dir.path()).unwrap();
    let files = git.ls_tree("HEAD", true).unwrap();
    assert_eq!(files, vec!["README.md".to_string()]);
  }

  #[test]
  fn commit_subjects_lists_in_order() {
    let dir = TempDir::new().unwrap();
    init_repo(dir.path());
    let git = SystemGit::open(dir.path()).unwrap();
    let start = git.head_commit().unwrap();
    std::fs::write(dir.path().join("a.sql"), "select 1;").unwrap();
    git.add(&[]).unwrap();
    git.commit("add a").unwrap();
    std::fs::write(dir.path().join("b.sql"), "select 2;").unwrap();
    git.add(&[]).unwrap();
    git.commit("add b").unwrap();
    let subjects = git.commit_subjects(&start, "HEAD").unwrap();
    assert_eq!(subjects, vec!["add a".to_string(), "add b".to_string()]);
  }
}
