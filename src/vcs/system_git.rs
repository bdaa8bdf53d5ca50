//! Core `SystemGit` handle: open, isolated command builder, and the
//! metadata queries every other operation is built on.
//!
//! Grounded on `core/vcs/system_git.rs` in the teacher: one subprocess call
//! to open, an isolated-environment command builder, and no interior
//! mutability for caching (the teacher's source notes the perf difference
//! of caching HEAD/branch is negligible; we follow the same call-every-time
//! style).

use crate::error::{HopError, HopResult, ResultExt};
use std::path::{Path, PathBuf};
use std::process::Command;

/// A handle onto a Git working copy, operating exclusively through the
/// system `git` binary.
pub struct SystemGit {
  pub(crate) repo_path: PathBuf,
  pub(crate) git_dir: PathBuf,
  pub(crate) work_tree: PathBuf,
}

impl SystemGit {
  /// Open a git repository rooted at (or inside) `path`.
  pub fn open(path: &Path) -> HopResult<Self> {
    let output = Command::new("git")
      .arg("-C")
      .arg(path)
      .args(["rev-parse", "--git-dir", "--show-toplevel"])
      .output()
      .context("failed to execute git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      if stderr.contains("not a git repository") {
        return Err(HopError::message(format!("not a git repository: {}", path.display())));
      }
      return Err(HopError::message(format!("failed to open git repository: {}", stderr)));
    }

    let stdout = String::from_utf8_lossy(&output.stdout);
    let mut lines = stdout.lines();
    let git_dir = lines.next().ok_or_else(|| HopError::message("git rev-parse returned no output"))?;
    let work_tree = lines
      .next()
      .ok_or_else(|| HopError::message("git rev-parse missing work tree (bare repository?)"))?;

    Ok(Self {
      repo_path: path.to_path_buf(),
      git_dir: PathBuf::from(git_dir),
      work_tree: PathBuf::from(work_tree),
    })
  }

  /// The repository's working-tree root.
  pub fn root(&self) -> &Path {
    &self.work_tree
  }

  /// HEAD commit SHA.
  pub fn head_commit(&self) -> HopResult<String> {
    self.rev_parse("HEAD")
  }

  /// Resolve any ref-ish (branch, tag, `HEAD~1`, ...) to a commit SHA.
  pub fn rev_parse(&self, refspec: &str) -> HopResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", refspec])
      .output()
      .context("failed to run git rev-parse")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(HopError::message(format!("git rev-parse {} failed: {}", refspec, stderr)));
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Current branch name, or `"HEAD"` when detached.
  pub fn current_branch(&self) -> HopResult<String> {
    let output = self
      .git_cmd()
      .args(["rev-parse", "--abbrev-ref", "HEAD"])
      .output()
      .context("failed to get current branch")?;

    if !output.status.success() {
      return Ok("HEAD".to_string());
    }

    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }

  /// Whether the working tree (staged + unstaged) has no local modifications.
  pub fn is_clean(&self) -> HopResult<bool> {
    Ok(self.dirty_paths()?.is_empty())
  }

  /// The set of paths with uncommitted changes, staged or not.
  pub fn dirty_paths(&self) -> HopResult<Vec<String>> {
    let output = self
      .git_cmd()
      .args(["status", "--porcelain"])
      .output()
      .context("failed to run git status")?;

    if !output.status.success() {
      let stderr = String::from_utf8_lossy(&output.stderr);
      return Err(HopError::message(format!("git status failed: {}", stderr)));
    }

    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(|l| l[3.min(l.len())..].trim().to_string())
        .collect(),
    )
  }

  /// Whether a named remote is configured.
  pub fn has_remote(&self, name: &str) -> HopResult<bool> {
    let output = self.git_cmd().args(["remote"]).output().context("failed to list remotes")?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().any(|l| l.trim() == name))
  }

  /// Build a `git` command rooted at this repo with an isolated environment:
  /// only `PATH`/`HOME` survive, and a handful of safe config overrides are
  /// forced regardless of the user's global config.
  pub(crate) fn git_cmd(&self) -> Command {
    let mut cmd = Command::new("git");
    cmd.arg("-C").arg(&self.repo_path);
    cmd.env_clear();
    if let Ok(path) = std::env::var("PATH") {
      cmd.env("PATH", path);
    }
    if let Ok(home) = std::env::var("HOME") {
      cmd.env("HOME", home);
    }
    cmd.arg("-c").arg("protocol.version=2");
    cmd.arg("-c").arg("advice.detachedHead=false");
    cmd.arg("-c").arg("core.quotePath=false");
    cmd
  }

  #[allow(dead_code)]
  pub(crate) fn git_dir(&self) -> &Path {
    &self.git_dir
  }
}
