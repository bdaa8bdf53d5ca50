//! Branch and tag ref operations for [`SystemGit`].
//!
//! This is where the reservation protocol (spec.md §4.4) lives: tags double
//! as a distributed compare-and-set over the remote, since a ref push is
//! atomic per-ref at the Git server.

use super::system_git::SystemGit;
use super::{MergeMode, SyncStatus};
use crate::error::{HopError, HopResult, ResultExt, SyncReason};

impl SystemGit {
  /// Fetch from `remote` (branches only).
  pub fn fetch(&self, remote: &str) -> HopResult<()> {
    let output = self.git_cmd().args(["fetch", remote]).output().context("failed to run git fetch")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("fetch {}", remote),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Fetch tags from `remote`.
  pub fn fetch_tags(&self, remote: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["fetch", remote, "--tags", "--force"])
      .output()
      .context("failed to run git fetch --tags")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("fetch-tags {}", remote),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Whether a tag exists locally, or (when `remote` is `Some`) on that remote.
  pub fn tag_exists(&self, name: &str, remote: Option<&str>) -> HopResult<bool> {
    match remote {
      None => {
        let output = self
          .git_cmd()
          .args(["tag", "-l", name])
          .output()
          .context("failed to list local tags")?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
      }
      Some(remote) => {
        let output = self
          .git_cmd()
          .args(["ls-remote", "--tags", remote, &format!("refs/tags/{}", name)])
          .output()
          .context("failed to list remote tags")?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
      }
    }
  }

  /// Local tag names matching a `git tag -l` glob pattern (e.g. `"v*"`).
  pub fn list_tags(&self, pattern: &str) -> HopResult<Vec<String>> {
    let output = self.git_cmd().args(["tag", "-l", pattern]).output().context("failed to list tags")?;
    Ok(
      String::from_utf8_lossy(&output.stdout)
        .lines()
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect(),
    )
  }

  /// Whether a branch exists locally, or (when `remote` is `Some`) on that remote.
  pub fn branch_exists(&self, name: &str, remote: Option<&str>) -> HopResult<bool> {
    match remote {
      None => {
        let output = self
          .git_cmd()
          .args(["branch", "--list", name])
          .output()
          .context("failed to list local branches")?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
      }
      Some(remote) => {
        let output = self
          .git_cmd()
          .args(["ls-remote", "--heads", remote, name])
          .output()
          .context("failed to list remote branches")?;
        Ok(!String::from_utf8_lossy(&output.stdout).trim().is_empty())
      }
    }
  }

  /// Create a lightweight or annotated tag at HEAD.
  pub fn create_tag(&self, name: &str, message: Option<&str>) -> HopResult<()> {
    let mut cmd = self.git_cmd();
    cmd.arg("tag");
    if let Some(msg) = message {
      cmd.args(["-a", name, "-m", msg]);
    } else {
      cmd.arg(name);
    }
    let output = cmd.output().context("failed to run git tag")?;
    if !output.status.success() {
      return Err(HopError::NameConflict {
        kind: crate::error::ConflictKind::ReservationTag,
        name: name.to_string(),
        suggestion: None,
      });
    }
    Ok(())
  }

  /// Delete a local tag. Used to roll back a reservation whose remote push lost the race.
  pub fn delete_local_tag(&self, name: &str) -> HopResult<()> {
    let output = self.git_cmd().args(["tag", "-d", name]).output().context("failed to delete local tag")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "failed to delete local tag '{}': {}",
        name,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Push a tag to `remote`. Atomic per-ref at the Git server: this is the
  /// distributed compare-and-set the reservation protocol relies on.
  pub fn push_tag(&self, name: &str, remote: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, &format!("refs/tags/{}", name)])
      .output()
      .context("failed to push tag")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("push tag {}", name),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Delete a tag on `remote`.
  pub fn delete_remote_tag(&self, name: &str, remote: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, "--delete", &format!("refs/tags/{}", name)])
      .output()
      .context("failed to delete remote tag")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("delete remote tag {}", name),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Checkout an existing branch, tag, or commit.
  pub fn checkout(&self, refspec: &str) -> HopResult<()> {
    let output = self.git_cmd().args(["checkout", refspec]).output().context("failed to checkout")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "failed to checkout '{}': {}",
        refspec,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Create a new branch from `from_ref` and leave it unchecked-out.
  pub fn create_branch(&self, name: &str, from_ref: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["branch", name, from_ref])
      .output()
      .context("failed to create branch")?;
    if !output.status.success() {
      return Err(HopError::NameConflict {
        kind: crate::error::ConflictKind::ReservationTag,
        name: name.to_string(),
        suggestion: None,
      });
    }
    Ok(())
  }

  /// Delete a local branch (requires it be fully merged, like plain `git branch -d`
  /// would, but we force it with `-D` since archival branches replace it by rename).
  pub fn delete_local_branch(&self, name: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["branch", "-D", name])
      .output()
      .context("failed to delete local branch")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "failed to delete local branch '{}': {}",
        name,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Rename a local branch, used to archive an integrated patch branch as
  /// `ho-release/<V>/<id>`.
  pub fn rename_branch(&self, old: &str, new: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["branch", "-m", old, new])
      .output()
      .context("failed to rename branch")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "failed to rename branch '{}' to '{}': {}",
        old,
        new,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Push a local branch to `remote`.
  pub fn push_branch(&self, name: &str, remote: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, name])
      .output()
      .context("failed to push branch")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("push branch {}", name),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Delete a branch on `remote`.
  pub fn delete_remote_branch(&self, name: &str, remote: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["push", remote, "--delete", name])
      .output()
      .context("failed to delete remote branch")?;
    if !output.status.success() {
      return Err(HopError::RemoteOperation {
        op: format!("delete remote branch {}", name),
        reason: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Hard-reset the working tree and index to `refspec`. Used by the
  /// orchestrator's failure-recovery checkpoint/rollback.
  pub fn hard_reset(&self, refspec: &str) -> HopResult<()> {
    let output = self
      .git_cmd()
      .args(["reset", "--hard", refspec])
      .output()
      .context("failed to hard reset")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "git reset --hard {} failed: {}",
        refspec,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }

  /// Merge `branch` into the current branch.
  pub fn merge(&self, branch: &str, message: &str, mode: MergeMode) -> HopResult<String> {
    let mut cmd = self.git_cmd();
    cmd.arg("merge");
    match mode {
      MergeMode::NoFastForward => {
        cmd.args(["--no-ff", "-m", message, branch]);
      }
      MergeMode::FastForwardOnly => {
        cmd.args(["--ff-only", branch]);
      }
    }
    let output = cmd.output().context("failed to run git merge")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "merge of '{}' failed:\n{}",
        branch,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    self.head_commit()
  }

  /// Whether `branch` is in sync with `remote/branch`: ahead, behind,
  /// diverged, or has no remote tracking branch at all.
  pub fn is_branch_synced(&self, branch: &str, remote: &str) -> HopResult<SyncStatus> {
    if !self.has_remote(remote)? || !self.branch_exists(branch, Some(remote))? {
      return Ok(SyncStatus::NotSynced(SyncReason::NoRemote));
    }

    let local = self.rev_parse(branch)?;
    let remote_sha = self.rev_parse(&format!("{}/{}", remote, branch))?;

    if local == remote_sha {
      return Ok(SyncStatus::Synced);
    }

    let ahead = self.count_commits(&format!("{}/{}..{}", remote, branch, branch))?;
    let behind = self.count_commits(&format!("{}..{}/{}", branch, remote, branch))?;

    Ok(match (ahead > 0, behind > 0) {
      (true, true) => SyncStatus::NotSynced(SyncReason::Diverged),
      (true, false) => SyncStatus::NotSynced(SyncReason::Ahead),
      (false, true) => SyncStatus::NotSynced(SyncReason::Behind),
      (false, false) => SyncStatus::Synced,
    })
  }

  fn count_commits(&self, range: &str) -> HopResult<usize> {
    let output = self
      .git_cmd()
      .args(["rev-list", "--count", range])
      .output()
      .context("failed to run git rev-list")?;
    if !output.status.success() {
      return Ok(0);
    }
    Ok(String::from_utf8_lossy(&output.stdout).trim().parse().unwrap_or(0))
  }

  /// Whether `ancestor` is an ancestor of (or equal to) `descendant`.
  pub fn is_ancestor(&self, ancestor: &str, descendant: &str) -> HopResult<bool> {
    let output = self
      .git_cmd()
      .args(["merge-base", "--is-ancestor", ancestor, descendant])
      .output()
      .context("failed to run git merge-base")?;
    Ok(output.status.success())
  }
}
