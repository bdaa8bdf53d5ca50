//! Error types for hop-rail, with contextual help messages and exit codes.
//!
//! Every error surfaced to a user is a variant of [`HopError`], which knows
//! its own [`ExitCode`] and an optional remediation hint. Internal glue code
//! (subprocess spawns, file I/O) uses `anyhow::Context` and converts to
//! [`HopError::Other`] at the command boundary.

use std::fmt;
use std::io;

/// Process exit codes for `hop`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
  /// Success.
  Success = 0,
  /// User error: malformed input, missing config, invalid state transition.
  UserError = 1,
  /// System error: git, database, subprocess, or I/O failure.
  SystemError = 2,
  /// Validation error: a repository invariant would be violated.
  ValidationError = 3,
}

impl ExitCode {
  pub fn as_i32(self) -> i32 {
    self as i32
  }
}

/// Why a branch is not synced with its remote tracking branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncReason {
  Ahead,
  Behind,
  Diverged,
  NoRemote,
}

impl fmt::Display for SyncReason {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      SyncReason::Ahead => write!(f, "ahead of remote"),
      SyncReason::Behind => write!(f, "behind remote"),
      SyncReason::Diverged => write!(f, "diverged from remote"),
      SyncReason::NoRemote => write!(f, "has no remote tracking branch"),
    }
  }
}

/// What kind of name collided during reservation or release preparation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConflictKind {
  /// `ho-patch/<N>` tag already exists, locally or on the remote.
  ReservationTag,
  /// A stage manifest already exists for this version.
  StageManifest,
}

impl fmt::Display for ConflictKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ConflictKind::ReservationTag => write!(f, "reservation tag"),
      ConflictKind::StageManifest => write!(f, "stage manifest"),
    }
  }
}

/// The unified error type for hop-rail.
#[derive(Debug)]
pub enum HopError {
  InvalidVersion {
    spec: String,
    reason: String,
  },
  InvalidPatchId {
    id: String,
    reason: String,
  },
  VersionProgression {
    current: String,
    target: String,
  },
  DirtyRepository {
    paths: Vec<String>,
  },
  WrongBranch {
    required: String,
    actual: String,
  },
  BranchNotSynced {
    branch: String,
    reason: SyncReason,
  },
  NameConflict {
    kind: ConflictKind,
    name: String,
    suggestion: Option<String>,
  },
  PatchAlreadyInRelease {
    patch_id: String,
    manifest: String,
  },
  StageHasCandidates {
    manifest: String,
    candidates: Vec<String>,
  },
  FileExecution {
    file: String,
    source: String,
  },
  RemoteOperation {
    op: String,
    reason: String,
  },
  DatabaseNotConfigured {
    name: String,
  },
  ToolNotFound {
    tool: String,
  },
  Io(io::Error),
  Other(anyhow::Error),
}

impl HopError {
  pub fn exit_code(&self) -> ExitCode {
    match self {
      HopError::InvalidVersion { .. }
      | HopError::InvalidPatchId { .. }
      | HopError::VersionProgression { .. }
      | HopError::WrongBranch { .. }
      | HopError::NameConflict { .. }
      | HopError::PatchAlreadyInRelease { .. }
      | HopError::StageHasCandidates { .. }
      | HopError::DatabaseNotConfigured { .. }
      | HopError::ToolNotFound { .. } => ExitCode::UserError,

      HopError::DirtyRepository { .. }
      | HopError::BranchNotSynced { .. }
      | HopError::FileExecution { .. }
      | HopError::RemoteOperation { .. }
      | HopError::Io(_) => ExitCode::SystemError,

      HopError::Other(_) => ExitCode::UserError,
    }
  }

  pub fn help_message(&self) -> Option<String> {
    match self {
      HopError::InvalidVersion { .. } => {
        Some("Expected N, N.M, N.M.P, or N.M.P-{alpha|beta|rc|dev}[num].".to_string())
      }
      HopError::InvalidPatchId { .. } => {
        Some("Expected a bare integer or <N>-<kebab-slug>, e.g. 42 or 42-user-auth.".to_string())
      }
      HopError::VersionProgression { .. } => Some("The target version must be strictly greater than the current one.".to_string()),
      HopError::DirtyRepository { .. } => Some("Commit or stash your changes before running this command.".to_string()),
      HopError::WrongBranch { required, .. } => Some(format!("Checkout '{}' and try again.", required)),
      HopError::BranchNotSynced { .. } => Some("Fetch and reconcile with the remote before continuing.".to_string()),
      HopError::NameConflict {
        kind: ConflictKind::ReservationTag,
        suggestion,
        ..
      } => suggestion
        .as_ref()
        .map(|s| format!("That patch number is taken. Next free number: {}.", s))
        .or_else(|| Some("That patch number is taken; pick another.".to_string())),
      HopError::NameConflict {
        kind: ConflictKind::StageManifest,
        ..
      } => Some("A stage already exists for this release level; finish or promote it first.".to_string()),
      HopError::PatchAlreadyInRelease { manifest, .. } => {
        Some(format!("This patch is already recorded in {}.", manifest))
      }
      HopError::StageHasCandidates { .. } => {
        Some("All patches in the stage must be staged (merged) before promoting to an RC.".to_string())
      }
      HopError::FileExecution { file, .. } => Some(format!("Fix the failing statement in {} and retry.", file)),
      HopError::RemoteOperation { .. } => {
        Some("The local state is recoverable; inspect the remote and retry.".to_string())
      }
      HopError::DatabaseNotConfigured { .. } => Some("Run `hop dev init-database` first.".to_string()),
      HopError::ToolNotFound { tool } => Some(format!("Install '{}' and ensure it is on PATH.", tool)),
      _ => None,
    }
  }
}

impl fmt::Display for HopError {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      HopError::InvalidVersion { spec, reason } => write!(f, "invalid version '{}': {}", spec, reason),
      HopError::InvalidPatchId { id, reason } => write!(f, "invalid patch id '{}': {}", id, reason),
      HopError::VersionProgression { current, target } => {
        write!(f, "'{}' is not strictly after current version '{}'", target, current)
      }
      HopError::DirtyRepository { paths } => {
        write!(f, "working tree is not clean ({} path(s) modified)", paths.len())
      }
      HopError::WrongBranch { required, actual } => {
        write!(f, "expected branch '{}', on '{}'", required, actual)
      }
      HopError::BranchNotSynced { branch, reason } => write!(f, "branch '{}' is {}", branch, reason),
      HopError::NameConflict { kind, name, .. } => write!(f, "{} '{}' already exists", kind, name),
      HopError::PatchAlreadyInRelease { patch_id, manifest } => {
        write!(f, "patch '{}' already appears in manifest '{}'", patch_id, manifest)
      }
      HopError::StageHasCandidates { manifest, candidates } => write!(
        f,
        "stage '{}' still has {} candidate patch(es): {}",
        manifest,
        candidates.len(),
        candidates.join(", ")
      ),
      HopError::FileExecution { file, source } => write!(f, "execution of '{}' failed: {}", file, source),
      HopError::RemoteOperation { op, reason } => write!(f, "remote operation '{}' failed: {}", op, reason),
      HopError::DatabaseNotConfigured { name } => write!(f, "no connection file found for database '{}'", name),
      HopError::ToolNotFound { tool } => write!(f, "required external tool '{}' not found on PATH", tool),
      HopError::Io(e) => write!(f, "I/O error: {}", e),
      HopError::Other(e) => write!(f, "{}", e),
    }
  }
}

impl std::error::Error for HopError {
  fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
    match self {
      HopError::Io(e) => Some(e),
      HopError::Other(e) => e.source(),
      _ => None,
    }
  }
}

impl From<io::Error> for HopError {
  fn from(err: io::Error) -> Self {
    HopError::Io(err)
  }
}

impl From<anyhow::Error> for HopError {
  fn from(err: anyhow::Error) -> Self {
    HopError::Other(err)
  }
}

impl HopError {
  /// Build an untyped error from a message, for glue code that has no
  /// dedicated variant yet.
  pub fn message(msg: impl Into<String>) -> Self {
    HopError::Other(anyhow::anyhow!(msg.into()))
  }

  /// Like [`HopError::message`], but attaches a help line directly instead
  /// of routing through `help_message()`.
  pub fn with_help(msg: impl Into<String>, help: impl Into<String>) -> Self {
    HopError::Other(anyhow::anyhow!("{}\nhelp: {}", msg.into(), help.into()))
  }
}

/// Result alias used throughout hop-rail.
pub type HopResult<T> = Result<T, HopError>;

/// Convenience extension that turns a foreign `Result` directly into a
/// [`HopResult`] with an added context message, mirroring `anyhow::Context`
/// but landing on our own error type instead of `anyhow::Error`.
pub trait ResultExt<T> {
  fn context(self, msg: impl Into<String>) -> HopResult<T>;
}

impl<T, E> ResultExt<T> for Result<T, E>
where
  E: fmt::Display,
{
  fn context(self, msg: impl Into<String>) -> HopResult<T> {
    self.map_err(|e| HopError::message(format!("{}: {}", msg.into(), e)))
  }
}

/// Print a `HopError` to stderr with its help message, in the teacher's style.
pub fn print_error(err: &HopError) {
  eprintln!("error: {}", err);
  if let Some(help) = err.help_message() {
    eprintln!("  help: {}", help);
  }
}

/// Path helper shared by error constructors that need a relative display path.
pub fn display_path(path: &std::path::Path) -> String {
  path.display().to_string()
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn exit_codes_match_spec_table() {
    assert_eq!(
      HopError::InvalidVersion {
        spec: "x".into(),
        reason: "y".into()
      }
      .exit_code(),
      ExitCode::UserError
    );
    assert_eq!(
      HopError::DirtyRepository { paths: vec![] }.exit_code(),
      ExitCode::SystemError
    );
    assert_eq!(
      HopError::StageHasCandidates {
        manifest: "m".into(),
        candidates: vec!["1".into()]
      }
      .exit_code(),
      ExitCode::UserError
    );
  }

  #[test]
  fn display_is_human_readable() {
    let e = HopError::WrongBranch {
      required: "ho-prod".into(),
      actual: "main".into(),
    };
    assert_eq!(e.to_string(), "expected branch 'ho-prod', on 'main'");
  }
}
