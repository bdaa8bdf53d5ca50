//! File Executor (C3)
//!
//! Runs a single SQL or Python patch file against a live database, and
//! classifies files as data/bootstrap by their leading marker comment.
//! The `Database` trait is the narrow external-collaborator seam spec.md
//! §9's Design Notes ask for in place of a concrete driver dependency,
//! mirrored on the teacher's trait-at-the-seam style (`core::vcs` wraps
//! `git` the same way this wraps a PostgreSQL connection).

use crate::error::{HopError, HopResult, ResultExt};
use std::path::Path;
use std::process::{Command, Stdio};
use std::time::Duration;
use wait_timeout::ChildExt;

const PYTHON_TIMEOUT: Duration = Duration::from_secs(300);

/// A single result row, as loosely typed text — the applier only ever reads
/// metadata rows back, never arbitrary application data.
pub type Row = Vec<Option<String>>;

/// The narrow surface the executor needs from a database connection.
/// Kept deliberately small: a concrete `postgres::Client` is the sole
/// production implementor, but tests substitute an in-memory fake.
pub trait Database {
  fn execute(&mut self, sql: &str) -> HopResult<()>;
  fn insert(&mut self, table: &str, row: &[(&str, &str)]) -> HopResult<()>;
  fn query(&mut self, sql: &str) -> HopResult<Vec<Row>>;
  fn name(&self) -> &str;
}

/// Executes patch/bootstrap files: SQL via a `Database`, via `psql`, or
/// Python scripts as subprocesses.
pub struct FileExecutor;

impl FileExecutor {
  /// Run a `.sql` file's contents through `db.execute`.
  pub fn execute_sql(&self, path: &Path, db: &mut dyn Database) -> HopResult<()> {
    let sql = std::fs::read_to_string(path).context(format!("failed to read {}", path.display()))?;
    db.execute(&sql).map_err(|e| HopError::FileExecution {
      file: path.display().to_string(),
      source: e.to_string(),
    })
  }

  /// Run a `.sql` file via the `psql` CLI, for statements (`\connect`,
  /// explicit transaction control) the driver rejects.
  pub fn execute_sql_via_psql(&self, path: &Path, db_name: &str) -> HopResult<()> {
    let psql = which("psql")?;
    let output = Command::new(psql)
      .args(["-v", "ON_ERROR_STOP=1", "-d", db_name, "-f"])
      .arg(path)
      .output()
      .context(format!("failed to spawn psql for {}", path.display()))?;

    if !output.status.success() {
      return Err(HopError::FileExecution {
        file: path.display().to_string(),
        source: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(())
  }

  /// Run a `.py` file as a subprocess with a 300-second hard timeout,
  /// `PYTHONPATH` extended by `project_root`, returning captured stdout.
  pub fn execute_python(&self, path: &Path, cwd: Option<&Path>, project_root: &Path) -> HopResult<String> {
    let interpreter = std::env::var("HOP_PYTHON").unwrap_or_else(|_| "python3".to_string());

    let mut pythonpath = project_root.display().to_string();
    if let Ok(existing) = std::env::var("PYTHONPATH") {
      if !existing.is_empty() {
        pythonpath = format!("{}:{}", pythonpath, existing);
      }
    }

    let mut cmd = Command::new(&interpreter);
    cmd.arg(path).env("PYTHONPATH", pythonpath).stdout(Stdio::piped()).stderr(Stdio::piped());
    if let Some(dir) = cwd {
      cmd.current_dir(dir);
    }

    let mut child = cmd.spawn().map_err(|e| HopError::FileExecution {
      file: path.display().to_string(),
      source: format!("failed to spawn '{}': {}", interpreter, e),
    })?;

    let status = match child.wait_timeout(PYTHON_TIMEOUT).map_err(|e| HopError::FileExecution {
      file: path.display().to_string(),
      source: e.to_string(),
    })? {
      Some(status) => status,
      None => {
        let _ = child.kill();
        let _ = child.wait();
        return Err(HopError::FileExecution {
          file: path.display().to_string(),
          source: format!("exceeded {}s timeout", PYTHON_TIMEOUT.as_secs()),
        });
      }
    };

    let output = child.wait_with_output().context(format!("failed to collect output for {}", path.display()))?;
    let stdout = String::from_utf8_lossy(&output.stdout).to_string();

    if !status.success() {
      return Err(HopError::FileExecution {
        file: path.display().to_string(),
        source: String::from_utf8_lossy(&output.stderr).to_string(),
      });
    }
    Ok(stdout)
  }

  /// Whether `path`'s first line (after stripping a `--`/`#` comment marker
  /// and whitespace) matches `@hop:(data|bootstrap)`, case-insensitively.
  /// Never raises: any I/O failure is treated as "not a data file".
  pub fn is_data_file(path: &Path) -> bool {
    let Ok(content) = std::fs::read_to_string(path) else {
      return false;
    };
    let Some(first_line) = content.lines().next() else {
      return false;
    };
    let stripped = first_line.trim_start_matches("--").trim_start_matches('#').trim();
    let lowered = stripped.to_ascii_lowercase();
    lowered.starts_with("@hop:data") || lowered.starts_with("@hop:bootstrap")
  }
}

pub(crate) fn which(tool: &str) -> HopResult<String> {
  let path_var = std::env::var("PATH").unwrap_or_default();
  for dir in std::env::split_paths(&path_var) {
    let candidate = dir.join(tool);
    if candidate.is_file() {
      return Ok(candidate.display().to_string());
    }
  }
  Err(HopError::ToolNotFound { tool: tool.to_string() })
}
