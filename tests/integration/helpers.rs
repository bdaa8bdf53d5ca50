//! Test helpers for integration tests: a throwaway Git-centric project plus
//! a bare remote, and a thin wrapper for invoking the compiled `hop` binary.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::process::{Command, Output};
use tempfile::TempDir;

/// A project directory with a local bare "origin" remote, mirroring the
/// shape `hop dev init-project` produces: `.hop/config`, `Patches/`,
/// `bootstrap/`, `releases/`, a `main`/`ho-prod` history, and a pushed origin.
pub struct TestProject {
  _root: TempDir,
  _origin: TempDir,
  pub path: PathBuf,
  pub conf_dir: TempDir,
  pub db_name: String,
}

impl TestProject {
  /// Scaffold a project named `db_name` with an empty bare remote, a
  /// connection file under an isolated `HALFORM_CONF_DIR`, and `ho-prod`
  /// checked out and pushed.
  pub fn new(db_name: &str) -> Result<Self> {
    let origin = TempDir::new()?;
    git(origin.path(), &["init", "-q", "--bare"])?;

    let root = TempDir::new()?;
    let path = root.path().join(db_name);
    std::fs::create_dir_all(&path)?;

    std::fs::create_dir_all(path.join(".hop/model"))?;
    std::fs::create_dir_all(path.join("Patches"))?;
    std::fs::create_dir_all(path.join("bootstrap"))?;
    std::fs::create_dir_all(path.join("releases"))?;

    std::fs::write(path.join(".hop/config"), format!("[halfORM]\nhop_version = 0.1.0\ndevel = True\npackage_name = {}\n", db_name))?;
    let schema_path = path.join(".hop/model/schema-0.0.0.sql");
    std::fs::write(&schema_path, format!("-- schema snapshot for {} at 0.0.0\n", db_name))?;
    #[cfg(unix)]
    std::os::unix::fs::symlink(&schema_path, path.join(".hop/model/schema.sql"))?;

    git(&path, &["init", "-q", "-b", "main"])?;
    git(&path, &["config", "user.email", "test@example.com"])?;
    git(&path, &["config", "user.name", "Test"])?;
    git(&path, &["add", "."])?;
    git(&path, &["commit", "-q", "-m", "Initial commit"])?;
    git(&path, &["branch", "ho-prod"])?;
    git(&path, &["checkout", "-q", "ho-prod"])?;
    git(&path, &["remote", "add", "origin", origin.path().to_str().unwrap()])?;
    git(&path, &["push", "-q", "origin", "main"])?;
    git(&path, &["push", "-q", "origin", "ho-prod"])?;

    let conf_dir = TempDir::new()?;
    std::fs::write(
      conf_dir.path().join(db_name),
      "[database]\nname = test_db\nuser = postgres\nhost = localhost\nport = 5432\nproduction = False\n",
    )?;

    Ok(Self { _root: root, _origin: origin, path, conf_dir, db_name: db_name.to_string() })
  }

  /// Run `hop dev <args>` inside this project, with `HALFORM_CONF_DIR`
  /// pointed at this project's isolated connection-file directory.
  pub fn hop(&self, args: &[&str]) -> Result<Output> {
    let bin = env!("CARGO_BIN_EXE_hop");
    let output = Command::new(bin)
      .current_dir(&self.path)
      .env("HALFORM_CONF_DIR", self.conf_dir.path())
      .arg("dev")
      .args(args)
      .output()
      .context("failed to run hop")?;
    Ok(output)
  }

  pub fn file_exists(&self, relative: &str) -> bool {
    self.path.join(relative).exists()
  }

  pub fn git_tags(&self) -> Result<Vec<String>> {
    let output = git(&self.path, &["tag", "-l"])?;
    Ok(String::from_utf8_lossy(&output.stdout).lines().map(String::from).collect())
  }

  pub fn current_branch(&self) -> Result<String> {
    let output = git(&self.path, &["rev-parse", "--abbrev-ref", "HEAD"])?;
    Ok(String::from_utf8_lossy(&output.stdout).trim().to_string())
  }
}

/// Run a git command in `cwd`, failing the test on a non-zero exit.
pub fn git(cwd: &Path, args: &[&str]) -> Result<Output> {
  let output = Command::new("git").current_dir(cwd).args(args).output().context("failed to run git command")?;
  if !output.status.success() {
    anyhow::bail!("git {} failed: {}", args.join(" "), String::from_utf8_lossy(&output.stderr));
  }
  Ok(output)
}

pub fn stdout(output: &Output) -> String {
  String::from_utf8_lossy(&output.stdout).to_string()
}

pub fn stderr(output: &Output) -> String {
  String::from_utf8_lossy(&output.stderr).to_string()
}
