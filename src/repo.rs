//! Repository Authority (C10)
//!
//! Owns the on-disk project layout and answers "which database / which
//! version / which config" for every other component. Per the explicit
//! redesign in Design Notes §9, there is no process-wide cached instance —
//! `Repository::discover` is a pure function of a starting directory,
//! mirroring the teacher's `WorkspaceContext::build`/discovery pattern in
//! `core/context.rs`: build once, thread by reference.

use crate::config::{self, DatabaseConfig, ProjectConfig};
use crate::error::{HopError, HopResult, ResultExt};
use crate::exec::{which, Database};
use crate::vcs::SystemGit;
use std::path::{Path, PathBuf};
use std::process::Command;

const PYTHON_KEYWORDS: &[&str] = &[
  "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue", "def", "del",
  "elif", "else", "except", "finally", "for", "from", "global", "if", "import", "in", "is", "lambda", "nonlocal",
  "not", "or", "pass", "raise", "return", "try", "while", "with", "yield",
];

/// The external ORM code generator. A narrow capability, per Design Notes
/// §9: the core never inspects the live database schema to produce Python
/// modules itself, it only asks this collaborator to do so.
pub trait ModelGenerator {
  fn generate(&self, repo: &Repository) -> HopResult<()>;
}

/// An explicit project handle: root directory, project config, and a Git
/// handle rooted at that directory. Built once per command invocation and
/// passed by reference, never stashed in a global.
pub struct Repository {
  pub root: PathBuf,
  pub config: ProjectConfig,
  pub git: SystemGit,
}

impl Repository {
  /// Walk upward from `start_dir` looking for `.hop/config`.
  pub fn discover(start_dir: &Path) -> HopResult<Self> {
    let mut dir = start_dir.to_path_buf();
    loop {
      let hop_dir = dir.join(".hop");
      if hop_dir.join("config").is_file() {
        let config = ProjectConfig::load(&hop_dir)?;
        let git = SystemGit::open(&dir)?;
        return Ok(Self { root: dir, config, git });
      }
      if !dir.pop() {
        return Err(HopError::message(format!(
          "no hop project found in '{}' or any parent directory",
          start_dir.display()
        )));
      }
    }
  }

  pub fn hop_dir(&self) -> PathBuf {
    self.root.join(".hop")
  }

  pub fn model_dir(&self) -> PathBuf {
    self.hop_dir().join("model")
  }

  pub fn releases_dir(&self) -> PathBuf {
    self.root.join("releases")
  }

  pub fn patches_dir(&self) -> PathBuf {
    self.root.join("Patches")
  }

  pub fn bootstrap_dir(&self) -> PathBuf {
    self.root.join("bootstrap")
  }

  pub fn schema_path(&self, version: &str) -> PathBuf {
    self.model_dir().join(format!("schema-{}.sql", version))
  }

  pub fn metadata_path(&self, version: &str) -> PathBuf {
    self.model_dir().join(format!("metadata-{}.sql", version))
  }

  pub fn schema_symlink(&self) -> PathBuf {
    self.model_dir().join("schema.sql")
  }

  /// The schema snapshot for `version`, re-validated every time it is read:
  /// the path must exist and resolve to a regular file, so a dangling
  /// `schema.sql` symlink or a deleted snapshot is caught before replay
  /// rather than surfacing as an opaque `psql` failure mid-deploy.
  pub fn schema_snapshot(&self, version: &str) -> HopResult<PathBuf> {
    let path = self.schema_path(version);
    let resolved = std::fs::canonicalize(&path).map_err(|_| {
      HopError::message(format!("schema snapshot for {} is missing or unreadable: {}", version, path.display()))
    })?;
    if !resolved.is_file() {
      return Err(HopError::message(format!("schema snapshot path {} does not resolve to a file", path.display())));
    }
    Ok(resolved)
  }

  /// The three-priority database-config-name resolution (spec §4.10).
  pub fn db_config_name(&self) -> String {
    config::resolve_db_config_name(&self.root, &self.config)
  }

  pub fn database_config(&self) -> HopResult<DatabaseConfig> {
    DatabaseConfig::load(&config::conf_dir(), &self.db_config_name())
  }

  /// Dump the target database's schema to `schema-<version>.sql` via
  /// `pg_dump --schema-only`, then atomically retarget the `schema.sql`
  /// symlink at it.
  pub fn dump_schema(&self, db: &DatabaseConfig, version: &str) -> HopResult<()> {
    let pg_dump = which("pg_dump")?;
    let model_dir = self.model_dir();
    std::fs::create_dir_all(&model_dir).context(format!("failed to create {}", model_dir.display()))?;

    let schema_path = self.schema_path(version);
    let mut cmd = Command::new(pg_dump);
    cmd.args(["--schema-only", "-f"]).arg(&schema_path).arg(&db.name);
    if let Some(host) = &db.host {
      cmd.args(["-h", host]);
    }
    cmd.args(["-p", &db.port.to_string(), "-U", &db.user]);

    let output = cmd.output().context("failed to spawn pg_dump")?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "pg_dump failed: {}",
        String::from_utf8_lossy(&output.stderr)
      )));
    }

    retarget_symlink(&self.schema_symlink(), &schema_path)
  }

  /// Write `metadata-<version>.sql`: an INSERT row for
  /// `half_orm_meta.hop_release`.
  pub fn write_metadata_sql(&self, version: &crate::version::VersionInfo) -> HopResult<()> {
    let (pre_release, pre_release_num) = match &version.pre_release {
      Some(pr) => (pr.kind.as_str(), pr.num.map(|n| n.to_string()).unwrap_or_default()),
      None => ("", String::new()),
    };
    let sql = format!(
      "insert into half_orm_meta.hop_release (major, minor, patch, pre_release, pre_release_num) values ({}, {}, {}, '{}', '{}');\n",
      version.major, version.minor, version.patch, pre_release, pre_release_num
    );
    let path = self.metadata_path(&version.render());
    std::fs::write(&path, sql).context(format!("failed to write {}", path.display()))
  }

  /// Validate that the target database already holds the `half_orm_meta`
  /// tables this tool expects to find (rather than creating them itself —
  /// provisioning them is the external migration's job).
  pub fn verify_metadata_tables(db: &mut dyn Database) -> HopResult<()> {
    db.query("select 1 from half_orm_meta.hop_release limit 1")
      .map_err(|_| HopError::message("target database is missing the half_orm_meta.hop_release table"))?;
    Ok(())
  }
}

/// Replace `link` with a relative symlink pointing at `target`, atomically
/// (write-then-rename so a crash never leaves a half-updated symlink).
fn retarget_symlink(link: &Path, target: &Path) -> HopResult<()> {
  let target_name = target
    .file_name()
    .ok_or_else(|| HopError::message(format!("schema path {} has no file name", target.display())))?;

  let tmp = link.with_extension("sql.tmp-symlink");
  let _ = std::fs::remove_file(&tmp);

  #[cfg(unix)]
  std::os::unix::fs::symlink(target_name, &tmp).context(format!("failed to create symlink at {}", tmp.display()))?;
  #[cfg(not(unix))]
  std::fs::copy(target, &tmp).map(|_| ()).context(format!("failed to stage schema link at {}", tmp.display()))?;

  std::fs::rename(&tmp, link).context(format!("failed to retarget {}", link.display()))
}

/// Shells out to an external module-generation tool, named by
/// `HOP_MODEL_GENERATOR` (default `half_orm_packager_generate`), mirroring
/// `half_orm_packager/repo.py`'s `modules.generate(self)` collaborator: the
/// core never inspects the live schema to write Python itself.
pub struct ExternalModelGenerator;

impl ModelGenerator for ExternalModelGenerator {
  fn generate(&self, repo: &Repository) -> HopResult<()> {
    let tool_name = std::env::var("HOP_MODEL_GENERATOR").unwrap_or_else(|_| "half_orm_packager_generate".to_string());
    let tool = which(&tool_name)?;

    let output = Command::new(tool).current_dir(&repo.root).output().context(format!("failed to spawn {}", tool_name))?;
    if !output.status.success() {
      return Err(HopError::message(format!(
        "{} failed: {}",
        tool_name,
        String::from_utf8_lossy(&output.stderr)
      )));
    }
    Ok(())
  }
}

/// Validate a package name against Python-identifier rules plus rejection
/// of language keywords (spec §4.10's `init_git_centric_project`).
pub fn validate_package_name(name: &str) -> HopResult<()> {
  let mut chars = name.chars();
  let first_ok = chars.next().is_some_and(|c| c.is_ascii_alphabetic() || c == '_');
  let rest_ok = chars.all(|c| c.is_ascii_alphanumeric() || c == '_');

  if name.is_empty() || !first_ok || !rest_ok {
    return Err(HopError::message(format!(
      "'{}' is not a valid Python identifier for a package name",
      name
    )));
  }
  if PYTHON_KEYWORDS.contains(&name) {
    return Err(HopError::message(format!("'{}' is a reserved Python keyword", name)));
  }
  Ok(())
}

/// Scaffold a brand-new project: validate the package name, verify the
/// database, write `schema-0.0.0.sql`, init Git, commit on `main`, branch
/// `ho-prod`, set `origin`, push both.
pub fn init_git_centric_project(
  root: &Path,
  package_name: &str,
  db: &DatabaseConfig,
  origin: Option<&str>,
) -> HopResult<Repository> {
  validate_package_name(package_name)?;

  std::fs::create_dir_all(root.join(".hop").join("model")).context("failed to create .hop/model")?;
  std::fs::create_dir_all(root.join("Patches")).context("failed to create Patches/")?;
  std::fs::create_dir_all(root.join("bootstrap")).context("failed to create bootstrap/")?;
  std::fs::create_dir_all(root.join("releases")).context("failed to create releases/")?;

  let project_config = ProjectConfig {
    hop_version: env!("CARGO_PKG_VERSION").to_string(),
    git_origin: origin.map(str::to_string),
    devel: true,
    package_name: Some(package_name.to_string()),
  };
  project_config.save(&root.join(".hop")).context("failed to write .hop/config")?;

  let schema_path = root.join(".hop/model/schema-0.0.0.sql");
  std::fs::write(&schema_path, format!("-- schema snapshot for {} at 0.0.0\n", db.name))
    .context("failed to write initial schema snapshot")?;
  retarget_symlink(&root.join(".hop/model/schema.sql"), &schema_path)?;

  let output =
    Command::new("git").args(["init", "-q", "-b", "main"]).current_dir(root).output().context("failed to run git init")?;
  if !output.status.success() {
    return Err(HopError::message(format!("git init failed: {}", String::from_utf8_lossy(&output.stderr))));
  }

  let git = SystemGit::open(root)?;
  git.add(&[])?;
  git.commit("Initial commit")?;
  git.create_branch("ho-prod", "HEAD")?;

  if let Some(origin_url) = origin {
    let remote_output = Command::new("git")
      .args(["remote", "add", "origin", origin_url])
      .current_dir(root)
      .output()
      .context("failed to add remote")?;
    if !remote_output.status.success() {
      return Err(HopError::message(format!(
        "git remote add failed: {}",
        String::from_utf8_lossy(&remote_output.stderr)
      )));
    }
    git.push_branch("main", "origin")?;
    git.push_branch("ho-prod", "origin")?;
  }

  Ok(Repository { root: root.to_path_buf(), config: project_config, git })
}
