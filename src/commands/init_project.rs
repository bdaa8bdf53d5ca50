//! `hop dev init-project`
//!
//! Grounded on `original_source/half_orm_dev/cli/commands/init_project.py`:
//! the database name doubles as both the package name and the project
//! directory name, and the database config must already exist.

use crate::config::{self, DatabaseConfig};
use crate::error::{HopError, HopResult};
use crate::orchestrator;

pub fn run_init_project(database_name: String, origin: Option<String>) -> HopResult<()> {
  let db_config = DatabaseConfig::load(&config::conf_dir(), &database_name)?;

  let cwd = std::env::current_dir().map_err(HopError::from)?;
  let root = cwd.join(&database_name);
  if root.exists() {
    return Err(HopError::message(format!("{} already exists", root.display())));
  }

  let repo = orchestrator::init_git_centric_project(&root, &database_name, &db_config, origin.as_deref())?;
  println!("initialized project '{}' at {}", database_name, repo.root.display());
  Ok(())
}
