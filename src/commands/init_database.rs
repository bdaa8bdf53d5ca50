//! `hop dev init-database`
//!
//! Grounded on `original_source/half_orm_dev/cli/commands/init_database.py`'s
//! argument shape: a positional database name, connection overrides, and
//! `--create-db`/`--add-metadata` flags.

use crate::config::{self, DatabaseConfig};
use crate::error::{HopError, HopResult};
use crate::exec::Database;
use std::process::Command;

const METADATA_DDL: &str = "\
create schema if not exists half_orm_meta;
create table if not exists half_orm_meta.hop_release (
  major int not null,
  minor int not null,
  patch int not null,
  pre_release text not null default '',
  pre_release_num text not null default '',
  changelog text,
  applied_at timestamp not null default now()
);
create table if not exists half_orm_meta.bootstrap (
  filename text primary key,
  version text not null,
  executed_at timestamp not null default now()
);
";

#[allow(clippy::too_many_arguments)]
pub fn run_init_database(
  database_name: String,
  host: String,
  port: u16,
  user: Option<String>,
  password: Option<String>,
  create_db: bool,
  add_metadata: bool,
  production: bool,
) -> HopResult<()> {
  let user = user.unwrap_or_else(config::default_user);

  if create_db {
    let createdb = crate::exec::which("createdb")?;
    let mut cmd = Command::new(createdb);
    cmd.args(["-h", &host, "-p", &port.to_string(), "-U", &user]).arg(&database_name);
    let output = cmd.output().map_err(|e| HopError::message(format!("failed to spawn createdb: {}", e)))?;
    if !output.status.success() {
      return Err(HopError::message(format!("createdb failed: {}", String::from_utf8_lossy(&output.stderr))));
    }
    println!("created database '{}'", database_name);
  }

  let db_config = DatabaseConfig {
    name: database_name.clone(),
    user,
    password,
    host: Some(host),
    port,
    production,
  };
  db_config.save(&config::conf_dir())?;
  println!("wrote connection file for '{}' to {}", database_name, config::conf_dir().display());

  if add_metadata {
    let mut db = crate::db::connect(&db_config)?;
    db.execute(METADATA_DDL)?;
    println!("provisioned half_orm_meta schema on '{}'", database_name);
  }

  Ok(())
}
