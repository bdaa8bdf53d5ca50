//! `hop dev rollback`
//!
//! Restores the database to the production version immediately before the
//! current one. Like `restore`, this is a full database replacement — per
//! spec.md's explicit non-goal, a failed patch is never unwound mid-flight;
//! the developer restores from backup instead.

use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;
use crate::orchestrator;

pub fn run_rollback() -> HopResult<()> {
  let repo = discover_repo()?;
  let mut db = connect_project_db(&repo)?;

  let version = orchestrator::rollback_to_previous(&repo, &mut db)?;
  println!("rolled back to {}", version.render());
  Ok(())
}
