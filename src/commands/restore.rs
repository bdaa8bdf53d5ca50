//! `hop dev restore`
//!
//! A whole-database rebuild from a schema snapshot, never a mid-patch
//! transactional rollback (spec.md's explicit non-goal).

use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_restore(version: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let version = VersionInfo::parse(&version)?;
  let mut db = connect_project_db(&repo)?;

  orchestrator::restore(&repo, &version, &mut db)?;
  println!("restored database to {}", version.render());
  Ok(())
}
