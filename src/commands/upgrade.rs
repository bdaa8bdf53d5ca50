//! `hop dev upgrade`

use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;
use crate::orchestrator;

pub fn run_upgrade() -> HopResult<()> {
  let repo = discover_repo()?;
  let mut db = connect_project_db(&repo)?;

  let version = orchestrator::upgrade(&repo, &mut db)?;
  println!("upgraded to {}", version.render());
  Ok(())
}
