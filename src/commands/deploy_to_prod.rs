//! `hop dev deploy-to-prod`

use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;
use crate::exec::Database;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_deploy_to_prod(version: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let version = VersionInfo::parse(&version)?;
  let mut db = connect_project_db(&repo)?;

  orchestrator::deploy_to_prod(&repo, &version, &mut db)?;
  println!("deployed {} to '{}'", version.render(), db.name());
  Ok(())
}
