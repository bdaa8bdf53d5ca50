//! `hop dev promote-to-prod`

use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_promote_to_prod(version: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let version = VersionInfo::parse(&version)?;

  orchestrator::promote_to_prod(&repo, &version)?;
  println!("promoted {} to production", version.render());
  Ok(())
}
