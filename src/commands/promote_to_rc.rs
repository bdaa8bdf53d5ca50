//! `hop dev promote-to-rc`

use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_promote_to_rc(version: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let version = VersionInfo::parse(&version)?;
  let db_config = repo.database_config()?;

  let k = orchestrator::promote_to_rc(&repo, &version, &db_config)?;
  println!("promoted {} stage to rc{}", version.render(), k);
  Ok(())
}
