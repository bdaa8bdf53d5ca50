//! `hop dev create-hotfix`

use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_create_hotfix(base_version: String, id_or_number: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let base_version = VersionInfo::parse(&base_version)?;

  let info = orchestrator::create_hotfix(&repo, &base_version, &id_or_number)?;
  println!("reserved hotfix {} against {}", info.canonical, base_version.render());
  Ok(())
}
