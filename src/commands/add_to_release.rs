//! `hop dev add-to-release`

use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;
use crate::orchestrator;
use crate::version::VersionInfo;

pub fn run_add_to_release(patch_id: String, version: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let version = VersionInfo::parse(&version)?;
  let mut db = connect_project_db(&repo)?;

  let merge_sha = orchestrator::add_to_release(&repo, &patch_id, &version, &mut db)?;
  println!("staged {} in release {} (merge {})", patch_id, version.render(), merge_sha);
  Ok(())
}
