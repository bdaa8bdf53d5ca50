//! `hop dev sync-package`

use crate::applier;
use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::repo::ExternalModelGenerator;

pub fn run_sync_package() -> HopResult<()> {
  let repo = discover_repo()?;
  applier::regenerate(&repo, &ExternalModelGenerator)?;
  println!("regenerated package for '{}'", repo.db_config_name());
  Ok(())
}
