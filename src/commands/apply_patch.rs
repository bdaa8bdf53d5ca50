//! `hop dev apply-patch`

use crate::applier;
use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;

pub fn run_apply_patch(patch_id: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let mut db = connect_project_db(&repo)?;

  applier::apply_patch(&repo, &patch_id, &mut db)?;
  applier::warn_non_idempotent_data_files(&repo, &patch_id)?;

  println!("applied patch {}", patch_id);
  Ok(())
}
