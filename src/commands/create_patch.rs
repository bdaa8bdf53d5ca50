//! `hop dev create-patch`

use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::orchestrator;

pub fn run_create_patch(id_or_number: String) -> HopResult<()> {
  let repo = discover_repo()?;
  let info = orchestrator::create_patch(&repo, &id_or_number)?;
  println!("reserved patch {} on branch ho-patch/{}", info.canonical, info.canonical);
  Ok(())
}
