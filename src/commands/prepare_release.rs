//! `hop dev prepare-release`

use crate::cli::ReleaseKindArg;
use crate::commands::discover_repo;
use crate::error::HopResult;
use crate::orchestrator;

pub fn run_prepare_release(kind: ReleaseKindArg) -> HopResult<()> {
  let repo = discover_repo()?;
  let target = orchestrator::prepare_release(&repo, kind.into())?;
  println!("opened release stage {}", target.render());
  Ok(())
}
