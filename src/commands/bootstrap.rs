//! `hop dev bootstrap`

use crate::bootstrap::BootstrapManager;
use crate::commands::{connect_project_db, discover_repo};
use crate::error::HopResult;

pub fn run_bootstrap(dry_run: bool, force: bool) -> HopResult<()> {
  let repo = discover_repo()?;
  let mut db = connect_project_db(&repo)?;

  let mgr = BootstrapManager::new(&repo.root);
  let ran = mgr.run(&mut db, &repo.root, dry_run, force, None)?;

  if ran.is_empty() {
    println!("no bootstrap scripts to run");
  } else {
    let verb = if dry_run { "would run" } else { "ran" };
    for filename in &ran {
      println!("{} {}", verb, filename);
    }
  }
  Ok(())
}
