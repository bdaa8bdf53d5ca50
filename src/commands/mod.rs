//! CLI command handlers: one module per `hop dev <verb>`, each translating
//! parsed arguments into calls against the core modules and formatting the
//! result, in the teacher's `commands::run_*` style (`src/commands/mod.rs`).

mod add_to_release;
mod apply_patch;
mod bootstrap;
mod create_hotfix;
mod create_patch;
mod deploy_to_prod;
mod init_database;
mod init_project;
mod prepare_release;
mod promote_to_prod;
mod promote_to_rc;
mod restore;
mod rollback;
mod sync_package;
mod upgrade;

pub use add_to_release::run_add_to_release;
pub use apply_patch::run_apply_patch;
pub use bootstrap::run_bootstrap;
pub use create_hotfix::run_create_hotfix;
pub use create_patch::run_create_patch;
pub use deploy_to_prod::run_deploy_to_prod;
pub use init_database::run_init_database;
pub use init_project::run_init_project;
pub use prepare_release::run_prepare_release;
pub use promote_to_prod::run_promote_to_prod;
pub use promote_to_rc::run_promote_to_rc;
pub use restore::run_restore;
pub use rollback::run_rollback;
pub use sync_package::run_sync_package;
pub use upgrade::run_upgrade;

/// Connect to the current project's configured database, per the
/// three-priority db-config-name resolution in `repo::Repository`.
fn connect_project_db(repo: &crate::repo::Repository) -> crate::error::HopResult<crate::db::PgDatabase> {
  let db_config = repo.database_config()?;
  crate::db::connect(&db_config)
}

/// Discover the project rooted at (or above) the current working directory.
fn discover_repo() -> crate::error::HopResult<crate::repo::Repository> {
  let cwd = std::env::current_dir().map_err(crate::error::HopError::from)?;
  crate::repo::Repository::discover(&cwd)
}
