mod applier;
mod bootstrap;
mod cli;
mod commands;
mod config;
mod db;
mod error;
mod exec;
mod manifest;
mod orchestrator;
mod patch_id;
mod patches;
mod repo;
mod version;
mod vcs;

use clap::Parser;
use cli::{DevCommand, HopCli, TopCommand};
use error::{HopError, print_error};

fn get_styles() -> clap::builder::Styles {
  clap::builder::Styles::styled()
    .usage(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .header(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Yellow))),
    )
    .literal(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))))
    .invalid(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .error(
      anstyle::Style::new()
        .bold()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Red))),
    )
    .valid(
      anstyle::Style::new()
        .bold()
        .underline()
        .fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::Green))),
    )
    .placeholder(anstyle::Style::new().fg_color(Some(anstyle::Color::Ansi(anstyle::AnsiColor::White))))
}

fn main() {
  tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_writer(std::io::stderr)
    .init();

  let cli = HopCli::parse();
  let TopCommand::Dev { verb } = cli.command;

  let result = match verb {
    DevCommand::InitDatabase {
      database_name,
      host,
      port,
      user,
      password,
      create_db,
      add_metadata,
      production,
    } => commands::run_init_database(database_name, host, port, user, password, create_db, add_metadata, production),

    DevCommand::InitProject { database_name, origin } => commands::run_init_project(database_name, origin),

    DevCommand::CreatePatch { id_or_number } => commands::run_create_patch(id_or_number),

    DevCommand::PrepareRelease { kind } => commands::run_prepare_release(kind),

    DevCommand::AddToRelease { patch_id, version } => commands::run_add_to_release(patch_id, version),

    DevCommand::PromoteToRc { version } => commands::run_promote_to_rc(version),

    DevCommand::PromoteToProd { version } => commands::run_promote_to_prod(version),

    DevCommand::DeployToProd { version } => commands::run_deploy_to_prod(version),

    DevCommand::Bootstrap { dry_run, force } => commands::run_bootstrap(dry_run, force),

    DevCommand::ApplyPatch { patch_id } => commands::run_apply_patch(patch_id),

    DevCommand::SyncPackage => commands::run_sync_package(),

    DevCommand::Upgrade => commands::run_upgrade(),

    DevCommand::Restore { version } => commands::run_restore(version),

    DevCommand::Rollback => commands::run_rollback(),

    DevCommand::CreateHotfix { base_version, id_or_number } => commands::run_create_hotfix(base_version, id_or_number),
  };

  if let Err(err) = result {
    handle_error(err);
  }
}

fn handle_error(err: HopError) -> ! {
  print_error(&err);
  std::process::exit(err.exit_code().as_i32());
}
