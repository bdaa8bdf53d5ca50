//! CLI-level smoke tests: help text, argument parsing, and the typed
//! error → exit code mapping surfaced through `main::handle_error`.

use crate::helpers::{TestProject, stderr, stdout};

#[test]
fn top_level_help_lists_dev_subcommand() {
  let project = TestProject::new("help_db").unwrap();
  let output = project.hop(&["--help"]).unwrap();
  assert!(output.status.success());
}

#[test]
fn dev_help_lists_every_verb() {
  let project = TestProject::new("help_db").unwrap();
  let output = project.hop(&["--help"]).unwrap();
  let text = stdout(&output);
  for verb in ["init-database", "init-project", "create-patch", "prepare-release", "apply-patch", "rollback", "create-hotfix"] {
    assert!(text.contains(verb), "missing '{}' in help text:\n{}", verb, text);
  }
}

#[test]
fn unknown_verb_is_a_clap_usage_error() {
  let project = TestProject::new("help_db").unwrap();
  let output = project.hop(&["not-a-real-verb"]).unwrap();
  assert!(!output.status.success());
  assert!(stderr(&output).to_lowercase().contains("unrecognized") || stderr(&output).to_lowercase().contains("error"));
}

/// A missing per-database connection file is a `HopError::DatabaseNotConfigured`,
/// exit code `UserError` (1) per `error::ExitCode`.
#[test]
fn apply_patch_without_connection_file_exits_user_error() {
  let project = TestProject::new("no_conn_db").unwrap();
  std::fs::remove_file(project.conf_dir.path().join(&project.db_name)).unwrap();

  let output = project.hop(&["apply-patch", "1-auth"]).unwrap();
  assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
}
