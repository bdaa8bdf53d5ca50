//! `hop dev init-project`: scaffolds a project directory from an existing
//! database connection file, with no live database connection required.

use crate::helpers::{git, stderr, stdout};
use std::process::Command;
use tempfile::TempDir;

#[test]
fn init_project_scaffolds_directory_and_ho_prod_branch() {
  let work_dir = TempDir::new().unwrap();
  let conf_dir = TempDir::new().unwrap();
  std::fs::write(
    conf_dir.path().join("widgets"),
    "[database]\nname = widgets\nuser = postgres\nhost = localhost\nport = 5432\nproduction = False\n",
  )
  .unwrap();

  let bin = env!("CARGO_BIN_EXE_hop");
  let output = Command::new(bin)
    .current_dir(work_dir.path())
    .env("HALFORM_CONF_DIR", conf_dir.path())
    .args(["dev", "init-project", "widgets"])
    .output()
    .unwrap();
  assert!(output.status.success(), "stdout: {}\nstderr: {}", stdout(&output), stderr(&output));

  let project_root = work_dir.path().join("widgets");
  assert!(project_root.join(".hop/config").is_file());
  assert!(project_root.join(".hop/model/schema-0.0.0.sql").is_file());
  assert!(project_root.join("Patches").is_dir());
  assert!(project_root.join("bootstrap").is_dir());
  assert!(project_root.join("releases").is_dir());

  let branches = git(&project_root, &["branch", "--list"]).unwrap();
  let text = String::from_utf8_lossy(&branches.stdout);
  assert!(text.contains("ho-prod"));
}

#[test]
fn init_project_fails_without_existing_connection_file() {
  let work_dir = TempDir::new().unwrap();
  let conf_dir = TempDir::new().unwrap();

  let bin = env!("CARGO_BIN_EXE_hop");
  let output = Command::new(bin)
    .current_dir(work_dir.path())
    .env("HALFORM_CONF_DIR", conf_dir.path())
    .args(["dev", "init-project", "ghost_db"])
    .output()
    .unwrap();
  assert!(!output.status.success());
  assert_eq!(output.status.code(), Some(1));
}
