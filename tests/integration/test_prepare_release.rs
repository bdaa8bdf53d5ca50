//! `hop dev prepare-release`: opens an empty release stage manifest.

use crate::helpers::{TestProject, stderr};

#[test]
fn prepare_release_patch_opens_next_patch_stage() {
  let project = TestProject::new("release_db").unwrap();

  let output = project.hop(&["prepare-release", "patch"]).unwrap();
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(project.file_exists("releases/0.0.1-stage.toml"));
}

#[test]
fn prepare_release_minor_opens_next_minor_stage() {
  let project = TestProject::new("release_minor_db").unwrap();

  let output = project.hop(&["prepare-release", "minor"]).unwrap();
  assert!(output.status.success(), "stderr: {}", stderr(&output));
  assert!(project.file_exists("releases/0.1.0-stage.toml"));
}

#[test]
fn prepare_release_twice_for_same_version_conflicts() {
  let project = TestProject::new("release_conflict_db").unwrap();

  let first = project.hop(&["prepare-release", "patch"]).unwrap();
  assert!(first.status.success(), "stderr: {}", stderr(&first));

  let second = project.hop(&["prepare-release", "patch"]).unwrap();
  assert!(!second.status.success());
}
