//! `hop dev create-patch`: reservation tag, branch, and directory scaffold.

use crate::helpers::{TestProject, git, stderr};

#[test]
fn create_patch_reserves_branch_and_directory() {
  let project = TestProject::new("patch_db").unwrap();

  let output = project.hop(&["create-patch", "1-auth"]).unwrap();
  assert!(output.status.success(), "stderr: {}", stderr(&output));

  assert_eq!(project.current_branch().unwrap(), "ho-patch/1-auth");
  assert!(project.file_exists("Patches/1-auth"));

  let tags = project.git_tags().unwrap();
  assert!(tags.contains(&"ho-patch/1".to_string()));

  let remote_tags = git(&project.path, &["ls-remote", "--tags", "origin"]).unwrap();
  let remote_text = String::from_utf8_lossy(&remote_tags.stdout);
  assert!(remote_text.contains("ho-patch/1"));
}

#[test]
fn create_patch_bare_number_probes_upward_on_conflict() {
  let project = TestProject::new("patch_probe_db").unwrap();

  let first = project.hop(&["create-patch", "5"]).unwrap();
  assert!(first.status.success(), "stderr: {}", stderr(&first));
  git(&project.path, &["checkout", "-q", "ho-prod"]).unwrap();

  let second = project.hop(&["create-patch", "5"]).unwrap();
  assert!(second.status.success(), "stderr: {}", stderr(&second));

  let tags = project.git_tags().unwrap();
  assert!(tags.contains(&"ho-patch/5".to_string()));
  assert!(tags.contains(&"ho-patch/6".to_string()));
}

#[test]
fn create_patch_explicit_slug_conflict_is_a_name_conflict_error() {
  let project = TestProject::new("patch_conflict_db").unwrap();

  let first = project.hop(&["create-patch", "3-billing"]).unwrap();
  assert!(first.status.success(), "stderr: {}", stderr(&first));
  git(&project.path, &["checkout", "-q", "ho-prod"]).unwrap();

  let second = project.hop(&["create-patch", "3-billing-again"]).unwrap();
  assert!(!second.status.success());
}
