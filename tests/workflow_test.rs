use std::fs;
use std::path::PathBuf;

use tempfile::TempDir;

use git_flow_release::config::WorkflowConfig;
use git_flow_release::domain::Version;
use git_flow_release::git::MockGit;
use git_flow_release::workflow;
use git_flow_release::ReleaseError;

/// Config backed by a marker file in a temp directory
fn setup(marker_content: &str) -> (TempDir, WorkflowConfig) {
    let dir = TempDir::new().unwrap();
    let version_file = dir.path().join("VERSION");
    fs::write(&version_file, marker_content).unwrap();

    let config = WorkflowConfig {
        version_file,
        ..WorkflowConfig::default()
    };

    (dir, config)
}

fn with_remote(mut config: WorkflowConfig) -> WorkflowConfig {
    config.remote = Some("origin".to_string());
    config
}

// ---------------------------------------------------------------------------
// start: preconditions
// ---------------------------------------------------------------------------

#[test]
fn test_start_dirty_tree_fails_without_mutation() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    git.set_clean(false);

    let err = workflow::start(&git, &config, None).unwrap_err();

    assert!(matches!(err, ReleaseError::DirtyWorkingTree));
    assert!(git.mutations().is_empty(), "calls: {:?}", git.calls());
}

#[test]
fn test_start_existing_release_branch_fails_without_mutation() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    git.add_local_branch("release/1.9.0");

    let err = workflow::start(&git, &config, None).unwrap_err();

    match err {
        ReleaseError::ConflictingReleaseBranch(branches) => {
            assert_eq!(branches, vec!["release/1.9.0"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(git.mutations().is_empty());
}

#[test]
fn test_start_lists_every_conflicting_branch_including_remote() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();
    git.add_local_branch("release/1.8.0");
    git.add_remote_branch("release/1.9.0");

    let err = workflow::start(&git, &config, None).unwrap_err();

    match err {
        ReleaseError::ConflictingReleaseBranch(branches) => {
            assert_eq!(branches, vec!["release/1.8.0", "release/1.9.0"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(git.mutations().is_empty());
}

#[test]
fn test_start_behind_remote_aborts_after_checkout_only() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();
    git.set_behind_remote("develop");

    let err = workflow::start(&git, &config, None).unwrap_err();

    match err {
        ReleaseError::BranchNotUpToDate(branch) => assert_eq!(branch, "develop"),
        other => panic!("unexpected error: {:?}", other),
    }
    assert_eq!(git.mutations(), vec!["checkout develop"]);
}

// ---------------------------------------------------------------------------
// start: end to end
// ---------------------------------------------------------------------------

#[test]
fn test_start_from_release_marker() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();

    let outcome = workflow::start(&git, &config, None).unwrap();

    assert_eq!(outcome.release_version.to_string(), "2.0.0");
    assert_eq!(outcome.release_branch, "release/2.0.0");
    assert_eq!(outcome.next_dev_version.to_string(), "2.0.1-SNAPSHOT");

    // development branch committed the next development version
    let dev_commits = git.commits_on("develop");
    assert_eq!(dev_commits.len(), 1);
    assert_eq!(dev_commits[0].message, "Start 2.0.1-SNAPSHOT");
    assert_eq!(dev_commits[0].files[0].1.as_deref(), Some("2.0.1-SNAPSHOT\n"));

    // release branch committed the release version
    let release_commits = git.commits_on("release/2.0.0");
    assert_eq!(release_commits.len(), 1);
    assert_eq!(release_commits[0].message, "Release start 2.0.0");
    assert_eq!(release_commits[0].files[0].1.as_deref(), Some("2.0.0\n"));

    assert_eq!(git.current_branch(), "release/2.0.0");
    assert!(git.local_branches().contains("release/2.0.0"));

    // local-only: nothing fetched or pushed
    assert!(!git.calls().iter().any(|c| c.starts_with("fetch")));
    assert!(!git.calls().iter().any(|c| c.starts_with("push")));
}

#[test]
fn test_start_from_snapshot_marker() {
    let (_dir, config) = setup("1.2.3-SNAPSHOT\n");
    let git = MockGit::new();

    let outcome = workflow::start(&git, &config, None).unwrap();

    assert_eq!(outcome.release_version.to_string(), "1.2.3");
    assert_eq!(outcome.release_branch, "release/1.2.3");
    assert_eq!(outcome.next_dev_version.to_string(), "1.2.4-SNAPSHOT");
}

#[test]
fn test_start_with_explicit_version_ignores_marker_value() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    let explicit = Version::parse("3.0.0").unwrap();

    let outcome = workflow::start(&git, &config, Some(explicit)).unwrap();

    assert_eq!(outcome.release_version.to_string(), "3.0.0");
    assert_eq!(outcome.release_branch, "release/3.0.0");
    assert_eq!(outcome.next_dev_version.to_string(), "3.0.1-SNAPSHOT");
}

#[test]
fn test_start_with_remote_fetches_and_pushes_both_branches() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();

    workflow::start(&git, &config, None).unwrap();

    let calls = git.calls();
    assert!(calls.contains(&"fetch origin".to_string()));
    assert!(calls.contains(&"is_branch_up_to_date develop origin".to_string()));
    assert!(calls.contains(&"push origin develop".to_string()));
    assert!(calls.contains(&"push origin release/2.0.0".to_string()));

    // fetch happens before any mutation
    let fetch_pos = calls.iter().position(|c| c == "fetch origin").unwrap();
    let first_mutation = calls.iter().position(|c| c == "checkout develop").unwrap();
    assert!(fetch_pos < first_mutation);
}

// ---------------------------------------------------------------------------
// finish: preconditions
// ---------------------------------------------------------------------------

#[test]
fn test_finish_dirty_tree_fails_without_mutation() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    git.set_clean(false);

    let err = workflow::finish(&git, &config).unwrap_err();

    assert!(matches!(err, ReleaseError::DirtyWorkingTree));
    assert!(git.mutations().is_empty());
}

#[test]
fn test_finish_without_release_branch_fails() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();

    let err = workflow::finish(&git, &config).unwrap_err();

    assert!(matches!(err, ReleaseError::NoReleaseBranch));
    assert!(git.mutations().is_empty());
}

#[test]
fn test_finish_with_two_release_branches_names_both() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    git.add_local_branch("release/1.0.0");
    git.add_local_branch("release/2.0.0");

    let err = workflow::finish(&git, &config).unwrap_err();

    match err {
        ReleaseError::MultipleReleaseBranches(branches) => {
            assert_eq!(branches, vec!["release/1.0.0", "release/2.0.0"]);
        }
        other => panic!("unexpected error: {:?}", other),
    }
    assert!(git.mutations().is_empty());
}

#[test]
fn test_finish_behind_remote_aborts_before_merge() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();
    git.add_local_branch("release/2.0.0");
    git.set_behind_remote("master");

    let err = workflow::finish(&git, &config).unwrap_err();

    match err {
        ReleaseError::BranchNotUpToDate(branch) => assert_eq!(branch, "master"),
        other => panic!("unexpected error: {:?}", other),
    }
    // only the up-to-date checkouts ran
    assert_eq!(git.mutations(), vec!["checkout develop", "checkout master"]);
}

// ---------------------------------------------------------------------------
// finish: end to end
// ---------------------------------------------------------------------------

/// Scripted per-branch marker contents: trunk ends up with the release
/// version, develop carries its own next snapshot.
fn setup_finish(git: &MockGit, config: &WorkflowConfig) {
    git.add_local_branch("release/2.0.0");
    let marker: PathBuf = config.version_file.clone();
    git.script_checkout_file("master", &marker, "2.0.0\n");
    git.script_checkout_file("release/2.0.0", &marker, "2.0.0\n");
    git.script_checkout_file("develop", &marker, "2.0.1-SNAPSHOT\n");
}

#[test]
fn test_finish_local_with_trunk() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    setup_finish(&git, &config);
    git.set_user_name("Jane Doe");

    let outcome = workflow::finish(&git, &config).unwrap();

    assert_eq!(outcome.release_version.to_string(), "2.0.0");
    assert_eq!(outcome.tag, "2.0.0");

    let calls = git.calls();
    assert!(calls.contains(&"checkout master".to_string()));
    assert!(calls.contains(&"merge release/2.0.0 \"Merge release/2.0.0\" -".to_string()));
    assert!(calls.contains(&"tag 2.0.0 \"Release 2.0.0 by Jane Doe\"".to_string()));
    assert!(calls.contains(&"merge master \"Merge master\" -".to_string()));
    assert!(calls.contains(&"delete_branch release/2.0.0 -".to_string()));

    // the development marker value is restored, not the release version
    let dev_commits = git.commits_on("develop");
    assert_eq!(dev_commits.len(), 1);
    assert_eq!(dev_commits[0].message, "Restore the current version 2.0.1-SNAPSHOT");
    assert_eq!(dev_commits[0].files[0].1.as_deref(), Some("2.0.1-SNAPSHOT\n"));

    // working tree ends on the release tag
    assert_eq!(git.current_branch(), "2.0.0");
    assert!(!git.local_branches().contains("release/2.0.0"));

    assert!(!calls.iter().any(|c| c.starts_with("push")));
    assert!(!calls.iter().any(|c| c.starts_with("fetch")));
}

#[test]
fn test_finish_without_user_name_uses_anonymous_message() {
    let (_dir, config) = setup("2.0.0\n");
    let git = MockGit::new();
    setup_finish(&git, &config);

    workflow::finish(&git, &config).unwrap();

    assert!(git
        .calls()
        .contains(&"tag 2.0.0 \"Release 2.0.0\"".to_string()));
}

#[test]
fn test_finish_with_trunk_skipped_merges_release_branch_directly() {
    let (_dir, mut config) = setup("2.0.0\n");
    config.trunk_branch = None;
    let git = MockGit::new();
    setup_finish(&git, &config);

    let outcome = workflow::finish(&git, &config).unwrap();

    assert_eq!(outcome.tag, "2.0.0");

    let calls = git.calls();
    assert!(!calls.iter().any(|c| c.contains("master")));
    assert!(calls.contains(&"checkout release/2.0.0".to_string()));
    assert!(calls.contains(&"merge release/2.0.0 \"Merge release/2.0.0\" -".to_string()));

    // the final tag checkout still succeeds
    assert_eq!(git.current_branch(), "2.0.0");
}

#[test]
fn test_finish_with_remote_checks_pushes_and_deletes_remote_branch() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();
    setup_finish(&git, &config);

    workflow::finish(&git, &config).unwrap();

    let calls = git.calls();
    assert!(calls.contains(&"fetch origin".to_string()));
    for branch in ["develop", "master", "release/2.0.0"] {
        assert!(calls.contains(&format!("is_branch_up_to_date {} origin", branch)));
    }

    // merges use the remote-tracking refs
    assert!(calls.contains(&"merge release/2.0.0 \"Merge release/2.0.0\" origin".to_string()));
    assert!(calls.contains(&"merge master \"Merge master\" origin".to_string()));

    assert!(calls.contains(&"push origin master".to_string()));
    assert!(calls.contains(&"push origin 2.0.0".to_string()));
    assert!(calls.contains(&"push origin develop".to_string()));
    assert!(calls.contains(&"delete_branch release/2.0.0 origin".to_string()));
}

#[test]
fn test_finish_finds_release_branch_only_on_remote() {
    let (_dir, config) = setup("2.0.0\n");
    let config = with_remote(config);
    let git = MockGit::new();
    git.add_remote_branch("release/2.0.0");
    git.script_checkout_file("master", config.version_file.clone(), "2.0.0\n");
    git.script_checkout_file("develop", config.version_file.clone(), "2.0.1-SNAPSHOT\n");

    let outcome = workflow::finish(&git, &config).unwrap();

    assert_eq!(outcome.release_version.to_string(), "2.0.0");
}
