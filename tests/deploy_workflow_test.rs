// tests/deploy_workflow_test.rs
use std::cell::Cell;

use git_promote::domain::Version;
use git_promote::git::{Branch, MockRepository, Operation};
use git_promote::ui::{Answer, ScriptedPrompter};
use git_promote::workflow::{promote, DeployRequest, Outcome};
use git_promote::GitPromoteError;

fn request(target_branch: &str, version: Version) -> DeployRequest {
    DeployRequest {
        application_name: "app".to_string(),
        version,
        target_branch: target_branch.to_string(),
        trunk_branch: "master".to_string(),
        remote_name: "origin".to_string(),
        source_message: Some("feat: new checkout\n\nReworked payment step".to_string()),
        dry_run: false,
    }
}

fn dirty_repo() -> MockRepository {
    let mut repo = MockRepository::new();
    repo.add_branch(Branch::current("master"));
    repo.set_dirty(true);
    repo
}

fn pushes(repo: &MockRepository) -> Vec<(String, bool)> {
    repo.operations()
        .into_iter()
        .filter_map(|op| match op {
            Operation::Push { reference, force } => Some((reference, force)),
            _ => None,
        })
        .collect()
}

#[test]
fn test_first_promotion_commits_tags_and_pushes() {
    let repo = dirty_repo();
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    let outcome = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        Ok(4)
    })
    .unwrap();

    let report = outcome.completed().unwrap();
    assert_eq!(report.branch, "master");
    assert_eq!(report.tags, vec!["app/latest", "app/1.0.0", "app/1.0.x"]);
    assert_eq!(report.files, 4);
    assert!(!report.overwritten);

    assert_eq!(
        repo.operations(),
        vec![
            Operation::Fetch,
            Operation::Switch("master".to_string()),
            Operation::Commit(
                "app 1.0.0 feat: new checkout\n\nReworked payment step\n".to_string()
            ),
            Operation::ReplaceTag("app/latest".to_string()),
            Operation::ReplaceTag("app/1.0.0".to_string()),
            Operation::ReplaceTag("app/1.0.x".to_string()),
            Operation::Push {
                reference: "master".to_string(),
                force: false
            },
            Operation::Push {
                reference: "app/latest".to_string(),
                force: true
            },
            Operation::Push {
                reference: "app/1.0.0".to_string(),
                force: true
            },
            Operation::Push {
                reference: "app/1.0.x".to_string(),
                force: true
            },
        ]
    );
}

#[test]
fn test_older_version_keeps_latest() {
    let mut repo = dirty_repo();
    repo.add_tag("app/2.0.0");
    repo.add_tag("app/latest");
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    let report = promote(&repo, &prompter, &request("master", Version::new(1, 9, 0)), || {
        Ok(1)
    })
    .unwrap()
    .completed()
    .unwrap();

    assert_eq!(report.tags, vec!["app/1.9.0", "app/1.9.x"]);
    assert!(!pushes(&repo).iter().any(|(r, _)| r == "app/latest"));
}

#[test]
fn test_declined_overwrite_changes_nothing() {
    let mut repo = dirty_repo();
    repo.add_tag("app/1.0.0");
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(false)]);
    let staged = Cell::new(false);

    let outcome = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        staged.set(true);
        Ok(1)
    })
    .unwrap();

    assert!(matches!(outcome, Outcome::Cancelled(_)));
    assert_eq!(repo.operations(), vec![Operation::Fetch]);
    assert!(!staged.get());
}

#[test]
fn test_accepted_overwrite_is_recorded_in_commit() {
    let mut repo = dirty_repo();
    repo.add_tag("app/1.0.0");
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true), Answer::Confirm(true)]);

    let report = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        Ok(1)
    })
    .unwrap()
    .completed()
    .unwrap();

    assert!(report.overwritten);
    assert!(repo
        .operations()
        .contains(&Operation::Commit(
            "app overwrite 1.0.0 feat: new checkout\n\nReworked payment step\n".to_string()
        )));
}

#[test]
fn test_dry_run_stops_after_plan() {
    let repo = dirty_repo();
    let prompter = ScriptedPrompter::new(vec![]);
    let mut dry = request("master", Version::new(1, 0, 0));
    dry.dry_run = true;

    let outcome = promote(&repo, &prompter, &dry, || Ok(1)).unwrap();

    assert!(matches!(outcome, Outcome::NothingToDo(_)));
    assert_eq!(repo.operations(), vec![Operation::Fetch]);
    assert!(prompter.asked().is_empty());
}

#[test]
fn test_missing_release_branch_is_forked_from_trunk() {
    let repo = dirty_repo();
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    promote(&repo, &prompter, &request("release/2.0", Version::new(2, 0, 1)), || {
        Ok(1)
    })
    .unwrap();

    let operations = repo.operations();
    assert_eq!(
        operations[1],
        Operation::CreateBranch {
            name: "release/2.0".to_string(),
            from_ref: "master".to_string(),
        }
    );
    assert_eq!(operations[2], Operation::Switch("release/2.0".to_string()));
    assert_eq!(pushes(&repo)[0], ("release/2.0".to_string(), false));
}

#[test]
fn test_remote_trunk_is_used_when_not_checked_out() {
    let mut repo = MockRepository::new();
    repo.add_branch(Branch::remote("master"));
    repo.set_dirty(true);
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    promote(&repo, &prompter, &request("release/2.0", Version::new(2, 0, 0)), || {
        Ok(1)
    })
    .unwrap();

    assert!(repo.operations().contains(&Operation::CreateBranch {
        name: "release/2.0".to_string(),
        from_ref: "origin/master".to_string(),
    }));
}

#[test]
fn test_remote_trunk_wins_over_local_trunk() {
    let mut repo = dirty_repo();
    repo.add_branch(Branch::remote("master"));
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    promote(&repo, &prompter, &request("release/2.0", Version::new(2, 0, 0)), || {
        Ok(1)
    })
    .unwrap();

    assert_eq!(
        repo.operations()[1],
        Operation::CreateBranch {
            name: "release/2.0".to_string(),
            from_ref: "origin/master".to_string(),
        }
    );
}

#[test]
fn test_existing_remote_release_branch_is_checked_out() {
    let mut repo = dirty_repo();
    repo.add_branch(Branch::remote("release/2.0"));
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

    promote(&repo, &prompter, &request("release/2.0", Version::new(2, 0, 0)), || {
        Ok(1)
    })
    .unwrap();

    let operations = repo.operations();
    assert_eq!(operations[1], Operation::Switch("release/2.0".to_string()));
    assert!(!operations
        .iter()
        .any(|op| matches!(op, Operation::CreateBranch { .. })));
}

#[test]
fn test_missing_trunk_is_branch_error() {
    let mut repo = MockRepository::new();
    repo.set_dirty(true);
    let prompter = ScriptedPrompter::new(vec![]);

    let result = promote(&repo, &prompter, &request("release/2.0", Version::new(2, 0, 0)), || {
        Ok(1)
    });
    assert!(matches!(result, Err(GitPromoteError::Branch(_))));
}

#[test]
fn test_unchanged_artifact_has_nothing_to_do() {
    let mut repo = dirty_repo();
    repo.set_dirty(false);
    let prompter = ScriptedPrompter::new(vec![]);

    let outcome = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        Ok(2)
    })
    .unwrap();

    assert!(matches!(outcome, Outcome::NothingToDo(_)));
    assert!(!repo
        .operations()
        .iter()
        .any(|op| matches!(op, Operation::Commit(_) | Operation::ReplaceTag(_))));
}

#[test]
fn test_declined_push_keeps_local_commit_and_tags() {
    let repo = dirty_repo();
    let prompter = ScriptedPrompter::new(vec![Answer::Confirm(false)]);

    let outcome = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        Ok(1)
    })
    .unwrap();

    assert!(matches!(outcome, Outcome::Cancelled(_)));
    assert!(!repo.pushed());
    assert!(repo
        .operations()
        .contains(&Operation::ReplaceTag("app/1.0.0".to_string())));
}

#[test]
fn test_staging_failure_stops_before_commit() {
    let repo = dirty_repo();
    let prompter = ScriptedPrompter::new(vec![]);

    let result = promote(&repo, &prompter, &request("master", Version::new(1, 0, 0)), || {
        Err(GitPromoteError::config("build output 'dist' does not exist"))
    });

    assert!(matches!(result, Err(GitPromoteError::Config(_))));
    assert!(!repo
        .operations()
        .iter()
        .any(|op| matches!(op, Operation::Commit(_))));
}
