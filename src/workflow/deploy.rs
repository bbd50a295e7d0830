//! Promote the build output into the downstream repository.
//!
//! [deploy] wires the real repositories from the configuration; [promote] is
//! the effect sequence itself and runs against any [Repository], which is
//! how the tests drive it.

use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::artifact::stage_artifact;
use crate::config::Config;
use crate::domain::policy::{plan, TagAction, TagMutationPlan};
use crate::domain::resolver::resolve_promotion;
use crate::domain::tag::{format_tag, tags_for_application};
use crate::domain::version::Version;
use crate::error::{GitPromoteError, Result};
use crate::git::{Git2Repository, Repository};
use crate::ui::{
    display_decision, display_manual_push_instruction, display_status, display_success,
    display_tag_plan, Prompter,
};
use crate::workflow::Outcome;

/// Everything [promote] needs to know about one promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployRequest {
    pub application_name: String,
    pub version: Version,
    /// Destination branch in the downstream repository
    pub target_branch: String,
    /// Branch a missing destination branch is forked from
    pub trunk_branch: String,
    pub remote_name: String,
    /// HEAD message of the source checkout, reused in the downstream commit
    pub source_message: Option<String>,
    /// Stop after showing the tag plan
    pub dry_run: bool,
}

/// Result of a completed promotion
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub branch: String,
    pub tags: Vec<String>,
    /// Files copied from the build output
    pub files: usize,
    /// The exact version tag existed and was overwritten
    pub overwritten: bool,
}

/// Commit message for a promotion.
///
/// The first line names the application and version, followed by the title of
/// the source commit; the source commit body becomes the message body.
pub fn commit_message(
    application_name: &str,
    version: &Version,
    overwrite: bool,
    source_message: Option<&str>,
) -> String {
    let source_message = source_message.unwrap_or_default().trim();
    let (title, body) = match source_message.split_once('\n') {
        Some((title, body)) => (title.trim(), body.trim()),
        None => (source_message, ""),
    };

    format!(
        "{} {}{} {}\n\n{}\n",
        application_name,
        if overwrite { "overwrite " } else { "" },
        version,
        if title.is_empty() { "Untitled" } else { title },
        if body.is_empty() { "No description" } else { body },
    )
}

/// Check out `target`, forking it from the trunk when it exists nowhere yet.
///
/// `{remote}/{trunk}` is preferred over the local trunk.
fn ensure_branch<R: Repository + ?Sized>(repo: &R, request: &DeployRequest) -> Result<()> {
    let branches = repo.list_branches(true)?;
    let target = request.target_branch.as_str();
    let trunk = request.trunk_branch.as_str();

    if branches.iter().any(|branch| branch.name == target) {
        return repo.switch_branch(target);
    }

    // The fetched remote trunk is fresher than a local trunk left in a reused checkout
    let from_ref = if branches.iter().any(|b| b.is_remote && b.name == trunk) {
        format!("{}/{}", request.remote_name, trunk)
    } else if branches.iter().any(|b| !b.is_remote && b.name == trunk) {
        trunk.to_string()
    } else {
        return Err(GitPromoteError::branch(format!(
            "cannot create '{}': trunk branch '{}' not found",
            target, trunk
        )));
    };

    display_status(&format!("Creating '{}' from '{}'", target, from_ref));
    repo.create_branch(target, &from_ref)?;
    repo.switch_branch(target)
}

/// Write every tag of `plan` at HEAD, in order
pub fn apply_tag_plan<R: Repository + ?Sized>(repo: &R, plan: &TagMutationPlan) -> Result<()> {
    for mutation in plan.iter() {
        match mutation.action {
            TagAction::Create => repo.create_tag(&mutation.tag_name)?,
            TagAction::Replace => repo.create_or_replace_tag(&mutation.tag_name)?,
        }
    }
    Ok(())
}

/// Run one promotion against the downstream repository.
///
/// `stage` copies the artifact into the working tree once the destination
/// branch is checked out and returns the number of files copied. Declining a
/// confirmation stops before any push; the local commit and tags stay and are
/// rewritten by the next run.
pub fn promote<R, P, F>(
    repo: &R,
    prompter: &P,
    request: &DeployRequest,
    stage: F,
) -> Result<Outcome<DeployReport>>
where
    R: Repository + ?Sized,
    P: Prompter + ?Sized,
    F: FnOnce() -> Result<usize>,
{
    let name = request.application_name.as_str();

    display_status("Fetching latest data from remote...");
    repo.fetch()?;

    let existing = tags_for_application(&repo.list_tags()?, name);
    let promotion = plan(&existing, name, request.version);
    display_tag_plan(&promotion);

    if request.dry_run {
        return Ok(Outcome::nothing_to_do("dry run, nothing was written"));
    }

    if promotion.had_conflict {
        let exact = format_tag(name, &request.version);
        if !prompter.confirm(&format!("'{}' already exists. Overwrite it?", exact), false)? {
            return Ok(Outcome::cancelled(format!("'{}' was left untouched", exact)));
        }
    }

    ensure_branch(repo, request)?;

    let files = stage()?;
    display_status(&format!("Copied {} files", files));

    if !repo.has_changes()? {
        return Ok(Outcome::nothing_to_do("no changes to commit"));
    }

    let message = commit_message(
        name,
        &request.version,
        promotion.had_conflict,
        request.source_message.as_deref(),
    );
    repo.commit_all(&message)?;
    info!(branch = %request.target_branch, version = %request.version, "committed artifact");

    apply_tag_plan(repo, &promotion.plan)?;

    let tags: Vec<String> = promotion
        .plan
        .tag_names()
        .into_iter()
        .map(String::from)
        .collect();

    if !prompter.confirm(
        &format!(
            "Push '{}' and {} tags to '{}'?",
            request.target_branch,
            tags.len(),
            request.remote_name
        ),
        true,
    )? {
        let mut refs = vec![request.target_branch.clone()];
        refs.extend(tags.iter().cloned());
        display_manual_push_instruction(&refs, &request.remote_name);
        return Ok(Outcome::cancelled("push declined, nothing was pushed"));
    }

    repo.push(&request.target_branch, false)?;
    for tag in &tags {
        repo.push(tag, true)?;
    }
    display_success(&format!(
        "Promoted {} {} to '{}'",
        name, request.version, request.target_branch
    ));

    Ok(Outcome::Completed(DeployReport {
        branch: request.target_branch.clone(),
        tags,
        files,
        overwritten: promotion.had_conflict,
    }))
}

/// Promote the build output of the current checkout as configured.
pub fn deploy<P: Prompter + ?Sized>(
    config: &Config,
    prompter: &P,
    dry_run: bool,
) -> Result<Outcome<DeployReport>> {
    let application_name = config.application_name()?.to_string();
    let version = config.candidate_version()?;
    let remote_url = config.remote()?;

    let local = Git2Repository::open(".", config.deploy.remote_name.as_str())?;
    let decision = match resolve_promotion(&local, &config.deploy.trunk_branch)? {
        Some(decision) => decision,
        None => {
            return Ok(Outcome::nothing_to_do(
                "HEAD is neither on a release branch nor tagged with a version marker",
            ))
        }
    };
    display_decision(&decision);

    let checkout = config.checkout_dir()?;
    if let Some(parent) = checkout.parent() {
        fs::create_dir_all(parent)?;
    }
    display_status(&format!("Preparing checkout at {}", checkout.display()));
    let target = Git2Repository::open_or_clone(
        remote_url,
        &checkout,
        config.deploy.remote_name.as_str(),
    )?;

    let request = DeployRequest {
        application_name,
        version,
        target_branch: decision.target_ref,
        trunk_branch: config.deploy.trunk_branch.clone(),
        remote_name: config.deploy.remote_name.clone(),
        source_message: local.head_message()?,
        dry_run,
    };

    let dist = PathBuf::from(&config.deploy.dist);
    let destination = checkout.join(&config.deploy.target);
    promote(&target, prompter, &request, || {
        stage_artifact(&dist, &destination)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_commit_message_uses_source_title_and_body() {
        let message = commit_message(
            "app",
            &Version::new(1, 4, 0),
            false,
            Some("feat: checkout page\n\nAdds the new flow"),
        );
        assert_eq!(message, "app 1.4.0 feat: checkout page\n\nAdds the new flow\n");
    }

    #[test]
    fn test_commit_message_marks_overwrite() {
        let message = commit_message("app", &Version::new(1, 4, 0), true, None);
        assert!(message.starts_with("app overwrite 1.4.0 Untitled"));
        assert!(message.contains("No description"));
    }

    #[test]
    fn test_apply_tag_plan_keeps_create_strict() {
        use crate::domain::policy::TagMutation;
        use crate::git::{MockRepository, Operation};

        let mut repo = MockRepository::new();
        repo.add_tag("app/latest");
        let tags: TagMutationPlan = vec![
            TagMutation::create("app/1.0.0"),
            TagMutation::replace("app/latest"),
        ]
        .into_iter()
        .collect();

        apply_tag_plan(&repo, &tags).unwrap();
        assert_eq!(
            repo.operations(),
            vec![
                Operation::CreateTag("app/1.0.0".to_string()),
                Operation::ReplaceTag("app/latest".to_string()),
            ]
        );

        let clash: TagMutationPlan = vec![TagMutation::create("app/latest")].into_iter().collect();
        assert!(apply_tag_plan(&repo, &clash).is_err());
    }
}
