//! Fold the current branch into a release branch.
//!
//! The user either picks an existing versioned release branch, which then
//! receives a merge of the current branch, or names a new release version,
//! which forks `release/{version}` from the current branch. Both paths end
//! with a push confirmation.

use tracing::info;

use crate::domain::branch::{is_release_branch, release_candidates, validate_release_version};
use crate::domain::resolver::resolve_current_branch;
use crate::error::{GitPromoteError, Result};
use crate::git::{MergeOutcome, Repository};
use crate::ui::{display_status, display_success, Prompter};
use crate::workflow::Outcome;

/// Menu entry appended after the existing release branches
pub const CREATE_NEW_OPTION: &str = "Create a new release branch";

/// Result of a completed merge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MergeReport {
    /// Branch that was folded in
    pub source: String,
    pub release_branch: String,
    /// The release branch was created instead of merged into
    pub created: bool,
}

/// Merge the current branch into a chosen or newly created release branch.
///
/// A merge conflict is fatal and leaves the conflicted working tree in place.
/// Declining the final confirmation leaves every local change in place and
/// pushes nothing.
pub fn merge_into_release<R, P>(repo: &R, prompter: &P) -> Result<Outcome<MergeReport>>
where
    R: Repository + ?Sized,
    P: Prompter + ?Sized,
{
    let source = match resolve_current_branch(repo)? {
        Some(branch) => branch,
        None => return Ok(Outcome::nothing_to_do("HEAD is not on any branch")),
    };
    if is_release_branch(&source) {
        return Ok(Outcome::nothing_to_do(format!(
            "'{}' is already a release branch",
            source
        )));
    }

    let candidates = release_candidates(&repo.list_branches(true)?);

    let selected = if candidates.is_empty() {
        None
    } else {
        let mut options: Vec<String> = candidates.iter().map(|c| c.name.clone()).collect();
        options.push(CREATE_NEW_OPTION.to_string());
        let index = prompter.choose_one(
            &format!("Select the release branch to merge '{}' into", source),
            &options,
        )?;
        candidates.get(index)
    };

    let (release_branch, created) = match selected {
        Some(candidate) => {
            display_status(&format!("Merging '{}' into '{}'...", source, candidate.name));
            repo.switch_branch(&candidate.name)?;
            match repo.merge(&source)? {
                MergeOutcome::Conflict => {
                    return Err(GitPromoteError::merge_conflict(
                        "merging into the release branch",
                        &source,
                        &candidate.name,
                    ))
                }
                MergeOutcome::UpToDate => {
                    display_status(&format!("'{}' is already up to date", candidate.name))
                }
                MergeOutcome::Merged => {
                    display_success(&format!("Merged '{}' into '{}'", source, candidate.name))
                }
            }
            (candidate.name.clone(), false)
        }
        None => {
            let validate =
                |input: &str| validate_release_version(input, &candidates).map(|_| ());
            let input = prompter.input_text("New release version (e.g. 2.1)", None, &validate)?;
            let name =
                validate_release_version(&input, &candidates).map_err(GitPromoteError::validation)?;

            repo.create_branch(&name, &source)?;
            repo.switch_branch(&name)?;
            display_success(&format!("Created '{}' from '{}'", name, source));
            (name, true)
        }
    };
    info!(source = %source, release_branch = %release_branch, created, "release branch ready");

    if !prompter.confirm(
        &format!("Push '{}' and '{}' to the remote?", release_branch, source),
        true,
    )? {
        return Ok(Outcome::cancelled("push declined, nothing was pushed"));
    }

    repo.push(&release_branch, false)?;
    repo.switch_branch(&source)?;
    repo.push(&source, false)?;
    display_success(&format!("Pushed '{}' and '{}'", release_branch, source));

    Ok(Outcome::Completed(MergeReport {
        source,
        release_branch,
        created,
    }))
}
