//! Classifies the checkout state into a promotion decision.
//!
//! Classification is pure over the current branch name and the tags at HEAD.
//! Only [resolve_current_branch] and [resolve_promotion] read from a
//! [Repository], and neither mutates it.

use crate::domain::branch::{is_release_branch, release_branch_name};
use crate::domain::tag::parse_version_marker;
use crate::error::Result;
use crate::git::Repository;
use std::fmt;
use tracing::debug;

/// What triggered a promotion
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployType {
    /// A version marker tag sits on HEAD
    ByTag,
    /// HEAD is on a release branch
    ByBranch,
}

impl fmt::Display for DeployType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DeployType::ByTag => write!(f, "version tag"),
            DeployType::ByBranch => write!(f, "release branch"),
        }
    }
}

/// Where a promotion lands and why
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionDecision {
    pub target_ref: String,
    pub deploy_type: DeployType,
}

/// Decide whether the checkout should be promoted at all.
pub fn classify(current_branch: Option<&str>, head_tags: &[String]) -> Option<DeployType> {
    if head_tags
        .iter()
        .any(|tag| parse_version_marker(tag).is_some())
    {
        return Some(DeployType::ByTag);
    }

    match current_branch {
        Some(branch) if is_release_branch(branch) => Some(DeployType::ByBranch),
        _ => None,
    }
}

/// Decide the destination branch of a promotion, or `None` when nothing should deploy.
///
/// A formal-release marker (`v1.4.0@2.0`) sends the promotion to `release/2.0`;
/// a plain marker falls back to `trunk_branch`.
pub fn resolve(
    current_branch: Option<&str>,
    head_tags: &[String],
    trunk_branch: &str,
) -> Option<PromotionDecision> {
    let deploy_type = classify(current_branch, head_tags)?;

    let target_ref = match deploy_type {
        DeployType::ByBranch => current_branch?.to_string(),
        DeployType::ByTag => head_tags
            .iter()
            .filter_map(|tag| parse_version_marker(tag))
            .find_map(|marker| marker.label)
            .map(|label| release_branch_name(&label))
            .unwrap_or_else(|| trunk_branch.to_string()),
    };

    Some(PromotionDecision {
        target_ref,
        deploy_type,
    })
}

/// Current branch name, falling back to the first branch containing HEAD when detached.
pub fn resolve_current_branch<R: Repository + ?Sized>(repo: &R) -> Result<Option<String>> {
    if let Some(name) = repo.current_branch_name()? {
        return Ok(Some(name));
    }

    let containing = repo.branches_containing("HEAD")?;
    debug!(?containing, "detached HEAD, using first containing branch");
    Ok(containing.into_iter().next())
}

/// Read the checkout state from `repo` and resolve it into a decision.
pub fn resolve_promotion<R: Repository + ?Sized>(
    repo: &R,
    trunk_branch: &str,
) -> Result<Option<PromotionDecision>> {
    let current_branch = resolve_current_branch(repo)?;
    let head_tags = repo.tags_at_head()?;
    debug!(?current_branch, ?head_tags, "resolving promotion");

    Ok(resolve(current_branch.as_deref(), &head_tags, trunk_branch))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_classify_tag_wins_over_branch() {
        assert_eq!(
            classify(Some("release/2.0"), &tags(&["v1.0.0"])),
            Some(DeployType::ByTag)
        );
    }

    #[test]
    fn test_classify_ignores_application_tags() {
        assert_eq!(classify(Some("feature/x"), &tags(&["app/1.0.0"])), None);
    }

    #[test]
    fn test_classify_without_branch() {
        assert_eq!(classify(None, &[]), None);
        assert_eq!(classify(None, &tags(&["v2.0.0"])), Some(DeployType::ByTag));
    }

    #[test]
    fn test_resolve_plain_marker_goes_to_trunk() {
        let decision = resolve(Some("feature/x"), &tags(&["v1.4.0"]), "master").unwrap();
        assert_eq!(decision.deploy_type, DeployType::ByTag);
        assert_eq!(decision.target_ref, "master");
    }

    #[test]
    fn test_resolve_first_formal_marker_wins() {
        let decision = resolve(
            Some("feature/x"),
            &tags(&["v1.4.0", "v1.4.0@2.0", "v1.4.0@3.0"]),
            "master",
        )
        .unwrap();
        assert_eq!(decision.target_ref, "release/2.0");
    }

    #[test]
    fn test_deploy_type_display() {
        assert_eq!(DeployType::ByTag.to_string(), "version tag");
        assert_eq!(DeployType::ByBranch.to_string(), "release branch");
    }
}
