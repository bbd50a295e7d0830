use crate::domain::version::{compare, Version};
use regex::Regex;
use std::collections::HashSet;
use std::sync::OnceLock;

pub const RELEASE_PREFIX: &str = "release/";

fn release_branch_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^release/.+$").expect("release branch pattern is valid"))
}

fn versioned_release_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^release/(\d+)\.(\d+)(?:\.(\d+))?").expect("versioned release pattern is valid")
    })
}

fn release_version_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\d+\.\d+(\.\d+)?.*$").expect("release version input pattern is valid")
    })
}

/// A local or remote-tracking branch as reported by the repository
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Branch {
    /// Branch name without any remote prefix (`release/2.0`, not `origin/release/2.0`)
    pub name: String,
    pub is_remote: bool,
    pub is_current: bool,
}

impl Branch {
    pub fn local(name: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            is_remote: false,
            is_current: false,
        }
    }

    pub fn remote(name: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            is_remote: true,
            is_current: false,
        }
    }

    pub fn current(name: impl Into<String>) -> Self {
        Branch {
            name: name.into(),
            is_remote: false,
            is_current: true,
        }
    }

    pub fn is_release_branch(&self) -> bool {
        is_release_branch(&self.name)
    }
}

/// Whether a branch name is a release line (`release/...`)
pub fn is_release_branch(name: &str) -> bool {
    release_branch_regex().is_match(name)
}

/// Branch name for a release line label
pub fn release_branch_name(label: &str) -> String {
    format!("{}{}", RELEASE_PREFIX, label)
}

/// A release branch whose name carries a version
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseBranchCandidate {
    pub name: String,
    /// Ordering key only; a missing patch component reads as 0
    pub version: Version,
}

/// Parse `release/{major}.{minor}[.{patch}][anything]`
pub fn parse_release_branch(name: &str) -> Option<ReleaseBranchCandidate> {
    let captures = versioned_release_regex().captures(name)?;
    let major = captures.get(1)?.as_str().parse::<u64>().ok()?;
    let minor = captures.get(2)?.as_str().parse::<u64>().ok()?;
    let patch = match captures.get(3) {
        Some(m) => m.as_str().parse::<u64>().ok()?,
        None => 0,
    };

    Some(ReleaseBranchCandidate {
        name: name.to_string(),
        version: Version::new(major, minor, patch),
    })
}

/// Versioned release branches, local and remote merged by name, newest first
pub fn release_candidates(branches: &[Branch]) -> Vec<ReleaseBranchCandidate> {
    let mut seen = HashSet::new();

    let mut candidates: Vec<ReleaseBranchCandidate> = branches
        .iter()
        .filter(|branch| seen.insert(branch.name.as_str()))
        .filter_map(|branch| parse_release_branch(&branch.name))
        .collect();

    candidates.sort_by(|a, b| compare(&b.version, &a.version));
    candidates
}

/// Validate user input for a new release branch and return the branch name.
///
/// Input must look like `{major}.{minor}[.{patch}]...` and must not name an
/// existing release branch.
pub fn validate_release_version(
    input: &str,
    existing: &[ReleaseBranchCandidate],
) -> std::result::Result<String, String> {
    let input = input.trim();

    if !release_version_input_regex().is_match(input) {
        return Err(format!(
            "'{}' is not a release version, expected {{major}}.{{minor}}[.{{patch}}]",
            input
        ));
    }

    let name = release_branch_name(input);
    if existing.iter().any(|candidate| candidate.name == name) {
        return Err(format!("release branch '{}' already exists", name));
    }

    Ok(name)
}
