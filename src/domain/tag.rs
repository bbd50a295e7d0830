//! Tag grammars: per-application version tags and `v`-prefixed version markers.
//!
//! Application tags look like `{app}/{major}.{minor}.{patch}{suffix}` and live
//! in the downstream repository. Version markers look like
//! `v{major}.{minor}.{patch}{suffix}` (optionally `@{label}`) and live in the
//! source repository, where they drive promotion.

use crate::domain::version::{compare, is_newer_than, Version};
use regex::Regex;
use std::sync::OnceLock;

const LATEST: &str = "latest";

fn application_tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([^/]+)/(\d+)\.(\d+)\.(\d+)(.*)$").expect("application tag pattern is valid")
    })
}

fn version_marker_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^v(\d+)\.(\d+)\.(\d+)(.*)$").expect("version marker pattern is valid")
    })
}

fn digits(captures: &regex::Captures<'_>, index: usize) -> Option<u64> {
    captures.get(index)?.as_str().parse::<u64>().ok()
}

/// A versioned tag belonging to one application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    /// Tag text exactly as stored, suffix included
    pub raw: String,
    pub application_name: String,
    pub version: Version,
}

/// Parse `{app}/{major}.{minor}.{patch}{anything}`.
///
/// Returns `None` for unrelated tags, wide tags (`app/1.2.x`) and `app/latest`.
pub fn parse_tag(raw: &str) -> Option<Tag> {
    let captures = application_tag_regex().captures(raw)?;
    let version = Version::new(
        digits(&captures, 2)?,
        digits(&captures, 3)?,
        digits(&captures, 4)?,
    );

    Some(Tag {
        raw: raw.to_string(),
        application_name: captures.get(1)?.as_str().to_string(),
        version,
    })
}

/// Canonical tag name for an application version, without suffix
pub fn format_tag(application_name: &str, version: &Version) -> String {
    format!("{}/{}", application_name, version)
}

/// Tag tracking the newest patch within a minor line: `{app}/{major}.{minor}.x`
pub fn wide_tag_name(application_name: &str, version: &Version) -> String {
    format!("{}/{}.{}.x", application_name, version.major, version.minor)
}

/// Tag tracking the newest promoted version: `{app}/latest`
pub fn latest_tag_name(application_name: &str) -> String {
    format!("{}/{}", application_name, LATEST)
}

/// Versioned tags of one application, newest first.
///
/// Index 0 is treated as the current latest by the promotion policy.
pub fn tags_for_application(all_tags: &[String], application_name: &str) -> Vec<Tag> {
    let prefix = format!("{}/", application_name);

    let mut tags: Vec<Tag> = all_tags
        .iter()
        .filter(|raw| raw.starts_with(&prefix))
        .filter_map(|raw| parse_tag(raw))
        .filter(|tag| tag.application_name == application_name)
        .collect();

    tags.sort_by(|a, b| compare(&b.version, &a.version));
    tags
}

/// A `v{version}` marker tag placed on a source commit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionMarker {
    pub raw: String,
    pub version: Version,
    /// Release line named after `@`, present only on formal-release markers
    pub label: Option<String>,
}

impl VersionMarker {
    pub fn is_formal_release(&self) -> bool {
        self.label.is_some()
    }
}

/// Parse `v{major}.{minor}.{patch}{anything}[@{label}]`.
pub fn parse_version_marker(raw: &str) -> Option<VersionMarker> {
    let captures = version_marker_regex().captures(raw)?;
    let version = Version::new(
        digits(&captures, 1)?,
        digits(&captures, 2)?,
        digits(&captures, 3)?,
    );

    let label = captures
        .get(4)
        .and_then(|rest| rest.as_str().split_once('@'))
        .map(|(_, label)| label.to_string())
        .filter(|label| !label.is_empty());

    Some(VersionMarker {
        raw: raw.to_string(),
        version,
        label,
    })
}

pub fn format_version_marker(version: &Version, label: Option<&str>) -> String {
    match label {
        Some(label) => format!("v{}@{}", version, label),
        None => format!("v{}", version),
    }
}

/// Highest version marker among `all_tags`; the first one wins on equal versions.
pub fn latest_version_marker(all_tags: &[String]) -> Option<VersionMarker> {
    all_tags
        .iter()
        .filter_map(|raw| parse_version_marker(raw))
        .fold(None, |best: Option<VersionMarker>, marker| match best {
            Some(best) if !is_newer_than(&marker.version, &best.version) => Some(best),
            _ => Some(marker),
        })
}
