//! Release notes built from conventional commit messages.
//!
//! Only user-facing commit types make it into the notes: `feat`, `fix`,
//! `perf` and `revert`. Breaking changes (`type!:` or a `BREAKING CHANGE:`
//! footer) get their own section regardless of type.

use crate::domain::version::Version;
use regex::Regex;
use std::sync::OnceLock;

pub const CHANGELOG_FILE: &str = "CHANGELOG.md";

const BREAKING_FOOTER: &str = "BREAKING CHANGE:";

/// Section order in a rendered entry
const SECTIONS: [(&str, &str); 4] = [
    ("feat", "Features"),
    ("fix", "Bug Fixes"),
    ("perf", "Performance Improvements"),
    ("revert", "Reverts"),
];

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^([a-z]+)(?:\(([^)]+)\))?(!)?:\s*(.+)$")
            .expect("conventional commit pattern is valid")
    })
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConventionalCommit {
    pub kind: String,
    pub scope: Option<String>,
    pub description: String,
    pub is_breaking_change: bool,
}

/// Parse `type(scope)!: description` from the first line of a commit message.
///
/// Returns `None` for messages that do not follow the convention.
pub fn parse_conventional_commit(message: &str) -> Option<ConventionalCommit> {
    let header = message.lines().next()?.trim();
    let captures = header_regex().captures(header)?;

    Some(ConventionalCommit {
        kind: captures.get(1)?.as_str().to_string(),
        scope: captures.get(2).map(|m| m.as_str().to_string()),
        description: captures.get(4)?.as_str().trim().to_string(),
        is_breaking_change: captures.get(3).is_some() || message.contains(BREAKING_FOOTER),
    })
}

fn bullet(commit: &ConventionalCommit) -> String {
    match &commit.scope {
        Some(scope) => format!("* **{}:** {}", scope, commit.description),
        None => format!("* {}", commit.description),
    }
}

/// Render the notes for `version` from commit messages, newest first.
pub fn render_changelog(version: &Version, messages: &[String]) -> String {
    let commits: Vec<ConventionalCommit> = messages
        .iter()
        .filter_map(|message| parse_conventional_commit(message))
        .collect();

    let mut entry = format!("## {}\n", version);

    let breaking: Vec<String> = commits
        .iter()
        .filter(|commit| commit.is_breaking_change)
        .map(bullet)
        .collect();
    if !breaking.is_empty() {
        entry.push_str(&format!("\n### BREAKING CHANGES\n\n{}\n", breaking.join("\n")));
    }

    for (kind, title) in SECTIONS {
        let lines: Vec<String> = commits
            .iter()
            .filter(|commit| commit.kind == kind && !commit.is_breaking_change)
            .map(bullet)
            .collect();
        if !lines.is_empty() {
            entry.push_str(&format!("\n### {}\n\n{}\n", title, lines.join("\n")));
        }
    }

    entry
}

/// Put `entry` on top of an existing changelog, below its `# ` title if it has one.
pub fn prepend_changelog(existing: &str, entry: &str) -> String {
    let entry = entry.trim_end();
    if existing.trim().is_empty() {
        return format!("{}\n", entry);
    }

    match existing.split_once('\n') {
        Some((title, rest)) if title.starts_with("# ") => {
            format!("{}\n\n{}\n\n{}", title, entry, rest.trim_start_matches('\n'))
        }
        _ => format!("{}\n\n{}", entry, existing),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn messages(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_parse_conventional_commit() {
        let commit = parse_conventional_commit("feat(cart): add coupons\n\nbody").unwrap();
        assert_eq!(commit.kind, "feat");
        assert_eq!(commit.scope.as_deref(), Some("cart"));
        assert_eq!(commit.description, "add coupons");
        assert!(!commit.is_breaking_change);
    }

    #[test]
    fn test_parse_breaking_markers() {
        assert!(parse_conventional_commit("feat!: drop IE").unwrap().is_breaking_change);
        assert!(
            parse_conventional_commit("fix(api)!: new auth").unwrap().is_breaking_change
        );
        assert!(
            parse_conventional_commit("refactor: routes\n\nBREAKING CHANGE: paths moved")
                .unwrap()
                .is_breaking_change
        );
    }

    #[test]
    fn test_parse_rejects_free_text() {
        assert_eq!(parse_conventional_commit("Update readme"), None);
        assert_eq!(parse_conventional_commit("Merge branch 'x'"), None);
        assert_eq!(parse_conventional_commit(""), None);
    }

    #[test]
    fn test_render_groups_by_section() {
        let entry = render_changelog(
            &Version::new(1, 4, 0),
            &messages(&[
                "fix(cart): rounding",
                "chore: bump deps",
                "feat: wishlist",
                "feat(api)!: v2 endpoints",
                "Update readme",
            ]),
        );

        assert_eq!(
            entry,
            "## 1.4.0\n\n\
             ### BREAKING CHANGES\n\n* **api:** v2 endpoints\n\n\
             ### Features\n\n* wishlist\n\n\
             ### Bug Fixes\n\n* **cart:** rounding\n"
        );
    }

    #[test]
    fn test_render_without_notable_commits() {
        let entry = render_changelog(&Version::new(0, 1, 0), &messages(&["chore: init"]));
        assert_eq!(entry, "## 0.1.0\n");
    }

    #[test]
    fn test_prepend_keeps_title_on_top() {
        let existing = "# Changelog\n\n## 1.0.0\n\n* first\n";
        let updated = prepend_changelog(existing, "## 1.1.0\n\n* second\n");
        assert_eq!(
            updated,
            "# Changelog\n\n## 1.1.0\n\n* second\n\n## 1.0.0\n\n* first\n"
        );
    }

    #[test]
    fn test_prepend_without_title_or_file() {
        assert_eq!(prepend_changelog("", "## 1.0.0\n"), "## 1.0.0\n");
        assert_eq!(
            prepend_changelog("## 1.0.0\n", "## 1.1.0\n"),
            "## 1.1.0\n\n## 1.0.0\n"
        );
    }
}
