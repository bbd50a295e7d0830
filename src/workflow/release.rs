//! Cut a release: release notes, version bump, release commit and marker tag.
//!
//! `v1.4.0` sends the next deploy to the trunk branch, while `v1.4.0@2.0`
//! sends it to `release/2.0`.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::info;

use crate::config::{save_config, Config};
use crate::domain::changelog::{prepend_changelog, render_changelog, CHANGELOG_FILE};
use crate::domain::tag::{format_version_marker, latest_version_marker};
use crate::domain::version::Version;
use crate::error::{GitPromoteError, Result};
use crate::git::{Git2Repository, Repository};
use crate::ui::{display_changelog, display_status, display_success, display_warning, Prompter};
use crate::workflow::Outcome;

/// Result of a completed release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseReport {
    pub marker: String,
    pub version: Version,
    /// Branch pushed together with the marker, if HEAD is on one
    pub branch: Option<String>,
    /// Notes added to the changelog
    pub notes: String,
    /// A `release:` commit was made before tagging
    pub committed: bool,
}

/// Labels end up in `release/{label}` branch names
fn validate_label(label: &str) -> Result<()> {
    if label.is_empty() || label.contains('@') || label.contains(char::is_whitespace) {
        return Err(GitPromoteError::validation(format!(
            "'{}' is not a usable release label",
            label
        )));
    }
    Ok(())
}

/// Message of the commit carrying the version bump and the notes
pub fn release_commit_message(version: &Version, notes: &str) -> String {
    format!("release: {}\n\n{}\n", version, notes.trim_end())
}

/// `version` if its marker is free, otherwise a version asked from the user
fn choose_version<P: Prompter + ?Sized>(
    existing: &[String],
    prompter: &P,
    version: Version,
    label: Option<&str>,
) -> Result<Version> {
    let is_free = |version: &Version| {
        let marker = format_version_marker(version, label);
        !existing.iter().any(|tag| *tag == marker)
    };

    if is_free(&version) {
        return Ok(version);
    }

    display_warning(&format!(
        "'{}' already exists",
        format_version_marker(&version, label)
    ));
    let validate = |input: &str| -> std::result::Result<(), String> {
        let candidate = Version::parse(input).map_err(|e| e.to_string())?;
        if is_free(&candidate) {
            Ok(())
        } else {
            Err(format!(
                "'{}' already exists",
                format_version_marker(&candidate, label)
            ))
        }
    };
    let input = prompter.input_text("Version to release", None, &validate)?;
    validate(&input).map_err(GitPromoteError::validation)?;
    Version::parse(&input)
}

/// Release HEAD as `version`.
///
/// Notes are built from the conventional commits since the highest existing
/// version marker and handed to `write` together with the chosen version.
/// Whatever `write` changes is committed as `release: {version}`, then the
/// marker is placed on that commit. If the marker already exists the user is
/// asked for another version whose marker is free.
pub fn mark_release<R, P, F>(
    repo: &R,
    prompter: &P,
    version: Version,
    label: Option<&str>,
    write: F,
) -> Result<Outcome<ReleaseReport>>
where
    R: Repository + ?Sized,
    P: Prompter + ?Sized,
    F: FnOnce(&Version, &str) -> Result<()>,
{
    if let Some(label) = label {
        validate_label(label)?;
    }

    let existing = repo.list_tags()?;
    let version = choose_version(&existing, prompter, version, label)?;

    let since = latest_version_marker(&existing).map(|marker| marker.raw);
    let messages = repo.commit_messages_since(since.as_deref())?;
    let notes = render_changelog(&version, &messages);
    display_changelog(&notes);

    write(&version, &notes)?;
    let committed = repo.has_changes()?;
    if committed {
        repo.commit_all(&release_commit_message(&version, &notes))?;
        info!(version = %version, commits = messages.len(), "release commit created");
    }

    let marker = format_version_marker(&version, label);
    repo.create_tag(&marker)?;
    display_success(&format!("Created marker '{}'", marker));
    info!(marker = %marker, "version marker created");

    let branch = repo.current_branch_name()?;
    let what = match &branch {
        Some(branch) => format!("'{}' and '{}'", branch, marker),
        None => format!("'{}'", marker),
    };
    if !prompter.confirm(&format!("Push {} now?", what), true)? {
        display_status(&format!("Marker '{}' stays local", marker));
        return Ok(Outcome::cancelled("push declined, nothing was pushed"));
    }

    if let Some(branch) = &branch {
        repo.push(branch, false)?;
    }
    repo.push(&marker, false)?;
    display_success(&format!("Pushed {}", what));

    Ok(Outcome::Completed(ReleaseReport {
        marker,
        version,
        branch,
        notes,
        committed,
    }))
}

/// Prepend `notes` to the changelog at `path`, creating the file if needed
pub fn write_changelog(path: &Path, notes: &str) -> Result<()> {
    let existing = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e.into()),
    };
    fs::write(path, prepend_changelog(&existing, notes))?;
    Ok(())
}

/// Release the repository in the current directory.
///
/// The changelog lives at the root of the working tree. The released version
/// is written back to `config_file` when the configuration came from one.
pub fn release<P: Prompter + ?Sized>(
    config: &Config,
    config_file: Option<&Path>,
    prompter: &P,
    version: Version,
    label: Option<&str>,
) -> Result<Outcome<ReleaseReport>> {
    let repo = Git2Repository::open(".", config.deploy.remote_name.as_str())?;
    let changelog = repo
        .workdir()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
        .join(CHANGELOG_FILE);

    mark_release(&repo, prompter, version, label, |version, notes| {
        write_changelog(&changelog, notes)?;
        if let Some(path) = config_file {
            let mut updated = config.clone();
            updated.application.version = Some(version.to_string());
            save_config(path, &updated)?;
        }
        Ok(())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::git::{Branch, MockRepository, Operation};
    use crate::ui::{Answer, ScriptedPrompter};
    use std::cell::RefCell;
    use tempfile::TempDir;

    fn no_files(_: &Version, _: &str) -> Result<()> {
        Ok(())
    }

    #[test]
    fn test_marks_and_pushes() {
        let mut repo = MockRepository::new();
        repo.add_branch(Branch::current("feature/x"));
        let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);

        let outcome =
            mark_release(&repo, &prompter, Version::new(1, 4, 0), Some("2.0"), no_files)
                .unwrap();

        let report = outcome.completed().unwrap();
        assert_eq!(report.marker, "v1.4.0@2.0");
        assert!(!report.committed);
        assert_eq!(
            repo.operations(),
            vec![
                Operation::CreateTag("v1.4.0@2.0".to_string()),
                Operation::Push {
                    reference: "feature/x".to_string(),
                    force: false
                },
                Operation::Push {
                    reference: "v1.4.0@2.0".to_string(),
                    force: false
                },
            ]
        );
    }

    #[test]
    fn test_commits_notes_since_last_marker_before_tagging() {
        let mut repo = MockRepository::new();
        repo.add_branch(Branch::current("master"));
        repo.add_commit("feat: old feature");
        repo.add_tagged_commit("release: 1.3.0", "v1.3.0");
        repo.add_commit("feat(cart): coupons");
        repo.add_commit("docs: typo");
        repo.add_commit("fix: rounding");
        repo.set_dirty(true);
        let prompter = ScriptedPrompter::new(vec![Answer::Confirm(true)]);
        let written = RefCell::new(None);

        let outcome = mark_release(&repo, &prompter, Version::new(1, 4, 0), None, |v, notes| {
            *written.borrow_mut() = Some((*v, notes.to_string()));
            Ok(())
        })
        .unwrap();

        let notes = "## 1.4.0\n\n### Features\n\n* **cart:** coupons\n\n### Bug Fixes\n\n* rounding\n";
        assert_eq!(
            written.into_inner(),
            Some((Version::new(1, 4, 0), notes.to_string()))
        );
        let report = outcome.completed().unwrap();
        assert!(report.committed);
        assert_eq!(report.notes, notes);

        let operations = repo.operations();
        assert_eq!(
            operations[0],
            Operation::Commit(release_commit_message(&Version::new(1, 4, 0), notes))
        );
        assert_eq!(operations[1], Operation::CreateTag("v1.4.0".to_string()));
        assert!(release_commit_message(&Version::new(1, 4, 0), notes)
            .starts_with("release: 1.4.0\n\n## 1.4.0\n"));
    }

    #[test]
    fn test_existing_marker_asks_for_new_version() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.4.0");
        repo.add_branch(Branch::current("master"));
        let prompter = ScriptedPrompter::new(vec![
            Answer::Text("1.4.1".to_string()),
            Answer::Confirm(false),
        ]);
        let written = RefCell::new(None);

        let outcome = mark_release(&repo, &prompter, Version::new(1, 4, 0), None, |v, _| {
            *written.borrow_mut() = Some(*v);
            Ok(())
        })
        .unwrap();

        assert!(matches!(outcome, Outcome::Cancelled(_)));
        assert_eq!(written.into_inner(), Some(Version::new(1, 4, 1)));
        assert_eq!(
            repo.operations(),
            vec![Operation::CreateTag("v1.4.1".to_string())]
        );
        assert!(!repo.pushed());
    }

    #[test]
    fn test_taken_replacement_version_is_rejected() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.4.0");
        let prompter = ScriptedPrompter::new(vec![Answer::Text("1.4.0".to_string())]);

        let result = mark_release(&repo, &prompter, Version::new(1, 4, 0), None, |_, _| {
            panic!("nothing may be written for a rejected version")
        });
        assert!(matches!(result, Err(GitPromoteError::Validation(_))));
        assert!(repo.operations().is_empty());
    }

    #[test]
    fn test_rejects_bad_label() {
        let repo = MockRepository::new();
        let prompter = ScriptedPrompter::new(vec![]);
        let result = mark_release(
            &repo,
            &prompter,
            Version::new(1, 0, 0),
            Some("two words"),
            no_files,
        );
        assert!(matches!(result, Err(GitPromoteError::Validation(_))));
    }

    #[test]
    fn test_write_changelog_creates_then_prepends() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join(CHANGELOG_FILE);

        write_changelog(&path, "## 1.0.0\n").unwrap();
        write_changelog(&path, "## 1.1.0\n").unwrap();

        assert_eq!(
            fs::read_to_string(&path).unwrap(),
            "## 1.1.0\n\n## 1.0.0\n"
        );
    }
}
