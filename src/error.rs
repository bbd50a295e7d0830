use thiserror::Error;

/// Unified error type for git-promote operations
#[derive(Error, Debug)]
pub enum GitPromoteError {
    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Merge conflict while {step}: '{source_ref}' could not be merged into '{target}'")]
    MergeConflict {
        step: String,
        source_ref: String,
        target: String,
    },

    #[error("Tag error: {0}")]
    Tag(String),

    #[error("Branch error: {0}")]
    Branch(String),

    #[error("Remote operation failed: {0}")]
    Remote(String),

    #[error("Prompt failed: {0}")]
    Prompt(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for Results in git-promote
pub type Result<T> = std::result::Result<T, GitPromoteError>;

impl GitPromoteError {
    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        GitPromoteError::Config(msg.into())
    }

    /// Create a validation error naming the offending input
    pub fn validation(msg: impl Into<String>) -> Self {
        GitPromoteError::Validation(msg.into())
    }

    /// Create a tag error with context
    pub fn tag(msg: impl Into<String>) -> Self {
        GitPromoteError::Tag(msg.into())
    }

    /// Create a branch error with context
    pub fn branch(msg: impl Into<String>) -> Self {
        GitPromoteError::Branch(msg.into())
    }

    /// Create a remote error with context
    pub fn remote(msg: impl Into<String>) -> Self {
        GitPromoteError::Remote(msg.into())
    }

    /// Create a prompt error with context
    pub fn prompt(msg: impl Into<String>) -> Self {
        GitPromoteError::Prompt(msg.into())
    }

    /// Create a merge conflict error for the step that failed
    pub fn merge_conflict(
        step: impl Into<String>,
        source_ref: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        GitPromoteError::MergeConflict {
            step: step.into(),
            source_ref: source_ref.into(),
            target: target.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GitPromoteError::config("missing remote");
        assert_eq!(err.to_string(), "Configuration error: missing remote");
    }

    #[test]
    fn test_error_from_io() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: GitPromoteError = io_err.into();
        assert!(err.to_string().contains("I/O error"));
    }

    #[test]
    fn test_validation_error_names_input() {
        let err = GitPromoteError::validation("'1.x' is not a valid version");
        assert!(err.to_string().starts_with("Invalid input"));
        assert!(err.to_string().contains("'1.x'"));
    }

    #[test]
    fn test_merge_conflict_names_step() {
        let err = GitPromoteError::merge_conflict(
            "merging into release/2.0",
            "feature/login",
            "release/2.0",
        );
        let msg = err.to_string();
        assert!(msg.contains("merging into release/2.0"));
        assert!(msg.contains("feature/login"));
        assert!(msg.contains("release/2.0"));
    }

    #[test]
    fn test_error_messages_are_descriptive() {
        let error_pairs = vec![
            (GitPromoteError::config("x"), "Configuration error"),
            (GitPromoteError::validation("x"), "Invalid input"),
            (GitPromoteError::tag("x"), "Tag error"),
            (GitPromoteError::branch("x"), "Branch error"),
            (GitPromoteError::remote("x"), "Remote operation failed"),
            (GitPromoteError::prompt("x"), "Prompt failed"),
        ];

        for (err, expected_prefix) in error_pairs {
            let msg = err.to_string();
            assert!(
                msg.starts_with(expected_prefix),
                "Error message should start with '{}', but got '{}'",
                expected_prefix,
                msg
            );
        }
    }
}
