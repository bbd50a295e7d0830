//! Command workflows
//!
//! Each workflow sequences reads and mutations through the [Repository] and
//! [Prompter] ports. Domain decisions come from [crate::domain]; nothing here
//! talks to git or the terminal directly.
//!
//! [Repository]: crate::git::Repository
//! [Prompter]: crate::ui::Prompter

pub mod deploy;
pub mod init;
pub mod merge;
pub mod release;

pub use deploy::{deploy, promote, DeployReport, DeployRequest};
pub use init::init;
pub use merge::{merge_into_release, MergeReport};
pub use release::{mark_release, release, ReleaseReport};

/// How a workflow ended when it did not fail
///
/// `NothingToDo` and `Cancelled` are normal endings: the invocation still
/// succeeds, it just performed no (further) remote mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome<T> {
    Completed(T),
    /// The repository state does not call for any action
    NothingToDo(String),
    /// The user declined a confirmation
    Cancelled(String),
}

impl<T> Outcome<T> {
    pub fn nothing_to_do(reason: impl Into<String>) -> Self {
        Outcome::NothingToDo(reason.into())
    }

    pub fn cancelled(reason: impl Into<String>) -> Self {
        Outcome::Cancelled(reason.into())
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, Outcome::Completed(_))
    }

    /// The completed value, if any
    pub fn completed(self) -> Option<T> {
        match self {
            Outcome::Completed(value) => Some(value),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_outcome_helpers() {
        let done: Outcome<u8> = Outcome::Completed(3);
        assert!(done.is_completed());
        assert_eq!(done.completed(), Some(3));

        let skipped: Outcome<u8> = Outcome::nothing_to_do("no changes");
        assert!(!skipped.is_completed());
        assert_eq!(skipped, Outcome::NothingToDo("no changes".to_string()));
        assert_eq!(Outcome::<u8>::cancelled("declined").completed(), None);
    }
}
