//! Git operations abstraction layer
//!
//! The policy engine never talks to git directly. Workflows request reads and
//! mutations through the [Repository] trait, which has two implementations:
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation that records every
//!   mutation, for testing workflows without a checkout
//!
//! ```rust
//! # use git_promote::git::Repository;
//! # fn example<R: Repository>(repo: &R) -> git_promote::Result<()> {
//! let tags = repo.list_tags()?;
//! let at_head = repo.tags_at_head()?;
//! println!("{} tags, {} at HEAD", tags.len(), at_head.len());
//! # Ok(())
//! # }
//! ```

pub mod mock;
pub mod repository;

pub use mock::{MockRepository, Operation};
pub use repository::Git2Repository;

pub use crate::domain::branch::Branch;
use crate::error::Result;

/// Result of merging a source ref into the current branch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// A merge commit was created or the branch was fast-forwarded
    Merged,
    /// The source was already contained in the current branch
    UpToDate,
    /// The merge stopped with conflicts; the working tree holds the conflict markers
    Conflict,
}

/// Version-control port used by the workflows
///
/// All implementors must be `Send + Sync`. Every method maps underlying
/// failures to [crate::error::GitPromoteError].
pub trait Repository: Send + Sync {
    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Local branches, plus remote-tracking branches when `include_remote` is set.
    ///
    /// Remote branch names are reported without the remote prefix.
    fn list_branches(&self, include_remote: bool) -> Result<Vec<Branch>>;

    /// Names of the tags pointing at the HEAD commit
    fn tags_at_head(&self) -> Result<Vec<String>>;

    /// Checked-out branch name, or `None` on a detached or unborn HEAD
    fn current_branch_name(&self) -> Result<Option<String>>;

    /// Local branches whose history contains `reference`
    fn branches_containing(&self, reference: &str) -> Result<Vec<String>>;

    /// Create a tag at HEAD; fails if the tag already exists
    fn create_tag(&self, name: &str) -> Result<()>;

    /// Create a tag at HEAD, re-pointing it if it already exists
    fn create_or_replace_tag(&self, name: &str) -> Result<()>;

    /// Create a local branch at `from_ref`. An existing branch is left untouched.
    fn create_branch(&self, name: &str, from_ref: &str) -> Result<()>;

    /// Check out a branch, creating a local tracking branch from the remote if needed
    fn switch_branch(&self, name: &str) -> Result<()>;

    /// Merge `source_ref` into the current branch
    fn merge(&self, source_ref: &str) -> Result<MergeOutcome>;

    /// Push a branch or tag to the remote
    fn push(&self, reference: &str, force: bool) -> Result<()>;

    /// Fetch branches and tags from the remote
    fn fetch(&self) -> Result<()>;

    /// Whether the working tree differs from HEAD (untracked files included)
    fn has_changes(&self) -> Result<bool>;

    /// Stage every change in the working tree and commit it on the current branch
    fn commit_all(&self, message: &str) -> Result<()>;

    /// Message of the HEAD commit, or `None` on an unborn HEAD
    fn head_message(&self) -> Result<Option<String>>;

    /// Messages of commits reachable from HEAD but not from the tag `since`, newest first.
    ///
    /// With no tag the whole history of HEAD is returned.
    fn commit_messages_since(&self, since: Option<&str>) -> Result<Vec<String>>;
}
