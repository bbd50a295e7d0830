use crate::domain::branch::Branch;
use crate::error::{GitPromoteError, Result};
use crate::git::{MergeOutcome, Repository};
use std::collections::HashSet;
use std::sync::{Mutex, MutexGuard};

/// A mutation requested through the [Repository] port
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    Fetch,
    CreateTag(String),
    ReplaceTag(String),
    CreateBranch { name: String, from_ref: String },
    Switch(String),
    Merge(String),
    Commit(String),
    Push { reference: String, force: bool },
}

#[derive(Debug, Default)]
struct MockState {
    tags: Vec<String>,
    head_tags: Vec<String>,
    current_branch: Option<String>,
    branches: Vec<Branch>,
    containing: Vec<String>,
    conflicting_sources: HashSet<String>,
    dirty: bool,
    head_message: Option<String>,
    /// Commit messages oldest first, with the tags placed on each commit
    history: Vec<(String, Vec<String>)>,
    operations: Vec<Operation>,
}

/// Mock repository for testing without actual git operations
///
/// Reads come from the configured state; mutations update that state and are
/// recorded in order so tests can assert on the exact sequence requested.
#[derive(Debug, Default)]
pub struct MockRepository {
    state: Mutex<MockState>,
}

impl MockRepository {
    /// Create a new empty mock repository
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Add a tag that exists somewhere in history
    pub fn add_tag(&mut self, name: impl Into<String>) {
        self.state().tags.push(name.into());
    }

    /// Add a tag pointing at HEAD
    pub fn add_head_tag(&mut self, name: impl Into<String>) {
        let name = name.into();
        let mut state = self.state();
        state.tags.push(name.clone());
        state.head_tags.push(name);
    }

    /// Add a branch; a current branch also becomes the checked-out one
    pub fn add_branch(&mut self, branch: Branch) {
        let mut state = self.state();
        if branch.is_current {
            state.current_branch = Some(branch.name.clone());
        }
        state.branches.push(branch);
    }

    /// Detach HEAD, keeping the listed branches as the ones containing it
    pub fn detach_head(&mut self, containing: &[&str]) {
        let mut state = self.state();
        state.current_branch = None;
        state.containing = containing.iter().map(|s| s.to_string()).collect();
        for branch in state.branches.iter_mut() {
            branch.is_current = false;
        }
    }

    /// Make merging `source` report a conflict
    pub fn set_conflicting_source(&mut self, source: impl Into<String>) {
        self.state().conflicting_sources.insert(source.into());
    }

    /// Mark the working tree as changed (or clean)
    pub fn set_dirty(&mut self, dirty: bool) {
        self.state().dirty = dirty;
    }

    pub fn set_head_message(&mut self, message: impl Into<String>) {
        self.state().head_message = Some(message.into());
    }

    /// Append a commit to the history of HEAD
    pub fn add_commit(&mut self, message: impl Into<String>) {
        let message = message.into();
        let mut state = self.state();
        state.head_message = Some(message.clone());
        state.history.push((message, Vec::new()));
    }

    /// Append a commit carrying `tag`, as an earlier release would have left it
    pub fn add_tagged_commit(&mut self, message: impl Into<String>, tag: impl Into<String>) {
        let message = message.into();
        let tag = tag.into();
        let mut state = self.state();
        state.tags.push(tag.clone());
        state.head_message = Some(message.clone());
        state.history.push((message, vec![tag]));
    }

    /// Mutations requested so far, in order
    pub fn operations(&self) -> Vec<Operation> {
        self.state().operations.clone()
    }

    /// Whether any push reached the remote
    pub fn pushed(&self) -> bool {
        self.state()
            .operations
            .iter()
            .any(|op| matches!(op, Operation::Push { .. }))
    }

    fn has_local_branch(state: &MockState, name: &str) -> bool {
        state
            .branches
            .iter()
            .any(|branch| !branch.is_remote && branch.name == name)
    }
}

impl Repository for MockRepository {
    fn list_tags(&self) -> Result<Vec<String>> {
        Ok(self.state().tags.clone())
    }

    fn list_branches(&self, include_remote: bool) -> Result<Vec<Branch>> {
        Ok(self
            .state()
            .branches
            .iter()
            .filter(|branch| include_remote || !branch.is_remote)
            .cloned()
            .collect())
    }

    fn tags_at_head(&self) -> Result<Vec<String>> {
        Ok(self.state().head_tags.clone())
    }

    fn current_branch_name(&self) -> Result<Option<String>> {
        Ok(self.state().current_branch.clone())
    }

    fn branches_containing(&self, _reference: &str) -> Result<Vec<String>> {
        let state = self.state();
        match &state.current_branch {
            Some(current) => Ok(vec![current.clone()]),
            None => Ok(state.containing.clone()),
        }
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if state.tags.iter().any(|tag| tag == name) {
            return Err(GitPromoteError::tag(format!(
                "Cannot create tag: '{}' already exists",
                name
            )));
        }
        state.tags.push(name.to_string());
        state.head_tags.push(name.to_string());
        state.operations.push(Operation::CreateTag(name.to_string()));
        Ok(())
    }

    fn create_or_replace_tag(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if !state.tags.iter().any(|tag| tag == name) {
            state.tags.push(name.to_string());
        }
        if !state.head_tags.iter().any(|tag| tag == name) {
            state.head_tags.push(name.to_string());
        }
        state.operations.push(Operation::ReplaceTag(name.to_string()));
        Ok(())
    }

    fn create_branch(&self, name: &str, from_ref: &str) -> Result<()> {
        let mut state = self.state();
        if !Self::has_local_branch(&state, name) {
            state.branches.push(Branch::local(name));
        }
        state.operations.push(Operation::CreateBranch {
            name: name.to_string(),
            from_ref: from_ref.to_string(),
        });
        Ok(())
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        let mut state = self.state();
        if !Self::has_local_branch(&state, name) {
            if state.branches.iter().any(|branch| branch.name == name) {
                state.branches.push(Branch::local(name));
            } else {
                return Err(GitPromoteError::branch(format!(
                    "Branch not found: {}",
                    name
                )));
            }
        }

        for branch in state.branches.iter_mut() {
            branch.is_current = !branch.is_remote && branch.name == name;
        }
        state.current_branch = Some(name.to_string());
        state.operations.push(Operation::Switch(name.to_string()));
        Ok(())
    }

    fn merge(&self, source_ref: &str) -> Result<MergeOutcome> {
        let mut state = self.state();
        state.operations.push(Operation::Merge(source_ref.to_string()));
        if state.conflicting_sources.contains(source_ref) {
            Ok(MergeOutcome::Conflict)
        } else {
            Ok(MergeOutcome::Merged)
        }
    }

    fn push(&self, reference: &str, force: bool) -> Result<()> {
        self.state().operations.push(Operation::Push {
            reference: reference.to_string(),
            force,
        });
        Ok(())
    }

    fn fetch(&self) -> Result<()> {
        self.state().operations.push(Operation::Fetch);
        Ok(())
    }

    fn has_changes(&self) -> Result<bool> {
        Ok(self.state().dirty)
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        let mut state = self.state();
        state.dirty = false;
        state.head_tags.clear();
        state.head_message = Some(message.to_string());
        state.history.push((message.to_string(), Vec::new()));
        state.operations.push(Operation::Commit(message.to_string()));
        Ok(())
    }

    fn head_message(&self) -> Result<Option<String>> {
        Ok(self.state().head_message.clone())
    }

    fn commit_messages_since(&self, since: Option<&str>) -> Result<Vec<String>> {
        let state = self.state();
        Ok(state
            .history
            .iter()
            .rev()
            .take_while(|(_, tags)| since.map_or(true, |tag| !tags.iter().any(|t| t == tag)))
            .map(|(message, _)| message.clone())
            .collect())
    }
}
