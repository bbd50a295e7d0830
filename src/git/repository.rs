use crate::domain::branch::Branch;
use crate::error::{GitPromoteError, Result};
use crate::git::{MergeOutcome, Repository};
use git2::build::{CheckoutBuilder, RepoBuilder};
use git2::{
    BranchType, Commit, FetchOptions, IndexAddOption, Oid, PushOptions, RemoteCallbacks,
    Repository as Git2Repo, Signature, Sort, StatusOptions,
};
use std::path::Path;
use tracing::{debug, info};

const FALLBACK_AUTHOR: &str = "git-promote";
const FALLBACK_EMAIL: &str = "git-promote@localhost";

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
    remote_name: String,
}

/// Credentials callback trying SSH keys from ~/.ssh, then the SSH agent,
/// then libgit2's default credentials.
fn remote_callbacks<'a>() -> RemoteCallbacks<'a> {
    let mut callbacks = RemoteCallbacks::new();
    callbacks.credentials(|_url, username_from_url, allowed_types| {
        let username = username_from_url.unwrap_or("git");

        if allowed_types.contains(git2::CredentialType::SSH_KEY) {
            if let Some(home) = dirs::home_dir() {
                for key in ["id_ed25519", "id_rsa", "id_ecdsa"] {
                    let path = home.join(".ssh").join(key);
                    if path.exists() {
                        if let Ok(cred) = git2::Cred::ssh_key(username, None, &path, None) {
                            return Ok(cred);
                        }
                    }
                }
            }

            if let Ok(cred) = git2::Cred::ssh_key_from_agent(username) {
                return Ok(cred);
            }
        }

        git2::Cred::default()
    });
    callbacks
}

fn fetch_options<'a>() -> FetchOptions<'a> {
    let mut options = FetchOptions::new();
    options.remote_callbacks(remote_callbacks());
    options
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P, remote_name: impl Into<String>) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository {
            repo,
            remote_name: remote_name.into(),
        })
    }

    /// Open the checkout at `path`, cloning `url` into it first if it does not exist
    pub fn open_or_clone<P: AsRef<Path>>(
        url: &str,
        path: P,
        remote_name: impl Into<String>,
    ) -> Result<Self> {
        let path = path.as_ref();
        let remote_name = remote_name.into();

        if path.join(".git").exists() {
            debug!(path = %path.display(), "opening existing checkout");
            let repo = Git2Repo::open(path)?;
            return Ok(Git2Repository { repo, remote_name });
        }

        info!(url, path = %path.display(), "git clone");
        let name = remote_name.clone();
        let mut builder = RepoBuilder::new();
        builder.remote_create(move |repo, _name, url| repo.remote(&name, url));
        builder.fetch_options(fetch_options());
        let repo = builder
            .clone(url, path)
            .map_err(|e| GitPromoteError::remote(format!("Cannot clone '{}': {}", url, e)))?;

        Ok(Git2Repository { repo, remote_name })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo, remote_name: impl Into<String>) -> Self {
        Git2Repository {
            repo,
            remote_name: remote_name.into(),
        }
    }

    /// Root of the working tree
    pub fn workdir(&self) -> Option<&Path> {
        self.repo.workdir()
    }

    fn signature(&self) -> Result<Signature<'static>> {
        match self.repo.signature() {
            Ok(signature) => Ok(signature),
            Err(_) => Ok(Signature::now(FALLBACK_AUTHOR, FALLBACK_EMAIL)?),
        }
    }

    fn head_commit(&self) -> Result<Commit<'_>> {
        Ok(self.repo.head()?.peel_to_commit()?)
    }

    fn checkout_reference(&self, refname: &str) -> Result<()> {
        let object = self.repo.revparse_single(refname)?;
        self.repo
            .checkout_tree(&object, Some(CheckoutBuilder::new().safe()))?;
        self.repo.set_head(refname)?;
        Ok(())
    }

    /// Remote commit a local branch can fast-forward to, if it is strictly behind.
    ///
    /// Diverged or ahead branches are left alone.
    fn fast_forward_target(&self, branch_name: &str) -> Result<Option<Oid>> {
        let remote_refname = format!("refs/remotes/{}/{}", self.remote_name, branch_name);
        let remote_oid = match self.repo.find_reference(&remote_refname) {
            Ok(reference) => match reference.target() {
                Some(oid) => oid,
                None => return Ok(None),
            },
            Err(_) => return Ok(None),
        };

        let local_refname = format!("refs/heads/{}", branch_name);
        let local_oid = match self.repo.find_reference(&local_refname)?.target() {
            Some(oid) => oid,
            None => return Ok(None),
        };

        if local_oid == remote_oid || !self.repo.graph_descendant_of(remote_oid, local_oid)? {
            return Ok(None);
        }
        Ok(Some(remote_oid))
    }

    fn contains(&self, tip: Oid, target: Oid) -> Result<bool> {
        Ok(tip == target || self.repo.graph_descendant_of(tip, target)?)
    }
}

impl Repository for Git2Repository {
    fn list_tags(&self) -> Result<Vec<String>> {
        debug!("git tag --list");
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn list_branches(&self, include_remote: bool) -> Result<Vec<Branch>> {
        let mut branches = Vec::new();

        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            if let Some(name) = branch.name()? {
                branches.push(Branch {
                    name: name.to_string(),
                    is_remote: false,
                    is_current: branch.is_head(),
                });
            }
        }

        if include_remote {
            let prefix = format!("{}/", self.remote_name);
            for entry in self.repo.branches(Some(BranchType::Remote))? {
                let (branch, _) = entry?;
                let name = match branch.name()? {
                    Some(name) => name,
                    None => continue,
                };
                if let Some(stripped) = name.strip_prefix(&prefix) {
                    if stripped != "HEAD" {
                        branches.push(Branch::remote(stripped));
                    }
                }
            }
        }

        Ok(branches)
    }

    fn tags_at_head(&self) -> Result<Vec<String>> {
        let head = match self.head_commit() {
            Ok(commit) => commit.id(),
            Err(_) => return Ok(Vec::new()),
        };

        let mut at_head = Vec::new();
        for name in self.repo.tag_names(None)?.iter().flatten() {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", name))?;
            if let Ok(commit) = reference.peel_to_commit() {
                if commit.id() == head {
                    at_head.push(name.to_string());
                }
            }
        }

        Ok(at_head)
    }

    fn current_branch_name(&self) -> Result<Option<String>> {
        let head = match self.repo.head() {
            Ok(head) => head,
            Err(e) if e.code() == git2::ErrorCode::UnbornBranch => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        if !head.is_branch() {
            return Ok(None);
        }

        Ok(head.shorthand().map(|s| s.to_string()))
    }

    fn branches_containing(&self, reference: &str) -> Result<Vec<String>> {
        let target = self.repo.revparse_single(reference)?.peel_to_commit()?.id();

        let mut names = Vec::new();
        for entry in self.repo.branches(Some(BranchType::Local))? {
            let (branch, _) = entry?;
            let tip = match branch.get().target() {
                Some(oid) => oid,
                None => continue,
            };
            if self.contains(tip, target)? {
                if let Some(name) = branch.name()? {
                    names.push(name.to_string());
                }
            }
        }

        Ok(names)
    }

    fn create_tag(&self, name: &str) -> Result<()> {
        debug!("git tag {}", name);
        let head = self.head_commit()?;
        self.repo
            .tag_lightweight(name, head.as_object(), false)
            .map_err(|e| GitPromoteError::tag(format!("Cannot create tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn create_or_replace_tag(&self, name: &str) -> Result<()> {
        debug!("git tag {} -f", name);
        let head = self.head_commit()?;
        self.repo
            .tag_lightweight(name, head.as_object(), true)
            .map_err(|e| GitPromoteError::tag(format!("Cannot replace tag '{}': {}", name, e)))?;
        Ok(())
    }

    fn create_branch(&self, name: &str, from_ref: &str) -> Result<()> {
        if self.repo.find_branch(name, BranchType::Local).is_ok() {
            debug!(branch = name, "branch already exists");
            return Ok(());
        }

        debug!("git branch {} {}", name, from_ref);
        let commit = self
            .repo
            .revparse_single(from_ref)
            .and_then(|object| object.peel_to_commit())
            .map_err(|e| {
                GitPromoteError::branch(format!("Cannot resolve '{}': {}", from_ref, e))
            })?;
        self.repo.branch(name, &commit, false)?;
        Ok(())
    }

    fn switch_branch(&self, name: &str) -> Result<()> {
        debug!("git checkout {}", name);
        let refname = format!("refs/heads/{}", name);

        if self.repo.find_branch(name, BranchType::Local).is_err() {
            let upstream = format!("{}/{}", self.remote_name, name);
            let remote_branch = self
                .repo
                .find_branch(&upstream, BranchType::Remote)
                .map_err(|_| GitPromoteError::branch(format!("Branch not found: {}", name)))?;
            let commit = remote_branch.get().peel_to_commit()?;
            let mut local = self.repo.branch(name, &commit, false)?;
            local.set_upstream(Some(&upstream))?;
        } else if let Some(oid) = self.fast_forward_target(name)? {
            // Check out before moving the ref so the checkout baseline is the old HEAD
            debug!(branch = name, "fast-forward from remote");
            let commit = self.repo.find_commit(oid)?;
            self.repo
                .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))?;
            self.repo.find_reference(&refname)?.set_target(
                oid,
                &format!("fast-forward from {}/{}", self.remote_name, name),
            )?;
            self.repo.set_head(&refname)?;
            return Ok(());
        }

        self.checkout_reference(&refname)
    }

    fn merge(&self, source_ref: &str) -> Result<MergeOutcome> {
        debug!("git merge {}", source_ref);
        let reference = self.repo.resolve_reference_from_short_name(source_ref)?;
        let annotated = self.repo.reference_to_annotated_commit(&reference)?;
        let (analysis, _) = self.repo.merge_analysis(&[&annotated])?;

        if analysis.is_up_to_date() {
            return Ok(MergeOutcome::UpToDate);
        }

        if analysis.is_fast_forward() {
            // Local edits survive unless the incoming tree touches the same paths
            let commit = self.repo.find_commit(annotated.id())?;
            self.repo
                .checkout_tree(commit.as_object(), Some(CheckoutBuilder::new().safe()))
                .map_err(|e| {
                    GitPromoteError::branch(format!(
                        "Cannot fast-forward to '{}', local changes would be overwritten: {}",
                        source_ref, e
                    ))
                })?;
            let mut head = self.repo.head()?;
            head.set_target(annotated.id(), &format!("merge {}: fast-forward", source_ref))?;
            return Ok(MergeOutcome::Merged);
        }

        self.repo.merge(&[&annotated], None, None)?;
        let mut index = self.repo.index()?;
        if index.has_conflicts() {
            return Ok(MergeOutcome::Conflict);
        }

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let ours = self.head_commit()?;
        let theirs = self.repo.find_commit(annotated.id())?;
        let signature = self.signature()?;
        let target = self.current_branch_name()?.unwrap_or_else(|| "HEAD".to_string());
        self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            &format!("Merge branch '{}' into {}", source_ref, target),
            &tree,
            &[&ours, &theirs],
        )?;
        self.repo.cleanup_state()?;

        Ok(MergeOutcome::Merged)
    }

    fn push(&self, reference: &str, force: bool) -> Result<()> {
        let resolved = self
            .repo
            .resolve_reference_from_short_name(reference)
            .map_err(|e| GitPromoteError::remote(format!("Cannot push '{}': {}", reference, e)))?;
        let refname = resolved
            .name()
            .ok_or_else(|| GitPromoteError::remote(format!("Cannot push '{}'", reference)))?
            .to_string();

        debug!(
            "git push {} {}{}",
            self.remote_name,
            reference,
            if force { " -f" } else { "" }
        );
        let mut remote = self.repo.find_remote(&self.remote_name).map_err(|e| {
            GitPromoteError::remote(format!("Cannot find remote '{}': {}", self.remote_name, e))
        })?;

        let mut callbacks = remote_callbacks();
        callbacks.push_update_reference(|refname, status| match status {
            Some(status) => Err(git2::Error::from_str(&format!(
                "Push failed for {}: {}",
                refname, status
            ))),
            None => Ok(()),
        });
        let mut push_options = PushOptions::new();
        push_options.remote_callbacks(callbacks);

        let refspec = format!("{}{}:{}", if force { "+" } else { "" }, refname, refname);
        remote
            .push(&[refspec.as_str()], Some(&mut push_options))
            .map_err(|e| {
                if e.class() == git2::ErrorClass::Net {
                    GitPromoteError::remote(format!("Network error during push: {}", e))
                } else {
                    GitPromoteError::remote(format!("Failed to push '{}': {}", reference, e))
                }
            })?;

        Ok(())
    }

    fn fetch(&self) -> Result<()> {
        debug!("git fetch --tags {}", self.remote_name);
        let mut remote = self.repo.find_remote(&self.remote_name).map_err(|e| {
            GitPromoteError::remote(format!("Cannot find remote '{}': {}", self.remote_name, e))
        })?;

        let refspec_heads = format!("+refs/heads/*:refs/remotes/{}/*", self.remote_name);
        let refspecs = [refspec_heads.as_str(), "+refs/tags/*:refs/tags/*"];
        remote
            .fetch(&refspecs, Some(&mut fetch_options()), None)
            .map_err(|e| {
                GitPromoteError::remote(format!(
                    "Failed to fetch from remote '{}': {}",
                    self.remote_name, e
                ))
            })?;

        Ok(())
    }

    fn has_changes(&self) -> Result<bool> {
        let mut options = StatusOptions::new();
        options.include_untracked(true).recurse_untracked_dirs(true);
        let statuses = self.repo.statuses(Some(&mut options))?;
        Ok(!statuses.is_empty())
    }

    fn commit_all(&self, message: &str) -> Result<()> {
        debug!("git add -A && git commit");
        let mut index = self.repo.index()?;
        index.add_all(["*"].iter(), IndexAddOption::DEFAULT, None)?;
        index.update_all(["*"].iter(), None)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.signature()?;
        let parent = self.head_commit().ok();
        let parents: Vec<&Commit<'_>> = parent.iter().collect();

        self.repo
            .commit(Some("HEAD"), &signature, &signature, message, &tree, &parents)?;
        Ok(())
    }

    fn head_message(&self) -> Result<Option<String>> {
        match self.head_commit() {
            Ok(commit) => Ok(commit.message().map(|m| m.to_string())),
            Err(_) => Ok(None),
        }
    }

    fn commit_messages_since(&self, since: Option<&str>) -> Result<Vec<String>> {
        debug!("git log {}..HEAD", since.unwrap_or(""));
        let head = match self.head_commit() {
            Ok(commit) => commit.id(),
            Err(_) => return Ok(Vec::new()),
        };

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        revwalk.push(head)?;
        if let Some(tag) = since {
            let boundary = self
                .repo
                .find_reference(&format!("refs/tags/{}", tag))
                .and_then(|reference| reference.peel_to_commit())
                .map_err(|e| GitPromoteError::tag(format!("Cannot resolve tag '{}': {}", tag, e)))?;
            revwalk.hide(boundary.id())?;
        }

        let mut messages = Vec::new();
        for oid in revwalk {
            let commit = self.repo.find_commit(oid?)?;
            if let Some(message) = commit.message() {
                messages.push(message.to_string());
            }
        }
        Ok(messages)
    }
}

// SAFETY: Git2Repository owns its git2::Repository and is only used from one
// thread per invocation; libgit2 repository handles may move across threads.
unsafe impl Sync for Git2Repository {}
