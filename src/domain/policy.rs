//! Decides which downstream tags a promotion writes.
//!
//! Every promotion rewrites the exact version tag and the wide tag of its
//! minor line. The `latest` tag is rewritten only when the candidate is at
//! least as new as the newest existing version, so it never moves backwards.

use crate::domain::tag::{format_tag, latest_tag_name, wide_tag_name, Tag};
use crate::domain::version::{is_newer_or_equal, Version};
use std::fmt;

/// How a tag is written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagAction {
    /// Write a new tag; fails if it already exists.
    ///
    /// [plan] never emits this: promotion tags are always rewritten. It is
    /// reserved for plans that must not clobber an existing tag.
    Create,
    /// Write the tag, re-pointing it if it already exists
    Replace,
}

impl fmt::Display for TagAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TagAction::Create => write!(f, "create"),
            TagAction::Replace => write!(f, "replace"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagMutation {
    pub tag_name: String,
    pub action: TagAction,
}

impl TagMutation {
    pub fn create(tag_name: impl Into<String>) -> Self {
        TagMutation {
            tag_name: tag_name.into(),
            action: TagAction::Create,
        }
    }

    pub fn replace(tag_name: impl Into<String>) -> Self {
        TagMutation {
            tag_name: tag_name.into(),
            action: TagAction::Replace,
        }
    }
}

/// Ordered tag mutations. Each one is independent; the order is for display.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TagMutationPlan {
    mutations: Vec<TagMutation>,
}

impl TagMutationPlan {
    pub fn iter(&self) -> impl Iterator<Item = &TagMutation> {
        self.mutations.iter()
    }

    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    pub fn contains(&self, tag_name: &str) -> bool {
        self.mutations.iter().any(|m| m.tag_name == tag_name)
    }

    pub fn tag_names(&self) -> Vec<&str> {
        self.mutations.iter().map(|m| m.tag_name.as_str()).collect()
    }

    fn push(&mut self, mutation: TagMutation) {
        self.mutations.push(mutation);
    }
}

impl FromIterator<TagMutation> for TagMutationPlan {
    fn from_iter<I: IntoIterator<Item = TagMutation>>(iter: I) -> Self {
        TagMutationPlan {
            mutations: iter.into_iter().collect(),
        }
    }
}

/// Output of [plan]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PromotionPlan {
    pub plan: TagMutationPlan,
    /// The exact version tag already exists; overwriting it needs confirmation
    pub had_conflict: bool,
}

/// Plan the tag mutations for promoting `candidate` of `application_name`.
///
/// `existing_newest_first` must be the output of
/// [tags_for_application](crate::domain::tag::tags_for_application).
pub fn plan(
    existing_newest_first: &[Tag],
    application_name: &str,
    candidate: Version,
) -> PromotionPlan {
    let tag_name = format_tag(application_name, &candidate);
    let wide_tag_name = wide_tag_name(application_name, &candidate);
    let latest_tag_name = latest_tag_name(application_name);

    let had_conflict = existing_newest_first.iter().any(|tag| tag.raw == tag_name);

    let move_latest = match existing_newest_first.first() {
        None => true,
        Some(latest) => latest.raw == tag_name || is_newer_or_equal(&candidate, &latest.version),
    };

    let mut mutations = TagMutationPlan::default();
    if move_latest {
        mutations.push(TagMutation::replace(latest_tag_name));
    }
    mutations.push(TagMutation::replace(tag_name));
    mutations.push(TagMutation::replace(wide_tag_name));

    PromotionPlan {
        plan: mutations,
        had_conflict,
    }
}
