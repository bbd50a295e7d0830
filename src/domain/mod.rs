//! Domain logic - pure promotion rules independent of git operations

pub mod branch;
pub mod changelog;
pub mod policy;
pub mod resolver;
pub mod tag;
pub mod version;

pub use branch::{Branch, ReleaseBranchCandidate};
pub use changelog::ConventionalCommit;
pub use policy::{PromotionPlan, TagAction, TagMutation, TagMutationPlan};
pub use resolver::{DeployType, PromotionDecision};
pub use tag::{Tag, VersionMarker};
pub use version::Version;
