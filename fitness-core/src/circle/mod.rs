//! Fitness circles: membership, ranking and privileged actions.
//!
//! Circles are bounded peer groups. Members climb ranks through accumulated
//! activity (see [`RankPolicy`]); privileged ranks may create challenges and
//! initiate accountability checks, and influencer tiers may post as
//! influencers.

pub mod authorization;
pub mod hub;
pub mod rank;
pub mod registry;
pub mod types;

pub use authorization::{
    AccountabilityCheck, ChallengeSpec, ChallengeType, CheckType, CircleChallenge, InfluencerPost,
    PostContent, PostType,
};
pub use hub::CircleHub;
pub use rank::{PromotionThresholds, RankPolicy};
pub use types::*;
