//! Persisted reward records staged for an atomic commit.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::ids::{MerchantId, ProgramId, RewardId};
use crate::domain::Reward;

/// Category stamped on every reward created through the assistant.
pub const CATEGORY_INDIVIDUAL: &str = "individual";

/// Lifecycle status chosen at commit time.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RewardStatus {
    /// Saved but not visible to customers.
    Draft,
    /// Published and active.
    Live,
}

impl RewardStatus {
    /// Whether this status publishes the reward.
    #[must_use]
    pub const fn is_live(self) -> bool {
        matches!(self, Self::Live)
    }
}

impl fmt::Display for RewardStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Draft => f.write_str("draft"),
            Self::Live => f.write_str("live"),
        }
    }
}

/// One reward as written to storage.
///
/// The same serialized payload is mirrored to all three storage locations;
/// after a successful commit the copies are byte-identical. The reward's
/// own fields are flattened into the document, so `isActive` (forced to
/// match the chosen status) lives on the embedded reward.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedReward {
    /// Globally unique reward id.
    pub id: RewardId,
    /// Program linkage, present only for program members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_id: Option<ProgramId>,
    /// Program display name, present only for program members.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub program_name: Option<String>,
    /// Owning merchant.
    pub merchant_id: MerchantId,
    /// Redemption PIN captured at commit time.
    pub pin: String,
    /// Draft or live.
    pub status: RewardStatus,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last-update timestamp; equals `created_at` at commit.
    pub updated_at: DateTime<Utc>,
    /// Always [`CATEGORY_INDIVIDUAL`] for assistant-created rewards.
    pub category: String,
    /// The reward fields themselves.
    #[serde(flatten)]
    pub reward: Reward,
}

impl PersistedReward {
    /// Stage one reward for commit.
    #[must_use]
    pub fn stage(
        reward: &Reward,
        id: RewardId,
        linkage: Option<(ProgramId, String)>,
        merchant: MerchantId,
        pin: &str,
        status: RewardStatus,
        now: DateTime<Utc>,
    ) -> Self {
        let mut reward = reward.clone();
        reward.infer_program_type();
        reward.is_active = status.is_live();

        let (program_id, program_name) = match linkage {
            Some((program_id, program_name)) => (Some(program_id), Some(program_name)),
            None => (None, None),
        };

        Self {
            id,
            program_id,
            program_name,
            merchant_id: merchant,
            pin: pin.to_owned(),
            status,
            created_at: now,
            updated_at: now,
            category: CATEGORY_INDIVIDUAL.to_string(),
            reward,
        }
    }
}
