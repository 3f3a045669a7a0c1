//! A single loyalty reward as proposed by the assistant.

use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::Condition;
use super::limitation::Limitation;

/// The program type a reward belongs to.
///
/// Open enum: unrecognized types are preserved verbatim.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ProgramType {
    /// A fixed-amount voucher.
    Voucher,
    /// A points-cost reward.
    Points,
    /// A percentage or amount discount.
    Discount,
    /// An unrecognized type, preserved verbatim.
    Other(String),
}

impl ProgramType {
    /// Stable wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Voucher => "voucher",
            Self::Points => "points",
            Self::Discount => "discount",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ProgramType {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "voucher" => Self::Voucher,
            "points" => Self::Points,
            "discount" => Self::Discount,
            _ => Self::Other(raw),
        }
    }
}

impl From<ProgramType> for String {
    fn from(value: ProgramType) -> Self {
        value.as_str().to_owned()
    }
}

impl fmt::Display for ProgramType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rule delaying when a reward becomes visible to a customer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DelayedVisibility {
    /// Rule category, e.g. `totalLifetimeSpend`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Threshold value for the rule.
    pub value: f64,
}

/// A single reward.
///
/// Only `rewardName` is required on the wire; everything else defaults so a
/// sparsely filled fragment still classifies. The legacy `programtype`
/// spelling is accepted as an alias.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reward {
    /// Display name.
    pub reward_name: String,
    /// Customer-facing description.
    #[serde(default)]
    pub description: String,
    /// Program type; inferred during classification when absent.
    #[serde(default, alias = "programtype", skip_serializing_if = "Option::is_none")]
    pub program_type: Option<ProgramType>,
    /// Points required to redeem; zero means free.
    #[serde(default)]
    pub points_cost: f64,
    /// Whether the reward is active.
    #[serde(default)]
    pub is_active: bool,
    /// Visibility scope, e.g. `global`.
    #[serde(default)]
    pub reward_visibility: String,
    /// Voucher amount in dollars, for voucher-type rewards.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voucher_amount: Option<f64>,
    /// Optional delayed-visibility rule.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delayed_visibility: Option<DelayedVisibility>,
    /// Redemption conditions.
    #[serde(default)]
    pub conditions: Vec<Condition>,
    /// Redemption limitations.
    #[serde(default)]
    pub limitations: Vec<Limitation>,
}

impl Reward {
    /// Fill in the program type when the assistant omitted it: a positive
    /// voucher amount implies `voucher`, otherwise `points`.
    pub fn infer_program_type(&mut self) {
        if self.program_type.is_none() {
            let inferred = if self.voucher_amount.unwrap_or(0.0) > 0.0 {
                ProgramType::Voucher
            } else {
                ProgramType::Points
            };
            self.program_type = Some(inferred);
        }
    }
}
