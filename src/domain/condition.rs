//! Redemption conditions attached to a reward.

use std::fmt;

use serde::{Deserialize, Serialize};

/// The semantic category of a redemption condition.
///
/// The known set is closed (each kind maps to a fixed display template), but
/// the enum itself is open: an unrecognized kind is preserved verbatim in
/// [`ConditionKind::Other`] so classification stays total over any
/// structurally valid object.
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum ConditionKind {
    /// Minimum number of visits.
    VisitCount,
    /// A single-transaction spend threshold.
    SpendAmount,
    /// A points balance threshold.
    PointsBalance,
    /// Valid during the customer's birthday period.
    Birthday,
    /// Valid on the customer's first visit only.
    FirstVisit,
    /// Requires purchase of a specific product.
    SpecificProduct,
    /// Requires purchase from a specific category.
    SpecificCategory,
    /// Valid during a time-of-day window.
    TimeOfDay,
    /// Minimum spend on the qualifying transaction.
    MinimumSpend,
    /// Minimum lifetime spend across all transactions.
    MinimumLifetimeSpend,
    /// Minimum number of transactions.
    MinimumTransactions,
    /// Maximum number of transactions.
    MaximumTransactions,
    /// Minimum points balance.
    MinimumPointsBalance,
    /// Required membership level.
    MembershipLevel,
    /// Minimum account age in days.
    DaysSinceJoined,
    /// Minimum days since the last visit.
    DaysSinceLastVisit,
    /// An unrecognized kind, preserved verbatim.
    Other(String),
}

impl ConditionKind {
    /// Stable wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::VisitCount => "visitCount",
            Self::SpendAmount => "spendAmount",
            Self::PointsBalance => "pointsBalance",
            Self::Birthday => "birthday",
            Self::FirstVisit => "firstVisit",
            Self::SpecificProduct => "specificProduct",
            Self::SpecificCategory => "specificCategory",
            Self::TimeOfDay => "timeOfDay",
            Self::MinimumSpend => "minimumSpend",
            Self::MinimumLifetimeSpend => "minimumLifetimeSpend",
            Self::MinimumTransactions => "minimumTransactions",
            Self::MaximumTransactions => "maximumTransactions",
            Self::MinimumPointsBalance => "minimumPointsBalance",
            Self::MembershipLevel => "membershipLevel",
            Self::DaysSinceJoined => "daysSinceJoined",
            Self::DaysSinceLastVisit => "daysSinceLastVisit",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for ConditionKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "visitCount" => Self::VisitCount,
            "spendAmount" => Self::SpendAmount,
            "pointsBalance" => Self::PointsBalance,
            "birthday" => Self::Birthday,
            "firstVisit" => Self::FirstVisit,
            "specificProduct" => Self::SpecificProduct,
            "specificCategory" => Self::SpecificCategory,
            "timeOfDay" => Self::TimeOfDay,
            "minimumSpend" => Self::MinimumSpend,
            "minimumLifetimeSpend" => Self::MinimumLifetimeSpend,
            "minimumTransactions" => Self::MinimumTransactions,
            "maximumTransactions" => Self::MaximumTransactions,
            "minimumPointsBalance" => Self::MinimumPointsBalance,
            "membershipLevel" => Self::MembershipLevel,
            "daysSinceJoined" => Self::DaysSinceJoined,
            "daysSinceLastVisit" => Self::DaysSinceLastVisit,
            _ => Self::Other(raw),
        }
    }
}

impl From<ConditionKind> for String {
    fn from(kind: ConditionKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for ConditionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One redemption condition.
///
/// Whether `amount` or `value` carries the payload depends on the kind;
/// `minimumSpend` historically used `amount` while the rest use `value`.
/// Both are kept optional and raw here, interpretation happens in the
/// display templates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Condition {
    /// Condition category.
    #[serde(rename = "type")]
    pub kind: ConditionKind,
    /// Monetary amount, when the kind uses one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<f64>,
    /// Generic value (number or string depending on the kind).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_kind_round_trips() {
        let condition: Condition =
            serde_json::from_str(r#"{"type":"minimumSpend","amount":25}"#).unwrap();
        assert_eq!(condition.kind, ConditionKind::MinimumSpend);
        let back = serde_json::to_value(&condition).unwrap();
        assert_eq!(back["type"], "minimumSpend");
        assert_eq!(back["amount"], 25.0);
    }

    #[test]
    fn unknown_kind_is_preserved_verbatim() {
        let condition: Condition =
            serde_json::from_str(r#"{"type":"moonPhase","value":3}"#).unwrap();
        assert_eq!(condition.kind, ConditionKind::Other("moonPhase".to_string()));
        let back = serde_json::to_value(&condition).unwrap();
        assert_eq!(back["type"], "moonPhase");
    }
}
