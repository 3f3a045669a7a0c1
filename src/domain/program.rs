//! A reward program: a named bundle of rewards committed together.

use serde::{Deserialize, Serialize};

use super::reward::Reward;

/// A bundle of rewards intended to be committed together under one shared
/// program identifier.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Program {
    /// Display name for the program.
    #[serde(default)]
    pub program_name: String,
    /// Customer-facing description.
    #[serde(default)]
    pub description: String,
    /// Program type shared by the member rewards.
    #[serde(default, alias = "programtype", skip_serializing_if = "Option::is_none")]
    pub program_type: Option<super::reward::ProgramType>,
    /// Member rewards; non-empty once confirmed for commit.
    pub rewards: Vec<Reward>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn program_deserializes_member_rewards() {
        let program: Program = serde_json::from_str(
            r#"{
                "programName": "Coffee Lovers",
                "description": "For regulars",
                "rewards": [
                    {"rewardName": "Free Espresso", "pointsCost": 100},
                    {"rewardName": "Free Latte", "pointsCost": 150}
                ]
            }"#,
        )
        .unwrap();
        assert_eq!(program.program_name, "Coffee Lovers");
        assert_eq!(program.rewards.len(), 2);
        assert_eq!(program.rewards[1].reward_name, "Free Latte");
    }
}
