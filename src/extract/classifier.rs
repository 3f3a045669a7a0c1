//! Fragment classifier: decides what a parsed JSON fragment *is*.
//!
//! Classification is total: any structurally valid value produces a
//! [`ClassifiedFragment`], with [`ClassifiedFragment::Unrecognized`] as the
//! catch-all. Rules are checked in a fixed order, so an object carrying
//! both a `rewards` array and a `rewardName` is a program, not a reward.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{Banner, Program, Reward};

/// A classified fragment extracted from assistant prose.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "data", rename_all = "camelCase")]
pub enum ClassifiedFragment {
    /// A single reward.
    Reward(Reward),
    /// A promotional banner.
    Banner(Banner),
    /// A program bundling several rewards.
    Program(Program),
    /// An object matching none of the known shapes, kept opaque.
    Unrecognized {
        /// The raw object, preserved for display.
        raw: Value,
    },
}

/// Classification result: the fragment plus any assistant-authored prose
/// the service embedded inside the JSON itself.
#[derive(Clone, Debug)]
pub struct Classified {
    /// The classified fragment.
    pub fragment: ClassifiedFragment,
    /// Embedded conversational framing, when present.
    pub conversation: Option<String>,
}

impl Classified {
    fn plain(fragment: ClassifiedFragment) -> Self {
        Self {
            fragment,
            conversation: None,
        }
    }
}

/// Classify a parsed fragment.
#[must_use]
pub fn classify(value: Value) -> Classified {
    let Some(object) = value.as_object() else {
        return Classified::plain(ClassifiedFragment::Unrecognized { raw: value });
    };

    let has_rewards = object
        .get("rewards")
        .and_then(Value::as_array)
        .is_some_and(|rewards| !rewards.is_empty());

    if has_rewards {
        let mut payload = value.clone();
        let conversation = take_conversation(&mut payload);
        return match serde_json::from_value::<Program>(payload) {
            Ok(mut program) => {
                for reward in &mut program.rewards {
                    reward.infer_program_type();
                }
                Classified {
                    fragment: ClassifiedFragment::Program(program),
                    conversation,
                }
            }
            Err(_) => Classified::plain(ClassifiedFragment::Unrecognized { raw: value }),
        };
    }

    if object.contains_key("rewardName") {
        let mut payload = value.clone();
        let conversation = take_conversation(&mut payload);
        return match serde_json::from_value::<Reward>(payload) {
            Ok(mut reward) => {
                reward.infer_program_type();
                Classified {
                    fragment: ClassifiedFragment::Reward(reward),
                    conversation,
                }
            }
            Err(_) => Classified::plain(ClassifiedFragment::Unrecognized { raw: value }),
        };
    }

    if object.contains_key("bannerAction") && object.contains_key("title") {
        return match serde_json::from_value::<Banner>(value.clone()) {
            Ok(banner) => Classified::plain(ClassifiedFragment::Banner(banner)),
            Err(_) => Classified::plain(ClassifiedFragment::Unrecognized { raw: value }),
        };
    }

    Classified::plain(ClassifiedFragment::Unrecognized { raw: value })
}

/// Remove an embedded `conversation` string from the payload, returning it.
fn take_conversation(payload: &mut Value) -> Option<String> {
    let object = payload.as_object_mut()?;
    match object.remove("conversation") {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        _ => None,
    }
}
