//! Domain objects the assistant can propose: rewards, reward programs, and
//! promotional banners, together with their condition/limitation vocabulary.
//!
//! These types mirror the JSON shapes the assistant service is instructed to
//! emit. Deserialization is deliberately tolerant: only the fields used for
//! classification are required, everything else defaults, and the kind
//! vocabularies are open so an unknown kind survives the round trip instead
//! of failing it.

pub mod banner;
pub mod condition;
pub mod limitation;
pub mod program;
pub mod reward;

pub use banner::Banner;
pub use condition::{Condition, ConditionKind};
pub use limitation::{Limitation, LimitationKind, LimitationValue};
pub use program::Program;
pub use reward::{DelayedVisibility, ProgramType, Reward};
