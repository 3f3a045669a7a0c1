//! Identifier types for the assistant core.
//!
//! This module is intentionally **type-heavy** and **logic-light**: newtypes
//! for the identifiers that cross module boundaries, plus the generation
//! helpers for reward and program identifiers.
//!
//! Reward and program identifiers are strings rather than UUIDs because the
//! persisted document payloads carry them verbatim and downstream consumers
//! key on the exact textual form. Program-member reward ids are salted with
//! the member index and a random suffix so that two rewards generated within
//! the same millisecond never collide.

use core::fmt;
use core::str::FromStr;

use rand::Rng;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Length of the random alphanumeric suffix appended to reward ids.
const SUFFIX_LEN: usize = 9;

/// Generate a lowercase alphanumeric suffix of [`SUFFIX_LEN`] characters.
#[must_use]
pub fn random_suffix() -> String {
    const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";
    let mut rng = rand::thread_rng();
    (0..SUFFIX_LEN)
        .map(|_| {
            let idx = rng.gen_range(0..ALPHABET.len());
            char::from(ALPHABET[idx])
        })
        .collect()
}

/// Errors returned when validating a [`MerchantId`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MerchantIdError {
    /// Empty (or whitespace-only) identifier.
    Empty,
}

impl fmt::Display for MerchantIdError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => write!(f, "merchant id must not be empty"),
        }
    }
}

impl std::error::Error for MerchantIdError {}

/// Identifier of the merchant account owning a conversation or reward.
///
/// Resolved by the (out-of-scope) authentication layer and passed in; this
/// crate only requires that it is non-empty.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct MerchantId(String);

impl MerchantId {
    /// Build a validated merchant id.
    ///
    /// # Errors
    /// Returns [`MerchantIdError::Empty`] if the input is empty after
    /// trimming.
    pub fn new(raw: impl AsRef<str>) -> Result<Self, MerchantIdError> {
        let s = raw.as_ref().trim();
        if s.is_empty() {
            return Err(MerchantIdError::Empty);
        }
        Ok(Self(s.to_owned()))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MerchantId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for MerchantId {
    type Err = MerchantIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for MerchantId {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

/// Identifier for a conversation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ConversationId(pub Uuid);

impl Default for ConversationId {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl ConversationId {
    /// Create a new random conversation id.
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConversationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConversationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(Uuid::parse_str(s)?))
    }
}

/// Identifier shared by every reward committed as part of one program.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct ProgramId(String);

impl ProgramId {
    /// Derive a program id from the commit timestamp in milliseconds.
    #[must_use]
    pub fn generate(base_ms: i64) -> Self {
        Self(base_ms.to_string())
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ProgramId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identifier of one persisted reward, unique across all three storage
/// locations.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[repr(transparent)]
#[serde(transparent)]
pub struct RewardId(String);

impl RewardId {
    /// Generate the id for a standalone reward.
    ///
    /// The random suffix keeps ids distinct even when two commits land in
    /// the same millisecond.
    #[must_use]
    pub fn standalone(base_ms: i64) -> Self {
        Self(format!("{base_ms}-{}", random_suffix()))
    }

    /// Generate the id for the `index`-th reward of a program.
    ///
    /// The index offset and the random suffix together guarantee uniqueness
    /// for rewards generated within the same clock tick.
    #[must_use]
    pub fn in_program(program_id: &ProgramId, base_ms: i64, index: usize) -> Self {
        let salted = base_ms.saturating_add(index as i64);
        Self(format!(
            "{}-reward-{salted}-{}",
            program_id.as_str(),
            random_suffix()
        ))
    }

    /// Borrow as `&str`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RewardId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
