//! Redemption limitations attached to a reward.
//!
//! Upstream payloads are loose about limitation values: the same field is a
//! bare number for one kind, an array of weekday names for another, and a
//! nested time/date window object for the rest. Instead of re-checking the
//! JSON shape throughout the business logic, the value is normalized exactly
//! once, at deserialization, into [`LimitationValue`].

use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// The semantic category of a limitation.
///
/// Open enum: unrecognized kinds are preserved verbatim in
/// [`LimitationKind::Other`].
#[derive(Clone, Debug, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum LimitationKind {
    /// Maximum redemptions per customer.
    CustomerLimit,
    /// Maximum redemptions in total.
    TotalRedemptionLimit,
    /// Expiry date after which the reward is invalid.
    ExpiryDate,
    /// Valid only on the listed weekdays.
    DaysOfWeek,
    /// Valid only inside a time-of-day window.
    TimeOfDay,
    /// Valid only inside a calendar date window.
    ActivePeriod,
    /// An unrecognized kind, preserved verbatim.
    Other(String),
}

impl LimitationKind {
    /// Stable wire representation.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::CustomerLimit => "customerLimit",
            Self::TotalRedemptionLimit => "totalRedemptionLimit",
            Self::ExpiryDate => "expiryDate",
            Self::DaysOfWeek => "daysOfWeek",
            Self::TimeOfDay => "timeOfDay",
            Self::ActivePeriod => "activePeriod",
            Self::Other(raw) => raw,
        }
    }
}

impl From<String> for LimitationKind {
    fn from(raw: String) -> Self {
        match raw.as_str() {
            "customerLimit" => Self::CustomerLimit,
            "totalRedemptionLimit" => Self::TotalRedemptionLimit,
            "expiryDate" => Self::ExpiryDate,
            "daysOfWeek" => Self::DaysOfWeek,
            "timeOfDay" => Self::TimeOfDay,
            "activePeriod" => Self::ActivePeriod,
            _ => Self::Other(raw),
        }
    }
}

impl From<LimitationKind> for String {
    fn from(kind: LimitationKind) -> Self {
        kind.as_str().to_owned()
    }
}

impl fmt::Display for LimitationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized limitation value.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(untagged)]
pub enum LimitationValue {
    /// A numeric count or quantity.
    Count(f64),
    /// A free-form string (e.g. an expiry date).
    Text(String),
    /// Weekday names.
    Days(Vec<String>),
    /// A time-of-day window.
    TimeWindow {
        /// Window start, e.g. `"09:00"`.
        #[serde(rename = "startTime", skip_serializing_if = "Option::is_none")]
        start_time: Option<String>,
        /// Window end, e.g. `"11:30"`.
        #[serde(rename = "endTime", skip_serializing_if = "Option::is_none")]
        end_time: Option<String>,
    },
    /// A calendar date window.
    DateWindow {
        /// Window start date.
        #[serde(rename = "startDate", skip_serializing_if = "Option::is_none")]
        start_date: Option<String>,
        /// Window end date.
        #[serde(rename = "endDate", skip_serializing_if = "Option::is_none")]
        end_date: Option<String>,
    },
    /// Anything that matched no known shape, preserved verbatim.
    Raw(Value),
}

impl LimitationValue {
    /// Normalize a raw JSON value for the given kind.
    ///
    /// Known kinds try their expected shape first; anything that does not
    /// fit falls through to shape-based detection, and finally to
    /// [`LimitationValue::Raw`].
    #[must_use]
    pub fn normalize(kind: &LimitationKind, value: Value) -> Self {
        match kind {
            LimitationKind::CustomerLimit | LimitationKind::TotalRedemptionLimit => {
                match number_of(&value) {
                    Some(n) => Self::Count(n),
                    None => Self::from_shape(value),
                }
            }
            LimitationKind::DaysOfWeek => match string_array_of(&value) {
                Some(days) => Self::Days(days),
                None => Self::from_shape(value),
            },
            LimitationKind::TimeOfDay => match time_window_of(&value) {
                Some((start_time, end_time)) => Self::TimeWindow {
                    start_time,
                    end_time,
                },
                None => Self::from_shape(value),
            },
            LimitationKind::ActivePeriod => match date_window_of(&value) {
                Some((start_date, end_date)) => Self::DateWindow {
                    start_date,
                    end_date,
                },
                None => Self::from_shape(value),
            },
            LimitationKind::ExpiryDate => match value {
                Value::String(s) => Self::Text(s),
                other => Self::from_shape(other),
            },
            LimitationKind::Other(_) => Self::from_shape(value),
        }
    }

    /// Detect the value variant from the JSON shape alone.
    fn from_shape(value: Value) -> Self {
        if let Some(n) = number_of(&value) {
            return Self::Count(n);
        }
        if let Some(days) = string_array_of(&value) {
            return Self::Days(days);
        }
        if let Value::Object(ref map) = value {
            if map.contains_key("startTime") || map.contains_key("endTime") {
                if let Some((start_time, end_time)) = time_window_of(&value) {
                    return Self::TimeWindow {
                        start_time,
                        end_time,
                    };
                }
            }
            if map.contains_key("startDate") || map.contains_key("endDate") {
                if let Some((start_date, end_date)) = date_window_of(&value) {
                    return Self::DateWindow {
                        start_date,
                        end_date,
                    };
                }
            }
        }
        match value {
            Value::String(s) => Self::Text(s),
            other => Self::Raw(other),
        }
    }
}

fn number_of(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn string_array_of(value: &Value) -> Option<Vec<String>> {
    let items = value.as_array()?;
    items
        .iter()
        .map(|item| item.as_str().map(str::to_owned))
        .collect()
}

fn opt_string(map: &serde_json::Map<String, Value>, key: &str) -> Option<String> {
    map.get(key).and_then(Value::as_str).map(str::to_owned)
}

fn time_window_of(value: &Value) -> Option<(Option<String>, Option<String>)> {
    let map = value.as_object()?;
    let start = opt_string(map, "startTime");
    let end = opt_string(map, "endTime");
    if start.is_none() && end.is_none() {
        return None;
    }
    Some((start, end))
}

fn date_window_of(value: &Value) -> Option<(Option<String>, Option<String>)> {
    let map = value.as_object()?;
    let start = opt_string(map, "startDate");
    let end = opt_string(map, "endDate");
    if start.is_none() && end.is_none() {
        return None;
    }
    Some((start, end))
}

/// One redemption limitation with its normalized value.
#[derive(Clone, Debug, PartialEq)]
pub struct Limitation {
    /// Limitation category.
    pub kind: LimitationKind,
    /// Normalized value.
    pub value: LimitationValue,
}

#[derive(Deserialize)]
struct RawLimitation {
    #[serde(rename = "type")]
    kind: LimitationKind,
    #[serde(default)]
    value: Value,
}

impl<'de> Deserialize<'de> for Limitation {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = RawLimitation::deserialize(deserializer)?;
        let value = LimitationValue::normalize(&raw.kind, raw.value);
        Ok(Self {
            kind: raw.kind,
            value,
        })
    }
}

impl Serialize for Limitation {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("Limitation", 2)?;
        state.serialize_field("type", &self.kind)?;
        state.serialize_field("value", &self.value)?;
        state.end()
    }
}
