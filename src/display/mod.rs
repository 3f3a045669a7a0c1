//! Human-readable templates for reward conditions and limitations.
//!
//! Every known kind maps to a fixed template; unknown kinds render through
//! the generic `"<kind>: <value>"` fallback so display, like
//! classification, is total.

use serde_json::Value;

use crate::domain::{
    Condition, ConditionKind, DelayedVisibility, Limitation, LimitationKind, LimitationValue,
};

/// Render one condition.
#[must_use]
pub fn format_condition(condition: &Condition) -> String {
    let amount = condition.amount.map(fmt_number);
    let value = condition.value.as_ref().map(fmt_value);
    // Kinds that historically used `amount` fall back to `value` and vice
    // versa, so a fragment that picked the "wrong" field still renders.
    let n = amount.clone().or_else(|| value.clone()).unwrap_or_default();

    match &condition.kind {
        ConditionKind::VisitCount => format!("Minimum {n} visits"),
        ConditionKind::SpendAmount | ConditionKind::MinimumSpend => {
            format!("Minimum spend of ${n}")
        }
        ConditionKind::PointsBalance | ConditionKind::MinimumPointsBalance => {
            format!("Minimum {n} points balance")
        }
        ConditionKind::Birthday => "During the customer's birthday month".to_string(),
        ConditionKind::FirstVisit => "First visit only".to_string(),
        ConditionKind::SpecificProduct => format!("Requires purchase of {n}"),
        ConditionKind::SpecificCategory => format!("Requires purchase from {n}"),
        ConditionKind::TimeOfDay => format!("Valid {n}"),
        ConditionKind::MinimumLifetimeSpend => format!("Total lifetime spend of ${n}"),
        ConditionKind::MinimumTransactions => format!("Minimum {n} transactions"),
        ConditionKind::MaximumTransactions => format!("Maximum {n} transactions"),
        ConditionKind::MembershipLevel => format!("{n} membership level required"),
        ConditionKind::DaysSinceJoined => format!("Account age: {n} days"),
        ConditionKind::DaysSinceLastVisit => format!("{n} days since last visit"),
        ConditionKind::Other(kind) => {
            if n.is_empty() {
                kind.clone()
            } else {
                format!("{kind}: {n}")
            }
        }
    }
}

/// Render one limitation.
#[must_use]
pub fn format_limitation(limitation: &Limitation) -> String {
    match (&limitation.kind, &limitation.value) {
        (LimitationKind::CustomerLimit, LimitationValue::Count(n)) => {
            format!("{} per customer", fmt_number(*n))
        }
        (LimitationKind::TotalRedemptionLimit, LimitationValue::Count(n)) => {
            format!("{} total available", fmt_number(*n))
        }
        (LimitationKind::ExpiryDate, LimitationValue::Text(date)) => format!("Expires {date}"),
        (LimitationKind::DaysOfWeek, LimitationValue::Days(days)) => {
            format!("Available on {}", days.join(", "))
        }
        (
            LimitationKind::TimeOfDay,
            LimitationValue::TimeWindow {
                start_time,
                end_time,
            },
        ) => format!(
            "Available {} - {}",
            start_time.as_deref().unwrap_or("open"),
            end_time.as_deref().unwrap_or("close"),
        ),
        (
            LimitationKind::ActivePeriod,
            LimitationValue::DateWindow {
                start_date,
                end_date,
            },
        ) => format!(
            "Valid {} - {}",
            start_date.as_deref().unwrap_or("now"),
            end_date.as_deref().unwrap_or("open-ended"),
        ),
        (kind, value) => format!("{kind}: {}", fmt_limitation_value(value)),
    }
}

/// Render a delayed-visibility rule.
#[must_use]
pub fn format_delayed_visibility(visibility: &DelayedVisibility) -> String {
    let value = fmt_number(visibility.value);
    match visibility.kind.as_str() {
        "totalLifetimeSpend" => format!("Visible after ${value} total spend"),
        kind => format!("Visible after {kind}: {value}"),
    }
}

fn fmt_limitation_value(value: &LimitationValue) -> String {
    match value {
        LimitationValue::Count(n) => fmt_number(*n),
        LimitationValue::Text(s) => s.clone(),
        LimitationValue::Days(days) => days.join(", "),
        LimitationValue::TimeWindow {
            start_time,
            end_time,
        } => format!(
            "{} - {}",
            start_time.as_deref().unwrap_or(""),
            end_time.as_deref().unwrap_or(""),
        ),
        LimitationValue::DateWindow {
            start_date,
            end_date,
        } => format!(
            "{} - {}",
            start_date.as_deref().unwrap_or(""),
            end_date.as_deref().unwrap_or(""),
        ),
        LimitationValue::Raw(raw) => fmt_value(raw),
    }
}

fn fmt_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.as_f64().map(fmt_number).unwrap_or_else(|| n.to_string()),
        other => other.to_string(),
    }
}

/// Format a number without a trailing `.0` for whole values.
fn fmt_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        format!("{}", n as i64)
    } else {
        format!("{n}")
    }
}
