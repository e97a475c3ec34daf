use chrono::{DateTime, Utc};

use assess_core::model::format_remaining;

/// Label used in the results table, e.g. `Mon, 06 May 2024 09:30`.
#[must_use]
pub fn format_attempted(value: Option<DateTime<Utc>>) -> String {
    value.map_or_else(
        || "-".to_string(),
        |value| value.format("%a, %d %b %Y %H:%M").to_string(),
    )
}

#[must_use]
pub fn format_countdown(remaining: Option<u32>) -> String {
    remaining.map_or_else(|| "--:--".to_string(), format_remaining)
}
