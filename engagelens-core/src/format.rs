//! Formatting helpers shared by the analytics sections and the CLI.

use chrono::FixedOffset;
use serde::{Serialize, Serializer};

/// Sentinel rendered for selectors and ratios that have no meaningful value.
pub const NOT_AVAILABLE: &str = "N/A";

/// Weekday names, Monday first (the ordering used by every weekday bucket).
pub const DAY_NAMES: [&str; 7] = [
    "Monday",
    "Tuesday",
    "Wednesday",
    "Thursday",
    "Friday",
    "Saturday",
    "Sunday",
];

/// Serialize `None` as `"N/A"` instead of `null`.
pub fn serialize_or_na<T, S>(value: &Option<T>, serializer: S) -> Result<S::Ok, S::Error>
where
    T: Serialize,
    S: Serializer,
{
    match value {
        Some(v) => v.serialize(serializer),
        None => serializer.serialize_str(NOT_AVAILABLE),
    }
}

/// Get day name from a Monday-based index.
pub fn day_name(day: usize) -> &'static str {
    DAY_NAMES.get(day).copied().unwrap_or("Unknown")
}

/// Get hour display (e.g., "10am–11am").
pub fn hour_display(hour: u32) -> String {
    let hour = hour % 24;
    let h = hour % 12;
    let h = if h == 0 { 12 } else { h };
    let period = if hour < 12 { "am" } else { "pm" };
    let next_h = (hour + 1) % 12;
    let next_h = if next_h == 0 { 12 } else { next_h };
    let next_period = if (hour + 1) % 24 < 12 { "am" } else { "pm" };
    format!("{}{}–{}{}", h, period, next_h, next_period)
}

/// Format a UTC offset as `+05:30`.
pub fn format_offset(offset: FixedOffset) -> String {
    let secs = offset.local_minus_utc();
    let sign = if secs < 0 { '-' } else { '+' };
    let mins = secs.abs() / 60;
    format!("{}{:02}:{:02}", sign, mins / 60, mins % 60)
}

/// First `max_chars` characters of a caption on a single line, with an
/// ellipsis when truncated.
pub fn caption_preview(caption: &str, max_chars: usize) -> String {
    let flat: String = caption.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= max_chars {
        flat
    } else {
        let mut preview: String = flat.chars().take(max_chars).collect();
        preview.push('…');
        preview
    }
}

/// Format delta for display (e.g., "+23%" or "-15%"), "N/A" when not comparable.
pub fn format_delta(delta: Option<f64>) -> String {
    match delta {
        Some(d) if d >= 0.0 => format!("+{:.0}%", d),
        Some(d) => format!("{:.0}%", d),
        None => NOT_AVAILABLE.to_string(),
    }
}
