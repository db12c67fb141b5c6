//! Key layout of the persisted store.
//!
//! | Key | Value |
//! |---|---|
//! | `<YYYY-MM-DD>` | JSON array of log entries for that day |
//! | `timetable` | JSON array of scheduled blocks |
//! | `timetableUpdated` | change marker bumped by the editor |
//! | `notified_<date>_<context>_<slot>` | `"yes"` once a reminder was shown |
//! | `lastWaterSlot_<date>` | last hydration slot marked, as a string |

use chrono::NaiveDate;

pub const TIMETABLE: &str = "timetable";
pub const TIMETABLE_UPDATED: &str = "timetableUpdated";

/// Context used in notification markers for the day-wide hydration slots.
pub const DAILY_CONTEXT: &str = "daily";

pub const NOTIFIED_MARKER: &str = "yes";

pub fn day_log(day: &str) -> String {
    day.to_string()
}

pub fn notified(day: &str, context: &str, slot: u32) -> String {
    format!("notified_{}", slot_key(day, context, slot))
}

pub fn last_water_slot(day: &str) -> String {
    format!("lastWaterSlot_{day}")
}

/// Identifies one reminder slot; also the key audible alerts are deduplicated by.
pub fn slot_key(day: &str, context: &str, slot: u32) -> String {
    format!("{day}_{context}_{slot}")
}

/// True for keys that hold a day's log.
pub fn is_day_key(key: &str) -> bool {
    key.len() == 10 && NaiveDate::parse_from_str(key, "%Y-%m-%d").is_ok()
}
