//! Daily action log.
//!
//! One [`LogEntry`] per recorded action: a main event being started (or
//! auto-missed), a day-wide hydration slot, or a per-block micro habit.
//! Entries are created once and their `delay`/`score` are set once.

mod daily;

pub use daily::{list_days, DailyLog, DaySummary};

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::timetable::{Phase, ScheduledBlock};
use crate::time_of_day::TimeOfDay;

pub const WATER_NAME: &str = "Drink Water";
pub const WATER_REMINDER_TITLE: &str = "💧 Drink Water";
pub const DAILY_HYDRATION_PARENT: &str = "Daily Hydration";

/// Minutes late relative to the nominal start, or never performed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delay {
    Minutes(u16),
    /// The block or slot elapsed with no action.
    Missed,
}

impl Delay {
    pub fn minutes(self) -> Option<u16> {
        match self {
            Delay::Minutes(m) => Some(m),
            Delay::Missed => None,
        }
    }
}

impl fmt::Display for Delay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Delay::Minutes(m) => write!(f, "{m} min"),
            Delay::Missed => f.write_str("missed"),
        }
    }
}

impl Serialize for Delay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Delay::Minutes(m) => serializer.serialize_u16(*m),
            Delay::Missed => serializer.serialize_str("missed"),
        }
    }
}

impl<'de> Deserialize<'de> for Delay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct DelayVisitor;

        impl de::Visitor<'_> for DelayVisitor {
            type Value = Delay;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a non-negative minute count or \"missed\"")
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Delay, E> {
                u16::try_from(v)
                    .map(Delay::Minutes)
                    .map_err(|_| E::custom(format!("delay {v} out of range")))
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Delay, E> {
                u64::try_from(v)
                    .map_err(|_| E::custom(format!("negative delay {v}")))
                    .and_then(|v| self.visit_u64(v))
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Delay, E> {
                if v == "missed" {
                    Ok(Delay::Missed)
                } else {
                    Err(E::invalid_value(de::Unexpected::Str(v), &self))
                }
            }
        }

        deserializer.deserialize_any(DelayVisitor)
    }
}

/// Variant-specific fields of a log entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum EntryKind {
    MainEvent {
        start: TimeOfDay,
        started: bool,
        #[serde(rename = "startedAt", default)]
        started_at: Option<u16>,
        #[serde(rename = "autoMissed", default)]
        auto_missed: bool,
    },
    Hydration {
        parent: String,
        slot: u32,
    },
    MicroHabit {
        parent: String,
        slot: u32,
        #[serde(rename = "startMinute")]
        start_minute: u16,
    },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LogEntry {
    pub name: String,
    pub phase: Phase,
    pub severity: u32,
    #[serde(default)]
    pub delay: Option<Delay>,
    #[serde(default)]
    pub score: Option<u32>,
    #[serde(flatten)]
    pub kind: EntryKind,
}

impl LogEntry {
    /// A main event the user just started. Pending until finalized.
    pub fn started(
        name: &str,
        start: TimeOfDay,
        phase: Phase,
        severity: u32,
        started_at: u16,
    ) -> Self {
        Self {
            name: name.to_string(),
            phase,
            severity,
            delay: None,
            score: None,
            kind: EntryKind::MainEvent {
                start,
                started: true,
                started_at: Some(started_at),
                auto_missed: false,
            },
        }
    }

    /// Terminal entry for a block that ended without being started.
    pub fn auto_missed(block: &ScheduledBlock) -> Self {
        Self {
            name: block.name.clone(),
            phase: block.phase.clone(),
            severity: block.severity,
            delay: Some(Delay::Missed),
            score: Some(0),
            kind: EntryKind::MainEvent {
                start: block.start,
                started: false,
                started_at: None,
                auto_missed: true,
            },
        }
    }

    pub fn hydration(slot: u32, delay: Delay, score: u32) -> Self {
        Self {
            name: WATER_NAME.into(),
            phase: Phase::hydration(),
            severity: 1,
            delay: Some(delay),
            score: Some(score),
            kind: EntryKind::Hydration {
                parent: DAILY_HYDRATION_PARENT.into(),
                slot,
            },
        }
    }

    pub fn micro(parent: &str, slot: u32, start_minute: u16, delay: Delay, score: u32) -> Self {
        Self {
            name: WATER_NAME.into(),
            phase: Phase::micro(),
            severity: 1,
            delay: Some(delay),
            score: Some(score),
            kind: EntryKind::MicroHabit {
                parent: parent.into(),
                slot,
                start_minute,
            },
        }
    }

    pub fn is_main_event(&self) -> bool {
        matches!(self.kind, EntryKind::MainEvent { .. })
    }

    /// Slot number, for day-wide hydration entries only.
    pub fn hydration_slot(&self) -> Option<u32> {
        match self.kind {
            EntryKind::Hydration { slot, .. } => Some(slot),
            _ => None,
        }
    }

    /// `(parent, slot)`, for micro habit entries only.
    pub fn micro_slot(&self) -> Option<(&str, u32)> {
        match &self.kind {
            EntryKind::MicroHabit { parent, slot, .. } => Some((parent.as_str(), *slot)),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.score.is_none()
    }

    pub fn is_missed(&self) -> bool {
        self.delay == Some(Delay::Missed)
    }

    /// Set delay and score on a pending entry. Returns false, changing
    /// nothing, if the entry was already finalized.
    pub fn finalize(&mut self, delay: Delay, score: u32) -> bool {
        if self.score.is_some() {
            return false;
        }
        self.delay = Some(delay);
        self.score = Some(score);
        true
    }

    /// Highest score this entry could have earned.
    pub fn max_score(&self) -> u32 {
        self.severity.saturating_mul(10)
    }
}
