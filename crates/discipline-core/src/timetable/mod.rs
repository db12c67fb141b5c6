//! The user's daily timetable.
//!
//! The timetable is written by an external editor and read here on every
//! evaluation. Reading never fails: a corrupt blob resets to an empty
//! timetable and individual bad rows are dropped (see [`validate`]).

pub mod validate;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{StorageError, ValidationError};
use crate::storage::{keys, KvStore};
use crate::time_of_day::TimeOfDay;

/// Grouping identifier of a block. Timetables use either numbers or names.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Phase {
    Number(u32),
    Name(String),
}

impl Phase {
    pub fn hydration() -> Self {
        Phase::Name("hydration".into())
    }

    pub fn micro() -> Self {
        Phase::Name("micro".into())
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Number(n) => write!(f, "{n}"),
            Phase::Name(s) => f.write_str(s),
        }
    }
}

/// A named interval of the day. `start < end` always holds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduledBlock {
    pub name: String,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
    pub phase: Phase,
    pub severity: u32,
}

impl ScheduledBlock {
    /// Whether `now` (minutes since midnight) falls in `[start, end)`.
    pub fn contains(&self, now: u16) -> bool {
        self.start.minutes() <= now && now < self.end.minutes()
    }

    pub fn has_ended(&self, now: u16) -> bool {
        now >= self.end.minutes()
    }
}

/// Validated, ordered set of blocks with unique names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Timetable {
    blocks: Vec<ScheduledBlock>,
}

impl Timetable {
    /// Build from already-validated blocks, dropping later duplicates by name.
    pub fn new(blocks: Vec<ScheduledBlock>) -> Self {
        let mut timetable = Self::default();
        for block in blocks {
            if timetable.get(&block.name).is_none() && block.start < block.end {
                timetable.blocks.push(block);
            }
        }
        timetable
    }

    /// Parse raw JSON text.
    ///
    /// Fails with [`StorageError::Corrupt`] when the whole blob is
    /// structurally unusable (not JSON, or not an array). Individual invalid
    /// rows are dropped.
    pub fn parse(raw: &str) -> Result<Self, StorageError> {
        let corrupt = |message: String| StorageError::Corrupt {
            key: keys::TIMETABLE.to_string(),
            message,
        };
        let value: serde_json::Value =
            serde_json::from_str(raw).map_err(|e| corrupt(e.to_string()))?;
        let rows = value
            .as_array()
            .ok_or_else(|| corrupt(format!("expected an array, found {value}")))?;
        let (blocks, rejected) = validate::validate_all(rows);
        for (index, reason) in rejected {
            tracing::warn!(index, "dropping timetable entry: {reason}");
        }
        Ok(Self { blocks })
    }

    pub fn blocks(&self) -> &[ScheduledBlock] {
        &self.blocks
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn get(&self, name: &str) -> Option<&ScheduledBlock> {
        self.blocks.iter().find(|b| b.name == name)
    }

    pub fn contains_name(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Earliest block start, in minutes since midnight.
    pub fn day_start(&self) -> Option<u16> {
        self.blocks.iter().map(|b| b.start.minutes()).min()
    }

    /// Latest block end, in minutes since midnight.
    pub fn day_end(&self) -> Option<u16> {
        self.blocks.iter().map(|b| b.end.minutes()).max()
    }

    /// Every block with `start <= now < end`, in timetable order.
    ///
    /// Overlapping blocks are all returned; none takes precedence.
    pub fn active_blocks(&self, now: u16) -> Vec<&ScheduledBlock> {
        self.blocks.iter().filter(|b| b.contains(now)).collect()
    }

    /// Append a block, rejecting duplicate names and empty ranges.
    pub fn add(&mut self, block: ScheduledBlock) -> Result<(), ValidationError> {
        if block.name.trim().is_empty() {
            return Err(ValidationError::EmptyName);
        }
        if block.start >= block.end {
            return Err(ValidationError::InvalidRange {
                name: block.name,
                start: block.start.to_string(),
                end: block.end.to_string(),
            });
        }
        if block.severity == 0 {
            return Err(ValidationError::InvalidSeverity {
                name: block.name,
                value: "0".into(),
            });
        }
        if self.contains_name(&block.name) {
            return Err(ValidationError::DuplicateName(block.name));
        }
        self.blocks.push(block);
        Ok(())
    }

    /// Remove the named block. Returns whether it existed.
    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.blocks.len();
        self.blocks.retain(|b| b.name != name);
        self.blocks.len() != before
    }
}

/// Read the timetable from the store.
///
/// A missing key is an empty timetable. An unparsable or non-array value is
/// logged and reset to `[]`. A failing store read is treated as empty.
pub fn load_timetable<S: KvStore + ?Sized>(store: &mut S) -> Timetable {
    let raw = match store.get(keys::TIMETABLE) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Timetable::default(),
        Err(e) => {
            tracing::warn!("timetable read failed, treating as empty: {e}");
            return Timetable::default();
        }
    };

    match Timetable::parse(&raw) {
        Ok(timetable) => timetable,
        Err(corrupt) => {
            tracing::warn!("{corrupt}, resetting to empty");
            if let Err(e) = store.set(keys::TIMETABLE, "[]") {
                tracing::warn!("could not reset corrupt timetable: {e}");
            }
            Timetable::default()
        }
    }
}

/// Overwrite the stored timetable and bump the change marker.
///
/// # Errors
/// Returns an error if either write fails.
pub fn save_timetable<S: KvStore + ?Sized>(
    store: &mut S,
    timetable: &Timetable,
) -> crate::error::Result<()> {
    let json = serde_json::to_string(timetable)?;
    store.set(keys::TIMETABLE, &json)?;
    let version = timetable_version(&*store).unwrap_or(0).wrapping_add(1);
    store.set(keys::TIMETABLE_UPDATED, &version.to_string())?;
    Ok(())
}

/// Current value of the change marker, if any.
pub fn timetable_version<S: KvStore + ?Sized>(store: &S) -> Option<u64> {
    store
        .get(keys::TIMETABLE_UPDATED)
        .ok()
        .flatten()
        .and_then(|v| v.trim().parse().ok())
}
