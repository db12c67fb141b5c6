use serde::Serialize;

use super::{Delay, LogEntry};
use crate::error::StorageError;
use crate::storage::{keys, KvStore};
use crate::timetable::Timetable;

/// One day's log partition.
///
/// Saved as a whole: every mutation is read-modify-write of the full array.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyLog {
    day: String,
    entries: Vec<LogEntry>,
}

impl DailyLog {
    pub fn new(day: impl Into<String>) -> Self {
        Self {
            day: day.into(),
            entries: Vec::new(),
        }
    }

    /// Load the partition for `day`.
    ///
    /// A value that is not a JSON array is reset to `[]`. Elements that do
    /// not decode, and elements that would duplicate an earlier main event
    /// or hydration slot, are dropped.
    pub fn load<S: KvStore + ?Sized>(store: &mut S, day: &str) -> Self {
        let key = keys::day_log(day);
        let raw = match store.get(&key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Self::new(day),
            Err(e) => {
                tracing::warn!(day, "log read failed, treating as empty: {e}");
                return Self::new(day);
            }
        };

        let rows = match decode_rows(&key, &raw) {
            Ok(rows) => rows,
            Err(corrupt) => {
                tracing::warn!(day, "{corrupt}, resetting to empty");
                if let Err(e) = store.set(&key, "[]") {
                    tracing::warn!(day, "could not reset corrupt log: {e}");
                }
                return Self::new(day);
            }
        };

        let mut log = Self::new(day);
        for (index, row) in rows.into_iter().enumerate() {
            match serde_json::from_value::<LogEntry>(row) {
                Ok(entry) => {
                    if !log.insert(entry) {
                        tracing::warn!(day, index, "dropping duplicate log entry");
                    }
                }
                Err(e) => tracing::warn!(day, index, "dropping undecodable log entry: {e}"),
            }
        }
        log
    }

    /// Overwrite the stored partition with this log.
    ///
    /// # Errors
    /// Returns an error if serialization or the store write fails.
    pub fn save<S: KvStore + ?Sized>(&self, store: &mut S) -> crate::error::Result<()> {
        let json = serde_json::to_string(&self.entries)?;
        store.set(&keys::day_log(&self.day), &json)?;
        Ok(())
    }

    pub fn day(&self) -> &str {
        &self.day
    }

    pub fn entries(&self) -> &[LogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Append unless it would break the one-per-name / one-per-slot rule.
    pub fn insert(&mut self, entry: LogEntry) -> bool {
        let duplicate = if entry.is_main_event() {
            self.main_event(&entry.name).is_some()
        } else if let Some(slot) = entry.hydration_slot() {
            self.has_hydration(slot)
        } else if let Some((parent, slot)) = entry.micro_slot() {
            self.has_micro(parent, slot)
        } else {
            false
        };
        if duplicate {
            return false;
        }
        self.entries.push(entry);
        true
    }

    pub fn main_event(&self, name: &str) -> Option<&LogEntry> {
        self.entries
            .iter()
            .find(|e| e.is_main_event() && e.name == name)
    }

    pub fn main_event_mut(&mut self, name: &str) -> Option<&mut LogEntry> {
        self.entries
            .iter_mut()
            .find(|e| e.is_main_event() && e.name == name)
    }

    pub fn has_hydration(&self, slot: u32) -> bool {
        self.entries.iter().any(|e| e.hydration_slot() == Some(slot))
    }

    pub fn has_micro(&self, parent: &str, slot: u32) -> bool {
        self.entries
            .iter()
            .any(|e| e.micro_slot() == Some((parent, slot)))
    }

    /// Drop main events whose block is gone from `timetable`.
    ///
    /// Hydration and micro entries are always kept. Returns the removed count.
    pub fn prune(&mut self, timetable: &Timetable) -> usize {
        let before = self.entries.len();
        self.entries
            .retain(|e| !e.is_main_event() || timetable.contains_name(&e.name));
        before - self.entries.len()
    }

    pub fn summary(&self) -> DaySummary {
        let mut summary = DaySummary {
            day: self.day.clone(),
            ..DaySummary::default()
        };
        for entry in &self.entries {
            summary.possible = summary.possible.saturating_add(entry.max_score());
            match (entry.score, entry.delay) {
                (None, _) => summary.pending += 1,
                (Some(_), Some(Delay::Missed)) => summary.missed += 1,
                (Some(score), _) => {
                    summary.earned = summary.earned.saturating_add(score);
                    summary.completed += 1;
                }
            }
        }
        summary
    }
}

/// Split a stored partition into its raw rows.
fn decode_rows(key: &str, raw: &str) -> Result<Vec<serde_json::Value>, StorageError> {
    let corrupt = |message: String| StorageError::Corrupt {
        key: key.to_string(),
        message,
    };
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(serde_json::Value::Array(rows)) => Ok(rows),
        Ok(other) => Err(corrupt(format!("expected an array, found {other}"))),
        Err(e) => Err(corrupt(e.to_string())),
    }
}

/// Score totals for one day, derived from its log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub day: String,
    pub earned: u32,
    pub possible: u32,
    pub completed: usize,
    pub missed: usize,
    pub pending: usize,
}

impl DaySummary {
    /// Earned share of possible, 0.0 ..= 100.0.
    pub fn percent(&self) -> f64 {
        if self.possible == 0 {
            return 0.0;
        }
        f64::from(self.earned) / f64::from(self.possible) * 100.0
    }
}

/// Every day that has a stored log, oldest first.
pub fn list_days<S: KvStore + ?Sized>(store: &S) -> Vec<String> {
    match store.keys_with_prefix("") {
        Ok(keys) => keys.into_iter().filter(|k| keys::is_day_key(k)).collect(),
        Err(e) => {
            tracing::warn!("could not list stored days: {e}");
            Vec::new()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryStore;
    use crate::timetable::{Phase, ScheduledBlock};

    const DAY: &str = "2024-03-09";

    fn block(name: &str, severity: u32) -> ScheduledBlock {
        ScheduledBlock {
            name: name.into(),
            start: "09:00".parse().unwrap(),
            end: "10:00".parse().unwrap(),
            phase: Phase::Number(1),
            severity,
        }
    }

    fn started(name: &str, severity: u32, at: u16) -> LogEntry {
        let b = block(name, severity);
        LogEntry::started(&b.name, b.start, b.phase, severity, at)
    }

    #[test]
    fn insert_enforces_uniqueness() {
        let mut log = DailyLog::new(DAY);
        assert!(log.insert(started("Focus", 5, 540)));
        assert!(!log.insert(LogEntry::auto_missed(&block("Focus", 5))));
        assert!(log.insert(LogEntry::hydration(0, Delay::Minutes(2), 8)));
        assert!(!log.insert(LogEntry::hydration(0, Delay::Missed, 0)));
        assert!(log.insert(LogEntry::micro("Focus", 1, 600, Delay::Minutes(0), 10)));
        assert!(!log.insert(LogEntry::micro("Focus", 1, 600, Delay::Minutes(3), 7)));
        assert!(log.insert(LogEntry::micro("Other", 1, 600, Delay::Minutes(3), 7)));
        assert_eq!(log.len(), 4);
    }

    #[test]
    fn load_resets_non_array() {
        let mut store = MemoryStore::new();
        store.set(DAY, "\"oops\"").unwrap();
        assert!(DailyLog::load(&mut store, DAY).is_empty());
        assert_eq!(store.get(DAY).unwrap().as_deref(), Some("[]"));

        store.set(DAY, "[{").unwrap();
        assert!(DailyLog::load(&mut store, DAY).is_empty());
        assert_eq!(store.get(DAY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn load_drops_bad_rows_keeps_good() {
        let mut store = MemoryStore::new();
        let mut log = DailyLog::new(DAY);
        log.insert(LogEntry::hydration(1, Delay::Minutes(4), 6));
        log.save(&mut store).unwrap();

        let raw = store.get(DAY).unwrap().unwrap();
        let patched = raw.replacen('[', "[{\"name\":5},", 1);
        store.set(DAY, &patched).unwrap();

        let loaded = DailyLog::load(&mut store, DAY);
        assert_eq!(loaded.len(), 1);
        assert!(loaded.has_hydration(1));
    }

    #[test]
    fn save_then_load_preserves_entries() {
        let mut store = MemoryStore::new();
        let mut log = DailyLog::new(DAY);
        log.insert(started("Focus", 5, 550));
        log.insert(LogEntry::hydration(0, Delay::Missed, 0));
        log.save(&mut store).unwrap();
        assert_eq!(DailyLog::load(&mut store, DAY), log);
    }

    #[test]
    fn prune_keeps_hydration_and_micro() {
        let mut log = DailyLog::new(DAY);
        log.insert(started("Gone", 5, 550));
        log.insert(started("Kept", 5, 550));
        log.insert(LogEntry::hydration(0, Delay::Missed, 0));
        log.insert(LogEntry::micro("Gone", 1, 600, Delay::Minutes(0), 10));

        let timetable = Timetable::new(vec![block("Kept", 5)]);
        assert_eq!(log.prune(&timetable), 1);
        assert!(log.main_event("Gone").is_none());
        assert!(log.main_event("Kept").is_some());
        assert!(log.has_hydration(0));
        assert!(log.has_micro("Gone", 1));
        assert_eq!(log.prune(&timetable), 0);
    }

    #[test]
    fn summary_totals() {
        let mut log = DailyLog::new(DAY);
        let mut done = started("A", 5, 550);
        done.finalize(Delay::Minutes(10), 40);
        log.insert(done);
        log.insert(started("B", 2, 550));
        log.insert(LogEntry::auto_missed(&block("C", 3)));
        log.insert(LogEntry::hydration(0, Delay::Minutes(5), 5));

        let summary = log.summary();
        assert_eq!(summary.earned, 45);
        assert_eq!(summary.possible, 50 + 20 + 30 + 10);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.missed, 1);
        assert_eq!(summary.pending, 1);
        assert!((summary.percent() - 40.909).abs() < 0.01);
    }

    #[test]
    fn summary_saturates_on_huge_severities() {
        let mut log = DailyLog::new(DAY);
        for name in ["A", "B"] {
            let mut done = started(name, 400_000_000, 540);
            done.finalize(Delay::Minutes(0), 4_000_000_000);
            log.insert(done);
        }
        log.insert(LogEntry::auto_missed(&block("C", 400_000_000)));

        let summary = log.summary();
        assert_eq!(summary.possible, u32::MAX);
        assert_eq!(summary.earned, u32::MAX);
        assert_eq!(summary.completed, 2);
        assert_eq!(summary.missed, 1);
    }

    #[test]
    fn lists_only_day_partitions() {
        let mut store = MemoryStore::new();
        store.set("2024-03-10", "[]").unwrap();
        store.set("2024-03-09", "[]").unwrap();
        store.set("timetable", "[]").unwrap();
        store.set("lastWaterSlot_2024-03-09", "2").unwrap();
        assert_eq!(list_days(&store), vec!["2024-03-09", "2024-03-10"]);
    }
}
