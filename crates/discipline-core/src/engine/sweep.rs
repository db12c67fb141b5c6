//! The single reconciliation pass run on every driver trigger.

use serde::Serialize;

use super::{hydration, lifecycle};
use crate::events::Event;
use crate::log::DailyLog;
use crate::timetable::Timetable;

/// What one sweep changed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SweepReport {
    pub now: u16,
    pub events: Vec<Event>,
}

impl SweepReport {
    /// True when the log was modified and needs saving.
    pub fn changed(&self) -> bool {
        !self.events.is_empty()
    }
}

/// Bring `log` up to date with `timetable` at `now`.
///
/// In order: drop main events for blocks no longer in the timetable,
/// finalize or auto-miss every ended block, then penalize every elapsed
/// hydration slot (all of them once the day has ended). Running it again
/// with the same inputs produces no further events.
pub fn sweep(timetable: &Timetable, log: &mut DailyLog, now: u16) -> SweepReport {
    let mut events = Vec::new();

    let removed = log.prune(timetable);
    if removed > 0 {
        tracing::info!(removed, "pruned entries for removed blocks");
        events.push(Event::LogPruned { removed });
    }

    events.extend(lifecycle::settle_ended_blocks(timetable, log, now));
    events.extend(hydration::backfill_missed(timetable, log, now));

    tracing::debug!(now, changes = events.len(), "sweep complete");
    SweepReport { now, events }
}
