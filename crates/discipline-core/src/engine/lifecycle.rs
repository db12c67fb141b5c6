//! Main-event lifecycle.
//!
//! ```text
//! Unstarted --start--> Started --block end--> Finalized
//!     \________________block end (auto-miss)_____/
//! ```
//!
//! There is no entry while Unstarted. Finalized entries never change again.

use super::ActionOutcome;
use crate::events::Event;
use crate::log::{DailyLog, Delay, EntryKind, LogEntry};
use crate::scoring;
use crate::time_of_day::TimeOfDay;
use crate::timetable::{Phase, ScheduledBlock, Timetable};

/// Record that `block` was started at `now`.
///
/// A second start for the same name is a no-op.
pub fn start_event(log: &mut DailyLog, block: &ScheduledBlock, now: u16) -> ActionOutcome {
    start_named(
        log,
        &block.name,
        block.start,
        block.phase.clone(),
        block.severity,
        now,
    )
}

/// [`start_event`] from loose fields, as the presentation layer passes them.
pub fn start_named(
    log: &mut DailyLog,
    name: &str,
    start: TimeOfDay,
    phase: Phase,
    severity: u32,
    now: u16,
) -> ActionOutcome {
    if log.main_event(name).is_some() {
        return ActionOutcome::Duplicate;
    }
    log.insert(LogEntry::started(name, start, phase, severity, now));
    ActionOutcome::Applied(Event::EventStarted {
        name: name.to_string(),
        started_at: now,
    })
}

/// Delay and score a started entry earns. `None` for non-main entries.
///
/// An entry marked started with no start time cannot be graded and counts
/// as missed.
pub fn grade(entry: &LogEntry) -> Option<(Delay, u32)> {
    let EntryKind::MainEvent {
        start, started_at, ..
    } = &entry.kind
    else {
        return None;
    };
    let delay = match started_at {
        Some(at) => scoring::delay_between(start.minutes(), *at),
        None => Delay::Missed,
    };
    Some((delay, scoring::main_event_score(entry.severity, delay)))
}

/// Finalize ended blocks and auto-miss the ones never started.
///
/// Only blocks whose `end` has been reached are touched. Safe to call any
/// number of times.
pub fn settle_ended_blocks(timetable: &Timetable, log: &mut DailyLog, now: u16) -> Vec<Event> {
    let mut events = Vec::new();

    for block in timetable.blocks().iter().filter(|b| b.has_ended(now)) {
        match log.main_event_mut(&block.name) {
            Some(entry) if entry.is_pending() => {
                if let Some((delay, score)) = grade(entry) {
                    entry.finalize(delay, score);
                    tracing::info!(name = %block.name, %delay, score, "finalized event");
                    events.push(Event::EventFinalized {
                        name: block.name.clone(),
                        delay,
                        score,
                    });
                }
            }
            Some(_) => {}
            None => {
                log.insert(LogEntry::auto_missed(block));
                tracing::info!(name = %block.name, "auto-missed event");
                events.push(Event::EventAutoMissed {
                    name: block.name.clone(),
                });
            }
        }
    }

    events
}
