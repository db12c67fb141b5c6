//! Hourly hydration slots.
//!
//! Day-wide slots are counted from the earliest block start and exist only
//! while `day_start <= now < day_end`. Per-block micro slots are counted
//! from the block's own start once it has been started.

use serde::Serialize;

use super::ActionOutcome;
use crate::events::Event;
use crate::log::{DailyLog, Delay, EntryKind, LogEntry};
use crate::scoring;
use crate::timetable::{ScheduledBlock, Timetable};

pub const SLOT_MINUTES: u16 = 60;

/// The day-wide hydration slot currently awaiting confirmation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct HydrationDue {
    pub slot: u32,
    /// Scheduled slot boundary, minutes since midnight.
    pub start_minute: u16,
}

impl HydrationDue {
    /// 1-based hour number for display.
    pub fn hour_label(&self) -> u32 {
        self.slot + 1
    }
}

/// A micro hydration reminder inside a started block.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MicroDue {
    pub parent: String,
    pub slot: u32,
    pub start_minute: u16,
}

/// Slot index containing `now`, or `None` outside the hydration window.
pub fn current_slot(timetable: &Timetable, now: u16) -> Option<u32> {
    let start = timetable.day_start()?;
    let end = timetable.day_end()?;
    if now < start || now >= end {
        return None;
    }
    Some(u32::from((now - start) / SLOT_MINUTES))
}

/// Boundary of `slot`, in minutes since midnight.
pub fn slot_start(day_start: u16, slot: u32) -> u16 {
    let offset = slot.saturating_mul(u32::from(SLOT_MINUTES));
    u16::try_from(u32::from(day_start).saturating_add(offset)).unwrap_or(u16::MAX)
}

/// Highest slot index the end-of-day sweep settles.
pub fn last_slot(timetable: &Timetable) -> Option<u32> {
    let start = timetable.day_start()?;
    let end = timetable.day_end()?;
    Some(u32::from((end - start) / SLOT_MINUTES))
}

/// Current slot, unless it already has an entry.
pub fn due_slot(timetable: &Timetable, log: &DailyLog, now: u16) -> Option<HydrationDue> {
    let slot = current_slot(timetable, now)?;
    if log.has_hydration(slot) {
        return None;
    }
    let day_start = timetable.day_start()?;
    Some(HydrationDue {
        slot,
        start_minute: slot_start(day_start, slot),
    })
}

/// Slots that have fully elapsed as of `now`.
///
/// Inside the window those are the slots before the current one. Once the
/// day has ended it is every slot up to and including [`last_slot`].
fn elapsed_slots(timetable: &Timetable, now: u16) -> std::ops::Range<u32> {
    let (Some(start), Some(end)) = (timetable.day_start(), timetable.day_end()) else {
        return 0..0;
    };
    if now < start {
        0..0
    } else if now >= end {
        0..last_slot(timetable).map_or(0, |last| last + 1)
    } else {
        0..u32::from((now - start) / SLOT_MINUTES)
    }
}

/// Insert a zero-score entry for every elapsed slot that has none.
pub fn backfill_missed(timetable: &Timetable, log: &mut DailyLog, now: u16) -> Vec<Event> {
    let mut events = Vec::new();
    for slot in elapsed_slots(timetable, now) {
        if log.insert(LogEntry::hydration(slot, Delay::Missed, 0)) {
            tracing::info!(slot, "penalized unmarked hydration slot");
            events.push(Event::HydrationPenalized { slot });
        }
    }
    events
}

/// Confirm a day-wide slot at `now`.
pub fn mark_hydration(
    log: &mut DailyLog,
    slot: u32,
    start_minute: u16,
    now: u16,
) -> ActionOutcome {
    if log.has_hydration(slot) {
        return ActionOutcome::Duplicate;
    }
    let delay = scoring::delay_between(start_minute, now);
    let score = scoring::hydration_score(delay);
    log.insert(LogEntry::hydration(slot, delay, score));
    ActionOutcome::Applied(Event::HydrationMarked { slot, delay, score })
}

/// Micro reminder due inside `block`, if it was started at least an hour ago.
pub fn micro_due(block: &ScheduledBlock, log: &DailyLog, now: u16) -> Option<MicroDue> {
    let entry = log.main_event(&block.name)?;
    let EntryKind::MainEvent { started: true, .. } = entry.kind else {
        return None;
    };
    if !block.contains(now) {
        return None;
    }
    let elapsed = now - block.start.minutes();
    if elapsed < SLOT_MINUTES {
        return None;
    }
    let slot = u32::from(elapsed / SLOT_MINUTES);
    if log.has_micro(&block.name, slot) {
        return None;
    }
    Some(MicroDue {
        parent: block.name.clone(),
        slot,
        start_minute: slot_start(block.start.minutes(), slot),
    })
}

/// Confirm a micro slot at `now`.
pub fn mark_micro(
    log: &mut DailyLog,
    parent: &str,
    slot: u32,
    start_minute: u16,
    now: u16,
) -> ActionOutcome {
    if log.has_micro(parent, slot) {
        return ActionOutcome::Duplicate;
    }
    let delay = scoring::delay_between(start_minute, now);
    let score = scoring::hydration_score(delay);
    log.insert(LogEntry::micro(parent, slot, start_minute, delay, score));
    ActionOutcome::Applied(Event::MicroMarked {
        parent: parent.to_string(),
        slot,
        delay,
        score,
    })
}
