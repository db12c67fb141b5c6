use serde::{Deserialize, Serialize};

use crate::log::Delay;

/// Every change the engine makes to the log produces an Event.
/// The CLI prints them; the presentation layer may use them for toasts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    EventStarted {
        name: String,
        started_at: u16,
    },
    /// A started event's window elapsed and its score was frozen.
    EventFinalized {
        name: String,
        delay: Delay,
        score: u32,
    },
    /// A block ended without ever being started.
    EventAutoMissed {
        name: String,
    },
    HydrationMarked {
        slot: u32,
        delay: Delay,
        score: u32,
    },
    /// A hydration slot elapsed unmarked.
    HydrationPenalized {
        slot: u32,
    },
    MicroMarked {
        parent: String,
        slot: u32,
        delay: Delay,
        score: u32,
    },
    /// A reminder notification was shown for a due slot.
    ReminderIssued {
        context: String,
        slot: u32,
        nag: bool,
    },
    /// Main events dropped because their block left the timetable.
    LogPruned {
        removed: usize,
    },
}
