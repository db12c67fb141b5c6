//! Reconciliation engine.
//!
//! The submodules are pure functions of `(timetable, log, now)`. [`Tracker`]
//! binds them to a store and a clock: every operation loads the timetable,
//! loads and prunes today's log, applies the change and saves the log back.
//!
//! ## Usage
//!
//! ```ignore
//! let mut tracker = Tracker::new(Database::open()?, SystemClock);
//! let mut session = EngineSession::from_config(&Config::load_or_default());
//! // On every driver trigger:
//! let dashboard = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
//! ```

pub mod hydration;
pub mod lifecycle;
pub mod session;
pub mod sweep;

pub use hydration::{HydrationDue, MicroDue};
pub use session::EngineSession;
pub use sweep::SweepReport;

use serde::Serialize;

use crate::clock::Clock;
use crate::error::Result;
use crate::events::Event;
use crate::log::{DailyLog, DaySummary, Delay, EntryKind, WATER_REMINDER_TITLE};
use crate::notify::{AlertPlayer, Notifier};
use crate::storage::{keys, KvStore};
use crate::time_of_day::TimeOfDay;
use crate::timetable::{load_timetable, Phase, ScheduledBlock, Timetable};

/// Result of a user-initiated mutation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "event", rename_all = "snake_case")]
pub enum ActionOutcome {
    Applied(Event),
    /// An entry already existed; nothing changed.
    Duplicate,
}

impl ActionOutcome {
    pub fn is_applied(&self) -> bool {
        matches!(self, ActionOutcome::Applied(_))
    }
}

/// Where a block stands in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BlockStatus {
    Unstarted,
    Started { started_at: Option<u16> },
    Completed { delay: Delay, score: u32 },
    Missed,
}

impl BlockStatus {
    fn of(block: &ScheduledBlock, log: &DailyLog) -> Self {
        let Some(entry) = log.main_event(&block.name) else {
            return BlockStatus::Unstarted;
        };
        match (entry.score, entry.delay, &entry.kind) {
            (Some(_), Some(Delay::Missed), _) => BlockStatus::Missed,
            (Some(score), Some(delay), _) => BlockStatus::Completed { delay, score },
            (_, _, EntryKind::MainEvent { started_at, .. }) => BlockStatus::Started {
                started_at: *started_at,
            },
            _ => BlockStatus::Unstarted,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BlockCard {
    #[serde(flatten)]
    pub block: ScheduledBlock,
    #[serde(flatten)]
    pub status: BlockStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HydrationCard {
    #[serde(flatten)]
    pub due: HydrationDue,
    pub hour: u32,
    pub nag: bool,
}

/// Everything the presentation layer needs for one render pass.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Dashboard {
    pub day: String,
    pub now: TimeOfDay,
    pub phase_label: String,
    pub active: Vec<BlockCard>,
    pub hydration: Option<HydrationCard>,
    pub micro: Vec<MicroDue>,
    pub summary: DaySummary,
    pub events: Vec<Event>,
}

/// Engine bound to a store and a clock.
pub struct Tracker<S, C> {
    store: S,
    clock: C,
}

impl<S: KvStore, C: Clock> Tracker<S, C> {
    pub fn new(store: S, clock: C) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn store_mut(&mut self) -> &mut S {
        &mut self.store
    }

    pub fn clock_mut(&mut self) -> &mut C {
        &mut self.clock
    }

    pub fn day_key(&self) -> String {
        self.clock.day_key()
    }

    pub fn now_minute(&self) -> u16 {
        self.clock.minute_of_day()
    }

    pub fn timetable(&mut self) -> Timetable {
        load_timetable(&mut self.store)
    }

    /// Blocks active at the current minute.
    pub fn active_blocks(&mut self) -> Vec<ScheduledBlock> {
        let now = self.now_minute();
        self.timetable()
            .active_blocks(now)
            .into_iter()
            .cloned()
            .collect()
    }

    /// Today's log, pruned against the current timetable.
    pub fn log_today(&mut self) -> DailyLog {
        let (_, log) = self.load_day();
        log
    }

    /// Hydration slot awaiting confirmation right now.
    pub fn due_hydration_slot(&mut self) -> Option<HydrationDue> {
        let now = self.now_minute();
        let (timetable, log) = self.load_day();
        hydration::due_slot(&timetable, &log, now)
    }

    /// Mark a block started now. A repeat call for the same name is a no-op.
    ///
    /// # Errors
    /// Returns an error if today's log cannot be saved.
    pub fn start_event(
        &mut self,
        name: &str,
        start: TimeOfDay,
        phase: Phase,
        severity: u32,
    ) -> Result<ActionOutcome> {
        let now = self.now_minute();
        let (_, mut log) = self.load_day();
        let outcome = lifecycle::start_named(&mut log, name, start, phase, severity, now);
        if outcome.is_applied() {
            log.save(&mut self.store)?;
            tracing::info!(name, started_at = now, "event started");
        }
        Ok(outcome)
    }

    /// Confirm a day-wide hydration slot now.
    ///
    /// # Errors
    /// Returns an error if today's log cannot be saved.
    pub fn mark_hydration(&mut self, slot: u32, start_minute: u16) -> Result<ActionOutcome> {
        let now = self.now_minute();
        let (_, mut log) = self.load_day();
        let outcome = hydration::mark_hydration(&mut log, slot, start_minute, now);
        if outcome.is_applied() {
            log.save(&mut self.store)?;
            self.store
                .set(&keys::last_water_slot(log.day()), &slot.to_string())?;
        }
        Ok(outcome)
    }

    /// Confirm a micro hydration slot of a started block now.
    ///
    /// # Errors
    /// Returns an error if today's log cannot be saved.
    pub fn mark_micro(
        &mut self,
        parent: &str,
        slot: u32,
        start_minute: u16,
    ) -> Result<ActionOutcome> {
        let now = self.now_minute();
        let (_, mut log) = self.load_day();
        let outcome = hydration::mark_micro(&mut log, parent, slot, start_minute, now);
        if outcome.is_applied() {
            log.save(&mut self.store)?;
        }
        Ok(outcome)
    }

    /// Prune, finalize, auto-miss and back-fill hydration. Never fails:
    /// a save error is logged and the report still returned.
    pub fn run_periodic_sweep(&mut self) -> SweepReport {
        let now = self.now_minute();
        let (timetable, mut log) = self.load_day_unpruned();
        let report = sweep::sweep(&timetable, &mut log, now);
        if report.changed() {
            if let Err(e) = log.save(&mut self.store) {
                tracing::error!(day = log.day(), "could not save swept log: {e}");
            }
        }
        report
    }

    /// Full driver cycle: sweep, derive the dashboard and issue reminders.
    pub fn evaluate(
        &mut self,
        session: &mut EngineSession,
        notifier: &mut dyn Notifier,
        alerts: &mut dyn AlertPlayer,
    ) -> Dashboard {
        let report = self.run_periodic_sweep();
        let mut events = report.events;

        let now = self.now_minute();
        let day = self.day_key();
        let (timetable, log) = self.load_day();

        let active: Vec<BlockCard> = timetable
            .active_blocks(now)
            .into_iter()
            .map(|block| BlockCard {
                block: block.clone(),
                status: BlockStatus::of(block, &log),
            })
            .collect();

        let phase_label = if active.is_empty() {
            "—".to_string()
        } else {
            active
                .iter()
                .map(|c| c.block.phase.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        };

        let hydration = match hydration::due_slot(&timetable, &log, now) {
            Some(due) => {
                let nag = self.remind_hydration(&day, due, now, session, notifier, &mut events);
                let slot_key = keys::slot_key(&day, keys::DAILY_CONTEXT, due.slot);
                session.alert_once(&day, &slot_key, alerts);
                Some(HydrationCard {
                    due,
                    hour: due.hour_label(),
                    nag,
                })
            }
            None => {
                session.clear_nag();
                None
            }
        };

        let mut micro = Vec::new();
        for card in &active {
            let Some(due) = hydration::micro_due(&card.block, &log, now) else {
                continue;
            };
            let title = WATER_REMINDER_TITLE;
            let body = format!("Hydration break during {}", due.parent);
            if self.notify_once(&day, &due.parent, due.slot, title, &body, session, notifier) {
                events.push(Event::ReminderIssued {
                    context: due.parent.clone(),
                    slot: due.slot,
                    nag: false,
                });
            }
            let slot_key = keys::slot_key(&day, &due.parent, due.slot);
            session.alert_once(&day, &slot_key, alerts);
            micro.push(due);
        }

        Dashboard {
            day,
            now: TimeOfDay::saturating_from_minutes(now),
            phase_label,
            active,
            hydration,
            micro,
            summary: log.summary(),
            events,
        }
    }

    /// First reminder for a due daily slot, or a nag if it is still unmarked.
    /// Returns whether this pass was a nag.
    fn remind_hydration(
        &mut self,
        day: &str,
        due: HydrationDue,
        now: u16,
        session: &mut EngineSession,
        notifier: &mut dyn Notifier,
        events: &mut Vec<Event>,
    ) -> bool {
        let title = WATER_REMINDER_TITLE;
        if self.notify_once(
            day,
            keys::DAILY_CONTEXT,
            due.slot,
            title,
            "Time for your hourly hydration!",
            session,
            notifier,
        ) {
            events.push(Event::ReminderIssued {
                context: keys::DAILY_CONTEXT.into(),
                slot: due.slot,
                nag: false,
            });
            session.track_nag(day, due.slot, due.start_minute, now);
            return false;
        }

        session.track_nag(day, due.slot, due.start_minute, now);
        if !session.nag_due(day, due.slot, now) {
            return false;
        }
        if session.notifications_enabled() {
            let body = format!("Hour {} hydration is still unmarked", due.hour_label());
            if let Err(e) = notifier.notify(title, &body) {
                tracing::warn!("notification failed: {e}");
            }
        }
        events.push(Event::ReminderIssued {
            context: keys::DAILY_CONTEXT.into(),
            slot: due.slot,
            nag: true,
        });
        true
    }

    /// Show a notification unless its `notified_` marker already exists.
    /// Returns whether the marker was newly written.
    #[allow(clippy::too_many_arguments)]
    fn notify_once(
        &mut self,
        day: &str,
        context: &str,
        slot: u32,
        title: &str,
        body: &str,
        session: &EngineSession,
        notifier: &mut dyn Notifier,
    ) -> bool {
        let key = keys::notified(day, context, slot);
        match self.store.get(&key) {
            Ok(Some(_)) => return false,
            Ok(None) => {}
            Err(e) => {
                tracing::warn!(key, "could not read reminder marker: {e}");
                return false;
            }
        }
        if session.notifications_enabled() {
            if let Err(e) = notifier.notify(title, body) {
                tracing::warn!("notification failed: {e}");
            }
        }
        if let Err(e) = self.store.set(&key, keys::NOTIFIED_MARKER) {
            tracing::warn!(key, "could not write reminder marker: {e}");
        }
        true
    }

    /// Timetable plus today's log with stale main events pruned (and saved).
    fn load_day(&mut self) -> (Timetable, DailyLog) {
        let (timetable, mut log) = self.load_day_unpruned();
        if log.prune(&timetable) > 0 {
            if let Err(e) = log.save(&mut self.store) {
                tracing::error!(day = log.day(), "could not save pruned log: {e}");
            }
        }
        (timetable, log)
    }

    fn load_day_unpruned(&mut self) -> (Timetable, DailyLog) {
        let day = self.day_key();
        let timetable = load_timetable(&mut self.store);
        let log = DailyLog::load(&mut self.store, &day);
        (timetable, log)
    }
}
