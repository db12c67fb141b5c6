//! Integration tests for the tracker against an in-memory store.

use chrono::NaiveDate;
use discipline_core::log::WATER_REMINDER_TITLE;
use discipline_core::notify::Recorder;
use discipline_core::storage::keys;
use discipline_core::{
    ActionOutcome, BlockStatus, Delay, EngineSession, EntryKind, Event, FixedClock, KvStore,
    MemoryStore, Phase, TimeOfDay, Tracker,
};

const DAY: &str = "2024-03-09";

fn clock_at(hhmm: &str) -> FixedClock {
    let date = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
    FixedClock::on(date, hhmm.parse().unwrap())
}

fn tracker_with(timetable: &str, at: &str) -> Tracker<MemoryStore, FixedClock> {
    let mut store = MemoryStore::new();
    store.set(keys::TIMETABLE, timetable).unwrap();
    Tracker::new(store, clock_at(at))
}

fn set_time(tracker: &mut Tracker<MemoryStore, FixedClock>, hhmm: &str) {
    tracker.clock_mut().set(hhmm.parse().unwrap());
}

const FOCUS_ONLY: &str =
    r#"[{"name":"Focus","start":"09:00","end":"10:00","phase":1,"severity":5}]"#;

const WORKDAY: &str = r#"[
    {"name":"Morning","start":"08:00","end":"12:00","phase":1,"severity":4},
    {"name":"Review","start":"11:00","end":"12:30","phase":2,"severity":2},
    {"name":"Afternoon","start":"13:00","end":"17:00","phase":3,"severity":3}
]"#;

#[test]
fn test_focus_block_end_to_end() {
    let mut tracker = tracker_with(FOCUS_ONLY, "09:10");

    let outcome = tracker
        .start_event("Focus", "09:00".parse().unwrap(), Phase::Number(1), 5)
        .unwrap();
    assert!(outcome.is_applied());

    let log = tracker.log_today();
    let entry = log.main_event("Focus").unwrap();
    assert_eq!(entry.score, None);
    assert!(matches!(
        entry.kind,
        EntryKind::MainEvent { started: true, started_at: Some(550), .. }
    ));

    set_time(&mut tracker, "10:00");
    let report = tracker.run_periodic_sweep();
    assert!(report.events.contains(&Event::EventFinalized {
        name: "Focus".into(),
        delay: Delay::Minutes(10),
        score: 40,
    }));

    let entry = tracker.log_today().main_event("Focus").cloned().unwrap();
    assert_eq!(entry.delay, Some(Delay::Minutes(10)));
    assert_eq!(entry.score, Some(40));

    // Later sweeps leave the finalized score alone.
    set_time(&mut tracker, "11:30");
    tracker.run_periodic_sweep();
    let again = tracker.log_today().main_event("Focus").cloned().unwrap();
    assert_eq!(again, entry);
}

#[test]
fn test_start_twice_keeps_single_entry() {
    let mut tracker = tracker_with(FOCUS_ONLY, "09:05");
    let start: TimeOfDay = "09:00".parse().unwrap();
    tracker.start_event("Focus", start, Phase::Number(1), 5).unwrap();
    set_time(&mut tracker, "09:20");
    let second = tracker.start_event("Focus", start, Phase::Number(1), 5).unwrap();
    assert_eq!(second, ActionOutcome::Duplicate);

    let log = tracker.log_today();
    assert_eq!(log.len(), 1);
    assert!(matches!(
        log.main_event("Focus").unwrap().kind,
        EntryKind::MainEvent { started_at: Some(545), .. }
    ));
}

#[test]
fn test_hydration_slot_and_marking() {
    let mut tracker = tracker_with(WORKDAY, "10:00");
    let due = tracker.due_hydration_slot().unwrap();
    assert_eq!(due.slot, 2);
    assert_eq!(due.start_minute, 600);

    set_time(&mut tracker, "10:05");
    let outcome = tracker.mark_hydration(due.slot, due.start_minute).unwrap();
    assert_eq!(
        outcome,
        ActionOutcome::Applied(Event::HydrationMarked {
            slot: 2,
            delay: Delay::Minutes(5),
            score: 5,
        })
    );
    assert_eq!(tracker.due_hydration_slot(), None);
    assert_eq!(
        tracker.store().get(&keys::last_water_slot(DAY)).unwrap().as_deref(),
        Some("2")
    );
    assert_eq!(
        tracker.mark_hydration(2, 600).unwrap(),
        ActionOutcome::Duplicate
    );
}

#[test]
fn test_missed_slots_backfilled_once() {
    let mut tracker = tracker_with(WORKDAY, "10:00");
    let report = tracker.run_periodic_sweep();
    assert_eq!(
        report.events,
        vec![
            Event::HydrationPenalized { slot: 0 },
            Event::HydrationPenalized { slot: 1 },
        ]
    );
    let second = tracker.run_periodic_sweep();
    assert!(second.events.is_empty());

    let log = tracker.log_today();
    let hydration: Vec<_> = log
        .entries()
        .iter()
        .filter(|e| e.hydration_slot().is_some())
        .collect();
    assert_eq!(hydration.len(), 2);
    assert!(hydration
        .iter()
        .all(|e| e.score == Some(0) && e.delay == Some(Delay::Missed)));
}

#[test]
fn test_end_of_day_leaves_nothing_pending() {
    let mut tracker = tracker_with(WORKDAY, "08:02");
    tracker
        .start_event("Morning", "08:00".parse().unwrap(), Phase::Number(1), 4)
        .unwrap();
    tracker.mark_hydration(0, 480).unwrap();

    set_time(&mut tracker, "17:00");
    tracker.run_periodic_sweep();
    let log = tracker.log_today();

    assert_eq!(log.main_event("Morning").unwrap().score, Some(38));
    assert!(log.main_event("Review").unwrap().is_missed());
    assert!(log.main_event("Afternoon").unwrap().is_missed());
    // 08:00-17:00 spans slots 0..=9.
    assert!((0..=9).all(|slot| log.has_hydration(slot)));
    assert!(log.entries().iter().all(|e| !e.is_pending()));

    let summary = log.summary();
    assert_eq!(summary.earned, 38 + 8);
    assert_eq!(summary.pending, 0);
}

#[test]
fn test_corrupt_timetable_is_reset() {
    let mut tracker = tracker_with("{{{ not json", "10:00");
    assert!(tracker.timetable().is_empty());
    assert!(tracker.active_blocks().is_empty());
    assert_eq!(tracker.due_hydration_slot(), None);
    assert!(tracker.run_periodic_sweep().events.is_empty());
    assert_eq!(
        tracker.store().get(keys::TIMETABLE).unwrap().as_deref(),
        Some("[]")
    );
}

#[test]
fn test_corrupt_log_is_reset() {
    let mut tracker = tracker_with(FOCUS_ONLY, "09:10");
    tracker.store_mut().set(DAY, "not a log").unwrap();
    assert!(tracker.log_today().is_empty());
    assert!(tracker
        .start_event("Focus", "09:00".parse().unwrap(), Phase::Number(1), 5)
        .unwrap()
        .is_applied());
    assert_eq!(tracker.log_today().len(), 1);
}

#[test]
fn test_timetable_edit_prunes_main_events() {
    let mut tracker = tracker_with(WORKDAY, "08:30");
    tracker
        .start_event("Morning", "08:00".parse().unwrap(), Phase::Number(1), 4)
        .unwrap();
    tracker.mark_hydration(0, 480).unwrap();

    tracker
        .store_mut()
        .set(
            keys::TIMETABLE,
            r#"[{"name":"Evening","start":"08:00","end":"20:00","phase":1,"severity":1}]"#,
        )
        .unwrap();

    let log = tracker.log_today();
    assert!(log.main_event("Morning").is_none());
    assert!(log.has_hydration(0));
}

#[test]
fn test_overlapping_blocks_score_independently() {
    let mut tracker = tracker_with(WORKDAY, "11:05");
    let active: Vec<_> = tracker.active_blocks().into_iter().map(|b| b.name).collect();
    assert_eq!(active, ["Morning", "Review"]);

    tracker
        .start_event("Review", "11:00".parse().unwrap(), Phase::Number(2), 2)
        .unwrap();
    set_time(&mut tracker, "12:00");
    tracker.run_periodic_sweep();
    let log = tracker.log_today();
    assert!(log.main_event("Morning").unwrap().is_missed());
    assert!(log.main_event("Review").unwrap().is_pending());

    set_time(&mut tracker, "12:30");
    tracker.run_periodic_sweep();
    assert_eq!(tracker.log_today().main_event("Review").unwrap().score, Some(15));
}

#[test]
fn test_evaluate_notifies_once_and_alerts_once() {
    let mut tracker = tracker_with(WORKDAY, "10:01");
    let mut session = EngineSession::new();
    let mut notifier = Recorder::default();
    let mut alerts = Recorder::default();

    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
    assert_eq!(dash.day, DAY);
    assert_eq!(dash.phase_label, "1");
    let card = dash.hydration.unwrap();
    assert_eq!((card.due.slot, card.hour, card.nag), (2, 3, false));
    assert_eq!(notifier.notifications.len(), 1);
    assert_eq!(notifier.notifications[0].0, WATER_REMINDER_TITLE);
    assert_eq!(alerts.alerts, vec!["2024-03-09_daily_2".to_string()]);
    assert!(dash.events.contains(&Event::ReminderIssued {
        context: "daily".into(),
        slot: 2,
        nag: false,
    }));
    assert_eq!(
        tracker
            .store()
            .get(&keys::notified(DAY, "daily", 2))
            .unwrap()
            .as_deref(),
        Some("yes")
    );

    // Re-entrant redraws within the nag interval are quiet.
    set_time(&mut tracker, "10:10");
    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
    assert!(!dash.hydration.unwrap().nag);
    assert_eq!(notifier.notifications.len(), 1);
    assert_eq!(alerts.alerts.len(), 1);

    // Still unmarked after the nag interval.
    set_time(&mut tracker, "10:15");
    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
    assert!(dash.hydration.unwrap().nag);
    assert_eq!(notifier.notifications.len(), 2);
    assert_eq!(alerts.alerts.len(), 1);

    tracker.mark_hydration(2, 600).unwrap();
    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
    assert!(dash.hydration.is_none());
    assert_eq!(session.nagged_slot(), None);
}

#[test]
fn test_evaluate_reports_block_status_and_micro_reminder() {
    let mut tracker = tracker_with(WORKDAY, "08:03");
    tracker
        .start_event("Morning", "08:00".parse().unwrap(), Phase::Number(1), 4)
        .unwrap();

    set_time(&mut tracker, "09:04");
    let mut session = EngineSession::new();
    let mut notifier = Recorder::default();
    let mut alerts = Recorder::default();
    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);

    assert_eq!(dash.active.len(), 1);
    assert_eq!(
        dash.active[0].status,
        BlockStatus::Started { started_at: Some(483) }
    );
    assert_eq!(dash.micro.len(), 1);
    assert_eq!(dash.micro[0].parent, "Morning");
    assert_eq!(dash.micro[0].slot, 1);
    assert_eq!(dash.micro[0].start_minute, 540);
    // One daily reminder (slot 1) and one micro reminder.
    assert_eq!(notifier.notifications.len(), 2);
    assert_eq!(alerts.alerts.len(), 2);

    let outcome = tracker.mark_micro("Morning", 1, 540).unwrap();
    assert!(matches!(
        outcome,
        ActionOutcome::Applied(Event::MicroMarked { score: 6, .. })
    ));
    let dash = tracker.evaluate(&mut session, &mut notifier, &mut alerts);
    assert!(dash.micro.is_empty());
}

#[test]
fn test_evaluate_outside_schedule() {
    let mut tracker = tracker_with(WORKDAY, "06:00");
    let mut session = EngineSession::new();
    let dash = tracker.evaluate(
        &mut session,
        &mut Recorder::default(),
        &mut Recorder::default(),
    );
    assert!(dash.active.is_empty());
    assert_eq!(dash.phase_label, "—");
    assert!(dash.hydration.is_none());
    assert!(dash.events.is_empty());
}

mod sweep_properties {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn sweeping_twice_changes_nothing(
            start_at in 480u16..1020,
            first in 0u16..1440,
            gap in 0u16..120,
        ) {
            let mut tracker = tracker_with(WORKDAY, "08:00");
            tracker.clock_mut().set_minute(start_at);
            let _ = tracker.start_event("Afternoon", "13:00".parse().unwrap(), Phase::Number(3), 3);

            tracker.clock_mut().set_minute(first);
            tracker.run_periodic_sweep();
            let once = tracker.log_today();
            prop_assert!(tracker.run_periodic_sweep().events.is_empty());
            prop_assert_eq!(tracker.log_today(), once.clone());

            // Finalized entries stay put as time moves on.
            tracker.clock_mut().set_minute(first.saturating_add(gap).min(1439));
            tracker.run_periodic_sweep();
            let later = tracker.log_today();
            for entry in once.entries().iter().filter(|e| !e.is_pending()) {
                prop_assert!(later.entries().contains(entry));
            }
        }
    }
}

#[test]
fn test_evaluate_survives_huge_severities() {
    let timetable = r#"[
        {"name":"A","start":"09:00","end":"10:00","phase":1,"severity":400000000},
        {"name":"B","start":"09:00","end":"10:00","phase":1,"severity":400000000}
    ]"#;
    let mut tracker = tracker_with(timetable, "11:00");
    let mut session = EngineSession::new();

    let dash = tracker.evaluate(&mut session, &mut Recorder::default(), &mut Recorder::default());
    assert_eq!(dash.summary.possible, u32::MAX);
    let log = tracker.log_today();
    assert_eq!(log.main_event("A").unwrap().delay, Some(Delay::Missed));
    assert_eq!(log.main_event("B").unwrap().delay, Some(Delay::Missed));
}
