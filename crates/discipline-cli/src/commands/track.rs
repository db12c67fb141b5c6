//! One-shot user actions: start a block, confirm hydration, sweep.

use discipline_core::engine::hydration;
use discipline_core::ActionOutcome;

use super::{open_tracker, AppClock, CmdResult};

fn print_outcome(outcome: &ActionOutcome) -> CmdResult {
    println!("{}", serde_json::to_string_pretty(outcome)?);
    Ok(())
}

pub fn start(clock: AppClock, name: &str) -> CmdResult {
    let mut tracker = open_tracker(clock)?;
    let timetable = tracker.timetable();
    let block = timetable
        .get(name)
        .ok_or_else(|| format!("no block named {name:?} in the timetable"))?;
    if !block.contains(tracker.now_minute()) {
        tracing::warn!(name, "starting a block outside its scheduled window");
    }
    let outcome = tracker.start_event(
        &block.name,
        block.start,
        block.phase.clone(),
        block.severity,
    )?;
    print_outcome(&outcome)
}

pub fn water(clock: AppClock, block: Option<&str>) -> CmdResult {
    let mut tracker = open_tracker(clock)?;
    let outcome = match block {
        None => {
            let due = tracker
                .due_hydration_slot()
                .ok_or("no hydration slot is due right now")?;
            tracker.mark_hydration(due.slot, due.start_minute)?
        }
        Some(name) => {
            let now = tracker.now_minute();
            let timetable = tracker.timetable();
            let block = timetable
                .get(name)
                .ok_or_else(|| format!("no block named {name:?} in the timetable"))?;
            let log = tracker.log_today();
            let due = hydration::micro_due(block, &log, now)
                .ok_or_else(|| format!("no micro hydration break is due for {name:?}"))?;
            tracker.mark_micro(&due.parent, due.slot, due.start_minute)?
        }
    };
    print_outcome(&outcome)
}

pub fn sweep(clock: AppClock) -> CmdResult {
    let mut tracker = open_tracker(clock)?;
    let report = tracker.run_periodic_sweep();
    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
