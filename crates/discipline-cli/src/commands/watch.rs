//! Periodic driver.
//!
//! Evaluates on a fixed tick, and immediately whenever the timetable change
//! marker moves, until Ctrl-C.

use std::time::Duration;

use discipline_core::timetable::timetable_version;
use discipline_core::{Config, EngineSession};

use super::{open_tracker, AppClock, CmdResult};
use crate::terminal::Terminal;

/// How often the timetable change marker is polled between ticks.
const CHANGE_POLL: Duration = Duration::from_secs(1);

pub fn run(clock: AppClock, count: Option<u64>) -> CmdResult {
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .enable_all()
        .build()?;
    runtime.block_on(watch(clock, count))
}

async fn watch(clock: AppClock, count: Option<u64>) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(clock)?;
    let mut session = EngineSession::from_config(&config);
    let mut terminal = Terminal;
    let mut bell = Terminal;

    let mut tick = tokio::time::interval(Duration::from_secs(config.driver.tick_secs.max(1)));
    let mut poll = tokio::time::interval(CHANGE_POLL);
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    let mut version = timetable_version(tracker.store());
    let mut evaluations = 0u64;
    tracing::info!(tick_secs = config.driver.tick_secs, "watching");

    loop {
        tokio::select! {
            _ = tick.tick() => {}
            _ = poll.tick() => {
                let current = timetable_version(tracker.store());
                if current == version {
                    continue;
                }
                tracing::info!(?current, "timetable changed");
                version = current;
            }
            _ = &mut shutdown => {
                tracing::info!("interrupted");
                break;
            }
        }

        let dashboard = tracker.evaluate(&mut session, &mut terminal, &mut bell);
        for event in &dashboard.events {
            println!("{}", serde_json::to_string(event)?);
        }

        evaluations += 1;
        if count.is_some_and(|n| evaluations >= n) {
            break;
        }
    }
    Ok(())
}
