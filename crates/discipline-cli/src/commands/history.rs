use clap::Subcommand;
use discipline_core::log::list_days;
use discipline_core::storage::Database;
use discipline_core::{Clock, DailyLog};

use super::{AppClock, CmdResult};

#[derive(Subcommand)]
pub enum HistoryAction {
    /// Score summary for every recorded day
    List,
    /// Every log entry of one day (defaults to today)
    Show { day: Option<String> },
}

pub fn run(clock: AppClock, action: HistoryAction) -> CmdResult {
    let mut db = Database::open()?;

    match action {
        HistoryAction::List => {
            let summaries: Vec<_> = list_days(&db)
                .iter()
                .map(|day| DailyLog::load(&mut db, day).summary())
                .collect();
            println!("{}", serde_json::to_string_pretty(&summaries)?);
        }
        HistoryAction::Show { day } => {
            let day = day.unwrap_or_else(|| clock.day_key());
            let log = DailyLog::load(&mut db, &day);
            println!("{}", serde_json::to_string_pretty(log.entries())?);
        }
    }
    Ok(())
}
