pub mod config;
pub mod history;
pub mod status;
pub mod timetable;
pub mod track;
pub mod watch;

use chrono::{NaiveDate, NaiveDateTime};
use discipline_core::{Clock, Database, FixedClock, SystemClock, TimeOfDay, Tracker};

pub type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// System time, or a frozen instant when `--at`/`--date` is given.
#[derive(Debug, Clone, Copy)]
pub enum AppClock {
    System(SystemClock),
    Fixed(FixedClock),
}

impl AppClock {
    /// Missing halves of an override are taken from the system clock.
    pub fn from_overrides(date: Option<NaiveDate>, at: Option<TimeOfDay>) -> Self {
        if date.is_none() && at.is_none() {
            return AppClock::System(SystemClock);
        }
        let now = SystemClock.now();
        let date = date.unwrap_or_else(|| now.date());
        let at = at
            .unwrap_or_else(|| TimeOfDay::saturating_from_minutes(SystemClock.minute_of_day()));
        AppClock::Fixed(FixedClock::on(date, at))
    }
}

impl Clock for AppClock {
    fn now(&self) -> NaiveDateTime {
        match self {
            AppClock::System(c) => c.now(),
            AppClock::Fixed(c) => c.now(),
        }
    }
}

pub fn open_tracker(
    clock: AppClock,
) -> Result<Tracker<Database, AppClock>, Box<dyn std::error::Error>> {
    let db = Database::open()?;
    Ok(Tracker::new(db, clock))
}
