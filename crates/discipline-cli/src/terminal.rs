//! Notifications and alerts rendered on the controlling terminal.

use std::io::Write;

use discipline_core::notify::NotifyResult;
use discipline_core::{AlertPlayer, Notifier};

/// Writes reminders to stderr and rings the terminal bell for alerts.
#[derive(Debug, Default)]
pub struct Terminal;

impl Notifier for Terminal {
    fn notify(&mut self, title: &str, body: &str) -> NotifyResult {
        let mut err = std::io::stderr().lock();
        writeln!(err, "{title}: {body}")?;
        Ok(())
    }
}

impl AlertPlayer for Terminal {
    fn play(&mut self, slot_key: &str) -> NotifyResult {
        tracing::debug!(slot_key, "ringing bell");
        let mut err = std::io::stderr().lock();
        err.write_all(b"\x07")?;
        err.flush()?;
        Ok(())
    }
}
