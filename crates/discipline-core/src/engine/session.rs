//! Per-process reminder state.
//!
//! Nothing here is persisted. A fresh session may replay one alert sound
//! per slot and restarts nag counting from the current interval.

use std::collections::HashSet;

use crate::notify::AlertPlayer;
use crate::storage::Config;

/// Re-notification tracking for the slot currently due.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Nag {
    day: String,
    slot: u32,
    start_minute: u16,
    count: u16,
}

#[derive(Debug, Clone)]
pub struct EngineSession {
    alerted_day: Option<String>,
    alerted: HashSet<String>,
    nag: Option<Nag>,
    nag_interval: u16,
    notifications: bool,
    sound: bool,
}

impl Default for EngineSession {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl EngineSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &Config) -> Self {
        Self {
            alerted_day: None,
            alerted: HashSet::new(),
            nag: None,
            nag_interval: config.hydration.nag_interval_min.max(1),
            notifications: config.notifications.enabled,
            sound: config.notifications.sound,
        }
    }

    pub fn notifications_enabled(&self) -> bool {
        self.notifications
    }

    /// Play the alert for `slot_key` unless this session already did.
    /// Returns whether the player was invoked.
    pub fn alert_once(&mut self, day: &str, slot_key: &str, player: &mut dyn AlertPlayer) -> bool {
        if !self.sound {
            return false;
        }
        if self.alerted_day.as_deref() != Some(day) {
            self.alerted_day = Some(day.to_string());
            self.alerted.clear();
        }
        if !self.alerted.insert(slot_key.to_string()) {
            return false;
        }
        if let Err(e) = player.play(slot_key) {
            tracing::warn!(slot_key, "alert playback failed: {e}");
        }
        true
    }

    /// Start nag tracking for a slot whose first reminder has been shown.
    ///
    /// Intervals that already passed are not nagged retroactively.
    pub fn track_nag(&mut self, day: &str, slot: u32, start_minute: u16, now: u16) {
        if self.is_tracking(day, slot) {
            return;
        }
        self.nag = Some(Nag {
            day: day.to_string(),
            slot,
            start_minute,
            count: self.intervals_since(start_minute, now),
        });
    }

    /// Whether a repeat reminder is due for the tracked slot at `now`.
    /// Advances the nag counter when it is.
    pub fn nag_due(&mut self, day: &str, slot: u32, now: u16) -> bool {
        if !self.is_tracking(day, slot) {
            return false;
        }
        let interval = self.nag_interval;
        let Some(nag) = self.nag.as_mut() else {
            return false;
        };
        let n = now.saturating_sub(nag.start_minute) / interval;
        if n > nag.count {
            nag.count = n;
            true
        } else {
            false
        }
    }

    /// Forget nag state, e.g. once the slot is marked or no longer due.
    pub fn clear_nag(&mut self) {
        self.nag = None;
    }

    pub fn nagged_slot(&self) -> Option<u32> {
        self.nag.as_ref().map(|n| n.slot)
    }

    fn is_tracking(&self, day: &str, slot: u32) -> bool {
        self.nag
            .as_ref()
            .is_some_and(|n| n.day == day && n.slot == slot)
    }

    fn intervals_since(&self, start_minute: u16, now: u16) -> u16 {
        now.saturating_sub(start_minute) / self.nag_interval
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notify::Recorder;

    const DAY: &str = "2024-03-09";

    #[test]
    fn alert_plays_once_per_slot() {
        let mut session = EngineSession::new();
        let mut player = Recorder::default();
        assert!(session.alert_once(DAY, "2024-03-09_daily_1", &mut player));
        assert!(!session.alert_once(DAY, "2024-03-09_daily_1", &mut player));
        assert!(session.alert_once(DAY, "2024-03-09_Focus_1", &mut player));
        // Alternating keys do not re-trigger either one.
        assert!(!session.alert_once(DAY, "2024-03-09_daily_1", &mut player));
        assert_eq!(player.alerts.len(), 2);
    }

    #[test]
    fn alerts_reset_on_new_day() {
        let mut session = EngineSession::new();
        let mut player = Recorder::default();
        session.alert_once(DAY, "k", &mut player);
        assert!(session.alert_once("2024-03-10", "k", &mut player));
    }

    #[test]
    fn sound_can_be_disabled() {
        let mut config = Config::default();
        config.notifications.sound = false;
        let mut session = EngineSession::from_config(&config);
        let mut player = Recorder::default();
        assert!(!session.alert_once(DAY, "k", &mut player));
        assert!(player.alerts.is_empty());
    }

    #[test]
    fn nags_every_interval() {
        let mut session = EngineSession::new();
        session.track_nag(DAY, 2, 600, 601);
        assert!(!session.nag_due(DAY, 2, 614));
        assert!(session.nag_due(DAY, 2, 615));
        assert!(!session.nag_due(DAY, 2, 620));
        assert!(session.nag_due(DAY, 2, 630));
        assert!(!session.nag_due(DAY, 3, 660));

        session.clear_nag();
        assert!(!session.nag_due(DAY, 2, 700));
    }

    #[test]
    fn late_tracking_does_not_nag_immediately() {
        let mut session = EngineSession::new();
        session.track_nag(DAY, 0, 480, 520);
        assert!(!session.nag_due(DAY, 0, 520));
        assert!(session.nag_due(DAY, 0, 525));
    }
}
