//! Output collaborators: desktop-style notifications and audible alerts.
//!
//! Both are best-effort. The engine logs a failure and carries on.

pub type NotifyResult = Result<(), Box<dyn std::error::Error + Send + Sync>>;

pub trait Notifier {
    fn notify(&mut self, title: &str, body: &str) -> NotifyResult;
}

pub trait AlertPlayer {
    /// Play the alert for `slot_key`. Deduplication happens in the engine
    /// session, so this is called at most once per slot key.
    fn play(&mut self, slot_key: &str) -> NotifyResult;
}

/// Keeps every call, for assertions.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    pub notifications: Vec<(String, String)>,
    pub alerts: Vec<String>,
}

impl Notifier for Recorder {
    fn notify(&mut self, title: &str, body: &str) -> NotifyResult {
        self.notifications.push((title.to_string(), body.to_string()));
        Ok(())
    }
}

impl AlertPlayer for Recorder {
    fn play(&mut self, slot_key: &str) -> NotifyResult {
        self.alerts.push(slot_key.to_string());
        Ok(())
    }
}
