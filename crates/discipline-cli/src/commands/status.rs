use discipline_core::{BlockStatus, Config, Dashboard, EngineSession, TimeOfDay};

use super::{open_tracker, AppClock, CmdResult};
use crate::terminal::Terminal;

pub fn run(clock: AppClock, json: bool) -> CmdResult {
    let config = Config::load_or_default();
    let mut tracker = open_tracker(clock)?;
    let mut session = EngineSession::from_config(&config);
    let mut terminal = Terminal;
    let mut bell = Terminal;

    let dashboard = tracker.evaluate(&mut session, &mut terminal, &mut bell);
    if json {
        println!("{}", serde_json::to_string_pretty(&dashboard)?);
    } else {
        print!("{}", render(&dashboard));
    }
    Ok(())
}

/// Plain-text dashboard.
pub fn render(dashboard: &Dashboard) -> String {
    let mut out = format!(
        "{}  {}  phase {}\n",
        dashboard.day,
        dashboard.now.to_12h(),
        dashboard.phase_label
    );

    if dashboard.active.is_empty() {
        out.push_str("No active block\n");
    }
    for card in &dashboard.active {
        let status = match card.status {
            BlockStatus::Unstarted => "not started".to_string(),
            BlockStatus::Started {
                started_at: Some(at),
            } => format!("started {}", TimeOfDay::saturating_from_minutes(at).to_12h()),
            BlockStatus::Started { started_at: None } => "started".to_string(),
            BlockStatus::Completed { delay, score } => format!("done, {delay} late, {score} pts"),
            BlockStatus::Missed => "missed".to_string(),
        };
        out.push_str(&format!(
            "  {} {}-{} (severity {}): {status}\n",
            card.block.name,
            card.block.start.to_12h(),
            card.block.end.to_12h(),
            card.block.severity,
        ));
    }

    if let Some(card) = &dashboard.hydration {
        let since = TimeOfDay::saturating_from_minutes(card.due.start_minute);
        let nag = if card.nag { " (reminder)" } else { "" };
        out.push_str(&format!(
            "Hydration: hour {} due since {}{nag}\n",
            card.hour,
            since.to_12h()
        ));
    }
    for due in &dashboard.micro {
        let since = TimeOfDay::saturating_from_minutes(due.start_minute);
        out.push_str(&format!(
            "Micro hydration: {} break {} due since {}\n",
            due.parent,
            due.slot,
            since.to_12h()
        ));
    }

    let summary = &dashboard.summary;
    out.push_str(&format!(
        "Score: {}/{} ({:.1}%)\n",
        summary.earned,
        summary.possible,
        summary.percent()
    ));
    out
}
