use std::io::Read;
use std::path::{Path, PathBuf};

use clap::Subcommand;
use discipline_core::storage::Database;
use discipline_core::timetable::{load_timetable, save_timetable, validate};
use discipline_core::{Phase, ScheduledBlock, TimeOfDay, Timetable};

use super::CmdResult;

#[derive(Subcommand)]
pub enum TimetableAction {
    /// Print the validated timetable as JSON
    Show,
    /// Replace the timetable with a JSON array read from a file ("-" for stdin)
    Import { path: PathBuf },
    /// Append a block
    Add {
        name: String,
        /// Start time, HH:MM
        #[arg(long)]
        start: TimeOfDay,
        /// End time, HH:MM (exclusive)
        #[arg(long)]
        end: TimeOfDay,
        /// Phase number or name
        #[arg(long, default_value = "1")]
        phase: String,
        #[arg(long, default_value = "1")]
        severity: u32,
    },
    /// Remove a block by name
    Remove { name: String },
    /// Remove every block
    Clear,
}

fn parse_phase(raw: &str) -> Phase {
    match raw.trim().parse::<u32>() {
        Ok(n) => Phase::Number(n),
        Err(_) => Phase::Name(raw.trim().to_string()),
    }
}

fn read_source(path: &Path) -> std::io::Result<String> {
    if path.as_os_str() == "-" {
        let mut buf = String::new();
        std::io::stdin().read_to_string(&mut buf)?;
        Ok(buf)
    } else {
        std::fs::read_to_string(path)
    }
}

pub fn run(action: TimetableAction) -> CmdResult {
    let mut db = Database::open()?;

    match action {
        TimetableAction::Show => {
            let timetable = load_timetable(&mut db);
            println!("{}", serde_json::to_string_pretty(&timetable)?);
        }
        TimetableAction::Import { path } => {
            let raw = read_source(&path)?;
            let value: serde_json::Value = serde_json::from_str(&raw)?;
            let rows = value.as_array().ok_or("timetable must be a JSON array")?;
            let (blocks, rejected) = validate::validate_all(rows);
            for (index, reason) in &rejected {
                eprintln!("skipped entry {index}: {reason}");
            }
            let timetable = Timetable::new(blocks);
            save_timetable(&mut db, &timetable)?;
            println!(
                "{}",
                serde_json::json!({ "imported": timetable.len(), "rejected": rejected.len() })
            );
        }
        TimetableAction::Add {
            name,
            start,
            end,
            phase,
            severity,
        } => {
            let mut timetable = load_timetable(&mut db);
            timetable.add(ScheduledBlock {
                name: name.trim().to_string(),
                start,
                end,
                phase: parse_phase(&phase),
                severity,
            })?;
            save_timetable(&mut db, &timetable)?;
            println!("{}", serde_json::to_string_pretty(&timetable)?);
        }
        TimetableAction::Remove { name } => {
            let mut timetable = load_timetable(&mut db);
            if !timetable.remove(&name) {
                return Err(format!("no block named {name:?} in the timetable").into());
            }
            save_timetable(&mut db, &timetable)?;
            println!("ok");
        }
        TimetableAction::Clear => {
            save_timetable(&mut db, &Timetable::default())?;
            println!("timetable cleared");
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn phase_argument_prefers_numbers() {
        assert_eq!(parse_phase("2"), Phase::Number(2));
        assert_eq!(parse_phase(" deep "), Phase::Name("deep".into()));
    }
}
