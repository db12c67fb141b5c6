use chrono::NaiveDate;
use clap::{Parser, Subcommand};
use discipline_core::TimeOfDay;
use tracing_subscriber::EnvFilter;

mod commands;
mod terminal;

#[derive(Parser)]
#[command(name = "discipline", version, about = "Discipline habit tracker")]
struct Cli {
    /// Evaluate as if the local time were HH:MM
    #[arg(long, global = true)]
    at: Option<TimeOfDay>,
    /// Evaluate as if today were YYYY-MM-DD
    #[arg(long, global = true)]
    date: Option<NaiveDate>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sweep, then show active blocks, due hydration and today's score
    Status {
        /// Print the dashboard as JSON
        #[arg(long)]
        json: bool,
    },
    /// Mark a timetable block as started now
    Start {
        /// Block name as it appears in the timetable
        name: String,
    },
    /// Confirm the hydration slot that is due now
    Water {
        /// Confirm the micro hydration slot of this started block instead
        #[arg(long)]
        block: Option<String>,
    },
    /// Run one reconciliation sweep and print what changed
    Sweep,
    /// Re-evaluate periodically until interrupted
    Watch {
        /// Stop after this many evaluations
        #[arg(long)]
        count: Option<u64>,
    },
    /// Timetable management
    Timetable {
        #[command(subcommand)]
        action: commands::timetable::TimetableAction,
    },
    /// Past days and their scores
    History {
        #[command(subcommand)]
        action: commands::history::HistoryAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
}

fn init_tracing() {
    let filter =
        EnvFilter::try_from_env("DISCIPLINE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let clock = commands::AppClock::from_overrides(cli.date, cli.at);
    let result = match cli.command {
        Commands::Status { json } => commands::status::run(clock, json),
        Commands::Start { name } => commands::track::start(clock, &name),
        Commands::Water { block } => commands::track::water(clock, block.as_deref()),
        Commands::Sweep => commands::track::sweep(clock),
        Commands::Watch { count } => commands::watch::run(clock, count),
        Commands::Timetable { action } => commands::timetable::run(action),
        Commands::History { action } => commands::history::run(clock, action),
        Commands::Config { action } => commands::config::run(action),
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
