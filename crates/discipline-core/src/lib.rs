//! # Discipline Core Library
//!
//! Business logic for the Discipline habit tracker: a daily timetable of
//! named blocks, a per-day action log, and the reconciliation engine that
//! decides what is active, what is due and what was missed.
//!
//! ## Architecture
//!
//! - **Timetable**: validated on every read; bad rows are dropped
//! - **Daily log**: one JSON array per calendar day in a key-value store
//! - **Engine**: pure sweeps over `(timetable, log, now)`, wrapped by
//!   [`Tracker`] which handles loading and saving
//! - **Storage**: SQLite key-value table and TOML configuration
//!
//! ## Key Components
//!
//! - [`Tracker`]: engine bound to a store and clock
//! - [`EngineSession`]: in-memory reminder and alert state
//! - [`Database`]: persistent key-value store
//! - [`Config`]: application configuration management

pub mod clock;
pub mod engine;
pub mod error;
pub mod events;
pub mod log;
pub mod notify;
pub mod scoring;
pub mod storage;
pub mod time_of_day;
pub mod timetable;

pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{
    ActionOutcome, BlockCard, BlockStatus, Dashboard, EngineSession, HydrationCard, HydrationDue,
    MicroDue, SweepReport, Tracker,
};
pub use error::{ConfigError, CoreError, StorageError, ValidationError};
pub use events::Event;
pub use log::{DailyLog, DaySummary, Delay, EntryKind, LogEntry};
pub use notify::{AlertPlayer, Notifier};
pub use storage::{Config, Database, KvStore, MemoryStore};
pub use time_of_day::TimeOfDay;
pub use timetable::{Phase, ScheduledBlock, Timetable};
