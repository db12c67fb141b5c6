//! Timeliness scoring.
//!
//! An action earns full marks when taken on time and loses one point per
//! minute of delay. Past the grace window it earns nothing.

use crate::log::Delay;

/// Minutes of lateness that still earn a score.
pub const GRACE_MINUTES: u16 = 15;

/// Base points of one hydration or micro-habit action.
pub const HYDRATION_BASE: u32 = 10;

/// Points per unit of block severity.
pub const POINTS_PER_SEVERITY: u32 = 10;

/// Delay between a nominal start and the moment the action happened,
/// clamped at zero for early actions.
pub fn delay_between(nominal: u16, actual: u16) -> Delay {
    Delay::Minutes(actual.saturating_sub(nominal))
}

/// Score of a main event with the given severity.
pub fn main_event_score(severity: u32, delay: Delay) -> u32 {
    graded(severity.saturating_mul(POINTS_PER_SEVERITY), delay)
}

/// Score of a hydration or micro-habit action.
pub fn hydration_score(delay: Delay) -> u32 {
    graded(HYDRATION_BASE, delay)
}

fn graded(base: u32, delay: Delay) -> u32 {
    match delay {
        Delay::Minutes(m) if m <= GRACE_MINUTES => base.saturating_sub(u32::from(m)),
        Delay::Minutes(_) | Delay::Missed => 0,
    }
}
