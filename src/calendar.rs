use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Last cycle day of the follicular phase.
pub const FOLLICULAR_END_DAY: i64 = 13;
/// Last cycle day of the ovulatory phase.
pub const OVULATORY_END_DAY: i64 = 17;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Menstrual,
    Follicular,
    Ovulatory,
    Luteal,
}

pub fn days_between(from: NaiveDate, to: NaiveDate) -> i64 {
    (to - from).num_days()
}

/// 1-based position of `on` within a cycle of `cycle_length` days that
/// started on `reference_start`. Wraps in both directions, so dates before the
/// reference are well-defined too.
///
/// `cycle_length` must be positive.
pub fn day_of_cycle(reference_start: NaiveDate, cycle_length: i64, on: NaiveDate) -> i64 {
    debug_assert!(cycle_length > 0, "cycle length must be positive");
    days_between(reference_start, on).rem_euclid(cycle_length) + 1
}

/// Phase boundaries are fixed calendar days, not proportions of the cycle.
pub fn phase_for_day(day_of_cycle: i64, _cycle_length: i64, period_length: i64) -> Phase {
    if day_of_cycle <= period_length {
        Phase::Menstrual
    } else if day_of_cycle <= FOLLICULAR_END_DAY {
        Phase::Follicular
    } else if day_of_cycle <= OVULATORY_END_DAY {
        Phase::Ovulatory
    } else {
        Phase::Luteal
    }
}

/// Start date of the cycle containing `on`.
pub fn cycle_start_for(reference_start: NaiveDate, cycle_length: i64, on: NaiveDate) -> NaiveDate {
    on - chrono::Duration::days(day_of_cycle(reference_start, cycle_length, on) - 1)
}
