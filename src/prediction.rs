use chrono::{Duration, NaiveDate};

use crate::calendar::{self, day_of_cycle};
use crate::models::{CycleConfiguration, FertileWindow, PeriodRecord, PredictedCycle};
use crate::stats::{self, cycle_stats};

/// Ovulation is assumed this many days before the next period starts.
pub const LUTEAL_PHASE_DAYS: i64 = 14;
/// Fertile days before ovulation.
pub const FERTILE_DAYS_BEFORE_OVULATION: i64 = 5;
/// Fertile days after ovulation.
pub const FERTILE_DAYS_AFTER_OVULATION: i64 = 1;
/// Tracked cycles needed before empirical averages replace the configuration.
pub const MIN_CYCLES_FOR_AVERAGE: usize = 2;

/// Ovulation for a cycle of `cycle_length` days starting on `cycle_start`.
pub fn ovulation_day(cycle_start: NaiveDate, cycle_length: i64) -> NaiveDate {
    cycle_start + Duration::days(cycle_length - LUTEAL_PHASE_DAYS)
}

pub fn fertile_window(cycle_start: NaiveDate, cycle_length: i64) -> FertileWindow {
    let ovulation = ovulation_day(cycle_start, cycle_length);
    FertileWindow {
        start: ovulation - Duration::days(FERTILE_DAYS_BEFORE_OVULATION),
        end: ovulation + Duration::days(FERTILE_DAYS_AFTER_OVULATION),
    }
}

/// Projection of future cycles from the most recent period start.
///
/// Every future cycle is assumed to repeat with the same length; there is no
/// trend or seasonality modelling.
#[derive(Debug, Clone, PartialEq)]
pub struct PeriodForecast {
    pub anchor: NaiveDate,
    pub cycle_length: i64,
    pub period_length: i64,
    pub confidence: f32,
}

impl PeriodForecast {
    /// Build a forecast from period history. `None` when nothing is logged yet.
    pub fn from_history(records: &[PeriodRecord], config: &CycleConfiguration) -> Option<Self> {
        let anchor = records.iter().map(|r| r.start_date).max()?;
        let stats = cycle_stats(records, config);

        let (cycle_length, period_length) = if stats.total_cycles_tracked >= MIN_CYCLES_FOR_AVERAGE {
            (
                (stats.average_cycle_length.round() as i64).max(1),
                (stats.average_period_length.round() as i64).max(1),
            )
        } else {
            (config.cycle_length, config.period_length)
        };

        let lengths = stats::cycle_lengths(records);
        let confidence = if lengths.len() < 2 {
            0.5
        } else {
            let std_dev = stats::std_deviation(&lengths);
            (1.0 - (std_dev / stats.average_cycle_length) as f32).clamp(0.1, 0.95)
        };

        tracing::debug!(
            %anchor,
            cycle_length,
            period_length,
            cycles = stats.total_cycles_tracked,
            "built period forecast"
        );

        Some(Self {
            anchor,
            cycle_length,
            period_length,
            confidence,
        })
    }

    pub fn with_lengths(anchor: NaiveDate, cycle_length: i64, period_length: i64) -> Self {
        Self {
            anchor,
            cycle_length,
            period_length,
            confidence: 0.5,
        }
    }

    pub fn day_of_cycle(&self, date: NaiveDate) -> i64 {
        day_of_cycle(self.anchor, self.cycle_length, date)
    }

    /// Whether `date` falls on a predicted bleeding day. Dates before the
    /// anchor belong to logged history and are never predicted.
    pub fn is_predicted_period_day(&self, date: NaiveDate) -> bool {
        date >= self.anchor && self.day_of_cycle(date) <= self.period_length
    }

    /// First predicted cycle start on or after `today`: `anchor + k * L` for
    /// the smallest integer `k`, which is negative when `today` precedes the
    /// anchor.
    pub fn next_period_date(&self, today: NaiveDate) -> NaiveDate {
        let elapsed = calendar::days_between(self.anchor, today);
        let cycles = -(-elapsed).div_euclid(self.cycle_length);
        self.anchor + Duration::days(cycles * self.cycle_length)
    }

    pub fn days_until_next_period(&self, today: NaiveDate) -> i64 {
        calendar::days_between(today, self.next_period_date(today))
    }

    pub fn ovulation_day(&self, cycle_start: NaiveDate) -> NaiveDate {
        ovulation_day(cycle_start, self.cycle_length)
    }

    pub fn fertile_window(&self, cycle_start: NaiveDate) -> FertileWindow {
        fertile_window(cycle_start, self.cycle_length)
    }

    /// The next `count` predicted cycles, starting from the first one on or
    /// after `today`.
    pub fn upcoming(&self, today: NaiveDate, count: usize) -> Vec<PredictedCycle> {
        let first = self.next_period_date(today);
        (0..count as i64)
            .map(|i| {
                let start = first + Duration::days(i * self.cycle_length);
                PredictedCycle {
                    period_start: start,
                    period_end: start + Duration::days((self.period_length - 1).max(0)),
                    ovulation_day: self.ovulation_day(start),
                    fertile_window: self.fertile_window(start),
                }
            })
            .collect()
    }
}
