use chrono::NaiveDate;

use crate::models::{CycleConfiguration, CycleStats, LengthRange, PeriodRecord};

pub const TYPICAL_CYCLE_MIN: i64 = 21;
pub const TYPICAL_CYCLE_MAX: i64 = 35;
/// Spread between shortest and longest cycle above which history is irregular.
pub const MAX_REGULAR_SPREAD: i64 = 7;

/// Fill in `cycle_length` on every record from its chronological predecessor.
///
/// Run after any insert, edit or delete: moving one start date changes the
/// cycle length of the record that follows it.
pub fn recompute_cycle_lengths(records: &mut [PeriodRecord]) {
    records.sort_by_key(|r| r.start_date);
    let mut previous: Option<NaiveDate> = None;
    for record in records.iter_mut() {
        record.cycle_length = previous.map(|prev| (record.start_date - prev).num_days());
        previous = Some(record.start_date);
    }
}

/// Cycle lengths in chronological order, derived from start dates alone so a
/// stale stored `cycle_length` can never leak into statistics.
pub fn cycle_lengths(records: &[PeriodRecord]) -> Vec<i64> {
    let mut starts: Vec<_> = records.iter().map(|r| r.start_date).collect();
    starts.sort();
    starts.windows(2).map(|w| (w[1] - w[0]).num_days()).collect()
}

/// Compute cycle statistics from the full record collection, in any order.
pub fn cycle_stats(records: &[PeriodRecord], config: &CycleConfiguration) -> CycleStats {
    let lengths = cycle_lengths(records);

    let latest = records.iter().max_by_key(|r| r.start_date);
    let last_cycle_length = lengths.last().copied();
    let last_period_length = latest
        .map(|r| r.period_length(config.period_length))
        .unwrap_or(config.period_length);

    let (average_cycle_length, cycle_length_variation) = match (lengths.iter().min(), lengths.iter().max()) {
        (Some(&min), Some(&max)) => (mean(&lengths), LengthRange { min, max }),
        _ => (
            config.cycle_length as f64,
            LengthRange {
                min: config.cycle_length,
                max: config.cycle_length,
            },
        ),
    };

    let period_lengths: Vec<i64> = records
        .iter()
        .map(|r| r.period_length(config.period_length))
        .collect();
    let average_period_length = if period_lengths.is_empty() {
        config.period_length as f64
    } else {
        mean(&period_lengths)
    };

    let is_irregular = cycle_length_variation.spread() > MAX_REGULAR_SPREAD
        || last_cycle_length
            .is_some_and(|len| !(TYPICAL_CYCLE_MIN..=TYPICAL_CYCLE_MAX).contains(&len));

    CycleStats {
        total_cycles_tracked: lengths.len(),
        average_cycle_length,
        average_period_length,
        cycle_length_variation,
        last_cycle_length,
        last_period_length,
        is_irregular,
    }
}

pub(crate) fn mean(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<i64>() as f64 / values.len() as f64
}

pub(crate) fn std_deviation(values: &[i64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let avg = mean(values);
    let variance = values
        .iter()
        .map(|&v| (v as f64 - avg).powi(2))
        .sum::<f64>()
        / (values.len() - 1) as f64;
    variance.sqrt()
}
