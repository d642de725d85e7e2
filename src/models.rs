use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::calendar::Phase;

pub const DEFAULT_CYCLE_LENGTH: i64 = 28;
pub const DEFAULT_PERIOD_LENGTH: i64 = 5;
/// Upper bound for configured lengths. Keeps every derived date in range.
pub const MAX_CONFIGURED_LENGTH: i64 = 365;

/// One logged menstrual period.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PeriodRecord {
    pub id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    /// Days since the previous record's start. `None` for the earliest record.
    #[serde(default)]
    pub cycle_length: Option<i64>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl PeriodRecord {
    pub fn new(start_date: NaiveDate) -> Self {
        Self {
            id: Uuid::new_v4(),
            start_date,
            end_date: None,
            cycle_length: None,
            notes: None,
        }
    }

    /// Length of this period in days, falling back to the configured typical
    /// length while the end date is unknown.
    pub fn period_length(&self, default_length: i64) -> i64 {
        match self.end_date {
            Some(end) => (end - self.start_date).num_days() + 1,
            None => default_length,
        }
    }

    /// Whether `date` falls inside the logged (or assumed) bleeding days.
    pub fn covers(&self, date: NaiveDate, default_length: i64) -> bool {
        let last = self.start_date + chrono::Duration::days(self.period_length(default_length) - 1);
        date >= self.start_date && date <= last
    }
}

/// User-level defaults used whenever history is too thin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct CycleConfiguration {
    pub cycle_length: i64,
    pub period_length: i64,
}

impl Default for CycleConfiguration {
    fn default() -> Self {
        Self {
            cycle_length: DEFAULT_CYCLE_LENGTH,
            period_length: DEFAULT_PERIOD_LENGTH,
        }
    }
}

impl CycleConfiguration {
    /// Lengths must be in `1..=MAX_CONFIGURED_LENGTH`. Lengths outside the
    /// typical 21-35 range are accepted and surface as irregularity in the
    /// statistics instead.
    pub fn validate(&self) -> Result<(), (&'static str, i64)> {
        for (field, value) in [
            ("cycle_length", self.cycle_length),
            ("period_length", self.period_length),
        ] {
            if !(1..=MAX_CONFIGURED_LENGTH).contains(&value) {
                return Err((field, value));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Settings {
    #[serde(default)]
    pub cycle: CycleConfiguration,
    #[serde(default)]
    pub show_fertility: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Mild,
    Moderate,
    Severe,
}

/// One symptom observed on one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomLogEntry {
    pub date: NaiveDate,
    pub symptom_id: String,
    pub severity: Severity,
    /// Phase at the moment of logging; never recomputed afterwards.
    pub cycle_phase_at_logging: Phase,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LengthRange {
    pub min: i64,
    pub max: i64,
}

impl LengthRange {
    pub fn spread(&self) -> i64 {
        self.max - self.min
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStats {
    pub total_cycles_tracked: usize,
    pub average_cycle_length: f64,
    pub average_period_length: f64,
    pub cycle_length_variation: LengthRange,
    pub last_cycle_length: Option<i64>,
    pub last_period_length: i64,
    pub is_irregular: bool,
}

impl CycleStats {
    /// Below two tracked cycles consumers show "not enough data yet".
    pub fn has_enough_data(&self) -> bool {
        self.total_cycles_tracked >= 2
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct FertileWindow {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl FertileWindow {
    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// A projected future cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PredictedCycle {
    pub period_start: NaiveDate,
    pub period_end: NaiveDate,
    pub ovulation_day: NaiveDate,
    pub fertile_window: FertileWindow,
}

/// Where "today" sits in the cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct CycleStatus {
    pub cycle_day: i64,
    pub phase: Phase,
    pub is_period_day: bool,
    pub in_fertile_window: bool,
    pub next_period_date: NaiveDate,
    pub days_until_next_period: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SymptomLikelihood {
    pub symptom_id: String,
    pub occurrences: usize,
    /// Percentage in `[0, 100]`.
    pub likelihood: f64,
    pub last_seen: NaiveDate,
    pub worst_severity: Severity,
}

/// Everything a month calendar needs for one day.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DayView {
    pub date: NaiveDate,
    pub cycle_day: Option<i64>,
    pub phase: Option<Phase>,
    pub logged_period: bool,
    pub predicted_period: bool,
    pub fertile: bool,
    pub ovulation: bool,
    pub symptoms: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonthView {
    pub year: i32,
    pub month: u32,
    pub days: Vec<DayView>,
    pub stats: CycleStats,
}
