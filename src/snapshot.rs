use chrono::{Duration, NaiveDate};

use crate::calendar::{self, phase_for_day, Phase};
use crate::models::{
    CycleConfiguration, CycleStats, CycleStatus, DayView, MonthView, PeriodRecord, Settings, SymptomLikelihood,
    SymptomLogEntry,
};
use crate::prediction::{self, PeriodForecast};
use crate::stats::cycle_stats;
use crate::symptoms;

/// One consistent copy of a user's history. Derived values are recomputed on
/// every call.
#[derive(Debug, Clone, Default)]
pub struct HistorySnapshot {
    /// Sorted by start date, oldest first.
    periods: Vec<PeriodRecord>,
    pub symptoms: Vec<SymptomLogEntry>,
    pub settings: Settings,
}

/// The cycle a given date belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleContext {
    pub start: NaiveDate,
    pub cycle_length: i64,
    pub period_length: i64,
    pub day: i64,
}

impl CycleContext {
    pub fn phase(&self) -> Phase {
        phase_for_day(self.day, self.cycle_length, self.period_length)
    }
}

impl HistorySnapshot {
    /// Stored settings that fail validation (hand-edited or imported
    /// payloads) are replaced by the default cycle configuration.
    pub fn new(mut periods: Vec<PeriodRecord>, symptoms: Vec<SymptomLogEntry>, mut settings: Settings) -> Self {
        periods.sort_by_key(|p| p.start_date);
        if let Err((field, value)) = settings.cycle.validate() {
            tracing::warn!(field, value, "stored cycle configuration out of range, using defaults");
            settings.cycle = CycleConfiguration::default();
        }
        Self {
            periods,
            symptoms,
            settings,
        }
    }

    pub fn periods(&self) -> &[PeriodRecord] {
        &self.periods
    }

    pub fn stats(&self) -> CycleStats {
        cycle_stats(&self.periods, &self.settings.cycle)
    }

    pub fn forecast(&self) -> Option<PeriodForecast> {
        PeriodForecast::from_history(&self.periods, &self.settings.cycle)
    }

    /// Locate `date` within logged history.
    ///
    /// Between two logged starts the real gap is the cycle length. After the
    /// latest start, or before the earliest, cycles repeat with the forecast
    /// length.
    pub fn cycle_context(&self, date: NaiveDate) -> Option<CycleContext> {
        let forecast = self.forecast()?;
        let default_period = self.settings.cycle.period_length;

        let index = self
            .periods
            .iter()
            .rposition(|p| p.start_date <= date)
            .unwrap_or(0);
        let reference = self.periods.get(index)?;

        let (start, cycle_length) = match self.periods.get(index + 1) {
            Some(next) if date >= reference.start_date => {
                (reference.start_date, (next.start_date - reference.start_date).num_days())
            }
            _ => (
                calendar::cycle_start_for(reference.start_date, forecast.cycle_length, date),
                forecast.cycle_length,
            ),
        };

        let period_length = if start == reference.start_date {
            reference.period_length(default_period)
        } else {
            forecast.period_length
        };

        Some(CycleContext {
            start,
            cycle_length,
            period_length,
            day: calendar::day_of_cycle(start, cycle_length, date),
        })
    }

    pub fn cycle_day_on(&self, date: NaiveDate) -> Option<i64> {
        self.cycle_context(date).map(|c| c.day)
    }

    /// Phase on `date`; `None` until a first period is logged.
    pub fn phase_on(&self, date: NaiveDate) -> Option<Phase> {
        self.cycle_context(date).map(|c| c.phase())
    }

    /// Current position in the cycle, for the home screen.
    pub fn status(&self, today: NaiveDate) -> Option<CycleStatus> {
        let forecast = self.forecast()?;
        let context = self.cycle_context(today)?;
        let phase = context.phase();

        Some(CycleStatus {
            cycle_day: context.day,
            phase,
            is_period_day: phase == Phase::Menstrual,
            in_fertile_window: prediction::fertile_window(context.start, context.cycle_length)
                .contains(today),
            next_period_date: forecast.next_period_date(today),
            days_until_next_period: forecast.days_until_next_period(today),
        })
    }

    pub fn likely_symptoms(&self, phase: Phase, limit: usize) -> Vec<SymptomLikelihood> {
        symptoms::likely_symptoms(&self.symptoms, phase, limit)
    }

    pub fn most_common_symptoms(&self, limit: usize) -> Vec<SymptomLikelihood> {
        symptoms::most_common_symptoms(&self.symptoms, limit)
    }

    /// Day-by-day calendar data. `None` for an invalid year/month.
    pub fn month(&self, year: i32, month: u32) -> Option<MonthView> {
        let first_day = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next_month = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }?;

        let forecast = self.forecast();
        let default_period = self.settings.cycle.period_length;
        let show_fertility = self.settings.show_fertility;

        let days = first_day
            .iter_days()
            .take_while(|d| *d < next_month)
            .map(|date| {
                let context = self.cycle_context(date);
                let logged_period = self.periods.iter().any(|p| p.covers(date, default_period));
                let predicted_period = !logged_period
                    && forecast.as_ref().is_some_and(|f| {
                        date >= f.anchor + Duration::days(f.cycle_length)
                            && f.is_predicted_period_day(date)
                    });

                let (fertile, ovulation) = match context {
                    Some(c) if show_fertility => (
                        prediction::fertile_window(c.start, c.cycle_length).contains(date),
                        prediction::ovulation_day(c.start, c.cycle_length) == date,
                    ),
                    _ => (false, false),
                };

                let mut symptoms: Vec<String> = self
                    .symptoms
                    .iter()
                    .filter(|s| s.date == date)
                    .map(|s| s.symptom_id.clone())
                    .collect();
                symptoms.sort();

                DayView {
                    date,
                    cycle_day: context.map(|c| c.day),
                    phase: context.map(|c| c.phase()),
                    logged_period,
                    predicted_period,
                    fertile,
                    ovulation,
                    symptoms,
                }
            })
            .collect();

        Some(MonthView {
            year,
            month,
            days,
            stats: self.stats(),
        })
    }
}
