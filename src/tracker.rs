use chrono::NaiveDate;
use uuid::Uuid;

use crate::models::{
    CycleConfiguration, MonthView, PeriodRecord, Settings, Severity, SymptomLogEntry,
    MAX_CONFIGURED_LENGTH,
};
use crate::snapshot::HistorySnapshot;
use crate::stats::recompute_cycle_lengths;
use crate::store::{RecordStore, StoreError};

#[derive(Debug, thiserror::Error)]
pub enum TrackerError {
    #[error("period start {start} is after today ({today})")]
    StartInFuture { start: NaiveDate, today: NaiveDate },
    #[error("period end {end} is before its start {start}")]
    EndBeforeStart { start: NaiveDate, end: NaiveDate },
    #[error("period start {start} falls inside the previous period ending {previous_end}")]
    OverlapsPreviousPeriod { start: NaiveDate, previous_end: NaiveDate },
    #[error("period end {end} overlaps the next period starting {next_start}")]
    OverlapsNextPeriod { end: NaiveDate, next_start: NaiveDate },
    #[error("a period already starts on {0}")]
    DuplicateStart(NaiveDate),
    #[error("{field} must be positive, got {value}")]
    NonPositiveLength { field: &'static str, value: i64 },
    #[error("{field} must be at most {max} days, got {value}")]
    LengthTooLong { field: &'static str, value: i64, max: i64 },
    #[error("period {0} not found")]
    PeriodNotFound(Uuid),
    #[error("symptom date {date} is after today ({today})")]
    SymptomInFuture { date: NaiveDate, today: NaiveDate },
    #[error("symptom id must not be empty")]
    EmptySymptomId,
    #[error("no period logged yet, cycle phase is unknown")]
    NoCycleHistory,
    #[error("invalid month {year}-{month}")]
    InvalidMonth { year: i32, month: u32 },
    #[error(transparent)]
    Store(#[from] StoreError),
}

pub type TrackerResult<T> = Result<T, TrackerError>;

/// Validates input before it reaches the store and keeps each record's
/// derived `cycle_length` in step with its predecessor.
pub struct Tracker<S> {
    store: S,
}

impl<S: RecordStore> Tracker<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn into_inner(self) -> S {
        self.store
    }

    /// One consistent read of everything the engine needs.
    pub fn snapshot(&self) -> TrackerResult<HistorySnapshot> {
        Ok(HistorySnapshot::new(
            self.store.list_periods()?,
            self.store.list_symptoms()?,
            self.store.settings()?,
        ))
    }

    pub fn log_period_start(&mut self, start: NaiveDate, today: NaiveDate) -> TrackerResult<PeriodRecord> {
        self.log_period(start, None, today)
    }

    /// Log a period, optionally with its end date already known (back-filling
    /// history).
    pub fn log_period(
        &mut self,
        start: NaiveDate,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> TrackerResult<PeriodRecord> {
        if start > today {
            tracing::warn!(%start, %today, "rejected future period start");
            return Err(TrackerError::StartInFuture { start, today });
        }
        let periods = self.store.list_periods()?;
        if periods.iter().any(|p| p.start_date == start) {
            return Err(TrackerError::DuplicateStart(start));
        }
        let previous_end = periods
            .iter()
            .filter(|p| p.start_date < start)
            .max_by_key(|p| p.start_date)
            .and_then(|p| p.end_date);
        if let Some(previous_end) = previous_end.filter(|e| start <= *e) {
            return Err(TrackerError::OverlapsPreviousPeriod { start, previous_end });
        }

        let mut record = PeriodRecord::new(start);
        if let Some(end) = end {
            check_end(&periods, start, end)?;
            record.end_date = Some(end);
        }
        let id = record.id;
        self.store.append_period(record)?;
        self.refresh_cycle_lengths()?;
        tracing::info!(%id, %start, ?end, "logged period");
        self.period(id)
    }

    pub fn end_period(&mut self, id: Uuid, end: NaiveDate) -> TrackerResult<PeriodRecord> {
        let periods = self.store.list_periods()?;
        let mut record = find_period(&periods, id)?.clone();
        check_end(&periods, record.start_date, end)?;

        record.end_date = Some(end);
        self.store.update_period(&record)?;
        tracing::info!(%id, %end, "logged period end");
        Ok(record)
    }

    pub fn set_period_notes(&mut self, id: Uuid, notes: Option<String>) -> TrackerResult<PeriodRecord> {
        let mut record = self.period(id)?;
        record.notes = notes.filter(|n| !n.trim().is_empty());
        self.store.update_period(&record)?;
        Ok(record)
    }

    pub fn delete_period(&mut self, id: Uuid) -> TrackerResult<()> {
        self.period(id)?;
        self.store.delete_period(id)?;
        self.refresh_cycle_lengths()?;
        tracing::info!(%id, "deleted period");
        Ok(())
    }

    /// Record a symptom, capturing the phase `date` falls in right now.
    pub fn log_symptom(
        &mut self,
        date: NaiveDate,
        symptom_id: &str,
        severity: Severity,
        today: NaiveDate,
    ) -> TrackerResult<SymptomLogEntry> {
        if date > today {
            return Err(TrackerError::SymptomInFuture { date, today });
        }
        let symptom_id = symptom_id.trim();
        if symptom_id.is_empty() {
            return Err(TrackerError::EmptySymptomId);
        }
        let phase = self
            .snapshot()?
            .phase_on(date)
            .ok_or(TrackerError::NoCycleHistory)?;

        let entry = SymptomLogEntry {
            date,
            symptom_id: symptom_id.to_string(),
            severity,
            cycle_phase_at_logging: phase,
        };
        self.store.upsert_symptom(entry.clone())?;
        tracing::debug!(%date, symptom_id, ?phase, "logged symptom");
        Ok(entry)
    }

    pub fn remove_symptom(&mut self, date: NaiveDate, symptom_id: &str) -> TrackerResult<()> {
        self.store.delete_symptom(date, symptom_id)?;
        Ok(())
    }

    pub fn settings(&self) -> TrackerResult<Settings> {
        Ok(self.store.settings()?)
    }

    pub fn configure(&mut self, config: CycleConfiguration) -> TrackerResult<()> {
        config.validate().map_err(|(field, value)| {
            if value <= 0 {
                TrackerError::NonPositiveLength { field, value }
            } else {
                TrackerError::LengthTooLong {
                    field,
                    value,
                    max: MAX_CONFIGURED_LENGTH,
                }
            }
        })?;
        let mut settings = self.store.settings()?;
        settings.cycle = config;
        self.store.set_settings(settings)?;
        tracing::info!(
            cycle_length = config.cycle_length,
            period_length = config.period_length,
            "updated cycle configuration"
        );
        Ok(())
    }

    pub fn set_show_fertility(&mut self, enabled: bool) -> TrackerResult<()> {
        let mut settings = self.store.settings()?;
        settings.show_fertility = enabled;
        self.store.set_settings(settings)?;
        Ok(())
    }

    pub fn month(&self, year: i32, month: u32) -> TrackerResult<MonthView> {
        self.snapshot()?
            .month(year, month)
            .ok_or(TrackerError::InvalidMonth { year, month })
    }

    fn period(&self, id: Uuid) -> TrackerResult<PeriodRecord> {
        let periods = self.store.list_periods()?;
        Ok(find_period(&periods, id)?.clone())
    }

    /// Write back every record whose derived cycle length changed.
    fn refresh_cycle_lengths(&mut self) -> TrackerResult<()> {
        let stored = self.store.list_periods()?;
        let mut recomputed = stored.clone();
        recompute_cycle_lengths(&mut recomputed);

        let changed: Vec<PeriodRecord> = recomputed
            .into_iter()
            .filter(|record| {
                stored
                    .iter()
                    .find(|p| p.id == record.id)
                    .is_some_and(|p| p.cycle_length != record.cycle_length)
            })
            .collect();
        if !changed.is_empty() {
            self.store.update_periods(&changed)?;
        }
        Ok(())
    }
}

/// An end date must not precede its start or reach the next logged start.
fn check_end(periods: &[PeriodRecord], start: NaiveDate, end: NaiveDate) -> TrackerResult<()> {
    if end < start {
        return Err(TrackerError::EndBeforeStart { start, end });
    }
    let next_start = periods
        .iter()
        .map(|p| p.start_date)
        .filter(|s| *s > start)
        .min();
    match next_start.filter(|s| end >= *s) {
        Some(next_start) => Err(TrackerError::OverlapsNextPeriod { end, next_start }),
        None => Ok(()),
    }
}

fn find_period(periods: &[PeriodRecord], id: Uuid) -> TrackerResult<&PeriodRecord> {
    periods
        .iter()
        .find(|p| p.id == id)
        .ok_or(TrackerError::PeriodNotFound(id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Phase;
    use crate::store::TrackerData;

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn tracker() -> Tracker<TrackerData> {
        Tracker::new(TrackerData::default())
    }

    fn cycle_lengths(tracker: &Tracker<TrackerData>) -> Vec<Option<i64>> {
        let mut periods = tracker.store().list_periods().unwrap();
        periods.sort_by_key(|p| p.start_date);
        periods.iter().map(|p| p.cycle_length).collect()
    }

    #[test]
    fn inserted_start_is_day_one() {
        let mut tracker = tracker();
        let record = tracker.log_period_start(date("2026-03-01"), date("2026-03-05")).unwrap();
        let snapshot = tracker.snapshot().unwrap();
        assert_eq!(snapshot.cycle_day_on(record.start_date), Some(1));
    }

    #[test]
    fn rejects_future_and_duplicate_starts() {
        let mut tracker = tracker();
        let today = date("2026-03-05");
        assert!(matches!(
            tracker.log_period_start(date("2026-03-06"), today),
            Err(TrackerError::StartInFuture { .. })
        ));
        tracker.log_period_start(date("2026-03-01"), today).unwrap();
        assert!(matches!(
            tracker.log_period_start(date("2026-03-01"), today),
            Err(TrackerError::DuplicateStart(_))
        ));
    }

    #[test]
    fn inserting_earlier_period_recomputes_successor() {
        let mut tracker = tracker();
        let today = date("2026-04-01");
        tracker.log_period_start(date("2026-01-01"), today).unwrap();
        tracker.log_period_start(date("2026-02-26"), today).unwrap();
        assert_eq!(cycle_lengths(&tracker), vec![None, Some(56)]);

        let inserted = tracker.log_period_start(date("2026-01-29"), today).unwrap();
        assert_eq!(inserted.cycle_length, Some(28));
        assert_eq!(cycle_lengths(&tracker), vec![None, Some(28), Some(28)]);

        tracker.delete_period(inserted.id).unwrap();
        assert_eq!(cycle_lengths(&tracker), vec![None, Some(56)]);
    }

    #[test]
    fn deleting_earliest_clears_new_first_cycle_length() {
        let mut tracker = tracker();
        let today = date("2026-04-01");
        let first = tracker.log_period_start(date("2026-01-01"), today).unwrap();
        tracker.log_period_start(date("2026-01-29"), today).unwrap();
        tracker.delete_period(first.id).unwrap();
        assert_eq!(cycle_lengths(&tracker), vec![None]);
    }

    #[test]
    fn end_date_validation() {
        let mut tracker = tracker();
        let today = date("2026-04-01");
        let first = tracker.log_period_start(date("2026-01-01"), today).unwrap();
        tracker.log_period_start(date("2026-01-29"), today).unwrap();

        assert!(matches!(
            tracker.end_period(first.id, date("2025-12-31")),
            Err(TrackerError::EndBeforeStart { .. })
        ));
        assert!(matches!(
            tracker.end_period(first.id, date("2026-01-29")),
            Err(TrackerError::OverlapsNextPeriod { .. })
        ));
        let ended = tracker.end_period(first.id, date("2026-01-01")).unwrap();
        assert_eq!(ended.period_length(5), 1);
        assert!(matches!(
            tracker.end_period(Uuid::new_v4(), date("2026-01-02")),
            Err(TrackerError::PeriodNotFound(_))
        ));
    }

    #[test]
    fn start_inside_previous_period_is_rejected() {
        let mut tracker = tracker();
        let today = date("2026-04-01");
        let first = tracker.log_period_start(date("2026-01-01"), today).unwrap();
        tracker.end_period(first.id, date("2026-01-07")).unwrap();

        assert!(matches!(
            tracker.log_period_start(date("2026-01-04"), today),
            Err(TrackerError::OverlapsPreviousPeriod { previous_end, .. }) if previous_end == date("2026-01-07")
        ));
        assert!(matches!(
            tracker.log_period_start(date("2026-01-07"), today),
            Err(TrackerError::OverlapsPreviousPeriod { .. })
        ));
        assert_eq!(cycle_lengths(&tracker), vec![None]);

        let next = tracker.log_period_start(date("2026-01-08"), today).unwrap();
        assert_eq!(next.cycle_length, Some(7));
    }

    #[test]
    fn backfilled_end_must_stop_before_next_start() {
        let mut tracker = tracker();
        let today = date("2026-04-01");
        tracker.log_period_start(date("2026-01-29"), today).unwrap();

        assert!(matches!(
            tracker.log_period(date("2026-01-25"), Some(date("2026-01-29")), today),
            Err(TrackerError::OverlapsNextPeriod { next_start, .. }) if next_start == date("2026-01-29")
        ));
        assert!(matches!(
            tracker.log_period(date("2026-01-01"), Some(date("2025-12-30")), today),
            Err(TrackerError::EndBeforeStart { .. })
        ));
        assert_eq!(tracker.store().list_periods().unwrap().len(), 1);

        let record = tracker
            .log_period(date("2026-01-01"), Some(date("2026-01-05")), today)
            .unwrap();
        assert_eq!(record.period_length(5), 5);
        assert_eq!(cycle_lengths(&tracker), vec![None, Some(28)]);
    }

    #[test]
    fn notes_are_trimmed_to_none_when_blank() {
        let mut tracker = tracker();
        let record = tracker.log_period_start(date("2026-01-01"), date("2026-01-02")).unwrap();
        let updated = tracker.set_period_notes(record.id, Some("  ".into())).unwrap();
        assert_eq!(updated.notes, None);
        let updated = tracker.set_period_notes(record.id, Some("cramps on day 1".into())).unwrap();
        assert_eq!(updated.notes.as_deref(), Some("cramps on day 1"));
    }

    #[test]
    fn symptom_phase_is_captured_at_logging() {
        let mut tracker = tracker();
        let today = date("2026-03-20");
        assert!(matches!(
            tracker.log_symptom(date("2026-03-02"), "cramps", Severity::Mild, today),
            Err(TrackerError::NoCycleHistory)
        ));

        tracker.log_period_start(date("2026-03-01"), today).unwrap();
        let entry = tracker
            .log_symptom(date("2026-03-02"), " cramps ", Severity::Mild, today)
            .unwrap();
        assert_eq!(entry.symptom_id, "cramps");
        assert_eq!(entry.cycle_phase_at_logging, Phase::Menstrual);

        // a period inserted later does not rewrite the stored phase
        tracker.log_period_start(date("2026-02-20"), today).unwrap();
        let stored = tracker.store().list_symptoms().unwrap();
        assert_eq!(stored[0].cycle_phase_at_logging, Phase::Menstrual);

        assert!(matches!(
            tracker.log_symptom(date("2026-03-21"), "cramps", Severity::Mild, today),
            Err(TrackerError::SymptomInFuture { .. })
        ));
        assert!(matches!(
            tracker.log_symptom(date("2026-03-02"), "  ", Severity::Mild, today),
            Err(TrackerError::EmptySymptomId)
        ));
    }

    #[test]
    fn configuration_must_be_positive_but_may_be_atypical() {
        let mut tracker = tracker();
        assert!(matches!(
            tracker.configure(CycleConfiguration {
                cycle_length: 0,
                period_length: 5
            }),
            Err(TrackerError::NonPositiveLength { field: "cycle_length", .. })
        ));
        tracker
            .configure(CycleConfiguration {
                cycle_length: 45,
                period_length: 8,
            })
            .unwrap();
        assert_eq!(tracker.settings().unwrap().cycle.cycle_length, 45);
    }

    #[test]
    fn huge_cycle_length_is_rejected_and_status_still_works() {
        let mut tracker = tracker();
        let today = date("2026-03-10");
        assert!(matches!(
            tracker.configure(CycleConfiguration {
                cycle_length: 1_000_000_000_000_000,
                period_length: 5
            }),
            Err(TrackerError::LengthTooLong { field: "cycle_length", max: 365, .. })
        ));
        assert!(matches!(
            tracker.configure(CycleConfiguration {
                cycle_length: 28,
                period_length: 366
            }),
            Err(TrackerError::LengthTooLong { field: "period_length", .. })
        ));

        tracker.log_period_start(date("2026-03-01"), today).unwrap();
        let status = tracker.snapshot().unwrap().status(today).unwrap();
        assert_eq!(status.next_period_date, date("2026-03-29"));
    }

    #[test]
    fn month_rejects_invalid_month() {
        let tracker = tracker();
        assert!(matches!(tracker.month(2026, 0), Err(TrackerError::InvalidMonth { .. })));
        assert_eq!(tracker.month(2026, 2).unwrap().days.len(), 28);
    }
}
