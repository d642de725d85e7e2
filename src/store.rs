use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::crypto;
use crate::models::{PeriodRecord, Settings, SymptomLogEntry};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("crypto error: {0}")]
    Crypto(#[from] crypto::CryptoError),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("data directory not found")]
    NoDataDir,
    #[error("not found: {0}")]
    NotFound(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for period records, symptom entries and settings.
///
/// Listing order is unspecified; the engine sorts what it needs.
pub trait RecordStore {
    fn list_periods(&self) -> StoreResult<Vec<PeriodRecord>>;
    fn append_period(&mut self, record: PeriodRecord) -> StoreResult<()>;
    /// Replace the stored record with the same id.
    fn update_period(&mut self, record: &PeriodRecord) -> StoreResult<()>;
    /// Replace several records at once. Stores that persist on every write
    /// should override this so the batch lands in one write or not at all.
    fn update_periods(&mut self, records: &[PeriodRecord]) -> StoreResult<()> {
        records.iter().try_for_each(|r| self.update_period(r))
    }
    fn delete_period(&mut self, id: Uuid) -> StoreResult<()>;

    fn list_symptoms(&self) -> StoreResult<Vec<SymptomLogEntry>>;
    /// Insert, or replace the entry with the same `(date, symptom_id)`.
    fn upsert_symptom(&mut self, entry: SymptomLogEntry) -> StoreResult<()>;
    fn delete_symptom(&mut self, date: NaiveDate, symptom_id: &str) -> StoreResult<()>;

    fn settings(&self) -> StoreResult<Settings>;
    fn set_settings(&mut self, settings: Settings) -> StoreResult<()>;
}

/// Everything one user has logged. Also the plaintext payload of a vault.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct TrackerData {
    #[serde(default)]
    pub periods: Vec<PeriodRecord>,
    #[serde(default)]
    pub symptoms: Vec<SymptomLogEntry>,
    #[serde(default)]
    pub settings: Settings,
}

impl RecordStore for TrackerData {
    fn list_periods(&self) -> StoreResult<Vec<PeriodRecord>> {
        Ok(self.periods.clone())
    }

    fn append_period(&mut self, record: PeriodRecord) -> StoreResult<()> {
        self.periods.push(record);
        Ok(())
    }

    fn update_period(&mut self, record: &PeriodRecord) -> StoreResult<()> {
        let existing = self
            .periods
            .iter_mut()
            .find(|p| p.id == record.id)
            .ok_or_else(|| StoreError::NotFound(format!("period {}", record.id)))?;
        *existing = record.clone();
        Ok(())
    }

    fn delete_period(&mut self, id: Uuid) -> StoreResult<()> {
        let before = self.periods.len();
        self.periods.retain(|p| p.id != id);
        if self.periods.len() == before {
            return Err(StoreError::NotFound(format!("period {id}")));
        }
        Ok(())
    }

    fn list_symptoms(&self) -> StoreResult<Vec<SymptomLogEntry>> {
        Ok(self.symptoms.clone())
    }

    fn upsert_symptom(&mut self, entry: SymptomLogEntry) -> StoreResult<()> {
        if let Some(existing) = self
            .symptoms
            .iter_mut()
            .find(|s| s.date == entry.date && s.symptom_id == entry.symptom_id)
        {
            *existing = entry;
        } else {
            self.symptoms.push(entry);
        }
        Ok(())
    }

    fn delete_symptom(&mut self, date: NaiveDate, symptom_id: &str) -> StoreResult<()> {
        let before = self.symptoms.len();
        self.symptoms
            .retain(|s| !(s.date == date && s.symptom_id == symptom_id));
        if self.symptoms.len() == before {
            return Err(StoreError::NotFound(format!("symptom {symptom_id} on {date}")));
        }
        Ok(())
    }

    fn settings(&self) -> StoreResult<Settings> {
        Ok(self.settings.clone())
    }

    fn set_settings(&mut self, settings: Settings) -> StoreResult<()> {
        self.settings = settings;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calendar::Phase;
    use crate::models::Severity;

    fn make_symptom(date: &str, symptom: &str, severity: Severity) -> SymptomLogEntry {
        SymptomLogEntry {
            date: NaiveDate::parse_from_str(date, "%Y-%m-%d").unwrap(),
            symptom_id: symptom.to_string(),
            severity,
            cycle_phase_at_logging: Phase::Luteal,
        }
    }

    #[test]
    fn upsert_replaces_same_day_symptom() {
        let mut data = TrackerData::default();
        data.upsert_symptom(make_symptom("2026-03-01", "cramps", Severity::Mild)).unwrap();
        data.upsert_symptom(make_symptom("2026-03-01", "cramps", Severity::Severe)).unwrap();
        data.upsert_symptom(make_symptom("2026-03-02", "cramps", Severity::Mild)).unwrap();

        let symptoms = data.list_symptoms().unwrap();
        assert_eq!(symptoms.len(), 2);
        assert_eq!(symptoms[0].severity, Severity::Severe);
    }

    #[test]
    fn deleting_missing_records_reports_not_found() {
        let mut data = TrackerData::default();
        assert!(matches!(data.delete_period(Uuid::new_v4()), Err(StoreError::NotFound(_))));
        let date = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        assert!(matches!(data.delete_symptom(date, "cramps"), Err(StoreError::NotFound(_))));
    }

    #[test]
    fn update_replaces_by_id() {
        let mut data = TrackerData::default();
        let mut record = PeriodRecord::new(NaiveDate::from_ymd_opt(2026, 3, 1).unwrap());
        data.append_period(record.clone()).unwrap();

        record.notes = Some("heavy first day".into());
        data.update_period(&record).unwrap();
        assert_eq!(data.list_periods().unwrap()[0].notes.as_deref(), Some("heavy first day"));

        let stranger = PeriodRecord::new(NaiveDate::from_ymd_opt(2026, 4, 1).unwrap());
        assert!(data.update_period(&stranger).is_err());
    }

    #[test]
    fn settings_default_when_missing_from_payload() {
        let data: TrackerData = serde_json::from_str(r#"{"periods": []}"#).unwrap();
        assert_eq!(data.settings, Settings::default());
        assert_eq!(data.settings.cycle.cycle_length, 28);
    }
}
