use std::fs;
use std::path::{Path, PathBuf};

use chrono::NaiveDate;
use uuid::Uuid;
use zeroize::Zeroizing;

use crate::crypto::{self, KdfParams};
use crate::models::{PeriodRecord, Settings, SymptomLogEntry};
use crate::store::{RecordStore, StoreError, StoreResult, TrackerData};

const APP_DIR: &str = "cykel";
const DATA_FILE: &str = "data.cykel";

/// Default location of the vault file under the platform's local data dir.
pub fn default_path() -> Result<PathBuf, StoreError> {
    let dir = dirs::data_local_dir()
        .ok_or(StoreError::NoDataDir)?
        .join(APP_DIR);
    Ok(dir.join(DATA_FILE))
}

/// An unlocked vault. Every mutation is written through to disk before it
/// returns. Dropping the vault wipes the passphrase from memory.
pub struct Vault {
    path: PathBuf,
    passphrase: Zeroizing<String>,
    kdf: KdfParams,
    data: TrackerData,
}

impl Vault {
    pub fn exists(path: &Path) -> bool {
        path.exists()
    }

    /// Create a fresh, empty vault at `path`, overwriting anything there.
    pub fn create(path: impl Into<PathBuf>, passphrase: &str, kdf: KdfParams) -> StoreResult<Self> {
        let vault = Self {
            path: path.into(),
            passphrase: Zeroizing::new(passphrase.to_string()),
            kdf,
            data: TrackerData::default(),
        };
        vault.save(&vault.data)?;
        tracing::info!(path = %vault.path.display(), "created vault");
        Ok(vault)
    }

    /// Unlock an existing vault. A wrong passphrase surfaces as
    /// [`StoreError::Crypto`].
    pub fn open(path: impl Into<PathBuf>, passphrase: &str, kdf: KdfParams) -> StoreResult<Self> {
        let path = path.into();
        let sealed = fs::read(&path)?;
        let plaintext = crypto::open(passphrase, &sealed).inspect_err(|e| {
            tracing::warn!(path = %path.display(), error = %e, "failed to unlock vault");
        })?;
        let data: TrackerData = serde_json::from_slice(&plaintext)?;
        tracing::info!(
            path = %path.display(),
            periods = data.periods.len(),
            symptoms = data.symptoms.len(),
            "unlocked vault"
        );
        Ok(Self {
            path,
            passphrase: Zeroizing::new(passphrase.to_string()),
            kdf,
            data,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Plain JSON of everything stored, for user export.
    pub fn export_json(&self) -> StoreResult<String> {
        Ok(serde_json::to_string_pretty(&self.data)?)
    }

    /// Delete the vault file permanently and drop the decrypted data.
    pub fn wipe(self) -> StoreResult<()> {
        if self.path.exists() {
            fs::remove_file(&self.path)?;
        }
        tracing::info!(path = %self.path.display(), "wiped vault");
        Ok(())
    }

    /// Re-encrypt under a new passphrase.
    pub fn change_passphrase(&mut self, new_passphrase: &str) -> StoreResult<()> {
        let passphrase = Zeroizing::new(new_passphrase.to_string());
        seal_to(&self.path, &passphrase, self.kdf, &self.data)?;
        self.passphrase = passphrase;
        Ok(())
    }

    fn save(&self, data: &TrackerData) -> StoreResult<()> {
        seal_to(&self.path, &self.passphrase, self.kdf, data)
    }

    /// Changes are applied to a copy; memory only moves forward once the copy
    /// is on disk.
    fn mutate<T>(&mut self, f: impl FnOnce(&mut TrackerData) -> StoreResult<T>) -> StoreResult<T> {
        let mut next = self.data.clone();
        let out = f(&mut next)?;
        self.save(&next).inspect_err(|e| {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write vault");
        })?;
        self.data = next;
        Ok(out)
    }
}

fn seal_to(path: &Path, passphrase: &str, kdf: KdfParams, data: &TrackerData) -> StoreResult<()> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let json = Zeroizing::new(serde_json::to_vec(data)?);
    let sealed = crypto::seal(passphrase, &json, kdf)?;

    // write-then-rename so a crash never leaves a half-written vault
    let tmp = path.with_extension("tmp");
    fs::write(&tmp, sealed)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

impl RecordStore for Vault {
    fn list_periods(&self) -> StoreResult<Vec<PeriodRecord>> {
        self.data.list_periods()
    }

    fn append_period(&mut self, record: PeriodRecord) -> StoreResult<()> {
        self.mutate(|d| d.append_period(record))
    }

    fn update_period(&mut self, record: &PeriodRecord) -> StoreResult<()> {
        self.mutate(|d| d.update_period(record))
    }

    fn update_periods(&mut self, records: &[PeriodRecord]) -> StoreResult<()> {
        self.mutate(|d| d.update_periods(records))
    }

    fn delete_period(&mut self, id: Uuid) -> StoreResult<()> {
        self.mutate(|d| d.delete_period(id))
    }

    fn list_symptoms(&self) -> StoreResult<Vec<SymptomLogEntry>> {
        self.data.list_symptoms()
    }

    fn upsert_symptom(&mut self, entry: SymptomLogEntry) -> StoreResult<()> {
        self.mutate(|d| d.upsert_symptom(entry))
    }

    fn delete_symptom(&mut self, date: NaiveDate, symptom_id: &str) -> StoreResult<()> {
        self.mutate(|d| d.delete_symptom(date, symptom_id))
    }

    fn settings(&self) -> StoreResult<Settings> {
        self.data.settings()
    }

    fn set_settings(&mut self, settings: Settings) -> StoreResult<()> {
        self.mutate(|d| d.set_settings(settings))
    }
}
