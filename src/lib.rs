pub mod calendar;
pub mod crypto;
pub mod models;
pub mod prediction;
pub mod snapshot;
pub mod stats;
pub mod store;
pub mod symptoms;
pub mod tracker;
pub mod vault;

pub use calendar::{day_of_cycle, phase_for_day, Phase};
pub use models::*;
pub use prediction::PeriodForecast;
pub use snapshot::HistorySnapshot;
pub use stats::cycle_stats;
pub use store::{RecordStore, StoreError, TrackerData};
pub use tracker::{Tracker, TrackerError};
pub use vault::Vault;
