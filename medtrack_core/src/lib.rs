#![forbid(unsafe_code)]

//! Core domain model and business logic for the Medtrack system.
//!
//! This crate provides:
//! - Domain types (medications, dose records, profiles, settings)
//! - The medication store (CRUD plus persistence)
//! - Daily dose generation and schedule classification
//! - Adherence analytics and clinician reports
//! - Refill projection, reminders, search, backup import/export

pub mod types;
pub mod error;
pub mod config;
pub mod logging;
pub mod state;
pub mod store;
pub mod schedule;
pub mod analytics;
pub mod filter;
pub mod backup;
pub mod report;
pub mod refill;
pub mod reminder;
pub mod seed;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use config::Config;
pub use state::PersistedState;
pub use store::MedicationStore;
pub use schedule::{dose_status, DaySummary, DoseStatus};
pub use analytics::compute_analytics;
pub use filter::filter_and_sort;
pub use backup::{parse_import, ExportDocument};
pub use report::{ClinicianReport, MedicationSummary, NoteEntry};
pub use refill::{project_refill, RefillProjection};
pub use reminder::{Reminder, ReminderKind};
pub use seed::demo_state;

#[cfg(test)]
pub(crate) mod testutil {
    use crate::{Frequency, MedicationKind, MedicationStore, NewMedication};
    use chrono::NaiveDate;
    use uuid::Uuid;

    /// Open a store backed by `store.json` inside a test directory
    pub fn store_in(dir: &tempfile::TempDir) -> MedicationStore {
        MedicationStore::open(dir.path().join("store.json")).unwrap()
    }

    /// A plain daily pill scheduled at the given `"HH:MM"` times
    pub fn sample_medication(profile_id: Uuid, name: &str, times: &[&str]) -> NewMedication {
        NewMedication {
            profile_id,
            name: name.into(),
            dosage: "10mg".into(),
            kind: MedicationKind::Pill,
            frequency: Frequency::Daily,
            times: times
                .iter()
                .map(|t| crate::types::timefmt::parse_clock(t).unwrap())
                .collect(),
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            refill_date: None,
            quantity: 30,
            doctor: "Dr. Chen".into(),
            pharmacy: "CVS".into(),
            prescription_number: None,
            color: None,
            notes: None,
            side_effects: Vec::new(),
            effectiveness: None,
        }
    }
}
