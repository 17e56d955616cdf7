//! Refill tracking: projects how long the on-hand supply lasts and which
//! prescriptions need pharmacy attention.
//!
//! Projection assumes every scheduled time consumes one unit per day; it
//! does not net out missed doses.

use crate::{Medication, MedicationStore};
use chrono::{Duration, NaiveDate};
use serde::Serialize;
use uuid::Uuid;

/// Supply runs low at or below this many days
const LOW_STOCK_DAYS: u32 = 7;
/// A refill date this close counts as due soon
const REFILL_SOON_DAYS: i64 = 7;
/// Pharmacies accept refill requests this far ahead
const REFILLABLE_DAYS: i64 = 14;

/// Supply outlook for one medication
#[derive(Clone, Debug, Serialize)]
pub struct RefillProjection {
    pub medication_id: Uuid,
    pub name: String,
    pub quantity: u32,
    /// Units consumed per day, from the schedule
    pub daily_doses: u32,
    /// Whole days the remaining supply covers
    pub days_of_stock: u32,
    pub runs_out_on: NaiveDate,
    pub low_stock: bool,
    pub refill_date: Option<NaiveDate>,
    /// Refill date within a week of today
    pub refill_due_soon: bool,
    /// Close enough to the refill date to request one now
    pub refillable: bool,
}

/// Project supply for one medication. Returns `None` for medications with
/// no scheduled times; consumption cannot be projected for as-needed use.
pub fn project_refill(med: &Medication, today: NaiveDate) -> Option<RefillProjection> {
    let daily_doses = med.times.len() as u32;
    if daily_doses == 0 {
        return None;
    }

    let days_of_stock = med.quantity / daily_doses;
    let days_to_refill = med.refill_date.map(|d| (d - today).num_days());

    Some(RefillProjection {
        medication_id: med.id,
        name: med.name.clone(),
        quantity: med.quantity,
        daily_doses,
        days_of_stock,
        runs_out_on: today + Duration::days(i64::from(days_of_stock)),
        low_stock: days_of_stock <= LOW_STOCK_DAYS,
        refill_date: med.refill_date,
        refill_due_soon: days_to_refill.is_some_and(|d| d <= REFILL_SOON_DAYS),
        refillable: days_to_refill.is_some_and(|d| d <= REFILLABLE_DAYS),
    })
}

impl MedicationStore {
    /// Supply outlook for the current profile's active medications,
    /// tightest supply first.
    pub fn refill_projections(&self, today: NaiveDate) -> Vec<RefillProjection> {
        let mut projections: Vec<RefillProjection> = self
            .profile_medications()
            .iter()
            .filter(|m| m.is_active)
            .filter_map(|m| project_refill(m, today))
            .collect();
        projections.sort_by_key(|p| p.days_of_stock);
        projections
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_medication, store_in};
    use crate::MedicationPatch;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, d).unwrap()
    }

    #[test]
    fn test_days_of_stock_divides_by_schedule() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        let id = store
            .add_medication(sample_medication(profile_id, "Metformin", &["08:00", "20:00"]))
            .unwrap();
        store
            .update_medication(
                id,
                MedicationPatch {
                    quantity: Some(30),
                    ..Default::default()
                },
            )
            .unwrap();

        let projection = project_refill(store.medication(id).unwrap(), day(1)).unwrap();
        assert_eq!(projection.daily_doses, 2);
        assert_eq!(projection.days_of_stock, 15);
        assert_eq!(projection.runs_out_on, day(16));
        assert!(!projection.low_stock);
    }

    #[test]
    fn test_low_stock_threshold() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        let id = store
            .add_medication(sample_medication(profile_id, "Lisinopril", &["08:00"]))
            .unwrap();
        store
            .update_medication(
                id,
                MedicationPatch {
                    quantity: Some(7),
                    ..Default::default()
                },
            )
            .unwrap();

        let projection = project_refill(store.medication(id).unwrap(), day(1)).unwrap();
        assert_eq!(projection.days_of_stock, 7);
        assert!(projection.low_stock);
    }

    #[test]
    fn test_refill_date_windows() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        let id = store
            .add_medication(sample_medication(profile_id, "Atorvastatin", &["21:00"]))
            .unwrap();

        store
            .update_medication(
                id,
                MedicationPatch {
                    refill_date: Some(day(20)),
                    ..Default::default()
                },
            )
            .unwrap();

        // 19 days out: neither
        let far = project_refill(store.medication(id).unwrap(), day(1)).unwrap();
        assert!(!far.refillable);
        assert!(!far.refill_due_soon);

        // 10 days out: refillable but not urgent
        let near = project_refill(store.medication(id).unwrap(), day(10)).unwrap();
        assert!(near.refillable);
        assert!(!near.refill_due_soon);

        // 5 days out: both
        let soon = project_refill(store.medication(id).unwrap(), day(15)).unwrap();
        assert!(soon.refillable);
        assert!(soon.refill_due_soon);
    }

    #[test]
    fn test_as_needed_medication_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        let mut new = sample_medication(profile_id, "Ibuprofen", &[]);
        new.frequency = crate::Frequency::AsNeeded;
        store.add_medication(new).unwrap();

        assert!(store.refill_projections(day(1)).is_empty());
    }

    #[test]
    fn test_projections_sorted_by_tightest_supply() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        let plenty = store
            .add_medication(sample_medication(profile_id, "Plenty", &["08:00"]))
            .unwrap();
        let scarce = store
            .add_medication(sample_medication(profile_id, "Scarce", &["08:00"]))
            .unwrap();
        store
            .update_medication(
                plenty,
                MedicationPatch {
                    quantity: Some(90),
                    ..Default::default()
                },
            )
            .unwrap();
        store
            .update_medication(
                scarce,
                MedicationPatch {
                    quantity: Some(3),
                    ..Default::default()
                },
            )
            .unwrap();

        let projections = store.refill_projections(day(1));
        assert_eq!(projections[0].name, "Scarce");
        assert_eq!(projections[1].name, "Plenty");
    }
}
