//! Demo data generation.
//!
//! Builds a fully-populated state from a fixed template catalog and a
//! seeded RNG, so demos and screenshots are reproducible: the same seed
//! always yields the same people, prescriptions and adherence history.

use crate::state::PersistedState;
use crate::types::timefmt;
use crate::{
    DoseKey, Frequency, Medication, MedicationDose, MedicationKind, Profile,
};
use chrono::{Duration, NaiveDate, NaiveTime, Utc};
use once_cell::sync::Lazy;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use uuid::Uuid;

/// How much dose history the demo state carries
const HISTORY_DAYS: u32 = 30;

struct MedicationTemplate {
    name: &'static str,
    dosage: &'static str,
    kind: MedicationKind,
    times: &'static [&'static str],
    doctor: &'static str,
    pharmacy: &'static str,
    color: &'static str,
    side_effects: &'static [&'static str],
    /// Probability that any single scheduled dose was taken
    adherence: f64,
}

/// Cached demo prescriptions, split between the two demo profiles
static TEMPLATES: Lazy<Vec<MedicationTemplate>> = Lazy::new(|| {
    vec![
        MedicationTemplate {
            name: "Lisinopril",
            dosage: "10mg",
            kind: MedicationKind::Pill,
            times: &["08:00"],
            doctor: "Dr. Sarah Chen",
            pharmacy: "CVS Pharmacy",
            color: "#4A90D9",
            side_effects: &["Dizziness", "Dry cough"],
            adherence: 0.92,
        },
        MedicationTemplate {
            name: "Metformin",
            dosage: "500mg",
            kind: MedicationKind::Pill,
            times: &["08:00", "20:00"],
            doctor: "Dr. Sarah Chen",
            pharmacy: "CVS Pharmacy",
            color: "#E8544A",
            side_effects: &["Nausea", "Stomach upset"],
            adherence: 0.85,
        },
        MedicationTemplate {
            name: "Atorvastatin",
            dosage: "20mg",
            kind: MedicationKind::Pill,
            times: &["21:00"],
            doctor: "Dr. Miguel Reyes",
            pharmacy: "Walgreens",
            color: "#F5A623",
            side_effects: &["Muscle aches"],
            adherence: 0.78,
        },
        MedicationTemplate {
            name: "Insulin glargine",
            dosage: "20 units",
            kind: MedicationKind::Injection,
            times: &["22:00"],
            doctor: "Dr. Sarah Chen",
            pharmacy: "CVS Pharmacy",
            color: "#7B5EA7",
            side_effects: &[],
            adherence: 0.97,
        },
        MedicationTemplate {
            name: "Fluticasone",
            dosage: "50mcg spray",
            kind: MedicationKind::Liquid,
            times: &["07:30", "19:30"],
            doctor: "Dr. Miguel Reyes",
            pharmacy: "Walgreens",
            color: "#3FA65C",
            side_effects: &["Nosebleed"],
            adherence: 0.70,
        },
    ]
});

fn demo_profiles() -> Vec<Profile> {
    let now = Utc::now();
    vec![
        Profile {
            id: Uuid::new_v4(),
            name: "Eleanor Vance".into(),
            relationship: "Self".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1952, 6, 14),
            emergency_contact: Some("Theo Vance, 555-0134".into()),
            allergies: vec!["Penicillin".into()],
            medical_conditions: vec!["Type 2 diabetes".into(), "Hypertension".into()],
            preferred_pharmacy: Some("CVS Pharmacy".into()),
            doctor: Some("Dr. Sarah Chen".into()),
            created_at: now,
        },
        Profile {
            id: Uuid::new_v4(),
            name: "Theo Vance".into(),
            relationship: "Spouse".into(),
            date_of_birth: NaiveDate::from_ymd_opt(1950, 2, 3),
            emergency_contact: Some("Eleanor Vance, 555-0177".into()),
            allergies: vec![],
            medical_conditions: vec!["High cholesterol".into()],
            preferred_pharmacy: Some("Walgreens".into()),
            doctor: Some("Dr. Miguel Reyes".into()),
            created_at: now,
        },
    ]
}

fn build_medication(template: &MedicationTemplate, profile_id: Uuid, today: NaiveDate) -> Medication {
    let now = Utc::now();
    let times: Vec<NaiveTime> = template
        .times
        .iter()
        .filter_map(|t| timefmt::parse_clock(t))
        .collect();
    Medication {
        id: Uuid::new_v4(),
        profile_id,
        name: template.name.into(),
        dosage: template.dosage.into(),
        kind: template.kind,
        frequency: Frequency::Daily,
        times,
        start_date: today - Duration::days(i64::from(HISTORY_DAYS)),
        refill_date: Some(today + Duration::days(12)),
        quantity: 60,
        doctor: template.doctor.into(),
        pharmacy: template.pharmacy.into(),
        prescription_number: None,
        color: Some(template.color.into()),
        notes: None,
        side_effects: template.side_effects.iter().map(|s| s.to_string()).collect(),
        effectiveness: None,
        is_active: true,
        created_at: now,
        updated_at: now,
    }
}

/// Generate a reproducible demo state: two profiles, the template
/// prescriptions, and `HISTORY_DAYS` of dose history ending yesterday.
/// The same `seed` and `today` always produce the same adherence pattern.
pub fn demo_state(seed: u64, today: NaiveDate) -> PersistedState {
    let mut rng = StdRng::seed_from_u64(seed);
    let profiles = demo_profiles();

    // First three prescriptions belong to the owner, the rest to the spouse
    let mut medications = Vec::new();
    for (i, template) in TEMPLATES.iter().enumerate() {
        let profile = if i < 3 { &profiles[0] } else { &profiles[1] };
        medications.push(build_medication(template, profile.id, today));
    }

    let mut doses = Vec::new();
    for (med, template) in medications.iter().zip(TEMPLATES.iter()) {
        for offset in 1..=HISTORY_DAYS {
            let date = today - Duration::days(i64::from(offset));
            for &time in &med.times {
                let mut dose = MedicationDose::untaken(DoseKey {
                    medication_id: med.id,
                    time,
                    date,
                });
                if rng.gen_bool(template.adherence) {
                    dose.taken = true;
                    // Taken within half an hour of schedule
                    let slip = rng.gen_range(0..30);
                    dose.taken_time = Some(time + Duration::minutes(slip));
                    if rng.gen_bool(0.4) {
                        dose.effectiveness = Some(rng.gen_range(3..=5));
                    }
                    if !template.side_effects.is_empty() && rng.gen_bool(0.15) {
                        let pick = rng.gen_range(0..template.side_effects.len());
                        dose.side_effects = vec![template.side_effects[pick].into()];
                    }
                }
                doses.push(dose);
            }
        }
    }

    let mut state = PersistedState {
        medications,
        doses,
        current_profile: Some(profiles[0].clone()),
        profiles,
        app_settings: Default::default(),
    };
    state.resolve_current_profile();
    state
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 3, 15).unwrap()
    }

    #[test]
    fn test_demo_state_shape() {
        let state = demo_state(7, today());

        assert_eq!(state.profiles.len(), 2);
        assert_eq!(state.medications.len(), TEMPLATES.len());
        assert_eq!(state.current_profile_id(), Some(state.profiles[0].id));

        // Every dose belongs to a known medication and predates today
        for dose in &state.doses {
            assert!(state.medications.iter().any(|m| m.id == dose.medication_id));
            assert!(dose.date < today());
        }
    }

    #[test]
    fn test_same_seed_same_history() {
        let a = demo_state(42, today());
        let b = demo_state(42, today());

        let pattern = |s: &PersistedState| -> Vec<bool> { s.doses.iter().map(|d| d.taken).collect() };
        assert_eq!(pattern(&a), pattern(&b));
    }

    #[test]
    fn test_different_seeds_diverge() {
        let a = demo_state(1, today());
        let b = demo_state(2, today());

        // ~200 weighted coin flips; identical patterns would mean a broken RNG
        let pattern_a: Vec<bool> = a.doses.iter().map(|d| d.taken).collect();
        let pattern_b: Vec<bool> = b.doses.iter().map(|d| d.taken).collect();
        assert_ne!(pattern_a, pattern_b);
    }

    #[test]
    fn test_demo_state_loads_into_store() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = crate::testutil::store_in(&dir);
        store.replace_state(demo_state(7, today())).unwrap();

        assert_eq!(store.profiles().len(), 2);
        assert!(!store.profile_medications().is_empty());
        assert!(!store.profile_doses().is_empty());
    }
}
