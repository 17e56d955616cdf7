//! The medication store: single source of truth for medications, dose
//! records, profiles and settings.
//!
//! The store is an explicit object with a load/save lifecycle: it is opened
//! from a persisted snapshot and every mutating operation rewrites the whole
//! document before returning. Dose records are indexed by their natural key
//! (medication, scheduled time, date) for O(1) existence checks.

use crate::state::PersistedState;
use crate::{
    Error, Medication, MedicationDose, MedicationPatch, NewMedication, NewProfile, Profile,
    ProfilePatch, Result, SettingsPatch, TakenDetails,
};
use chrono::{NaiveDateTime, NaiveTime, Utc};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use uuid::Uuid;

/// Owner of all domain collections. UI layers never mutate state directly,
/// only through this operation surface.
pub struct MedicationStore {
    path: PathBuf,
    state: PersistedState,
    /// Rendered natural key -> position in `state.doses`
    dose_index: HashMap<String, usize>,
}

impl MedicationStore {
    /// Open the store at `path`, creating a fresh state (with a default
    /// profile) if no document exists yet.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let state = PersistedState::load(&path)?;
        let mut store = Self {
            path,
            state,
            dose_index: HashMap::new(),
        };
        store.rebuild_dose_index();

        // A profile must always exist; first run starts with the owner.
        if store.state.profiles.is_empty() {
            let id = Uuid::new_v4();
            store.state.profiles.push(Profile {
                id,
                name: "Me".into(),
                relationship: "Self".into(),
                date_of_birth: None,
                emergency_contact: None,
                allergies: Vec::new(),
                medical_conditions: Vec::new(),
                preferred_pharmacy: None,
                doctor: None,
                created_at: Utc::now(),
            });
            store.state.resolve_current_profile();
            store.flush()?;
            tracing::info!("Created default profile for first run");
        }

        Ok(store)
    }

    /// Persist the full state document
    fn flush(&self) -> Result<()> {
        self.state.save(&self.path)
    }

    /// `times` is an ordered set: drop repeats, keeping first occurrence
    fn dedupe_times(times: Vec<NaiveTime>) -> Vec<NaiveTime> {
        let mut seen = std::collections::HashSet::new();
        times.into_iter().filter(|t| seen.insert(*t)).collect()
    }

    fn rebuild_dose_index(&mut self) {
        self.dose_index = self
            .state
            .doses
            .iter()
            .enumerate()
            .map(|(i, d)| (d.id.clone(), i))
            .collect();
    }

    // ========================================================================
    // Read surface
    // ========================================================================

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn state(&self) -> &PersistedState {
        &self.state
    }

    pub fn medications(&self) -> &[Medication] {
        &self.state.medications
    }

    pub fn doses(&self) -> &[MedicationDose] {
        &self.state.doses
    }

    pub fn profiles(&self) -> &[Profile] {
        &self.state.profiles
    }

    pub fn settings(&self) -> &crate::AppSettings {
        &self.state.app_settings
    }

    pub fn current_profile(&self) -> &Profile {
        self.state
            .current_profile
            .as_ref()
            .or_else(|| self.state.profiles.first())
            .expect("store invariant: at least one profile exists")
    }

    pub fn medication(&self, id: Uuid) -> Option<&Medication> {
        self.state.medications.iter().find(|m| m.id == id)
    }

    pub fn dose(&self, dose_id: &str) -> Option<&MedicationDose> {
        self.dose_index
            .get(dose_id)
            .map(|&i| &self.state.doses[i])
    }

    /// Whether a dose record already exists for the given natural key
    pub fn dose_exists(&self, key: &crate::DoseKey) -> bool {
        self.dose_index.contains_key(&key.to_string())
    }

    /// Medications belonging to the current profile
    pub fn profile_medications(&self) -> Vec<&Medication> {
        let profile_id = self.current_profile().id;
        self.state
            .medications
            .iter()
            .filter(|m| m.profile_id == profile_id)
            .collect()
    }

    /// Dose records belonging to the current profile's medications
    pub fn profile_doses(&self) -> Vec<&MedicationDose> {
        let profile_id = self.current_profile().id;
        let med_ids: Vec<Uuid> = self
            .state
            .medications
            .iter()
            .filter(|m| m.profile_id == profile_id)
            .map(|m| m.id)
            .collect();
        self.state
            .doses
            .iter()
            .filter(|d| med_ids.contains(&d.medication_id))
            .collect()
    }

    // ========================================================================
    // Medication operations
    // ========================================================================

    /// Add a medication. Field-level validation is the caller's concern;
    /// the store assigns identity and timestamps.
    pub fn add_medication(&mut self, data: NewMedication) -> Result<Uuid> {
        let now = Utc::now();
        let id = Uuid::new_v4();
        let medication = Medication {
            id,
            profile_id: data.profile_id,
            name: data.name,
            dosage: data.dosage,
            kind: data.kind,
            frequency: data.frequency,
            times: Self::dedupe_times(data.times),
            start_date: data.start_date,
            refill_date: data.refill_date,
            quantity: data.quantity,
            doctor: data.doctor,
            pharmacy: data.pharmacy,
            prescription_number: data.prescription_number,
            color: data.color,
            notes: data.notes,
            side_effects: data.side_effects,
            effectiveness: data.effectiveness,
            is_active: true,
            created_at: now,
            updated_at: now,
        };
        tracing::info!("Adding medication {} ({})", medication.name, id);
        self.state.medications.push(medication);
        self.flush()?;
        Ok(id)
    }

    /// Merge partial fields into the matching medication and refresh its
    /// update timestamp.
    pub fn update_medication(&mut self, id: Uuid, patch: MedicationPatch) -> Result<()> {
        let med = self
            .state
            .medications
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or_else(|| Error::NotFound(format!("medication {}", id)))?;

        if let Some(v) = patch.name {
            med.name = v;
        }
        if let Some(v) = patch.dosage {
            med.dosage = v;
        }
        if let Some(v) = patch.kind {
            med.kind = v;
        }
        if let Some(v) = patch.frequency {
            med.frequency = v;
        }
        if let Some(v) = patch.times {
            med.times = Self::dedupe_times(v);
        }
        if let Some(v) = patch.start_date {
            med.start_date = v;
        }
        if let Some(v) = patch.refill_date {
            med.refill_date = Some(v);
        }
        if let Some(v) = patch.quantity {
            med.quantity = v;
        }
        if let Some(v) = patch.doctor {
            med.doctor = v;
        }
        if let Some(v) = patch.pharmacy {
            med.pharmacy = v;
        }
        if let Some(v) = patch.prescription_number {
            med.prescription_number = Some(v);
        }
        if let Some(v) = patch.color {
            med.color = Some(v);
        }
        if let Some(v) = patch.notes {
            med.notes = Some(v);
        }
        if let Some(v) = patch.side_effects {
            med.side_effects = v;
        }
        if let Some(v) = patch.effectiveness {
            med.effectiveness = Some(v);
        }
        if let Some(v) = patch.is_active {
            med.is_active = v;
        }
        med.updated_at = Utc::now();

        self.flush()
    }

    /// Delete a medication and every dose record referencing it
    pub fn delete_medication(&mut self, id: Uuid) -> Result<()> {
        let before = self.state.medications.len();
        self.state.medications.retain(|m| m.id != id);
        if self.state.medications.len() == before {
            return Err(Error::NotFound(format!("medication {}", id)));
        }

        let doses_before = self.state.doses.len();
        self.state.doses.retain(|d| d.medication_id != id);
        self.rebuild_dose_index();

        tracing::info!(
            "Deleted medication {} and {} dose records",
            id,
            doses_before - self.state.doses.len()
        );
        self.flush()
    }

    // ========================================================================
    // Dose operations
    // ========================================================================

    pub(crate) fn insert_dose(&mut self, dose: MedicationDose) {
        self.dose_index
            .insert(dose.id.clone(), self.state.doses.len());
        self.state.doses.push(dose);
    }

    pub(crate) fn persist(&self) -> Result<()> {
        self.flush()
    }

    /// Mark a dose taken, stamping the wall-clock taken time and attaching
    /// any reported details.
    ///
    /// A dose flips untaken -> taken exactly once: calling this on an
    /// already-taken dose is a no-op and returns `false`, leaving the first
    /// recorded details authoritative.
    pub fn mark_dose_taken(
        &mut self,
        dose_id: &str,
        details: TakenDetails,
        now: NaiveTime,
    ) -> Result<bool> {
        let idx = *self
            .dose_index
            .get(dose_id)
            .ok_or_else(|| Error::NotFound(format!("dose {}", dose_id)))?;
        let dose = &mut self.state.doses[idx];

        if dose.taken {
            tracing::debug!("Dose {} already taken, ignoring", dose_id);
            return Ok(false);
        }

        dose.taken = true;
        dose.taken_time = Some(now);
        dose.effectiveness = details.effectiveness;
        dose.side_effects = details.side_effects;
        dose.notes = details.notes;

        tracing::info!("Marked dose {} taken", dose_id);
        self.flush()?;
        Ok(true)
    }

    /// Push a dose's reminder out by `minutes` from now. Does not affect
    /// the taken flag.
    pub fn snooze_dose(&mut self, dose_id: &str, minutes: u32, now: NaiveDateTime) -> Result<()> {
        let idx = *self
            .dose_index
            .get(dose_id)
            .ok_or_else(|| Error::NotFound(format!("dose {}", dose_id)))?;
        let dose = &mut self.state.doses[idx];
        dose.snoozed_until = Some(now + chrono::Duration::minutes(i64::from(minutes)));

        tracing::info!("Snoozed dose {} for {} minutes", dose_id, minutes);
        self.flush()
    }

    // ========================================================================
    // Profile operations
    // ========================================================================

    pub fn add_profile(&mut self, data: NewProfile) -> Result<Uuid> {
        let id = Uuid::new_v4();
        self.state.profiles.push(Profile {
            id,
            name: data.name,
            relationship: data.relationship,
            date_of_birth: data.date_of_birth,
            emergency_contact: data.emergency_contact,
            allergies: data.allergies,
            medical_conditions: data.medical_conditions,
            preferred_pharmacy: data.preferred_pharmacy,
            doctor: data.doctor,
            created_at: Utc::now(),
        });
        self.flush()?;
        Ok(id)
    }

    pub fn update_profile(&mut self, id: Uuid, patch: ProfilePatch) -> Result<()> {
        let profile = self
            .state
            .profiles
            .iter_mut()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", id)))?;

        if let Some(v) = patch.name {
            profile.name = v;
        }
        if let Some(v) = patch.relationship {
            profile.relationship = v;
        }
        if let Some(v) = patch.date_of_birth {
            profile.date_of_birth = Some(v);
        }
        if let Some(v) = patch.emergency_contact {
            profile.emergency_contact = Some(v);
        }
        if let Some(v) = patch.allergies {
            profile.allergies = v;
        }
        if let Some(v) = patch.medical_conditions {
            profile.medical_conditions = v;
        }
        if let Some(v) = patch.preferred_pharmacy {
            profile.preferred_pharmacy = Some(v);
        }
        if let Some(v) = patch.doctor {
            profile.doctor = Some(v);
        }

        // Keep the current-profile snapshot in sync
        self.state.resolve_current_profile();
        self.flush()
    }

    /// Delete a profile, cascading to its medications and their doses.
    /// The last remaining profile cannot be deleted.
    pub fn delete_profile(&mut self, id: Uuid) -> Result<()> {
        if !self.state.profiles.iter().any(|p| p.id == id) {
            return Err(Error::NotFound(format!("profile {}", id)));
        }
        if self.state.profiles.len() <= 1 {
            return Err(Error::Profile(
                "cannot delete the last remaining profile".into(),
            ));
        }

        let med_ids: Vec<Uuid> = self
            .state
            .medications
            .iter()
            .filter(|m| m.profile_id == id)
            .map(|m| m.id)
            .collect();

        self.state.profiles.retain(|p| p.id != id);
        self.state.medications.retain(|m| m.profile_id != id);
        self.state
            .doses
            .retain(|d| !med_ids.contains(&d.medication_id));
        self.rebuild_dose_index();

        // If the deleted profile was current, fall back to any remaining one
        if self.state.current_profile_id() == Some(id) {
            self.state.current_profile = None;
        }
        self.state.resolve_current_profile();

        tracing::info!(
            "Deleted profile {} and {} of its medications",
            id,
            med_ids.len()
        );
        self.flush()
    }

    pub fn set_current_profile(&mut self, id: Uuid) -> Result<()> {
        let profile = self
            .state
            .profiles
            .iter()
            .find(|p| p.id == id)
            .ok_or_else(|| Error::NotFound(format!("profile {}", id)))?
            .clone();
        self.state.current_profile = Some(profile);
        self.flush()
    }

    // ========================================================================
    // Settings
    // ========================================================================

    /// Shallow-merge settings, with a nested merge for `notifications`
    pub fn update_settings(&mut self, patch: SettingsPatch) -> Result<()> {
        self.state.app_settings.apply(patch);
        self.flush()
    }

    // ========================================================================
    // Wholesale replacement (import, demo seed)
    // ========================================================================

    /// Replace the entire state document. The new state must honor the
    /// profile invariant.
    pub fn replace_state(&mut self, mut state: PersistedState) -> Result<()> {
        if state.profiles.is_empty() {
            return Err(Error::Profile(
                "replacement state must contain at least one profile".into(),
            ));
        }
        state.resolve_current_profile();
        self.state = state;
        self.rebuild_dose_index();
        self.flush()
    }
}
