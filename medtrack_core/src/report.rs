//! Clinician-facing adherence reports.
//!
//! A report covers a trailing window (30, 60 or 90 days), summarizing
//! per-medication compliance alongside the profile-wide analytics, plus a
//! chronological log of notes recorded on taken doses. The raw dose log
//! can also be exported as CSV for handoff.

use crate::analytics::compute_analytics;
use crate::config::AnalyticsConfig;
use crate::{Analytics, Medication, MedicationDose, MedicationStore, Profile, Result};
use chrono::{Duration, NaiveDate, NaiveTime};
use serde::Serialize;
use std::path::Path;
use uuid::Uuid;

/// Per-medication adherence within the report window
#[derive(Clone, Debug, Serialize)]
pub struct MedicationSummary {
    pub medication_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub doses_taken: usize,
    pub doses_scheduled: usize,
    /// Percentage 0-100; 0 when nothing was scheduled in the window
    pub compliance_rate: u8,
    pub average_effectiveness: Option<f64>,
    /// Distinct side effects reported on this medication in the window
    pub side_effects: Vec<String>,
}

/// One free-text note recorded when a dose was taken
#[derive(Clone, Debug, Serialize)]
pub struct NoteEntry {
    pub date: NaiveDate,
    #[serde(with = "crate::timefmt::hhmm_opt")]
    pub taken_time: Option<NaiveTime>,
    pub medication_name: String,
    pub note: String,
}

/// Adherence report for one profile over a trailing window
#[derive(Clone, Debug, Serialize)]
pub struct ClinicianReport {
    pub profile: Profile,
    pub window_days: u32,
    pub from: NaiveDate,
    pub to: NaiveDate,
    pub analytics: Analytics,
    pub medications: Vec<MedicationSummary>,
    /// Notes in chronological order, oldest first
    pub notes: Vec<NoteEntry>,
}

fn summarize_medication(med: &Medication, doses: &[&MedicationDose]) -> MedicationSummary {
    let scheduled: Vec<_> = doses
        .iter()
        .filter(|d| d.medication_id == med.id)
        .collect();
    let taken: Vec<_> = scheduled.iter().filter(|d| d.taken).collect();

    let compliance_rate = if scheduled.is_empty() {
        0
    } else {
        ((taken.len() as f64 / scheduled.len() as f64) * 100.0).round() as u8
    };

    let ratings: Vec<u8> = taken.iter().filter_map(|d| d.effectiveness).collect();
    let average_effectiveness = if ratings.is_empty() {
        None
    } else {
        let mean = ratings.iter().map(|&e| f64::from(e)).sum::<f64>() / ratings.len() as f64;
        Some((mean * 10.0).round() / 10.0)
    };

    let mut side_effects: Vec<String> = Vec::new();
    for dose in &taken {
        for effect in &dose.side_effects {
            if !side_effects.contains(effect) {
                side_effects.push(effect.clone());
            }
        }
    }

    MedicationSummary {
        medication_id: med.id,
        name: med.name.clone(),
        dosage: med.dosage.clone(),
        doses_taken: taken.len(),
        doses_scheduled: scheduled.len(),
        compliance_rate,
        average_effectiveness,
        side_effects,
    }
}

/// A row in the CSV dose log
#[derive(Debug, Serialize)]
struct CsvRow {
    date: String,
    scheduled_time: String,
    medication: String,
    dosage: String,
    taken: bool,
    taken_time: Option<String>,
    effectiveness: Option<u8>,
    side_effects: String,
    notes: Option<String>,
}

impl CsvRow {
    fn new(dose: &MedicationDose, med: &Medication) -> Self {
        CsvRow {
            date: dose.date.to_string(),
            scheduled_time: crate::timefmt::format_clock(dose.scheduled_time),
            medication: med.name.clone(),
            dosage: med.dosage.clone(),
            taken: dose.taken,
            taken_time: dose.taken_time.map(crate::timefmt::format_clock),
            effectiveness: dose.effectiveness,
            side_effects: dose.side_effects.join("; "),
            notes: dose.notes.clone(),
        }
    }
}

impl MedicationStore {
    /// Build an adherence report for the current profile over the trailing
    /// `window_days` ending at `today` (inclusive).
    pub fn clinician_report(
        &self,
        today: NaiveDate,
        window_days: u32,
        config: &AnalyticsConfig,
    ) -> ClinicianReport {
        let from = today - Duration::days(i64::from(window_days) - 1);
        let window_doses: Vec<&MedicationDose> = self
            .profile_doses()
            .into_iter()
            .filter(|d| d.date >= from && d.date <= today)
            .collect();

        let medications: Vec<MedicationSummary> = self
            .profile_medications()
            .iter()
            .map(|med| summarize_medication(med, &window_doses))
            .collect();

        let mut noted: Vec<&&MedicationDose> = window_doses
            .iter()
            .filter(|d| d.taken && d.notes.is_some())
            .collect();
        noted.sort_by_key(|d| (d.date, d.scheduled_time));
        let notes = noted
            .into_iter()
            .map(|d| NoteEntry {
                date: d.date,
                taken_time: d.taken_time,
                medication_name: self
                    .medication(d.medication_id)
                    .map(|m| m.name.clone())
                    .unwrap_or_default(),
                note: d.notes.clone().unwrap_or_default(),
            })
            .collect();

        ClinicianReport {
            profile: self.current_profile().clone(),
            window_days,
            from,
            to: today,
            analytics: compute_analytics(&window_doses, today, config),
            medications,
            notes,
        }
    }

    /// Export the current profile's dose log for the report window as CSV,
    /// ordered chronologically.
    pub fn export_dose_log_csv(
        &self,
        path: &Path,
        today: NaiveDate,
        window_days: u32,
    ) -> Result<usize> {
        let from = today - Duration::days(i64::from(window_days) - 1);
        let mut doses: Vec<&MedicationDose> = self
            .profile_doses()
            .into_iter()
            .filter(|d| d.date >= from && d.date <= today)
            .collect();
        doses.sort_by_key(|d| (d.date, d.scheduled_time));

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        let mut written = 0;
        for dose in &doses {
            // Doses orphaned by a deleted medication are skipped
            if let Some(med) = self.medication(dose.medication_id) {
                writer.serialize(CsvRow::new(dose, med))?;
                written += 1;
            }
        }
        writer.flush()?;

        tracing::info!("Exported {} dose log rows to {:?}", written, path);
        Ok(written)
    }
}
