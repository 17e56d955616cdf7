//! Daily dose generation and schedule classification.
//!
//! Generation synthesizes one untaken dose record per (medication,
//! scheduled time, day) for the current profile's active medications. The
//! natural key is the uniqueness guard, so the pass is idempotent: it can
//! run on every refresh without ever duplicating a record.

use crate::{DoseKey, MedicationDose, MedicationStore, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::HashSet;

/// Classification of a dose relative to the current wall-clock time.
///
/// Derived on demand, never stored; the notification layer consumes it.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DoseStatus {
    Taken,
    /// Snoozed into the future; suppresses overdue/upcoming
    Snoozed,
    /// Untaken and past its scheduled time
    Overdue,
    /// Untaken and due within the upcoming window
    Upcoming,
    /// Untaken, scheduled further out today
    Scheduled,
}

/// Completion counts for one day's schedule
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct DaySummary {
    pub completed: usize,
    pub total: usize,
    /// Percentage 0-100; 0 when nothing is scheduled
    pub completion_rate: u8,
}

/// Classify a dose against `now`. `upcoming_window` is how far ahead a
/// dose still counts as upcoming (30 minutes by default configuration).
pub fn dose_status(
    dose: &MedicationDose,
    now: NaiveDateTime,
    upcoming_window: Duration,
) -> DoseStatus {
    if dose.taken {
        return DoseStatus::Taken;
    }
    if let Some(snoozed_until) = dose.snoozed_until {
        if snoozed_until > now {
            return DoseStatus::Snoozed;
        }
    }

    let scheduled = dose.date.and_time(dose.scheduled_time);
    if now > scheduled {
        DoseStatus::Overdue
    } else if scheduled - now <= upcoming_window {
        DoseStatus::Upcoming
    } else {
        DoseStatus::Scheduled
    }
}

impl MedicationStore {
    /// Run the daily dose-generation pass for `today`.
    ///
    /// For every active medication of the current profile and every
    /// scheduled time, a dose record is created unless one already exists
    /// for that natural key. Returns the number of records created.
    pub fn generate_daily_doses(&mut self, today: NaiveDate) -> Result<usize> {
        // Set, not Vec: a schedule with a repeated time must still yield
        // one record per natural key.
        let mut pending: HashSet<DoseKey> = HashSet::new();
        for med in self.profile_medications() {
            if !med.is_active {
                continue;
            }
            for &time in &med.times {
                let key = DoseKey {
                    medication_id: med.id,
                    time,
                    date: today,
                };
                if !self.dose_exists(&key) {
                    pending.insert(key);
                }
            }
        }

        let created = pending.len();
        for key in pending {
            self.insert_dose(MedicationDose::untaken(key));
        }

        if created > 0 {
            tracing::info!("Generated {} dose records for {}", created, today);
            self.persist()?;
        }
        Ok(created)
    }

    /// The current profile's doses for `date`, ordered by scheduled time
    pub fn doses_for_date(&self, date: NaiveDate) -> Vec<&MedicationDose> {
        let mut doses: Vec<&MedicationDose> = self
            .profile_doses()
            .into_iter()
            .filter(|d| d.date == date)
            .collect();
        doses.sort_by_key(|d| d.scheduled_time);
        doses
    }

    /// Completion summary for one day's schedule
    pub fn day_summary(&self, date: NaiveDate) -> DaySummary {
        let doses = self.doses_for_date(date);
        let total = doses.len();
        let completed = doses.iter().filter(|d| d.taken).count();
        let completion_rate = if total > 0 {
            ((completed as f64 / total as f64) * 100.0).round() as u8
        } else {
            0
        };
        DaySummary {
            completed,
            total,
            completion_rate,
        }
    }
}
