//! Reminder scheduling for untaken doses.
//!
//! Reminders are derived on demand from today's dose records and the
//! notification settings; nothing is persisted. A poll loop calls
//! [`MedicationStore::due_reminders`] once a minute or so and fires
//! whatever comes back.

use crate::{MedicationDose, MedicationStore};
use chrono::{Duration, NaiveDateTime};
use serde::Serialize;

/// Fire-time match tolerance. A reminder counts as due when `now` is within
/// this much after its fire time, so a polling loop cannot step over it.
const FIRE_TOLERANCE_SECONDS: i64 = 30;

/// Overdue nags repeat on this interval after the scheduled time
const OVERDUE_REPEAT_MINUTES: i64 = 30;
/// No overdue nag fires beyond this point; the dose is presumed skipped
const OVERDUE_CUTOFF_MINUTES: i64 = 180;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ReminderKind {
    /// Advance warning, minutes ahead of the scheduled time
    Lead { minutes_before: u32 },
    /// The scheduled time itself (offset 0)
    Due,
    /// Repeating nag after the scheduled time has passed
    Overdue,
}

/// A single reminder that should fire now
#[derive(Clone, Debug, Serialize)]
pub struct Reminder {
    pub dose_id: String,
    pub medication_name: String,
    pub dosage: String,
    pub kind: ReminderKind,
    pub scheduled: NaiveDateTime,
}

fn fire_times(dose: &MedicationDose, reminder_minutes: &[u32]) -> Vec<(NaiveDateTime, ReminderKind)> {
    let scheduled = dose.date.and_time(dose.scheduled_time);

    // A snoozed dose fires once when the snooze expires, nothing before
    if let Some(snoozed_until) = dose.snoozed_until {
        return vec![(snoozed_until, ReminderKind::Due)];
    }

    let mut times = Vec::new();
    for &minutes in reminder_minutes {
        let kind = if minutes == 0 {
            ReminderKind::Due
        } else {
            ReminderKind::Lead {
                minutes_before: minutes,
            }
        };
        times.push((scheduled - Duration::minutes(i64::from(minutes)), kind));
    }
    let mut offset = OVERDUE_REPEAT_MINUTES;
    while offset <= OVERDUE_CUTOFF_MINUTES {
        times.push((scheduled + Duration::minutes(offset), ReminderKind::Overdue));
        offset += OVERDUE_REPEAT_MINUTES;
    }
    times
}

fn fires_now(fire_at: NaiveDateTime, now: NaiveDateTime) -> bool {
    let delta = now - fire_at;
    delta >= Duration::zero() && delta <= Duration::seconds(FIRE_TOLERANCE_SECONDS)
}

impl MedicationStore {
    /// Reminders that should fire at `now` for the current profile's
    /// doses scheduled on `now`'s date.
    ///
    /// Returns nothing when notifications are disabled. Taken doses never
    /// remind; snoozed doses remind only at snooze expiry.
    pub fn due_reminders(&self, now: NaiveDateTime) -> Vec<Reminder> {
        if !self.settings().notifications.enabled {
            return Vec::new();
        }
        let reminder_minutes = self.settings().notifications.reminder_minutes.clone();

        let mut due = Vec::new();
        for dose in self.doses_for_date(now.date()) {
            if dose.taken {
                continue;
            }
            for (fire_at, kind) in fire_times(dose, &reminder_minutes) {
                if fires_now(fire_at, now) {
                    let (name, dosage) = self
                        .medication(dose.medication_id)
                        .map(|m| (m.name.clone(), m.dosage.clone()))
                        .unwrap_or_default();
                    due.push(Reminder {
                        dose_id: dose.id.clone(),
                        medication_name: name,
                        dosage,
                        kind,
                        scheduled: dose.date.and_time(dose.scheduled_time),
                    });
                }
            }
        }
        due
    }
}
