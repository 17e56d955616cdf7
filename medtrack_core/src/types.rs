//! Core domain types for the medication tracking system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Medications and their schedules
//! - Dose records (one scheduled administration per day)
//! - Profiles (tracked people) and application settings
//! - Search filters and adherence analytics

use chrono::{DateTime, NaiveDate, NaiveTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Serde helpers for `"HH:MM"` clock times as they appear in schedules
/// and backup documents.
pub mod timefmt {
    use chrono::NaiveTime;
    use serde::de::Error as _;
    use serde::{Deserialize, Deserializer, Serializer};

    pub const CLOCK_FORMAT: &str = "%H:%M";

    pub fn parse_clock(raw: &str) -> Option<NaiveTime> {
        NaiveTime::parse_from_str(raw, CLOCK_FORMAT).ok()
    }

    pub fn format_clock(time: NaiveTime) -> String {
        time.format(CLOCK_FORMAT).to_string()
    }

    pub mod hhmm {
        use super::*;

        pub fn serialize<S: Serializer>(time: &NaiveTime, s: S) -> Result<S::Ok, S::Error> {
            s.serialize_str(&format_clock(*time))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<NaiveTime, D::Error> {
            let raw = String::deserialize(d)?;
            parse_clock(&raw)
                .ok_or_else(|| D::Error::custom(format!("invalid clock time: {raw:?}")))
        }
    }

    pub mod hhmm_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => s.serialize_some(&format_clock(*t)),
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw = Option::<String>::deserialize(d)?;
            raw.map(|r| {
                parse_clock(&r)
                    .ok_or_else(|| D::Error::custom(format!("invalid clock time: {r:?}")))
            })
            .transpose()
        }
    }

    pub mod hhmm_vec {
        use super::*;

        pub fn serialize<S: Serializer>(times: &[NaiveTime], s: S) -> Result<S::Ok, S::Error> {
            s.collect_seq(times.iter().copied().map(format_clock))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Vec<NaiveTime>, D::Error> {
            let raw = Vec::<String>::deserialize(d)?;
            raw.iter()
                .map(|r| {
                    parse_clock(r)
                        .ok_or_else(|| D::Error::custom(format!("invalid clock time: {r:?}")))
                })
                .collect()
        }
    }

    pub mod hhmm_vec_opt {
        use super::*;

        pub fn serialize<S: Serializer>(
            times: &Option<Vec<NaiveTime>>,
            s: S,
        ) -> Result<S::Ok, S::Error> {
            match times {
                Some(ts) => {
                    let rendered: Vec<String> =
                        ts.iter().copied().map(format_clock).collect();
                    s.serialize_some(&rendered)
                }
                None => s.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            d: D,
        ) -> Result<Option<Vec<NaiveTime>>, D::Error> {
            let raw = Option::<Vec<String>>::deserialize(d)?;
            raw.map(|rs| {
                rs.iter()
                    .map(|r| {
                        parse_clock(r).ok_or_else(|| {
                            D::Error::custom(format!("invalid clock time: {r:?}"))
                        })
                    })
                    .collect()
            })
            .transpose()
        }
    }
}

// ============================================================================
// Medication Types
// ============================================================================

/// Form of a medication
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum MedicationKind {
    Pill,
    Liquid,
    Injection,
    Topical,
}

/// How often a medication is scheduled
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    AsNeeded,
}

/// A prescribed treatment definition, owned by exactly one profile
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Medication {
    pub id: Uuid,
    pub profile_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub kind: MedicationKind,
    pub frequency: Frequency,
    /// Scheduled clock times, in schedule order
    #[serde(with = "timefmt::hhmm_vec")]
    pub times: Vec<NaiveTime>,
    pub start_date: NaiveDate,
    pub refill_date: Option<NaiveDate>,
    /// Units on hand; never negative
    pub quantity: u32,
    pub doctor: String,
    pub pharmacy: String,
    pub prescription_number: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    /// 1-5 rating, when the user has rated it
    pub effectiveness: Option<u8>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a medication; id, timestamps and the active flag
/// are assigned by the store.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct NewMedication {
    pub profile_id: Uuid,
    pub name: String,
    pub dosage: String,
    pub kind: MedicationKind,
    pub frequency: Frequency,
    #[serde(with = "timefmt::hhmm_vec")]
    pub times: Vec<NaiveTime>,
    pub start_date: NaiveDate,
    pub refill_date: Option<NaiveDate>,
    pub quantity: u32,
    pub doctor: String,
    pub pharmacy: String,
    pub prescription_number: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    pub effectiveness: Option<u8>,
}

/// Partial update for a medication; `None` fields are left untouched.
///
/// Patches are set-only: fields that are optional on [`Medication`]
/// (refill date, prescription number, color, notes, effectiveness) can be
/// written but never cleared back to empty through a patch.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct MedicationPatch {
    pub name: Option<String>,
    pub dosage: Option<String>,
    pub kind: Option<MedicationKind>,
    pub frequency: Option<Frequency>,
    #[serde(default, with = "timefmt::hhmm_vec_opt")]
    pub times: Option<Vec<NaiveTime>>,
    pub start_date: Option<NaiveDate>,
    pub refill_date: Option<NaiveDate>,
    pub quantity: Option<u32>,
    pub doctor: Option<String>,
    pub pharmacy: Option<String>,
    pub prescription_number: Option<String>,
    pub color: Option<String>,
    pub notes: Option<String>,
    pub side_effects: Option<Vec<String>>,
    pub effectiveness: Option<u8>,
    pub is_active: Option<bool>,
}

// ============================================================================
// Dose Types
// ============================================================================

/// Natural key for a dose record: one medication, one scheduled time,
/// one calendar day. At most one dose record exists per key.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct DoseKey {
    pub medication_id: Uuid,
    pub time: NaiveTime,
    pub date: NaiveDate,
}

impl fmt::Display for DoseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}-{}-{}",
            self.medication_id,
            timefmt::format_clock(self.time),
            self.date
        )
    }
}

/// One scheduled administration instance of a medication on one day
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MedicationDose {
    /// Rendered natural key, `"{medication_id}-{HH:MM}-{date}"`
    pub id: String,
    pub medication_id: Uuid,
    #[serde(with = "timefmt::hhmm")]
    pub scheduled_time: NaiveTime,
    pub date: NaiveDate,
    pub taken: bool,
    /// Wall-clock time the dose was actually taken; always set once taken
    #[serde(default, with = "timefmt::hhmm_opt")]
    pub taken_time: Option<NaiveTime>,
    /// While in the future, suppresses overdue/upcoming classification
    pub snoozed_until: Option<chrono::NaiveDateTime>,
    pub effectiveness: Option<u8>,
    #[serde(default)]
    pub side_effects: Vec<String>,
    pub notes: Option<String>,
}

impl MedicationDose {
    /// Synthesize an untaken dose record for the given natural key
    pub fn untaken(key: DoseKey) -> Self {
        Self {
            id: key.to_string(),
            medication_id: key.medication_id,
            scheduled_time: key.time,
            date: key.date,
            taken: false,
            taken_time: None,
            snoozed_until: None,
            effectiveness: None,
            side_effects: Vec::new(),
            notes: None,
        }
    }

    pub fn key(&self) -> DoseKey {
        DoseKey {
            medication_id: self.medication_id,
            time: self.scheduled_time,
            date: self.date,
        }
    }
}

/// Optional details attached when a dose is marked taken
#[derive(Clone, Debug, Default)]
pub struct TakenDetails {
    pub effectiveness: Option<u8>,
    pub side_effects: Vec<String>,
    pub notes: Option<String>,
}

// ============================================================================
// Profile Types
// ============================================================================

/// A tracked person (the account owner or a family member)
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Profile {
    pub id: Uuid,
    pub name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    pub preferred_pharmacy: Option<String>,
    pub doctor: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Input for creating a profile; id and creation time are assigned by the store
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NewProfile {
    pub name: String,
    pub relationship: String,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    #[serde(default)]
    pub allergies: Vec<String>,
    #[serde(default)]
    pub medical_conditions: Vec<String>,
    pub preferred_pharmacy: Option<String>,
    pub doctor: Option<String>,
}

/// Partial update for a profile. Set-only, like [`MedicationPatch`]:
/// optional fields can be written but not cleared.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ProfilePatch {
    pub name: Option<String>,
    pub relationship: Option<String>,
    pub date_of_birth: Option<NaiveDate>,
    pub emergency_contact: Option<String>,
    pub allergies: Option<Vec<String>>,
    pub medical_conditions: Option<Vec<String>>,
    pub preferred_pharmacy: Option<String>,
    pub doctor: Option<String>,
}

// ============================================================================
// Settings Types
// ============================================================================

/// Display font size preference
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FontSize {
    Small,
    Medium,
    Large,
}

/// Notification preferences, nested inside [`AppSettings`]
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct NotificationSettings {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_true")]
    pub sound_alerts: bool,
    #[serde(default)]
    pub email_reminders: bool,
    #[serde(default)]
    pub sms_reminders: bool,
    /// Lead-time offsets, in minutes before the scheduled time. An offset
    /// of 0 is the "due now" alert.
    #[serde(default = "default_reminder_minutes")]
    pub reminder_minutes: Vec<u32>,
}

impl Default for NotificationSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            sound_alerts: true,
            email_reminders: false,
            sms_reminders: false,
            reminder_minutes: default_reminder_minutes(),
        }
    }
}

/// Process-wide application settings; a single instance, persisted whole
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct AppSettings {
    #[serde(default)]
    pub dark_mode: bool,
    #[serde(default)]
    pub high_contrast: bool,
    #[serde(default = "default_font_size")]
    pub font_size: FontSize,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_timezone")]
    pub timezone: String,
    #[serde(default)]
    pub notifications: NotificationSettings,
    #[serde(default = "default_true")]
    pub auto_backup: bool,
    #[serde(default = "default_retention_days")]
    pub data_retention_days: u32,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            dark_mode: false,
            high_contrast: false,
            font_size: default_font_size(),
            language: default_language(),
            timezone: default_timezone(),
            notifications: NotificationSettings::default(),
            auto_backup: true,
            data_retention_days: default_retention_days(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_font_size() -> FontSize {
    FontSize::Medium
}

fn default_language() -> String {
    "en".into()
}

fn default_timezone() -> String {
    "America/New_York".into()
}

fn default_retention_days() -> u32 {
    365
}

fn default_reminder_minutes() -> Vec<u32> {
    vec![0, 5, 15, 30, 60]
}

/// Partial update for notification settings. A patch that sets one field
/// must not erase its siblings, hence the explicit merge.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct NotificationPatch {
    pub enabled: Option<bool>,
    pub sound_alerts: Option<bool>,
    pub email_reminders: Option<bool>,
    pub sms_reminders: Option<bool>,
    pub reminder_minutes: Option<Vec<u32>>,
}

impl NotificationSettings {
    pub fn apply(&mut self, patch: NotificationPatch) {
        if let Some(v) = patch.enabled {
            self.enabled = v;
        }
        if let Some(v) = patch.sound_alerts {
            self.sound_alerts = v;
        }
        if let Some(v) = patch.email_reminders {
            self.email_reminders = v;
        }
        if let Some(v) = patch.sms_reminders {
            self.sms_reminders = v;
        }
        if let Some(v) = patch.reminder_minutes {
            self.reminder_minutes = v;
        }
    }
}

/// Partial update for application settings, with a nested merge for the
/// notifications sub-object
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct SettingsPatch {
    pub dark_mode: Option<bool>,
    pub high_contrast: Option<bool>,
    pub font_size: Option<FontSize>,
    pub language: Option<String>,
    pub timezone: Option<String>,
    pub notifications: Option<NotificationPatch>,
    pub auto_backup: Option<bool>,
    pub data_retention_days: Option<u32>,
}

impl AppSettings {
    pub fn apply(&mut self, patch: SettingsPatch) {
        if let Some(v) = patch.dark_mode {
            self.dark_mode = v;
        }
        if let Some(v) = patch.high_contrast {
            self.high_contrast = v;
        }
        if let Some(v) = patch.font_size {
            self.font_size = v;
        }
        if let Some(v) = patch.language {
            self.language = v;
        }
        if let Some(v) = patch.timezone {
            self.timezone = v;
        }
        if let Some(v) = patch.notifications {
            self.notifications.apply(v);
        }
        if let Some(v) = patch.auto_backup {
            self.auto_backup = v;
        }
        if let Some(v) = patch.data_retention_days {
            self.data_retention_days = v;
        }
    }
}

// ============================================================================
// Search / Filter Types
// ============================================================================

/// Active/inactive restriction for the medication list
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// Sort key for the medication list
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortKey {
    #[default]
    Name,
    /// First scheduled time
    Time,
    Doctor,
    Pharmacy,
    Effectiveness,
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

/// Transient view-state for searching and sorting the medication list.
/// Not persisted; recomputed per use.
#[derive(Clone, Debug, Default)]
pub struct SearchFilters {
    pub query: String,
    pub kinds: Vec<MedicationKind>,
    pub frequencies: Vec<Frequency>,
    pub doctors: Vec<String>,
    pub pharmacies: Vec<String>,
    pub status: StatusFilter,
    pub sort_by: SortKey,
    pub sort_order: SortOrder,
}

// ============================================================================
// Analytics Types
// ============================================================================

/// Per-day taken/missed counts for the trend series
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct TrendPoint {
    pub date: NaiveDate,
    pub taken: usize,
    pub missed: usize,
    pub total: usize,
}

/// Adherence analytics for the current profile
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Analytics {
    /// Percentage of scheduled doses taken, 0-100; 0 when nothing scheduled
    pub compliance_rate: u8,
    /// Consecutive fully-compliant calendar days, scanned backward from today
    pub streak_days: u32,
    pub total_doses_taken: usize,
    pub total_doses_missed: usize,
    /// Mean of rated taken doses, rounded to one decimal; 0.0 with no data
    pub average_effectiveness: f64,
    /// Top reported side effects, most frequent first (at most five)
    pub common_side_effects: Vec<String>,
    /// Daily taken/missed counts, oldest to newest
    pub trend: Vec<TrendPoint>,
}
