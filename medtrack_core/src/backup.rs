//! Backup export and import.
//!
//! Exports are a versioned JSON document carrying every domain collection.
//! Import is all-or-nothing: the document is validated in full before any
//! state is replaced, so a bad file can never leave the store half-written.

use crate::state::PersistedState;
use crate::{AppSettings, Error, Medication, MedicationDose, MedicationStore, Profile, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Format version stamped into every export
pub const EXPORT_VERSION: &str = "1.0";

/// The backup document as written to disk
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportDocument {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub medications: Vec<Medication>,
    pub doses: Vec<MedicationDose>,
    pub profiles: Vec<Profile>,
    pub settings: AppSettings,
}

/// Loose mirror of [`ExportDocument`] used to detect missing collections
/// before committing to anything.
#[derive(Deserialize)]
struct RawImport {
    medications: Option<Vec<Medication>>,
    doses: Option<Vec<MedicationDose>>,
    profiles: Option<Vec<Profile>>,
    settings: Option<AppSettings>,
}

/// Parse and validate a backup document.
///
/// The three core collections must all be present (empty is allowed, absent
/// is not); settings fall back to defaults when omitted.
pub fn parse_import(contents: &str) -> Result<PersistedState> {
    let raw: RawImport = serde_json::from_str(contents)
        .map_err(|e| Error::ImportFormat(format!("not a valid backup document: {}", e)))?;

    let medications = raw
        .medications
        .ok_or_else(|| Error::ImportFormat("missing \"medications\" collection".into()))?;
    let doses = raw
        .doses
        .ok_or_else(|| Error::ImportFormat("missing \"doses\" collection".into()))?;
    let profiles = raw
        .profiles
        .ok_or_else(|| Error::ImportFormat("missing \"profiles\" collection".into()))?;

    Ok(PersistedState {
        medications,
        doses,
        profiles,
        current_profile: None,
        app_settings: raw.settings.unwrap_or_default(),
    })
}

impl MedicationStore {
    /// Snapshot the full store as a backup document
    pub fn export_document(&self) -> ExportDocument {
        let state = self.state();
        ExportDocument {
            version: EXPORT_VERSION.into(),
            exported_at: Utc::now(),
            medications: state.medications.clone(),
            doses: state.doses.clone(),
            profiles: state.profiles.clone(),
            settings: state.app_settings.clone(),
        }
    }

    /// Write a backup document to `path` as pretty-printed JSON
    pub fn export_json(&self, path: &Path) -> Result<()> {
        let document = self.export_document();
        let contents = serde_json::to_string_pretty(&document)?;
        std::fs::write(path, contents)?;
        tracing::info!(
            "Exported {} medications, {} doses, {} profiles to {:?}",
            document.medications.len(),
            document.doses.len(),
            document.profiles.len(),
            path
        );
        Ok(())
    }

    /// Replace the entire store from a backup document at `path`.
    ///
    /// Validation happens before replacement: on any error the store is
    /// untouched. The current-profile pointer resets to the imported
    /// document's first profile.
    pub fn import_json(&mut self, path: &Path) -> Result<()> {
        let contents = std::fs::read_to_string(path)?;
        let state = parse_import(&contents)?;
        tracing::info!(
            "Importing {} medications, {} doses, {} profiles from {:?}",
            state.medications.len(),
            state.doses.len(),
            state.profiles.len(),
            path
        );
        self.replace_state(state)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::{sample_medication, store_in};
    use chrono::NaiveDate;

    #[test]
    fn test_export_import_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        store
            .add_medication(sample_medication(profile_id, "Lisinopril", &["08:00"]))
            .unwrap();
        store
            .generate_daily_doses(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
            .unwrap();

        let backup = dir.path().join("backup.json");
        store.export_json(&backup).unwrap();

        // Import into a completely separate store
        let other_dir = tempfile::tempdir().unwrap();
        let mut other = store_in(&other_dir);
        other.import_json(&backup).unwrap();

        assert_eq!(other.medications().len(), 1);
        assert_eq!(other.medications()[0].name, "Lisinopril");
        assert_eq!(other.doses().len(), 1);
        assert_eq!(other.current_profile().id, profile_id);
    }

    #[test]
    fn test_export_document_carries_version() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let document = store.export_document();
        assert_eq!(document.version, EXPORT_VERSION);
    }

    #[test]
    fn test_import_missing_collection_rejected() {
        // No "doses" key at all
        let contents = r#"{"medications": [], "profiles": []}"#;
        let result = parse_import(contents);
        assert!(matches!(result, Err(Error::ImportFormat(_))));
    }

    #[test]
    fn test_import_invalid_json_rejected() {
        assert!(matches!(
            parse_import("not json at all"),
            Err(Error::ImportFormat(_))
        ));
    }

    #[test]
    fn test_failed_import_leaves_store_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);
        let profile_id = store.current_profile().id;
        store
            .add_medication(sample_medication(profile_id, "Keep me", &["09:00"]))
            .unwrap();

        let bad = dir.path().join("bad.json");
        std::fs::write(&bad, r#"{"medications": []}"#).unwrap();

        assert!(store.import_json(&bad).is_err());
        assert_eq!(store.medications().len(), 1);
        assert_eq!(store.medications()[0].name, "Keep me");
    }

    #[test]
    fn test_import_without_settings_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = store_in(&dir);
        let profiles = serde_json::to_string(store.profiles()).unwrap();

        let contents = format!(
            r#"{{"medications": [], "doses": [], "profiles": {}}}"#,
            profiles
        );
        let state = parse_import(&contents).unwrap();
        assert_eq!(state.app_settings, AppSettings::default());
    }

    #[test]
    fn test_import_empty_profiles_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let mut store = store_in(&dir);

        let empty = dir.path().join("empty.json");
        std::fs::write(
            &empty,
            r#"{"medications": [], "doses": [], "profiles": []}"#,
        )
        .unwrap();

        assert!(matches!(
            store.import_json(&empty),
            Err(Error::Profile(_))
        ));
    }
}
