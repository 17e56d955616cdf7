//! Persisted store document with file locking.
//!
//! The entire domain state is one JSON document, rewritten whole on every
//! mutation. Writes are atomic (temp file + rename) and serialized with
//! advisory file locks so a stray second process cannot interleave a write.

use crate::{AppSettings, Error, Medication, MedicationDose, Profile, Result};
use fs2::FileExt;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// The single persisted document holding all domain collections.
///
/// `current_profile` is stored as a snapshot and re-resolved against
/// `profiles` by id on load; a stale reference falls back to the first
/// profile.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct PersistedState {
    #[serde(default)]
    pub medications: Vec<Medication>,
    #[serde(default)]
    pub doses: Vec<MedicationDose>,
    #[serde(default)]
    pub profiles: Vec<Profile>,
    #[serde(default)]
    pub current_profile: Option<Profile>,
    #[serde(default)]
    pub app_settings: AppSettings,
}

impl PersistedState {
    /// Load state from a file with shared locking
    ///
    /// Returns default (empty) state if the file doesn't exist. A file that
    /// exists but cannot be parsed is an error: medication history must not
    /// be silently discarded.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            tracing::info!("No store file found at {:?}, starting fresh", path);
            return Ok(Self::default());
        }

        let file = File::open(path)?;
        file.lock_shared()?;

        let mut contents = String::new();
        let mut reader = std::io::BufReader::new(&file);
        let read_result = reader.read_to_string(&mut contents);
        file.unlock()?;
        read_result?;

        let mut state: PersistedState = serde_json::from_str(&contents).map_err(|e| {
            Error::State(format!("store file {:?} is corrupt: {}", path, e))
        })?;
        state.resolve_current_profile();

        tracing::debug!(
            "Loaded store from {:?}: {} medications, {} doses, {} profiles",
            path,
            state.medications.len(),
            state.doses.len(),
            state.profiles.len()
        );
        Ok(state)
    }

    /// Save state to a file with exclusive locking
    ///
    /// Atomically writes state by:
    /// 1. Writing to a temp file
    /// 2. Syncing to disk
    /// 3. Renaming over the original
    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        // Unique temp file in the same directory so the rename is atomic
        let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
            std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
        })?)?;

        temp.as_file().lock_exclusive()?;

        {
            let mut writer = std::io::BufWriter::new(temp.as_file());
            let contents = serde_json::to_string(self)?;
            writer.write_all(contents.as_bytes())?;
            writer.flush()?;
        }

        temp.as_file().sync_all()?;
        temp.as_file().unlock()?;

        temp.persist(path).map_err(|e| Error::Io(e.error))?;

        tracing::debug!("Saved store to {:?}", path);
        Ok(())
    }

    /// Re-point `current_profile` at the live entry in `profiles`.
    ///
    /// Falls back to the first profile when the stored reference is stale
    /// or absent. Leaves `None` only when there are no profiles at all.
    pub fn resolve_current_profile(&mut self) {
        let resolved = self
            .current_profile
            .as_ref()
            .and_then(|snapshot| self.profiles.iter().find(|p| p.id == snapshot.id))
            .or_else(|| self.profiles.first())
            .cloned();

        if let (Some(old), Some(new)) = (&self.current_profile, &resolved) {
            if old.id != new.id {
                tracing::warn!(
                    "Stored current profile {} is stale, falling back to {}",
                    old.id,
                    new.name
                );
            }
        }
        self.current_profile = resolved;
    }

    pub fn current_profile_id(&self) -> Option<Uuid> {
        self.current_profile.as_ref().map(|p| p.id)
    }
}
