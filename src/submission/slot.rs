//! Single-entry handoff store
//!
//! Holds at most one serialized `SubmissionRecord` under a fixed name. The form
//! writes it, the confirmation view takes it (read, then delete).

use anyhow::Result;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

use super::SubmissionRecord;

/// Fixed key the record lives under
pub const SLOT_NAME: &str = "formSubmission";

#[derive(Debug, Error)]
pub enum SlotError {
    #[error("slot I/O failed at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("slot contents are not a valid submission: {0}")]
    Corrupt(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct DurableSlot {
    path: PathBuf,
}

impl DurableSlot {
    pub fn at(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// `<data dir>/formgate/formSubmission.json`
    pub fn default_location() -> Result<Self> {
        let dir = dirs::data_local_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not find data directory"))?
            .join("formgate");
        Ok(Self::at(dir.join(format!("{}.json", SLOT_NAME))))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_err(&self, source: std::io::Error) -> SlotError {
        SlotError::Io { path: self.path.clone(), source }
    }

    /// Store a record, replacing whatever was there.
    pub fn write(&self, record: &SubmissionRecord) -> Result<(), SlotError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| self.io_err(e))?;
        }

        let json = serde_json::to_string(record)?;

        // Write beside the slot then rename so a reader never sees half a record
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, json).map_err(|e| self.io_err(e))?;
        if let Err(e) = fs::rename(&tmp, &self.path) {
            let _ = fs::remove_file(&tmp);
            return Err(self.io_err(e));
        }

        tracing::info!("Submission stored in {}", self.path.display());
        Ok(())
    }

    fn read_raw(&self) -> Result<Option<String>, SlotError> {
        match fs::read_to_string(&self.path) {
            Ok(content) => Ok(Some(content)),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(self.io_err(e)),
        }
    }

    /// Read the record without consuming it
    pub fn peek(&self) -> Result<Option<SubmissionRecord>, SlotError> {
        match self.read_raw()? {
            Some(content) => Ok(Some(serde_json::from_str(&content)?)),
            None => Ok(None),
        }
    }

    /// Read the record and delete it. The slot is empty afterwards even if the
    /// contents failed to parse.
    pub fn take(&self) -> Result<Option<SubmissionRecord>, SlotError> {
        let Some(content) = self.read_raw()? else {
            return Ok(None);
        };

        match fs::remove_file(&self.path) {
            Ok(()) => {}
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(self.io_err(e)),
        }

        let record = serde_json::from_str(&content)?;
        tracing::debug!("Submission taken from {}", self.path.display());
        Ok(Some(record))
    }

    pub fn is_empty(&self) -> bool {
        !self.path.exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use std::collections::BTreeMap;

    fn record(name: &str) -> SubmissionRecord {
        let mut fields = BTreeMap::new();
        fields.insert("firstName".to_string(), name.to_string());
        SubmissionRecord::new(fields, Utc.with_ymd_and_hms(2026, 10, 19, 9, 30, 0).unwrap())
    }

    #[test]
    fn test_take_reads_then_deletes() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("formSubmission.json"));

        slot.write(&record("Ada")).unwrap();
        assert!(!slot.is_empty());

        let taken = slot.take().unwrap().unwrap();
        assert_eq!(taken.fields["firstName"], "Ada");
        assert!(slot.is_empty());
        assert!(slot.take().unwrap().is_none());
    }

    #[test]
    fn test_write_replaces_existing_record() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("nested").join("slot.json"));

        slot.write(&record("Ada")).unwrap();
        slot.write(&record("Grace")).unwrap();

        assert_eq!(slot.peek().unwrap().unwrap().fields["firstName"], "Grace");
        // peek leaves it in place
        assert!(!slot.is_empty());
    }

    #[test]
    fn test_failed_write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        // A directory at the slot path makes the rename fail
        let path = dir.path().join("slot.json");
        fs::create_dir(&path).unwrap();
        fs::write(path.join("keep"), "x").unwrap();

        let slot = DurableSlot::at(&path);
        assert!(matches!(slot.write(&record("Ada")), Err(SlotError::Io { .. })));
        assert!(!path.with_extension("json.tmp").exists());
    }

    #[test]
    fn test_missing_slot_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let slot = DurableSlot::at(dir.path().join("absent.json"));
        assert!(slot.peek().unwrap().is_none());
        assert!(slot.take().unwrap().is_none());
    }

    #[test]
    fn test_corrupt_slot_is_cleared() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("slot.json");
        fs::write(&path, "{not json").unwrap();

        let slot = DurableSlot::at(&path);
        assert!(matches!(slot.take(), Err(SlotError::Corrupt(_))));
        assert!(slot.is_empty());
    }
}
