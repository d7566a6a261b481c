//! Persistence for the tournament.
//!
//! The match log, roster and bracket live as JSONL files under
//! `<data_dir>/tournament/`; the phase is a single JSON document next to them.

pub mod jsonl;
pub mod store;

use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use thiserror::Error;
use tracing::debug;

pub use jsonl::{EntityType, JsonlReader, JsonlWriter};
pub use store::{JsonlStore, MemoryStore, TournamentSnapshot, TournamentStore};

/// Errors that can occur during storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record at {path:?} line {line}: {source}")]
    Corrupt {
        path: PathBuf,
        line: usize,
        source: serde_json::Error,
    },
}

/// A fully written temporary file waiting to replace its target.
///
/// Nothing at `target` changes until [`StagedFile::commit`].
#[derive(Debug)]
pub struct StagedFile {
    tmp: PathBuf,
    target: PathBuf,
}

impl StagedFile {
    /// Write a temporary `<target>.tmp` through `fill`.
    pub fn write<F>(target: PathBuf, fill: F) -> Result<Self, StorageError>
    where
        F: FnOnce(&mut BufWriter<File>) -> Result<(), StorageError>,
    {
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut tmp = OsString::from(target.as_os_str());
        tmp.push(".tmp");
        let staged = Self {
            tmp: PathBuf::from(tmp),
            target,
        };

        let mut writer = BufWriter::new(File::create(&staged.tmp)?);
        let written = fill(&mut writer).and_then(|_| writer.flush().map_err(StorageError::from));
        drop(writer);
        match written {
            Ok(()) => Ok(staged),
            Err(e) => {
                staged.discard();
                Err(e)
            }
        }
    }

    pub fn target(&self) -> &PathBuf {
        &self.target
    }

    /// Move the temporary file over its target.
    pub fn commit(self) -> Result<(), StorageError> {
        fs::rename(&self.tmp, &self.target)?;
        Ok(())
    }

    /// Drop the temporary file, leaving the target untouched.
    pub fn discard(self) {
        if let Err(e) = fs::remove_file(&self.tmp) {
            debug!("Could not remove {:?}: {}", self.tmp, e);
        }
    }
}

/// Configuration for storage paths.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    pub data_dir: PathBuf,
}

impl StorageConfig {
    pub fn new(data_dir: PathBuf) -> Self {
        Self { data_dir }
    }

    pub fn tournament_dir(&self) -> PathBuf {
        self.data_dir.join("tournament")
    }

    pub fn entity_path(&self, entity: EntityType) -> PathBuf {
        self.tournament_dir().join(entity.filename())
    }

    pub fn phase_path(&self) -> PathBuf {
        self.tournament_dir().join("phase.json")
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self::new(PathBuf::from("./data"))
    }
}
