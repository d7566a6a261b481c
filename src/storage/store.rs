//! Tournament store abstraction.

use std::fs;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use super::{EntityType, JsonlReader, JsonlWriter, StagedFile, StorageConfig, StorageError};
use crate::models::{BracketMatch, MatchResult, Player};
use crate::phase::TournamentPhase;

/// Everything persisted about one tournament.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TournamentSnapshot {
    pub players: Vec<Player>,
    pub matches: Vec<MatchResult>,
    pub bracket: Vec<BracketMatch>,
    pub phase: TournamentPhase,
}

/// Durable home of the tournament state.
#[async_trait]
pub trait TournamentStore: Send + Sync {
    /// Load the full state; an empty store yields the default snapshot.
    async fn load(&self) -> Result<TournamentSnapshot, StorageError>;

    /// Replace the stored state with `snapshot`.
    async fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StorageError>;

    fn name(&self) -> &str;
}

/// JSONL files under `<data_dir>/tournament/`.
pub struct JsonlStore {
    config: StorageConfig,
}

impl JsonlStore {
    pub fn new(config: StorageConfig) -> Self {
        Self { config }
    }

    fn read_phase(&self) -> Result<TournamentPhase, StorageError> {
        let path = self.config.phase_path();
        if !path.exists() {
            return Ok(TournamentPhase::default());
        }
        let content = fs::read_to_string(&path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Write every file of `snapshot` to a temporary sibling.
    fn stage(
        &self,
        snapshot: &TournamentSnapshot,
        staged: &mut Vec<StagedFile>,
    ) -> Result<(), StorageError> {
        let config = &self.config;
        staged.push(JsonlWriter::for_entity(config, EntityType::Player).stage(&snapshot.players)?);
        staged.push(JsonlWriter::for_entity(config, EntityType::Match).stage(&snapshot.matches)?);
        staged.push(JsonlWriter::for_entity(config, EntityType::Bracket).stage(&snapshot.bracket)?);
        staged.push(StagedFile::write(self.config.phase_path(), |writer| {
            serde_json::to_writer_pretty(writer, &snapshot.phase)?;
            Ok(())
        })?);
        Ok(())
    }
}

#[async_trait]
impl TournamentStore for JsonlStore {
    async fn load(&self) -> Result<TournamentSnapshot, StorageError> {
        let snapshot = TournamentSnapshot {
            players: JsonlReader::for_entity(&self.config, EntityType::Player).read_all()?,
            matches: JsonlReader::for_entity(&self.config, EntityType::Match).read_all()?,
            bracket: JsonlReader::for_entity(&self.config, EntityType::Bracket).read_all()?,
            phase: self.read_phase()?,
        };
        info!(
            "Loaded tournament from {:?}: {} players, {} matches, phase {}",
            self.config.tournament_dir(),
            snapshot.players.len(),
            snapshot.matches.len(),
            snapshot.phase.name()
        );
        Ok(snapshot)
    }

    async fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StorageError> {
        // Nothing is renamed into place until every file is fully written.
        let mut staged = Vec::with_capacity(4);
        if let Err(e) = self.stage(snapshot, &mut staged) {
            warn!("Save aborted, stored tournament left unchanged: {}", e);
            for file in staged {
                file.discard();
            }
            return Err(e);
        }
        for file in staged {
            debug!("Replacing {:?}", file.target());
            file.commit()?;
        }
        debug!("Saved tournament to {:?}", self.config.tournament_dir());
        Ok(())
    }

    fn name(&self) -> &str {
        "jsonl"
    }
}

/// Volatile store, for tests and dry runs.
#[derive(Default)]
pub struct MemoryStore {
    snapshot: Mutex<TournamentSnapshot>,
    fail_saves: AtomicBool,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_snapshot(snapshot: TournamentSnapshot) -> Self {
        Self {
            snapshot: Mutex::new(snapshot),
            fail_saves: AtomicBool::new(false),
        }
    }

    /// Make every following save fail with an IO error.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

#[async_trait]
impl TournamentStore for MemoryStore {
    async fn load(&self) -> Result<TournamentSnapshot, StorageError> {
        Ok(self.snapshot.lock().await.clone())
    }

    async fn save(&self, snapshot: &TournamentSnapshot) -> Result<(), StorageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(StorageError::Io(std::io::Error::new(
                std::io::ErrorKind::Other,
                "memory store set to fail",
            )));
        }
        *self.snapshot.lock().await = snapshot.clone();
        Ok(())
    }

    fn name(&self) -> &str {
        "memory"
    }
}
