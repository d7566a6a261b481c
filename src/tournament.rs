//! Tournament service: the single writer over the persisted tournament.
//!
//! Every mutation runs under the write lock as one transaction: the change is
//! computed on a copy of the state, saved through the store, and only then
//! swapped in. A failed step leaves both memory and disk untouched.

use std::sync::{Arc, Mutex};

use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, warn};

use crate::calculate::compute_standings;
use crate::config::{BracketConfig, SchedulerConfig};
use crate::guard::{self, FreezeOutcome, GuardError, Resolution};
use crate::models::{
    BracketMatch, MatchId, MatchPhase, MatchResult, MatchScore, Player, ResultError, StandingRow,
};
use crate::phase::{self, PhaseError, TournamentPhase};
use crate::schedule::{self, GenerationOutcome, GenerationRejection};
use crate::storage::{StorageError, TournamentSnapshot, TournamentStore};

/// Errors surfaced by the service.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error(transparent)]
    Guard(#[from] GuardError),

    #[error(transparent)]
    Phase(#[from] PhaseError),

    #[error(transparent)]
    Match(#[from] ResultError),

    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Player name must not be empty")]
    InvalidPlayerName,

    #[error("Operation needs phase {expected}, tournament is {actual}")]
    WrongPhase {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Round-robin still has open matches")]
    IncompleteRoundRobin,
}

#[derive(Debug)]
struct ServiceState {
    snapshot: TournamentSnapshot,
    revision: u64,
}

/// Owns the in-memory projection of the tournament and its store.
pub struct TournamentService {
    store: Arc<dyn TournamentStore>,
    state: RwLock<ServiceState>,
    standings_cache: Mutex<Option<(u64, Vec<StandingRow>)>>,
    scheduler: SchedulerConfig,
    bracket: BracketConfig,
}

impl TournamentService {
    /// Load the tournament from `store`.
    pub async fn open(
        store: Arc<dyn TournamentStore>,
        scheduler: SchedulerConfig,
        bracket: BracketConfig,
    ) -> Result<Self, ServiceError> {
        let snapshot = store.load().await?;
        info!(
            "Tournament opened from {} store: {} players, {} matches, phase {}",
            store.name(),
            snapshot.players.len(),
            snapshot.matches.len(),
            snapshot.phase.name()
        );
        Ok(Self {
            store,
            state: RwLock::new(ServiceState {
                snapshot,
                revision: 0,
            }),
            standings_cache: Mutex::new(None),
            scheduler,
            bracket,
        })
    }

    /// Run `op` against a copy of the state and commit it when it reports a
    /// change.
    async fn transact<T, F>(&self, op: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&mut TournamentSnapshot) -> Result<(T, bool), ServiceError>,
    {
        let mut state = self.state.write().await;
        let mut next = state.snapshot.clone();
        let (value, changed) = op(&mut next)?;
        if changed {
            self.store.save(&next).await?;
            state.snapshot = next;
            state.revision += 1;
        }
        Ok(value)
    }

    pub async fn players(&self) -> Vec<Player> {
        self.state.read().await.snapshot.players.clone()
    }

    pub async fn matches(&self) -> Vec<MatchResult> {
        self.state.read().await.snapshot.matches.clone()
    }

    pub async fn phase(&self) -> TournamentPhase {
        self.state.read().await.snapshot.phase.clone()
    }

    pub async fn bracket(&self) -> Vec<BracketMatch> {
        self.state.read().await.snapshot.bracket.clone()
    }

    /// Current league table, recomputed only after a write.
    pub async fn standings(&self) -> Vec<StandingRow> {
        let state = self.state.read().await;
        if let Ok(cache) = self.standings_cache.lock() {
            if let Some((revision, table)) = cache.as_ref() {
                if *revision == state.revision {
                    return table.clone();
                }
            }
        }

        let table = current_standings(&state.snapshot);
        if let Ok(mut cache) = self.standings_cache.lock() {
            *cache = Some((state.revision, table.clone()));
        }
        table
    }

    /// Add a player to the roster while the round-robin is open.
    pub async fn register_player(&self, name: &str) -> Result<Player, ServiceError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ServiceError::InvalidPlayerName);
        }
        self.transact(|snap| {
            require_open(&snap.phase)?;
            let player = Player::register(name);
            info!("Registered player {} ({})", player.name, player.id);
            snap.players.push(player.clone());
            Ok((player, true))
        })
        .await
    }

    /// Generate the next matchday. A completed round-robin closes the phase.
    pub async fn generate_next_matchday(&self) -> Result<GenerationOutcome, ServiceError> {
        let config = self.scheduler.clone();
        self.transact(move |snap| {
            if !snap.phase.is_round_robin_open() {
                return Ok((
                    GenerationOutcome::Rejected(GenerationRejection::RoundRobinComplete),
                    false,
                ));
            }

            let outcome = schedule::generate_next_matchday(&snap.players, &snap.matches, &config);
            let changed = match &outcome {
                GenerationOutcome::Created { matches, .. } => {
                    snap.matches.extend(matches.iter().cloned());
                    true
                }
                GenerationOutcome::Rejected(GenerationRejection::RoundRobinComplete) => {
                    let table = current_standings(snap);
                    snap.phase = snap.phase.close_round_robin(table)?;
                    true
                }
                GenerationOutcome::Rejected(_) => false,
            };
            Ok((outcome, changed))
        })
        .await
    }

    pub async fn confirm_match(&self, id: &MatchId) -> Result<MatchResult, ServiceError> {
        self.transact(|snap| {
            let m = find_match(&mut snap.matches, id)?;
            m.confirm()?;
            info!("Confirmed match {}", id);
            Ok((m.clone(), true))
        })
        .await
    }

    /// Enter a result. Knockout results advance the bracket, schedule any
    /// bracket match that became ready, and finish the tournament after the
    /// final.
    pub async fn record_result(
        &self,
        id: &MatchId,
        score: MatchScore,
    ) -> Result<MatchResult, ServiceError> {
        self.transact(|snap| {
            let m = find_match(&mut snap.matches, id)?;
            if m.phase == MatchPhase::Knockout
                && !matches!(snap.phase, TournamentPhase::KnockoutActive { .. })
            {
                return Err(ServiceError::WrongPhase {
                    expected: "knockout_active",
                    actual: snap.phase.name(),
                });
            }
            m.record_score(score)?;
            let updated = m.clone();
            info!("Recorded {}-{} for match {}", score.sets_a, score.sets_b, id);

            if updated.phase == MatchPhase::Knockout {
                let completed = phase::complete_bracket_match(&mut snap.bracket, id, score)?;
                match phase::advance_bracket(&mut snap.bracket, &completed)? {
                    Some(_) => {
                        let created = phase::schedule_ready(&mut snap.bracket);
                        snap.matches.extend(created);
                    }
                    None => {
                        let champions = completed.winner().cloned().ok_or_else(|| {
                            PhaseError::BracketMatchNotCompleted(completed.id.clone())
                        })?;
                        snap.phase = snap.phase.finish(champions)?;
                    }
                }
            }
            Ok((updated, true))
        })
        .await
    }

    pub async fn freeze_matchday(&self, matchday: u32) -> Result<FreezeOutcome, ServiceError> {
        self.transact(|snap| {
            let outcome = guard::freeze_matchday(&snap.matches, matchday);
            let changed = match &outcome {
                FreezeOutcome::Frozen(frozen) => {
                    guard::apply_updates(&mut snap.matches, frozen);
                    !frozen.is_empty()
                }
                FreezeOutcome::Rejected(_) => false,
            };
            Ok((outcome, changed))
        })
        .await
    }

    pub async fn resolve_recovery_match(
        &self,
        id: &MatchId,
        result: Option<MatchScore>,
    ) -> Result<Resolution, ServiceError> {
        self.transact(|snap| {
            let resolution = guard::resolve_recovery_match(&snap.matches, id, result)?;
            guard::apply_updates(&mut snap.matches, &resolution.updated);
            Ok((resolution, true))
        })
        .await
    }

    /// Close the round-robin (if still open) and seed the knockout bracket
    /// from the frozen final table.
    pub async fn close_round_robin_and_seed_bracket(
        &self,
    ) -> Result<Vec<BracketMatch>, ServiceError> {
        let max_players = self.bracket.max_players;
        self.transact(move |snap| {
            if snap.phase.is_round_robin_open() {
                if snap
                    .matches
                    .iter()
                    .any(|m| m.is_round_robin() && m.is_unresolved())
                {
                    return Err(ServiceError::IncompleteRoundRobin);
                }
                let table = current_standings(snap);
                snap.phase = snap.phase.close_round_robin(table)?;
            }

            let final_table = match &snap.phase {
                TournamentPhase::RoundRobinCompleted { final_table, .. } => final_table.clone(),
                other => {
                    return Err(ServiceError::WrongPhase {
                        expected: "round_robin_completed",
                        actual: other.name(),
                    })
                }
            };

            let mut bracket = phase::close_round_robin_and_seed_bracket(&final_table, max_players)?;
            let created = phase::schedule_ready(&mut bracket);
            snap.matches.extend(created);
            snap.bracket = bracket.clone();
            snap.phase = snap.phase.start_knockout()?;
            Ok((bracket, true))
        })
        .await
    }
}

fn current_standings(snap: &TournamentSnapshot) -> Vec<StandingRow> {
    compute_standings(&snap.players, guard::standings_input(&snap.matches))
}

fn require_open(phase: &TournamentPhase) -> Result<(), ServiceError> {
    if phase.is_round_robin_open() {
        Ok(())
    } else {
        warn!("Rejected roster change in phase {}", phase.name());
        Err(ServiceError::WrongPhase {
            expected: "round_robin_open",
            actual: phase.name(),
        })
    }
}

fn find_match<'a>(
    matches: &'a mut [MatchResult],
    id: &MatchId,
) -> Result<&'a mut MatchResult, ServiceError> {
    matches
        .iter_mut()
        .find(|m| &m.id == id)
        .ok_or_else(|| ServiceError::MatchNotFound(id.clone()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::guard::FreezeRejection;
    use crate::models::MatchStatus;
    use crate::storage::{JsonlStore, MemoryStore, StorageConfig};

    async fn service_with(store: Arc<MemoryStore>) -> TournamentService {
        TournamentService::open(store, SchedulerConfig::default(), BracketConfig::default())
            .await
            .unwrap()
    }

    async fn league(n: usize) -> (TournamentService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        let service = service_with(store.clone()).await;
        for i in 0..n {
            service
                .register_player(&format!("Player {:02}", i))
                .await
                .unwrap();
        }
        (service, store)
    }

    async fn play_open_matches(service: &TournamentService) {
        for m in service.matches().await {
            if m.is_unresolved() {
                service
                    .record_result(&m.id, MatchScore::new(2, 1).with_games(13, 11))
                    .await
                    .unwrap();
            }
        }
    }

    fn created(outcome: GenerationOutcome) -> Vec<MatchResult> {
        match outcome {
            GenerationOutcome::Created { matches, .. } => matches,
            GenerationOutcome::Rejected(r) => panic!("unexpected rejection {}", r),
        }
    }

    #[tokio::test]
    async fn test_register_rejects_blank_name() {
        let (service, _) = league(0).await;
        assert!(matches!(
            service.register_player("   ").await,
            Err(ServiceError::InvalidPlayerName)
        ));
    }

    #[tokio::test]
    async fn test_generate_persists_matchday() {
        let (service, store) = league(8).await;
        let matches = created(service.generate_next_matchday().await.unwrap());
        assert_eq!(matches.len(), 2);

        let stored = store.load().await.unwrap();
        assert_eq!(stored.matches, matches);
        assert_eq!(stored.players.len(), 8);
    }

    #[tokio::test]
    async fn test_rejection_writes_nothing() {
        let (service, _) = league(8).await;
        created(service.generate_next_matchday().await.unwrap());
        assert_eq!(
            service.generate_next_matchday().await.unwrap(),
            GenerationOutcome::Rejected(GenerationRejection::IncompletePreviousRound)
        );
        assert_eq!(service.matches().await.len(), 2);
    }

    #[tokio::test]
    async fn test_failed_save_leaves_state_untouched() {
        let (service, store) = league(4).await;
        store.fail_saves(true);
        assert!(matches!(
            service.generate_next_matchday().await,
            Err(ServiceError::Storage(_))
        ));
        assert!(service.matches().await.is_empty());
    }

    #[tokio::test]
    async fn test_standings_cache_invalidated_on_write() {
        let (service, _) = league(4).await;
        let before = service.standings().await;
        assert!(before.iter().all(|r| r.points == 0));

        let m = created(service.generate_next_matchday().await.unwrap()).remove(0);
        assert_eq!(service.standings().await, before);

        service
            .record_result(&m.id, MatchScore::new(3, 0).with_games(9, 4))
            .await
            .unwrap();
        let after = service.standings().await;
        assert_eq!(after[0].points, 3);
        assert!(m.team_a.players().contains(&after[0].player_id));
    }

    #[tokio::test]
    async fn test_confirm_then_record() {
        let (service, _) = league(4).await;
        let m = created(service.generate_next_matchday().await.unwrap()).remove(0);

        let confirmed = service.confirm_match(&m.id).await.unwrap();
        assert_eq!(confirmed.status, MatchStatus::Confirmed);
        assert!(matches!(
            service.confirm_match(&m.id).await,
            Err(ServiceError::Match(ResultError::InvalidTransition { .. }))
        ));
        assert!(matches!(
            service.confirm_match(&MatchId::from("missing")).await,
            Err(ServiceError::MatchNotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_freeze_and_resolve_through_service() {
        let (service, _) = league(8).await;
        let matches = created(service.generate_next_matchday().await.unwrap());
        service
            .record_result(&matches[0].id, MatchScore::new(3, 0))
            .await
            .unwrap();

        let outcome = service.freeze_matchday(1).await.unwrap();
        assert!(matches!(outcome, FreezeOutcome::Frozen(ref f) if f.len() == 2));
        assert!(service.standings().await.iter().all(|r| r.played == 0));
        assert_eq!(
            service.freeze_matchday(9).await.unwrap(),
            FreezeOutcome::Rejected(FreezeRejection::NotFound)
        );

        let resolution = service
            .resolve_recovery_match(&matches[1].id, Some(MatchScore::new(1, 2)))
            .await
            .unwrap();
        assert!(resolution.matchday_unfrozen);
        assert!(service.standings().await.iter().all(|r| r.played == 1));
    }

    #[tokio::test]
    async fn test_full_tournament_to_champions() {
        let (service, _) = league(4).await;

        for _ in 0..3 {
            created(service.generate_next_matchday().await.unwrap());
            play_open_matches(&service).await;
        }
        assert_eq!(
            service.generate_next_matchday().await.unwrap(),
            GenerationOutcome::Rejected(GenerationRejection::RoundRobinComplete)
        );
        assert_eq!(service.phase().await.name(), "round_robin_completed");
        assert!(matches!(
            service.register_player("Late").await,
            Err(ServiceError::WrongPhase { .. })
        ));

        let bracket = service.close_round_robin_and_seed_bracket().await.unwrap();
        assert_eq!(bracket.len(), 1);
        assert_eq!(service.phase().await.name(), "knockout_active");

        let final_match = service
            .matches()
            .await
            .into_iter()
            .find(|m| m.phase == MatchPhase::Knockout)
            .unwrap();
        service
            .record_result(&final_match.id, MatchScore::new(0, 3))
            .await
            .unwrap();

        match service.phase().await {
            TournamentPhase::KnockoutCompleted { champions, .. } => {
                assert_eq!(champions, final_match.team_b);
            }
            other => panic!("unexpected phase {}", other.name()),
        }
        assert!(matches!(
            service.close_round_robin_and_seed_bracket().await,
            Err(ServiceError::WrongPhase { .. })
        ));
    }

    #[tokio::test]
    async fn test_knockout_advancement_creates_next_match() {
        let (service, _) = league(8).await;
        created(service.generate_next_matchday().await.unwrap());
        play_open_matches(&service).await;

        let bracket = service.close_round_robin_and_seed_bracket().await.unwrap();
        assert_eq!(bracket.len(), 3);

        let semis: Vec<MatchResult> = service
            .matches()
            .await
            .into_iter()
            .filter(|m| m.phase == MatchPhase::Knockout)
            .collect();
        assert_eq!(semis.len(), 2);

        service
            .record_result(&semis[0].id, MatchScore::new(3, 0))
            .await
            .unwrap();
        let final_slot = service
            .bracket()
            .await
            .into_iter()
            .find(|b| b.is_final())
            .unwrap();
        assert_eq!(final_slot.team_a.team(), Some(&semis[0].team_a));
        assert!(final_slot.team_b.is_placeholder());

        service
            .record_result(&semis[1].id, MatchScore::new(1, 2))
            .await
            .unwrap();
        let finals: Vec<MatchResult> = service
            .matches()
            .await
            .into_iter()
            .filter(|m| m.phase == MatchPhase::Knockout && m.matchday_number == 2)
            .collect();
        assert_eq!(finals.len(), 1);
        assert_eq!(finals[0].team_b, semis[1].team_b);
    }

    #[tokio::test]
    async fn test_close_rejected_with_open_matches() {
        let (service, _) = league(4).await;
        created(service.generate_next_matchday().await.unwrap());
        assert!(matches!(
            service.close_round_robin_and_seed_bracket().await,
            Err(ServiceError::IncompleteRoundRobin)
        ));
    }

    #[tokio::test]
    async fn test_state_survives_reopen() {
        let (service, store) = league(4).await;
        created(service.generate_next_matchday().await.unwrap());
        drop(service);

        let reopened = service_with(store).await;
        assert_eq!(reopened.players().await.len(), 4);
        assert_eq!(reopened.matches().await.len(), 1);
    }

    #[tokio::test]
    async fn test_failed_disk_save_leaves_stored_tournament_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config = StorageConfig::new(dir.path().to_path_buf());
        let open = |config: StorageConfig| async move {
            TournamentService::open(
                Arc::new(JsonlStore::new(config)),
                SchedulerConfig::default(),
                BracketConfig::default(),
            )
            .await
            .unwrap()
        };

        let service = open(config.clone()).await;
        for i in 0..4 {
            service
                .register_player(&format!("Player {:02}", i))
                .await
                .unwrap();
        }

        // The phase document cannot be written; matches and bracket could.
        let blocked = config.tournament_dir().join("phase.json.tmp");
        std::fs::create_dir_all(&blocked).unwrap();
        assert!(matches!(
            service.close_round_robin_and_seed_bracket().await,
            Err(ServiceError::Storage(_))
        ));
        assert!(service.phase().await.is_round_robin_open());
        assert!(service.matches().await.is_empty());
        std::fs::remove_dir(&blocked).unwrap();

        let reopened = open(config).await;
        assert_eq!(reopened.players().await.len(), 4);
        assert!(reopened.phase().await.is_round_robin_open());
        assert!(reopened.matches().await.is_empty());
        assert!(reopened.bracket().await.is_empty());
    }
}
