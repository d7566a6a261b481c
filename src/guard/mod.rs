//! Consistency guard: freezing and recovering matchdays.
//!
//! A matchday counts towards the standings all-or-nothing. Freezing an
//! incomplete matchday moves every one of its matches to `to_recover`
//! (snapshotting any score into `original_data`), and the standings filter
//! ignores the whole matchday until no `to_recover` match is left in it.
//!
//! Functions here are pure: they return updated copies and leave committing
//! them to the caller.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::models::{MatchId, MatchResult, MatchScore, MatchStatus, OriginalData, ScoreError};

/// Errors raised while resolving a recovery match.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("Match not found: {0}")]
    MatchNotFound(MatchId),

    #[error("Match {0} is not awaiting recovery")]
    NotInRecovery(MatchId),

    #[error("Match {0} has no stored result; a late result is required")]
    NoResultToRestore(MatchId),

    #[error("Invalid score: {0}")]
    InvalidScore(#[from] ScoreError),
}

/// Why a freeze was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FreezeRejection {
    AlreadyFullyCompleted,
    NotFound,
}

impl std::fmt::Display for FreezeRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FreezeRejection::AlreadyFullyCompleted => write!(f, "already_fully_completed"),
            FreezeRejection::NotFound => write!(f, "not_found"),
        }
    }
}

/// Result of a freeze request.
#[derive(Debug, Clone, PartialEq)]
pub enum FreezeOutcome {
    /// Matches newly moved to `to_recover`
    Frozen(Vec<MatchResult>),
    Rejected(FreezeRejection),
}

/// Result of resolving a recovery match.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    /// The resolved match first, followed by any siblings restored with it
    pub updated: Vec<MatchResult>,

    /// True when the matchday counts towards the standings again
    pub matchday_unfrozen: bool,
}

fn round_robin_day(matches: &[MatchResult], matchday: u32) -> impl Iterator<Item = &MatchResult> {
    matches
        .iter()
        .filter(move |m| m.is_round_robin() && m.matchday_number == matchday)
}

/// Matchdays currently excluded from the standings.
pub fn frozen_matchdays(matches: &[MatchResult]) -> BTreeSet<u32> {
    matches
        .iter()
        .filter(|m| m.is_round_robin() && m.status == MatchStatus::ToRecover)
        .map(|m| m.matchday_number)
        .collect()
}

/// The matches the standings calculator may see: round-robin only, frozen
/// matchdays dropped entirely, ordered by creation time then id.
pub fn standings_input(matches: &[MatchResult]) -> Vec<&MatchResult> {
    let frozen = frozen_matchdays(matches);
    let mut input: Vec<&MatchResult> = matches
        .iter()
        .filter(|m| m.is_round_robin() && !frozen.contains(&m.matchday_number))
        .collect();
    input.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    input
}

fn freeze(m: &MatchResult) -> MatchResult {
    let mut frozen = m.clone();
    frozen.original_data = Some(OriginalData {
        score: m.score,
        status: m.status,
    });
    frozen.score = None;
    frozen.status = MatchStatus::ToRecover;
    frozen
}

/// Suspend an incomplete matchday.
///
/// Every match of the matchday not already frozen is returned in its frozen
/// form, including matches that were completed.
pub fn freeze_matchday(matches: &[MatchResult], matchday: u32) -> FreezeOutcome {
    let day: Vec<&MatchResult> = round_robin_day(matches, matchday).collect();

    if day.is_empty() {
        warn!("Freeze rejected: matchday {} not found", matchday);
        return FreezeOutcome::Rejected(FreezeRejection::NotFound);
    }
    if day.iter().all(|m| m.is_completed()) {
        warn!("Freeze rejected: matchday {} is fully completed", matchday);
        return FreezeOutcome::Rejected(FreezeRejection::AlreadyFullyCompleted);
    }

    let frozen: Vec<MatchResult> = day
        .into_iter()
        .filter(|m| m.status != MatchStatus::ToRecover)
        .map(freeze)
        .collect();

    info!("Froze {} matches of matchday {}", frozen.len(), matchday);
    FreezeOutcome::Frozen(frozen)
}

fn restore(m: &MatchResult, score: MatchScore) -> MatchResult {
    let mut restored = m.clone();
    restored.score = Some(score);
    restored.status = MatchStatus::Completed;
    restored.original_data = None;
    restored
}

/// Resolve a `to_recover` match with a late result, or restore its snapshot
/// when no result is given.
///
/// When every other frozen match of the matchday still holds a snapshot
/// score, those are restored too and the matchday is unfrozen.
pub fn resolve_recovery_match(
    matches: &[MatchResult],
    match_id: &MatchId,
    result: Option<MatchScore>,
) -> Result<Resolution, GuardError> {
    let target = matches
        .iter()
        .find(|m| &m.id == match_id)
        .ok_or_else(|| GuardError::MatchNotFound(match_id.clone()))?;

    if target.status != MatchStatus::ToRecover {
        return Err(GuardError::NotInRecovery(match_id.clone()));
    }

    let score = match result {
        Some(score) => {
            score.validate()?;
            score
        }
        None => target
            .original_data
            .and_then(|o| o.score)
            .ok_or_else(|| GuardError::NoResultToRestore(match_id.clone()))?,
    };

    let mut updated = vec![restore(target, score)];

    let siblings: Vec<&MatchResult> = round_robin_day(matches, target.matchday_number)
        .filter(|m| m.id != target.id && m.status == MatchStatus::ToRecover)
        .collect();
    let restorable: Option<Vec<MatchResult>> = siblings
        .iter()
        .map(|m| m.original_data.and_then(|o| o.score).map(|s| restore(m, s)))
        .collect();

    let matchday_unfrozen = match restorable {
        Some(restored) => {
            updated.extend(restored);
            true
        }
        None => false,
    };

    if matchday_unfrozen {
        info!(
            "Matchday {} unfrozen after resolving {}",
            target.matchday_number, match_id
        );
    } else {
        info!(
            "Resolved {}; matchday {} still has outstanding matches",
            match_id, target.matchday_number
        );
    }

    Ok(Resolution {
        updated,
        matchday_unfrozen,
    })
}

/// Replace matches by id with their updated versions.
pub fn apply_updates(matches: &mut [MatchResult], updated: &[MatchResult]) {
    for new in updated {
        if let Some(slot) = matches.iter_mut().find(|m| m.id == new.id) {
            *slot = new.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calculate::compute_standings;
    use crate::models::{MatchPhase, Player, PlayerId, Team};
    use pretty_assertions::assert_eq;

    fn team(a: &str, b: &str) -> Team {
        Team::new(PlayerId::from(a), PlayerId::from(b))
    }

    fn roster() -> Vec<Player> {
        (b'a'..=b'p')
            .map(|c| {
                let id = (c as char).to_string();
                Player::new(id.as_str(), id.to_uppercase())
            })
            .collect()
    }

    /// Matchday 1 fully played, matchday 2 with `completed_on_day_two` of 4 played.
    fn league(completed_on_day_two: usize) -> Vec<MatchResult> {
        let day_one = [
            (team("a", "b"), team("c", "d"), MatchScore::new(3, 0).with_games(18, 6)),
            (team("e", "f"), team("g", "h"), MatchScore::new(2, 1).with_games(15, 12)),
            (team("i", "j"), team("k", "l"), MatchScore::new(1, 2).with_games(13, 14)),
            (team("m", "n"), team("o", "p"), MatchScore::new(0, 3).with_games(5, 18)),
        ];
        let day_two = [
            (team("a", "c"), team("e", "g"), MatchScore::new(2, 1).with_games(14, 12)),
            (team("b", "d"), team("f", "h"), MatchScore::new(1, 2).with_games(12, 15)),
            (team("i", "k"), team("m", "o"), MatchScore::new(3, 0).with_games(18, 9)),
            (team("j", "l"), team("n", "p"), MatchScore::new(2, 1).with_games(16, 15)),
        ];

        let mut log = Vec::new();
        for (a, b, score) in day_one {
            let mut m = MatchResult::round_robin(1, a, b);
            m.record_score(score).unwrap();
            log.push(m);
        }
        for (i, (a, b, score)) in day_two.into_iter().enumerate() {
            let mut m = MatchResult::round_robin(2, a, b);
            if i < completed_on_day_two {
                m.record_score(score).unwrap();
            }
            log.push(m);
        }
        log
    }

    fn standings(log: &[MatchResult]) -> Vec<crate::models::StandingRow> {
        compute_standings(&roster(), standings_input(log))
    }

    fn frozen(outcome: FreezeOutcome) -> Vec<MatchResult> {
        match outcome {
            FreezeOutcome::Frozen(m) => m,
            FreezeOutcome::Rejected(r) => panic!("unexpected rejection: {}", r),
        }
    }

    #[test]
    fn test_freeze_not_found() {
        let log = league(3);
        assert_eq!(
            freeze_matchday(&log, 7),
            FreezeOutcome::Rejected(FreezeRejection::NotFound)
        );
    }

    #[test]
    fn test_freeze_fully_completed_rejected() {
        let log = league(3);
        assert_eq!(
            freeze_matchday(&log, 1),
            FreezeOutcome::Rejected(FreezeRejection::AlreadyFullyCompleted)
        );
    }

    #[test]
    fn test_freeze_snapshots_and_clears_scores() {
        let log = league(3);
        let changed = frozen(freeze_matchday(&log, 2));

        assert_eq!(changed.len(), 4);
        for m in &changed {
            assert_eq!(m.status, MatchStatus::ToRecover);
            assert!(m.score.is_none());
            assert!(m.original_data.is_some());
        }
        let with_scores = changed
            .iter()
            .filter(|m| m.original_data.unwrap().score.is_some())
            .count();
        assert_eq!(with_scores, 3);
        assert_eq!(
            changed[3].original_data.unwrap().status,
            MatchStatus::Scheduled
        );
    }

    #[test]
    fn test_frozen_matchday_excluded_from_standings() {
        let mut log = league(3);
        let changed = frozen(freeze_matchday(&log, 2));
        apply_updates(&mut log, &changed);

        assert_eq!(frozen_matchdays(&log), BTreeSet::from([2]));
        let input = standings_input(&log);
        assert_eq!(input.len(), 4);
        assert!(input.iter().all(|m| m.matchday_number == 1));

        let day_one_only: Vec<MatchResult> = league(0)
            .into_iter()
            .filter(|m| m.matchday_number == 1)
            .collect();
        assert_eq!(standings(&log), standings(&day_one_only));
    }

    #[test]
    fn test_freeze_resolve_round_trip_matches_never_frozen() {
        let mut log = league(3);
        let changed = frozen(freeze_matchday(&log, 2));
        apply_updates(&mut log, &changed);

        let outstanding = log
            .iter()
            .find(|m| m.matchday_number == 2 && m.original_data.unwrap().score.is_none())
            .unwrap()
            .id
            .clone();
        let late = MatchScore::new(2, 1).with_games(16, 15);
        let resolution = resolve_recovery_match(&log, &outstanding, Some(late)).unwrap();

        assert!(resolution.matchday_unfrozen);
        assert_eq!(resolution.updated.len(), 4);
        assert_eq!(resolution.updated[0].id, outstanding);
        apply_updates(&mut log, &resolution.updated);

        assert!(frozen_matchdays(&log).is_empty());
        assert!(log.iter().all(|m| m.original_data.is_none()));
        assert_eq!(standings(&log), standings(&league(4)));
    }

    #[test]
    fn test_restoring_snapshot_keeps_matchday_frozen_while_outstanding() {
        let mut log = league(3);
        let changed = frozen(freeze_matchday(&log, 2));
        apply_updates(&mut log, &changed);

        let restorable = log
            .iter()
            .find(|m| m.matchday_number == 2 && m.original_data.unwrap().score.is_some())
            .unwrap()
            .id
            .clone();
        let resolution = resolve_recovery_match(&log, &restorable, None).unwrap();

        assert!(!resolution.matchday_unfrozen);
        assert_eq!(resolution.updated.len(), 1);
        assert_eq!(resolution.updated[0].status, MatchStatus::Completed);
        apply_updates(&mut log, &resolution.updated);
        assert_eq!(frozen_matchdays(&log), BTreeSet::from([2]));
    }

    #[test]
    fn test_resolve_errors() {
        let mut log = league(3);
        let completed = log[0].id.clone();
        assert_eq!(
            resolve_recovery_match(&log, &completed, None),
            Err(GuardError::NotInRecovery(completed))
        );

        let missing = MatchId::from("nope");
        assert_eq!(
            resolve_recovery_match(&log, &missing, None),
            Err(GuardError::MatchNotFound(missing))
        );

        let changed = frozen(freeze_matchday(&log, 2));
        apply_updates(&mut log, &changed);
        let unplayed = log[7].id.clone();
        assert_eq!(
            resolve_recovery_match(&log, &unplayed, None),
            Err(GuardError::NoResultToRestore(unplayed.clone()))
        );
        assert!(matches!(
            resolve_recovery_match(&log, &unplayed, Some(MatchScore::new(2, 2))),
            Err(GuardError::InvalidScore(_))
        ));
    }

    #[test]
    fn test_knockout_matches_never_reach_standings() {
        let mut log = league(4);
        let mut ko = MatchResult::knockout(&"final".into(), 1, team("a", "b"), team("c", "d"));
        ko.record_score(MatchScore::new(3, 0)).unwrap();
        assert_eq!(ko.phase, MatchPhase::Knockout);
        log.push(ko);

        assert_eq!(standings_input(&log).len(), 8);
    }
}
