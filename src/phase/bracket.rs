//! Seeding and advancing the single-elimination bracket.
//!
//! The top of the final table is dealt into groups of four in snake order.
//! Each group forms one first-round match: best and worst seed together
//! against the two middle seeds. Every later round is created up front as
//! placeholders fed by `winner_advances_to` links.

use tracing::{debug, info, warn};

use super::PhaseError;
use crate::models::{
    BracketId, BracketMatch, BracketSlot, BracketStatus, MatchId, MatchResult, MatchScore,
    PlayerId, Side, SlotRef, StandingRow, Team,
};

/// Most first-round matches (quarter-finals).
const MAX_FIRST_ROUND_MATCHES: usize = 4;

/// Slot name for match `number` (1-based) in a round of `matches_in_round`.
fn slot_id(matches_in_round: usize, number: usize) -> BracketId {
    match matches_in_round {
        1 => BracketId::from("final"),
        2 => BracketId::from(format!("semi_{}", number)),
        4 => BracketId::from(format!("quarter_{}", number)),
        n => BracketId::from(format!("round_of_{}_{}", n * 2, number)),
    }
}

/// First-round match count: largest power of two fitting `players / 4`, capped.
fn first_round_matches(players: usize) -> usize {
    let groups = (players / 4).min(MAX_FIRST_ROUND_MATCHES);
    if groups == 0 {
        return 0;
    }
    1 << (usize::BITS - 1 - groups.leading_zeros())
}

/// Standard bracket order of group indices, keeping the strongest groups
/// apart until the final: 1 → [0], 2 → [0, 1], 4 → [0, 3, 1, 2].
fn bracket_order(groups: usize) -> Vec<usize> {
    let mut order = vec![0];
    while order.len() < groups {
        let size = order.len() * 2;
        order = order
            .iter()
            .flat_map(|&g| [g, size - 1 - g])
            .collect();
    }
    order
}

/// Seeds (0-based) dealt to group `g` of `groups`.
fn snake_group(g: usize, groups: usize) -> [usize; 4] {
    [g, 2 * groups - 1 - g, 2 * groups + g, 4 * groups - 1 - g]
}

/// Build the whole bracket from the final standings.
///
/// Uses the top `min(max_players, table.len())` rows; only complete groups of
/// four are seeded.
pub fn close_round_robin_and_seed_bracket(
    standings_snapshot: &[StandingRow],
    max_players: usize,
) -> Result<Vec<BracketMatch>, PhaseError> {
    let available = standings_snapshot.len().min(max_players);
    let groups = first_round_matches(available);
    if groups == 0 {
        warn!("Cannot seed bracket: {} players available", available);
        return Err(PhaseError::NotEnoughPlayers { available });
    }

    let seeds: Vec<&PlayerId> = standings_snapshot
        .iter()
        .take(groups * 4)
        .map(|row| &row.player_id)
        .collect();

    let mut rounds: Vec<usize> = Vec::new();
    let mut size = groups;
    while size >= 1 {
        rounds.push(size);
        size /= 2;
    }

    let mut bracket = Vec::new();
    for (round_idx, &matches_in_round) in rounds.iter().enumerate() {
        let round = round_idx as u32 + 1;
        let next_round = rounds.get(round_idx + 1).copied();

        for i in 0..matches_in_round {
            let id = slot_id(matches_in_round, i + 1);
            let winner_advances_to = next_round.map(|next| SlotRef {
                bracket_id: slot_id(next, i / 2 + 1),
                side: if i % 2 == 0 { Side::A } else { Side::B },
            });

            let (team_a, team_b) = if round == 1 {
                let group = bracket_order(groups)[i];
                let [best, second, third, worst] = snake_group(group, groups).map(|s| seeds[s]);
                // snake_group yields g < 2G-1-g < 2G+g < 4G-1-g
                (
                    BracketSlot::Scheduled {
                        team: Team::new(best.clone(), worst.clone()),
                    },
                    BracketSlot::Scheduled {
                        team: Team::new(second.clone(), third.clone()),
                    },
                )
            } else {
                let prev = rounds[round_idx - 1];
                (
                    BracketSlot::Placeholder {
                        feeder: slot_id(prev, 2 * i + 1),
                    },
                    BracketSlot::Placeholder {
                        feeder: slot_id(prev, 2 * i + 2),
                    },
                )
            };

            bracket.push(BracketMatch {
                id,
                round,
                match_number: i as u32 + 1,
                team_a,
                team_b,
                score: None,
                winner_advances_to,
                match_id: None,
            });
        }
    }

    info!(
        "Seeded bracket: {} players, {} first-round matches, {} rounds",
        seeds.len(),
        groups,
        rounds.len()
    );
    Ok(bracket)
}

/// Create knockout match records for every ready bracket match that has none.
pub fn schedule_ready(bracket: &mut [BracketMatch]) -> Vec<MatchResult> {
    let mut created = Vec::new();
    for slot in bracket.iter_mut() {
        if slot.match_id.is_some() || slot.status() != BracketStatus::Ready {
            continue;
        }
        if let Some((a, b)) = slot.teams() {
            let record = MatchResult::knockout(&slot.id, slot.round, a.clone(), b.clone());
            debug!("Scheduled knockout match {} for {}", record.id, slot.id);
            slot.match_id = Some(record.id.clone());
            created.push(record);
        }
    }
    created
}

/// Record the result of the bracket match behind knockout match `match_id`.
/// Returns the completed bracket match.
pub fn complete_bracket_match(
    bracket: &mut [BracketMatch],
    match_id: &MatchId,
    score: MatchScore,
) -> Result<BracketMatch, PhaseError> {
    score.validate()?;
    let slot = bracket
        .iter_mut()
        .find(|m| m.match_id.as_ref() == Some(match_id))
        .ok_or_else(|| PhaseError::BracketMatchNotFound(BracketId::from(match_id.as_str())))?;

    if slot.teams().is_none() {
        return Err(PhaseError::BracketMatchNotReady(slot.id.clone()));
    }
    slot.score = Some(score);
    Ok(slot.clone())
}

/// Move the winner of `completed` into the slot it feeds.
///
/// Returns the updated downstream match, or `None` when `completed` is the
/// final.
pub fn advance_bracket(
    bracket: &mut [BracketMatch],
    completed: &BracketMatch,
) -> Result<Option<BracketMatch>, PhaseError> {
    let winner = completed
        .winner()
        .ok_or_else(|| PhaseError::BracketMatchNotCompleted(completed.id.clone()))?
        .clone();

    let Some(target) = &completed.winner_advances_to else {
        info!("Final {} decided: {}", completed.id, winner);
        return Ok(None);
    };

    let downstream = bracket
        .iter_mut()
        .find(|m| m.id == target.bracket_id)
        .ok_or_else(|| PhaseError::BracketMatchNotFound(target.bracket_id.clone()))?;

    let slot = downstream.slot_mut(target.side);
    if let BracketSlot::Scheduled { team } = slot {
        if *team != winner {
            return Err(PhaseError::SlotConflict {
                bracket_id: target.bracket_id.clone(),
                side: target.side,
            });
        }
    }
    *slot = BracketSlot::Scheduled {
        team: winner.clone(),
    };

    info!(
        "{} advances from {} to {}",
        winner, completed.id, target.bracket_id
    );
    Ok(Some(downstream.clone()))
}
