//! Matchday generation.
//!
//! A matchday is built in three steps:
//! - pick who plays (everyone when the roster divides by four, otherwise the
//!   players with the fewest appearances so sit-outs rotate, unless only a
//!   different sit-out keeps every partnership fresh)
//! - split the players into fresh partnerships ([`partners`])
//! - group the teams into balanced matches ([`matchups`])
//!
//! When no partner split without a repeat exists, [`fallback`] builds the
//! matchday greedily instead.

pub mod cost;
pub mod fallback;
pub mod matchups;
pub mod partners;

use std::collections::BTreeSet;

use serde::Serialize;
use tracing::{debug, error, info, warn};

use crate::calculate::{compute_standings, points_by_player, PairHistory};
use crate::config::SchedulerConfig;
use crate::guard::standings_input;
use crate::models::{MatchResult, Player, PlayerId, Team};

use cost::{CostModel, MatchCost};

/// Fewest players needed for a matchday.
pub const MIN_PLAYERS: usize = 4;

/// Why no matchday was created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GenerationRejection {
    NotEnoughPlayers,
    IncompletePreviousRound,
    RoundRobinComplete,
}

impl GenerationRejection {
    pub fn code(&self) -> &'static str {
        match self {
            GenerationRejection::NotEnoughPlayers => "not_enough_players",
            GenerationRejection::IncompletePreviousRound => "incomplete_previous_round",
            GenerationRejection::RoundRobinComplete => "round_robin_complete",
        }
    }
}

impl std::fmt::Display for GenerationRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// Result of a generation request.
#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Created {
        matchday_number: u32,
        matches: Vec<MatchResult>,
    },
    Rejected(GenerationRejection),
}

/// Number of round-robin matchdays after which the league is over.
pub fn matchday_limit(roster_size: usize) -> usize {
    roster_size.saturating_sub(1)
}

fn round_robin_matchdays(matches: &[MatchResult]) -> BTreeSet<u32> {
    matches
        .iter()
        .filter(|m| m.is_round_robin())
        .map(|m| m.matchday_number)
        .collect()
}

/// Whether the round-robin has run its course for this roster.
pub fn is_round_robin_complete(roster: &[PlayerId], matches: &[MatchResult]) -> bool {
    let history = PairHistory::from_matches(matches.iter().filter(|m| m.is_round_robin()));
    history.all_pairs_partnered(roster)
        || round_robin_matchdays(matches).len() >= matchday_limit(roster.len())
}

/// Most alternative participant sets tried before falling back.
const MAX_PARTICIPANT_SETS: usize = 64;

/// Every `k`-subset of `0..n`, each listed in descending order.
fn sit_out_combinations(n: usize, k: usize) -> Vec<Vec<usize>> {
    fn extend(next: usize, k: usize, current: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
        if current.len() == k {
            out.push(current.clone());
            return;
        }
        for i in (0..next).rev() {
            current.push(i);
            extend(i, k, current, out);
            current.pop();
        }
    }

    let mut out = Vec::new();
    extend(n, k, &mut Vec::with_capacity(k), &mut out);
    out
}

/// Candidate participant sets for the next matchday, each sorted by id.
///
/// The first set seats the players with the fewest appearances (ties by id) so
/// sit-outs rotate. The rest swap in players with more appearances, most
/// played sit-outs first, and are only used when the first set has no split
/// into fresh partnerships.
fn participant_sets(roster: &[PlayerId], history: &PairHistory) -> Vec<Vec<PlayerId>> {
    let playing = roster.len() / 4 * 4;
    if playing == roster.len() {
        return vec![roster.to_vec()];
    }

    let mut by_appearances: Vec<&PlayerId> = roster.iter().collect();
    by_appearances.sort_by_key(|id| (history.appearances(id), *id));

    let mut combos = sit_out_combinations(by_appearances.len(), roster.len() - playing);
    let load = |combo: &Vec<usize>| -> u32 {
        combo
            .iter()
            .map(|&i| history.appearances(by_appearances[i]))
            .sum()
    };
    combos.sort_by(|a, b| load(b).cmp(&load(a)).then_with(|| b.cmp(a)));

    combos
        .into_iter()
        .take(MAX_PARTICIPANT_SETS)
        .map(|sit_out| {
            let mut participants: Vec<PlayerId> = by_appearances
                .iter()
                .enumerate()
                .filter(|(i, _)| !sit_out.contains(i))
                .map(|(_, id)| (*id).clone())
                .collect();
            participants.sort();
            participants
        })
        .collect()
}

/// Cheapest grouping over all candidate partner matchings. Candidates arrive
/// sorted, so a strict comparison keeps the earliest on ties.
fn best_candidate(
    candidates: &[Vec<(PlayerId, PlayerId)>],
    model: &CostModel<'_>,
) -> Option<(Vec<(Team, Team)>, MatchCost)> {
    let mut best: Option<(Vec<(Team, Team)>, MatchCost)> = None;
    for matching in candidates {
        let mut teams: Vec<Team> = matching
            .iter()
            .map(|(a, b)| Team::new(a.clone(), b.clone()))
            .collect();
        teams.sort();

        let (grouped, cost) = matchups::group_teams(&teams, model);
        if best.as_ref().map_or(true, |(_, c)| cost < *c) {
            best = Some((grouped, cost));
        }
    }
    best
}

/// Build the next round-robin matchday, or say why none can be built.
///
/// Pure and deterministic: the same roster and match log always produce the
/// same matchday.
pub fn generate_next_matchday(
    players: &[Player],
    matches: &[MatchResult],
    config: &SchedulerConfig,
) -> GenerationOutcome {
    let mut roster: Vec<PlayerId> = players.iter().map(|p| p.id.clone()).collect();
    roster.sort();
    roster.dedup();

    if roster.len() < MIN_PLAYERS {
        error!(
            "Cannot generate matchday: {} players registered, {} needed",
            roster.len(),
            MIN_PLAYERS
        );
        return GenerationOutcome::Rejected(GenerationRejection::NotEnoughPlayers);
    }

    if matches
        .iter()
        .any(|m| m.is_round_robin() && m.is_unresolved())
    {
        warn!("Generation rejected: previous matchday still has open matches");
        return GenerationOutcome::Rejected(GenerationRejection::IncompletePreviousRound);
    }

    if is_round_robin_complete(&roster, matches) {
        info!("Round-robin complete for {} players", roster.len());
        return GenerationOutcome::Rejected(GenerationRejection::RoundRobinComplete);
    }

    let history = PairHistory::from_matches(matches.iter().filter(|m| m.is_round_robin()));
    let table = compute_standings(players, standings_input(matches));
    let strength = points_by_player(&table);
    let model = CostModel::new(&history, &strength, config.opponent_repeat_penalty);

    let sets = participant_sets(&roster, &history);
    let mut participants = &sets[0];
    let mut candidates = Vec::new();
    for (i, set) in sets.iter().enumerate() {
        candidates =
            partners::candidate_matchings(&roster, set, &history, config.max_search_nodes);
        if !candidates.is_empty() {
            if i > 0 {
                debug!("Sit-outs rotated past choice {} to keep partnerships fresh", i);
            }
            participants = set;
            break;
        }
    }
    debug!(
        "{} participants, {} candidate partner matchings",
        participants.len(),
        candidates.len()
    );

    let (pairings, cost) = match best_candidate(&candidates, &model) {
        Some(best) => best,
        None => {
            warn!("No fresh partner matching left, using fallback pairing");
            let mut ordered = participants.to_vec();
            ordered.sort_by_key(|id| (history.appearances(id), id.clone()));
            fallback::greedy_matchday(&ordered, &model)
        }
    };

    let matchday_number = round_robin_matchdays(matches)
        .last()
        .map_or(1, |last| last + 1);
    let created: Vec<MatchResult> = pairings
        .into_iter()
        .map(|(a, b)| MatchResult::round_robin(matchday_number, a, b))
        .collect();

    info!(
        "Generated matchday {} with {} matches (partner repeats {}, balance {})",
        matchday_number,
        created.len(),
        cost.partner_repeats,
        cost.balance
    );

    GenerationOutcome::Created {
        matchday_number,
        matches: created,
    }
}
