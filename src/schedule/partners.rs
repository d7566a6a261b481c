//! Partner matching: split the playing roster into fresh two-player teams.
//!
//! Candidates come from two places:
//! - the circle method over the whole roster, a 1-factorisation of the
//!   complete graph whose rounds are pairwise disjoint, so using any fresh
//!   round never blocks a later one
//! - a bounded backtracking search over the "not yet partnered" graph when no
//!   circle round fits the current participants

use tracing::debug;

use crate::calculate::{pair, PairHistory, PlayerPair};
use crate::models::PlayerId;

/// Most search results kept for cost comparison.
const MAX_SEARCH_CANDIDATES: usize = 16;

/// Circle-method rounds for `roster` (sorted by the caller). Odd rosters get a bye.
pub fn circle_rounds(roster: &[PlayerId]) -> Vec<Vec<PlayerPair>> {
    let mut slots: Vec<Option<&PlayerId>> = roster.iter().map(Some).collect();
    if slots.len() % 2 == 1 {
        slots.push(None);
    }
    let size = slots.len();
    if size < 2 {
        return Vec::new();
    }

    let mut rounds = Vec::with_capacity(size - 1);
    for _ in 0..size - 1 {
        let round = (0..size / 2)
            .filter_map(|i| match (slots[i], slots[size - 1 - i]) {
                (Some(a), Some(b)) => Some(pair(a, b)),
                _ => None,
            })
            .collect();
        rounds.push(round);
        slots[1..].rotate_right(1);
    }
    rounds
}

/// A circle round restricted to `participants`, if that restriction pairs
/// every participant with another participant through a fresh partnership.
fn restrict_round(
    round: &[PlayerPair],
    participants: &[PlayerId],
    history: &PairHistory,
) -> Option<Vec<PlayerPair>> {
    let playing = |id: &PlayerId| participants.binary_search(id).is_ok();
    let mut kept: Vec<PlayerPair> = round
        .iter()
        .filter(|(a, b)| playing(a) && playing(b))
        .cloned()
        .collect();

    if kept.len() * 2 != participants.len() {
        return None;
    }
    if kept.iter().any(|(a, b)| history.have_partnered(a, b)) {
        return None;
    }
    kept.sort();
    Some(kept)
}

/// Bounded backtracking search for perfect matchings over fresh partnerships.
struct MatchingSearch<'a> {
    participants: &'a [PlayerId],
    fresh: Vec<Vec<bool>>,
    budget: u64,
    nodes: u64,
    found: Vec<Vec<PlayerPair>>,
}

impl<'a> MatchingSearch<'a> {
    fn new(participants: &'a [PlayerId], history: &PairHistory, budget: u64) -> Self {
        let n = participants.len();
        let mut fresh = vec![vec![false; n]; n];
        for i in 0..n {
            for j in 0..n {
                fresh[i][j] =
                    i != j && !history.have_partnered(&participants[i], &participants[j]);
            }
        }
        Self {
            participants,
            fresh,
            budget,
            nodes: 0,
            found: Vec::new(),
        }
    }

    fn exhausted(&self) -> bool {
        self.nodes >= self.budget || self.found.len() >= MAX_SEARCH_CANDIDATES
    }

    fn run(&mut self) {
        let n = self.participants.len();
        let mut partner_of: Vec<Option<usize>> = vec![None; n];
        self.extend(&mut partner_of);
    }

    fn extend(&mut self, partner_of: &mut [Option<usize>]) {
        if self.exhausted() {
            return;
        }
        self.nodes += 1;

        // Most constrained unmatched player first; lowest index on ties.
        let mut pick: Option<(usize, usize)> = None;
        for i in 0..partner_of.len() {
            if partner_of[i].is_some() {
                continue;
            }
            let options = (0..partner_of.len())
                .filter(|&j| partner_of[j].is_none() && self.fresh[i][j])
                .count();
            if pick.map_or(true, |(_, best)| options < best) {
                pick = Some((i, options));
            }
        }

        let Some((i, options)) = pick else {
            self.record(partner_of);
            return;
        };
        if options == 0 {
            return;
        }

        for j in 0..partner_of.len() {
            if partner_of[j].is_some() || !self.fresh[i][j] {
                continue;
            }
            partner_of[i] = Some(j);
            partner_of[j] = Some(i);
            self.extend(partner_of);
            partner_of[i] = None;
            partner_of[j] = None;
            if self.exhausted() {
                return;
            }
        }
    }

    fn record(&mut self, partner_of: &[Option<usize>]) {
        let mut pairs: Vec<PlayerPair> = partner_of
            .iter()
            .enumerate()
            .filter_map(|(i, p)| match p {
                Some(j) if i < *j => Some(pair(&self.participants[i], &self.participants[*j])),
                _ => None,
            })
            .collect();
        pairs.sort();
        self.found.push(pairs);
    }
}

/// All fresh partner matchings worth costing, sorted and deduplicated.
///
/// `roster` and `participants` must be sorted. Empty when no matching without
/// a repeated partnership could be found.
pub fn candidate_matchings(
    roster: &[PlayerId],
    participants: &[PlayerId],
    history: &PairHistory,
    max_search_nodes: u64,
) -> Vec<Vec<PlayerPair>> {
    let mut candidates: Vec<Vec<PlayerPair>> = circle_rounds(roster)
        .iter()
        .filter_map(|round| restrict_round(round, participants, history))
        .collect();

    if candidates.is_empty() {
        let mut search = MatchingSearch::new(participants, history, max_search_nodes);
        search.run();
        debug!(
            "Partner search visited {} nodes, found {} matchings",
            search.nodes,
            search.found.len()
        );
        candidates = search.found;
    } else {
        debug!("{} circle rounds still fresh", candidates.len());
    }

    candidates.sort();
    candidates.dedup();
    candidates
}
