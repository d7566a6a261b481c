//! Partnership and opponent history.

use std::collections::{HashMap, HashSet};

use crate::models::{MatchResult, PlayerId, Team};

/// Unordered pair of players, smaller id first.
pub type PlayerPair = (PlayerId, PlayerId);

pub fn pair(a: &PlayerId, b: &PlayerId) -> PlayerPair {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

/// Who has partnered and who has faced whom. Rebuilt from the match log on demand.
#[derive(Debug, Clone, Default)]
pub struct PairHistory {
    pub partnered_with: HashSet<PlayerPair>,
    pub faced_against: HashSet<PlayerPair>,
    pub appearances: HashMap<PlayerId, u32>,
}

impl PairHistory {
    pub fn from_matches<'a, I>(matches: I) -> Self
    where
        I: IntoIterator<Item = &'a MatchResult>,
    {
        let mut history = Self::default();
        for m in matches {
            history.record(&m.team_a, &m.team_b);
        }
        history
    }

    fn record(&mut self, team_a: &Team, team_b: &Team) {
        for team in [team_a, team_b] {
            let [p1, p2] = team.players();
            self.partnered_with.insert(pair(p1, p2));
            for p in team.players() {
                *self.appearances.entry(p.clone()).or_insert(0) += 1;
            }
        }
        for a in team_a.players() {
            for b in team_b.players() {
                self.faced_against.insert(pair(a, b));
            }
        }
    }

    pub fn have_partnered(&self, a: &PlayerId, b: &PlayerId) -> bool {
        self.partnered_with.contains(&pair(a, b))
    }

    pub fn have_faced(&self, a: &PlayerId, b: &PlayerId) -> bool {
        self.faced_against.contains(&pair(a, b))
    }

    /// How many of a team's partnerships have been fielded before (0 or 1).
    pub fn partner_repeats(&self, team: &Team) -> u32 {
        let [p1, p2] = team.players();
        u32::from(self.have_partnered(p1, p2))
    }

    /// Cross-team pairs that already met (0..=4).
    pub fn opponent_repeats(&self, team_a: &Team, team_b: &Team) -> u32 {
        let mut count = 0;
        for a in team_a.players() {
            for b in team_b.players() {
                if self.have_faced(a, b) {
                    count += 1;
                }
            }
        }
        count
    }

    pub fn appearances(&self, player: &PlayerId) -> u32 {
        self.appearances.get(player).copied().unwrap_or(0)
    }

    /// True once every unordered pair of `players` has partnered at least once.
    pub fn all_pairs_partnered(&self, players: &[PlayerId]) -> bool {
        players.iter().enumerate().all(|(i, a)| {
            players[i + 1..]
                .iter()
                .all(|b| self.have_partnered(a, b))
        })
    }
}
