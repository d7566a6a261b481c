//! Match cost model.

use std::collections::HashMap;
use std::iter::Sum;
use std::ops::Add;

use crate::calculate::PairHistory;
use crate::models::{PlayerId, Team};

/// Cost of a candidate match, compared lexicographically.
///
/// `partner_repeats` dominates everything else, so a repeated partnership is
/// only ever chosen when no alternative exists. `balance` combines the points
/// gap with the opponent-repeat penalty; `games_gap` settles remaining ties.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord)]
pub struct MatchCost {
    pub partner_repeats: u32,
    pub balance: u64,
    pub games_gap: u64,
}

impl Add for MatchCost {
    type Output = MatchCost;

    fn add(self, rhs: MatchCost) -> MatchCost {
        MatchCost {
            partner_repeats: self.partner_repeats + rhs.partner_repeats,
            balance: self.balance + rhs.balance,
            games_gap: self.games_gap + rhs.games_gap,
        }
    }
}

impl Sum for MatchCost {
    fn sum<I: Iterator<Item = MatchCost>>(iter: I) -> MatchCost {
        iter.fold(MatchCost::default(), |acc, c| acc + c)
    }
}

/// Current strength of a player: (points, games won).
pub type Strength = (u32, u32);

/// Scores candidate matches against history and current standings.
pub struct CostModel<'a> {
    history: &'a PairHistory,
    strength: &'a HashMap<PlayerId, Strength>,
    opponent_repeat_penalty: u32,
}

impl<'a> CostModel<'a> {
    pub fn new(
        history: &'a PairHistory,
        strength: &'a HashMap<PlayerId, Strength>,
        opponent_repeat_penalty: u32,
    ) -> Self {
        Self {
            history,
            strength,
            opponent_repeat_penalty,
        }
    }

    /// Summed (points, games) of a team.
    pub fn team_strength(&self, team: &Team) -> (u64, u64) {
        team.players().iter().fold((0, 0), |(p, g), id| {
            let (points, games) = self.strength.get(id).copied().unwrap_or((0, 0));
            (p + u64::from(points), g + u64::from(games))
        })
    }

    pub fn cost(&self, team_a: &Team, team_b: &Team) -> MatchCost {
        let (points_a, games_a) = self.team_strength(team_a);
        let (points_b, games_b) = self.team_strength(team_b);
        let opponent_repeats = self.history.opponent_repeats(team_a, team_b);

        MatchCost {
            partner_repeats: self.history.partner_repeats(team_a)
                + self.history.partner_repeats(team_b),
            balance: points_a.abs_diff(points_b)
                + u64::from(opponent_repeats) * u64::from(self.opponent_repeat_penalty),
            games_gap: games_a.abs_diff(games_b),
        }
    }
}
