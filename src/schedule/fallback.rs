//! Greedy pairing used once no fresh partner matching exists.

use super::cost::{CostModel, MatchCost};
use crate::models::{PlayerId, Team};

/// The three ways to split four players into two teams.
fn splits(group: &[PlayerId; 4]) -> [(Team, Team); 3] {
    let [a, b, c, d] = group;
    [
        (Team::new(a.clone(), b.clone()), Team::new(c.clone(), d.clone())),
        (Team::new(a.clone(), c.clone()), Team::new(b.clone(), d.clone())),
        (Team::new(a.clone(), d.clone()), Team::new(b.clone(), c.clone())),
    ]
}

/// Take players four at a time in the given order (fewest appearances first)
/// and keep the cheapest split of each group. A repeated partnership is
/// accepted when every split of a group repeats one.
pub fn greedy_matchday(
    ordered: &[PlayerId],
    model: &CostModel<'_>,
) -> (Vec<(Team, Team)>, MatchCost) {
    let mut matches = Vec::with_capacity(ordered.len() / 4);
    let mut total = MatchCost::default();

    for chunk in ordered.chunks_exact(4) {
        let group = [
            chunk[0].clone(),
            chunk[1].clone(),
            chunk[2].clone(),
            chunk[3].clone(),
        ];
        let mut best: Option<((Team, Team), MatchCost)> = None;
        for (a, b) in splits(&group) {
            let cost = model.cost(&a, &b);
            if best.as_ref().map_or(true, |(_, c)| cost < *c) {
                best = Some(((a, b), cost));
            }
        }
        if let Some((split, cost)) = best {
            total = total + cost;
            matches.push(split);
        }
    }

    (matches, total)
}
