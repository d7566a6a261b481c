//! Grouping fixed partner teams into head-to-head matches.

use std::collections::HashMap;

use super::cost::{CostModel, MatchCost};
use crate::models::Team;

/// Largest number of teams grouped exactly; beyond this a greedy pass is used.
pub const EXACT_GROUPING_LIMIT: usize = 16;

/// Pair `teams` (even count, sorted) into matches with the lowest total cost.
///
/// Ties keep the earlier team order, so the result is deterministic.
pub fn group_teams(teams: &[Team], model: &CostModel<'_>) -> (Vec<(Team, Team)>, MatchCost) {
    if teams.len() <= EXACT_GROUPING_LIMIT {
        group_exact(teams, model)
    } else {
        group_greedy(teams, model)
    }
}

/// Exact minimum-cost grouping over subsets of teams.
fn group_exact(teams: &[Team], model: &CostModel<'_>) -> (Vec<(Team, Team)>, MatchCost) {
    let n = teams.len();
    let costs: Vec<Vec<MatchCost>> = (0..n)
        .map(|i| (0..n).map(|j| model.cost(&teams[i], &teams[j])).collect())
        .collect();

    let full: u32 = if n == 0 { 0 } else { (1u32 << n) - 1 };
    let mut memo: HashMap<u32, (MatchCost, Option<(usize, usize)>)> = HashMap::new();
    let total = best_from(0, full, &costs, &mut memo);

    let mut matches = Vec::with_capacity(n / 2);
    let mut mask = 0u32;
    while let Some(&(_, Some((i, j)))) = memo.get(&mask) {
        matches.push((teams[i].clone(), teams[j].clone()));
        mask |= (1 << i) | (1 << j);
    }
    (matches, total)
}

fn best_from(
    mask: u32,
    full: u32,
    costs: &[Vec<MatchCost>],
    memo: &mut HashMap<u32, (MatchCost, Option<(usize, usize)>)>,
) -> MatchCost {
    if mask == full {
        return MatchCost::default();
    }
    if let Some(&(cost, _)) = memo.get(&mask) {
        return cost;
    }

    let i = (!mask).trailing_zeros() as usize;
    let mut best: Option<(MatchCost, (usize, usize))> = None;
    for j in i + 1..costs.len() {
        if mask & (1 << j) != 0 {
            continue;
        }
        let rest = best_from(mask | (1 << i) | (1 << j), full, costs, memo);
        let cost = costs[i][j] + rest;
        if best.map_or(true, |(b, _)| cost < b) {
            best = Some((cost, (i, j)));
        }
    }

    let (cost, choice) = match best {
        Some((cost, choice)) => (cost, Some(choice)),
        None => (MatchCost::default(), None),
    };
    memo.insert(mask, (cost, choice));
    cost
}

/// Strongest remaining team meets the cheapest opponent among the rest.
fn group_greedy(teams: &[Team], model: &CostModel<'_>) -> (Vec<(Team, Team)>, MatchCost) {
    let mut remaining: Vec<&Team> = teams.iter().collect();
    remaining.sort_by_key(|t| std::cmp::Reverse(model.team_strength(t)));

    let mut matches = Vec::with_capacity(teams.len() / 2);
    let mut total = MatchCost::default();
    while remaining.len() >= 2 {
        let first = remaining.remove(0);
        let (idx, cost) = remaining
            .iter()
            .enumerate()
            .map(|(idx, other)| (idx, model.cost(first, other)))
            .min_by_key(|&(idx, cost)| (cost, idx))
            .unwrap_or((0, MatchCost::default()));
        let second = remaining.remove(idx);
        total = total + cost;
        matches.push((first.clone(), second.clone()));
    }
    (matches, total)
}
