//! League table projection.

use std::cmp::Ordering;
use std::collections::HashMap;

use tracing::debug;

use crate::models::{MatchResult, Player, PlayerId, Side, StandingRow};

/// Ranking order: points desc, set diff desc, game diff desc, played asc, name asc.
/// The player id is only a last resort so the order is total.
pub fn compare_rows(a: &StandingRow, b: &StandingRow) -> Ordering {
    b.points
        .cmp(&a.points)
        .then_with(|| b.set_diff.cmp(&a.set_diff))
        .then_with(|| b.game_diff.cmp(&a.game_diff))
        .then_with(|| a.played.cmp(&b.played))
        .then_with(|| a.name.cmp(&b.name))
        .then_with(|| a.player_id.cmp(&b.player_id))
}

/// Build the sorted league table.
///
/// `matches` must already be filtered by the consistency guard. Only completed
/// matches with a score are counted; every roster player gets a row.
pub fn compute_standings<'a, I>(players: &[Player], matches: I) -> Vec<StandingRow>
where
    I: IntoIterator<Item = &'a MatchResult>,
{
    let mut rows: HashMap<PlayerId, StandingRow> = players
        .iter()
        .map(|p| (p.id.clone(), StandingRow::empty(p.id.clone(), p.name.clone())))
        .collect();

    let mut counted = 0usize;
    for m in matches {
        if !m.is_completed() {
            continue;
        }
        let Some(score) = m.score else { continue };
        counted += 1;

        for side in [Side::A, Side::B] {
            let other = side.other();
            for player in m.team(side).players() {
                rows.entry(player.clone())
                    .or_insert_with(|| StandingRow::empty(player.clone(), player.to_string()))
                    .add_match(
                        score.sets_for(side),
                        score.sets_for(other),
                        score.games_for(side),
                        score.games_for(other),
                    );
            }
        }
    }

    let mut table: Vec<StandingRow> = rows.into_values().collect();
    table.sort_by(compare_rows);
    debug!(
        "Standings computed from {} completed matches for {} players",
        counted,
        table.len()
    );
    table
}

/// Points per player, for balancing generated matches.
pub fn points_by_player(table: &[StandingRow]) -> HashMap<PlayerId, (u32, u32)> {
    table
        .iter()
        .map(|r| (r.player_id.clone(), (r.points, r.games_won)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MatchScore, MatchStatus, Team};
    use pretty_assertions::assert_eq;

    fn roster(ids: &[&str]) -> Vec<Player> {
        ids.iter().map(|id| Player::new(*id, id.to_uppercase())).collect()
    }

    fn played(day: u32, a: (&str, &str), b: (&str, &str), score: MatchScore) -> MatchResult {
        let mut m = MatchResult::round_robin(
            day,
            Team::new(a.0.into(), a.1.into()),
            Team::new(b.0.into(), b.1.into()),
        );
        m.record_score(score).unwrap();
        m
    }

    fn row<'a>(table: &'a [StandingRow], id: &str) -> &'a StandingRow {
        table.iter().find(|r| r.player_id.as_str() == id).unwrap()
    }

    #[test]
    fn test_single_match_example() {
        let players = roster(&["a", "b", "c", "d"]);
        let m = played(1, ("a", "b"), ("c", "d"), MatchScore::new(3, 0).with_games(9, 4));

        let table = compute_standings(&players, [&m]);

        for id in ["a", "b"] {
            let r = row(&table, id);
            assert_eq!((r.points, r.sets_won, r.sets_lost), (3, 3, 0));
            assert_eq!((r.games_won, r.games_lost, r.game_diff), (9, 4, 5));
            assert_eq!(r.played, 1);
        }
        for id in ["c", "d"] {
            let r = row(&table, id);
            assert_eq!((r.points, r.sets_won, r.sets_lost), (0, 0, 3));
            assert_eq!((r.games_won, r.games_lost, r.game_diff), (4, 9, -5));
            assert_eq!(r.played, 1);
        }
        assert_eq!(table[0].player_id.as_str(), "a");
        assert_eq!(table[1].player_id.as_str(), "b");
    }

    #[test]
    fn test_roster_players_without_matches_get_zero_rows() {
        let players = roster(&["a", "b", "c", "d", "e"]);
        let m = played(1, ("a", "b"), ("c", "d"), MatchScore::new(2, 1));

        let table = compute_standings(&players, [&m]);

        assert_eq!(table.len(), 5);
        assert_eq!(row(&table, "e"), &StandingRow::empty("e".into(), "E".to_string()));
    }

    #[test]
    fn test_incomplete_matches_ignored() {
        let players = roster(&["a", "b", "c", "d"]);
        let scheduled = MatchResult::round_robin(
            1,
            Team::new("a".into(), "b".into()),
            Team::new("c".into(), "d".into()),
        );
        let mut scoreless = scheduled.clone();
        scoreless.status = MatchStatus::Completed;

        let table = compute_standings(&players, [&scheduled, &scoreless]);
        assert!(table.iter().all(|r| r.played == 0));
    }

    #[test]
    fn test_tie_breaks() {
        // a and g finish level on points and sets; a has the better game diff
        let players = roster(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let m1 = played(1, ("a", "b"), ("e", "f"), MatchScore::new(2, 1).with_games(15, 10));
        let m2 = played(1, ("c", "d"), ("g", "h"), MatchScore::new(2, 1).with_games(13, 12));
        let m3 = played(2, ("a", "e"), ("c", "g"), MatchScore::new(1, 2).with_games(12, 12));

        let table = compute_standings(&players, [&m1, &m2, &m3]);
        let order: Vec<&str> = table.iter().map(|r| r.player_id.as_str()).collect();

        assert_eq!(order[0], "c");
        let r_a = row(&table, "a");
        let r_g = row(&table, "g");
        assert_eq!(r_a.points, 3);
        assert_eq!(r_g.points, 3);
        assert_eq!(r_a.set_diff, 0);
        assert_eq!(r_g.set_diff, 0);
        let pos_a = order.iter().position(|id| *id == "a").unwrap();
        let pos_g = order.iter().position(|id| *id == "g").unwrap();
        assert!(pos_a < pos_g);
    }

    #[test]
    fn test_fewer_played_ranks_higher_on_equal_record() {
        let mut fewer = StandingRow::empty("z".into(), "Zed".to_string());
        fewer.points = 3;
        fewer.played = 1;
        let mut more = StandingRow::empty("y".into(), "Amy".to_string());
        more.points = 3;
        more.played = 2;

        assert_eq!(compare_rows(&fewer, &more), Ordering::Less);
    }

    #[test]
    fn test_name_breaks_residual_ties() {
        let zed = StandingRow::empty("1".into(), "Zed".to_string());
        let amy = StandingRow::empty("2".into(), "Amy".to_string());
        let mut rows = vec![zed, amy];
        rows.sort_by(compare_rows);
        assert_eq!(rows[0].name, "Amy");
    }

    #[test]
    fn test_order_independent_and_idempotent() {
        let players = roster(&["a", "b", "c", "d", "e", "f", "g", "h"]);
        let matches = vec![
            played(1, ("a", "b"), ("c", "d"), MatchScore::new(3, 0).with_games(18, 5)),
            played(1, ("e", "f"), ("g", "h"), MatchScore::new(1, 2).with_games(14, 16)),
            played(2, ("a", "c"), ("e", "g"), MatchScore::new(2, 1).with_games(15, 13)),
            played(2, ("b", "d"), ("f", "h"), MatchScore::new(0, 3).with_games(6, 18)),
        ];

        let forward = compute_standings(&players, matches.iter());
        let again = compute_standings(&players, matches.iter());
        let reversed = compute_standings(&players, matches.iter().rev());
        let shuffled = compute_standings(
            &players,
            [&matches[2], &matches[0], &matches[3], &matches[1]],
        );

        assert_eq!(forward, again);
        assert_eq!(forward, reversed);
        assert_eq!(forward, shuffled);
    }

    #[test]
    fn test_unknown_player_gets_row_named_by_id() {
        let players = roster(&["a", "b", "c"]);
        let m = played(1, ("a", "b"), ("c", "x"), MatchScore::new(2, 1));
        let table = compute_standings(&players, [&m]);
        assert_eq!(row(&table, "x").name, "x");
    }

    #[test]
    fn test_points_by_player() {
        let players = roster(&["a", "b", "c", "d"]);
        let m = played(1, ("a", "b"), ("c", "d"), MatchScore::new(2, 1).with_games(14, 11));
        let table = compute_standings(&players, [&m]);
        let points = points_by_player(&table);
        assert_eq!(points[&PlayerId::from("a")], (2, 14));
        assert_eq!(points[&PlayerId::from("d")], (1, 11));
    }
}
