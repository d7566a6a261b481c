//! Derived standings rows.

use serde::{Deserialize, Serialize};

use super::PlayerId;

/// One row of the league table. Always derived from the match log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StandingRow {
    pub player_id: PlayerId,
    pub name: String,

    /// Sum of sets won
    pub points: u32,

    pub sets_won: u32,
    pub sets_lost: u32,
    pub set_diff: i64,

    pub games_won: u32,
    pub games_lost: u32,
    pub game_diff: i64,

    /// Matches counted in this table
    pub played: u32,
}

impl StandingRow {
    /// An all-zero row for a roster player.
    pub fn empty(player_id: PlayerId, name: String) -> Self {
        Self {
            player_id,
            name,
            points: 0,
            sets_won: 0,
            sets_lost: 0,
            set_diff: 0,
            games_won: 0,
            games_lost: 0,
            game_diff: 0,
            played: 0,
        }
    }

    /// Credit one match to this row.
    pub fn add_match(&mut self, sets_won: u32, sets_lost: u32, games_won: u32, games_lost: u32) {
        self.points += sets_won;
        self.sets_won += sets_won;
        self.sets_lost += sets_lost;
        self.games_won += games_won;
        self.games_lost += games_lost;
        self.set_diff = self.sets_won as i64 - self.sets_lost as i64;
        self.game_diff = self.games_won as i64 - self.games_lost as i64;
        self.played += 1;
    }
}
