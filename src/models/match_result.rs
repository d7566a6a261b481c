//! Match results: one doubles match between two teams of two.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::{BracketId, EntityId, MatchId, PlayerId};

/// Sets in a best-of-three when every set is played.
pub const SETS_PER_MATCH: u32 = 3;

/// Invalid score entry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScoreError {
    #[error("A match cannot end in a draw ({0}-{0})")]
    Draw(u32),

    #[error("Score {sets_a}-{sets_b} is not a best-of-three outcome")]
    NotBestOfThree { sets_a: u32, sets_b: u32 },

    #[error("Games must be given for both teams or for neither")]
    PartialGames,
}

/// Errors raised when a match is moved through its lifecycle.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ResultError {
    #[error("Invalid score: {0}")]
    InvalidScore(#[from] ScoreError),

    #[error("Match {0} is frozen; resolve it through recovery")]
    InRecovery(MatchId),

    #[error("Cannot move match {id} from {from} to {to}")]
    InvalidTransition {
        id: MatchId,
        from: MatchStatus,
        to: MatchStatus,
    },
}

/// One side of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

/// Two partners. Stored in sorted order so equal teams compare equal, also
/// when read back from disk.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "[PlayerId; 2]", into = "[PlayerId; 2]")]
pub struct Team([PlayerId; 2]);

impl From<[PlayerId; 2]> for Team {
    fn from([first, second]: [PlayerId; 2]) -> Self {
        Team::new(first, second)
    }
}

impl From<Team> for [PlayerId; 2] {
    fn from(team: Team) -> Self {
        team.0
    }
}

impl Team {
    pub fn new(first: PlayerId, second: PlayerId) -> Self {
        if first <= second {
            Self([first, second])
        } else {
            Self([second, first])
        }
    }

    pub fn players(&self) -> &[PlayerId; 2] {
        &self.0
    }
}

impl std::fmt::Display for Team {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} & {}", self.0[0], self.0[1])
    }
}

/// Final score of a match: sets, plus optional aggregate games.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchScore {
    pub sets_a: u32,
    pub sets_b: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_a: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub games_b: Option<u32>,
}

impl MatchScore {
    pub fn new(sets_a: u32, sets_b: u32) -> Self {
        Self {
            sets_a,
            sets_b,
            games_a: None,
            games_b: None,
        }
    }

    pub fn with_games(mut self, games_a: u32, games_b: u32) -> Self {
        self.games_a = Some(games_a);
        self.games_b = Some(games_b);
        self
    }

    /// Accepts 3-0, 2-1, 1-2 and 0-3.
    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.sets_a == self.sets_b {
            return Err(ScoreError::Draw(self.sets_a));
        }
        if self.sets_a + self.sets_b != SETS_PER_MATCH {
            return Err(ScoreError::NotBestOfThree {
                sets_a: self.sets_a,
                sets_b: self.sets_b,
            });
        }
        if self.games_a.is_some() != self.games_b.is_some() {
            return Err(ScoreError::PartialGames);
        }
        Ok(())
    }

    pub fn winner(&self) -> Side {
        if self.sets_a > self.sets_b {
            Side::A
        } else {
            Side::B
        }
    }

    pub fn sets_for(&self, side: Side) -> u32 {
        match side {
            Side::A => self.sets_a,
            Side::B => self.sets_b,
        }
    }

    /// Aggregate games for a side, 0 when not recorded.
    pub fn games_for(&self, side: Side) -> u32 {
        match side {
            Side::A => self.games_a.unwrap_or(0),
            Side::B => self.games_b.unwrap_or(0),
        }
    }
}

/// Tournament stage a match belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    RoundRobin,
    Knockout,
}

/// Lifecycle status of a match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Scheduled,
    Confirmed,
    Completed,
    ToRecover,
}

impl std::fmt::Display for MatchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MatchStatus::Scheduled => write!(f, "scheduled"),
            MatchStatus::Confirmed => write!(f, "confirmed"),
            MatchStatus::Completed => write!(f, "completed"),
            MatchStatus::ToRecover => write!(f, "to_recover"),
        }
    }
}

/// Snapshot taken when a match is frozen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OriginalData {
    pub score: Option<MatchScore>,
    pub status: MatchStatus,
}

/// A single doubles match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// Unique identifier
    pub id: MatchId,

    pub team_a: Team,
    pub team_b: Team,

    /// Set/game score, present once the match is completed
    #[serde(default)]
    pub score: Option<MatchScore>,

    /// Matchday for round-robin matches, bracket round for knockout matches
    pub matchday_number: u32,

    pub phase: MatchPhase,
    pub status: MatchStatus,

    /// Pre-freeze snapshot, present only while `to_recover`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_data: Option<OriginalData>,

    /// When this record was created
    pub created_at: DateTime<Utc>,
}

impl MatchResult {
    /// Create a scheduled round-robin match with a deterministic ID.
    pub fn round_robin(matchday_number: u32, team_a: Team, team_b: Team) -> Self {
        let id = EntityId::generate(&[
            "round_robin",
            &matchday_number.to_string(),
            team_a.players()[0].as_str(),
            team_a.players()[1].as_str(),
            team_b.players()[0].as_str(),
            team_b.players()[1].as_str(),
        ]);
        Self::scheduled(id, MatchPhase::RoundRobin, matchday_number, team_a, team_b)
    }

    /// Create a scheduled knockout match for a bracket slot.
    pub fn knockout(bracket_id: &BracketId, round: u32, team_a: Team, team_b: Team) -> Self {
        let id = EntityId::generate(&[
            "knockout",
            bracket_id.as_str(),
            team_a.players()[0].as_str(),
            team_a.players()[1].as_str(),
            team_b.players()[0].as_str(),
            team_b.players()[1].as_str(),
        ]);
        Self::scheduled(id, MatchPhase::Knockout, round, team_a, team_b)
    }

    fn scheduled(
        id: MatchId,
        phase: MatchPhase,
        matchday_number: u32,
        team_a: Team,
        team_b: Team,
    ) -> Self {
        Self {
            id,
            team_a,
            team_b,
            score: None,
            matchday_number,
            phase,
            status: MatchStatus::Scheduled,
            original_data: None,
            created_at: Utc::now(),
        }
    }

    pub fn team(&self, side: Side) -> &Team {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    /// All four players, team A first.
    pub fn players(&self) -> impl Iterator<Item = &PlayerId> {
        self.team_a
            .players()
            .iter()
            .chain(self.team_b.players().iter())
    }

    pub fn is_round_robin(&self) -> bool {
        self.phase == MatchPhase::RoundRobin
    }

    /// Completed with a recorded score.
    pub fn is_completed(&self) -> bool {
        self.status == MatchStatus::Completed && self.score.is_some()
    }

    /// Still waiting for a result: scheduled, confirmed, or completed without a score.
    pub fn is_unresolved(&self) -> bool {
        match self.status {
            MatchStatus::Scheduled | MatchStatus::Confirmed => true,
            MatchStatus::Completed => self.score.is_none(),
            MatchStatus::ToRecover => false,
        }
    }

    pub fn winner(&self) -> Option<&Team> {
        if !self.is_completed() {
            return None;
        }
        self.score.map(|s| self.team(s.winner()))
    }

    /// scheduled → confirmed.
    pub fn confirm(&mut self) -> Result<(), ResultError> {
        match self.status {
            MatchStatus::Scheduled => {
                self.status = MatchStatus::Confirmed;
                Ok(())
            }
            MatchStatus::ToRecover => Err(ResultError::InRecovery(self.id.clone())),
            from => Err(ResultError::InvalidTransition {
                id: self.id.clone(),
                from,
                to: MatchStatus::Confirmed,
            }),
        }
    }

    /// Enter (or correct) the final score. Frozen matches go through recovery instead.
    pub fn record_score(&mut self, score: MatchScore) -> Result<(), ResultError> {
        score.validate()?;
        if self.status == MatchStatus::ToRecover {
            return Err(ResultError::InRecovery(self.id.clone()));
        }
        self.score = Some(score);
        self.status = MatchStatus::Completed;
        Ok(())
    }
}
