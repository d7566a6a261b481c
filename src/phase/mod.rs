//! Tournament phase state machine and knockout bracket.

pub mod bracket;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::models::{BracketId, ScoreError, Side, StandingRow, Team};

pub use bracket::{
    advance_bracket, close_round_robin_and_seed_bracket, complete_bracket_match, schedule_ready,
};

/// Phase and bracket errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PhaseError {
    #[error("Cannot move tournament from {from} to {to}")]
    InvalidTransition {
        from: &'static str,
        to: &'static str,
    },

    #[error("Not enough players for a bracket: {available} available, 4 needed")]
    NotEnoughPlayers { available: usize },

    #[error("Bracket match not found: {0}")]
    BracketMatchNotFound(BracketId),

    #[error("Bracket match {0} is waiting for its teams")]
    BracketMatchNotReady(BracketId),

    #[error("Bracket match {0} has no result")]
    BracketMatchNotCompleted(BracketId),

    #[error("Slot {side:?} of {bracket_id} already holds another team")]
    SlotConflict { bracket_id: BracketId, side: Side },

    #[error("Invalid score: {0}")]
    InvalidScore(#[from] ScoreError),
}

/// Where the tournament stands.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TournamentPhase {
    #[default]
    RoundRobinOpen,
    RoundRobinCompleted {
        final_table: Vec<StandingRow>,
        closed_at: DateTime<Utc>,
    },
    KnockoutActive {
        final_table: Vec<StandingRow>,
        seeded_at: DateTime<Utc>,
    },
    KnockoutCompleted {
        final_table: Vec<StandingRow>,
        champions: Team,
        finished_at: DateTime<Utc>,
    },
}

impl TournamentPhase {
    pub fn name(&self) -> &'static str {
        match self {
            TournamentPhase::RoundRobinOpen => "round_robin_open",
            TournamentPhase::RoundRobinCompleted { .. } => "round_robin_completed",
            TournamentPhase::KnockoutActive { .. } => "knockout_active",
            TournamentPhase::KnockoutCompleted { .. } => "knockout_completed",
        }
    }

    pub fn is_round_robin_open(&self) -> bool {
        matches!(self, TournamentPhase::RoundRobinOpen)
    }

    /// The standings snapshot taken when the round-robin closed.
    pub fn final_table(&self) -> Option<&[StandingRow]> {
        match self {
            TournamentPhase::RoundRobinOpen => None,
            TournamentPhase::RoundRobinCompleted { final_table, .. }
            | TournamentPhase::KnockoutActive { final_table, .. }
            | TournamentPhase::KnockoutCompleted { final_table, .. } => Some(final_table),
        }
    }

    /// Open → completed, freezing `final_table`. Later corrections to
    /// round-robin matches do not touch the snapshot.
    pub fn close_round_robin(&self, final_table: Vec<StandingRow>) -> Result<Self, PhaseError> {
        match self {
            TournamentPhase::RoundRobinOpen => {
                info!("Round-robin closed with {} players", final_table.len());
                Ok(TournamentPhase::RoundRobinCompleted {
                    final_table,
                    closed_at: Utc::now(),
                })
            }
            other => Err(PhaseError::InvalidTransition {
                from: other.name(),
                to: "round_robin_completed",
            }),
        }
    }

    /// Completed → knockout active.
    pub fn start_knockout(&self) -> Result<Self, PhaseError> {
        match self {
            TournamentPhase::RoundRobinCompleted { final_table, .. } => {
                Ok(TournamentPhase::KnockoutActive {
                    final_table: final_table.clone(),
                    seeded_at: Utc::now(),
                })
            }
            other => Err(PhaseError::InvalidTransition {
                from: other.name(),
                to: "knockout_active",
            }),
        }
    }

    /// Knockout active → completed once the final has a winner.
    pub fn finish(&self, champions: Team) -> Result<Self, PhaseError> {
        match self {
            TournamentPhase::KnockoutActive { final_table, .. } => {
                info!("Tournament finished, champions {}", champions);
                Ok(TournamentPhase::KnockoutCompleted {
                    final_table: final_table.clone(),
                    champions,
                    finished_at: Utc::now(),
                })
            }
            other => Err(PhaseError::InvalidTransition {
                from: other.name(),
                to: "knockout_completed",
            }),
        }
    }
}
