//! # Doubles League
//!
//! A doubles round-robin league where partners rotate every matchday,
//! followed by a single-elimination knockout seeded from the final table.
//!
//! ## Architecture
//!
//! - **models**: Core data structures (players, teams, matches, standings, bracket)
//! - **calculate**: Standings table and partner/opponent history, derived from the match log
//! - **schedule**: Matchday generation (partner rotation, opponent balancing, fallback)
//! - **guard**: Freezing incomplete matchdays and recovering their matches
//! - **phase**: Tournament phase machine and knockout bracket
//! - **storage**: Filesystem persistence (JSONL) behind the `TournamentStore` trait
//! - **tournament**: Transactional service tying the pieces together
//! - **api**: REST API endpoints
//! - **config**: Configuration loading and validation

pub mod api;
pub mod calculate;
pub mod config;
pub mod guard;
pub mod models;
pub mod phase;
pub mod schedule;
pub mod storage;
pub mod tournament;

pub use models::*;
