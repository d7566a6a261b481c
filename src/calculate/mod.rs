//! Derived views over the match log.
//!
//! Everything here is a pure projection recomputed on demand:
//! - League standings (points, set and game differences)
//! - Partnership and opponent history for the scheduler

pub mod history;
pub mod standings;

pub use history::{pair, PairHistory, PlayerPair};
pub use standings::{compare_rows, compute_standings, points_by_player};
