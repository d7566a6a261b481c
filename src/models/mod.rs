//! Core data models for the league.

mod bracket;
mod ids;
mod match_result;
mod player;
mod standing;

pub use bracket::*;
pub use ids::*;
pub use match_result::*;
pub use player::*;
pub use standing::*;
