//! Roster players.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{EntityId, PlayerId};

/// A registered league player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    /// Unique, stable identifier
    pub id: PlayerId,

    /// Display name (used as the last standings tie-break)
    pub name: String,

    /// When the player joined the roster
    pub registered_at: DateTime<Utc>,
}

impl Player {
    /// Create a player with a known ID.
    pub fn new(id: impl Into<PlayerId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            registered_at: Utc::now(),
        }
    }

    /// Register a new player with a freshly assigned ID.
    pub fn register(name: impl Into<String>) -> Self {
        Self::new(EntityId::random(), name)
    }
}
