//! Knockout bracket model.

use serde::{Deserialize, Serialize};

use super::{BracketId, MatchId, MatchScore, Side, Team};

/// One side of a bracket match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum BracketSlot {
    /// Waiting for the winner of `feeder`
    Placeholder { feeder: BracketId },
    /// Team known
    Scheduled { team: Team },
}

impl BracketSlot {
    pub fn team(&self) -> Option<&Team> {
        match self {
            BracketSlot::Placeholder { .. } => None,
            BracketSlot::Scheduled { team } => Some(team),
        }
    }

    pub fn is_placeholder(&self) -> bool {
        matches!(self, BracketSlot::Placeholder { .. })
    }
}

/// Where a winner goes next.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotRef {
    pub bracket_id: BracketId,
    pub side: Side,
}

/// Derived status of a bracket match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BracketStatus {
    /// At least one side unresolved
    Pending,
    /// Both teams known, no result yet
    Ready,
    Completed,
}

/// A match in the single-elimination bracket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BracketMatch {
    /// Slot name, e.g. "quarter_1", "semi_2", "final"
    pub id: BracketId,

    /// 1-based round; the last round is the final
    pub round: u32,

    /// 1-based position within the round
    pub match_number: u32,

    pub team_a: BracketSlot,
    pub team_b: BracketSlot,

    #[serde(default)]
    pub score: Option<MatchScore>,

    /// None for the final
    pub winner_advances_to: Option<SlotRef>,

    /// Knockout match record created once both teams are known
    #[serde(default)]
    pub match_id: Option<MatchId>,
}

impl BracketMatch {
    pub fn slot(&self, side: Side) -> &BracketSlot {
        match side {
            Side::A => &self.team_a,
            Side::B => &self.team_b,
        }
    }

    pub fn slot_mut(&mut self, side: Side) -> &mut BracketSlot {
        match side {
            Side::A => &mut self.team_a,
            Side::B => &mut self.team_b,
        }
    }

    /// Both teams, once resolved.
    pub fn teams(&self) -> Option<(&Team, &Team)> {
        Some((self.team_a.team()?, self.team_b.team()?))
    }

    pub fn status(&self) -> BracketStatus {
        if self.score.is_some() {
            BracketStatus::Completed
        } else if self.teams().is_some() {
            BracketStatus::Ready
        } else {
            BracketStatus::Pending
        }
    }

    pub fn is_final(&self) -> bool {
        self.winner_advances_to.is_none()
    }

    pub fn winner(&self) -> Option<&Team> {
        let score = self.score?;
        self.slot(score.winner()).team()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PlayerId;

    fn team(a: &str, b: &str) -> Team {
        Team::new(PlayerId::from(a), PlayerId::from(b))
    }

    fn semi() -> BracketMatch {
        BracketMatch {
            id: BracketId::from("semi_1"),
            round: 1,
            match_number: 1,
            team_a: BracketSlot::Scheduled {
                team: team("a", "b"),
            },
            team_b: BracketSlot::Placeholder {
                feeder: BracketId::from("quarter_2"),
            },
            score: None,
            winner_advances_to: Some(SlotRef {
                bracket_id: BracketId::from("final"),
                side: Side::A,
            }),
            match_id: None,
        }
    }

    #[test]
    fn test_status_progression() {
        let mut m = semi();
        assert_eq!(m.status(), BracketStatus::Pending);

        *m.slot_mut(Side::B) = BracketSlot::Scheduled {
            team: team("c", "d"),
        };
        assert_eq!(m.status(), BracketStatus::Ready);

        m.score = Some(MatchScore::new(1, 2));
        assert_eq!(m.status(), BracketStatus::Completed);
        assert_eq!(m.winner(), Some(&team("c", "d")));
        assert!(!m.is_final());
    }

    #[test]
    fn test_slot_serialization_is_tagged() {
        let json = serde_json::to_value(&semi()).unwrap();
        assert_eq!(json["team_a"]["state"], "scheduled");
        assert_eq!(json["team_b"]["state"], "placeholder");
        assert_eq!(json["team_b"]["feeder"], "quarter_2");
        assert_eq!(json["winner_advances_to"]["side"], "a");
    }
}
