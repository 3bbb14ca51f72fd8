//! Player and PlayerStatus data structures.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

/// Unique identifier for a player (stable across match history).
pub type PlayerId = Uuid;

/// Lowest and highest allowed skill level.
pub const MIN_SKILL_LEVEL: u8 = 1;
pub const MAX_SKILL_LEVEL: u8 = 5;

/// Where the player currently is.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlayerStatus {
    #[default]
    Available,
    InMatch,
    Unavailable,
}

/// A player in the session.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
    /// 1 (beginner) to 5 (strongest).
    pub skill_level: u8,
    /// Completed matches this session. Never decreases except on history clear.
    pub matches_played: u32,
    /// Start of the current wait. `None` while in a match or unavailable.
    pub available_since: Option<DateTime<Utc>>,
    pub status: PlayerStatus,
    /// Players this player never wants in the same match.
    #[serde(default)]
    pub avoid_players: BTreeSet<PlayerId>,
}

impl Player {
    /// Create an available player who starts waiting at `now`.
    pub fn new(name: impl Into<String>, skill_level: u8, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            skill_level,
            matches_played: 0,
            available_since: Some(now),
            status: PlayerStatus::Available,
            avoid_players: BTreeSet::new(),
        }
    }

    pub fn is_available(&self) -> bool {
        self.status == PlayerStatus::Available
    }

    /// True if `other` is on this player's own avoid list.
    pub fn avoids(&self, other: PlayerId) -> bool {
        self.avoid_players.contains(&other)
    }

    /// Put the player on court: wait clock stops.
    pub fn enter_match(&mut self) {
        self.status = PlayerStatus::InMatch;
        self.available_since = None;
    }

    /// Back to the waiting pool with a fresh wait clock.
    pub fn make_available(&mut self, now: DateTime<Utc>) {
        self.status = PlayerStatus::Available;
        self.available_since = Some(now);
    }

    pub fn make_unavailable(&mut self) {
        self.status = PlayerStatus::Unavailable;
        self.available_since = None;
    }

    /// Record a completed match.
    pub fn record_match_played(&mut self) {
        self.matches_played += 1;
    }
}

/// True if `level` is within the 1..=5 scale.
pub fn is_valid_skill_level(level: u8) -> bool {
    (MIN_SKILL_LEVEL..=MAX_SKILL_LEVEL).contains(&level)
}
