//! Match (game), Team, and MatchStatus for 2v2 doubles.

use crate::models::court::CourtId;
use crate::models::player::{Player, PlayerId};
use crate::models::session::SessionError;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for a match.
pub type MatchId = Uuid;

/// Side of the net.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Team {
    #[default]
    A,
    B,
}

/// Lifecycle of a match. Transitions only move forward:
/// scheduled -> in-progress -> completed, and scheduled/in-progress -> cancelled.
#[derive(Clone, Copy, Debug, Default, Eq, Hash, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MatchStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl MatchStatus {
    /// Scheduled or in progress: the court and its players are occupied.
    pub fn is_live(self) -> bool {
        matches!(self, MatchStatus::Scheduled | MatchStatus::InProgress)
    }
}

/// A doubles match on one court. Teams are snapshots taken at creation.
#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct GameMatch {
    pub id: MatchId,
    pub court_id: CourtId,
    pub team_a: [Player; 2],
    pub team_b: [Player; 2],
    pub score_a: u32,
    pub score_b: u32,
    pub status: MatchStatus,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub shuttlecocks_used: u32,
}

impl GameMatch {
    /// New scheduled match with one shuttlecock out.
    pub fn new(court_id: CourtId, team_a: [Player; 2], team_b: [Player; 2]) -> Self {
        Self {
            id: Uuid::new_v4(),
            court_id,
            team_a,
            team_b,
            score_a: 0,
            score_b: 0,
            status: MatchStatus::Scheduled,
            start_time: None,
            end_time: None,
            shuttlecocks_used: 1,
        }
    }

    /// All four players, team A first.
    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.team_a.iter().chain(self.team_b.iter())
    }

    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players().map(|p| p.id).collect()
    }

    pub fn involves(&self, player_id: PlayerId) -> bool {
        self.players().any(|p| p.id == player_id)
    }

    /// Which team `player_id` played on, if any.
    pub fn team_of(&self, player_id: PlayerId) -> Option<Team> {
        if self.team_a.iter().any(|p| p.id == player_id) {
            Some(Team::A)
        } else if self.team_b.iter().any(|p| p.id == player_id) {
            Some(Team::B)
        } else {
            None
        }
    }

    /// Side with the higher score; `None` on a level score.
    pub fn winner(&self) -> Option<Team> {
        use std::cmp::Ordering::*;
        match self.score_a.cmp(&self.score_b) {
            Greater => Some(Team::A),
            Less => Some(Team::B),
            Equal => None,
        }
    }

    /// Counted in pairing history.
    pub fn counts_for_history(&self) -> bool {
        self.status == MatchStatus::Completed && self.end_time.is_some()
    }

    /// Playing time, when both ends are known.
    pub fn duration(&self) -> Option<Duration> {
        match (self.start_time, self.end_time) {
            (Some(start), Some(end)) => Some(end - start),
            _ => None,
        }
    }

    /// scheduled -> in-progress.
    pub fn start(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(MatchStatus::InProgress)?;
        self.start_time.get_or_insert(now);
        Ok(())
    }

    /// in-progress -> completed with the final score.
    pub fn complete(&mut self, score_a: u32, score_b: u32, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(MatchStatus::Completed)?;
        self.score_a = score_a;
        self.score_b = score_b;
        self.end_time.get_or_insert(now);
        Ok(())
    }

    /// scheduled/in-progress -> cancelled.
    pub fn cancel(&mut self, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.transition(MatchStatus::Cancelled)?;
        self.end_time.get_or_insert(now);
        Ok(())
    }

    /// Add or remove shuttlecocks while play is on. Never drops below zero.
    pub fn adjust_shuttlecocks(&mut self, delta: i32) -> Result<u32, SessionError> {
        if self.status != MatchStatus::InProgress {
            return Err(SessionError::MatchNotInProgress(self.id));
        }
        let updated = (i64::from(self.shuttlecocks_used) + i64::from(delta)).max(0);
        self.shuttlecocks_used = u32::try_from(updated).unwrap_or(u32::MAX);
        Ok(self.shuttlecocks_used)
    }

    fn transition(&mut self, to: MatchStatus) -> Result<(), SessionError> {
        use MatchStatus::*;
        let allowed = matches!(
            (self.status, to),
            (Scheduled, InProgress) | (InProgress, Completed) | (Scheduled, Cancelled) | (InProgress, Cancelled)
        );
        if !allowed {
            return Err(SessionError::InvalidTransition { from: self.status, to });
        }
        self.status = to;
        Ok(())
    }
}
