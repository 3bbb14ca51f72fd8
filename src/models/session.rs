//! Session: the club night's players, courts and matches, plus every state transition on them.

use crate::models::court::{Court, CourtId};
use crate::models::game::{GameMatch, MatchId, MatchStatus};
use crate::models::player::{is_valid_skill_level, Player, PlayerId, PlayerStatus};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeSet, HashSet};
use thiserror::Error;
use uuid::Uuid;

/// Errors raised by session state changes.
#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum SessionError {
    #[error("Player name must not be empty")]
    EmptyName,
    #[error("A player with this name already exists")]
    DuplicatePlayerName,
    #[error("Skill level must be between 1 and 5 (got {0})")]
    InvalidSkillLevel(u8),
    #[error("Player not found")]
    PlayerNotFound(PlayerId),
    #[error("Player is currently in a match")]
    PlayerInMatch(PlayerId),
    #[error("{name} is no longer available")]
    PlayerNotAvailable { name: String },
    #[error("A player cannot avoid themselves")]
    SelfAvoidance,
    #[error("Court not found")]
    CourtNotFound(CourtId),
    #[error("A session has between 1 and 32 courts (got {0})")]
    InvalidCourtCount(u32),
    #[error("Court {0} already has a match")]
    CourtInUse(CourtId),
    #[error("Match not found")]
    MatchNotFound(MatchId),
    #[error("Invalid teams: {0}")]
    InvalidTeams(String),
    #[error("Cannot move match from {from:?} to {to:?}")]
    InvalidTransition { from: MatchStatus, to: MatchStatus },
    #[error("Shuttlecocks can only be adjusted while the match is in progress")]
    MatchNotInProgress(MatchId),
    #[error("Player status can only be set to available or unavailable")]
    InvalidStatusChange,
}

/// Unique identifier for a session.
pub type SessionId = Uuid;

/// Number of courts a new session starts with.
pub const DEFAULT_COURT_COUNT: u32 = 4;
/// Most courts one session may have.
pub const MAX_COURT_COUNT: u32 = 32;

/// Outcome of a bulk roster import.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
pub struct ImportSummary {
    pub added: usize,
    /// Names that were rejected (duplicate, empty or bad skill level).
    pub skipped: Vec<String>,
}

/// Full session state. Matches keep their own player snapshots; `players` is the live roster.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Session {
    pub id: SessionId,
    pub created_at: DateTime<Utc>,
    pub players: Vec<Player>,
    pub courts: Vec<Court>,
    /// Every match ever created this session, in creation order.
    pub matches: Vec<GameMatch>,
}

impl Session {
    /// Empty session with `Court 1`..`Court 4`.
    pub fn new(now: DateTime<Utc>) -> Self {
        Self::build(DEFAULT_COURT_COUNT, now)
    }

    /// Empty session with `court_count` courts, 1 to `MAX_COURT_COUNT`.
    pub fn with_courts(court_count: u32, now: DateTime<Utc>) -> Result<Self, SessionError> {
        if !(1..=MAX_COURT_COUNT).contains(&court_count) {
            return Err(SessionError::InvalidCourtCount(court_count));
        }
        Ok(Self::build(court_count, now))
    }

    fn build(court_count: u32, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: now,
            players: Vec::new(),
            courts: (1..=court_count).map(|n| Court::new(n, format!("Court {n}"))).collect(),
            matches: Vec::new(),
        }
    }

    pub fn player(&self, id: PlayerId) -> Option<&Player> {
        self.players.iter().find(|p| p.id == id)
    }

    pub fn get_player_mut(&mut self, id: PlayerId) -> Option<&mut Player> {
        self.players.iter_mut().find(|p| p.id == id)
    }

    pub fn get_match(&self, id: MatchId) -> Option<&GameMatch> {
        self.matches.iter().find(|m| m.id == id)
    }

    /// Snapshot of everyone currently waiting.
    pub fn available_players(&self) -> Vec<Player> {
        self.players.iter().filter(|p| p.is_available()).cloned().collect()
    }

    pub fn live_matches(&self) -> impl Iterator<Item = &GameMatch> {
        self.matches.iter().filter(|m| m.status.is_live())
    }

    // -- players --------------------------------------------------------

    /// Add a player. Names are trimmed and unique (case-insensitive).
    pub fn add_player(
        &mut self,
        name: &str,
        skill_level: u8,
        now: DateTime<Utc>,
    ) -> Result<PlayerId, SessionError> {
        let name = self.check_new_name(name, None)?;
        if !is_valid_skill_level(skill_level) {
            return Err(SessionError::InvalidSkillLevel(skill_level));
        }
        let player = Player::new(name, skill_level, now);
        let id = player.id;
        self.players.push(player);
        Ok(id)
    }

    /// Add many players at once, skipping rows that would be rejected.
    pub fn import_players<I>(&mut self, rows: I, now: DateTime<Utc>) -> ImportSummary
    where
        I: IntoIterator<Item = (String, u8)>,
    {
        let mut summary = ImportSummary::default();
        for (name, skill_level) in rows {
            match self.add_player(&name, skill_level, now) {
                Ok(_) => summary.added += 1,
                Err(e) => {
                    log::debug!("skipping roster row {name:?}: {e}");
                    summary.skipped.push(name);
                }
            }
        }
        summary
    }

    /// Rename and/or re-rate a player. Existing match snapshots are untouched.
    pub fn update_player(
        &mut self,
        id: PlayerId,
        name: Option<&str>,
        skill_level: Option<u8>,
    ) -> Result<(), SessionError> {
        let name = name.map(|n| self.check_new_name(n, Some(id))).transpose()?;
        if let Some(level) = skill_level {
            if !is_valid_skill_level(level) {
                return Err(SessionError::InvalidSkillLevel(level));
            }
        }
        let p = self.get_player_mut(id).ok_or(SessionError::PlayerNotFound(id))?;
        if let Some(name) = name {
            p.name = name;
        }
        if let Some(level) = skill_level {
            p.skill_level = level;
        }
        Ok(())
    }

    /// Remove a player who is not on court. Also drops them from everyone's avoid list.
    pub fn remove_player(&mut self, id: PlayerId) -> Result<(), SessionError> {
        let p = self.player(id).ok_or(SessionError::PlayerNotFound(id))?;
        if p.status == PlayerStatus::InMatch {
            return Err(SessionError::PlayerInMatch(id));
        }
        self.players.retain(|p| p.id != id);
        for p in &mut self.players {
            p.avoid_players.remove(&id);
        }
        Ok(())
    }

    /// Toggle between available and unavailable. Becoming available restarts the wait clock.
    pub fn set_player_status(
        &mut self,
        id: PlayerId,
        status: PlayerStatus,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        let p = self.get_player_mut(id).ok_or(SessionError::PlayerNotFound(id))?;
        if p.status == PlayerStatus::InMatch {
            return Err(SessionError::PlayerInMatch(id));
        }
        match status {
            PlayerStatus::InMatch => return Err(SessionError::InvalidStatusChange),
            PlayerStatus::Available if p.status != PlayerStatus::Available => p.make_available(now),
            PlayerStatus::Available => {}
            PlayerStatus::Unavailable => p.make_unavailable(),
        }
        Ok(())
    }

    /// Replace a player's avoid list. Every id must be another known player.
    pub fn set_avoid_players(&mut self, id: PlayerId, avoid: &[PlayerId]) -> Result<(), SessionError> {
        if self.player(id).is_none() {
            return Err(SessionError::PlayerNotFound(id));
        }
        let mut list = BTreeSet::new();
        for &other in avoid {
            if other == id {
                return Err(SessionError::SelfAvoidance);
            }
            if self.player(other).is_none() {
                return Err(SessionError::PlayerNotFound(other));
            }
            list.insert(other);
        }
        if let Some(p) = self.get_player_mut(id) {
            p.avoid_players = list;
        }
        Ok(())
    }

    fn check_new_name(&self, name: &str, except: Option<PlayerId>) -> Result<String, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let taken = self
            .players
            .iter()
            .any(|p| Some(p.id) != except && p.name.eq_ignore_ascii_case(name));
        if taken {
            return Err(SessionError::DuplicatePlayerName);
        }
        Ok(name.to_string())
    }

    // -- courts ---------------------------------------------------------

    /// Add a court with the next free id.
    pub fn add_court(&mut self, name: &str) -> Result<CourtId, SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let count = u32::try_from(self.courts.len()).unwrap_or(u32::MAX);
        if count >= MAX_COURT_COUNT {
            return Err(SessionError::InvalidCourtCount(count.saturating_add(1)));
        }
        let id = self.courts.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        self.courts.push(Court::new(id, name));
        Ok(id)
    }

    pub fn rename_court(&mut self, id: CourtId, name: &str) -> Result<(), SessionError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(SessionError::EmptyName);
        }
        let court = self
            .courts
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or(SessionError::CourtNotFound(id))?;
        court.name = name.to_string();
        Ok(())
    }

    /// Remove a court that has no live match.
    pub fn remove_court(&mut self, id: CourtId) -> Result<(), SessionError> {
        if !self.courts.iter().any(|c| c.id == id) {
            return Err(SessionError::CourtNotFound(id));
        }
        if self.live_matches().any(|m| m.court_id == id) {
            return Err(SessionError::CourtInUse(id));
        }
        self.courts.retain(|c| c.id != id);
        Ok(())
    }

    // -- matches --------------------------------------------------------

    /// Put four available players on a free court.
    ///
    /// Fails if any chosen player stopped being available since the suggestion was made,
    /// so a stale suggestion can never double-book a player.
    pub fn create_match(
        &mut self,
        court_id: CourtId,
        team_a: [PlayerId; 2],
        team_b: [PlayerId; 2],
        now: DateTime<Utc>,
    ) -> Result<MatchId, SessionError> {
        let court = self
            .courts
            .iter()
            .find(|c| c.id == court_id)
            .ok_or(SessionError::CourtNotFound(court_id))?;
        if !court.is_free() || self.live_matches().any(|m| m.court_id == court_id) {
            return Err(SessionError::CourtInUse(court_id));
        }

        let ids: Vec<PlayerId> = team_a.iter().chain(team_b.iter()).copied().collect();
        let distinct: HashSet<_> = ids.iter().collect();
        if distinct.len() != ids.len() {
            return Err(SessionError::InvalidTeams(
                "a player cannot appear twice in one match".to_string(),
            ));
        }
        for &id in &ids {
            let p = self.player(id).ok_or(SessionError::PlayerNotFound(id))?;
            if !p.is_available() {
                return Err(SessionError::PlayerNotAvailable { name: p.name.clone() });
            }
        }

        let snapshot = |id: PlayerId| self.player(id).cloned().ok_or(SessionError::PlayerNotFound(id));
        let game = GameMatch::new(
            court_id,
            [snapshot(team_a[0])?, snapshot(team_a[1])?],
            [snapshot(team_b[0])?, snapshot(team_b[1])?],
        );
        let match_id = game.id;
        let is_first_match = self.matches.is_empty();

        for p in &mut self.players {
            if ids.contains(&p.id) {
                p.enter_match();
            } else if is_first_match && p.is_available() {
                // Everyone's wait starts together once play begins.
                p.available_since = Some(now);
            }
        }
        if let Some(c) = self.courts.iter_mut().find(|c| c.id == court_id) {
            c.match_id = Some(match_id);
        }
        self.matches.push(game);
        Ok(match_id)
    }

    pub fn start_match(&mut self, id: MatchId, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.get_match_mut(id)?.start(now)
    }

    /// Record the final score, free the court and send the players back to the pool.
    pub fn complete_match(
        &mut self,
        id: MatchId,
        score_a: u32,
        score_b: u32,
        now: DateTime<Utc>,
    ) -> Result<(), SessionError> {
        self.get_match_mut(id)?.complete(score_a, score_b, now)?;
        self.release_match(id, true, now);
        Ok(())
    }

    /// Abandon a scheduled or running match. Nobody's match count changes.
    pub fn cancel_match(&mut self, id: MatchId, now: DateTime<Utc>) -> Result<(), SessionError> {
        self.get_match_mut(id)?.cancel(now)?;
        self.release_match(id, false, now);
        Ok(())
    }

    pub fn adjust_shuttlecocks(&mut self, id: MatchId, delta: i32) -> Result<u32, SessionError> {
        self.get_match_mut(id)?.adjust_shuttlecocks(delta)
    }

    /// Forget completed matches and reset everyone's match count. Live matches stay.
    pub fn clear_history(&mut self) {
        self.matches.retain(|m| m.status != MatchStatus::Completed);
        for p in &mut self.players {
            p.matches_played = 0;
        }
    }

    /// Make player/court state agree with the match list (after loading a snapshot).
    pub fn reconcile(&mut self, now: DateTime<Utc>) {
        let on_court: HashSet<PlayerId> = self.live_matches().flat_map(|m| m.player_ids()).collect();
        for p in &mut self.players {
            if on_court.contains(&p.id) {
                p.enter_match();
            } else if p.status == PlayerStatus::InMatch {
                p.make_available(now);
            } else if p.is_available() && p.available_since.is_none() {
                p.available_since = Some(now);
            }
        }
        for c in &mut self.courts {
            c.match_id = self
                .matches
                .iter()
                .find(|m| m.court_id == c.id && m.status.is_live())
                .map(|m| m.id);
        }
    }

    fn get_match_mut(&mut self, id: MatchId) -> Result<&mut GameMatch, SessionError> {
        self.matches
            .iter_mut()
            .find(|m| m.id == id)
            .ok_or(SessionError::MatchNotFound(id))
    }

    fn release_match(&mut self, id: MatchId, completed: bool, now: DateTime<Utc>) {
        let Some(game) = self.get_match(id) else {
            return;
        };
        let ids = game.player_ids();
        for p in &mut self.players {
            if ids.contains(&p.id) {
                p.make_available(now);
                if completed {
                    p.record_match_played();
                }
            }
        }
        for c in &mut self.courts {
            if c.match_id == Some(id) {
                c.match_id = None;
            }
        }
    }
}
