//! Per-player pairing history, rebuilt from completed matches on every request.

use crate::config::PairingConfig;
use crate::models::{GameMatch, Player, PlayerId};
use serde::Serialize;
use std::collections::{HashMap, HashSet};

/// Who a player has played with and against this session.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize)]
pub struct PlayerHistory {
    /// Times each player shared this player's side.
    pub teammates: HashMap<PlayerId, u32>,
    /// Times each player was across the net.
    pub opponents: HashMap<PlayerId, u32>,
    /// Games where this player outclassed the opposing pair.
    pub light_games: u32,
    /// Partner in this player's most recent completed match.
    pub last_teammates: HashSet<PlayerId>,
    /// Opponents in this player's most recent completed match.
    pub last_opponents: HashSet<PlayerId>,
}

impl PlayerHistory {
    pub fn teammate_count(&self, other: PlayerId) -> u32 {
        self.teammates.get(&other).copied().unwrap_or(0)
    }

    pub fn opponent_count(&self, other: PlayerId) -> u32 {
        self.opponents.get(&other).copied().unwrap_or(0)
    }
}

pub type PlayerHistories = HashMap<PlayerId, PlayerHistory>;

/// True if `skill_level` beats the opposing team's average skill by at least `margin`.
///
/// Compared in integers: `skill - sum/n >= margin` is `skill*n - sum >= margin*n`.
pub fn is_light_game(skill_level: u8, opponents: &[Player], margin: u8) -> bool {
    if opponents.is_empty() {
        return false;
    }
    let n = opponents.len() as i64;
    let sum: i64 = opponents.iter().map(|p| i64::from(p.skill_level)).sum();
    i64::from(skill_level) * n - sum >= i64::from(margin) * n
}

/// Build histories for `known_players` (each gets an entry even with no games) from `matches`.
///
/// Only completed matches with an end time count. They are replayed oldest first, so
/// `last_teammates`/`last_opponents` end up describing each player's latest match.
pub fn build_histories(
    matches: &[GameMatch],
    known_players: &[Player],
    config: &PairingConfig,
) -> PlayerHistories {
    let mut histories: PlayerHistories = known_players
        .iter()
        .map(|p| (p.id, PlayerHistory::default()))
        .collect();

    let mut played: Vec<&GameMatch> = matches.iter().filter(|m| m.counts_for_history()).collect();
    played.sort_by_key(|m| m.end_time);

    for game in played {
        for (side, other_side) in [(&game.team_a, &game.team_b), (&game.team_b, &game.team_a)] {
            for player in side {
                let h = histories.entry(player.id).or_default();
                h.last_teammates.clear();
                h.last_opponents.clear();
                for mate in side.iter().filter(|m| m.id != player.id) {
                    *h.teammates.entry(mate.id).or_insert(0) += 1;
                    h.last_teammates.insert(mate.id);
                }
                for opp in other_side {
                    *h.opponents.entry(opp.id).or_insert(0) += 1;
                    h.last_opponents.insert(opp.id);
                }
                if is_light_game(player.skill_level, other_side, config.light_game_margin) {
                    h.light_games += 1;
                }
            }
        }
    }

    histories
}
