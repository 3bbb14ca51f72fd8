//! Session reports built from completed matches: win rates, per-player costs, match summaries.

use crate::config::CostRates;
use crate::models::{GameMatch, MatchId, MatchStatus, Player, PlayerId, Team};
use serde::Serialize;
use std::collections::HashMap;

/// Win/loss record of one player.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerWinRate {
    pub player_id: PlayerId,
    pub name: String,
    pub wins: u32,
    pub losses: u32,
    pub matches_played: u32,
    /// Percentage, 0 to 100.
    pub win_rate: f64,
}

/// What one player owes for the session.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct PlayerCost {
    pub player_id: PlayerId,
    pub name: String,
    pub matches_played: u32,
    pub daily_fee: f64,
    /// This player's share of shuttlecocks (each match's count split four ways).
    pub shuttlecocks_used: f64,
    pub shuttlecock_cost: f64,
    pub total_cost: f64,
}

/// Result of a match from one player's point of view.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PlayerResult {
    Win,
    Loss,
    Draw,
}

/// One completed match as shown in the session summary.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MatchSummary {
    pub match_id: MatchId,
    pub court_id: u32,
    pub team_a: Vec<String>,
    pub team_b: Vec<String>,
    pub score: String,
    /// Playing time in seconds, when start and end are known.
    pub duration_secs: Option<i64>,
    pub shuttlecocks_used: u32,
    /// Set when the summary is filtered to one player.
    pub player_result: Option<PlayerResult>,
}

fn completed(matches: &[GameMatch]) -> impl Iterator<Item = &GameMatch> {
    matches.iter().filter(|m| m.status == MatchStatus::Completed)
}

fn result_for(game: &GameMatch, team: Team) -> PlayerResult {
    match game.winner() {
        Some(w) if w == team => PlayerResult::Win,
        Some(_) => PlayerResult::Loss,
        None => PlayerResult::Draw,
    }
}

/// Win rates for every player in `players` who finished at least one match.
/// Sorted by win rate, then by matches played (both descending).
pub fn win_rates(players: &[Player], matches: &[GameMatch]) -> Vec<PlayerWinRate> {
    // wins, losses, played
    let mut record: HashMap<PlayerId, (u32, u32, u32)> = HashMap::new();
    for game in completed(matches) {
        for (team, side) in [(Team::A, &game.team_a), (Team::B, &game.team_b)] {
            for p in side {
                let entry = record.entry(p.id).or_insert((0, 0, 0));
                match result_for(game, team) {
                    PlayerResult::Win => entry.0 += 1,
                    PlayerResult::Loss => entry.1 += 1,
                    PlayerResult::Draw => {}
                }
                entry.2 += 1;
            }
        }
    }

    let mut rates: Vec<PlayerWinRate> = players
        .iter()
        .filter_map(|p| {
            let &(wins, losses, played) = record.get(&p.id)?;
            Some(PlayerWinRate {
                player_id: p.id,
                name: p.name.clone(),
                wins,
                losses,
                matches_played: played,
                win_rate: f64::from(wins) / f64::from(played) * 100.0,
            })
        })
        .collect();
    rates.sort_by(|a, b| {
        b.win_rate
            .total_cmp(&a.win_rate)
            .then(b.matches_played.cmp(&a.matches_played))
    });
    rates
}

/// Costs for every player in `players` who finished at least one match, most expensive first.
pub fn player_costs(players: &[Player], matches: &[GameMatch], rates: &CostRates) -> Vec<PlayerCost> {
    let mut usage: HashMap<PlayerId, (u32, f64)> = HashMap::new();
    for game in completed(matches) {
        let on_court = game.players().count() as f64;
        let share = f64::from(game.shuttlecocks_used) / on_court;
        for p in game.players() {
            let entry = usage.entry(p.id).or_insert((0, 0.0));
            entry.0 += 1;
            entry.1 += share;
        }
    }

    let mut costs: Vec<PlayerCost> = players
        .iter()
        .filter_map(|p| {
            let &(matches_played, shuttlecocks_used) = usage.get(&p.id)?;
            let shuttlecock_cost = shuttlecocks_used * rates.shuttlecock_fee;
            Some(PlayerCost {
                player_id: p.id,
                name: p.name.clone(),
                matches_played,
                daily_fee: rates.daily_fee,
                shuttlecocks_used,
                shuttlecock_cost,
                total_cost: rates.daily_fee + shuttlecock_cost,
            })
        })
        .collect();
    costs.sort_by(|a, b| b.total_cost.total_cmp(&a.total_cost));
    costs
}

/// Completed matches, optionally only those `player` took part in.
pub fn match_summaries(matches: &[GameMatch], player: Option<PlayerId>) -> Vec<MatchSummary> {
    completed(matches)
        .filter(|m| player.map_or(true, |id| m.involves(id)))
        .map(|m| MatchSummary {
            match_id: m.id,
            court_id: m.court_id,
            team_a: m.team_a.iter().map(|p| p.name.clone()).collect(),
            team_b: m.team_b.iter().map(|p| p.name.clone()).collect(),
            score: format!("{} - {}", m.score_a, m.score_b),
            duration_secs: m.duration().map(|d| d.num_seconds()),
            shuttlecocks_used: m.shuttlecocks_used,
            player_result: player
                .and_then(|id| m.team_of(id))
                .map(|team| result_for(m, team)),
        })
        .collect()
}
