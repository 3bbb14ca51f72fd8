//! Match suggestion: runs the selection ladder and explains the outcome.
//!
//! 1. Build histories from completed matches.
//! 2. Sort available players by priority (fewest matches, then longest wait).
//! 3. Take the top four; return at once if their best split is perfect.
//! 4. Try swapping each of the four for a waiting player within the wait tolerance.
//! 5. For small pools, search every group of four.
//! 6. Otherwise return the best-scored matchup seen, with the rules it breaks.
//!
//! Nothing here mutates players or matches. The caller applies the result.

use crate::config::{PairingConfig, PairingStrategy};
use crate::logic::history::build_histories;
use crate::logic::matchup::{team_skill, Matchup};
use crate::logic::selection::{
    evaluate_initial_group, exhaustive_search, priority_order, swap_search, BestSoFar, Candidate,
    Origin,
};
use crate::models::{GameMatch, Player, Session};
use serde::Serialize;
use thiserror::Error;

/// Players needed for one doubles match.
pub const PLAYERS_PER_MATCH: usize = 4;

#[derive(Clone, Debug, Eq, PartialEq, Error)]
pub enum PairingError {
    #[error("Need at least 4 available players to generate a match (have {available})")]
    InsufficientPlayers { available: usize },
    #[error("No matchup could be formed from the available players")]
    NoMatchupFound,
}

/// Which step of the ladder produced the suggestion.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Tier {
    InitialGroup,
    Swap,
    Exhaustive,
    /// Nothing perfect was found; best-scored matchup returned.
    Fallback,
}

/// Suggested teams for the organiser to confirm or override.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct MatchSuggestion {
    pub team_a: [Player; 2],
    pub team_b: [Player; 2],
    pub skill_diff: u32,
    pub explanation: String,
    /// Broken rules, empty when the suggestion is fully compliant.
    pub issues: Vec<String>,
    pub tier: Tier,
}

/// Suggest a balanced doubles match from `available` given `previous` matches.
pub fn generate_match(
    available: &[Player],
    previous: &[GameMatch],
    config: &PairingConfig,
) -> Result<MatchSuggestion, PairingError> {
    if available.len() < PLAYERS_PER_MATCH {
        return Err(PairingError::InsufficientPlayers {
            available: available.len(),
        });
    }

    let histories = build_histories(previous, available, config);
    let ordered = priority_order(available);
    let mut best = BestSoFar::default();

    let small_pool = ordered.len() <= config.exhaustive_max_players;
    let strategy = match config.strategy {
        PairingStrategy::Exhaustive if !small_pool => {
            log::warn!(
                "{} players exceed the exhaustive search limit of {}; using priority and swaps",
                ordered.len(),
                config.exhaustive_max_players
            );
            PairingStrategy::PrioritySwap
        }
        other => other,
    };
    let run_exhaustive = match strategy {
        PairingStrategy::PrioritySwap => false,
        PairingStrategy::Exhaustive => true,
        PairingStrategy::Auto => small_pool,
    };

    if strategy != PairingStrategy::Exhaustive {
        let initial = evaluate_initial_group(&ordered, &histories, config).ok_or_else(no_matchup)?;
        if initial.matchup.is_perfect(config) {
            return Ok(perfect(initial, &ordered[..PLAYERS_PER_MATCH]));
        }
        best.offer(initial);

        if let Some(found) = swap_search(&ordered, &histories, config, &mut best) {
            return Ok(perfect(found, &ordered[..PLAYERS_PER_MATCH]));
        }
    }

    if run_exhaustive {
        if let Some(found) = exhaustive_search(&ordered, &histories, config, &mut best) {
            return Ok(perfect(found, &ordered[..PLAYERS_PER_MATCH]));
        }
    }

    let considered = best.groups_considered();
    let candidate = best.into_best().ok_or_else(no_matchup)?;
    log::warn!(
        "no perfect matchup among {} group(s); falling back to one with {} issue(s), skill diff {}",
        considered,
        candidate.matchup.issues.len(),
        candidate.matchup.skill_diff
    );
    Ok(fallback(candidate))
}

/// Run the engine over a session's current available players and match list.
pub fn suggest_match(session: &Session, config: &PairingConfig) -> Result<MatchSuggestion, PairingError> {
    generate_match(&session.available_players(), &session.matches, config)
}

fn no_matchup() -> PairingError {
    log::error!("invariant violated: at least 4 players but no matchup could be evaluated");
    PairingError::NoMatchupFound
}

fn perfect(candidate: Candidate, initial_group: &[Player]) -> MatchSuggestion {
    let m = &candidate.matchup;
    let balance = format!(
        "skill difference of {} (Team A: {}, Team B: {})",
        m.skill_diff,
        team_skill(&m.team_a),
        team_skill(&m.team_b)
    );
    let (tier, explanation) = match &candidate.origin {
        Origin::InitialGroup => (
            Tier::InitialGroup,
            format!(
                "Selected the top 4 players by matches played and wait time ({}). Found a perfect pairing with a {}.",
                names(initial_group),
                balance
            ),
        ),
        Origin::Swap {
            swapped_out,
            swapped_in,
        } => (
            Tier::Swap,
            format!(
                "The top 4 players had no perfect pairing. Swapping {swapped_out} for {swapped_in} gives a perfect pairing with a {balance}."
            ),
        ),
        Origin::Exhaustive => (
            Tier::Exhaustive,
            format!(
                "Searched all groups of 4 and found {} with a {}.",
                names(&group_of(m)),
                balance
            ),
        ),
    };
    log::debug!("{tier:?}: {explanation}");
    into_suggestion(candidate.matchup, explanation, tier)
}

fn fallback(candidate: Candidate) -> MatchSuggestion {
    let m = &candidate.matchup;
    let source = match &candidate.origin {
        Origin::InitialGroup => "the top 4 players".to_string(),
        Origin::Swap {
            swapped_out,
            swapped_in,
        } => format!("the top 4 players with {swapped_in} in place of {swapped_out}"),
        Origin::Exhaustive => names(&group_of(m)),
    };
    let explanation = if m.issues.is_empty() {
        format!(
            "No perfect pairing found. Best option uses {source} and follows every rule but is skill-imbalanced (difference {}, Team A: {}, Team B: {}).",
            m.skill_diff,
            team_skill(&m.team_a),
            team_skill(&m.team_b)
        )
    } else {
        format!(
            "No perfect pairing found. Best option uses {source} but breaks {} rule(s) (skill difference {}). Review the issues before confirming.",
            m.issues.len(),
            m.skill_diff
        )
    };
    into_suggestion(candidate.matchup, explanation, Tier::Fallback)
}

fn into_suggestion(matchup: Matchup, explanation: String, tier: Tier) -> MatchSuggestion {
    MatchSuggestion {
        issues: matchup.issues.iter().map(ToString::to_string).collect(),
        team_a: matchup.team_a,
        team_b: matchup.team_b,
        skill_diff: matchup.skill_diff,
        explanation,
        tier,
    }
}

fn group_of(m: &Matchup) -> Vec<Player> {
    m.players().cloned().collect()
}

fn names(players: &[Player]) -> String {
    players.iter().map(|p| p.name.as_str()).collect::<Vec<_>>().join(", ")
}
