//! Pairing engine (history, rules, matchup search, group selection) and session reports.

mod constraints;
mod generate;
mod history;
mod matchup;
mod reports;
mod selection;

pub use constraints::{check_constraints, Issue};
pub use generate::{generate_match, suggest_match, MatchSuggestion, PairingError, Tier, PLAYERS_PER_MATCH};
pub use history::{build_histories, is_light_game, PlayerHistories, PlayerHistory};
pub use matchup::{find_best_matchup, team_skill, Matchup};
pub use reports::{match_summaries, player_costs, win_rates, MatchSummary, PlayerCost, PlayerResult, PlayerWinRate};
pub use selection::{
    evaluate_initial_group, exhaustive_search, priority_order, swap_search, within_wait_tolerance,
    BestSoFar, Candidate, Origin,
};
