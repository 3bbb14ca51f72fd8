//! Badminton court manager: library with session models, the doubles pairing engine and reports.

pub mod config;
pub mod logic;
pub mod models;
pub mod roster;
pub mod store;

pub use config::{AppConfig, ConfigError, CostRates, PairingConfig, PairingStrategy};
pub use logic::{
    build_histories, check_constraints, find_best_matchup, generate_match, match_summaries,
    player_costs, suggest_match, win_rates, Issue, MatchSuggestion, Matchup, PairingError,
    PlayerHistories, PlayerHistory, Tier,
};
pub use models::{
    Court, CourtId, GameMatch, ImportSummary, MatchId, MatchStatus, Player, PlayerId, PlayerStatus,
    Session, SessionError, SessionId, Team,
};
pub use roster::{read_roster, write_costs_csv, RosterError};
pub use store::{JsonFileStore, MemoryStore, SessionStore, StoreError};
