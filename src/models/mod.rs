//! Data structures for the badminton session: players, courts, matches, session state.

mod court;
mod game;
mod player;
mod session;

pub use court::{Court, CourtId};
pub use game::{GameMatch, MatchId, MatchStatus, Team};
pub use player::{is_valid_skill_level, Player, PlayerId, PlayerStatus, MAX_SKILL_LEVEL, MIN_SKILL_LEVEL};
pub use session::{ImportSummary, Session, SessionError, SessionId, DEFAULT_COURT_COUNT, MAX_COURT_COUNT};
