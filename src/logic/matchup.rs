//! Best 2v2 split of exactly four players.

use crate::config::PairingConfig;
use crate::logic::constraints::{check_constraints, Issue};
use crate::logic::history::PlayerHistories;
use crate::models::Player;
use serde::Serialize;

/// A concrete split of four players with its score.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct Matchup {
    pub team_a: [Player; 2],
    pub team_b: [Player; 2],
    pub skill_diff: u32,
    pub issues: Vec<Issue>,
}

impl Matchup {
    /// Build and score a split.
    pub fn evaluate(
        team_a: [Player; 2],
        team_b: [Player; 2],
        histories: &PlayerHistories,
        config: &PairingConfig,
    ) -> Self {
        let skill_diff = team_skill(&team_a).abs_diff(team_skill(&team_b));
        let issues = check_constraints(&team_a, &team_b, histories, config);
        Self {
            team_a,
            team_b,
            skill_diff,
            issues,
        }
    }

    /// Lower is better: rule violations first, then skill imbalance.
    pub fn score(&self) -> (usize, u32) {
        (self.issues.len(), self.skill_diff)
    }

    /// No broken rules and close enough in skill.
    pub fn is_perfect(&self, config: &PairingConfig) -> bool {
        self.issues.is_empty() && self.skill_diff <= config.perfect_skill_diff
    }

    pub fn is_better_than(&self, other: &Matchup) -> bool {
        self.score() < other.score()
    }

    pub fn players(&self) -> impl Iterator<Item = &Player> {
        self.team_a.iter().chain(self.team_b.iter())
    }
}

/// Sum of skill levels on one side.
pub fn team_skill(team: &[Player]) -> u32 {
    team.iter().map(|p| u32::from(p.skill_level)).sum()
}

/// The three ways to split positions 0..4 into two pairs: 0 partners each of the others.
const SPLITS: [([usize; 2], [usize; 2]); 3] = [([0, 1], [2, 3]), ([0, 2], [1, 3]), ([0, 3], [1, 2])];

/// Best split of `players`, or `None` unless there are exactly four.
///
/// Fewer issues always wins; skill difference only breaks ties. Among equal scores the
/// earlier split (in `SPLITS` order) is kept.
pub fn find_best_matchup(
    players: &[Player],
    histories: &PlayerHistories,
    config: &PairingConfig,
) -> Option<Matchup> {
    if players.len() != 4 {
        return None;
    }
    SPLITS
        .iter()
        .map(|([a1, a2], [b1, b2])| {
            Matchup::evaluate(
                [players[*a1].clone(), players[*a2].clone()],
                [players[*b1].clone(), players[*b2].clone()],
                histories,
                config,
            )
        })
        .min_by_key(Matchup::score)
}
