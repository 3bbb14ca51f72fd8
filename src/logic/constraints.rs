//! Fairness rules a candidate 2v2 split is checked against.

use crate::config::PairingConfig;
use crate::logic::history::{is_light_game, PlayerHistories, PlayerHistory};
use crate::models::{Player, PlayerId};
use serde::Serialize;
use std::collections::HashSet;
use std::fmt;

/// One broken rule. `Display` gives the text shown to the organiser.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum Issue {
    RepeatTeammates { player: String, other: String, times: u32 },
    RepeatOpponents { player: String, other: String, times: u32 },
    LastTeammates { player: String, other: String },
    LastOpponents { player: String, other: String },
    /// `previous` light games already played.
    LightGame { player: String, previous: u32 },
    Avoid { player: String, other: String },
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Issue::RepeatTeammates { player, other, times } => write!(
                f,
                "{player} and {other} have played together too many times ({times} games)."
            ),
            Issue::RepeatOpponents { player, other, times } => write!(
                f,
                "{player} and {other} have faced each other too many times ({times} games)."
            ),
            Issue::LastTeammates { player, other } => {
                write!(f, "{player} partnered {other} in their last match.")
            }
            Issue::LastOpponents { player, other } => {
                write!(f, "{player} played against {other} in their last match.")
            }
            Issue::LightGame { player, previous } => write!(
                f,
                "This would be light game {} for {player} (limit reached).",
                previous + 1
            ),
            Issue::Avoid { player, other } => write!(f, "{player} wants to avoid {other}."),
        }
    }
}

/// Rules reported once per unordered pair of players.
#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq)]
enum PairRule {
    RepeatTeammates,
    RepeatOpponents,
    LastTeammates,
    LastOpponents,
}

/// Every rule the split `team_a` vs `team_b` breaks. Empty means the split is valid.
///
/// Players are visited team A then team B, and for each player the rules run in a fixed
/// order, so the same input always yields the same list.
pub fn check_constraints(
    team_a: &[Player],
    team_b: &[Player],
    histories: &PlayerHistories,
    config: &PairingConfig,
) -> Vec<Issue> {
    let empty = PlayerHistory::default();
    let mut issues = Vec::new();
    let mut reported: HashSet<(PairRule, PlayerId, PlayerId)> = HashSet::new();
    let mut report_pair = |rule: PairRule, a: &Player, b: &Player| {
        let key = if a.id < b.id { (rule, a.id, b.id) } else { (rule, b.id, a.id) };
        reported.insert(key)
    };

    for (side, other_side) in [(team_a, team_b), (team_b, team_a)] {
        for player in side {
            let h = histories.get(&player.id).unwrap_or(&empty);
            let mates: Vec<&Player> = side.iter().filter(|m| m.id != player.id).collect();

            for &mate in &mates {
                let times = h.teammate_count(mate.id);
                if times >= config.repeat_limit && report_pair(PairRule::RepeatTeammates, player, mate) {
                    issues.push(Issue::RepeatTeammates {
                        player: player.name.clone(),
                        other: mate.name.clone(),
                        times,
                    });
                }
            }

            for opp in other_side {
                let times = h.opponent_count(opp.id);
                if times >= config.repeat_limit && report_pair(PairRule::RepeatOpponents, player, opp) {
                    issues.push(Issue::RepeatOpponents {
                        player: player.name.clone(),
                        other: opp.name.clone(),
                        times,
                    });
                }
            }

            for &mate in &mates {
                if h.last_teammates.contains(&mate.id) && report_pair(PairRule::LastTeammates, player, mate) {
                    issues.push(Issue::LastTeammates {
                        player: player.name.clone(),
                        other: mate.name.clone(),
                    });
                }
            }
            for opp in other_side {
                if h.last_opponents.contains(&opp.id) && report_pair(PairRule::LastOpponents, player, opp) {
                    issues.push(Issue::LastOpponents {
                        player: player.name.clone(),
                        other: opp.name.clone(),
                    });
                }
            }

            if h.light_games >= config.light_game_limit
                && is_light_game(player.skill_level, other_side, config.light_game_margin)
            {
                issues.push(Issue::LightGame {
                    player: player.name.clone(),
                    previous: h.light_games,
                });
            }

            for other in team_a.iter().chain(team_b) {
                if other.id != player.id && player.avoids(other.id) {
                    issues.push(Issue::Avoid {
                        player: player.name.clone(),
                        other: other.name.clone(),
                    });
                }
            }
        }
    }

    issues
}
