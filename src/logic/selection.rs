//! Choosing which four players to split: priority group, swaps, and the all-groups search.

use crate::config::PairingConfig;
use crate::logic::history::PlayerHistories;
use crate::logic::matchup::{find_best_matchup, Matchup};
use crate::models::Player;
use chrono::Duration;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use serde::Serialize;

/// Where an evaluated group of four came from.
#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// The first four in priority order.
    InitialGroup,
    /// The initial group with one player replaced.
    Swap { swapped_out: String, swapped_in: String },
    /// Any group found by the all-groups search.
    Exhaustive,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Candidate {
    pub matchup: Matchup,
    pub origin: Origin,
}

/// Best-scored candidate among everything evaluated. Ties keep the earlier one.
#[derive(Debug, Default)]
pub struct BestSoFar {
    best: Option<Candidate>,
    groups_considered: usize,
}

impl BestSoFar {
    pub fn offer(&mut self, candidate: Candidate) {
        self.groups_considered += 1;
        let replace = match &self.best {
            Some(current) => candidate.matchup.is_better_than(&current.matchup),
            None => true,
        };
        if replace {
            self.best = Some(candidate);
        }
    }

    pub fn groups_considered(&self) -> usize {
        self.groups_considered
    }

    pub fn into_best(self) -> Option<Candidate> {
        self.best
    }
}

/// Fewest matches played first; among equals, whoever has waited longest.
pub fn priority_order(players: &[Player]) -> Vec<Player> {
    let mut ordered = players.to_vec();
    ordered.sort_by_key(|p| (p.matches_played, p.available_since));
    ordered
}

/// A substitute may not have started waiting much later than the player they replace.
pub fn within_wait_tolerance(candidate: &Player, replaced: &Player, config: &PairingConfig) -> bool {
    match (candidate.available_since, replaced.available_since) {
        (None, _) => true,
        (Some(_), None) => false,
        (Some(c), Some(r)) => {
            // A limit past the end of time admits everyone.
            match Duration::try_minutes(config.swap_wait_tolerance_minutes)
                .and_then(|tolerance| r.checked_add_signed(tolerance))
            {
                Some(limit) => c <= limit,
                None => true,
            }
        }
    }
}

/// Evaluate the first four players of `ordered`.
pub fn evaluate_initial_group(
    ordered: &[Player],
    histories: &PlayerHistories,
    config: &PairingConfig,
) -> Option<Candidate> {
    let group = ordered.get(..4)?;
    find_best_matchup(group, histories, config).map(|matchup| Candidate {
        matchup,
        origin: Origin::InitialGroup,
    })
}

/// Replace one member of the initial group at a time with each eligible waiting player.
///
/// Returns the first perfect candidate; everything evaluated is offered to `best`.
pub fn swap_search(
    ordered: &[Player],
    histories: &PlayerHistories,
    config: &PairingConfig,
    best: &mut BestSoFar,
) -> Option<Candidate> {
    if ordered.len() <= 4 {
        return None;
    }
    let (initial, pool) = ordered.split_at(4);
    for (i, replaced) in initial.iter().enumerate() {
        for substitute in pool.iter().filter(|r| within_wait_tolerance(r, replaced, config)) {
            let mut group = initial.to_vec();
            group[i] = substitute.clone();
            let Some(matchup) = find_best_matchup(&group, histories, config) else {
                continue;
            };
            let candidate = Candidate {
                matchup,
                origin: Origin::Swap {
                    swapped_out: replaced.name.clone(),
                    swapped_in: substitute.name.clone(),
                },
            };
            if candidate.matchup.is_perfect(config) {
                return Some(candidate);
            }
            best.offer(candidate);
        }
    }
    None
}

/// Every group of four in shuffled order; returns the first perfect candidate.
///
/// Members keep their priority order inside each group, so splits are enumerated the same
/// way as for the initial group.
pub fn exhaustive_search(
    ordered: &[Player],
    histories: &PlayerHistories,
    config: &PairingConfig,
    best: &mut BestSoFar,
) -> Option<Candidate> {
    let mut groups = index_groups(ordered.len());
    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    groups.shuffle(&mut rng);

    for indices in groups {
        let group: Vec<Player> = indices.iter().map(|&i| ordered[i].clone()).collect();
        let Some(matchup) = find_best_matchup(&group, histories, config) else {
            continue;
        };
        let candidate = Candidate {
            matchup,
            origin: Origin::Exhaustive,
        };
        if candidate.matchup.is_perfect(config) {
            return Some(candidate);
        }
        best.offer(candidate);
    }
    None
}

/// All ascending index quadruples `i < j < k < l` below `n`.
fn index_groups(n: usize) -> Vec<[usize; 4]> {
    let mut groups = Vec::new();
    for i in 0..n {
        for j in i + 1..n {
            for k in j + 1..n {
                for l in k + 1..n {
                    groups.push([i, j, k, l]);
                }
            }
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_groups_counts_combinations() {
        assert_eq!(index_groups(3).len(), 0);
        assert_eq!(index_groups(4), vec![[0, 1, 2, 3]]);
        assert_eq!(index_groups(6).len(), 15);
        assert_eq!(index_groups(12).len(), 495);
    }
}
