//! Integration tests for match generation: priority group, swaps, exhaustive search, fallback.

use badminton_court_manager::logic::{priority_order, within_wait_tolerance};
use badminton_court_manager::{
    build_histories, generate_match, GameMatch, MatchStatus, MatchSuggestion, Matchup,
    PairingConfig, PairingError, PairingStrategy, Player, Tier,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;
use std::collections::HashSet;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap() + Duration::minutes(minutes)
}

/// Player who has been waiting since `waiting_since` minutes after the session start.
fn player(name: &str, skill: u8, waiting_since: i64) -> Player {
    Player::new(name, skill, at(waiting_since))
}

fn played(team_a: [&Player; 2], team_b: [&Player; 2], end_minute: i64) -> GameMatch {
    let mut m = GameMatch::new(
        1,
        [team_a[0].clone(), team_a[1].clone()],
        [team_b[0].clone(), team_b[1].clone()],
    );
    m.status = MatchStatus::Completed;
    m.end_time = Some(at(end_minute));
    m
}

fn config(strategy: PairingStrategy) -> PairingConfig {
    PairingConfig {
        strategy,
        seed: Some(7),
        ..PairingConfig::default()
    }
}

fn names(team: &[Player]) -> Vec<&str> {
    team.iter().map(|p| p.name.as_str()).collect()
}

#[test]
fn generate_requires_at_least_4_players() {
    let players = vec![player("A", 3, 0), player("B", 3, 1), player("C", 3, 2)];
    assert_eq!(
        generate_match(&players, &[], &PairingConfig::default()),
        Err(PairingError::InsufficientPlayers { available: 3 })
    );
}

#[test]
fn four_players_without_history_split_into_balanced_teams() {
    let players = vec![
        player("Five", 5, 0),
        player("Four", 4, 1),
        player("Three", 3, 2),
        player("Two", 2, 3),
    ];
    let result = generate_match(&players, &[], &PairingConfig::default()).unwrap();

    assert_eq!(names(&result.team_a), vec!["Five", "Two"]);
    assert_eq!(names(&result.team_b), vec!["Four", "Three"]);
    assert_eq!(result.skill_diff, 0);
    assert!(result.issues.is_empty());
    assert_eq!(result.tier, Tier::InitialGroup);
    assert!(result.explanation.contains("Five, Four, Three, Two"));
}

#[test]
fn priority_prefers_fewer_matches_then_longer_wait() {
    let mut veteran = player("Veteran", 3, 0);
    veteran.matches_played = 2;
    let players = vec![
        veteran,
        player("Late", 3, 30),
        player("Early", 3, 5),
        player("Mid", 3, 10),
        player("Later", 3, 20),
    ];
    let result = generate_match(&players, &[], &config(PairingStrategy::PrioritySwap)).unwrap();
    let chosen: HashSet<&str> = names(&result.team_a)
        .into_iter()
        .chain(names(&result.team_b))
        .collect();
    assert_eq!(chosen, HashSet::from(["Early", "Mid", "Later", "Late"]));
}

#[test]
fn fewer_issues_beat_better_balance() {
    let (a, b, c, d) = (player("A", 5, 0), player("B", 1, 1), player("C", 3, 2), player("D", 3, 3));
    let (e, f) = (player("E", 4, 0), player("F", 4, 0));
    let history = vec![played([&a, &b], [&e, &f], 20), played([&a, &b], [&e, &f], 40)];
    let available = vec![a, b, c, d];

    let result = generate_match(&available, &history, &config(PairingStrategy::PrioritySwap)).unwrap();
    // A+B would be level (6 v 6) but they have already partnered twice.
    assert_eq!(names(&result.team_a), vec!["A", "C"]);
    assert_eq!(names(&result.team_b), vec!["B", "D"]);
    assert_eq!(result.skill_diff, 4);
    assert!(result.issues.is_empty());
    assert_eq!(result.tier, Tier::Fallback);
    assert!(result.explanation.contains("skill-imbalanced"));
}

#[test]
fn avoid_list_conflict_is_reported_when_unavoidable() {
    let mut a = player("A", 3, 0);
    let b = player("B", 3, 1);
    a.avoid_players.insert(b.id);
    let players = vec![a, b, player("C", 3, 2), player("D", 3, 3)];

    let result = generate_match(&players, &[], &PairingConfig::default()).unwrap();
    assert_eq!(result.issues, vec!["A wants to avoid B.".to_string()]);
    assert_eq!(result.tier, Tier::Fallback);
    assert!(result.explanation.contains("breaks 1 rule(s)"));
}

#[test]
fn swap_search_replaces_a_player_within_wait_tolerance() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 5)];

    let result = generate_match(&players, &[], &config(PairingStrategy::PrioritySwap)).unwrap();
    assert_eq!(result.tier, Tier::Swap);
    assert!(result.issues.is_empty());
    assert!(result.explanation.contains("Swapping P1 for P5"));
}

#[test]
fn swap_search_ignores_players_outside_wait_tolerance() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 30)];

    let result = generate_match(&players, &[], &config(PairingStrategy::PrioritySwap)).unwrap();
    assert_eq!(result.tier, Tier::Fallback);
    assert_eq!(result.issues.len(), 1);
    assert!(result.explanation.contains("the top 4 players"));
}

#[test]
fn auto_strategy_falls_through_to_exhaustive_search_for_small_pools() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 30)];

    let result = generate_match(&players, &[], &config(PairingStrategy::Auto)).unwrap();
    assert_eq!(result.tier, Tier::Exhaustive);
    assert!(result.issues.is_empty());
    let chosen: Vec<&str> = names(&result.team_a).into_iter().chain(names(&result.team_b)).collect();
    assert!(!(chosen.contains(&"P1") && chosen.contains(&"P2")));
}

#[test]
fn auto_strategy_skips_exhaustive_search_for_large_pools() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 30)];
    let cfg = PairingConfig {
        exhaustive_max_players: 4,
        ..config(PairingStrategy::Auto)
    };

    let result = generate_match(&players, &[], &cfg).unwrap();
    assert_eq!(result.tier, Tier::Fallback);
}

#[test]
fn exhaustive_search_finds_a_perfect_match_when_one_exists() {
    // The front of the priority order is lopsided; balanced groups sit further down.
    let players = vec![
        player("Top1", 5, 0),
        player("Top2", 5, 1),
        player("Top3", 5, 2),
        player("Low1", 1, 3),
        player("Mid1", 3, 60),
        player("Mid2", 3, 61),
        player("Mid3", 3, 62),
        player("Mid4", 3, 63),
    ];
    let result = generate_match(&players, &[], &config(PairingStrategy::Exhaustive)).unwrap();
    assert!(result.issues.is_empty());
    assert!(result.skill_diff <= 1);
    assert_eq!(result.tier, Tier::Exhaustive);
}

#[test]
fn same_inputs_give_same_result() {
    let players: Vec<Player> = (0..9)
        .map(|i| player(&format!("P{i}"), (i % 5 + 1) as u8, i as i64))
        .collect();
    let history = vec![
        played([&players[0], &players[1]], [&players[2], &players[3]], 20),
        played([&players[4], &players[5]], [&players[6], &players[7]], 25),
    ];
    for strategy in [PairingStrategy::PrioritySwap, PairingStrategy::Exhaustive, PairingStrategy::Auto] {
        let cfg = config(strategy);
        let first = generate_match(&players, &history, &cfg).unwrap();
        let second = generate_match(&players, &history, &cfg).unwrap();
        assert_eq!(first, second);
    }
}

#[test]
fn teams_are_disjoint_drawn_from_pool_and_skill_diff_is_exact() {
    let skills = [5u8, 1, 4, 2, 3, 3, 5, 2, 1, 4];
    let players: Vec<Player> = skills
        .iter()
        .enumerate()
        .map(|(i, &s)| player(&format!("P{i}"), s, i as i64))
        .collect();
    let history = vec![
        played([&players[0], &players[2]], [&players[1], &players[3]], 30),
        played([&players[0], &players[2]], [&players[4], &players[5]], 50),
    ];
    let pool_ids: HashSet<_> = players.iter().map(|p| p.id).collect();

    for strategy in [PairingStrategy::PrioritySwap, PairingStrategy::Exhaustive, PairingStrategy::Auto] {
        let cfg = config(strategy);
        let result = generate_match(&players, &history, &cfg).unwrap();
        let ids: HashSet<_> = result.team_a.iter().chain(result.team_b.iter()).map(|p| p.id).collect();
        assert_eq!(ids.len(), 4);
        assert!(ids.is_subset(&pool_ids));

        let sum = |team: &[Player]| team.iter().map(|p| u32::from(p.skill_level)).sum::<u32>();
        assert_eq!(result.skill_diff, sum(&result.team_a[..]).abs_diff(sum(&result.team_b[..])));

        // No other split of the same four breaks fewer rules.
        let histories = build_histories(&history, &players, &cfg);
        let [w, x] = result.team_a.clone();
        let [y, z] = result.team_b.clone();
        for (team_a, team_b) in [
            ([w.clone(), x.clone()], [y.clone(), z.clone()]),
            ([w.clone(), y.clone()], [x.clone(), z.clone()]),
            ([w.clone(), z.clone()], [x.clone(), y.clone()]),
        ] {
            let other = Matchup::evaluate(team_a, team_b, &histories, &cfg);
            assert!(result.issues.len() <= other.issues.len());
        }
    }
}

#[test]
fn huge_wait_tolerance_admits_every_substitute() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 600)];
    let cfg = PairingConfig {
        swap_wait_tolerance_minutes: i64::MAX,
        ..config(PairingStrategy::PrioritySwap)
    };

    let result = generate_match(&players, &[], &cfg).unwrap();
    assert_eq!(result.tier, Tier::Swap);
    assert!(result.explanation.contains("Swapping P1 for P5"));
}

#[test]
fn exhaustive_strategy_respects_player_limit() {
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    p1.avoid_players.insert(p2.id);
    let players = vec![p1, p2, player("P3", 3, 2), player("P4", 3, 3), player("P5", 3, 5)];
    let cfg = PairingConfig {
        exhaustive_max_players: 4,
        ..config(PairingStrategy::Exhaustive)
    };

    let result = generate_match(&players, &[], &cfg).unwrap();
    assert_eq!(result.tier, Tier::Swap);
}

#[test]
fn priority_group_wins_ties_with_later_candidates() {
    // Every group of four from this pool breaks exactly one or two avoid rules at skill diff 0,
    // so the swaps and the all-groups search only ever tie the top four.
    let mut p1 = player("P1", 3, 0);
    let p2 = player("P2", 3, 1);
    let p3 = player("P3", 3, 2);
    let mut p5 = player("P5", 3, 5);
    p1.avoid_players.insert(p2.id);
    p5.avoid_players.insert(p3.id);
    let players = vec![p1, p2, p3, player("P4", 3, 3), p5];

    for strategy in [PairingStrategy::PrioritySwap, PairingStrategy::Auto] {
        let result = generate_match(&players, &[], &config(strategy)).unwrap();
        assert_eq!(result.tier, Tier::Fallback);
        assert_eq!(result.issues, vec!["P1 wants to avoid P2.".to_string()]);
        assert!(result.explanation.contains("uses the top 4 players but breaks 1 rule(s)"));
    }
}

#[test]
fn wait_tolerance_edge_is_inclusive() {
    let scenario = |substitute_since: i64| {
        let mut p1 = player("P1", 3, 0);
        let p2 = player("P2", 3, 0);
        p1.avoid_players.insert(p2.id);
        let players = vec![
            p1,
            p2,
            player("P3", 3, 0),
            player("P4", 3, 0),
            player("P5", 3, substitute_since),
        ];
        generate_match(&players, &[], &config(PairingStrategy::PrioritySwap)).unwrap()
    };

    let at_limit = scenario(10);
    assert_eq!(at_limit.tier, Tier::Swap);
    assert!(at_limit.explanation.contains("Swapping P1 for P5"));

    let past_limit = scenario(11);
    assert_eq!(past_limit.tier, Tier::Fallback);
}

#[test]
fn players_without_wait_start_sort_first() {
    let mut unknown = player("Unknown", 3, 0);
    unknown.available_since = None;
    let players = vec![
        player("Early", 3, 1),
        player("Mid", 3, 2),
        player("Last", 3, 50),
        player("Later", 3, 3),
        unknown,
    ];
    let ordered = priority_order(&players);
    let names: Vec<&str> = ordered.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Unknown", "Early", "Mid", "Later", "Last"]);

    let result = generate_match(&players, &[], &config(PairingStrategy::PrioritySwap)).unwrap();
    let chosen: HashSet<&str> = names_of(&result);
    assert_eq!(chosen, HashSet::from(["Unknown", "Early", "Mid", "Later"]));
}

#[test]
fn substitutes_without_wait_start_are_always_eligible() {
    let cfg = PairingConfig::default();
    let stamped = player("Stamped", 3, 0);
    let late = player("Late", 3, 500);
    let mut unknown = player("Unknown", 3, 0);
    unknown.available_since = None;

    assert!(within_wait_tolerance(&unknown, &stamped, &cfg));
    assert!(within_wait_tolerance(&unknown, &unknown, &cfg));
    assert!(!within_wait_tolerance(&stamped, &unknown, &cfg));
    assert!(!within_wait_tolerance(&late, &stamped, &cfg));
    assert!(within_wait_tolerance(&stamped, &late, &cfg));
}

fn names_of(result: &MatchSuggestion) -> HashSet<&str> {
    result
        .team_a
        .iter()
        .chain(result.team_b.iter())
        .map(|p| p.name.as_str())
        .collect()
}
