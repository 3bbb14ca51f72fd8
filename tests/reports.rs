//! Integration tests for win rates, costs, match summaries and the CSV roster format.

use badminton_court_manager::logic::PlayerResult;
use badminton_court_manager::{
    match_summaries, player_costs, read_roster, win_rates, write_costs_csv, CostRates, PlayerId,
    Session,
};
use chrono::{DateTime, Duration, TimeZone, Utc};
use pretty_assertions::assert_eq;

fn at(minutes: i64) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 1, 19, 0, 0).unwrap() + Duration::minutes(minutes)
}

fn play(
    session: &mut Session,
    team_a: [PlayerId; 2],
    team_b: [PlayerId; 2],
    score: (u32, u32),
    shuttles: u32,
    start: i64,
) {
    let id = session.create_match(1, team_a, team_b, at(start)).unwrap();
    session.start_match(id, at(start)).unwrap();
    session.adjust_shuttlecocks(id, shuttles as i32 - 1).unwrap();
    session.complete_match(id, score.0, score.1, at(start + 15)).unwrap();
}

/// Ann, Ben, Cal and Dee (all skill 3) after three matches:
/// Ann+Ben beat Cal+Dee, Ann+Cal beat Ben+Dee, Ann+Dee tie Ben+Cal.
fn evening() -> (Session, [PlayerId; 4]) {
    let mut session = Session::new(at(0));
    let ids = ["Ann", "Ben", "Cal", "Dee"].map(|n| session.add_player(n, 3, at(0)).unwrap());
    let [ann, ben, cal, dee] = ids;
    play(&mut session, [ann, ben], [cal, dee], (21, 15), 2, 0);
    play(&mut session, [ann, cal], [ben, dee], (21, 19), 4, 20);
    play(&mut session, [ann, dee], [ben, cal], (20, 20), 2, 40);
    (session, ids)
}

#[test]
fn win_rates_count_ties_as_played_not_won() {
    let (session, _) = evening();
    let rates = win_rates(&session.players, &session.matches);
    let summary: Vec<(&str, u32, u32, u32)> = rates
        .iter()
        .map(|r| (r.name.as_str(), r.wins, r.losses, r.matches_played))
        .collect();
    assert_eq!(
        summary,
        vec![("Ann", 2, 0, 3), ("Ben", 1, 1, 3), ("Cal", 1, 1, 3), ("Dee", 0, 2, 3)]
    );
    assert!((rates[0].win_rate - 66.666).abs() < 0.01);
    assert_eq!(rates[3].win_rate, 0.0);
}

#[test]
fn win_rates_skip_players_without_completed_matches() {
    let (mut session, _) = evening();
    session.add_player("Eve", 4, at(60)).unwrap();
    let rates = win_rates(&session.players, &session.matches);
    assert_eq!(rates.len(), 4);
    assert!(rates.iter().all(|r| r.name != "Eve"));
}

#[test]
fn costs_split_shuttlecocks_between_four_players() {
    let (session, _) = evening();
    let rates = CostRates {
        daily_fee: 70.0,
        shuttlecock_fee: 20.0,
    };
    let costs = player_costs(&session.players, &session.matches, &rates);
    assert_eq!(costs.len(), 4);
    for c in &costs {
        // 8 shuttlecocks over 3 matches, everyone played all three.
        assert_eq!(c.matches_played, 3);
        assert_eq!(c.shuttlecocks_used, 2.0);
        assert_eq!(c.shuttlecock_cost, 40.0);
        assert_eq!(c.total_cost, 110.0);
    }
}

#[test]
fn live_matches_are_not_billed() {
    let mut session = Session::new(at(0));
    let ids: Vec<PlayerId> = ["A", "B", "C", "D"]
        .iter()
        .map(|n| session.add_player(n, 3, at(0)).unwrap())
        .collect();
    session.create_match(1, [ids[0], ids[1]], [ids[2], ids[3]], at(5)).unwrap();
    assert!(player_costs(&session.players, &session.matches, &CostRates::default()).is_empty());
}

#[test]
fn summaries_can_be_filtered_to_one_player() {
    let (session, [ann, ben, _, dee]) = evening();
    let all = match_summaries(&session.matches, None);
    assert_eq!(all.len(), 3);
    assert_eq!(all[0].team_a, vec!["Ann".to_string(), "Ben".to_string()]);
    assert_eq!(all[0].score, "21 - 15");
    assert_eq!(all[0].duration_secs, Some(15 * 60));
    assert_eq!(all[1].shuttlecocks_used, 4);
    assert!(all.iter().all(|s| s.player_result.is_none()));

    let results = |id| -> Vec<Option<PlayerResult>> {
        match_summaries(&session.matches, Some(id))
            .iter()
            .map(|s| s.player_result)
            .collect()
    };
    assert_eq!(
        results(ben),
        vec![Some(PlayerResult::Win), Some(PlayerResult::Loss), Some(PlayerResult::Draw)]
    );
    assert_eq!(
        results(dee),
        vec![Some(PlayerResult::Loss), Some(PlayerResult::Loss), Some(PlayerResult::Draw)]
    );
    assert_eq!(results(ann).len(), 3);
}

#[test]
fn roster_csv_is_trimmed_and_typed() {
    let csv = "name,skill_level\n Alice , 4\nBob,2\n";
    let rows = read_roster(csv.as_bytes()).unwrap();
    assert_eq!(rows, vec![("Alice".to_string(), 4), ("Bob".to_string(), 2)]);

    assert!(read_roster("name,skill_level\nCarol,high\n".as_bytes()).is_err());
}

#[test]
fn cost_report_csv_has_one_row_per_player() {
    let (session, _) = evening();
    let costs = player_costs(&session.players, &session.matches, &CostRates::default());
    let mut out = Vec::new();
    write_costs_csv(&mut out, &costs).unwrap();
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(
        lines[0],
        "name,matches_played,daily_fee,shuttlecocks_used,shuttlecock_cost,total_cost"
    );
    assert_eq!(lines.len(), 5);
    assert!(lines[1..].iter().all(|l| l.ends_with(",3,70.00,2.00,50.00,120.00")));
}
