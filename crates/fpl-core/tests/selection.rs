// End-to-end tests over a realistic gameweek table: CSV ingestion, ranking,
// selection in both bench modes, and report rendering.

use std::collections::HashSet;
use std::path::PathBuf;

use fpl_core::{
    cheapest_remaining, load_candidates, rank, select, BenchMode, Candidate, MalformedRecord,
    Position, QuotaPolicy, RankingReport, SelectionRequest, SelectorError, SquadReport,
};

fn fixture_path() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/gameweek.csv")
}

fn candidates() -> Vec<Candidate> {
    load_candidates(&fixture_path()).unwrap().candidates
}

#[test]
fn fixture_loads_with_two_rejected_rows() {
    let table = load_candidates(&fixture_path()).unwrap();
    assert_eq!(table.candidates.len(), 27);
    assert_eq!(table.skipped.len(), 2);

    assert_eq!(table.skipped[0].row, 27);
    assert_eq!(table.skipped[0].error, MalformedRecord::MissingField("cost"));
    assert_eq!(table.skipped[1].row, 28);
    assert!(matches!(table.skipped[1].error, MalformedRecord::UnknownPosition(_)));

    let haaland = table.candidates.iter().find(|c| c.player_id == "22").unwrap();
    assert_eq!(haaland.position, Position::Forward);
    assert_eq!(haaland.name.as_deref(), Some("Haaland"));
    assert_eq!(haaland.team.as_deref(), Some("Man City"));
}

#[test]
fn standard_squad_within_budget() {
    let pool = candidates();
    let policy = QuotaPolicy::standard();
    let squad = select(&pool, &policy, &SelectionRequest::new(100.0)).unwrap();

    assert!(squad.method.is_exact());
    assert_eq!(squad.len(), 15);
    assert_eq!(squad.starters.len(), 11);
    assert!(squad.total_cost() <= 100.0 + 1e-9);
    assert_eq!(squad.count_for(Position::Goalkeeper), (1, 1));
    assert_eq!(squad.count_for(Position::Defender), (4, 1));
    assert_eq!(squad.count_for(Position::Midfielder), (4, 1));
    assert_eq!(squad.count_for(Position::Forward), (2, 1));

    let ids: HashSet<&str> = squad.players().map(|c| c.player_id.as_str()).collect();
    assert_eq!(ids.len(), 15);
}

#[test]
fn club_limit_keeps_three_per_club() {
    let pool = candidates();
    let policy = QuotaPolicy::standard();
    let free = select(&pool, &policy, &SelectionRequest::new(120.0)).unwrap();
    let limited = select(
        &pool,
        &policy,
        &SelectionRequest::new(120.0).with_max_per_club(3),
    )
    .unwrap();

    assert!(limited.method.is_exact());
    assert_eq!(limited.len(), 15);
    assert!(limited.total_cost() <= 120.0 + 1e-9);
    for club in limited.players().filter_map(|c| c.team.as_deref()) {
        let count = limited
            .players()
            .filter(|c| c.team.as_deref() == Some(club))
            .count();
        assert!(count <= 3, "{club} has {count} players");
    }
    assert!(limited.total_predicted_points() <= free.total_predicted_points() + 1e-9);
}

#[test]
fn minimum_budget_forces_cheapest_squad() {
    // Cheapest per position: GK 8.5, DEF 21.5, MID 29.5, FWD 18.0.
    let pool = candidates();
    let squad = select(&pool, &QuotaPolicy::standard(), &SelectionRequest::new(77.5)).unwrap();
    assert!((squad.total_cost() - 77.5).abs() < 1e-9);

    let names: HashSet<&str> = squad.players().map(|c| c.label()).collect();
    // Equal-cost choices go to the higher-scoring player.
    assert!(names.contains("Wood"));
    assert!(!names.contains("Cunha"));
    assert!(names.contains("Robinson"));
    assert!(!names.contains("Ait-Nouri"));
}

#[test]
fn budget_below_cheapest_squad_is_rejected() {
    let pool = candidates();
    let err = select(&pool, &QuotaPolicy::standard(), &SelectionRequest::new(70.0)).unwrap_err();
    match err {
        SelectorError::InfeasibleBudget {
            minimum_budget,
            shortfall,
            ..
        } => {
            assert!((minimum_budget - 77.5).abs() < 1e-9);
            assert!((shortfall - 7.5).abs() < 1e-9);
        }
        other => panic!("expected InfeasibleBudget, got: {other}"),
    }
}

#[test]
fn cheapest_fill_bench_is_cheapest_leftover() {
    let pool = candidates();
    let policy = QuotaPolicy::standard();
    let request = SelectionRequest::new(100.0).with_auto_select_bench(true);
    let squad = select(&pool, &policy, &request).unwrap();
    assert_eq!(squad.bench_mode, BenchMode::CheapestFill);
    assert!(squad.total_cost() <= 100.0 + 1e-9);

    for position in Position::ALL {
        let starters: Vec<Candidate> = squad
            .starters
            .iter()
            .filter(|c| c.position == position)
            .cloned()
            .collect();
        let expected: HashSet<&str> = cheapest_remaining(
            pool.iter().filter(|c| c.position == position),
            &starters,
            policy.slots_for(position).bench,
        )
        .into_iter()
        .map(|c| c.player_id.as_str())
        .collect();
        let actual: HashSet<&str> = squad
            .bench
            .iter()
            .filter(|c| c.position == position)
            .map(|c| c.player_id.as_str())
            .collect();
        assert_eq!(actual, expected, "{position}");
    }
}

#[test]
fn cheapest_fill_starters_score_at_least_joint_starters() {
    let pool = candidates();
    let policy = QuotaPolicy::standard();
    let joint = select(&pool, &policy, &SelectionRequest::new(100.0)).unwrap();
    let fill = select(
        &pool,
        &policy,
        &SelectionRequest::new(100.0).with_auto_select_bench(true),
    )
    .unwrap();
    // Joint selection maximizes all fifteen; cheapest-fill maximizes the XI.
    assert!(joint.total_predicted_points() + 1e-9 >= fill.total_predicted_points());
    assert!(fill.starting_points() + 1e-9 >= joint.starting_points());
}

#[test]
fn shuffled_table_gives_identical_squad() {
    let pool = candidates();
    let policy = QuotaPolicy::standard();
    let request = SelectionRequest::new(95.0);
    let expected = select(&pool, &policy, &request).unwrap();

    let mut reversed = pool.clone();
    reversed.reverse();
    let mut interleaved: Vec<Candidate> = pool.iter().step_by(2).cloned().collect();
    interleaved.extend(pool.iter().skip(1).step_by(2).cloned());

    assert_eq!(select(&reversed, &policy, &request).unwrap(), expected);
    assert_eq!(select(&interleaved, &policy, &request).unwrap(), expected);
}

#[test]
fn ranking_over_fixture() {
    let ranked = rank(&candidates(), 3).unwrap();
    let mids: Vec<&str> = ranked
        .group(Position::Midfielder)
        .iter()
        .map(|c| c.label())
        .collect();
    assert_eq!(mids, vec!["Salah", "Palmer", "Saka"]);

    let text = RankingReport::from_ranked(&ranked).to_string();
    assert!(text.contains("TOP 3 PLAYERS BY POSITION"));
    assert!(text.contains("Haaland"));
}

#[test]
fn squad_report_renders_fixture_names() {
    let squad = select(&candidates(), &QuotaPolicy::standard(), &SelectionRequest::new(100.0)).unwrap();
    let report = SquadReport::from_squad(&squad);
    assert_eq!(report.starters.len(), 11);
    assert_eq!(report.bench.len(), 4);
    assert!(report.bank >= 0.0);
    let text = report.to_string();
    assert!(text.contains("BEST SQUAD (exact)"));
    assert!(text.contains("Bank:"));
}
