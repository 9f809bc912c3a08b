use std::fs;
use std::path::PathBuf;

use dk_odds::export::{RowContext, event_records, join_events};
use dk_odds::flatten::{flatten_offers, parse_event_group_json};

const DATE: &str = "Thu, 01 Jun 2023 17:04:09 GMT";

fn read_fixture(name: &str) -> String {
    let mut path = PathBuf::from(env!("CARGO_MANIFEST_DIR"));
    path.push("tests");
    path.push("fixtures");
    path.push(name);
    fs::read_to_string(path).expect("fixture file should be readable")
}

fn ctx() -> RowContext<'static> {
    RowContext {
        timestamp: DATE,
        sport: "Baseball",
        sportsbook: "DraftKings",
    }
}

#[test]
fn flattens_single_game_fixture() {
    let raw = read_fixture("event_group.json");
    let group = parse_event_group_json(&raw).expect("fixture should parse");
    let rows = flatten_offers(&group).expect("fixture should flatten");
    assert_eq!(rows.len(), 4);
    assert_eq!(rows[0].bet_type.as_deref(), Some("Moneyline"));
    assert_eq!(rows[0].line.as_deref(), Some("Win"));
    assert_eq!(rows[2].bet_type.as_deref(), Some("Total"));
    assert_eq!(rows[2].line.as_deref(), Some("+7.5"));
    assert!(rows.iter().all(|r| r.event_id.as_deref() == Some("180123456")));
}

#[test]
fn single_game_yields_four_named_bets() {
    let raw = read_fixture("event_group.json");
    let group = parse_event_group_json(&raw).expect("fixture should parse");
    let offers = flatten_offers(&group).expect("fixture should flatten");
    let joined = join_events(offers, &event_records(&group), &ctx());

    assert_eq!(joined.rows.len(), 4);
    assert_eq!(joined.dropped, 0);
    let names: Vec<&str> = joined.rows.iter().map(|r| r.bet_name.as_str()).collect();
    assert_eq!(
        names,
        vec!["NY Yankees Win", "BOS Red Sox Win", "Over +7.5", "Under +7.5"]
    );

    let first = &joined.rows[0];
    assert_eq!(first.sportsbook, "DraftKings");
    assert_eq!(first.sport, "Baseball");
    assert_eq!(first.event_group_name, "MLB");
    assert_eq!(first.event_group_id, "84240");
    assert_eq!(first.display_group_id, "2");
    assert_eq!(first.team_short_name1, "NYY");
    assert_eq!(first.odds_american, "-145");
    assert_eq!(first.timestamp, DATE);
    assert_eq!(first.is_suspended, "False");
    assert_eq!(first.is_open, "True");
}

#[test]
fn orphan_offer_is_dropped_and_slate_sorted_by_game() {
    let raw = read_fixture("slate_with_orphan.json");
    let group = parse_event_group_json(&raw).expect("fixture should parse");
    let offers = flatten_offers(&group).expect("fixture should flatten");
    assert_eq!(offers.len(), 10);

    let joined = join_events(offers, &event_records(&group), &ctx());
    assert_eq!(joined.rows.len(), 8);
    assert_eq!(joined.dropped, 2);
    assert!(joined.rows.iter().all(|r| r.event_id != "170000000"));
    assert!(joined.rows.iter().all(|r| {
        !r.event_id.is_empty()
            && !r.provider_offer_id.is_empty()
            && !r.bet_type.is_empty()
            && !r.bet_name.is_empty()
    }));

    let games: Vec<&str> = joined
        .rows
        .iter()
        .map(|r| r.name_identifier.as_str())
        .collect();
    let mut sorted = games.clone();
    sorted.sort();
    assert_eq!(games, sorted);

    let braves: Vec<&str> = joined
        .rows
        .iter()
        .filter(|r| r.event_id == "180999001")
        .map(|r| r.bet_name.as_str())
        .collect();
    assert_eq!(
        braves,
        vec!["ATL Braves Win", "MIA Marlins Win", "Team A -1.5", "Team B +1.5"]
    );
}
