//! Integration tests for the Parqués stack
//!
//! Drives whole matches through the session directory the way a transport
//! would: read the snapshot, pick an action, submit `(kind, payload)`.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use parques_core::{
    ActionKind, BoardVariant, ChaChaDice, MatchConfig, MatchEndNotice, MatchSnapshot,
    MatchStatus, NullObserver, PlayerId, ResultsSink, RosterEntry,
};
use parques_server::SessionDirectory;
use serde_json::{json, Value};

// ============================================================================
// TEST FIXTURES
// ============================================================================

#[derive(Default)]
struct CollectingSink {
    results: Mutex<Vec<(String, MatchEndNotice)>>,
}

impl ResultsSink for CollectingSink {
    fn record(&self, code: &str, notice: &MatchEndNotice) {
        self.results
            .lock()
            .unwrap()
            .push((code.to_string(), notice.clone()));
    }
}

fn seeded_directory(config: MatchConfig, sink: Arc<CollectingSink>) -> SessionDirectory {
    let next_seed = Arc::new(AtomicU64::new(1000));
    SessionDirectory::new(config, Arc::new(NullObserver), sink).with_dice(Box::new(move || {
        Box::new(ChaChaDice::from_seed(next_seed.fetch_add(1, Ordering::Relaxed)))
    }))
}

fn roster(prefix: &str, players: usize) -> Vec<RosterEntry> {
    (0..players)
        .map(|i| RosterEntry::new(format!("{}{}", prefix, i), format!("Player {}", i)))
        .collect()
}

/// Pick the next request from the public snapshot only
fn choose_request(snapshot: &MatchSnapshot) -> (&'static str, Value) {
    let actions = &snapshot.legal_actions;
    if actions.contains(&ActionKind::MovePawn) {
        let mv = snapshot
            .legal_moves
            .iter()
            .find(|m| m.can_capture)
            .or_else(|| snapshot.legal_moves.first());
        if let Some(mv) = mv {
            return ("move_pawn", serde_json::to_value(mv).unwrap());
        }
    }
    if actions.contains(&ActionKind::ExitPrison) {
        return ("exit_prison", Value::Null);
    }
    if actions.contains(&ActionKind::RollDice) {
        return ("roll_dice", Value::Null);
    }
    ("pass", Value::Null)
}

/// Play until the match ends; returns the final snapshot and accepted count
fn play_to_end(dir: &SessionDirectory, code: &str, mut snapshot: MatchSnapshot) -> (MatchSnapshot, u64) {
    let mut accepted = 0;
    for _ in 0..200_000 {
        if snapshot.status != MatchStatus::Playing {
            break;
        }
        let player = snapshot.current_player_id.clone().unwrap();
        let (kind, payload) = choose_request(&snapshot);
        let outcome = dir.submit(code, &player, kind, &payload).unwrap();
        assert!(outcome.accepted, "{} rejected: {:?}", kind, outcome.reason);
        accepted += 1;
        assert_eq!(outcome.action_seq, accepted);
        snapshot = outcome.state.unwrap();
    }
    (snapshot, accepted)
}

// ============================================================================
// FULL MATCHES
// ============================================================================

#[test]
fn test_four_player_match_through_directory() {
    let sink = Arc::new(CollectingSink::default());
    let dir = seeded_directory(MatchConfig::default(), sink.clone());
    let (session, snapshot) = dir.create(roster("p", 4), None).unwrap();
    let code = session.code().to_string();

    let (last, accepted) = play_to_end(&dir, &code, snapshot);

    assert_eq!(last.status, MatchStatus::Finished);
    let winner = last.winner_id.clone().unwrap();
    let winner_view = last.players.iter().find(|p| p.id == winner).unwrap();
    assert_eq!(winner_view.pawns_finished, 4);
    assert_eq!(session.action_seq(), accepted);

    let results = sink.results.lock().unwrap();
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].0, code);
    assert_eq!(results[0].1.rankings[0].player_id, winner);
    assert_eq!(results[0].1.rankings[0].score, 400);
}

#[test]
fn test_finished_match_rejects_further_actions() {
    let sink = Arc::new(CollectingSink::default());
    let dir = seeded_directory(MatchConfig::default(), sink);
    let (session, snapshot) = dir.create(roster("q", 2), None).unwrap();
    let code = session.code().to_string();
    let (last, accepted) = play_to_end(&dir, &code, snapshot);
    assert_eq!(last.status, MatchStatus::Finished);

    let player = PlayerId::new("q0");
    let outcome = dir.submit(&code, &player, "roll_dice", &Value::Null);
    assert!(!matches!(outcome, Ok(ref o) if o.accepted));
    assert_eq!(session.action_seq(), accepted);

    // a finished match frees its players for a new one
    assert!(dir.create(roster("q", 2), None).is_ok());
}

#[test]
fn test_six_player_board_with_small_armies() {
    let config = MatchConfig {
        variant: BoardVariant::SixPlayers,
        pawns_per_player: 2,
        ..MatchConfig::default()
    };
    let sink = Arc::new(CollectingSink::default());
    let dir = seeded_directory(config, sink.clone());
    let (session, snapshot) = dir.create(roster("s", 6), None).unwrap();
    assert_eq!(snapshot.players.len(), 6);
    assert!(snapshot.players.iter().all(|p| p.pawns_in_prison == 2));

    let (last, _) = play_to_end(&dir, session.code(), snapshot);
    assert_eq!(last.status, MatchStatus::Finished);
    assert_eq!(sink.results.lock().unwrap()[0].1.rankings.len(), 6);
}

// ============================================================================
// CONFIG FILES
// ============================================================================

#[test]
fn test_match_config_file_round_trip() {
    let path = std::env::temp_dir().join(format!("parques-config-{}.json", std::process::id()));
    std::fs::write(
        &path,
        json!({
            "variant": "six_players",
            "pawns_per_player": 3,
            "turn_timeout_ms": 0,
            "rules": {"capture_policy": "blow"}
        })
        .to_string(),
    )
    .unwrap();

    let config = MatchConfig::load(&path).unwrap();
    std::fs::remove_file(&path).ok();

    assert_eq!(config.variant, BoardVariant::SixPlayers);
    assert_eq!(config.pawns_per_player, 3);
    assert_eq!(config.turn_timeout_ms, 0);
    assert!(config.rules.enable_bounce);
}

#[test]
fn test_invalid_match_config_file() {
    let path = std::env::temp_dir().join(format!("parques-bad-{}.json", std::process::id()));
    std::fs::write(&path, r#"{"pawns_per_player": 0}"#).unwrap();

    let result = MatchConfig::load(&path);
    std::fs::remove_file(&path).ok();
    assert!(result.is_err());
}
