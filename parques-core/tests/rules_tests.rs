//! Scenario tests for the Parqués rule engine

use parques_core::{
    play_out, Action, ActionError, ChaChaDice, DieSource, Location, Match, MatchConfig,
    MatchStatus, PlayerId, RandomBot, RejectReason, RosterEntry, ScriptedDice, TurnPhase,
};

fn roster(n: usize) -> Vec<RosterEntry> {
    (0..n)
        .map(|i| RosterEntry::new(format!("p{}", i), format!("Player {}", i)))
        .collect()
}

fn start(n: usize, config: MatchConfig) -> Match {
    let mut game = Match::new("test", "TEST01", config, roster(n)).unwrap();
    game.start();
    game
}

fn p(i: usize) -> PlayerId {
    PlayerId::new(format!("p{}", i))
}

#[test]
fn scenario_a_failed_prison_roll() {
    let mut game = start(4, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(3, 5)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();

    assert_eq!(game.turn().phase, TurnPhase::AwaitingRoll);
    assert_eq!(game.prison_attempts(0), 1);
    assert!(!game.turn().rolled);
    assert_eq!(game.current_seat(), 0);
    assert!(game.snapshot().remaining_dice.is_empty());
}

#[test]
fn scenario_b_double_six_empties_prison() {
    let mut game = start(4, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(6, 6)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    assert_eq!(game.turn().phase, TurnPhase::AwaitingPrisonExit);

    let outcome = game.apply(&p(0), &Action::ExitPrison, &mut dice).unwrap();
    assert_eq!(outcome.released, 4);
    assert_eq!(game.pawns().count_in_prison(0), 0);
    assert!(game
        .pawns()
        .of_seat(0)
        .iter()
        .all(|pawn| pawn.location == Location::OnTrack { cell: 0 }));
}

#[test]
fn scenario_e_other_doubles_release_two() {
    let config = MatchConfig {
        pawns_per_player: 3,
        ..MatchConfig::default()
    };
    let mut game = start(4, config);
    let mut dice = ScriptedDice::from_pairs(&[(4, 4)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    let outcome = game.apply(&p(0), &Action::ExitPrison, &mut dice).unwrap();
    assert_eq!(outcome.released, 2);
    assert_eq!(game.pawns().count_in_prison(0), 1);
}

#[test]
fn exit_prison_requires_a_double() {
    let mut game = start(2, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(2, 3)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    assert_eq!(
        game.apply(&p(0), &Action::ExitPrison, &mut dice),
        Err(ActionError::Rejected(RejectReason::WrongPhase))
    );
}

#[test]
fn triple_doubles_promote_and_reset() {
    let mut game = start(2, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(6, 6), (2, 2), (4, 4)]);

    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    game.apply(&p(0), &Action::ExitPrison, &mut dice).unwrap();
    assert_eq!(game.turn().consecutive_doubles, 1);

    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    let step = Action::MovePawn {
        pawn_id: 0,
        target: Location::OnTrack { cell: 2 },
        source: None,
    };
    game.apply(&p(0), &step, &mut dice).unwrap();
    assert_eq!(game.turn().consecutive_doubles, 2);

    let outcome = game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    assert_eq!(outcome.promoted, Some(0));
    assert_eq!(game.pawns().count_finished(0), 1);
    assert_eq!(game.turn().consecutive_doubles, 0);
    assert_eq!(game.current_seat(), 1);
}

#[test]
fn sum_move_spends_both_dice() {
    let mut game = start(2, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(1, 1), (2, 5)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    game.apply(&p(0), &Action::ExitPrison, &mut dice).unwrap();
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();

    let sum = Action::MovePawn {
        pawn_id: 0,
        target: Location::OnTrack { cell: 7 },
        source: Some(DieSource::Sum),
    };
    let outcome = game.apply(&p(0), &sum, &mut dice).unwrap();
    assert!(outcome.turn_started);
    assert_eq!(game.current_seat(), 1);
    assert_eq!(
        game.pawns().get(0, 0).unwrap().location,
        Location::OnTrack { cell: 7 }
    );
}

#[test]
fn applied_move_cannot_be_replayed() {
    let mut game = start(2, MatchConfig::default());
    let mut dice = ScriptedDice::from_pairs(&[(1, 1), (2, 5)]);
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();
    game.apply(&p(0), &Action::ExitPrison, &mut dice).unwrap();
    game.apply(&p(0), &Action::RollDice, &mut dice).unwrap();

    let first = Action::MovePawn {
        pawn_id: 0,
        target: Location::OnTrack { cell: 2 },
        source: Some(DieSource::Die1),
    };
    game.apply(&p(0), &first, &mut dice).unwrap();
    assert_eq!(
        game.apply(&p(0), &first, &mut dice),
        Err(ActionError::Rejected(RejectReason::NoMatchingMove))
    );
}

#[test]
fn random_matches_keep_invariants() {
    for seed in 0..8u64 {
        let players = 2 + (seed as usize % 3);
        let mut game = start(players, MatchConfig::default());
        let mut dice = ChaChaDice::from_seed(seed);
        let mut bot = RandomBot::with_seed(seed);
        let mut finished = vec![0usize; players];

        for _ in 0..200_000 {
            if play_out(&mut game, &mut dice, &mut bot, 1).unwrap() == 0 {
                break;
            }
            game.check_invariants().unwrap();

            let snapshot = game.snapshot();
            assert!(snapshot.consumed_dice.iter().all(|&c| !c) || snapshot.rolled);
            assert_eq!(snapshot.must_capture, snapshot.legal_moves.iter().any(|m| m.can_capture));
            for seat in 0..players {
                let now = game.pawns().count_finished(seat);
                assert!(now >= finished[seat], "finished count went down");
                finished[seat] = now;
            }
        }

        assert_eq!(game.status(), MatchStatus::Finished, "seed {} did not finish", seed);
        let winner = game.winner().unwrap();
        assert_eq!(game.pawns().count_finished(winner.seat), 4);
        assert_eq!(winner.score, 400);
    }
}

#[test]
fn six_player_board_plays_out() {
    let mut game = start(6, MatchConfig::for_variant(parques_core::BoardVariant::SixPlayers));
    let mut dice = ChaChaDice::from_seed(11);
    let mut bot = RandomBot::with_seed(11);
    play_out(&mut game, &mut dice, &mut bot, 500_000).unwrap();
    assert_eq!(game.status(), MatchStatus::Finished);
    let end = game.end_notice().unwrap();
    assert_eq!(end.rankings.len(), 6);
    assert_eq!(end.rankings[0].rank, 1);
    assert_eq!(end.winner_id, Some(end.rankings[0].player_id.clone()));
}
