//! Legal move generation
//!
//! Targets are computed per pawn and per die source. A candidate that cannot
//! be played in full is dropped; there are no partial moves.

use serde::{Deserialize, Serialize};

use crate::board::BoardGeometry;
use crate::config::RuleConfig;
use crate::dice::{DieSource, TurnState};
use crate::pawn::{Location, Pawn, PawnArena, PawnId, Seat};

/// One selectable move for the acting player
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LegalMove {
    pub pawn_id: PawnId,
    pub target: Location,
    pub source: DieSource,
    pub steps: u8,
    pub can_capture: bool,
}

/// Every legal move for a roll, plus the forced-capture flag
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MoveSet {
    pub moves: Vec<LegalMove>,
    pub must_capture: bool,
}

/// Where `pawn` (owned by `seat`) ends up after walking `steps`, if it can
pub fn target_for(
    geometry: &BoardGeometry,
    rules: &RuleConfig,
    pawns: &PawnArena,
    seat: Seat,
    pawn: &Pawn,
    steps: u8,
) -> Option<Location> {
    match pawn.location {
        Location::InPrison | Location::Finished => None,
        Location::InHomeStretch { step } => stretch_target(geometry, rules, step, steps),
        Location::OnTrack { cell } => {
            let home_entry = geometry.home_entry_cell_of(seat);
            let new_cell = geometry.advance(cell, steps);

            if geometry.crosses(cell, new_cell, home_entry) {
                let to_entry = geometry.steps_between(cell, home_entry);
                if steps > to_entry {
                    return stretch_location(geometry, steps - to_entry - 1);
                }
            }

            if pawns.has_ally_on_cell(seat, new_cell, pawn.id) {
                return None;
            }
            Some(Location::OnTrack { cell: new_cell })
        }
    }
}

/// Home stretch index `step` as a location; the last index is the goal
fn stretch_location(geometry: &BoardGeometry, step: u8) -> Option<Location> {
    let last = geometry.final_step();
    if step == last {
        Some(Location::Finished)
    } else if step < last {
        Some(Location::InHomeStretch { step })
    } else {
        None
    }
}

/// Advance inside the home stretch, recoiling off the goal on overshoot
fn stretch_target(geometry: &BoardGeometry, rules: &RuleConfig, step: u8, steps: u8) -> Option<Location> {
    let last = geometry.final_step();
    let reached = step + steps;
    if reached <= last {
        return stretch_location(geometry, reached);
    }
    if !rules.enable_bounce {
        return None;
    }
    let overshoot = reached - last;
    if overshoot > last {
        return None;
    }
    Some(Location::InHomeStretch { step: last - overshoot })
}

/// Landing on `target` would send an enemy of `seat` to prison
pub fn would_capture(geometry: &BoardGeometry, pawns: &PawnArena, seat: Seat, target: Location) -> bool {
    match target.track_cell() {
        Some(cell) => geometry.capture_allowed(seat, cell) && pawns.has_enemy_on_cell(seat, cell),
        None => false,
    }
}

/// All legal moves for the unspent dice of `turn`
pub fn legal_moves(
    geometry: &BoardGeometry,
    rules: &RuleConfig,
    pawns: &PawnArena,
    seat: Seat,
    turn: &TurnState,
) -> MoveSet {
    let mut moves = Vec::new();
    if !turn.rolled {
        return MoveSet::default();
    }

    let dice = turn.dice;
    let is_double = dice.is_double();

    for pawn in pawns.of_seat(seat) {
        if !pawn.location.is_in_play() {
            continue;
        }

        let push = |source: DieSource, moves: &mut Vec<LegalMove>| {
            let steps = dice.steps(source);
            if let Some(target) = target_for(geometry, rules, pawns, seat, pawn, steps) {
                moves.push(LegalMove {
                    pawn_id: pawn.id,
                    target,
                    source,
                    steps,
                    can_capture: would_capture(geometry, pawns, seat, target),
                });
            }
        };

        if turn.die1_available() {
            push(DieSource::Die1, &mut moves);
        }

        if turn.die2_available() && (dice.d2 != dice.d1 || is_double) {
            // the second die of a double repeats the first die's target
            let duplicate = moves.iter().any(|m| {
                m.pawn_id == pawn.id && m.source == DieSource::Die1 && m.steps == dice.d2
            });
            if !duplicate {
                push(DieSource::Die2, &mut moves);
            }
        }

        if turn.die1_available() && turn.die2_available() && !is_double {
            push(DieSource::Sum, &mut moves);
        }
    }

    let must_capture = moves.iter().any(|m| m.can_capture);
    MoveSet { moves, must_capture }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::BoardVariant;
    use crate::dice::Dice;

    fn four() -> &'static BoardGeometry {
        BoardVariant::FourPlayers.geometry()
    }

    fn place(arena: &mut PawnArena, seat: Seat, id: PawnId, location: Location) {
        arena.get_mut(seat, id).unwrap().location = location;
    }

    fn rolled(d1: u8, d2: u8) -> TurnState {
        let mut turn = TurnState::new();
        turn.record_roll(Dice::new(d1, d2));
        turn
    }

    #[test]
    fn test_track_move() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        let pawn = *arena.get(0, 0).unwrap();
        let target = target_for(four(), &RuleConfig::default(), &arena, 0, &pawn, 5);
        assert_eq!(target, Some(Location::OnTrack { cell: 15 }));
    }

    #[test]
    fn test_track_into_home_stretch() {
        let mut arena = PawnArena::new(2, 4);
        // seat 0 peels off after cell 67
        place(&mut arena, 0, 0, Location::OnTrack { cell: 65 });
        let pawn = *arena.get(0, 0).unwrap();
        let rules = RuleConfig::default();
        assert_eq!(
            target_for(four(), &rules, &arena, 0, &pawn, 2),
            Some(Location::OnTrack { cell: 67 })
        );
        assert_eq!(
            target_for(four(), &rules, &arena, 0, &pawn, 3),
            Some(Location::InHomeStretch { step: 0 })
        );
        assert_eq!(
            target_for(four(), &rules, &arena, 0, &pawn, 9),
            Some(Location::InHomeStretch { step: 6 })
        );
        assert_eq!(target_for(four(), &rules, &arena, 0, &pawn, 10), Some(Location::Finished));
        assert_eq!(target_for(four(), &rules, &arena, 0, &pawn, 11), None);
    }

    #[test]
    fn test_other_seat_passes_foreign_home_entry() {
        let mut arena = PawnArena::new(2, 4);
        // seat 1 enters at 17 and peels off after 16; 67 is just another cell
        place(&mut arena, 1, 0, Location::OnTrack { cell: 65 });
        let pawn = *arena.get(1, 0).unwrap();
        assert_eq!(
            target_for(four(), &RuleConfig::default(), &arena, 1, &pawn, 6),
            Some(Location::OnTrack { cell: 3 })
        );
    }

    #[test]
    fn test_bounce_in_home_stretch() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::InHomeStretch { step: 6 });
        let pawn = *arena.get(0, 0).unwrap();
        let rules = RuleConfig::default();
        assert_eq!(target_for(four(), &rules, &arena, 0, &pawn, 1), Some(Location::Finished));
        assert_eq!(
            target_for(four(), &rules, &arena, 0, &pawn, 2),
            Some(Location::InHomeStretch { step: 6 })
        );
        assert_eq!(
            target_for(four(), &rules, &arena, 0, &pawn, 4),
            Some(Location::InHomeStretch { step: 4 })
        );

        let no_bounce = RuleConfig {
            enable_bounce: false,
            ..RuleConfig::default()
        };
        assert_eq!(target_for(four(), &no_bounce, &arena, 0, &pawn, 4), None);
    }

    #[test]
    fn test_bounce_past_stretch_entry_is_invalid() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::InHomeStretch { step: 5 });
        let pawn = *arena.get(0, 0).unwrap();
        // 5 + 12 = 17, overshoot 10 > 7
        assert_eq!(target_for(four(), &RuleConfig::default(), &arena, 0, &pawn, 12), None);
    }

    #[test]
    fn test_no_stacking_on_own_pawn() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        place(&mut arena, 0, 1, Location::OnTrack { cell: 13 });
        let pawn = *arena.get(0, 0).unwrap();
        assert_eq!(target_for(four(), &RuleConfig::default(), &arena, 0, &pawn, 3), None);
    }

    #[test]
    fn test_move_set_sources() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        let set = legal_moves(four(), &RuleConfig::default(), &arena, 0, &rolled(2, 5));
        let sources: Vec<_> = set.moves.iter().map(|m| (m.source, m.steps)).collect();
        assert_eq!(
            sources,
            vec![(DieSource::Die1, 2), (DieSource::Die2, 5), (DieSource::Sum, 7)]
        );
        assert!(!set.must_capture);
    }

    #[test]
    fn test_double_yields_one_entry_per_pawn() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        let set = legal_moves(four(), &RuleConfig::default(), &arena, 0, &rolled(4, 4));
        assert_eq!(set.moves.len(), 1);
        assert_eq!(set.moves[0].source, DieSource::Die1);
    }

    #[test]
    fn test_remaining_die_only() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        let mut turn = rolled(2, 5);
        turn.consume(DieSource::Die1);
        let set = legal_moves(four(), &RuleConfig::default(), &arena, 0, &turn);
        assert_eq!(set.moves.len(), 1);
        assert_eq!(set.moves[0].source, DieSource::Die2);
    }

    #[test]
    fn test_capture_flags() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 0, 0, Location::OnTrack { cell: 10 });
        place(&mut arena, 1, 0, Location::OnTrack { cell: 12 });
        // 17 is safe and not seat 0's entry
        place(&mut arena, 1, 1, Location::OnTrack { cell: 17 });
        let set = legal_moves(four(), &RuleConfig::default(), &arena, 0, &rolled(2, 5));
        assert!(set.must_capture);
        let capturing: Vec<_> = set.moves.iter().filter(|m| m.can_capture).map(|m| m.steps).collect();
        assert_eq!(capturing, vec![2]);
    }

    #[test]
    fn test_safe_cell_never_captures_except_own_entry() {
        let mut arena = PawnArena::new(2, 4);
        place(&mut arena, 1, 0, Location::OnTrack { cell: 17 });
        assert!(!would_capture(four(), &arena, 0, Location::OnTrack { cell: 17 }));
        place(&mut arena, 0, 0, Location::OnTrack { cell: 17 });
        assert!(would_capture(four(), &arena, 1, Location::OnTrack { cell: 17 }));
        assert!(!would_capture(four(), &arena, 0, Location::InHomeStretch { step: 1 }));
    }
}
