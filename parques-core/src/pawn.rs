//! Pawns and the per-match pawn arena

use serde::{Deserialize, Serialize};

use crate::board::Cell;

/// Pawn index, unique within its owner
pub type PawnId = u8;

/// Seat index in join order
pub type Seat = usize;

/// Where a pawn currently is
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Location {
    InPrison,
    OnTrack { cell: Cell },
    InHomeStretch { step: u8 },
    Finished,
}

impl Location {
    pub fn is_in_prison(self) -> bool {
        matches!(self, Location::InPrison)
    }

    pub fn is_finished(self) -> bool {
        matches!(self, Location::Finished)
    }

    /// On the track or in the home stretch
    pub fn is_in_play(self) -> bool {
        matches!(self, Location::OnTrack { .. } | Location::InHomeStretch { .. })
    }

    pub fn track_cell(self) -> Option<Cell> {
        match self {
            Location::OnTrack { cell } => Some(cell),
            _ => None,
        }
    }
}

/// A single pawn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pawn {
    pub id: PawnId,
    pub seat: Seat,
    pub location: Location,
}

/// Every pawn of one match, stored seat-major.
///
/// Seat `s` owns the slice `s * per_seat .. (s + 1) * per_seat`, and the pawn
/// with id `i` sits at offset `i` in that slice.
#[derive(Clone, Debug)]
pub struct PawnArena {
    pawns: Vec<Pawn>,
    per_seat: usize,
}

impl PawnArena {
    /// All pawns start in prison
    pub fn new(seats: usize, per_seat: usize) -> Self {
        let pawns = (0..seats)
            .flat_map(|seat| {
                (0..per_seat).map(move |id| Pawn {
                    id: id as PawnId,
                    seat,
                    location: Location::InPrison,
                })
            })
            .collect();
        Self { pawns, per_seat }
    }

    pub fn per_seat(&self) -> usize {
        self.per_seat
    }

    pub fn seats(&self) -> usize {
        if self.per_seat == 0 {
            0
        } else {
            self.pawns.len() / self.per_seat
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pawn> {
        self.pawns.iter()
    }

    pub fn of_seat(&self, seat: Seat) -> &[Pawn] {
        let start = seat * self.per_seat;
        &self.pawns[start..start + self.per_seat]
    }

    fn of_seat_mut(&mut self, seat: Seat) -> &mut [Pawn] {
        let start = seat * self.per_seat;
        &mut self.pawns[start..start + self.per_seat]
    }

    pub fn get(&self, seat: Seat, id: PawnId) -> Option<&Pawn> {
        self.of_seat(seat).get(id as usize)
    }

    pub(crate) fn get_mut(&mut self, seat: Seat, id: PawnId) -> Option<&mut Pawn> {
        self.of_seat_mut(seat).get_mut(id as usize)
    }

    pub fn count_in_prison(&self, seat: Seat) -> usize {
        self.of_seat(seat)
            .iter()
            .filter(|p| p.location.is_in_prison())
            .count()
    }

    pub fn count_in_play(&self, seat: Seat) -> usize {
        self.of_seat(seat)
            .iter()
            .filter(|p| p.location.is_in_play())
            .count()
    }

    pub fn count_finished(&self, seat: Seat) -> usize {
        self.of_seat(seat)
            .iter()
            .filter(|p| p.location.is_finished())
            .count()
    }

    pub fn all_finished(&self, seat: Seat) -> bool {
        self.of_seat(seat).iter().all(|p| p.location.is_finished())
    }

    /// Another pawn of `seat` already sits on `cell`
    pub fn has_ally_on_cell(&self, seat: Seat, cell: Cell, except: PawnId) -> bool {
        self.of_seat(seat)
            .iter()
            .any(|p| p.id != except && p.location.track_cell() == Some(cell))
    }

    /// Some pawn of another seat sits on `cell`
    pub fn has_enemy_on_cell(&self, seat: Seat, cell: Cell) -> bool {
        self.pawns
            .iter()
            .any(|p| p.seat != seat && p.location.track_cell() == Some(cell))
    }

    /// Send every enemy of `seat` on `cell` back to prison
    pub(crate) fn imprison_enemies_at(&mut self, seat: Seat, cell: Cell) -> Vec<(Seat, PawnId)> {
        let mut captured = Vec::new();
        for pawn in self.pawns.iter_mut() {
            if pawn.seat != seat && pawn.location.track_cell() == Some(cell) {
                pawn.location = Location::InPrison;
                captured.push((pawn.seat, pawn.id));
            }
        }
        captured
    }

    /// Move up to `count` imprisoned pawns of `seat` onto `cell`, lowest ids first
    pub(crate) fn release_from_prison(&mut self, seat: Seat, count: usize, cell: Cell) -> usize {
        let mut released = 0;
        for pawn in self.of_seat_mut(seat).iter_mut() {
            if released == count {
                break;
            }
            if pawn.location.is_in_prison() {
                pawn.location = Location::OnTrack { cell };
                released += 1;
            }
        }
        released
    }
}
