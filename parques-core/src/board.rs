//! Board geometry for the four- and six-seat boards
//!
//! The common track is a ring of cells numbered from 0. Every seat owns an
//! entry cell (where pawns leave prison) and a private home stretch that is
//! entered from the cell just before that entry.

use serde::{Deserialize, Serialize};

/// Cell index on the common track
pub type Cell = u8;

/// Cells on each arm of the board
pub const CELLS_PER_SIDE: u8 = 17;

/// Cells in every home stretch, the last one being the goal
pub const HOME_STRETCH_LEN: u8 = 8;

const SAFE_CELLS_4: [Cell; 8] = [0, 7, 17, 24, 34, 41, 51, 58];
const START_CELLS_4: [Cell; 4] = [0, 17, 34, 51];

const SAFE_CELLS_6: [Cell; 12] = [0, 7, 17, 24, 34, 41, 51, 58, 68, 75, 85, 92];
const START_CELLS_6: [Cell; 6] = [0, 17, 34, 51, 68, 85];

static FOUR_PLAYERS: BoardGeometry = BoardGeometry {
    total_cells: CELLS_PER_SIDE * 4,
    safe_cells: &SAFE_CELLS_4,
    start_cells: &START_CELLS_4,
    home_stretch_len: HOME_STRETCH_LEN,
};

static SIX_PLAYERS: BoardGeometry = BoardGeometry {
    total_cells: CELLS_PER_SIDE * 6,
    safe_cells: &SAFE_CELLS_6,
    start_cells: &START_CELLS_6,
    home_stretch_len: HOME_STRETCH_LEN,
};

/// Board size variant
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardVariant {
    #[default]
    FourPlayers,
    SixPlayers,
}

impl BoardVariant {
    /// Geometry table for this variant
    pub fn geometry(self) -> &'static BoardGeometry {
        match self {
            BoardVariant::FourPlayers => &FOUR_PLAYERS,
            BoardVariant::SixPlayers => &SIX_PLAYERS,
        }
    }

    /// Number of seats around the board
    pub fn seats(self) -> usize {
        self.geometry().start_cells.len()
    }

    /// Parse a variant from a path segment or CLI flag ("4", "six", "six_players")
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "4" | "four" | "four_players" => Some(BoardVariant::FourPlayers),
            "6" | "six" | "six_players" => Some(BoardVariant::SixPlayers),
            _ => None,
        }
    }
}

/// Immutable cell topology of one board variant
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct BoardGeometry {
    pub total_cells: u8,
    pub safe_cells: &'static [Cell],
    pub start_cells: &'static [Cell],
    pub home_stretch_len: u8,
}

impl BoardGeometry {
    /// Pawns on a safe cell cannot be captured, except on the mover's own entry
    pub fn is_safe_cell(&self, cell: Cell) -> bool {
        self.safe_cells.contains(&cell)
    }

    /// Cell where the pawns of `seat` enter the track.
    ///
    /// Panics if `seat` is not a seat of this board.
    pub fn entry_cell_of(&self, seat: usize) -> Cell {
        self.start_cells[seat]
    }

    /// Cell whose next step peels a pawn of `seat` onto its home stretch
    pub fn home_entry_cell_of(&self, seat: usize) -> Cell {
        let entry = self.entry_cell_of(seat);
        ((entry as u16 + self.total_cells as u16 - 1) % self.total_cells as u16) as Cell
    }

    /// Last home-stretch index; reaching it finishes the pawn
    pub fn final_step(&self) -> u8 {
        self.home_stretch_len - 1
    }

    /// Cell reached by walking `steps` forward from `cell`
    pub fn advance(&self, cell: Cell, steps: u8) -> Cell {
        ((cell as u16 + steps as u16) % self.total_cells as u16) as Cell
    }

    /// Forward distance from `from` to `to`
    pub fn steps_between(&self, from: Cell, to: Cell) -> u8 {
        if to >= from {
            to - from
        } else {
            self.total_cells - from + to
        }
    }

    /// Whether the forward walk `from..=to` passes over `target`
    pub fn crosses(&self, from: Cell, to: Cell, target: Cell) -> bool {
        if from == target {
            return true;
        }
        if from < to {
            target >= from && target <= to
        } else {
            target >= from || target <= to
        }
    }

    /// Whether a pawn of `seat` landing on `cell` sends enemies there to prison
    pub fn capture_allowed(&self, seat: usize, cell: Cell) -> bool {
        !self.is_safe_cell(cell) || cell == self.entry_cell_of(seat)
    }
}
