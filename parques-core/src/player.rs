//! Players, seats, and per-player match statistics

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::pawn::Seat;

/// Opaque player identity handed in by the lobby
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(String);

impl PlayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

/// Seat color
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Color {
    Red,
    Blue,
    Green,
    Yellow,
    Orange,
    Purple,
}

impl Color {
    pub const ALL: [Color; 6] = [
        Color::Red,
        Color::Blue,
        Color::Green,
        Color::Yellow,
        Color::Orange,
        Color::Purple,
    ];

    /// Default color for a seat
    pub fn for_seat(seat: Seat) -> Color {
        Self::ALL[seat % Self::ALL.len()]
    }
}

/// One entry of the finalized roster, in join order
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub handle: String,
    #[serde(default)]
    pub color: Option<Color>,
}

impl RosterEntry {
    pub fn new(id: impl Into<PlayerId>, handle: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            handle: handle.into(),
            color: None,
        }
    }
}

/// Counters kept for the results collaborator
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    pub pawns_finished: u32,
    pub captures: u32,
    pub captured_by: u32,
    pub doubles_rolled: u32,
    pub total_moves: u32,
}

/// A seated player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Player {
    pub id: PlayerId,
    pub handle: String,
    pub color: Color,
    pub seat: Seat,
    pub score: u32,
    pub stats: PlayerStats,
}

impl Player {
    pub fn from_roster(entry: RosterEntry, seat: Seat) -> Self {
        Self {
            id: entry.id,
            handle: entry.handle,
            color: entry.color.unwrap_or_else(|| Color::for_seat(seat)),
            seat,
            score: 0,
            stats: PlayerStats::default(),
        }
    }
}
