//! Outbound views of a match: full snapshots and lifecycle notices

use serde::{Deserialize, Serialize};

use crate::action::ActionKind;
use crate::board::BoardVariant;
use crate::dice::{Dice, TurnPhase};
use crate::moves::LegalMove;
use crate::pawn::{Pawn, Seat};
use crate::player::{Color, PlayerId, PlayerStats};

/// Lifecycle status of a match
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchStatus {
    Waiting,
    Playing,
    Finished,
    Cancelled,
}

/// Why a match ended
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndReason {
    /// A player finished every pawn
    Completed,
    /// Stopped by the host
    Cancelled,
    /// Abandoned after the players stopped acting
    Timeout,
    /// A player left; nobody is credited with the win
    Forfeit,
}

/// One player as seen by every participant
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerView {
    pub id: PlayerId,
    pub handle: String,
    pub color: Color,
    pub seat: Seat,
    pub score: u32,
    pub pawns: Vec<Pawn>,
    pub pawns_in_prison: usize,
    pub pawns_finished: usize,
    pub prison_attempts: u8,
}

/// Full authoritative state, produced after every accepted action
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchSnapshot {
    pub id: String,
    pub code: String,
    pub status: MatchStatus,
    pub variant: BoardVariant,
    pub turn_number: u32,
    pub current_player_id: Option<PlayerId>,
    pub players: Vec<PlayerView>,
    pub phase: TurnPhase,
    pub dice: Dice,
    pub rolled: bool,
    pub consumed_dice: [bool; 2],
    pub remaining_dice: Vec<u8>,
    pub consecutive_doubles: u8,
    pub legal_moves: Vec<LegalMove>,
    pub must_capture: bool,
    pub legal_actions: Vec<ActionKind>,
    pub winner_id: Option<PlayerId>,
}

/// Emitted whenever a player becomes the acting player, bonus rolls included
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnStartNotice {
    pub player_id: PlayerId,
    pub timeout_ms: u64,
    pub legal_actions: Vec<ActionKind>,
}

/// Final standing of one player
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ranking {
    pub player_id: PlayerId,
    pub rank: usize,
    pub score: u32,
    pub stats: PlayerStats,
}

/// Emitted once when a match ends
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEndNotice {
    pub winner_id: Option<PlayerId>,
    pub reason: EndReason,
    pub turns: u32,
    pub rankings: Vec<Ranking>,
}
