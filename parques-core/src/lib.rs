//! Parqués Core - Rule engine and match sessions
//!
//! This crate provides the authoritative game logic for Parqués:
//! - Board geometry for the 4 and 6 player boards
//! - Pawns, dice, and the per-turn phase record
//! - Legal move generation with capture detection
//! - The match state machine and its invariant checks
//! - Match sessions that serialize every action behind one gate
//! - A random bot for simulations

pub mod action;
pub mod board;
pub mod bot;
pub mod config;
pub mod dice;
pub mod error;
pub mod game;
pub mod moves;
pub mod pawn;
pub mod player;
pub mod session;
pub mod snapshot;

// Re-exports for convenient access
pub use action::{Action, ActionKind};
pub use board::{BoardGeometry, BoardVariant, Cell};
pub use bot::{play_out, RandomBot};
pub use config::{CapturePolicy, ConfigError, MatchConfig, RuleConfig, MAX_PAWNS_PER_PLAYER};
pub use dice::{ChaChaDice, Dice, DiceRoller, DieSource, ScriptedDice, TurnPhase, TurnState};
pub use error::{ActionError, RejectReason, SessionError};
pub use game::{ActionOutcome, Match};
pub use moves::{legal_moves, LegalMove, MoveSet};
pub use pawn::{Location, Pawn, PawnArena, PawnId, Seat};
pub use player::{Color, Player, PlayerId, PlayerStats, RosterEntry};
pub use session::{MatchObserver, MatchSession, NullObserver, ResultsSink, SubmitOutcome};
pub use snapshot::{
    EndReason, MatchEndNotice, MatchSnapshot, MatchStatus, PlayerView, Ranking, TurnStartNotice,
};
