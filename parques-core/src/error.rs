//! Error types for the rule engine and match sessions

use serde::Serialize;

use crate::config::ConfigError;
use crate::player::PlayerId;

/// Why a well-formed action was refused.
///
/// Rejections are an expected outcome: the state is left untouched and the
/// submitting caller gets the reason code back.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    #[error("match is not being played")]
    MatchNotPlaying,

    #[error("not your turn")]
    NotYourTurn,

    #[error("action not allowed in the current phase")]
    WrongPhase,

    #[error("no legal move matches")]
    NoMatchingMove,

    #[error("a capture is available and must be taken")]
    MustCapture,

    #[error("last roll was not a double")]
    NotADouble,

    #[error("no pawns in prison")]
    NoPawnsInPrison,

    #[error("malformed payload")]
    MalformedPayload,
}

impl RejectReason {
    /// Stable code surfaced to clients
    pub fn code(self) -> &'static str {
        match self {
            RejectReason::MatchNotPlaying => "match_not_playing",
            RejectReason::NotYourTurn => "not_your_turn",
            RejectReason::WrongPhase => "wrong_phase",
            RejectReason::NoMatchingMove => "no_matching_move",
            RejectReason::MustCapture => "must_capture",
            RejectReason::NotADouble => "not_a_double",
            RejectReason::NoPawnsInPrison => "no_pawns_in_prison",
            RejectReason::MalformedPayload => "malformed_payload",
        }
    }
}

/// Failure of a single action against a match
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum ActionError {
    #[error("rejected: {0}")]
    Rejected(RejectReason),

    #[error("player {0} is not seated in this match")]
    UnknownPlayer(PlayerId),

    #[error("unknown action kind: {0}")]
    UnknownAction(String),

    #[error("invariant violated: {0}")]
    Invariant(String),
}

impl From<RejectReason> for ActionError {
    fn from(reason: RejectReason) -> Self {
        ActionError::Rejected(reason)
    }
}

/// Failure at the match session boundary
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    #[error("match is busy with another action")]
    Busy,

    #[error("match has not started")]
    NotStarted,

    #[error("match already started")]
    AlreadyStarted,

    #[error("{count} players is outside the allowed range {min}..={max}")]
    PlayerCount { count: usize, min: usize, max: usize },

    #[error("player {0} appears twice in the roster")]
    DuplicatePlayer(PlayerId),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("match is unusable after an internal fault: {0}")]
    Unusable(String),

    #[error(transparent)]
    Action(#[from] ActionError),
}
