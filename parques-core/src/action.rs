//! Player actions and their wire payloads

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::dice::DieSource;
use crate::error::{ActionError, RejectReason};
use crate::pawn::{Location, PawnId};

/// Kind of action a player may submit
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    RollDice,
    MovePawn,
    ExitPrison,
    Pass,
}

impl ActionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ActionKind::RollDice => "roll_dice",
            ActionKind::MovePawn => "move_pawn",
            ActionKind::ExitPrison => "exit_prison",
            ActionKind::Pass => "pass",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "roll_dice" => Some(ActionKind::RollDice),
            "move_pawn" => Some(ActionKind::MovePawn),
            "exit_prison" => Some(ActionKind::ExitPrison),
            "pass" => Some(ActionKind::Pass),
            _ => None,
        }
    }
}

/// A decoded action
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Action {
    RollDice,
    MovePawn {
        pawn_id: PawnId,
        target: Location,
        #[serde(default)]
        source: Option<DieSource>,
    },
    ExitPrison,
    Pass,
}

#[derive(Deserialize)]
struct MovePayload {
    pawn_id: PawnId,
    target: Location,
    #[serde(default, alias = "dice_used")]
    source: Option<DieSource>,
}

impl Action {
    pub fn kind(&self) -> ActionKind {
        match self {
            Action::RollDice => ActionKind::RollDice,
            Action::MovePawn { .. } => ActionKind::MovePawn,
            Action::ExitPrison => ActionKind::ExitPrison,
            Action::Pass => ActionKind::Pass,
        }
    }

    /// Decode a transport-level `(kind, payload)` pair.
    ///
    /// An unknown kind is a caller error; a bad `move_pawn` payload is an
    /// ordinary rejection.
    pub fn from_request(kind: &str, payload: &Value) -> Result<Self, ActionError> {
        let kind = ActionKind::parse(kind).ok_or_else(|| ActionError::UnknownAction(kind.to_string()))?;
        match kind {
            ActionKind::RollDice => Ok(Action::RollDice),
            ActionKind::ExitPrison => Ok(Action::ExitPrison),
            ActionKind::Pass => Ok(Action::Pass),
            ActionKind::MovePawn => {
                let payload: MovePayload = serde_json::from_value(payload.clone())
                    .map_err(|_| ActionError::Rejected(RejectReason::MalformedPayload))?;
                Ok(Action::MovePawn {
                    pawn_id: payload.pawn_id,
                    target: payload.target,
                    source: payload.source,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_decode_simple_actions() {
        assert_eq!(Action::from_request("roll_dice", &Value::Null), Ok(Action::RollDice));
        assert_eq!(Action::from_request("pass", &json!({})), Ok(Action::Pass));
    }

    #[test]
    fn test_decode_move() {
        let payload = json!({
            "pawn_id": 2,
            "target": {"kind": "in_home_stretch", "step": 3},
            "source": "sum"
        });
        assert_eq!(
            Action::from_request("move_pawn", &payload),
            Ok(Action::MovePawn {
                pawn_id: 2,
                target: Location::InHomeStretch { step: 3 },
                source: Some(DieSource::Sum),
            })
        );
    }

    #[test]
    fn test_unknown_kind_is_not_a_rejection() {
        assert_eq!(
            Action::from_request("teleport", &Value::Null),
            Err(ActionError::UnknownAction("teleport".into()))
        );
    }

    #[test]
    fn test_malformed_move_is_rejected() {
        assert_eq!(
            Action::from_request("move_pawn", &json!({"pawn_id": "x"})),
            Err(ActionError::Rejected(RejectReason::MalformedPayload))
        );
    }
}
