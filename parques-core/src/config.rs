//! Match configuration
//!
//! Loaded from JSON or built in code; every field has a default so partial
//! files are accepted.

use std::path::Path;

use anyhow::Context;
use serde::{Deserialize, Serialize};

use crate::board::BoardVariant;

/// What happens when a capture is available and the player passes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CapturePolicy {
    /// Passing is rejected while a capture is available
    #[default]
    Mandatory,
    /// `must_capture` is reported but never enforced
    Advisory,
    /// Passing is allowed, but the pawn that could have captured goes to prison
    Blow,
}

/// Optional rules
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuleConfig {
    /// Overshooting the goal recoils instead of being invalid
    pub enable_bounce: bool,
    /// A third consecutive double promotes the most advanced pawn
    pub enable_triple_double_bonus: bool,
    pub capture_policy: CapturePolicy,
}

impl Default for RuleConfig {
    fn default() -> Self {
        Self {
            enable_bounce: true,
            enable_triple_double_bonus: true,
            capture_policy: CapturePolicy::Mandatory,
        }
    }
}

/// Configuration for one match
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchConfig {
    pub variant: BoardVariant,
    pub pawns_per_player: usize,
    pub min_players: usize,
    /// Defaults to the number of seats on the board
    pub max_players: Option<usize>,
    pub turn_timeout_ms: u64,
    pub rules: RuleConfig,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            variant: BoardVariant::FourPlayers,
            pawns_per_player: 4,
            min_players: 2,
            max_players: None,
            turn_timeout_ms: 60_000,
            rules: RuleConfig::default(),
        }
    }
}

/// Upper bound on `pawns_per_player`; pawn ids are a `u8`
pub const MAX_PAWNS_PER_PLAYER: usize = 16;

/// Rejected configuration values
#[derive(Clone, Debug, thiserror::Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("pawns_per_player must be at least 1")]
    NoPawns,

    #[error("pawns_per_player {0} exceeds the limit of {MAX_PAWNS_PER_PLAYER}")]
    TooManyPawns(usize),

    #[error("min_players {min} is greater than max_players {max}")]
    InvertedBounds { min: usize, max: usize },

    #[error("{requested} players do not fit a board with {seats} seats")]
    TooManySeats { requested: usize, seats: usize },

    #[error("a match needs at least 2 players, got min_players {0}")]
    TooFewPlayers(usize),
}

impl MatchConfig {
    pub fn for_variant(variant: BoardVariant) -> Self {
        Self {
            variant,
            ..Default::default()
        }
    }

    /// Upper player bound, resolved against the board
    pub fn max_players(&self) -> usize {
        self.max_players.unwrap_or_else(|| self.variant.seats())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let max = self.max_players();
        let seats = self.variant.seats();
        if self.pawns_per_player == 0 {
            return Err(ConfigError::NoPawns);
        }
        if self.pawns_per_player > MAX_PAWNS_PER_PLAYER {
            return Err(ConfigError::TooManyPawns(self.pawns_per_player));
        }
        if self.min_players < 2 {
            return Err(ConfigError::TooFewPlayers(self.min_players));
        }
        if self.min_players > max {
            return Err(ConfigError::InvertedBounds {
                min: self.min_players,
                max,
            });
        }
        if max > seats {
            return Err(ConfigError::TooManySeats {
                requested: max,
                seats,
            });
        }
        Ok(())
    }

    /// Load from a JSON file and validate
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read match config: {}", path.display()))?;
        let config: MatchConfig = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse match config: {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = MatchConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.max_players(), 4);
        assert_eq!(MatchConfig::for_variant(BoardVariant::SixPlayers).max_players(), 6);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: MatchConfig =
            serde_json::from_str(r#"{"variant":"six_players","rules":{"capture_policy":"blow"}}"#)
                .unwrap();
        assert_eq!(config.variant, BoardVariant::SixPlayers);
        assert_eq!(config.pawns_per_player, 4);
        assert!(config.rules.enable_bounce);
        assert_eq!(config.rules.capture_policy, CapturePolicy::Blow);
    }

    #[test]
    fn test_validate_rejects_bad_bounds() {
        let config = MatchConfig {
            max_players: Some(5),
            ..Default::default()
        };
        assert_eq!(
            config.validate(),
            Err(ConfigError::TooManySeats { requested: 5, seats: 4 })
        );

        let config = MatchConfig {
            min_players: 3,
            max_players: Some(2),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvertedBounds { .. })));

        let config = MatchConfig {
            pawns_per_player: 0,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::NoPawns));
    }

    #[test]
    fn test_validate_caps_pawns() {
        let config = MatchConfig {
            pawns_per_player: 300,
            ..Default::default()
        };
        assert_eq!(config.validate(), Err(ConfigError::TooManyPawns(300)));

        let config = MatchConfig {
            pawns_per_player: MAX_PAWNS_PER_PLAYER,
            ..Default::default()
        };
        assert!(config.validate().is_ok());
    }
}
