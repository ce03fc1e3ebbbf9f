//! Random legal-action bot

use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use crate::action::{Action, ActionKind};
use crate::dice::{DiceRoller, TurnPhase};
use crate::error::ActionError;
use crate::game::Match;

/// Picks a random legal action for the acting player, taking captures when it can
pub struct RandomBot {
    rng: ChaCha8Rng,
}

impl RandomBot {
    pub fn new() -> Self {
        Self::with_seed(42)
    }

    pub fn with_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Action for whoever is acting in `game`, or `None` once it is over
    pub fn choose(&mut self, game: &Match) -> Option<Action> {
        let actions = game.legal_actions();
        if actions.is_empty() {
            return None;
        }

        match game.turn().phase {
            TurnPhase::AwaitingRoll => Some(Action::RollDice),
            TurnPhase::AwaitingPrisonExit => Some(Action::ExitPrison),
            TurnPhase::AwaitingMove => {
                let moves = game.legal_moves();
                let capturing: Vec<_> = moves.iter().filter(|m| m.can_capture).collect();
                let pick = if capturing.is_empty() {
                    moves.choose(&mut self.rng)
                } else {
                    capturing.choose(&mut self.rng).copied()
                };
                match pick {
                    Some(m) => Some(Action::MovePawn {
                        pawn_id: m.pawn_id,
                        target: m.target,
                        source: Some(m.source),
                    }),
                    None if actions.contains(&ActionKind::Pass) => Some(Action::Pass),
                    None => None,
                }
            }
        }
    }
}

impl Default for RandomBot {
    fn default() -> Self {
        Self::new()
    }
}

/// Drive `game` with `bot` for every seat until it ends or `max_actions` run out.
///
/// Returns the number of actions applied.
pub fn play_out(
    game: &mut Match,
    dice: &mut dyn DiceRoller,
    bot: &mut RandomBot,
    max_actions: usize,
) -> Result<usize, ActionError> {
    let mut applied = 0;
    while applied < max_actions {
        let Some(action) = bot.choose(game) else {
            break;
        };
        let player = game.current_player().id.clone();
        game.apply(&player, &action, dice)?;
        applied += 1;
    }
    Ok(applied)
}
