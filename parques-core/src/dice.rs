//! Dice, dice sources, and the transient per-turn record

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Consecutive doubles that trigger the promotion rule
pub const TRIPLE_DOUBLES: u8 = 3;

/// One roll of the two dice
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dice {
    pub d1: u8,
    pub d2: u8,
}

impl Dice {
    pub const fn new(d1: u8, d2: u8) -> Self {
        Self { d1, d2 }
    }

    pub fn is_double(self) -> bool {
        self.d1 == self.d2
    }

    pub fn sum(self) -> u8 {
        self.d1 + self.d2
    }

    /// Step count funded by `source`
    pub fn steps(self, source: DieSource) -> u8 {
        match source {
            DieSource::Die1 => self.d1,
            DieSource::Die2 => self.d2,
            DieSource::Sum => self.sum(),
        }
    }

    pub fn is_valid(self) -> bool {
        (1..=6).contains(&self.d1) && (1..=6).contains(&self.d2)
    }
}

/// Which die (or both) pays for a move
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DieSource {
    #[serde(alias = "dice1")]
    Die1,
    #[serde(alias = "dice2")]
    Die2,
    Sum,
}

/// Sub-phase of the acting player's turn
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnPhase {
    AwaitingRoll,
    AwaitingPrisonExit,
    AwaitingMove,
}

/// Dice state of the turn in progress
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnState {
    pub dice: Dice,
    pub rolled: bool,
    consumed: [bool; 2],
    pub consecutive_doubles: u8,
    pub phase: TurnPhase,
}

impl Default for TurnState {
    fn default() -> Self {
        Self::new()
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self {
            dice: Dice::new(1, 1),
            rolled: false,
            consumed: [false; 2],
            consecutive_doubles: 0,
            phase: TurnPhase::AwaitingRoll,
        }
    }

    /// Record a fresh roll; returns the updated doubles streak
    pub fn record_roll(&mut self, dice: Dice) -> u8 {
        self.dice = dice;
        self.rolled = true;
        self.consumed = [false; 2];
        if dice.is_double() {
            self.consecutive_doubles += 1;
        } else {
            self.consecutive_doubles = 0;
        }
        self.consecutive_doubles
    }

    pub fn consumed(&self) -> [bool; 2] {
        self.consumed
    }

    pub fn die1_available(&self) -> bool {
        self.rolled && !self.consumed[0]
    }

    pub fn die2_available(&self) -> bool {
        self.rolled && !self.consumed[1]
    }

    pub fn any_consumed(&self) -> bool {
        self.consumed[0] || self.consumed[1]
    }

    /// Mark the dice paying for a move; a sum spends both at once
    pub fn consume(&mut self, source: DieSource) {
        debug_assert!(self.rolled, "consuming dice before a roll");
        match source {
            DieSource::Die1 => self.consumed[0] = true,
            DieSource::Die2 => self.consumed[1] = true,
            DieSource::Sum => self.consumed = [true, true],
        }
    }

    /// A double owes a single move, any other roll owes both dice
    pub fn all_owed_consumed(&self) -> bool {
        if self.dice.is_double() {
            self.any_consumed()
        } else {
            self.consumed[0] && self.consumed[1]
        }
    }

    /// Values of the dice not spent yet
    pub fn remaining_values(&self) -> Vec<u8> {
        let mut remaining = Vec::with_capacity(2);
        if self.die1_available() {
            remaining.push(self.dice.d1);
        }
        if self.die2_available() {
            remaining.push(self.dice.d2);
        }
        remaining
    }

    /// Let the same player roll again; the last dice and the doubles streak stay visible
    pub fn reset_for_reroll(&mut self) {
        self.rolled = false;
        self.consumed = [false; 2];
        self.phase = TurnPhase::AwaitingRoll;
    }

    /// Forget everything at the end of a turn
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}

/// Source of dice rolls, one call per roll
pub trait DiceRoller: Send {
    fn roll(&mut self) -> Dice;
}

/// Uniform dice backed by ChaCha8
pub struct ChaChaDice {
    rng: ChaCha8Rng,
}

impl ChaChaDice {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
        }
    }
}

impl DiceRoller for ChaChaDice {
    fn roll(&mut self) -> Dice {
        Dice::new(self.rng.gen_range(1..=6), self.rng.gen_range(1..=6))
    }
}

/// Replays a fixed script of rolls, cycling when it runs out.
///
/// An empty script always rolls (1, 2).
#[derive(Clone, Debug, Default)]
pub struct ScriptedDice {
    rolls: Vec<Dice>,
    next: usize,
}

impl ScriptedDice {
    pub fn new(rolls: Vec<Dice>) -> Self {
        Self { rolls, next: 0 }
    }

    pub fn from_pairs(pairs: &[(u8, u8)]) -> Self {
        Self::new(pairs.iter().map(|&(a, b)| Dice::new(a, b)).collect())
    }
}

impl DiceRoller for ScriptedDice {
    fn roll(&mut self) -> Dice {
        if self.rolls.is_empty() {
            return Dice::new(1, 2);
        }
        let dice = self.rolls[self.next % self.rolls.len()];
        self.next += 1;
        dice
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sum_consumes_both() {
        let mut turn = TurnState::new();
        turn.record_roll(Dice::new(2, 5));
        turn.consume(DieSource::Sum);
        assert_eq!(turn.consumed(), [true, true]);
        assert!(turn.all_owed_consumed());
        assert!(turn.remaining_values().is_empty());
    }

    #[test]
    fn test_double_owes_one_move() {
        let mut turn = TurnState::new();
        turn.record_roll(Dice::new(4, 4));
        assert!(!turn.all_owed_consumed());
        turn.consume(DieSource::Die1);
        assert!(turn.all_owed_consumed());
        assert_eq!(turn.remaining_values(), vec![4]);
    }

    #[test]
    fn test_doubles_streak() {
        let mut turn = TurnState::new();
        assert_eq!(turn.record_roll(Dice::new(3, 3)), 1);
        turn.reset_for_reroll();
        assert_eq!(turn.consecutive_doubles, 1);
        assert!(!turn.rolled);
        assert_eq!(turn.record_roll(Dice::new(6, 6)), 2);
        assert_eq!(turn.record_roll(Dice::new(1, 6)), 0);
        turn.record_roll(Dice::new(2, 2));
        turn.reset();
        assert_eq!(turn.consecutive_doubles, 0);
    }

    #[test]
    fn test_nothing_available_before_roll() {
        let turn = TurnState::new();
        assert!(!turn.die1_available());
        assert!(turn.remaining_values().is_empty());
    }

    #[test]
    fn test_chacha_dice_in_range_and_reproducible() {
        let mut a = ChaChaDice::from_seed(7);
        let mut b = ChaChaDice::from_seed(7);
        for _ in 0..200 {
            let roll = a.roll();
            assert!(roll.is_valid());
            assert_eq!(roll, b.roll());
        }
    }

    #[test]
    fn test_scripted_dice_cycles() {
        let mut dice = ScriptedDice::from_pairs(&[(1, 1), (2, 3)]);
        assert_eq!(dice.roll(), Dice::new(1, 1));
        assert_eq!(dice.roll(), Dice::new(2, 3));
        assert_eq!(dice.roll(), Dice::new(1, 1));
        assert_eq!(ScriptedDice::default().roll(), Dice::new(1, 2));
    }
}
