use crate::error::{LiarsError, Result};
use crate::model::face::Face;
use crate::model::hand::DiceHand;
use crate::model::{FACE_COUNT, MAX_HAND_SIZE};
use core::fmt;
use rand::Rng;
use serde::Serialize;

/// Probability at or below which a player disbelieves a bid.
pub const CHALLENGE_THRESHOLD: f64 = 0.51;

/// Bluff rate modelled for a player holding `hand_size` dice: `(1 / size)^2`.
///
/// Smaller hands bluff more on each remaining die. A player without dice has nothing
/// to bluff with, so the rate is zero.
pub fn bluff_rate(hand_size: usize) -> f64 {
    if hand_size == 0 {
        0.0
    } else {
        (1.0 / hand_size as f64).powi(2)
    }
}

/// One player's private view of the board: their own dice plus the opponent's dice count.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HandView {
    name: String,
    hand: DiceHand,
    opponent_dice: usize,
}

impl HandView {
    pub fn new(name: impl Into<String>, hand: DiceHand, opponent_dice: usize) -> Result<Self> {
        if opponent_dice > MAX_HAND_SIZE {
            return Err(LiarsError::InvalidHandSize(format!(
                "opponent holds {opponent_dice} dice, at most {MAX_HAND_SIZE} allowed"
            )));
        }
        if hand.is_empty() && opponent_dice == 0 {
            return Err(LiarsError::InvalidHandSize(
                "at least one player must hold dice".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            hand,
            opponent_dice,
        })
    }

    /// Rolls a fresh hand of `size` dice for `name`.
    pub fn rolled<R: Rng + ?Sized>(
        name: impl Into<String>,
        size: usize,
        opponent_dice: usize,
        rng: &mut R,
    ) -> Result<Self> {
        Self::new(name, DiceHand::roll(size, rng)?, opponent_dice)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn hand(&self) -> &DiceHand {
        &self.hand
    }

    pub fn len(&self) -> usize {
        self.hand.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hand.is_empty()
    }

    pub fn opponent_dice(&self) -> usize {
        self.opponent_dice
    }

    pub fn board_size(&self) -> usize {
        self.len() + self.opponent_dice
    }

    pub const fn challenge_threshold(&self) -> f64 {
        CHALLENGE_THRESHOLD
    }

    pub fn quantity_of(&self, face: Face) -> u8 {
        self.hand.count(face)
    }

    pub fn own_bluff_rate(&self) -> f64 {
        bluff_rate(self.len())
    }

    pub fn expected_opponent_bluff_rate(&self) -> f64 {
        bluff_rate(self.opponent_dice)
    }

    /// Expected count of `face` on the board: own dice plus `opponent_dice / 6`.
    pub fn expected_quantity(&self, face: Face) -> f64 {
        self.quantity_of(face) as f64 + self.opponent_dice as f64 / FACE_COUNT as f64
    }

    pub fn expected_board(&self) -> [f64; FACE_COUNT] {
        std::array::from_fn(|i| match Face::from_index(i) {
            Some(face) => self.expected_quantity(face),
            None => 0.0,
        })
    }

    /// View after this player lost a challenge: one die fewer, all dice rerolled.
    pub fn after_loss<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<Self> {
        let remaining = self.len().checked_sub(1).ok_or_else(|| {
            LiarsError::InvalidHandSize(format!("{} has no die left to lose", self.name))
        })?;
        Self::rolled(self.name.clone(), remaining, self.opponent_dice, rng)
    }

    /// View after the opponent lost a challenge: same dice, one opposing die fewer.
    pub fn after_opponent_loss(&self) -> Result<Self> {
        let remaining = self.opponent_dice.checked_sub(1).ok_or_else(|| {
            LiarsError::InvalidHandSize(format!("{}'s opponent has no die left", self.name))
        })?;
        Self::new(self.name.clone(), self.hand, remaining)
    }
}

impl fmt::Display for HandView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.name)?;
        writeln!(f, "Hand: {}", self.hand)?;
        writeln!(f, "Number of dice: {}", self.len())?;
        write!(f, "Opponent's number of dice: {}", self.opponent_dice)
    }
}
