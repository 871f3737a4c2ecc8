use crate::error::{LiarsError, Result};
use crate::model::face::Face;
use crate::model::{FACE_COUNT, MAX_HAND_SIZE};
use core::fmt;
use rand::Rng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

const FACTORIALS: [f64; MAX_HAND_SIZE + 1] = [1.0, 1.0, 2.0, 6.0, 24.0, 120.0];
const SINGLE_DIE_PROBABILITY: f64 = 1.0 / FACE_COUNT as f64;

/// Multiset of die faces held by one player, stored as counts per face.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(try_from = "[u8; 6]", into = "[u8; 6]")]
pub struct DiceHand {
    counts: [u8; FACE_COUNT],
}

impl DiceHand {
    pub const fn empty() -> Self {
        Self {
            counts: [0; FACE_COUNT],
        }
    }

    pub fn from_counts(counts: [u8; FACE_COUNT]) -> Result<Self> {
        let total: usize = counts.iter().map(|&c| c as usize).sum();
        if total > MAX_HAND_SIZE {
            return Err(LiarsError::InvalidHandSize(format!(
                "hand holds {total} dice, at most {MAX_HAND_SIZE} allowed"
            )));
        }
        Ok(Self { counts })
    }

    /// Builds a hand from individual die values (1-6).
    pub fn from_faces(values: &[u8]) -> Result<Self> {
        if values.len() > MAX_HAND_SIZE {
            return Err(LiarsError::InvalidHandSize(format!(
                "hand holds {} dice, at most {MAX_HAND_SIZE} allowed",
                values.len()
            )));
        }
        let mut counts = [0u8; FACE_COUNT];
        for &value in values {
            let face = Face::from_value(value).ok_or_else(|| {
                LiarsError::InvalidHandSize(format!("die value {value} is outside 1-6"))
            })?;
            counts[face.index()] += 1;
        }
        Ok(Self { counts })
    }

    /// Rolls `size` independent uniform dice.
    pub fn roll<R: Rng + ?Sized>(size: usize, rng: &mut R) -> Result<Self> {
        if size > MAX_HAND_SIZE {
            return Err(LiarsError::InvalidHandSize(format!(
                "cannot roll {size} dice, choose between 0 and {MAX_HAND_SIZE}"
            )));
        }
        let mut counts = [0u8; FACE_COUNT];
        for _ in 0..size {
            counts[rng.gen_range(0..FACE_COUNT)] += 1;
        }
        Ok(Self { counts })
    }

    pub fn len(&self) -> usize {
        self.counts.iter().map(|&c| c as usize).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.iter().all(|&c| c == 0)
    }

    pub fn count(&self, face: Face) -> u8 {
        self.counts[face.index()]
    }

    pub fn counts(&self) -> [u8; FACE_COUNT] {
        self.counts
    }

    /// Every die in the hand, smallest face first.
    pub fn faces(&self) -> Vec<Face> {
        Face::ALL
            .iter()
            .flat_map(|&face| std::iter::repeat(face).take(self.count(face) as usize))
            .collect()
    }

    /// Picks one die uniformly from the multiset, so faces held twice are twice as likely.
    pub fn random_die<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<Face> {
        self.faces().choose(rng).copied()
    }

    /// Multinomial probability of rolling exactly this count vector with uniform dice.
    pub fn probability(&self) -> f64 {
        let total = self.len();
        let coefficient = self
            .counts
            .iter()
            .fold(FACTORIALS[total], |acc, &c| acc / FACTORIALS[c as usize]);
        coefficient * SINGLE_DIE_PROBABILITY.powi(total as i32)
    }
}

impl TryFrom<[u8; FACE_COUNT]> for DiceHand {
    type Error = LiarsError;

    fn try_from(counts: [u8; FACE_COUNT]) -> Result<Self> {
        DiceHand::from_counts(counts)
    }
}

impl From<DiceHand> for [u8; FACE_COUNT] {
    fn from(hand: DiceHand) -> Self {
        hand.counts
    }
}

impl fmt::Display for DiceHand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let faces = self
            .faces()
            .iter()
            .map(|face| face.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        write!(f, "[{faces}]")
    }
}
