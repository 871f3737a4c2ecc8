//! Memoized enumeration of every dice multiset of a given size.

use crate::error::{LiarsError, Result};
use crate::model::hand::DiceHand;
use crate::model::view::HandView;
use crate::model::{FACE_COUNT, MAX_HAND_SIZE};
use once_cell::sync::OnceCell;
use std::array;

const SIZES: usize = MAX_HAND_SIZE + 1;
const TOY_NAME: &str = "Toy";

/// Lazily populated catalog of hypothetical hands.
///
/// Entries are computed on first access and never invalidated, so a single catalog can be
/// shared by reference across games and threads. Call [`HandCatalog::precompute`] to fill
/// every entry up front.
#[derive(Debug)]
pub struct HandCatalog {
    hands: [OnceCell<Vec<DiceHand>>; SIZES],
    toy_views: [[OnceCell<Vec<HandView>>; SIZES]; SIZES],
}

impl HandCatalog {
    pub fn new() -> Self {
        Self {
            hands: array::from_fn(|_| OnceCell::new()),
            toy_views: array::from_fn(|_| array::from_fn(|_| OnceCell::new())),
        }
    }

    /// Every multiset of `size` faces, `C(size + 5, 5)` entries in lexicographic order.
    pub fn hands_of_size(&self, size: usize) -> Result<&[DiceHand]> {
        let cell = self.hands.get(size).ok_or_else(|| out_of_range(size))?;
        cell.get_or_try_init(|| enumerate_hands(size))
            .map(Vec::as_slice)
    }

    /// Every hand of `own` dice wrapped as a view facing an opponent with `opponent` dice.
    pub fn toy_views(&self, own: usize, opponent: usize) -> Result<&[HandView]> {
        let cell = self
            .toy_views
            .get(own)
            .ok_or_else(|| out_of_range(own))?
            .get(opponent)
            .ok_or_else(|| out_of_range(opponent))?;
        cell.get_or_try_init(|| {
            self.hands_of_size(own)?
                .iter()
                .map(|hand| HandView::new(TOY_NAME, *hand, opponent))
                .collect()
        })
        .map(Vec::as_slice)
    }

    /// Populates every entry so later reads never compute.
    pub fn precompute(&self) -> Result<()> {
        for own in 0..SIZES {
            self.hands_of_size(own)?;
            for opponent in 0..SIZES {
                if own == 0 && opponent == 0 {
                    continue;
                }
                self.toy_views(own, opponent)?;
            }
        }
        Ok(())
    }

    /// Number of populated entries across both tables.
    pub fn populated(&self) -> usize {
        let hands = self.hands.iter().filter(|cell| cell.get().is_some()).count();
        let views = self
            .toy_views
            .iter()
            .flatten()
            .filter(|cell| cell.get().is_some())
            .count();
        hands + views
    }
}

impl Default for HandCatalog {
    fn default() -> Self {
        Self::new()
    }
}

fn out_of_range(size: usize) -> LiarsError {
    LiarsError::InvalidHandSize(format!(
        "no catalog entry for {size} dice, choose between 0 and {MAX_HAND_SIZE}"
    ))
}

fn enumerate_hands(size: usize) -> Result<Vec<DiceHand>> {
    let mut out = Vec::new();
    let mut counts = [0u8; FACE_COUNT];
    extend_from(0, size, &mut counts, &mut out);
    out.into_iter().map(DiceHand::from_counts).collect()
}

// Non-decreasing face sequences, so each multiset is produced exactly once.
fn extend_from(
    lowest: usize,
    remaining: usize,
    counts: &mut [u8; FACE_COUNT],
    out: &mut Vec<[u8; FACE_COUNT]>,
) {
    if remaining == 0 {
        out.push(*counts);
        return;
    }
    for face in lowest..FACE_COUNT {
        counts[face] += 1;
        extend_from(face, remaining - 1, counts, out);
        counts[face] -= 1;
    }
}
