use crate::error::{LiarsError, Result};
use crate::model::face::Face;
use crate::model::hand::DiceHand;
use core::fmt;
use serde::Serialize;

/// Claim that at least `quantity` dice showing `face` exist on the board.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Bid {
    quantity: u32,
    face: Face,
}

impl Bid {
    pub fn new(quantity: u32, face: u8) -> Result<Self> {
        match Face::from_value(face) {
            Some(face) if quantity > 0 => Ok(Self { quantity, face }),
            _ => Err(LiarsError::InvalidBid { quantity, face }),
        }
    }

    pub fn with_face(quantity: u32, face: Face) -> Result<Self> {
        Self::new(quantity, face.value())
    }

    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    pub const fn face(&self) -> Face {
        self.face
    }

    /// True when `self` is a legal raise over `previous`: same face with a higher
    /// quantity, or any strictly higher face.
    pub fn outranks(&self, previous: &Bid) -> bool {
        if self.face == previous.face {
            self.quantity > previous.quantity
        } else {
            self.face > previous.face
        }
    }

    /// A top-face bid claiming every die on the board leaves no raise that could hold.
    pub fn exhausts_board(&self, board_size: usize) -> bool {
        self.face.is_max() && self.quantity as usize == board_size
    }
}

impl fmt::Display for Bid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.quantity, self.face)
    }
}

/// Ground truth: does the board formed by `first` and `second` contain the bid?
pub fn bid_holds(bid: &Bid, first: &DiceHand, second: &DiceHand) -> bool {
    let on_board = first.count(bid.face()) as u32 + second.count(bid.face()) as u32;
    on_board >= bid.quantity()
}
