//! Error taxonomy shared by every liars-core component.

use crate::model::bid::Bid;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, LiarsError>;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum LiarsError {
    #[error("invalid hand size: {0}")]
    InvalidHandSize(String),

    #[error("invalid bid: quantity {quantity}, face {face} (quantity must be positive, face 1-6)")]
    InvalidBid { quantity: u32, face: u8 },

    #[error("bid {bid} does not raise the standing bid {previous}")]
    BidNotRaised { previous: Bid, bid: Bid },

    #[error("bid {bid} is not the standing bid of this round")]
    NotStandingBid { bid: Bid },

    #[error("it is {expected}'s turn, not {actual}'s")]
    IllegalTurn { expected: String, actual: String },

    #[error("'{name}' is not a registered player (expected '{first}' or '{second}')")]
    InvalidPlayerName {
        name: String,
        first: String,
        second: String,
    },

    #[error("invalid game configuration: {0}")]
    InvalidConfiguration(String),

    #[error("the game is over; no further bids or challenges are accepted")]
    GameOver,

    #[error("{player} has no dice to open the bidding with")]
    EmptyHand { player: String },

    #[error("no candidate bidder hand explains bid {bid}; posterior is undefined")]
    DegenerateBelief { bid: Bid },

    #[error("distribution error: {0}")]
    Distribution(String),
}
