//! Next-bid selection from a player's own view of the board.

mod constructor;

pub use constructor::{construct_bid, opening_face, target_quantity};
