pub mod bid;
pub mod face;
pub mod hand;
pub mod player;
pub mod view;

/// Largest number of dice a single player may hold.
pub const MAX_HAND_SIZE: usize = 5;

/// Number of faces on a die.
pub const FACE_COUNT: usize = 6;
