use core::fmt;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum PlayerSeat {
    First = 0,
    Second = 1,
}

impl PlayerSeat {
    pub const BOTH: [PlayerSeat; 2] = [PlayerSeat::First, PlayerSeat::Second];

    pub const fn index(self) -> usize {
        self as usize
    }

    pub const fn other(self) -> PlayerSeat {
        match self {
            PlayerSeat::First => PlayerSeat::Second,
            PlayerSeat::Second => PlayerSeat::First,
        }
    }
}

impl fmt::Display for PlayerSeat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayerSeat::First => "First",
            PlayerSeat::Second => "Second",
        };
        f.write_str(label)
    }
}
