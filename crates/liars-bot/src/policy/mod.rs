mod threshold;

pub use threshold::ThresholdPolicy;

use core::fmt;
use liars_core::Result;
use liars_core::belief::HandCatalog;
use liars_core::model::bid::Bid;
use liars_core::model::view::HandView;

/// What a responder sees when deciding on a bid.
pub struct PolicyContext<'a> {
    pub observer: &'a HandView,
    pub bid: Bid,
    pub catalog: &'a HandCatalog,
}

impl<'a> PolicyContext<'a> {
    pub fn new(observer: &'a HandView, bid: Bid, catalog: &'a HandCatalog) -> Self {
        Self {
            observer,
            bid,
            catalog,
        }
    }

    pub fn bidder_dice(&self) -> usize {
        self.observer.opponent_dice()
    }

    pub fn board_size(&self) -> usize {
        self.observer.board_size()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Decision {
    Raise,
    Challenge,
}

impl Decision {
    pub const fn is_challenge(self) -> bool {
        matches!(self, Decision::Challenge)
    }
}

impl fmt::Display for Decision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Decision::Raise => f.write_str("raise"),
            Decision::Challenge => f.write_str("challenge"),
        }
    }
}

/// Estimated probability that the bid holds and the resulting decision.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub probability: f64,
    pub decision: Decision,
}

/// Interface for challenge-or-raise decisions.
pub trait Policy: Send {
    fn assess(&mut self, ctx: &PolicyContext) -> Result<Assessment>;
}
