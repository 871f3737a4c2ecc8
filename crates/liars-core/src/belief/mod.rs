//! Probability that a bid holds, from one player's partial view of the board.
//!
//! This module is composed of:
//! - `cache`: `HandCatalog`, the memoized enumeration of every hand of a given size.
//! - `truthful`: binomial tail over the unseen dice, ignoring any bluff signal.
//! - `conditional`: Bayesian update over every possible bidder hand, weighted by a
//!   bluffing likelihood.

mod cache;
mod conditional;
mod truthful;

pub use cache::HandCatalog;
pub use conditional::{ConditionalEstimator, Posterior, PosteriorEntry};
pub use truthful::truthful_probability;

use crate::error::{LiarsError, Result};
use crate::model::bid::Bid;
use crate::model::view::HandView;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Chance that a single uniform die shows a given face.
pub(crate) const SINGLE_DIE: f64 = 1.0 / 6.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estimator {
    Truthful,
    Conditional,
}

impl Estimator {
    pub const ALL: [Estimator; 2] = [Estimator::Truthful, Estimator::Conditional];

    pub const fn as_str(self) -> &'static str {
        match self {
            Estimator::Truthful => "truthful",
            Estimator::Conditional => "conditional",
        }
    }

    /// Probability that `bid` holds from `observer`'s point of view.
    ///
    /// The conditional variant assumes the bidder bluffs at the observer's
    /// `expected_opponent_bluff_rate`.
    pub fn estimate(self, catalog: &HandCatalog, observer: &HandView, bid: &Bid) -> Result<f64> {
        match self {
            Estimator::Truthful => truthful_probability(observer, bid),
            Estimator::Conditional => ConditionalEstimator::new(catalog).probability(
                observer,
                bid,
                observer.expected_opponent_bluff_rate(),
            ),
        }
    }
}

impl FromStr for Estimator {
    type Err = LiarsError;

    fn from_str(value: &str) -> Result<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "truthful" => Ok(Estimator::Truthful),
            "conditional" => Ok(Estimator::Conditional),
            other => Err(LiarsError::InvalidConfiguration(format!(
                "unknown estimator '{other}' (expected 'truthful' or 'conditional')"
            ))),
        }
    }
}

impl fmt::Display for Estimator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
