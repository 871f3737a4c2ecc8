//! Bayesian estimate of a bid's truth over every hand the bidder might hold.
//!
//! For an observer facing a bid, each candidate bidder hand `h` is weighted by
//! `P(bid | h) * P(h)`, normalized over all candidates. `P(h)` is the multinomial
//! probability of the hand under uniform dice. `P(bid | h)` is a pseudo-likelihood that
//! splits the bidder's shortfall between dice they expect on the observer's side and dice
//! they invent. It is not a distribution over bids; only ratios between candidates matter.

use super::{HandCatalog, SINGLE_DIE};
use crate::error::{LiarsError, Result};
use crate::model::bid::{Bid, bid_holds};
use crate::model::hand::DiceHand;
use crate::model::view::HandView;

#[derive(Debug, Clone, PartialEq)]
pub struct PosteriorEntry {
    pub hand: DiceHand,
    pub weight: f64,
    pub bid_holds: bool,
}

/// Normalized belief over the bidder's hand after observing a bid.
#[derive(Debug, Clone)]
pub struct Posterior {
    bid: Bid,
    entries: Vec<PosteriorEntry>,
}

impl Posterior {
    pub fn bid(&self) -> Bid {
        self.bid
    }

    pub fn entries(&self) -> &[PosteriorEntry] {
        &self.entries
    }

    /// Posterior mass of candidate hands for which the bid is true.
    pub fn probability_correct(&self) -> f64 {
        self.entries
            .iter()
            .filter(|entry| entry.bid_holds)
            .map(|entry| entry.weight)
            .sum::<f64>()
            .clamp(0.0, 1.0)
    }

    /// Shannon entropy (nats) of the belief.
    pub fn entropy(&self) -> f64 {
        self.entries
            .iter()
            .filter(|entry| entry.weight > 0.0)
            .map(|entry| -entry.weight * entry.weight.ln())
            .sum()
    }

    pub fn most_likely(&self) -> Option<&PosteriorEntry> {
        self.entries
            .iter()
            .max_by(|a, b| a.weight.total_cmp(&b.weight))
    }
}

#[derive(Debug, Clone, Copy)]
pub struct ConditionalEstimator<'a> {
    catalog: &'a HandCatalog,
}

impl<'a> ConditionalEstimator<'a> {
    pub const fn new(catalog: &'a HandCatalog) -> Self {
        Self { catalog }
    }

    pub fn catalog(&self) -> &'a HandCatalog {
        self.catalog
    }

    /// Unnormalized likelihood that a bidder holding `candidate` states `bid`.
    ///
    /// The shortfall (bid quantity beyond the candidate's own count) is split every way
    /// into dice believed to sit with the observer, each worth `1/6`, and bluffed dice
    /// drawn from the candidate's non-matching dice, each worth `bluff_prior`. A candidate
    /// holding exactly the quantity has a likelihood of one. A candidate holding more of the
    /// face than claimed would not have stated this bid, so its likelihood is zero.
    pub fn bid_likelihood(candidate: &HandView, bid: &Bid, bluff_prior: f64) -> f64 {
        let held = candidate.quantity_of(bid.face()) as usize;
        let Some(shortfall) = (bid.quantity() as usize).checked_sub(held) else {
            return 0.0;
        };
        let bluffable = candidate.len() - held;
        let observer_dice = candidate.opponent_dice();

        (0..=shortfall)
            .filter_map(|bluffed| {
                let believed = shortfall - bluffed;
                (bluffed <= bluffable && believed <= observer_dice).then(|| {
                    SINGLE_DIE.powi(believed as i32) * bluff_prior.powi(bluffed as i32)
                })
            })
            .sum()
    }

    /// Posterior over the bidder's possible hands given `bid`, seen by `observer`.
    pub fn posterior(&self, observer: &HandView, bid: &Bid, bluff_prior: f64) -> Result<Posterior> {
        let candidates = self
            .catalog
            .toy_views(observer.opponent_dice(), observer.len())?;

        let mut evidence = 0.0;
        let mut entries = Vec::with_capacity(candidates.len());
        for candidate in candidates {
            let joint =
                Self::bid_likelihood(candidate, bid, bluff_prior) * candidate.hand().probability();
            evidence += joint;
            entries.push(PosteriorEntry {
                hand: *candidate.hand(),
                weight: joint,
                bid_holds: bid_holds(bid, observer.hand(), candidate.hand()),
            });
        }

        if !(evidence > 0.0 && evidence.is_finite()) {
            return Err(LiarsError::DegenerateBelief { bid: *bid });
        }
        for entry in &mut entries {
            entry.weight /= evidence;
        }

        Ok(Posterior { bid: *bid, entries })
    }

    /// Probability that `bid` holds given the observer's hand and the bidder's bluff prior.
    ///
    /// A bid claiming more dice than the board holds is false under every candidate and
    /// returns zero without a Bayesian update.
    pub fn probability(&self, observer: &HandView, bid: &Bid, bluff_prior: f64) -> Result<f64> {
        if bid.quantity() as usize > observer.board_size() {
            return Ok(0.0);
        }
        Ok(self.posterior(observer, bid, bluff_prior)?.probability_correct())
    }
}
