use super::SINGLE_DIE;
use crate::error::{LiarsError, Result};
use crate::model::bid::Bid;
use crate::model::view::HandView;
use statrs::distribution::{Binomial, Discrete};

/// Face-value probability that `bid` holds.
///
/// Treats every unseen die as an independent uniform roll and ignores whatever the bid
/// might reveal about the bidder: the upper tail of `Binomial(opponent_dice, 1/6)` from
/// the shortfall left after the viewer's own dice.
pub fn truthful_probability(view: &HandView, bid: &Bid) -> Result<f64> {
    let held = view.quantity_of(bid.face()) as u64;
    let quantity = bid.quantity() as u64;
    if quantity <= held {
        return Ok(1.0);
    }

    let need = quantity - held;
    let unseen = view.opponent_dice() as u64;
    if need > unseen {
        return Ok(0.0);
    }

    let binomial = Binomial::new(SINGLE_DIE, unseen)
        .map_err(|err| LiarsError::Distribution(err.to_string()))?;
    let tail: f64 = (need..=unseen).map(|k| binomial.pmf(k)).sum();
    Ok(tail.clamp(0.0, 1.0))
}
