use crate::error::{LiarsError, Result};
use crate::model::bid::Bid;
use crate::model::face::Face;
use crate::model::view::HandView;
use rand::Rng;
use rand::seq::SliceRandom;

/// Builds the bid `view`'s owner makes after `previous` (or the opening bid).
///
/// The player stays on the previous face while the expected board count still exceeds
/// the claimed quantity, otherwise moves to the lowest higher face they hold, or a random
/// higher face when they hold none. The result always outranks `previous`.
pub fn construct_bid<R: Rng + ?Sized>(
    view: &HandView,
    previous: Option<&Bid>,
    rng: &mut R,
) -> Result<Bid> {
    let (face, minimum) = match previous {
        None => (opening_face(view, rng)?, 1),
        Some(prev) if prev.face().is_max() => (prev.face(), prev.quantity() + 1),
        Some(prev) if view.expected_quantity(prev.face()) > prev.quantity() as f64 => {
            (prev.face(), prev.quantity() + 1)
        }
        Some(prev) => (switch_face(view, prev.face(), rng), 1),
    };

    let quantity = target_quantity(view, face).max(minimum);
    Bid::with_face(quantity, face)
}

/// Samples one of the player's own dice, so faces held more often open more often.
pub fn opening_face<R: Rng + ?Sized>(view: &HandView, rng: &mut R) -> Result<Face> {
    view.hand()
        .random_die(rng)
        .ok_or_else(|| LiarsError::EmptyHand {
            player: view.name().to_string(),
        })
}

/// Expected board count of `face` inflated by the player's bluff rate on the dice they
/// hold of other faces, rounded half to even.
pub fn target_quantity(view: &HandView, face: Face) -> u32 {
    let unmatched = view.len() - view.quantity_of(face) as usize;
    let target = view.expected_quantity(face) + view.own_bluff_rate() * unmatched as f64;
    target.round_ties_even().max(0.0) as u32
}

fn switch_face<R: Rng + ?Sized>(view: &HandView, previous: Face, rng: &mut R) -> Face {
    if let Some(held) = previous.higher().find(|face| view.quantity_of(*face) > 0) {
        return held;
    }
    let higher: Vec<Face> = previous.higher().collect();
    higher.choose(rng).copied().unwrap_or(Face::MAX)
}

#[cfg(test)]
mod tests {
    use super::{construct_bid, target_quantity};
    use crate::error::LiarsError;
    use crate::model::bid::Bid;
    use crate::model::face::Face;
    use crate::model::hand::DiceHand;
    use crate::model::view::HandView;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn view(faces: &[u8], opponent: usize) -> HandView {
        HandView::new("Me", DiceHand::from_faces(faces).unwrap(), opponent).unwrap()
    }

    #[test]
    fn opening_bid_uses_a_held_face() {
        let mut rng = StdRng::seed_from_u64(3);
        let v = view(&[3, 3, 3], 2);
        let bid = construct_bid(&v, None, &mut rng).unwrap();
        assert_eq!(bid.face(), Face::Three);
        // 3 held + 2/6 expected from the opponent.
        assert_eq!(bid.quantity(), 3);
    }

    #[test]
    fn opening_bid_from_empty_hand_fails() {
        let mut rng = StdRng::seed_from_u64(3);
        let v = view(&[], 4);
        assert!(matches!(
            construct_bid(&v, None, &mut rng),
            Err(LiarsError::EmptyHand { .. })
        ));
    }

    #[test]
    fn top_face_only_raises_quantity() {
        let mut rng = StdRng::seed_from_u64(5);
        let v = view(&[1, 2], 2);
        let prev = Bid::new(2, 6).unwrap();
        let bid = construct_bid(&v, Some(&prev), &mut rng).unwrap();
        assert_eq!(bid.face(), Face::Six);
        assert_eq!(bid.quantity(), 3);
    }

    #[test]
    fn stays_on_face_while_expected_count_exceeds_bid() {
        let mut rng = StdRng::seed_from_u64(5);
        let v = view(&[2, 2], 3);
        let prev = Bid::new(1, 2).unwrap();
        let bid = construct_bid(&v, Some(&prev), &mut rng).unwrap();
        assert_eq!(bid.face(), Face::Two);
        // Target 2.5 rounds half to even.
        assert_eq!(bid.quantity(), 2);
    }

    #[test]
    fn switches_to_lowest_higher_held_face() {
        let mut rng = StdRng::seed_from_u64(5);
        let v = view(&[4, 5], 2);
        let prev = Bid::new(3, 2).unwrap();
        let bid = construct_bid(&v, Some(&prev), &mut rng).unwrap();
        assert_eq!(bid.face(), Face::Four);
        // 1 + 2/6 + 0.25 * 1 = 1.58.
        assert_eq!(bid.quantity(), 2);
    }

    #[test]
    fn switches_to_random_higher_face_when_none_held() {
        let v = view(&[1, 1], 3);
        let prev = Bid::new(5, 3).unwrap();
        for seed in 0..32 {
            let mut rng = StdRng::seed_from_u64(seed);
            let bid = construct_bid(&v, Some(&prev), &mut rng).unwrap();
            assert!(bid.face() > Face::Three);
            assert_eq!(bid.quantity(), 1);
        }
    }

    #[test]
    fn target_adds_bluff_on_unmatched_dice() {
        let v = view(&[6], 0);
        assert_eq!(target_quantity(&v, Face::Six), 1);
        // One unmatched die at bluff rate 1.
        assert_eq!(target_quantity(&v, Face::Two), 1);
        let v = view(&[1, 2, 3, 4, 5], 5);
        // 1 + 5/6 + 0.04 * 4 = 1.99.
        assert_eq!(target_quantity(&v, Face::Three), 2);
    }

    #[test]
    fn constructed_bids_always_outrank_previous() {
        let mut rng = StdRng::seed_from_u64(2024);
        for _ in 0..500 {
            let own = rand::Rng::gen_range(&mut rng, 1..=5usize);
            let opponent = rand::Rng::gen_range(&mut rng, 0..=5usize);
            let hand = DiceHand::roll(own, &mut rng).unwrap();
            let v = HandView::new("Me", hand, opponent).unwrap();

            let mut previous = construct_bid(&v, None, &mut rng).unwrap();
            for _ in 0..8 {
                let next = construct_bid(&v, Some(&previous), &mut rng).unwrap();
                assert!(next.outranks(&previous), "{next} after {previous} for {v}");
                previous = next;
            }
        }
    }
}
