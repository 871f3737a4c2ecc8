use super::{Assessment, Decision, Policy, PolicyContext};
use liars_core::Result;
use liars_core::belief::Estimator;
use tracing::{Level, event};

/// Challenges whenever the estimated probability is at or below the observer's threshold,
/// or when the bid leaves no raise that could hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ThresholdPolicy {
    estimator: Estimator,
}

impl ThresholdPolicy {
    pub const fn new(estimator: Estimator) -> Self {
        Self { estimator }
    }

    pub const fn estimator(&self) -> Estimator {
        self.estimator
    }
}

impl Policy for ThresholdPolicy {
    fn assess(&mut self, ctx: &PolicyContext) -> Result<Assessment> {
        let probability = self.estimator.estimate(ctx.catalog, ctx.observer, &ctx.bid)?;
        let forced = ctx.bid.exhausts_board(ctx.board_size());
        let decision = if forced || probability <= ctx.observer.challenge_threshold() {
            Decision::Challenge
        } else {
            Decision::Raise
        };

        log_assessment(ctx, self.estimator.as_str(), probability, decision, forced);
        Ok(Assessment {
            probability,
            decision,
        })
    }
}

fn log_assessment(
    ctx: &PolicyContext,
    estimator: &str,
    probability: f64,
    decision: Decision,
    forced: bool,
) {
    if !tracing::enabled!(target: "liars_bot::assess", Level::DEBUG) {
        return;
    }

    event!(
        target: "liars_bot::assess",
        Level::DEBUG,
        observer = ctx.observer.name(),
        hand = %ctx.observer.hand(),
        bidder_dice = ctx.bidder_dice(),
        quantity = ctx.bid.quantity(),
        face = ctx.bid.face().value(),
        estimator,
        probability,
        decision = %decision,
        forced,
    );
}

#[cfg(test)]
mod tests {
    use super::ThresholdPolicy;
    use crate::policy::{Decision, Policy, PolicyContext};
    use liars_core::belief::{Estimator, HandCatalog};
    use liars_core::model::bid::Bid;
    use liars_core::model::hand::DiceHand;
    use liars_core::model::view::HandView;

    fn view(faces: &[u8], opponent: usize) -> HandView {
        HandView::new("Me", DiceHand::from_faces(faces).unwrap(), opponent).unwrap()
    }

    #[test]
    fn raises_on_bids_already_in_hand() {
        let catalog = HandCatalog::new();
        let observer = view(&[4, 4, 1], 3);
        for estimator in Estimator::ALL {
            let mut policy = ThresholdPolicy::new(estimator);
            let ctx = PolicyContext::new(&observer, Bid::new(2, 4).unwrap(), &catalog);
            let assessment = policy.assess(&ctx).unwrap();
            assert_eq!(assessment.decision, Decision::Raise);
            assert!((assessment.probability - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn challenges_at_threshold() {
        let catalog = HandCatalog::new();
        // 11/36 chance from two unseen dice.
        let observer = view(&[1, 1, 2], 2);
        let ctx = PolicyContext::new(&observer, Bid::new(3, 1).unwrap(), &catalog);
        let assessment = ThresholdPolicy::new(Estimator::Truthful)
            .assess(&ctx)
            .unwrap();
        assert_eq!(assessment.decision, Decision::Challenge);
        assert!(assessment.decision.is_challenge());
    }

    #[test]
    fn conditional_doubts_a_timid_opening() {
        let catalog = HandCatalog::new();
        // A bidder holding two 5s would not claim just one, which leaves 24/49.
        let observer = view(&[1, 2], 2);
        let ctx = PolicyContext::new(&observer, Bid::new(1, 5).unwrap(), &catalog);
        let assessment = ThresholdPolicy::new(Estimator::Conditional)
            .assess(&ctx)
            .unwrap();
        assert!((assessment.probability - 24.0 / 49.0).abs() < 1e-12);
        assert_eq!(assessment.decision, Decision::Challenge);
    }

    #[test]
    fn forced_challenge_when_board_is_exhausted() {
        let catalog = HandCatalog::new();
        let observer = view(&[6, 6], 1);
        let bid = Bid::new(3, 6).unwrap();
        let ctx = PolicyContext::new(&observer, bid, &catalog);
        assert_eq!(ctx.bidder_dice(), 1);
        let assessment = ThresholdPolicy::new(Estimator::Truthful)
            .assess(&ctx)
            .unwrap();
        // One in six, but the challenge is forced regardless of probability.
        assert!((assessment.probability - 1.0 / 6.0).abs() < 1e-9);
        assert_eq!(assessment.decision, Decision::Challenge);

        let held = view(&[6, 6, 6], 0);
        let ctx = PolicyContext::new(&held, bid, &catalog);
        let assessment = ThresholdPolicy::new(Estimator::Truthful)
            .assess(&ctx)
            .unwrap();
        assert_eq!(assessment.probability, 1.0);
        assert_eq!(assessment.decision, Decision::Challenge);
    }

    #[test]
    fn policies_are_boxable() {
        let catalog = HandCatalog::new();
        let observer = view(&[2, 3], 2);
        let mut policies: Vec<Box<dyn Policy>> = Estimator::ALL
            .into_iter()
            .map(|e| Box::new(ThresholdPolicy::new(e)) as Box<dyn Policy>)
            .collect();
        let ctx = PolicyContext::new(&observer, Bid::new(4, 5).unwrap(), &catalog);
        for policy in &mut policies {
            let assessment = policy.assess(&ctx).unwrap();
            assert_eq!(assessment.probability, 0.0);
            assert_eq!(assessment.decision, Decision::Challenge);
        }
    }
}
