use super::history::{ActionKind, ActionRecord, RoundRecord};
use crate::bidding;
use crate::error::{LiarsError, Result};
use crate::model::bid::{Bid, bid_holds};
use crate::model::player::PlayerSeat;
use crate::model::view::HandView;
use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Serialize;
use tracing::{Level, event};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum GamePhase {
    AwaitingBid { turn: PlayerSeat },
    AwaitingResponse { bid: Bid, responder: PlayerSeat },
    Terminal { winner: PlayerSeat, loser: PlayerSeat },
}

/// Result of resolving a challenge.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChallengeOutcome {
    pub round: u32,
    pub bid: Bid,
    pub bidder: String,
    pub challenger: String,
    pub successful: bool,
    pub winner: String,
    pub loser: String,
    pub remaining: [usize; 2],
    pub game_over: bool,
}

/// Two-player Liar's Dice game: both hands, turn order, and the round log.
#[derive(Debug, Clone)]
pub struct GameState {
    views: [HandView; 2],
    phase: GamePhase,
    round_number: u32,
    history: Vec<RoundRecord>,
    rng: StdRng,
    seed: u64,
}

impl GameState {
    pub fn new(first: HandView, second: HandView) -> Result<Self> {
        let seed: u64 = rand::random();
        Self::with_seed(first, second, seed)
    }

    /// Starts a game whose rerolls and bid sampling draw from `seed`. The first view opens.
    pub fn with_seed(first: HandView, second: HandView, seed: u64) -> Result<Self> {
        validate_pair(&first, &second)?;
        Ok(Self {
            views: [first, second],
            phase: GamePhase::AwaitingBid {
                turn: PlayerSeat::First,
            },
            round_number: 1,
            history: vec![RoundRecord::open(1)],
            rng: StdRng::seed_from_u64(seed),
            seed,
        })
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round_number(&self) -> u32 {
        self.round_number
    }

    pub fn history(&self) -> &[RoundRecord] {
        &self.history
    }

    pub fn is_over(&self) -> bool {
        matches!(self.phase, GamePhase::Terminal { .. })
    }

    pub fn players(&self) -> [&str; 2] {
        [self.views[0].name(), self.views[1].name()]
    }

    pub fn view(&self, seat: PlayerSeat) -> &HandView {
        &self.views[seat.index()]
    }

    /// Seat expected to act next, `None` once the game is over.
    pub fn turn_seat(&self) -> Option<PlayerSeat> {
        match self.phase {
            GamePhase::AwaitingBid { turn } => Some(turn),
            GamePhase::AwaitingResponse { responder, .. } => Some(responder),
            GamePhase::Terminal { .. } => None,
        }
    }

    pub fn turn(&self) -> Option<&str> {
        self.turn_seat().map(|seat| self.name_of(seat))
    }

    pub fn standing_bid(&self) -> Option<Bid> {
        match self.phase {
            GamePhase::AwaitingResponse { bid, .. } => Some(bid),
            _ => None,
        }
    }

    pub fn winner(&self) -> Option<&str> {
        match self.phase {
            GamePhase::Terminal { winner, .. } => Some(self.name_of(winner)),
            _ => None,
        }
    }

    pub fn loser(&self) -> Option<&str> {
        match self.phase {
            GamePhase::Terminal { loser, .. } => Some(self.name_of(loser)),
            _ => None,
        }
    }

    pub fn seat_of(&self, name: &str) -> Result<PlayerSeat> {
        PlayerSeat::BOTH
            .into_iter()
            .find(|seat| self.name_of(*seat) == name)
            .ok_or_else(|| LiarsError::InvalidPlayerName {
                name: name.to_string(),
                first: self.views[0].name().to_string(),
                second: self.views[1].name().to_string(),
            })
    }

    pub fn access_hand(&self, name: &str) -> Result<&HandView> {
        let seat = self.seat_of(name)?;
        Ok(self.view(seat))
    }

    /// Ground truth over both real hands.
    pub fn correct_bid(&self, bid: &Bid) -> bool {
        bid_holds(bid, self.views[0].hand(), self.views[1].hand())
    }

    /// Whether `name`'s own dice alone cover the bid.
    pub fn correct_bid_self(&self, name: &str, bid: &Bid) -> Result<bool> {
        let view = self.access_hand(name)?;
        Ok(view.quantity_of(bid.face()) as u32 >= bid.quantity())
    }

    /// Next bid `name` would make from their own view over the standing bid.
    pub fn construct_bid(&mut self, name: &str) -> Result<Bid> {
        let seat = self.seat_of(name)?;
        if self.is_over() {
            return Err(LiarsError::GameOver);
        }
        let previous = self.standing_bid();
        bidding::construct_bid(&self.views[seat.index()], previous.as_ref(), &mut self.rng)
    }

    pub fn declare_bid(&mut self, name: &str, bid: Bid) -> Result<()> {
        let seat = self.seat_of(name)?;
        match self.phase {
            GamePhase::Terminal { .. } => return Err(LiarsError::GameOver),
            GamePhase::AwaitingBid { turn } => self.ensure_turn(turn, seat)?,
            GamePhase::AwaitingResponse {
                bid: standing,
                responder,
            } => {
                self.ensure_turn(responder, seat)?;
                if !bid.outranks(&standing) {
                    return Err(LiarsError::BidNotRaised {
                        previous: standing,
                        bid,
                    });
                }
            }
        }

        let verdict = self.correct_bid(&bid);
        self.current_round_mut()
            .actions
            .push(ActionRecord::new(ActionKind::Bid, name, &bid, verdict));
        self.phase = GamePhase::AwaitingResponse {
            bid,
            responder: seat.other(),
        };

        event!(
            target: "liars_core::game",
            Level::DEBUG,
            round = self.round_number,
            bidder = name,
            quantity = bid.quantity(),
            face = bid.face().value(),
            correct = verdict,
            "bid declared"
        );
        Ok(())
    }

    /// Resolves a challenge of the standing bid by `name`.
    ///
    /// The loser's hand is rerolled one die smaller, the winner keeps their dice, and the
    /// loser opens the next round. The game ends once either hand is empty.
    pub fn challenge_bid(&mut self, bid: &Bid, name: &str) -> Result<ChallengeOutcome> {
        let challenger = self.seat_of(name)?;
        match self.phase {
            GamePhase::Terminal { .. } => return Err(LiarsError::GameOver),
            GamePhase::AwaitingBid { turn } => {
                self.ensure_turn(turn, challenger)?;
                return Err(LiarsError::NotStandingBid { bid: *bid });
            }
            GamePhase::AwaitingResponse {
                bid: standing,
                responder,
            } => {
                self.ensure_turn(responder, challenger)?;
                if standing != *bid {
                    return Err(LiarsError::NotStandingBid { bid: *bid });
                }
            }
        }

        let bid_correct = self.correct_bid(bid);
        let successful = !bid_correct;
        let loser = if bid_correct {
            challenger
        } else {
            challenger.other()
        };
        let winner = loser.other();

        let hands = PlayerSeat::BOTH.map(|seat| {
            let view = self.view(seat);
            (view.name().to_string(), *view.hand())
        });
        let winner_name = self.name_of(winner).to_string();
        let loser_name = self.name_of(loser).to_string();
        let round = self.current_round_mut();
        round.hands.extend(hands);
        round
            .actions
            .push(ActionRecord::new(ActionKind::Challenge, name, bid, successful));
        round.winner = Some(winner_name.clone());
        round.loser = Some(loser_name.clone());

        let rerolled = self.views[loser.index()].after_loss(&mut self.rng)?;
        let kept = self.views[winner.index()].after_opponent_loss()?;
        self.views[loser.index()] = rerolled;
        self.views[winner.index()] = kept;

        let round_number = self.round_number;
        self.round_number += 1;

        let remaining = [self.views[0].len(), self.views[1].len()];
        let game_over = remaining.contains(&0);
        if game_over {
            self.phase = GamePhase::Terminal { winner, loser };
        } else {
            self.phase = GamePhase::AwaitingBid { turn: loser };
            self.history.push(RoundRecord::open(self.round_number));
        }

        event!(
            target: "liars_core::game",
            Level::DEBUG,
            round = round_number,
            challenger = name,
            successful,
            winner = %winner_name,
            loser = %loser_name,
            first_remaining = remaining[0],
            second_remaining = remaining[1],
            game_over,
            "challenge resolved"
        );

        Ok(ChallengeOutcome {
            round: round_number,
            bid: *bid,
            bidder: self.name_of(challenger.other()).to_string(),
            challenger: name.to_string(),
            successful,
            winner: winner_name,
            loser: loser_name,
            remaining,
            game_over,
        })
    }

    /// Replaces both views wholesale, as when replaying externally recorded rounds.
    ///
    /// The standing bid is cleared and the player whose turn it was opens the round.
    pub fn override_hands(&mut self, first: HandView, second: HandView) -> Result<()> {
        let turn = match self.phase {
            GamePhase::Terminal { .. } => return Err(LiarsError::GameOver),
            GamePhase::AwaitingBid { turn } => turn,
            GamePhase::AwaitingResponse { responder, .. } => responder,
        };
        validate_pair(&first, &second)?;
        for (seat, view) in PlayerSeat::BOTH.into_iter().zip([&first, &second]) {
            if view.name() != self.name_of(seat) {
                return Err(LiarsError::InvalidPlayerName {
                    name: view.name().to_string(),
                    first: self.views[0].name().to_string(),
                    second: self.views[1].name().to_string(),
                });
            }
        }

        self.views = [first, second];
        self.phase = GamePhase::AwaitingBid { turn };
        Ok(())
    }

    fn name_of(&self, seat: PlayerSeat) -> &str {
        self.views[seat.index()].name()
    }

    fn ensure_turn(&self, expected: PlayerSeat, actual: PlayerSeat) -> Result<()> {
        if expected == actual {
            Ok(())
        } else {
            Err(LiarsError::IllegalTurn {
                expected: self.name_of(expected).to_string(),
                actual: self.name_of(actual).to_string(),
            })
        }
    }

    fn current_round_mut(&mut self) -> &mut RoundRecord {
        if self.history.last().map(|r| r.round) != Some(self.round_number) {
            self.history.push(RoundRecord::open(self.round_number));
        }
        let last = self.history.len() - 1;
        &mut self.history[last]
    }
}

fn validate_pair(first: &HandView, second: &HandView) -> Result<()> {
    if first.name() == second.name() {
        return Err(LiarsError::InvalidConfiguration(format!(
            "both players are named '{}'",
            first.name()
        )));
    }
    if first.len() != second.opponent_dice() || second.len() != first.opponent_dice() {
        return Err(LiarsError::InvalidConfiguration(format!(
            "inconsistent hand sizes: {} holds {} (seen as {}), {} holds {} (seen as {})",
            first.name(),
            first.len(),
            second.opponent_dice(),
            second.name(),
            second.len(),
            first.opponent_dice()
        )));
    }
    if first.is_empty() || second.is_empty() {
        return Err(LiarsError::InvalidConfiguration(
            "both players need at least one die to play".to_string(),
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{GamePhase, GameState};
    use crate::error::LiarsError;
    use crate::model::bid::Bid;
    use crate::model::hand::DiceHand;
    use crate::model::player::PlayerSeat;
    use crate::model::view::HandView;

    fn view(name: &str, faces: &[u8], opponent: usize) -> HandView {
        HandView::new(name, DiceHand::from_faces(faces).unwrap(), opponent).unwrap()
    }

    fn game(ann: &[u8], bob: &[u8]) -> GameState {
        GameState::with_seed(
            view("Ann", ann, bob.len()),
            view("Bob", bob, ann.len()),
            7,
        )
        .unwrap()
    }

    #[test]
    fn rejects_mismatched_configuration() {
        let err = GameState::with_seed(view("Ann", &[1, 2], 3), view("Bob", &[3, 4], 2), 1)
            .unwrap_err();
        assert!(matches!(err, LiarsError::InvalidConfiguration(_)));

        let err = GameState::with_seed(view("Ann", &[1], 1), view("Ann", &[2], 1), 1)
            .unwrap_err();
        assert!(matches!(err, LiarsError::InvalidConfiguration(_)));
    }

    #[test]
    fn first_player_opens_round_one() {
        let state = game(&[1, 2, 3], &[4, 5]);
        assert_eq!(state.turn(), Some("Ann"));
        assert_eq!(state.round_number(), 1);
        assert_eq!(state.seed(), 7);
        assert_eq!(state.history().len(), 1);
        assert!(!state.is_over());
    }

    #[test]
    fn bid_flips_turn_and_logs_ground_truth() {
        let mut state = game(&[1, 2, 3], &[3, 5]);
        let bid = Bid::new(2, 3).unwrap();
        state.declare_bid("Ann", bid).unwrap();

        assert_eq!(state.turn(), Some("Bob"));
        assert_eq!(state.standing_bid(), Some(bid));
        assert_eq!(state.round_number(), 1);
        let action = &state.history()[0].actions[0];
        assert_eq!(action.actor, "Ann");
        assert!(action.verdict);
    }

    #[test]
    fn rejects_out_of_turn_and_unknown_players() {
        let mut state = game(&[1, 2], &[3, 4]);
        let bid = Bid::new(1, 2).unwrap();
        assert!(matches!(
            state.declare_bid("Bob", bid),
            Err(LiarsError::IllegalTurn { .. })
        ));
        assert!(matches!(
            state.declare_bid("Cat", bid),
            Err(LiarsError::InvalidPlayerName { .. })
        ));
        state.declare_bid("Ann", bid).unwrap();
        assert!(matches!(
            state.challenge_bid(&bid, "Ann"),
            Err(LiarsError::IllegalTurn { .. })
        ));
        assert!(matches!(
            state.access_hand("Dan"),
            Err(LiarsError::InvalidPlayerName { .. })
        ));
    }

    #[test]
    fn raise_must_outrank_standing_bid() {
        let mut state = game(&[1, 2], &[3, 4]);
        state.declare_bid("Ann", Bid::new(2, 4).unwrap()).unwrap();
        assert!(matches!(
            state.declare_bid("Bob", Bid::new(2, 4).unwrap()),
            Err(LiarsError::BidNotRaised { .. })
        ));
        assert!(matches!(
            state.declare_bid("Bob", Bid::new(5, 3).unwrap()),
            Err(LiarsError::BidNotRaised { .. })
        ));
        state.declare_bid("Bob", Bid::new(1, 5).unwrap()).unwrap();
        assert_eq!(state.turn(), Some("Ann"));
    }

    #[test]
    fn challenge_requires_the_standing_bid() {
        let mut state = game(&[1, 2], &[3, 4]);
        let bid = Bid::new(1, 2).unwrap();
        assert!(matches!(
            state.challenge_bid(&bid, "Ann"),
            Err(LiarsError::NotStandingBid { .. })
        ));
        state.declare_bid("Ann", bid).unwrap();
        assert!(matches!(
            state.challenge_bid(&Bid::new(3, 2).unwrap(), "Bob"),
            Err(LiarsError::NotStandingBid { .. })
        ));
    }

    #[test]
    fn failed_challenge_costs_challenger_a_die() {
        let mut state = game(&[2, 2, 5], &[2, 6]);
        let bid = Bid::new(3, 2).unwrap();
        state.declare_bid("Ann", bid).unwrap();
        let outcome = state.challenge_bid(&bid, "Bob").unwrap();

        assert!(!outcome.successful);
        assert_eq!(outcome.winner, "Ann");
        assert_eq!(outcome.loser, "Bob");
        assert_eq!(outcome.bidder, "Ann");
        assert_eq!(outcome.remaining, [3, 1]);
        assert_eq!(state.round_number(), 2);
        // Loser opens the next round.
        assert_eq!(state.turn(), Some("Bob"));
        // Winner keeps their dice; both views see the new sizes.
        assert_eq!(
            state.access_hand("Ann").unwrap().hand(),
            &DiceHand::from_faces(&[2, 2, 5]).unwrap()
        );
        assert_eq!(state.access_hand("Ann").unwrap().opponent_dice(), 1);
        assert_eq!(state.access_hand("Bob").unwrap().opponent_dice(), 3);

        let sealed = &state.history()[0];
        assert_eq!(sealed.winner.as_deref(), Some("Ann"));
        assert_eq!(sealed.hands["Bob"], DiceHand::from_faces(&[2, 6]).unwrap());
        assert!(!sealed.challenge().unwrap().verdict);
        assert_eq!(state.history()[1].round, 2);
    }

    #[test]
    fn successful_challenge_costs_bidder_a_die() {
        let mut state = game(&[1, 1], &[3, 3]);
        let bid = Bid::new(3, 4).unwrap();
        state.declare_bid("Ann", bid).unwrap();
        let outcome = state.challenge_bid(&bid, "Bob").unwrap();
        assert!(outcome.successful);
        assert_eq!(outcome.loser, "Ann");
        assert_eq!(state.turn(), Some("Ann"));
        assert_eq!(state.access_hand("Ann").unwrap().len(), 1);
    }

    #[test]
    fn every_challenge_removes_exactly_one_die() {
        let mut state = game(&[1, 2, 3, 4, 5], &[6, 6, 5, 4, 3]);
        while !state.is_over() {
            let before: usize = PlayerSeat::BOTH.iter().map(|s| state.view(*s).len()).sum();
            let opener = state.turn().unwrap().to_string();
            let bid = state.construct_bid(&opener).unwrap();
            state.declare_bid(&opener, bid).unwrap();
            let responder = state.turn().unwrap().to_string();
            state.challenge_bid(&bid, &responder).unwrap();
            let after: usize = PlayerSeat::BOTH.iter().map(|s| state.view(*s).len()).sum();
            assert_eq!(before - 1, after);
        }
    }

    #[test]
    fn game_ends_when_a_hand_is_empty() {
        let mut state = game(&[4], &[1, 2]);
        let bid = Bid::new(2, 4).unwrap();
        state.declare_bid("Ann", bid).unwrap();
        let outcome = state.challenge_bid(&bid, "Bob").unwrap();

        assert!(outcome.game_over);
        assert!(state.is_over());
        assert_eq!(state.winner(), Some("Bob"));
        assert_eq!(state.loser(), Some("Ann"));
        assert_eq!(state.turn(), None);
        assert!(matches!(
            state.phase(),
            GamePhase::Terminal {
                winner: PlayerSeat::Second,
                loser: PlayerSeat::First
            }
        ));
        assert!(matches!(
            state.declare_bid("Ann", Bid::new(3, 4).unwrap()),
            Err(LiarsError::GameOver)
        ));
        assert!(matches!(state.construct_bid("Bob"), Err(LiarsError::GameOver)));
        assert_eq!(state.history().len(), 1);
    }

    #[test]
    fn self_check_looks_at_one_hand() {
        let state = game(&[5, 5], &[5, 1]);
        let bid = Bid::new(3, 5).unwrap();
        assert!(state.correct_bid(&bid));
        assert!(!state.correct_bid_self("Ann", &bid).unwrap());
        assert!(state.correct_bid_self("Ann", &Bid::new(2, 5).unwrap()).unwrap());
    }

    #[test]
    fn override_replaces_hands_and_clears_standing_bid() {
        let mut state = game(&[1, 2], &[3, 4]);
        state.declare_bid("Ann", Bid::new(1, 2).unwrap()).unwrap();
        state
            .override_hands(view("Ann", &[6, 6], 2), view("Bob", &[6, 1], 2))
            .unwrap();

        assert_eq!(state.standing_bid(), None);
        assert_eq!(state.turn(), Some("Bob"));
        assert!(state.correct_bid(&Bid::new(3, 6).unwrap()));

        let err = state
            .override_hands(view("Ann", &[6], 2), view("Bob", &[6, 1], 2))
            .unwrap_err();
        assert!(matches!(err, LiarsError::InvalidConfiguration(_)));
        let err = state
            .override_hands(view("Cat", &[6], 1), view("Bob", &[6], 1))
            .unwrap_err();
        assert!(matches!(err, LiarsError::InvalidPlayerName { .. }));
    }
}
