use crate::error::Result;
use crate::model::bid::Bid;
use crate::model::face::Face;
use crate::model::hand::DiceHand;
use core::fmt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ActionKind {
    Bid,
    Challenge,
}

impl ActionKind {
    pub const fn as_str(self) -> &'static str {
        match self {
            ActionKind::Bid => "Bid",
            ActionKind::Challenge => "Challenge",
        }
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One logged action.
///
/// For a bid, `verdict` is whether the bid holds on the true board. For a challenge it is
/// whether the challenge succeeded, i.e. the challenged bid did not hold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionRecord {
    pub kind: ActionKind,
    pub actor: String,
    pub quantity: u32,
    pub face: Face,
    pub verdict: bool,
}

impl ActionRecord {
    pub(crate) fn new(kind: ActionKind, actor: &str, bid: &Bid, verdict: bool) -> Self {
        Self {
            kind,
            actor: actor.to_string(),
            quantity: bid.quantity(),
            face: bid.face(),
            verdict,
        }
    }

    pub fn bid(&self) -> Result<Bid> {
        Bid::with_face(self.quantity, self.face)
    }

    pub fn is_challenge(&self) -> bool {
        self.kind == ActionKind::Challenge
    }
}

/// Log of one round. Hands, winner and loser are filled in when a challenge seals it.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RoundRecord {
    pub round: u32,
    pub hands: BTreeMap<String, DiceHand>,
    pub actions: Vec<ActionRecord>,
    pub winner: Option<String>,
    pub loser: Option<String>,
}

impl RoundRecord {
    pub(crate) fn open(round: u32) -> Self {
        Self {
            round,
            ..Self::default()
        }
    }

    pub fn is_sealed(&self) -> bool {
        self.winner.is_some()
    }

    pub fn bids(&self) -> impl Iterator<Item = &ActionRecord> {
        self.actions
            .iter()
            .filter(|action| action.kind == ActionKind::Bid)
    }

    pub fn challenge(&self) -> Option<&ActionRecord> {
        self.actions.iter().find(|action| action.is_challenge())
    }

    pub fn hand_of(&self, name: &str) -> Option<&DiceHand> {
        self.hands.get(name)
    }

    /// Combined dice on the board when the round was sealed.
    pub fn board_size(&self) -> usize {
        self.hands.values().map(DiceHand::len).sum()
    }
}

impl fmt::Display for RoundRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Round {}:", self.round)?;
        for (name, hand) in &self.hands {
            writeln!(f, "\t{name}: {hand}")?;
        }
        for action in &self.actions {
            writeln!(
                f,
                "\t[{}, {}, {}, {}, {}]",
                action.kind, action.actor, action.quantity, action.face, action.verdict
            )?;
        }
        write!(
            f,
            "\tWinner: {}, Loser: {}",
            self.winner.as_deref().unwrap_or("-"),
            self.loser.as_deref().unwrap_or("-")
        )
    }
}
