//! Replays externally recorded games through the game state machine.
//!
//! Recorded games are a JSON array of games, each a list of rounds holding both players'
//! dice and the ordered actions. The actor of the first action of round one opens the game.

use std::collections::BTreeMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use liars_core::LiarsError;
use liars_core::game::{ActionKind, GameState};
use liars_core::model::bid::Bid;
use liars_core::model::hand::DiceHand;
use liars_core::model::view::HandView;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedGame {
    pub rounds: Vec<RecordedRound>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedRound {
    /// Die values per player name.
    pub hands: BTreeMap<String, Vec<u8>>,
    pub actions: Vec<RecordedAction>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordedAction {
    pub kind: ActionKind,
    pub actor: String,
    pub quantity: u32,
    pub face: u8,
}

impl RecordedGame {
    /// Captures a played game's sealed rounds in the recorded format.
    pub fn capture(state: &GameState) -> Self {
        let rounds = state
            .history()
            .iter()
            .filter(|round| round.is_sealed())
            .map(|round| RecordedRound {
                hands: round
                    .hands
                    .iter()
                    .map(|(name, hand)| {
                        let faces = hand.faces().iter().map(|face| face.value()).collect();
                        (name.clone(), faces)
                    })
                    .collect(),
                actions: round
                    .actions
                    .iter()
                    .map(|action| RecordedAction {
                        kind: action.kind,
                        actor: action.actor.clone(),
                        quantity: action.quantity,
                        face: action.face.value(),
                    })
                    .collect(),
            })
            .collect();
        Self { rounds }
    }

    /// Opening player followed by the other player.
    pub fn players(&self) -> Result<[String; 2], ReplayError> {
        let first = self.rounds.first().ok_or_else(|| malformed(0, "game has no rounds"))?;
        let opener = first
            .actions
            .first()
            .map(|action| action.actor.clone())
            .ok_or_else(|| malformed(1, "first round has no actions"))?;
        if first.hands.len() != 2 || !first.hands.contains_key(&opener) {
            return Err(malformed(
                1,
                format!("expected hands for '{opener}' and one opponent"),
            ));
        }
        let other = first
            .hands
            .keys()
            .find(|name| **name != opener)
            .cloned()
            .ok_or_else(|| malformed(1, "missing opponent hand"))?;
        Ok([opener, other])
    }
}

pub fn load_games(path: impl AsRef<Path>) -> Result<Vec<RecordedGame>, ReplayError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| ReplayError::Read {
        source,
        path: path.to_path_buf(),
    })?;
    serde_json::from_reader(BufReader::new(file)).map_err(|source| ReplayError::Parse {
        source,
        path: path.to_path_buf(),
    })
}

/// Rebuilds a game from its recording, replacing both hands at the start of every round.
pub fn replay_game(recorded: &RecordedGame, seed: u64) -> Result<GameState, ReplayError> {
    let players = recorded.players()?;
    let mut state: Option<GameState> = None;

    for (index, round) in recorded.rounds.iter().enumerate() {
        let number = index as u32 + 1;
        let [first, second] = round_views(round, &players, number)?;
        let game = match state.take() {
            Some(mut game) => {
                game.override_hands(first, second)
                    .map_err(|source| ReplayError::Game { round: number, source })?;
                game
            }
            None => GameState::with_seed(first, second, seed)
                .map_err(|source| ReplayError::Game { round: number, source })?,
        };
        let game = state.insert(game);

        for action in &round.actions {
            let bid = Bid::new(action.quantity, action.face)
                .map_err(|source| ReplayError::Game { round: number, source })?;
            let applied = match action.kind {
                ActionKind::Bid => game.declare_bid(&action.actor, bid),
                ActionKind::Challenge => game.challenge_bid(&bid, &action.actor).map(|_| ()),
            };
            applied.map_err(|source| ReplayError::Game { round: number, source })?;
        }
    }

    state.ok_or_else(|| malformed(0, "game has no rounds"))
}

fn round_views(
    round: &RecordedRound,
    players: &[String; 2],
    number: u32,
) -> Result<[HandView; 2], ReplayError> {
    let hands = players
        .iter()
        .map(|name| {
            let faces = round
                .hands
                .get(name)
                .ok_or_else(|| malformed(number, format!("no hand recorded for '{name}'")))?;
            DiceHand::from_faces(faces).map_err(|source| ReplayError::Game {
                round: number,
                source,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    let first = HandView::new(players[0].clone(), hands[0], hands[1].len());
    let second = HandView::new(players[1].clone(), hands[1], hands[0].len());
    match (first, second) {
        (Ok(first), Ok(second)) => Ok([first, second]),
        (Err(source), _) | (_, Err(source)) => Err(ReplayError::Game {
            round: number,
            source,
        }),
    }
}

fn malformed(round: u32, message: impl Into<String>) -> ReplayError {
    ReplayError::Malformed {
        round,
        message: message.into(),
    }
}

#[derive(Debug, Error)]
pub enum ReplayError {
    #[error("failed to read recorded games {path:?}: {source}")]
    Read {
        #[source]
        source: std::io::Error,
        path: PathBuf,
    },
    #[error("failed to parse recorded games {path:?}: {source}")]
    Parse {
        #[source]
        source: serde_json::Error,
        path: PathBuf,
    },
    #[error("malformed recording at round {round}: {message}")]
    Malformed { round: u32, message: String },
    #[error("round {round} could not be replayed: {source}")]
    Game {
        round: u32,
        #[source]
        source: LiarsError,
    },
}
