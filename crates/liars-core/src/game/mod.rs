pub mod history;
pub mod state;

pub use history::{ActionKind, ActionRecord, RoundRecord};
pub use state::{ChallengeOutcome, GamePhase, GameState};
