mod seating;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use liars_bot::policy::{Policy, PolicyContext, ThresholdPolicy};
use liars_core::LiarsError;
use liars_core::belief::{Estimator, HandCatalog};
use liars_core::game::{GameState, RoundRecord};
use liars_core::model::view::HandView;
use rand::{RngCore, SeedableRng, rngs::StdRng};
use serde::Serialize;
use thiserror::Error;
use tracing::{Level, event};

use crate::analytics::{AnalyticsCollector, AnalyticsError, GameSource};
use crate::config::{BenchmarkConfig, PlayerConfig, ResolvedOutputs};
use crate::logging::telemetry_dir;
use crate::replay::{ReplayError, load_games, replay_game};

use seating::OpeningOrder;

/// Upper bound on bids and challenges in one simulated game.
const MAX_ACTIONS_PER_GAME: usize = 10_000;

/// Plays the configured games, replays any recorded ones, and writes the round log.
pub struct SimulationRunner {
    config: BenchmarkConfig,
    outputs: ResolvedOutputs,
    players: Vec<PlayerBlueprint>,
    opening_order: OpeningOrder,
    catalog: HandCatalog,
    logging_enabled: bool,
}

/// Summary details returned after a run.
pub struct RunSummary {
    pub games_played: usize,
    pub games_replayed: usize,
    pub rounds_written: usize,
    pub jsonl_path: PathBuf,
    pub summary_path: PathBuf,
    pub telemetry_path: Option<PathBuf>,
}

impl SimulationRunner {
    /// Build a runner from a validated configuration.
    pub fn new(config: BenchmarkConfig, outputs: ResolvedOutputs) -> Result<Self, RunnerError> {
        let players = PlayerBlueprint::from_configs(&config.players);
        if players.len() != 2 {
            return Err(RunnerError::PlayerCount {
                found: players.len(),
            });
        }

        let catalog = HandCatalog::new();
        catalog.precompute()?;

        Ok(Self {
            logging_enabled: config.logging.enable_structured,
            opening_order: OpeningOrder::new(config.games.alternate_openers),
            config,
            outputs,
            players,
            catalog,
        })
    }

    /// Execute the run, streaming one JSONL row per completed round.
    pub fn run(&self) -> Result<RunSummary, RunnerError> {
        ensure_parent(self.outputs.jsonl.parent())?;
        ensure_parent(self.outputs.summary_md.parent())?;

        let mut writer = BufWriter::new(File::create(&self.outputs.jsonl)?);
        let mut rng = StdRng::seed_from_u64(self.config.games.seed.unwrap_or(0));
        let mut analytics = AnalyticsCollector::new(&self.config.players);
        let mut rounds_written = 0usize;

        for game_index in 0..self.config.games.count {
            let game_seed = rng.next_u64();
            let state = self.play_game(game_index, game_seed)?;
            analytics.record_game(GameSource::Simulated, &state, &self.catalog)?;
            rounds_written += write_game_rows(
                &mut writer,
                &self.config.run_id,
                GameSource::Simulated,
                game_index,
                game_seed,
                &state,
            )?;
        }

        let mut games_replayed = 0usize;
        if let Some(path) = self.config.replay.as_ref() {
            for (game_index, recorded) in load_games(path)?.iter().enumerate() {
                let game_seed = rng.next_u64();
                let state = replay_game(recorded, game_seed)?;
                analytics.record_game(GameSource::Recorded, &state, &self.catalog)?;
                rounds_written += write_game_rows(
                    &mut writer,
                    &self.config.run_id,
                    GameSource::Recorded,
                    game_index,
                    game_seed,
                    &state,
                )?;
                games_replayed += 1;
            }
        }

        writer.flush()?;

        let summary = analytics.finalize();
        summary.write_markdown(&self.outputs.summary_md)?;

        let telemetry_path = self
            .logging_enabled
            .then(|| telemetry_dir(&self.outputs).join("telemetry.jsonl"));

        Ok(RunSummary {
            games_played: self.config.games.count,
            games_replayed,
            rounds_written,
            jsonl_path: self.outputs.jsonl.clone(),
            summary_path: self.outputs.summary_md.clone(),
            telemetry_path,
        })
    }

    fn play_game(&self, game_index: usize, game_seed: u64) -> Result<GameState, RunnerError> {
        let dice = self.config.games.starting_dice;
        let mut rng = StdRng::seed_from_u64(game_seed);
        let seats = self.opening_order.seats(game_index);
        let [opener, other] = seats.map(|index| &self.players[index]);

        let first = HandView::rolled(opener.name.clone(), dice, dice, &mut rng)?;
        let second = HandView::rolled(other.name.clone(), dice, dice, &mut rng)?;
        let mut state = GameState::with_seed(first, second, rng.next_u64())?;
        let mut policies = [opener.spawn_policy(), other.spawn_policy()];

        let mut actions = 0usize;
        while let Some(seat) = state.turn_seat() {
            actions += 1;
            if actions > MAX_ACTIONS_PER_GAME {
                return Err(RunnerError::game(format!(
                    "game {game_index} exceeded {MAX_ACTIONS_PER_GAME} actions"
                )));
            }

            let name = state.view(seat).name().to_string();
            let Some(standing) = state.standing_bid() else {
                let bid = state.construct_bid(&name)?;
                state.declare_bid(&name, bid)?;
                continue;
            };

            let assessment = {
                let ctx = PolicyContext::new(state.view(seat), standing, &self.catalog);
                policies[seat.index()].assess(&ctx)?
            };

            if !assessment.decision.is_challenge() {
                let raise = state.construct_bid(&name)?;
                state.declare_bid(&name, raise)?;
                continue;
            }

            let outcome = state.challenge_bid(&standing, &name)?;
            if self.logging_enabled && tracing::enabled!(Level::INFO) {
                event!(
                    target: "liars_bench::challenge",
                    Level::INFO,
                    run_id = %self.config.run_id,
                    game_index = game_index as u32,
                    round = outcome.round,
                    bid = %outcome.bid,
                    bidder = %outcome.bidder,
                    challenger = %outcome.challenger,
                    probability = assessment.probability,
                    successful = outcome.successful,
                    loser = %outcome.loser
                );
            }
        }

        if self.logging_enabled {
            event!(
                target: "liars_bench::game",
                Level::INFO,
                run_id = %self.config.run_id,
                game_index = game_index as u32,
                game_seed,
                rounds = state.history().len() as u32,
                winner = state.winner().unwrap_or_default(),
                "game complete"
            );
        }

        Ok(state)
    }
}

fn ensure_parent(path: Option<&Path>) -> Result<(), RunnerError> {
    if let Some(dir) = path.filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(dir)?;
    }
    Ok(())
}

fn write_game_rows(
    writer: &mut BufWriter<File>,
    run_id: &str,
    source: GameSource,
    game_index: usize,
    game_seed: u64,
    state: &GameState,
) -> Result<usize, RunnerError> {
    let prefix = match source {
        GameSource::Simulated => 'S',
        GameSource::Recorded => 'R',
    };
    let game_id = format!("{prefix}{game_index:05}");

    let mut rows_written = 0usize;
    for round in state.history().iter().filter(|round| round.is_sealed()) {
        let row = RoundLogRow {
            run_id,
            source,
            game_id: &game_id,
            game_index,
            game_seed,
            total_dice: round.board_size(),
            bids: round.bids().count(),
            round,
        };

        serde_json::to_writer(&mut *writer, &row)?;
        writer.write_all(b"\n")?;
        rows_written += 1;
    }

    Ok(rows_written)
}

#[derive(Serialize)]
struct RoundLogRow<'a> {
    run_id: &'a str,
    source: GameSource,
    game_id: &'a str,
    game_index: usize,
    game_seed: u64,
    total_dice: usize,
    bids: usize,
    #[serde(flatten)]
    round: &'a RoundRecord,
}

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
    #[error("failed to serialize log row: {source}")]
    Serialize {
        #[from]
        source: serde_json::Error,
    },
    #[error("game rules rejected an action: {0}")]
    Rules(#[from] LiarsError),
    #[error("game execution failed: {message}")]
    Game { message: String },
    #[error("configuration requires exactly 2 players but found {found}")]
    PlayerCount { found: usize },
    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),
    #[error("analytics error: {0}")]
    Analytics(#[from] AnalyticsError),
}

impl RunnerError {
    fn game(message: String) -> Self {
        RunnerError::Game { message }
    }
}

struct PlayerBlueprint {
    name: String,
    estimator: Estimator,
}

impl PlayerBlueprint {
    fn from_configs(configs: &[PlayerConfig]) -> Vec<Self> {
        configs
            .iter()
            .map(|config| Self {
                name: config.name.clone(),
                estimator: config.estimator,
            })
            .collect()
    }

    fn spawn_policy(&self) -> Box<dyn Policy> {
        Box::new(ThresholdPolicy::new(self.estimator))
    }
}
