use std::path::PathBuf;

use clap::Parser;

use liars_bench::config::{BenchmarkConfig, ResolvedOutputs};
use liars_bench::logging::init_logging;
use liars_bench::simulation::SimulationRunner;

/// Simulation and analytics harness for two-player Liar's Dice.
#[derive(Debug, Parser)]
#[command(
    name = "liars-bench",
    author,
    version,
    about = "Deterministic Liar's Dice simulation harness"
)]
struct Cli {
    /// Path to the YAML configuration file.
    #[arg(short, long, value_name = "FILE", default_value = "bench/bench.yaml")]
    config: PathBuf,

    /// Override the run identifier (substitutes {run_id} templates).
    #[arg(long, value_name = "RUN_ID")]
    run_id: Option<String>,

    /// Override the number of games to simulate.
    #[arg(long, value_name = "GAMES")]
    games: Option<usize>,

    /// Override the RNG seed for game generation.
    #[arg(long, value_name = "SEED")]
    seed: Option<u64>,

    /// Replay recorded games from a JSON file after the simulated ones.
    #[arg(long, value_name = "FILE")]
    replay: Option<PathBuf>,

    /// Exit after validating the configuration (no games are played).
    #[arg(long)]
    validate_only: bool,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let mut config = BenchmarkConfig::from_path(&cli.config)?;

    if let Some(run_id) = cli.run_id {
        config.run_id = run_id;
    }

    if let Some(games) = cli.games {
        config.games.count = games;
    }

    if let Some(seed) = cli.seed {
        config.games.seed = Some(seed);
    }

    if let Some(replay) = cli.replay {
        config.replay = Some(replay);
    }

    config.validate()?;

    let outputs: ResolvedOutputs = config.resolved_outputs();
    let run_id = config.run_id.clone();
    let games = config.games.count;
    let dice = config.games.starting_dice;
    let [first, second] = [&config.players[0], &config.players[1]];

    println!(
        "Loaded configuration '{run_id}': {} ({}) vs {} ({}), {games} games of {dice} dice",
        first.name, first.estimator, second.name, second.estimator
    );

    let _logging_guard = init_logging(&config.logging, &outputs, &run_id)?;
    let runner = SimulationRunner::new(config, outputs)?;

    if cli.validate_only {
        println!("Validation-only mode: simulation skipped.");
        return Ok(());
    }

    let summary = runner.run()?;
    println!(
        "Run complete for '{run_id}': {} simulated + {} replayed games → {} rounds at {}",
        summary.games_played,
        summary.games_replayed,
        summary.rounds_written,
        summary.jsonl_path.display()
    );
    println!("Summary table: {}", summary.summary_path.display());
    if let Some(telemetry_path) = summary.telemetry_path.as_ref() {
        println!("Telemetry log: {}", telemetry_path.display());
    }

    Ok(())
}
