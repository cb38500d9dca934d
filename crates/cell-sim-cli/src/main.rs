use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use cell_sim_core::{
    BestBrainRecord, ElitistPopulation, FeedForwardBrain, RunSummary, SimConfig, World,
};
use clap::Parser;
use serde::Serialize;
use tracing::{info, warn};

#[derive(Parser, Debug)]
#[command(
    name = "cell-sim",
    version,
    about = "Run a headless neuro-evolution cell simulation"
)]
struct Cli {
    /// JSON configuration file; omitted fields keep their defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Override the configured seed.
    #[arg(long)]
    seed: Option<u64>,

    /// Number of ticks to simulate.
    #[arg(long, default_value_t = 10_000)]
    steps: usize,

    /// Metrics sampling interval in ticks.
    #[arg(long, default_value_t = 100)]
    sample_every: usize,

    /// Write the run summary as JSON.
    #[arg(long)]
    summary: Option<PathBuf>,

    /// Write the fittest brain as JSON.
    #[arg(long)]
    save_best: Option<PathBuf>,

    /// Seed the first generation from a brain written by `--save-best`.
    #[arg(long)]
    load: Option<PathBuf>,
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

fn load_config(cli: &Cli) -> Result<SimConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let text = fs::read_to_string(path)
                .with_context(|| format!("failed to read config {}", path.display()))?;
            SimConfig::from_json(&text)
                .with_context(|| format!("invalid config {}", path.display()))?
        }
        None => SimConfig::default(),
    };
    if let Some(seed) = cli.seed {
        config.seed = seed;
    }
    Ok(config)
}

fn load_population(path: &Path, config: &SimConfig) -> Result<ElitistPopulation> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("failed to read saved brain {}", path.display()))?;
    let record: BestBrainRecord<FeedForwardBrain> = serde_json::from_str(&text)
        .with_context(|| format!("invalid saved brain {}", path.display()))?;
    info!(
        path = %path.display(),
        brain = record.brain_id,
        generation = record.generation,
        fitness = record.fitness,
        "saved brain loaded"
    );
    Ok(ElitistPopulation::from_saved(record.brain, config))
}

fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))
}

fn print_report(summary: &RunSummary) {
    println!(
        "{:>5} {:>6} {:>6} {:>6} {:>12} {:>12}",
        "gen", "ticks", "cells", "meals", "best", "mean"
    );
    for generation in &summary.generations {
        println!(
            "{:>5} {:>6} {:>6} {:>6} {:>12.2} {:>12.2}",
            generation.generation,
            generation.ticks,
            generation.cells,
            generation.meals,
            generation.best_fitness,
            generation.fitness_mean
        );
    }
    println!(
        "seed {} | {} ticks | generation {} | {} alive",
        summary.seed, summary.steps, summary.final_generation, summary.final_alive_count
    );
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let population = match &cli.load {
        Some(path) => load_population(path, &config)?,
        None => ElitistPopulation::from_seed(&config),
    };
    let mut world = World::try_new(config, population)?;
    info!(
        seed = world.config().seed,
        cells = world.alive_count(),
        foods = world.foods().len(),
        "world ready"
    );

    let summary = world.try_run_experiment(cli.steps, cli.sample_every)?;
    print_report(&summary);

    if let Some(path) = &cli.summary {
        write_json(path, &summary)?;
        info!(path = %path.display(), "summary written");
    }
    if let Some(path) = &cli.save_best {
        match world.best_brain_record() {
            Some(record) => {
                write_json(path, &record)?;
                info!(
                    path = %path.display(),
                    brain = record.brain_id,
                    fitness = record.fitness,
                    "best brain written"
                );
            }
            None => warn!("no generation has finished; best brain not written"),
        }
    }
    Ok(())
}
