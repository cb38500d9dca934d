pub mod metrics;
pub mod step;

pub use metrics::*;
pub use step::StepReport;

use crate::brain::Brain;
use crate::cell::Cell;
use crate::config::{SimConfig, SimConfigError};
use crate::food::{self, Food};
use crate::geometry::Arena;
use crate::lifecycle::LifecycleRules;
use crate::motion::MotionLimits;
use crate::perception::PerceptionError;
use crate::population::{Population, PopulationError};
use rand::SeedableRng;
use rand_chacha::ChaCha12Rng;
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum WorldInitError {
    #[error(transparent)]
    Config(#[from] SimConfigError),
    #[error("population handed out an empty pool")]
    EmptyPool,
}

#[derive(Debug, Error)]
pub enum StepError {
    #[error("perception failed for cell {cell}: {source}")]
    Perception {
        cell: u64,
        #[source]
        source: PerceptionError,
    },
    #[error(transparent)]
    Population(#[from] PopulationError),
    #[error("population returned an empty pool for generation {generation}")]
    EmptyPool { generation: u32 },
}

#[derive(Debug, Error)]
pub enum ExperimentError {
    #[error("sample_every must be positive")]
    InvalidSampleEvery,
    #[error("steps ({actual}) exceed supported maximum ({max})")]
    TooManySteps { max: usize, actual: usize },
    #[error(transparent)]
    Step(#[from] StepError),
}

/// Controller state. `Regenerating` only exists inside a tick that empties the world.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EpochPhase {
    Running,
    Regenerating,
}

/// Epoch controller: owns the live cells, the food set and the population.
pub struct World<P: Population> {
    pub(crate) config: SimConfig,
    pub(crate) arena: Arena,
    pub(crate) limits: MotionLimits,
    pub(crate) rules: LifecycleRules,
    pub(crate) population: P,
    pub(crate) cells: Vec<Cell<P::Brain>>,
    pub(crate) foods: Vec<Food>,
    pub(crate) rng: ChaCha12Rng,
    pub(crate) phase: EpochPhase,
    /// Ticks elapsed in the current generation.
    pub(crate) tick: usize,
    pub(crate) total_ticks: usize,
    pub(crate) generation: u32,
    pub(crate) next_cell_id: u64,
    pub(crate) food_regenerations: usize,
    pub(crate) tally: GenerationTally,
    pub(crate) history: Vec<GenerationSummary>,
}

impl<P: Population> World<P> {
    pub const MAX_EXPERIMENT_STEPS: usize = 10_000_000;

    pub fn new(config: SimConfig, population: P) -> Self {
        Self::try_new(config, population).unwrap_or_else(|e| panic!("{e}"))
    }

    /// Validate `config`, take the population's first pool and seed the arena.
    pub fn try_new(config: SimConfig, mut population: P) -> Result<Self, WorldInitError> {
        config.validate()?;
        let pool = population.take_pool();
        if pool.is_empty() {
            return Err(WorldInitError::EmptyPool);
        }
        let arena = config.arena();
        let mut world = Self {
            arena,
            limits: MotionLimits::from_config(&config),
            rules: LifecycleRules::from_config(&config),
            population,
            cells: Vec::with_capacity(pool.len()),
            foods: Vec::with_capacity(config.food_count),
            rng: ChaCha12Rng::seed_from_u64(config.seed),
            phase: EpochPhase::Running,
            tick: 0,
            total_ticks: 0,
            generation: 0,
            next_cell_id: 0,
            food_regenerations: 0,
            tally: GenerationTally::default(),
            history: Vec::new(),
            config,
        };
        world.populate(pool);
        world.foods = world.fresh_food();
        Ok(world)
    }

    /// One fresh cell per brain at random positions.
    pub(crate) fn populate(&mut self, pool: Vec<P::Brain>) {
        self.cells.clear();
        for brain in pool {
            let id = self.next_cell_id;
            self.next_cell_id += 1;
            self.cells
                .push(Cell::spawn(id, brain, &self.config, &self.arena, &mut self.rng));
        }
        self.tally.cells_spawned += self.cells.len();
    }

    pub(crate) fn fresh_food(&mut self) -> Vec<Food> {
        food::generate_food(
            self.config.food_count,
            self.config.food_energy,
            &self.arena,
            &mut self.rng,
        )
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn arena(&self) -> &Arena {
        &self.arena
    }

    pub fn cells(&self) -> &[Cell<P::Brain>] {
        &self.cells
    }

    pub fn foods(&self) -> &[Food] {
        &self.foods
    }

    pub fn population(&self) -> &P {
        &self.population
    }

    pub fn phase(&self) -> EpochPhase {
        self.phase
    }

    pub fn alive_count(&self) -> usize {
        self.cells.len()
    }

    /// Ticks elapsed in the current generation.
    pub fn tick(&self) -> usize {
        self.tick
    }

    pub fn total_ticks(&self) -> usize {
        self.total_ticks
    }

    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Number of times the food set was rebuilt for a new generation.
    pub fn food_regenerations(&self) -> usize {
        self.food_regenerations
    }

    /// Summaries of every completed generation, oldest first.
    pub fn history(&self) -> &[GenerationSummary] {
        &self.history
    }

    /// Snapshot of the population's best brain for persistence.
    pub fn best_brain_record(&self) -> Option<BestBrainRecord<P::Brain>>
    where
        P::Brain: Clone,
    {
        let brain = self.population.best()?.clone();
        let timestamp_secs = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| d.as_secs())
            .unwrap_or(0);
        Some(BestBrainRecord {
            generation: self.population.generation(),
            timestamp_secs,
            brain_id: brain.id(),
            fitness: brain.fitness(),
            brain,
        })
    }

    pub fn run_experiment(&mut self, steps: usize, sample_every: usize) -> RunSummary {
        self.try_run_experiment(steps, sample_every)
            .unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance `steps` ticks, sampling metrics every `sample_every` ticks and
    /// after the final one.
    pub fn try_run_experiment(
        &mut self,
        steps: usize,
        sample_every: usize,
    ) -> Result<RunSummary, ExperimentError> {
        if sample_every == 0 {
            return Err(ExperimentError::InvalidSampleEvery);
        }
        if steps > Self::MAX_EXPERIMENT_STEPS {
            return Err(ExperimentError::TooManySteps {
                max: Self::MAX_EXPERIMENT_STEPS,
                actual: steps,
            });
        }
        let history_before = self.history.len();
        let estimated_samples = if steps == 0 {
            0
        } else {
            ((steps - 1) / sample_every) + 1
        };
        let mut samples = Vec::with_capacity(estimated_samples);
        for step in 1..=steps {
            let report = self.try_step()?;
            if step % sample_every == 0 || step == steps {
                samples.push(self.collect_step_metrics(&report));
            }
        }
        Ok(RunSummary {
            schema_version: 1,
            seed: self.config.seed,
            steps,
            sample_every,
            final_alive_count: self.alive_count(),
            final_generation: self.generation,
            samples,
            generations: self.history[history_before..].to_vec(),
        })
    }
}
