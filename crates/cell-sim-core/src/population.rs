use crate::brain::{Brain, FeedForwardBrain, MutationRates};
use crate::config::SimConfig;
use crate::perception::PERCEPTION_INPUTS;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha12Rng;
use thiserror::Error;
use tracing::debug;

/// Decision channels produced by a brain: turn and thrust.
pub const DECISION_OUTPUTS: usize = 2;

/// ChaCha stream reserved for drawing initial brains, apart from the world's stream.
pub const POPULATION_STREAM: u64 = 1;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PopulationError {
    #[error("generation {generation} ended without any retired brains")]
    NoRetired { generation: u32 },
}

/// Evolutionary process that supplies brains and selects among finished ones.
pub trait Population {
    type Brain: Brain;

    /// Number of completed epochs.
    fn generation(&self) -> u32;

    /// Hand the current pool over to the simulation, leaving it empty.
    fn take_pool(&mut self) -> Vec<Self::Brain>;

    /// Return a brain whose cell has died; its fitness is final.
    fn retire(&mut self, brain: Self::Brain);

    /// Select over the retired brains and fill the pool for the next generation.
    fn epoch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), PopulationError>;

    /// Fittest brain of the most recently completed generation.
    fn best(&self) -> Option<&Self::Brain>;

    /// Fresh brain id for offspring created outside `epoch`.
    fn allocate_id(&mut self) -> u64;
}

/// Truncation selection with mutation-only refill.
#[derive(Clone, Debug)]
pub struct ElitistPopulation {
    size: usize,
    elitism: f64,
    pool: Vec<FeedForwardBrain>,
    retired: Vec<FeedForwardBrain>,
    best: Option<FeedForwardBrain>,
    generation: u32,
    next_id: u64,
}

impl ElitistPopulation {
    pub fn new<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let mutation = MutationRates::with_point(config.mutation_rate, config.mutation_scale);
        let pool = (0..config.population_size as u64)
            .map(|id| {
                FeedForwardBrain::random(
                    id,
                    PERCEPTION_INPUTS,
                    config.hidden_nodes,
                    DECISION_OUTPUTS,
                    mutation,
                    rng,
                )
            })
            .collect();
        Self::from_pool(pool, config.elitism)
    }

    /// Random initial pool drawn from `config.seed` on its own RNG stream.
    pub fn from_seed(config: &SimConfig) -> Self {
        let mut rng = ChaCha12Rng::seed_from_u64(config.seed);
        rng.set_stream(POPULATION_STREAM);
        Self::new(config, &mut rng)
    }

    /// First generation made entirely of copies of a saved brain. The copies
    /// take consecutive ids starting at the saved brain's id.
    pub fn from_saved(brain: FeedForwardBrain, config: &SimConfig) -> Self {
        let base = brain.id();
        let pool = (0..config.population_size as u64)
            .map(|offset| brain.clone().with_id(base + offset))
            .collect();
        Self::from_pool(pool, config.elitism)
    }

    /// Start from an explicit pool.
    pub fn from_pool(pool: Vec<FeedForwardBrain>, elitism: f64) -> Self {
        let next_id = pool.iter().map(|b| b.id() + 1).max().unwrap_or(0);
        Self {
            size: pool.len(),
            elitism,
            pool,
            retired: Vec::new(),
            best: None,
            generation: 0,
            next_id,
        }
    }

    pub fn pool(&self) -> &[FeedForwardBrain] {
        &self.pool
    }

    pub fn retired_count(&self) -> usize {
        self.retired.len()
    }
}

impl Population for ElitistPopulation {
    type Brain = FeedForwardBrain;

    fn generation(&self) -> u32 {
        self.generation
    }

    fn take_pool(&mut self) -> Vec<FeedForwardBrain> {
        std::mem::take(&mut self.pool)
    }

    fn retire(&mut self, brain: FeedForwardBrain) {
        self.retired.push(brain);
    }

    fn epoch<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<(), PopulationError> {
        if self.retired.is_empty() {
            return Err(PopulationError::NoRetired {
                generation: self.generation,
            });
        }
        let mut ranked = std::mem::take(&mut self.retired);
        ranked.sort_by(|a, b| b.fitness().total_cmp(&a.fitness()));
        self.best = ranked.first().cloned();

        let elite_count = ((self.elitism * self.size as f64).ceil() as usize)
            .clamp(1, ranked.len().min(self.size.max(1)));
        ranked.truncate(elite_count);
        for elite in &mut ranked {
            elite.set_fitness(0.0);
        }

        let mut pool = ranked.clone();
        while pool.len() < self.size {
            let parent = &ranked[rng.random_range(0..ranked.len())];
            let child_id = self.allocate_id();
            pool.push(parent.mutate(rng, child_id));
        }
        self.pool = pool;
        self.generation += 1;
        debug!(
            generation = self.generation,
            elites = elite_count,
            pool = self.pool.len(),
            "population advanced"
        );
        Ok(())
    }

    fn best(&self) -> Option<&FeedForwardBrain> {
        self.best.as_ref()
    }

    fn allocate_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }
}
