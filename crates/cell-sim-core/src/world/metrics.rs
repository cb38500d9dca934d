use super::step::StepReport;
use super::World;
use crate::brain::Brain;
use crate::lifecycle::DeathCause;
use crate::population::Population;
use serde::{Deserialize, Serialize};

fn std_dev(vals: &[f64], mean: f64) -> f64 {
    if vals.len() < 2 {
        return 0.0;
    }
    let var = vals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (vals.len() - 1) as f64;
    var.sqrt()
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct StepTimings {
    pub perception_us: u64,
    pub motion_us: u64,
    pub lifecycle_us: u64,
    pub total_us: u64,
}

#[derive(Clone, Debug, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StepMetrics {
    pub total_tick: usize,
    pub tick: usize,
    pub generation: u32,
    pub alive_count: usize,
    pub food_count: usize,
    pub health_mean: f64,
    pub health_std: f64,
    pub age_mean: f64,
    pub fitness_mean: f64,
    pub fitness_max: f64,
    pub meals: usize,
    pub deaths: usize,
    pub births: usize,
    pub sanitized_decisions: usize,
    pub regenerated: bool,
}

/// Per-generation counters accumulated while the generation runs.
#[derive(Clone, Debug, Default)]
pub(crate) struct GenerationTally {
    pub ticks: usize,
    pub cells_spawned: usize,
    pub meals: usize,
    pub births: usize,
    pub starved: usize,
    pub out_of_bounds: usize,
    pub generation_end: usize,
    pub fitness_sum: f64,
    pub best_fitness: f64,
    pub best_brain_id: Option<u64>,
}

impl GenerationTally {
    pub(crate) fn record_death(&mut self, cause: DeathCause, brain_id: u64, fitness: f64) {
        match cause {
            DeathCause::Starvation => self.starved += 1,
            DeathCause::OutOfBounds => self.out_of_bounds += 1,
            DeathCause::GenerationEnd => self.generation_end += 1,
        }
        self.fitness_sum += fitness;
        if self.best_brain_id.is_none() || fitness > self.best_fitness {
            self.best_fitness = fitness;
            self.best_brain_id = Some(brain_id);
        }
    }

    fn deaths(&self) -> usize {
        self.starved + self.out_of_bounds + self.generation_end
    }

    pub(crate) fn summarize(&self, generation: u32) -> GenerationSummary {
        let deaths = self.deaths();
        GenerationSummary {
            generation,
            ticks: self.ticks,
            cells: self.cells_spawned,
            meals: self.meals,
            births: self.births,
            starved: self.starved,
            out_of_bounds: self.out_of_bounds,
            generation_end: self.generation_end,
            fitness_mean: if deaths == 0 {
                0.0
            } else {
                self.fitness_sum / deaths as f64
            },
            best_fitness: self.best_fitness,
            best_brain_id: self.best_brain_id,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GenerationSummary {
    pub generation: u32,
    pub ticks: usize,
    /// Cells that lived during the generation, offspring included.
    pub cells: usize,
    pub meals: usize,
    pub births: usize,
    pub starved: usize,
    pub out_of_bounds: usize,
    pub generation_end: usize,
    pub fitness_mean: f64,
    pub best_fitness: f64,
    pub best_brain_id: Option<u64>,
}

/// Persisted form of the fittest brain seen so far.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct BestBrainRecord<B> {
    /// Completed epochs when the record was taken.
    pub generation: u32,
    pub timestamp_secs: u64,
    pub brain_id: u64,
    pub fitness: f64,
    pub brain: B,
}

fn default_schema_version() -> u32 {
    1
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RunSummary {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    pub seed: u64,
    pub steps: usize,
    pub sample_every: usize,
    pub final_alive_count: usize,
    pub final_generation: u32,
    pub samples: Vec<StepMetrics>,
    #[serde(default)]
    pub generations: Vec<GenerationSummary>,
}

impl<P: Population> World<P> {
    pub fn collect_step_metrics(&self, report: &StepReport) -> StepMetrics {
        let alive = self.cells.len();
        let denom = alive.max(1) as f64;

        let healths: Vec<f64> = self.cells.iter().map(|c| c.health()).collect();
        let health_mean = healths.iter().sum::<f64>() / denom;
        let age_mean = self.cells.iter().map(|c| c.age() as f64).sum::<f64>() / denom;
        let fitness_mean = self.cells.iter().map(|c| c.brain().fitness()).sum::<f64>() / denom;
        let fitness_max = self
            .cells
            .iter()
            .map(|c| c.brain().fitness())
            .fold(0.0f64, f64::max);

        StepMetrics {
            total_tick: self.total_ticks,
            tick: self.tick,
            generation: self.generation,
            alive_count: alive,
            food_count: self.foods.len(),
            health_mean,
            health_std: std_dev(&healths, health_mean),
            age_mean,
            fitness_mean,
            fitness_max,
            meals: report.meals,
            deaths: report.deaths,
            births: report.births,
            sanitized_decisions: report.sanitized,
            regenerated: report.regenerated,
        }
    }
}
