use crate::geometry::Arena;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// How a decision vector is integrated into position and heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionModel {
    /// Turn and thrust drive orientation and scalar speed.
    #[default]
    HeadingVelocity,
    /// Outputs are taken as a raw displacement scaled by DNA speed.
    DirectDelta,
    /// Outputs pick a desired velocity that the cell steers towards.
    SeekSteering,
}

/// What happens when a cell crosses the arena edge.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundaryPolicy {
    #[default]
    Wrap,
    Kill,
}

/// Experimental in-generation reproduction. Not part of the population's selection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "mode")]
pub enum ReproductionMode {
    #[default]
    Disabled,
    /// Bud a mutated child every `meals_per_offspring` meals.
    Asexual { meals_per_offspring: u32 },
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Deterministic seed for reproducible simulation runs.
    pub seed: u64,
    pub arena_width: f64,
    pub arena_height: f64,
    /// Spawn margin kept clear along every arena edge.
    pub margin: f64,
    /// Fixed model-time step per tick.
    pub dt: f64,
    /// Brains per generation handed out by the population.
    pub population_size: usize,
    /// Hidden layer width of the reference brain.
    pub hidden_nodes: usize,
    /// Food items alive in the arena; constant within a generation.
    pub food_count: usize,
    pub food_energy: f64,
    /// Ticks after which a generation is forcibly ended. 0 disables the cap.
    pub generation_ticks: usize,
    /// Ticks at the start of a generation during which nothing can eat.
    pub feeding_delay_ticks: usize,
    pub initial_health: f64,
    pub health_cap: f64,
    /// Health lost every tick.
    pub health_decay: f64,
    /// Fitness awarded every tick survived.
    pub fitness_per_tick: f64,
    /// Scalar speed a fresh cell starts with.
    pub initial_speed: f64,
    /// Base maximum linear speed (units per second), inherited by DNA.
    pub max_speed: f64,
    /// Base maximum turn rate (degrees per second), inherited by DNA.
    pub max_turn_rate: f64,
    /// Maximum acceleration (units per second squared).
    pub max_accel: f64,
    /// Steering force cap per tick for `MotionModel::SeekSteering`.
    pub max_steer_force: f64,
    pub vision_range: f64,
    /// Eating happens within `vision_range - eat_radius_offset`.
    pub eat_radius_offset: f64,
    pub cell_size: f64,
    /// Relative spread applied to speed, turn rate and vision when drawing DNA.
    pub dna_jitter: f64,
    /// Fraction of a finished generation kept as parents.
    pub elitism: f64,
    /// Per-weight probability of mutation in the reference brain.
    pub mutation_rate: f64,
    pub mutation_scale: f64,
    pub motion_model: MotionModel,
    pub boundary_policy: BoundaryPolicy,
    pub reproduction: ReproductionMode,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            seed: 333,
            arena_width: 1280.0,
            arena_height: 720.0,
            margin: 15.0,
            dt: 0.04,
            population_size: 50,
            hidden_nodes: 5,
            food_count: 20,
            food_energy: 20.0,
            generation_ticks: 2500,
            feeding_delay_ticks: 30,
            initial_health: 100.0,
            health_cap: 200.0,
            health_decay: 0.1,
            fitness_per_tick: 1.0,
            initial_speed: 30.0,
            max_speed: 50.0,
            max_turn_rate: 720.0,
            max_accel: 1.0,
            max_steer_force: 0.1,
            vision_range: 200.0,
            eat_radius_offset: 170.0,
            cell_size: 32.0,
            dna_jitter: 0.0,
            elitism: 0.2,
            mutation_rate: 0.1,
            mutation_scale: 0.5,
            motion_model: MotionModel::default(),
            boundary_policy: BoundaryPolicy::default(),
            reproduction: ReproductionMode::default(),
        }
    }
}

#[derive(Debug, Error)]
pub enum SimConfigError {
    #[error("{field} must be finite")]
    NonFinite { field: &'static str },
    #[error("{field} must be positive (got {value})")]
    NonPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("vision_range must not be negative (got {0})")]
    NegativeVisionRange(f64),
    #[error("margin {margin} leaves no spawn area in a {width}x{height} arena")]
    MarginTooLarge { margin: f64, width: f64, height: f64 },
    #[error("food_count must be at least 1")]
    EmptyFoodSet,
    #[error("population_size must be at least 1")]
    EmptyPopulation,
    #[error("hidden_nodes must be at least 1")]
    NoHiddenNodes,
    #[error("initial_health {initial} must lie in (0, {cap}]")]
    InitialHealthOutOfRange { initial: f64, cap: f64 },
    #[error("{field} must lie in [0, 1] (got {value})")]
    NotAFraction { field: &'static str, value: f64 },
    #[error("dna_jitter must lie in [0, 1) (got {0})")]
    InvalidJitter(f64),
    #[error("meals_per_offspring must be at least 1")]
    InvalidReproduction,
    #[error("could not parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
}

impl SimConfig {
    /// Parse a JSON document; absent fields take their defaults.
    pub fn from_json(text: &str) -> Result<Self, SimConfigError> {
        let config: SimConfig = serde_json::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn arena(&self) -> Arena {
        Arena::new(self.arena_width, self.arena_height, self.margin)
    }

    pub fn validate(&self) -> Result<(), SimConfigError> {
        let floats = [
            ("arena_width", self.arena_width),
            ("arena_height", self.arena_height),
            ("margin", self.margin),
            ("dt", self.dt),
            ("food_energy", self.food_energy),
            ("initial_health", self.initial_health),
            ("health_cap", self.health_cap),
            ("health_decay", self.health_decay),
            ("fitness_per_tick", self.fitness_per_tick),
            ("initial_speed", self.initial_speed),
            ("max_speed", self.max_speed),
            ("max_turn_rate", self.max_turn_rate),
            ("max_accel", self.max_accel),
            ("max_steer_force", self.max_steer_force),
            ("vision_range", self.vision_range),
            ("eat_radius_offset", self.eat_radius_offset),
            ("cell_size", self.cell_size),
            ("dna_jitter", self.dna_jitter),
            ("elitism", self.elitism),
            ("mutation_rate", self.mutation_rate),
            ("mutation_scale", self.mutation_scale),
        ];
        if let Some(&(field, _)) = floats.iter().find(|(_, v)| !v.is_finite()) {
            return Err(SimConfigError::NonFinite { field });
        }

        let positives = [
            ("arena_width", self.arena_width),
            ("arena_height", self.arena_height),
            ("dt", self.dt),
            ("food_energy", self.food_energy),
            ("health_cap", self.health_cap),
            ("max_speed", self.max_speed),
            ("max_turn_rate", self.max_turn_rate),
            ("max_accel", self.max_accel),
            ("cell_size", self.cell_size),
        ];
        if let Some(&(field, value)) = positives.iter().find(|(_, v)| *v <= 0.0) {
            return Err(SimConfigError::NonPositive { field, value });
        }
        if self.vision_range < 0.0 {
            return Err(SimConfigError::NegativeVisionRange(self.vision_range));
        }
        if self.margin < 0.0
            || self.margin * 2.0 >= self.arena_width
            || self.margin * 2.0 >= self.arena_height
        {
            return Err(SimConfigError::MarginTooLarge {
                margin: self.margin,
                width: self.arena_width,
                height: self.arena_height,
            });
        }
        if self.food_count == 0 {
            return Err(SimConfigError::EmptyFoodSet);
        }
        if self.population_size == 0 {
            return Err(SimConfigError::EmptyPopulation);
        }
        if self.hidden_nodes == 0 {
            return Err(SimConfigError::NoHiddenNodes);
        }
        if self.initial_health <= 0.0 || self.initial_health > self.health_cap {
            return Err(SimConfigError::InitialHealthOutOfRange {
                initial: self.initial_health,
                cap: self.health_cap,
            });
        }
        let fractions = [
            ("elitism", self.elitism),
            ("mutation_rate", self.mutation_rate),
        ];
        if let Some(&(field, value)) = fractions
            .iter()
            .find(|(_, v)| !(0.0..=1.0).contains(v))
        {
            return Err(SimConfigError::NotAFraction { field, value });
        }
        if !(0.0..1.0).contains(&self.dna_jitter) {
            return Err(SimConfigError::InvalidJitter(self.dna_jitter));
        }
        let non_negative = [
            ("health_decay", self.health_decay),
            ("fitness_per_tick", self.fitness_per_tick),
            ("initial_speed", self.initial_speed),
            ("max_steer_force", self.max_steer_force),
            ("eat_radius_offset", self.eat_radius_offset),
            ("mutation_scale", self.mutation_scale),
        ];
        if let Some(&(field, value)) = non_negative.iter().find(|(_, v)| *v < 0.0) {
            return Err(SimConfigError::Negative { field, value });
        }
        if let ReproductionMode::Asexual {
            meals_per_offspring: 0,
        } = self.reproduction
        {
            return Err(SimConfigError::InvalidReproduction);
        }
        Ok(())
    }
}
