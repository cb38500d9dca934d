pub mod brain;
pub mod cell;
pub mod config;
pub mod food;
pub mod geometry;
pub mod lifecycle;
pub mod motion;
pub mod perception;
pub mod population;
pub mod world;

pub use brain::{Brain, FeedForwardBrain, MutationRates};
pub use cell::{Cell, Dna, Kinematics, Location};
pub use config::{BoundaryPolicy, MotionModel, ReproductionMode, SimConfig, SimConfigError};
pub use food::Food;
pub use geometry::Arena;
pub use lifecycle::DeathCause;
pub use population::{ElitistPopulation, Population, PopulationError};
pub use world::{
    BestBrainRecord, EpochPhase, ExperimentError, GenerationSummary, RunSummary, StepError,
    StepMetrics, StepReport, World, WorldInitError,
};
