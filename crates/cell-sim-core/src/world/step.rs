use super::metrics::{GenerationTally, StepTimings};
use super::{EpochPhase, StepError, World};
use crate::brain::Brain;
use crate::cell::{Cell, Dna, Location};
use crate::config::ReproductionMode;
use crate::lifecycle::{self, DeathCause};
use crate::motion::{self, Decision};
use crate::perception::{self, Observer, WorldObject};
use crate::population::Population;
use rand::Rng;
use std::time::Instant;
use tracing::{debug, info, trace};

/// What happened during one tick.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StepReport {
    pub meals: usize,
    pub deaths: usize,
    pub births: usize,
    /// Policy outputs that had to be clamped or zeroed.
    pub sanitized: usize,
    /// The tick emptied the world and a new generation was seeded.
    pub regenerated: bool,
    pub timings: StepTimings,
}

/// Brain budded this tick, waiting for the purge to finish.
type Bud<B> = ([f64; 2], B);

impl<P: Population> World<P> {
    /// Every cell senses the same food snapshot taken before anything moves.
    fn step_decision_phase(&self, report: &mut StepReport) -> Result<Vec<Decision>, StepError> {
        let snapshot: Vec<WorldObject> = self.foods.iter().map(WorldObject::food).collect();
        let mut decisions = Vec::with_capacity(self.cells.len());
        for cell in &self.cells {
            let observer = Observer {
                position: cell.position(),
                orientation: cell.location().orientation,
                vision_range: cell.dna().vision_range,
            };
            let seen = perception::perceive(&observer, &snapshot).map_err(|source| {
                StepError::Perception {
                    cell: cell.id(),
                    source,
                }
            })?;
            let inputs = seen.to_inputs(
                cell.health() / self.config.health_cap,
                cell.dna().vision_range,
            );
            let outputs = cell.brain().predict(&inputs);
            if Decision::was_sanitized(&outputs) {
                report.sanitized += 1;
                trace!(cell = cell.id(), ?outputs, "sanitized policy output");
            }
            decisions.push(Decision::from_outputs(&outputs));
        }
        Ok(decisions)
    }

    /// Returns, per cell, whether it left the arena under the kill policy.
    fn step_motion_phase(&mut self, decisions: &[Decision]) -> Vec<bool> {
        let model = self.config.motion_model;
        let policy = self.config.boundary_policy;
        self.cells
            .iter_mut()
            .zip(decisions)
            .map(|(cell, &decision)| {
                let (location, kinematics) = motion::integrate(
                    model,
                    cell.dna(),
                    cell.location(),
                    cell.kinematics(),
                    decision,
                    &self.limits,
                );
                let (location, escaped) = motion::apply_boundary(policy, &self.arena, location);
                cell.update_location(location);
                cell.update_kinematics(kinematics);
                escaped
            })
            .collect()
    }

    fn step_lifecycle_phase(
        &mut self,
        escaped: &[bool],
        report: &mut StepReport,
    ) -> (Vec<Option<DeathCause>>, Vec<Bud<P::Brain>>) {
        let generation_over =
            self.config.generation_ticks > 0 && self.tick >= self.config.generation_ticks;
        let feeding_open = self.tick > self.config.feeding_delay_ticks;
        let meals_per_offspring = match self.config.reproduction {
            ReproductionMode::Asexual {
                meals_per_offspring,
            } => Some(meals_per_offspring),
            ReproductionMode::Disabled => None,
        };

        let mut eaten = vec![false; self.foods.len()];
        let mut causes = vec![None; self.cells.len()];
        let mut buds = Vec::new();
        for (idx, cell) in self.cells.iter_mut().enumerate() {
            if let Some(cause) = lifecycle::advance(cell, &self.rules) {
                causes[idx] = Some(cause);
                continue;
            }

            let mut pending = 0u32;
            if feeding_open && !escaped[idx] {
                for (food, taken) in self.foods.iter_mut().zip(eaten.iter_mut()) {
                    if *taken || !lifecycle::within_reach(cell, food, &self.rules) {
                        continue;
                    }
                    lifecycle::feed(cell, food, &self.arena, &mut self.rng);
                    *taken = true;
                    report.meals += 1;
                    self.tally.meals += 1;
                    if meals_per_offspring.is_some_and(|n| cell.meals() % n == 0) {
                        pending += 1;
                    }
                }
            }

            if escaped[idx] {
                cell.kill();
                causes[idx] = Some(DeathCause::OutOfBounds);
                continue;
            }
            if generation_over {
                cell.kill();
                causes[idx] = Some(DeathCause::GenerationEnd);
                continue;
            }
            for _ in 0..pending {
                let child_id = self.population.allocate_id();
                buds.push((cell.position(), cell.bud(&mut self.rng, child_id)));
            }
        }
        (causes, buds)
    }

    /// Retire dead cells' brains, keeping survivors in their original order.
    fn step_purge_phase(&mut self, causes: Vec<Option<DeathCause>>, report: &mut StepReport) {
        if causes.iter().all(Option::is_none) {
            return;
        }
        let cells = std::mem::take(&mut self.cells);
        for (cell, cause) in cells.into_iter().zip(causes) {
            let Some(cause) = cause else {
                self.cells.push(cell);
                continue;
            };
            report.deaths += 1;
            self.tally
                .record_death(cause, cell.brain_id(), cell.fitness());
            debug!(
                cell = cell.id(),
                brain = cell.brain_id(),
                age = cell.age(),
                fitness = cell.fitness(),
                ?cause,
                "cell died"
            );
            self.population.retire(cell.into_brain());
        }
    }

    fn step_birth_phase(&mut self, buds: Vec<Bud<P::Brain>>, report: &mut StepReport) {
        for ([x, y], brain) in buds {
            let id = self.next_cell_id;
            self.next_cell_id += 1;
            let dna = Dna::random(&self.config, &mut self.rng);
            let orientation = self.rng.random_range(0.0..360.0);
            let child = Cell::new(
                id,
                brain,
                dna,
                Location::new(x, y, orientation),
                self.config.initial_health,
                self.config.health_cap,
                self.config.initial_speed,
            );
            debug!(cell = id, brain = child.brain_id(), "offspring spawned");
            self.cells.push(child);
            report.births += 1;
            self.tally.births += 1;
            self.tally.cells_spawned += 1;
        }
    }

    /// Close the generation, run the population epoch and reseed cells and food.
    /// The phase is back to `Running` on every exit path.
    fn regenerate(&mut self) -> Result<(), StepError> {
        self.phase = EpochPhase::Regenerating;
        let result = self.start_next_generation();
        self.phase = EpochPhase::Running;
        result
    }

    /// History and counters only move once a usable pool is in hand.
    fn start_next_generation(&mut self) -> Result<(), StepError> {
        self.population.epoch(&mut self.rng)?;
        let pool = self.population.take_pool();
        if pool.is_empty() {
            return Err(StepError::EmptyPool {
                generation: self.generation + 1,
            });
        }

        let summary = self.tally.summarize(self.generation);
        info!(
            generation = summary.generation,
            ticks = summary.ticks,
            best_fitness = summary.best_fitness,
            fitness_mean = summary.fitness_mean,
            meals = summary.meals,
            "generation finished"
        );
        self.history.push(summary);

        self.generation += 1;
        self.tick = 0;
        self.tally = GenerationTally::default();
        self.populate(pool);
        self.foods = self.fresh_food();
        self.food_regenerations += 1;
        Ok(())
    }

    pub fn step(&mut self) -> StepReport {
        self.try_step().unwrap_or_else(|e| panic!("{e}"))
    }

    /// Advance one tick: decide, move, age and feed, purge the dead, and
    /// start a new generation once no cell is left. A perception error leaves
    /// the world exactly as it was.
    pub fn try_step(&mut self) -> Result<StepReport, StepError> {
        let total_start = Instant::now();
        let mut report = StepReport::default();

        // Perception is the only fallible per-cell phase; nothing is mutated before it.
        let t0 = Instant::now();
        let decisions = self.step_decision_phase(&mut report)?;
        report.timings.perception_us = t0.elapsed().as_micros() as u64;
        self.tick += 1;
        self.total_ticks += 1;
        self.tally.ticks += 1;

        let t1 = Instant::now();
        let escaped = self.step_motion_phase(&decisions);
        report.timings.motion_us = t1.elapsed().as_micros() as u64;

        let t2 = Instant::now();
        let (causes, buds) = self.step_lifecycle_phase(&escaped, &mut report);
        self.step_purge_phase(causes, &mut report);
        self.step_birth_phase(buds, &mut report);
        if self.cells.is_empty() {
            self.regenerate()?;
            report.regenerated = true;
        }
        report.timings.lifecycle_us = t2.elapsed().as_micros() as u64;

        report.timings.total_us = total_start.elapsed().as_micros() as u64;
        Ok(report)
    }
}
