use crate::brain::Brain;
use crate::config::SimConfig;
use crate::food::Food;
use crate::geometry::{self, Arena};
use rand::Rng;
use serde::{Deserialize, Serialize};

/// Fixed-at-birth physical constants of a cell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Dna {
    pub size: f64,
    /// Maximum linear speed (units per second).
    pub speed: f64,
    /// Maximum turn rate (degrees per second).
    pub rotation_speed: f64,
    pub vision_range: f64,
    /// Display only.
    pub color: [u8; 3],
}

impl Dna {
    /// Draw DNA around the configured base values.
    ///
    /// Speed, turn rate and vision are scaled by a factor uniform in
    /// `[1 - dna_jitter, 1 + dna_jitter]`; with zero jitter they equal the base.
    pub fn random<R: Rng + ?Sized>(config: &SimConfig, rng: &mut R) -> Self {
        let mut jitter = |base: f64| {
            if config.dna_jitter > 0.0 {
                base * rng.random_range(1.0 - config.dna_jitter..=1.0 + config.dna_jitter)
            } else {
                base
            }
        };
        let speed = jitter(config.max_speed);
        let rotation_speed = jitter(config.max_turn_rate);
        let vision_range = jitter(config.vision_range);
        let color = [
            rng.random_range(2..=255),
            rng.random_range(2..=255),
            rng.random_range(2..=255),
        ];
        Self {
            size: config.cell_size,
            speed,
            rotation_speed,
            vision_range,
            color,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub x: f64,
    pub y: f64,
    /// Degrees in `[0, 360)`.
    pub orientation: f64,
}

impl Location {
    pub fn new(x: f64, y: f64, orientation: f64) -> Self {
        Self { x, y, orientation }
    }

    pub fn position(&self) -> [f64; 2] {
        [self.x, self.y]
    }
}

/// Velocity carried between ticks. `speed` is the scalar the heading model
/// integrates; `velocity` is the vector the steering model integrates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kinematics {
    pub speed: f64,
    pub velocity: [f64; 2],
}

impl Kinematics {
    pub fn along(orientation: f64, speed: f64) -> Self {
        let dir = geometry::unit_from_heading(orientation);
        Self {
            speed,
            velocity: [dir[0] * speed, dir[1] * speed],
        }
    }
}

/// A simulated organism. Owns its brain exclusively.
#[derive(Debug)]
pub struct Cell<B> {
    id: u64,
    dna: Dna,
    health: f64,
    health_cap: f64,
    location: Location,
    kinematics: Kinematics,
    age: u64,
    meals: u32,
    brain: B,
}

fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

impl<B: Brain> Cell<B> {
    /// Build a cell and zero its brain's fitness.
    pub fn new(
        id: u64,
        mut brain: B,
        dna: Dna,
        location: Location,
        initial_health: f64,
        health_cap: f64,
        initial_speed: f64,
    ) -> Self {
        brain.set_fitness(0.0);
        Self {
            id,
            dna,
            health: initial_health.clamp(0.0, health_cap),
            health_cap,
            kinematics: Kinematics::along(location.orientation, initial_speed),
            location,
            age: 0,
            meals: 0,
            brain,
        }
    }

    /// Fresh DNA, uniform position inside the arena margin and uniform heading.
    pub fn spawn<R: Rng + ?Sized>(
        id: u64,
        brain: B,
        config: &SimConfig,
        arena: &Arena,
        rng: &mut R,
    ) -> Self {
        let dna = Dna::random(config, rng);
        let [x, y] = arena.random_point(rng);
        let orientation = rng.random_range(0.0..360.0);
        Self::new(
            id,
            brain,
            dna,
            Location::new(x, y, orientation),
            config.initial_health,
            config.health_cap,
            config.initial_speed,
        )
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn dna(&self) -> &Dna {
        &self.dna
    }

    pub fn health(&self) -> f64 {
        self.health
    }

    pub fn location(&self) -> Location {
        self.location
    }

    pub fn position(&self) -> [f64; 2] {
        self.location.position()
    }

    pub fn kinematics(&self) -> Kinematics {
        self.kinematics
    }

    pub fn age(&self) -> u64 {
        self.age
    }

    pub fn meals(&self) -> u32 {
        self.meals
    }

    pub fn brain(&self) -> &B {
        &self.brain
    }

    pub fn brain_id(&self) -> u64 {
        self.brain.id()
    }

    pub fn fitness(&self) -> f64 {
        self.brain.fitness()
    }

    /// Release the brain, consuming the cell.
    pub fn into_brain(self) -> B {
        self.brain
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    /// Replace the DNA wholesale.
    pub fn update_dna(&mut self, dna: Dna) {
        self.dna = dna;
    }

    /// Replace the location wholesale.
    pub fn update_location(&mut self, location: Location) {
        self.location = location;
    }

    pub(crate) fn update_kinematics(&mut self, kinematics: Kinematics) {
        self.kinematics = kinematics;
    }

    /// Add `delta` to health, rounded to hundredths and clamped to `[0, cap]`.
    pub fn update_health(&mut self, delta: f64) {
        self.health = round_hundredths(self.health + delta).clamp(0.0, self.health_cap);
    }

    pub fn update_fitness(&mut self, delta: f64) {
        self.brain.add_fitness(delta);
    }

    pub(crate) fn grow_older(&mut self) {
        self.age = self.age.saturating_add(1);
    }

    /// Health goes to exactly zero. Fitness keeps its last accrued value.
    /// Returns whether this call did the killing.
    pub fn kill(&mut self) -> bool {
        if self.is_dead() {
            return false;
        }
        self.health = 0.0;
        true
    }

    /// Gain the food's energy. The caller respawns the food.
    pub fn eat(&mut self, food: &Food) {
        self.update_health(food.energy());
        self.meals = self.meals.saturating_add(1);
    }

    /// Bud a mutated child brain. Used by the experimental reproduction path.
    pub fn bud<R: Rng + ?Sized>(&self, rng: &mut R, child_id: u64) -> B {
        self.brain.mutate(rng, child_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::{FeedForwardBrain, MutationRates};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn brain() -> FeedForwardBrain {
        let count = FeedForwardBrain::weight_count(3, 2, 2);
        FeedForwardBrain::from_weights(7, 3, 2, 2, vec![0.1; count]).unwrap()
    }

    fn cell() -> Cell<FeedForwardBrain> {
        let config = SimConfig::default();
        let dna = Dna::random(&config, &mut ChaCha12Rng::seed_from_u64(1));
        Cell::new(
            1,
            brain(),
            dna,
            Location::new(100.0, 100.0, 0.0),
            100.0,
            200.0,
            30.0,
        )
    }

    #[test]
    fn construction_resets_brain_fitness() {
        let mut b = brain();
        b.set_fitness(12.0);
        let dna = Dna::random(&SimConfig::default(), &mut ChaCha12Rng::seed_from_u64(1));
        let c = Cell::new(1, b, dna, Location::new(0.0, 0.0, 0.0), 100.0, 200.0, 0.0);
        assert_eq!(c.fitness(), 0.0);
        assert_eq!(c.age(), 0);
    }

    #[test]
    fn health_is_clamped_to_cap_and_floor() {
        let mut c = cell();
        c.update_health(500.0);
        assert_eq!(c.health(), 200.0);
        c.update_health(-1000.0);
        assert_eq!(c.health(), 0.0);
        assert!(c.is_dead());
    }

    #[test]
    fn repeated_decay_stays_on_hundredths() {
        let mut c = cell();
        for _ in 0..10 {
            c.update_health(-0.1);
        }
        assert_eq!(c.health(), 99.0);
    }

    #[test]
    fn update_location_round_trips_without_side_effects() {
        let mut c = cell();
        let health = c.health();
        let dna = *c.dna();
        let kinematics = c.kinematics();
        let loc = Location::new(12.5, 99.25, 271.0);
        c.update_location(loc);
        assert_eq!(c.location(), loc);
        assert_eq!(c.health(), health);
        assert_eq!(*c.dna(), dna);
        assert_eq!(c.kinematics(), kinematics);
        assert_eq!(c.age(), 0);
    }

    #[test]
    fn kill_is_idempotent() {
        let mut c = cell();
        c.update_fitness(5.0);
        assert!(c.kill());
        assert!(!c.kill());
        assert_eq!(c.health(), 0.0);
        assert_eq!(c.fitness(), 5.0);
    }

    #[test]
    fn eating_adds_energy_and_counts_meals() {
        let mut c = cell();
        let food = Food::new(0, 20.0, [0.0, 0.0]);
        c.eat(&food);
        assert_eq!(c.health(), 120.0);
        assert_eq!(c.meals(), 1);
    }

    #[test]
    fn dna_without_jitter_matches_config() {
        let config = SimConfig::default();
        let dna = Dna::random(&config, &mut ChaCha12Rng::seed_from_u64(3));
        assert_eq!(dna.speed, config.max_speed);
        assert_eq!(dna.rotation_speed, config.max_turn_rate);
        assert_eq!(dna.vision_range, config.vision_range);
        assert!(dna.color.iter().all(|&c| c >= 2));
    }

    #[test]
    fn dna_jitter_stays_within_bounds() {
        let config = SimConfig {
            dna_jitter: 0.25,
            ..SimConfig::default()
        };
        let mut rng = ChaCha12Rng::seed_from_u64(4);
        for _ in 0..200 {
            let dna = Dna::random(&config, &mut rng);
            assert!(dna.speed >= config.max_speed * 0.75 && dna.speed <= config.max_speed * 1.25);
            assert!(dna.vision_range > 0.0);
        }
    }

    #[test]
    fn bud_produces_fresh_brain() {
        let mut rng = ChaCha12Rng::seed_from_u64(8);
        let mut parent_brain =
            FeedForwardBrain::random(3, 3, 4, 2, MutationRates::default(), &mut rng);
        parent_brain.set_fitness(3.0);
        let dna = Dna::random(&SimConfig::default(), &mut rng);
        let parent = Cell::new(1, parent_brain, dna, Location::new(0.0, 0.0, 0.0), 100.0, 200.0, 0.0);
        let child = parent.bud(&mut rng, 99);
        assert_eq!(child.id(), 99);
        assert_eq!(child.fitness(), 0.0);
    }
}
