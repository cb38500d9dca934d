use crate::brain::Brain;
use crate::cell::Cell;
use crate::config::SimConfig;
use crate::food::Food;
use crate::geometry::{self, Arena};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeathCause {
    Starvation,
    OutOfBounds,
    GenerationEnd,
}

/// Constants applied to every live cell each tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LifecycleRules {
    pub fitness_per_tick: f64,
    pub health_decay: f64,
    pub eat_radius_offset: f64,
}

impl LifecycleRules {
    pub fn from_config(config: &SimConfig) -> Self {
        Self {
            fitness_per_tick: config.fitness_per_tick,
            health_decay: config.health_decay,
            eat_radius_offset: config.eat_radius_offset,
        }
    }

    pub fn eat_radius(&self, vision_range: f64) -> f64 {
        (vision_range - self.eat_radius_offset).max(0.0)
    }
}

/// Age, reward survival, then decay. Returns `Some(Starvation)` when the
/// cell died this tick. Dead cells are left untouched.
pub fn advance<B: Brain>(cell: &mut Cell<B>, rules: &LifecycleRules) -> Option<DeathCause> {
    if cell.is_dead() {
        return None;
    }
    cell.grow_older();
    cell.update_fitness(rules.fitness_per_tick);
    cell.update_health(-rules.health_decay);
    // The health clamp already pins a starved cell at exactly zero.
    cell.is_dead().then_some(DeathCause::Starvation)
}

/// Whether `food` lies within the cell's eating radius.
pub fn within_reach<B: Brain>(cell: &Cell<B>, food: &Food, rules: &LifecycleRules) -> bool {
    geometry::distance(cell.position(), food.position()) < rules.eat_radius(cell.dna().vision_range)
}

/// Consume `food` and respawn it elsewhere in the arena.
pub fn feed<B: Brain, R: Rng + ?Sized>(
    cell: &mut Cell<B>,
    food: &mut Food,
    arena: &Arena,
    rng: &mut R,
) {
    cell.eat(food);
    food.respawn(arena, rng);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brain::FeedForwardBrain;
    use crate::cell::{Dna, Location};
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    fn cell(health: f64) -> Cell<FeedForwardBrain> {
        let count = FeedForwardBrain::weight_count(3, 2, 2);
        let brain = FeedForwardBrain::from_weights(1, 3, 2, 2, vec![0.0; count]).unwrap();
        let dna = Dna::random(&SimConfig::default(), &mut ChaCha12Rng::seed_from_u64(0));
        Cell::new(1, brain, dna, Location::new(100.0, 100.0, 0.0), health, 200.0, 0.0)
    }

    fn rules() -> LifecycleRules {
        LifecycleRules::from_config(&SimConfig::default())
    }

    #[test]
    fn advance_ages_rewards_and_decays() {
        let mut c = cell(100.0);
        assert_eq!(advance(&mut c, &rules()), None);
        assert_eq!(c.age(), 1);
        assert_eq!(c.fitness(), 1.0);
        assert_eq!(c.health(), 99.9);
    }

    #[test]
    fn advance_reports_starvation_once() {
        let mut c = cell(0.1);
        assert_eq!(advance(&mut c, &rules()), Some(DeathCause::Starvation));
        assert_eq!(c.health(), 0.0);
        let age = c.age();
        let fitness = c.fitness();
        assert_eq!(advance(&mut c, &rules()), None);
        assert_eq!(c.age(), age);
        assert_eq!(c.fitness(), fitness);
    }

    #[test]
    fn eating_radius_derives_from_vision() {
        let r = rules();
        assert_eq!(r.eat_radius(200.0), 30.0);
        assert_eq!(r.eat_radius(150.0), 0.0);
        let c = cell(100.0);
        assert!(within_reach(&c, &Food::new(0, 20.0, [120.0, 100.0]), &r));
        assert!(!within_reach(&c, &Food::new(0, 20.0, [130.0, 100.0]), &r));
    }

    #[test]
    fn feeding_moves_food_and_keeps_identity() {
        let arena = Arena::new(1280.0, 720.0, 15.0);
        let mut rng = ChaCha12Rng::seed_from_u64(10);
        let mut c = cell(100.0);
        let mut food = Food::new(3, 20.0, [110.0, 100.0]);
        feed(&mut c, &mut food, &arena, &mut rng);
        assert_eq!(c.health(), 120.0);
        assert_eq!(food.name(), "3");
        assert_eq!(food.energy(), 20.0);
        assert_ne!(food.position(), [110.0, 100.0]);
        assert!(arena.in_spawn_region(food.position()));
    }
}
