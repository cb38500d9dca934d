use crate::geometry::Arena;
use rand::Rng;
use serde::{Deserialize, Serialize};

/// A consumable point resource. Eaten food respawns in place, so the number of
/// food items never changes within a generation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Food {
    id: usize,
    name: String,
    energy: f64,
    position: [f64; 2],
}

impl Food {
    pub fn new(id: usize, energy: f64, position: [f64; 2]) -> Self {
        Self {
            id,
            name: id.to_string(),
            energy,
            position,
        }
    }

    /// Create a food item at a uniform position inside the arena margin.
    pub fn spawn<R: Rng + ?Sized>(id: usize, energy: f64, arena: &Arena, rng: &mut R) -> Self {
        Self::new(id, energy, arena.random_point(rng))
    }

    /// Move to a fresh uniform position; identity and energy are kept.
    pub fn respawn<R: Rng + ?Sized>(&mut self, arena: &Arena, rng: &mut R) {
        self.position = arena.random_point(rng);
    }

    pub fn id(&self) -> usize {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn energy(&self) -> f64 {
        self.energy
    }

    pub fn position(&self) -> [f64; 2] {
        self.position
    }
}

/// Build the fixed-size food set for a generation.
pub fn generate_food<R: Rng + ?Sized>(
    count: usize,
    energy: f64,
    arena: &Arena,
    rng: &mut R,
) -> Vec<Food> {
    (0..count)
        .map(|id| Food::spawn(id, energy, arena, rng))
        .collect()
}
