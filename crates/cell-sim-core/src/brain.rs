use rand::Rng;
use serde::{Deserialize, Serialize};

/// Decision policy owned by a single cell.
///
/// Fitness lives on the brain so it outlives the cell and reaches the
/// population's selection step.
pub trait Brain {
    /// Display identifier.
    fn id(&self) -> u64;

    /// Map a perception vector to a decision vector. Must not panic for finite input.
    fn predict(&self, inputs: &[f64]) -> Vec<f64>;

    fn fitness(&self) -> f64;

    fn set_fitness(&mut self, fitness: f64);

    fn add_fitness(&mut self, delta: f64) {
        let fitness = self.fitness();
        self.set_fitness(fitness + delta);
    }

    /// Produce a perturbed copy carrying `child_id` and zero fitness.
    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, child_id: u64) -> Self
    where
        Self: Sized;
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationRates {
    /// Probability that a weight receives a uniform perturbation.
    pub point_rate: f64,
    pub point_scale: f64,
    /// Probability that a weight is reset to zero.
    pub reset_rate: f64,
    pub value_limit: f64,
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            point_rate: 0.1,
            point_scale: 0.5,
            reset_rate: 0.002,
            value_limit: 2.0,
        }
    }
}

impl MutationRates {
    pub fn with_point(point_rate: f64, point_scale: f64) -> Self {
        Self {
            point_rate,
            point_scale,
            ..Self::default()
        }
    }

    fn apply<R: Rng + ?Sized>(&self, rng: &mut R, weights: &mut [f64]) {
        for w in weights {
            let r = rng.random::<f64>();
            if r < self.point_rate {
                let delta = if self.point_scale > 0.0 {
                    rng.random_range(-self.point_scale..=self.point_scale)
                } else {
                    0.0
                };
                *w = (*w + delta).clamp(-self.value_limit, self.value_limit);
            } else if r < self.point_rate + self.reset_rate {
                *w = 0.0;
            }
        }
    }
}

/// Single hidden layer network, tanh on both layers.
///
/// Weights are stored flat: input->hidden (`inputs * hidden`), hidden bias
/// (`hidden`), hidden->output (`hidden * outputs`), output bias (`outputs`).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FeedForwardBrain {
    id: u64,
    fitness: f64,
    inputs: usize,
    hidden: usize,
    outputs: usize,
    weights: Vec<f64>,
    mutation: MutationRates,
}

impl FeedForwardBrain {
    pub fn weight_count(inputs: usize, hidden: usize, outputs: usize) -> usize {
        inputs * hidden + hidden + hidden * outputs + outputs
    }

    /// Random weights uniform in `[-1, 1)`.
    pub fn random<R: Rng + ?Sized>(
        id: u64,
        inputs: usize,
        hidden: usize,
        outputs: usize,
        mutation: MutationRates,
        rng: &mut R,
    ) -> Self {
        let weights = (0..Self::weight_count(inputs, hidden, outputs))
            .map(|_| rng.random::<f64>() * 2.0 - 1.0)
            .collect();
        Self {
            id,
            fitness: 0.0,
            inputs,
            hidden,
            outputs,
            weights,
            mutation,
        }
    }

    /// Build from explicit weights. Returns `None` when the count does not match the layout.
    pub fn from_weights(
        id: u64,
        inputs: usize,
        hidden: usize,
        outputs: usize,
        weights: Vec<f64>,
    ) -> Option<Self> {
        (weights.len() == Self::weight_count(inputs, hidden, outputs)).then(|| Self {
            id,
            fitness: 0.0,
            inputs,
            hidden,
            outputs,
            weights,
            mutation: MutationRates::default(),
        })
    }

    pub fn weights(&self) -> &[f64] {
        &self.weights
    }

    /// Same network under another id, with fitness cleared.
    pub fn with_id(mut self, id: u64) -> Self {
        self.id = id;
        self.fitness = 0.0;
        self
    }
}

impl Brain for FeedForwardBrain {
    fn id(&self) -> u64 {
        self.id
    }

    /// Missing inputs read as zero; extra inputs are ignored.
    fn predict(&self, inputs: &[f64]) -> Vec<f64> {
        let (w_ih, rest) = self.weights.split_at(self.inputs * self.hidden);
        let (b_h, rest) = rest.split_at(self.hidden);
        let (w_ho, b_o) = rest.split_at(self.hidden * self.outputs);

        let mut hidden = b_h.to_vec();
        for (i, &x) in inputs.iter().take(self.inputs).enumerate() {
            let row = &w_ih[i * self.hidden..(i + 1) * self.hidden];
            for (h, w) in hidden.iter_mut().zip(row) {
                *h += x * w;
            }
        }
        for h in &mut hidden {
            *h = h.tanh();
        }

        let mut output = b_o.to_vec();
        for (i, &h) in hidden.iter().enumerate() {
            let row = &w_ho[i * self.outputs..(i + 1) * self.outputs];
            for (o, w) in output.iter_mut().zip(row) {
                *o += h * w;
            }
        }
        for o in &mut output {
            *o = o.tanh();
        }
        output
    }

    fn fitness(&self) -> f64 {
        self.fitness
    }

    fn set_fitness(&mut self, fitness: f64) {
        self.fitness = fitness;
    }

    fn mutate<R: Rng + ?Sized>(&self, rng: &mut R, child_id: u64) -> Self {
        let mut child = self.clone();
        child.id = child_id;
        child.fitness = 0.0;
        self.mutation.apply(rng, &mut child.weights);
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha12Rng;

    #[test]
    fn outputs_have_expected_shape_and_range() {
        let mut rng = ChaCha12Rng::seed_from_u64(5);
        let brain = FeedForwardBrain::random(1, 3, 5, 2, MutationRates::default(), &mut rng);
        let out = brain.predict(&[0.5, -0.25, 1.0]);
        assert_eq!(out.len(), 2);
        assert!(out.iter().all(|o| (-1.0..=1.0).contains(o)));
    }

    #[test]
    fn short_input_is_zero_padded() {
        let mut rng = ChaCha12Rng::seed_from_u64(6);
        let brain = FeedForwardBrain::random(1, 3, 4, 2, MutationRates::default(), &mut rng);
        assert_eq!(brain.predict(&[0.3]), brain.predict(&[0.3, 0.0, 0.0]));
        assert_eq!(brain.predict(&[]).len(), 2);
    }

    #[test]
    fn zero_weights_predict_zero() {
        let count = FeedForwardBrain::weight_count(3, 2, 2);
        let brain = FeedForwardBrain::from_weights(9, 3, 2, 2, vec![0.0; count]).unwrap();
        assert_eq!(brain.predict(&[1.0, 1.0, 1.0]), vec![0.0, 0.0]);
        assert!(FeedForwardBrain::from_weights(9, 3, 2, 2, vec![0.0; count + 1]).is_none());
    }

    #[test]
    fn mutation_is_deterministic_for_fixed_seed() {
        let mut rng = ChaCha12Rng::seed_from_u64(11);
        let parent = FeedForwardBrain::random(1, 3, 5, 2, MutationRates::default(), &mut rng);
        let a = parent.mutate(&mut ChaCha12Rng::seed_from_u64(123), 2);
        let b = parent.mutate(&mut ChaCha12Rng::seed_from_u64(123), 2);
        assert_eq!(a.weights(), b.weights());
        assert_eq!(a.id(), 2);
    }

    #[test]
    fn mutation_resets_fitness_and_respects_bounds() {
        let mut rng = ChaCha12Rng::seed_from_u64(12);
        let rates = MutationRates::with_point(0.9, 1.0);
        let mut brain = FeedForwardBrain::random(1, 3, 5, 2, rates, &mut rng);
        brain.set_fitness(42.0);
        for step in 0..100 {
            brain = brain.mutate(&mut rng, step + 2);
        }
        assert_eq!(brain.fitness(), 0.0);
        assert!(brain
            .weights()
            .iter()
            .all(|w| w.is_finite() && (-rates.value_limit..=rates.value_limit).contains(w)));
    }

    #[test]
    fn add_fitness_accumulates() {
        let count = FeedForwardBrain::weight_count(1, 1, 1);
        let mut brain = FeedForwardBrain::from_weights(1, 1, 1, 1, vec![0.0; count]).unwrap();
        brain.add_fitness(1.0);
        brain.add_fitness(2.5);
        assert_eq!(brain.fitness(), 3.5);
    }
}
