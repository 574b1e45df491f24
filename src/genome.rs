//! The learnable half of a brain: both networks' weights and biases.
//!
//! [`TensorSet`] is the genome. It is read-only while a brain drives, and only
//! changes through [`Genotype::mutate`] or a parameter import. Cloning it is
//! the way to produce an offspring that coexists with its parent.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::activation::Activation;
use crate::config::InitConfig;
use crate::network::{
    gaussian, ControlNetwork, DenseLayer, SensorPredictor, ACTION_SIZE, CONTROL_INPUTS,
    PREDICTOR_INPUTS,
};
use crate::history::SENSORS_PER_FRAME;
use crate::params::{
    lookup, ImportError, TensorMap, B1_A, B1_B, B2_A, B2_B, W1_A, W1_B, W2_A, W2_B,
};

/// Standard deviation of the Gaussian noise added to every parameter per mutation.
pub const MUTATION_STD: f32 = 0.25;

/// A genome that can be varied by an evolutionary loop.
///
/// Both operations draw all their randomness from the supplied generator, so
/// population members mutated with independent generators get independent
/// entropy and no shared state.
pub trait Genotype: Clone {
    /// Perturb the genome in place. `rate` scales the mutation strength.
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32);

    /// Produce a child combining `self` and `other`.
    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self;
}

/// All eight tensors of the control network (A) and sensor predictor (B).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "TensorMap", try_from = "TensorMap")]
pub struct TensorSet {
    /// Network A: history in, action out.
    pub control: ControlNetwork,
    /// Network B: control input and action in, next-tick sensors out.
    pub predictor: SensorPredictor,
}

impl TensorSet {
    /// Gaussian-initialised weights with zero biases, except the control
    /// output bias which carries the forward-motion prior from `init`.
    #[must_use]
    pub fn random<R: Rng>(init: &InitConfig, rng: &mut R) -> Self {
        let mut control = ControlNetwork::random(rng, init.weight_std);
        let prior = control.output.bias_mut();
        prior[0] = init.throttle_bias;
        prior[1] = init.brake_bias;

        Self {
            control,
            predictor: SensorPredictor::random(rng, init.weight_std),
        }
    }

    /// Raw action of network A, every component in `[0, 1]`.
    #[must_use]
    pub fn act(&self, input: &[f32; CONTROL_INPUTS]) -> [f32; ACTION_SIZE] {
        self.control.forward(input, Activation::Sigmoid)
    }

    /// Next-tick sensor forecast of network B (unbounded).
    #[must_use]
    pub fn predict(&self, input: &[f32; PREDICTOR_INPUTS]) -> [f32; SENSORS_PER_FRAME] {
        self.predictor.forward(input, Activation::Identity)
    }

    /// Total number of learnable scalars.
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.params().count()
    }

    /// Every parameter in a fixed order: W1_A, b1_A, W2_A, b2_A, W1_B, b1_B, W2_B, b2_B.
    pub fn params(&self) -> impl Iterator<Item = &f32> {
        self.control
            .hidden
            .params()
            .chain(self.control.output.params())
            .chain(self.predictor.hidden.params())
            .chain(self.predictor.output.params())
    }

    /// Mutable counterpart of [`params`](Self::params), same order.
    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.control
            .hidden
            .params_mut()
            .chain(self.control.output.params_mut())
            .chain(self.predictor.hidden.params_mut())
            .chain(self.predictor.output.params_mut())
    }

    /// Add `N(0, std²)` noise to every parameter. Shapes never change.
    pub fn perturb<R: Rng>(&mut self, rng: &mut R, std: f32) {
        for p in self.params_mut() {
            *p += gaussian(rng, std);
        }
    }

    /// Deep copy of every tensor keyed by name.
    #[must_use]
    pub fn to_tensors(&self) -> TensorMap {
        let mut map = TensorMap::new();
        let layers = [
            (W1_A, B1_A, self.control.hidden.to_tensors()),
            (W2_A, B2_A, self.control.output.to_tensors()),
            (W1_B, B1_B, self.predictor.hidden.to_tensors()),
            (W2_B, B2_B, self.predictor.output.to_tensors()),
        ];
        for (w_name, b_name, (w, b)) in layers {
            map.insert(w_name.to_string(), w);
            map.insert(b_name.to_string(), b);
        }
        map
    }

    /// Rebuild a tensor set from named tensors, validating every shape.
    ///
    /// W1_A is checked first so an incompatible brain is reported by its
    /// input layer.
    ///
    /// # Errors
    ///
    /// Returns the first [`ImportError`] encountered; no partial result is produced.
    pub fn from_tensors(map: &TensorMap) -> Result<Self, ImportError> {
        let get = |name: &str| lookup(map, name);

        let control = ControlNetwork {
            hidden: DenseLayer::from_tensors(W1_A, get(W1_A)?, B1_A, get(B1_A)?)?,
            output: DenseLayer::from_tensors(W2_A, get(W2_A)?, B2_A, get(B2_A)?)?,
        };
        let predictor = SensorPredictor {
            hidden: DenseLayer::from_tensors(W1_B, get(W1_B)?, B1_B, get(B1_B)?)?,
            output: DenseLayer::from_tensors(W2_B, get(W2_B)?, B2_B, get(B2_B)?)?,
        };
        Ok(Self { control, predictor })
    }
}

impl From<TensorSet> for TensorMap {
    fn from(set: TensorSet) -> Self {
        set.to_tensors()
    }
}

impl TryFrom<TensorMap> for TensorSet {
    type Error = ImportError;

    fn try_from(map: TensorMap) -> Result<Self, Self::Error> {
        Self::from_tensors(&map)
    }
}

impl Genotype for TensorSet {
    fn mutate<R: Rng>(&mut self, rng: &mut R, rate: f32) {
        self.perturb(rng, MUTATION_STD * rate);
    }

    fn crossover<R: Rng>(&self, other: &Self, rng: &mut R) -> Self {
        // Uniform crossover: every scalar comes from either parent with equal odds.
        let mut child = self.clone();
        for (c, o) in child.params_mut().zip(other.params()) {
            if rng.random::<bool>() {
                *c = *o;
            }
        }
        child
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::{CONTROL_HIDDEN, PREDICTOR_HIDDEN};
    use crate::params::TENSOR_NAMES;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    fn random_set() -> TensorSet {
        TensorSet::random(&InitConfig::default(), &mut test_rng())
    }

    #[test]
    fn test_random_applies_forward_prior() {
        let set = random_set();
        let bias = set.control.output.bias();
        assert!((bias[0] - 0.7).abs() < 1e-6);
        assert!((bias[1] + 0.5).abs() < 1e-6);
        assert_eq!(bias[2], 0.0);
        assert_eq!(bias[3], 0.0);
        assert!(set.control.hidden.bias().iter().all(|b| *b == 0.0));
        assert!(set.predictor.output.bias().iter().all(|b| *b == 0.0));
    }

    #[test]
    fn test_param_count_matches_layout() {
        let expected = CONTROL_INPUTS * CONTROL_HIDDEN
            + CONTROL_HIDDEN
            + CONTROL_HIDDEN * ACTION_SIZE
            + ACTION_SIZE
            + PREDICTOR_INPUTS * PREDICTOR_HIDDEN
            + PREDICTOR_HIDDEN
            + PREDICTOR_HIDDEN * SENSORS_PER_FRAME
            + SENSORS_PER_FRAME;
        assert_eq!(random_set().param_count(), expected);
    }

    #[test]
    fn test_tensor_shapes() {
        let map = random_set().to_tensors();
        let shapes: Vec<(&str, Vec<usize>)> = TENSOR_NAMES
            .iter()
            .map(|n| (*n, map[*n].shape().to_vec()))
            .collect();
        assert_eq!(
            shapes,
            vec![
                (W1_A, vec![59, 32]),
                (B1_A, vec![32]),
                (W2_A, vec![32, 4]),
                (B2_A, vec![4]),
                (W1_B, vec![63, 24]),
                (B1_B, vec![24]),
                (W2_B, vec![24, 9]),
                (B2_B, vec![9]),
            ]
        );
    }

    #[test]
    fn test_mutation_changes_values_not_shapes() {
        let mut rng = test_rng();
        let original = TensorSet::random(&InitConfig::default(), &mut rng);
        let mut mutated = original.clone();
        mutated.mutate(&mut rng, 1.0);

        assert_eq!(mutated.param_count(), original.param_count());
        let changed = mutated
            .params()
            .zip(original.params())
            .filter(|(a, b)| a != b)
            .count();
        assert!(changed > 0);
        assert_eq!(mutated.to_tensors().len(), 8);
    }

    #[test]
    fn test_zero_rate_mutation_is_identity() {
        let mut rng = test_rng();
        let original = random_set();
        let mut mutated = original.clone();
        mutated.mutate(&mut rng, 0.0);
        assert_eq!(mutated, original);
    }

    #[test]
    fn test_crossover_takes_genes_from_both_parents() {
        let mut rng = test_rng();
        let a = TensorSet::random(&InitConfig::default(), &mut rng);
        let b = TensorSet::random(&InitConfig::default(), &mut rng);
        let child = a.crossover(&b, &mut rng);

        let mut from_a = 0;
        let mut from_b = 0;
        for ((c, x), y) in child.params().zip(a.params()).zip(b.params()) {
            if c == x {
                from_a += 1;
            } else if c == y {
                from_b += 1;
            } else {
                panic!("child gene {c} comes from neither parent");
            }
        }
        assert!(from_a > 0 && from_b > 0);
    }

    #[test]
    fn test_serde_roundtrip_through_named_tensors() {
        let set = random_set();
        let json = serde_json::to_string(&set).expect("Serialization failed");
        let restored: TensorSet = serde_json::from_str(&json).expect("Deserialization failed");
        assert_eq!(restored.param_count(), set.param_count());
        for (a, b) in restored.params().zip(set.params()) {
            assert!((a - b).abs() < 1e-6, "{a} vs {b}");
        }
    }

    #[test]
    fn test_from_tensors_reports_missing() {
        let mut map = random_set().to_tensors();
        map.remove(W2_B);
        assert_eq!(
            TensorSet::from_tensors(&map).unwrap_err(),
            ImportError::MissingTensor(W2_B.to_string())
        );
    }
}
