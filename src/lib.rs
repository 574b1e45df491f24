//! # Ensemble Racer
//!
//! An evolvable, reactive controller for a vehicle agent in a racing
//! simulation. Each tick it turns distance-sensor readings and the current
//! speed into a throttle/brake/steering action; out of band it scores itself
//! for selection and mutates into offspring.
//!
//! ## Features
//!
//! - **Two-network ensemble**: a control network maps five frames of sensor
//!   history plus the sensor derivative to an action, and a predictor network
//!   forecasts next-tick sensors from that action to anticipate danger
//! - **Anti-freeze governor**: layered overrides that force forward motion
//!   whenever the agent has been slow for too long
//! - **Racing-line shaping**: a rule-based situation classifier rewards tight
//!   lines through turns and centring on straights
//! - **Mutation-only adaptation**: Gaussian perturbation of every tensor, no
//!   gradients anywhere
//! - **Injected randomness**: every random draw comes from a caller-supplied
//!   [`rand::Rng`], so runs are reproducible with a seeded generator
//!
//! ## Quick Start
//!
//! ```rust
//! use ensemble_racer::{Brain, BrainConfig};
//! use rand::SeedableRng;
//! use rand_chacha::ChaCha8Rng;
//!
//! let mut rng = ChaCha8Rng::seed_from_u64(42);
//! let mut brain = Brain::new(BrainConfig::default(), &mut rng);
//!
//! // One simulation tick
//! brain.update_telemetry(0.0, 0.0, 120.0);
//! let action = brain.decide(&[3.0, 2.5, 2.0, 2.5, 4.0, 2.5, 2.0, 2.5, 3.0], &mut rng);
//! assert!(action.is_bounded());
//!
//! // Selection and variation
//! brain.evaluate_fitness(12.0, 1.5, 0);
//! let child = brain.offspring(&mut rng);
//! assert_eq!(child.name(), "Ensemblem");
//!
//! // Persist the child and load it elsewhere
//! let bundle = child.export_parameters();
//! let mut other = Brain::new(BrainConfig::default(), &mut rng);
//! other.import_parameters(&bundle).unwrap();
//! assert_eq!(other.genome(), child.genome());
//! ```
//!
//! ## Architecture
//!
//! The genome ([`TensorSet`]) and the episode state ([`TickState`],
//! [`RunState`]) are separate values. [`brain::step`] is the complete
//! per-tick pipeline over those values; [`Brain`] owns one of each and adds a
//! name and a score. Network dimensions are compile-time constants, so the
//! only variable-length data is the raw sensor slice handed to `decide`.
//!
//! Brains share no state. A population can be stepped, scored and mutated in
//! parallel as long as each brain gets its own generator.

pub mod action;
pub mod activation;
pub mod brain;
pub mod config;
pub mod fitness;
pub mod genome;
pub mod governor;
pub mod history;
pub mod lap;
pub mod network;
pub mod params;
pub mod situation;
pub mod state;

// Re-exports for convenience
pub use action::ActionVector;
pub use activation::Activation;
pub use brain::{Brain, TickReport};
pub use config::{BrainConfig, ConfigError, FitnessConfig, GovernorConfig, InitConfig, LapConfig};
pub use fitness::{FitnessBreakdown, FitnessInputs};
pub use genome::{Genotype, TensorSet, MUTATION_STD};
pub use governor::AntiFreezeGovernor;
pub use history::{SensorFrame, SensorHistory, HISTORY_LENGTH, SENSORS_PER_FRAME};
pub use lap::{LapEvent, LapTracker};
pub use network::{ControlNetwork, DenseLayer, Perceptron, SensorPredictor};
pub use params::{ImportError, ParameterBundle, PersistError, Tensor, TensorMap, TENSOR_NAMES};
pub use situation::Situation;
pub use state::{RunState, TickState};

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    #[test]
    fn test_genotype_trait_implementation() {
        let mut rng = ChaCha8Rng::seed_from_u64(42);
        let mut genome = TensorSet::random(&InitConfig::default(), &mut rng);

        genome.mutate(&mut rng, 1.0);

        let mut genome2 = genome.clone();
        genome2.mutate(&mut rng, 1.0);

        let child = genome.crossover(&genome2, &mut rng);
        assert_eq!(child.param_count(), genome.param_count());
    }

    #[test]
    fn test_bundle_json_roundtrip_imports() {
        let mut rng = ChaCha8Rng::seed_from_u64(123);
        let source = Brain::new(BrainConfig::default(), &mut rng).offspring(&mut rng);

        let json = source.export_parameters().to_json().expect("Serialization failed");
        let bundle = ParameterBundle::from_json(&json).expect("Deserialization failed");

        let mut target = Brain::new(BrainConfig::default(), &mut rng);
        target.import_parameters(&bundle).unwrap();
        assert_eq!(target.name(), source.name());
        for (a, b) in target.genome().params().zip(source.genome().params()) {
            assert!((a - b).abs() < 1e-6);
        }
    }
}
