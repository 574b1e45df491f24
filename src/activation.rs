//! Activation functions for the ensemble networks.
//!
//! Both networks use `tanh` in their hidden layer. The control network squashes
//! its output through a sigmoid so every action component lands in `[0, 1]`,
//! while the sensor predictor keeps a linear output because it regresses
//! distances rather than probabilities.

use serde::{Deserialize, Serialize};

/// Activation function applied to a layer's pre-activation sums.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum Activation {
    /// Identity function: f(x) = x
    #[default]
    Identity,
    /// Sigmoid: f(x) = 1 / (1 + e^(-x))
    Sigmoid,
    /// Hyperbolic tangent: f(x) = tanh(x)
    Tanh,
}

impl Activation {
    /// Apply this activation function to a single value.
    ///
    /// Infinite inputs saturate to the function's asymptote so bounded
    /// activations always produce finite outputs.
    #[inline]
    #[must_use]
    pub fn apply(self, x: f32) -> f32 {
        match self {
            Self::Identity => x,
            Self::Sigmoid => {
                if x == f32::INFINITY {
                    return 1.0;
                }
                if x == f32::NEG_INFINITY {
                    return 0.0;
                }
                // exp overflows f32 past ~88
                let clamped = x.clamp(-88.0, 88.0);
                1.0 / (1.0 + (-clamped).exp())
            }
            Self::Tanh => x.tanh(),
        }
    }

    /// Apply this activation in place to every element of `values`.
    #[inline]
    pub fn apply_all(self, values: &mut [f32]) {
        if self == Self::Identity {
            return;
        }
        for v in values {
            *v = self.apply(*v);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identity_passes_through() {
        assert!((Activation::Identity.apply(0.5) - 0.5).abs() < 1e-6);
        assert!((Activation::Identity.apply(-7.25) - -7.25).abs() < 1e-6);
    }

    #[test]
    fn test_sigmoid_saturates_inside_unit_interval() {
        assert!((Activation::Sigmoid.apply(0.0) - 0.5).abs() < 1e-6);
        assert!(Activation::Sigmoid.apply(10.0) > 0.99);
        assert!(Activation::Sigmoid.apply(-10.0) < 0.01);

        for x in [f32::MAX, f32::MIN, f32::INFINITY, f32::NEG_INFINITY, 1e9, -1e9] {
            let y = Activation::Sigmoid.apply(x);
            assert!((0.0..=1.0).contains(&y), "sigmoid({x}) = {y}");
        }
    }

    #[test]
    fn test_tanh_is_bounded() {
        assert!(Activation::Tanh.apply(0.0).abs() < 1e-6);
        assert!(Activation::Tanh.apply(10.0) > 0.99);
        assert!(Activation::Tanh.apply(-10.0) < -0.99);
        assert!((Activation::Tanh.apply(f32::INFINITY) - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_apply_all_matches_apply() {
        let mut values = [-2.0, -0.5, 0.0, 0.5, 2.0];
        let expected: Vec<f32> = values.iter().map(|&v| Activation::Tanh.apply(v)).collect();
        Activation::Tanh.apply_all(&mut values);
        assert_eq!(values.to_vec(), expected);
    }
}
