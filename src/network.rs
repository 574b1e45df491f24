//! Fixed-size feedforward layers and the two ensemble networks.
//!
//! Every dimension is a compile-time constant, so a layer can never be fed an
//! input of the wrong width. The only place raw, variable-length data enters
//! the pipeline is [`ingest`](crate::history::ingest).

use rand::Rng;
use rand_distr::StandardNormal;

use crate::activation::Activation;
use crate::history::{FRAME_WIDTH, HISTORY_LENGTH, SENSORS_PER_FRAME};
use crate::params::{ImportError, Tensor};

/// Width of the control network input: flattened history plus the sensor derivative.
pub const CONTROL_INPUTS: usize = FRAME_WIDTH * HISTORY_LENGTH + SENSORS_PER_FRAME;
/// Hidden units in the control network.
pub const CONTROL_HIDDEN: usize = 32;
/// Number of action components: throttle, brake, steer left, steer right.
pub const ACTION_SIZE: usize = 4;
/// Width of the predictor input: the control input followed by the raw action.
pub const PREDICTOR_INPUTS: usize = CONTROL_INPUTS + ACTION_SIZE;
/// Hidden units in the sensor predictor network.
pub const PREDICTOR_HIDDEN: usize = 24;

/// Draw one sample from `N(0, std²)`.
#[inline]
pub(crate) fn gaussian<R: Rng>(rng: &mut R, std: f32) -> f32 {
    let z: f32 = rng.sample(StandardNormal);
    z * std
}

/// A dense layer computing `input · W + b` with `W` stored row-major as `[I][O]`.
#[derive(Debug, Clone, PartialEq)]
pub struct DenseLayer<const I: usize, const O: usize> {
    weights: Box<[[f32; O]; I]>,
    bias: [f32; O],
}

impl<const I: usize, const O: usize> DenseLayer<I, O> {
    /// A layer with all weights and biases set to zero.
    #[must_use]
    pub fn zeros() -> Self {
        Self {
            weights: Box::new([[0.0; O]; I]),
            bias: [0.0; O],
        }
    }

    /// Gaussian weights with the given standard deviation and zero biases.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R, weight_std: f32) -> Self {
        let mut layer = Self::zeros();
        for row in layer.weights.iter_mut() {
            for w in row.iter_mut() {
                *w = gaussian(rng, weight_std);
            }
        }
        layer
    }

    /// Weight matrix, indexed `[input][output]`.
    #[must_use]
    pub fn weights(&self) -> &[[f32; O]; I] {
        &self.weights
    }

    /// Mutable weight matrix.
    pub fn weights_mut(&mut self) -> &mut [[f32; O]; I] {
        &mut self.weights
    }

    #[must_use]
    pub fn bias(&self) -> &[f32; O] {
        &self.bias
    }

    pub fn bias_mut(&mut self) -> &mut [f32; O] {
        &mut self.bias
    }

    /// Iterate mutably over every weight and then every bias.
    pub fn params_mut(&mut self) -> impl Iterator<Item = &mut f32> {
        self.weights.iter_mut().flatten().chain(self.bias.iter_mut())
    }

    /// Iterate over every weight and then every bias, in the same order as [`params_mut`](Self::params_mut).
    pub fn params(&self) -> impl Iterator<Item = &f32> {
        self.weights.iter().flatten().chain(self.bias.iter())
    }

    /// Compute `activation(input · W + b)`.
    #[must_use]
    pub fn forward(&self, input: &[f32; I], activation: Activation) -> [f32; O] {
        let mut out = self.bias;
        for (x, row) in input.iter().zip(self.weights.iter()) {
            for (acc, w) in out.iter_mut().zip(row) {
                *acc += x * w;
            }
        }
        activation.apply_all(&mut out);
        out
    }

    /// Export as a `[I, O]` weight tensor and an `[O]` bias tensor.
    #[must_use]
    pub fn to_tensors(&self) -> (Tensor, Tensor) {
        let weights = Tensor::new(vec![I, O], self.weights.iter().flatten().copied().collect());
        let bias = Tensor::new(vec![O], self.bias.to_vec());
        (weights, bias)
    }

    /// Rebuild a layer from named weight and bias tensors.
    ///
    /// # Errors
    ///
    /// Returns [`ImportError::ShapeMismatch`] if either tensor's shape disagrees
    /// with `[I, O]` / `[O]`, or [`ImportError::MalformedTensor`] if a tensor's
    /// data length disagrees with its own declared shape.
    pub fn from_tensors(
        weights_name: &str,
        weights: &Tensor,
        bias_name: &str,
        bias: &Tensor,
    ) -> Result<Self, ImportError> {
        weights.expect_shape(weights_name, &[I, O])?;
        bias.expect_shape(bias_name, &[O])?;

        let mut layer = Self::zeros();
        for (dst, src) in layer.weights.iter_mut().flatten().zip(weights.data()) {
            *dst = *src;
        }
        layer.bias.copy_from_slice(bias.data());
        Ok(layer)
    }
}

/// A one-hidden-layer perceptron with a `tanh` hidden layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Perceptron<const I: usize, const H: usize, const O: usize> {
    /// Input to hidden layer.
    pub hidden: DenseLayer<I, H>,
    /// Hidden to output layer.
    pub output: DenseLayer<H, O>,
}

impl<const I: usize, const H: usize, const O: usize> Perceptron<I, H, O> {
    /// Gaussian-initialised weights, zero biases.
    #[must_use]
    pub fn random<R: Rng>(rng: &mut R, weight_std: f32) -> Self {
        Self {
            hidden: DenseLayer::random(rng, weight_std),
            output: DenseLayer::random(rng, weight_std),
        }
    }

    /// Forward pass: `out_act(tanh(x · W1 + b1) · W2 + b2)`.
    #[must_use]
    pub fn forward(&self, input: &[f32; I], output_activation: Activation) -> [f32; O] {
        let h = self.hidden.forward(input, Activation::Tanh);
        self.output.forward(&h, output_activation)
    }
}

/// Control network (A): history and derivative in, sigmoid-bounded action out.
pub type ControlNetwork = Perceptron<CONTROL_INPUTS, CONTROL_HIDDEN, ACTION_SIZE>;

/// Sensor predictor network (B): control input plus raw action in, next-tick sensors out.
pub type SensorPredictor = Perceptron<PREDICTOR_INPUTS, PREDICTOR_HIDDEN, SENSORS_PER_FRAME>;

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn test_rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(42)
    }

    #[test]
    fn test_dimensions_follow_history_layout() {
        assert_eq!(CONTROL_INPUTS, 59);
        assert_eq!(PREDICTOR_INPUTS, 63);
    }

    #[test]
    fn test_dense_forward_hand_computed() {
        let mut layer: DenseLayer<2, 2> = DenseLayer::zeros();
        layer.weights_mut()[0] = [1.0, 2.0];
        layer.weights_mut()[1] = [-1.0, 0.5];
        *layer.bias_mut() = [0.25, -0.25];

        let out = layer.forward(&[2.0, 4.0], Activation::Identity);
        assert!((out[0] - (2.0 - 4.0 + 0.25)).abs() < 1e-6);
        assert!((out[1] - (4.0 + 2.0 - 0.25)).abs() < 1e-6);
    }

    #[test]
    fn test_random_layer_has_zero_bias_and_spread_weights() {
        let mut rng = test_rng();
        let layer: DenseLayer<CONTROL_INPUTS, CONTROL_HIDDEN> = DenseLayer::random(&mut rng, 0.3);
        assert!(layer.bias().iter().all(|b| *b == 0.0));

        let n = (CONTROL_INPUTS * CONTROL_HIDDEN) as f32;
        let mean: f32 = layer.weights().iter().flatten().sum::<f32>() / n;
        let var: f32 = layer
            .weights()
            .iter()
            .flatten()
            .map(|w| (w - mean).powi(2))
            .sum::<f32>()
            / n;
        assert!(mean.abs() < 0.05, "mean = {mean}");
        assert!((var.sqrt() - 0.3).abs() < 0.05, "std = {}", var.sqrt());
    }

    #[test]
    fn test_control_output_in_unit_interval() {
        let mut rng = test_rng();
        let net = ControlNetwork::random(&mut rng, 0.3);
        for fill in [0.0, 1.0, 10.0, -10.0, 1e6] {
            let out = net.forward(&[fill; CONTROL_INPUTS], Activation::Sigmoid);
            assert!(out.iter().all(|v| (0.0..=1.0).contains(v)), "{out:?}");
        }
    }

    #[test]
    fn test_tensor_roundtrip_preserves_layer() {
        let mut rng = test_rng();
        let layer: DenseLayer<3, 2> = DenseLayer::random(&mut rng, 1.0);
        let (w, b) = layer.to_tensors();
        assert_eq!(w.shape(), &[3, 2]);
        assert_eq!(b.shape(), &[2]);

        let restored = DenseLayer::<3, 2>::from_tensors("w", &w, "b", &b).unwrap();
        assert_eq!(restored, layer);
    }

    #[test]
    fn test_from_tensors_rejects_wrong_shape() {
        let w = Tensor::new(vec![2, 3], vec![0.0; 6]);
        let b = Tensor::new(vec![2], vec![0.0; 2]);
        let err = DenseLayer::<3, 2>::from_tensors("w", &w, "b", &b).unwrap_err();
        assert_eq!(
            err,
            ImportError::ShapeMismatch {
                tensor: "w".to_string(),
                expected: vec![3, 2],
                actual: vec![2, 3],
            }
        );
    }
}
