//! Fully connected layer with an explicit backward pass.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::outer;

/// Activation applied after the affine map.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Activation {
    /// `max(0, z)`.
    Relu,
    /// Identity.
    Linear,
}

/// Dense layer `y = act(W x + b)`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Dense {
    /// Weight matrix, shape `(output, input)`.
    pub weights: Array2<f64>,
    /// Bias vector, length `output`.
    pub biases: Array1<f64>,
    /// Activation applied to the pre-activation.
    pub activation: Activation,
}

impl Dense {
    /// New layer with uniform init scaled by the input width.
    pub fn new(
        input_size: usize,
        output_size: usize,
        activation: Activation,
        rng: &mut StdRng,
    ) -> Self {
        let limit = (1.0 / input_size as f64).sqrt();
        Self {
            weights: Array2::from_shape_fn((output_size, input_size), |_| {
                rng.random_range(-limit..limit)
            }),
            biases: Array1::zeros(output_size),
            activation,
        }
    }

    /// Forward pass.
    pub fn forward(&self, x: &Array1<f64>) -> Array1<f64> {
        self.activate(self.pre_activation(x))
    }

    /// Forward pass keeping the pre-activation for the backward pass.
    pub fn forward_cached(&self, x: &Array1<f64>) -> (Array1<f64>, Array1<f64>) {
        let pre = self.pre_activation(x);
        let act = self.activate(pre.clone());
        (pre, act)
    }

    fn pre_activation(&self, x: &Array1<f64>) -> Array1<f64> {
        self.weights.dot(x) + &self.biases
    }

    fn activate(&self, mut z: Array1<f64>) -> Array1<f64> {
        if self.activation == Activation::Relu {
            z.mapv_inplace(|v| v.max(0.0));
        }
        z
    }

    /// Accumulate gradients for one sample and return `dL/dx`.
    ///
    /// `x` and `pre` must come from the matching [`Dense::forward_cached`]
    /// call; `d_out` is `dL/dy`.
    pub fn backward(
        &self,
        x: &Array1<f64>,
        pre: &Array1<f64>,
        d_out: &Array1<f64>,
        grads: &mut DenseGradients,
    ) -> Array1<f64> {
        let dz = match self.activation {
            Activation::Relu => {
                let mut dz = d_out.clone();
                for (dz, &p) in dz.iter_mut().zip(pre.iter()) {
                    if p <= 0.0 {
                        *dz = 0.0;
                    }
                }
                dz
            }
            Activation::Linear => d_out.clone(),
        };
        grads.weights += &outer(&dz, x);
        grads.biases += &dz;
        self.weights.t().dot(&dz)
    }
}

/// Per-tensor accumulator matching a [`Dense`] layer. Also used by the
/// optimizer to hold Adam moment estimates of the same shape.
#[derive(Debug, Clone)]
pub struct DenseGradients {
    /// Accumulated `dL/dW`.
    pub weights: Array2<f64>,
    /// Accumulated `dL/db`.
    pub biases: Array1<f64>,
}

impl DenseGradients {
    /// Zeroed accumulator shaped like `layer`.
    pub fn zeros_like(layer: &Dense) -> Self {
        Self {
            weights: Array2::zeros(layer.weights.raw_dim()),
            biases: Array1::zeros(layer.biases.raw_dim()),
        }
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;

    #[test]
    fn relu_zeroes_negative_preactivations() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut layer = Dense::new(2, 2, Activation::Relu, &mut rng);
        layer.weights = Array2::from_shape_vec((2, 2), vec![1.0, 0.0, -1.0, 0.0]).unwrap();
        layer.biases = Array1::zeros(2);
        let out = layer.forward(&Array1::from_vec(vec![3.0, 5.0]));
        assert_eq!(out, Array1::from_vec(vec![3.0, 0.0]));
    }

    #[test]
    fn linear_backward_produces_expected_input_gradient() {
        let mut rng = StdRng::seed_from_u64(2);
        let mut layer = Dense::new(2, 1, Activation::Linear, &mut rng);
        layer.weights = Array2::from_shape_vec((1, 2), vec![2.0, -3.0]).unwrap();
        let x = Array1::from_vec(vec![1.0, 4.0]);
        let (pre, _) = layer.forward_cached(&x);
        let mut grads = DenseGradients::zeros_like(&layer);
        let dx = layer.backward(&x, &pre, &Array1::from_vec(vec![1.0]), &mut grads);
        assert_eq!(dx, Array1::from_vec(vec![2.0, -3.0]));
        assert_eq!(grads.weights[[0, 1]], 4.0);
        assert_eq!(grads.biases[0], 1.0);
    }
}
