//! Adam optimizer over the network's parameter tensors.

use ndarray::{Array, Dimension, Zip};

use crate::model::{LstmNetwork, NetworkGradients};

const BETA1: f64 = 0.9;
const BETA2: f64 = 0.999;
const EPSILON: f64 = 1e-8;

/// Adam state: first/second moment estimates per parameter tensor plus the
/// bias-correction step counter. The learning rate is public so the plateau
/// schedule can halve it between epochs.
#[derive(Debug, Clone)]
pub struct Adam {
    /// Current learning rate.
    pub learning_rate: f64,
    t: i32,
    m: NetworkGradients,
    v: NetworkGradients,
}

impl Adam {
    /// Fresh optimizer with zeroed moments shaped like `model`.
    pub fn new(model: &LstmNetwork, learning_rate: f64) -> Self {
        Self {
            learning_rate,
            t: 0,
            m: NetworkGradients::zeros_like(model),
            v: NetworkGradients::zeros_like(model),
        }
    }

    /// Apply one update from accumulated (already batch-averaged) gradients.
    pub fn step(&mut self, model: &mut LstmNetwork, grads: &NetworkGradients) {
        self.t += 1;
        let bc1 = 1.0 - BETA1.powi(self.t);
        let bc2 = 1.0 - BETA2.powi(self.t);
        let lr = self.learning_rate;

        macro_rules! update_cell {
            ($cell:expr, $g:expr, $m:expr, $v:expr, [$($field:ident),+]) => {
                $(update(&mut $cell.$field, &$g.$field, &mut $m.$field, &mut $v.$field, lr, bc1, bc2);)+
            };
        }

        for (idx, cell) in model.cells.iter_mut().enumerate() {
            update_cell!(
                cell,
                grads.cells[idx],
                self.m.cells[idx],
                self.v.cells[idx],
                [w_ii, w_hi, b_i, w_if, w_hf, b_f, w_ig, w_hg, b_g, w_io, w_ho, b_o]
            );
        }
        update(
            &mut model.dense_hidden.weights,
            &grads.dense_hidden.weights,
            &mut self.m.dense_hidden.weights,
            &mut self.v.dense_hidden.weights,
            lr,
            bc1,
            bc2,
        );
        update(
            &mut model.dense_hidden.biases,
            &grads.dense_hidden.biases,
            &mut self.m.dense_hidden.biases,
            &mut self.v.dense_hidden.biases,
            lr,
            bc1,
            bc2,
        );
        update(
            &mut model.dense_out.weights,
            &grads.dense_out.weights,
            &mut self.m.dense_out.weights,
            &mut self.v.dense_out.weights,
            lr,
            bc1,
            bc2,
        );
        update(
            &mut model.dense_out.biases,
            &grads.dense_out.biases,
            &mut self.m.dense_out.biases,
            &mut self.v.dense_out.biases,
            lr,
            bc1,
            bc2,
        );
    }
}

fn update<D: Dimension>(
    param: &mut Array<f64, D>,
    grad: &Array<f64, D>,
    m: &mut Array<f64, D>,
    v: &mut Array<f64, D>,
    lr: f64,
    bc1: f64,
    bc2: f64,
) {
    Zip::from(param)
        .and(grad)
        .and(m)
        .and(v)
        .for_each(|p, &g, m, v| {
            *m = BETA1 * *m + (1.0 - BETA1) * g;
            *v = BETA2 * *v + (1.0 - BETA2) * g * g;
            let m_hat = *m / bc1;
            let v_hat = *v / bc2;
            *p -= lr * m_hat / (v_hat.sqrt() + EPSILON);
        });
}

#[cfg(test)]
mod tests {
    use ndarray::Array2;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;
    use crate::model::ModelConfig;

    #[test]
    fn step_moves_parameters_against_the_gradient() {
        let mut rng = StdRng::seed_from_u64(9);
        let config = ModelConfig {
            input_size: 1,
            hidden_sizes: [3, 2],
            dense_size: 2,
            dropout: 0.0,
        };
        let mut model = LstmNetwork::new(config, &mut rng);
        let mut adam = Adam::new(&model, 0.01);

        let window = Array2::from_shape_vec((4, 1), vec![0.1, 0.2, 0.3, 0.4]).unwrap();
        let target = 0.9;
        let before = model.predict(&window);
        let err_before = (before - target).abs();

        for _ in 0..50 {
            let cache = model.forward_training(&window, &mut rng);
            let mut grads = crate::model::NetworkGradients::zeros_like(&model);
            model.backward(&cache, 2.0 * (cache.prediction - target), &mut grads);
            adam.step(&mut model, &grads);
        }

        let err_after = (model.predict(&window) - target).abs();
        assert!(
            err_after < err_before,
            "error did not shrink: {err_before} -> {err_after}"
        );
    }
}
