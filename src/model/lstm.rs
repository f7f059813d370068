//! Stacked LSTM network with backpropagation through time.

use ndarray::{Array1, Array2};
use rand::Rng;
use rand::rngs::StdRng;
use serde::{Deserialize, Serialize};

use super::dense::{Activation, Dense, DenseGradients};
use super::outer;

/// Architecture hyperparameters.
///
/// Defaults mirror the production training configuration: LSTM(128) →
/// LSTM(64) with 0.2 dropout between and after them, then Dense(32, ReLU) →
/// Dense(1).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    /// Feature channels per timestep (1 for a scalar amount series).
    pub input_size: usize,
    /// Hidden sizes of the two stacked recurrent layers.
    pub hidden_sizes: [usize; 2],
    /// Width of the ReLU projection before the scalar output.
    pub dense_size: usize,
    /// Dropout rate applied to recurrent outputs during training.
    pub dropout: f64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            input_size: 1,
            hidden_sizes: [128, 64],
            dense_size: 32,
            dropout: 0.2,
        }
    }
}

/// One LSTM cell: four gates over the concatenation of input and previous
/// hidden state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmCell {
    /// Input width.
    pub input_size: usize,
    /// Hidden state width.
    pub hidden_size: usize,

    // Input gate.
    pub(crate) w_ii: Array2<f64>,
    pub(crate) w_hi: Array2<f64>,
    pub(crate) b_i: Array1<f64>,
    // Forget gate.
    pub(crate) w_if: Array2<f64>,
    pub(crate) w_hf: Array2<f64>,
    pub(crate) b_f: Array1<f64>,
    // Cell candidate.
    pub(crate) w_ig: Array2<f64>,
    pub(crate) w_hg: Array2<f64>,
    pub(crate) b_g: Array1<f64>,
    // Output gate.
    pub(crate) w_io: Array2<f64>,
    pub(crate) w_ho: Array2<f64>,
    pub(crate) b_o: Array1<f64>,
}

/// Everything one timestep's backward pass needs from the forward pass.
#[derive(Debug, Clone)]
pub(crate) struct LstmStepCache {
    x: Array1<f64>,
    h_prev: Array1<f64>,
    c_prev: Array1<f64>,
    i: Array1<f64>,
    f: Array1<f64>,
    g: Array1<f64>,
    o: Array1<f64>,
    tanh_c: Array1<f64>,
}

impl LstmCell {
    /// New cell with uniform init in `±1/sqrt(hidden)` and forget-gate bias
    /// initialized to 1.
    pub fn new(input_size: usize, hidden_size: usize, rng: &mut StdRng) -> Self {
        let limit = (1.0 / hidden_size as f64).sqrt();
        let mut mat = |rows: usize, cols: usize| {
            Array2::from_shape_fn((rows, cols), |_| rng.random_range(-limit..limit))
        };
        Self {
            input_size,
            hidden_size,
            w_ii: mat(hidden_size, input_size),
            w_hi: mat(hidden_size, hidden_size),
            b_i: Array1::zeros(hidden_size),
            w_if: mat(hidden_size, input_size),
            w_hf: mat(hidden_size, hidden_size),
            b_f: Array1::from_elem(hidden_size, 1.0),
            w_ig: mat(hidden_size, input_size),
            w_hg: mat(hidden_size, hidden_size),
            b_g: Array1::zeros(hidden_size),
            w_io: mat(hidden_size, input_size),
            w_ho: mat(hidden_size, hidden_size),
            b_o: Array1::zeros(hidden_size),
        }
    }

    /// Zeroed `(h, c)` state.
    pub fn init_state(&self) -> (Array1<f64>, Array1<f64>) {
        (
            Array1::zeros(self.hidden_size),
            Array1::zeros(self.hidden_size),
        )
    }

    /// One timestep, inference only.
    pub fn step(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>) {
        let (h, c, _) = self.step_full(x, h_prev, c_prev);
        (h, c)
    }

    /// One timestep keeping the gate values for the backward pass.
    fn step_full(
        &self,
        x: &Array1<f64>,
        h_prev: &Array1<f64>,
        c_prev: &Array1<f64>,
    ) -> (Array1<f64>, Array1<f64>, LstmStepCache) {
        let i = sigmoid(self.w_ii.dot(x) + self.w_hi.dot(h_prev) + &self.b_i);
        let f = sigmoid(self.w_if.dot(x) + self.w_hf.dot(h_prev) + &self.b_f);
        let g = (self.w_ig.dot(x) + self.w_hg.dot(h_prev) + &self.b_g).mapv(f64::tanh);
        let o = sigmoid(self.w_io.dot(x) + self.w_ho.dot(h_prev) + &self.b_o);

        let c = &f * c_prev + &i * &g;
        let tanh_c = c.mapv(f64::tanh);
        let h = &o * &tanh_c;

        let cache = LstmStepCache {
            x: x.clone(),
            h_prev: h_prev.clone(),
            c_prev: c_prev.clone(),
            i,
            f,
            g,
            o,
            tanh_c,
        };
        (h, c, cache)
    }

    /// Backward through one timestep.
    ///
    /// `dh`/`dc` are the loss gradients flowing into this step's hidden and
    /// cell state. Returns `(dx, dh_prev, dc_prev)` and accumulates weight
    /// gradients into `grads`.
    fn backward_step(
        &self,
        cache: &LstmStepCache,
        dh: &Array1<f64>,
        dc: &Array1<f64>,
        grads: &mut LstmGradients,
    ) -> (Array1<f64>, Array1<f64>, Array1<f64>) {
        // dL/dc including the path through h = o * tanh(c).
        let dc_total = dc + &(dh * &cache.o * &cache.tanh_c.mapv(|v| 1.0 - v * v));

        let do_pre = dh * &cache.tanh_c * &cache.o.mapv(|v| v * (1.0 - v));
        let di_pre = &dc_total * &cache.g * &cache.i.mapv(|v| v * (1.0 - v));
        let df_pre = &dc_total * &cache.c_prev * &cache.f.mapv(|v| v * (1.0 - v));
        let dg_pre = &dc_total * &cache.i * &cache.g.mapv(|v| 1.0 - v * v);
        let dc_prev = &dc_total * &cache.f;

        grads.w_ii += &outer(&di_pre, &cache.x);
        grads.w_hi += &outer(&di_pre, &cache.h_prev);
        grads.b_i += &di_pre;
        grads.w_if += &outer(&df_pre, &cache.x);
        grads.w_hf += &outer(&df_pre, &cache.h_prev);
        grads.b_f += &df_pre;
        grads.w_ig += &outer(&dg_pre, &cache.x);
        grads.w_hg += &outer(&dg_pre, &cache.h_prev);
        grads.b_g += &dg_pre;
        grads.w_io += &outer(&do_pre, &cache.x);
        grads.w_ho += &outer(&do_pre, &cache.h_prev);
        grads.b_o += &do_pre;

        let dx = self.w_ii.t().dot(&di_pre)
            + self.w_if.t().dot(&df_pre)
            + self.w_ig.t().dot(&dg_pre)
            + self.w_io.t().dot(&do_pre);
        let dh_prev = self.w_hi.t().dot(&di_pre)
            + self.w_hf.t().dot(&df_pre)
            + self.w_hg.t().dot(&dg_pre)
            + self.w_ho.t().dot(&do_pre);

        (dx, dh_prev, dc_prev)
    }
}

/// Gradient accumulator shaped like an [`LstmCell`]. Field names match the
/// cell's weights; the optimizer reuses the same struct for Adam moments.
#[derive(Debug, Clone)]
pub struct LstmGradients {
    pub(crate) w_ii: Array2<f64>,
    pub(crate) w_hi: Array2<f64>,
    pub(crate) b_i: Array1<f64>,
    pub(crate) w_if: Array2<f64>,
    pub(crate) w_hf: Array2<f64>,
    pub(crate) b_f: Array1<f64>,
    pub(crate) w_ig: Array2<f64>,
    pub(crate) w_hg: Array2<f64>,
    pub(crate) b_g: Array1<f64>,
    pub(crate) w_io: Array2<f64>,
    pub(crate) w_ho: Array2<f64>,
    pub(crate) b_o: Array1<f64>,
}

impl LstmGradients {
    /// Zeroed accumulator shaped like `cell`.
    pub fn zeros_like(cell: &LstmCell) -> Self {
        let mat = || Array2::zeros((cell.hidden_size, cell.hidden_size));
        Self {
            w_ii: Array2::zeros((cell.hidden_size, cell.input_size)),
            w_hi: mat(),
            b_i: Array1::zeros(cell.hidden_size),
            w_if: Array2::zeros((cell.hidden_size, cell.input_size)),
            w_hf: mat(),
            b_f: Array1::zeros(cell.hidden_size),
            w_ig: Array2::zeros((cell.hidden_size, cell.input_size)),
            w_hg: mat(),
            b_g: Array1::zeros(cell.hidden_size),
            w_io: Array2::zeros((cell.hidden_size, cell.input_size)),
            w_ho: mat(),
            b_o: Array1::zeros(cell.hidden_size),
        }
    }
}

/// Gradients (or optimizer moments) for the whole network.
#[derive(Debug, Clone)]
pub struct NetworkGradients {
    /// One accumulator per recurrent layer.
    pub cells: Vec<LstmGradients>,
    /// ReLU projection gradients.
    pub dense_hidden: DenseGradients,
    /// Output head gradients.
    pub dense_out: DenseGradients,
}

impl NetworkGradients {
    /// Zeroed accumulators shaped like `model`.
    pub fn zeros_like(model: &LstmNetwork) -> Self {
        Self {
            cells: model.cells.iter().map(LstmGradients::zeros_like).collect(),
            dense_hidden: DenseGradients::zeros_like(&model.dense_hidden),
            dense_out: DenseGradients::zeros_like(&model.dense_out),
        }
    }
}

/// Forward-pass state needed by [`LstmNetwork::backward`].
#[derive(Debug, Clone)]
pub struct ForwardCache {
    // Per layer, per timestep.
    steps: Vec<Vec<LstmStepCache>>,
    // Dropout masks on the first layer's output, per timestep.
    inter_masks: Vec<Array1<f64>>,
    // Dropout mask on the second layer's final state.
    final_mask: Array1<f64>,
    h_final_dropped: Array1<f64>,
    dense_pre: Array1<f64>,
    dense_act: Array1<f64>,
    out_pre: Array1<f64>,
    /// Scalar prediction for this window, in scaled space.
    pub prediction: f64,
}

/// The full sequence-to-one forecasting network.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LstmNetwork {
    /// Architecture this network was built with.
    pub config: ModelConfig,
    pub(crate) cells: Vec<LstmCell>,
    pub(crate) dense_hidden: Dense,
    pub(crate) dense_out: Dense,
}

impl LstmNetwork {
    /// Build a freshly initialized network from `config`.
    pub fn new(config: ModelConfig, rng: &mut StdRng) -> Self {
        let [h0, h1] = config.hidden_sizes;
        let cells = vec![
            LstmCell::new(config.input_size, h0, rng),
            LstmCell::new(h0, h1, rng),
        ];
        let dense_hidden = Dense::new(h1, config.dense_size, Activation::Relu, rng);
        let dense_out = Dense::new(config.dense_size, 1, Activation::Linear, rng);
        Self {
            config,
            cells,
            dense_hidden,
            dense_out,
        }
    }

    /// Predict the next scaled value for one window, shape `(W, input_size)`.
    ///
    /// Inference mode: dropout is inactive.
    pub fn predict(&self, window: &Array2<f64>) -> f64 {
        let (mut h0, mut c0) = self.cells[0].init_state();
        let (mut h1, mut c1) = self.cells[1].init_state();
        for t in 0..window.nrows() {
            let x = window.row(t).to_owned();
            let (h, c) = self.cells[0].step(&x, &h0, &c0);
            h0 = h;
            c0 = c;
            let (h, c) = self.cells[1].step(&h0, &h1, &c1);
            h1 = h;
            c1 = c;
        }
        let hidden = self.dense_hidden.forward(&h1);
        self.dense_out.forward(&hidden)[0]
    }

    /// Training-mode forward pass: dropout active, caches retained.
    pub fn forward_training(&self, window: &Array2<f64>, rng: &mut StdRng) -> ForwardCache {
        let seq_len = window.nrows();
        let [h0_size, h1_size] = self.config.hidden_sizes;
        let mut steps: Vec<Vec<LstmStepCache>> = vec![Vec::with_capacity(seq_len), Vec::with_capacity(seq_len)];
        let mut inter_masks = Vec::with_capacity(seq_len);

        let (mut h0, mut c0) = self.cells[0].init_state();
        let (mut h1, mut c1) = self.cells[1].init_state();
        for t in 0..seq_len {
            let x = window.row(t).to_owned();
            let (h, c, cache) = self.cells[0].step_full(&x, &h0, &c0);
            steps[0].push(cache);
            h0 = h;
            c0 = c;

            let mask = self.dropout_mask(h0_size, rng);
            let dropped = &h0 * &mask;
            inter_masks.push(mask);

            let (h, c, cache) = self.cells[1].step_full(&dropped, &h1, &c1);
            steps[1].push(cache);
            h1 = h;
            c1 = c;
        }

        let final_mask = self.dropout_mask(h1_size, rng);
        let h_final_dropped = &h1 * &final_mask;
        let (dense_pre, dense_act) = self.dense_hidden.forward_cached(&h_final_dropped);
        let (out_pre, out_act) = self.dense_out.forward_cached(&dense_act);

        ForwardCache {
            steps,
            inter_masks,
            final_mask,
            h_final_dropped,
            dense_pre,
            dense_act,
            prediction: out_act[0],
            out_pre,
        }
    }

    /// Backpropagate `d_pred = dL/d(prediction)` through the cached forward
    /// pass, accumulating into `grads`.
    pub fn backward(&self, cache: &ForwardCache, d_pred: f64, grads: &mut NetworkGradients) {
        let seq_len = cache.steps[0].len();

        let d_out = Array1::from_elem(1, d_pred);
        let d_act = self
            .dense_out
            .backward(&cache.dense_act, &cache.out_pre, &d_out, &mut grads.dense_out);
        let d_hidden = self.dense_hidden.backward(
            &cache.h_final_dropped,
            &cache.dense_pre,
            &d_act,
            &mut grads.dense_hidden,
        );

        // Second layer: loss reaches only its final hidden state.
        let mut dh = &d_hidden * &cache.final_mask;
        let mut dc = Array1::zeros(self.config.hidden_sizes[1]);
        let mut d_inputs: Vec<Array1<f64>> = Vec::with_capacity(seq_len);
        for t in (0..seq_len).rev() {
            let (dx, dh_prev, dc_prev) =
                self.cells[1].backward_step(&cache.steps[1][t], &dh, &dc, &mut grads.cells[1]);
            d_inputs.push(dx);
            dh = dh_prev;
            dc = dc_prev;
        }
        d_inputs.reverse();

        // First layer: loss reaches every timestep through the layer above.
        let mut dh = Array1::zeros(self.config.hidden_sizes[0]);
        let mut dc = Array1::zeros(self.config.hidden_sizes[0]);
        for t in (0..seq_len).rev() {
            let dh_t = &d_inputs[t] * &cache.inter_masks[t] + &dh;
            let (_, dh_prev, dc_prev) =
                self.cells[0].backward_step(&cache.steps[0][t], &dh_t, &dc, &mut grads.cells[0]);
            dh = dh_prev;
            dc = dc_prev;
        }
    }

    /// Inverted dropout mask; all-ones when the rate is zero.
    fn dropout_mask(&self, size: usize, rng: &mut StdRng) -> Array1<f64> {
        let rate = self.config.dropout;
        if rate <= 0.0 {
            return Array1::ones(size);
        }
        let keep_scale = 1.0 / (1.0 - rate);
        Array1::from_shape_fn(size, |_| {
            if rng.random::<f64>() > rate {
                keep_scale
            } else {
                0.0
            }
        })
    }
}

fn sigmoid(z: Array1<f64>) -> Array1<f64> {
    z.mapv(|v| 1.0 / (1.0 + (-v).exp()))
}
