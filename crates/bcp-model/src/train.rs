//! Adam + binary cross-entropy trainer.
//!
//! Full-batch gradient descent: one optimizer step per epoch over the whole
//! (four-row) training set. Per-epoch loss is reported through an observer
//! callback so callers can stream progress events.

use bcp_common::{Error, Result};
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;
use std::time::Instant;

use crate::dataset::TrainingSet;
use crate::network::{sigmoid, PriorityNet, HIDDEN1, HIDDEN2, INPUT_DIM};

/// Training hyperparameters.
#[derive(Debug, Clone)]
pub struct TrainOptions {
    pub epochs: usize,
    pub learning_rate: f32,
    pub beta1: f32,
    pub beta2: f32,
    pub epsilon: f32,
    pub seed: u64,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            epochs: 100,
            learning_rate: 1e-3,
            beta1: 0.9,
            beta2: 0.999,
            epsilon: 1e-7,
            seed: 42,
        }
    }
}

/// Per-epoch loss observation.
#[derive(Debug, Clone, Copy)]
pub struct EpochStats {
    pub epoch: usize,
    pub loss: f64,
}

/// Summary of a completed training run.
#[derive(Debug, Clone, Serialize)]
pub struct TrainReport {
    pub epochs_run: usize,
    pub final_loss: f64,
    pub duration_ms: u64,
    pub parameter_count: usize,
}

/// Train with a no-op observer.
pub fn train(set: &TrainingSet, options: &TrainOptions) -> Result<(PriorityNet, TrainReport)> {
    train_with_observer(set, options, |_| {})
}

/// Train, reporting per-epoch loss to the observer.
///
/// Aborts with [`Error::NumericalInstability`] if the loss goes non-finite.
pub fn train_with_observer(
    set: &TrainingSet,
    options: &TrainOptions,
    mut observer: impl FnMut(EpochStats),
) -> Result<(PriorityNet, TrainReport)> {
    if set.xs.len() != set.ys.len() {
        return Err(Error::TrainingFailed(format!(
            "mismatched rows: {} feature rows vs {} labels",
            set.xs.len(),
            set.ys.len()
        )));
    }
    if set.is_empty() {
        return Err(Error::TrainingFailed("empty training set".to_string()));
    }
    if options.epochs == 0 {
        return Err(Error::TrainingFailed("epochs must be positive".to_string()));
    }

    let started = Instant::now();
    let mut rng = StdRng::seed_from_u64(options.seed);
    let mut net = PriorityNet::init(&mut rng);
    let mut adam = AdamState::new();

    let n = set.xs.len() as f32;
    let mut final_loss = f64::INFINITY;

    for epoch in 0..options.epochs {
        let mut grads = Gradients::zeroed();
        let mut loss_sum = 0.0f64;

        for (x, &y) in set.xs.iter().zip(&set.ys) {
            // Forward, keeping pre-activations for backprop.
            let mut pre1 = [0.0f32; HIDDEN1];
            let mut act1 = [0.0f32; HIDDEN1];
            for h in 0..HIDDEN1 {
                let mut sum = net.b1[h];
                let base = h * INPUT_DIM;
                for i in 0..INPUT_DIM {
                    sum += net.w1[base + i] * x[i];
                }
                pre1[h] = sum;
                act1[h] = sum.max(0.0);
            }

            let mut pre2 = [0.0f32; HIDDEN2];
            let mut act2 = [0.0f32; HIDDEN2];
            for h in 0..HIDDEN2 {
                let mut sum = net.b2[h];
                let base = h * HIDDEN1;
                for i in 0..HIDDEN1 {
                    sum += net.w2[base + i] * act1[i];
                }
                pre2[h] = sum;
                act2[h] = sum.max(0.0);
            }

            let mut logit = net.b3;
            for h in 0..HIDDEN2 {
                logit += net.w3[h] * act2[h];
            }
            let p = sigmoid(logit);

            let p_clamped = p.clamp(1e-7, 1.0 - 1e-7);
            loss_sum -=
                (y * p_clamped.ln() + (1.0 - y) * (1.0 - p_clamped).ln()) as f64;

            // Backward. Mean reduction folds 1/n into the output delta.
            let dz3 = (p - y) / n;
            grads.b3 += dz3;
            let mut d_act2 = [0.0f32; HIDDEN2];
            for h in 0..HIDDEN2 {
                grads.w3[h] += dz3 * act2[h];
                d_act2[h] = dz3 * net.w3[h];
            }

            let mut dz2 = [0.0f32; HIDDEN2];
            for h in 0..HIDDEN2 {
                dz2[h] = if pre2[h] > 0.0 { d_act2[h] } else { 0.0 };
                grads.b2[h] += dz2[h];
            }

            let mut d_act1 = [0.0f32; HIDDEN1];
            for h in 0..HIDDEN2 {
                let base = h * HIDDEN1;
                for i in 0..HIDDEN1 {
                    grads.w2[base + i] += dz2[h] * act1[i];
                    d_act1[i] += dz2[h] * net.w2[base + i];
                }
            }

            for h in 0..HIDDEN1 {
                let dz1 = if pre1[h] > 0.0 { d_act1[h] } else { 0.0 };
                grads.b1[h] += dz1;
                let base = h * INPUT_DIM;
                for i in 0..INPUT_DIM {
                    grads.w1[base + i] += dz1 * x[i];
                }
            }
        }

        let loss = loss_sum / n as f64;
        if !loss.is_finite() {
            return Err(Error::NumericalInstability(format!(
                "loss diverged at epoch {epoch}"
            )));
        }
        observer(EpochStats { epoch, loss });
        final_loss = loss;

        adam.step(&mut net, &grads, options);
    }

    let report = TrainReport {
        epochs_run: options.epochs,
        final_loss,
        duration_ms: started.elapsed().as_millis() as u64,
        parameter_count: net.parameter_count(),
    };
    Ok((net, report))
}

/// Accumulated gradients for one epoch, same layout as the network.
struct Gradients {
    w1: Vec<f32>,
    b1: Vec<f32>,
    w2: Vec<f32>,
    b2: Vec<f32>,
    w3: Vec<f32>,
    b3: f32,
}

impl Gradients {
    fn zeroed() -> Self {
        Gradients {
            w1: vec![0.0; HIDDEN1 * INPUT_DIM],
            b1: vec![0.0; HIDDEN1],
            w2: vec![0.0; HIDDEN2 * HIDDEN1],
            b2: vec![0.0; HIDDEN2],
            w3: vec![0.0; HIDDEN2],
            b3: 0.0,
        }
    }
}

/// First and second moment estimates, per parameter group.
struct AdamState {
    t: i32,
    m: Gradients,
    v: Gradients,
}

impl AdamState {
    fn new() -> Self {
        AdamState {
            t: 0,
            m: Gradients::zeroed(),
            v: Gradients::zeroed(),
        }
    }

    fn step(&mut self, net: &mut PriorityNet, grads: &Gradients, options: &TrainOptions) {
        self.t += 1;
        let t = self.t;
        adam_update(&mut net.w1, &grads.w1, &mut self.m.w1, &mut self.v.w1, t, options);
        adam_update(&mut net.b1, &grads.b1, &mut self.m.b1, &mut self.v.b1, t, options);
        adam_update(&mut net.w2, &grads.w2, &mut self.m.w2, &mut self.v.w2, t, options);
        adam_update(&mut net.b2, &grads.b2, &mut self.m.b2, &mut self.v.b2, t, options);
        adam_update(&mut net.w3, &grads.w3, &mut self.m.w3, &mut self.v.w3, t, options);
        adam_update(
            std::slice::from_mut(&mut net.b3),
            std::slice::from_ref(&grads.b3),
            std::slice::from_mut(&mut self.m.b3),
            std::slice::from_mut(&mut self.v.b3),
            t,
            options,
        );
    }
}

fn adam_update(
    params: &mut [f32],
    grads: &[f32],
    m: &mut [f32],
    v: &mut [f32],
    t: i32,
    options: &TrainOptions,
) {
    let bias1 = 1.0 - options.beta1.powi(t);
    let bias2 = 1.0 - options.beta2.powi(t);
    for i in 0..params.len() {
        let g = grads[i];
        m[i] = options.beta1 * m[i] + (1.0 - options.beta1) * g;
        v[i] = options.beta2 * v[i] + (1.0 - options.beta2) * g * g;
        let m_hat = m[i] / bias1;
        let v_hat = v[i] / bias2;
        params[i] -= options.learning_rate * m_hat / (v_hat.sqrt() + options.epsilon);
    }
}
