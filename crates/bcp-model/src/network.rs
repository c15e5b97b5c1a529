//! Feed-forward priority network.
//!
//! Layout: 4 inputs -> 16 (ReLU) -> 8 (ReLU) -> 1 (sigmoid). Weights live in
//! flat row-major vectors, `w[neuron * fan_in + input]`.

use bcp_common::{Error, Result};
use rand::Rng;

/// Input feature count: complaint type, chargeable flag, completion time,
/// region flag.
pub const INPUT_DIM: usize = 4;
/// First hidden layer width.
pub const HIDDEN1: usize = 16;
/// Second hidden layer width.
pub const HIDDEN2: usize = 8;

/// Trained network weights. Produced by [`crate::train::train`], consumed
/// via [`PriorityNet::predict`].
#[derive(Debug, Clone)]
pub struct PriorityNet {
    pub(crate) w1: Vec<f32>,
    pub(crate) b1: Vec<f32>,
    pub(crate) w2: Vec<f32>,
    pub(crate) b2: Vec<f32>,
    pub(crate) w3: Vec<f32>,
    pub(crate) b3: f32,
}

impl PriorityNet {
    /// Fresh network with small uniform weights in [-0.05, 0.05).
    pub(crate) fn init(rng: &mut impl Rng) -> Self {
        let mut net = PriorityNet {
            w1: vec![0.0; HIDDEN1 * INPUT_DIM],
            b1: vec![0.0; HIDDEN1],
            w2: vec![0.0; HIDDEN2 * HIDDEN1],
            b2: vec![0.0; HIDDEN2],
            w3: vec![0.0; HIDDEN2],
            b3: 0.0,
        };
        for w in net.w1.iter_mut().chain(net.w2.iter_mut()).chain(net.w3.iter_mut()) {
            *w = (rng.random::<f32>() - 0.5) * 0.1;
        }
        net
    }

    /// Raw forward pass. Returns the sigmoid output in (0, 1).
    pub fn forward(&self, features: &[f32; INPUT_DIM]) -> f32 {
        let mut hidden1 = [0.0f32; HIDDEN1];
        for h in 0..HIDDEN1 {
            let mut sum = self.b1[h];
            let base = h * INPUT_DIM;
            for i in 0..INPUT_DIM {
                sum += self.w1[base + i] * features[i];
            }
            hidden1[h] = sum.max(0.0);
        }

        let mut hidden2 = [0.0f32; HIDDEN2];
        for h in 0..HIDDEN2 {
            let mut sum = self.b2[h];
            let base = h * HIDDEN1;
            for i in 0..HIDDEN1 {
                sum += self.w2[base + i] * hidden1[i];
            }
            hidden2[h] = sum.max(0.0);
        }

        let mut logit = self.b3;
        for h in 0..HIDDEN2 {
            logit += self.w3[h] * hidden2[h];
        }

        sigmoid(logit)
    }

    /// Run inference, rejecting non-finite outputs.
    pub fn predict(&self, features: &[f32; INPUT_DIM]) -> Result<f64> {
        let out = self.forward(features);
        if !out.is_finite() {
            return Err(Error::InferenceFailed(format!(
                "non-finite output for features {features:?}"
            )));
        }
        Ok(out as f64)
    }

    /// Total trainable parameter count.
    pub fn parameter_count(&self) -> usize {
        self.w1.len() + self.b1.len() + self.w2.len() + self.b2.len() + self.w3.len() + 1
    }

    /// Net whose forward pass yields a non-finite output, for exercising
    /// inference-failure fallbacks downstream.
    #[cfg(any(test, feature = "test-utils"))]
    pub fn poisoned() -> Self {
        use rand::rngs::StdRng;
        use rand::SeedableRng;
        let mut net = Self::init(&mut StdRng::seed_from_u64(0));
        net.b3 = f32::NAN;
        net
    }
}

pub(crate) fn sigmoid(x: f32) -> f32 {
    1.0 / (1.0 + (-x).exp())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn sigmoid_is_bounded_and_centered() {
        assert!((sigmoid(0.0) - 0.5).abs() < 1e-6);
        assert!(sigmoid(100.0) <= 1.0);
        assert!(sigmoid(-100.0) >= 0.0);
    }

    #[test]
    fn fresh_network_outputs_near_half() {
        let mut rng = StdRng::seed_from_u64(7);
        let net = PriorityNet::init(&mut rng);
        let out = net.forward(&[0.2, 0.0, 1.0, 0.5]);
        assert!(out > 0.3 && out < 0.7, "got {out}");
    }

    #[test]
    fn forward_output_stays_in_unit_interval() {
        let mut rng = StdRng::seed_from_u64(11);
        let net = PriorityNet::init(&mut rng);
        for _ in 0..100 {
            let features = [
                rng.random::<f32>(),
                rng.random::<f32>(),
                rng.random::<f32>() * 3.0,
                rng.random::<f32>(),
            ];
            let out = net.forward(&features);
            assert!((0.0..=1.0).contains(&out));
        }
    }

    #[test]
    fn parameter_count_matches_layout() {
        let mut rng = StdRng::seed_from_u64(3);
        let net = PriorityNet::init(&mut rng);
        // 16*4 + 16 + 8*16 + 8 + 8 + 1
        assert_eq!(net.parameter_count(), 225);
    }

    #[test]
    fn predict_accepts_finite_outputs() {
        let mut rng = StdRng::seed_from_u64(5);
        let net = PriorityNet::init(&mut rng);
        let value = net.predict(&[0.4, 1.0, 2.0, 0.3]).unwrap();
        assert!((0.0..=1.0).contains(&value));
    }

    #[test]
    fn predict_rejects_non_finite_outputs() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut net = PriorityNet::init(&mut rng);
        net.b3 = f32::NAN;
        assert!(net.predict(&[0.1, 0.0, 1.0, 0.4]).is_err());
    }

    proptest::proptest! {
        #[test]
        fn forward_is_bounded_for_finite_inputs(
            a in -10.0f32..10.0,
            b in -10.0f32..10.0,
            c in -10.0f32..10.0,
            d in -10.0f32..10.0,
        ) {
            let mut rng = StdRng::seed_from_u64(17);
            let net = PriorityNet::init(&mut rng);
            let out = net.forward(&[a, b, c, d]);
            proptest::prop_assert!(out.is_finite());
            proptest::prop_assert!((0.0..=1.0).contains(&out));
        }
    }
}
