use super::LossFn;
use crate::arch::activations::Sigmoid;

/// Binary cross-entropy on a raw score (logit) against a `0`/`1` target.
#[derive(Default, Clone, Copy)]
pub struct BceWithLogits;

impl BceWithLogits {
    /// Returns a new `BceWithLogits`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for BceWithLogits {
    fn loss(&self, score: f32, target: f32) -> f32 {
        // max(s, 0) - s·t + ln(1 + e^-|s|) never overflows.
        score.max(0.) - score * target + (-score.abs()).exp().ln_1p()
    }

    fn loss_prime(&self, score: f32, target: f32) -> f32 {
        Sigmoid::new().f(score) - target
    }
}
