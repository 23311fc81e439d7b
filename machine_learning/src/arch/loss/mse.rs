use super::LossFn;

/// Squared error loss function.
#[derive(Default, Clone, Copy)]
pub struct Mse;

impl Mse {
    /// Returns a new `Mse`.
    pub fn new() -> Self {
        Self
    }
}

impl LossFn for Mse {
    fn loss(&self, score: f32, target: f32) -> f32 {
        (score - target).powi(2)
    }

    fn loss_prime(&self, score: f32, target: f32) -> f32 {
        2. * (score - target)
    }
}
