/// A loss over a single scalar score and its target.
pub trait LossFn {
    fn loss(&self, score: f32, target: f32) -> f32;

    /// The derivative of the loss with respect to `score`, the error signal fed to
    /// `Model::backward`.
    fn loss_prime(&self, score: f32, target: f32) -> f32;
}
