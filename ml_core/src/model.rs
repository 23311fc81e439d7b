use std::num::NonZeroUsize;

use crate::Result;

/// A differentiable model that owns its flat parameter buffer.
///
/// A `Model` defines how to evaluate a function and accumulate parameter gradients.
/// It does not:
/// - access datasets,
/// - implement training loops,
/// - update its own parameters (that is left to an optimizer working on `params_mut`).
pub trait Model {
    /// Input type consumed by the model.
    type Input;

    /// Output type produced by the model.
    type Output;

    /// Error signal passed to the backward pass.
    ///
    /// For supervised learning, this is often dL/dy, but the exact meaning is
    /// defined by the caller.
    type ErrorSignal;

    /// Returns the number of scalar parameters held in `params` and expected in `grads`.
    fn num_params(&self) -> NonZeroUsize;

    /// Returns a read-only view of the model's parameters.
    fn params(&self) -> &[f32];

    /// Returns a mutable view of the model's parameters, for external optimizers.
    fn params_mut(&mut self) -> &mut [f32];

    /// Computes the model output for a given input.
    ///
    /// # Errors
    /// Returns `MlError` if invariants are violated (e.g., shape mismatch).
    fn forward(&self, input: &Self::Input) -> Result<Self::Output>;

    /// Accumulates gradients into `grads` given an error signal.
    ///
    /// Implementations must add to `grads` rather than overwrite it, enabling
    /// gradient accumulation over several samples.
    ///
    /// # Errors
    /// Returns `MlError` if invariants are violated.
    fn backward(
        &self,
        input: &Self::Input,
        error: &Self::ErrorSignal,
        grads: &mut [f32],
    ) -> Result<()>;
}
