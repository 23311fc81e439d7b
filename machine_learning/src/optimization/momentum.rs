use ndarray::{Array1, ArrayView1, ArrayViewMut1};

/// Heavy-ball momentum: the velocity `v = mu * v + g` is followed instead of `g`.
#[derive(Debug, Clone, PartialEq)]
pub struct Momentum {
    learning_rate: f32,
    momentum: f32,
    velocity: Array1<f32>,
}

impl Momentum {
    /// Creates a new `Momentum` rule at rest.
    ///
    /// # Arguments
    /// * `learning_rate` - Scale of every step.
    /// * `momentum` - Fraction of the velocity kept between steps.
    /// * `num_params` - Parameter count of the model the velocity tracks.
    pub fn new(learning_rate: f32, momentum: f32, num_params: usize) -> Self {
        Self {
            learning_rate,
            momentum,
            velocity: Array1::zeros(num_params),
        }
    }

    pub(super) fn apply(&mut self, grad: ArrayView1<f32>, mut params: ArrayViewMut1<f32>) {
        self.velocity *= self.momentum;
        self.velocity += &grad;
        params.scaled_add(-self.learning_rate, &self.velocity);
    }
}
