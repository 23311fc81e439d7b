use ndarray::{Array1, ArrayView1, ArrayViewMut1, Zip};

/// Adam: per-parameter steps scaled by bias-corrected first and second moment estimates.
#[derive(Debug, Clone, PartialEq)]
pub struct Adam {
    learning_rate: f32,
    beta1: f32,
    beta2: f32,
    epsilon: f32,
    m: Array1<f32>,
    v: Array1<f32>,
}

impl Adam {
    /// Creates a new `Adam` rule with zeroed moments.
    ///
    /// # Arguments
    /// * `learning_rate` - Upper bound of the step of each parameter.
    /// * `beta1`, `beta2` - Decay rates of the first and second moment estimates.
    /// * `epsilon` - Keeps the denominator away from zero.
    /// * `num_params` - Parameter count of the model the moments track.
    pub fn new(learning_rate: f32, beta1: f32, beta2: f32, epsilon: f32, num_params: usize) -> Self {
        Self {
            learning_rate,
            beta1,
            beta2,
            epsilon,
            m: Array1::zeros(num_params),
            v: Array1::zeros(num_params),
        }
    }

    /// Applies the `t`-th update, `t` starting at 1.
    pub(super) fn apply(&mut self, grad: ArrayView1<f32>, params: ArrayViewMut1<f32>, t: usize) {
        let t = i32::try_from(t).unwrap_or(i32::MAX);
        let (lr, b1, b2, eps) = (self.learning_rate, self.beta1, self.beta2, self.epsilon);
        let bc1 = 1. - b1.powi(t);
        let bc2 = 1. - b2.powi(t);

        Zip::from(params)
            .and(&grad)
            .and(&mut self.m)
            .and(&mut self.v)
            .for_each(|p, &g, m, v| {
                *m = b1 * *m + (1. - b1) * g;
                *v = b2 * *v + (1. - b2) * g * g;
                *p -= lr * (*m / bc1) / ((*v / bc2).sqrt() + eps);
            });
    }
}
