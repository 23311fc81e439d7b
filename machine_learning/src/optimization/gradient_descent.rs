use ndarray::{ArrayView1, ArrayViewMut1};

/// Plain steepest descent: `p -= lr * g`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GradientDescent {
    learning_rate: f32,
}

impl GradientDescent {
    pub fn new(learning_rate: f32) -> Self {
        Self { learning_rate }
    }

    pub(super) fn apply(&self, grad: ArrayView1<f32>, mut params: ArrayViewMut1<f32>) {
        params.scaled_add(-self.learning_rate, &grad);
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn steps_against_the_gradient() {
        let mut params = array![1f32, 1.];

        GradientDescent::new(0.5).apply(array![2., -4.].view(), params.view_mut());

        assert_eq!(params, array![0., 3.]);
    }
}
