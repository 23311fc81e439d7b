use ml_core::{MlError, Result, ensure_len};
use ndarray::{Array2, ArrayView1, ArrayView2, ArrayViewMut1, ArrayViewMut2, Axis, linalg};

/// An affine map `x · W + b` over a flat parameter slice laid out as `[W | b]`, with `W`
/// stored row-major as `(in, out)`.
#[derive(Clone, Debug)]
pub struct Linear {
    dim: (usize, usize),
    size: usize,
}

impl Linear {
    /// Creates a new `Linear` layer.
    ///
    /// # Arguments
    /// * `dim` - The `(in, out)` dimensions of the layer.
    ///
    /// # Returns
    /// A new `Linear` instance.
    pub fn new(dim: (usize, usize)) -> Self {
        Self {
            dim,
            size: (dim.0 + 1) * dim.1,
        }
    }

    /// Returns the size of this layer.
    ///
    /// # Returns
    /// The amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.size
    }

    pub fn dim(&self) -> (usize, usize) {
        self.dim
    }

    /// Splits a parameter slice of this layer into its weights and biases.
    ///
    /// # Returns
    /// A `ShapeMismatch` error if `params` does not hold exactly `size` values.
    pub fn split_mut<'a>(&self, params: &'a mut [f32]) -> Result<(&'a mut [f32], &'a mut [f32])> {
        ensure_len("linear params", params.len(), self.size)?;
        Ok(params.split_at_mut(self.size - self.dim.1))
    }

    /// Applies the affine map to every row of `x`.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - A `[rows, in]` input.
    ///
    /// # Returns
    /// The `[rows, out]` output or a `ShapeMismatch` error.
    pub fn forward(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        ensure_len("linear input columns", x.ncols(), self.dim.0)?;
        let (w, b) = self.view_params(params)?;

        let mut z = Array2::zeros((x.nrows(), self.dim.1));
        linalg::general_mat_mul(1.0, &x, &w, 0.0, &mut z);
        z += &b;

        Ok(z)
    }

    /// Accumulates this layer's gradient and back-propagates `d` to its input.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's slice of the gradient buffer, added to.
    /// * `x` - The input given to `forward`.
    /// * `d` - The derivative of the loss with respect to the output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to `x`.
    pub fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        d: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        ensure_len("linear delta rows", d.nrows(), x.nrows())?;
        ensure_len("linear delta columns", d.ncols(), self.dim.1)?;

        let (mut dw, mut db) = self.view_grad(grad)?;
        linalg::general_mat_mul(1.0, &x.t(), &d, 1.0, &mut dw);
        db += &d.sum_axis(Axis(0));

        let (w, _) = self.view_params(params)?;
        Ok(d.dot(&w.t()))
    }

    /// Gives a view of the raw gradient slice as the delta weights and delta biases of this layer.
    fn view_grad<'a>(
        &self,
        grad: &'a mut [f32],
    ) -> Result<(ArrayViewMut2<'a, f32>, ArrayViewMut1<'a, f32>)> {
        ensure_len("linear grad", grad.len(), self.size)?;

        let (dw_raw, db_raw) = grad.split_at_mut(self.size - self.dim.1);
        let dw = ArrayViewMut2::from_shape(self.dim, dw_raw)
            .map_err(|_| MlError::InvalidInput("linear gradient layout"))?;
        let db = ArrayViewMut1::from_shape(self.dim.1, db_raw)
            .map_err(|_| MlError::InvalidInput("linear gradient layout"))?;

        Ok((dw, db))
    }

    /// Gives a view of the raw parameter slice as the weights and biases of this layer.
    fn view_params<'a>(
        &self,
        params: &'a [f32],
    ) -> Result<(ArrayView2<'a, f32>, ArrayView1<'a, f32>)> {
        ensure_len("linear params", params.len(), self.size)?;

        let (w_raw, b_raw) = params.split_at(self.size - self.dim.1);
        let weights = ArrayView2::from_shape(self.dim, w_raw)
            .map_err(|_| MlError::InvalidInput("linear parameter layout"))?;
        let biases = ArrayView1::from_shape(self.dim.1, b_raw)
            .map_err(|_| MlError::InvalidInput("linear parameter layout"))?;

        Ok((weights, biases))
    }
}

#[cfg(test)]
mod tests {
    use ndarray::array;

    use super::*;

    #[test]
    fn forward_is_affine() {
        let linear = Linear::new((2, 3));
        // W = [[1, 2, 3], [4, 5, 6]], b = [0.5, 0, -1]
        let params = [1., 2., 3., 4., 5., 6., 0.5, 0., -1.];
        let x = array![[1., 0.], [1., 1.]];

        let z = linear.forward(&params, x.view()).unwrap();

        assert_eq!(z, array![[1.5f32, 2., 2.], [5.5, 7., 8.]]);
    }

    #[test]
    fn backward_accumulates_gradient() {
        let linear = Linear::new((2, 1));
        let params = [2., -1., 0.5];
        let x = array![[1., 3.], [2., 0.]];
        let d = array![[1.], [-1.]];
        let mut grad = [10., 0., 0.];

        let dx = linear.backward(&params, &mut grad, x.view(), d.view()).unwrap();

        // dW = xᵀ·d = [-1, 3], db = 0, added on top of the existing buffer.
        assert_eq!(grad, [9., 3., 0.]);
        assert_eq!(dx, array![[2f32, -1.], [-2., 1.]]);
    }

    #[test]
    fn rejects_wrong_input_width() {
        let linear = Linear::new((3, 1));
        let x = Array2::<f32>::zeros((2, 2));

        assert!(linear.forward(&[0.; 4], x.view()).is_err());
        assert!(Linear::new((2, 1)).forward(&[0.; 2], x.view()).is_err());
    }
}
