use ml_core::{Result, ensure_len};
use ndarray::{Array2, ArrayView2};

use super::Linear;
use crate::{arch::activations::ActFn, graph::Adjacency};

/// Intermediate values of a single `GatedGraphConv` forward pass.
#[derive(Debug, Clone)]
pub(crate) struct ConvTrace {
    /// Propagated messages `adj · (x·W + b_W)`.
    pub m: Array2<f32>,
    /// Gate activations `sigmoid(x·U + b_U)`.
    pub r: Array2<f32>,
    /// Gated output `m ⊙ r`.
    pub out: Array2<f32>,
}

/// A gated graph convolution: node features are transformed by `W`, aggregated over the
/// adjacency operator, and scaled element-wise by a sigmoid gate computed from the
/// untransformed input through `U`.
///
/// No activation is applied to the output.
///
/// Parameters are laid out as `[W | b_W | U | b_U]`.
#[derive(Clone, Debug)]
pub struct GatedGraphConv {
    w: Linear,
    u: Linear,
    gate_fn: ActFn,
}

impl GatedGraphConv {
    /// Creates a new `GatedGraphConv` layer.
    ///
    /// # Arguments
    /// * `in_channels` - Width of the node features consumed.
    /// * `out_channels` - Width of the node features produced.
    pub fn new(in_channels: usize, out_channels: usize) -> Self {
        let dim = (in_channels, out_channels);

        Self {
            w: Linear::new(dim),
            u: Linear::new(dim),
            gate_fn: ActFn::sigmoid(),
        }
    }

    /// Returns the amount of parameters this layer has.
    pub fn size(&self) -> usize {
        self.w.size() + self.u.size()
    }

    pub fn in_channels(&self) -> usize {
        self.w.dim().0
    }

    pub fn out_channels(&self) -> usize {
        self.w.dim().1
    }

    /// The two affine maps of the layer, in parameter order.
    pub fn linears(&self) -> [&Linear; 2] {
        [&self.w, &self.u]
    }

    fn split_params<'a>(&self, params: &'a [f32]) -> Result<(&'a [f32], &'a [f32])> {
        ensure_len("gated conv params", params.len(), self.size())?;
        Ok(params.split_at(self.w.size()))
    }

    /// Makes a forward pass through the layer.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - A `[nodes, in_channels]` feature matrix.
    /// * `adj` - A `[nodes, nodes]` propagation operator.
    ///
    /// # Returns
    /// The `[nodes, out_channels]` gated messages or a `ShapeMismatch` error.
    pub fn forward(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        adj: &Adjacency,
    ) -> Result<Array2<f32>> {
        Ok(self.trace(params, x, adj)?.out)
    }

    /// Computes the gate `sigmoid(x·U + b_U)`.
    ///
    /// Values lie in `[0, 1]`: at `f32` precision the logistic saturates to exactly `0` or
    /// `1` for pre-activations beyond roughly `±17`.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `x` - A `[nodes, in_channels]` feature matrix.
    pub fn gate(&self, params: &[f32], x: ArrayView2<f32>) -> Result<Array2<f32>> {
        let (_, pu) = self.split_params(params)?;
        let gate_fn = self.gate_fn;

        Ok(self.u.forward(pu, x)?.mapv_into(|z| gate_fn.f(z)))
    }

    pub(crate) fn trace(
        &self,
        params: &[f32],
        x: ArrayView2<f32>,
        adj: &Adjacency,
    ) -> Result<ConvTrace> {
        let (pw, _) = self.split_params(params)?;

        let h = self.w.forward(pw, x)?;
        let m = adj.propagate(h.view())?;
        let r = self.gate(params, x)?;
        ensure_len("propagated rows", m.nrows(), r.nrows())?;

        let out = &m * &r;
        Ok(ConvTrace { m, r, out })
    }

    /// Accumulates this layer's gradient and back-propagates `d_out` to its input.
    ///
    /// # Arguments
    /// * `params` - This layer's parameters.
    /// * `grad` - This layer's slice of the gradient buffer, added to.
    /// * `x` - The input given to the forward pass that produced `trace`.
    /// * `adj` - The operator given to that forward pass.
    /// * `trace` - The intermediate values of that forward pass.
    /// * `d_out` - The derivative of the loss with respect to the layer's output.
    ///
    /// # Returns
    /// The derivative of the loss with respect to `x`.
    pub(crate) fn backward(
        &self,
        params: &[f32],
        grad: &mut [f32],
        x: ArrayView2<f32>,
        adj: &Adjacency,
        trace: &ConvTrace,
        d_out: ArrayView2<f32>,
    ) -> Result<Array2<f32>> {
        let (pw, pu) = self.split_params(params)?;
        ensure_len("gated conv grad", grad.len(), self.size())?;
        let (gw, gu) = grad.split_at_mut(self.w.size());

        let d_m = &d_out * &trace.r;
        let mut d_z = &d_out * &trace.m;
        d_z.zip_mut_with(&trace.r, |d, &r| *d *= r * (1. - r));

        let d_h = adj.propagate_transposed(d_m.view())?;

        let mut dx = self.w.backward(pw, gw, x, d_h.view())?;
        dx += &self.u.backward(pu, gu, x, d_z.view())?;

        Ok(dx)
    }
}
