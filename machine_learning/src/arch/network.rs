use std::num::NonZeroUsize;

use ml_core::{MlError, Model, Result, ensure_len};
use ndarray::{Array2, ArrayView2, Axis, array};

use super::{
    activations::ActFn,
    layers::{ConvTrace, GatedGraphConv, Linear},
};
use crate::{
    config::ModelConfig,
    graph::{Adjacency, Graph},
    initialization::ParamGen,
};

/// The gate activations applied by each convolution during a forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct Gates {
    /// `[nodes, hidden_channels]` gate of the first convolution.
    pub first: Array2<f32>,
    /// `[nodes, out_channels]` gate of the second convolution.
    pub second: Array2<f32>,
}

/// The result of a forward pass.
#[derive(Debug, Clone, PartialEq)]
pub struct NetOutput {
    pub score: f32,
    /// Only present when the network exposes its gates.
    pub gates: Option<Gates>,
}

/// Every intermediate value of a forward pass, kept for the backward pass.
struct Trace {
    conv1: ConvTrace,
    a1: Array2<f32>,
    conv2: ConvTrace,
    pooled: Array2<f32>,
    score: f32,
}

/// A two-layer gated graph convolution network producing one score per graph.
///
/// ```text
/// a1 = relu(conv1(x, adj))
/// a2 = relu(conv2(a1, adj))
/// score = fc(mean_rows(a2))
/// ```
///
/// The network owns its flat parameter buffer, laid out as `[conv1 | conv2 | fc]`.
#[derive(Clone, Debug)]
pub struct GatedGraphConvNet {
    conv1: GatedGraphConv,
    conv2: GatedGraphConv,
    fc: Linear,
    act_fn: ActFn,
    expose_gates: bool,
    params: Vec<f32>,
}

impl GatedGraphConvNet {
    /// Creates a new `GatedGraphConvNet`, initializing its parameters with `param_gen`.
    ///
    /// # Arguments
    /// * `in_channels` - Width of the input node features.
    /// * `hidden_channels` - Width produced by the first convolution.
    /// * `out_channels` - Width produced by the second convolution.
    /// * `param_gen` - The generator of the initial parameters, called once per affine map.
    ///
    /// # Returns
    /// An error if a channel count is zero or the generator fails.
    pub fn new(
        in_channels: usize,
        hidden_channels: usize,
        out_channels: usize,
        param_gen: &mut dyn ParamGen,
    ) -> Result<Self> {
        let mut net = Self::layout(in_channels, hidden_channels, out_channels)?;
        let params = param_gen.generate(&net.linears())?;

        net.params = params;
        Ok(net)
    }

    /// Creates a new `GatedGraphConvNet` with externally provided parameters.
    ///
    /// # Returns
    /// A `ShapeMismatch` error if `params` does not match the layout of the network.
    pub fn with_params(
        in_channels: usize,
        hidden_channels: usize,
        out_channels: usize,
        params: Vec<f32>,
    ) -> Result<Self> {
        let mut net = Self::layout(in_channels, hidden_channels, out_channels)?;
        ensure_len("network params", params.len(), net.size())?;

        net.params = params;
        Ok(net)
    }

    /// Creates a new `GatedGraphConvNet` from its configuration, initializing the
    /// parameters with the configured scheme and seed.
    pub fn from_config(config: &ModelConfig) -> Result<Self> {
        let mut param_gen = config.init.param_gen(config.seed);

        let net = Self::new(
            config.in_channels,
            config.hidden_channels,
            config.out_channels,
            param_gen.as_mut(),
        )?;

        log::debug!(
            "built gated graph conv net {}-{}-{} with {} parameters on {}",
            config.in_channels,
            config.hidden_channels,
            config.out_channels,
            net.size(),
            config.device
        );

        Ok(net.with_gates(config.expose_gates))
    }

    /// Sets whether forward passes report the gate activations.
    pub fn with_gates(mut self, expose_gates: bool) -> Self {
        self.expose_gates = expose_gates;
        self
    }

    fn layout(in_channels: usize, hidden_channels: usize, out_channels: usize) -> Result<Self> {
        if in_channels == 0 || hidden_channels == 0 || out_channels == 0 {
            return Err(MlError::InvalidInput("channel counts must be non-zero"));
        }

        Ok(Self {
            conv1: GatedGraphConv::new(in_channels, hidden_channels),
            conv2: GatedGraphConv::new(hidden_channels, out_channels),
            fc: Linear::new((out_channels, 1)),
            act_fn: ActFn::relu(),
            expose_gates: true,
            params: Vec::new(),
        })
    }

    /// Returns the amount of parameters of the network.
    pub fn size(&self) -> usize {
        self.conv1.size() + self.conv2.size() + self.fc.size()
    }

    /// Every affine map of the network, in parameter order.
    pub fn linears(&self) -> Vec<&Linear> {
        let [w1, u1] = self.conv1.linears();
        let [w2, u2] = self.conv2.linears();
        vec![w1, u1, w2, u2, &self.fc]
    }

    pub fn in_channels(&self) -> usize {
        self.conv1.in_channels()
    }

    /// Computes only the score of `graph`.
    pub fn score(&self, graph: &Graph) -> Result<f32> {
        Ok(self.trace(graph.features(), graph.adjacency())?.score)
    }

    /// Splits the parameter buffer into the slices of each layer.
    fn split<'a>(&self, params: &'a [f32]) -> (&'a [f32], &'a [f32], &'a [f32]) {
        let (p1, rest) = params.split_at(self.conv1.size());
        let (p2, pfc) = rest.split_at(self.conv2.size());
        (p1, p2, pfc)
    }

    fn relu(&self, z: &Array2<f32>) -> Array2<f32> {
        let act_fn = self.act_fn;
        z.mapv(|z| act_fn.f(z))
    }

    fn trace(&self, x: ArrayView2<f32>, adj: &Adjacency) -> Result<Trace> {
        ensure_len("feature columns", x.ncols(), self.in_channels())?;
        if x.nrows() == 0 {
            return Err(MlError::InvalidInput("graph has no nodes"));
        }

        let (p1, p2, pfc) = self.split(&self.params);

        let conv1 = self.conv1.trace(p1, x, adj)?;
        let a1 = self.relu(&conv1.out);

        let conv2 = self.conv2.trace(p2, a1.view(), adj)?;
        let a2 = self.relu(&conv2.out);

        let pooled = a2
            .mean_axis(Axis(0))
            .ok_or(MlError::InvalidInput("graph has no nodes"))?
            .insert_axis(Axis(0));

        let score = self.fc.forward(pfc, pooled.view())?[[0, 0]];

        Ok(Trace {
            conv1,
            a1,
            conv2,
            pooled,
            score,
        })
    }
}

impl Model for GatedGraphConvNet {
    type Input = Graph;
    type Output = NetOutput;
    type ErrorSignal = f32;

    fn num_params(&self) -> NonZeroUsize {
        // The projection bias alone keeps the count above zero.
        NonZeroUsize::new(self.params.len()).unwrap_or(NonZeroUsize::MIN)
    }

    fn params(&self) -> &[f32] {
        &self.params
    }

    fn params_mut(&mut self) -> &mut [f32] {
        &mut self.params
    }

    fn forward(&self, graph: &Graph) -> Result<NetOutput> {
        let Trace {
            conv1,
            conv2,
            score,
            ..
        } = self.trace(graph.features(), graph.adjacency())?;

        let gates = self.expose_gates.then(|| Gates {
            first: conv1.r,
            second: conv2.r,
        });

        Ok(NetOutput { score, gates })
    }

    fn backward(&self, graph: &Graph, d_score: &f32, grads: &mut [f32]) -> Result<()> {
        ensure_len("network grads", grads.len(), self.size())?;

        let x = graph.features();
        let adj = graph.adjacency();
        let trace = self.trace(x, adj)?;

        let (p1, p2, pfc) = self.split(&self.params);
        let (g1, rest) = grads.split_at_mut(self.conv1.size());
        let (g2, gfc) = rest.split_at_mut(self.conv2.size());

        let d_out = array![[*d_score]];
        let d_pooled = self.fc.backward(pfc, gfc, trace.pooled.view(), d_out.view())?;

        let nodes = x.nrows();
        let act_fn = self.act_fn;

        let mut d_z2 = Array2::from_shape_fn(trace.conv2.out.dim(), |(_, j)| {
            d_pooled[[0, j]] / nodes as f32
        });
        d_z2.zip_mut_with(&trace.conv2.out, |d, &z| *d *= act_fn.df(z));

        let mut d_z1 = self.conv2.backward(
            p2,
            g2,
            trace.a1.view(),
            adj,
            &trace.conv2,
            d_z2.view(),
        )?;
        d_z1.zip_mut_with(&trace.conv1.out, |d, &z| *d *= act_fn.df(z));

        self.conv1
            .backward(p1, g1, x, adj, &trace.conv1, d_z1.view())?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use rand::{SeedableRng, rngs::StdRng};

    use super::*;
    use crate::initialization::{ConstParamGen, RandParamGen, Scheme};

    const SIZE: usize = 37;

    fn wavy_params(size: usize) -> Vec<f32> {
        (0..size).map(|i| ((i as f32) * 0.37).sin() * 0.8).collect()
    }

    /// Strictly positive parameters keep every pre-activation away from the ReLU kink
    /// when the features and operator are non-negative.
    fn positive_params(size: usize) -> Vec<f32> {
        (0..size)
            .map(|i| 0.1 + 0.5 * ((i as f32) * 0.37).sin().abs())
            .collect()
    }

    #[test]
    fn parameter_count_matches_layout() {
        let mut param_gen = ConstParamGen::new(0.1, 0.);
        let net = GatedGraphConvNet::new(3, 4, 2, &mut param_gen).unwrap();

        // conv1: 2 * (3 + 1) * 4, conv2: 2 * (4 + 1) * 2, fc: (2 + 1) * 1
        assert_eq!(net.size(), 32 + 20 + 3);
        assert_eq!(net.num_params().get(), 55);
        assert_eq!(net.linears().len(), 5);
    }

    #[test]
    fn invalid_initialization_is_an_error() {
        let mut param_gen = RandParamGen::new(
            StdRng::seed_from_u64(0),
            Scheme::Uniform { low: 1., high: 0. },
        );

        assert!(matches!(
            GatedGraphConvNet::new(3, 4, 2, &mut param_gen),
            Err(MlError::Init(_))
        ));
        assert!(GatedGraphConvNet::with_params(3, 4, 2, vec![0.; 54]).is_err());
        assert!(GatedGraphConvNet::with_params(0, 4, 2, vec![]).is_err());
    }

    #[test]
    fn forward_reports_gates_only_when_exposed() {
        let net = GatedGraphConvNet::with_params(2, 3, 2, wavy_params(SIZE)).unwrap();
        let graph = Graph::new(
            array![[1., 0.], [0., 1.], [1., 1.]],
            array![[0.5f32, 0.5, 0.], [0.5, 0., 0.5], [0., 0.5, 0.5]],
        )
        .unwrap();

        let out = net.forward(&graph).unwrap();
        let gates = out.gates.unwrap();
        assert_eq!(gates.first.dim(), (3, 3));
        assert_eq!(gates.second.dim(), (3, 2));
        assert!(gates.first.iter().chain(&gates.second).all(|&g| g > 0. && g < 1.));

        let net = net.with_gates(false);
        let out = net.forward(&graph).unwrap();
        assert!(out.gates.is_none());
        assert_eq!(out.score, net.score(&graph).unwrap());
    }

    #[test]
    fn backward_matches_finite_differences() {
        let mut net = GatedGraphConvNet::with_params(2, 3, 2, positive_params(SIZE)).unwrap();
        let graph = Graph::new(
            array![[1., 0.5], [0.3, 1.2], [0.7, 0.]],
            array![[0.5f32, 0.5, 0.], [0.25, 0.5, 0.25], [0., 0.5, 0.5]],
        )
        .unwrap();

        let mut grads = vec![0.; net.size()];
        net.backward(&graph, &1., &mut grads).unwrap();

        let eps = 1e-3;
        for i in 0..net.size() {
            let original = net.params()[i];

            net.params_mut()[i] = original + eps;
            let up = net.score(&graph).unwrap();
            net.params_mut()[i] = original - eps;
            let down = net.score(&graph).unwrap();
            net.params_mut()[i] = original;

            let numeric = (up - down) / (2. * eps);
            assert!(
                (numeric - grads[i]).abs() < 5e-3 * (1. + grads[i].abs()),
                "param {i}: numeric {numeric} vs analytic {}",
                grads[i]
            );
        }
    }

    #[test]
    fn rejects_empty_graphs_and_wrong_widths() {
        let net = GatedGraphConvNet::with_params(2, 3, 2, wavy_params(SIZE)).unwrap();

        let empty = Graph::new(Array2::zeros((0, 2)), Array2::<f32>::zeros((0, 0))).unwrap();
        assert!(net.forward(&empty).is_err());

        let wide = Graph::new(Array2::zeros((2, 3)), Array2::<f32>::eye(2)).unwrap();
        assert!(net.forward(&wide).is_err());
    }
}
