use ml_core::{Result, ensure_len};
use ndarray::{Array2, ArrayView2};

use super::SparseTensor;

/// The propagation operator used to aggregate neighbour features.
#[derive(Debug, Clone, PartialEq)]
pub enum Adjacency {
    Dense(Array2<f32>),
    Sparse(SparseTensor),
}
use Adjacency::*;

impl Adjacency {
    /// Returns the `(rows, cols)` of the operator.
    pub fn shape(&self) -> (usize, usize) {
        match self {
            Dense(adj) => adj.dim(),
            Sparse(adj) => adj.shape(),
        }
    }

    /// Computes `adj · h`.
    ///
    /// # Arguments
    /// * `h` - Node representations, one row per column of the operator.
    ///
    /// # Returns
    /// The aggregated messages or a `ShapeMismatch` error.
    pub fn propagate(&self, h: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(adj) => {
                ensure_len("adjacency operand rows", h.nrows(), adj.ncols())?;
                Ok(adj.dot(&h))
            }
            Sparse(adj) => adj.matmul(h),
        }
    }

    /// Computes `adjᵀ · d`, the reverse of [`Adjacency::propagate`].
    ///
    /// # Arguments
    /// * `d` - One row per row of the operator.
    ///
    /// # Returns
    /// The back-propagated values or a `ShapeMismatch` error.
    pub fn propagate_transposed(&self, d: ArrayView2<f32>) -> Result<Array2<f32>> {
        match self {
            Dense(adj) => {
                ensure_len("adjacency operand rows", d.nrows(), adj.nrows())?;
                Ok(adj.t().dot(&d))
            }
            Sparse(adj) => adj.transposed_matmul(d),
        }
    }
}

impl From<Array2<f32>> for Adjacency {
    fn from(adj: Array2<f32>) -> Self {
        Dense(adj)
    }
}

impl From<SparseTensor> for Adjacency {
    fn from(adj: SparseTensor) -> Self {
        Sparse(adj)
    }
}

/// A single graph sample: per-node features and the operator that connects them.
#[derive(Debug, Clone, PartialEq)]
pub struct Graph {
    features: Array2<f32>,
    adjacency: Adjacency,
}

impl Graph {
    /// Creates a new `Graph`.
    ///
    /// # Arguments
    /// * `features` - A `[nodes, channels]` feature matrix.
    /// * `adjacency` - A `[nodes, nodes]` propagation operator.
    ///
    /// # Returns
    /// A `ShapeMismatch` error if the operator is not square over the feature rows.
    pub fn new(features: Array2<f32>, adjacency: impl Into<Adjacency>) -> Result<Self> {
        let adjacency = adjacency.into();
        let (rows, cols) = adjacency.shape();

        ensure_len("adjacency columns", cols, features.nrows())?;
        ensure_len("adjacency rows", rows, features.nrows())?;

        Ok(Self {
            features,
            adjacency,
        })
    }

    pub fn features(&self) -> ArrayView2<'_, f32> {
        self.features.view()
    }

    pub fn adjacency(&self) -> &Adjacency {
        &self.adjacency
    }

    /// Returns the amount of nodes in the graph.
    pub fn num_nodes(&self) -> usize {
        self.features.nrows()
    }
}
