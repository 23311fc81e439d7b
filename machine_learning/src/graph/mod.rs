mod adjacency;
mod device;
mod normalize;
mod sparse;

pub use adjacency::{Adjacency, Graph};
pub use device::Device;
pub use normalize::{normalize_adjacencies, normalize_adjacency};
pub use sparse::{CooMatrix, CsrMatrix, SparseTensor, ToCoo, to_sparse_tensor};
