pub mod activations;
pub mod layers;
pub mod loss;
mod network;

pub use network::{Gates, GatedGraphConvNet, NetOutput};
