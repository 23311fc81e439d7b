pub mod arch;
pub mod config;
pub mod graph;
pub mod initialization;
pub mod metrics;
pub mod model_selection;
pub mod optimization;

pub use ml_core::{MlError, Model, Result};
