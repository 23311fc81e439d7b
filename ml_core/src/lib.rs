mod error;
mod model;

pub use error::{ensure_len, MlError, Result};
pub use model::Model;
