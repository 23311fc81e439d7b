mod bce;
mod loss_fn;
mod mse;

pub use bce::BceWithLogits;
pub use loss_fn::LossFn;
pub use mse::Mse;
