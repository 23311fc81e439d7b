mod gated_conv;
mod linear;

pub(crate) use gated_conv::ConvTrace;
pub use gated_conv::GatedGraphConv;
pub use linear::Linear;
