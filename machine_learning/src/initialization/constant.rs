use ml_core::Result;

use super::ParamGen;
use crate::arch::layers::Linear;

/// Sets every weight to one value and every bias to another.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ConstParamGen {
    weight: f32,
    bias: f32,
}

impl ConstParamGen {
    pub fn new(weight: f32, bias: f32) -> Self {
        Self { weight, bias }
    }
}

impl ParamGen for ConstParamGen {
    fn fill(&mut self, linear: &Linear, params: &mut [f32]) -> Result<()> {
        let (weights, biases) = linear.split_mut(params)?;
        weights.fill(self.weight);
        biases.fill(self.bias);
        Ok(())
    }
}
