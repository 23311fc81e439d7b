use std::num::NonZeroUsize;

use ml_core::{Model, Result, ensure_len};
use ndarray::{ArrayView1, ArrayViewMut1};

use super::{Adam, GradientDescent, Momentum};
use crate::config::OptimizerConfig;

#[derive(Debug, Clone, PartialEq)]
enum UpdateRule {
    GradientDescent(GradientDescent),
    Momentum(Momentum),
    Adam(Adam),
}

/// Updates the parameters of one model from its accumulated gradient.
///
/// Stateful rules size their buffers after the model at construction, so an optimizer
/// is bound to models with that exact parameter count.
#[derive(Debug, Clone, PartialEq)]
pub struct Optimizer {
    rule: UpdateRule,
    num_params: usize,
    steps: usize,
}

impl Optimizer {
    /// Creates a new `Optimizer` for models of `num_params` parameters.
    pub fn new(config: &OptimizerConfig, num_params: NonZeroUsize) -> Self {
        let n = num_params.get();

        let rule = match *config {
            OptimizerConfig::GradientDescent { learning_rate } => {
                UpdateRule::GradientDescent(GradientDescent::new(learning_rate))
            }
            OptimizerConfig::Momentum {
                learning_rate,
                momentum,
            } => UpdateRule::Momentum(Momentum::new(learning_rate, momentum, n)),
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => UpdateRule::Adam(Adam::new(learning_rate, beta1, beta2, epsilon, n)),
        };

        Self {
            rule,
            num_params: n,
            steps: 0,
        }
    }

    /// Creates a new `Optimizer` sized after `model`.
    pub fn for_model<M: Model>(config: &OptimizerConfig, model: &M) -> Self {
        Self::new(config, model.num_params())
    }

    /// The amount of updates applied so far.
    pub fn steps(&self) -> usize {
        self.steps
    }

    /// Applies one update to the parameters of `model`.
    ///
    /// # Arguments
    /// * `model` - The model whose parameters are updated in place.
    /// * `grad` - dLoss/dParams, as accumulated by `Model::backward`.
    ///
    /// # Returns
    /// A `ShapeMismatch` error if the model or the gradient does not match the parameter
    /// count this optimizer was built for. Nothing is updated in that case.
    pub fn step<M: Model>(&mut self, model: &mut M, grad: &[f32]) -> Result<()> {
        ensure_len("model params", model.num_params().get(), self.num_params)?;
        ensure_len("gradient", grad.len(), self.num_params)?;

        let params = ArrayViewMut1::from(model.params_mut());
        let grad = ArrayView1::from(grad);
        self.steps += 1;

        match &mut self.rule {
            UpdateRule::GradientDescent(rule) => rule.apply(grad, params),
            UpdateRule::Momentum(rule) => rule.apply(grad, params),
            UpdateRule::Adam(rule) => rule.apply(grad, params, self.steps),
        }

        Ok(())
    }
}
