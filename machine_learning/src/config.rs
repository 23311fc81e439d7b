use std::{fs, path::Path};

use ml_core::{MlError, Result};
use rand::{SeedableRng, rngs::StdRng};
use serde::{Deserialize, Serialize};

use crate::{
    arch::activations::Sigmoid,
    graph::Device,
    initialization::{ConstParamGen, ParamGen, RandParamGen, Scheme},
};

/// How the parameters of every affine map of the network are initialized.
///
/// Fan-based schemes read `fan_in`/`fan_out` from each map's dimensions.
#[derive(Debug, Default, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum InitConfig {
    /// Uniform over `[-1/sqrt(fan_in), 1/sqrt(fan_in))`.
    #[default]
    FanInUniform,
    Const {
        weight: f32,
        #[serde(default)]
        bias: f32,
    },
    Uniform {
        low: f32,
        high: f32,
    },
    Normal {
        mean: f32,
        std_dev: f32,
    },
    XavierUniform,
    Xavier,
    Kaiming,
    Lecun,
}

impl InitConfig {
    /// Resolves the parameter generator of this scheme.
    ///
    /// # Arguments
    /// * `seed` - Fixes the random schemes when set; otherwise they draw from OS entropy.
    pub fn param_gen(&self, seed: Option<u64>) -> Box<dyn ParamGen> {
        let scheme = match *self {
            InitConfig::Const { weight, bias } => return Box::new(ConstParamGen::new(weight, bias)),
            InitConfig::FanInUniform => Scheme::FanInUniform,
            InitConfig::Uniform { low, high } => Scheme::Uniform { low, high },
            InitConfig::Normal { mean, std_dev } => Scheme::Normal { mean, std_dev },
            InitConfig::XavierUniform => Scheme::XavierUniform,
            InitConfig::Xavier => Scheme::Xavier,
            InitConfig::Kaiming => Scheme::Kaiming,
            InitConfig::Lecun => Scheme::Lecun,
        };

        let rng = match seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };

        Box::new(RandParamGen::new(rng, scheme))
    }
}

fn default_beta1() -> f32 {
    0.9
}

fn default_beta2() -> f32 {
    0.999
}

fn default_epsilon() -> f32 {
    1e-8
}

/// The update rule applied by an `Optimizer`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum OptimizerConfig {
    GradientDescent {
        learning_rate: f32,
    },
    Momentum {
        learning_rate: f32,
        momentum: f32,
    },
    Adam {
        learning_rate: f32,
        #[serde(default = "default_beta1")]
        beta1: f32,
        #[serde(default = "default_beta2")]
        beta2: f32,
        #[serde(default = "default_epsilon")]
        epsilon: f32,
    },
}

impl Default for OptimizerConfig {
    fn default() -> Self {
        OptimizerConfig::Adam {
            learning_rate: 0.01,
            beta1: default_beta1(),
            beta2: default_beta2(),
            epsilon: default_epsilon(),
        }
    }
}

impl OptimizerConfig {
    fn validate(&self) -> Result<()> {
        let learning_rate = match *self {
            OptimizerConfig::GradientDescent { learning_rate } => learning_rate,
            OptimizerConfig::Momentum {
                learning_rate,
                momentum,
            } => {
                if !(0. ..1.).contains(&momentum) {
                    return Err(MlError::InvalidConfig(format!(
                        "momentum must be within [0, 1), got {momentum}"
                    )));
                }
                learning_rate
            }
            OptimizerConfig::Adam {
                learning_rate,
                beta1,
                beta2,
                epsilon,
            } => {
                if !(0. ..1.).contains(&beta1) || !(0. ..1.).contains(&beta2) {
                    return Err(MlError::InvalidConfig(format!(
                        "adam betas must be within [0, 1), got {beta1} and {beta2}"
                    )));
                }
                if !(epsilon > 0.) {
                    return Err(MlError::InvalidConfig(format!(
                        "adam epsilon must be positive, got {epsilon}"
                    )));
                }
                learning_rate
            }
        };

        if !(learning_rate.is_finite() && learning_rate > 0.) {
            return Err(MlError::InvalidConfig(format!(
                "learning rate must be positive, got {learning_rate}"
            )));
        }

        Ok(())
    }
}

/// How the demo fits a network on each training fold.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrainConfig {
    pub optimizer: OptimizerConfig,
    /// Passes over the training graphs of a fold.
    pub epochs: usize,
}

impl Default for TrainConfig {
    fn default() -> Self {
        Self {
            optimizer: OptimizerConfig::default(),
            epochs: 15,
        }
    }
}

fn default_true() -> bool {
    true
}

/// The shape and initialization of a `GatedGraphConvNet`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelConfig {
    pub in_channels: usize,
    pub hidden_channels: usize,
    pub out_channels: usize,
    #[serde(default)]
    pub init: InitConfig,
    #[serde(default = "default_true")]
    pub expose_gates: bool,
    #[serde(default)]
    pub device: Device,
    #[serde(default)]
    pub seed: Option<u64>,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            in_channels: 4,
            hidden_channels: 16,
            out_channels: 8,
            init: InitConfig::default(),
            expose_gates: true,
            device: Device::default(),
            seed: None,
        }
    }
}

/// How a model is evaluated with cross-validation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// The amount of folds, at least two.
    pub folds: usize,
    /// Cutoff on the sigmoid of a score above which a sample is predicted positive.
    pub threshold: f32,
    /// Normalize adjacencies as `D^-1/2 A D^-1/2` instead of `D^-1 A`.
    pub symmetric: bool,
    /// Regression targets of the negative and positive class.
    pub scores: [f32; 2],
    pub seed: Option<u64>,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            folds: 5,
            threshold: 0.5,
            symmetric: false,
            scores: [-1., 1.],
            seed: None,
        }
    }
}

impl EvalConfig {
    /// Maps a `0`/`1` class label to its configured score.
    pub fn label_to_score(&self, label: u8) -> Result<f32> {
        match label {
            0 | 1 => Ok(self.scores[label as usize]),
            _ => Err(MlError::InvalidInput("labels must be 0 or 1")),
        }
    }

    /// Turns a raw score into a `0`/`1` prediction.
    pub fn predict(&self, score: f32) -> u8 {
        (Sigmoid::new().f(score) >= self.threshold) as u8
    }
}

/// The full configuration of an evaluation run.
#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub eval: EvalConfig,
    #[serde(default)]
    pub train: TrainConfig,
}

impl Config {
    /// Parses and validates a configuration from a JSON string.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration from a JSON file.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    /// Checks every value is within its valid range.
    ///
    /// # Returns
    /// An `InvalidConfig` error describing the first offending value.
    pub fn validate(&self) -> Result<()> {
        let ModelConfig {
            in_channels,
            hidden_channels,
            out_channels,
            ..
        } = self.model;

        if in_channels == 0 || hidden_channels == 0 || out_channels == 0 {
            return Err(MlError::InvalidConfig(format!(
                "channel counts must be non-zero, got {in_channels}-{hidden_channels}-{out_channels}"
            )));
        }

        if self.eval.folds < 2 {
            return Err(MlError::InvalidConfig(format!(
                "folds must be at least 2, got {}",
                self.eval.folds
            )));
        }

        if !(0. ..=1.).contains(&self.eval.threshold) {
            return Err(MlError::InvalidConfig(format!(
                "threshold must be within [0, 1], got {}",
                self.eval.threshold
            )));
        }

        if self.eval.scores.iter().any(|s| !s.is_finite()) {
            return Err(MlError::InvalidConfig("scores must be finite".into()));
        }

        if self.train.epochs == 0 {
            return Err(MlError::InvalidConfig("epochs must be at least 1".into()));
        }

        self.train.optimizer.validate()?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arch::layers::Linear;

    #[test]
    fn fills_defaults() {
        let config = Config::from_json_str(
            r#"{ "model": { "in_channels": 3, "hidden_channels": 4, "out_channels": 2 } }"#,
        )
        .unwrap();

        assert_eq!(config.model.init, InitConfig::FanInUniform);
        assert!(config.model.expose_gates);
        assert_eq!(config.model.device, Device::Cpu);
        assert_eq!(config.eval, EvalConfig::default());
    }

    #[test]
    fn parses_tagged_init() {
        let config = Config::from_json_str(
            r#"{
                "model": {
                    "in_channels": 3,
                    "hidden_channels": 4,
                    "out_channels": 2,
                    "init": { "kind": "normal", "mean": 0.0, "std_dev": 0.1 },
                    "expose_gates": false,
                    "seed": 9
                },
                "eval": { "folds": 10, "symmetric": true }
            }"#,
        )
        .unwrap();

        assert_eq!(
            config.model.init,
            InitConfig::Normal {
                mean: 0.,
                std_dev: 0.1
            }
        );
        assert!(!config.model.expose_gates);
        assert_eq!(config.model.seed, Some(9));
        assert_eq!(config.eval.folds, 10);
        assert!(config.eval.symmetric);
        assert_eq!(config.eval.threshold, 0.5);
    }

    #[test]
    fn rejects_out_of_range_values() {
        let mut config = Config::default();
        config.eval.folds = 1;
        assert!(matches!(config.validate(), Err(MlError::InvalidConfig(_))));

        let mut config = Config::default();
        config.eval.threshold = 1.5;
        assert!(matches!(config.validate(), Err(MlError::InvalidConfig(_))));

        let mut config = Config::default();
        config.model.hidden_channels = 0;
        assert!(matches!(config.validate(), Err(MlError::InvalidConfig(_))));

        let mut config = Config::default();
        config.train.epochs = 0;
        assert!(matches!(config.validate(), Err(MlError::InvalidConfig(_))));
    }

    #[test]
    fn unknown_devices_fail_to_parse() {
        let result = Config::from_json_str(
            r#"{ "model": { "in_channels": 1, "hidden_channels": 1, "out_channels": 1, "device": "cuda" } }"#,
        );

        assert!(matches!(result, Err(MlError::Json(_))));
    }

    #[test]
    fn maps_labels_to_scores() {
        let eval = EvalConfig::default();

        assert_eq!(eval.label_to_score(0).unwrap(), -1.);
        assert_eq!(eval.label_to_score(1).unwrap(), 1.);
        assert!(eval.label_to_score(2).is_err());
    }

    #[test]
    fn predicts_on_the_sigmoid_of_the_score() {
        let eval = EvalConfig::default();

        assert_eq!(eval.predict(0.), 1);
        assert_eq!(eval.predict(-0.1), 0);
        assert_eq!(eval.predict(3.), 1);
        assert_eq!(eval.predict(-1000.), 0);

        // Saturated scores still compare against the cutoff.
        let strict = EvalConfig {
            threshold: 1.,
            ..EvalConfig::default()
        };
        assert_eq!(strict.predict(1000.), 1);
        assert_eq!(strict.predict(3.), 0);
    }

    #[test]
    fn param_gen_initializes_every_linear() {
        let linears = [Linear::new((2, 3)), Linear::new((3, 1))];
        let refs: Vec<&Linear> = linears.iter().collect();

        let params = InitConfig::FanInUniform
            .param_gen(Some(1))
            .generate(&refs)
            .unwrap();

        assert_eq!(params.len(), 13);
        // First map: fan_in 2, second map: fan_in 3.
        let (first, second) = params.split_at(9);
        assert!(first.iter().all(|p| p.abs() <= 1. / 2f32.sqrt()));
        assert!(second.iter().all(|p| p.abs() <= 1. / 3f32.sqrt()));
    }

    #[test]
    fn const_init_sets_weights_and_biases() {
        let linear = Linear::new((1, 1));

        let params = InitConfig::Const {
            weight: 0.3,
            bias: 0.,
        }
        .param_gen(None)
        .generate(&[&linear])
        .unwrap();

        assert_eq!(params, [0.3, 0.]);
    }

    #[test]
    fn seeded_init_is_reproducible() {
        let linear = Linear::new((4, 4));

        let a = InitConfig::Kaiming
            .param_gen(Some(5))
            .generate(&[&linear])
            .unwrap();
        let b = InitConfig::Kaiming
            .param_gen(Some(5))
            .generate(&[&linear])
            .unwrap();

        assert_eq!(a, b);
    }

    #[test]
    fn parses_and_validates_the_optimizer() {
        let config = Config::from_json_str(
            r#"{ "train": { "optimizer": { "kind": "adam", "learning_rate": 0.05 }, "epochs": 3 } }"#,
        )
        .unwrap();

        assert_eq!(config.train.epochs, 3);
        assert_eq!(
            config.train.optimizer,
            OptimizerConfig::Adam {
                learning_rate: 0.05,
                beta1: 0.9,
                beta2: 0.999,
                epsilon: 1e-8
            }
        );

        let result = Config::from_json_str(
            r#"{ "train": { "optimizer": { "kind": "momentum", "learning_rate": 0.1, "momentum": 1.0 } } }"#,
        );
        assert!(matches!(result, Err(MlError::InvalidConfig(_))));

        let result = Config::from_json_str(
            r#"{ "train": { "optimizer": { "kind": "gradient_descent", "learning_rate": 0.0 } } }"#,
        );
        assert!(matches!(result, Err(MlError::InvalidConfig(_))));
    }
}
