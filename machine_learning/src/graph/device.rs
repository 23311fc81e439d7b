use std::{fmt, str::FromStr};

use ml_core::MlError;
use serde::{Deserialize, Serialize};

/// The compute device a tensor lives on.
///
/// Only host memory is supported; the value is still carried explicitly so callers
/// never rely on a process-wide default.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Device {
    #[default]
    Cpu,
}

impl fmt::Display for Device {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Device::Cpu => write!(f, "cpu"),
        }
    }
}

impl FromStr for Device {
    type Err = MlError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cpu" => Ok(Device::Cpu),
            other => Err(MlError::InvalidConfig(format!("unsupported device `{other}`"))),
        }
    }
}
