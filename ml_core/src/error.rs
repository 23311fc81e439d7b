use std::{fmt, io};

/// The result type shared by the graph learning crates.
pub type Result<T> = std::result::Result<T, MlError>;

/// Errors produced by models, graph operators and metrics when inputs are invalid.
#[derive(Debug)]
pub enum MlError {
    /// An input is invalid for semantic or domain reasons.
    InvalidInput(&'static str),

    /// A shape invariant was violated (e.g. mismatched lengths).
    ShapeMismatch {
        /// Human-readable context for the mismatch (e.g. "params", "adjacency rows").
        what: &'static str,
        /// Observed value.
        got: usize,
        /// Expected value.
        expected: usize,
    },

    /// The input could not be interpreted as a 2-D sparse matrix.
    MalformedSparse(String),

    /// A configuration value is out of its valid range.
    InvalidConfig(String),

    /// A parameter generator could not be built.
    Init(String),

    /// Reading a configuration or data file failed.
    Io(io::Error),

    /// A configuration or data file is not valid JSON for the expected type.
    Json(serde_json::Error),
}

impl fmt::Display for MlError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MlError::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            MlError::ShapeMismatch {
                what,
                got,
                expected,
            } => {
                write!(f, "shape mismatch for {what}: got {got}, expected {expected}")
            }
            MlError::MalformedSparse(msg) => write!(f, "malformed sparse matrix: {msg}"),
            MlError::InvalidConfig(msg) => write!(f, "invalid config: {msg}"),
            MlError::Init(msg) => write!(f, "parameter initialization failed: {msg}"),
            MlError::Io(e) => write!(f, "io error: {e}"),
            MlError::Json(e) => write!(f, "json error: {e}"),
        }
    }
}

impl std::error::Error for MlError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            MlError::Io(e) => Some(e),
            MlError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for MlError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

impl From<serde_json::Error> for MlError {
    fn from(e: serde_json::Error) -> Self {
        Self::Json(e)
    }
}

/// Returns a `ShapeMismatch` error unless `got == expected`.
///
/// # Arguments
/// * `what` - Context for the error message.
/// * `got` - The observed size.
/// * `expected` - The required size.
pub fn ensure_len(what: &'static str, got: usize, expected: usize) -> Result<()> {
    if got != expected {
        return Err(MlError::ShapeMismatch {
            what,
            got,
            expected,
        });
    }

    Ok(())
}
