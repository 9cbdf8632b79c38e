use std::path::PathBuf;
use thiserror::Error;

/// Error type for invalid inputs and failed operations.
#[derive(Error, Debug)]
pub enum FlowError {
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    #[error("Invalid parameter `{name}`: {reason}")]
    InvalidParameter { name: &'static str, reason: String },
    #[error("Series length mismatch. Expected {expected}, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },
    #[error("Solver did not converge after {iterations} iterations (residual={residual:e}, tolerance={tolerance:e})")]
    NotConverged {
        iterations: usize,
        residual: f64,
        tolerance: f64,
    },
    #[error("Singular matrix: {0}")]
    SingularMatrix(String),
    #[error("Failed to parse {path}:{line}: {reason}")]
    Parse {
        path: PathBuf,
        line: usize,
        reason: String,
    },
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl FlowError {
    pub(crate) fn invalid_parameter(name: &'static str, reason: impl Into<String>) -> Self {
        FlowError::InvalidParameter {
            name,
            reason: reason.into(),
        }
    }
}

/// Convenience type for `Result<T, FlowError>`.
pub type FlowResult<T> = Result<T, FlowError>;
