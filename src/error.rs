//! Error type shared by every component of the crate.

use thiserror::Error;

/// Failures raised by selection, variation, (de)serialization and the
/// population driver.
///
/// Depth-limit rejections during crossover and mutation are retried
/// internally and never surface; only exhausting the retry budget does.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum EvolveError {
    /// A parameter or population-size relationship is invalid.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Serialized genotype text could not be parsed.
    #[error("malformed input at line {line}: {reason}")]
    MalformedInput { line: usize, reason: String },

    /// A bounded retry loop ran out of attempts.
    #[error("{operation} found no valid candidate after {attempts} attempts")]
    ConstraintUnsatisfiable {
        operation: &'static str,
        attempts: usize,
    },

    /// The external evaluator failed.
    #[error("evaluation failed: {0}")]
    Evaluation(String),
}

impl EvolveError {
    pub(crate) fn invalid(msg: impl Into<String>) -> Self {
        EvolveError::InvalidArgument(msg.into())
    }

    pub(crate) fn malformed(line: usize, reason: impl Into<String>) -> Self {
        EvolveError::MalformedInput {
            line,
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, EvolveError>;
