use gradchain_core::GradChainError;
use thiserror::Error;

/// Errors raised while building or running gradient transformations.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum OptimError {
    /// The state handed to a chain does not hold one entry per stage.
    #[error("The number of updates and states has to be the same in chain: expected {expected} states, got {actual}. Make sure you have called init first!")]
    InvalidState { expected: usize, actual: usize },

    #[error("Transformation '{transformation}' expected a '{expected}' state, got '{actual}'")]
    StateMismatch {
        transformation: &'static str,
        expected: &'static str,
        actual: &'static str,
    },

    #[error("Tree structure mismatch during {operation}: {reason}")]
    TreeStructureMismatch { operation: String, reason: String },

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    /// Errors from the tensor runtime, including hook registration on a
    /// tensor that does not require grad.
    #[error(transparent)]
    Tensor(#[from] GradChainError),
}
