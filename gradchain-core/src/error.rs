use thiserror::Error;

/// Custom error type for the gradchain tensor runtime.
#[derive(Error, Debug, PartialEq, Clone)]
pub enum GradChainError {
    #[error("Shape mismatch: expected {expected:?}, got {actual:?} during operation {operation}")]
    ShapeMismatch {
        expected: Vec<usize>,
        actual: Vec<usize>,
        operation: String,
    },

    #[error("Tensor creation error: data length {data_len} does not match shape {shape:?}")]
    TensorCreationError { data_len: usize, shape: Vec<usize> },

    #[error("Operation requires tensor to require grad, but it doesn't.")]
    RequiresGradNotMet,

    #[error("Backward called on non-scalar tensor without explicit gradient.")]
    BackwardNonScalar,

    #[error("Backward error: {0}")]
    BackwardError(String),

    /// Raised when a gradient hook is attached to a tensor that never receives a gradient.
    #[error("Cannot register a hook on a tensor that doesn't require gradient (shape {shape:?})")]
    HookOnNonDifferentiable { shape: Vec<usize> },

    #[error("In-place operation '{operation}' is not allowed: {reason}")]
    InplaceModificationError { operation: String, reason: String },

    #[error("Scalar value requested from a tensor with {numel} elements")]
    NotAScalar { numel: usize },

    #[error("Internal error: {0}")]
    InternalError(String),
}
