use std::fmt::Debug;

use crate::error::GradChainError;
use crate::tensor::Tensor;

/// Defines the interface for the backward pass of a differentiable tensor operation.
///
/// Any operation that creates a non-leaf `Tensor` must have an associated `BackwardOp`
/// implementation. It is stored in the output tensor's `grad_fn` field and used during
/// `backward()` to propagate gradients according to the chain rule.
pub trait BackwardOp: Debug + Send + Sync {
    /// Computes the gradients of the operation's inputs given the gradient of its output.
    ///
    /// # Returns
    /// One gradient per input. The order **must** match [`BackwardOp::inputs`], and each
    /// gradient must have the shape of the corresponding input.
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError>;

    /// Returns the input tensors that participated in the forward operation.
    fn inputs(&self) -> Vec<Tensor>;
}
