use std::sync::Arc;

use crate::error::GradChainError;
use crate::tensor::Tensor;

/// A callback attached to a tensor's gradient notification list.
///
/// It receives the gradient computed for the tensor and returns the gradient that
/// continues through the backward pass (returning the input unchanged is allowed).
pub type GradHook = Arc<dyn Fn(&Tensor) -> Result<Tensor, GradChainError> + Send + Sync>;

/// Runs `hooks` in order, each one receiving the previous one's output.
pub(crate) fn run_hooks(hooks: &[GradHook], grad: Tensor) -> Result<Tensor, GradChainError> {
    let mut current = grad;
    for (index, hook) in hooks.iter().enumerate() {
        let next = hook(&current)?;
        let (expected, actual) = (current.shape(), next.shape());
        if expected != actual {
            return Err(GradChainError::ShapeMismatch {
                expected,
                actual,
                operation: format!("gradient hook #{}", index),
            });
        }
        log::trace!("gradient hook #{} fired on shape {:?}", index, expected);
        current = next;
    }
    Ok(current)
}
