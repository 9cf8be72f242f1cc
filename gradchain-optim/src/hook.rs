use std::sync::Arc;

use gradchain_core::autograd::GradHook;
use gradchain_core::{GradChainError, Tensor};

use crate::base::{GradientTransformation, OptimizerState};
use crate::error::OptimError;
use crate::tree::TensorTree;

/// Gradient hook replacing every NaN element with zero; all other values pass through.
pub fn zero_nan_hook(g: &Tensor) -> Result<Tensor, GradChainError> {
    Ok(g.nan_to_zero())
}

/// Stateless transformation that attaches `hook` to every tensor of the updates tree.
///
/// The updates come back untouched (the very same tensors) together with the state it
/// was given. Registration is the only effect: the hook runs later, whenever a backward
/// pass computes the gradient of one of those tensors. Null leaves are skipped, and
/// every call registers the hook once more on each tensor. `inplace` is ignored.
///
/// Hooked tensors require grad, and in-place ops reject such tensors: later stages of
/// the same pipeline must run with `inplace = false`, otherwise they fail with
/// `InplaceModificationError`.
///
/// # Errors
/// A tensor that does not require grad cannot carry hooks; the runtime's
/// `HookOnNonDifferentiable` error is returned as `OptimError::Tensor`. Tensors visited
/// before the failing one keep their new hook.
pub fn register_hook<F>(hook: F) -> GradientTransformation
where
    F: Fn(&Tensor) -> Result<Tensor, GradChainError> + Send + Sync + 'static,
{
    let hook: GradHook = Arc::new(hook);
    GradientTransformation::new(
        |_params: &TensorTree| -> Result<OptimizerState, OptimError> { Ok(OptimizerState::Empty) },
        move |updates: TensorTree,
              state: OptimizerState,
              _inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            updates.try_for_each_leaf(|g| {
                g.register_shared_hook(Arc::clone(&hook))?;
                Ok(())
            })?;
            log::trace!("registered gradient hook on {} tensors", updates.num_leaves());
            Ok((updates, state))
        },
    )
}
