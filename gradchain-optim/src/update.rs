use crate::error::OptimError;
use crate::tree::TensorTree;

/// Adds `updates` to `params` leaf by leaf.
///
/// With `inplace` set, each update is added straight into its parameter's storage
/// without touching the autograd graph, and `params` itself is returned (same tensors).
/// Otherwise the result holds new tensors `p + u`, differentiable with respect to both.
/// A null update leaves its parameter as it is.
///
/// # Errors
/// `TreeStructureMismatch` if the two trees do not have the same structure; shape
/// errors from the tensor runtime.
pub fn apply_updates(
    params: &TensorTree,
    updates: &TensorTree,
    inplace: bool,
) -> Result<TensorTree, OptimError> {
    let (param_slots, param_def) = params.flatten();
    let (update_slots, update_def) = updates.flatten();
    if param_def != update_def {
        return Err(OptimError::TreeStructureMismatch {
            operation: "apply_updates".to_string(),
            reason: "parameters and updates have different structures".to_string(),
        });
    }

    if inplace {
        for (p, u) in param_slots.iter().zip(&update_slots) {
            if let (Some(p), Some(u)) = (p, u) {
                p.add_no_grad_(u)?;
            }
        }
        return Ok(params.clone());
    }

    let new_params = param_slots
        .into_iter()
        .zip(update_slots)
        .map(|(p, u)| match (p, u) {
            (Some(p), Some(u)) => Ok(Some(p.add(&u)?)),
            (p, _) => Ok(p),
        })
        .collect::<Result<Vec<_>, OptimError>>()?;
    param_def.unflatten(new_params)
}
