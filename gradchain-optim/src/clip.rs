use crate::base::{GradientTransformation, OptimizerState};
use crate::error::OptimError;
use crate::tree::TensorTree;

const CLIP_EPS: f32 = 1e-6;

/// Global L2 norm over every tensor leaf of `updates`.
pub fn global_norm(updates: &TensorTree) -> f32 {
    updates
        .leaves()
        .iter()
        .flat_map(|t| t.get_f32_data())
        .map(|x| x * x)
        .sum::<f32>()
        .sqrt()
}

/// Rescales the updates so their global L2 norm does not exceed `max_norm`.
///
/// When the norm is above the limit every update is multiplied by
/// `max_norm / (norm + 1e-6)`; otherwise they pass through unchanged. The coefficient
/// is a plain number, so differentiable updates are scaled without differentiating
/// through the norm.
pub fn clip_by_global_norm(max_norm: f32) -> GradientTransformation {
    GradientTransformation::new(
        |_params: &TensorTree| -> Result<OptimizerState, OptimError> { Ok(OptimizerState::Empty) },
        move |updates: TensorTree,
              state: OptimizerState,
              inplace: bool|
              -> Result<(TensorTree, OptimizerState), OptimError> {
            let total_norm = global_norm(&updates);
            if total_norm.is_nan() || total_norm <= max_norm {
                return Ok((updates, state));
            }
            let clip_coef = max_norm / (total_norm + CLIP_EPS);
            log::debug!(
                "clip_by_global_norm: norm {} above {}, scaling by {}",
                total_norm,
                max_norm,
                clip_coef
            );
            let updates = if inplace {
                updates.try_for_each_leaf(|u| Ok(u.mul_scalar_(clip_coef)?))?;
                updates
            } else {
                updates.map(|u| u.mul_scalar(clip_coef))
            };
            Ok((updates, state))
        },
    )
}
