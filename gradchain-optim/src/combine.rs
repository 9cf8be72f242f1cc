use std::sync::Arc;

use crate::base::{GradientTransformation, OptimizerState};
use crate::error::OptimError;
use crate::tree::TensorTree;

/// Composes transformations into one that applies them left to right.
///
/// `init` calls every stage's `init` with the same parameters and collects the states
/// in stage order. `update` feeds the updates produced by stage `i - 1` to stage `i`
/// together with `state[i]`, forwarding `inplace` unchanged, and returns the last
/// stage's updates with the new per-stage states. The first failing stage aborts the
/// whole update.
///
/// An empty chain is valid and behaves like [`identity`](crate::base::identity) with a
/// zero-length state.
///
/// # Errors
/// `update` returns `OptimError::InvalidState` when the state is not a chain state with
/// exactly one entry per stage (for instance when `init` was never called, or the state
/// came from a different pipeline).
pub fn chain<I>(transformations: I) -> GradientTransformation
where
    I: IntoIterator<Item = GradientTransformation>,
{
    let stages: Arc<[GradientTransformation]> = transformations.into_iter().collect();
    log::debug!("chain built with {} stages", stages.len());

    let init_stages = Arc::clone(&stages);
    let init_fn = move |params: &TensorTree| -> Result<OptimizerState, OptimError> {
        let states = init_stages
            .iter()
            .map(|stage| stage.init(params))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(OptimizerState::Chain(states))
    };

    let update_fn = move |updates: TensorTree,
                          state: OptimizerState,
                          inplace: bool|
          -> Result<(TensorTree, OptimizerState), OptimError> {
        let states = match state {
            OptimizerState::Chain(states) if states.len() == stages.len() => states,
            OptimizerState::Chain(states) => {
                return Err(OptimError::InvalidState {
                    expected: stages.len(),
                    actual: states.len(),
                })
            }
            // A bare non-chain state is a single entry, never a valid chain state.
            _ => {
                return Err(OptimError::InvalidState {
                    expected: stages.len(),
                    actual: 1,
                })
            }
        };

        let mut updates = updates;
        let mut new_states = Vec::with_capacity(states.len());
        for (index, (stage, stage_state)) in stages.iter().zip(states).enumerate() {
            log::trace!("chain stage {}/{}", index + 1, stages.len());
            let (next_updates, next_state) = stage.update(updates, stage_state, inplace)?;
            updates = next_updates;
            new_states.push(next_state);
        }
        Ok((updates, OptimizerState::Chain(new_states)))
    };

    GradientTransformation::new(init_fn, update_fn)
}

/// Builds a [`chain`] from a list of transformations.
///
/// ```ignore
/// let opt = chain![trace(0.9, false), scale(-0.1)];
/// ```
#[macro_export]
macro_rules! chain {
    ($($transformation:expr),* $(,)?) => {
        $crate::combine::chain(::std::vec![$($transformation),*])
    };
}
