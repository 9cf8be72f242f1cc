use gradchain_core::Tensor;

use crate::base::{GradientTransformation, OptimizerState, DEFAULT_INPLACE};
use crate::error::OptimError;
use crate::tree::TensorTree;
use crate::update::apply_updates;

/// Common interface of stateful optimizers that own their parameters.
pub trait Optimizer {
    /// Performs a single optimization step from the gradients currently stored on the
    /// parameters.
    fn step(&mut self) -> Result<(), OptimError>;

    /// Clears the gradients of all parameters managed by the optimizer.
    fn zero_grad(&mut self);

    /// Snapshot of the optimizer state, e.g. to checkpoint it. Later steps do not
    /// modify the returned value.
    fn state_dict(&self) -> OptimizerState;

    /// Replaces the optimizer state.
    ///
    /// # Errors
    /// `InvalidState` if a chain state does not hold one entry per stage, and
    /// `StateMismatch` if `state` (or one of its stages) is not the kind of state the
    /// optimizer's transformation produces.
    fn load_state_dict(&mut self, state: OptimizerState) -> Result<(), OptimError>;
}

/// Drives a [`GradientTransformation`] over a fixed tree of parameters, in the usual
/// `zero_grad` / `backward` / `step` loop.
#[derive(Debug)]
pub struct GradientOptimizer {
    params: TensorTree,
    transformation: GradientTransformation,
    state: OptimizerState,
    iterations: u64,
}

impl GradientOptimizer {
    /// Initialises the transformation's state from `params`.
    pub fn new(
        params: TensorTree,
        transformation: GradientTransformation,
    ) -> Result<Self, OptimError> {
        let state = transformation.init(&params)?;
        log::debug!(
            "optimizer created for {} parameters with {} state",
            params.num_leaves(),
            state.kind()
        );
        Ok(GradientOptimizer {
            params,
            transformation,
            state,
            iterations: 0,
        })
    }

    pub fn params(&self) -> &TensorTree {
        &self.params
    }

    /// Number of successful steps taken.
    pub fn iterations(&self) -> u64 {
        self.iterations
    }

    /// Gradient tree aligned with the parameters; missing gradients become null leaves.
    fn collect_grads(&self) -> Result<TensorTree, OptimError> {
        let (slots, def) = self.params.flatten();
        let grads = slots
            .iter()
            .map(|p| p.as_ref().and_then(Tensor::grad))
            .collect();
        def.unflatten(grads)
    }
}

impl Optimizer for GradientOptimizer {
    fn step(&mut self) -> Result<(), OptimError> {
        let grads = self.collect_grads()?;
        // `update` runs on a copy, so a failed step leaves the stored state untouched.
        let (updates, new_state) =
            self.transformation
                .update(grads, self.state.deep_clone(), DEFAULT_INPLACE)?;
        apply_updates(&self.params, &updates, DEFAULT_INPLACE)?;
        self.state = new_state;
        self.iterations += 1;
        log::trace!("optimizer step {} done", self.iterations);
        Ok(())
    }

    fn zero_grad(&mut self) {
        for param in self.params.leaves() {
            param.clear_grad();
        }
    }

    fn state_dict(&self) -> OptimizerState {
        self.state.deep_clone()
    }

    fn load_state_dict(&mut self, state: OptimizerState) -> Result<(), OptimError> {
        check_compatible(&self.state, &state)?;
        self.state = state.deep_clone();
        Ok(())
    }
}

/// Checks that `actual` has the layout of `expected`: same variant at every position,
/// and the same number of stages in every chain.
fn check_compatible(expected: &OptimizerState, actual: &OptimizerState) -> Result<(), OptimError> {
    match (expected, actual) {
        (OptimizerState::Chain(expected_stages), OptimizerState::Chain(actual_stages)) => {
            if expected_stages.len() != actual_stages.len() {
                return Err(OptimError::InvalidState {
                    expected: expected_stages.len(),
                    actual: actual_stages.len(),
                });
            }
            expected_stages
                .iter()
                .zip(actual_stages)
                .try_for_each(|(e, a)| check_compatible(e, a))
        }
        (e, a) if e.kind() == a.kind() => Ok(()),
        (e, a) => Err(OptimError::StateMismatch {
            transformation: "GradientOptimizer",
            expected: e.kind(),
            actual: a.kind(),
        }),
    }
}
