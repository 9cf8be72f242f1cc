use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::error::OptimError;
use crate::tree::TensorTree;

/// Value of the `inplace` flag used wherever the caller does not choose one.
///
/// Every built-in transformation receives the flag explicitly; this constant is what
/// [`GradientOptimizer`](crate::optimizer::GradientOptimizer) passes on each step.
pub const DEFAULT_INPLACE: bool = true;

/// Builds the initial state of a transformation from the parameters.
pub type InitFn = dyn Fn(&TensorTree) -> Result<OptimizerState, OptimError> + Send + Sync;

/// Maps `(updates, state, inplace)` to `(new_updates, new_state)`.
pub type UpdateFn = dyn Fn(TensorTree, OptimizerState, bool) -> Result<(TensorTree, OptimizerState), OptimError>
    + Send
    + Sync;

/// State carried between two calls of [`GradientTransformation::update`].
///
/// Ownership moves into `update` and the superseded value is dropped; callers that
/// want to roll back after an error must keep their own copy (cloning is shallow for
/// the tensor buffers, so in-place updates would still show through).
#[derive(Debug, Clone, Default)]
pub enum OptimizerState {
    /// Sentinel for stateless transformations.
    #[default]
    Empty,
    /// One state per stage of a chain, in stage order.
    Chain(Vec<OptimizerState>),
    /// Momentum buffers, one per parameter.
    Trace { momentum_buffer: TensorTree },
    /// First and second moment estimates of Adam, with the number of steps taken.
    ScaleByAdam {
        count: u64,
        mu: TensorTree,
        nu: TensorTree,
    },
    /// Running average of squared updates.
    ScaleByRms { nu: TensorTree },
    /// Number of steps taken, fed to a schedule.
    ScaleBySchedule { count: u64 },
    /// State of a user-defined transformation.
    Custom(Arc<dyn Any + Send + Sync>),
}

impl OptimizerState {
    /// Name of the variant, used in error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            OptimizerState::Empty => "Empty",
            OptimizerState::Chain(_) => "Chain",
            OptimizerState::Trace { .. } => "Trace",
            OptimizerState::ScaleByAdam { .. } => "ScaleByAdam",
            OptimizerState::ScaleByRms { .. } => "ScaleByRms",
            OptimizerState::ScaleBySchedule { .. } => "ScaleBySchedule",
            OptimizerState::Custom(_) => "Custom",
        }
    }

    pub fn is_empty_state(&self) -> bool {
        matches!(self, OptimizerState::Empty)
    }

    /// Wraps an arbitrary value as the state of a user-defined transformation.
    pub fn custom<T: Any + Send + Sync>(value: T) -> Self {
        OptimizerState::Custom(Arc::new(value))
    }

    /// Typed access to a [`OptimizerState::Custom`] payload.
    pub fn downcast_custom<T: Any + Send + Sync>(&self) -> Option<&T> {
        match self {
            OptimizerState::Custom(value) => value.downcast_ref::<T>(),
            _ => None,
        }
    }

    /// Number of states in a chain state, flattening nested chains.
    ///
    /// Two equivalent pipelines (`chain![chain![a, b], c]` and `chain![a, chain![b, c]]`)
    /// yield the same flattened sequence.
    pub fn flatten_chain(&self) -> Vec<&OptimizerState> {
        match self {
            OptimizerState::Chain(states) => states.iter().flat_map(|s| s.flatten_chain()).collect(),
            other => vec![other],
        }
    }

    /// Copy of the state that shares no tensor storage with `self`.
    ///
    /// `Clone` only copies tensor handles, so in-place transformations would keep
    /// writing through them. `Custom` payloads are opaque and stay shared.
    pub fn deep_clone(&self) -> OptimizerState {
        let copy = |tree: &TensorTree| tree.map(|t| t.detach());
        match self {
            OptimizerState::Empty => OptimizerState::Empty,
            OptimizerState::Chain(states) => {
                OptimizerState::Chain(states.iter().map(OptimizerState::deep_clone).collect())
            }
            OptimizerState::Trace { momentum_buffer } => OptimizerState::Trace {
                momentum_buffer: copy(momentum_buffer),
            },
            OptimizerState::ScaleByAdam { count, mu, nu } => OptimizerState::ScaleByAdam {
                count: *count,
                mu: copy(mu),
                nu: copy(nu),
            },
            OptimizerState::ScaleByRms { nu } => OptimizerState::ScaleByRms { nu: copy(nu) },
            OptimizerState::ScaleBySchedule { count } => {
                OptimizerState::ScaleBySchedule { count: *count }
            }
            OptimizerState::Custom(value) => OptimizerState::Custom(Arc::clone(value)),
        }
    }
}

/// An optimizer building block: a pair of pure functions `(init, update)`.
///
/// Instances hold no mutable state of their own and are cheap to clone, so the same
/// transformation can drive several parameter sets, each with its own state value.
#[derive(Clone)]
pub struct GradientTransformation {
    init_fn: Arc<InitFn>,
    update_fn: Arc<UpdateFn>,
}

impl GradientTransformation {
    pub fn new<I, U>(init_fn: I, update_fn: U) -> Self
    where
        I: Fn(&TensorTree) -> Result<OptimizerState, OptimError> + Send + Sync + 'static,
        U: Fn(TensorTree, OptimizerState, bool) -> Result<(TensorTree, OptimizerState), OptimError>
            + Send
            + Sync
            + 'static,
    {
        GradientTransformation {
            init_fn: Arc::new(init_fn),
            update_fn: Arc::new(update_fn),
        }
    }

    /// Produces the initial state for `params`.
    pub fn init(&self, params: &TensorTree) -> Result<OptimizerState, OptimError> {
        (self.init_fn)(params)
    }

    /// Transforms `updates`, threading `state` forward.
    ///
    /// With `inplace` set, the transformation may overwrite the tensors of `updates`
    /// (and its own buffers); callers must treat everything they pass in as possibly
    /// modified. Without it, results are new tensors built with differentiable ops.
    pub fn update(
        &self,
        updates: TensorTree,
        state: OptimizerState,
        inplace: bool,
    ) -> Result<(TensorTree, OptimizerState), OptimError> {
        (self.update_fn)(updates, state, inplace)
    }
}

impl fmt::Debug for GradientTransformation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GradientTransformation").finish_non_exhaustive()
    }
}

/// Stateless transformation that returns its input untouched.
pub fn identity() -> GradientTransformation {
    GradientTransformation::new(
        |_params| Ok(OptimizerState::Empty),
        |updates, state, _inplace| Ok((updates, state)),
    )
}
