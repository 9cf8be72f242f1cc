//! # gradchain-optim
//!
//! Optimizers as composable gradient transformations. A
//! [`GradientTransformation`] is a pair of pure functions: `init` builds a state
//! from the parameters and `update` maps `(updates, state, inplace)` to
//! `(new_updates, new_state)`. [`chain`] threads updates through several of them,
//! and [`register_hook`] attaches gradient hooks (for instance [`zero_nan_hook`])
//! to the update tensors so they fire in a later backward pass.
//!
//! ```ignore
//! use gradchain_optim::{apply_updates, chain, register_hook, scale, trace, zero_nan_hook};
//!
//! let opt = chain![register_hook(zero_nan_hook), trace(0.9, false), scale(-0.1)];
//! let state = opt.init(&params)?;
//! // Hooked updates require grad, so the pipeline has to run out of place.
//! let (updates, state) = opt.update(grads, state, false)?;
//! let new_params = apply_updates(&params, &updates, false)?;
//! ```

pub mod alias;
pub mod base;
pub mod clip;
pub mod combine;
pub mod error;
pub mod hook;
pub mod optimizer;
pub mod schedule;
pub mod transform;
pub mod tree;
pub mod update;

#[cfg(test)]
mod base_test;
#[cfg(test)]
mod combine_test;
#[cfg(test)]
mod tree_test;

pub use alias::{adam, rmsprop, sgd, AdamOptions, LearningRate, RmsPropOptions, SgdOptions};
pub use base::{identity, GradientTransformation, OptimizerState, DEFAULT_INPLACE};
pub use clip::{clip_by_global_norm, global_norm};
pub use combine::chain;
pub use error::OptimError;
pub use hook::{register_hook, zero_nan_hook};
pub use optimizer::{GradientOptimizer, Optimizer};
pub use schedule::{constant_schedule, linear_schedule, polynomial_schedule, Schedule};
pub use transform::{scale, scale_by_adam, scale_by_rms, scale_by_schedule, trace};
pub use tree::{TensorTree, TreeDef};
pub use update::apply_updates;
