//! # Automatic Differentiation (`autograd`)
//!
//! Reverse-mode differentiation over the graph recorded by tensor operations.
//!
//! - [`BackwardOp`]: implemented by every differentiable operation, stored in the
//!   output tensor's `grad_fn`.
//! - [`graph`]: topological ordering of the recorded graph.
//! - [`hooks`]: per-tensor gradient notification lists, fired during `backward()`.

pub mod backward_op;
pub mod graph;
pub mod hooks;

pub use backward_op::BackwardOp;
pub use hooks::GradHook;
