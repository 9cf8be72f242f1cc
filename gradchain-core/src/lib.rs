//! # gradchain-core
//!
//! A small CPU tensor runtime with reverse-mode autograd and per-tensor gradient
//! hooks. It is the collaborator the `gradchain-optim` transformations run on:
//! update trees hold [`Tensor`]s, in-place updates write through shared storage,
//! and [`Tensor::register_hook`] attaches callbacks that fire during a later
//! [`Tensor::backward`] call.

pub mod autograd;
pub mod error;
pub mod ops;
pub mod tensor;
pub mod tensor_data;
pub mod utils;

pub use error::GradChainError;
pub use tensor::Tensor;
