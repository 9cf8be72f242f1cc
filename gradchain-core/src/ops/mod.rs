//! # Tensor Operations Module (`ops`)
//!
//! Out-of-place, differentiable operations. Each operation has a core `xxx_op`
//! function that performs the forward computation and, when any input requires
//! grad, records a `Backward` struct implementing
//! [`BackwardOp`](crate::autograd::BackwardOp) on its output.
//!
//! The kernels below never record anything, so backward passes use them to
//! compute gradients without growing the graph.

use std::sync::Arc;

use crate::autograd::BackwardOp;
use crate::error::GradChainError;
use crate::tensor::Tensor;
use crate::tensor_data::TensorData;

pub mod arithmetic;
pub mod math_elem;
pub mod reduction;

#[cfg(test)]
mod arithmetic_test;

pub use arithmetic::{add_op, add_scalar_op, div_op, mul_op, mul_scalar_op, neg_op, sub_op};
pub use math_elem::{nan_to_zero_op, sqrt_op};
pub use reduction::sum_op;

pub(crate) fn check_same_shape(
    expected: &[usize],
    actual: &[usize],
    operation: &str,
) -> Result<(), GradChainError> {
    if expected != actual {
        return Err(GradChainError::ShapeMismatch {
            expected: expected.to_vec(),
            actual: actual.to_vec(),
            operation: operation.to_string(),
        });
    }
    Ok(())
}

/// Element-wise unary kernel. The output is a fresh leaf tensor.
pub(crate) fn map_kernel<F>(a: &Tensor, op: F) -> Tensor
where
    F: Fn(f32) -> f32,
{
    let a_guard = a.read_data();
    let data: Vec<f32> = a_guard.data.iter().map(|&x| op(x)).collect();
    let shape = a_guard.shape.clone();
    drop(a_guard);
    Tensor::from_tensor_data(TensorData {
        data,
        shape,
        requires_grad: false,
        grad: None,
        grad_fn: None,
        hooks: Vec::new(),
    })
}

/// Element-wise binary kernel over two tensors of identical shape.
pub(crate) fn zip_kernel<F>(
    a: &Tensor,
    b: &Tensor,
    op_name: &str,
    op: F,
) -> Result<Tensor, GradChainError>
where
    F: Fn(f32, f32) -> f32,
{
    let a_guard = a.read_data();
    let data: Vec<f32> = if a.ptr_eq(b) {
        a_guard.data.iter().map(|&x| op(x, x)).collect()
    } else {
        let b_guard = b.read_data();
        check_same_shape(&a_guard.shape, &b_guard.shape, op_name)?;
        a_guard
            .data
            .iter()
            .zip(b_guard.data.iter())
            .map(|(&x, &y)| op(x, y))
            .collect()
    };
    let shape = a_guard.shape.clone();
    drop(a_guard);
    Tensor::new(data, shape)
}

/// Marks `output` as produced by `grad_fn` when any of `inputs` requires grad.
pub(crate) fn record<B>(output: Tensor, inputs: &[&Tensor], grad_fn: B) -> Tensor
where
    B: BackwardOp + 'static,
{
    if inputs.iter().any(|t| t.requires_grad()) {
        let mut guard = output.write_data();
        guard.requires_grad = true;
        guard.grad_fn = Some(Arc::new(grad_fn));
    }
    output
}
