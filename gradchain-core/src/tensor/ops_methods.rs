// src/tensor/ops_methods.rs
//
// Method-style access to the operations in `crate::ops`.

use crate::error::GradChainError;
use crate::ops;
use crate::tensor::Tensor;

impl Tensor {
    pub fn add(&self, other: &Tensor) -> Result<Tensor, GradChainError> {
        ops::add_op(self, other)
    }

    pub fn sub(&self, other: &Tensor) -> Result<Tensor, GradChainError> {
        ops::sub_op(self, other)
    }

    pub fn mul(&self, other: &Tensor) -> Result<Tensor, GradChainError> {
        ops::mul_op(self, other)
    }

    pub fn div(&self, other: &Tensor) -> Result<Tensor, GradChainError> {
        ops::div_op(self, other)
    }

    pub fn neg(&self) -> Tensor {
        ops::neg_op(self)
    }

    pub fn add_scalar(&self, scalar: f32) -> Tensor {
        ops::add_scalar_op(self, scalar)
    }

    pub fn mul_scalar(&self, scalar: f32) -> Tensor {
        ops::mul_scalar_op(self, scalar)
    }

    pub fn sqrt(&self) -> Tensor {
        ops::sqrt_op(self)
    }

    /// Sum of all elements as a 0-dimensional tensor.
    pub fn sum(&self) -> Tensor {
        ops::sum_op(self)
    }

    /// Copy of the tensor with NaN elements replaced by zero.
    pub fn nan_to_zero(&self) -> Tensor {
        ops::nan_to_zero_op(self)
    }
}
