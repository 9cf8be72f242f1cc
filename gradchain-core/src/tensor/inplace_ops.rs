// src/tensor/inplace_ops.rs
//
// In-place element-wise operations. They write through the shared storage, so every
// handle cloned from the same tensor observes the new values.

use crate::error::GradChainError;
use crate::ops::check_same_shape;
use crate::tensor::Tensor;

impl Tensor {
    /// Disallows in-place modification of tensors tracked by autograd: overwriting
    /// them would invalidate values saved for the backward pass.
    fn check_inplace_allowed(&self, operation: &str) -> Result<(), GradChainError> {
        if self.requires_grad() {
            let reason = if self.is_leaf() {
                "the tensor is a leaf that requires grad"
            } else {
                "the tensor is part of a computation graph"
            };
            return Err(GradChainError::InplaceModificationError {
                operation: operation.to_string(),
                reason: reason.to_string(),
            });
        }
        Ok(())
    }

    /// Copies `other`'s elements out before `self` is write-locked, so that
    /// `self` and `other` may be the same tensor.
    fn snapshot_same_shape(&self, other: &Tensor, operation: &str) -> Result<Vec<f32>, GradChainError> {
        let self_shape = self.shape();
        let other_guard = other.read_data();
        check_same_shape(&self_shape, &other_guard.shape, operation)?;
        Ok(other_guard.data.clone())
    }

    fn apply_unary_(&self, operation: &str, op: impl Fn(f32) -> f32) -> Result<(), GradChainError> {
        self.check_inplace_allowed(operation)?;
        let mut guard = self.write_data();
        guard.data.iter_mut().for_each(|x| *x = op(*x));
        Ok(())
    }

    fn apply_binary_(
        &self,
        other: &Tensor,
        operation: &str,
        op: impl Fn(f32, f32) -> f32,
    ) -> Result<(), GradChainError> {
        self.check_inplace_allowed(operation)?;
        let other_data = self.snapshot_same_shape(other, operation)?;
        let mut guard = self.write_data();
        guard
            .data
            .iter_mut()
            .zip(other_data)
            .for_each(|(x, y)| *x = op(*x, y));
        Ok(())
    }

    /// `self += other`
    pub fn add_(&self, other: &Tensor) -> Result<(), GradChainError> {
        self.apply_binary_(other, "add_", |x, y| x + y)
    }

    /// `self += alpha * other`
    pub fn add_scaled_(&self, other: &Tensor, alpha: f32) -> Result<(), GradChainError> {
        self.apply_binary_(other, "add_scaled_", |x, y| x + alpha * y)
    }

    /// `self += value * a * b`
    pub fn addcmul_(&self, a: &Tensor, b: &Tensor, value: f32) -> Result<(), GradChainError> {
        self.check_inplace_allowed("addcmul_")?;
        let a_data = self.snapshot_same_shape(a, "addcmul_")?;
        let b_data = self.snapshot_same_shape(b, "addcmul_")?;
        let mut guard = self.write_data();
        for ((x, a), b) in guard.data.iter_mut().zip(a_data).zip(b_data) {
            *x += value * a * b;
        }
        Ok(())
    }

    /// `self /= other`
    pub fn div_(&self, other: &Tensor) -> Result<(), GradChainError> {
        self.apply_binary_(other, "div_", |x, y| x / y)
    }

    /// `self *= scalar`
    pub fn mul_scalar_(&self, scalar: f32) -> Result<(), GradChainError> {
        self.apply_unary_("mul_scalar_", |x| x * scalar)
    }

    /// `self += scalar`
    pub fn add_scalar_(&self, scalar: f32) -> Result<(), GradChainError> {
        self.apply_unary_("add_scalar_", |x| x + scalar)
    }

    pub fn sqrt_(&self) -> Result<(), GradChainError> {
        self.apply_unary_("sqrt_", f32::sqrt)
    }

    /// Sets every element to `value`.
    pub fn fill_(&self, value: f32) -> Result<(), GradChainError> {
        self.apply_unary_("fill_", |_| value)
    }

    /// Overwrites this tensor's elements with `other`'s.
    pub fn copy_from_(&self, other: &Tensor) -> Result<(), GradChainError> {
        self.apply_binary_(other, "copy_from_", |_, y| y)
    }

    /// `self += other`, bypassing autograd bookkeeping.
    ///
    /// Meant for optimizer steps on parameters: the stored values change, the graph
    /// and the `requires_grad` flag do not.
    pub fn add_no_grad_(&self, other: &Tensor) -> Result<(), GradChainError> {
        let other_data = self.snapshot_same_shape(other, "add_no_grad_")?;
        let mut guard = self.write_data();
        guard
            .data
            .iter_mut()
            .zip(other_data)
            .for_each(|(x, y)| *x += y);
        Ok(())
    }
}
