// src/tensor/traits.rs
use std::fmt::{self, Debug};
use std::sync::Arc;

use crate::tensor::Tensor;

impl Clone for Tensor {
    /// Clones the Tensor. This is a shallow clone that increases the reference count
    /// of the underlying shared data. Modifications through one clone will be visible
    /// through others.
    fn clone(&self) -> Self {
        Tensor {
            data: Arc::clone(&self.data),
        }
    }
}

impl Debug for Tensor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let td = self.read_data();
        write!(
            f,
            "Tensor(shape={:?}, requires_grad={}, data={:?})",
            td.shape, td.requires_grad, td.data
        )
    }
}

impl PartialEq for Tensor {
    /// Two tensors are equal if they share storage, or if shapes and elements match.
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let self_guard = self.read_data();
        let other_guard = other.read_data();
        self_guard.shape == other_guard.shape && self_guard.data == other_guard.data
    }
}
