// src/tensor_data.rs
use std::fmt;
use std::sync::Arc;

use crate::autograd::{BackwardOp, GradHook};
use crate::error::GradChainError;
use crate::tensor::Tensor;

/// Internal storage and metadata for a Tensor.
///
/// This struct holds the element buffer, the shape and all autograd-related
/// information (flag, accumulated gradient, producing operation and the
/// gradient hooks registered on the tensor).
/// It is wrapped in `Arc<RwLock<TensorData>>` by the `Tensor` struct
/// to allow shared ownership and interior mutability.
pub struct TensorData {
    /// Flattened row-major f32 elements.
    pub(crate) data: Vec<f32>,
    /// The shape (dimensions) of the tensor. Empty for a scalar.
    pub(crate) shape: Vec<usize>,
    /// Flag indicating if the tensor requires gradient computation.
    /// If true, operations involving this tensor will be tracked in the computation graph.
    pub(crate) requires_grad: bool,
    /// Gradient accumulated by `backward()` for leaf tensors.
    pub(crate) grad: Option<Tensor>,
    /// The backward operation node that produced this tensor.
    /// Leaf tensors (created directly by the user) have `grad_fn = None`.
    pub(crate) grad_fn: Option<Arc<dyn BackwardOp>>,
    /// Callbacks fired, in registration order, once the gradient of this
    /// tensor has been fully computed during a backward pass.
    pub(crate) hooks: Vec<GradHook>,
}

impl TensorData {
    /// Creates a new `TensorData` instance with the given f32 data and shape.
    ///
    /// # Errors
    /// Returns `GradChainError::TensorCreationError` if the length of `data` does not match
    /// the total number of elements specified by `shape`.
    pub fn new(data: Vec<f32>, shape: Vec<usize>) -> Result<Self, GradChainError> {
        let numel: usize = shape.iter().product();
        if data.len() != numel {
            return Err(GradChainError::TensorCreationError {
                data_len: data.len(),
                shape,
            });
        }
        Ok(TensorData {
            data,
            shape,
            requires_grad: false,
            grad: None,
            grad_fn: None,
            hooks: Vec::new(),
        })
    }

    pub fn numel(&self) -> usize {
        self.shape.iter().product()
    }

    /// Read-only view of the element buffer.
    pub fn as_slice(&self) -> &[f32] {
        &self.data
    }
}

impl fmt::Debug for TensorData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TensorData")
            .field("shape", &self.shape)
            .field("data", &self.data)
            .field("requires_grad", &self.requires_grad)
            .field("has_grad", &self.grad.is_some())
            .field("grad_fn", &self.grad_fn)
            .field("hooks", &self.hooks.len())
            .finish()
    }
}
