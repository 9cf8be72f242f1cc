// src/tensor/mod.rs
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::autograd::graph::NodeId;
use crate::error::GradChainError;
use crate::tensor_data::TensorData;

mod autograd_methods;
pub mod create;
mod inplace_ops;
mod ops_methods;
mod traits;


pub use create::{full, ones, ones_like, randn, randn_with_rng, zeros, zeros_like};

/// Represents a multi-dimensional array of `f32` elements.
///
/// `Tensor` uses `Arc<RwLock<TensorData>>` internally to allow for:
/// 1.  **Shared Ownership:** Multiple `Tensor` instances can point to the same
///     underlying data without cloning the data itself (cheap clones). An in-place
///     modification through one handle is visible through every other handle.
/// 2.  **Interior Mutability:** Metadata (like `requires_grad`, `grad` or the hook list)
///     can be modified even through an immutable `Tensor` reference.
pub struct Tensor {
    pub(crate) data: Arc<RwLock<TensorData>>,
}

impl Tensor {
    /// Creates a new Tensor with the given f32 data and shape.
    ///
    /// # Errors
    /// Returns `GradChainError::TensorCreationError` if `data_vec.len()` does not match
    /// the number of elements implied by `shape`.
    pub fn new(data_vec: Vec<f32>, shape: Vec<usize>) -> Result<Self, GradChainError> {
        let tensor_data = TensorData::new(data_vec, shape)?;
        Ok(Tensor::from_tensor_data(tensor_data))
    }

    /// Creates a 0-dimensional tensor holding `value`.
    pub fn scalar(value: f32) -> Self {
        Tensor::from_tensor_data(TensorData {
            data: vec![value],
            shape: Vec::new(),
            requires_grad: false,
            grad: None,
            grad_fn: None,
            hooks: Vec::new(),
        })
    }

    pub(crate) fn from_tensor_data(tensor_data: TensorData) -> Self {
        Tensor {
            data: Arc::new(RwLock::new(tensor_data)),
        }
    }

    /// Returns a clone of the tensor's shape.
    pub fn shape(&self) -> Vec<usize> {
        self.read_data().shape.clone()
    }

    /// Returns the number of elements in the tensor.
    pub fn numel(&self) -> usize {
        self.read_data().numel()
    }

    /// Returns a copy of the tensor's elements in row-major order.
    pub fn get_f32_data(&self) -> Vec<f32> {
        self.read_data().data.clone()
    }

    /// Returns the single value held by a one-element tensor.
    ///
    /// # Errors
    /// Returns `GradChainError::NotAScalar` if the tensor holds more or fewer than one element.
    pub fn item(&self) -> Result<f32, GradChainError> {
        let guard = self.read_data();
        match guard.data.as_slice() {
            [value] => Ok(*value),
            other => Err(GradChainError::NotAScalar { numel: other.len() }),
        }
    }

    /// Returns `true` if both handles point to the same underlying tensor.
    pub fn ptr_eq(&self, other: &Tensor) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    /// Identity of the underlying storage, used as a key by the autograd graph.
    pub(crate) fn node_id(&self) -> NodeId {
        Arc::as_ptr(&self.data)
    }

    /// Acquires a read lock on the tensor's data.
    ///
    /// A poisoned lock is recovered: the data itself is never left half-written by
    /// the operations of this crate.
    pub fn read_data(&self) -> RwLockReadGuard<'_, TensorData> {
        match self.data.read() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("RwLock for tensor data was poisoned. Recovering read guard.");
                poisoned.into_inner()
            }
        }
    }

    /// Acquires a write lock on the tensor's data.
    pub fn write_data(&self) -> RwLockWriteGuard<'_, TensorData> {
        match self.data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::warn!("RwLock for tensor data was poisoned. Recovering write guard.");
                poisoned.into_inner()
            }
        }
    }
}
