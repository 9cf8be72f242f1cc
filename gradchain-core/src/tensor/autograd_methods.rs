use std::collections::HashMap;
use std::sync::Arc;

use crate::autograd::graph::{topological_sort, NodeId};
use crate::autograd::hooks::run_hooks;
use crate::autograd::{BackwardOp, GradHook};
use crate::error::GradChainError;
use crate::ops::{check_same_shape, map_kernel, zip_kernel};
use crate::tensor::{ones, Tensor};

impl Tensor {
    /// Checks if this tensor requires gradient computation.
    pub fn requires_grad(&self) -> bool {
        self.read_data().requires_grad
    }

    /// Sets the `requires_grad` flag for this tensor.
    pub fn set_requires_grad(&self, requires_grad: bool) {
        let mut guard = self.write_data();
        if requires_grad && guard.grad_fn.is_some() {
            log::warn!("Setting requires_grad=true on a non-leaf tensor. Its gradient will not accumulate in .grad() during backward(). Did you mean to use .detach()?");
        }
        guard.requires_grad = requires_grad;
    }

    /// Returns `true` if this tensor was not produced by a tracked operation.
    pub fn is_leaf(&self) -> bool {
        self.read_data().grad_fn.is_none()
    }

    /// Returns a handle to the accumulated gradient, if any.
    pub fn grad(&self) -> Option<Tensor> {
        self.read_data().grad.clone()
    }

    /// Clears the gradient tensor associated with this tensor.
    pub fn clear_grad(&self) {
        self.write_data().grad = None;
    }

    pub(crate) fn grad_fn(&self) -> Option<Arc<dyn BackwardOp>> {
        self.read_data().grad_fn.clone()
    }

    /// Returns a new leaf tensor holding a copy of this tensor's elements,
    /// cut off from the computation graph.
    pub fn detach(&self) -> Tensor {
        map_kernel(self, |x| x)
    }

    /// Appends `hook` to this tensor's gradient notification list.
    ///
    /// The hook does not run now: it fires during a later `backward()` call, once the
    /// gradient of this tensor has been fully accumulated. Hooks run in registration
    /// order and each one receives the previous one's output. Registered hooks cannot
    /// be removed.
    ///
    /// # Errors
    /// Returns `GradChainError::HookOnNonDifferentiable` if the tensor does not require grad.
    pub fn register_hook<F>(&self, hook: F) -> Result<(), GradChainError>
    where
        F: Fn(&Tensor) -> Result<Tensor, GradChainError> + Send + Sync + 'static,
    {
        self.register_shared_hook(Arc::new(hook))
    }

    /// Same as [`Tensor::register_hook`] for a hook that is already shared.
    pub fn register_shared_hook(&self, hook: GradHook) -> Result<(), GradChainError> {
        let mut guard = self.write_data();
        if !guard.requires_grad {
            return Err(GradChainError::HookOnNonDifferentiable {
                shape: guard.shape.clone(),
            });
        }
        guard.hooks.push(hook);
        Ok(())
    }

    /// Number of hooks currently registered on this tensor.
    pub fn num_hooks(&self) -> usize {
        self.read_data().hooks.len()
    }

    /// Accumulates `grad_to_add` into this tensor's `grad` field.
    ///
    /// The stored gradient is always a private copy, so in-place updates of one
    /// parameter's gradient never leak into another's.
    pub(crate) fn acc_grad(&self, grad_to_add: &Tensor) -> Result<(), GradChainError> {
        let expected_shape = self.shape();
        check_same_shape(&expected_shape, &grad_to_add.shape(), "acc_grad")?;
        let existing = self.grad();
        let new_grad = match existing {
            Some(existing_grad) => zip_kernel(&existing_grad, grad_to_add, "acc_grad", |a, b| {
                a + b
            })?,
            None => grad_to_add.detach(),
        };
        self.write_data().grad = Some(new_grad);
        Ok(())
    }

    /// Performs the backward pass starting from this tensor.
    ///
    /// Gradients are propagated in reverse topological order. When the gradient of a
    /// node is complete its hooks fire; the hooked gradient is then either passed to
    /// the node's `grad_fn` or, for a leaf, accumulated into `.grad()`.
    ///
    /// # Arguments
    /// * `gradient`: Gradient of the final objective with respect to this tensor. If `None`,
    ///   this tensor must hold exactly one element and the gradient defaults to `1.0`.
    ///
    /// # Errors
    /// * `RequiresGradNotMet` if this tensor does not require grad.
    /// * `BackwardNonScalar` if `gradient` is `None` for a tensor with more than one element.
    /// * `ShapeMismatch` if `gradient` (or a hook result) has the wrong shape.
    /// * Any error returned by a backward operation or a hook.
    pub fn backward(&self, gradient: Option<Tensor>) -> Result<(), GradChainError> {
        if !self.requires_grad() {
            return Err(GradChainError::RequiresGradNotMet);
        }

        let grad_init = match gradient {
            Some(g) => {
                check_same_shape(&self.shape(), &g.shape(), "backward initial gradient")?;
                g
            }
            None => {
                if self.numel() != 1 {
                    return Err(GradChainError::BackwardNonScalar);
                }
                ones(&self.shape())?
            }
        };

        let mut grad_map: HashMap<NodeId, Tensor> = HashMap::new();
        grad_map.insert(self.node_id(), grad_init);

        let sorted_nodes = topological_sort(self);
        log::debug!("backward over {} graph nodes", sorted_nodes.len());

        for node in sorted_nodes {
            let Some(accumulated_grad) = grad_map.remove(&node.node_id()) else {
                continue;
            };

            let hooks = node.read_data().hooks.clone();
            let grad = run_hooks(&hooks, accumulated_grad)?;

            match node.grad_fn() {
                Some(grad_fn) => {
                    let input_grads = grad_fn.backward(&grad)?;
                    let inputs = grad_fn.inputs();
                    if input_grads.len() != inputs.len() {
                        return Err(GradChainError::BackwardError(format!(
                            "BackwardOp returned {} gradients, but expected {} (for op: {:?})",
                            input_grads.len(),
                            inputs.len(),
                            grad_fn
                        )));
                    }
                    for (input, input_grad) in inputs.iter().zip(input_grads) {
                        if !input.requires_grad() {
                            continue;
                        }
                        check_same_shape(&input.shape(), &input_grad.shape(), "backward")?;
                        let merged = match grad_map.remove(&input.node_id()) {
                            Some(existing) => {
                                zip_kernel(&existing, &input_grad, "backward", |a, b| a + b)?
                            }
                            None => input_grad,
                        };
                        grad_map.insert(input.node_id(), merged);
                    }
                }
                None => node.acc_grad(&grad)?,
            }
        }

        Ok(())
    }
}
