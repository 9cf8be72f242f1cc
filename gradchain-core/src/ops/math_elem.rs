use crate::autograd::BackwardOp;
use crate::error::GradChainError;
use crate::ops::{map_kernel, record, zip_kernel};
use crate::tensor::Tensor;

#[derive(Debug)]
struct SqrtBackward {
    a: Tensor,
}

impl BackwardOp for SqrtBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        // d/da sqrt(a) = 0.5 / sqrt(a)
        let grad = zip_kernel(grad_output, &self.a, "sqrt backward", |g, a| {
            g * 0.5 / a.sqrt()
        })?;
        Ok(vec![grad])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct NanToZeroBackward {
    a: Tensor,
}

impl BackwardOp for NanToZeroBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        // Positions that were replaced do not depend on the input.
        let grad = zip_kernel(grad_output, &self.a, "nan_to_zero backward", |g, a| {
            if a.is_nan() {
                0.0
            } else {
                g
            }
        })?;
        Ok(vec![grad])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Element-wise square root. Negative inputs produce NaN.
pub fn sqrt_op(a: &Tensor) -> Tensor {
    let output = map_kernel(a, f32::sqrt);
    record(output, &[a], SqrtBackward { a: a.clone() })
}

/// Returns a copy of `a` where every NaN element is replaced by `0.0`.
/// Finite and infinite values are kept as they are.
pub fn nan_to_zero_op(a: &Tensor) -> Tensor {
    let output = map_kernel(a, |x| if x.is_nan() { 0.0 } else { x });
    record(output, &[a], NanToZeroBackward { a: a.clone() })
}
