use crate::autograd::BackwardOp;
use crate::error::GradChainError;
use crate::ops::record;
use crate::tensor::{full, Tensor};

#[derive(Debug)]
struct SumBackward {
    a: Tensor,
    input_shape: Vec<usize>,
}

impl BackwardOp for SumBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        // Every input element contributes once to the sum.
        let g = grad_output.item()?;
        Ok(vec![full(&self.input_shape, g)?])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

/// Sums every element into a 0-dimensional tensor.
pub fn sum_op(a: &Tensor) -> Tensor {
    let (total, input_shape) = {
        let guard = a.read_data();
        (guard.data.iter().sum::<f32>(), guard.shape.clone())
    };
    record(
        Tensor::scalar(total),
        &[a],
        SumBackward {
            a: a.clone(),
            input_shape,
        },
    )
}
