use crate::autograd::BackwardOp;
use crate::error::GradChainError;
use crate::ops::{map_kernel, record, zip_kernel};
use crate::tensor::Tensor;

// --- Backward Operation Structures ---

#[derive(Debug)]
struct AddBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for AddBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        Ok(vec![grad_output.clone(), grad_output.clone()])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct SubBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for SubBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        Ok(vec![grad_output.clone(), map_kernel(grad_output, |g| -g)])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct MulBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for MulBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        // grad_a = grad_output * b, grad_b = grad_output * a
        let grad_a = zip_kernel(grad_output, &self.b, "mul backward", |g, b| g * b)?;
        let grad_b = zip_kernel(grad_output, &self.a, "mul backward", |g, a| g * a)?;
        Ok(vec![grad_a, grad_b])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct DivBackward {
    a: Tensor,
    b: Tensor,
}

impl BackwardOp for DivBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        // grad_a = g / b, grad_b = -g * a / b^2
        let grad_a = zip_kernel(grad_output, &self.b, "div backward", |g, b| g / b)?;
        let a_over_b2 = zip_kernel(&self.a, &self.b, "div backward", |a, b| a / (b * b))?;
        let grad_b = zip_kernel(grad_output, &a_over_b2, "div backward", |g, q| -g * q)?;
        Ok(vec![grad_a, grad_b])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone(), self.b.clone()]
    }
}

#[derive(Debug)]
struct NegBackward {
    a: Tensor,
}

impl BackwardOp for NegBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        Ok(vec![map_kernel(grad_output, |g| -g)])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct AddScalarBackward {
    a: Tensor,
}

impl BackwardOp for AddScalarBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        Ok(vec![grad_output.clone()])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

#[derive(Debug)]
struct MulScalarBackward {
    a: Tensor,
    scalar: f32,
}

impl BackwardOp for MulScalarBackward {
    fn backward(&self, grad_output: &Tensor) -> Result<Vec<Tensor>, GradChainError> {
        let scalar = self.scalar;
        Ok(vec![map_kernel(grad_output, |g| g * scalar)])
    }

    fn inputs(&self) -> Vec<Tensor> {
        vec![self.a.clone()]
    }
}

// --- Forward Operations ---

/// Element-wise `a + b`. Both tensors must have the same shape.
pub fn add_op(a: &Tensor, b: &Tensor) -> Result<Tensor, GradChainError> {
    let output = zip_kernel(a, b, "add", |x, y| x + y)?;
    Ok(record(output, &[a, b], AddBackward { a: a.clone(), b: b.clone() }))
}

/// Element-wise `a - b`.
pub fn sub_op(a: &Tensor, b: &Tensor) -> Result<Tensor, GradChainError> {
    let output = zip_kernel(a, b, "sub", |x, y| x - y)?;
    Ok(record(output, &[a, b], SubBackward { a: a.clone(), b: b.clone() }))
}

/// Element-wise `a * b`.
pub fn mul_op(a: &Tensor, b: &Tensor) -> Result<Tensor, GradChainError> {
    let output = zip_kernel(a, b, "mul", |x, y| x * y)?;
    Ok(record(output, &[a, b], MulBackward { a: a.clone(), b: b.clone() }))
}

/// Element-wise `a / b`. Division by zero follows IEEE semantics.
pub fn div_op(a: &Tensor, b: &Tensor) -> Result<Tensor, GradChainError> {
    let output = zip_kernel(a, b, "div", |x, y| x / y)?;
    Ok(record(output, &[a, b], DivBackward { a: a.clone(), b: b.clone() }))
}

/// Element-wise `-a`.
pub fn neg_op(a: &Tensor) -> Tensor {
    let output = map_kernel(a, |x| -x);
    record(output, &[a], NegBackward { a: a.clone() })
}

/// Adds `scalar` to every element.
pub fn add_scalar_op(a: &Tensor, scalar: f32) -> Tensor {
    let output = map_kernel(a, |x| x + scalar);
    record(output, &[a], AddScalarBackward { a: a.clone() })
}

/// Multiplies every element by `scalar`.
pub fn mul_scalar_op(a: &Tensor, scalar: f32) -> Tensor {
    let output = map_kernel(a, |x| x * scalar);
    record(output, &[a], MulScalarBackward { a: a.clone(), scalar })
}
