// src/tensor/create.rs

use rand::Rng;
use rand_distr::StandardNormal;

use crate::error::GradChainError;
use crate::tensor::Tensor;

/// Creates a new tensor filled with zeros with the specified shape.
pub fn zeros(shape: &[usize]) -> Result<Tensor, GradChainError> {
    full(shape, 0.0)
}

/// Creates a new tensor filled with ones with the specified shape.
pub fn ones(shape: &[usize]) -> Result<Tensor, GradChainError> {
    full(shape, 1.0)
}

/// Creates a new tensor filled with a specific value with the specified shape.
pub fn full(shape: &[usize], value: f32) -> Result<Tensor, GradChainError> {
    let numel = shape.iter().product();
    Tensor::new(vec![value; numel], shape.to_vec())
}

/// Creates a new tensor filled with zeros, having the same shape as the input tensor.
/// The result never requires grad.
pub fn zeros_like(tensor: &Tensor) -> Result<Tensor, GradChainError> {
    zeros(&tensor.shape())
}

/// Creates a new tensor filled with ones, having the same shape as the input tensor.
pub fn ones_like(tensor: &Tensor) -> Result<Tensor, GradChainError> {
    ones(&tensor.shape())
}

/// Creates a tensor with elements drawn from the standard normal distribution
/// using the thread-local generator.
pub fn randn(shape: &[usize]) -> Result<Tensor, GradChainError> {
    randn_with_rng(shape, &mut rand::thread_rng())
}

/// Creates a tensor with elements drawn from the standard normal distribution
/// using the supplied generator, so seeded runs are reproducible.
pub fn randn_with_rng<R: Rng>(
    shape: &[usize],
    rng: &mut R,
) -> Result<Tensor, GradChainError> {
    let numel: usize = shape.iter().product();
    let data_vec: Vec<f32> = (0..numel).map(|_| rng.sample(StandardNormal)).collect();
    Tensor::new(data_vec, shape.to_vec())
}
