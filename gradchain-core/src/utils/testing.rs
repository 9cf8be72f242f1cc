use crate::tensor::Tensor;

/// Checks if a tensor matches an expected shape and data within `tolerance`.
/// Panics with the first mismatching index otherwise.
///
/// NaN in `expected_data` matches NaN in the tensor.
pub fn check_tensor_near(
    actual: &Tensor,
    expected_shape: &[usize],
    expected_data: &[f32],
    tolerance: f32,
) {
    assert_eq!(actual.shape(), expected_shape, "Shape mismatch");

    let actual_data_vec = actual.get_f32_data();
    assert_eq!(
        actual_data_vec.len(),
        expected_data.len(),
        "Data length mismatch"
    );

    for (i, (a, e)) in actual_data_vec.iter().zip(expected_data.iter()).enumerate() {
        if a == e || (a.is_nan() && e.is_nan()) {
            continue;
        }
        let diff = (*a - *e).abs();
        if diff.is_nan() || diff > tolerance {
            panic!(
                "Data mismatch at index {}: actual={:?}, expected={:?}, diff={:?}, tolerance={:?}",
                i, a, e, diff, tolerance
            );
        }
    }
}

/// Helper to create a simple f32 tensor for testing purposes.
pub fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    match Tensor::new(data, shape) {
        Ok(tensor) => tensor,
        Err(e) => panic!("Failed to create test tensor: {}", e),
    }
}

/// Helper to create a simple f32 leaf tensor that requires gradient.
pub fn create_test_tensor_with_grad(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    let tensor = create_test_tensor(data, shape);
    tensor.set_requires_grad(true);
    tensor
}
