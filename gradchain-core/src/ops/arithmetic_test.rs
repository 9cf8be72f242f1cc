#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use crate::error::GradChainError;
    use crate::ops::{add_op, add_scalar_op, div_op, mul_op, mul_scalar_op, neg_op, sub_op};
    use crate::utils::testing::{check_tensor_near, create_test_tensor, create_test_tensor_with_grad};

    #[test]
    fn test_add_tensors_ok() -> Result<(), GradChainError> {
        let t1 = create_test_tensor(vec![1.0, 2.0, 3.0, 4.0], vec![2, 2]);
        let t2 = create_test_tensor(vec![5.0, 6.0, 7.0, 8.0], vec![2, 2]);
        let result = add_op(&t1, &t2)?;
        check_tensor_near(&result, &[2, 2], &[6.0, 8.0, 10.0, 12.0], 1e-6);
        assert!(!result.requires_grad());
        assert!(result.is_leaf());
        Ok(())
    }

    #[test]
    fn test_add_tensors_shape_mismatch() {
        let t1 = create_test_tensor(vec![1.0, 2.0], vec![2]);
        let t2 = create_test_tensor(vec![1.0, 2.0, 3.0], vec![3]);
        let result = add_op(&t1, &t2);
        assert!(matches!(result, Err(GradChainError::ShapeMismatch { .. })));
    }

    #[test]
    fn test_sub_mul_div_forward() -> Result<(), GradChainError> {
        let a = create_test_tensor(vec![6.0, -2.0], vec![2]);
        let b = create_test_tensor(vec![3.0, 4.0], vec![2]);
        check_tensor_near(&sub_op(&a, &b)?, &[2], &[3.0, -6.0], 1e-6);
        check_tensor_near(&mul_op(&a, &b)?, &[2], &[18.0, -8.0], 1e-6);
        check_tensor_near(&div_op(&a, &b)?, &[2], &[2.0, -0.5], 1e-6);
        check_tensor_near(&neg_op(&a), &[2], &[-6.0, 2.0], 1e-6);
        check_tensor_near(&add_scalar_op(&a, 1.0), &[2], &[7.0, -1.0], 1e-6);
        check_tensor_near(&mul_scalar_op(&a, 0.5), &[2], &[3.0, -1.0], 1e-6);
        Ok(())
    }

    #[test]
    fn test_mul_backward() -> Result<(), GradChainError> {
        let a = create_test_tensor_with_grad(vec![2.0, 3.0], vec![2]);
        let b = create_test_tensor_with_grad(vec![5.0, 7.0], vec![2]);
        let out = mul_op(&a, &b)?;
        assert!(out.requires_grad());
        assert!(!out.is_leaf());

        out.sum().backward(None)?;
        check_tensor_near(&a.grad().expect("grad a"), &[2], &[5.0, 7.0], 1e-6);
        check_tensor_near(&b.grad().expect("grad b"), &[2], &[2.0, 3.0], 1e-6);
        Ok(())
    }

    #[test]
    fn test_div_backward() -> Result<(), GradChainError> {
        let a = create_test_tensor_with_grad(vec![3.0], vec![1]);
        let b = create_test_tensor_with_grad(vec![2.0], vec![1]);
        div_op(&a, &b)?.sum().backward(None)?;

        let grad_a = a.grad().expect("grad a").item()?;
        let grad_b = b.grad().expect("grad b").item()?;
        assert_relative_eq!(grad_a, 0.5, epsilon = 1e-6);
        assert_relative_eq!(grad_b, -0.75, epsilon = 1e-6);
        Ok(())
    }

    #[test]
    fn test_sub_and_scalar_backward() -> Result<(), GradChainError> {
        let a = create_test_tensor_with_grad(vec![1.0, 2.0], vec![2]);
        let b = create_test_tensor_with_grad(vec![0.0, 0.0], vec![2]);
        let out = sub_op(&mul_scalar_op(&a, 3.0), &add_scalar_op(&b, 1.0))?;
        neg_op(&out).sum().backward(None)?;

        check_tensor_near(&a.grad().expect("grad a"), &[2], &[-3.0, -3.0], 1e-6);
        check_tensor_near(&b.grad().expect("grad b"), &[2], &[1.0, 1.0], 1e-6);
        Ok(())
    }
}
