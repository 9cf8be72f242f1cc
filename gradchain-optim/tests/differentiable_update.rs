use std::sync::{Arc, Mutex};

use gradchain_core::{GradChainError, Tensor};
use gradchain_optim::{
    apply_updates, chain, register_hook, scale, trace, zero_nan_hook, GradientTransformation,
    OptimError, TensorTree, DEFAULT_INPLACE,
};

mod common;
use common::{create_test_tensor, init_logger};

/// One differentiable inner step: the updates are `meta * x`, transformed by `opt`
/// out of place and added to `params = [1, 2]`. The outer loss
/// `sum(sqrt(new_params) * [0, 1])` has a NaN gradient on the first element, since
/// the first new parameter lands exactly on 0.
fn inner_step(opt: &GradientTransformation) -> Result<Tensor, OptimError> {
    let meta = create_test_tensor(vec![10.0, 10.0], vec![2]);
    meta.set_requires_grad(true);
    let x = create_test_tensor(vec![1.0, 1.0], vec![2]);
    let params = TensorTree::from(create_test_tensor(vec![1.0, 2.0], vec![2]));

    let updates = TensorTree::from(meta.mul(&x)?);
    let state = opt.init(&params)?;
    let (updates, _) = opt.update(updates, state, false)?;
    let new_params = apply_updates(&params, &updates, false)?;

    let new_params = new_params.as_leaf().expect("single parameter");
    let mask = create_test_tensor(vec![0.0, 1.0], vec![2]);
    new_params.sqrt().mul(&mask)?.sum().backward(None)?;
    Ok(meta)
}

#[test]
fn test_zero_nan_hook_cleans_meta_gradient() -> Result<(), OptimError> {
    init_logger();
    let meta = inner_step(&chain![register_hook(zero_nan_hook), scale(-0.1)])?;
    let grad = meta.grad().expect("meta gradient").get_f32_data();
    assert_eq!(grad[0], 0.0);
    assert!((grad[1] - (-0.05)).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_without_hook_meta_gradient_is_nan() -> Result<(), OptimError> {
    init_logger();
    let meta = inner_step(&chain![scale(-0.1)])?;
    let grad = meta.grad().expect("meta gradient").get_f32_data();
    assert!(grad[0].is_nan());
    assert!((grad[1] - (-0.05)).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_hook_after_scaling_still_sanitizes() -> Result<(), OptimError> {
    init_logger();
    // Registered after scaling, the hook sits on the scaled updates and still
    // stops the NaN before it reaches `meta`.
    let meta = inner_step(&chain![trace(0.9, false), scale(-0.1), register_hook(zero_nan_hook)])?;
    let grad = meta.grad().expect("meta gradient").get_f32_data();
    assert_eq!(grad[0], 0.0);
    assert!((grad[1] - (-0.05)).abs() < 1e-6);
    Ok(())
}

#[test]
fn test_stacked_hooks_run_in_registration_order() -> Result<(), OptimError> {
    init_logger();
    let log = Arc::new(Mutex::new(Vec::new()));
    let recorder = |name: &'static str| {
        let log = Arc::clone(&log);
        move |g: &Tensor| -> Result<Tensor, GradChainError> {
            if let Ok(mut entries) = log.lock() {
                entries.push(name);
            }
            Ok(g.clone())
        }
    };
    let opt = chain![register_hook(recorder("first")), register_hook(recorder("second"))];

    let w = create_test_tensor(vec![1.0], vec![1]);
    w.set_requires_grad(true);
    let updates = TensorTree::from(w.clone());
    let state = opt.init(&updates)?;
    opt.update(updates, state, DEFAULT_INPLACE)?;
    assert!(log.lock().expect("lock").is_empty());

    w.mul_scalar(3.0).sum().backward(None)?;
    assert_eq!(*log.lock().expect("lock"), vec!["first", "second"]);
    assert_eq!(w.num_hooks(), 2);
    Ok(())
}
