#[cfg(test)]
mod tests {
    use gradchain_core::utils::testing::{check_tensor_near, create_test_tensor};

    use crate::base::{identity, GradientTransformation, OptimizerState};
    use crate::chain;
    use crate::error::OptimError;
    use crate::transform::{scale, trace};
    use crate::tree::TensorTree;

    fn add_constant(c: f32) -> GradientTransformation {
        GradientTransformation::new(
            |_params: &TensorTree| -> Result<OptimizerState, OptimError> { Ok(OptimizerState::Empty) },
            move |updates: TensorTree,
                  state: OptimizerState,
                  _inplace: bool|
                  -> Result<(TensorTree, OptimizerState), OptimError> {
                Ok((updates.map(|u| u.add_scalar(c)), state))
            },
        )
    }

    fn leaf(tree: &TensorTree) -> &gradchain_core::Tensor {
        tree.as_leaf().expect("tree should be a single leaf")
    }

    fn params() -> TensorTree {
        TensorTree::from(vec![
            create_test_tensor(vec![1.0, 2.0], vec![2]),
            create_test_tensor(vec![-3.0], vec![1]),
        ])
    }

    #[test]
    fn test_chain_of_identities_is_identity() -> Result<(), OptimError> {
        for n in 1..=4 {
            let opt = chain((0..n).map(|_| identity()));
            let updates = params();
            let state = opt.init(&updates)?;
            let (out, new_state) = opt.update(updates.clone(), state, true)?;

            assert!(out.ptr_eq(&updates));
            match new_state {
                OptimizerState::Chain(states) => assert_eq!(states.len(), n),
                other => panic!("expected a chain state, got {:?}", other),
            }
        }
        Ok(())
    }

    #[test]
    fn test_init_then_update_never_invalid() -> Result<(), OptimError> {
        let opt = chain![trace(0.9, false), scale(-0.1), chain![identity(), scale(2.0)]];
        let p = params();
        let state = opt.init(&p)?;
        let grads = p.map(|t| t.detach());
        let (_, state) = opt.update(grads, state, true)?;
        // Threaded state stays valid for the next step too
        let grads = p.map(|t| t.detach());
        opt.update(grads, state, true)?;
        Ok(())
    }

    #[test]
    fn test_update_with_wrong_state_length_fails() -> Result<(), OptimError> {
        for n in 1..=3usize {
            let opt = chain((0..n).map(|_| identity()));
            for wrong in (0..=n + 1).filter(|&len| len != n) {
                let state = OptimizerState::Chain(vec![OptimizerState::Empty; wrong]);
                let result = opt.update(params(), state, true);
                assert_eq!(
                    result.err(),
                    Some(OptimError::InvalidState {
                        expected: n,
                        actual: wrong
                    })
                );
            }
        }
        Ok(())
    }

    #[test]
    fn test_update_without_init_fails() {
        let opt = chain![identity(), identity()];
        let result = opt.update(params(), OptimizerState::Empty, true);
        assert!(matches!(
            result,
            Err(OptimError::InvalidState {
                expected: 2,
                actual: 1
            })
        ));
    }

    #[test]
    fn test_order_sensitivity() -> Result<(), OptimError> {
        let x = TensorTree::from(create_test_tensor(vec![1.0, -2.0, 0.5], vec![3]));
        let (c, k) = (3.0, 2.0);

        let add_then_scale = chain![add_constant(c), scale(k)];
        let state = add_then_scale.init(&x)?;
        let (out, _) = add_then_scale.update(x.clone(), state, false)?;
        // (x + c) * k
        check_tensor_near(leaf(&out), &[3], &[8.0, 2.0, 7.0], 1e-6);

        let scale_then_add = chain![scale(k), add_constant(c)];
        let state = scale_then_add.init(&x)?;
        let (out, _) = scale_then_add.update(x.clone(), state, false)?;
        // x * k + c
        check_tensor_near(leaf(&out), &[3], &[5.0, -1.0, 4.0], 1e-6);

        // Out-of-place stages leave the input alone
        check_tensor_near(leaf(&x), &[3], &[1.0, -2.0, 0.5], 0.0);
        Ok(())
    }

    #[test]
    fn test_stage_failure_aborts_pipeline() {
        let failing = GradientTransformation::new(
            |_params: &TensorTree| -> Result<OptimizerState, OptimError> { Ok(OptimizerState::Empty) },
            |_updates: TensorTree,
             _state: OptimizerState,
             _inplace: bool|
             -> Result<(TensorTree, OptimizerState), OptimError> {
                Err(OptimError::ConfigurationError("stage failed".to_string()))
            },
        );
        let x = TensorTree::from(create_test_tensor(vec![1.0], vec![1]));
        let opt = chain![failing, scale(10.0)];
        let result = opt
            .init(&x)
            .and_then(|state| opt.update(x.clone(), state, true));

        assert_eq!(
            result.err(),
            Some(OptimError::ConfigurationError("stage failed".to_string()))
        );
        // The scaling stage never ran
        check_tensor_near(leaf(&x), &[1], &[1.0], 0.0);
    }

    #[test]
    fn test_empty_chain_is_identity() -> Result<(), OptimError> {
        let opt = chain(Vec::new());
        let x = params();
        let state = opt.init(&x)?;
        let (out, state) = opt.update(x.clone(), state, true)?;
        assert!(out.ptr_eq(&x));
        assert!(matches!(state, OptimizerState::Chain(ref s) if s.is_empty()));
        Ok(())
    }

    #[test]
    fn test_inplace_flag_reaches_every_stage() -> Result<(), OptimError> {
        let x = TensorTree::from(create_test_tensor(vec![1.0, 2.0], vec![2]));
        let opt = chain![scale(2.0), scale(3.0)];
        let state = opt.init(&x)?;

        let (out, state) = opt.update(x.clone(), state, false)?;
        check_tensor_near(leaf(&out), &[2], &[6.0, 12.0], 1e-6);
        check_tensor_near(leaf(&x), &[2], &[1.0, 2.0], 0.0);

        let (out, _) = opt.update(x.clone(), state, true)?;
        assert!(out.ptr_eq(&x));
        check_tensor_near(leaf(&x), &[2], &[6.0, 12.0], 1e-6);
        Ok(())
    }
}
