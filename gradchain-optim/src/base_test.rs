#[cfg(test)]
mod tests {
    use gradchain_core::utils::testing::create_test_tensor;

    use crate::base::{identity, GradientTransformation, OptimizerState};
    use crate::error::OptimError;
    use crate::tree::TensorTree;

    #[derive(Debug, PartialEq)]
    struct Counter(u32);

    #[test]
    fn test_identity_is_stateless_pass_through() -> Result<(), OptimError> {
        let updates = TensorTree::from(create_test_tensor(vec![1.0, -1.0], vec![2]));
        let opt = identity();
        let state = opt.init(&updates)?;
        assert!(state.is_empty_state());

        let (out, new_state) = opt.update(updates.clone(), state, true)?;
        assert!(out.ptr_eq(&updates));
        assert!(new_state.is_empty_state());
        Ok(())
    }

    #[test]
    fn test_custom_state_round_trips_through_update() -> Result<(), OptimError> {
        let counting = GradientTransformation::new(
            |_params: &TensorTree| -> Result<OptimizerState, OptimError> {
                Ok(OptimizerState::custom(Counter(0)))
            },
            |updates: TensorTree,
             state: OptimizerState,
             _inplace: bool|
             -> Result<(TensorTree, OptimizerState), OptimError> {
                let count = state
                    .downcast_custom::<Counter>()
                    .map(|c| c.0)
                    .ok_or(OptimError::StateMismatch {
                        transformation: "counting",
                        expected: "Custom",
                        actual: state.kind(),
                    })?;
                Ok((updates, OptimizerState::custom(Counter(count + 1))))
            },
        );

        let updates = TensorTree::Empty;
        let state = counting.init(&updates)?;
        let (_, state) = counting.update(updates.clone(), state, false)?;
        let (_, state) = counting.update(updates, state, false)?;
        assert_eq!(state.downcast_custom::<Counter>(), Some(&Counter(2)));
        assert_eq!(state.downcast_custom::<u8>(), None);
        Ok(())
    }

    #[test]
    fn test_flatten_chain_ignores_nesting() {
        let nested = OptimizerState::Chain(vec![
            OptimizerState::Chain(vec![OptimizerState::Empty, OptimizerState::ScaleBySchedule { count: 3 }]),
            OptimizerState::Empty,
        ]);
        let kinds: Vec<&str> = nested.flatten_chain().iter().map(|s| s.kind()).collect();
        assert_eq!(kinds, vec!["Empty", "ScaleBySchedule", "Empty"]);
    }

    #[test]
    fn test_deep_clone_copies_buffers() -> Result<(), OptimError> {
        let mu = TensorTree::from(create_test_tensor(vec![1.0, 2.0], vec![2]));
        let state = OptimizerState::Chain(vec![OptimizerState::ScaleByAdam {
            count: 3,
            mu: mu.clone(),
            nu: TensorTree::Empty,
        }]);

        let copy = state.deep_clone();
        match copy.flatten_chain().first() {
            Some(OptimizerState::ScaleByAdam { count, mu: copied, nu }) => {
                assert_eq!(*count, 3);
                assert!(!copied.ptr_eq(&mu));
                assert_eq!(copied.as_leaf().expect("leaf").get_f32_data(), vec![1.0, 2.0]);
                assert!(matches!(nu, TensorTree::Empty));
            }
            other => panic!("unexpected state {:?}", other),
        }

        mu.as_leaf().expect("leaf").fill_(0.0)?;
        let copied = match copy.flatten_chain().first() {
            Some(OptimizerState::ScaleByAdam { mu, .. }) => mu.clone(),
            _ => TensorTree::Empty,
        };
        assert_eq!(copied.as_leaf().expect("leaf").get_f32_data(), vec![1.0, 2.0]);
        Ok(())
    }
}
