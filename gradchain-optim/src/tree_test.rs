#[cfg(test)]
mod tests {
    use gradchain_core::utils::testing::{check_tensor_near, create_test_tensor};

    use crate::error::OptimError;
    use crate::tree::{TensorTree, TreeDef};

    fn nested_tree() -> TensorTree {
        TensorTree::dict([
            ("bias", TensorTree::Empty),
            (
                "layers",
                TensorTree::from(vec![
                    create_test_tensor(vec![1.0, 2.0], vec![2]),
                    create_test_tensor(vec![3.0], vec![1]),
                ]),
            ),
            ("weight", create_test_tensor(vec![4.0, 5.0, 6.0, 7.0], vec![2, 2]).into()),
        ])
    }

    #[test]
    fn test_map_keeps_structure_and_null_leaves() {
        let tree = nested_tree();
        let doubled = tree.map(|t| t.mul_scalar(2.0));

        assert_eq!(doubled.structure(), tree.structure());
        assert!(doubled.get("bias").map_or(false, TensorTree::is_empty_leaf));
        let first = doubled
            .get("layers")
            .and_then(|l| l.get_index(0))
            .and_then(TensorTree::as_leaf)
            .expect("first layer");
        check_tensor_near(first, &[2], &[2.0, 4.0], 1e-6);
    }

    #[test]
    fn test_leaves_follow_sorted_key_order() {
        let tree = nested_tree();
        let values: Vec<f32> = tree.leaves().iter().map(|t| t.get_f32_data()[0]).collect();
        // "bias" is null, then "layers" (sequence order), then "weight"
        assert_eq!(values, vec![1.0, 3.0, 4.0]);
        assert_eq!(tree.num_leaves(), 3);
        assert_eq!(tree.structure().num_leaves(), 4);
    }

    #[test]
    fn test_flatten_unflatten_preserves_identity() -> Result<(), OptimError> {
        let tree = nested_tree();
        let (slots, def) = tree.flatten();
        assert_eq!(slots.len(), 4);
        assert!(slots[0].is_none());

        let rebuilt = def.unflatten(slots)?;
        assert!(rebuilt.ptr_eq(&tree));
        Ok(())
    }

    #[test]
    fn test_unflatten_rejects_wrong_leaf_count() {
        let def = TreeDef::Sequence(vec![TreeDef::Leaf, TreeDef::Leaf]);
        let result = def.unflatten(vec![None]);
        assert!(matches!(
            result,
            Err(OptimError::TreeStructureMismatch { .. })
        ));
    }

    #[test]
    fn test_try_map_stops_at_first_error() {
        let tree = nested_tree();
        let mut visited = 0;
        let result = tree.try_map(|t| {
            visited += 1;
            if visited == 2 {
                Err(OptimError::ConfigurationError("boom".to_string()))
            } else {
                Ok(t.clone())
            }
        });
        assert!(result.is_err());
        assert_eq!(visited, 2);
    }

    #[test]
    fn test_ptr_eq_distinguishes_copies() {
        let tree = nested_tree();
        let copy = tree.map(|t| t.detach());
        assert!(tree.ptr_eq(&tree.clone()));
        assert!(!tree.ptr_eq(&copy));
    }
}
