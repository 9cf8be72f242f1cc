use gradchain_core::tensor::randn_with_rng;
use gradchain_core::Tensor;
use gradchain_optim::TensorTree;
use rand::rngs::StdRng;
use rand::SeedableRng;

// Helpers shared by the integration test binaries; not every binary uses all of them.
#[allow(dead_code)]
pub(crate) fn create_test_tensor(data: Vec<f32>, shape: Vec<usize>) -> Tensor {
    Tensor::new(data, shape).expect("Test tensor creation failed")
}

#[allow(dead_code)]
pub(crate) fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A `{"bias": [n], "weight": [rows, cols]}` tree of standard-normal values,
/// reproducible from `seed`.
#[allow(dead_code)]
pub(crate) fn seeded_tree(seed: u64) -> TensorTree {
    let mut rng = StdRng::seed_from_u64(seed);
    let weight = randn_with_rng(&[2, 3], &mut rng).expect("randn failed");
    let bias = randn_with_rng(&[3], &mut rng).expect("randn failed");
    TensorTree::dict([("bias", bias), ("weight", weight)])
}

/// Leaf values of a tree, concatenated in traversal order.
#[allow(dead_code)]
pub(crate) fn tree_values(tree: &TensorTree) -> Vec<f32> {
    tree.leaves().iter().flat_map(|t| t.get_f32_data()).collect()
}
