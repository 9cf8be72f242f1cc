use std::collections::HashSet;
use std::sync::RwLock;

use crate::tensor::Tensor;
use crate::tensor_data::TensorData;

/// Stable identity of a graph node: the address of its shared `TensorData`.
/// Only ever compared or hashed, never dereferenced.
pub(crate) type NodeId = *const RwLock<TensorData>;

/// Orders the graph reachable from `root` so that every node appears before
/// all of the nodes it was computed from (the root comes first).
pub(crate) fn topological_sort(root: &Tensor) -> Vec<Tensor> {
    let mut visited: HashSet<NodeId> = HashSet::new();
    let mut post_order: Vec<Tensor> = Vec::new();
    build_topo(root, &mut visited, &mut post_order);
    post_order.reverse();
    post_order
}

fn build_topo(node: &Tensor, visited: &mut HashSet<NodeId>, sorted_list: &mut Vec<Tensor>) {
    if !visited.insert(node.node_id()) {
        return;
    }
    let grad_fn = node.read_data().grad_fn.clone();
    if let Some(grad_fn) = grad_fn {
        for input in grad_fn.inputs() {
            build_topo(&input, visited, sorted_list);
        }
    }
    sorted_list.push(node.clone());
}
