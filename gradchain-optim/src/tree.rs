//! Tree-structured containers of tensors.
//!
//! Parameters, gradients, updates and per-parameter optimizer buffers all share
//! the same shape: an arbitrarily nested structure of sequences and string-keyed
//! maps whose leaves are tensors, or null when a parameter has no value (for
//! example, no gradient yet).

use std::collections::BTreeMap;
use std::vec;

use gradchain_core::Tensor;

use crate::error::OptimError;

/// A nested container of tensors.
#[derive(Debug, Clone, Default)]
pub enum TensorTree {
    /// A null leaf. Maps preserve it and callbacks never see it.
    #[default]
    Empty,
    Leaf(Tensor),
    Sequence(Vec<TensorTree>),
    Map(BTreeMap<String, TensorTree>),
}

/// The shape of a [`TensorTree`] with its leaves removed.
///
/// Null and tensor leaves share the same [`TreeDef::Leaf`] slot, so a gradient tree
/// with missing entries still lines up with the parameter tree it came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDef {
    Leaf,
    Sequence(Vec<TreeDef>),
    Map(Vec<(String, TreeDef)>),
}

impl From<Tensor> for TensorTree {
    fn from(tensor: Tensor) -> Self {
        TensorTree::Leaf(tensor)
    }
}

impl From<Option<Tensor>> for TensorTree {
    fn from(tensor: Option<Tensor>) -> Self {
        tensor.map_or(TensorTree::Empty, TensorTree::Leaf)
    }
}

impl From<Vec<Tensor>> for TensorTree {
    fn from(tensors: Vec<Tensor>) -> Self {
        TensorTree::Sequence(tensors.into_iter().map(TensorTree::Leaf).collect())
    }
}

impl TensorTree {
    /// Builds a sequence node from any iterator of subtrees.
    pub fn sequence<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<TensorTree>,
    {
        TensorTree::Sequence(items.into_iter().map(Into::into).collect())
    }

    /// Builds a map node from `(key, subtree)` pairs.
    pub fn dict<I, K, T>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<String>,
        T: Into<TensorTree>,
    {
        TensorTree::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        )
    }

    pub fn is_empty_leaf(&self) -> bool {
        matches!(self, TensorTree::Empty)
    }

    pub fn as_leaf(&self) -> Option<&Tensor> {
        match self {
            TensorTree::Leaf(tensor) => Some(tensor),
            _ => None,
        }
    }

    /// Child of a map node by key.
    pub fn get(&self, key: &str) -> Option<&TensorTree> {
        match self {
            TensorTree::Map(entries) => entries.get(key),
            _ => None,
        }
    }

    /// Child of a sequence node by position.
    pub fn get_index(&self, index: usize) -> Option<&TensorTree> {
        match self {
            TensorTree::Sequence(items) => items.get(index),
            _ => None,
        }
    }

    /// Applies `f` to every tensor leaf, keeping the structure and the null leaves.
    pub fn map<F>(&self, mut f: F) -> TensorTree
    where
        F: FnMut(&Tensor) -> Tensor,
    {
        self.map_inner(&mut f)
    }

    fn map_inner<F>(&self, f: &mut F) -> TensorTree
    where
        F: FnMut(&Tensor) -> Tensor,
    {
        match self {
            TensorTree::Empty => TensorTree::Empty,
            TensorTree::Leaf(tensor) => TensorTree::Leaf(f(tensor)),
            TensorTree::Sequence(items) => {
                TensorTree::Sequence(items.iter().map(|item| item.map_inner(f)).collect())
            }
            TensorTree::Map(entries) => TensorTree::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.map_inner(f)))
                    .collect(),
            ),
        }
    }

    /// Fallible [`TensorTree::map`]. Stops at the first error.
    pub fn try_map<F>(&self, mut f: F) -> Result<TensorTree, OptimError>
    where
        F: FnMut(&Tensor) -> Result<Tensor, OptimError>,
    {
        self.try_map_inner(&mut f)
    }

    fn try_map_inner<F>(&self, f: &mut F) -> Result<TensorTree, OptimError>
    where
        F: FnMut(&Tensor) -> Result<Tensor, OptimError>,
    {
        Ok(match self {
            TensorTree::Empty => TensorTree::Empty,
            TensorTree::Leaf(tensor) => TensorTree::Leaf(f(tensor)?),
            TensorTree::Sequence(items) => TensorTree::Sequence(
                items
                    .iter()
                    .map(|item| item.try_map_inner(f))
                    .collect::<Result<_, _>>()?,
            ),
            TensorTree::Map(entries) => TensorTree::Map(
                entries
                    .iter()
                    .map(|(k, v)| Ok((k.clone(), v.try_map_inner(f)?)))
                    .collect::<Result<_, OptimError>>()?,
            ),
        })
    }

    /// Calls `f` on every tensor leaf in traversal order. Stops at the first error.
    pub fn try_for_each_leaf<F>(&self, mut f: F) -> Result<(), OptimError>
    where
        F: FnMut(&Tensor) -> Result<(), OptimError>,
    {
        self.leaves().into_iter().try_for_each(|leaf| f(leaf))
    }

    /// Tensor leaves in traversal order (sequence order, then sorted map keys).
    pub fn leaves(&self) -> Vec<&Tensor> {
        let mut out = Vec::new();
        self.collect_leaves(&mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, out: &mut Vec<&'a Tensor>) {
        match self {
            TensorTree::Empty => {}
            TensorTree::Leaf(tensor) => out.push(tensor),
            TensorTree::Sequence(items) => items.iter().for_each(|item| item.collect_leaves(out)),
            TensorTree::Map(entries) => entries.values().for_each(|v| v.collect_leaves(out)),
        }
    }

    /// Number of tensor leaves; null leaves are not counted.
    pub fn num_leaves(&self) -> usize {
        self.leaves().len()
    }

    pub fn structure(&self) -> TreeDef {
        match self {
            TensorTree::Empty | TensorTree::Leaf(_) => TreeDef::Leaf,
            TensorTree::Sequence(items) => {
                TreeDef::Sequence(items.iter().map(TensorTree::structure).collect())
            }
            TensorTree::Map(entries) => TreeDef::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.structure()))
                    .collect(),
            ),
        }
    }

    /// Splits the tree into its leaf slots (null leaves as `None`) and its structure.
    pub fn flatten(&self) -> (Vec<Option<Tensor>>, TreeDef) {
        let mut slots = Vec::new();
        self.collect_slots(&mut slots);
        (slots, self.structure())
    }

    fn collect_slots(&self, out: &mut Vec<Option<Tensor>>) {
        match self {
            TensorTree::Empty => out.push(None),
            TensorTree::Leaf(tensor) => out.push(Some(tensor.clone())),
            TensorTree::Sequence(items) => items.iter().for_each(|item| item.collect_slots(out)),
            TensorTree::Map(entries) => entries.values().for_each(|v| v.collect_slots(out)),
        }
    }

    /// Returns `true` if both trees have the same structure and every tensor leaf
    /// points to the same storage.
    pub fn ptr_eq(&self, other: &TensorTree) -> bool {
        match (self, other) {
            (TensorTree::Empty, TensorTree::Empty) => true,
            (TensorTree::Leaf(a), TensorTree::Leaf(b)) => a.ptr_eq(b),
            (TensorTree::Sequence(a), TensorTree::Sequence(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.ptr_eq(y))
            }
            (TensorTree::Map(a), TensorTree::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .zip(b)
                        .all(|((ka, va), (kb, vb))| ka == kb && va.ptr_eq(vb))
            }
            _ => false,
        }
    }
}

impl TreeDef {
    /// Number of leaf slots, null ones included.
    pub fn num_leaves(&self) -> usize {
        match self {
            TreeDef::Leaf => 1,
            TreeDef::Sequence(items) => items.iter().map(TreeDef::num_leaves).sum(),
            TreeDef::Map(entries) => entries.iter().map(|(_, v)| v.num_leaves()).sum(),
        }
    }

    /// Rebuilds a tree from leaf slots produced in [`TensorTree::flatten`] order.
    ///
    /// # Errors
    /// `TreeStructureMismatch` if `leaves` does not hold exactly one slot per leaf.
    pub fn unflatten(&self, leaves: Vec<Option<Tensor>>) -> Result<TensorTree, OptimError> {
        let expected = self.num_leaves();
        if leaves.len() != expected {
            return Err(OptimError::TreeStructureMismatch {
                operation: "unflatten".to_string(),
                reason: format!("expected {} leaves, got {}", expected, leaves.len()),
            });
        }
        let mut iter = leaves.into_iter();
        Ok(self.build(&mut iter))
    }

    fn build(&self, iter: &mut vec::IntoIter<Option<Tensor>>) -> TensorTree {
        match self {
            TreeDef::Leaf => iter.next().flatten().into(),
            TreeDef::Sequence(items) => {
                TensorTree::Sequence(items.iter().map(|item| item.build(iter)).collect())
            }
            TreeDef::Map(entries) => TensorTree::Map(
                entries
                    .iter()
                    .map(|(k, v)| (k.clone(), v.build(iter)))
                    .collect(),
            ),
        }
    }
}
