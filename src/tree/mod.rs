//! Forests (collections of trees) built from parent-child edges.
//!
//! Nodes live in a flat arena, the [`ChildVecStore`], addressed by [`TreeNodeId`]. Each
//! node stores a [`ParentId`], its depth and an explicit `Vec` of its children in
//! first-appearance order. Keys are interned in an insertion-ordered set whose positions
//! are the node ids, so parent links are plain ids and never owning references.
//!
//! The core components are:
//! *   [`Forest`]: the node arena, the ordered roots, the key index and the maximum depth.
//! *   [`ForestNodeStore`] trait: the downward/upward interface the traversal iterators in
//!     [`iterato`] are written against.
//! *   [`builder::ForestBuilder`]: incremental construction from edges.
//! *   [`path::Paths`]: the lazy root-to-leaf path enumeration.
//! *   [`TreeNodeId`], [`RootId`], [`ParentId`]: typed identifiers for nodes, roots, and
//!     parent links.

use std::{
    fmt::{self, Display},
    ops::Index,
};

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    edge::{Edge, EdgeSet},
    value::Key,
};

pub mod builder;
pub mod iterato;
pub mod path;


/// A type-safe identifier for a node within a `Forest`.
/// Wraps a `usize` index into the underlying node storage vector.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TreeNodeId(pub(crate) usize);

impl From<usize> for TreeNodeId {
    fn from(i: usize) -> Self {
        TreeNodeId(i)
    }
}

impl Display for TreeNodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A type-safe identifier for a tree within a `Forest`.
/// Wraps a `usize` index into the `Forest`'s roots vector.
#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootId(pub(crate) usize);

impl From<usize> for RootId {
    fn from(i: usize) -> Self {
        RootId(i)
    }
}

#[derive(Clone, Debug, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum ParentId {
    Root(RootId),
    Node(TreeNodeId),
}

impl ParentId {
    pub fn is_root(&self) -> bool {
        match self {
            ParentId::Root(_) => true,
            ParentId::Node(_) => false,
        }
    }

    pub fn is_node(&self) -> bool {
        !self.is_root()
    }
}

/// A node of the arena: its parent link, depth and ordered children.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize)]
pub struct TreeNode {
    pub(crate) parent: ParentId,
    pub(crate) depth: usize,
    pub(crate) children: Vec<TreeNodeId>,
}

impl TreeNode {
    pub fn parent(&self) -> ParentId {
        self.parent
    }

    /// Distance from the root, roots having depth 0.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn children(&self) -> &[TreeNodeId] {
        &self.children
    }

    /// A node is a leaf iff it has no children.
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }
}

/// Each node stores its parent, depth and an explicit `Vec` of its children.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct ChildVecStore {
    pub(crate) nodes: Vec<TreeNode>,
}

impl Index<&TreeNodeId> for ChildVecStore {
    type Output = ParentId;
    fn index(&self, index: &TreeNodeId) -> &Self::Output {
        &self.nodes[index.0].parent
    }
}

impl Index<TreeNodeId> for ChildVecStore {
    type Output = TreeNode;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        &self.nodes[index.0]
    }
}

impl FromIterator<TreeNode> for ChildVecStore {
    fn from_iter<I: IntoIterator<Item = TreeNode>>(iter: I) -> Self {
        ChildVecStore {
            nodes: iter.into_iter().collect(),
        }
    }
}

// --- Core Traits ---

/// The interface the traversal iterators are written against.
/// `store[&node_id]` gives the [`ParentId`] of a node.
pub trait ForestNodeStore: for<'a> Index<&'a TreeNodeId, Output = ParentId> {
    fn n_nodes(&self) -> usize;

    /// The children of `node_id`, in their stored order.
    fn children(&self, node_id: TreeNodeId) -> &[TreeNodeId];

    fn iter_node_id(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        (0..self.n_nodes()).map(TreeNodeId)
    }

    fn iter_children(&self, node_id: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.children(node_id).iter().copied()
    }

    fn is_leaf(&self, node_id: TreeNodeId) -> bool {
        self.children(node_id).is_empty()
    }

    /// Returns an iterator over all leaf nodes in the entire store.
    fn iter_leaves(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.iter_node_id().filter(move |&n| self.is_leaf(n))
    }
}

impl ForestNodeStore for ChildVecStore {
    fn n_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn children(&self, node_id: TreeNodeId) -> &[TreeNodeId] {
        &self.nodes[node_id.0].children
    }
}

/// Errors raised when the builder finds the edges inconsistent with a forest.
///
/// A validated [`EdgeSet`] never produces one of these.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ForestError {
    #[error("child {child} already has parent {existing}, cannot attach it to {parent}")]
    ConflictingParent { child: Key, existing: Key, parent: Key },
    #[error("node {0} was reached twice during traversal")]
    Revisited(Key),
    #[error("node {0} is not reachable from any root")]
    Unreachable(Key),
}

/// A collection of disjoint trees over [`Key`]s.
///
/// Built by [`Forest::build`]; never mutated afterwards.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Forest {
    /// The underlying storage for all nodes in the forest.
    pub(crate) nodes: ChildVecStore,
    /// Keys in first-appearance order; the position of a key is its node id.
    pub(crate) keys: IndexSet<Key>,
    /// Root node of each tree, in first-appearance order.
    pub(crate) roots: Vec<TreeNodeId>,
    pub(crate) max_depth: usize,
}

impl Index<RootId> for Forest {
    type Output = TreeNodeId;
    fn index(&self, index: RootId) -> &Self::Output {
        &self.roots[index.0]
    }
}

impl Index<&TreeNodeId> for Forest {
    type Output = ParentId;
    fn index(&self, index: &TreeNodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Index<TreeNodeId> for Forest {
    type Output = TreeNode;
    fn index(&self, index: TreeNodeId) -> &Self::Output {
        &self.nodes[index]
    }
}

impl Forest {
    /// Number of nodes.
    pub fn len(&self) -> usize {
        self.nodes.n_nodes()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.nodes.is_empty()
    }

    /// Depth of the deepest node. A forest of lone roots has `max_depth == 0`.
    pub fn max_depth(&self) -> usize {
        self.max_depth
    }

    pub fn n_roots(&self) -> usize {
        self.roots.len()
    }

    pub fn iter_root_ids(&self) -> impl Iterator<Item = RootId> {
        (0..self.roots.len()).map(RootId)
    }

    /// Root keys in first-appearance order.
    pub fn roots(&self) -> impl Iterator<Item = &Key> + '_ {
        self.roots.iter().map(|&r| self.key(r))
    }

    pub fn node_id(&self, key: &Key) -> Option<TreeNodeId> {
        self.keys.get_index_of(key).map(TreeNodeId)
    }

    pub fn key(&self, node_id: TreeNodeId) -> &Key {
        &self.keys[node_id.0]
    }

    pub fn get(&self, key: &Key) -> Option<&TreeNode> {
        self.node_id(key).map(|id| &self.nodes[id])
    }

    pub fn contains(&self, key: &Key) -> bool {
        self.keys.contains(key)
    }

    pub fn depth(&self, key: &Key) -> Option<usize> {
        self.get(key).map(TreeNode::depth)
    }

    /// The parent's key; `None` for roots and unknown keys.
    pub fn parent_key(&self, key: &Key) -> Option<&Key> {
        match self.get(key)?.parent {
            ParentId::Node(p) => Some(self.key(p)),
            ParentId::Root(_) => None,
        }
    }

    /// Child keys in stored order; empty for leaves and unknown keys.
    pub fn children(&self, key: &Key) -> impl Iterator<Item = &Key> + '_ {
        self.get(key)
            .map(TreeNode::children)
            .unwrap_or_default()
            .iter()
            .map(|&c| self.key(c))
    }

    pub fn is_leaf(&self, key: &Key) -> Option<bool> {
        self.get(key).map(TreeNode::is_leaf)
    }

    pub fn iter_nodes(&self) -> impl Iterator<Item = (TreeNodeId, &TreeNode)> {
        self.nodes
            .nodes
            .iter()
            .enumerate()
            .map(|(i, n)| (TreeNodeId(i), n))
    }

    pub fn iter_children(&self, start: TreeNodeId) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes.iter_children(start)
    }

    pub fn iter_leaves(&self) -> impl Iterator<Item = TreeNodeId> + '_ {
        self.nodes.iter_leaves()
    }

    /// Returns a pre-order DFS iterator starting from the given node.
    pub fn iter_preorder(&self, start: TreeNodeId) -> iterato::PreorderIter<'_, ChildVecStore> {
        iterato::PreorderIter::new(&self.nodes, start)
    }

    /// Returns a BFS iterator starting at the given node.
    pub fn iter_bfs(&self, start: TreeNodeId) -> iterato::BfsIter<'_, ChildVecStore> {
        iterato::BfsIter::new(&self.nodes, start)
    }

    /// BFS over the whole forest, seeded with every root at once.
    pub fn iter_breadth_first(&self) -> iterato::BfsIter<'_, ChildVecStore> {
        iterato::BfsIter::from_roots(&self.nodes, self.roots.iter().copied())
    }

    /// Returns an iterator that traverses upwards from `start_node` to its root (inclusive).
    pub fn iter_ancestors(&self, start_node: TreeNodeId) -> iterato::AncestorsIter<'_, ChildVecStore> {
        iterato::AncestorsIter::new(&self.nodes, start_node)
    }

    /// The edges this forest was built from, in pre-order.
    ///
    /// Roots without children are reported as [`Edge::isolated`], so the result equals
    /// the edge set the forest was built from.
    pub fn edges(&self) -> EdgeSet {
        let mut edges = IndexSet::with_capacity(self.len());
        for &root in &self.roots {
            for node in self.iter_preorder(root) {
                match self.nodes[&node] {
                    ParentId::Node(p) => {
                        edges.insert(Edge::new(self.key(p).clone(), self.key(node).clone()));
                    }
                    ParentId::Root(_) if self.nodes.is_leaf(node) => {
                        edges.insert(Edge::isolated(self.key(node).clone()));
                    }
                    ParentId::Root(_) => {}
                }
            }
        }
        EdgeSet::from_forest_edges(edges)
    }

    fn draw_subtree(&self, f: &mut fmt::Formatter<'_>, node: TreeNodeId, prefix: &str) -> fmt::Result {
        let children = self.nodes.children(node);
        for (i, &child) in children.iter().enumerate() {
            let is_last_child = i + 1 == children.len();
            let connector = if is_last_child { "└── " } else { "├── " };
            writeln!(f, "{prefix}{connector}{}", self.key(child))?;

            let child_prefix = format!("{prefix}{}", if is_last_child { "    " } else { "│   " });
            self.draw_subtree(f, child, &child_prefix)?;
        }
        Ok(())
    }
}

impl Display for Forest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &root in &self.roots {
            writeln!(f, "{}", self.key(root))?;
            self.draw_subtree(f, root, "")?;
        }
        Ok(())
    }
}
