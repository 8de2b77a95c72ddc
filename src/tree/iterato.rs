//! Traversal iterators over any [`ForestNodeStore`].

use super::{ForestNodeStore, ParentId, TreeNodeId};
use std::collections::VecDeque;

// --- Ancestors Iterator ---

/// An iterator that traverses upwards from a starting node to its root.
#[derive(Clone)]
pub struct AncestorsIter<'a, S: ForestNodeStore> {
    store: &'a S,
    /// The next node ID to yield. `None` when the root has been yielded.
    current: Option<TreeNodeId>,
}

impl<'a, S: ForestNodeStore> AncestorsIter<'a, S> {
    pub fn new(store: &'a S, start_node: TreeNodeId) -> Self {
        AncestorsIter {
            store,
            current: Some(start_node),
        }
    }
}

impl<S: ForestNodeStore> Iterator for AncestorsIter<'_, S> {
    type Item = TreeNodeId;

    fn next(&mut self) -> Option<Self::Item> {
        let node_to_return = self.current?;
        match self.store[&node_to_return] {
            ParentId::Root(_) => self.current = None,
            ParentId::Node(parent_id) => self.current = Some(parent_id),
        }
        Some(node_to_return)
    }
}

// --- BFS Iterator ---

/// A Breadth-First Search (BFS) iterator state.
#[derive(Clone)]
pub struct BfsIter<'a, S: ForestNodeStore> {
    store: &'a S,
    queue: VecDeque<TreeNodeId>,
}

impl<'a, S: ForestNodeStore> BfsIter<'a, S> {
    /// Create a new BFS iterator starting at `start`.
    pub fn new(store: &'a S, start: TreeNodeId) -> Self {
        Self::from_roots(store, [start])
    }

    /// A BFS seeded with several starting nodes at once: all of them come first,
    /// then all of their children, and so on.
    pub fn from_roots(store: &'a S, roots: impl IntoIterator<Item = TreeNodeId>) -> Self {
        BfsIter {
            store,
            queue: roots.into_iter().collect(),
        }
    }
}

impl<S: ForestNodeStore> Iterator for BfsIter<'_, S> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.queue.pop_front()?;
        self.queue.extend(self.store.iter_children(node));
        Some(node)
    }
}

// --- Preorder Iterator ---

/// A pre-order DFS iterator state.
pub struct PreorderIter<'a, S: ForestNodeStore> {
    store: &'a S,
    /// Stack for DFS traversal. Stores nodes to visit.
    stack: Vec<TreeNodeId>,
}

impl<S: ForestNodeStore> Clone for PreorderIter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            stack: self.stack.clone(),
        }
    }
}

impl<'a, S: ForestNodeStore> PreorderIter<'a, S> {
    pub fn new(store: &'a S, start: TreeNodeId) -> Self {
        PreorderIter {
            store,
            stack: vec![start],
        }
    }
}

impl<S: ForestNodeStore> Iterator for PreorderIter<'_, S> {
    type Item = TreeNodeId;
    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;

        // Push children in reverse so the first child is processed next
        self.stack
            .extend(self.store.children(node).iter().rev().copied());

        Some(node)
    }
}

// --- Root-to-leaf paths ---

/// Pre-order walk over several trees that yields the path from the root to every leaf.
///
/// Roots are walked in the order given, children in their stored order. The stack
/// holds each pending node with the length the current path must be cut back to
/// before the node is appended.
pub struct PathIter<'a, S: ForestNodeStore> {
    store: &'a S,
    roots: std::slice::Iter<'a, TreeNodeId>,
    stack: Vec<(TreeNodeId, usize)>,
    current: Vec<TreeNodeId>,
}

impl<S: ForestNodeStore> Clone for PathIter<'_, S> {
    fn clone(&self) -> Self {
        Self {
            store: self.store,
            roots: self.roots.clone(),
            stack: self.stack.clone(),
            current: self.current.clone(),
        }
    }
}

impl<'a, S: ForestNodeStore> PathIter<'a, S> {
    pub fn new(store: &'a S, roots: &'a [TreeNodeId]) -> Self {
        PathIter {
            store,
            roots: roots.iter(),
            stack: Vec::new(),
            current: Vec::new(),
        }
    }
}

impl<S: ForestNodeStore> Iterator for PathIter<'_, S> {
    type Item = Vec<TreeNodeId>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let Some((node, len)) = self.stack.pop() else {
                let &root = self.roots.next()?;
                self.stack.push((root, 0));
                continue;
            };

            self.current.truncate(len);
            self.current.push(node);

            let children = self.store.children(node);
            if children.is_empty() {
                return Some(self.current.clone());
            }
            let len = self.current.len();
            self.stack
                .extend(children.iter().rev().map(|&child| (child, len)));
        }
    }
}
