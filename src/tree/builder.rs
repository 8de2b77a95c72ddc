//! Construction of a [`Forest`] from edges.

use bitvec::vec::BitVec;
use indexmap::IndexSet;
use tracing::debug;

use super::{
    iterato::BfsIter, ChildVecStore, Forest, ForestError, ForestNodeStore, ParentId, RootId,
    TreeNode, TreeNodeId,
};
use crate::{
    edge::{Edge, EdgeSet},
    value::Key,
};

/// Collects nodes and parent links before depths are known.
///
/// Node ids are handed out in first-appearance order of the keys, and children are
/// kept in the order their edges were added.
#[derive(Clone, Debug, Default)]
pub struct ForestBuilder {
    keys: IndexSet<Key>,
    parents: Vec<Option<TreeNodeId>>,
    children: Vec<Vec<TreeNodeId>>,
}

impl ForestBuilder {
    pub fn new() -> Self {
        ForestBuilder::default()
    }

    pub fn build(self) -> Result<Forest, ForestError> {
        self.try_into()
    }

    /// Returns the id of `key`, adding it as a node if it is new.
    pub fn add_node(&mut self, key: Key) -> TreeNodeId {
        let (index, added) = self.keys.insert_full(key);
        if added {
            self.parents.push(None);
            self.children.push(Vec::new());
        }
        TreeNodeId(index)
    }

    /// Adds both endpoints of `edge` and links the child as the last child of the parent.
    pub fn add_edge(&mut self, edge: &Edge) -> Result<(), ForestError> {
        let parent = self.add_node(edge.parent.clone());
        let Some(child_key) = &edge.child else {
            return Ok(());
        };
        let child = self.add_node(child_key.clone());

        match self.parents[child.0] {
            None => {
                self.parents[child.0] = Some(parent);
                self.children[parent.0].push(child);
                Ok(())
            }
            Some(existing) if existing == parent => Ok(()),
            Some(existing) => Err(ForestError::ConflictingParent {
                child: child_key.clone(),
                existing: self.keys[existing.0].clone(),
                parent: edge.parent.clone(),
            }),
        }
    }
}

impl TryFrom<ForestBuilder> for Forest {
    type Error = ForestError;

    /// Roots are the nodes without a parent, in id order. Depths come from one BFS seeded
    /// with all roots, which must reach every node exactly once.
    fn try_from(builder: ForestBuilder) -> Result<Self, Self::Error> {
        let ForestBuilder {
            keys,
            parents,
            children,
        } = builder;

        let mut roots = Vec::new();
        let mut nodes: ChildVecStore = parents
            .into_iter()
            .zip(children)
            .enumerate()
            .map(|(i, (parent, children))| {
                let parent = match parent {
                    Some(p) => ParentId::Node(p),
                    None => {
                        roots.push(TreeNodeId(i));
                        ParentId::Root(RootId(roots.len() - 1))
                    }
                };
                TreeNode {
                    parent,
                    depth: 0,
                    children,
                }
            })
            .collect();

        let order: Vec<TreeNodeId> = BfsIter::from_roots(&nodes, roots.iter().copied()).collect();

        let mut seen: BitVec = BitVec::repeat(false, nodes.n_nodes());
        let mut max_depth = 0;
        for node in order {
            if seen.replace(node.0, true) {
                return Err(ForestError::Revisited(keys[node.0].clone()));
            }
            if let ParentId::Node(p) = nodes[&node] {
                let depth = nodes.nodes[p.0].depth + 1;
                nodes.nodes[node.0].depth = depth;
                max_depth = max_depth.max(depth);
            }
        }
        if let Some(missing) = seen.first_zero() {
            return Err(ForestError::Unreachable(keys[missing].clone()));
        }

        Ok(Forest {
            nodes,
            keys,
            roots,
            max_depth,
        })
    }
}

impl Forest {
    /// Builds the forest of a validated edge set.
    pub fn build(edges: &EdgeSet) -> Result<Self, ForestError> {
        let mut builder = ForestBuilder::new();
        for edge in edges {
            builder.add_edge(edge)?;
        }
        let forest = builder.build()?;
        debug!(
            nodes = forest.len(),
            roots = forest.n_roots(),
            max_depth = forest.max_depth(),
            "built forest"
        );
        Ok(forest)
    }
}
