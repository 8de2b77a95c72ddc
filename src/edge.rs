//! Parent-child edges and their validation.
//!
//! An [`EdgeSet`] is the only way into the forest builder, so every invariant the
//! builder relies on is enforced here:
//!
//! *   every record is exactly one `(parent, child)` pair of non-null keys,
//! *   a child has at most one parent,
//! *   following parent links never revisits a key (no cycles).
//!
//! Exact duplicates collapse to their first occurrence. A pair whose two keys are
//! equal is read as an isolated node, see [`Edge::isolated`].

use std::fmt::{self, Display};

use indexmap::{IndexMap, IndexSet};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    table::Table,
    value::{Cell, Key},
};

/// A `(parent, child)` pair. A missing child marks a standalone node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    pub parent: Key,
    pub child: Option<Key>,
}

impl Edge {
    /// An edge from `parent` to `child`. Equal keys give an isolated node.
    pub fn new(parent: impl Into<Key>, child: impl Into<Key>) -> Self {
        let parent = parent.into();
        let child = child.into();
        if parent == child {
            Edge::isolated(parent)
        } else {
            Edge {
                parent,
                child: Some(child),
            }
        }
    }

    /// A node that exists on its own, with no child recorded by this edge.
    pub fn isolated(key: impl Into<Key>) -> Self {
        Edge {
            parent: key.into(),
            child: None,
        }
    }

    pub fn is_isolated(&self) -> bool {
        self.child.is_none()
    }
}

impl Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.child {
            Some(child) => write!(f, "({}, {child})", self.parent),
            None => write!(f, "({})", self.parent),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("record {index} has {len} fields, expected a (parent, child) pair")]
    Arity { index: usize, len: usize },
    #[error("record {index} has a null field: {record:?}")]
    NullField { index: usize, record: Vec<Cell> },
    #[error("child {child} has two parents: {first} and {second}")]
    ConflictingParent { child: Key, first: Key, second: Key },
    #[error("cycle detected: {}", .keys.iter().join(" -> "))]
    Cycle { keys: Vec<Key> },
    #[error("column {0:?} not found")]
    MissingColumn(String),
    #[error("row {row} has a level value after an empty level")]
    InterruptedPath { row: usize },
}

/// A validated, de-duplicated and insertion-ordered set of edges.
///
/// Equality is set equality: two edge sets holding the same edges in a
/// different order compare equal.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct EdgeSet {
    edges: IndexSet<Edge>,
}

impl EdgeSet {
    /// Validates raw records, each of which must hold exactly two non-null cells.
    pub fn validate<I, R>(records: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Cell]>,
    {
        let mut edges = Vec::new();
        for (index, record) in records.into_iter().enumerate() {
            let record = record.as_ref();
            let [parent, child] = record else {
                return Err(ValidationError::Arity {
                    index,
                    len: record.len(),
                });
            };
            let (Some(parent), Some(child)) = (parent.as_key(), child.as_key()) else {
                return Err(ValidationError::NullField {
                    index,
                    record: record.to_vec(),
                });
            };
            edges.push(Edge::new(parent, child));
        }
        Self::from_edges(edges)
    }

    /// Validates a table using two designated columns.
    pub fn from_table(table: &Table, parent: &str, child: &str) -> Result<Self, ValidationError> {
        let column = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| ValidationError::MissingColumn(name.to_owned()))
        };
        let (p, c) = (column(parent)?, column(child)?);
        Self::validate(table.rows.iter().map(|row| {
            [
                row.get(p).cloned().unwrap_or_default(),
                row.get(c).cloned().unwrap_or_default(),
            ]
        }))
    }

    /// Validates already typed edges.
    ///
    /// An isolated edge for a key that also takes part in a linking edge is dropped: the
    /// key exists as a node either way.
    pub fn from_edges(edges: impl IntoIterator<Item = Edge>) -> Result<Self, ValidationError> {
        let edges: IndexSet<Edge> = edges.into_iter().collect();
        let linked: IndexSet<&Key> = edges
            .iter()
            .filter_map(|e| e.child.as_ref().map(|child| [&e.parent, child]))
            .flatten()
            .collect();
        let edges: IndexSet<Edge> = edges
            .iter()
            .filter(|e| !(e.is_isolated() && linked.contains(&e.parent)))
            .cloned()
            .collect();
        check_acyclic(&parent_links(&edges)?)?;
        Ok(EdgeSet { edges })
    }

    /// Wraps edges read back from a built forest, which already satisfy every invariant.
    pub(crate) fn from_forest_edges(edges: IndexSet<Edge>) -> Self {
        EdgeSet { edges }
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn contains(&self, edge: &Edge) -> bool {
        self.edges.contains(edge)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Edge> {
        self.edges.iter()
    }

    /// The edges as `[parent, child]` records; isolated nodes repeat their key.
    pub fn to_records(&self) -> Vec<[Cell; 2]> {
        self.edges
            .iter()
            .map(|e| {
                let child = e.child.as_ref().unwrap_or(&e.parent);
                [Cell::from(&e.parent), Cell::from(child)]
            })
            .collect()
    }
}

impl<'a> IntoIterator for &'a EdgeSet {
    type Item = &'a Edge;
    type IntoIter = indexmap::set::Iter<'a, Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.iter()
    }
}

impl IntoIterator for EdgeSet {
    type Item = Edge;
    type IntoIter = indexmap::set::IntoIter<Edge>;

    fn into_iter(self) -> Self::IntoIter {
        self.edges.into_iter()
    }
}

/// Maps every child to its single parent.
fn parent_links(edges: &IndexSet<Edge>) -> Result<IndexMap<&Key, &Key>, ValidationError> {
    let mut parents: IndexMap<&Key, &Key> = IndexMap::new();
    for edge in edges {
        let Some(child) = &edge.child else {
            continue;
        };
        if let Some(first) = parents.insert(child, &edge.parent) {
            return Err(ValidationError::ConflictingParent {
                child: child.clone(),
                first: first.clone(),
                second: edge.parent.clone(),
            });
        }
    }
    Ok(parents)
}

/// Walks parent links upwards from every child.
///
/// Each walk keeps the keys it visited in order; revisiting one of them closes a
/// cycle. Keys of a finished walk are known to reach a root and stop later walks.
fn check_acyclic(parents: &IndexMap<&Key, &Key>) -> Result<(), ValidationError> {
    let mut settled: IndexSet<&Key> = IndexSet::new();

    for &start in parents.keys() {
        let mut walk: IndexSet<&Key> = IndexSet::new();
        let mut current = start;
        loop {
            if settled.contains(current) {
                break;
            }
            if let Some(pos) = walk.get_index_of(current) {
                return Err(ValidationError::Cycle {
                    keys: walk.iter().skip(pos).map(|&k| k.clone()).collect(),
                });
            }
            walk.insert(current);
            match parents.get(current) {
                Some(&parent) => current = parent,
                None => break,
            }
        }
        settled.extend(walk);
    }
    Ok(())
}
