use std::fmt::{self, Display};

use itertools::Itertools;

use super::{iterato::PathIter, ChildVecStore, Forest};
use crate::value::Key;

/// The keys from a root down to a leaf.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Path<'a> {
    keys: Vec<&'a Key>,
}

impl<'a> Path<'a> {
    pub fn keys(&self) -> &[&'a Key] {
        &self.keys
    }

    /// Number of keys, i.e. the depth of the leaf plus one.
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn root(&self) -> Option<&'a Key> {
        self.keys.first().copied()
    }

    pub fn leaf(&self) -> Option<&'a Key> {
        self.keys.last().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &'a Key> + '_ {
        self.keys.iter().copied()
    }
}

impl Display for Path<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.keys.iter().join(" / "))
    }
}

/// Lazy enumeration of every root-to-leaf [`Path`] of a forest.
///
/// Each call to [`Forest::paths`] starts a fresh walk over the unmodified forest, so two
/// enumerations always agree element for element.
#[derive(Clone)]
pub struct Paths<'a> {
    forest: &'a Forest,
    iter: PathIter<'a, ChildVecStore>,
}

impl<'a> Iterator for Paths<'a> {
    type Item = Path<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let forest = self.forest;
        self.iter.next().map(|ids| Path {
            keys: ids.into_iter().map(|id| forest.key(id)).collect(),
        })
    }
}

impl Forest {
    /// Paths from each root, in root order, to each of its leaves, in pre-order.
    pub fn paths(&self) -> Paths<'_> {
        Paths {
            forest: self,
            iter: PathIter::new(&self.nodes, &self.roots),
        }
    }
}
