//! Scalar values flowing through the crate.
//!
//! *   [`Key`]: a non-null identifier of a node, either an integer or text.
//! *   [`Cell`]: one cell of a row, which may additionally be null.
//!
//! Both are serialized untagged, so `["p1", 3, null]` reads as
//! `[Text("p1"), Int(3), Null]`.

use std::fmt::{self, Display};

use derive_more::From;
use serde::{Deserialize, Serialize};

/// Identifier of a node. Unique across a forest.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, From)]
#[serde(untagged)]
pub enum Key {
    Int(i64),
    Text(String),
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Text(s.to_owned())
    }
}

impl Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Key::Int(i) => write!(f, "{i}"),
            Key::Text(s) => write!(f, "{s}"),
        }
    }
}

/// A single cell of a [`Row`].
#[derive(
    Clone, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, From,
)]
#[serde(untagged)]
pub enum Cell {
    #[default]
    Null,
    Int(i64),
    Text(String),
}

/// A fixed-width sequence of cells.
pub type Row = Vec<Cell>;

impl Cell {
    pub fn is_null(&self) -> bool {
        matches!(self, Cell::Null)
    }

    /// The key this cell holds, or `None` for a null cell.
    pub fn as_key(&self) -> Option<Key> {
        match self {
            Cell::Null => None,
            Cell::Int(i) => Some(Key::Int(*i)),
            Cell::Text(s) => Some(Key::Text(s.clone())),
        }
    }

    /// A cell holding a count or an index.
    pub(crate) fn count(n: usize) -> Self {
        Cell::Int(n as i64)
    }
}

impl From<&str> for Cell {
    fn from(s: &str) -> Self {
        Cell::Text(s.to_owned())
    }
}

impl From<Key> for Cell {
    fn from(key: Key) -> Self {
        match key {
            Key::Int(i) => Cell::Int(i),
            Key::Text(s) => Cell::Text(s),
        }
    }
}

impl From<&Key> for Cell {
    fn from(key: &Key) -> Self {
        key.clone().into()
    }
}

impl Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Cell::Null => write!(f, "null"),
            Cell::Int(i) => write!(f, "{i}"),
            Cell::Text(s) => write!(f, "{s}"),
        }
    }
}
