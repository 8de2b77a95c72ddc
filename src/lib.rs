//! # Linden
//!
//! Linden turns parent/child edge lists into forests and flattens them into fixed-width
//! level tables: one row per root-to-leaf path, one column per level.
//!
//! Edges are validated into an [`EdgeSet`](edge::EdgeSet) (no node with two parents, no
//! cycles), built into a [`Forest`](tree::Forest) and encoded by the [`codec`]. The
//! [`Hierarchy`](hierarchy::Hierarchy) facade ties these together and moves data in and
//! out of a [`HierarchyStore`](store::HierarchyStore).
//!
//! ```
//! use linden::{codec::RowOptions, hierarchy::Hierarchy, value::Cell};
//!
//! let mut hierarchy = Hierarchy::from_records([
//!     [Cell::from("p1"), Cell::from("c1")],
//!     [Cell::from("p1"), Cell::from("c2")],
//!     [Cell::from("p2"), Cell::from("c3")],
//! ])
//! .unwrap();
//! hierarchy.create_hierarchy().unwrap();
//!
//! let rows = hierarchy.to_lists(&RowOptions::default()).unwrap();
//! assert_eq!(rows[2], [Cell::Int(3), Cell::from("p2"), Cell::from("c3")]);
//! ```

pub mod codec;
pub mod config;
pub mod edge;
pub mod hierarchy;
pub mod store;
pub mod table;
pub mod tree;
pub mod value;

pub use edge::{Edge, EdgeSet, ValidationError};
pub use hierarchy::{Hierarchy, HierarchyError, StateError};
pub use store::{HierarchyStore, MemoryStore, StorageError, StoreSession};
pub use tree::Forest;
pub use value::{Cell, Key, Row};
