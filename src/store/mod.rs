//! The storage side of a hierarchy.
//!
//! A [`HierarchyStore`] reads edge-shaped rows from a source table and writes labeled
//! tables to a destination. The core never manages connections: a store owns whatever
//! connection it needs and releases it in [`HierarchyStore::dispose`]. Wrapping a store in
//! a [`StoreSession`] guarantees that `dispose` runs on every exit path.
//!
//! New backends are new implementations of the trait. [`MemoryStore`] keeps its tables
//! in process.

use std::ops::{Deref, DerefMut};

use thiserror::Error;
use tracing::debug;

use crate::{
    config::{DestinationConfig, SourceConfig},
    table::Table,
    value::Row,
};

mod memory;

pub use memory::MemoryStore;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("missing parameter {0}")]
    MissingParameter(&'static str),
    #[error("table {0} not found")]
    TableNotFound(String),
    #[error("table {0} already exists")]
    TableExists(String),
    #[error("column {column} not found in table {table}")]
    ColumnNotFound { table: String, column: String },
    #[error("cannot append to table {table}: columns {written:?} do not match {existing:?}")]
    ColumnMismatch {
        table: String,
        existing: Vec<String>,
        written: Vec<String>,
    },
    #[error("unsupported filter {0:?}")]
    UnsupportedFilter(String),
    #[error("the store has been disposed")]
    Disposed,
}

pub trait HierarchyStore {
    /// Reads the `(parent, child)` rows of the source table, in stored order.
    fn read_data(&mut self, source: &SourceConfig) -> Result<Vec<Row>, StorageError>;

    /// Writes `table` to the destination, honouring its write mode.
    fn write_data(
        &mut self,
        table: &Table,
        destination: &DestinationConfig,
    ) -> Result<(), StorageError>;

    /// Releases any held connection. Later reads and writes may fail.
    fn dispose(&mut self);
}

impl<S: HierarchyStore + ?Sized> HierarchyStore for &mut S {
    fn read_data(&mut self, source: &SourceConfig) -> Result<Vec<Row>, StorageError> {
        (**self).read_data(source)
    }

    fn write_data(
        &mut self,
        table: &Table,
        destination: &DestinationConfig,
    ) -> Result<(), StorageError> {
        (**self).write_data(table, destination)
    }

    fn dispose(&mut self) {
        (**self).dispose()
    }
}

/// Scoped use of a store: `dispose` runs when the session is dropped.
pub struct StoreSession<S: HierarchyStore> {
    store: S,
}

impl<S: HierarchyStore> StoreSession<S> {
    pub fn new(store: S) -> Self {
        StoreSession { store }
    }
}

impl<S: HierarchyStore> Deref for StoreSession<S> {
    type Target = S;
    fn deref(&self) -> &Self::Target {
        &self.store
    }
}

impl<S: HierarchyStore> DerefMut for StoreSession<S> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.store
    }
}

impl<S: HierarchyStore> Drop for StoreSession<S> {
    fn drop(&mut self) {
        debug!("disposing store");
        self.store.dispose();
    }
}

/// A required configuration value, or the parameter it is missing.
pub(crate) fn required<'a>(
    value: &'a Option<String>,
    name: &'static str,
) -> Result<&'a str, StorageError> {
    value
        .as_deref()
        .filter(|v| !v.is_empty())
        .ok_or(StorageError::MissingParameter(name))
}
