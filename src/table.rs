//! A minimal labeled table: named columns and rows of [`Cell`](crate::value::Cell)s.
//!
//! This is the shape exchanged with a [`HierarchyStore`](crate::store::HierarchyStore)
//! and produced by [`to_table`](crate::codec::to_table).

use std::fmt::{self, Display};

use itertools::Itertools;
use serde::{Deserialize, Serialize};

use crate::value::Row;

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl Table {
    pub fn new<S: Into<String>>(columns: impl IntoIterator<Item = S>) -> Self {
        Table {
            columns: columns.into_iter().map(Into::into).collect(),
            rows: Vec::new(),
        }
    }

    pub fn with_rows(mut self, rows: impl IntoIterator<Item = Row>) -> Self {
        self.rows.extend(rows);
        self
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.columns.iter().join(" | "))?;
        for row in &self.rows {
            writeln!(f, "{}", row.iter().join(" | "))?;
        }
        Ok(())
    }
}
