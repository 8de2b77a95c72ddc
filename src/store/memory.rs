use indexmap::IndexMap;
use tracing::debug;

use super::{required, HierarchyStore, StorageError};
use crate::{
    config::{DestinationConfig, SourceConfig, WriteMode},
    table::Table,
    value::{Cell, Row},
};

/// Tables kept in memory, addressed as `schema.table`.
///
/// The source filter understands a single `column = value` comparison, the value being
/// an integer or a single-quoted string.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
    tables: IndexMap<String, Table>,
    disposed: bool,
}

fn qualified(schema: &str, table: &str) -> String {
    format!("{schema}.{table}")
}

impl MemoryStore {
    pub fn new() -> Self {
        MemoryStore::default()
    }

    pub fn with_table(mut self, schema: &str, name: &str, table: Table) -> Self {
        self.tables.insert(qualified(schema, name), table);
        self
    }

    pub fn table(&self, schema: &str, name: &str) -> Option<&Table> {
        self.tables.get(&qualified(schema, name))
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    fn check_open(&self) -> Result<(), StorageError> {
        if self.disposed {
            Err(StorageError::Disposed)
        } else {
            Ok(())
        }
    }
}

impl HierarchyStore for MemoryStore {
    fn read_data(&mut self, source: &SourceConfig) -> Result<Vec<Row>, StorageError> {
        self.check_open()?;
        let schema = required(&source.schema, "source.schema")?;
        let name = required(&source.table, "source.table")?;
        let parent = required(&source.parent, "source.parent")?;
        let child = required(&source.child, "source.child")?;

        let qualified_name = qualified(schema, name);
        let table = self
            .tables
            .get(&qualified_name)
            .ok_or_else(|| StorageError::TableNotFound(qualified_name.clone()))?;
        let column = |column: &str| {
            table
                .column_index(column)
                .ok_or_else(|| StorageError::ColumnNotFound {
                    table: qualified_name.clone(),
                    column: column.to_owned(),
                })
        };
        let (p, c) = (column(parent)?, column(child)?);

        let filter = match source.filter.as_deref().map(str::trim) {
            None | Some("") => None,
            Some(clause) => {
                let filter = Filter::parse(clause)
                    .ok_or_else(|| StorageError::UnsupportedFilter(clause.to_owned()))?;
                Some((column(&filter.column)?, filter.value))
            }
        };

        let rows: Vec<Row> = table
            .rows
            .iter()
            .filter(|row| match &filter {
                Some((index, value)) => row.get(*index) == Some(value),
                None => true,
            })
            .map(|row| vec![cell(row, p), cell(row, c)])
            .collect();
        debug!(table = %qualified_name, rows = rows.len(), "read source rows");
        Ok(rows)
    }

    fn write_data(
        &mut self,
        table: &Table,
        destination: &DestinationConfig,
    ) -> Result<(), StorageError> {
        self.check_open()?;
        let schema = required(&destination.schema, "destination.schema")?;
        let name = required(&destination.table, "destination.table")?;
        let qualified_name = qualified(schema, name);

        match (destination.if_exists, self.tables.get_mut(&qualified_name)) {
            (WriteMode::Fail, Some(_)) => {
                return Err(StorageError::TableExists(qualified_name));
            }
            (WriteMode::Append, Some(existing)) => {
                if existing.columns != table.columns {
                    return Err(StorageError::ColumnMismatch {
                        table: qualified_name,
                        existing: existing.columns.clone(),
                        written: table.columns.clone(),
                    });
                }
                existing.rows.extend(table.rows.iter().cloned());
            }
            _ => {
                self.tables.insert(qualified_name.clone(), table.clone());
            }
        }
        debug!(table = %qualified_name, rows = table.len(), "wrote table");
        Ok(())
    }

    fn dispose(&mut self) {
        self.disposed = true;
    }
}

fn cell(row: &[Cell], index: usize) -> Cell {
    row.get(index).cloned().unwrap_or_default()
}

/// A `column = value` comparison.
#[derive(Debug, PartialEq)]
struct Filter {
    column: String,
    value: Cell,
}

impl Filter {
    fn parse(clause: &str) -> Option<Self> {
        let (column, value) = clause.split_once('=')?;
        let column = column.trim();
        if column.is_empty() || column.contains(char::is_whitespace) {
            return None;
        }
        let value = value.trim();
        let value = match value.strip_prefix('\'').and_then(|v| v.strip_suffix('\'')) {
            Some(text) => Cell::Text(text.replace("''", "'")),
            None => Cell::Int(value.parse().ok()?),
        };
        Some(Filter {
            column: column.to_owned(),
            value,
        })
    }
}
