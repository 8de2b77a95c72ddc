//! The [`Hierarchy`] facade: a source edge set, the forest built from it, and the
//! conversions between the two and a store.

use std::collections::HashSet;

use thiserror::Error;
use tracing::{error, info, warn};

use crate::{
    codec::{
        self, EncodeError, RowOptions, Schema, TableOptions, DEFAULT_LEVEL_LABEL,
        DEFAULT_PRIMKEY_LABEL,
    },
    config::{DestinationConfig, SourceConfig},
    edge::{EdgeSet, ValidationError},
    store::{HierarchyStore, StorageError},
    table::Table,
    tree::{Forest, ForestError},
    value::{Cell, Row},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("the hierarchy has not been built")]
    NotBuilt,
    #[error("the hierarchy has no source edges")]
    NoSource,
}

#[derive(Debug, PartialEq, Error)]
pub enum HierarchyError {
    #[error(transparent)]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    State(#[from] StateError),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Forest(#[from] ForestError),
    #[error(transparent)]
    Encode(#[from] EncodeError),
}

#[derive(Clone, Debug)]
pub struct Hierarchy {
    source: Option<EdgeSet>,
    forest: Option<Forest>,
    level_label: String,
    primkey_label: String,
}

impl Default for Hierarchy {
    fn default() -> Self {
        Hierarchy {
            source: None,
            forest: None,
            level_label: DEFAULT_LEVEL_LABEL.to_owned(),
            primkey_label: DEFAULT_PRIMKEY_LABEL.to_owned(),
        }
    }
}

impl Hierarchy {
    pub fn new(source: EdgeSet) -> Self {
        Hierarchy {
            source: Some(source),
            ..Default::default()
        }
    }

    /// A hierarchy without source edges, to be filled by [`Self::read_source_from_db`].
    pub fn empty() -> Self {
        Hierarchy::default()
    }

    pub fn from_records<I, R>(records: I) -> Result<Self, ValidationError>
    where
        I: IntoIterator<Item = R>,
        R: AsRef<[Cell]>,
    {
        Ok(Self::new(EdgeSet::validate(records)?))
    }

    pub fn from_table(table: &Table, parent: &str, child: &str) -> Result<Self, ValidationError> {
        Ok(Self::new(EdgeSet::from_table(table, parent, child)?))
    }

    /// Sets the default level prefix and primary key column name of written tables.
    pub fn with_labels(mut self, level: impl Into<String>, primkey: impl Into<String>) -> Self {
        self.level_label = level.into();
        self.primkey_label = primkey.into();
        self
    }

    pub fn level_label(&self) -> &str {
        &self.level_label
    }

    pub fn primkey_label(&self) -> &str {
        &self.primkey_label
    }

    pub fn source(&self) -> Option<&EdgeSet> {
        self.source.as_ref()
    }

    /// Replaces the source edges. An already built forest is kept until the next
    /// [`Self::create_hierarchy`].
    pub fn set_source(&mut self, source: EdgeSet) {
        self.source = Some(source);
    }

    /// Builds the forest from the source, replacing any previous one only on success.
    pub fn create_hierarchy(&mut self) -> Result<&Forest, HierarchyError> {
        let source = self.source.as_ref().ok_or(StateError::NoSource)?;
        let forest = Forest::build(source).inspect_err(|err| {
            error!(%err, "failed to build hierarchy");
        })?;
        info!(
            roots = forest.n_roots(),
            nodes = forest.len(),
            max_depth = forest.max_depth(),
            "created hierarchy"
        );
        Ok(self.forest.insert(forest))
    }

    pub fn delete_hierarchy(&mut self) {
        if self.forest.take().is_some() {
            info!("deleted hierarchy");
        }
    }

    pub fn is_built(&self) -> bool {
        self.forest.is_some()
    }

    pub fn forest(&self) -> Result<&Forest, StateError> {
        self.forest.as_ref().ok_or(StateError::NotBuilt)
    }

    /// The encoded rows as an unordered set.
    pub fn to_tuples(&self, options: &RowOptions) -> Result<HashSet<Row>, HierarchyError> {
        Ok(self.to_lists(options)?.into_iter().collect())
    }

    /// The encoded rows in enumeration order.
    pub fn to_lists(&self, options: &RowOptions) -> Result<Vec<Row>, HierarchyError> {
        Ok(codec::to_rows(self.forest()?, options)?)
    }

    /// The flattened forest as a labeled table. Unset labels use this hierarchy's.
    pub fn to_table(&self, options: &TableOptions) -> Result<Table, HierarchyError> {
        let options = TableOptions {
            level_label: Some(label(options.level_label.as_deref(), None, &self.level_label)),
            primkey_label: Some(label(
                options.primkey_label.as_deref(),
                None,
                &self.primkey_label,
            )),
            ..options.clone()
        };
        Ok(codec::to_table(self.forest()?, &options)?)
    }

    /// Replaces the source with the edges read through `store`.
    ///
    /// The forest is left as it was; call [`Self::create_hierarchy`] to rebuild it.
    pub fn read_source_from_db<S: HierarchyStore + ?Sized>(
        &mut self,
        store: &mut S,
        source: &SourceConfig,
    ) -> Result<&EdgeSet, HierarchyError> {
        let rows = store.read_data(source).inspect_err(|err| {
            warn!(%err, schema = ?source.schema, table = ?source.table, "failed to read source");
        })?;
        let edges = codec::to_edges(
            &rows,
            &Schema::Edges {
                parent: 0,
                child: 1,
            },
        )?;
        info!(
            schema = ?source.schema,
            table = ?source.table,
            edges = edges.len(),
            "read hierarchy source"
        );
        Ok(self.source.insert(edges))
    }

    /// Writes the flattened forest through `store`.
    ///
    /// Labels come from `options`, then from `destination`, then from this hierarchy.
    pub fn to_database<S: HierarchyStore + ?Sized>(
        &self,
        store: &mut S,
        destination: &DestinationConfig,
        options: &TableOptions,
    ) -> Result<Table, HierarchyError> {
        let forest = self.forest()?;
        let options = TableOptions {
            level_label: Some(label(
                options.level_label.as_deref(),
                destination.level.as_deref(),
                &self.level_label,
            )),
            primkey_label: Some(label(
                options.primkey_label.as_deref(),
                destination.primkey.as_deref(),
                &self.primkey_label,
            )),
            ..options.clone()
        };
        let table = codec::to_table(forest, &options)?;
        store.write_data(&table, destination).inspect_err(|err| {
            warn!(%err, schema = ?destination.schema, table = ?destination.table, "failed to write hierarchy");
        })?;
        info!(
            schema = ?destination.schema,
            table = ?destination.table,
            rows = table.len(),
            "wrote hierarchy"
        );
        Ok(table)
    }
}

fn label(first: Option<&str>, second: Option<&str>, default: &str) -> String {
    first.or(second).unwrap_or(default).to_owned()
}

#[cfg(test)]
mod test {
    use similar_asserts::assert_eq;

    use super::*;
    use crate::{
        codec::KeyPosition,
        config::WriteMode,
        edge::Edge,
        store::{MemoryStore, StoreSession},
        value::Key,
    };

    fn records(pairs: &[(&str, &str)]) -> Vec<[Cell; 2]> {
        pairs
            .iter()
            .map(|&(p, c)| [Cell::from(p), Cell::from(c)])
            .collect()
    }

    fn scenario() -> Hierarchy {
        Hierarchy::from_records(records(&[("p1", "c1"), ("p1", "c2"), ("p2", "c3")])).unwrap()
    }

    #[test]
    fn scenario_lists() {
        let mut h = scenario();
        let forest = h.create_hierarchy().unwrap();
        assert_eq!(forest.max_depth(), 1);
        let roots: Vec<_> = forest.roots().cloned().collect();
        assert_eq!(roots, [Key::from("p1"), Key::from("p2")]);

        let rows = h.to_lists(&RowOptions::default()).unwrap();
        assert_eq!(
            rows,
            vec![
                vec![Cell::Int(1), "p1".into(), "c1".into()],
                vec![Cell::Int(2), "p1".into(), "c2".into()],
                vec![Cell::Int(3), "p2".into(), "c3".into()],
            ]
        );
        assert_eq!(h.to_lists(&RowOptions::default()).unwrap(), rows);

        let tuples = h.to_tuples(&RowOptions::default()).unwrap();
        assert_eq!(tuples, rows.into_iter().collect::<HashSet<_>>());
    }

    #[test]
    fn delete_then_convert_fails() {
        let mut h = scenario();
        assert_eq!(
            h.to_lists(&RowOptions::default()).unwrap_err(),
            HierarchyError::State(StateError::NotBuilt)
        );

        h.create_hierarchy().unwrap();
        h.delete_hierarchy();
        assert!(!h.is_built());
        assert!(h.source().is_some());
        assert_eq!(
            h.to_lists(&RowOptions::default()).unwrap_err(),
            HierarchyError::State(StateError::NotBuilt)
        );
        assert_eq!(
            h.to_table(&TableOptions::default()).unwrap_err(),
            HierarchyError::State(StateError::NotBuilt)
        );

        h.create_hierarchy().unwrap();
        assert_eq!(h.to_lists(&RowOptions::default()).unwrap().len(), 3);
    }

    #[test]
    fn build_without_source() {
        let mut h = Hierarchy::empty();
        let err = h.create_hierarchy().unwrap_err();
        assert!(matches!(err, HierarchyError::State(StateError::NoSource)));

        h.set_source(EdgeSet::from_edges([Edge::new("a", "b")]).unwrap());
        assert_eq!(h.create_hierarchy().unwrap().max_depth(), 1);
    }

    #[test]
    fn invalid_records_rejected() {
        let err = Hierarchy::from_records(records(&[("a", "b"), ("b", "c"), ("c", "a")]))
            .unwrap_err();
        assert!(matches!(err, ValidationError::Cycle { .. }));

        let err = Hierarchy::from_records(records(&[("p1", "c1"), ("p2", "c1")])).unwrap_err();
        assert!(matches!(err, ValidationError::ConflictingParent { .. }));
    }

    #[test]
    fn table_uses_facade_labels() {
        let mut h = scenario().with_labels("L", "ID");
        assert_eq!((h.level_label(), h.primkey_label()), ("L", "ID"));
        h.create_hierarchy().unwrap();
        let table = h.to_table(&TableOptions::default()).unwrap();
        assert_eq!(table.columns, ["L01", "L02", "ID"]);

        let table = h
            .to_table(&TableOptions::default().level_label("X").primkey(Some(KeyPosition::Leading)))
            .unwrap();
        assert_eq!(table.columns, ["ID", "X01", "X02"]);
    }

    fn source_store() -> MemoryStore {
        let edges = Table::new(["PARENT", "CHILD", "ACTIVE"]).with_rows([
            vec!["org".into(), "sales".into(), Cell::Int(1)],
            vec!["org".into(), "ops".into(), Cell::Int(1)],
            vec!["sales".into(), "emea".into(), Cell::Int(1)],
            vec!["sales".into(), "apac".into(), Cell::Int(0)],
        ]);
        MemoryStore::new().with_table("STAGE", "EDGES", edges)
    }

    #[test]
    fn store_round_trip() {
        let mut store = source_store();
        let source = SourceConfig::new("STAGE", "EDGES", "PARENT", "CHILD").with_filter("ACTIVE = 1");
        let destination = DestinationConfig::new("DWH", "FLAT").with_labels("LEVEL", "KEY");

        let mut h = Hierarchy::empty();
        {
            let mut session = StoreSession::new(&mut store);
            h.read_source_from_db(&mut *session, &source).unwrap();
            h.create_hierarchy().unwrap();
            h.to_database(&mut *session, &destination, &TableOptions::default())
                .unwrap();
        }
        assert!(store.is_disposed());

        let written = store.table("DWH", "FLAT").unwrap();
        assert_eq!(written.columns, ["LEVEL01", "LEVEL02", "LEVEL03", "KEY"]);
        assert_eq!(written.len(), 2);

        let schema = Schema::for_table(written, "LEVEL", Cell::Null).unwrap();
        let decoded = codec::to_edges(&written.rows, &schema).unwrap();
        assert_eq!(&decoded, h.source().unwrap());
    }

    #[test]
    fn failed_read_keeps_source_and_forest() {
        let mut store = source_store();
        let mut h = scenario();
        h.create_hierarchy().unwrap();

        let missing = SourceConfig::new("STAGE", "NOPE", "PARENT", "CHILD");
        let err = h.read_source_from_db(&mut store, &missing).unwrap_err();
        assert!(matches!(
            err,
            HierarchyError::Storage(StorageError::TableNotFound(_))
        ));
        assert_eq!(h.source().unwrap().len(), 3);
        assert!(h.is_built());
    }

    #[test]
    fn invalid_read_keeps_forest() {
        let mut h = scenario();
        h.create_hierarchy().unwrap();
        let before = h.to_lists(&RowOptions::default()).unwrap();

        let store_rows = Table::new(["P", "C"]).with_rows([
            vec!["a".into(), "b".into()],
            vec!["b".into(), Cell::Null],
        ]);
        let mut store = MemoryStore::new().with_table("S", "T", store_rows);
        let err = h
            .read_source_from_db(&mut store, &SourceConfig::new("S", "T", "P", "C"))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Validation(_)));
        assert_eq!(h.to_lists(&RowOptions::default()).unwrap(), before);
    }

    #[test]
    fn ambiguous_empty_value_is_rejected() {
        let mut h = scenario();
        h.create_hierarchy().unwrap();
        let err = h
            .to_lists(&RowOptions::default().empty_value("c2"))
            .unwrap_err();
        assert_eq!(err, HierarchyError::Encode(EncodeError::EmptyValueIsKey("c2".into())));

        let mut store = MemoryStore::new();
        let destination = DestinationConfig::new("DWH", "FLAT");
        let err = h
            .to_database(&mut store, &destination, &TableOptions::default().empty_value("p1"))
            .unwrap_err();
        assert!(matches!(err, HierarchyError::Encode(_)));
        assert!(store.table("DWH", "FLAT").is_none());
    }

    #[test]
    fn write_mode_is_honoured() {
        let mut h = scenario();
        h.create_hierarchy().unwrap();
        let mut store = MemoryStore::new();
        let destination = DestinationConfig::new("DWH", "FLAT");

        h.to_database(&mut store, &destination, &TableOptions::default())
            .unwrap();
        let err = h
            .to_database(&mut store, &destination, &TableOptions::default())
            .unwrap_err();
        assert!(matches!(
            err,
            HierarchyError::Storage(StorageError::TableExists(_))
        ));

        h.to_database(
            &mut store,
            &destination.with_mode(WriteMode::Append),
            &TableOptions::default(),
        )
        .unwrap();
        assert_eq!(store.table("DWH", "FLAT").unwrap().len(), 6);
    }
}
