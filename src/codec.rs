//! Encoding a [`Forest`] into rows and tables, and decoding rows back into an [`EdgeSet`].
//!
//! A flattened row holds one level cell per depth, root first, so every row of a forest is
//! `max_depth + 1` cells wide. Paths ending above the deepest level are padded on the right
//! with the caller's `empty_value`. A synthetic primary key numbers the rows `1..=N` in
//! output order; it is regenerated on every call and carries no identity across calls.
//!
//! The `empty_value` must not be a key of the forest, otherwise padding and keys could not
//! be told apart when decoding.

use itertools::Itertools;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{
    edge::{Edge, EdgeSet, ValidationError},
    table::Table,
    tree::{Forest, ParentId},
    value::{Cell, Key, Row},
};

pub const DEFAULT_LEVEL_LABEL: &str = "LVL";
pub const DEFAULT_PRIMKEY_LABEL: &str = "PK";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EncodeError {
    #[error("empty value {0} is also a key of the forest")]
    EmptyValueIsKey(Key),
}

/// Shape of the encoded rows.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layout {
    /// One row per root-to-leaf path, padded to `max_depth + 1` level cells.
    #[default]
    Flattened,
    /// One row per node in breadth-first order: `[key, depth, parent]`.
    Nodes,
}

/// Where the primary key goes in each row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KeyPosition {
    Leading,
    Trailing,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RowOptions {
    pub layout: Layout,
    pub empty_value: Cell,
    pub primkey: Option<KeyPosition>,
}

impl Default for RowOptions {
    fn default() -> Self {
        RowOptions {
            layout: Layout::Flattened,
            empty_value: Cell::Null,
            primkey: Some(KeyPosition::Leading),
        }
    }
}

impl RowOptions {
    pub fn nodes(mut self) -> Self {
        self.layout = Layout::Nodes;
        self
    }

    pub fn empty_value(mut self, empty_value: impl Into<Cell>) -> Self {
        self.empty_value = empty_value.into();
        self
    }

    pub fn primkey(mut self, position: Option<KeyPosition>) -> Self {
        self.primkey = position;
        self
    }

    pub fn without_primkey(self) -> Self {
        self.primkey(None)
    }
}

/// Options of a labeled table. Unset labels fall back to [`DEFAULT_LEVEL_LABEL`] and
/// [`DEFAULT_PRIMKEY_LABEL`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TableOptions {
    pub empty_value: Cell,
    pub level_label: Option<String>,
    pub primkey_label: Option<String>,
    pub primkey: Option<KeyPosition>,
}

impl Default for TableOptions {
    fn default() -> Self {
        TableOptions {
            empty_value: Cell::Null,
            level_label: None,
            primkey_label: None,
            primkey: Some(KeyPosition::Trailing),
        }
    }
}

impl TableOptions {
    pub fn empty_value(mut self, empty_value: impl Into<Cell>) -> Self {
        self.empty_value = empty_value.into();
        self
    }

    pub fn level_label(mut self, label: impl Into<String>) -> Self {
        self.level_label = Some(label.into());
        self
    }

    pub fn primkey_label(mut self, label: impl Into<String>) -> Self {
        self.primkey_label = Some(label.into());
        self
    }

    pub fn primkey(mut self, position: Option<KeyPosition>) -> Self {
        self.primkey = position;
        self
    }

    pub fn without_primkey(self) -> Self {
        self.primkey(None)
    }
}

/// Name of the level column at `depth` (0 for roots): `LVL01`, `LVL02`, ...
pub fn level_column(label: &str, depth: usize) -> String {
    format!("{label}{:02}", depth + 1)
}

/// Encodes the forest as rows, re-walking it on every call.
pub fn to_rows(forest: &Forest, options: &RowOptions) -> Result<Vec<Row>, EncodeError> {
    if let Some(key) = options.empty_value.as_key().filter(|k| forest.contains(k)) {
        return Err(EncodeError::EmptyValueIsKey(key));
    }
    let rows = match options.layout {
        Layout::Flattened => {
            let width = forest.max_depth() + 1;
            forest
                .paths()
                .map(|path| {
                    let mut row: Row = path.iter().map(Cell::from).collect();
                    row.resize(width, options.empty_value.clone());
                    row
                })
                .collect()
        }
        Layout::Nodes => forest
            .iter_breadth_first()
            .map(|id| {
                let parent = match forest[&id] {
                    ParentId::Node(p) => Cell::from(forest.key(p)),
                    ParentId::Root(_) => options.empty_value.clone(),
                };
                vec![
                    Cell::from(forest.key(id)),
                    Cell::count(forest[id].depth()),
                    parent,
                ]
            })
            .collect(),
    };
    Ok(number_rows(rows, options.primkey))
}

fn number_rows(rows: Vec<Row>, position: Option<KeyPosition>) -> Vec<Row> {
    let Some(position) = position else {
        return rows;
    };
    rows.into_iter()
        .enumerate()
        .map(|(i, mut row)| {
            let primkey = Cell::count(i + 1);
            match position {
                KeyPosition::Leading => row.insert(0, primkey),
                KeyPosition::Trailing => row.push(primkey),
            }
            row
        })
        .collect()
}

/// Encodes the flattened forest as a table with labeled level columns.
pub fn to_table(forest: &Forest, options: &TableOptions) -> Result<Table, EncodeError> {
    let level_label = options
        .level_label
        .as_deref()
        .unwrap_or(DEFAULT_LEVEL_LABEL);
    let primkey_label = options
        .primkey_label
        .as_deref()
        .unwrap_or(DEFAULT_PRIMKEY_LABEL);

    let mut columns: Vec<String> = (0..=forest.max_depth())
        .map(|depth| level_column(level_label, depth))
        .collect();
    match options.primkey {
        Some(KeyPosition::Leading) => columns.insert(0, primkey_label.to_owned()),
        Some(KeyPosition::Trailing) => columns.push(primkey_label.to_owned()),
        None => {}
    }

    let rows = to_rows(
        forest,
        &RowOptions {
            layout: Layout::Flattened,
            empty_value: options.empty_value.clone(),
            primkey: options.primkey,
        },
    )?;
    Ok(Table::new(columns).with_rows(rows))
}

/// How to read edges out of stored rows. Columns not named here are ignored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Schema {
    /// Rows are already `(parent, child)` pairs at these column indices.
    Edges { parent: usize, child: usize },
    /// Rows are flattened paths: level cells at these indices, root level first.
    Levels { levels: Vec<usize>, empty_value: Cell },
}

impl Schema {
    /// An edge-shaped table with named parent and child columns.
    pub fn edges_of(table: &Table, parent: &str, child: &str) -> Result<Self, ValidationError> {
        let column = |name: &str| {
            table
                .column_index(name)
                .ok_or_else(|| ValidationError::MissingColumn(name.to_owned()))
        };
        Ok(Schema::Edges {
            parent: column(parent)?,
            child: column(child)?,
        })
    }

    /// A flattened table whose level columns are `level_label` followed by a 1-based
    /// level number, as produced by [`to_table`].
    pub fn for_table(
        table: &Table,
        level_label: &str,
        empty_value: Cell,
    ) -> Result<Self, ValidationError> {
        let levels: Vec<usize> = table
            .columns
            .iter()
            .enumerate()
            .filter_map(|(i, name)| {
                let level: usize = name.strip_prefix(level_label)?.parse().ok()?;
                (level > 0).then_some((level, i))
            })
            .sorted()
            .map(|(_, i)| i)
            .collect();
        if levels.is_empty() {
            return Err(ValidationError::MissingColumn(level_column(level_label, 0)));
        }
        Ok(Schema::Levels {
            levels,
            empty_value,
        })
    }
}

/// Decodes rows into a validated edge set.
///
/// With [`Schema::Levels`] each row contributes the edges between consecutive non-empty
/// level cells; a row holding a single key contributes that key as an isolated node, and
/// a row without any key is skipped. A key after an empty level cell is an
/// [`ValidationError::InterruptedPath`].
pub fn to_edges<I, R>(rows: I, schema: &Schema) -> Result<EdgeSet, ValidationError>
where
    I: IntoIterator<Item = R>,
    R: AsRef<[Cell]>,
{
    match schema {
        Schema::Edges { parent, child } => EdgeSet::validate(rows.into_iter().map(|row| {
            let row = row.as_ref();
            [cell(row, *parent), cell(row, *child)]
        })),
        Schema::Levels {
            levels,
            empty_value,
        } => {
            let mut edges = Vec::new();
            for (index, row) in rows.into_iter().enumerate() {
                let keys = path_keys(row.as_ref(), levels, empty_value)
                    .ok_or(ValidationError::InterruptedPath { row: index })?;
                match keys.as_slice() {
                    [] => {}
                    [only] => edges.push(Edge::isolated(only.clone())),
                    _ => edges.extend(
                        keys.iter()
                            .tuple_windows()
                            .map(|(p, c)| Edge::new(p.clone(), c.clone())),
                    ),
                }
            }
            EdgeSet::from_edges(edges)
        }
    }
}

fn cell(row: &[Cell], index: usize) -> Cell {
    row.get(index).cloned().unwrap_or_default()
}

/// The leading non-empty level cells of a row, or `None` if a key follows an empty cell.
fn path_keys(row: &[Cell], levels: &[usize], empty_value: &Cell) -> Option<Vec<Key>> {
    let mut keys = Vec::with_capacity(levels.len());
    let mut ended = false;
    for &level in levels {
        let value = row.get(level).unwrap_or(&Cell::Null);
        match value.as_key() {
            Some(key) if value != empty_value => {
                if ended {
                    return None;
                }
                keys.push(key);
            }
            _ => ended = true,
        }
    }
    Some(keys)
}

#[cfg(test)]
mod test {
    use proptest::prelude::*;
    use similar_asserts::assert_eq;

    use super::*;

    fn forest(pairs: &[(&str, &str)]) -> Forest {
        let records = pairs
            .iter()
            .map(|&(p, c)| [Cell::from(p), Cell::from(c)]);
        Forest::build(&EdgeSet::validate(records).unwrap()).unwrap()
    }

    fn row(cells: &[Cell]) -> Row {
        cells.to_vec()
    }

    #[test]
    fn scenario_flattened_with_primkey() {
        let f = forest(&[("p1", "c1"), ("p1", "c2"), ("p2", "c3")]);
        let rows = to_rows(&f, &RowOptions::default()).unwrap();
        assert_eq!(
            rows,
            vec![
                row(&[Cell::Int(1), "p1".into(), "c1".into()]),
                row(&[Cell::Int(2), "p1".into(), "c2".into()]),
                row(&[Cell::Int(3), "p2".into(), "c3".into()]),
            ]
        );
        assert_eq!(rows, to_rows(&f, &RowOptions::default()).unwrap());
    }

    #[test]
    fn padding_uses_empty_value() {
        let f = forest(&[("a", "b"), ("b", "c"), ("a", "d"), ("x", "x")]);
        let rows = to_rows(&f, &RowOptions::default().empty_value("").without_primkey()).unwrap();
        assert_eq!(
            rows,
            vec![
                row(&["a".into(), "b".into(), "c".into()]),
                row(&["a".into(), "d".into(), "".into()]),
                row(&["x".into(), "".into(), "".into()]),
            ]
        );
        assert!(rows.iter().all(|r| r.len() == f.max_depth() + 1));
    }

    #[test]
    fn trailing_primkey() {
        let f = forest(&[("a", "b"), ("a", "c")]);
        let rows = to_rows(&f, &RowOptions::default().primkey(Some(KeyPosition::Trailing))).unwrap();
        assert_eq!(rows[1], row(&["a".into(), "c".into(), Cell::Int(2)]));
    }

    #[test]
    fn node_layout() {
        let f = forest(&[("a", "b"), ("b", "c"), ("x", "y")]);
        let rows = to_rows(&f, &RowOptions::default().nodes().without_primkey()).unwrap();
        assert_eq!(
            rows,
            vec![
                row(&["a".into(), Cell::Int(0), Cell::Null]),
                row(&["x".into(), Cell::Int(0), Cell::Null]),
                row(&["b".into(), Cell::Int(1), "a".into()]),
                row(&["y".into(), Cell::Int(1), "x".into()]),
                row(&["c".into(), Cell::Int(2), "b".into()]),
            ]
        );
    }

    #[test]
    fn labeled_table() {
        let f = forest(&[("p1", "c1"), ("c1", "g1"), ("p2", "c3")]);
        let table = to_table(&f, &TableOptions::default().empty_value("-")).unwrap();
        insta::assert_snapshot!(table.to_string(), @r"
        LVL01 | LVL02 | LVL03 | PK
        p1 | c1 | g1 | 1
        p2 | c3 | - | 2
        ");

        let table = to_table(
            &f,
            &TableOptions::default()
                .level_label("LEVEL_")
                .primkey_label("ID")
                .primkey(Some(KeyPosition::Leading)),
        )
        .unwrap();
        assert_eq!(table.columns, ["ID", "LEVEL_01", "LEVEL_02", "LEVEL_03"]);
    }

    #[test]
    fn decode_labeled_table() {
        let f = forest(&[("p1", "c1"), ("c1", "g1"), ("p1", "c2"), ("solo", "solo")]);
        let table = to_table(&f, &TableOptions::default()).unwrap();
        let schema = Schema::for_table(&table, DEFAULT_LEVEL_LABEL, Cell::Null).unwrap();
        assert_eq!(
            schema,
            Schema::Levels {
                levels: vec![0, 1, 2],
                empty_value: Cell::Null
            }
        );
        let edges = to_edges(&table.rows, &schema).unwrap();
        assert_eq!(edges, f.edges());
        assert!(edges.contains(&Edge::isolated("solo")));
    }

    #[test]
    fn decode_missing_levels() {
        let table = Table::new(["A", "B"]);
        assert_eq!(
            Schema::for_table(&table, "LVL", Cell::Null).unwrap_err(),
            ValidationError::MissingColumn("LVL01".into())
        );
    }

    #[test]
    fn decode_interrupted_path() {
        let schema = Schema::Levels {
            levels: vec![0, 1, 2],
            empty_value: Cell::Null,
        };
        let rows = vec![
            row(&["a".into(), "b".into(), Cell::Null]),
            row(&["a".into(), Cell::Null, "c".into()]),
        ];
        assert_eq!(
            to_edges(&rows, &schema).unwrap_err(),
            ValidationError::InterruptedPath { row: 1 }
        );
    }

    #[test]
    fn decode_edge_shaped_rows() {
        let table = Table::new(["PK", "PARENT", "CHILD"]).with_rows([
            row(&[Cell::Int(1), "a".into(), "b".into()]),
            row(&[Cell::Int(2), "b".into(), "c".into()]),
        ]);
        let schema = Schema::edges_of(&table, "PARENT", "CHILD").unwrap();
        let edges = to_edges(&table.rows, &schema).unwrap();
        assert_eq!(
            edges,
            EdgeSet::from_edges([Edge::new("a", "b"), Edge::new("b", "c")]).unwrap()
        );
    }

    #[test]
    fn self_pair_on_linked_key_round_trips() {
        let source = EdgeSet::validate([
            [Cell::from("a"), Cell::from("b")],
            [Cell::from("a"), Cell::from("a")],
        ])
        .unwrap();
        let f = Forest::build(&source).unwrap();
        let rows = to_rows(&f, &RowOptions::default().without_primkey()).unwrap();
        let schema = Schema::Levels {
            levels: vec![0, 1],
            empty_value: Cell::Null,
        };
        assert_eq!(to_edges(&rows, &schema).unwrap(), source);
    }

    #[test]
    fn empty_value_must_not_be_a_key() {
        let f = forest(&[("a", ""), ("a", "b"), ("b", "c")]);
        assert_eq!(
            to_rows(&f, &RowOptions::default().empty_value("")).unwrap_err(),
            EncodeError::EmptyValueIsKey("".into())
        );
        assert_eq!(
            to_rows(&f, &RowOptions::default().nodes().empty_value("a")).unwrap_err(),
            EncodeError::EmptyValueIsKey("a".into())
        );
        assert_eq!(
            to_table(&f, &TableOptions::default().empty_value("c")).unwrap_err(),
            EncodeError::EmptyValueIsKey("c".into())
        );
        assert!(to_rows(&f, &RowOptions::default().empty_value("-")).is_ok());
    }

    fn arb_edges() -> impl Strategy<Value = Vec<Edge>> {
        prop::collection::vec((any::<bool>(), any::<prop::sample::Index>()), 1..50).prop_map(
            |nodes| {
                nodes
                    .into_iter()
                    .enumerate()
                    .map(|(i, (attach, parent))| {
                        if attach && i > 0 {
                            Edge::new(Key::Int(parent.index(i) as i64), Key::Int(i as i64))
                        } else {
                            Edge::isolated(Key::Int(i as i64))
                        }
                    })
                    .collect()
            },
        )
    }

    proptest! {
        #[test]
        fn flatten_round_trip(edges in arb_edges(), pk in any::<bool>()) {
            let source = EdgeSet::from_edges(edges).unwrap();
            let f = Forest::build(&source).unwrap();

            let options = RowOptions::default()
                .empty_value(Cell::Int(-1))
                .primkey(pk.then_some(KeyPosition::Trailing));
            let rows = to_rows(&f, &options).unwrap();
            let width = f.max_depth() + 1;
            prop_assert!(rows.iter().all(|r| r.len() == width + usize::from(pk)));

            let schema = Schema::Levels { levels: (0..width).collect(), empty_value: Cell::Int(-1) };
            let decoded = to_edges(&rows, &schema).unwrap();
            prop_assert_eq!(&decoded, &source);
            prop_assert_eq!(to_rows(&Forest::build(&decoded).unwrap(), &options).unwrap(), rows);
        }

        #[test]
        fn primkeys_are_contiguous(edges in arb_edges()) {
            let f = Forest::build(&EdgeSet::from_edges(edges).unwrap()).unwrap();
            let rows = to_rows(&f, &RowOptions::default()).unwrap();
            let keys: Vec<Cell> = rows.iter().map(|r| r[0].clone()).collect();
            let expected: Vec<Cell> = (1..=rows.len()).map(Cell::count).collect();
            prop_assert_eq!(keys, expected);
        }
    }
}
