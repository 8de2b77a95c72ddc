//! Typed configuration of the storage side: where the source edges are read from and
//! where the flattened table is written to.
//!
//! ```toml
//! [database]
//! user = "hier"
//! password = "secret"
//! dsn = "db.example.com:1521/ORCL"
//!
//! [source]
//! schema = "STAGE"
//! table = "ORG_EDGES"
//! parent = "PARENT_ID"
//! child = "CHILD_ID"
//! where = "ACTIVE = 1"
//!
//! [destination]
//! schema = "DWH"
//! table = "ORG_FLAT"
//! level = "LVL"
//! primkey = "PK"
//! if_exists = "replace"
//! ```
//!
//! Every section is optional and every key has a default; unknown keys are rejected.

use std::{fmt, fs, path::Path, path::PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config")]
    Parse(#[from] toml::de::Error),
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub database: DatabaseConfig,
    pub source: SourceConfig,
    pub destination: DestinationConfig,
}

impl Config {
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_owned(),
            source,
        })?;
        Self::from_toml_str(&contents)
    }
}

/// Connection parameters. The crate never reads them; they are passed through untouched
/// to whichever [`HierarchyStore`](crate::store::HierarchyStore) implementation opens the
/// connection.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DatabaseConfig {
    pub user: Option<String>,
    pub password: Option<String>,
    pub dsn: Option<String>,
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("user", &self.user)
            .field("password", &self.password.as_ref().map(|_| "***"))
            .field("dsn", &self.dsn)
            .finish()
    }
}

/// The edge-shaped table the source pairs are read from.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SourceConfig {
    pub schema: Option<String>,
    pub table: Option<String>,
    pub parent: Option<String>,
    pub child: Option<String>,
    #[serde(rename = "where")]
    pub filter: Option<String>,
}

impl SourceConfig {
    pub fn new(
        schema: impl Into<String>,
        table: impl Into<String>,
        parent: impl Into<String>,
        child: impl Into<String>,
    ) -> Self {
        SourceConfig {
            schema: Some(schema.into()),
            table: Some(table.into()),
            parent: Some(parent.into()),
            child: Some(child.into()),
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// What to do when the destination table already exists.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WriteMode {
    #[default]
    Fail,
    Replace,
    Append,
}

/// The table the flattened hierarchy is written to.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DestinationConfig {
    pub schema: Option<String>,
    pub table: Option<String>,
    /// Prefix of the level column names.
    pub level: Option<String>,
    /// Name of the primary key column.
    pub primkey: Option<String>,
    pub if_exists: WriteMode,
}

impl DestinationConfig {
    pub fn new(schema: impl Into<String>, table: impl Into<String>) -> Self {
        DestinationConfig {
            schema: Some(schema.into()),
            table: Some(table.into()),
            ..Default::default()
        }
    }

    pub fn with_mode(mut self, if_exists: WriteMode) -> Self {
        self.if_exists = if_exists;
        self
    }

    pub fn with_labels(mut self, level: impl Into<String>, primkey: impl Into<String>) -> Self {
        self.level = Some(level.into());
        self.primkey = Some(primkey.into());
        self
    }
}
