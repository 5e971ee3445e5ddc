//! Database Connection Abstraction
//!
//! The helpers never talk to a driver directly. Callers hand them a
//! [`Connection`] that runs SQL and reports which server it belongs to.
//!
//! Three result shapes are supported, mirroring how catalog queries are
//! consumed:
//! - [`Grid`]: column names plus positional rows (`execute_2darray`)
//! - [`ResultSet`]: rows keyed by column name (`execute_dict`)
//! - a single [`Value`] (`execute_scalar`)

use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// A row keyed by column name
pub type Row = Map<String, Value>;

/// Server identifier assigned by the application
pub type ServerId = i64;

/// Flavour of the server; selects the template subtree
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ServerType {
    /// Community PostgreSQL
    #[default]
    Pg,
    /// EDB Postgres Advanced Server
    Ppas,
}

impl ServerType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServerType::Pg => "pg",
            ServerType::Ppas => "ppas",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "pg" | "postgres" | "postgresql" => Some(ServerType::Pg),
            "ppas" | "epas" => Some(ServerType::Ppas),
            _ => None,
        }
    }
}

impl fmt::Display for ServerType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Per-server connection context
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerManager {
    /// Server id
    pub sid: ServerId,
    /// `server_version_num`, e.g. 140005
    pub version: u32,
    pub server_type: ServerType,
}

impl ServerManager {
    pub fn new(sid: ServerId, version: u32, server_type: ServerType) -> Self {
        ServerManager {
            sid,
            version,
            server_type,
        }
    }

    /// Versioned template directory segment, e.g. `pg/#140005#`
    pub fn template_segment(&self) -> String {
        format!("{}/#{}#", self.server_type, self.version)
    }
}

/// Positional result of `execute_2darray`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Grid {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<Value>>,
}

impl Grid {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Value>>) -> Self {
        Grid { columns, rows }
    }

    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// Cell lookup by row number and column name
    pub fn get(&self, row: usize, column: &str) -> Option<&Value> {
        let idx = self.column_index(column)?;
        self.rows.get(row)?.get(idx)
    }

    /// Re-key every row by column name
    pub fn to_rows(&self) -> Vec<Row> {
        self.rows
            .iter()
            .map(|values| {
                self.columns
                    .iter()
                    .cloned()
                    .zip(values.iter().cloned())
                    .collect()
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Keyed result of `execute_dict`
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultSet {
    pub columns: Vec<String>,
    pub rows: Vec<Row>,
}

impl ResultSet {
    pub fn new(columns: Vec<String>, rows: Vec<Row>) -> Self {
        ResultSet { columns, rows }
    }

    /// First row, or `NotFound` naming what was looked up
    pub fn first(&self, what: &str) -> SchemaResult<&Row> {
        self.rows
            .first()
            .ok_or_else(|| SchemaError::NotFound(format!("Could not find the {what}.")))
    }
}

/// A live connection to one database on one server
pub trait Connection: Send + Sync {
    /// Context of the server this connection belongs to
    fn manager(&self) -> &ServerManager;

    /// Run a query and return positional rows
    fn execute_2darray(&self, sql: &str) -> SchemaResult<Grid>;

    /// Run a query and return rows keyed by column name
    fn execute_dict(&self, sql: &str) -> SchemaResult<ResultSet>;

    /// Run a query and return the first column of the first row
    /// (`Value::Null` when there is no row)
    fn execute_scalar(&self, sql: &str) -> SchemaResult<Value>;
}

/// Read an integer cell that may arrive as a JSON number or a string
pub fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Truthiness of a cell; null, false, zero and empty values are false
pub fn value_is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(a) => !a.is_empty(),
        Value::Object(o) => !o.is_empty(),
    }
}
