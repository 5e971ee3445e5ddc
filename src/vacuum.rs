//! Vacuum Defaults Cache
//!
//! The autovacuum panels show each per-table setting next to the server
//! default. Defaults only change with the server configuration, so they are
//! read once per (server, category) and kept for the lifetime of the cache.
//!
//! ## Design
//!
//! - Field definitions (setting name -> internal name, label, column type)
//!   come from the `vacuum_settings/vacuum_fields.json` template
//! - Defaults are read from `pg_settings` with one query per cache miss
//! - Each key has its own slot lock, so concurrent first requests for the
//!   same key run the query once while other keys proceed independently
//! - There is no eviction

use crate::connection::{Connection, Row, ServerId};
use crate::error::{SchemaError, SchemaResult};
use crate::quoting::quote_literal;
use crate::template::{TemplateParams, TemplateRenderer};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const FIELDS_TEMPLATE: &str = "vacuum_settings/vacuum_fields.json";
const DEFAULTS_TEMPLATE: &str = "vacuum_settings/sql/vacuum_defaults.sql";

/// Which relation the settings apply to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VacuumCategory {
    Table,
    Toast,
}

impl VacuumCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            VacuumCategory::Table => "table",
            VacuumCategory::Toast => "toast",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "table" => Some(VacuumCategory::Table),
            "toast" => Some(VacuumCategory::Toast),
            _ => None,
        }
    }

    /// Column name the per-object value is stored under
    fn value_key(&self, name: &str) -> String {
        match self {
            VacuumCategory::Table => name.to_string(),
            VacuumCategory::Toast => format!("toast_{name}"),
        }
    }
}

impl fmt::Display for VacuumCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A numeric setting; integral values stay integers
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VacuumValue {
    Int(i64),
    Float(f64),
}

impl VacuumValue {
    /// Read a number or numeric string; `None` when absent or null
    pub fn coerce(value: &Value) -> SchemaResult<Option<Self>> {
        let f = match value {
            Value::Null => return Ok(None),
            Value::Number(n) => n.as_f64(),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
        .ok_or_else(|| {
            SchemaError::UnexpectedInput(format!("could not convert {value} to a number"))
        })?;

        if f.fract() == 0.0 && f.abs() < 9.0e15 {
            Ok(Some(VacuumValue::Int(f as i64)))
        } else {
            Ok(Some(VacuumValue::Float(f)))
        }
    }
}

/// One autovacuum setting as shown in the UI
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VacuumField {
    /// Internal (reloption) name
    pub name: String,
    pub label: String,
    /// Server default from `pg_settings`
    pub setting: Option<VacuumValue>,
    pub column_type: String,
    /// Value set on the object, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<VacuumValue>,
}

/// `pg_settings` name -> (internal name, label, column type)
type FieldTable = BTreeMap<String, (String, String, String)>;

type Slot = Arc<Mutex<Option<Arc<Vec<VacuumField>>>>>;

/// Cache statistics
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VacuumCacheStats {
    pub hits: usize,
    pub misses: usize,
    pub size: usize,
}

/// Per-server cache of autovacuum defaults
#[derive(Default)]
pub struct VacuumSettings {
    slots: Mutex<HashMap<(ServerId, VacuumCategory), Slot>>,
    hits: AtomicUsize,
    misses: AtomicUsize,
}

impl VacuumSettings {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, sid: ServerId, category: VacuumCategory) -> Slot {
        let mut slots = self.slots.lock();
        Arc::clone(slots.entry((sid, category)).or_default())
    }

    /// Defaults for one server and category, querying on first use
    pub fn fetch(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        sid: ServerId,
        category: VacuumCategory,
    ) -> SchemaResult<Arc<Vec<VacuumField>>> {
        let slot = self.slot(sid, category);
        let mut cached = slot.lock();

        if let Some(fields) = cached.as_ref() {
            self.hits.fetch_add(1, Ordering::Relaxed);
            tracing::debug!(sid, category = category.as_str(), "vacuum_defaults_hit");
            return Ok(Arc::clone(fields));
        }

        self.misses.fetch_add(1, Ordering::Relaxed);
        let fields = Arc::new(load_defaults(conn, templates, category)?);
        tracing::info!(
            sid,
            category = category.as_str(),
            count = fields.len(),
            "vacuum_defaults_loaded"
        );
        *cached = Some(Arc::clone(&fields));
        Ok(fields)
    }

    pub fn table_settings(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        sid: ServerId,
    ) -> SchemaResult<Arc<Vec<VacuumField>>> {
        self.fetch(conn, templates, sid, VacuumCategory::Table)
    }

    pub fn toast_settings(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        sid: ServerId,
    ) -> SchemaResult<Arc<Vec<VacuumField>>> {
        self.fetch(conn, templates, sid, VacuumCategory::Toast)
    }

    /// Defaults merged with the values set on one object.
    ///
    /// `observed` is the object's properties row. Toast settings are looked
    /// up as `toast_<name>`. Fields without a value there lose `value`.
    pub fn parse(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        sid: ServerId,
        category: VacuumCategory,
        observed: &Row,
    ) -> SchemaResult<Vec<VacuumField>> {
        let mut fields = self.fetch(conn, templates, sid, category)?.as_ref().clone();

        for field in &mut fields {
            let key = category.value_key(&field.name);
            field.value = match observed.get(&key) {
                Some(value) => VacuumValue::coerce(value)?,
                None => None,
            };
        }
        Ok(fields)
    }

    pub fn stats(&self) -> VacuumCacheStats {
        let size = self
            .slots
            .lock()
            .values()
            .filter(|slot| slot.lock().is_some())
            .count();
        VacuumCacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            size,
        }
    }
}

fn load_field_table(
    templates: &dyn TemplateRenderer,
    category: VacuumCategory,
) -> SchemaResult<FieldTable> {
    let json = templates.render(FIELDS_TEMPLATE, &TemplateParams::new())?;
    let mut tables: HashMap<String, FieldTable> = serde_json::from_str(&json)?;
    tables.remove(category.as_str()).ok_or_else(|| {
        SchemaError::UnexpectedInput(format!("no vacuum fields defined for '{category}'"))
    })
}

fn load_defaults(
    conn: &dyn Connection,
    templates: &dyn TemplateRenderer,
    category: VacuumCategory,
) -> SchemaResult<Vec<VacuumField>> {
    let table = load_field_table(templates, category)?;

    let columns = table
        .keys()
        .map(|name| quote_literal(name))
        .collect::<Vec<_>>()
        .join(",");
    let sql = templates.render(
        DEFAULTS_TEMPLATE,
        &TemplateParams::new().with("columns", columns),
    )?;
    let result = conn.execute_dict(&sql)?;

    result
        .rows
        .iter()
        .map(|row| -> SchemaResult<VacuumField> {
            let setting_name = row.get("name").and_then(Value::as_str).ok_or_else(|| {
                SchemaError::UnexpectedInput("vacuum default row has no name".to_string())
            })?;
            let (name, label, column_type) = table.get(setting_name).ok_or_else(|| {
                SchemaError::UnexpectedInput(format!("unknown vacuum setting '{setting_name}'"))
            })?;
            let setting = match row.get("setting") {
                Some(value) => VacuumValue::coerce(value)?,
                None => None,
            };
            Ok(VacuumField {
                name: name.clone(),
                label: label.clone(),
                setting,
                column_type: column_type.clone(),
                value: None,
            })
        })
        .collect()
}
