//! Schema helpers
//!
//! Visibility of schema child nodes and the two schema lookups other nodes
//! depend on.

use crate::connection::{Connection, Grid};
use crate::error::{SchemaError, SchemaResult};
use crate::template::{TemplateParams, TemplateRenderer};
use serde_json::Value;

/// Visibility rule for nodes living under a schema.
///
/// Catalog objects are only shown inside `pg_catalog`, pgAgent jobs only
/// inside `pgagent`, ordinary objects everywhere except catalogs:
///
/// | node | `catalog_db_supported` | `supported_schemas` |
/// |------|------------------------|---------------------|
/// | tables, views, ... | true | `None` |
/// | catalog objects | false | `["pg_catalog"]` |
/// | jobs, schedules | false | `["pgagent"]` |
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SchemaChildModule {
    pub catalog_db_supported: bool,
    pub supported_schemas: Option<Vec<String>>,
}

impl Default for SchemaChildModule {
    fn default() -> Self {
        SchemaChildModule {
            catalog_db_supported: true,
            supported_schemas: None,
        }
    }
}

impl SchemaChildModule {
    /// Node only shown inside the given catalog schemas
    pub fn catalog_only(schemas: &[&str]) -> Self {
        SchemaChildModule {
            catalog_db_supported: false,
            supported_schemas: Some(schemas.iter().map(|s| (*s).to_string()).collect()),
        }
    }

    /// Whether the node is shown under the given schema.
    ///
    /// # Arguments
    /// * `is_catalog` - the parent schema is a catalog schema
    /// * `db_support` - the catalog belongs to a database that supports it
    /// * `schema_name` - name of the parent schema
    pub fn backend_supported(&self, is_catalog: bool, db_support: bool, schema_name: &str) -> bool {
        if !is_catalog {
            return self.catalog_db_supported;
        }
        if self.catalog_db_supported {
            return db_support;
        }
        !db_support
            && self
                .supported_schemas
                .as_ref()
                .is_none_or(|schemas| schemas.iter().any(|s| s == schema_name))
    }
}

/// Name of the schema with OID `scid`
pub fn get_schema(
    conn: &dyn Connection,
    templates: &dyn TemplateRenderer,
    scid: i64,
) -> SchemaResult<String> {
    let path = format!("schemas/{}/sql/get_name.sql", conn.manager().template_segment());
    let sql = templates.render(&path, &TemplateParams::new().with("scid", scid))?;

    match conn.execute_scalar(&sql)? {
        Value::String(name) => Ok(name),
        Value::Null => Err(SchemaError::NotFound(format!(
            "Could not find the schema with oid {scid}."
        ))),
        other => Err(SchemaError::UnexpectedInput(format!(
            "schema name is not text: {other}"
        ))),
    }
}

/// Schema nodes of the current database
pub fn get_schemas(
    conn: &dyn Connection,
    templates: &dyn TemplateRenderer,
    show_system_objects: bool,
) -> SchemaResult<Grid> {
    let path = format!("schemas/{}/sql/nodes.sql", conn.manager().template_segment());
    let params = TemplateParams::new()
        .with("show_sysobj", show_system_objects)
        .with("schema_restrictions", Value::Null);
    let sql = templates.render(&path, &params)?;
    conn.execute_2darray(&sql)
}
