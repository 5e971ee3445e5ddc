//! User mappings for foreign servers.

use crate::connection::{value_as_i64, Connection};
use crate::error::{SchemaError, SchemaResult};
use crate::quoting::{quote_ident, quote_literal};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One `OPTIONS` entry of a user mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMappingOption {
    pub umoption: String,
    pub umvalue: String,
}

/// Body posted to create a user mapping
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserMappingPayload {
    pub name: String,
    pub um_options: Vec<UserMappingOption>,
    pub umoptions: Vec<UserMappingOption>,
}

impl UserMappingPayload {
    /// Mapping for `db_user` that logs in remotely as `username`
    pub fn new(db_user: &str, username: &str, password: &str) -> Self {
        UserMappingPayload {
            name: db_user.to_string(),
            um_options: Vec::new(),
            umoptions: vec![
                UserMappingOption {
                    umoption: "user".to_string(),
                    umvalue: username.to_string(),
                },
                UserMappingOption {
                    umoption: "password".to_string(),
                    umvalue: password.to_string(),
                },
            ],
        }
    }
}

/// `CREATE USER MAPPING` statement for a local user on a foreign server
pub fn create_user_mapping_sql(user: &str, password: &str, fsrv_name: &str) -> String {
    format!(
        "CREATE USER MAPPING FOR {} SERVER {} OPTIONS (user {}, password {})",
        quote_ident(user),
        quote_ident(fsrv_name),
        quote_literal(user),
        quote_literal(password)
    )
}

fn find_user_mapping_sql(fsrv_name: &str) -> String {
    format!(
        "SELECT umid FROM pg_catalog.pg_user_mappings WHERE srvname = {} ORDER BY umid ASC LIMIT 1",
        quote_literal(fsrv_name)
    )
}

/// `umid` of the first user mapping on `fsrv_name`
pub fn find_user_mapping(conn: &dyn Connection, fsrv_name: &str) -> SchemaResult<Option<i64>> {
    match conn.execute_scalar(&find_user_mapping_sql(fsrv_name))? {
        Value::Null => Ok(None),
        value => value_as_i64(&value)
            .map(Some)
            .ok_or_else(|| SchemaError::UnexpectedInput(format!("umid is not an integer: {value}"))),
    }
}

/// Create a mapping for `user` on `fsrv_name` and return its `umid`
pub fn create_user_mapping(
    conn: &dyn Connection,
    user: &str,
    password: &str,
    fsrv_name: &str,
) -> SchemaResult<i64> {
    conn.execute_scalar(&create_user_mapping_sql(user, password, fsrv_name))?;
    let umid = find_user_mapping(conn, fsrv_name)?.ok_or_else(|| {
        SchemaError::NotFound(format!("user mapping on server '{fsrv_name}'"))
    })?;
    tracing::info!(user, fsrv_name, umid, "user_mapping_created");
    Ok(umid)
}
