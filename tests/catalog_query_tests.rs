//! Catalog lookups rendered from the bundled templates and run against a
//! scripted connection.

use parking_lot::Mutex;
use pgschema::connection::{Connection, Grid, ResultSet, ServerManager, ServerType};
use pgschema::datatype::{DataTypeReader, TypeVal};
use pgschema::error::{SchemaError, SchemaResult};
use pgschema::schema::{get_schema, get_schemas, SchemaChildModule};
use pgschema::user_mapping::{create_user_mapping, find_user_mapping};
use pgschema::SqlTemplates;
use serde_json::{json, Value};
use std::collections::VecDeque;

/// Replays canned results and records every statement it is given
struct ScriptedConn {
    manager: ServerManager,
    grid: Grid,
    scalars: Mutex<VecDeque<Value>>,
    log: Mutex<Vec<String>>,
}

impl ScriptedConn {
    fn new(version: u32, server_type: ServerType) -> Self {
        ScriptedConn {
            manager: ServerManager::new(1, version, server_type),
            grid: Grid::default(),
            scalars: Mutex::new(VecDeque::new()),
            log: Mutex::new(Vec::new()),
        }
    }

    fn with_grid(mut self, grid: Grid) -> Self {
        self.grid = grid;
        self
    }

    fn with_scalars(self, values: Vec<Value>) -> Self {
        self.scalars.lock().extend(values);
        self
    }

    fn statements(&self) -> Vec<String> {
        self.log.lock().clone()
    }
}

impl Connection for ScriptedConn {
    fn manager(&self) -> &ServerManager {
        &self.manager
    }

    fn execute_2darray(&self, sql: &str) -> SchemaResult<Grid> {
        self.log.lock().push(sql.to_string());
        Ok(self.grid.clone())
    }

    fn execute_dict(&self, sql: &str) -> SchemaResult<ResultSet> {
        self.log.lock().push(sql.to_string());
        Ok(ResultSet::default())
    }

    fn execute_scalar(&self, sql: &str) -> SchemaResult<Value> {
        self.log.lock().push(sql.to_string());
        Ok(self.scalars.lock().pop_front().unwrap_or(Value::Null))
    }
}

fn templates() -> SqlTemplates {
    SqlTemplates::new(concat!(env!("CARGO_MANIFEST_DIR"), "/templates"))
}

fn types_grid() -> Grid {
    Grid::new(
        ["typname", "elemoid", "typlen", "typtype", "oid", "nspname", "isdup", "is_collatable"]
            .iter()
            .map(|c| c.to_string())
            .collect(),
        vec![
            vec![json!("numeric"), json!(1700), json!(-1), json!("b"), json!(1700), json!("pg_catalog"), json!(false), json!(false)],
            vec![json!("character varying[]"), json!(1043), json!(-1), json!("b"), json!(1015), json!("pg_catalog"), json!(false), json!(true)],
            vec![json!("interval"), json!(1186), json!(16), json!("b"), json!(1186), json!("pg_catalog"), json!(false), json!(false)],
            vec![json!("text"), json!(25), json!(-1), json!("b"), json!(25), json!("pg_catalog"), json!(false), json!(true)],
            vec![json!("serial"), json!(0), json!(4), json!("b"), json!(0), json!("pg_catalog"), json!(false), json!(false)],
        ],
    )
}

#[test]
fn test_get_types_annotates_modifiers() {
    let conn = ScriptedConn::new(140005, ServerType::Pg).with_grid(types_grid());
    let types = DataTypeReader::new()
        .get_types(&conn, &templates(), "", true, None)
        .unwrap();

    assert_eq!(types.len(), 5);

    let numeric = &types[0];
    assert_eq!(numeric.label, "numeric");
    assert_eq!(numeric.typval, TypeVal::Precision);
    assert!(numeric.length && numeric.precision);
    assert_eq!((numeric.min_val, numeric.max_val), (1, 1000));

    let varchar = &types[1];
    assert_eq!(varchar.typval, TypeVal::Length);
    assert!(varchar.is_collatable);
    assert_eq!(varchar.oid, 1015);
    assert_eq!(varchar.max_val, i64::from(i32::MAX));

    let interval = &types[2];
    assert_eq!(interval.typval, TypeVal::DateTime);
    assert_eq!((interval.min_val, interval.max_val), (0, 6));

    let text = &types[3];
    assert_eq!(text.typval, TypeVal::Plain);
    assert_eq!((text.min_val, text.max_val), (0, 0));

    let serial = &types[4];
    assert_eq!(serial.typval, TypeVal::Plain);
    assert!(!serial.length);
}

#[test]
fn test_get_types_renders_versioned_query() {
    let conn = ScriptedConn::new(140005, ServerType::Pg).with_grid(types_grid());
    DataTypeReader::new()
        .get_types(&conn, &templates(), "typisdefined AND typtype IN ('b', 'c')", true, Some(2200))
        .unwrap();

    let sql = &conn.statements()[0];
    assert!(sql.contains("AND typisdefined AND typtype IN ('b', 'c')"));
    assert!(sql.contains("nsp.oid = 2200"));
    assert!(sql.contains("'bigserial'"));
    assert!(!sql.contains("{%"));
    assert!(!sql.contains("{{"));
}

#[test]
fn test_get_types_without_serials_or_condition() {
    let conn = ScriptedConn::new(90500, ServerType::Pg).with_grid(types_grid());
    DataTypeReader::new()
        .get_types(&conn, &templates(), "", false, Some(2200))
        .unwrap();

    // 9.5 resolves to the default directory, which has no schema filter
    let sql = &conn.statements()[0];
    assert!(!sql.contains("serial"));
    assert!(!sql.contains("AND  "));
    assert!(!sql.contains("2200"));
}

#[test]
fn test_get_types_missing_column() {
    let grid = Grid::new(vec!["typname".to_string()], vec![vec![json!("int4")]]);
    let conn = ScriptedConn::new(140005, ServerType::Pg).with_grid(grid);
    let err = DataTypeReader::new()
        .get_types(&conn, &templates(), "", false, None)
        .unwrap_err();
    assert!(matches!(err, SchemaError::UnexpectedInput(_)));
}

#[test]
fn test_get_types_custom_template_path() {
    let dir = tempfile::tempdir().unwrap();
    let sql_dir = dir.path().join("custom");
    std::fs::create_dir_all(&sql_dir).unwrap();
    std::fs::write(sql_dir.join("get_types.sql"), "SELECT {{ condition }}").unwrap();

    let conn = ScriptedConn::new(140005, ServerType::Pg).with_grid(Grid::default());
    let types = DataTypeReader::with_template_path("custom")
        .get_types(&conn, &SqlTemplates::new(dir.path()), "1", false, None)
        .unwrap();

    assert!(types.is_empty());
    assert_eq!(conn.statements(), vec!["SELECT 1".to_string()]);
}

#[test]
fn test_get_schema_name() {
    let conn = ScriptedConn::new(140005, ServerType::Pg).with_scalars(vec![json!("public")]);
    assert_eq!(get_schema(&conn, &templates(), 2200).unwrap(), "public");
    assert!(conn.statements()[0].contains("nsp.oid = 2200::oid"));
}

#[test]
fn test_get_schema_missing_is_not_found() {
    let conn = ScriptedConn::new(140005, ServerType::Pg);
    let err = get_schema(&conn, &templates(), 99).unwrap_err();
    assert!(matches!(err, SchemaError::NotFound(_)));
    assert_eq!(err.to_response().status, 410);
}

#[test]
fn test_get_schemas_hides_system_schemas_by_default() {
    let grid = Grid::new(
        vec!["oid".to_string(), "name".to_string()],
        vec![vec![json!(2200), json!("public")]],
    );
    let conn = ScriptedConn::new(140005, ServerType::Pg).with_grid(grid);
    let templates = templates();

    let schemas = get_schemas(&conn, &templates, false).unwrap();
    assert_eq!(schemas.get(0, "name"), Some(&json!("public")));

    get_schemas(&conn, &templates, true).unwrap();

    let statements = conn.statements();
    assert!(statements[0].contains("information_schema"));
    assert!(statements[0].contains("pg_toast"));
    assert!(!statements[1].contains("<> 'information_schema'"));
    assert!(!statements[0].contains("ANY("));
}

#[test]
fn test_get_schemas_ppas_uses_own_tree() {
    let conn = ScriptedConn::new(110000, ServerType::Ppas);
    get_schemas(&conn, &templates(), false).unwrap();
    assert!(!conn.statements()[0].contains("pg_toast"));
}

#[test]
fn test_get_schemas_unknown_server_type_tree() {
    let dir = tempfile::tempdir().unwrap();
    let conn = ScriptedConn::new(140005, ServerType::Pg);
    let err = get_schemas(&conn, &SqlTemplates::new(dir.path()), false).unwrap_err();
    assert!(matches!(err, SchemaError::Template { .. }));
    assert!(conn.statements().is_empty());
}

#[test]
fn test_schema_child_visibility() {
    let tables = SchemaChildModule::default();
    let catalog_objects = SchemaChildModule::catalog_only(&["pg_catalog"]);
    let jobs = SchemaChildModule::catalog_only(&["pgagent"]);

    assert!(tables.backend_supported(false, false, "public"));
    assert!(!catalog_objects.backend_supported(false, false, "public"));
    assert!(catalog_objects.backend_supported(true, false, "pg_catalog"));
    assert!(!jobs.backend_supported(true, false, "pg_catalog"));
    assert!(jobs.backend_supported(true, false, "pgagent"));
}

#[test]
fn test_create_user_mapping_returns_umid() {
    let conn = ScriptedConn::new(140005, ServerType::Pg)
        .with_scalars(vec![Value::Null, json!("16420")]);
    let umid = create_user_mapping(&conn, "postgres", "secret", "fsrv").unwrap();
    assert_eq!(umid, 16420);

    let statements = conn.statements();
    assert_eq!(statements.len(), 2);
    assert!(statements[0].starts_with("CREATE USER MAPPING FOR postgres SERVER fsrv"));
    assert!(statements[1].contains("srvname = 'fsrv'"));
}

#[test]
fn test_find_user_mapping_absent() {
    let conn = ScriptedConn::new(140005, ServerType::Pg);
    assert_eq!(find_user_mapping(&conn, "fsrv").unwrap(), None);

    let conn = ScriptedConn::new(140005, ServerType::Pg).with_scalars(vec![json!(true)]);
    assert!(matches!(
        find_user_mapping(&conn, "fsrv"),
        Err(SchemaError::UnexpectedInput(_))
    ));
}
