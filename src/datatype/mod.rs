//! Data Type Reader
//!
//! Everything the type pickers need:
//! - classification of a type (by OID or name) into its modifier family
//! - `typmod` decoding and display formatting ([`get_full_type`])
//! - the lossy reverse direction ([`parse_type_name`], [`parse_length_precision`])
//! - listing selectable types from the catalog ([`DataTypeReader::get_types`])
//!
//! ## Modifier families
//!
//! | typval | Types | Modifier |
//! |--------|-------|----------|
//! | `L` | bit, varbit, bpchar, varchar (and arrays) | length |
//! | `D` | time, timetz, timestamp, timestamptz, interval (and arrays) | length (0..=6) |
//! | `P` | numeric, numeric[] | length and precision |
//! | ` ` | everything else | none |

mod format;
mod parse;

pub use format::{
    get_full_type, TypeModifier, DATATYPE_TIMESTAMP_WITHOUT_TIMEZONE, MAX_ARRAY_DIMS,
    DATATYPE_TIMESTAMP_WITH_TIMEZONE, DATATYPE_TIME_WITHOUT_TIMEZONE,
    DATATYPE_TIME_WITH_TIMEZONE, TYPMOD_UNSET,
};
pub use parse::{parse_length_precision, parse_type_name};

use crate::connection::{value_as_i64, value_is_truthy, Connection, Grid};
use crate::error::{SchemaError, SchemaResult};
use crate::template::{TemplateParams, TemplateRenderer};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One-letter modifier family the type picker works with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TypeVal {
    #[serde(rename = "L")]
    Length,
    #[serde(rename = "D")]
    DateTime,
    #[serde(rename = "P")]
    Precision,
    #[serde(rename = " ")]
    Plain,
}

impl TypeVal {
    pub fn as_char(&self) -> char {
        match self {
            TypeVal::Length => 'L',
            TypeVal::DateTime => 'D',
            TypeVal::Precision => 'P',
            TypeVal::Plain => ' ',
        }
    }

    pub fn modifier_kind(&self) -> ModifierKind {
        match self {
            TypeVal::Length | TypeVal::DateTime => ModifierKind::Length,
            TypeVal::Precision => ModifierKind::LengthAndPrecision,
            TypeVal::Plain => ModifierKind::NoModifier,
        }
    }
}

/// Coarse classification of what a type's modifier may carry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ModifierKind {
    NoModifier,
    Length,
    LengthAndPrecision,
}

/// A type identified either by OID or by name
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeRef<'a> {
    Oid(u32),
    Name(&'a str),
}

impl From<u32> for TypeRef<'_> {
    fn from(oid: u32) -> Self {
        TypeRef::Oid(oid)
    }
}

impl<'a> From<&'a str> for TypeRef<'a> {
    fn from(name: &'a str) -> Self {
        TypeRef::Name(name)
    }
}

/// Whether a type takes a length and/or precision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPrecision {
    pub length: bool,
    pub precision: bool,
    pub typval: TypeVal,
}

const LENGTH_OIDS: &[u32] = &[1560, 1561, 1562, 1563, 1042, 1043, 1014, 1015];
const LENGTH_NAMES: &[&str] = &[
    "bit",
    "bit[]",
    "varbit",
    "bit varying",
    "varbit[]",
    "bit varying[]",
    "bpchar",
    "character",
    "varchar",
    "character varying",
    "bpchar[]",
    "character[]",
    "varchar[]",
    "character varying[]",
];

const DATETIME_OIDS: &[u32] = &[1083, 1114, 1115, 1183, 1184, 1185, 1186, 1187, 1266, 1270];
const DATETIME_NAMES: &[&str] = &[
    "time",
    DATATYPE_TIME_WITHOUT_TIMEZONE,
    "timestamp",
    DATATYPE_TIMESTAMP_WITHOUT_TIMEZONE,
    "timestamp[]",
    "timestamp without time zone[]",
    "time[]",
    "time without time zone[]",
    "timestamptz",
    DATATYPE_TIMESTAMP_WITH_TIMEZONE,
    "timestamptz[]",
    "timestamp with time zone[]",
    "interval",
    "interval[]",
    "timetz",
    DATATYPE_TIME_WITH_TIMEZONE,
    "timetz[]",
    "time with time zone[]",
];

const PRECISION_OIDS: &[u32] = &[1231, 1700];
const PRECISION_NAMES: &[&str] = &["numeric[]", "numeric"];

/// Classify a type by OID or name
pub fn get_length_precision<'a>(type_ref: impl Into<TypeRef<'a>>) -> LengthPrecision {
    let typval = match type_ref.into() {
        TypeRef::Oid(oid) if LENGTH_OIDS.contains(&oid) => TypeVal::Length,
        TypeRef::Oid(oid) if DATETIME_OIDS.contains(&oid) => TypeVal::DateTime,
        TypeRef::Oid(oid) if PRECISION_OIDS.contains(&oid) => TypeVal::Precision,
        TypeRef::Name(name) if LENGTH_NAMES.contains(&name) => TypeVal::Length,
        TypeRef::Name(name) if DATETIME_NAMES.contains(&name) => TypeVal::DateTime,
        TypeRef::Name(name) if PRECISION_NAMES.contains(&name) => TypeVal::Precision,
        _ => TypeVal::Plain,
    };

    let precision = typval == TypeVal::Precision;
    LengthPrecision {
        length: precision || matches!(typval, TypeVal::Length | TypeVal::DateTime),
        precision,
        typval,
    }
}

/// Allowed length range the picker enforces, `(min, max)`
pub fn types_length_checks(length: bool, typval: TypeVal, precision: bool) -> (i64, i64) {
    if !length {
        return (0, 0);
    }
    let min_val = if typval == TypeVal::DateTime { 0 } else { 1 };
    let max_val = if precision {
        1000
    } else if min_val == 1 {
        i64::from(i32::MAX)
    } else {
        // interval, timestamptz and friends
        6
    };
    (min_val, max_val)
}

/// A selectable type with its modifier constraints
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataTypeInfo {
    pub label: String,
    pub value: String,
    pub typval: TypeVal,
    pub precision: bool,
    pub length: bool,
    pub min_val: i64,
    pub max_val: i64,
    pub is_collatable: bool,
    pub oid: i64,
}

fn cell<'g>(grid: &'g Grid, row: usize, name: &str) -> SchemaResult<&'g Value> {
    grid.get(row, name)
        .ok_or_else(|| SchemaError::UnexpectedInput(format!("missing column '{name}'")))
}

/// Reads type lists from the catalog
#[derive(Debug, Clone, Default)]
pub struct DataTypeReader {
    template_path: Option<String>,
}

impl DataTypeReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Use a fixed template directory instead of the versioned default
    pub fn with_template_path(path: impl Into<String>) -> Self {
        DataTypeReader {
            template_path: Some(path.into()),
        }
    }

    fn template_dir(&self, conn: &dyn Connection) -> String {
        self.template_path
            .clone()
            .unwrap_or_else(|| format!("datatype/sql/#{}#", conn.manager().version))
    }

    fn types_grid(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        condition: &str,
        add_serials: bool,
        schema_oid: Option<i64>,
    ) -> SchemaResult<Grid> {
        let params = TemplateParams::new()
            .with("condition", condition)
            .with("add_serials", add_serials)
            .with("schema_oid", schema_oid.map_or(Value::Null, Value::from));
        let sql = templates.render(
            &format!("{}/get_types.sql", self.template_dir(conn)),
            &params,
        )?;
        conn.execute_2darray(&sql)
    }

    /// Types matching `condition`, annotated with length/precision rules.
    ///
    /// # Arguments
    /// * `condition` - SQL fragment restricting `pg_type` rows
    /// * `add_serials` - also list the serial pseudo-types
    /// * `schema_oid` - restrict to one namespace
    pub fn get_types(
        &self,
        conn: &dyn Connection,
        templates: &dyn TemplateRenderer,
        condition: &str,
        add_serials: bool,
        schema_oid: Option<i64>,
    ) -> SchemaResult<Vec<DataTypeInfo>> {
        let grid = self.types_grid(conn, templates, condition, add_serials, schema_oid)?;

        let mut types = Vec::with_capacity(grid.len());
        for row in 0..grid.len() {
            let typname = match cell(&grid, row, "typname")? {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };

            let elemoid = cell(&grid, row, "elemoid")?;
            let lp = match value_as_i64(elemoid).and_then(|oid| u32::try_from(oid).ok()) {
                Some(oid) if oid != 0 => get_length_precision(oid),
                _ => LengthPrecision {
                    length: false,
                    precision: false,
                    typval: TypeVal::Plain,
                },
            };
            let (min_val, max_val) = types_length_checks(lp.length, lp.typval, lp.precision);

            types.push(DataTypeInfo {
                label: typname.clone(),
                value: typname,
                typval: lp.typval,
                precision: lp.precision,
                length: lp.length,
                min_val,
                max_val,
                is_collatable: value_is_truthy(cell(&grid, row, "is_collatable")?),
                oid: value_as_i64(cell(&grid, row, "oid")?).unwrap_or_default(),
            });
        }

        tracing::debug!(count = types.len(), add_serials, "types_loaded");
        Ok(types)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_by_oid() {
        assert_eq!(get_length_precision(1043u32).typval, TypeVal::Length);
        assert_eq!(get_length_precision(1184u32).typval, TypeVal::DateTime);
        assert_eq!(get_length_precision(1700u32).typval, TypeVal::Precision);
        assert_eq!(get_length_precision(23u32).typval, TypeVal::Plain);
    }

    #[test]
    fn test_classify_by_name() {
        let lp = get_length_precision("numeric");
        assert!(lp.length);
        assert!(lp.precision);
        assert_eq!(lp.typval.modifier_kind(), ModifierKind::LengthAndPrecision);

        let lp = get_length_precision("character varying[]");
        assert!(lp.length);
        assert!(!lp.precision);
        assert_eq!(lp.typval.modifier_kind(), ModifierKind::Length);

        let lp = get_length_precision(DATATYPE_TIME_WITH_TIMEZONE);
        assert_eq!(lp.typval, TypeVal::DateTime);

        let lp = get_length_precision("text");
        assert!(!lp.length);
        assert_eq!(lp.typval.modifier_kind(), ModifierKind::NoModifier);
    }

    #[test]
    fn test_length_checks() {
        assert_eq!(types_length_checks(false, TypeVal::Plain, false), (0, 0));
        assert_eq!(types_length_checks(true, TypeVal::Precision, true), (1, 1000));
        assert_eq!(types_length_checks(true, TypeVal::Length, false), (1, 2147483647));
        assert_eq!(types_length_checks(true, TypeVal::DateTime, false), (0, 6));
    }

    #[test]
    fn test_typval_serializes_as_letter() {
        assert_eq!(serde_json::to_string(&TypeVal::Precision).unwrap(), "\"P\"");
        assert_eq!(serde_json::to_string(&TypeVal::Plain).unwrap(), "\" \"");
        assert_eq!(TypeVal::DateTime.as_char(), 'D');
    }
}
