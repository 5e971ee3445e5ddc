//! Type display formatting
//!
//! Rebuilds the string `format_type()` shows for a column from the pieces
//! the catalog stores separately: namespace, raw type name, array
//! dimensions and `typmod`.

use std::fmt;

pub const DATATYPE_TIME_WITH_TIMEZONE: &str = "time with time zone";
pub const DATATYPE_TIME_WITHOUT_TIMEZONE: &str = "time without time zone";
pub const DATATYPE_TIMESTAMP_WITH_TIMEZONE: &str = "timestamp with time zone";
pub const DATATYPE_TIMESTAMP_WITHOUT_TIMEZONE: &str = "timestamp without time zone";

/// `typmod` value meaning "no modifier"
pub const TYPMOD_UNSET: i32 = -1;

/// Interval fractional-second precision above this is not a precision
const MAX_INTERVAL_PRECISION: i64 = 6;

/// Server limit on array dimensions (`MAXDIM`)
pub const MAX_ARRAY_DIMS: u32 = 6;

/// Length/precision decoded from a `typmod`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeModifier {
    /// Type takes no modifier (date) or typmod was unset
    None,
    /// Single length or fractional-second precision
    Length(i64),
    /// numeric precision and scale
    LengthPrecision(i64, i64),
    /// interval typmod carrying no usable precision
    Cleared,
}

impl TypeModifier {
    /// Decode `typmod` for the given (unqualified, unquoted) type name
    pub fn decode(typmod: i32, name: &str) -> Self {
        if typmod == TYPMOD_UNSET {
            return TypeModifier::None;
        }
        let typmod = i64::from(typmod);

        match name {
            "numeric" => {
                let packed = typmod - 4;
                TypeModifier::LengthPrecision(packed >> 16, packed & 0xffff)
            }
            "time"
            | "timetz"
            | DATATYPE_TIME_WITHOUT_TIMEZONE
            | DATATYPE_TIME_WITH_TIMEZONE
            | "timestamp"
            | "timestamptz"
            | DATATYPE_TIMESTAMP_WITHOUT_TIMEZONE
            | DATATYPE_TIMESTAMP_WITH_TIMEZONE
            | "bit"
            | "bit varying"
            | "varbit" => TypeModifier::Length(typmod),
            "interval" => {
                let precision = typmod & 0xffff;
                if precision > MAX_INTERVAL_PRECISION {
                    TypeModifier::Cleared
                } else {
                    TypeModifier::Length(precision)
                }
            }
            "date" => TypeModifier::None,
            _ => TypeModifier::Length(typmod - 4),
        }
    }

    pub fn length(&self) -> Option<i64> {
        match self {
            TypeModifier::Length(len) | TypeModifier::LengthPrecision(len, _) => Some(*len),
            _ => None,
        }
    }

    pub fn precision(&self) -> Option<i64> {
        match self {
            TypeModifier::LengthPrecision(_, prec) => Some(*prec),
            _ => None,
        }
    }
}

impl fmt::Display for TypeModifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeModifier::None | TypeModifier::Cleared => Ok(()),
            TypeModifier::Length(len) => write!(f, "({len})"),
            TypeModifier::LengthPrecision(len, prec) => write!(f, "({len},{prec})"),
        }
    }
}

/// Drop a `"schema".` or `schema.` prefix.
///
/// `format_type` qualifies names whose schema is not on the search path.
fn strip_schema<'a>(typname: &'a str, schema: &str) -> &'a str {
    if schema.is_empty() {
        return typname;
    }
    let quoted = format!("\"{schema}\".");
    if let Some(rest) = typname.strip_prefix(quoted.as_str()) {
        return rest;
    }
    let bare = format!("{schema}.");
    typname.strip_prefix(bare.as_str()).unwrap_or(typname)
}

fn full_type_value(name: &str, schema: &str, length: &str, array: &str) -> String {
    match name {
        "char" if schema == "pg_catalog" => format!("\"char\"{array}"),
        DATATYPE_TIME_WITH_TIMEZONE => format!("time{length} with time zone{array}"),
        DATATYPE_TIME_WITHOUT_TIMEZONE => format!("time{length} without time zone{array}"),
        DATATYPE_TIMESTAMP_WITH_TIMEZONE => format!("timestamp{length} with time zone{array}"),
        DATATYPE_TIMESTAMP_WITHOUT_TIMEZONE => {
            format!("timestamp{length} without time zone{array}")
        }
        _ => format!("{name}{length}{array}"),
    }
}

/// Full display type with length, precision and array suffix.
///
/// # Arguments
/// * `nsp` - namespace of the type, if known
/// * `typname` - name as returned by `format_type`/`typname`; may be
///   schema-qualified, quoted, `_`-prefixed or `[]`-suffixed
/// * `numdims` - array dimensions; 0 lets the name decide, values above
///   [`MAX_ARRAY_DIMS`] are clamped
/// * `typmod` - `atttypmod`, [`TYPMOD_UNSET`] for none
///
/// There is no duplicate-name flag: whether another schema has a type of
/// the same name never changes the rendered string.
///
/// # Example
/// ```
/// use pgschema::datatype::get_full_type;
///
/// assert_eq!(get_full_type(Some("pg_catalog"), "numeric", 0, 655366), "numeric(10,2)");
/// assert_eq!(get_full_type(None, "_varchar", 0, 54), "varchar(50)[]");
/// ```
pub fn get_full_type(nsp: Option<&str>, typname: &str, numdims: u32, typmod: i32) -> String {
    let schema = nsp.unwrap_or("");
    let mut numdims = numdims;
    let mut name = strip_schema(typname, schema);

    if let Some(rest) = name.strip_prefix('_') {
        if numdims == 0 {
            numdims = 1;
        }
        name = rest;
    }

    if let Some(rest) = name.strip_suffix("[]") {
        if numdims == 0 {
            numdims = 1;
        }
        name = rest;
    }

    if name.len() >= 2 && name.starts_with('"') && name.ends_with('"') {
        name = &name[1..name.len() - 1];
    }

    let array = "[]".repeat(numdims.min(MAX_ARRAY_DIMS) as usize);
    let length = TypeModifier::decode(typmod, name).to_string();

    full_type_value(name, schema, &length, &array)
}
