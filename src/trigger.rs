//! Trigger type decoding
//!
//! `pg_trigger.tgtype` packs timing, level and events into one small
//! integer. The properties dialog wants them as separate fields.

use crate::connection::{value_as_i64, Row};
use crate::error::{SchemaError, SchemaResult};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const TRIGGER_TYPE_ROW: i64 = 1 << 0;
pub const TRIGGER_TYPE_BEFORE: i64 = 1 << 1;
pub const TRIGGER_TYPE_INSERT: i64 = 1 << 2;
pub const TRIGGER_TYPE_DELETE: i64 = 1 << 3;
pub const TRIGGER_TYPE_UPDATE: i64 = 1 << 4;
pub const TRIGGER_TYPE_TRUNCATE: i64 = 1 << 5;
pub const TRIGGER_TYPE_INSTEAD: i64 = 1 << 6;

/// When the trigger fires relative to the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TriggerTiming {
    #[serde(rename = "BEFORE")]
    Before,
    #[serde(rename = "INSTEAD OF")]
    InsteadOf,
    #[serde(rename = "AFTER")]
    After,
}

impl TriggerTiming {
    pub fn as_str(&self) -> &'static str {
        match self {
            TriggerTiming::Before => "BEFORE",
            TriggerTiming::InsteadOf => "INSTEAD OF",
            TriggerTiming::After => "AFTER",
        }
    }
}

impl fmt::Display for TriggerTiming {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded `tgtype`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TriggerFlags {
    pub fires: TriggerTiming,
    pub is_row_trigger: bool,
    pub evnt_insert: bool,
    pub evnt_delete: bool,
    pub evnt_update: bool,
    pub evnt_truncate: bool,
}

impl TriggerFlags {
    /// Pack the flags back into a `tgtype` value
    pub fn to_tgtype(&self) -> i64 {
        let mut tgtype = match self.fires {
            TriggerTiming::Before => TRIGGER_TYPE_BEFORE,
            TriggerTiming::InsteadOf => TRIGGER_TYPE_INSTEAD,
            TriggerTiming::After => 0,
        };
        for (set, bit) in [
            (self.is_row_trigger, TRIGGER_TYPE_ROW),
            (self.evnt_insert, TRIGGER_TYPE_INSERT),
            (self.evnt_delete, TRIGGER_TYPE_DELETE),
            (self.evnt_update, TRIGGER_TYPE_UPDATE),
            (self.evnt_truncate, TRIGGER_TYPE_TRUNCATE),
        ] {
            if set {
                tgtype |= bit;
            }
        }
        tgtype
    }
}

/// Decode a `tgtype` bitmask.
///
/// BEFORE wins over INSTEAD if both bits are set; neither means AFTER.
pub fn trigger_definition(tgtype: i64) -> TriggerFlags {
    let fires = if tgtype & TRIGGER_TYPE_BEFORE != 0 {
        TriggerTiming::Before
    } else if tgtype & TRIGGER_TYPE_INSTEAD != 0 {
        TriggerTiming::InsteadOf
    } else {
        TriggerTiming::After
    };

    TriggerFlags {
        fires,
        is_row_trigger: tgtype & TRIGGER_TYPE_ROW != 0,
        evnt_insert: tgtype & TRIGGER_TYPE_INSERT != 0,
        evnt_delete: tgtype & TRIGGER_TYPE_DELETE != 0,
        evnt_update: tgtype & TRIGGER_TYPE_UPDATE != 0,
        evnt_truncate: tgtype & TRIGGER_TYPE_TRUNCATE != 0,
    }
}

/// Decode the `tgtype` column of a properties row and add the flag fields
pub fn apply_trigger_definition(mut data: Row) -> SchemaResult<Row> {
    let tgtype = data
        .get("tgtype")
        .and_then(value_as_i64)
        .ok_or_else(|| SchemaError::UnexpectedInput("trigger row has no tgtype".to_string()))?;

    let flags = trigger_definition(tgtype);
    data.insert("fires".to_string(), Value::from(flags.fires.as_str()));
    data.insert("is_row_trigger".to_string(), Value::from(flags.is_row_trigger));
    data.insert("evnt_insert".to_string(), Value::from(flags.evnt_insert));
    data.insert("evnt_delete".to_string(), Value::from(flags.evnt_delete));
    data.insert("evnt_update".to_string(), Value::from(flags.evnt_update));
    data.insert("evnt_truncate".to_string(), Value::from(flags.evnt_truncate));
    Ok(data)
}
