//! Rewrite rule definitions
//!
//! `pg_get_ruledef()` returns the whole `CREATE RULE` statement as text.
//! The properties dialog edits the condition and the action separately,
//! so both are cut back out of that text:
//!
//! ```text
//! CREATE RULE r AS ON UPDATE TO t WHERE (new.x > 1) DO INSTEAD (DELETE FROM t);
//!                                       \_________/            \_____________/
//!                                        condition               statements
//! ```

use crate::connection::{value_as_i64, value_is_truthy, Row};
use crate::error::{SchemaError, SchemaResult};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::sync::LazyLock;

static CONDITION_PART: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"((?:ON)\s+(?:[\s\S]+?)(?:TO)\s+(?:[\s\S]+?)(?:DO))").expect("valid regex")
});
static CONDITION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:WHERE)\s+(\([\s\S]*\))\s+(?:DO)").expect("valid regex"));
static STATEMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:DO\s+)(?:INSTEAD\s+)?([\s\S]*)(?:;)").expect("valid regex"));

/// Event a rule is attached to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RuleEvent {
    Select,
    Update,
    Insert,
    Delete,
}

impl RuleEvent {
    /// Map `pg_rewrite.ev_type`
    pub fn from_ev_type(ev_type: i64) -> Option<Self> {
        match ev_type {
            1 => Some(RuleEvent::Select),
            2 => Some(RuleEvent::Update),
            3 => Some(RuleEvent::Insert),
            4 => Some(RuleEvent::Delete),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            RuleEvent::Select => "SELECT",
            RuleEvent::Update => "UPDATE",
            RuleEvent::Insert => "INSERT",
            RuleEvent::Delete => "DELETE",
        }
    }
}

/// A rule properties row with the parsed definition fields added
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleProperties {
    pub event: RuleEvent,
    pub do_instead: bool,
    pub statements: String,
    pub condition: String,
    /// All other columns of the row
    #[serde(flatten)]
    pub row: Row,
}

fn strip_parens(text: &str) -> &str {
    if text.len() >= 2 && text.starts_with('(') && text.ends_with(')') {
        &text[1..text.len() - 1]
    } else {
        text
    }
}

/// Condition text of a rule definition, empty when it has none
pub fn extract_condition(definition: &str) -> String {
    CONDITION_PART
        .captures(definition)
        .and_then(|part| {
            CONDITION
                .captures(&part[1])
                .map(|caps| strip_parens(&caps[1]).to_string())
        })
        .unwrap_or_default()
}

/// Action text of a rule definition, empty when it has none
pub fn extract_statements(definition: &str) -> String {
    STATEMENT
        .captures(definition)
        .map(|caps| strip_parens(&caps[1]).to_string())
        .unwrap_or_default()
}

/// Parse the first row of a rule properties query.
///
/// The row must carry `definition`, `ev_type` and `is_instead`. Any missing
/// or unexpected field fails the whole parse.
pub fn parse_rule_definition(rows: &[Row]) -> SchemaResult<RuleProperties> {
    let row = rows
        .first()
        .ok_or_else(|| SchemaError::Parse("list index out of range".to_string()))?;

    let definition = match row.get("definition") {
        Some(Value::String(def)) => def.as_str(),
        _ => return Err(SchemaError::Parse("'definition'".to_string())),
    };

    let condition = extract_condition(definition);
    let statements = extract_statements(definition);

    let ev_type = row.get("ev_type").ok_or_else(|| SchemaError::Parse("'ev_type'".to_string()))?;
    let event = value_as_i64(ev_type)
        .and_then(RuleEvent::from_ev_type)
        .ok_or_else(|| SchemaError::Parse(format!("unknown rule event type {ev_type}")))?;

    let do_instead = row
        .get("is_instead")
        .map(value_is_truthy)
        .ok_or_else(|| SchemaError::Parse("'is_instead'".to_string()))?;

    tracing::debug!(
        event = event.as_str(),
        do_instead,
        has_condition = !condition.is_empty(),
        "rule_definition_parsed"
    );

    let mut rest = row.clone();
    for key in ["event", "do_instead", "statements", "condition"] {
        rest.remove(key);
    }

    Ok(RuleProperties {
        event,
        do_instead,
        statements,
        condition,
        row: rest,
    })
}
