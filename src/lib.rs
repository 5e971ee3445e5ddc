//! # pgschema
//!
//! Catalog helpers for a PostgreSQL administration backend: rebuilding type
//! names the way `format_type()` prints them, cutting rule and trigger
//! definitions into the fields the properties dialogs edit, caching the
//! server's autovacuum defaults, and rendering the versioned SQL templates
//! the catalog queries come from.
//!
//! ## Layout
//! ```text
//! Config (pgschema.toml + PGSCHEMA_*)
//!     ↓
//! SqlTemplates ──────────────┐
//!     ↓                      │
//! Connection (injected) ─────┤
//!     ↓                      ↓
//! datatype │ rule │ trigger │ vacuum │ schema │ user_mapping
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use pgschema::datatype::{get_full_type, parse_type_name};
//! use pgschema::trigger::{trigger_definition, TriggerTiming};
//!
//! let full = get_full_type(Some("pg_catalog"), "character varying", 1, 54);
//! assert_eq!(full, "character varying(50)[]");
//! assert_eq!(parse_type_name(&full), "character varying[]");
//!
//! let flags = trigger_definition(7);
//! assert_eq!(flags.fires, TriggerTiming::Before);
//! ```
//!
//! ## Module Organization
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `datatype` | Type classification, formatting and parsing |
//! | `rule` | Rewrite rule definition parsing |
//! | `trigger` | `tgtype` decoding |
//! | `vacuum` | Per-server autovacuum defaults cache |
//! | `schema` | Schema child visibility, schema lookups |
//! | `user_mapping` | Foreign server user mappings |
//! | `template` | Versioned SQL template resolution |
//! | `connection` | Connection abstraction and result shapes |
//! | `config` | Configuration loading |

pub mod config;
pub mod connection;
pub mod datatype;
pub mod error;
pub mod quoting;
pub mod rule;
pub mod schema;
pub mod template;
pub mod trigger;
pub mod user_mapping;
pub mod vacuum;

// Re-export commonly used types
pub use config::Config;
pub use connection::{Connection, Grid, ResultSet, Row, ServerId, ServerManager, ServerType};
pub use datatype::{get_full_type, parse_length_precision, parse_type_name, DataTypeReader};
pub use error::{ErrorResponse, SchemaError, SchemaResult};
pub use rule::{parse_rule_definition, RuleEvent, RuleProperties};
pub use template::{SqlTemplates, TemplateParams, TemplateRenderer};
pub use trigger::{trigger_definition, TriggerFlags, TriggerTiming};
pub use vacuum::{VacuumCategory, VacuumField, VacuumSettings, VacuumValue};
