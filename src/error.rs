//! Error Types
//!
//! Every fallible helper in the crate returns [`SchemaResult`]. Route handlers
//! turn a [`SchemaError`] into the JSON envelope the front end expects with
//! [`SchemaError::to_response`].

use serde::{Deserialize, Serialize};
use std::io;
use thiserror::Error;

/// Catalog helper errors
#[derive(Error, Debug)]
pub enum SchemaError {
    /// Query failed on the server
    #[error("Database error: {0}")]
    Database(String),

    /// No matching catalog row
    #[error("Not found: {0}")]
    NotFound(String),

    /// Extraction from definition text failed
    #[error("Parse error: {0}")]
    Parse(String),

    /// Unrecognized type, category or version combination
    #[error("Unexpected input: {0}")]
    UnexpectedInput(String),

    /// Template could not be resolved or rendered
    #[error("Template '{path}': {reason}")]
    Template { path: String, reason: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for catalog helper operations
pub type SchemaResult<T> = Result<T, SchemaError>;

impl SchemaError {
    pub fn template(path: impl Into<String>, reason: impl Into<String>) -> Self {
        SchemaError::Template {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// HTTP status the error maps to
    pub fn status(&self) -> u16 {
        match self {
            SchemaError::NotFound(_) => 410,
            _ => 500,
        }
    }

    /// Build the error envelope returned to the client.
    ///
    /// The message carries the inner text only, without the variant prefix.
    pub fn to_response(&self) -> ErrorResponse {
        let errormsg = match self {
            SchemaError::Database(msg)
            | SchemaError::NotFound(msg)
            | SchemaError::Parse(msg)
            | SchemaError::UnexpectedInput(msg) => msg.clone(),
            other => other.to_string(),
        };
        ErrorResponse {
            success: 0,
            errormsg,
            status: self.status(),
        }
    }
}

/// JSON error envelope
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: u8,
    pub errormsg: String,
    pub status: u16,
}
