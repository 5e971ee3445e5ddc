//! Versioned SQL Templates
//!
//! SQL and JSON snippets live in a directory tree. A path segment of the
//! form `#<server_version_num>#` is resolved against sibling directories
//! named `<major>[.<minor>]_plus` or `default`:
//!
//! ```text
//! templates/schemas/pg/
//!     default/sql/nodes.sql
//!     9.6_plus/sql/nodes.sql
//!     12_plus/sql/nodes.sql
//! ```
//!
//! `schemas/pg/#140005#/sql/nodes.sql` picks `12_plus`, `#100000#` picks
//! `9.6_plus`, `#90500#` falls back to `default`. Only directories that
//! actually contain the requested file are considered.
//!
//! ## Syntax
//!
//! - `{{ name }}` is replaced with the parameter value (empty when unset)
//! - `{% if name %}...{% else %}...{% endif %}` keeps one branch; `if not`
//!   is accepted and blocks do not nest

use crate::connection::value_is_truthy;
use crate::error::{SchemaError, SchemaResult};
use regex::{Captures, Regex};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

static VERSION_SEGMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^#(\d+)#$").expect("valid regex"));
static PLUS_DIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d+)(?:\.(\d+))?_plus$").expect("valid regex"));
static IF_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?s)\{%-?\s*if\s+(not\s+)?(\w+)\s*-?%\}(.*?)(?:\{%-?\s*else\s*-?%\}(.*?))?\{%-?\s*endif\s*-?%\}",
    )
    .expect("valid regex")
});
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*(\w+)\s*\}\}").expect("valid regex"));

/// Named template parameters
#[derive(Debug, Clone, Default)]
pub struct TemplateParams {
    values: BTreeMap<String, Value>,
}

impl TemplateParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.values.insert(name.to_string(), value.into());
        self
    }

    pub fn set(&mut self, name: &str, value: impl Into<Value>) {
        self.values.insert(name.to_string(), value.into());
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    fn is_truthy(&self, name: &str) -> bool {
        self.values.get(name).is_some_and(value_is_truthy)
    }

    fn display(&self, name: &str) -> String {
        match self.values.get(name) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(Value::Bool(b)) => if *b { "True" } else { "False" }.to_string(),
            Some(other) => other.to_string(),
        }
    }
}

/// Resolves a logical template path to rendered text
pub trait TemplateRenderer: Send + Sync {
    fn render(&self, path: &str, params: &TemplateParams) -> SchemaResult<String>;
}

/// File-backed templates rooted at one directory
#[derive(Debug, Clone)]
pub struct SqlTemplates {
    root: PathBuf,
}

impl SqlTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        SqlTemplates { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Map a logical path to the file that serves it
    pub fn resolve(&self, path: &str) -> SchemaResult<PathBuf> {
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

        let Some(pos) = segments.iter().position(|s| VERSION_SEGMENT.is_match(s)) else {
            let file = self.root.join(segments.join("/"));
            return if file.is_file() {
                Ok(file)
            } else {
                Err(SchemaError::template(path, "template not found"))
            };
        };

        let version: u32 = segments[pos]
            .trim_matches('#')
            .parse()
            .map_err(|_| SchemaError::template(path, "invalid server version"))?;
        let base = self.root.join(segments[..pos].join("/"));
        let rest = segments[pos + 1..].join("/");

        for dir in Self::version_dirs(&base, version)? {
            let candidate = base.join(&dir).join(&rest);
            if candidate.is_file() {
                tracing::debug!(path, resolved = %candidate.display(), "template_resolved");
                return Ok(candidate);
            }
        }

        Err(SchemaError::template(
            path,
            format!("no template for server version {version}"),
        ))
    }

    /// Eligible version directories, best match first, `default` last
    fn version_dirs(base: &Path, version: u32) -> SchemaResult<Vec<String>> {
        let mut plus: Vec<(u32, String)> = Vec::new();
        let mut has_default = false;

        let entries = match fs::read_dir(base) {
            Ok(entries) => entries,
            Err(_) => return Ok(Vec::new()),
        };

        for entry in entries {
            let entry = entry?;
            if !entry.file_type()?.is_dir() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            if name == "default" {
                has_default = true;
            } else if let Some(min) = plus_dir_version(&name) {
                if min <= version {
                    plus.push((min, name));
                }
            }
        }

        plus.sort_by(|a, b| b.0.cmp(&a.0));
        let mut dirs: Vec<String> = plus.into_iter().map(|(_, name)| name).collect();
        if has_default {
            dirs.push("default".to_string());
        }
        Ok(dirs)
    }
}

impl TemplateRenderer for SqlTemplates {
    fn render(&self, path: &str, params: &TemplateParams) -> SchemaResult<String> {
        let file = self.resolve(path)?;
        let source = fs::read_to_string(&file)?;
        Ok(render_str(&source, params))
    }
}

/// Minimum server version served by a `<major>[.<minor>]_plus` directory.
///
/// Names whose version does not fit `server_version_num` (minor of 100 or
/// more, or overflowing `u32`) are not version directories.
pub fn plus_dir_version(name: &str) -> Option<u32> {
    let caps = PLUS_DIR.captures(name)?;
    let major: u32 = caps[1].parse().ok()?;
    let minor: u32 = caps
        .get(2)
        .map_or(Some(0), |m| m.as_str().parse().ok())?;
    if minor >= 100 {
        return None;
    }
    major.checked_mul(10_000)?.checked_add(minor * 100)
}

/// Render template text with the given parameters
pub fn render_str(source: &str, params: &TemplateParams) -> String {
    let branched = IF_BLOCK.replace_all(source, |caps: &Captures| {
        let negate = caps.get(1).is_some();
        let truthy = params.is_truthy(&caps[2]);
        let keep = if truthy != negate {
            caps.get(3)
        } else {
            caps.get(4)
        };
        keep.map_or(String::new(), |m| m.as_str().to_string())
    });

    PLACEHOLDER
        .replace_all(&branched, |caps: &Captures| params.display(&caps[1]))
        .into_owned()
}
