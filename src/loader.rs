//! Route loader: tolerant ingestion of route documents.
//!
//! Three input shapes are accepted:
//! - a single route object
//! - a JSON list of route objects (non-object entries are dropped)
//! - JSON Lines, one route object per line
//!
//! In [`InputFormat::Auto`] mode the line-delimited shape is detected
//! heuristically: the trimmed text must contain a newline and start with `{`,
//! and every non-blank line must parse as an object. Otherwise the whole text
//! is parsed as one document.
//!
//! Parsing has no nesting limit: each tree level costs two JSON levels (the
//! node object and its `children` list), and deep routes are valid input.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::LoadError;
use crate::route::RouteTree;

/// How the input text should be interpreted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InputFormat {
    /// Detect JSON Lines heuristically, fall back to a whole document.
    #[default]
    Auto,
    /// Always parse the whole text as one JSON document.
    Json,
    /// Always parse one route object per non-blank line.
    Jsonl,
}

impl fmt::Display for InputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputFormat::Auto => write!(f, "auto"),
            InputFormat::Json => write!(f, "json"),
            InputFormat::Jsonl => write!(f, "jsonl"),
        }
    }
}

impl FromStr for InputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "auto" => Ok(InputFormat::Auto),
            "json" => Ok(InputFormat::Json),
            "jsonl" | "ndjson" | "jsonlines" => Ok(InputFormat::Jsonl),
            other => Err(format!(
                "unknown input format \"{other}\" (expected auto, json or jsonl)"
            )),
        }
    }
}

/// Parse route trees from raw text, preserving input order.
///
/// Empty or all-whitespace input yields an empty list; deciding whether that
/// is fatal is left to the caller.
pub fn load_routes(text: &str, format: InputFormat) -> Result<Vec<RouteTree>, LoadError> {
    let raw = text.trim();
    if raw.is_empty() {
        return Ok(Vec::new());
    }

    let objects = match format {
        InputFormat::Auto => match try_json_lines(raw) {
            Some(objects) => {
                tracing::debug!(routes = objects.len(), "detected JSON Lines input");
                objects
            }
            None => parse_document(raw)?,
        },
        InputFormat::Json => parse_document(raw)?,
        InputFormat::Jsonl => parse_json_lines(text)?,
    };

    Ok(objects.iter().map(RouteTree::from_object).collect())
}

/// Read a file and parse its routes.
pub fn load_routes_from_path(path: &Path, format: InputFormat) -> Result<Vec<RouteTree>, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Read {
        path: path.display().to_string(),
        source: e,
    })?;
    load_routes(&text, format)
}

/// Heuristic JSON Lines parse; `None` means "not JSON Lines, try a document".
fn try_json_lines(raw: &str) -> Option<Vec<Map<String, Value>>> {
    if !raw.contains('\n') || !raw.starts_with('{') {
        return None;
    }

    let mut objects = Vec::new();
    for (idx, line) in raw.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        match parse_value(line) {
            Ok(Value::Object(obj)) => objects.push(obj),
            Ok(_) | Err(_) => {
                tracing::debug!(
                    line = idx + 1,
                    "input looks line-delimited but a line is not a JSON object, \
                     parsing as a single document"
                );
                return None;
            }
        }
    }
    Some(objects)
}

/// Strict JSON Lines parse: every non-blank line must be a route object.
fn parse_json_lines(text: &str) -> Result<Vec<Map<String, Value>>, LoadError> {
    let mut objects = Vec::new();
    for (idx, line) in text.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let value = parse_value(line).map_err(|e| LoadError::Parse {
            message: e.to_string(),
            line: idx + 1,
            column: e.column(),
        })?;
        match value {
            Value::Object(obj) => objects.push(obj),
            other => {
                return Err(LoadError::UnsupportedShape {
                    found: format!("{} on line {}", describe(&other), idx + 1),
                });
            }
        }
    }
    Ok(objects)
}

/// Parse the whole text as one document: an object or a list of objects.
fn parse_document(raw: &str) -> Result<Vec<Map<String, Value>>, LoadError> {
    let value = parse_value(raw).map_err(|e| LoadError::Parse {
        message: e.to_string(),
        line: e.line(),
        column: e.column(),
    })?;

    match value {
        Value::Object(obj) => {
            tracing::debug!("detected single route object");
            Ok(vec![obj])
        }
        Value::Array(items) => {
            let total = items.len();
            let objects: Vec<_> = items
                .into_iter()
                .filter_map(|item| match item {
                    Value::Object(obj) => Some(obj),
                    _ => None,
                })
                .collect();
            tracing::debug!(
                routes = objects.len(),
                dropped = total - objects.len(),
                "detected route list"
            );
            Ok(objects)
        }
        other => Err(LoadError::UnsupportedShape {
            found: describe(&other).to_string(),
        }),
    }
}

/// Parse one JSON value without serde_json's recursion limit, growing the
/// stack on demand while descending into nested values.
fn parse_value(text: &str) -> Result<Value, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_str(text);
    de.disable_recursion_limit();
    let value = Value::deserialize(serde_stacker::Deserializer::new(&mut de))?;
    de.end()?;
    Ok(value)
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "an object",
    }
}
