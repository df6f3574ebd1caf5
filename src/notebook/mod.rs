//! Notebook document model
//!
//! A lenient nbformat-4 representation: the fields the core reasons about are
//! typed, everything else round-trips through `extra` maps untouched. Any JSON
//! object loads. A known key whose value has the wrong shape (`"cells": {}`,
//! `"nbformat": "4"`) is kept verbatim in `extra` and written back as found, so
//! an invalid document can still be shown and fixed. Structural checks live in
//! [`validate`].

pub mod validate;

pub use validate::{validate, Violation};

use crate::error::ContentsError;
use serde::de::{self, Deserializer};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use std::borrow::Cow;

/// Major nbformat version this crate writes
pub const NBFORMAT: u32 = 4;
/// Minor nbformat version for new notebooks
pub const NBFORMAT_MINOR: u32 = 5;

/// Cell metadata key carrying the in-memory trust flag
pub const TRUSTED_KEY: &str = "trusted";

/// Notebook document
///
/// `extra` holds unknown keys and any known key whose value could not be
/// typed. An `extra` entry wins over the typed field of the same name when
/// the document is serialized.
#[derive(Debug, Clone, PartialEq)]
pub struct Notebook {
    pub cells: Vec<Cell>,
    pub metadata: Map<String, Value>,
    pub nbformat: u32,
    pub nbformat_minor: u32,
    pub extra: Map<String, Value>,
}

/// Cell source: nbformat allows a string or a list of line strings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Source {
    Text(String),
    Lines(Vec<String>),
    /// Anything else, kept as found
    Other(Value),
}

impl Default for Source {
    fn default() -> Self {
        Source::Text(String::new())
    }
}

impl Source {
    fn from_value(value: Value) -> Self {
        match value {
            Value::String(s) => Source::Text(s),
            Value::Array(items) if items.iter().all(Value::is_string) => Source::Lines(
                items
                    .into_iter()
                    .filter_map(|item| match item {
                        Value::String(s) => Some(s),
                        _ => None,
                    })
                    .collect(),
            ),
            other => Source::Other(other),
        }
    }

    fn to_value(&self) -> Value {
        match self {
            Source::Text(s) => Value::String(s.clone()),
            Source::Lines(lines) => Value::from(lines.clone()),
            Source::Other(value) => value.clone(),
        }
    }

    /// Source as one string regardless of representation
    ///
    /// A malformed source reads as its JSON text.
    pub fn text(&self) -> Cow<'_, str> {
        match self {
            Source::Text(s) => Cow::Borrowed(s),
            Source::Lines(lines) => Cow::Owned(lines.concat()),
            Source::Other(value) => Cow::Owned(value.to_string()),
        }
    }
}

impl From<&str> for Source {
    fn from(s: &str) -> Self {
        Source::Text(s.to_string())
    }
}

/// A single notebook cell
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    /// Empty when the document has no usable `cell_type`
    pub cell_type: String,
    pub source: Source,
    pub metadata: Map<String, Value>,
    /// `outputs`, `execution_count`, `id`, `attachments`, ...
    pub extra: Map<String, Value>,
}

/// Remove `key` from `map`; keep it when `parse` accepts it, else park the raw
/// value in `extra`
fn take_field<T>(
    map: &mut Map<String, Value>,
    extra: &mut Map<String, Value>,
    key: &str,
    parse: impl FnOnce(Value) -> Result<T, Value>,
) -> Option<T> {
    let value = map.remove(key)?;
    match parse(value) {
        Ok(typed) => Some(typed),
        Err(raw) => {
            extra.insert(key.to_string(), raw);
            None
        }
    }
}

fn as_object(value: Value) -> Result<Map<String, Value>, Value> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(other),
    }
}

fn as_string(value: Value) -> Result<String, Value> {
    match value {
        Value::String(s) => Ok(s),
        other => Err(other),
    }
}

fn as_u32(value: Value) -> Result<u32, Value> {
    match value.as_u64().and_then(|n| u32::try_from(n).ok()) {
        Some(n) => Ok(n),
        None => Err(value),
    }
}

fn as_cells(value: Value) -> Result<Vec<Cell>, Value> {
    match value {
        Value::Array(items) if items.iter().all(Value::is_object) => Ok(items
            .into_iter()
            .filter_map(|item| match item {
                Value::Object(map) => Some(Cell::from_map(map)),
                _ => None,
            })
            .collect()),
        other => Err(other),
    }
}

impl Cell {
    pub fn code(source: &str) -> Self {
        let mut extra = Map::new();
        extra.insert("outputs".to_string(), Value::Array(Vec::new()));
        extra.insert("execution_count".to_string(), Value::Null);
        Self {
            cell_type: "code".to_string(),
            source: source.into(),
            metadata: Map::new(),
            extra,
        }
    }

    pub fn markdown(source: &str) -> Self {
        Self {
            cell_type: "markdown".to_string(),
            source: source.into(),
            metadata: Map::new(),
            extra: Map::new(),
        }
    }

    fn from_map(mut map: Map<String, Value>) -> Self {
        let mut extra = Map::new();
        let cell_type = take_field(&mut map, &mut extra, "cell_type", as_string).unwrap_or_default();
        let source = map.remove("source").map(Source::from_value).unwrap_or_default();
        let metadata = take_field(&mut map, &mut extra, "metadata", as_object).unwrap_or_default();
        extra.extend(map);
        Self {
            cell_type,
            source,
            metadata,
            extra,
        }
    }

    fn to_map(&self) -> Map<String, Value> {
        let mut map = self.extra.clone();
        if !self.cell_type.is_empty() {
            map.entry("cell_type")
                .or_insert_with(|| Value::String(self.cell_type.clone()));
        }
        map.entry("source").or_insert_with(|| self.source.to_value());
        map.entry("metadata")
            .or_insert_with(|| Value::Object(self.metadata.clone()));
        map
    }

    pub fn is_code(&self) -> bool {
        self.cell_type == "code"
    }

    pub fn outputs(&self) -> Option<&Vec<Value>> {
        self.extra.get("outputs").and_then(Value::as_array)
    }

    pub fn is_trusted(&self) -> bool {
        matches!(self.metadata.get(TRUSTED_KEY), Some(Value::Bool(true)))
    }

    pub fn set_trusted(&mut self, trusted: bool) {
        self.metadata
            .insert(TRUSTED_KEY.to_string(), Value::Bool(trusted));
    }
}

impl Serialize for Cell {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Cell {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Value::deserialize(deserializer)? {
            Value::Object(map) => Ok(Cell::from_map(map)),
            _ => Err(de::Error::custom("cell must be a JSON object")),
        }
    }
}

impl Serialize for Notebook {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Notebook {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Notebook::from_value(Value::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

impl Default for Notebook {
    fn default() -> Self {
        Self::new()
    }
}

impl Notebook {
    /// Empty nbformat-4 notebook
    pub fn new() -> Self {
        Self {
            cells: Vec::new(),
            metadata: Map::new(),
            nbformat: NBFORMAT,
            nbformat_minor: NBFORMAT_MINOR,
            extra: Map::new(),
        }
    }

    pub fn with_cells(cells: Vec<Cell>) -> Self {
        Self {
            cells,
            ..Self::new()
        }
    }

    pub fn code_cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.iter().filter(|c| c.is_code())
    }

    pub fn code_cells_mut(&mut self) -> impl Iterator<Item = &mut Cell> {
        self.cells.iter_mut().filter(|c| c.is_code())
    }

    /// Remove in-memory trust flags before persisting
    pub fn strip_transient(&mut self) {
        for cell in &mut self.cells {
            cell.metadata.remove(TRUSTED_KEY);
        }
    }

    /// Read any JSON object; only a non-object is unreadable
    pub fn from_value(value: Value) -> Result<Self, ContentsError> {
        let Value::Object(mut map) = value else {
            return Err(ContentsError::InvalidContent(
                "Unreadable notebook: not a JSON object".to_string(),
            ));
        };
        let mut extra = Map::new();
        let cells = take_field(&mut map, &mut extra, "cells", as_cells).unwrap_or_default();
        let metadata = take_field(&mut map, &mut extra, "metadata", as_object).unwrap_or_default();
        let nbformat = take_field(&mut map, &mut extra, "nbformat", as_u32).unwrap_or(NBFORMAT);
        let nbformat_minor =
            take_field(&mut map, &mut extra, "nbformat_minor", as_u32).unwrap_or_default();
        extra.extend(map);
        Ok(Self {
            cells,
            metadata,
            nbformat,
            nbformat_minor,
            extra,
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, ContentsError> {
        let value: Value = serde_json::from_slice(bytes)
            .map_err(|e| ContentsError::InvalidContent(format!("Unreadable notebook: {}", e)))?;
        Self::from_value(value)
    }

    /// The document as JSON, including in-memory trust flags
    pub fn to_value(&self) -> Value {
        let mut map = self.extra.clone();
        map.entry("cells").or_insert_with(|| {
            Value::Array(self.cells.iter().map(|c| Value::Object(c.to_map())).collect())
        });
        map.entry("metadata")
            .or_insert_with(|| Value::Object(self.metadata.clone()));
        map.entry("nbformat")
            .or_insert_with(|| Value::from(self.nbformat));
        map.entry("nbformat_minor")
            .or_insert_with(|| Value::from(self.nbformat_minor));
        Value::Object(map)
    }

    /// On-disk encoding: one-space indented JSON, trust flags stripped, trailing newline
    pub fn to_persisted_bytes(&self) -> Result<Vec<u8>, ContentsError> {
        let mut clean = self.clone();
        clean.strip_transient();
        let mut out = Vec::new();
        let formatter = serde_json::ser::PrettyFormatter::with_indent(b" ");
        let mut ser = serde_json::Serializer::with_formatter(&mut out, formatter);
        clean
            .to_value()
            .serialize(&mut ser)
            .map_err(|e| ContentsError::InvalidContent(e.to_string()))?;
        out.push(b'\n');
        Ok(out)
    }
}
