//! Model types exchanged with callers
//!
//! [`Model`] is what the manager hands back; [`ModelRequest`] is what a caller
//! supplies for writes. Requests stay loosely typed (`type` is a string, content
//! is raw JSON) because they arrive from the transport layer unchecked.

use crate::error::ContentsError;
use crate::notebook::Notebook;
use crate::path::ApiPath;
use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Kind of addressable entity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Notebook,
    File,
    Directory,
}

impl ContentKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContentKind::Notebook => "notebook",
            ContentKind::File => "file",
            ContentKind::Directory => "directory",
        }
    }
}

impl fmt::Display for ContentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ContentKind {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "notebook" => Ok(ContentKind::Notebook),
            "file" => Ok(ContentKind::File),
            "directory" => Ok(ContentKind::Directory),
            other => Err(ContentsError::InvalidModelType(other.to_string())),
        }
    }
}

/// Encoding of `content`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Json,
    Text,
    Base64,
}

impl FromStr for Format {
    type Err = ContentsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "json" => Ok(Format::Json),
            "text" => Ok(Format::Text),
            "base64" => Ok(Format::Base64),
            other => Err(ContentsError::InvalidContent(format!(
                "unknown format {:?}",
                other
            ))),
        }
    }
}

/// Payload of a model with content
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Content {
    Notebook(Notebook),
    /// Text, or base64 when the model's format says so
    Text(String),
    Directory(Vec<Model>),
}

/// Canonical description of a file, directory or notebook
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Model {
    pub name: String,
    pub path: ApiPath,
    #[serde(rename = "type")]
    pub kind: ContentKind,
    pub content: Option<Content>,
    pub format: Option<Format>,
    pub mimetype: Option<String>,
    pub created: DateTime<Utc>,
    pub last_modified: DateTime<Utc>,
    pub writable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl Model {
    pub fn notebook(&self) -> Option<&Notebook> {
        match &self.content {
            Some(Content::Notebook(nb)) => Some(nb),
            _ => None,
        }
    }

    pub fn text(&self) -> Option<&str> {
        match &self.content {
            Some(Content::Text(text)) => Some(text),
            _ => None,
        }
    }

    pub fn children(&self) -> Option<&[Model]> {
        match &self.content {
            Some(Content::Directory(children)) => Some(children),
            _ => None,
        }
    }
}

/// Caller-supplied model for save/create/update
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<String>,
    /// Target path; used by `update` to rename
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl ModelRequest {
    pub fn notebook(nb: &Notebook) -> Result<Self, ContentsError> {
        let content = serde_json::to_value(nb)
            .map_err(|e| ContentsError::InvalidContent(e.to_string()))?;
        Ok(Self {
            kind: Some(ContentKind::Notebook.as_str().to_string()),
            content: Some(content),
            format: Some("json".to_string()),
            path: None,
        })
    }

    pub fn text(text: impl Into<String>) -> Self {
        Self {
            kind: Some(ContentKind::File.as_str().to_string()),
            content: Some(Value::String(text.into())),
            format: Some("text".to_string()),
            path: None,
        }
    }

    pub fn binary(bytes: &[u8]) -> Self {
        Self {
            kind: Some(ContentKind::File.as_str().to_string()),
            content: Some(Value::String(BASE64.encode(bytes))),
            format: Some("base64".to_string()),
            path: None,
        }
    }

    pub fn directory() -> Self {
        Self {
            kind: Some(ContentKind::Directory.as_str().to_string()),
            ..Self::default()
        }
    }

    pub fn rename(to: impl Into<String>) -> Self {
        Self {
            path: Some(to.into()),
            ..Self::default()
        }
    }

    /// Parsed `type`, or `InvalidModelType` when missing or unknown
    pub fn kind(&self) -> Result<ContentKind, ContentsError> {
        match &self.kind {
            Some(kind) => kind.parse(),
            None => Err(ContentsError::InvalidModelType(String::new())),
        }
    }
}

impl TryFrom<Model> for ModelRequest {
    type Error = ContentsError;

    fn try_from(model: Model) -> Result<Self, Self::Error> {
        let content = match model.content {
            Some(Content::Notebook(nb)) => Some(
                serde_json::to_value(&nb)
                    .map_err(|e| ContentsError::InvalidContent(e.to_string()))?,
            ),
            Some(Content::Text(text)) => Some(Value::String(text)),
            Some(Content::Directory(_)) | None => None,
        };
        let format = model.format.map(|f| match f {
            Format::Json => "json".to_string(),
            Format::Text => "text".to_string(),
            Format::Base64 => "base64".to_string(),
        });
        Ok(Self {
            kind: Some(model.kind.as_str().to_string()),
            content,
            format,
            path: None,
        })
    }
}
