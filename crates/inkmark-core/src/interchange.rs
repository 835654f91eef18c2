//! Single-sketch interchange records.

use crate::annotation::Stroke;
use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;

/// Import/export errors for sketch records.
#[derive(Debug, Error)]
pub enum InterchangeError {
    #[error("Invalid sketch format: {0}")]
    Format(String),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Result type for interchange operations.
pub type InterchangeResult<T> = Result<T, InterchangeError>;

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

fn new_sketch_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

/// A named stroke list with an optional thumbnail, for copy/import/export.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SketchRecord {
    #[serde(default = "new_sketch_id")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    pub strokes: Vec<Stroke>,
    /// Encoded preview image (e.g. a PNG data URL).
    #[serde(default)]
    pub thumbnail: Option<String>,
    /// Milliseconds since the Unix epoch.
    #[serde(default)]
    pub created_at: u64,
    #[serde(default)]
    pub updated_at: u64,
}

impl SketchRecord {
    pub fn new(name: impl Into<String>, strokes: Vec<Stroke>) -> Self {
        let now = now_millis();
        Self {
            id: new_sketch_id(),
            name: name.into(),
            strokes,
            thumbnail: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn with_thumbnail(mut self, thumbnail: impl Into<String>) -> Self {
        self.thumbnail = Some(thumbnail.into());
        self
    }

    /// Replace the strokes and bump `updated_at`.
    pub fn set_strokes(&mut self, strokes: Vec<Stroke>) {
        self.strokes = strokes;
        self.updated_at = now_millis().max(self.created_at);
    }

    pub fn to_json(&self) -> InterchangeResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse a record, rejecting input without a `strokes` array.
    ///
    /// Strokes are normalized as they are decoded.
    pub fn from_json(json: &str) -> InterchangeResult<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        match value.get("strokes") {
            Some(serde_json::Value::Array(_)) => {}
            Some(_) => return Err(InterchangeError::Format("`strokes` is not an array".to_string())),
            None => return Err(InterchangeError::Format("missing `strokes` field".to_string())),
        }
        Ok(serde_json::from_value(value)?)
    }
}
