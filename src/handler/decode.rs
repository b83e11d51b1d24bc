//! Request body decoding
//!
//! Picks JSON or CSV decoding from the `Content-Type` header. A body that
//! fails to decode is reported as absent rather than as an error; handlers
//! treat an absent body like an empty one.

use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::logger;
use crate::store::NewTask;

/// Decoded request body
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskPayload {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    /// Present for bulk inserts
    #[serde(default)]
    pub tasks: Option<Vec<TaskDraft>>,
}

/// One record of a bulk insert
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct TaskDraft {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl TaskDraft {
    /// Missing timestamps default to `now`
    pub fn into_new_task(self, now: DateTime<Utc>) -> NewTask {
        NewTask {
            title: self.title,
            description: self.description,
            completed_at: self.completed_at,
            created_at: self.created_at.unwrap_or(now),
            updated_at: self.updated_at.unwrap_or(now),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BodyFormat {
    Json,
    /// Raw CSV, sent as `multipart/form-data` or `text/csv`
    Csv,
}

impl BodyFormat {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let media_type = content_type
            .and_then(|ct| ct.split(';').next())
            .map(|ct| ct.trim().to_ascii_lowercase());

        match media_type.as_deref() {
            Some("multipart/form-data" | "text/csv") => Self::Csv,
            _ => Self::Json,
        }
    }
}

/// Decode `body` according to `format`; `None` when it cannot be decoded
pub fn decode_body(format: BodyFormat, body: &[u8], now: DateTime<Utc>) -> Option<TaskPayload> {
    match format {
        BodyFormat::Json => decode_json(body),
        BodyFormat::Csv => decode_csv(body, now),
    }
}

fn decode_json(body: &[u8]) -> Option<TaskPayload> {
    if body.is_empty() {
        return None;
    }
    match serde_json::from_slice(body) {
        Ok(payload) => Some(payload),
        Err(e) => {
            logger::log_debug(&format!("[Decode] Ignoring malformed JSON body: {e}"));
            None
        }
    }
}

/// Header row is skipped; columns are `title,description`
fn decode_csv(body: &[u8], now: DateTime<Utc>) -> Option<TaskPayload> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(body);

    let mut tasks = Vec::new();
    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                logger::log_debug(&format!("[Decode] Ignoring malformed CSV body: {e}"));
                return None;
            }
        };
        tasks.push(TaskDraft {
            title: record.get(0).unwrap_or_default().to_string(),
            description: record.get(1).unwrap_or_default().to_string(),
            completed_at: None,
            created_at: Some(now),
            updated_at: Some(now),
        });
    }

    Some(TaskPayload {
        tasks: Some(tasks),
        ..TaskPayload::default()
    })
}
