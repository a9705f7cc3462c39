// src/writeback.rs
//! Persisting derived links back onto Notion records.
//!
//! A sync run stages [`PendingWriteUpdate`]s. They are either applied
//! inline right after the feed is written, or saved to a pending file that
//! a separate `apply-updates` run replays later.

use crate::api::NotionClient;
use crate::constants::RICH_TEXT_SEGMENT_LIMIT;
use crate::error::AppError;
use crate::model::PropertyKind;
use crate::output::write_json_pretty;
use crate::types::{PropertyName, RecordId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::path::Path;
use std::time::Duration;

/// A value to store in one property, tagged with the property's type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PropertyWrite {
    Url(String),
    RichText(String),
}

impl PropertyWrite {
    /// A write matching the schema type of the target property, if it is
    /// one that can hold a link.
    pub fn for_kind(kind: PropertyKind, value: impl Into<String>) -> Option<Self> {
        match kind {
            PropertyKind::Url => Some(PropertyWrite::Url(value.into())),
            PropertyKind::RichText => Some(PropertyWrite::RichText(value.into())),
            _ => None,
        }
    }

    /// The property value in Notion's PATCH format.
    pub fn to_api_value(&self) -> Value {
        match self {
            PropertyWrite::Url(url) => json!({ "url": url }),
            PropertyWrite::RichText(text) => json!({
                "rich_text": rich_text_segments(text, RICH_TEXT_SEGMENT_LIMIT)
            }),
        }
    }
}

/// Splits text into rich_text segments of at most `limit` characters.
pub fn rich_text_segments(text: &str, limit: usize) -> Vec<Value> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(limit.max(1))
        .map(|chunk| {
            let content: String = chunk.iter().collect();
            json!({ "type": "text", "text": { "content": content } })
        })
        .collect()
}

/// Property writes staged for one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingWriteUpdate {
    pub record_id: RecordId,
    pub properties: IndexMap<PropertyName, PropertyWrite>,
}

impl PendingWriteUpdate {
    pub fn new(record_id: RecordId) -> Self {
        Self {
            record_id,
            properties: IndexMap::new(),
        }
    }

    pub fn with(mut self, property: PropertyName, write: PropertyWrite) -> Self {
        self.properties.insert(property, write);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.properties.is_empty()
    }

    /// The `properties` object of a page PATCH.
    pub fn to_api_properties(&self) -> Value {
        let map: Map<String, Value> = self
            .properties
            .iter()
            .map(|(name, write)| (name.as_str().to_string(), write.to_api_value()))
            .collect();
        Value::Object(map)
    }
}

/// Outcome of replaying a batch of updates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ApplySummary {
    pub attempted: usize,
    pub updated: usize,
}

/// Applies updates one after another, logging and skipping failures.
///
/// `pacing` is slept after every successful update.
pub async fn apply_updates(
    client: &NotionClient,
    updates: &[PendingWriteUpdate],
    pacing: Duration,
    log_tag: &str,
) -> ApplySummary {
    let mut summary = ApplySummary {
        attempted: updates.len(),
        updated: 0,
    };

    for update in updates.iter().filter(|u| !u.is_empty()) {
        match client
            .update_page(&update.record_id, update.to_api_properties())
            .await
        {
            Ok(()) => {
                summary.updated += 1;
                log::debug!("[{}] Updated Notion page {}", log_tag, update.record_id);
                if !pacing.is_zero() {
                    tokio::time::sleep(pacing).await;
                }
            }
            Err(e) => {
                log::error!(
                    "[{}] Failed to update Notion page {}: {}",
                    log_tag,
                    update.record_id,
                    e
                );
            }
        }
    }

    summary
}

/// Saves updates for a later apply run. An empty batch still writes `[]`.
pub fn write_pending_file(path: &Path, updates: &[PendingWriteUpdate]) -> Result<(), AppError> {
    write_json_pretty(path, updates)?;
    Ok(())
}

/// Loads a pending file. A missing file is `None`, not an error.
pub fn read_pending_file(path: &Path) -> Result<Option<Vec<PendingWriteUpdate>>, AppError> {
    let raw = match std::fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
        Err(e) => return Err(e.into()),
    };

    let value: Value = serde_json::from_str(&raw).map_err(|source| AppError::JsonParseError {
        path: path.to_path_buf(),
        source,
    })?;
    if !value.is_array() {
        return Err(AppError::InvalidPendingFile {
            path: path.to_path_buf(),
            reason: "must be a JSON array".to_string(),
        });
    }

    let updates = serde_json::from_value(value).map_err(|source| AppError::JsonParseError {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(Some(updates))
}

/// Replays a pending file against Notion.
pub async fn apply_pending_file(
    client: &NotionClient,
    path: &Path,
    pacing: Duration,
    log_tag: &str,
) -> Result<ApplySummary, AppError> {
    let updates = read_pending_file(path)?.unwrap_or_default();
    if updates.is_empty() {
        log::info!("[{}] No pending updates. Skipping.", log_tag);
        return Ok(ApplySummary::default());
    }

    log::info!(
        "[{}] Updating {} Notion page(s)...",
        log_tag,
        updates.len()
    );
    let summary = apply_updates(client, &updates, pacing, log_tag).await;
    log::info!(
        "[{}] Updated {}/{} Notion page(s).",
        log_tag,
        summary.updated,
        summary.attempted
    );
    Ok(summary)
}
