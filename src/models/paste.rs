use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio_postgres::Row;

use crate::error::StoreError;

/// A stored paste and its expiry metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Paste {
    /// The public identifier of the paste.
    pub id: String,
    /// The pasted text.
    pub content: String,
    /// When the paste was created.
    pub created_at: DateTime<Utc>,
    /// The time-to-live requested at creation, if any.
    pub ttl_seconds: Option<i64>,
    /// `created_at + ttl_seconds`, fixed at creation.
    pub expires_at: Option<DateTime<Utc>>,
    /// The view limit requested at creation, if any.
    pub max_views: Option<i32>,
    /// Views left before the paste is exhausted. `None` means unlimited.
    pub remaining_views: Option<i32>,
}

impl TryFrom<&Row> for Paste {
    type Error = StoreError;

    fn try_from(row: &Row) -> Result<Self, Self::Error> {
        let id: String = row.try_get("id").map_err(|e| StoreError::Corrupt {
            id: "<unknown>".to_string(),
            reason: e.to_string(),
        })?;
        let corrupt = |e: tokio_postgres::Error| StoreError::Corrupt {
            id: id.clone(),
            reason: e.to_string(),
        };

        Ok(Self {
            content: row.try_get("content").map_err(corrupt)?,
            created_at: row.try_get("created_at").map_err(corrupt)?,
            ttl_seconds: row.try_get("ttl_seconds").map_err(corrupt)?,
            expires_at: row.try_get("expires_at").map_err(corrupt)?,
            max_views: row.try_get("max_views").map_err(corrupt)?,
            remaining_views: row.try_get("remaining_views").map_err(corrupt)?,
            id,
        })
    }
}

/// Validated input for a new paste.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasteDraft {
    pub content: String,
    pub ttl_seconds: Option<i64>,
    pub max_views: Option<i32>,
}

/// The outcome of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedPaste {
    pub id: String,
    pub expires_at: Option<DateTime<Utc>>,
}

/// What a reader receives for one granted view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PasteView {
    pub content: String,
    pub remaining_views: Option<i32>,
    pub expires_at: Option<DateTime<Utc>>,
}
