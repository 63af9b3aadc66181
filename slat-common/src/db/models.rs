//! Row types shared between the service and its tests

use serde::Serialize;
use sqlx::FromRow;

/// A sentence row
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Sentence {
    pub guid: String,
    pub text: String,
    /// Global upload-order index, unique across all sentences
    pub idx: i64,
}

/// A user row (password hash deliberately excluded)
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct User {
    pub guid: String,
    pub name: String,
    pub email: String,
    pub role: String,
}

/// One batch ledger record
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchRecord {
    pub guid: String,
    pub user_id: String,
    pub batch_start: i64,
    pub batch_end: i64,
    /// NULL on legacy records that predate the column; readers fall back
    /// to `batch_end - batch_start + 1`
    pub batch_size: Option<i64>,
    pub assigned_at: String,
    pub completed: bool,
}

impl BatchRecord {
    /// Effective size of this batch, honoring the legacy fallback
    pub fn effective_size(&self) -> i64 {
        self.batch_size
            .unwrap_or(self.batch_end - self.batch_start + 1)
    }
}

/// One annotation row; `labels` is stored as a JSON array of strings
#[derive(Debug, Clone, FromRow)]
pub struct AnnotationRow {
    pub sentence_id: String,
    pub user_id: String,
    pub labels: String,
    pub created_at: String,
    pub updated_at: String,
}

impl AnnotationRow {
    /// Decode the stored labels; malformed storage yields an empty list
    pub fn labels(&self) -> Vec<String> {
        serde_json::from_str(&self.labels).unwrap_or_default()
    }
}
