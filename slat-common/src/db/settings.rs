//! Runtime settings access
//!
//! Settings live in the `settings` table as key/value text pairs, seeded
//! with defaults at init (see [`crate::db::init`]). Typed getters fall back
//! to the compiled default when a value is missing or malformed.

use crate::Result;
use sqlx::SqlitePool;
use tracing::warn;

/// Get a setting value, or None when absent
pub async fn get_setting(pool: &SqlitePool, key: &str) -> Result<Option<String>> {
    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_optional(pool)
        .await?
        .flatten();

    Ok(value)
}

/// Set a setting value (upsert)
pub async fn set_setting(pool: &SqlitePool, key: &str, value: &str) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO settings (key, value) VALUES (?, ?)
        ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(key)
    .bind(value)
    .execute(pool)
    .await?;

    Ok(())
}

/// Get an integer setting, falling back to `default` when absent or malformed
pub async fn get_setting_i64(pool: &SqlitePool, key: &str, default: i64) -> Result<i64> {
    match get_setting(pool, key).await? {
        Some(value) => match value.parse::<i64>() {
            Ok(parsed) => Ok(parsed),
            Err(_) => {
                warn!("Setting '{}' has non-integer value '{}', using default {}", key, value, default);
                Ok(default)
            }
        },
        None => Ok(default),
    }
}

/// Accepted CSV text-column header names, in priority order.
///
/// Stored as a JSON array under `csv_text_columns`. Malformed values fall
/// back to the compiled default `["sentence", "text"]`.
pub async fn csv_text_columns(pool: &SqlitePool) -> Result<Vec<String>> {
    let default = || vec!["sentence".to_string(), "text".to_string()];

    match get_setting(pool, "csv_text_columns").await? {
        Some(value) => match serde_json::from_str::<Vec<String>>(&value) {
            Ok(columns) if !columns.is_empty() => Ok(columns),
            _ => {
                warn!("Setting 'csv_text_columns' has invalid value '{}', using default", value);
                Ok(default())
            }
        },
        None => Ok(default()),
    }
}

/// Batch size used when an assignment request omits one
pub async fn default_batch_size(pool: &SqlitePool) -> Result<i64> {
    get_setting_i64(pool, "default_batch_size", 500).await
}

/// Upper bound on accepted CSV upload size, in bytes
pub async fn csv_max_upload_bytes(pool: &SqlitePool) -> Result<i64> {
    get_setting_i64(pool, "csv_max_upload_bytes", 10 * 1024 * 1024).await
}
