//! CSV sentence ingestion
//!
//! Resolves the text column by the configured header-name policy, trims and
//! de-duplicates rows, assigns indices `max(existing) + 1` onward, and
//! inserts the batch in one transaction.

use crate::services::csv_reader;
use slat_common::db::settings;
use slat_common::{Error, Result};
use sqlx::SqlitePool;
use std::collections::HashSet;
use tracing::info;
use uuid::Uuid;

/// Outcome of one CSV ingestion
#[derive(Debug, PartialEq, Eq)]
pub struct IngestReport {
    /// Sentences inserted with fresh indices
    pub inserted: usize,
    /// Rows skipped because the text already existed, in this upload or
    /// in the database
    pub skipped_duplicates: usize,
}

/// Ingest an uploaded CSV file.
///
/// The first record is the header row. The text column is the first header
/// matching the `csv_text_columns` setting (case-insensitive, in priority
/// order); when none matches, the first column is used positionally. That
/// fallback is deliberate configuration behavior, not an accident: headerless
/// single-column files ingest their first data row as a header and the rest
/// as sentences.
pub async fn ingest_csv(pool: &SqlitePool, data: &[u8]) -> Result<IngestReport> {
    let records = csv_reader::parse(data)?;
    if records.is_empty() {
        return Err(Error::InvalidInput("CSV file is empty".to_string()));
    }

    let columns = settings::csv_text_columns(pool).await?;
    let header = &records[0];
    let col_idx = resolve_text_column(header, &columns);

    // Trim, drop empties, de-duplicate within the upload (first wins)
    let mut seen: HashSet<String> = HashSet::new();
    let mut texts: Vec<String> = Vec::new();
    let mut skipped_duplicates = 0usize;
    for record in &records[1..] {
        let Some(raw) = record.get(col_idx) else { continue };
        let text = raw.trim();
        if text.is_empty() {
            continue;
        }
        if seen.insert(text.to_string()) {
            texts.push(text.to_string());
        } else {
            skipped_duplicates += 1;
        }
    }

    if texts.is_empty() {
        return Err(Error::InvalidInput("No valid rows found in CSV".to_string()));
    }

    // Drop texts already stored
    let mut to_insert: Vec<String> = Vec::new();
    for text in texts {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sentences WHERE text = ?)")
                .bind(&text)
                .fetch_one(pool)
                .await?;
        if exists {
            skipped_duplicates += 1;
        } else {
            to_insert.push(text);
        }
    }

    if to_insert.is_empty() {
        return Ok(IngestReport { inserted: 0, skipped_duplicates });
    }

    // Indices continue from the current maximum; insert is all-or-nothing
    let mut tx = pool.begin().await?;

    let mut next_idx: i64 =
        sqlx::query_scalar("SELECT COALESCE(MAX(idx), -1) + 1 FROM sentences")
            .fetch_one(&mut *tx)
            .await?;

    let inserted = to_insert.len();
    for text in &to_insert {
        sqlx::query("INSERT INTO sentences (guid, text, idx) VALUES (?, ?, ?)")
            .bind(Uuid::new_v4().to_string())
            .bind(text)
            .bind(next_idx)
            .execute(&mut *tx)
            .await?;
        next_idx += 1;
    }

    tx.commit().await?;

    info!("CSV ingested: {} sentences inserted, {} duplicates skipped", inserted, skipped_duplicates);

    Ok(IngestReport { inserted, skipped_duplicates })
}

/// Resolve the text column: configured names in priority order, else the
/// first column positionally.
fn resolve_text_column(header: &[String], accepted: &[String]) -> usize {
    for name in accepted {
        if let Some(pos) = header
            .iter()
            .position(|h| h.trim().eq_ignore_ascii_case(name))
        {
            return pos;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;
    use slat_common::db::apply_schema;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        apply_schema(&pool).await.unwrap();
        pool
    }

    async fn stored_sentences(pool: &SqlitePool) -> Vec<(String, i64)> {
        sqlx::query_as("SELECT text, idx FROM sentences ORDER BY idx")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn duplicate_within_upload_skipped() {
        let pool = setup_pool().await;

        let report = ingest_csv(&pool, b"sentence\na\nb\na\n").await.unwrap();
        assert_eq!(report, IngestReport { inserted: 2, skipped_duplicates: 1 });

        let rows = stored_sentences(&pool).await;
        assert_eq!(rows, vec![("a".to_string(), 0), ("b".to_string(), 1)]);
    }

    #[tokio::test]
    async fn indices_continue_from_existing_max() {
        let pool = setup_pool().await;

        ingest_csv(&pool, b"sentence\na\nb\n").await.unwrap();
        let report = ingest_csv(&pool, b"sentence\nb\nc\nd\n").await.unwrap();
        assert_eq!(report, IngestReport { inserted: 2, skipped_duplicates: 1 });

        let rows = stored_sentences(&pool).await;
        assert_eq!(
            rows,
            vec![
                ("a".to_string(), 0),
                ("b".to_string(), 1),
                ("c".to_string(), 2),
                ("d".to_string(), 3)
            ]
        );
    }

    #[tokio::test]
    async fn sentence_header_preferred_over_text() {
        let pool = setup_pool().await;

        ingest_csv(&pool, b"text,sentence\nwrong,right\n").await.unwrap();
        let rows = stored_sentences(&pool).await;
        assert_eq!(rows, vec![("right".to_string(), 0)]);
    }

    #[tokio::test]
    async fn unknown_headers_fall_back_to_first_column() {
        let pool = setup_pool().await;

        ingest_csv(&pool, b"phrase,source\nhello,web\n").await.unwrap();
        let rows = stored_sentences(&pool).await;
        assert_eq!(rows, vec![("hello".to_string(), 0)]);
    }

    #[tokio::test]
    async fn configured_column_policy_respected() {
        let pool = setup_pool().await;
        slat_common::db::settings::set_setting(&pool, "csv_text_columns", r#"["phrase"]"#)
            .await
            .unwrap();

        ingest_csv(&pool, b"sentence,phrase\nwrong,right\n").await.unwrap();
        let rows = stored_sentences(&pool).await;
        assert_eq!(rows, vec![("right".to_string(), 0)]);
    }

    #[tokio::test]
    async fn whitespace_only_rows_skipped() {
        let pool = setup_pool().await;

        let err = ingest_csv(&pool, b"sentence\n   \n\t\n").await.unwrap_err();
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    #[tokio::test]
    async fn values_are_trimmed() {
        let pool = setup_pool().await;

        ingest_csv(&pool, b"sentence\n  padded  \n").await.unwrap();
        let rows = stored_sentences(&pool).await;
        assert_eq!(rows, vec![("padded".to_string(), 0)]);
    }
}
