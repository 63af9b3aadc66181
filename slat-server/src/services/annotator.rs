//! Annotation recording
//!
//! Exactly one annotation per user per sentence: an upsert keyed by
//! (sentence_id, user_id) that replaces `labels` in place and preserves
//! the original `created_at`.

use slat_common::{Error, Result};
use sqlx::SqlitePool;

/// Record or replace one user's annotation on a sentence.
///
/// `labels` may be empty; clearing out a previous annotation's labels is
/// a legitimate edit.
pub async fn annotate(
    pool: &SqlitePool,
    sentence_id: &str,
    user_id: &str,
    labels: &[String],
) -> Result<()> {
    let sentence_exists: bool =
        sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM sentences WHERE guid = ?)")
            .bind(sentence_id)
            .fetch_one(pool)
            .await?;
    if !sentence_exists {
        return Err(Error::NotFound("Sentence not found".to_string()));
    }

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE guid = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !user_exists {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let labels_json = serde_json::to_string(labels)
        .map_err(|e| Error::Internal(format!("Failed to encode labels: {}", e)))?;

    sqlx::query(
        r#"
        INSERT INTO annotations (sentence_id, user_id, labels)
        VALUES (?, ?, ?)
        ON CONFLICT(sentence_id, user_id)
        DO UPDATE SET labels = excluded.labels, updated_at = CURRENT_TIMESTAMP
        "#,
    )
    .bind(sentence_id)
    .bind(user_id)
    .bind(&labels_json)
    .execute(pool)
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use slat_common::db::apply_schema;
    use slat_common::db::models::AnnotationRow;

    async fn setup_pool() -> SqlitePool {
        let pool = SqlitePool::connect(":memory:").await.unwrap();
        apply_schema(&pool).await.unwrap();

        sqlx::query("INSERT INTO users (guid, email) VALUES ('u1', 'u1@example.com')")
            .execute(&pool)
            .await
            .unwrap();
        sqlx::query("INSERT INTO sentences (guid, text, idx) VALUES ('s1', 'hello', 0)")
            .execute(&pool)
            .await
            .unwrap();

        pool
    }

    async fn annotation_rows(pool: &SqlitePool) -> Vec<AnnotationRow> {
        sqlx::query_as("SELECT sentence_id, user_id, labels, created_at, updated_at FROM annotations")
            .fetch_all(pool)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn second_annotation_replaces_labels_in_place() {
        let pool = setup_pool().await;

        annotate(&pool, "s1", "u1", &["positive".to_string()]).await.unwrap();
        let first = annotation_rows(&pool).await;
        assert_eq!(first.len(), 1);
        let original_created_at = first[0].created_at.clone();

        annotate(&pool, "s1", "u1", &["negative".to_string(), "irony".to_string()])
            .await
            .unwrap();
        let second = annotation_rows(&pool).await;
        assert_eq!(second.len(), 1);
        assert_eq!(second[0].labels(), vec!["negative", "irony"]);
        assert_eq!(second[0].created_at, original_created_at);
    }

    #[tokio::test]
    async fn empty_labels_accepted() {
        let pool = setup_pool().await;

        annotate(&pool, "s1", "u1", &[]).await.unwrap();
        let rows = annotation_rows(&pool).await;
        assert_eq!(rows.len(), 1);
        assert!(rows[0].labels().is_empty());
    }

    #[tokio::test]
    async fn missing_sentence_rejected() {
        let pool = setup_pool().await;
        let err = annotate(&pool, "ghost", "u1", &[]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }

    #[tokio::test]
    async fn missing_user_rejected() {
        let pool = setup_pool().await;
        let err = annotate(&pool, "s1", "ghost", &[]).await.unwrap_err();
        assert!(matches!(err, Error::NotFound(_)));
    }
}
