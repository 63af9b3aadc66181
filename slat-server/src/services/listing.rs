//! Sentence listings
//!
//! The annotator-facing listing returns every sentence inside the user's
//! incomplete batch ranges; the admin-facing detail adds the ledger,
//! progress counters, and per-sentence annotation flags.

use crate::services::progress::{self, Progress};
use serde::Serialize;
use slat_common::db::models::{BatchRecord, Sentence, User};
use slat_common::{Error, Result};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use std::collections::HashMap;

/// One annotation as exposed over the API
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnnotationView {
    pub user_id: String,
    pub labels: Vec<String>,
    pub created_at: String,
}

/// A sentence inside an assigned batch, with all annotations it carries
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignedSentence {
    pub id: String,
    pub text: String,
    pub index: i64,
    pub annotations: Vec<AnnotationView>,
}

/// Admin view of one user's assignments
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignmentDetail {
    pub user: User,
    pub batches: Vec<BatchRecord>,
    #[serde(flatten)]
    pub progress: Progress,
    pub assignments: Vec<SentenceStatus>,
}

/// A sentence owned by the user, flagged with their annotation state
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SentenceStatus {
    pub id: String,
    pub text: String,
    pub index: i64,
    pub is_annotated: bool,
}

/// Sentences inside the user's incomplete batch ranges, ordered by index.
///
/// An empty ledger yields an empty list, not an error.
pub async fn assigned_sentences(pool: &SqlitePool, user_id: &str) -> Result<Vec<AssignedSentence>> {
    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE guid = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !user_exists {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let ranges: Vec<(i64, i64)> = sqlx::query_as(
        "SELECT batch_start, batch_end FROM batch_assignments
         WHERE user_id = ? AND completed = 0",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    if ranges.is_empty() {
        return Ok(Vec::new());
    }

    let mut builder: QueryBuilder<Sqlite> =
        QueryBuilder::new("SELECT guid, text, idx FROM sentences WHERE ");
    for (i, (start, end)) in ranges.iter().enumerate() {
        if i > 0 {
            builder.push(" OR ");
        }
        builder
            .push("(idx BETWEEN ")
            .push_bind(*start)
            .push(" AND ")
            .push_bind(*end)
            .push(")");
    }
    builder.push(" ORDER BY idx ASC");

    let sentences: Vec<Sentence> = builder.build_query_as().fetch_all(pool).await?;

    let mut annotations = annotations_for(pool, sentences.iter().map(|s| &s.guid)).await?;

    Ok(sentences
        .into_iter()
        .map(|sentence| AssignedSentence {
            annotations: annotations.remove(&sentence.guid).unwrap_or_default(),
            id: sentence.guid,
            text: sentence.text,
            index: sentence.idx,
        })
        .collect())
}

/// Admin detail for one user: identity, ledger, progress, and every
/// sentence they own flagged with its annotation state.
pub async fn user_assignment_detail(pool: &SqlitePool, user_id: &str) -> Result<AssignmentDetail> {
    let user: Option<User> =
        sqlx::query_as("SELECT guid, name, email, role FROM users WHERE guid = ?")
            .bind(user_id)
            .fetch_optional(pool)
            .await?;
    let user = user.ok_or_else(|| Error::NotFound("User not found".to_string()))?;

    let batches: Vec<BatchRecord> = sqlx::query_as(
        "SELECT guid, user_id, batch_start, batch_end, batch_size, assigned_at, completed
         FROM batch_assignments WHERE user_id = ? ORDER BY assigned_at, batch_start",
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    let progress = progress::user_progress(pool, user_id).await?;

    let assignments: Vec<(String, String, i64, bool)> = sqlx::query_as(
        r#"
        SELECT s.guid, s.text, s.idx,
               EXISTS(SELECT 1 FROM annotations an
                      WHERE an.sentence_id = s.guid AND an.user_id = sa.user_id) AS is_annotated
        FROM sentences s
        JOIN sentence_assignments sa ON sa.sentence_id = s.guid
        WHERE sa.user_id = ?
        ORDER BY s.idx ASC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await?;

    Ok(AssignmentDetail {
        user,
        batches,
        progress,
        assignments: assignments
            .into_iter()
            .map(|(guid, text, idx, is_annotated)| SentenceStatus {
                id: guid,
                text,
                index: idx,
                is_annotated,
            })
            .collect(),
    })
}

/// Fetch all annotations for the given sentence ids, grouped by sentence
async fn annotations_for<'a>(
    pool: &SqlitePool,
    sentence_ids: impl Iterator<Item = &'a String>,
) -> Result<HashMap<String, Vec<AnnotationView>>> {
    let ids: Vec<&String> = sentence_ids.collect();
    if ids.is_empty() {
        return Ok(HashMap::new());
    }

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT sentence_id, user_id, labels, created_at FROM annotations WHERE sentence_id IN (",
    );
    let mut separated = builder.separated(", ");
    for id in &ids {
        separated.push_bind(id.as_str());
    }
    builder.push(")");

    let rows: Vec<(String, String, String, String)> =
        builder.build_query_as().fetch_all(pool).await?;

    let mut grouped: HashMap<String, Vec<AnnotationView>> = HashMap::new();
    for (sentence_id, user_id, labels, created_at) in rows {
        grouped.entry(sentence_id).or_default().push(AnnotationView {
            user_id,
            labels: serde_json::from_str(&labels).unwrap_or_default(),
            created_at,
        });
    }

    Ok(grouped)
}
