//! Progress aggregation
//!
//! `totalAssigned` comes from the batch ledger (sum of batch sizes, with
//! the range-width fallback for legacy records); `annotated` counts
//! sentences where the user is both an assignee and has an annotation.

use serde::Serialize;
use slat_common::{Error, Result};
use sqlx::SqlitePool;

/// Progress counters for one user
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub total_assigned: i64,
    pub annotated: i64,
    pub progress_percentage: i64,
}

/// Per-user progress entry for the all-users report
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProgress {
    pub user_id: String,
    pub user_name: String,
    pub user_email: String,
    #[serde(flatten)]
    pub progress: Progress,
}

/// Progress for a single user; `NotFound` when the user does not exist
pub async fn user_progress(pool: &SqlitePool, user_id: &str) -> Result<Progress> {
    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE guid = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !user_exists {
        return Err(Error::NotFound("User not found".to_string()));
    }

    compute_progress(pool, user_id).await
}

/// Progress for every user with role "user", sorted by name ascending
/// (case-insensitive, exact name as tiebreak)
pub async fn all_assignments(pool: &SqlitePool) -> Result<Vec<UserProgress>> {
    let users: Vec<(String, String, String)> =
        sqlx::query_as("SELECT guid, name, email FROM users WHERE role = 'user'")
            .fetch_all(pool)
            .await?;

    let mut entries = Vec::with_capacity(users.len());
    for (guid, name, email) in users {
        let progress = compute_progress(pool, &guid).await?;
        entries.push(UserProgress {
            user_id: guid,
            user_name: name,
            user_email: email,
            progress,
        });
    }

    entries.sort_by(|a, b| {
        a.user_name
            .to_lowercase()
            .cmp(&b.user_name.to_lowercase())
            .then_with(|| a.user_name.cmp(&b.user_name))
    });

    Ok(entries)
}

async fn compute_progress(pool: &SqlitePool, user_id: &str) -> Result<Progress> {
    let total_assigned: i64 = sqlx::query_scalar(
        r#"
        SELECT COALESCE(SUM(COALESCE(batch_size, batch_end - batch_start + 1)), 0)
        FROM batch_assignments
        WHERE user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    let annotated: i64 = sqlx::query_scalar(
        r#"
        SELECT COUNT(*)
        FROM sentence_assignments sa
        JOIN annotations an
          ON an.sentence_id = sa.sentence_id AND an.user_id = sa.user_id
        WHERE sa.user_id = ?
        "#,
    )
    .bind(user_id)
    .fetch_one(pool)
    .await?;

    Ok(Progress {
        total_assigned,
        annotated,
        progress_percentage: percentage(annotated, total_assigned),
    })
}

/// `round(annotated / total * 100)`, and 0 when nothing is assigned
fn percentage(annotated: i64, total_assigned: i64) -> i64 {
    if total_assigned <= 0 {
        return 0;
    }
    ((annotated as f64 / total_assigned as f64) * 100.0).round() as i64
}
