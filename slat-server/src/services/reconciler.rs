//! Batch assignment reconciliation
//!
//! Given a user and a requested index range, classify every sentence in the
//! range by ownership, add the user as co-owner of the ones they don't hold
//! yet, and keep the per-user batch ledger consistent — idempotently.
//!
//! The ledger write is a guarded upsert against the UNIQUE
//! (user_id, batch_start, batch_end) constraint, so a repeat request for an
//! identical range can never append a second record, even when two identical
//! calls race. Ownership rows are INSERT OR IGNORE, so re-assignment never
//! double-counts and never removes another user's ownership.
//!
//! The ledger row is written before the ownership rows. Either write can
//! fail while the other succeeded; a later identical call converges both
//! ways: a ledger record with missing ownership rows is treated as a repeat
//! and gap-filled, and ownership rows with no ledger record are found
//! already present after the record is created.

use slat_common::{Error, Result};
use sqlx::SqlitePool;
use tracing::info;
use uuid::Uuid;

/// Result of one reconciliation call
#[derive(Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// First request for this range: a ledger record was created
    NewAssignment {
        batch_start: i64,
        batch_end: i64,
        /// Sentences the user was added to by this call
        newly_assigned: i64,
        /// Sentences the user already owned before this call
        duplicates_already_owned: i64,
        /// Sentences owned by other users (and not this one) before this call
        conflicts_assigned_to_others: i64,
    },
    /// Repeat request with sentences missing: the gap was filled
    GapFill {
        batch_start: i64,
        batch_end: i64,
        newly_assigned: i64,
    },
    /// Repeat request with nothing left to do
    AlreadyAssigned { batch_start: i64, batch_end: i64 },
}

/// Reconcile a batch request for one user.
///
/// Fails with `NotFound` when the user does not exist, `InvalidInput` on a
/// negative start index or non-positive batch size, and `RangeEmpty` when
/// no sentences occupy the requested index window.
pub async fn reconcile(
    pool: &SqlitePool,
    user_id: &str,
    start_index: i64,
    batch_size: i64,
) -> Result<ReconcileOutcome> {
    if start_index < 0 {
        return Err(Error::InvalidInput(
            "startIndex must be a non-negative integer".to_string(),
        ));
    }
    if batch_size <= 0 {
        return Err(Error::InvalidInput(
            "batchSize must be a positive integer".to_string(),
        ));
    }

    let user_exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE guid = ?)")
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    if !user_exists {
        return Err(Error::NotFound("User not found".to_string()));
    }

    let range_start = start_index;
    let Some(range_end) = start_index.checked_add(batch_size - 1) else {
        return Err(Error::InvalidInput(
            "startIndex plus batchSize exceeds the representable index range".to_string(),
        ));
    };

    // Every sentence in the window, with its ownership relative to this user
    let sentences: Vec<(String, bool, i64)> = sqlx::query_as(
        r#"
        SELECT s.guid,
               EXISTS(SELECT 1 FROM sentence_assignments sa
                      WHERE sa.sentence_id = s.guid AND sa.user_id = ?) AS owned_by_user,
               (SELECT COUNT(*) FROM sentence_assignments sa
                WHERE sa.sentence_id = s.guid) AS assignee_count
        FROM sentences s
        WHERE s.idx BETWEEN ? AND ?
        "#,
    )
    .bind(user_id)
    .bind(range_start)
    .bind(range_end)
    .fetch_all(pool)
    .await?;

    if sentences.is_empty() {
        return Err(Error::RangeEmpty(format!(
            "No sentences exist in index range {}-{}",
            range_start, range_end
        )));
    }

    let duplicates_already_owned =
        sentences.iter().filter(|(_, owned, _)| *owned).count() as i64;
    let conflicts_assigned_to_others = sentences
        .iter()
        .filter(|(_, owned, count)| !*owned && *count > 0)
        .count() as i64;
    let not_yet_assigned: Vec<&String> = sentences
        .iter()
        .filter(|(_, owned, _)| !*owned)
        .map(|(guid, _, _)| guid)
        .collect();

    // Guarded ledger upsert: the row count answers "did this range's record
    // already exist" atomically
    let ledger_insert = sqlx::query(
        r#"
        INSERT INTO batch_assignments (guid, user_id, batch_start, batch_end, batch_size)
        VALUES (?, ?, ?, ?, ?)
        ON CONFLICT(user_id, batch_start, batch_end) DO NOTHING
        "#,
    )
    .bind(Uuid::new_v4().to_string())
    .bind(user_id)
    .bind(range_start)
    .bind(range_end)
    .bind(batch_size)
    .execute(pool)
    .await?;
    let record_created = ledger_insert.rows_affected() > 0;

    let newly_assigned = not_yet_assigned.len() as i64;
    for sentence_id in &not_yet_assigned {
        sqlx::query("INSERT OR IGNORE INTO sentence_assignments (sentence_id, user_id) VALUES (?, ?)")
            .bind(sentence_id.as_str())
            .bind(user_id)
            .execute(pool)
            .await?;
    }

    if record_created {
        info!(
            "Assigned batch {}-{} to user {}: {} new, {} already owned, {} owned by others",
            range_start, range_end, user_id,
            newly_assigned, duplicates_already_owned, conflicts_assigned_to_others
        );
        return Ok(ReconcileOutcome::NewAssignment {
            batch_start: range_start,
            batch_end: range_end,
            newly_assigned,
            duplicates_already_owned,
            conflicts_assigned_to_others,
        });
    }

    if newly_assigned > 0 {
        info!(
            "Gap fill for batch {}-{} of user {}: {} missing sentences assigned",
            range_start, range_end, user_id, newly_assigned
        );
        return Ok(ReconcileOutcome::GapFill {
            batch_start: range_start,
            batch_end: range_end,
            newly_assigned,
        });
    }

    Ok(ReconcileOutcome::AlreadyAssigned {
        batch_start: range_start,
        batch_end: range_end,
    })
}
