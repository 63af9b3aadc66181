//! Database schema migrations
//!
//! Versioned migrations allow seamless database upgrades without manual
//! deletion or data loss.
//!
//! # Migration Guidelines
//!
//! 1. **Never modify existing migrations** - They must remain stable for
//!    users upgrading from older versions
//! 2. **Always add new migrations** - Create a new migration function for
//!    each schema change
//! 3. **Use ALTER TABLE** - Prefer ALTER TABLE over DROP/CREATE to
//!    preserve data

use crate::Result;
use sqlx::SqlitePool;
use tracing::{info, warn};

/// Current schema version
///
/// **IMPORTANT:** Increment this when adding new migrations
const CURRENT_SCHEMA_VERSION: i32 = 1;

/// Get current schema version from database
///
/// Returns 0 if the schema_version table doesn't exist or has no rows
async fn get_schema_version(pool: &SqlitePool) -> Result<i32> {
    let table_exists: bool = sqlx::query_scalar(
        r#"
        SELECT EXISTS(
            SELECT 1 FROM sqlite_master
            WHERE type='table' AND name='schema_version'
        )
        "#,
    )
    .fetch_one(pool)
    .await?;

    if !table_exists {
        return Ok(0);
    }

    let version: Option<i32> =
        sqlx::query_scalar("SELECT version FROM schema_version ORDER BY version DESC LIMIT 1")
            .fetch_optional(pool)
            .await?;

    Ok(version.unwrap_or(0))
}

/// Set schema version in database
async fn set_schema_version(pool: &SqlitePool, version: i32) -> Result<()> {
    sqlx::query("INSERT INTO schema_version (version) VALUES (?)")
        .bind(version)
        .execute(pool)
        .await?;

    Ok(())
}

/// Run all pending migrations
pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let current_version = get_schema_version(pool).await?;

    if current_version == CURRENT_SCHEMA_VERSION {
        info!("Database schema is up to date (v{})", current_version);
        return Ok(());
    }

    if current_version > CURRENT_SCHEMA_VERSION {
        warn!(
            "Database schema version ({}) is newer than code version ({})",
            current_version, CURRENT_SCHEMA_VERSION
        );
        warn!("This may indicate a downgrade. Proceeding with caution.");
        return Ok(());
    }

    info!(
        "Running database migrations: v{} -> v{}",
        current_version, CURRENT_SCHEMA_VERSION
    );

    if current_version < 1 {
        migrate_v1(pool).await?;
        set_schema_version(pool, 1).await?;
        info!("✓ Migration v1 completed");
    }

    Ok(())
}

/// Migration v1: fold the legacy single-assignee `assigned_to` column on
/// `sentences` into `sentence_assignments` rows.
///
/// Early databases modeled assignment as one optional owner per sentence.
/// The set model strictly generalizes it: each non-empty `assigned_to`
/// value becomes one ownership row, then the column is dropped.
async fn migrate_v1(pool: &SqlitePool) -> Result<()> {
    // Check if the legacy column exists (idempotency)
    let has_column: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM pragma_table_info('sentences') WHERE name = 'assigned_to'",
    )
    .fetch_one(pool)
    .await?;

    if has_column == 0 {
        return Ok(());
    }

    let migrated = sqlx::query(
        r#"
        INSERT OR IGNORE INTO sentence_assignments (sentence_id, user_id)
        SELECT guid, assigned_to FROM sentences
        WHERE assigned_to IS NOT NULL AND assigned_to != ''
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query("ALTER TABLE sentences DROP COLUMN assigned_to")
        .execute(pool)
        .await?;

    info!(
        "Migration v1: folded {} legacy assigned_to values into sentence_assignments",
        migrated.rows_affected()
    );

    Ok(())
}
