//! Database initialization
//!
//! Creates the database file on first run, applies the schema idempotently,
//! runs versioned migrations, and seeds default runtime settings.

use crate::Result;
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use std::path::Path;
use tracing::info;

/// Initialize database connection and create tables if needed
pub async fn init_database(db_path: &Path) -> Result<SqlitePool> {
    let newly_created = !db_path.exists();

    // Create parent directory if it doesn't exist
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    let pool = SqlitePoolOptions::new()
        .max_connections(10)
        .min_connections(2)
        .connect(&db_url)
        .await?;

    if newly_created {
        info!("Initialized new database: {}", db_path.display());
    } else {
        info!("Opened existing database: {}", db_path.display());
    }

    // Enable foreign keys
    sqlx::query("PRAGMA foreign_keys = ON").execute(&pool).await?;

    // WAL mode: concurrent readers with one writer
    sqlx::query("PRAGMA journal_mode = WAL").execute(&pool).await?;

    // Bounded wait on the write lock before a statement errors
    sqlx::query("PRAGMA busy_timeout = 5000").execute(&pool).await?;

    apply_schema(&pool).await?;

    Ok(pool)
}

/// Apply the full schema to an open pool.
///
/// Idempotent: safe to call on an existing database. Split out from
/// [`init_database`] so tests can run against in-memory pools.
pub async fn apply_schema(pool: &SqlitePool) -> Result<()> {
    create_schema_version_table(pool).await?;
    create_users_table(pool).await?;
    create_settings_table(pool).await?;
    create_sentences_table(pool).await?;
    create_sentence_assignments_table(pool).await?;
    create_annotations_table(pool).await?;
    create_batch_assignments_table(pool).await?;

    // Versioned migrations (idempotent, run after CREATE TABLE IF NOT EXISTS)
    crate::db::migrations::run_migrations(pool).await?;

    // Default runtime settings
    init_default_settings(pool).await?;

    Ok(())
}

async fn create_schema_version_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_users_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            guid TEXT PRIMARY KEY,
            name TEXT NOT NULL DEFAULT '',
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL DEFAULT '',
            role TEXT NOT NULL DEFAULT 'user',
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the settings table
///
/// Stores runtime configuration key-value pairs.
pub async fn create_settings_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS settings (
            key TEXT PRIMARY KEY,
            value TEXT,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

async fn create_sentences_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentences (
            guid TEXT PRIMARY KEY,
            text TEXT NOT NULL,
            idx INTEGER NOT NULL UNIQUE,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the sentence assignment table.
///
/// One row per (sentence, user) ownership pair. The primary key makes
/// membership addition idempotent via INSERT OR IGNORE; rows are never
/// deleted, so the table doubles as the audit trail of ever-assigned
/// sentences.
async fn create_sentence_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sentence_assignments (
            sentence_id TEXT NOT NULL REFERENCES sentences(guid),
            user_id TEXT NOT NULL REFERENCES users(guid),
            assigned_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (sentence_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_sentence_assignments_user
         ON sentence_assignments(user_id)",
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the annotations table.
///
/// The primary key enforces at most one annotation per user per sentence;
/// re-annotation replaces `labels` in place and preserves `created_at`.
async fn create_annotations_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS annotations (
            sentence_id TEXT NOT NULL REFERENCES sentences(guid),
            user_id TEXT NOT NULL REFERENCES users(guid),
            labels TEXT NOT NULL,
            created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            PRIMARY KEY (sentence_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Create the per-user batch ledger.
///
/// The UNIQUE constraint on (user_id, batch_start, batch_end) is what makes
/// the reconciler's guarded upsert work: re-requesting an identical range
/// cannot append a second record, even from concurrent calls.
async fn create_batch_assignments_table(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS batch_assignments (
            guid TEXT PRIMARY KEY,
            user_id TEXT NOT NULL REFERENCES users(guid),
            batch_start INTEGER NOT NULL,
            batch_end INTEGER NOT NULL,
            batch_size INTEGER,
            assigned_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
            completed INTEGER NOT NULL DEFAULT 0,
            UNIQUE (user_id, batch_start, batch_end)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// Initialize or update default settings
///
/// Ensures all required settings exist with default values and resets
/// NULL values to their defaults.
async fn init_default_settings(pool: &SqlitePool) -> Result<()> {
    // Assignment settings
    ensure_setting(pool, "default_batch_size", "500").await?;

    // CSV ingestion settings
    ensure_setting(pool, "csv_text_columns", r#"["sentence", "text"]"#).await?;
    ensure_setting(pool, "csv_max_upload_bytes", "10485760").await?; // 10 MiB

    // API authentication (empty secret disables auth checking)
    ensure_setting(pool, "api_jwt_secret", "").await?;

    info!("Default settings initialized");
    Ok(())
}

/// Create a setting with its default value if absent, and reset NULL
/// values back to the default.
pub async fn ensure_setting(pool: &SqlitePool, key: &str, default_value: &str) -> Result<()> {
    let exists: bool = sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM settings WHERE key = ?)")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if !exists {
        // INSERT OR IGNORE handles concurrent initialization: multiple
        // connections may pass the exists check simultaneously
        sqlx::query("INSERT OR IGNORE INTO settings (key, value) VALUES (?, ?)")
            .bind(key)
            .bind(default_value)
            .execute(pool)
            .await?;

        info!("Initialized setting '{}' with default value: {}", key, default_value);
        return Ok(());
    }

    let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?")
        .bind(key)
        .fetch_one(pool)
        .await?;

    if value.is_none() {
        sqlx::query("UPDATE settings SET value = ?, updated_at = CURRENT_TIMESTAMP WHERE key = ?")
            .bind(default_value)
            .bind(key)
            .execute(pool)
            .await?;

        info!("Reset NULL setting '{}' to default value: {}", key, default_value);
    }

    Ok(())
}
