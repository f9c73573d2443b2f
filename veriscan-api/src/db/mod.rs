//! Database access for veriscan-api
//!
//! SQLite via sqlx. List- and object-valued fields (claims, warnings,
//! nutrition facts) are stored as JSON text columns.

pub mod analyses;
pub mod products;
pub mod users;

use sqlx::SqlitePool;
use std::path::Path;
use veriscan_common::Result;

/// Initialize database connection pool
///
/// Connects to the database file, creating it if missing, then runs table
/// initialization.
pub async fn init_database_pool(db_path: &Path) -> Result<SqlitePool> {
    if let Some(parent) = db_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // SQLite URI with mode=rwc (read, write, create)
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());
    tracing::debug!("Connecting to database: {}", db_url);

    let pool = SqlitePool::connect(&db_url).await?;
    init_tables(&pool).await?;

    Ok(pool)
}

/// Create tables if they don't exist
///
/// `analyses.completed_at` is only ever written together with
/// `status = 'completed'`; `products.barcode` is sparse-unique (NULL allowed,
/// duplicates rejected).
pub async fn init_tables(pool: &SqlitePool) -> Result<()> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS analyses (
            id TEXT PRIMARY KEY,
            kind TEXT NOT NULL,
            user_id TEXT,
            product_id TEXT,
            image_ref TEXT,
            input_text TEXT,
            barcode TEXT,
            extracted_text TEXT,
            ocr_confidence REAL,
            detected_claims TEXT,
            risk_score INTEGER,
            nutrition_contradictions TEXT,
            warnings TEXT,
            status TEXT NOT NULL DEFAULT 'pending',
            created_at TEXT NOT NULL,
            completed_at TEXT
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        "CREATE INDEX IF NOT EXISTS idx_analyses_user_created
         ON analyses (user_id, created_at DESC)",
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS products (
            id TEXT PRIMARY KEY,
            barcode TEXT UNIQUE,
            name TEXT NOT NULL,
            brand TEXT,
            category TEXT,
            description TEXT,
            image_ref TEXT,
            ingredients TEXT,
            nutrition_facts TEXT,
            claims TEXT,
            safety_score INTEGER NOT NULL DEFAULT 50,
            verified INTEGER NOT NULL DEFAULT 0,
            warnings TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            email TEXT NOT NULL UNIQUE,
            password_digest TEXT NOT NULL,
            name TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS sessions (
            token TEXT PRIMARY KEY,
            user_id TEXT NOT NULL,
            created_at TEXT NOT NULL,
            expires_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS saved_products (
            user_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            saved_at TEXT NOT NULL,
            PRIMARY KEY (user_id, product_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS scan_history (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            user_id TEXT NOT NULL,
            product_id TEXT NOT NULL,
            scanned_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

/// In-memory pool with tables initialized (test support)
pub async fn init_memory_pool() -> Result<SqlitePool> {
    let pool = SqlitePool::connect("sqlite::memory:").await?;
    init_tables(&pool).await?;
    Ok(pool)
}
