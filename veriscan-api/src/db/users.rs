//! User identity, sessions, favorites, and scan history

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;
use veriscan_common::{Error, Result};

/// Most-recent scans retained per user; older entries are evicted
pub const SCAN_HISTORY_CAP: i64 = 50;

/// Registered user
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_digest: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// One scan-history entry (most-recent-first in listings)
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryEntry {
    pub product_id: Uuid,
    pub scanned_at: DateTime<Utc>,
}

fn user_from_row(row: &SqliteRow) -> Result<User> {
    let id: String = row.try_get("id")?;
    Ok(User {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Corrupt UUID in users.id: {}", e)))?,
        email: row.try_get("email")?,
        password_digest: row.try_get("password_digest")?,
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a new user; duplicate email surfaces as a unique violation
pub async fn insert(pool: &SqlitePool, user: &User) -> Result<()> {
    sqlx::query(
        "INSERT INTO users (id, email, password_digest, name, created_at)
         VALUES (?, ?, ?, ?, ?)",
    )
    .bind(user.id.to_string())
    .bind(&user.email)
    .bind(&user.password_digest)
    .bind(&user.name)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn find_by_email(pool: &SqlitePool, email: &str) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<User>> {
    let row = sqlx::query("SELECT * FROM users WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(user_from_row).transpose()
}

// ========================================
// Sessions (opaque bearer tokens)
// ========================================

/// Store a session token with expiry
pub async fn create_session(
    pool: &SqlitePool,
    token: &str,
    user_id: Uuid,
    ttl_days: i64,
) -> Result<()> {
    let now = Utc::now();
    sqlx::query(
        "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?, ?, ?, ?)",
    )
    .bind(token)
    .bind(user_id.to_string())
    .bind(now)
    .bind(now + Duration::days(ttl_days))
    .execute(pool)
    .await?;

    Ok(())
}

/// Resolve a bearer token to a user id; expired or unknown tokens yield None
pub async fn user_for_token(pool: &SqlitePool, token: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT user_id, expires_at FROM sessions WHERE token = ?")
        .bind(token)
        .fetch_optional(pool)
        .await?;

    let Some(row) = row else {
        return Ok(None);
    };

    let expires_at: DateTime<Utc> = row.try_get("expires_at")?;
    if expires_at < Utc::now() {
        return Ok(None);
    }

    let user_id: String = row.try_get("user_id")?;
    Uuid::parse_str(&user_id)
        .map(Some)
        .map_err(|e| Error::Internal(format!("Corrupt UUID in sessions.user_id: {}", e)))
}

// ========================================
// Saved products (favorites)
// ========================================

/// Save a product to the user's list; saving twice is a no-op
pub async fn save_product(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<()> {
    sqlx::query(
        "INSERT INTO saved_products (user_id, product_id, saved_at) VALUES (?, ?, ?)
         ON CONFLICT (user_id, product_id) DO NOTHING",
    )
    .bind(user_id.to_string())
    .bind(product_id.to_string())
    .bind(Utc::now())
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn unsave_product(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<()> {
    sqlx::query("DELETE FROM saved_products WHERE user_id = ? AND product_id = ?")
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn saved_product_ids(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<Uuid>> {
    let rows = sqlx::query(
        "SELECT product_id FROM saved_products WHERE user_id = ? ORDER BY saved_at DESC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.try_get("product_id")?;
            Uuid::parse_str(&id).map_err(|e| {
                Error::Internal(format!("Corrupt UUID in saved_products.product_id: {}", e))
            })
        })
        .collect()
}

// ========================================
// Scan history (bounded, most-recent-first)
// ========================================

/// Record a product view/scan, evicting beyond [`SCAN_HISTORY_CAP`]
pub async fn record_scan(pool: &SqlitePool, user_id: Uuid, product_id: Uuid) -> Result<()> {
    sqlx::query("INSERT INTO scan_history (user_id, product_id, scanned_at) VALUES (?, ?, ?)")
        .bind(user_id.to_string())
        .bind(product_id.to_string())
        .bind(Utc::now())
        .execute(pool)
        .await?;

    sqlx::query(
        "DELETE FROM scan_history
         WHERE user_id = ? AND id NOT IN (
             SELECT id FROM scan_history WHERE user_id = ? ORDER BY id DESC LIMIT ?
         )",
    )
    .bind(user_id.to_string())
    .bind(user_id.to_string())
    .bind(SCAN_HISTORY_CAP)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn scan_history(pool: &SqlitePool, user_id: Uuid) -> Result<Vec<ScanHistoryEntry>> {
    let rows = sqlx::query(
        "SELECT product_id, scanned_at FROM scan_history
         WHERE user_id = ? ORDER BY id DESC",
    )
    .bind(user_id.to_string())
    .fetch_all(pool)
    .await?;

    rows.iter()
        .map(|row| {
            let id: String = row.try_get("product_id")?;
            Ok(ScanHistoryEntry {
                product_id: Uuid::parse_str(&id).map_err(|e| {
                    Error::Internal(format!("Corrupt UUID in scan_history.product_id: {}", e))
                })?,
                scanned_at: row.try_get("scanned_at")?,
            })
        })
        .collect()
}
