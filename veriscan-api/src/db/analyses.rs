//! Analysis record persistence
//!
//! One row per analysis attempt (ad analysis or product scan). The
//! orchestrator creates rows in `processing`, folds derived fields in as
//! pipeline steps complete, and finalizes to `completed` or `failed`.
//! Derived fields written before a failing step are kept, not rolled back.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;
use veriscan_common::{Error, Result};

use crate::models::{AnalysisKind, AnalysisStatus, DetectedClaim};

/// One analysis attempt
///
/// `kind` and the input fields (`image_ref`, `input_text`, `barcode`) are
/// immutable after creation; only derived fields, `product_id`, `status`,
/// and `completed_at` mutate, and only through [`update`].
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisRecord {
    pub id: Uuid,
    pub kind: AnalysisKind,
    #[serde(rename = "user")]
    pub user_id: Option<Uuid>,
    // The hydrated view adds a "product" summary alongside this id
    #[serde(rename = "productId")]
    pub product_id: Option<Uuid>,
    pub image_ref: Option<String>,
    pub input_text: Option<String>,
    pub barcode: Option<String>,
    pub extracted_text: Option<String>,
    pub ocr_confidence: Option<f64>,
    pub detected_claims: Vec<DetectedClaim>,
    pub risk_score: Option<i64>,
    pub nutrition_contradictions: Vec<String>,
    pub warnings: Vec<String>,
    pub status: AnalysisStatus,
    pub created_at: DateTime<Utc>,
    pub completed_at: Option<DateTime<Utc>>,
}

impl AnalysisRecord {
    /// New record in `processing` state, derived fields empty
    pub fn new(kind: AnalysisKind, user_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            kind,
            user_id,
            product_id: None,
            image_ref: None,
            input_text: None,
            barcode: None,
            extracted_text: None,
            ocr_confidence: None,
            detected_claims: Vec::new(),
            risk_score: None,
            nutrition_contradictions: Vec::new(),
            warnings: Vec::new(),
            status: AnalysisStatus::Processing,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    /// Mark terminal success; `completed_at` is set here and nowhere else
    pub fn complete(&mut self) {
        self.status = AnalysisStatus::Completed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark terminal failure, keeping any derived fields already populated
    pub fn fail(&mut self) {
        self.status = AnalysisStatus::Failed;
    }
}

fn json_column<T: serde::de::DeserializeOwned + Default>(
    row: &SqliteRow,
    column: &str,
) -> Result<T> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| Error::Internal(format!("Corrupt JSON in analyses.{}: {}", column, e))),
        None => Ok(T::default()),
    }
}

fn uuid_column(row: &SqliteRow, column: &str) -> Result<Option<Uuid>> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(text) => Uuid::parse_str(&text)
            .map(Some)
            .map_err(|e| Error::Internal(format!("Corrupt UUID in analyses.{}: {}", column, e))),
        None => Ok(None),
    }
}

fn record_from_row(row: &SqliteRow) -> Result<AnalysisRecord> {
    let id: String = row.try_get("id")?;
    let kind: String = row.try_get("kind")?;
    let status: String = row.try_get("status")?;

    Ok(AnalysisRecord {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Corrupt UUID in analyses.id: {}", e)))?,
        kind: AnalysisKind::parse(&kind)
            .ok_or_else(|| Error::Internal(format!("Unknown analysis kind '{}'", kind)))?,
        user_id: uuid_column(row, "user_id")?,
        product_id: uuid_column(row, "product_id")?,
        image_ref: row.try_get("image_ref")?,
        input_text: row.try_get("input_text")?,
        barcode: row.try_get("barcode")?,
        extracted_text: row.try_get("extracted_text")?,
        ocr_confidence: row.try_get("ocr_confidence")?,
        detected_claims: json_column(row, "detected_claims")?,
        risk_score: row.try_get("risk_score")?,
        nutrition_contradictions: json_column(row, "nutrition_contradictions")?,
        warnings: json_column(row, "warnings")?,
        status: AnalysisStatus::parse(&status)
            .ok_or_else(|| Error::Internal(format!("Unknown analysis status '{}'", status)))?,
        created_at: row.try_get("created_at")?,
        completed_at: row.try_get("completed_at")?,
    })
}

/// Persist a newly created record (all fields, including inputs)
pub async fn insert(pool: &SqlitePool, record: &AnalysisRecord) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO analyses (
            id, kind, user_id, product_id, image_ref, input_text, barcode,
            extracted_text, ocr_confidence, detected_claims, risk_score,
            nutrition_contradictions, warnings, status, created_at, completed_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(record.id.to_string())
    .bind(record.kind.as_str())
    .bind(record.user_id.map(|id| id.to_string()))
    .bind(record.product_id.map(|id| id.to_string()))
    .bind(&record.image_ref)
    .bind(&record.input_text)
    .bind(&record.barcode)
    .bind(&record.extracted_text)
    .bind(record.ocr_confidence)
    .bind(serde_json::to_string(&record.detected_claims).unwrap_or_else(|_| "[]".into()))
    .bind(record.risk_score)
    .bind(serde_json::to_string(&record.nutrition_contradictions).unwrap_or_else(|_| "[]".into()))
    .bind(serde_json::to_string(&record.warnings).unwrap_or_else(|_| "[]".into()))
    .bind(record.status.as_str())
    .bind(record.created_at)
    .bind(record.completed_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Persist mutable state: derived fields, product link, status, completed_at
///
/// Deliberately never rewrites `kind`, inputs, `user_id`, or `created_at`.
pub async fn update(pool: &SqlitePool, record: &AnalysisRecord) -> Result<()> {
    sqlx::query(
        r#"
        UPDATE analyses SET
            product_id = ?,
            extracted_text = ?,
            ocr_confidence = ?,
            detected_claims = ?,
            risk_score = ?,
            nutrition_contradictions = ?,
            warnings = ?,
            status = ?,
            completed_at = ?
        WHERE id = ?
        "#,
    )
    .bind(record.product_id.map(|id| id.to_string()))
    .bind(&record.extracted_text)
    .bind(record.ocr_confidence)
    .bind(serde_json::to_string(&record.detected_claims).unwrap_or_else(|_| "[]".into()))
    .bind(record.risk_score)
    .bind(serde_json::to_string(&record.nutrition_contradictions).unwrap_or_else(|_| "[]".into()))
    .bind(serde_json::to_string(&record.warnings).unwrap_or_else(|_| "[]".into()))
    .bind(record.status.as_str())
    .bind(record.completed_at)
    .bind(record.id.to_string())
    .execute(pool)
    .await?;

    Ok(())
}

/// Load one record by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<AnalysisRecord>> {
    let row = sqlx::query("SELECT * FROM analyses WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(record_from_row).transpose()
}

/// One page of a user's records, newest first, optionally filtered by kind
pub async fn history_page(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: Option<AnalysisKind>,
    limit: i64,
    offset: i64,
) -> Result<Vec<AnalysisRecord>> {
    let rows = match kind {
        Some(kind) => {
            sqlx::query(
                "SELECT * FROM analyses
                 WHERE user_id = ? AND kind = ?
                 ORDER BY created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id.to_string())
            .bind(kind.as_str())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
        None => {
            sqlx::query(
                "SELECT * FROM analyses
                 WHERE user_id = ?
                 ORDER BY created_at DESC
                 LIMIT ? OFFSET ?",
            )
            .bind(user_id.to_string())
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?
        }
    };

    rows.iter().map(record_from_row).collect()
}

/// Total record count for a user, optionally filtered by kind
pub async fn count_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: Option<AnalysisKind>,
) -> Result<i64> {
    let count: i64 = match kind {
        Some(kind) => {
            sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE user_id = ? AND kind = ?")
                .bind(user_id.to_string())
                .bind(kind.as_str())
                .fetch_one(pool)
                .await?
        }
        None => {
            sqlx::query_scalar("SELECT COUNT(*) FROM analyses WHERE user_id = ?")
                .bind(user_id.to_string())
                .fetch_one(pool)
                .await?
        }
    };

    Ok(count)
}

/// N most recent records for a user
pub async fn recent_for_user(
    pool: &SqlitePool,
    user_id: Uuid,
    limit: i64,
) -> Result<Vec<AnalysisRecord>> {
    let rows = sqlx::query(
        "SELECT * FROM analyses WHERE user_id = ? ORDER BY created_at DESC LIMIT ?",
    )
    .bind(user_id.to_string())
    .bind(limit)
    .fetch_all(pool)
    .await?;

    rows.iter().map(record_from_row).collect()
}

/// Mean risk score over the user's scored records; 0.0 when none are scored
pub async fn average_risk_score(pool: &SqlitePool, user_id: Uuid) -> Result<f64> {
    let avg: f64 = sqlx::query_scalar(
        "SELECT COALESCE(AVG(risk_score), 0.0) FROM analyses
         WHERE user_id = ? AND risk_score IS NOT NULL",
    )
    .bind(user_id.to_string())
    .fetch_one(pool)
    .await?;

    Ok(avg)
}

/// Count of the user's records at or above the high-risk threshold
pub async fn high_risk_count(pool: &SqlitePool, user_id: Uuid, threshold: i64) -> Result<i64> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM analyses WHERE user_id = ? AND risk_score >= ?",
    )
    .bind(user_id.to_string())
    .bind(threshold)
    .fetch_one(pool)
    .await?;

    Ok(count)
}
