//! Analysis endpoints: ad submission, history, dashboard, record reads

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::auth::{AuthUser, MaybeUser};
use crate::db::analyses;
use crate::error::{ApiError, ApiResult};
use crate::models::{AnalysisKind, DetectedClaim};
use crate::pagination::{Pagination, DEFAULT_PAGE_SIZE};
use crate::services::dashboard::{self, AnalysisView, DashboardStats};
use crate::AppState;

/// Response for a completed ad analysis
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AdAnalysisResponse {
    pub analysis_id: Uuid,
    pub risk_score: Option<i64>,
    pub detected_claims: Vec<DetectedClaim>,
    pub nutrition_contradictions: Vec<String>,
    pub warnings: Vec<String>,
    pub extracted_text: Option<String>,
}

/// Pull the optional `text` field and optional `image` part out of a
/// multipart body, persisting the image through the store
async fn read_ad_submission(
    state: &AppState,
    mut multipart: Multipart,
) -> ApiResult<(Option<String>, Option<String>)> {
    let mut text = None;
    let mut image_ref = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        match field.name() {
            Some("text") => {
                let value = field
                    .text()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable text field: {}", e)))?;
                if !value.trim().is_empty() {
                    text = Some(value);
                }
            }
            Some("image") => {
                let original_name = field.file_name().map(|s| s.to_string());
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::BadRequest(format!("Unreadable image field: {}", e)))?;
                if !bytes.is_empty() {
                    image_ref =
                        Some(state.image_store.save(original_name.as_deref(), &bytes).await?);
                }
            }
            _ => {}
        }
    }

    Ok((text, image_ref))
}

/// POST /api/analysis/ad (optional auth; multipart with `text` and/or `image`)
pub async fn analyze_ad(
    State(state): State<AppState>,
    Extension(MaybeUser(user_id)): Extension<MaybeUser>,
    multipart: Multipart,
) -> ApiResult<Json<AdAnalysisResponse>> {
    let (text, image_ref) = read_ad_submission(&state, multipart).await?;

    let record = state
        .orchestrator
        .analyze_ad(user_id, text, image_ref)
        .await?;

    Ok(Json(AdAnalysisResponse {
        analysis_id: record.id,
        risk_score: record.risk_score,
        detected_claims: record.detected_claims,
        nutrition_contradictions: record.nutrition_contradictions,
        warnings: record.warnings,
        extracted_text: record.extracted_text,
    }))
}

#[derive(Debug, Deserialize)]
pub struct HistoryQuery {
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
    /// Optional kind filter: `product_scan` or `ad_analysis`
    #[serde(rename = "type")]
    pub kind: Option<String>,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize)]
pub struct HistoryResponse {
    pub analyses: Vec<AnalysisView>,
    pub pagination: Pagination,
}

/// GET /api/analysis/history?page&limit&type (auth required)
pub async fn get_history(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Query(query): Query<HistoryQuery>,
) -> ApiResult<Json<HistoryResponse>> {
    let kind = match query.kind.as_deref() {
        Some(raw) => Some(AnalysisKind::parse(raw).ok_or_else(|| {
            ApiError::BadRequest(format!("Unknown analysis type '{}'", raw))
        })?),
        None => None,
    };

    let (analyses, pagination) =
        dashboard::history(&state.db, user_id, kind, query.page, query.limit).await?;

    Ok(Json(HistoryResponse {
        analyses,
        pagination,
    }))
}

/// GET /api/analysis/dashboard (auth required)
pub async fn get_dashboard(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Json<DashboardStats>> {
    Ok(Json(dashboard::dashboard_stats(&state.db, user_id).await?))
}

/// GET /api/analysis/:id (public)
///
/// Completed records are immutable, so repeated reads return identical
/// derived fields.
pub async fn get_analysis(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> ApiResult<Json<AnalysisView>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound("Analysis not found".to_string()))?;

    let record = analyses::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Analysis not found".to_string()))?;

    let product = match record.product_id {
        Some(product_id) => crate::db::products::summaries(&state.db, &[product_id])
            .await?
            .into_iter()
            .next(),
        None => None,
    };

    Ok(Json(AnalysisView { record, product }))
}
