//! Product endpoints: scans, catalog search, favorites

use axum::{
    extract::{Multipart, Path, Query, State},
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::auth::{AuthUser, MaybeUser};
use crate::db::products::{Product, SearchFilter};
use crate::db::{products, users};
use crate::error::{ApiError, ApiResult};
use crate::models::DetectedClaim;
use crate::pagination::{paginate, Pagination, DEFAULT_PAGE_SIZE};
use crate::services::BarcodeScanOutcome;
use crate::AppState;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchQuery {
    pub q: Option<String>,
    pub category: Option<String>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    DEFAULT_PAGE_SIZE
}

#[derive(Debug, Serialize)]
pub struct SearchResponse {
    pub products: Vec<Product>,
    pub pagination: Pagination,
}

/// GET /api/products/search?q&category&minScore&maxScore&page&limit (public)
pub async fn search_products(
    State(state): State<AppState>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Json<SearchResponse>> {
    let filter = SearchFilter {
        query: query.q,
        category: query.category,
        min_score: query.min_score,
        max_score: query.max_score,
    };

    // Offset doesn't depend on the total (pages past the end come back
    // empty), so one query serves both the page and the metadata
    let bounds = paginate(0, query.page, query.limit);
    let (page_products, total) =
        products::search(&state.db, &filter, bounds.limit, bounds.offset).await?;
    let pagination = paginate(total, query.page, query.limit);

    Ok(Json(SearchResponse {
        products: page_products,
        pagination,
    }))
}

/// GET /api/products/:id (optional auth)
///
/// Appends the product to the requesting user's bounded scan history when
/// authenticated.
pub async fn get_product(
    State(state): State<AppState>,
    Extension(MaybeUser(user_id)): Extension<MaybeUser>,
    Path(id): Path<String>,
) -> ApiResult<Json<Product>> {
    let id = Uuid::parse_str(&id)
        .map_err(|_| ApiError::NotFound("Product not found".to_string()))?;

    let product = products::get(&state.db, id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    if let Some(user_id) = user_id {
        users::record_scan(&state.db, user_id, product.id).await?;
    }

    Ok(Json(product))
}

#[derive(Debug, Deserialize)]
pub struct BarcodeScanRequest {
    pub barcode: Option<String>,
}

/// POST /api/products/scan/barcode (optional auth)
pub async fn scan_barcode(
    State(state): State<AppState>,
    Extension(MaybeUser(user_id)): Extension<MaybeUser>,
    Json(req): Json<BarcodeScanRequest>,
) -> ApiResult<Json<Value>> {
    let barcode = req
        .barcode
        .as_deref()
        .map(str::trim)
        .filter(|b| !b.is_empty())
        .ok_or_else(|| ApiError::BadRequest("Barcode is required".to_string()))?;

    let outcome = state.orchestrator.scan_barcode(user_id, barcode).await?;

    let body = match outcome {
        BarcodeScanOutcome::CacheHit(product) => json!({
            "product": product,
            "source": "database",
        }),
        BarcodeScanOutcome::Scanned {
            product,
            analysis_id,
        } => json!({
            "product": product,
            "source": "scanned",
            "analysisId": analysis_id,
        }),
    };

    Ok(Json(body))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageScanResponse {
    pub analysis_id: Uuid,
    pub extracted_text: Option<String>,
    pub claims: Vec<DetectedClaim>,
}

/// POST /api/products/scan/image (optional auth; multipart with `image`)
pub async fn scan_image(
    State(state): State<AppState>,
    Extension(MaybeUser(user_id)): Extension<MaybeUser>,
    mut multipart: Multipart,
) -> ApiResult<Json<ImageScanResponse>> {
    let mut image_ref = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(format!("Malformed multipart body: {}", e)))?
    {
        if field.name() == Some("image") {
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
    }

    let image_ref =
        image_ref.ok_or_else(|| ApiError::BadRequest("Image is required".to_string()))?;

    let record = state.orchestrator.scan_image(user_id, &image_ref).await?;

    Ok(Json(ImageScanResponse {
        analysis_id: record.id,
        extracted_text: record.extracted_text,
        claims: record.detected_claims,
    }))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveProductRequest {
    pub product_id: String,
}

/// POST /api/products/save (auth required)
pub async fn save_product(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Json(req): Json<SaveProductRequest>,
) -> ApiResult<Json<Value>> {
    let product_id = Uuid::parse_str(&req.product_id)
        .map_err(|_| ApiError::NotFound("Product not found".to_string()))?;

    products::get(&state.db, product_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Product not found".to_string()))?;

    users::save_product(&state.db, user_id, product_id).await?;

    Ok(Json(json!({ "message": "Product saved" })))
}

/// DELETE /api/products/save/:product_id (auth required)
pub async fn unsave_product(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
    Path(product_id): Path<String>,
) -> ApiResult<Json<Value>> {
    let product_id = Uuid::parse_str(&product_id)
        .map_err(|_| ApiError::NotFound("Product not found".to_string()))?;

    users::unsave_product(&state.db, user_id, product_id).await?;

    Ok(Json(json!({ "message": "Product removed from saved" })))
}
