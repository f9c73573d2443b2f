//! veriscan-api library interface
//!
//! Product/advertisement safety scoring service. Clients submit ad text or
//! images, product label images, or barcodes; the orchestrator drives the
//! external workflow engine (OCR, claim detection, safety scoring, product
//! lookup), persists an audit record per attempt, and the read side exposes
//! history, dashboard statistics, and catalog search.

pub mod api;
pub mod db;
pub mod error;
pub mod models;
pub mod pagination;
pub mod services;

pub use crate::error::{ApiError, ApiResult};

use axum::Router;
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::image_store::UPLOADS_PREFIX;
use crate::services::{ImageStore, Orchestrator};

/// Application state shared across HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool
    pub db: SqlitePool,
    /// Analysis pipeline driver
    pub orchestrator: Arc<Orchestrator>,
    /// Upload persistence (producer of image refs)
    pub image_store: ImageStore,
    /// Session token lifetime
    pub token_ttl_days: i64,
}

impl AppState {
    pub fn new(
        db: SqlitePool,
        orchestrator: Arc<Orchestrator>,
        image_store: ImageStore,
        token_ttl_days: i64,
    ) -> Self {
        Self {
            db,
            orchestrator,
            image_store,
            token_ttl_days,
        }
    }
}

/// Build application router
///
/// Three tiers: auth-required routes (history, dashboard, profile,
/// favorites), optional-auth routes (analysis submission and scans work
/// anonymously but attach an owner when a valid token is present), and
/// public routes (signup/login, catalog search, record reads, health).
pub fn build_router(state: AppState) -> Router {
    use axum::middleware;
    use axum::routing::{delete, get, post};

    let auth_required = Router::new()
        .route("/api/analysis/history", get(api::analysis::get_history))
        .route("/api/analysis/dashboard", get(api::analysis::get_dashboard))
        .route("/api/auth/profile", get(api::auth::get_profile))
        .route("/api/products/save", post(api::products::save_product))
        .route(
            "/api/products/save/:product_id",
            delete(api::products::unsave_product),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::require_auth,
        ));

    let optional_auth = Router::new()
        .route("/api/analysis/ad", post(api::analysis::analyze_ad))
        .route("/api/products/scan/barcode", post(api::products::scan_barcode))
        .route("/api/products/scan/image", post(api::products::scan_image))
        .route("/api/products/:id", get(api::products::get_product))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            api::auth::optional_auth,
        ));

    let public = Router::new()
        .route("/api/auth/signup", post(api::auth::signup))
        .route("/api/auth/login", post(api::auth::login))
        .route("/api/products/search", get(api::products::search_products))
        .route(
            "/api/products/results/:id",
            get(api::analysis::get_analysis),
        )
        .route("/api/analysis/:id", get(api::analysis::get_analysis))
        .merge(api::health::health_routes());

    Router::new()
        .merge(auth_required)
        .merge(optional_auth)
        .merge(public)
        .nest_service(UPLOADS_PREFIX, ServeDir::new(state.image_store.dir()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
