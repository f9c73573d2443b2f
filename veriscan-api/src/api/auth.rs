//! Authentication: signup/login/profile handlers and token middleware
//!
//! Identity is an opaque bearer token resolved against the sessions table.
//! Two middleware tiers: `require_auth` rejects missing/invalid tokens with
//! 401; `optional_auth` resolves a valid token when present and otherwise
//! continues anonymously (an invalid token is treated as anonymous, never
//! an error).

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use veriscan_common::credentials;

use crate::db::products::{Product, ProductSummary};
use crate::db::{products, users};
use crate::error::{ApiError, ApiResult};
use crate::AppState;

/// Authenticated identity, inserted by `require_auth`
#[derive(Debug, Clone, Copy)]
pub struct AuthUser(pub Uuid);

/// Possibly-anonymous identity, inserted by both middleware tiers
#[derive(Debug, Clone, Copy, Default)]
pub struct MaybeUser(pub Option<Uuid>);

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
}

async fn resolve_token(state: &AppState, headers: &HeaderMap) -> ApiResult<Option<Uuid>> {
    match bearer_token(headers) {
        Some(token) => Ok(users::user_for_token(&state.db, token).await?),
        None => Ok(None),
    }
}

/// Middleware for gated routes: 401 unless a valid token is presented
pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = resolve_token(&state, request.headers())
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Valid bearer token required".to_string()))?;

    request.extensions_mut().insert(AuthUser(user_id));
    request.extensions_mut().insert(MaybeUser(Some(user_id)));
    Ok(next.run(request).await)
}

/// Middleware for optional-auth routes: never fails, resolves identity when
/// a valid token is present
pub async fn optional_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let user_id = resolve_token(&state, request.headers()).await.unwrap_or(None);

    request.extensions_mut().insert(MaybeUser(user_id));
    Ok(next.run(request).await)
}

// ========================================
// Handlers
// ========================================

#[derive(Debug, Deserialize)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
    pub name: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize)]
pub struct UserView {
    pub id: Uuid,
    pub email: String,
    pub name: String,
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub token: String,
    pub user: UserView,
}

fn validate_signup(req: &SignupRequest) -> ApiResult<()> {
    let email = req.email.trim();
    if email.is_empty() || !email.contains('@') || !email.contains('.') {
        return Err(ApiError::BadRequest("Valid email required".to_string()));
    }
    if req.password.len() < 6 {
        return Err(ApiError::BadRequest(
            "Password must be at least 6 characters".to_string(),
        ));
    }
    if req.name.trim().is_empty() {
        return Err(ApiError::BadRequest("Name is required".to_string()));
    }
    Ok(())
}

/// POST /api/auth/signup
pub async fn signup(
    State(state): State<AppState>,
    Json(req): Json<SignupRequest>,
) -> ApiResult<(StatusCode, Json<TokenResponse>)> {
    validate_signup(&req)?;
    let email = req.email.trim().to_lowercase();

    if users::find_by_email(&state.db, &email).await?.is_some() {
        return Err(ApiError::BadRequest("Email already registered".to_string()));
    }

    let user = users::User {
        id: Uuid::new_v4(),
        email: email.clone(),
        password_digest: credentials::hash_password(&req.password),
        name: req.name.trim().to_string(),
        created_at: Utc::now(),
    };
    users::insert(&state.db, &user).await?;

    let token = credentials::generate_token();
    users::create_session(&state.db, &token, user.id, state.token_ttl_days).await?;

    tracing::info!(email = %email, "New user registered");

    Ok((
        StatusCode::CREATED,
        Json(TokenResponse {
            token,
            user: UserView {
                id: user.id,
                email: user.email,
                name: user.name,
            },
        }),
    ))
}

/// POST /api/auth/login
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> ApiResult<Json<TokenResponse>> {
    let email = req.email.trim().to_lowercase();

    // Same response for unknown email and wrong password
    let user = users::find_by_email(&state.db, &email)
        .await?
        .filter(|user| credentials::verify_password(&req.password, &user.password_digest))
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    let token = credentials::generate_token();
    users::create_session(&state.db, &token, user.id, state.token_ttl_days).await?;

    tracing::info!(email = %email, "User logged in");

    Ok(Json(TokenResponse {
        token,
        user: UserView {
            id: user.id,
            email: user.email,
            name: user.name,
        },
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanHistoryView {
    pub product: Option<ProductSummary>,
    pub scanned_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
    pub saved_products: Vec<Product>,
    pub scan_history: Vec<ScanHistoryView>,
}

/// GET /api/auth/profile
pub async fn get_profile(
    State(state): State<AppState>,
    Extension(AuthUser(user_id)): Extension<AuthUser>,
) -> ApiResult<Json<ProfileResponse>> {
    let user = users::get(&state.db, user_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

    let mut saved_products = Vec::new();
    for product_id in users::saved_product_ids(&state.db, user_id).await? {
        if let Some(product) = products::get(&state.db, product_id).await? {
            saved_products.push(product);
        }
    }

    let mut scan_history = Vec::new();
    for entry in users::scan_history(&state.db, user_id).await? {
        let product = products::summaries(&state.db, &[entry.product_id])
            .await?
            .into_iter()
            .next();
        scan_history.push(ScanHistoryView {
            product,
            scanned_at: entry.scanned_at,
        });
    }

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        name: user.name,
        created_at: user.created_at,
        saved_products,
        scan_history,
    }))
}
