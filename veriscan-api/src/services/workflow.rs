//! Remote workflow engine client
//!
//! Thin typed proxy for the four external workflows: OCR, claim detection,
//! safety scoring, and barcode product lookup. Each call is independently
//! timeboxed; a single failed attempt propagates immediately so the
//! orchestrator can mark its record failed instead of stalling. The client
//! never retries; retry is a caller decision (resubmit produces a new
//! record).

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::time::Duration;
use veriscan_common::{Error, Result};

use crate::models::DetectedClaim;

/// Per-call timeout for every workflow operation
pub const WORKFLOW_TIMEOUT: Duration = Duration::from_secs(30);

/// OCR workflow response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OcrResult {
    pub text: String,
    /// 0.0–1.0
    pub confidence: f64,
}

/// Claim detection workflow response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClaimDetection {
    pub claims: Vec<DetectedClaim>,
}

/// Safety scoring workflow response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SafetyScore {
    /// 0–100 ad-hoc risk score for this analysis
    pub score: i64,
    #[serde(default)]
    pub contradictions: Vec<String>,
    #[serde(default)]
    pub warnings: Vec<String>,
}

/// Barcode product lookup response; all fields optional
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductLookup {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub safety_score: Option<i64>,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub claims: Vec<String>,
}

/// Capability interface over the remote workflow engine
///
/// Stateless and safe to retry from the caller's side. Implementations:
/// [`HttpWorkflowClient`] (live engine) and the development-mode fallback in
/// [`super::offline`].
#[async_trait]
pub trait WorkflowEngine: Send + Sync {
    async fn ocr(&self, image_ref: &str) -> Result<OcrResult>;
    async fn detect_claims(&self, text: &str) -> Result<ClaimDetection>;
    async fn score_safety(&self, claims: &[DetectedClaim], text: &str) -> Result<SafetyScore>;
    async fn lookup_product(&self, barcode: &str) -> Result<ProductLookup>;
}

/// HTTP client for the live workflow engine
///
/// Posts JSON to `{base}/ocr`, `{base}/claims`, `{base}/score`, and
/// `{base}/product-scan`.
pub struct HttpWorkflowClient {
    http_client: reqwest::Client,
    base_url: String,
}

impl HttpWorkflowClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(WORKFLOW_TIMEOUT)
            .build()
            .map_err(|e| Error::Upstream(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            http_client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        body: serde_json::Value,
    ) -> Result<T> {
        let url = format!("{}/{}", self.base_url, path);
        tracing::debug!(url = %url, "Triggering workflow");

        let response = self
            .http_client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    Error::Upstream(format!("Workflow '{}' timed out", path))
                } else {
                    Error::Upstream(format!("Workflow '{}' network error: {}", path, e))
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(Error::Upstream(format!(
                "Workflow '{}' returned {}: {}",
                path, status, error_text
            )));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Upstream(format!("Workflow '{}' parse error: {}", path, e)))
    }
}

#[async_trait]
impl WorkflowEngine for HttpWorkflowClient {
    async fn ocr(&self, image_ref: &str) -> Result<OcrResult> {
        tracing::info!(image_ref = %image_ref, "Triggering OCR workflow");
        self.post("ocr", json!({ "imageUrl": image_ref })).await
    }

    async fn detect_claims(&self, text: &str) -> Result<ClaimDetection> {
        tracing::info!("Triggering claim detection workflow");
        self.post("claims", json!({ "text": text })).await
    }

    async fn score_safety(&self, claims: &[DetectedClaim], text: &str) -> Result<SafetyScore> {
        tracing::info!("Triggering safety score workflow");
        self.post("score", json!({ "claims": claims, "text": text }))
            .await
    }

    async fn lookup_product(&self, barcode: &str) -> Result<ProductLookup> {
        tracing::info!(barcode = %barcode, "Triggering product scan workflow");
        self.post("product-scan", json!({ "barcode": barcode }))
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_normalized() {
        let client = HttpWorkflowClient::new("http://localhost:5678/webhook/").unwrap();
        assert_eq!(client.base_url, "http://localhost:5678/webhook");
    }

    #[test]
    fn test_product_lookup_tolerates_sparse_responses() {
        let lookup: ProductLookup = serde_json::from_str(r#"{"name":"Scanned Product"}"#).unwrap();
        assert_eq!(lookup.name.as_deref(), Some("Scanned Product"));
        assert!(lookup.brand.is_none());
        assert!(lookup.ingredients.is_empty());
    }

    #[test]
    fn test_safety_score_defaults_empty_lists() {
        let score: SafetyScore = serde_json::from_str(r#"{"score":65}"#).unwrap();
        assert_eq!(score.score, 65);
        assert!(score.contradictions.is_empty());
        assert!(score.warnings.is_empty());
    }
}
