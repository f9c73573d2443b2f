//! Degraded-mode workflow substitution
//!
//! In development deployments the workflow engine is often absent. The
//! [`FallbackWorkflowClient`] wraps a live client and substitutes a fixed
//! canned response when a call fails, so pipeline development can proceed
//! without a live upstream. It must never be constructed in a production
//! deployment; selection happens once at startup based on deployment mode.

use async_trait::async_trait;
use std::sync::Arc;
use veriscan_common::Result;

use crate::models::{DetectedClaim, Severity};
use crate::services::workflow::{
    ClaimDetection, OcrResult, ProductLookup, SafetyScore, WorkflowEngine,
};

pub fn canned_ocr() -> OcrResult {
    OcrResult {
        text: "Sample extracted text from product label. Contains: Sugar, Palm Oil, \
               Artificial Flavors. 100% Natural claim visible."
            .to_string(),
        confidence: 0.92,
    }
}

pub fn canned_claims() -> ClaimDetection {
    ClaimDetection {
        claims: vec![
            DetectedClaim {
                text: "100% Natural".to_string(),
                issue: "Contains artificial ingredients".to_string(),
                severity: Severity::High,
                verified: false,
            },
            DetectedClaim {
                text: "Sugar Free".to_string(),
                issue: "Contains maltodextrin".to_string(),
                severity: Severity::Medium,
                verified: false,
            },
        ],
    }
}

pub fn canned_score() -> SafetyScore {
    SafetyScore {
        score: 65,
        contradictions: vec!["Claims natural but contains artificial ingredients".to_string()],
        warnings: vec![
            "High sugar content".to_string(),
            "Contains preservatives".to_string(),
        ],
    }
}

pub fn canned_product() -> ProductLookup {
    ProductLookup {
        name: Some("Scanned Product".to_string()),
        brand: Some("Unknown Brand".to_string()),
        category: Some("General".to_string()),
        safety_score: Some(50),
        ..Default::default()
    }
}

/// Development-mode wrapper: try the live engine, substitute canned data on
/// failure
pub struct FallbackWorkflowClient {
    inner: Arc<dyn WorkflowEngine>,
}

impl FallbackWorkflowClient {
    pub fn new(inner: Arc<dyn WorkflowEngine>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl WorkflowEngine for FallbackWorkflowClient {
    async fn ocr(&self, image_ref: &str) -> Result<OcrResult> {
        match self.inner.ocr(image_ref).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!("OCR workflow failed, substituting canned response: {}", e);
                Ok(canned_ocr())
            }
        }
    }

    async fn detect_claims(&self, text: &str) -> Result<ClaimDetection> {
        match self.inner.detect_claims(text).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    "Claim detection workflow failed, substituting canned response: {}",
                    e
                );
                Ok(canned_claims())
            }
        }
    }

    async fn score_safety(&self, claims: &[DetectedClaim], text: &str) -> Result<SafetyScore> {
        match self.inner.score_safety(claims, text).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    "Safety score workflow failed, substituting canned response: {}",
                    e
                );
                Ok(canned_score())
            }
        }
    }

    async fn lookup_product(&self, barcode: &str) -> Result<ProductLookup> {
        match self.inner.lookup_product(barcode).await {
            Ok(result) => Ok(result),
            Err(e) => {
                tracing::warn!(
                    "Product scan workflow failed, substituting canned response: {}",
                    e
                );
                Ok(canned_product())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use veriscan_common::Error;

    /// Engine stub that always fails
    struct DeadEngine;

    #[async_trait]
    impl WorkflowEngine for DeadEngine {
        async fn ocr(&self, _image_ref: &str) -> Result<OcrResult> {
            Err(Error::Upstream("connection refused".into()))
        }
        async fn detect_claims(&self, _text: &str) -> Result<ClaimDetection> {
            Err(Error::Upstream("connection refused".into()))
        }
        async fn score_safety(
            &self,
            _claims: &[DetectedClaim],
            _text: &str,
        ) -> Result<SafetyScore> {
            Err(Error::Upstream("connection refused".into()))
        }
        async fn lookup_product(&self, _barcode: &str) -> Result<ProductLookup> {
            Err(Error::Upstream("connection refused".into()))
        }
    }

    #[tokio::test]
    async fn test_fallback_substitutes_on_failure() {
        let client = FallbackWorkflowClient::new(Arc::new(DeadEngine));

        let ocr = client.ocr("/uploads/x.jpg").await.unwrap();
        assert!(ocr.confidence > 0.0);

        let claims = client.detect_claims("text").await.unwrap();
        assert_eq!(claims.claims.len(), 2);

        let score = client.score_safety(&claims.claims, "text").await.unwrap();
        assert_eq!(score.score, 65);

        let product = client.lookup_product("123").await.unwrap();
        assert_eq!(product.name.as_deref(), Some("Scanned Product"));
    }
}
