//! Shared test helpers: scripted workflow engine, app construction,
//! multipart body building, JSON extraction

// Each test binary uses a different subset of these helpers
#![allow(dead_code)]

use async_trait::async_trait;
use axum::body::Body;
use axum::http::Request;
use serde_json::Value;
use sqlx::SqlitePool;
use std::sync::Arc;
use veriscan_api::db::init_memory_pool;
use veriscan_api::models::{DetectedClaim, Severity};
use veriscan_api::services::workflow::{
    ClaimDetection, OcrResult, ProductLookup, SafetyScore, WorkflowEngine,
};
use veriscan_api::services::{ImageStore, Orchestrator};
use veriscan_api::AppState;
use veriscan_common::{Error, Result};

/// Scripted workflow engine: fixed successful responses, with per-operation
/// failure switches
#[derive(Debug, Clone, Default)]
pub struct StubEngine {
    pub fail_ocr: bool,
    pub fail_claims: bool,
    pub fail_score: bool,
    pub fail_lookup: bool,
}

pub fn stub_claims() -> Vec<DetectedClaim> {
    vec![
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
    ]
}

#[async_trait]
impl WorkflowEngine for StubEngine {
    async fn ocr(&self, image_ref: &str) -> Result<OcrResult> {
        if self.fail_ocr {
            return Err(Error::Upstream("ocr unavailable".into()));
        }
        Ok(OcrResult {
            text: format!("Label text extracted from {}", image_ref),
            confidence: 0.92,
        })
    }

    async fn detect_claims(&self, _text: &str) -> Result<ClaimDetection> {
        if self.fail_claims {
            return Err(Error::Upstream("claim detection unavailable".into()));
        }
        Ok(ClaimDetection {
            claims: stub_claims(),
        })
    }

    async fn score_safety(&self, _claims: &[DetectedClaim], _text: &str) -> Result<SafetyScore> {
        if self.fail_score {
            return Err(Error::Upstream("scoring unavailable".into()));
        }
        Ok(SafetyScore {
            score: 72,
            contradictions: vec!["Claims natural but contains artificial ingredients".into()],
            warnings: vec!["High sugar content".into()],
        })
    }

    async fn lookup_product(&self, _barcode: &str) -> Result<ProductLookup> {
        if self.fail_lookup {
            return Err(Error::Upstream("product lookup unavailable".into()));
        }
        Ok(ProductLookup {
            name: Some("Scanned Product".to_string()),
            brand: Some("Unknown Brand".to_string()),
            category: Some("General".to_string()),
            safety_score: Some(55),
            ..Default::default()
        })
    }
}

/// In-memory pool + orchestrator over the given engine
pub async fn setup_orchestrator(engine: StubEngine) -> (SqlitePool, Orchestrator) {
    let pool = init_memory_pool().await.expect("memory pool");
    let orchestrator = Orchestrator::new(pool.clone(), Arc::new(engine));
    (pool, orchestrator)
}

/// App with in-memory database, stub engine, and temp upload dir
pub async fn setup_app(engine: StubEngine) -> (SqlitePool, axum::Router, tempfile::TempDir) {
    let pool = init_memory_pool().await.expect("memory pool");
    let orchestrator = Arc::new(Orchestrator::new(pool.clone(), Arc::new(engine)));
    let uploads = tempfile::tempdir().expect("tempdir");
    let state = AppState::new(
        pool.clone(),
        orchestrator,
        ImageStore::new(uploads.path()),
        7,
    );
    (pool, veriscan_api::build_router(state), uploads)
}

/// Extract JSON body from a response body
pub async fn extract_json(body: Body) -> Value {
    let bytes = axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body");
    serde_json::from_slice(&bytes).expect("Should parse JSON")
}

/// Raw response bytes (for byte-identical read checks)
pub async fn extract_bytes(body: Body) -> Vec<u8> {
    axum::body::to_bytes(body, usize::MAX)
        .await
        .expect("Should read body")
        .to_vec()
}

pub const MULTIPART_BOUNDARY: &str = "veriscan-test-boundary";

/// Build a multipart/form-data body from text fields and optional file parts
pub fn multipart_body(text_fields: &[(&str, &str)], files: &[(&str, &str, &[u8])]) -> Vec<u8> {
    let mut body = Vec::new();

    for (name, value) in text_fields {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n",
                MULTIPART_BOUNDARY, name, value
            )
            .as_bytes(),
        );
    }

    for (name, filename, bytes) in files {
        body.extend_from_slice(
            format!(
                "--{}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\n\
                 Content-Type: application/octet-stream\r\n\r\n",
                MULTIPART_BOUNDARY, name, filename
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(b"\r\n");
    }

    body.extend_from_slice(format!("--{}--\r\n", MULTIPART_BOUNDARY).as_bytes());
    body
}

/// Request builder for JSON bodies, with optional bearer token
pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header("content-type", "application/json");
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// Request builder for bodiless requests, with optional bearer token
pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

/// Multipart POST request, with optional bearer token
pub fn multipart_request(uri: &str, token: Option<&str>, body: Vec<u8>) -> Request<Body> {
    let mut builder = Request::builder().method("POST").uri(uri).header(
        "content-type",
        format!("multipart/form-data; boundary={}", MULTIPART_BOUNDARY),
    );
    if let Some(token) = token {
        builder = builder.header("authorization", format!("Bearer {}", token));
    }
    builder.body(Body::from(body)).unwrap()
}
