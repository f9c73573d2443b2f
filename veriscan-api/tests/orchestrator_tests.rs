//! Pipeline tests: status transitions, partial-failure persistence, and
//! barcode cache behavior, driven through a scripted workflow engine

mod helpers;

use helpers::{setup_orchestrator, StubEngine};
use sqlx::SqlitePool;
use uuid::Uuid;
use veriscan_api::db::{analyses, products};
use veriscan_api::db::products::Product;
use veriscan_api::models::AnalysisStatus;
use veriscan_api::services::BarcodeScanOutcome;
use veriscan_common::Error;

async fn total_records(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM analyses")
        .fetch_one(pool)
        .await
        .expect("count analyses")
}

async fn total_products(pool: &SqlitePool) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM products")
        .fetch_one(pool)
        .await
        .expect("count products")
}

/// Sole record belonging to the given user
async fn sole_record(pool: &SqlitePool, user_id: Uuid) -> analyses::AnalysisRecord {
    let records = analyses::recent_for_user(pool, user_id, 10)
        .await
        .expect("load records");
    assert_eq!(records.len(), 1, "expected exactly one record");
    records.into_iter().next().unwrap()
}

#[tokio::test]
async fn ad_analysis_text_only_keeps_text_verbatim() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;

    let input = "  Miracle cure! 100% Natural.  ";
    let record = orchestrator
        .analyze_ad(None, Some(input.to_string()), None)
        .await
        .expect("ad analysis should succeed");

    // No image means no OCR step: the input text passes through untouched
    assert_eq!(record.extracted_text.as_deref(), Some(input));
    assert_eq!(record.ocr_confidence, None);
    assert_eq!(record.status, AnalysisStatus::Completed);
    assert!(record.completed_at.is_some());
    assert_eq!(record.risk_score, Some(72));
    assert_eq!(record.detected_claims.len(), 2);
    assert_eq!(record.nutrition_contradictions.len(), 1);
    assert_eq!(record.warnings.len(), 1);

    // Persisted row matches what the caller got back
    let stored = analyses::get(&pool, record.id)
        .await
        .expect("load record")
        .expect("record should be stored");
    assert_eq!(stored.status, AnalysisStatus::Completed);
    assert_eq!(stored.extracted_text.as_deref(), Some(input));
    assert_eq!(stored.risk_score, Some(72));
    assert_eq!(stored.detected_claims, record.detected_claims);
}

#[tokio::test]
async fn ad_analysis_with_image_runs_ocr() {
    let (_pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;

    let record = orchestrator
        .analyze_ad(None, None, Some("/uploads/ad.jpg".to_string()))
        .await
        .expect("ad analysis should succeed");

    assert_eq!(record.ocr_confidence, Some(0.92));
    let extracted = record.extracted_text.expect("extracted text");
    assert!(extracted.contains("/uploads/ad.jpg"));
    assert_eq!(record.status, AnalysisStatus::Completed);
}

#[tokio::test]
async fn ad_analysis_without_input_rejected_before_store() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;

    let err = orchestrator
        .analyze_ad(None, None, None)
        .await
        .expect_err("empty submission should be rejected");
    assert!(matches!(err, Error::InvalidInput(_)));

    // Whitespace-only text is not input either
    let err = orchestrator
        .analyze_ad(None, Some("   ".to_string()), None)
        .await
        .expect_err("blank text should be rejected");
    assert!(matches!(err, Error::InvalidInput(_)));

    assert_eq!(total_records(&pool).await, 0);
}

#[tokio::test]
async fn claim_detection_failure_keeps_ocr_fields() {
    let engine = StubEngine {
        fail_claims: true,
        ..Default::default()
    };
    let (pool, orchestrator) = setup_orchestrator(engine).await;
    let user_id = Uuid::new_v4();

    let err = orchestrator
        .analyze_ad(Some(user_id), None, Some("/uploads/ad.jpg".to_string()))
        .await
        .expect_err("pipeline should fail at claim detection");
    assert!(matches!(err, Error::Upstream(_)));

    // The failed record keeps everything persisted before the failing step
    let record = sole_record(&pool, user_id).await;
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert!(record.extracted_text.is_some());
    assert_eq!(record.ocr_confidence, Some(0.92));
    assert!(record.detected_claims.is_empty());
    assert_eq!(record.risk_score, None);
    assert_eq!(record.completed_at, None);
}

#[tokio::test]
async fn scoring_failure_keeps_detected_claims() {
    let engine = StubEngine {
        fail_score: true,
        ..Default::default()
    };
    let (pool, orchestrator) = setup_orchestrator(engine).await;
    let user_id = Uuid::new_v4();

    orchestrator
        .analyze_ad(Some(user_id), Some("Sugar Free energy drink".to_string()), None)
        .await
        .expect_err("pipeline should fail at scoring");

    let record = sole_record(&pool, user_id).await;
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert_eq!(record.detected_claims.len(), 2);
    assert_eq!(record.risk_score, None);
    assert_eq!(record.completed_at, None);
}

#[tokio::test]
async fn barcode_cache_hit_creates_no_record() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;

    let mut cached = Product::new("Organic Honey");
    cached.barcode = Some("8901234567890".to_string());
    cached.safety_score = 85;
    products::insert(&pool, &cached).await.expect("seed product");

    let outcome = orchestrator
        .scan_barcode(None, "8901234567890")
        .await
        .expect("scan should succeed");

    match outcome {
        BarcodeScanOutcome::CacheHit(product) => {
            assert_eq!(product.id, cached.id);
            assert_eq!(product.safety_score, 85);
        }
        other => panic!("expected cache hit, got {:?}", other),
    }

    assert_eq!(total_records(&pool).await, 0);
    assert_eq!(total_products(&pool).await, 1);
}

#[tokio::test]
async fn barcode_first_scan_creates_product_and_completed_record() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;
    let user_id = Uuid::new_v4();

    let outcome = orchestrator
        .scan_barcode(Some(user_id), "4006381333931")
        .await
        .expect("scan should succeed");

    let (product, analysis_id) = match outcome {
        BarcodeScanOutcome::Scanned {
            product,
            analysis_id,
        } => (product, analysis_id),
        other => panic!("expected fresh scan, got {:?}", other),
    };

    assert_eq!(product.name, "Scanned Product");
    assert_eq!(product.barcode.as_deref(), Some("4006381333931"));
    assert_eq!(product.safety_score, 55);

    let record = analyses::get(&pool, analysis_id)
        .await
        .expect("load record")
        .expect("record should exist");
    assert_eq!(record.status, AnalysisStatus::Completed);
    assert_eq!(record.product_id, Some(product.id));
    assert_eq!(record.barcode.as_deref(), Some("4006381333931"));
    assert!(record.completed_at.is_some());

    assert_eq!(total_records(&pool).await, 1);
    assert_eq!(total_products(&pool).await, 1);

    // A second scan of the same barcode is now a cache hit
    let outcome = orchestrator
        .scan_barcode(None, "4006381333931")
        .await
        .expect("second scan should succeed");
    assert!(matches!(outcome, BarcodeScanOutcome::CacheHit(_)));
    assert_eq!(total_records(&pool).await, 1);
}

#[tokio::test]
async fn barcode_lookup_failure_marks_record_failed() {
    let engine = StubEngine {
        fail_lookup: true,
        ..Default::default()
    };
    let (pool, orchestrator) = setup_orchestrator(engine).await;
    let user_id = Uuid::new_v4();

    let err = orchestrator
        .scan_barcode(Some(user_id), "4006381333931")
        .await
        .expect_err("lookup failure should propagate");
    assert!(matches!(err, Error::Upstream(_)));

    let record = sole_record(&pool, user_id).await;
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert_eq!(record.barcode.as_deref(), Some("4006381333931"));
    assert_eq!(record.product_id, None);
    assert_eq!(record.completed_at, None);

    assert_eq!(total_products(&pool).await, 0);
}

#[tokio::test]
async fn barcode_blank_rejected() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;

    for barcode in ["", "   "] {
        let err = orchestrator
            .scan_barcode(None, barcode)
            .await
            .expect_err("blank barcode should be rejected");
        assert!(matches!(err, Error::InvalidInput(_)));
    }

    assert_eq!(total_records(&pool).await, 0);
}

#[tokio::test]
async fn image_scan_completes_without_score() {
    let (pool, orchestrator) = setup_orchestrator(StubEngine::default()).await;
    let user_id = Uuid::new_v4();

    let record = orchestrator
        .scan_image(Some(user_id), "/uploads/label.png")
        .await
        .expect("image scan should succeed");

    assert_eq!(record.status, AnalysisStatus::Completed);
    assert!(record.completed_at.is_some());
    assert_eq!(record.ocr_confidence, Some(0.92));
    assert_eq!(record.detected_claims.len(), 2);
    // Image scans stop after claim detection
    assert_eq!(record.risk_score, None);

    let stored = sole_record(&pool, user_id).await;
    assert_eq!(stored.status, AnalysisStatus::Completed);
    assert_eq!(stored.detected_claims.len(), 2);
}

#[tokio::test]
async fn image_scan_ocr_failure_marks_record_failed() {
    let engine = StubEngine {
        fail_ocr: true,
        ..Default::default()
    };
    let (pool, orchestrator) = setup_orchestrator(engine).await;
    let user_id = Uuid::new_v4();

    orchestrator
        .scan_image(Some(user_id), "/uploads/label.png")
        .await
        .expect_err("ocr failure should propagate");

    let record = sole_record(&pool, user_id).await;
    assert_eq!(record.status, AnalysisStatus::Failed);
    assert_eq!(record.extracted_text, None);
    assert_eq!(record.completed_at, None);
}
