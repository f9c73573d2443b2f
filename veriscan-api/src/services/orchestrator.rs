//! Analysis orchestration pipelines
//!
//! Drives the three pipelines (ad analysis, barcode scan, image scan), each
//! a fixed sequence of workflow calls interleaved with record persistence:
//!
//! - a record is created in `processing` and persisted before the first
//!   workflow call, so a crash mid-pipeline leaves a durable, inspectable
//!   row rather than a lost request;
//! - each step's result is folded into the record and persisted before the
//!   next step runs;
//! - on failure the record moves to `failed` with partial derived fields
//!   kept (they have diagnostic value), and the triggering error propagates;
//! - on success the record moves to `completed` with `completed_at` set,
//!   exactly once.
//!
//! No retries happen here; a failed analysis is terminal and the caller may
//! resubmit, producing a brand-new record.

use sqlx::SqlitePool;
use std::sync::Arc;
use uuid::Uuid;
use veriscan_common::{Error, Result};

use crate::db::{analyses, products};
use crate::db::analyses::AnalysisRecord;
use crate::db::products::Product;
use crate::models::AnalysisKind;
use crate::services::workflow::WorkflowEngine;

/// Outcome of a barcode scan
#[derive(Debug)]
pub enum BarcodeScanOutcome {
    /// Barcode already resolved to a catalog product; no analysis record
    /// was created
    CacheHit(Product),
    /// First-seen barcode: remote lookup ran, a product and a completed
    /// analysis record now exist, linked via the record's product ref
    Scanned {
        product: Product,
        analysis_id: Uuid,
    },
}

/// Drives analysis pipelines against the record/product stores and the
/// remote workflow engine
pub struct Orchestrator {
    db: SqlitePool,
    engine: Arc<dyn WorkflowEngine>,
}

impl Orchestrator {
    pub fn new(db: SqlitePool, engine: Arc<dyn WorkflowEngine>) -> Self {
        Self { db, engine }
    }

    /// Ad analysis pipeline: optional OCR, claim detection, safety scoring
    ///
    /// At least one of `text` / `image_ref` must be present; validation
    /// failures never touch the store.
    pub async fn analyze_ad(
        &self,
        user_id: Option<Uuid>,
        text: Option<String>,
        image_ref: Option<String>,
    ) -> Result<AnalysisRecord> {
        let has_text = text.as_deref().map(|t| !t.trim().is_empty()).unwrap_or(false);
        if !has_text && image_ref.is_none() {
            return Err(Error::InvalidInput("Text or image is required".to_string()));
        }

        let mut record = AnalysisRecord::new(AnalysisKind::AdAnalysis, user_id);
        record.input_text = text.clone();
        record.image_ref = image_ref.clone();
        analyses::insert(&self.db, &record).await?;

        match self.run_ad_pipeline(&mut record).await {
            Ok(()) => {
                record.complete();
                analyses::update(&self.db, &record).await?;
                tracing::info!(analysis_id = %record.id, score = ?record.risk_score,
                    "Ad analysis completed");
                Ok(record)
            }
            Err(e) => {
                record.fail();
                analyses::update(&self.db, &record).await?;
                tracing::error!(analysis_id = %record.id, "Ad analysis failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_ad_pipeline(&self, record: &mut AnalysisRecord) -> Result<()> {
        // Step 1: OCR when an image was supplied; otherwise the supplied
        // text is the extracted text, verbatim
        let extracted_text = match &record.image_ref {
            Some(image_ref) => {
                let ocr = self.engine.ocr(image_ref).await?;
                record.extracted_text = Some(ocr.text.clone());
                record.ocr_confidence = Some(ocr.confidence);
                analyses::update(&self.db, record).await?;
                ocr.text
            }
            None => {
                let text = record.input_text.clone().unwrap_or_default();
                record.extracted_text = Some(text.clone());
                text
            }
        };

        // Step 2: claim detection over the extracted text
        let detection = self.engine.detect_claims(&extracted_text).await?;
        record.detected_claims = detection.claims.clone();
        analyses::update(&self.db, record).await?;

        // Step 3: safety scoring over claims + text
        let score = self
            .engine
            .score_safety(&detection.claims, &extracted_text)
            .await?;
        record.risk_score = Some(score.score);
        record.nutrition_contradictions = score.contradictions;
        record.warnings = score.warnings;

        Ok(())
    }

    /// Barcode scan pipeline
    ///
    /// A known barcode short-circuits to the catalog row with no analysis
    /// record created. An unseen barcode creates a `processing` record,
    /// runs the remote product lookup, creates the product, and completes
    /// the record with the product linked.
    pub async fn scan_barcode(
        &self,
        user_id: Option<Uuid>,
        barcode: &str,
    ) -> Result<BarcodeScanOutcome> {
        let barcode = barcode.trim();
        if barcode.is_empty() {
            return Err(Error::InvalidInput("Barcode is required".to_string()));
        }

        if let Some(product) = products::find_by_barcode(&self.db, barcode).await? {
            tracing::debug!(barcode = %barcode, "Barcode cache hit");
            return Ok(BarcodeScanOutcome::CacheHit(product));
        }

        let mut record = AnalysisRecord::new(AnalysisKind::ProductScan, user_id);
        record.barcode = Some(barcode.to_string());
        analyses::insert(&self.db, &record).await?;

        let lookup = match self.engine.lookup_product(barcode).await {
            Ok(lookup) => lookup,
            Err(e) => {
                record.fail();
                analyses::update(&self.db, &record).await?;
                tracing::error!(analysis_id = %record.id, barcode = %barcode,
                    "Barcode scan failed: {}", e);
                return Err(e);
            }
        };

        let mut product = Product::new(
            lookup.name.unwrap_or_else(|| "Unknown Product".to_string()),
        );
        product.barcode = Some(barcode.to_string());
        product.brand = lookup.brand;
        product.category = lookup.category;
        product.description = lookup.description;
        product.ingredients = lookup.ingredients;
        product.claims = lookup.claims;
        if let Some(score) = lookup.safety_score {
            product.safety_score = score;
        }

        let product = match products::insert(&self.db, &product).await {
            Ok(()) => product,
            // Lost the race on a first-seen barcode: another scan created
            // the product between our lookup and insert. Use the winner's
            // row; a duplicate is harmless, corruption is not.
            Err(ref e) if products::is_barcode_conflict(e) => {
                tracing::warn!(barcode = %barcode,
                    "Concurrent scan created this product first; using existing row");
                products::find_by_barcode(&self.db, barcode)
                    .await?
                    .ok_or_else(|| {
                        Error::Internal(format!(
                            "Barcode {} conflicted on insert but is absent on re-fetch",
                            barcode
                        ))
                    })?
            }
            Err(e) => {
                record.fail();
                analyses::update(&self.db, &record).await?;
                return Err(e);
            }
        };

        record.product_id = Some(product.id);
        record.complete();
        analyses::update(&self.db, &record).await?;

        tracing::info!(analysis_id = %record.id, product_id = %product.id,
            barcode = %barcode, "Barcode scan completed");

        Ok(BarcodeScanOutcome::Scanned {
            product,
            analysis_id: record.id,
        })
    }

    /// Image scan pipeline: OCR then claim detection, no scoring step
    pub async fn scan_image(
        &self,
        user_id: Option<Uuid>,
        image_ref: &str,
    ) -> Result<AnalysisRecord> {
        if image_ref.trim().is_empty() {
            return Err(Error::InvalidInput("Image is required".to_string()));
        }

        let mut record = AnalysisRecord::new(AnalysisKind::ProductScan, user_id);
        record.image_ref = Some(image_ref.to_string());
        analyses::insert(&self.db, &record).await?;

        match self.run_image_pipeline(&mut record, image_ref).await {
            Ok(()) => {
                record.complete();
                analyses::update(&self.db, &record).await?;
                tracing::info!(analysis_id = %record.id, "Image scan completed");
                Ok(record)
            }
            Err(e) => {
                record.fail();
                analyses::update(&self.db, &record).await?;
                tracing::error!(analysis_id = %record.id, "Image scan failed: {}", e);
                Err(e)
            }
        }
    }

    async fn run_image_pipeline(
        &self,
        record: &mut AnalysisRecord,
        image_ref: &str,
    ) -> Result<()> {
        let ocr = self.engine.ocr(image_ref).await?;
        record.extracted_text = Some(ocr.text.clone());
        record.ocr_confidence = Some(ocr.confidence);
        analyses::update(&self.db, record).await?;

        let detection = self.engine.detect_claims(&ocr.text).await?;
        record.detected_claims = detection.claims;

        Ok(())
    }
}
