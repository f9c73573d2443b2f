//! Read-side aggregation over analysis records
//!
//! History pages and dashboard statistics for a user. The four dashboard
//! queries are mutually independent, so they are issued concurrently and
//! joined.

use serde::Serialize;
use sqlx::SqlitePool;
use uuid::Uuid;
use veriscan_common::Result;

use crate::db::analyses::{self, AnalysisRecord};
use crate::db::products::{self, ProductSummary};
use crate::models::AnalysisKind;
use crate::pagination::{paginate, Pagination};

/// Records with a risk score at or above this count as high-risk
pub const HIGH_RISK_THRESHOLD: i64 = 70;

/// Number of recent records shown on the dashboard
const RECENT_LIMIT: i64 = 5;

/// One history/dashboard row: the record plus its linked product summary
#[derive(Debug, Serialize)]
pub struct AnalysisView {
    #[serde(flatten)]
    pub record: AnalysisRecord,
    pub product: Option<ProductSummary>,
}

/// Dashboard statistics for one user
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_scans: i64,
    pub recent_scans: Vec<AnalysisView>,
    /// Mean risk score over scored records; 0 when none qualify
    pub average_score: f64,
    pub high_risk_count: i64,
}

/// Attach product summaries to records that link one
async fn hydrate(pool: &SqlitePool, records: Vec<AnalysisRecord>) -> Result<Vec<AnalysisView>> {
    let mut views = Vec::with_capacity(records.len());

    for record in records {
        let product = match record.product_id {
            Some(product_id) => products::summaries(pool, &[product_id])
                .await?
                .into_iter()
                .next(),
            None => None,
        };
        views.push(AnalysisView { record, product });
    }

    Ok(views)
}

/// One page of a user's analysis history, newest first
pub async fn history(
    pool: &SqlitePool,
    user_id: Uuid,
    kind: Option<AnalysisKind>,
    page: i64,
    limit: i64,
) -> Result<(Vec<AnalysisView>, Pagination)> {
    let total = analyses::count_for_user(pool, user_id, kind).await?;
    let pagination = paginate(total, page, limit);

    let records =
        analyses::history_page(pool, user_id, kind, pagination.limit, pagination.offset).await?;
    let views = hydrate(pool, records).await?;

    Ok((views, pagination))
}

/// Dashboard statistics; the four aggregates run concurrently
pub async fn dashboard_stats(pool: &SqlitePool, user_id: Uuid) -> Result<DashboardStats> {
    let (total_scans, recent, average_score, high_risk_count) = tokio::try_join!(
        analyses::count_for_user(pool, user_id, None),
        analyses::recent_for_user(pool, user_id, RECENT_LIMIT),
        analyses::average_risk_score(pool, user_id),
        analyses::high_risk_count(pool, user_id, HIGH_RISK_THRESHOLD),
    )?;

    let recent_scans = hydrate(pool, recent).await?;

    Ok(DashboardStats {
        total_scans,
        recent_scans,
        average_score,
        high_risk_count,
    })
}
