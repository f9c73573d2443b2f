//! Canonical product catalog persistence
//!
//! Products are created by catalog seeding or lazily by the orchestrator on
//! a first-seen-barcode scan. `barcode` is sparse-unique: ad-only analyses
//! never create a product, and many products carry no barcode at all.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;
use veriscan_common::{Error, Result};

use crate::models::NutritionFacts;

/// Canonical catalog entry
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: Uuid,
    pub barcode: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub category: Option<String>,
    pub description: Option<String>,
    pub image_ref: Option<String>,
    pub ingredients: Vec<String>,
    pub nutrition_facts: NutritionFacts,
    /// Claims the product itself declares (not evaluated claims)
    pub claims: Vec<String>,
    /// Stored, precomputed score for the canonical product (default 50);
    /// distinct from the per-analysis risk score
    pub safety_score: i64,
    pub verified: bool,
    pub warnings: Vec<String>,
    pub created_at: DateTime<Utc>,
}

impl Product {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            barcode: None,
            name: name.into(),
            brand: None,
            category: None,
            description: None,
            image_ref: None,
            ingredients: Vec::new(),
            nutrition_facts: NutritionFacts::default(),
            claims: Vec::new(),
            safety_score: 50,
            verified: false,
            warnings: Vec::new(),
            created_at: Utc::now(),
        }
    }
}

/// Compact product view joined into history/dashboard responses
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSummary {
    pub id: Uuid,
    pub name: String,
    pub brand: Option<String>,
    pub image_ref: Option<String>,
    pub safety_score: i64,
}

/// Search filter for the product catalog
#[derive(Debug, Clone, Default)]
pub struct SearchFilter {
    /// Case-insensitive substring match over name/brand/category
    pub query: Option<String>,
    /// Exact category match
    pub category: Option<String>,
    pub min_score: Option<i64>,
    pub max_score: Option<i64>,
}

fn json_column<T: serde::de::DeserializeOwned + Default>(
    row: &SqliteRow,
    column: &str,
) -> Result<T> {
    let raw: Option<String> = row.try_get(column)?;
    match raw {
        Some(text) => serde_json::from_str(&text)
            .map_err(|e| Error::Internal(format!("Corrupt JSON in products.{}: {}", column, e))),
        None => Ok(T::default()),
    }
}

fn product_from_row(row: &SqliteRow) -> Result<Product> {
    let id: String = row.try_get("id")?;
    let verified: i64 = row.try_get("verified")?;

    Ok(Product {
        id: Uuid::parse_str(&id)
            .map_err(|e| Error::Internal(format!("Corrupt UUID in products.id: {}", e)))?,
        barcode: row.try_get("barcode")?,
        name: row.try_get("name")?,
        brand: row.try_get("brand")?,
        category: row.try_get("category")?,
        description: row.try_get("description")?,
        image_ref: row.try_get("image_ref")?,
        ingredients: json_column(row, "ingredients")?,
        nutrition_facts: json_column(row, "nutrition_facts")?,
        claims: json_column(row, "claims")?,
        safety_score: row.try_get("safety_score")?,
        verified: verified != 0,
        warnings: json_column(row, "warnings")?,
        created_at: row.try_get("created_at")?,
    })
}

/// Insert a product row
///
/// A duplicate barcode surfaces as a unique violation; callers racing on
/// first-seen barcodes detect it with [`is_barcode_conflict`] and re-fetch
/// the winner's row instead of treating it as fatal.
pub async fn insert(pool: &SqlitePool, product: &Product) -> Result<()> {
    sqlx::query(
        r#"
        INSERT INTO products (
            id, barcode, name, brand, category, description, image_ref,
            ingredients, nutrition_facts, claims, safety_score, verified,
            warnings, created_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(product.id.to_string())
    .bind(&product.barcode)
    .bind(&product.name)
    .bind(&product.brand)
    .bind(&product.category)
    .bind(&product.description)
    .bind(&product.image_ref)
    .bind(serde_json::to_string(&product.ingredients).unwrap_or_else(|_| "[]".into()))
    .bind(serde_json::to_string(&product.nutrition_facts).unwrap_or_else(|_| "{}".into()))
    .bind(serde_json::to_string(&product.claims).unwrap_or_else(|_| "[]".into()))
    .bind(product.safety_score)
    .bind(product.verified as i64)
    .bind(serde_json::to_string(&product.warnings).unwrap_or_else(|_| "[]".into()))
    .bind(product.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// True when the error is a uniqueness conflict (lost barcode race)
pub fn is_barcode_conflict(err: &Error) -> bool {
    match err {
        Error::Database(sqlx::Error::Database(db)) => db.is_unique_violation(),
        _ => false,
    }
}

/// Load one product by id
pub async fn get(pool: &SqlitePool, id: Uuid) -> Result<Option<Product>> {
    let row = sqlx::query("SELECT * FROM products WHERE id = ?")
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(product_from_row).transpose()
}

/// Exact barcode lookup (the barcode pipeline's cache-hit check)
pub async fn find_by_barcode(pool: &SqlitePool, barcode: &str) -> Result<Option<Product>> {
    let row = sqlx::query("SELECT * FROM products WHERE barcode = ?")
        .bind(barcode)
        .fetch_optional(pool)
        .await?;

    row.as_ref().map(product_from_row).transpose()
}

/// Compact summaries for a set of product ids (history/dashboard joins)
pub async fn summaries(pool: &SqlitePool, ids: &[Uuid]) -> Result<Vec<ProductSummary>> {
    let mut out = Vec::with_capacity(ids.len());

    for id in ids {
        let row = sqlx::query(
            "SELECT id, name, brand, image_ref, safety_score FROM products WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(pool)
        .await?;

        if let Some(row) = row {
            let raw_id: String = row.try_get("id")?;
            out.push(ProductSummary {
                id: Uuid::parse_str(&raw_id)
                    .map_err(|e| Error::Internal(format!("Corrupt UUID in products.id: {}", e)))?,
                name: row.try_get("name")?,
                brand: row.try_get("brand")?,
                image_ref: row.try_get("image_ref")?,
                safety_score: row.try_get("safety_score")?,
            });
        }
    }

    Ok(out)
}

/// Search the catalog, sorted by safety score descending
///
/// Returns the requested page and the total match count.
pub async fn search(
    pool: &SqlitePool,
    filter: &SearchFilter,
    limit: i64,
    offset: i64,
) -> Result<(Vec<Product>, i64)> {
    // LIKE is case-insensitive for ASCII in SQLite; patterns are bound,
    // numeric bounds are typed integers so inline formatting is safe.
    let mut where_sql = String::from(" WHERE 1=1");

    if filter.query.is_some() {
        where_sql.push_str(" AND (name LIKE ? OR brand LIKE ? OR category LIKE ?)");
    }
    if filter.category.is_some() {
        where_sql.push_str(" AND category = ?");
    }
    if let Some(min) = filter.min_score {
        where_sql.push_str(&format!(" AND safety_score >= {}", min));
    }
    if let Some(max) = filter.max_score {
        where_sql.push_str(&format!(" AND safety_score <= {}", max));
    }

    let pattern = filter.query.as_ref().map(|q| format!("%{}%", q));

    let count_sql = format!("SELECT COUNT(*) FROM products{}", where_sql);
    let mut count_query = sqlx::query_scalar::<_, i64>(&count_sql);
    if let Some(pattern) = &pattern {
        count_query = count_query.bind(pattern).bind(pattern).bind(pattern);
    }
    if let Some(category) = &filter.category {
        count_query = count_query.bind(category);
    }
    let total = count_query.fetch_one(pool).await?;

    let page_sql = format!(
        "SELECT * FROM products{} ORDER BY safety_score DESC LIMIT {} OFFSET {}",
        where_sql, limit, offset
    );
    let mut page_query = sqlx::query(&page_sql);
    if let Some(pattern) = &pattern {
        page_query = page_query.bind(pattern).bind(pattern).bind(pattern);
    }
    if let Some(category) = &filter.category {
        page_query = page_query.bind(category);
    }
    let rows = page_query.fetch_all(pool).await?;

    let products = rows
        .iter()
        .map(product_from_row)
        .collect::<Result<Vec<_>>>()?;

    Ok((products, total))
}
