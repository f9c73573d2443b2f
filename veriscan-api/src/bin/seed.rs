//! Catalog seeding tool
//!
//! Loads a small fixed product catalog into the database so search and
//! barcode cache hits work out of the box. Safe to re-run: existing
//! barcodes are left alone.

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use veriscan_api::db::products::{self, Product};
use veriscan_api::models::NutritionFacts;
use veriscan_common::config::{Config, Overrides};

#[derive(Debug, Parser)]
#[command(name = "seed", version)]
struct Cli {
    /// SQLite database file path
    #[arg(long)]
    database: Option<PathBuf>,
}

struct Seed {
    name: &'static str,
    brand: &'static str,
    barcode: &'static str,
    category: &'static str,
    description: &'static str,
    ingredients: &'static [&'static str],
    nutrition: NutritionFacts,
    claims: &'static [&'static str],
    safety_score: i64,
    verified: bool,
    warnings: &'static [&'static str],
}

fn catalog() -> Vec<Seed> {
    vec![
        Seed {
            name: "Organic Honey",
            brand: "Nature's Best",
            barcode: "8901234567890",
            category: "Sweeteners",
            description: "Pure organic honey sourced from natural beekeepers.",
            ingredients: &["Organic Honey"],
            nutrition: NutritionFacts {
                calories: Some(64.0),
                protein: Some(0.1),
                carbs: Some(17.0),
                sugar: Some(17.0),
                fat: Some(0.0),
                sodium: Some(1.0),
                fiber: None,
            },
            claims: &["100% Organic", "No Added Sugar", "Natural"],
            safety_score: 85,
            verified: true,
            warnings: &[],
        },
        Seed {
            name: "Whole Wheat Bread",
            brand: "Healthy Bake",
            barcode: "8901234567891",
            category: "Bakery",
            description: "Nutritious whole wheat bread for healthy living.",
            ingredients: &["Whole Wheat Flour", "Water", "Yeast", "Salt", "Sugar"],
            nutrition: NutritionFacts {
                calories: Some(247.0),
                protein: Some(13.0),
                carbs: Some(41.0),
                sugar: Some(5.0),
                fat: Some(3.4),
                sodium: Some(400.0),
                fiber: Some(7.0),
            },
            claims: &["High Fiber", "No Preservatives"],
            safety_score: 72,
            verified: true,
            warnings: &["Contains Gluten"],
        },
        Seed {
            name: "Greek Yogurt",
            brand: "DairyPure",
            barcode: "8901234567892",
            category: "Dairy",
            description: "Creamy Greek yogurt with high protein content.",
            ingredients: &["Milk", "Live Cultures"],
            nutrition: NutritionFacts {
                calories: Some(100.0),
                protein: Some(17.0),
                carbs: Some(6.0),
                sugar: Some(4.0),
                fat: Some(0.7),
                sodium: Some(65.0),
                fiber: None,
            },
            claims: &["High Protein", "Probiotic", "Low Fat"],
            safety_score: 90,
            verified: true,
            warnings: &[],
        },
        Seed {
            name: "Protein Bar",
            brand: "FitLife",
            barcode: "8901234567893",
            category: "Snacks",
            description: "High protein snack bar for fitness enthusiasts.",
            ingredients: &[
                "Protein Blend",
                "Sugar",
                "Palm Oil",
                "Artificial Flavors",
                "Preservatives",
            ],
            nutrition: NutritionFacts {
                calories: Some(220.0),
                protein: Some(20.0),
                carbs: Some(25.0),
                sugar: Some(15.0),
                fat: Some(8.0),
                sodium: Some(180.0),
                fiber: None,
            },
            claims: &["High Protein", "Energy Boost", "Healthy Snack"],
            safety_score: 45,
            verified: false,
            warnings: &[
                "High Sugar Content",
                "Contains Artificial Ingredients",
                "Misleading 'Healthy' Claim",
            ],
        },
        Seed {
            name: "Orange Juice",
            brand: "Fresh Squeeze",
            barcode: "8901234567894",
            category: "Beverages",
            description: "Fresh squeezed orange juice with no added sugar.",
            ingredients: &["Orange Juice", "Vitamin C"],
            nutrition: NutritionFacts {
                calories: Some(110.0),
                protein: Some(2.0),
                carbs: Some(26.0),
                sugar: Some(22.0),
                fat: Some(0.0),
                sodium: Some(0.0),
                fiber: None,
            },
            claims: &["100% Juice", "No Added Sugar", "Vitamin C Rich"],
            safety_score: 68,
            verified: true,
            warnings: &["High Natural Sugar"],
        },
        Seed {
            name: "Instant Noodles",
            brand: "QuickMeal",
            barcode: "8901234567895",
            category: "Ready to Eat",
            description: "Quick and easy instant noodles.",
            ingredients: &[
                "Refined Wheat Flour",
                "Palm Oil",
                "Salt",
                "MSG",
                "Artificial Colors",
                "Preservatives",
            ],
            nutrition: NutritionFacts {
                calories: Some(380.0),
                protein: Some(8.0),
                carbs: Some(52.0),
                sugar: Some(2.0),
                fat: Some(14.0),
                sodium: Some(1500.0),
                fiber: None,
            },
            claims: &["Tasty", "Quick Meal"],
            safety_score: 25,
            verified: false,
            warnings: &[
                "Very High Sodium",
                "Contains MSG",
                "Highly Processed",
                "Low Nutritional Value",
            ],
        },
    ]
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let overrides = Overrides {
        database_path: cli.database,
        ..Default::default()
    };
    let config = Config::resolve(overrides, None)?;
    config.ensure_directories()?;

    let pool = veriscan_api::db::init_database_pool(&config.database_path).await?;
    info!("Seeding catalog into {}", config.database_path.display());

    let mut inserted = 0;
    for seed in catalog() {
        if products::find_by_barcode(&pool, seed.barcode).await?.is_some() {
            continue;
        }

        let mut product = Product::new(seed.name);
        product.brand = Some(seed.brand.to_string());
        product.barcode = Some(seed.barcode.to_string());
        product.category = Some(seed.category.to_string());
        product.description = Some(seed.description.to_string());
        product.ingredients = seed.ingredients.iter().map(|s| s.to_string()).collect();
        product.nutrition_facts = seed.nutrition;
        product.claims = seed.claims.iter().map(|s| s.to_string()).collect();
        product.safety_score = seed.safety_score;
        product.verified = seed.verified;
        product.warnings = seed.warnings.iter().map(|s| s.to_string()).collect();

        products::insert(&pool, &product).await?;
        inserted += 1;
    }

    info!("Seeded {} products", inserted);
    Ok(())
}
