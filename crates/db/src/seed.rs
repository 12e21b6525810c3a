//! Sample catalog data for local development.
//!
//! Idempotent: running it twice creates nothing new.

use rust_decimal::Decimal;
use storefront_core::principal::Principal;
use storefront_core::types::DbId;

use crate::error::StoreError;
use crate::models::category::CreateCategory;
use crate::models::product::CreateProduct;
use crate::repositories::{CategoryRepo, ProductRepo, UserRepo};
use crate::DbPool;

/// What [`add_sample_data`] changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SeedReport {
    pub categories_created: usize,
    /// The user promoted to seller, if any user exists.
    pub seller_id: Option<DbId>,
    pub product_created: bool,
}

const SAMPLE_CATEGORIES: [(&str, &str); 2] = [
    ("Electronics", "Electronic devices"),
    ("Books", "Books and education"),
];

const SAMPLE_PRODUCT_NAME: &str = "iPhone 15";

/// Create the sample categories, promote the first user to seller and give
/// them a sample product.
pub async fn add_sample_data(pool: &DbPool) -> Result<SeedReport, StoreError> {
    let mut report = SeedReport::default();
    let mut electronics_id = None;
    let maintenance = Principal::maintenance();

    for (name, description) in SAMPLE_CATEGORIES {
        let category = match CategoryRepo::find_by_name(pool, name).await? {
            Some(existing) => existing,
            None => {
                report.categories_created += 1;
                CategoryRepo::create(
                    pool,
                    &maintenance,
                    &CreateCategory {
                        name: name.to_string(),
                        description: Some(description.to_string()),
                        ..Default::default()
                    },
                )
                .await?
            }
        };
        if name == "Electronics" {
            electronics_id = Some(category.id);
        }
    }

    let Some(user) = UserRepo::first(pool).await? else {
        tracing::info!(?report, "No users yet, skipping sample product");
        return Ok(report);
    };

    UserRepo::set_seller(pool, user.id, true).await?;
    report.seller_id = Some(user.id);

    if ProductRepo::find_by_name(pool, SAMPLE_PRODUCT_NAME).await?.is_none() {
        let seller = Principal {
            is_seller: true,
            ..user.principal()
        };
        ProductRepo::create(
            pool,
            &seller,
            &CreateProduct {
                name: SAMPLE_PRODUCT_NAME.to_string(),
                description: "Latest iPhone".to_string(),
                price: Decimal::new(1_599_999, 2),
                stock_quantity: Some(10),
                category_ids: electronics_id.into_iter().collect(),
                ..Default::default()
            },
        )
        .await?;
        report.product_created = true;
    }

    tracing::info!(?report, "Sample data created");
    Ok(report)
}
