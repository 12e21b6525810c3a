//! Repository for the `product_images` table.

use std::collections::HashMap;

use sqlx::PgPool;
use storefront_core::authorization::{authorize, CatalogAction};
use storefront_core::pricing::default_alt_text;
use storefront_core::principal::Principal;
use storefront_core::types::{DbId, ProductId};

use crate::error::StoreError;
use crate::models::product::Product;
use crate::models::product_image::{CreateProductImage, ProductImage};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, product_id, image, alt_text, display_order, created_at";

/// Provides CRUD operations for product images.
pub struct ProductImageRepo;

impl ProductImageRepo {
    /// Attach an image to `product`. Only the owner or staff may do this.
    ///
    /// A missing alt text defaults to `"<product name> image"`.
    pub async fn create(
        pool: &PgPool,
        requester: &Principal,
        product: &Product,
        input: &CreateProductImage,
    ) -> Result<ProductImage, StoreError> {
        authorize(
            requester,
            CatalogAction::ManageProductImages {
                seller_id: product.seller_id,
            },
        )
        .into_result()?;
        input.validate()?;

        let alt_text = input
            .alt_text
            .clone()
            .filter(|t| !t.trim().is_empty())
            .unwrap_or_else(|| default_alt_text(&product.name));

        let query = format!(
            "INSERT INTO product_images (product_id, image, alt_text, display_order)
             VALUES ($1, $2, $3, COALESCE($4, 0))
             RETURNING {COLUMNS}"
        );
        let image = sqlx::query_as::<_, ProductImage>(&query)
            .bind(product.id)
            .bind(&input.image)
            .bind(alt_text)
            .bind(input.display_order)
            .fetch_one(pool)
            .await?;

        tracing::info!(product_id = %product.id, image_id = image.id, "Product image added");
        Ok(image)
    }

    /// Images of one product, ordered by `(display_order, created_at)`.
    pub async fn list_for_product(
        pool: &PgPool,
        product_id: ProductId,
    ) -> Result<Vec<ProductImage>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_images
             WHERE product_id = $1
             ORDER BY display_order, created_at, id"
        );
        sqlx::query_as::<_, ProductImage>(&query)
            .bind(product_id)
            .fetch_all(pool)
            .await
    }

    /// Images of many products, keyed by product id.
    pub async fn list_for_products(
        pool: &PgPool,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<ProductImage>>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM product_images
             WHERE product_id = ANY($1)
             ORDER BY display_order, created_at, id"
        );
        let images = sqlx::query_as::<_, ProductImage>(&query)
            .bind(product_ids)
            .fetch_all(pool)
            .await?;

        let mut map: HashMap<ProductId, Vec<ProductImage>> = HashMap::new();
        for image in images {
            map.entry(image.product_id).or_default().push(image);
        }
        Ok(map)
    }

    /// Remove one image of `product`. Only the owner or staff may do this.
    ///
    /// Returns `false` if the image does not belong to the product.
    pub async fn delete(
        pool: &PgPool,
        requester: &Principal,
        product: &Product,
        image_id: DbId,
    ) -> Result<bool, StoreError> {
        authorize(
            requester,
            CatalogAction::ManageProductImages {
                seller_id: product.seller_id,
            },
        )
        .into_result()?;

        let result = sqlx::query("DELETE FROM product_images WHERE id = $1 AND product_id = $2")
            .bind(image_id)
            .bind(product.id)
            .execute(pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
