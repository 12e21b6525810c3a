//! Product image model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::error::CoreError;
use storefront_core::types::{DbId, ProductId, Timestamp};
use storefront_core::validation::{
    validate_name, validate_non_negative, validate_optional_len, ALT_TEXT_MAX_LEN,
    IMAGE_REF_MAX_LEN,
};

/// A row from the `product_images` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ProductImage {
    pub id: DbId,
    #[serde(rename = "product")]
    pub product_id: ProductId,
    pub image: String,
    pub alt_text: Option<String>,
    pub display_order: i32,
    pub created_at: Timestamp,
}

/// DTO for attaching an image reference to a product.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateProductImage {
    pub image: String,
    /// Defaults to `"<product name> image"`.
    pub alt_text: Option<String>,
    pub display_order: Option<i32>,
}

impl CreateProductImage {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("image", &self.image, IMAGE_REF_MAX_LEN)?;
        validate_optional_len("alt_text", self.alt_text.as_deref(), ALT_TEXT_MAX_LEN)?;
        if let Some(order) = self.display_order {
            validate_non_negative("display_order", order)?;
        }
        Ok(())
    }
}
