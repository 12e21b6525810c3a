//! Category entity model and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::error::CoreError;
use storefront_core::slug::CATEGORY_SLUG_MAX_LEN;
use storefront_core::types::{DbId, Timestamp};
use storefront_core::validation::{
    validate_max_len, validate_name, validate_non_negative, validate_optional_len, validate_slug,
    CATEGORY_NAME_MAX_LEN, IMAGE_REF_MAX_LEN,
};

/// A row from the `categories` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Category {
    pub id: DbId,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    #[serde(rename = "parent")]
    pub parent_id: Option<DbId>,
    pub image: Option<String>,
    pub is_active: bool,
    pub display_order: i32,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// Category as returned by the API, with its recursive active product count.
#[derive(Debug, Clone, Serialize)]
pub struct CategoryResponse {
    #[serde(flatten)]
    pub category: Category,
    pub product_count: i64,
}

/// Minimal category reference embedded in product responses.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct CategorySummary {
    pub id: DbId,
    pub name: String,
    pub slug: String,
}

/// DTO for creating a new category.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateCategory {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    pub description: Option<String>,
    pub parent: Option<DbId>,
    pub image: Option<String>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

impl CreateCategory {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("name", &self.name, CATEGORY_NAME_MAX_LEN)?;
        if let Some(slug) = &self.slug {
            validate_slug("slug", slug, CATEGORY_SLUG_MAX_LEN)?;
        }
        validate_optional_len("image", self.image.as_deref(), IMAGE_REF_MAX_LEN)?;
        if let Some(order) = self.display_order {
            validate_non_negative("display_order", order)?;
        }
        Ok(())
    }
}

/// DTO for updating a category. Absent fields are left unchanged; clearable
/// fields accept `null`. The slug is never changed after creation.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateCategory {
    pub name: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub parent: Option<Option<DbId>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub image: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub display_order: Option<i32>,
}

impl UpdateCategory {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_name("name", name, CATEGORY_NAME_MAX_LEN)?;
        }
        if let Some(Some(image)) = &self.image {
            validate_max_len("image", image, IMAGE_REF_MAX_LEN)?;
        }
        if let Some(order) = self.display_order {
            validate_non_negative("display_order", order)?;
        }
        Ok(())
    }
}

/// Query parameters for category listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CategoryListParams {
    /// Case-insensitive substring of the name.
    pub name: Option<String>,
    /// Exact parent id.
    pub parent: Option<DbId>,
    pub is_active: Option<bool>,
    /// Only categories with (`true`) or without (`false`) direct products.
    pub has_products: Option<bool>,
    /// Case-insensitive substring of name or description.
    pub search: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}
