//! Product entity model, API representation and DTOs.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use storefront_core::error::CoreError;
use storefront_core::pricing;
use storefront_core::slug::PRODUCT_SLUG_MAX_LEN;
use storefront_core::types::{DbId, ProductId, Timestamp};
use storefront_core::validation::{
    validate_max_len, validate_measure, validate_money, validate_name, validate_non_negative,
    validate_optional_len, validate_price, validate_slug, IMAGE_REF_MAX_LEN,
    META_DESCRIPTION_MAX_LEN, META_TITLE_MAX_LEN, PRODUCT_NAME_MAX_LEN,
    SHORT_DESCRIPTION_MAX_LEN,
};

use super::category::CategorySummary;
use super::product_image::ProductImage;

/// A row from the `products` table.
#[derive(Debug, Clone, FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock_quantity: i32,
    pub track_inventory: bool,
    pub allow_backorder: bool,
    pub weight: Option<Decimal>,
    pub dimensions_length: Option<Decimal>,
    pub dimensions_width: Option<Decimal>,
    pub dimensions_height: Option<Decimal>,
    pub seller_id: DbId,
    pub featured_image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl Product {
    pub fn is_in_stock(&self) -> bool {
        pricing::is_in_stock(self.track_inventory, self.stock_quantity, self.allow_backorder)
    }

    pub fn discount_percentage(&self) -> Decimal {
        pricing::discount_percentage(self.price, self.compare_price)
    }

    pub fn profit_margin(&self) -> Decimal {
        pricing::profit_margin(self.price, self.cost_price)
    }
}

/// A product joined with its seller's public identity.
#[derive(Debug, Clone, FromRow)]
pub struct ProductRow {
    #[sqlx(flatten)]
    pub product: Product,
    pub seller_username: String,
    pub seller_name: String,
}

/// Product as returned by the API.
///
/// `cost_price` and `profit_margin` are only present for the owner and staff;
/// an owner without a cost price sees `null`.
#[derive(Debug, Clone, Serialize)]
pub struct ProductResponse {
    pub id: ProductId,
    pub name: String,
    pub slug: String,
    pub sku: String,
    pub description: String,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost_price: Option<Option<Decimal>>,
    pub stock_quantity: i32,
    pub track_inventory: bool,
    pub allow_backorder: bool,
    pub weight: Option<Decimal>,
    pub dimensions_length: Option<Decimal>,
    pub dimensions_width: Option<Decimal>,
    pub dimensions_height: Option<Decimal>,
    pub seller: DbId,
    pub seller_username: String,
    pub seller_name: String,
    pub categories: Vec<CategorySummary>,
    pub images: Vec<ProductImage>,
    pub featured_image: Option<String>,
    pub is_active: bool,
    pub is_featured: bool,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    pub is_in_stock: bool,
    pub discount_percentage: Decimal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profit_margin: Option<Decimal>,
    pub view_count: i64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

impl ProductResponse {
    pub fn new(
        row: ProductRow,
        categories: Vec<CategorySummary>,
        images: Vec<ProductImage>,
        show_costs: bool,
    ) -> Self {
        let ProductRow {
            product: p,
            seller_username,
            seller_name,
        } = row;

        let is_in_stock = p.is_in_stock();
        let discount_percentage = p.discount_percentage();
        let profit_margin = show_costs.then(|| p.profit_margin());

        ProductResponse {
            id: p.id,
            name: p.name,
            slug: p.slug,
            sku: p.sku,
            description: p.description,
            short_description: p.short_description,
            price: p.price,
            compare_price: p.compare_price,
            cost_price: show_costs.then_some(p.cost_price),
            stock_quantity: p.stock_quantity,
            track_inventory: p.track_inventory,
            allow_backorder: p.allow_backorder,
            weight: p.weight,
            dimensions_length: p.dimensions_length,
            dimensions_width: p.dimensions_width,
            dimensions_height: p.dimensions_height,
            seller: p.seller_id,
            seller_username,
            seller_name,
            categories,
            images,
            featured_image: p.featured_image,
            is_active: p.is_active,
            is_featured: p.is_featured,
            meta_title: p.meta_title,
            meta_description: p.meta_description,
            is_in_stock,
            discount_percentage,
            profit_margin,
            view_count: p.view_count,
            created_at: p.created_at,
            updated_at: p.updated_at,
        }
    }
}

/// DTO for creating a new product. The seller is the authenticated caller.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CreateProduct {
    pub name: String,
    /// Derived from `name` when absent.
    pub slug: Option<String>,
    /// Generated from `name` when absent.
    pub sku: Option<String>,
    #[serde(default)]
    pub description: String,
    pub short_description: Option<String>,
    pub price: Decimal,
    pub compare_price: Option<Decimal>,
    pub cost_price: Option<Decimal>,
    pub stock_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    pub allow_backorder: Option<bool>,
    pub weight: Option<Decimal>,
    pub dimensions_length: Option<Decimal>,
    pub dimensions_width: Option<Decimal>,
    pub dimensions_height: Option<Decimal>,
    pub featured_image: Option<String>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    pub meta_title: Option<String>,
    pub meta_description: Option<String>,
    /// Unknown ids are ignored.
    #[serde(default)]
    pub category_ids: Vec<DbId>,
}

impl CreateProduct {
    pub fn validate(&self) -> Result<(), CoreError> {
        validate_name("name", &self.name, PRODUCT_NAME_MAX_LEN)?;
        if let Some(slug) = &self.slug {
            validate_slug("slug", slug, PRODUCT_SLUG_MAX_LEN)?;
        }
        if let Some(sku) = &self.sku {
            validate_name("sku", sku, storefront_core::slug::SKU_MAX_LEN)?;
        }
        validate_price(self.price)?;
        validate_money("compare_price", self.compare_price)?;
        validate_money("cost_price", self.cost_price)?;
        if let Some(stock) = self.stock_quantity {
            validate_non_negative("stock_quantity", stock)?;
        }
        validate_measure("weight", self.weight)?;
        validate_measure("dimensions_length", self.dimensions_length)?;
        validate_measure("dimensions_width", self.dimensions_width)?;
        validate_measure("dimensions_height", self.dimensions_height)?;
        validate_optional_len(
            "short_description",
            self.short_description.as_deref(),
            SHORT_DESCRIPTION_MAX_LEN,
        )?;
        validate_optional_len("featured_image", self.featured_image.as_deref(), IMAGE_REF_MAX_LEN)?;
        validate_optional_len("meta_title", self.meta_title.as_deref(), META_TITLE_MAX_LEN)?;
        validate_optional_len(
            "meta_description",
            self.meta_description.as_deref(),
            META_DESCRIPTION_MAX_LEN,
        )?;
        Ok(())
    }
}

/// DTO for updating a product. Slug, SKU and seller are immutable.
///
/// `category_ids`, when present, replaces the membership set.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateProduct {
    pub name: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub short_description: Option<Option<String>>,
    pub price: Option<Decimal>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub compare_price: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub cost_price: Option<Option<Decimal>>,
    pub stock_quantity: Option<i32>,
    pub track_inventory: Option<bool>,
    pub allow_backorder: Option<bool>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub weight: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub dimensions_length: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub dimensions_width: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub dimensions_height: Option<Option<Decimal>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub featured_image: Option<Option<String>>,
    pub is_active: Option<bool>,
    pub is_featured: Option<bool>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub meta_title: Option<Option<String>>,
    #[serde(default, deserialize_with = "super::double_option")]
    pub meta_description: Option<Option<String>>,
    pub category_ids: Option<Vec<DbId>>,
}

impl UpdateProduct {
    pub fn validate(&self) -> Result<(), CoreError> {
        if let Some(name) = &self.name {
            validate_name("name", name, PRODUCT_NAME_MAX_LEN)?;
        }
        if let Some(price) = self.price {
            validate_price(price)?;
        }
        validate_money("compare_price", self.compare_price.flatten())?;
        validate_money("cost_price", self.cost_price.flatten())?;
        if let Some(stock) = self.stock_quantity {
            validate_non_negative("stock_quantity", stock)?;
        }
        validate_measure("weight", self.weight.flatten())?;
        validate_measure("dimensions_length", self.dimensions_length.flatten())?;
        validate_measure("dimensions_width", self.dimensions_width.flatten())?;
        validate_measure("dimensions_height", self.dimensions_height.flatten())?;
        if let Some(Some(text)) = &self.short_description {
            validate_max_len("short_description", text, SHORT_DESCRIPTION_MAX_LEN)?;
        }
        if let Some(Some(image)) = &self.featured_image {
            validate_max_len("featured_image", image, IMAGE_REF_MAX_LEN)?;
        }
        if let Some(Some(title)) = &self.meta_title {
            validate_max_len("meta_title", title, META_TITLE_MAX_LEN)?;
        }
        if let Some(Some(text)) = &self.meta_description {
            validate_max_len("meta_description", text, META_DESCRIPTION_MAX_LEN)?;
        }
        Ok(())
    }
}

/// Query parameters for product listing. All filters are optional and
/// combined with AND.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProductListParams {
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    /// Range-style aliases of `min_price` / `max_price`.
    pub price_min: Option<Decimal>,
    pub price_max: Option<Decimal>,
    /// Membership in the active category with this id.
    pub category: Option<DbId>,
    /// Case-insensitive substring of any assigned category's name.
    pub category_name: Option<String>,
    pub in_stock: Option<bool>,
    pub low_stock: Option<bool>,
    /// Case-insensitive exact seller username.
    pub seller: Option<String>,
    pub created_after: Option<NaiveDate>,
    pub created_before: Option<NaiveDate>,
    /// Case-insensitive substring of the product name.
    pub name: Option<String>,
    pub is_featured: Option<bool>,
    pub is_active: Option<bool>,
    /// Case-insensitive substring of name, description or SKU.
    pub search: Option<String>,
    /// Comma-separated ordering terms, e.g. `-price,name`.
    pub ordering: Option<String>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ProductListParams {
    /// Effective lower price bound, combining `min_price` and `price_min`.
    pub fn lower_price(&self) -> Option<Decimal> {
        match (self.min_price, self.price_min) {
            (Some(a), Some(b)) => Some(a.max(b)),
            (a, b) => a.or(b),
        }
    }

    /// Effective upper price bound, combining `max_price` and `price_max`.
    pub fn upper_price(&self) -> Option<Decimal> {
        match (self.max_price, self.price_max) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }
}
