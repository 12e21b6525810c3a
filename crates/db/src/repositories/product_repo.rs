//! Repository for the `products` table (the Product Store) and the product
//! side of the Catalog Query Engine.

use std::collections::HashMap;

use sqlx::{PgPool, Postgres, Transaction};
use storefront_core::authorization::{authorize, CatalogAction};
use storefront_core::catalog_query::{
    clamp_limit, clamp_offset, contains_pattern, end_of_day_exclusive, escape_like, start_of_day,
    LookupKey, ProductOrdering, ProductSortField, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use storefront_core::error::CoreError;
use storefront_core::principal::Principal;
use storefront_core::slug::{
    self, MAX_IDENTIFIER_ATTEMPTS, PRODUCT_SLUG_MAX_LEN, SKU_MAX_LEN,
};
use storefront_core::types::{DbId, ProductId};
use uuid::Uuid;

use crate::error::StoreError;
use crate::models::category::CategorySummary;
use crate::models::product::{CreateProduct, Product, ProductListParams, ProductRow, UpdateProduct};
use crate::{unique_violation, UQ_PRODUCTS_SKU, UQ_PRODUCTS_SLUG};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, sku, description, short_description, price, \
                        compare_price, cost_price, stock_quantity, track_inventory, \
                        allow_backorder, weight, dimensions_length, dimensions_width, \
                        dimensions_height, seller_id, featured_image, is_active, is_featured, \
                        meta_title, meta_description, view_count, created_at, updated_at";

/// [`ProductRow`] projection over `products p JOIN users u`.
const ROW_COLUMNS: &str = "p.id, p.name, p.slug, p.sku, p.description, p.short_description, \
                            p.price, p.compare_price, p.cost_price, p.stock_quantity, \
                            p.track_inventory, p.allow_backorder, p.weight, \
                            p.dimensions_length, p.dimensions_width, p.dimensions_height, \
                            p.seller_id, p.featured_image, p.is_active, p.is_featured, \
                            p.meta_title, p.meta_description, p.view_count, p.created_at, \
                            p.updated_at, u.username AS seller_username, \
                            CASE WHEN u.first_name <> '' AND u.last_name <> '' \
                                 THEN u.first_name || ' ' || u.last_name \
                                 ELSE u.username END AS seller_name";

const FROM_JOIN: &str = "FROM products p JOIN users u ON u.id = p.seller_id";

/// Product filter shared by `list` and `count`. Parameters `$1..$13`.
const FILTER: &str = "WHERE ($1::NUMERIC IS NULL OR p.price >= $1) \
                        AND ($2::NUMERIC IS NULL OR p.price <= $2) \
                        AND ($3::BIGINT IS NULL OR EXISTS ( \
                              SELECT 1 FROM product_categories pc \
                              JOIN categories c ON c.id = pc.category_id \
                              WHERE pc.product_id = p.id AND c.id = $3 AND c.is_active)) \
                        AND ($4::TEXT IS NULL OR EXISTS ( \
                              SELECT 1 FROM product_categories pc \
                              JOIN categories c ON c.id = pc.category_id \
                              WHERE pc.product_id = p.id AND c.name ILIKE $4)) \
                        AND ($5::BOOL IS NOT TRUE OR p.stock_quantity > 0) \
                        AND ($6::BOOL IS NOT TRUE OR (p.stock_quantity > 0 AND p.stock_quantity < 10)) \
                        AND ($7::TEXT IS NULL OR LOWER(u.username) = LOWER($7)) \
                        AND ($8::TIMESTAMPTZ IS NULL OR p.created_at >= $8) \
                        AND ($9::TIMESTAMPTZ IS NULL OR p.created_at < $9) \
                        AND ($10::TEXT IS NULL OR p.name ILIKE $10) \
                        AND ($11::BOOL IS NULL OR p.is_featured = $11) \
                        AND ($12::BOOL IS NULL OR p.is_active = $12) \
                        AND ($13::TEXT IS NULL OR p.name ILIKE $13 OR p.description ILIKE $13 \
                              OR p.sku ILIKE $13)";

/// Provides the Product Store operations and product queries.
pub struct ProductRepo;

impl ProductRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create a product owned by `seller`.
    ///
    /// Slug and SKU are derived when not supplied. A derived identifier that
    /// loses a race is recomputed and the insert retried, up to
    /// [`MAX_IDENTIFIER_ATTEMPTS`] times. Unknown `category_ids` are ignored.
    pub async fn create(
        pool: &PgPool,
        seller: &Principal,
        input: &CreateProduct,
    ) -> Result<Product, StoreError> {
        authorize(seller, CatalogAction::CreateProduct).into_result()?;
        input.validate()?;

        if let Some(slug) = &input.slug {
            if Self::slug_exists(pool, slug).await? {
                return Err(CoreError::invalid_field("slug", "A product with this slug already exists").into());
            }
        }
        if let Some(sku) = &input.sku {
            if Self::sku_exists(pool, sku).await? {
                return Err(CoreError::invalid_field("sku", "A product with this SKU already exists").into());
            }
        }

        let slug_base = slug::slug_base(&input.name, "product");
        let mut attempt = 1;
        loop {
            let slug = match &input.slug {
                Some(slug) => slug.clone(),
                None => Self::next_free_slug(pool, &slug_base).await?,
            };
            let sku = match &input.sku {
                Some(sku) => sku.clone(),
                None => Self::next_free_sku(pool, &input.name).await?,
            };

            let err = match Self::insert(pool, seller.id, input, &slug, &sku).await {
                Ok(product) => {
                    tracing::info!(
                        product_id = %product.id,
                        seller_id = seller.id,
                        slug = %product.slug,
                        sku = %product.sku,
                        "Product created",
                    );
                    return Ok(product);
                }
                Err(err) => err,
            };

            let retryable = match unique_violation(&err) {
                Some(UQ_PRODUCTS_SLUG) => input.slug.is_none(),
                Some(UQ_PRODUCTS_SKU) => input.sku.is_none(),
                _ => false,
            };
            if !retryable {
                return Err(err.into());
            }
            if attempt >= MAX_IDENTIFIER_ATTEMPTS {
                return Err(CoreError::Conflict(format!(
                    "Could not allocate a unique slug and SKU for '{}'",
                    input.name
                ))
                .into());
            }
            tracing::warn!(%slug, %sku, attempt, "Product identifier taken concurrently, retrying");
            attempt += 1;
        }
    }

    /// Insert the product row and its memberships in one transaction.
    async fn insert(
        pool: &PgPool,
        seller_id: DbId,
        input: &CreateProduct,
        slug: &str,
        sku: &str,
    ) -> Result<Product, sqlx::Error> {
        let mut tx = pool.begin().await?;

        let query = format!(
            "INSERT INTO products (
                id, name, slug, sku, description, short_description, price, compare_price,
                cost_price, stock_quantity, track_inventory, allow_backorder, weight,
                dimensions_length, dimensions_width, dimensions_height, seller_id,
                featured_image, is_active, is_featured, meta_title, meta_description
             )
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, COALESCE($10, 0), COALESCE($11, true),
                     COALESCE($12, false), $13, $14, $15, $16, $17, $18, COALESCE($19, true),
                     COALESCE($20, false), $21, $22)
             RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(Uuid::new_v4())
            .bind(input.name.trim())
            .bind(slug)
            .bind(sku)
            .bind(&input.description)
            .bind(&input.short_description)
            .bind(input.price)
            .bind(input.compare_price)
            .bind(input.cost_price)
            .bind(input.stock_quantity)
            .bind(input.track_inventory)
            .bind(input.allow_backorder)
            .bind(input.weight)
            .bind(input.dimensions_length)
            .bind(input.dimensions_width)
            .bind(input.dimensions_height)
            .bind(seller_id)
            .bind(&input.featured_image)
            .bind(input.is_active)
            .bind(input.is_featured)
            .bind(&input.meta_title)
            .bind(&input.meta_description)
            .fetch_one(&mut *tx)
            .await?;

        Self::set_categories_inner(&mut tx, product.id, &input.category_ids).await?;

        tx.commit().await?;
        Ok(product)
    }

    /// Update a product. Only the owner or staff may do this; slug, SKU and
    /// seller never change.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        requester: &Principal,
        id: ProductId,
        input: &UpdateProduct,
    ) -> Result<Option<Product>, StoreError> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(None);
        };
        authorize(
            requester,
            CatalogAction::UpdateProduct {
                seller_id: existing.seller_id,
            },
        )
        .into_result()?;
        input.validate()?;

        let mut tx = pool.begin().await?;

        let query = format!(
            "UPDATE products SET
                name = COALESCE($2, name),
                description = COALESCE($3, description),
                short_description = CASE WHEN $4 THEN $5 ELSE short_description END,
                price = COALESCE($6, price),
                compare_price = CASE WHEN $7 THEN $8 ELSE compare_price END,
                cost_price = CASE WHEN $9 THEN $10 ELSE cost_price END,
                stock_quantity = COALESCE($11, stock_quantity),
                track_inventory = COALESCE($12, track_inventory),
                allow_backorder = COALESCE($13, allow_backorder),
                weight = CASE WHEN $14 THEN $15 ELSE weight END,
                dimensions_length = CASE WHEN $16 THEN $17 ELSE dimensions_length END,
                dimensions_width = CASE WHEN $18 THEN $19 ELSE dimensions_width END,
                dimensions_height = CASE WHEN $20 THEN $21 ELSE dimensions_height END,
                featured_image = CASE WHEN $22 THEN $23 ELSE featured_image END,
                is_active = COALESCE($24, is_active),
                is_featured = COALESCE($25, is_featured),
                meta_title = CASE WHEN $26 THEN $27 ELSE meta_title END,
                meta_description = CASE WHEN $28 THEN $29 ELSE meta_description END,
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let product = sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(&input.description)
            .bind(input.short_description.is_some())
            .bind(input.short_description.clone().flatten())
            .bind(input.price)
            .bind(input.compare_price.is_some())
            .bind(input.compare_price.flatten())
            .bind(input.cost_price.is_some())
            .bind(input.cost_price.flatten())
            .bind(input.stock_quantity)
            .bind(input.track_inventory)
            .bind(input.allow_backorder)
            .bind(input.weight.is_some())
            .bind(input.weight.flatten())
            .bind(input.dimensions_length.is_some())
            .bind(input.dimensions_length.flatten())
            .bind(input.dimensions_width.is_some())
            .bind(input.dimensions_width.flatten())
            .bind(input.dimensions_height.is_some())
            .bind(input.dimensions_height.flatten())
            .bind(input.featured_image.is_some())
            .bind(input.featured_image.clone().flatten())
            .bind(input.is_active)
            .bind(input.is_featured)
            .bind(input.meta_title.is_some())
            .bind(input.meta_title.clone().flatten())
            .bind(input.meta_description.is_some())
            .bind(input.meta_description.clone().flatten())
            .fetch_optional(&mut *tx)
            .await?;

        let Some(product) = product else {
            return Ok(None);
        };

        if let Some(category_ids) = &input.category_ids {
            Self::set_categories_inner(&mut tx, product.id, category_ids).await?;
        }

        tx.commit().await?;
        tracing::info!(product_id = %product.id, requester_id = requester.id, "Product updated");
        Ok(Some(product))
    }

    /// Delete a product with its images and memberships. Only the owner or
    /// staff may do this.
    ///
    /// Returns `false` if no row with the given `id` exists.
    pub async fn delete(
        pool: &PgPool,
        requester: &Principal,
        id: ProductId,
    ) -> Result<bool, StoreError> {
        let Some(existing) = Self::find_by_id(pool, id).await? else {
            return Ok(false);
        };
        authorize(
            requester,
            CatalogAction::DeleteProduct {
                seller_id: existing.seller_id,
            },
        )
        .into_result()?;

        let result = sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(product_id = %id, requester_id = requester.id, "Product deleted");
        }
        Ok(deleted)
    }

    /// Atomically add one to the view counter, returning the new value.
    ///
    /// Touches no other column, `updated_at` included.
    pub async fn increment_view_count(
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<i64>, sqlx::Error> {
        sqlx::query_scalar(
            "UPDATE products SET view_count = view_count + 1 WHERE id = $1 RETURNING view_count",
        )
        .bind(id)
        .fetch_optional(pool)
        .await
    }

    /// Replace the category memberships of a product.
    ///
    /// Ids that do not name an existing category are skipped.
    async fn set_categories_inner(
        tx: &mut Transaction<'_, Postgres>,
        product_id: ProductId,
        category_ids: &[DbId],
    ) -> Result<(), sqlx::Error> {
        sqlx::query("DELETE FROM product_categories WHERE product_id = $1")
            .bind(product_id)
            .execute(&mut **tx)
            .await?;

        if category_ids.is_empty() {
            return Ok(());
        }

        let result = sqlx::query(
            "INSERT INTO product_categories (product_id, category_id)
             SELECT $1, c.id FROM categories c WHERE c.id = ANY($2)
             ON CONFLICT DO NOTHING",
        )
        .bind(product_id)
        .bind(category_ids)
        .execute(&mut **tx)
        .await?;

        let mut requested = category_ids.to_vec();
        requested.sort_unstable();
        requested.dedup();
        let ignored = (requested.len() as u64).saturating_sub(result.rows_affected());
        if ignored > 0 {
            tracing::warn!(%product_id, ignored, "Ignored unknown category ids");
        }
        Ok(())
    }

    // -----------------------------------------------------------------------
    // Identifiers
    // -----------------------------------------------------------------------

    pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    pub async fn sku_exists(pool: &PgPool, sku: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM products WHERE sku = $1)")
                .bind(sku)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// `base`, or `base-N` with the smallest free `N`.
    pub async fn next_free_slug(pool: &PgPool, base: &str) -> Result<String, sqlx::Error> {
        let taken: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM products WHERE slug = $1 OR slug LIKE $2")
                .bind(base)
                .bind(format!("{}-%", escape_like(base)))
                .fetch_all(pool)
                .await?;
        Ok(slug::next_available(base, &taken, PRODUCT_SLUG_MAX_LEN))
    }

    /// A fresh random SKU for `name`, suffixed with `-N` if already in use.
    pub async fn next_free_sku(pool: &PgPool, name: &str) -> Result<String, sqlx::Error> {
        let candidate = {
            let mut rng = rand::rng();
            slug::generate_sku(name, &mut rng)
        };
        let taken: Vec<String> =
            sqlx::query_scalar("SELECT sku FROM products WHERE sku = $1 OR sku LIKE $2")
                .bind(&candidate)
                .bind(format!("{}-%", escape_like(&candidate)))
                .fetch_all(pool)
                .await?;
        Ok(slug::next_available(&candidate, &taken, SKU_MAX_LEN))
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Find a bare product row by ID.
    pub async fn find_by_id(pool: &PgPool, id: ProductId) -> Result<Option<Product>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM products WHERE id = $1");
        sqlx::query_as::<_, Product>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find the oldest product with exactly this name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Product>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM products WHERE name = $1 ORDER BY created_at LIMIT 1");
        sqlx::query_as::<_, Product>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Find a product with its seller identity by ID.
    pub async fn find_row_by_id(
        pool: &PgPool,
        id: ProductId,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!("SELECT {ROW_COLUMNS} {FROM_JOIN} WHERE p.id = $1");
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a product with its seller identity by slug.
    pub async fn find_row_by_slug(
        pool: &PgPool,
        slug: &str,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        let query = format!("SELECT {ROW_COLUMNS} {FROM_JOIN} WHERE p.slug = $1");
        sqlx::query_as::<_, ProductRow>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a UUID-or-slug key, trying the UUID first.
    pub async fn find_row_by_key(
        pool: &PgPool,
        key: &LookupKey<ProductId>,
    ) -> Result<Option<ProductRow>, sqlx::Error> {
        if let Some(id) = key.id {
            if let Some(row) = Self::find_row_by_id(pool, id).await? {
                return Ok(Some(row));
            }
        }
        Self::find_row_by_slug(pool, &key.slug).await
    }

    /// Categories of each product, keyed by product id, ordered by
    /// `(display_order, name)`.
    pub async fn categories_for(
        pool: &PgPool,
        product_ids: &[ProductId],
    ) -> Result<HashMap<ProductId, Vec<CategorySummary>>, sqlx::Error> {
        let rows: Vec<(ProductId, DbId, String, String)> = sqlx::query_as(
            "SELECT pc.product_id, c.id, c.name, c.slug
             FROM product_categories pc
             JOIN categories c ON c.id = pc.category_id
             WHERE pc.product_id = ANY($1)
             ORDER BY c.display_order, c.name",
        )
        .bind(product_ids)
        .fetch_all(pool)
        .await?;

        let mut map: HashMap<ProductId, Vec<CategorySummary>> = HashMap::new();
        for (product_id, id, name, slug) in rows {
            map.entry(product_id)
                .or_default()
                .push(CategorySummary { id, name, slug });
        }
        Ok(map)
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// List products matching `params`, in the requested order.
    ///
    /// Fails with a validation error when `ordering` names an unknown field.
    pub async fn list(
        pool: &PgPool,
        params: &ProductListParams,
    ) -> Result<Vec<ProductRow>, StoreError> {
        let ordering = ProductOrdering::parse_list(params.ordering.as_deref())?;
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(params.offset);

        let query = format!(
            "SELECT {ROW_COLUMNS} {FROM_JOIN} {FILTER}
             ORDER BY {}
             LIMIT $14 OFFSET $15",
            order_by_clause(&ordering)
        );
        let rows = bind_filter(sqlx::query_as::<_, ProductRow>(&query), params)
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await?;
        Ok(rows)
    }

    /// Number of products matching `params`, ignoring pagination.
    pub async fn count(pool: &PgPool, params: &ProductListParams) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) {FROM_JOIN} {FILTER}");
        let (count,): (i64,) = bind_filter(sqlx::query_as(&query), params)
            .fetch_one(pool)
            .await?;
        Ok(count)
    }
}

type PgQueryAs<'q, O> = sqlx::query::QueryAs<'q, Postgres, O, sqlx::postgres::PgArguments>;

/// Bind `$1..$13` of [`FILTER`].
fn bind_filter<'q, O>(query: PgQueryAs<'q, O>, params: &'q ProductListParams) -> PgQueryAs<'q, O> {
    let created_from = params.created_after.map(start_of_day);
    let created_until = params.created_before.and_then(end_of_day_exclusive);

    query
        .bind(params.lower_price())
        .bind(params.upper_price())
        .bind(params.category)
        .bind(contains_pattern(params.category_name.as_deref()))
        .bind(params.in_stock)
        .bind(params.low_stock)
        .bind(params.seller.as_deref().map(str::trim).filter(|s| !s.is_empty()))
        .bind(created_from)
        .bind(created_until)
        .bind(contains_pattern(params.name.as_deref()))
        .bind(params.is_featured)
        .bind(params.is_active)
        .bind(contains_pattern(params.search.as_deref()))
}

/// `ORDER BY` body for the parsed ordering, with `p.id` as a stable
/// tie-break.
fn order_by_clause(ordering: &[ProductOrdering]) -> String {
    let mut terms: Vec<String> = ordering
        .iter()
        .map(|o| format!("{} {}", sort_column(o.field), o.direction.as_sql()))
        .collect();
    terms.push("p.id ASC".to_string());
    terms.join(", ")
}

fn sort_column(field: ProductSortField) -> &'static str {
    match field {
        ProductSortField::Name => "p.name",
        ProductSortField::Price => "p.price",
        ProductSortField::CreatedAt => "p.created_at",
        ProductSortField::ViewCount => "p.view_count",
        ProductSortField::StockQuantity => "p.stock_quantity",
    }
}
