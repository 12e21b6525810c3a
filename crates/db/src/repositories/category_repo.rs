//! Repository for the `categories` table (the Category Store).
//!
//! Reads return plain `sqlx::Error`. Writes take the acting [`Principal`],
//! enforce the catalog rules (policy, name and slug uniqueness, parent
//! existence, no cycles) and return [`StoreError`].

use std::collections::HashMap;

use sqlx::PgPool;
use storefront_core::catalog_query::{
    clamp_limit, clamp_offset, contains_pattern, escape_like, LookupKey, DEFAULT_PAGE_SIZE,
    MAX_PAGE_SIZE,
};
use storefront_core::authorization::{authorize, CatalogAction};
use storefront_core::category_tree::CategoryTree;
use storefront_core::error::CoreError;
use storefront_core::principal::Principal;
use storefront_core::slug::{self, CATEGORY_SLUG_MAX_LEN, MAX_IDENTIFIER_ATTEMPTS};
use storefront_core::types::DbId;

use crate::error::StoreError;
use crate::models::category::{
    Category, CategoryListParams, CategoryResponse, CreateCategory, UpdateCategory,
};
use crate::{unique_violation, UQ_CATEGORIES_SLUG};

/// Column list shared across queries to avoid repetition.
const COLUMNS: &str = "id, name, slug, description, parent_id, image, is_active, \
                        display_order, created_at, updated_at";

/// Filter shared by `list` and `count`. Parameters `$1..$5`.
const FILTER: &str = "WHERE ($1::TEXT IS NULL OR c.name ILIKE $1) \
                        AND ($2::BIGINT IS NULL OR c.parent_id = $2) \
                        AND ($3::BOOL IS NULL OR c.is_active = $3) \
                        AND ($4::BOOL IS NULL OR EXISTS ( \
                              SELECT 1 FROM product_categories pc WHERE pc.category_id = c.id \
                            ) = $4) \
                        AND ($5::TEXT IS NULL OR c.name ILIKE $5 \
                              OR COALESCE(c.description, '') ILIKE $5)";

/// Provides the Category Store operations.
pub struct CategoryRepo;

impl CategoryRepo {
    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create a category, deriving a unique slug from the name when none is
    /// supplied.
    ///
    /// Auto-derived slugs that lose a race to a concurrent insert are
    /// recomputed and retried up to [`MAX_IDENTIFIER_ATTEMPTS`] times.
    pub async fn create(
        pool: &PgPool,
        actor: &Principal,
        input: &CreateCategory,
    ) -> Result<Category, StoreError> {
        authorize(actor, CatalogAction::CreateCategory).into_result()?;
        input.validate()?;

        if Self::name_exists(pool, &input.name, None).await? {
            return Err(CoreError::invalid_field("name", "A category with this name already exists").into());
        }
        if let Some(parent_id) = input.parent {
            if Self::find_by_id(pool, parent_id).await?.is_none() {
                return Err(CoreError::invalid_field(
                    "parent",
                    format!("Category {parent_id} does not exist"),
                )
                .into());
            }
        }

        if let Some(slug) = &input.slug {
            if Self::slug_exists(pool, slug).await? {
                return Err(CoreError::invalid_field("slug", "A category with this slug already exists").into());
            }
            let category = Self::insert(pool, input, slug).await?;
            tracing::info!(category_id = category.id, slug = %category.slug, user_id = actor.id, "Category created");
            return Ok(category);
        }

        let base = slug::slug_base(&input.name, "category");
        let mut attempt = 1;
        loop {
            let candidate = Self::next_free_slug(pool, &base).await?;
            match Self::insert(pool, input, &candidate).await {
                Ok(category) => {
                    tracing::info!(category_id = category.id, slug = %category.slug, user_id = actor.id, "Category created");
                    return Ok(category);
                }
                Err(err) if unique_violation(&err) == Some(UQ_CATEGORIES_SLUG) => {
                    if attempt >= MAX_IDENTIFIER_ATTEMPTS {
                        return Err(CoreError::Conflict(format!(
                            "Could not allocate a unique slug for '{}'",
                            input.name
                        ))
                        .into());
                    }
                    tracing::warn!(slug = %candidate, attempt, "Category slug taken concurrently, retrying");
                    attempt += 1;
                }
                Err(err) => return Err(err.into()),
            }
        }
    }

    async fn insert(
        pool: &PgPool,
        input: &CreateCategory,
        slug: &str,
    ) -> Result<Category, sqlx::Error> {
        let query = format!(
            "INSERT INTO categories (name, slug, description, parent_id, image, is_active, display_order)
             VALUES ($1, $2, $3, $4, $5, COALESCE($6, true), COALESCE($7, 0))
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(input.name.trim())
            .bind(slug)
            .bind(&input.description)
            .bind(input.parent)
            .bind(&input.image)
            .bind(input.is_active)
            .bind(input.display_order)
            .fetch_one(pool)
            .await
    }

    /// Update a category. Only present fields in `input` are applied; the
    /// slug never changes.
    ///
    /// Returns `None` if no row with the given `id` exists.
    pub async fn update(
        pool: &PgPool,
        actor: &Principal,
        id: DbId,
        input: &UpdateCategory,
    ) -> Result<Option<Category>, StoreError> {
        authorize(actor, CatalogAction::UpdateCategory).into_result()?;
        input.validate()?;

        if Self::find_by_id(pool, id).await?.is_none() {
            return Ok(None);
        }
        if let Some(name) = &input.name {
            if Self::name_exists(pool, name, Some(id)).await? {
                return Err(CoreError::invalid_field("name", "A category with this name already exists").into());
            }
        }
        if let Some(Some(parent_id)) = input.parent {
            let tree = Self::tree(pool).await?;
            if !tree.contains(parent_id) {
                return Err(CoreError::invalid_field(
                    "parent",
                    format!("Category {parent_id} does not exist"),
                )
                .into());
            }
            if tree.would_create_cycle(id, parent_id) {
                return Err(CoreError::invalid_field(
                    "parent",
                    "A category cannot be moved under itself or one of its descendants",
                )
                .into());
            }
        }

        let query = format!(
            "UPDATE categories SET
                name = COALESCE($2, name),
                description = CASE WHEN $3 THEN $4 ELSE description END,
                parent_id = CASE WHEN $5 THEN $6 ELSE parent_id END,
                image = CASE WHEN $7 THEN $8 ELSE image END,
                is_active = COALESCE($9, is_active),
                display_order = COALESCE($10, display_order),
                updated_at = NOW()
             WHERE id = $1
             RETURNING {COLUMNS}"
        );
        let category = sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .bind(input.name.as_deref().map(str::trim))
            .bind(input.description.is_some())
            .bind(input.description.clone().flatten())
            .bind(input.parent.is_some())
            .bind(input.parent.flatten())
            .bind(input.image.is_some())
            .bind(input.image.clone().flatten())
            .bind(input.is_active)
            .bind(input.display_order)
            .fetch_optional(pool)
            .await?;

        if let Some(category) = &category {
            tracing::info!(category_id = category.id, user_id = actor.id, "Category updated");
        }
        Ok(category)
    }

    /// Delete a category together with its whole subtree. Products are
    /// detached, never deleted.
    ///
    /// Returns `true` if a row was removed.
    pub async fn delete(pool: &PgPool, actor: &Principal, id: DbId) -> Result<bool, StoreError> {
        authorize(actor, CatalogAction::DeleteCategory).into_result()?;
        let result = sqlx::query("DELETE FROM categories WHERE id = $1")
            .bind(id)
            .execute(pool)
            .await?;
        let deleted = result.rows_affected() > 0;
        if deleted {
            tracing::info!(category_id = id, user_id = actor.id, "Category deleted");
        }
        Ok(deleted)
    }

    // -----------------------------------------------------------------------
    // Lookups
    // -----------------------------------------------------------------------

    /// Find a category by internal ID.
    pub async fn find_by_id(pool: &PgPool, id: DbId) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE id = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by slug.
    pub async fn find_by_slug(pool: &PgPool, slug: &str) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE slug = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(slug)
            .fetch_optional(pool)
            .await
    }

    /// Find a category by exact name.
    pub async fn find_by_name(pool: &PgPool, name: &str) -> Result<Option<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories WHERE name = $1");
        sqlx::query_as::<_, Category>(&query)
            .bind(name)
            .fetch_optional(pool)
            .await
    }

    /// Resolve an id-or-slug key, trying the id first.
    pub async fn find_by_key(
        pool: &PgPool,
        key: &LookupKey<DbId>,
    ) -> Result<Option<Category>, sqlx::Error> {
        if let Some(id) = key.id {
            if let Some(category) = Self::find_by_id(pool, id).await? {
                return Ok(Some(category));
            }
        }
        Self::find_by_slug(pool, &key.slug).await
    }

    /// Whether another category already uses `name`.
    pub async fn name_exists(
        pool: &PgPool,
        name: &str,
        exclude_id: Option<DbId>,
    ) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) = sqlx::query_as(
            "SELECT EXISTS (
                SELECT 1 FROM categories
                WHERE name = $1 AND ($2::BIGINT IS NULL OR id <> $2)
             )",
        )
        .bind(name.trim())
        .bind(exclude_id)
        .fetch_one(pool)
        .await?;
        Ok(exists)
    }

    pub async fn slug_exists(pool: &PgPool, slug: &str) -> Result<bool, sqlx::Error> {
        let (exists,): (bool,) =
            sqlx::query_as("SELECT EXISTS (SELECT 1 FROM categories WHERE slug = $1)")
                .bind(slug)
                .fetch_one(pool)
                .await?;
        Ok(exists)
    }

    /// `base`, or `base-N` with the smallest free `N`.
    pub async fn next_free_slug(pool: &PgPool, base: &str) -> Result<String, sqlx::Error> {
        let taken: Vec<String> =
            sqlx::query_scalar("SELECT slug FROM categories WHERE slug = $1 OR slug LIKE $2")
                .bind(base)
                .bind(format!("{}-%", escape_like(base)))
                .fetch_all(pool)
                .await?;
        Ok(slug::next_available(base, &taken, CATEGORY_SLUG_MAX_LEN))
    }

    // -----------------------------------------------------------------------
    // Listing
    // -----------------------------------------------------------------------

    /// List categories matching `params`, ordered by `(display_order, name)`.
    pub async fn list(
        pool: &PgPool,
        params: &CategoryListParams,
    ) -> Result<Vec<Category>, sqlx::Error> {
        let limit = clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE);
        let offset = clamp_offset(params.offset);
        let query = format!(
            "SELECT {COLUMNS} FROM categories c {FILTER}
             ORDER BY c.display_order, c.name
             LIMIT $6 OFFSET $7"
        );
        sqlx::query_as::<_, Category>(&query)
            .bind(contains_pattern(params.name.as_deref()))
            .bind(params.parent)
            .bind(params.is_active)
            .bind(params.has_products)
            .bind(contains_pattern(params.search.as_deref()))
            .bind(limit)
            .bind(offset)
            .fetch_all(pool)
            .await
    }

    /// Number of categories matching `params`, ignoring pagination.
    pub async fn count(pool: &PgPool, params: &CategoryListParams) -> Result<i64, sqlx::Error> {
        let query = format!("SELECT COUNT(*) FROM categories c {FILTER}");
        sqlx::query_scalar(&query)
            .bind(contains_pattern(params.name.as_deref()))
            .bind(params.parent)
            .bind(params.is_active)
            .bind(params.has_products)
            .bind(contains_pattern(params.search.as_deref()))
            .fetch_one(pool)
            .await
    }

    // -----------------------------------------------------------------------
    // Hierarchy
    // -----------------------------------------------------------------------

    /// Load the full hierarchy, children in `(display_order, name)` order.
    pub async fn tree(pool: &PgPool) -> Result<CategoryTree, sqlx::Error> {
        let edges: Vec<(DbId, Option<DbId>)> =
            sqlx::query_as("SELECT id, parent_id FROM categories ORDER BY display_order, name")
                .fetch_all(pool)
                .await?;
        Ok(CategoryTree::new(edges))
    }

    /// All descendants of `id` in depth-first pre-order. Empty for a leaf.
    pub async fn descendants(pool: &PgPool, id: DbId) -> Result<Vec<Category>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM categories ORDER BY display_order, name");
        let rows = sqlx::query_as::<_, Category>(&query).fetch_all(pool).await?;

        let tree = CategoryTree::new(rows.iter().map(|c| (c.id, c.parent_id)));
        let mut by_id: HashMap<DbId, Category> = rows.into_iter().map(|c| (c.id, c)).collect();

        Ok(tree
            .descendants(id)
            .into_iter()
            .filter_map(|d| by_id.remove(&d))
            .collect())
    }

    /// Active products directly assigned to each category. Categories with
    /// none are absent from the map.
    pub async fn direct_active_product_counts(
        pool: &PgPool,
    ) -> Result<HashMap<DbId, i64>, sqlx::Error> {
        let rows: Vec<(DbId, i64)> = sqlx::query_as(
            "SELECT pc.category_id, COUNT(*)
             FROM product_categories pc
             JOIN products p ON p.id = pc.product_id
             WHERE p.is_active
             GROUP BY pc.category_id",
        )
        .fetch_all(pool)
        .await?;
        Ok(rows.into_iter().collect())
    }

    /// Active products assigned to `id` or any of its descendants.
    pub async fn product_count(pool: &PgPool, id: DbId) -> Result<i64, sqlx::Error> {
        let counts = Self::product_counts(pool, [id]).await?;
        Ok(counts.get(&id).copied().unwrap_or(0))
    }

    /// [`product_count`](Self::product_count) for many categories using two
    /// queries in total.
    pub async fn product_counts(
        pool: &PgPool,
        ids: impl IntoIterator<Item = DbId>,
    ) -> Result<HashMap<DbId, i64>, sqlx::Error> {
        let tree = Self::tree(pool).await?;
        let direct = Self::direct_active_product_counts(pool).await?;
        Ok(tree.subtree_totals(ids, &direct))
    }

    /// Attach recursive product counts to a page of categories.
    pub async fn with_counts(
        pool: &PgPool,
        categories: Vec<Category>,
    ) -> Result<Vec<CategoryResponse>, sqlx::Error> {
        let counts = Self::product_counts(pool, categories.iter().map(|c| c.id)).await?;
        Ok(categories
            .into_iter()
            .map(|category| CategoryResponse {
                product_count: counts.get(&category.id).copied().unwrap_or(0),
                category,
            })
            .collect())
    }
}
