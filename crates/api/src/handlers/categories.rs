//! Handlers for the `/categories` resource.
//!
//! `{key}` path segments accept either the numeric id or the slug.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::catalog_query::{
    clamp_limit, clamp_offset, LookupKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use storefront_core::error::CoreError;
use storefront_core::types::DbId;
use storefront_db::models::category::{
    Category, CategoryListParams, CategoryResponse, CreateCategory, UpdateCategory,
};
use storefront_db::repositories::CategoryRepo;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// GET /api/v1/categories
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<CategoryListParams>,
) -> AppResult<Json<PaginatedResponse<CategoryResponse>>> {
    let categories = CategoryRepo::list(&state.pool, &params).await?;
    let count = CategoryRepo::count(&state.pool, &params).await?;
    let data = CategoryRepo::with_counts(&state.pool, categories).await?;

    Ok(Json(PaginatedResponse {
        data,
        count,
        limit: clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        offset: clamp_offset(params.offset),
    }))
}

/// POST /api/v1/categories
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<CreateCategory>,
) -> AppResult<(StatusCode, Json<DataResponse<CategoryResponse>>)> {
    let category = CategoryRepo::create(&state.pool, &principal, &input).await?;
    let data = with_count(&state, category).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/categories/{key}
pub async fn get_by_key(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<CategoryResponse>>> {
    let category = find(&state, &key).await?;
    let data = with_count(&state, category).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT|PATCH /api/v1/categories/{key}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(key): Path<String>,
    Json(input): Json<UpdateCategory>,
) -> AppResult<Json<DataResponse<CategoryResponse>>> {
    let existing = find(&state, &key).await?;
    let category = CategoryRepo::update(&state.pool, &principal, existing.id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", &key)))?;
    let data = with_count(&state, category).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/categories/{key}
///
/// Removes the whole subtree; products are only detached.
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let existing = find(&state, &key).await?;
    if CategoryRepo::delete(&state.pool, &principal, existing.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Category", key)))
    }
}

/// GET /api/v1/categories/{key}/descendants
///
/// All subcategories, depth-first, each with its recursive product count.
pub async fn descendants(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<Vec<CategoryResponse>>>> {
    let category = find(&state, &key).await?;
    let descendants = CategoryRepo::descendants(&state.pool, category.id).await?;
    let data = CategoryRepo::with_counts(&state.pool, descendants).await?;
    Ok(Json(DataResponse { data }))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

async fn find(state: &AppState, key: &str) -> AppResult<Category> {
    CategoryRepo::find_by_key(&state.pool, &LookupKey::<DbId>::parse(key))
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Category", key)))
}

async fn with_count(state: &AppState, category: Category) -> AppResult<CategoryResponse> {
    let product_count = CategoryRepo::product_count(&state.pool, category.id).await?;
    Ok(CategoryResponse {
        category,
        product_count,
    })
}
