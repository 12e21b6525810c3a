//! Handlers for the `/products` resource.
//!
//! `{key}` path segments accept either the product UUID or the slug.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::authorization::can_view_costs;
use storefront_core::catalog_query::{
    clamp_limit, clamp_offset, LookupKey, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE,
};
use storefront_core::error::CoreError;
use storefront_core::principal::Principal;
use storefront_core::types::ProductId;
use storefront_db::models::product::{
    CreateProduct, ProductListParams, ProductResponse, ProductRow, UpdateProduct,
};
use storefront_db::repositories::{ProductImageRepo, ProductRepo};

use crate::error::{AppError, AppResult};
use crate::middleware::auth::{AuthUser, MaybeAuthUser};
use crate::response::{DataResponse, PaginatedResponse};
use crate::state::AppState;

/// GET /api/v1/products
pub async fn list(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Query(params): Query<ProductListParams>,
) -> AppResult<Json<PaginatedResponse<ProductResponse>>> {
    let rows = ProductRepo::list(&state.pool, &params).await?;
    let count = ProductRepo::count(&state.pool, &params).await?;
    let data = build_responses(&state, rows, viewer.as_ref()).await?;

    Ok(Json(PaginatedResponse {
        data,
        count,
        limit: clamp_limit(params.limit, DEFAULT_PAGE_SIZE, MAX_PAGE_SIZE),
        offset: clamp_offset(params.offset),
    }))
}

/// POST /api/v1/products
///
/// The caller becomes the seller and must have the seller capability.
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Json(input): Json<CreateProduct>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductResponse>>)> {
    let product = ProductRepo::create(&state.pool, &principal, &input).await?;
    let data = load_response(&state, product.id, &principal).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data })))
}

/// GET /api/v1/products/{key}
///
/// Every successful read counts as one view.
pub async fn get_by_key(
    State(state): State<AppState>,
    MaybeAuthUser(viewer): MaybeAuthUser,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<ProductResponse>>> {
    let mut row = find_row(&state, &key).await?;

    row.product.view_count = ProductRepo::increment_view_count(&state.pool, row.product.id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Product", &key)))?;

    let data = build_one(&state, row, viewer.as_ref()).await?;
    Ok(Json(DataResponse { data }))
}

/// PUT|PATCH /api/v1/products/{key}
pub async fn update(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(key): Path<String>,
    Json(input): Json<UpdateProduct>,
) -> AppResult<Json<DataResponse<ProductResponse>>> {
    let existing = find_row(&state, &key).await?;

    let product = ProductRepo::update(&state.pool, &principal, existing.product.id, &input)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Product", &key)))?;
    let data = load_response(&state, product.id, &principal).await?;
    Ok(Json(DataResponse { data }))
}

/// DELETE /api/v1/products/{key}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(key): Path<String>,
) -> AppResult<StatusCode> {
    let existing = find_row(&state, &key).await?;

    if ProductRepo::delete(&state.pool, &principal, existing.product.id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("Product", key)))
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Resolve a UUID-or-slug path segment.
pub(crate) async fn find_row(state: &AppState, key: &str) -> AppResult<ProductRow> {
    ProductRepo::find_row_by_key(&state.pool, &LookupKey::<ProductId>::parse(key))
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Product", key)))
}

async fn load_response(
    state: &AppState,
    id: ProductId,
    viewer: &Principal,
) -> AppResult<ProductResponse> {
    let row = ProductRepo::find_row_by_id(&state.pool, id)
        .await?
        .ok_or(AppError::Core(CoreError::not_found("Product", id)))?;
    build_one(state, row, Some(viewer)).await
}

async fn build_one(
    state: &AppState,
    row: ProductRow,
    viewer: Option<&Principal>,
) -> AppResult<ProductResponse> {
    let id = row.product.id;
    build_responses(state, vec![row], viewer)
        .await?
        .pop()
        .ok_or(AppError::Core(CoreError::not_found("Product", id)))
}

/// Attach categories and images to a page of products with two queries.
/// Cost fields are included only where `viewer` owns the product or is staff.
async fn build_responses(
    state: &AppState,
    rows: Vec<ProductRow>,
    viewer: Option<&Principal>,
) -> AppResult<Vec<ProductResponse>> {
    let ids: Vec<ProductId> = rows.iter().map(|r| r.product.id).collect();
    let mut categories = ProductRepo::categories_for(&state.pool, &ids).await?;
    let mut images = ProductImageRepo::list_for_products(&state.pool, &ids).await?;

    Ok(rows
        .into_iter()
        .map(|row| {
            let id = row.product.id;
            let show_costs = can_view_costs(viewer, row.product.seller_id);
            ProductResponse::new(
                row,
                categories.remove(&id).unwrap_or_default(),
                images.remove(&id).unwrap_or_default(),
                show_costs,
            )
        })
        .collect())
}
