//! Handlers for images nested under `/products/{key}/images`.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use storefront_core::error::CoreError;
use storefront_core::types::DbId;
use storefront_db::models::product_image::{CreateProductImage, ProductImage};
use storefront_db::repositories::ProductImageRepo;

use crate::error::{AppError, AppResult};
use crate::handlers::products::find_row;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/products/{key}/images
pub async fn list(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> AppResult<Json<DataResponse<Vec<ProductImage>>>> {
    let row = find_row(&state, &key).await?;
    let images = ProductImageRepo::list_for_product(&state.pool, row.product.id).await?;
    Ok(Json(DataResponse { data: images }))
}

/// POST /api/v1/products/{key}/images
pub async fn create(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path(key): Path<String>,
    Json(input): Json<CreateProductImage>,
) -> AppResult<(StatusCode, Json<DataResponse<ProductImage>>)> {
    let row = find_row(&state, &key).await?;
    let image = ProductImageRepo::create(&state.pool, &principal, &row.product, &input).await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: image })))
}

/// DELETE /api/v1/products/{key}/images/{image_id}
pub async fn delete(
    State(state): State<AppState>,
    AuthUser(principal): AuthUser,
    Path((key, image_id)): Path<(String, DbId)>,
) -> AppResult<StatusCode> {
    let row = find_row(&state, &key).await?;
    if ProductImageRepo::delete(&state.pool, &principal, &row.product, image_id).await? {
        tracing::info!(product_id = %row.product.id, image_id, "Product image removed");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::Core(CoreError::not_found("ProductImage", image_id)))
    }
}
