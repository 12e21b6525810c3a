pub mod auth;
pub mod categories;
pub mod health;
pub mod products;

use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::response::DataResponse;
use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /                                   endpoint index (public)
///
/// /auth/register                      register (public)
/// /auth/login                         login (public)
/// /auth/refresh                       refresh (public)
/// /auth/logout                        logout (requires auth)
/// /auth/profile                       get, update (requires auth)
///
/// /categories                         list, create
/// /categories/{key}                   get, update, delete
/// /categories/{key}/descendants       subtree listing
///
/// /products                           list, create
/// /products/{key}                     get, update, delete
/// /products/{key}/images              list, add
/// /products/{key}/images/{image_id}   remove
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(api_root))
        .nest("/auth", auth::router())
        .nest("/categories", categories::router())
        .nest("/products", products::router())
}

/// Top-level resources advertised by the API root.
#[derive(Serialize)]
pub struct ApiIndex {
    pub auth: &'static str,
    pub categories: &'static str,
    pub products: &'static str,
}

/// GET /api/v1
async fn api_root() -> Json<DataResponse<ApiIndex>> {
    Json(DataResponse {
        data: ApiIndex {
            auth: "/api/v1/auth",
            categories: "/api/v1/categories",
            products: "/api/v1/products",
        },
    })
}
