//! Route definitions for the `/products` resource, including nested images.

use axum::routing::{delete, get};
use axum::Router;

use crate::handlers::{product_images, products};
use crate::state::AppState;

/// Routes mounted at `/products`. `{key}` is a UUID or a slug.
///
/// ```text
/// GET    /                             -> list
/// POST   /                             -> create (seller)
/// GET    /{key}                        -> get_by_key (counts a view)
/// PUT    /{key}                        -> update (owner or staff)
/// PATCH  /{key}                        -> update (owner or staff)
/// DELETE /{key}                        -> delete (owner or staff)
///
/// GET    /{key}/images                 -> list
/// POST   /{key}/images                 -> create (owner or staff)
/// DELETE /{key}/images/{image_id}      -> delete (owner or staff)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(products::list).post(products::create))
        .route(
            "/{key}",
            get(products::get_by_key)
                .put(products::update)
                .patch(products::update)
                .delete(products::delete),
        )
        .route(
            "/{key}/images",
            get(product_images::list).post(product_images::create),
        )
        .route("/{key}/images/{image_id}", delete(product_images::delete))
}
