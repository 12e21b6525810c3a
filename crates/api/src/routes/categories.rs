//! Route definitions for the `/categories` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::categories;
use crate::state::AppState;

/// Routes mounted at `/categories`. `{key}` is an id or a slug.
///
/// ```text
/// GET    /                    -> list
/// POST   /                    -> create
/// GET    /{key}               -> get_by_key
/// PUT    /{key}               -> update
/// PATCH  /{key}               -> update
/// DELETE /{key}               -> delete (staff)
/// GET    /{key}/descendants   -> descendants
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(categories::list).post(categories::create))
        .route(
            "/{key}",
            get(categories::get_by_key)
                .put(categories::update)
                .patch(categories::update)
                .delete(categories::delete),
        )
        .route("/{key}/descendants", get(categories::descendants))
}
