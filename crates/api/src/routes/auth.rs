//! Route definitions for the `/auth` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::auth;
use crate::state::AppState;

/// Routes mounted at `/auth`.
///
/// ```text
/// POST  /register  -> register
/// POST  /login     -> login
/// POST  /refresh   -> refresh
/// POST  /logout    -> logout (requires auth)
/// GET   /profile   -> get_profile (requires auth)
/// PUT   /profile   -> update_profile (requires auth)
/// PATCH /profile   -> update_profile (requires auth)
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route(
            "/profile",
            get(auth::get_profile)
                .put(auth::update_profile)
                .patch(auth::update_profile),
        )
}
