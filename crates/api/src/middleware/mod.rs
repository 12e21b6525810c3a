//! Authentication extractors.
//!
//! - [`auth::AuthUser`] -- Requires a valid Bearer token for an active user.
//! - [`auth::MaybeAuthUser`] -- Same, but anonymous requests pass through.

pub mod auth;
