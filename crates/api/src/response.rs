//! Shared response envelope types for API handlers.
//!
//! Single resources use a `{ "data": ... }` envelope; lists add the total
//! match count and the effective page window.

use serde::Serialize;

/// Standard `{ "data": T }` response envelope.
///
/// # Example
///
/// ```ignore
/// Ok(Json(DataResponse { data: category }))
/// ```
#[derive(Debug, Serialize)]
pub struct DataResponse<T: Serialize> {
    pub data: T,
}

/// `{ "data": [...], "count", "limit", "offset" }` envelope for list
/// endpoints. `count` ignores pagination.
#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T: Serialize> {
    pub data: Vec<T>,
    pub count: i64,
    pub limit: i64,
    pub offset: i64,
}
