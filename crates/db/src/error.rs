use storefront_core::error::CoreError;

/// Error returned by store operations that enforce catalog rules on top of
/// plain SQL.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// A rule violation: validation, permission, conflict or missing entity.
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}
