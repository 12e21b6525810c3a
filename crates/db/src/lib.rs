//! PostgreSQL persistence for the storefront catalog.
//!
//! Holds the connection pool helpers, the embedded migrations, row models and
//! DTOs, and one repository per table.

use sqlx::postgres::PgPoolOptions;

pub mod error;
pub mod models;
pub mod repositories;
pub mod seed;

pub type DbPool = sqlx::PgPool;

pub const UQ_USERS_USERNAME: &str = "uq_users_username";
pub const UQ_CATEGORIES_NAME: &str = "uq_categories_name";
pub const UQ_CATEGORIES_SLUG: &str = "uq_categories_slug";
pub const UQ_PRODUCTS_SLUG: &str = "uq_products_slug";
pub const UQ_PRODUCTS_SKU: &str = "uq_products_sku";

/// Pool size used when none is configured.
pub const DEFAULT_MAX_CONNECTIONS: u32 = 20;

/// Create a connection pool from a database URL.
pub async fn create_pool(database_url: &str, max_connections: u32) -> Result<DbPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(database_url)
        .await
}

/// Round-trip a trivial query to verify connectivity.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

/// Apply all pending migrations from `db/migrations`.
pub async fn run_migrations(pool: &DbPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../db/migrations").run(pool).await
}

/// Name of the unique constraint violated by `err`, if that is what it is.
pub fn unique_violation(err: &sqlx::Error) -> Option<&str> {
    match err {
        sqlx::Error::Database(db_err) if db_err.code().as_deref() == Some("23505") => {
            db_err.constraint()
        }
        _ => None,
    }
}
