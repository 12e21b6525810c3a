//! Load the sample catalog into the configured database.
//!
//! Safe to run repeatedly; existing sample rows are left alone.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "storefront_db=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let database_url = std::env::var("DATABASE_URL").expect("DATABASE_URL must be set");

    let pool = storefront_db::create_pool(&database_url, 2)
        .await
        .expect("Failed to connect to database");

    storefront_db::run_migrations(&pool)
        .await
        .expect("Failed to run database migrations");

    match storefront_db::seed::add_sample_data(&pool).await {
        Ok(report) => {
            if report.seller_id.is_none() {
                tracing::warn!("No users registered; the sample product was not created");
            }
            println!("Sample data created!");
        }
        Err(e) => {
            tracing::error!(error = %e, "Seeding failed");
            std::process::exit(1);
        }
    }
}
