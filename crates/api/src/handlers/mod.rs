pub mod auth;
pub mod categories;
pub mod product_images;
pub mod products;
