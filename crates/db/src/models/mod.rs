//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts
//! - A `Deserialize` update DTO (all `Option` fields) for patches

pub mod category;
pub mod product;
pub mod product_image;
pub mod session;
pub mod user;

use serde::{Deserialize, Deserializer};

/// Deserialize a clearable field: absent stays `None`, `null` becomes
/// `Some(None)`, a value becomes `Some(Some(v))`.
///
/// Use together with `#[serde(default)]`.
pub fn double_option<'de, T, D>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    T: Deserialize<'de>,
    D: Deserializer<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}
