//! Catalog domain rules shared by the persistence and HTTP layers.
//!
//! Nothing in this crate performs I/O: it holds the error taxonomy, the
//! principal and authorization policy, identifier derivation (slugs and SKUs),
//! category tree traversal, pricing properties, and the query-parameter
//! helpers used by the catalog query engine.

pub mod authorization;
pub mod catalog_query;
pub mod category_tree;
pub mod error;
pub mod pricing;
pub mod principal;
pub mod slug;
pub mod types;
pub mod validation;
