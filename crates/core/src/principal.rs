//! The authenticated identity performing a catalog operation.
//!
//! Principals are built by the HTTP layer from a verified access token and the
//! current user row, then passed explicitly into every policy check. Nothing in
//! the catalog looks identity up from ambient state.

use crate::types::DbId;

pub const ROLE_STAFF: &str = "staff";
pub const ROLE_SELLER: &str = "seller";
pub const ROLE_CUSTOMER: &str = "customer";

/// Capability flags of an already-authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: DbId,
    pub username: String,
    /// May list products for sale.
    pub is_seller: bool,
    /// Administrator: may modify any product and delete categories.
    pub is_staff: bool,
    pub is_active: bool,
}

impl Principal {
    /// Out-of-band administrator used by maintenance commands such as the
    /// sample data seeder. Never produced from an access token and owns
    /// nothing.
    pub fn maintenance() -> Self {
        Self {
            id: 0,
            username: "maintenance".to_string(),
            is_seller: false,
            is_staff: true,
            is_active: true,
        }
    }

    /// Whether this principal owns a resource belonging to `owner_id`.
    pub fn owns(&self, owner_id: DbId) -> bool {
        self.id == owner_id
    }

    /// Coarse role name carried in access tokens.
    pub fn role(&self) -> &'static str {
        if self.is_staff {
            ROLE_STAFF
        } else if self.is_seller {
            ROLE_SELLER
        } else {
            ROLE_CUSTOMER
        }
    }
}
