//! Catalog authorization policy.
//!
//! Every mutating catalog operation is checked through [`authorize`] before
//! any write happens. The policy is a pure function of the principal and the
//! action, so it can be unit tested without a database or HTTP stack.

use serde::Serialize;

use crate::error::CoreError;
use crate::principal::Principal;
use crate::types::DbId;

/// An operation that needs a policy decision.
///
/// Product-scoped actions carry the owning seller so ownership can be checked
/// without a lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CatalogAction {
    CreateCategory,
    UpdateCategory,
    DeleteCategory,
    CreateProduct,
    UpdateProduct { seller_id: DbId },
    DeleteProduct { seller_id: DbId },
    ManageProductImages { seller_id: DbId },
}

/// Why a principal was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    InactiveAccount,
    NotSeller,
    NotOwner,
    StaffRequired,
}

impl DenyReason {
    pub fn message(self) -> &'static str {
        match self {
            DenyReason::InactiveAccount => "Account is deactivated",
            DenyReason::NotSeller => "Seller account required to create products",
            DenyReason::NotOwner => "Only the product owner or staff may modify this product",
            DenyReason::StaffRequired => "Staff role required",
        }
    }
}

/// Outcome of a policy check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(self) -> bool {
        matches!(self, Decision::Allow)
    }

    /// Convert a denial into [`CoreError::Forbidden`].
    pub fn into_result(self) -> Result<(), CoreError> {
        match self {
            Decision::Allow => Ok(()),
            Decision::Deny(reason) => Err(CoreError::Forbidden(reason.message().to_string())),
        }
    }
}

/// Decide whether `principal` may perform `action`.
///
/// | action                          | rule                     |
/// |---------------------------------|--------------------------|
/// | create / update category        | active principal         |
/// | delete category                 | active staff             |
/// | create product                  | active seller            |
/// | update / delete product, images | active owner or staff    |
pub fn authorize(principal: &Principal, action: CatalogAction) -> Decision {
    if !principal.is_active {
        return Decision::Deny(DenyReason::InactiveAccount);
    }

    match action {
        CatalogAction::CreateCategory | CatalogAction::UpdateCategory => Decision::Allow,
        CatalogAction::DeleteCategory => {
            if principal.is_staff {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::StaffRequired)
            }
        }
        CatalogAction::CreateProduct => {
            if principal.is_seller {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotSeller)
            }
        }
        CatalogAction::UpdateProduct { seller_id }
        | CatalogAction::DeleteProduct { seller_id }
        | CatalogAction::ManageProductImages { seller_id } => {
            if principal.is_staff || principal.owns(seller_id) {
                Decision::Allow
            } else {
                Decision::Deny(DenyReason::NotOwner)
            }
        }
    }
}

/// Whether `principal` may see seller-private fields (cost price, margin)
/// of a product owned by `seller_id`.
pub fn can_view_costs(principal: Option<&Principal>, seller_id: DbId) -> bool {
    principal.is_some_and(|p| p.is_active && (p.is_staff || p.owns(seller_id)))
}
