//! Domain models for the client state core.
//!
//! Serialized names use camelCase because the persisted cart format and the
//! backend API both speak that JSON dialect.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use peddler_core::{Email, ProductId, Role, UserId};

// =============================================================================
// Cart
// =============================================================================

/// Product data captured at the moment an item is added to the cart.
///
/// This is a denormalized snapshot: the cart keeps the name, price and image
/// as they were at add time and never re-fetches them, so later backend
/// price changes do not retroactively update existing lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductSnapshot {
    /// Stable product identifier.
    pub product_id: ProductId,
    /// Display name at add time.
    pub name: String,
    /// Unit price at add time (currency-agnostic).
    pub price: Decimal,
    /// Image reference, if the product has one.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    /// Variant discriminator; the same product in two colors makes two lines.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
}

/// One line of the cart.
///
/// Identity is `(product_id, selected_color)`; `quantity` is always at least
/// one - a line that would drop to zero is removed instead.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: ProductId,
    pub name: String,
    pub price: Decimal,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_color: Option<String>,
    pub quantity: u32,
}

impl CartLine {
    /// Build a line from a product snapshot and an initial quantity.
    #[must_use]
    pub fn from_snapshot(product: ProductSnapshot, quantity: u32) -> Self {
        Self {
            product_id: product.product_id,
            name: product.name,
            price: product.price,
            image: product.image,
            selected_color: product.selected_color,
            quantity,
        }
    }

    /// Whether this line is identified by the given key.
    #[must_use]
    pub fn matches(&self, product_id: &ProductId, selected_color: Option<&str>) -> bool {
        self.product_id == *product_id && self.selected_color.as_deref() == selected_color
    }

    /// Snapshot price times quantity.
    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.price * Decimal::from(self.quantity)
    }
}

// =============================================================================
// Session
// =============================================================================

/// The authenticated user, as returned by the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: UserId,
    pub full_name: String,
    pub email: Email,
    pub role: Role,
}

/// Which part of the application the caller is currently in.
///
/// Session-expiry redirects send the user back to the login surface of the
/// area they were browsing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Area {
    /// Public shop pages.
    Storefront,
    /// Back-office pages.
    Admin,
}

/// Navigation target suggested by a session operation.
///
/// The stores do not navigate; callers own routing and map these to their
/// router.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Redirect {
    /// Public landing page.
    Storefront,
    /// Shopper dashboard.
    UserDashboard,
    /// Back-office dashboard.
    AdminDashboard,
    /// Public login form.
    UserLogin,
    /// Back-office login form.
    AdminLogin,
}

impl Redirect {
    /// Where a successful login should land, by role.
    #[must_use]
    pub const fn after_login(role: Role) -> Self {
        match role {
            Role::User => Self::UserDashboard,
            Role::Admin => Self::AdminDashboard,
        }
    }

    /// The login surface for an area, used when a session check fails.
    #[must_use]
    pub const fn login_for(area: Area) -> Self {
        match area {
            Area::Storefront => Self::UserLogin,
            Area::Admin => Self::AdminLogin,
        }
    }

    /// Where logging out should land, by the role being logged out of.
    #[must_use]
    pub const fn after_logout(role: Role) -> Self {
        match role {
            Role::User => Self::Storefront,
            Role::Admin => Self::AdminLogin,
        }
    }

    /// Route path for this target.
    #[must_use]
    pub const fn path(self) -> &'static str {
        match self {
            Self::Storefront => "/",
            Self::UserDashboard => "/dashboard",
            Self::AdminDashboard => "/admin/dashboard",
            Self::UserLogin => "/login",
            Self::AdminLogin => "/admin",
        }
    }
}
