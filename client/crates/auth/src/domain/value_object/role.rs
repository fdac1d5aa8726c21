use derive_more::Display;
use serde::{Deserialize, Serialize};

/// User role, a closed enum
///
/// Gates route access. The role is never inferred client-side: it always
/// arrives in a backend identity payload, so parsing an unknown code is a
/// protocol error for the caller to surface, never a default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[display("user")]
    User,
    #[display("seller")]
    Seller,
    #[display("admin")]
    Admin,
}

impl Role {
    /// All role values, for exhaustive checks in tests and guards
    pub const ALL: [Role; 3] = [Role::User, Role::Seller, Role::Admin];

    #[inline]
    pub const fn code(&self) -> &'static str {
        use Role::*;
        match self {
            User => "user",
            Seller => "seller",
            Admin => "admin",
        }
    }

    /// Parse a backend role code
    #[inline]
    pub fn from_code(code: &str) -> Option<Self> {
        use Role::*;
        match code {
            "user" => Some(User),
            "seller" => Some(Seller),
            "admin" => Some(Admin),
            _ => None,
        }
    }

    #[inline]
    pub const fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }

    #[inline]
    pub const fn is_seller(&self) -> bool {
        matches!(self, Role::Seller)
    }

    #[inline]
    pub const fn is_user(&self) -> bool {
        matches!(self, Role::User)
    }
}
