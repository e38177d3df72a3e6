use std::borrow::Cow;

use serde::{Deserialize, Serialize};

use crate::Role;

/// Permission identifier.
///
/// Permissions are modeled as opaque strings (e.g. "seats.manage").
/// A special wildcard permission `"*"` grants everything.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Permission(Cow<'static, str>);

impl Permission {
    /// Read any user's profile, list all users.
    pub const USERS_READ_ALL: Permission = Permission::from_static("users.read_all");
    /// Update or delete any user.
    pub const USERS_MANAGE: Permission = Permission::from_static("users.manage");
    /// Create, update and delete seats.
    pub const SEATS_MANAGE: Permission = Permission::from_static("seats.manage");
    /// List and read every reservation.
    pub const RESERVATIONS_READ_ALL: Permission = Permission::from_static("reservations.read_all");
    /// Change or cancel any reservation.
    pub const RESERVATIONS_MANAGE_ALL: Permission =
        Permission::from_static("reservations.manage_all");

    pub fn new(name: impl Into<Cow<'static, str>>) -> Self {
        Self(name.into())
    }

    pub const fn from_static(name: &'static str) -> Self {
        Self(Cow::Borrowed(name))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_wildcard(&self) -> bool {
        self.as_str() == "*"
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Role → permission mapping.
///
/// Admin is granted the wildcard; members hold no elevated permission and rely
/// on ownership checks.
pub fn permissions_for(role: Role) -> Vec<Permission> {
    match role {
        Role::Admin => vec![Permission::from_static("*")],
        Role::Member => Vec::new(),
    }
}
