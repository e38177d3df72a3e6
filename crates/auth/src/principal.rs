
use cowork_core::UserId;

use crate::{Permission, Role, permissions_for};

/// An authenticated caller: identity plus the role carried by its token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub user_id: UserId,
    pub role: Role,
}

impl Principal {
    pub fn new(user_id: UserId, role: Role) -> Self {
        Self { user_id, role }
    }

    pub fn permissions(&self) -> Vec<Permission> {
        permissions_for(self.role)
    }

    pub fn is_admin(&self) -> bool {
        self.role == Role::Admin
    }
}
