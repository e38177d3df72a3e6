//! Authorization checks (pure policy, no IO).

use cowork_core::{Error, Outcome, UserId};

use crate::{Permission, Principal};

fn forbidden(required: &Permission) -> Error {
    Error::forbidden(
        "Auth.Forbidden",
        format!("missing permission '{}'", required.as_str()),
    )
}

/// Authorize a principal for a permission.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(principal: &Principal, required: &Permission) -> Outcome<()> {
    let granted = principal
        .permissions()
        .iter()
        .any(|p| p.is_wildcard() || p == required);

    if granted {
        Ok(())
    } else {
        Err(forbidden(required).into())
    }
}

/// Allow the owner of a resource, or anyone holding `permission`.
pub fn ensure_self_or(principal: &Principal, owner: UserId, permission: &Permission) -> Outcome<()> {
    if principal.user_id == owner {
        return Ok(());
    }
    authorize(principal, permission)
}
