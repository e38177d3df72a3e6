use chrono::Utc;

use cowork_auth::{
    Email, NewUser, Permission, Principal, Role, User, UserChanges, UserErrors, authorize,
    ensure_self_or,
};
use cowork_core::{Outcome, UserId, from_option_or};

use super::{Handle, Handlers, StoreResultExt, hash_off_thread, verify_off_thread};
use crate::repository::{Repository, ReservationRepository, UserRepository};

/// Create an account. The first account in an empty store becomes an admin.
#[derive(Debug, Clone)]
pub struct RegisterUser {
    pub input: NewUser,
}

/// Exchange credentials for the matching user.
#[derive(Clone)]
pub struct Authenticate {
    pub email: String,
    pub password: String,
}

impl core::fmt::Debug for Authenticate {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Authenticate")
            .field("email", &self.email)
            .field("password", &"***")
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct GetUser {
    pub actor: Principal,
    pub id: UserId,
}

#[derive(Debug, Clone)]
pub struct ListUsers {
    pub actor: Principal,
}

#[derive(Debug, Clone)]
pub struct UpdateUser {
    pub actor: Principal,
    pub id: UserId,
    pub changes: UserChanges,
}

/// Remove an account together with its reservations.
#[derive(Debug, Clone)]
pub struct DeleteUser {
    pub actor: Principal,
    pub id: UserId,
}

impl Handlers {
    pub(crate) async fn load_user(&self, id: UserId) -> Outcome<User> {
        let found = self.repos.users.get(id).await.or_store_failure("get_user")?;
        from_option_or(found, UserErrors::not_found(id))
    }

    async fn ensure_email_free(&self, email: &Email, owner: Option<UserId>) -> Outcome<()> {
        let existing = self
            .repos
            .users
            .find_by_email(email)
            .await
            .or_store_failure("find_user_by_email")?;
        match existing {
            Some(other) if Some(other.id) != owner => Err(UserErrors::email_taken(email).into()),
            _ => Ok(()),
        }
    }
}

#[async_trait::async_trait]
impl Handle<RegisterUser> for Handlers {
    type Output = User;

    async fn handle(&self, command: RegisterUser) -> Outcome<User> {
        let registration = command.input.validate()?;
        self.ensure_email_free(&registration.email, None).await?;

        let password_hash = hash_off_thread(registration.password.clone()).await?;
        let email = registration.email.clone();
        let mut user =
            User::register(UserId::new(), registration, password_hash, Role::Member, Utc::now());

        // The store decides whether this is the first account.
        user.role = self
            .repos
            .users
            .insert_registration(&user)
            .await
            .or_conflict("insert_user", |_| UserErrors::email_taken(&email))?;

        tracing::info!(user_id = %user.id, role = %user.role, "user registered");
        Ok(user)
    }
}

#[async_trait::async_trait]
impl Handle<Authenticate> for Handlers {
    type Output = User;

    async fn handle(&self, command: Authenticate) -> Outcome<User> {
        // Unknown and malformed emails fail exactly like a wrong password.
        let Ok(email) = Email::parse(&command.email) else {
            return Err(UserErrors::invalid_credentials().into());
        };
        let Some(user) = self
            .repos
            .users
            .find_by_email(&email)
            .await
            .or_store_failure("find_user_by_email")?
        else {
            tracing::debug!("login attempt for unknown email");
            return Err(UserErrors::invalid_credentials().into());
        };

        verify_off_thread(command.password, user.password_hash.clone()).await?;
        tracing::info!(user_id = %user.id, "user authenticated");
        Ok(user)
    }
}

#[async_trait::async_trait]
impl Handle<GetUser> for Handlers {
    type Output = User;

    async fn handle(&self, command: GetUser) -> Outcome<User> {
        ensure_self_or(&command.actor, command.id, &Permission::USERS_READ_ALL)?;
        self.load_user(command.id).await
    }
}

#[async_trait::async_trait]
impl Handle<ListUsers> for Handlers {
    type Output = Vec<User>;

    async fn handle(&self, command: ListUsers) -> Outcome<Vec<User>> {
        authorize(&command.actor, &Permission::USERS_READ_ALL)?;
        self.repos.users.list().await.or_store_failure("list_users")
    }
}

#[async_trait::async_trait]
impl Handle<UpdateUser> for Handlers {
    type Output = User;

    async fn handle(&self, command: UpdateUser) -> Outcome<User> {
        let UpdateUser { actor, id, changes } = command;
        ensure_self_or(&actor, id, &Permission::USERS_MANAGE)?;
        if changes.role.is_some() && !actor.is_admin() {
            return Err(UserErrors::cannot_change_role().into());
        }

        let changes = changes.validate()?;
        let current = self.load_user(id).await?;
        if let Some(email) = &changes.email {
            self.ensure_email_free(email, Some(id)).await?;
        }

        let password_hash = match changes.password.clone() {
            Some(password) => Some(hash_off_thread(password).await?),
            None => None,
        };
        let updated = current.apply_changes(changes, password_hash, Utc::now());

        let found = self
            .repos
            .users
            .update(&updated)
            .await
            .or_conflict("update_user", |_| UserErrors::email_taken(&updated.email))?;
        if !found {
            return Err(UserErrors::not_found(id).into());
        }

        tracing::info!(user_id = %id, actor = %actor.user_id, "user updated");
        Ok(updated)
    }
}

#[async_trait::async_trait]
impl Handle<DeleteUser> for Handlers {
    type Output = ();

    async fn handle(&self, command: DeleteUser) -> Outcome<()> {
        ensure_self_or(&command.actor, command.id, &Permission::USERS_MANAGE)?;
        let user = self.load_user(command.id).await?;

        let reservations = self
            .repos
            .reservations
            .for_user(user.id)
            .await
            .or_store_failure("reservations_for_user")?;
        let ids: Vec<_> = reservations.iter().map(|r| r.id).collect();
        self.repos
            .reservations
            .delete_many(&ids)
            .await
            .or_store_failure("delete_reservations")?;

        if !self.repos.users.delete(user.id).await.or_store_failure("delete_user")? {
            return Err(UserErrors::not_found(user.id).into());
        }

        tracing::info!(
            user_id = %user.id,
            actor = %command.actor.user_id,
            reservations = ids.len(),
            "user deleted"
        );
        Ok(())
    }
}
