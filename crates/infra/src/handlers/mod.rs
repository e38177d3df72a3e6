//! Command/query handlers.
//!
//! Each operation is a plain command struct; [`Handlers`] implements
//! [`Handle`] for every one of them:
//!
//! ```text
//! Command
//!   ↓
//! 1. Authorize the actor (pure policy)
//!   ↓
//! 2. Validate input (all errors reported together)
//!   ↓
//! 3. Load what the rules need from the repositories
//!   ↓
//! 4. Apply domain rules, persist
//! ```
//!
//! Every step reports through [`Outcome`]. Repository faults become a single
//! `Store.Failure` exception error and are logged here, at the boundary.

use cowork_auth::{Password, hash_password, verify_password};
use cowork_core::{Error, Outcome};
use cowork_reservations::BookingPolicy;

use crate::repository::{Repositories, RepositoryError};

pub mod reservations;
pub mod seats;
pub mod users;

pub use reservations::{
    CancelReservation, CreateReservation, GetReservation, ListReservations, UpdateReservation,
};
pub use seats::{CreateSeat, DeleteSeat, GetSeat, ListAvailableSeats, ListSeats, UpdateSeat};
pub use users::{Authenticate, DeleteUser, GetUser, ListUsers, RegisterUser, UpdateUser};

/// Execute one command or query.
#[async_trait::async_trait]
pub trait Handle<C>: Send + Sync {
    type Output;

    async fn handle(&self, command: C) -> Outcome<Self::Output>;
}

/// Application services shared by every request.
#[derive(Debug, Clone)]
pub struct Handlers {
    repos: Repositories,
    policy: BookingPolicy,
}

impl Handlers {
    pub fn new(repos: Repositories, policy: BookingPolicy) -> Self {
        Self { repos, policy }
    }

    pub fn repositories(&self) -> &Repositories {
        &self.repos
    }
}

pub(crate) fn store_failure(operation: &'static str, err: RepositoryError) -> Error {
    tracing::error!(operation, error = %err, "repository operation failed");
    Error::exception("Store.Failure", "the data store could not complete the request")
}

/// Repository results at the handler boundary.
pub(crate) trait StoreResultExt<T> {
    fn or_store_failure(self, operation: &'static str) -> Outcome<T>;

    /// Like `or_store_failure`, but a uniqueness conflict becomes `error`,
    /// which receives the name of the violated key.
    fn or_conflict(self, operation: &'static str, error: impl FnOnce(&str) -> Error)
    -> Outcome<T>;
}

impl<T> StoreResultExt<T> for Result<T, RepositoryError> {
    fn or_store_failure(self, operation: &'static str) -> Outcome<T> {
        self.map_err(|err| store_failure(operation, err).into())
    }

    fn or_conflict(
        self,
        operation: &'static str,
        error: impl FnOnce(&str) -> Error,
    ) -> Outcome<T> {
        match self {
            Err(RepositoryError::Conflict(constraint)) => {
                tracing::debug!(operation, constraint = %constraint, "write rejected by unique key");
                Err(error(&constraint).into())
            }
            other => other.or_store_failure(operation),
        }
    }
}

/// Argon2 runs on the blocking pool.
pub(crate) async fn hash_off_thread(password: Password) -> Outcome<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password hashing task failed");
            Error::unexpected("Password.HashFailed", "failed to hash password")
        })?
}

pub(crate) async fn verify_off_thread(password: String, password_hash: String) -> Outcome<()> {
    tokio::task::spawn_blocking(move || verify_password(&password, &password_hash))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "password verification task failed");
            Error::unexpected("Password.VerifyFailed", "failed to verify password")
        })?
}

#[cfg(test)]
pub(crate) mod testing {
    use chrono::NaiveDate;

    use cowork_auth::{NewUser, Principal, User};
    use cowork_core::SeatId;
    use cowork_seats::NewSeat;

    use super::*;

    pub fn handlers() -> Handlers {
        Handlers::new(Repositories::in_memory(), BookingPolicy::new(30))
    }

    pub fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, 2).unwrap()
    }

    pub fn day(offset: u64) -> NaiveDate {
        today() + chrono::Days::new(offset)
    }

    pub async fn register(h: &Handlers, name: &str, email: &str) -> User {
        h.handle(RegisterUser {
            input: NewUser {
                name: name.to_string(),
                email: email.to_string(),
                password: "Password1".to_string(),
            },
        })
        .await
        .unwrap()
    }

    pub fn principal(user: &User) -> Principal {
        Principal::new(user.id, user.role)
    }

    pub async fn seat(h: &Handlers, admin: &Principal, number: &str) -> SeatId {
        h.handle(CreateSeat {
            actor: admin.clone(),
            input: NewSeat {
                number: number.to_string(),
                description: None,
                available: true,
            },
        })
        .await
        .unwrap()
        .id
    }
}
