//! Persistence seams.
//!
//! Handlers only ever see the traits in this module. Two backends implement
//! them: [`InMemoryRepository`] for tests and local runs, and the Postgres
//! repositories for deployments.
//!
//! ## Error model
//!
//! Repositories report infrastructure problems as [`RepositoryError`]. They do
//! not know about business rules; a duplicate email is a `Conflict` here and
//! becomes `User.EmailTaken` only at the handler boundary.

use std::sync::Arc;

use chrono::NaiveDate;
use thiserror::Error;

use cowork_auth::{Email, Role, User};
use cowork_core::{Entity, ReservationId, SeatId, UserId};
use cowork_reservations::Reservation;
use cowork_seats::{Seat, SeatNumber};

pub mod in_memory;
pub mod postgres;

pub use in_memory::InMemoryRepository;
pub use postgres::{
    PostgresReservationRepository, PostgresSeatRepository, PostgresUserRepository, connect,
    migrate,
};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RepositoryError {
    /// The backend could not be reached or failed to run the statement.
    #[error("storage backend failure: {0}")]
    Backend(String),

    /// A uniqueness constraint rejected the write.
    #[error("uniqueness conflict: {0}")]
    Conflict(String),

    /// A stored row no longer satisfies the domain rules.
    #[error("stored record could not be decoded: {0}")]
    Decode(String),
}

/// Generic CRUD access to one entity type.
#[async_trait::async_trait]
pub trait Repository<E: Entity>: Send + Sync {
    async fn get(&self, id: E::Id) -> Result<Option<E>, RepositoryError>;

    /// All records, oldest first.
    async fn list(&self) -> Result<Vec<E>, RepositoryError>;

    /// Fails with `Conflict` when the id or a unique key is already taken.
    async fn insert(&self, entity: &E) -> Result<(), RepositoryError>;

    /// Returns `false` when no record with that id exists.
    async fn update(&self, entity: &E) -> Result<bool, RepositoryError>;

    /// Returns `false` when no record with that id exists.
    async fn delete(&self, id: E::Id) -> Result<bool, RepositoryError>;
}

#[async_trait::async_trait]
pub trait UserRepository: Repository<User> {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError>;

    /// Insert a newly registered account and return the role it was stored
    /// with. The first account of an empty store is stored as `Admin` whatever
    /// `user.role` says; the emptiness check and the write are one atomic step.
    async fn insert_registration(&self, user: &User) -> Result<Role, RepositoryError>;
}

#[async_trait::async_trait]
pub trait SeatRepository: Repository<Seat> {
    async fn find_by_number(&self, number: &SeatNumber) -> Result<Option<Seat>, RepositoryError>;
}

#[async_trait::async_trait]
pub trait ReservationRepository: Repository<Reservation> {
    async fn for_seat_on(
        &self,
        seat_id: SeatId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    async fn for_user_on(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// Every reservation of a user, ordered by date.
    async fn for_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError>;

    /// Every reservation of a seat, ordered by date.
    async fn for_seat(&self, seat_id: SeatId) -> Result<Vec<Reservation>, RepositoryError>;

    /// Reservations of a seat on or after `from`, ordered by date.
    async fn for_seat_from(
        &self,
        seat_id: SeatId,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError>;

    /// Every reservation on a given day.
    async fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, RepositoryError>;

    /// Remove several reservations; returns how many existed.
    async fn delete_many(&self, ids: &[ReservationId]) -> Result<u64, RepositoryError>;
}

/// Earliest year a Postgres `DATE` can hold (4713 BC).
pub const EARLIEST_STORABLE_YEAR: i32 = -4712;

/// Dates outside the column range are rejected by the database; the in-memory
/// store rejects them the same way.
pub(crate) fn ensure_storable(date: NaiveDate) -> Result<(), RepositoryError> {
    if chrono::Datelike::year(&date) < EARLIEST_STORABLE_YEAR {
        return Err(RepositoryError::Backend(format!("date out of range: {date}")));
    }
    Ok(())
}

/// The storage unit handed to handlers.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub seats: Arc<dyn SeatRepository>,
    pub reservations: Arc<dyn ReservationRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        Self {
            users: Arc::new(InMemoryRepository::<User>::users()),
            seats: Arc::new(InMemoryRepository::<Seat>::seats()),
            reservations: Arc::new(InMemoryRepository::<Reservation>::reservations()),
        }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        Self {
            users: Arc::new(PostgresUserRepository::new(pool.clone())),
            seats: Arc::new(PostgresSeatRepository::new(pool.clone())),
            reservations: Arc::new(PostgresReservationRepository::new(pool)),
        }
    }
}

impl core::fmt::Debug for Repositories {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Repositories").finish_non_exhaustive()
    }
}
