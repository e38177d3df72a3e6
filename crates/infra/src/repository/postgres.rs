//! Postgres-backed repositories.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Error Code | RepositoryError |
//! |------------|----------------------|-----------------|
//! | Database (unique violation) | `23505` | `Conflict` (constraint name) |
//! | Database (other) | Any other | `Backend` |
//! | PoolClosed / Io / other | N/A | `Backend` |
//! | Column decode failure | N/A | `Decode` |
//!
//! Rows are decoded back through the domain parsers, so a record edited by hand
//! into an invalid state surfaces as `Decode` instead of leaking into handlers.

use std::str::FromStr;

use chrono::{DateTime, NaiveDate, Utc};
use sqlx::postgres::{PgPoolOptions, PgRow};
use sqlx::{PgPool, Row};
use tracing::instrument;
use uuid::Uuid;

use cowork_auth::{Email, PersonName, Role, User};
use cowork_core::{ReservationId, SeatId, UserId, ValueObject};
use cowork_reservations::Reservation;
use cowork_seats::{Seat, SeatNumber};

use super::{
    Repository, RepositoryError, ReservationRepository, SeatRepository, UserRepository,
};

/// Statements applied by [`migrate`]. Each one is idempotent.
const SCHEMA: &[&str] = &[
    r#"
    CREATE TABLE IF NOT EXISTS users (
        id            UUID PRIMARY KEY,
        name          TEXT NOT NULL,
        email         TEXT NOT NULL,
        password_hash TEXT NOT NULL,
        role          TEXT NOT NULL,
        created_at    TIMESTAMPTZ NOT NULL,
        updated_at    TIMESTAMPTZ NOT NULL,
        CONSTRAINT users_email_key UNIQUE (email)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS seats (
        id          UUID PRIMARY KEY,
        number      TEXT NOT NULL,
        description TEXT,
        available   BOOLEAN NOT NULL,
        created_at  TIMESTAMPTZ NOT NULL,
        updated_at  TIMESTAMPTZ NOT NULL,
        CONSTRAINT seats_number_key UNIQUE (number)
    )
    "#,
    r#"
    CREATE TABLE IF NOT EXISTS reservations (
        id         UUID PRIMARY KEY,
        user_id    UUID NOT NULL REFERENCES users (id) ON DELETE CASCADE,
        seat_id    UUID NOT NULL REFERENCES seats (id) ON DELETE CASCADE,
        date       DATE NOT NULL,
        created_at TIMESTAMPTZ NOT NULL,
        updated_at TIMESTAMPTZ NOT NULL,
        CONSTRAINT reservations_seat_date_key UNIQUE (seat_id, date),
        CONSTRAINT reservations_user_date_key UNIQUE (user_id, date)
    )
    "#,
    "CREATE INDEX IF NOT EXISTS reservations_date_idx ON reservations (date)",
];

/// Open a connection pool.
pub async fn connect(database_url: &str) -> Result<PgPool, RepositoryError> {
    PgPoolOptions::new()
        .max_connections(10)
        .connect(database_url)
        .await
        .map_err(|e| map_sqlx_error("connect", e))
}

/// Create the tables if they do not exist yet.
#[instrument(skip(pool), err)]
pub async fn migrate(pool: &PgPool) -> Result<(), RepositoryError> {
    for statement in SCHEMA {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| map_sqlx_error("migrate", e))?;
    }
    tracing::info!(statements = SCHEMA.len(), "database schema is up to date");
    Ok(())
}

fn map_sqlx_error(operation: &str, err: sqlx::Error) -> RepositoryError {
    match err {
        sqlx::Error::Database(db_err) => {
            if db_err.code().as_deref() == Some("23505") {
                let constraint = db_err.constraint().unwrap_or("unique").to_string();
                RepositoryError::Conflict(constraint)
            } else {
                RepositoryError::Backend(format!(
                    "database error in {operation}: {}",
                    db_err.message()
                ))
            }
        }
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::ColumnNotFound(_) => {
            RepositoryError::Decode(format!("{operation}: {err}"))
        }
        sqlx::Error::PoolClosed => {
            RepositoryError::Backend(format!("connection pool closed in {operation}"))
        }
        _ => RepositoryError::Backend(format!("sqlx error in {operation}: {err}")),
    }
}

fn column<'r, T>(row: &'r PgRow, name: &str) -> Result<T, RepositoryError>
where
    T: sqlx::Decode<'r, sqlx::Postgres> + sqlx::Type<sqlx::Postgres>,
{
    row.try_get(name)
        .map_err(|e| RepositoryError::Decode(format!("column {name}: {e}")))
}

fn decode<T, E: core::fmt::Display>(what: &str, parsed: Result<T, E>) -> Result<T, RepositoryError> {
    parsed.map_err(|e| RepositoryError::Decode(format!("{what}: {e}")))
}

// ─────────────────────────────────────────────────────────────────────────────
// Users
// ─────────────────────────────────────────────────────────────────────────────

const USER_COLUMNS: &str = "id, name, email, password_hash, role, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresUserRepository {
    pool: PgPool,
}

impl PostgresUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn user_from_row(row: &PgRow) -> Result<User, RepositoryError> {
    let name: String = column(row, "name")?;
    let email: String = column(row, "email")?;
    let role: String = column(row, "role")?;
    Ok(User {
        id: UserId::from_uuid(column(row, "id")?),
        name: decode("users.name", PersonName::parse(&name))?,
        email: decode("users.email", Email::parse(&email))?,
        password_hash: column(row, "password_hash")?,
        role: decode("users.role", Role::from_str(&role))?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

#[async_trait::async_trait]
impl Repository<User> for PostgresUserRepository {
    async fn get(&self, id: UserId) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_user", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<User>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_users", e))?;
        rows.iter().map(user_from_row).collect()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert(&self, user: &User) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_user", e))?;
        Ok(())
    }

    async fn update(&self, user: &User) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE users
            SET name = $2, email = $3, password_hash = $4, role = $5, updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_user", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: UserId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_user", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresUserRepository {
    async fn find_by_email(&self, email: &Email) -> Result<Option<User>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1"))
            .bind(email.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_user_by_email", e))?;
        row.as_ref().map(user_from_row).transpose()
    }

    #[instrument(skip(self, user), fields(user_id = %user.id), err)]
    async fn insert_registration(&self, user: &User) -> Result<Role, RepositoryError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("insert_registration", e))?;

        // Only one registration at a time may observe an empty table.
        sqlx::query("LOCK TABLE users IN SHARE ROW EXCLUSIVE MODE")
            .execute(&mut *tx)
            .await
            .map_err(|e| map_sqlx_error("insert_registration", e))?;

        let row = sqlx::query(
            r#"
            INSERT INTO users (id, name, email, password_hash, role, created_at, updated_at)
            SELECT $1, $2, $3, $4,
                   CASE WHEN EXISTS (SELECT 1 FROM users) THEN $5 ELSE 'admin' END,
                   $6, $7
            RETURNING role
            "#,
        )
        .bind(*user.id.as_uuid())
        .bind(user.name.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .bind(user.created_at)
        .bind(user.updated_at)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_registration", e))?;
        let role: String = column(&row, "role")?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("insert_registration", e))?;
        decode("users.role", Role::from_str(&role))
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Seats
// ─────────────────────────────────────────────────────────────────────────────

const SEAT_COLUMNS: &str = "id, number, description, available, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresSeatRepository {
    pool: PgPool,
}

impl PostgresSeatRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn seat_from_row(row: &PgRow) -> Result<Seat, RepositoryError> {
    let number: String = column(row, "number")?;
    Ok(Seat {
        id: SeatId::from_uuid(column(row, "id")?),
        number: decode("seats.number", SeatNumber::parse(&number))?,
        description: column(row, "description")?,
        available: column(row, "available")?,
        created_at: column(row, "created_at")?,
        updated_at: column(row, "updated_at")?,
    })
}

#[async_trait::async_trait]
impl Repository<Seat> for PostgresSeatRepository {
    async fn get(&self, id: SeatId) -> Result<Option<Seat>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SEAT_COLUMNS} FROM seats WHERE id = $1"))
            .bind(*id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("get_seat", e))?;
        row.as_ref().map(seat_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Seat>, RepositoryError> {
        let rows = sqlx::query(&format!("SELECT {SEAT_COLUMNS} FROM seats ORDER BY id"))
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_seats", e))?;
        rows.iter().map(seat_from_row).collect()
    }

    #[instrument(skip(self, seat), fields(seat_id = %seat.id), err)]
    async fn insert(&self, seat: &Seat) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO seats (id, number, description, available, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*seat.id.as_uuid())
        .bind(seat.number.as_str())
        .bind(seat.description.as_deref())
        .bind(seat.available)
        .bind(seat.created_at)
        .bind(seat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_seat", e))?;
        Ok(())
    }

    async fn update(&self, seat: &Seat) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE seats
            SET number = $2, description = $3, available = $4, updated_at = $5
            WHERE id = $1
            "#,
        )
        .bind(*seat.id.as_uuid())
        .bind(seat.number.as_str())
        .bind(seat.description.as_deref())
        .bind(seat.available)
        .bind(seat.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_seat", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: SeatId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM seats WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_seat", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl SeatRepository for PostgresSeatRepository {
    async fn find_by_number(&self, number: &SeatNumber) -> Result<Option<Seat>, RepositoryError> {
        let row = sqlx::query(&format!("SELECT {SEAT_COLUMNS} FROM seats WHERE number = $1"))
            .bind(number.as_str())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_seat_by_number", e))?;
        row.as_ref().map(seat_from_row).transpose()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Reservations
// ─────────────────────────────────────────────────────────────────────────────

const RESERVATION_COLUMNS: &str = "id, user_id, seat_id, date, created_at, updated_at";

#[derive(Debug, Clone)]
pub struct PostgresReservationRepository {
    pool: PgPool,
}

impl PostgresReservationRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    async fn select(
        &self,
        operation: &str,
        filter: &str,
        first: Uuid,
        date: Option<NaiveDate>,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        let sql =
            format!("SELECT {RESERVATION_COLUMNS} FROM reservations WHERE {filter} ORDER BY date, id");
        let mut query = sqlx::query(&sql).bind(first);
        if let Some(date) = date {
            query = query.bind(date);
        }
        let rows = query
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error(operation, e))?;
        rows.iter().map(reservation_from_row).collect()
    }
}

fn reservation_from_row(row: &PgRow) -> Result<Reservation, RepositoryError> {
    let created_at: DateTime<Utc> = column(row, "created_at")?;
    Ok(Reservation {
        id: ReservationId::from_uuid(column(row, "id")?),
        user_id: UserId::from_uuid(column(row, "user_id")?),
        seat_id: SeatId::from_uuid(column(row, "seat_id")?),
        date: column(row, "date")?,
        created_at,
        updated_at: column(row, "updated_at")?,
    })
}

#[async_trait::async_trait]
impl Repository<Reservation> for PostgresReservationRepository {
    async fn get(&self, id: ReservationId) -> Result<Option<Reservation>, RepositoryError> {
        let row = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE id = $1"
        ))
        .bind(*id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("get_reservation", e))?;
        row.as_ref().map(reservation_from_row).transpose()
    }

    async fn list(&self) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations ORDER BY id"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("list_reservations", e))?;
        rows.iter().map(reservation_from_row).collect()
    }

    #[instrument(skip(self, reservation), fields(reservation_id = %reservation.id), err)]
    async fn insert(&self, reservation: &Reservation) -> Result<(), RepositoryError> {
        sqlx::query(
            r#"
            INSERT INTO reservations (id, user_id, seat_id, date, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(*reservation.id.as_uuid())
        .bind(*reservation.user_id.as_uuid())
        .bind(*reservation.seat_id.as_uuid())
        .bind(reservation.date)
        .bind(reservation.created_at)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_reservation", e))?;
        Ok(())
    }

    async fn update(&self, reservation: &Reservation) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            r#"
            UPDATE reservations
            SET seat_id = $2, date = $3, updated_at = $4
            WHERE id = $1
            "#,
        )
        .bind(*reservation.id.as_uuid())
        .bind(*reservation.seat_id.as_uuid())
        .bind(reservation.date)
        .bind(reservation.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("update_reservation", e))?;
        Ok(result.rows_affected() > 0)
    }

    async fn delete(&self, id: ReservationId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM reservations WHERE id = $1")
            .bind(*id.as_uuid())
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reservation", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait::async_trait]
impl ReservationRepository for PostgresReservationRepository {
    async fn for_seat_on(
        &self,
        seat_id: SeatId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.select(
            "reservations_for_seat_on",
            "seat_id = $1 AND date = $2",
            *seat_id.as_uuid(),
            Some(date),
        )
        .await
    }

    async fn for_user_on(
        &self,
        user_id: UserId,
        date: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.select(
            "reservations_for_user_on",
            "user_id = $1 AND date = $2",
            *user_id.as_uuid(),
            Some(date),
        )
        .await
    }

    async fn for_user(&self, user_id: UserId) -> Result<Vec<Reservation>, RepositoryError> {
        self.select(
            "reservations_for_user",
            "user_id = $1",
            *user_id.as_uuid(),
            None,
        )
        .await
    }

    async fn for_seat(&self, seat_id: SeatId) -> Result<Vec<Reservation>, RepositoryError> {
        self.select("reservations_for_seat", "seat_id = $1", *seat_id.as_uuid(), None)
            .await
    }

    async fn for_seat_from(
        &self,
        seat_id: SeatId,
        from: NaiveDate,
    ) -> Result<Vec<Reservation>, RepositoryError> {
        self.select(
            "reservations_for_seat_from",
            "seat_id = $1 AND date >= $2",
            *seat_id.as_uuid(),
            Some(from),
        )
        .await
    }

    async fn on_date(&self, date: NaiveDate) -> Result<Vec<Reservation>, RepositoryError> {
        let rows = sqlx::query(&format!(
            "SELECT {RESERVATION_COLUMNS} FROM reservations WHERE date = $1 ORDER BY id"
        ))
        .bind(date)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| map_sqlx_error("reservations_on_date", e))?;
        rows.iter().map(reservation_from_row).collect()
    }

    async fn delete_many(&self, ids: &[ReservationId]) -> Result<u64, RepositoryError> {
        let ids: Vec<Uuid> = ids.iter().map(|id| *id.as_uuid()).collect();
        let result = sqlx::query("DELETE FROM reservations WHERE id = ANY($1)")
            .bind(&ids)
            .execute(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_reservations", e))?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn schema_statements_are_idempotent() {
        for statement in SCHEMA {
            assert!(statement.contains("IF NOT EXISTS"), "{statement}");
        }
    }

    #[test]
    fn non_database_errors_map_to_backend() {
        assert!(matches!(
            map_sqlx_error("get_user", sqlx::Error::PoolClosed),
            RepositoryError::Backend(msg) if msg.contains("get_user")
        ));
        assert!(matches!(
            map_sqlx_error("list_seats", sqlx::Error::RowNotFound),
            RepositoryError::Backend(_)
        ));
        assert!(matches!(
            map_sqlx_error("get_seat", sqlx::Error::ColumnNotFound("number".to_string())),
            RepositoryError::Decode(_)
        ));
    }
}
