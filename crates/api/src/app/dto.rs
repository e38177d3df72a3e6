use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

use cowork_auth::{IssuedToken, NewUser, Role, User, UserChanges};
use cowork_core::{ReservationId, SeatId, UserId, ValueObject};
use cowork_reservations::{NewReservation, Reservation, ReservationChanges};
use cowork_seats::{NewSeat, Seat, SeatChanges};

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
}

impl From<RegisterRequest> for NewUser {
    fn from(req: RegisterRequest) -> Self {
        NewUser {
            name: req.name,
            email: req.email,
            password: req.password,
        }
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl From<UpdateUserRequest> for UserChanges {
    fn from(req: UpdateUserRequest) -> Self {
        UserChanges {
            name: req.name,
            email: req.email,
            password: req.password,
            role: req.role,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateSeatRequest {
    pub number: String,
    pub description: Option<String>,
    pub available: Option<bool>,
}

impl From<CreateSeatRequest> for NewSeat {
    fn from(req: CreateSeatRequest) -> Self {
        NewSeat {
            number: req.number,
            description: req.description,
            available: req.available.unwrap_or(true),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateSeatRequest {
    pub number: Option<String>,
    pub description: Option<String>,
    pub available: Option<bool>,
}

impl From<UpdateSeatRequest> for SeatChanges {
    fn from(req: UpdateSeatRequest) -> Self {
        SeatChanges {
            number: req.number,
            description: req.description,
            available: req.available,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct CreateReservationRequest {
    pub seat_id: SeatId,
    pub date: NaiveDate,
}

impl From<CreateReservationRequest> for NewReservation {
    fn from(req: CreateReservationRequest) -> Self {
        NewReservation {
            seat_id: req.seat_id,
            date: req.date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct UpdateReservationRequest {
    pub seat_id: Option<SeatId>,
    pub date: Option<NaiveDate>,
}

impl From<UpdateReservationRequest> for ReservationChanges {
    fn from(req: UpdateReservationRequest) -> Self {
        ReservationChanges {
            seat_id: req.seat_id,
            date: req.date,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct AvailabilityQuery {
    pub date: NaiveDate,
}

// -------------------------
// Response DTOs
// -------------------------

/// Public view of an account. The password hash never leaves the server.
#[derive(Debug, Serialize)]
pub struct UserResponse {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name.as_str().to_string(),
            email: user.email.as_str().to_string(),
            role: user.role,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SeatResponse {
    pub id: SeatId,
    pub number: String,
    pub description: Option<String>,
    pub available: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Seat> for SeatResponse {
    fn from(seat: Seat) -> Self {
        Self {
            id: seat.id,
            number: seat.number.as_str().to_string(),
            description: seat.description,
            available: seat.available,
            created_at: seat.created_at,
            updated_at: seat.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReservationResponse {
    pub id: ReservationId,
    pub user_id: UserId,
    pub seat_id: SeatId,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Reservation> for ReservationResponse {
    fn from(r: Reservation) -> Self {
        Self {
            id: r.id,
            user_id: r.user_id,
            seat_id: r.seat_id,
            date: r.date,
            created_at: r.created_at,
            updated_at: r.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TokenResponse {
    pub access_token: String,
    pub token_type: &'static str,
    pub expires_at: DateTime<Utc>,
    pub user: UserResponse,
}

impl TokenResponse {
    pub fn bearer(issued: IssuedToken, user: User) -> Self {
        Self {
            access_token: issued.token,
            token_type: "Bearer",
            expires_at: issued.expires_at,
            user: user.into(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct WhoAmIResponse {
    pub user_id: UserId,
    pub role: Role,
}

pub fn to_responses<T, R: From<T>>(items: Vec<T>) -> Vec<R> {
    items.into_iter().map(R::from).collect()
}
