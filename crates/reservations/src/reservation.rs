use chrono::{DateTime, Days, NaiveDate, Utc};

use cowork_core::{Entity, Error, Outcome, ReservationId, SeatId, UserId, Validator};

/// Default number of days ahead a seat can be booked.
pub const DEFAULT_HORIZON_DAYS: u32 = 90;

/// Error catalogue for reservation operations.
pub struct ReservationErrors;

impl ReservationErrors {
    pub fn not_found(id: ReservationId) -> Error {
        Error::not_found("Reservation.NotFound", format!("reservation {id} does not exist"))
    }

    pub fn not_owner() -> Error {
        Error::forbidden(
            "Reservation.NotOwner",
            "reservations can only be changed by their owner",
        )
    }

    pub fn date_in_past(date: NaiveDate) -> Error {
        Error::validation("Reservation.DateInPast", format!("{date} is in the past"))
    }

    pub fn date_too_far(date: NaiveDate, horizon_days: u32) -> Error {
        Error::validation(
            "Reservation.DateTooFar",
            format!("{date} is more than {horizon_days} days ahead"),
        )
    }

    pub fn already_past(date: NaiveDate) -> Error {
        Error::validation(
            "Reservation.AlreadyPast",
            format!("the reservation on {date} has already taken place"),
        )
    }

    pub fn seat_taken(date: NaiveDate) -> Error {
        Error::conflict("Reservation.SeatTaken", format!("the seat is already booked on {date}"))
    }

    pub fn user_already_booked(date: NaiveDate) -> Error {
        Error::conflict(
            "Reservation.UserAlreadyBooked",
            format!("you already have a reservation on {date}"),
        )
    }

    pub fn empty_update() -> Error {
        Error::validation("Reservation.EmptyUpdate", "at least one field must be provided")
    }
}

/// Date rules for new and moved reservations.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct BookingPolicy {
    pub horizon_days: u32,
}

impl Default for BookingPolicy {
    fn default() -> Self {
        Self {
            horizon_days: DEFAULT_HORIZON_DAYS,
        }
    }
}

impl BookingPolicy {
    pub fn new(horizon_days: u32) -> Self {
        Self { horizon_days }
    }

    /// A bookable date lies in `[today, today + horizon_days]`.
    pub fn validate_date(&self, date: NaiveDate, today: NaiveDate) -> Outcome<NaiveDate> {
        let latest = today
            .checked_add_days(Days::new(u64::from(self.horizon_days)))
            .unwrap_or(NaiveDate::MAX);

        let mut v = Validator::new();
        v.ensure(date >= today, || ReservationErrors::date_in_past(date))
            .ensure(date <= latest, || {
                ReservationErrors::date_too_far(date, self.horizon_days)
            });
        v.finish_with(date)
    }
}

/// One seat booked by one user for one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reservation {
    pub id: ReservationId,
    pub user_id: UserId,
    pub seat_id: SeatId,
    pub date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Entity for Reservation {
    type Id = ReservationId;

    fn id(&self) -> ReservationId {
        self.id
    }

    const KIND: &'static str = "Reservation";
}

impl Reservation {
    pub fn book(
        id: ReservationId,
        user_id: UserId,
        seat_id: SeatId,
        date: NaiveDate,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            seat_id,
            date,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn is_owned_by(&self, user_id: UserId) -> bool {
        self.user_id == user_id
    }

    /// Past reservations are history and cannot be cancelled or moved.
    pub fn ensure_cancellable(&self, today: NaiveDate) -> Outcome<()> {
        if self.date < today {
            Err(ReservationErrors::already_past(self.date).into())
        } else {
            Ok(())
        }
    }

    pub fn reschedule(&self, seat_id: SeatId, date: NaiveDate, now: DateTime<Utc>) -> Self {
        Self {
            seat_id,
            date,
            updated_at: now,
            ..self.clone()
        }
    }
}

/// Raw booking input; the owner comes from the authenticated caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewReservation {
    pub seat_id: SeatId,
    pub date: NaiveDate,
}

/// Raw partial update: move to another seat and/or day.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReservationChanges {
    pub seat_id: Option<SeatId>,
    pub date: Option<NaiveDate>,
}

impl ReservationChanges {
    /// Resolve the target slot against the current reservation.
    pub fn resolve(&self, current: &Reservation) -> Outcome<(SeatId, NaiveDate)> {
        if self.seat_id.is_none() && self.date.is_none() {
            return Err(ReservationErrors::empty_update().into());
        }
        Ok((
            self.seat_id.unwrap_or(current.seat_id),
            self.date.unwrap_or(current.date),
        ))
    }
}

/// Check a requested slot against existing bookings.
///
/// `seat_bookings` are the reservations of the requested seat on `date`;
/// `user_bookings` those of the requesting user on `date`. `exclude` names the
/// reservation being moved, which never conflicts with itself. Both conflicts
/// are reported when both apply.
pub fn check_availability(
    date: NaiveDate,
    seat_bookings: &[Reservation],
    user_bookings: &[Reservation],
    exclude: Option<ReservationId>,
) -> Outcome<()> {
    let others = |r: &&Reservation| Some(r.id) != exclude && r.date == date;

    let mut v = Validator::new();
    v.ensure(!seat_bookings.iter().any(|r| others(&r)), || {
        ReservationErrors::seat_taken(date)
    })
    .ensure(!user_bookings.iter().any(|r| others(&r)), || {
        ReservationErrors::user_already_booked(date)
    });
    v.finish()
}
