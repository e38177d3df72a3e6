//! Reservations domain: one seat, one user, one day.
//!
//! Pure rules only. Looking up existing bookings is the caller's job; the
//! functions here decide whether a requested slot is acceptable.

pub mod reservation;

pub use reservation::{
    check_availability, BookingPolicy, NewReservation, Reservation, ReservationChanges,
    ReservationErrors, DEFAULT_HORIZON_DAYS,
};
