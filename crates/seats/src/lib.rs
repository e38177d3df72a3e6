//! Seats domain module.
//!
//! This crate contains business rules for bookable seats, implemented purely as
//! deterministic domain logic (no IO, no HTTP, no storage).

pub mod seat;

pub use seat::{NewSeat, Seat, SeatChanges, SeatErrors, SeatNumber, ValidatedNewSeat, ValidatedSeatChanges};
