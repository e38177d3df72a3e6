//! `cowork-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns):
//! the [`Error`]/[`Outcome`] model used for every expected failure, the
//! error-accumulating [`Validator`], and typed identifiers.

pub mod entity;
pub mod error;
pub mod id;
pub mod outcome;
pub mod validation;
pub mod value_object;

pub use entity::Entity;
pub use error::{Error, ErrorCategory};
pub use id::{ReservationId, SeatId, UserId};
pub use outcome::{
    Failure, FailureConstructionError, Outcome, OutcomeExt, failure, failure_many, from_option,
    from_option_or, success, success_unit,
};
pub use validation::{Combine, Validator, combine_all};
pub use value_object::ValueObject;
