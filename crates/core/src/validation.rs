//! Error-accumulating validation.
//!
//! Field checks are combined so that every violated rule is reported, not
//! just the first one.

use crate::error::Error;
use crate::outcome::{Failure, Outcome};

/// Collects errors from independent checks.
///
/// ```
/// use cowork_core::{Error, Validator};
///
/// let name = "";
/// let mut v = Validator::new();
/// v.ensure(!name.is_empty(), || Error::validation("User.NameEmpty", "name is required"));
/// v.ensure(name.len() <= 100, || Error::validation("User.NameLength", "name is too long"));
/// assert_eq!(v.finish().unwrap_err().errors().len(), 1);
/// ```
#[derive(Debug, Default)]
pub struct Validator {
    errors: Vec<Error>,
}

impl Validator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `error()` when `condition` does not hold.
    pub fn ensure(&mut self, condition: bool, error: impl FnOnce() -> Error) -> &mut Self {
        if !condition {
            self.errors.push(error());
        }
        self
    }

    pub fn push(&mut self, error: Error) -> &mut Self {
        self.errors.push(error);
        self
    }

    /// Take the value of a successful outcome, or record its errors.
    pub fn absorb<T>(&mut self, outcome: Outcome<T>) -> Option<T> {
        match outcome {
            Ok(v) => Some(v),
            Err(f) => {
                self.errors.extend(f.into_errors());
                None
            }
        }
    }

    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn finish(self) -> Outcome<()> {
        self.finish_with(())
    }

    pub fn finish_with<T>(self, value: T) -> Outcome<T> {
        if self.errors.is_empty() {
            Ok(value)
        } else {
            Err(Failure::new(self.errors))
        }
    }
}

/// Combine a tuple of outcomes into an outcome of a tuple, accumulating the
/// errors of every failed member in order.
pub trait Combine {
    type Output;

    fn combine(self) -> Outcome<Self::Output>;
}

macro_rules! impl_combine {
    ($($name:ident : $ty:ident),+) => {
        impl<$($ty),+> Combine for ($(Outcome<$ty>,)+) {
            type Output = ($($ty,)+);

            fn combine(self) -> Outcome<Self::Output> {
                let ($($name,)+) = self;
                let mut v = Validator::new();
                $(let $name = v.absorb($name);)+
                match ($($name,)+) {
                    ($(Some($name),)+) => Ok(($($name,)+)),
                    // At least one member failed, so `v` holds errors.
                    _ => Err(Failure::new(v.errors)),
                }
            }
        }
    };
}

impl_combine!(a: A, b: B);
impl_combine!(a: A, b: B, c: C);
impl_combine!(a: A, b: B, c: C, d: D);

/// Collect an iterator of outcomes, accumulating every error.
pub fn combine_all<T>(outcomes: impl IntoIterator<Item = Outcome<T>>) -> Outcome<Vec<T>> {
    let mut v = Validator::new();
    let values: Vec<T> = outcomes.into_iter().filter_map(|o| v.absorb(o)).collect();
    v.finish_with(values)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::outcome::{failure, success, OutcomeExt};

    fn too_short() -> Error {
        Error::validation("Password.TooShort", "too short")
    }

    fn missing_digit() -> Error {
        Error::validation("Password.MissingDigit", "needs a digit")
    }

    #[test]
    fn validator_reports_every_violation() {
        let mut v = Validator::new();
        v.ensure(false, too_short).ensure(true, || unreachable!()).ensure(false, missing_digit);
        let failure = v.finish().unwrap_err();
        assert_eq!(failure.errors(), &[too_short(), missing_digit()]);
    }

    #[test]
    fn validator_passes_value_through() {
        let v = Validator::new();
        assert!(v.is_valid());
        assert_eq!(v.finish_with("ok"), Ok("ok"));
    }

    #[test]
    fn absorb_collects_nested_errors() {
        let mut v = Validator::new();
        assert_eq!(v.absorb(success(3)), Some(3));
        assert_eq!(v.absorb::<u8>(failure(too_short())), None);
        assert!(!v.is_valid());
        assert_eq!(v.finish().first_error(), too_short());
    }

    #[test]
    fn combine_returns_all_values() {
        let combined = (success(1u8), success("two"), success(3.0f32)).combine();
        assert_eq!(combined, Ok((1u8, "two", 3.0f32)));
    }

    #[test]
    fn combine_accumulates_errors_in_order() {
        let combined = (
            failure::<u8>(too_short()),
            success("fine"),
            failure::<u8>(missing_digit()),
        )
            .combine();
        assert_eq!(combined.errors(), &[too_short(), missing_digit()]);
    }

    #[test]
    fn combine_all_accumulates() {
        let all = combine_all(vec![success(1), failure(too_short()), success(2), failure(missing_digit())]);
        assert_eq!(all.errors().len(), 2);

        let ok = combine_all(vec![success(1), success(2)]);
        assert_eq!(ok, Ok(vec![1, 2]));
    }
}
