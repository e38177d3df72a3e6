//! Success/failure outcomes.
//!
//! [`Outcome`] is a plain `Result` whose error side is a [`Failure`]: a
//! non-empty list of real [`Error`]s. Business failures travel as values
//! through every layer; contract violations (an empty failure, the
//! [`Error::none`] sentinel used as a failure, reading the value of a failed
//! outcome) panic.

use thiserror::Error as ThisError;

use crate::error::{Error, ErrorCategory};

/// Result type used across the domain and application layers.
pub type Outcome<T = ()> = Result<T, Failure>;

/// The error side of an [`Outcome`].
///
/// Always holds at least one error and never the [`Error::none`] sentinel.
/// The field is private, so the factories are the only way in:
///
/// ```compile_fail
/// let failure = cowork_core::Failure { errors: Vec::new() };
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Failure {
    errors: Vec<Error>,
}

/// Why a [`Failure`] could not be built.
#[derive(Debug, ThisError, Clone, PartialEq, Eq)]
pub enum FailureConstructionError {
    #[error("a failure must carry at least one error")]
    Empty,

    #[error("the none sentinel cannot be used as a failure (position {0})")]
    Sentinel(usize),
}

impl Failure {
    /// Wrap a single error.
    ///
    /// # Panics
    /// When `error` is the [`Error::none`] sentinel.
    pub fn single(error: Error) -> Self {
        Self::new(vec![error])
    }

    /// Wrap several errors, keeping their order.
    ///
    /// # Panics
    /// When `errors` is empty or contains the [`Error::none`] sentinel.
    pub fn new(errors: Vec<Error>) -> Self {
        match Self::try_new(errors) {
            Ok(failure) => failure,
            Err(err) => panic!("invalid failure construction: {err}"),
        }
    }

    pub fn try_new(errors: Vec<Error>) -> Result<Self, FailureConstructionError> {
        if errors.is_empty() {
            return Err(FailureConstructionError::Empty);
        }
        if let Some(pos) = errors.iter().position(Error::is_none) {
            return Err(FailureConstructionError::Sentinel(pos));
        }
        Ok(Self { errors })
    }

    pub fn errors(&self) -> &[Error] {
        &self.errors
    }

    pub fn first(&self) -> &Error {
        // Non-empty by construction.
        &self.errors[0]
    }

    pub fn into_errors(self) -> Vec<Error> {
        self.errors
    }

    /// Whether any error has the given category.
    pub fn has_category(&self, category: ErrorCategory) -> bool {
        self.errors.iter().any(|e| e.category() == category)
    }

    /// Append the errors of `other`, keeping order.
    pub fn merge(mut self, other: Failure) -> Self {
        self.errors.extend(other.errors);
        self
    }
}

impl core::fmt::Display for Failure {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.first())?;
        let rest = self.errors.len() - 1;
        if rest > 0 {
            write!(f, " (+{rest} more)")?;
        }
        Ok(())
    }
}

impl std::error::Error for Failure {}

impl From<Error> for Failure {
    fn from(error: Error) -> Self {
        Self::single(error)
    }
}

impl IntoIterator for Failure {
    type Item = Error;
    type IntoIter = std::vec::IntoIter<Error>;

    fn into_iter(self) -> Self::IntoIter {
        self.errors.into_iter()
    }
}

pub fn success<T>(value: T) -> Outcome<T> {
    Ok(value)
}

pub fn success_unit() -> Outcome {
    Ok(())
}

/// # Panics
/// When `error` is the [`Error::none`] sentinel.
pub fn failure<T>(error: Error) -> Outcome<T> {
    Err(Failure::single(error))
}

/// # Panics
/// When `errors` is empty or contains the [`Error::none`] sentinel.
pub fn failure_many<T>(errors: Vec<Error>) -> Outcome<T> {
    Err(Failure::new(errors))
}

/// Lift a nullable lookup: `None` becomes a failure with [`Error::null_value`].
pub fn from_option<T>(value: Option<T>) -> Outcome<T> {
    from_option_or(value, Error::null_value())
}

/// Like [`from_option`], with a caller-chosen error for the `None` case.
pub fn from_option_or<T>(value: Option<T>, error: Error) -> Outcome<T> {
    match value {
        Some(v) => Ok(v),
        None => Err(Failure::single(error)),
    }
}

/// Accessors and fluent helpers on [`Outcome`].
pub trait OutcomeExt<T>: Sized {
    fn is_success(&self) -> bool;

    fn is_failure(&self) -> bool {
        !self.is_success()
    }

    /// All errors; empty on success.
    fn errors(&self) -> &[Error];

    /// First error, or the [`Error::none`] sentinel on success.
    fn first_error(&self) -> Error {
        self.errors().first().cloned().unwrap_or_else(Error::none)
    }

    /// # Panics
    /// When the outcome is a failure.
    fn value(&self) -> &T;

    /// Run `action` on the value when successful; returns the outcome unchanged.
    fn on_success(self, action: impl FnOnce(&T)) -> Self;

    /// Run `action` on the failure when failed; returns the outcome unchanged.
    fn on_failure(self, action: impl FnOnce(&Failure)) -> Self;

    /// Drop the value, keeping success/failure and the errors.
    fn discard(self) -> Outcome<()>;
}

impl<T> OutcomeExt<T> for Outcome<T> {
    fn is_success(&self) -> bool {
        self.is_ok()
    }

    fn errors(&self) -> &[Error] {
        match self {
            Ok(_) => &[],
            Err(f) => f.errors(),
        }
    }

    fn value(&self) -> &T {
        match self {
            Ok(v) => v,
            Err(f) => panic!("cannot access the value of a failed outcome: {f}"),
        }
    }

    fn on_success(self, action: impl FnOnce(&T)) -> Self {
        if let Ok(v) = &self {
            action(v);
        }
        self
    }

    fn on_failure(self, action: impl FnOnce(&Failure)) -> Self {
        if let Err(f) = &self {
            action(f);
        }
        self
    }

    fn discard(self) -> Outcome<()> {
        self.map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Email(String);

    #[derive(Debug, Clone, PartialEq)]
    struct User {
        name: String,
    }

    #[test]
    fn success_has_no_errors() {
        let outcome = success_unit();
        assert!(outcome.is_success());
        assert!(!outcome.is_failure());
        assert!(outcome.errors().is_empty());
        assert!(outcome.first_error().is_none());
    }

    #[test]
    fn failure_carries_the_error() {
        let err = Error::not_found("Seat.NotFound", "missing");
        let outcome: Outcome = failure(err.clone());
        assert!(outcome.is_failure());
        assert_eq!(outcome.errors(), &[err.clone()]);
        assert_eq!(outcome.first_error(), err);
    }

    #[test]
    fn invalid_email_scenario() {
        let err = Error::validation("Email.InvalidFormat", "bad format");
        let outcome: Outcome<Email> = failure(err);
        assert!(outcome.is_failure());
        assert_eq!(outcome.first_error().code(), "Email.InvalidFormat");
    }

    #[test]
    fn from_option_lifts_present_values() {
        let user = User { name: "Ada".to_string() };
        let outcome = from_option(Some(user.clone()));
        assert!(outcome.is_success());
        assert_eq!(outcome.value(), &user);
    }

    #[test]
    fn from_option_fails_with_null_value_error() {
        let outcome = from_option::<User>(None);
        assert!(outcome.is_failure());
        assert_eq!(outcome.first_error(), Error::null_value());
    }

    #[test]
    fn from_option_or_uses_the_given_error() {
        let err = Error::not_found("User.NotFound", "missing");
        let outcome = from_option_or::<User>(None, err.clone());
        assert_eq!(outcome.first_error(), err);
    }

    #[test]
    #[should_panic(expected = "at least one error")]
    fn empty_failure_panics() {
        let _ = failure_many::<()>(Vec::new());
    }

    #[test]
    #[should_panic(expected = "none sentinel")]
    fn sentinel_failure_panics() {
        let _ = failure::<()>(Error::none());
    }

    #[test]
    fn try_new_reports_the_violation() {
        assert_eq!(Failure::try_new(Vec::new()), Err(FailureConstructionError::Empty));
        assert_eq!(
            Failure::try_new(vec![Error::failure("a", "b"), Error::none()]),
            Err(FailureConstructionError::Sentinel(1))
        );
    }

    #[test]
    #[should_panic(expected = "cannot access the value")]
    fn value_of_failure_panics() {
        let outcome: Outcome<u32> = failure(Error::conflict("c", "m"));
        let _ = outcome.value();
    }

    #[test]
    fn discard_preserves_failure() {
        let err = Error::conflict("Reservation.SeatTaken", "taken");
        let outcome: Outcome<u32> = failure(err.clone());
        let unit = outcome.discard();
        assert!(unit.is_failure());
        assert_eq!(unit.first_error(), err);
    }

    #[test]
    fn discard_drops_the_value_on_success() {
        let unit = success(42u32).discard();
        assert_eq!(unit, Ok(()));
    }

    #[test]
    fn callbacks_fire_only_on_their_branch() {
        let mut seen = Vec::new();
        let _ = success(1u8)
            .on_success(|v| seen.push(format!("ok {v}")))
            .on_failure(|_| seen.push("err".to_string()));
        let _ = failure::<u8>(Error::failure("F", "f"))
            .on_success(|_| seen.push("ok".to_string()))
            .on_failure(|f| seen.push(format!("err {}", f.first().code())));
        assert_eq!(seen, vec!["ok 1".to_string(), "err F".to_string()]);
    }

    #[test]
    fn display_mentions_extra_errors() {
        let failure = Failure::new(vec![Error::validation("A", "a"), Error::validation("B", "b")]);
        assert_eq!(failure.to_string(), "A: a (+1 more)");
    }

    fn category() -> impl Strategy<Value = ErrorCategory> {
        prop_oneof![
            Just(ErrorCategory::Failure),
            Just(ErrorCategory::Unexpected),
            Just(ErrorCategory::Validation),
            Just(ErrorCategory::Conflict),
            Just(ErrorCategory::NotFound),
            Just(ErrorCategory::Unauthorized),
            Just(ErrorCategory::Forbidden),
            Just(ErrorCategory::Exception),
        ]
    }

    fn error() -> impl Strategy<Value = Error> {
        ("[A-Za-z.]{0,12}", ".{0,24}", category())
            .prop_map(|(code, message, category)| Error::new(code, message, category))
    }

    proptest! {
        /// Property: success and non-empty errors are never both observed.
        #[test]
        fn success_iff_no_errors(
            errors in prop::collection::vec(error(), 0..6),
            value in any::<i32>(),
        ) {
            let outcome: Outcome<i32> = if errors.is_empty() {
                success(value)
            } else {
                failure_many(errors.clone())
            };

            prop_assert_eq!(outcome.is_success(), outcome.errors().is_empty());
            prop_assert_eq!(outcome.is_failure(), !outcome.errors().is_empty());
            if let Some(first) = errors.first() {
                prop_assert_eq!(&outcome.first_error(), first);
                prop_assert_eq!(outcome.errors(), errors.as_slice());
            } else {
                prop_assert_eq!(*outcome.value(), value);
            }
        }

        /// Property: discarding the value keeps the errors verbatim.
        #[test]
        fn discard_round_trip(errors in prop::collection::vec(error(), 1..4)) {
            let outcome: Outcome<String> = failure_many(errors.clone());
            let unit = outcome.discard();
            prop_assert!(unit.is_failure());
            prop_assert_eq!(unit.errors(), errors.as_slice());
        }
    }
}
