//! Domain error model.
//!
//! An [`Error`] is an immutable value describing one expected failure
//! (validation, not-found, conflict, ...). Errors travel inside
//! [`Failure`](crate::Failure) values and are never thrown; programmer mistakes
//! are reported with panics instead.

use core::hash::{Hash, Hasher};

use serde::Serialize;

/// Closed set of failure kinds.
///
/// The presentation layer maps categories to user-facing failure classes
/// (e.g. HTTP status codes); the mapping itself lives outside this crate.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Absence of an error. Only ever carried by [`Error::none`].
    None,
    /// Generic failure.
    Failure,
    /// A fault the caller could not have anticipated.
    Unexpected,
    /// Input failed validation.
    Validation,
    /// The request conflicts with current state (duplicates, double bookings).
    Conflict,
    /// A referenced resource does not exist.
    NotFound,
    /// Missing or invalid credentials.
    Unauthorized,
    /// Authenticated, but not allowed to perform the action.
    Forbidden,
    /// An infrastructure fault caught at a boundary.
    Exception,
}

impl ErrorCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCategory::None => "none",
            ErrorCategory::Failure => "failure",
            ErrorCategory::Unexpected => "unexpected",
            ErrorCategory::Validation => "validation",
            ErrorCategory::Conflict => "conflict",
            ErrorCategory::NotFound => "not_found",
            ErrorCategory::Unauthorized => "unauthorized",
            ErrorCategory::Forbidden => "forbidden",
            ErrorCategory::Exception => "exception",
        }
    }
}

impl core::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One failure: a stable `code`, a human-readable `message`, a category and
/// optional nested causes.
///
/// There is no `Default` impl; errors are built through [`Error::new`] or one
/// of the per-category constructors. Equality ignores `causes`.
#[derive(Debug, Clone, Serialize)]
pub struct Error {
    code: String,
    message: String,
    category: ErrorCategory,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    causes: Vec<Error>,
}

const NULL_VALUE_CODE: &str = "Error.NullValue";
const NULL_VALUE_MESSAGE: &str = "The specified result value is null.";

impl Error {
    pub fn new(
        code: impl Into<String>,
        message: impl Into<String>,
        category: ErrorCategory,
    ) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
            category,
            causes: Vec::new(),
        }
    }

    /// The "no error" sentinel. Never a valid member of a [`Failure`](crate::Failure).
    pub fn none() -> Self {
        Self::new("", "", ErrorCategory::None)
    }

    /// Error used when a nullable lookup produced nothing.
    pub fn null_value() -> Self {
        Self::failure(NULL_VALUE_CODE, NULL_VALUE_MESSAGE)
    }

    pub fn failure(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Failure)
    }

    pub fn unexpected(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Unexpected)
    }

    pub fn validation(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Validation)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Conflict)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::NotFound)
    }

    pub fn unauthorized(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Unauthorized)
    }

    pub fn forbidden(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Forbidden)
    }

    pub fn exception(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(code, message, ErrorCategory::Exception)
    }

    /// Return a copy of this error carrying `causes`, keeping code, message and
    /// category intact. Existing causes are kept and the new ones appended.
    pub fn with_causes(mut self, causes: impl IntoIterator<Item = Error>) -> Self {
        self.causes.extend(causes);
        self
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn category(&self) -> ErrorCategory {
        self.category
    }

    pub fn causes(&self) -> &[Error] {
        &self.causes
    }

    /// Whether this is the [`Error::none`] sentinel.
    pub fn is_none(&self) -> bool {
        self.category == ErrorCategory::None
    }
}

impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.code == other.code && self.message == other.message && self.category == other.category
    }
}

impl Eq for Error {}

impl Hash for Error {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.code.hash(state);
        self.message.hash(state);
        self.category.hash(state);
    }
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}: {}", self.code, self.message)
    }
}

impl std::error::Error for Error {}
