//! Value object trait: equality by value, not identity.
//!
//! Value objects are validated once, at construction, and are immutable after
//! that. Holding an `Email` means holding a well-formed email address.

/// Marker trait for value objects.
///
/// ## Value Object vs Entity
///
/// - **Value Object**: No identity (`SeatNumber("A-12")` equals any other `SeatNumber("A-12")`)
/// - **Entity**: Has identity (two seats with the same id are the same seat)
///
/// ## Construction
///
/// Implementors expose a fallible `parse` returning an [`Outcome`](crate::Outcome)
/// so that all rule violations can be reported together:
///
/// ```ignore
/// #[derive(Debug, Clone, PartialEq, Eq)]
/// struct SeatNumber(String);
///
/// impl ValueObject for SeatNumber {
///     fn as_str(&self) -> &str {
///         &self.0
///     }
/// }
///
/// impl SeatNumber {
///     pub fn parse(raw: &str) -> Outcome<Self> { /* ... */ }
/// }
/// ```
pub trait ValueObject: Clone + PartialEq + core::fmt::Debug {
    /// Raw string form used for persistence and transport.
    fn as_str(&self) -> &str;
}
