//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// Repositories are generic over this trait; two entities with the same id are
/// the same record, whatever their other fields say.
pub trait Entity: Clone + Send + Sync + 'static {
    /// Strongly-typed entity identifier.
    type Id: Copy + Eq + Ord + core::hash::Hash + core::fmt::Debug + core::fmt::Display + Send + Sync;

    /// Returns the entity identifier.
    fn id(&self) -> Self::Id;

    /// Short name used in logs and error codes (e.g. `"Seat"`).
    const KIND: &'static str;
}
