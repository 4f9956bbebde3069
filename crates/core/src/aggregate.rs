//! Aggregate root trait for the reconciliation domain models.

/// Aggregate root marker + minimal interface.
///
/// An aggregate (a purchase order or an invoice together with its child
/// records) is one consistency boundary: engines validate and recompute over
/// exactly one aggregate at a time and never hold locks themselves.
pub trait AggregateRoot {
    /// Strongly-typed aggregate identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the aggregate identifier.
    fn id(&self) -> &Self::Id;

    /// Monotonically increasing version of the aggregate's state.
    ///
    /// Bumped once per committed mutation; the gateway may use it for an
    /// optimistic concurrency check when serializing writes per aggregate.
    fn version(&self) -> u64;
}
