//! Entity trait: identity + continuity across state changes.

/// Entity marker + minimal interface.
///
/// The resident list keys everything it holds by `Entity::id`; two values with
/// the same id are the same entity, whatever their other fields say.
pub trait Entity {
    /// Strongly-typed entity identifier.
    type Id: Clone + Eq + core::hash::Hash + core::fmt::Debug;

    /// Returns the entity identifier.
    fn id(&self) -> &Self::Id;
}
