use crate::entity::EntityId;

/// Alias for `Result<T, CoreError>`.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors raised by the spatial index.
///
/// Every variant signals a broken delete/move/reinsert discipline in the
/// caller. None of them is recoverable: once raised, the index no longer
/// mirrors the entity tables.
#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    /// A delete was issued for an id that has no outstanding insert.
    #[error("entity {id} is not in the spatial index")]
    NotIndexed {
        /// The id that was not found.
        id: EntityId,
    },

    /// An insert was issued for an id that is already indexed.
    #[error("entity {id} is already in the spatial index")]
    AlreadyIndexed {
        /// The id that was inserted twice.
        id: EntityId,
    },

    /// A delete was issued with a box different from the one inserted.
    #[error("entity {id} was deleted with a box that does not match its indexed box")]
    BoxMismatch {
        /// The id whose box did not match.
        id: EntityId,
    },

    /// The index returned an id that no entity table holds.
    #[error("entity {id} is indexed but missing from its table")]
    Orphaned {
        /// The dangling id.
        id: EntityId,
    },
}
