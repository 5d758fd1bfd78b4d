use crate::types::DbId;

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    /// A write lost a race against another booking. Callers should re-run
    /// the availability search.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// The reservation store could not be reached or returned an error.
    /// Retryable; never a statement about availability.
    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("Internal error: {0}")]
    Internal(String),
}
