//! Domain error taxonomy shared by every service.
use thiserror::Error;

/// Typed errors raised by domain services. Components never recover or
/// retry on their own; the rest layer translates each variant into an
/// HTTP status and JSON error envelope.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Bad or missing input, carries a field-level message (HTTP 400)
    #[error("{0}")]
    Validation(String),

    /// Referenced entity absent (HTTP 404)
    #[error("{0}")]
    NotFound(String),

    /// Operation not valid in the entity's current state, e.g. approving
    /// an already-processed contribution (HTTP 409)
    #[error("{0}")]
    StateConflict(String),

    /// Non-admin attempting an admin-only mutation (HTTP 403)
    #[error("{0}")]
    Authorization(String),

    /// Storage or transactional failure; the transaction has already been
    /// rolled back when this surfaces (HTTP 500)
    #[error("{0}")]
    Integrity(String),
}

// Repositories surface storage failures as anyhow errors; anything that
// reaches a service unclassified is a storage-level integrity failure.
impl From<anyhow::Error> for DomainError {
    fn from(err: anyhow::Error) -> Self {
        DomainError::Integrity(format!("erro de banco de dados: {err}"))
    }
}

pub type DomainResult<T> = Result<T, DomainError>;
