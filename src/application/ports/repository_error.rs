/// Closed error set for the persistence port. Backend-specific failure
/// codes are mapped into these variants once, at the adapter boundary.
#[derive(Debug, Clone, thiserror::Error)]
pub enum RepositoryError {
    #[error("not found: {0}")]
    NotFound(String),
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("rate limited")]
    RateLimited,
    #[error("network failure: {0}")]
    TransientNetwork(String),
    #[error("{0}")]
    Unknown(String),
}
