/// Errors that can occur during profile lookups.
#[derive(Debug, thiserror::Error)]
pub enum ProfileError {
    /// Profile not found
    #[error("profile not found: {0}")]
    NotFound(String),

    /// Profile with this id already exists
    #[error("profile already exists: {0}")]
    AlreadyExists(String),

    /// Internal profile store error
    #[error("internal profile store error: {0}")]
    Internal(String),
}

/// Result type for profile operations.
pub type ProfileResult<T> = Result<T, ProfileError>;
