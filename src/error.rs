//! Unified error handling for clubd.
//!
//! Validation errors travel back to the invoking command layer for
//! user-facing rendering. Persistence failures never take this path; they
//! are absorbed at the store (see [`crate::state::Store::persist`]).

use thiserror::Error;

/// Errors surfaced to the external command layer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("unknown club: {0}")]
    InvalidClub(String),

    #[error("invalid date/time: {0} (expected YYYY-MM-DD HH:MM)")]
    InvalidTimestamp(String),

    #[error("no such record: {0}")]
    NotFound(String),

    /// Raised by the external command layer, which owns role checks; carried
    /// here so callers render one taxonomy.
    #[error("you don't have permission to do that")]
    PermissionDenied,

    #[error("role sync failed: {0}")]
    RoleSync(String),
}

impl EngineError {
    /// Get a static error code string for metrics labeling.
    #[inline]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::InvalidClub(_) => "invalid_club",
            Self::InvalidTimestamp(_) => "invalid_timestamp",
            Self::NotFound(_) => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::RoleSync(_) => "role_sync",
        }
    }
}

/// Result type for engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
