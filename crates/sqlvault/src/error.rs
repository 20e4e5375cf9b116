//! Vault error types

use thiserror::Error;

use crate::state::LoadState;

/// Everything a vault operation can fail with.
#[derive(Debug, Error)]
pub enum VaultError {
    /// Rejected at construction time, never deferred to first use.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The lifecycle state does not permit the operation. Raised before any
    /// I/O; the caller can recover by adjusting call order (or, after a
    /// failed load, by constructing a fresh vault).
    #[error("Operation requires the {expected:?} state, vault is {actual:?}")]
    InvalidState {
        expected: LoadState,
        actual: LoadState,
    },

    /// Any failure surfaced by the database layer: connectivity, constraint
    /// violation, malformed statement. Never swallowed, never retried.
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Reading an external text source for a save failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// `get_value` on a key pair absent from the mirror. `try_get_value`
    /// reports the same condition as `None` instead.
    #[error("No value for context {context_key}, element {element_key}")]
    NotFound { context_key: i64, element_key: i64 },
}
