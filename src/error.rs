//! Error types for log intake and event application. Store and reducer
//! errors live beside the code that raises them.

use crate::store::StoreError;

/// Malformed or incomplete RPC logs.
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("Missing required log field: {0}")]
    MissingLogField(&'static str),
    #[error("Failed to decode governor event: {0}")]
    Decode(#[from] alloy::sol_types::Error),
}

/// Failures that abort the application of an event. Events that are
/// merely inapplicable (unknown proposal, redelivery, ...) are reported
/// as skips, not errors.
#[derive(Debug, thiserror::Error)]
pub enum IndexError {
    #[error(transparent)]
    Log(#[from] LogError),
    #[error("Entity store error: {0}")]
    Store(#[from] StoreError),
}
