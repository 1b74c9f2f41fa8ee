//! Shared error and result types for Gatehouse

use thiserror::Error;

/// Errors raised inside the connection layer.
///
/// The handshake itself never surfaces these to callers; it folds them into a
/// [`ConnectionOutcome`](crate::connection::ConnectionOutcome). They appear on
/// the lower-level surfaces: the request builder and the REST call boundary.
#[derive(Debug, Error)]
pub enum GatehouseError {
    /// A request or configuration value failed validation
    #[error("Validation error: {0}")]
    Validation(String),

    /// Network-layer failure talking to the remote endpoint
    #[error("Transport error: {0}")]
    Transport(String),

    /// The outbound client was used after it was closed
    #[error("Outbound client is closed")]
    ClientClosed,

    /// The remote endpoint answered but broke the expected contract
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<reqwest::Error> for GatehouseError {
    fn from(e: reqwest::Error) -> Self {
        GatehouseError::Transport(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, GatehouseError>;
