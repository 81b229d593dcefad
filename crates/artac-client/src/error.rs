use std::time::Duration;

use thiserror::Error;

use artac_store::StoreError;

/// Failure of a call to the backend. Never surfaced to the view layer; the
/// session degrades to cached or fallback data instead.
#[derive(Error, Debug)]
pub enum RemoteError {
    /// Connection, TLS, timeout or body decoding failure.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("{endpoint} answered with status {status}")]
    Status { endpoint: String, status: u16 },

    #[error("Remote call timed out after {0:?}")]
    Timeout(Duration),
}

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Remote error: {0}")]
    Remote(#[from] RemoteError),

    #[error("Configuration error: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, ClientError>;
