use std::net::SocketAddr;
use thiserror::Error;

/// Errors that stop the server as a whole.
///
/// Failures of a single connection or room never surface here.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
