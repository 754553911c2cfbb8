use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Conditions that prevent the bridge from starting.
///
/// Everything after startup recovers locally (retry, reopen, or dropping a
/// client), so this is the only error type that reaches `main`.
#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to provision fifo at {path}: {source}")]
    Provision {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path} exists but is not a fifo")]
    NotAFifo { path: PathBuf },

    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: std::net::SocketAddr,
        #[source]
        source: io::Error,
    },

    #[error("failed to spawn fifo reader thread: {0}")]
    ReaderSpawn(#[source] io::Error),

    #[error("server error: {0}")]
    Serve(#[source] io::Error),
}
