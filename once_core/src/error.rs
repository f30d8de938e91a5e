use crate::config::ConfigError;
use crate::session::SessionError;
use std::net::SocketAddr;
use thiserror::Error;

/// Anything that stops the server before it starts serving
#[derive(Debug, Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("cannot bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}
