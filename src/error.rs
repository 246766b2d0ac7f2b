//! Error taxonomy for the pet.
//!
//! Startup failures (`Configuration`, `ResourceLoad`, `NetworkBind`) are fatal
//! and bubble up to `main`. Everything raised while the frame loop is running
//! is logged and dropped so playback never stalls on a bad client message.

use std::net::SocketAddr;
use std::path::PathBuf;

pub type PetResult<T> = Result<T, PetError>;

#[derive(thiserror::Error, Debug)]
pub enum PetError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("failed to load image {path:?}: {source}")]
    ResourceLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("failed to listen on {addr}: {source}")]
    NetworkBind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    #[error("protocol error: {0}")]
    Protocol(String),

    #[error("connection {peer} dropped: {source}")]
    Connection {
        peer: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    #[error("state index {index} rejected (states: {len}, active: {active})")]
    IndexOutOfRange {
        index: usize,
        len: usize,
        active: usize,
    },

    #[error("update called on a finished pet state; reset it first")]
    AlreadyEnded,
}

impl PetError {
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    pub fn protocol(msg: impl Into<String>) -> Self {
        Self::Protocol(msg.into())
    }
}
