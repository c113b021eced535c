use crate::consts::{WINDOW_MAX, WINDOW_MIN};
use std::io;
use thiserror::Error;

/// Errors surfaced while opening a session. Once a session is running,
/// transient trouble (corrupt, missized, or out-of-window datagrams) is
/// absorbed by the protocol and never reaches the application.
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("window size {0} out of range (1..=128)")]
    BadWindowSize(usize),
    #[error("cannot resolve peer host {0:?}")]
    PeerUnresolved(String),
    #[error("cannot bind UDP port {port}: {source}")]
    Bind {
        port: u16,
        #[source]
        source: io::Error,
    },
    #[error("datagram endpoint unavailable: {0}")]
    Endpoint(#[from] io::Error),
}

pub(crate) fn validate_window(window: usize) -> Result<(), SessionError> {
    if (WINDOW_MIN..=WINDOW_MAX).contains(&window) {
        Ok(())
    } else {
        Err(SessionError::BadWindowSize(window))
    }
}
